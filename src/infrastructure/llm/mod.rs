mod mock_llm_client;
mod vertex_client;

pub use mock_llm_client::MockLlmClient;
pub use vertex_client::VertexClient;
