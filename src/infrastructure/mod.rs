pub mod google;
pub mod llm;
pub mod observability;
pub mod pdf;
pub mod stores;
pub mod transport;
