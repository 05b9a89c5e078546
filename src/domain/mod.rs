mod answer;
mod block;
mod chunk;
mod document;
mod job;
mod job_stage;
mod question;
mod routing;

pub use answer::{PartialAnswer, QuestionAnswer};
pub use block::{Block, parse_blocks};
pub use chunk::DocumentChunk;
pub use document::SourceDocument;
pub use job::{Job, JobId};
pub use job_stage::JobStage;
pub use question::Question;
pub use routing::RoutingTable;
