mod detector;
mod direct;
mod map_reduce;
mod model_json;
pub mod prompts;
mod pipeline;
pub mod router;
mod sampler;
mod segmenter;

pub use detector::{QuestionDetector, detect_via_regex, parse_detection};
pub use direct::{DirectPipeline, DirectRequest};
pub use map_reduce::{
    AnswerEngine, CancelFlag, INSUFFICIENT_EVIDENCE, MapRetry, next_action, parse_map_answers,
};
pub use model_json::extract_model_json;
pub use pipeline::{
    BackQuestionsPipeline, JobOutcome, JobRequest, OUTPUT_TITLE, PipelineConfig, PipelineError,
    parse_drive_url_to_id, resolve_source_id,
};
pub use router::{RouterConfig, rank_chunks, route};
pub use sampler::{Sampler, sample_page_indices};
pub use segmenter::{ChunkSegmenter, chunk_page_ranges, chunk_texts};
