use std::sync::Arc;

use crate::application::services::{BackQuestionsPipeline, DirectPipeline};

#[derive(Clone)]
pub struct AppState {
    pub back_questions: Arc<BackQuestionsPipeline>,
    pub direct: Arc<DirectPipeline>,
}
