use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::ports::{BlobStoreError, DocumentStoreError};
use crate::application::services::{JobRequest, PipelineError};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct BackQuestionsRequest {
    pub system_instructions_doc_id: String,
    pub base_prompt_doc_id: Option<String>,
    pub pdf_url: String,
    pub output_doc_id: String,
    pub drive_file_id: Option<String>,
    pub sampling_first_pages: Option<usize>,
    pub sampling_last_pages: Option<usize>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub status: String,
    pub message: String,
    pub output_doc_link: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Config(_) => StatusCode::BAD_REQUEST,
        PipelineError::Store(DocumentStoreError::AccessDenied(_))
        | PipelineError::Blob(BlobStoreError::AccessDenied(_)) => StatusCode::FORBIDDEN,
        PipelineError::Store(DocumentStoreError::NotFound(_))
        | PipelineError::Blob(BlobStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[tracing::instrument(skip(state, request), fields(output_doc_id = %request.output_doc_id))]
pub async fn back_questions_handler(
    State(state): State<AppState>,
    Json(request): Json<BackQuestionsRequest>,
) -> impl IntoResponse {
    let source_ref = request
        .drive_file_id
        .clone()
        .unwrap_or_else(|| request.pdf_url.clone());

    let job = JobRequest {
        system_instructions_ref: request.system_instructions_doc_id,
        base_prompt_ref: request.base_prompt_doc_id,
        source_ref,
        output_ref: request.output_doc_id,
        sampling_first_pages: request.sampling_first_pages,
        sampling_last_pages: request.sampling_last_pages,
        additional_params: request.additional_params,
    };

    match state.back_questions.run(job).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(JobResponse {
                status: outcome.status,
                message: outcome.message,
                output_doc_link: outcome.output_link,
            }),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(error = %error, "back-questions job failed");
            (
                error_status(&error),
                Json(ErrorResponse {
                    error: error.to_string(),
                }),
            )
                .into_response()
        }
    }
}
