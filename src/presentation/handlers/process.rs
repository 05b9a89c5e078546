use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::application::services::DirectRequest;
use crate::presentation::handlers::back_questions::{ErrorResponse, JobResponse, error_status};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct ProcessRequest {
    pub system_instructions_doc_id: String,
    pub base_prompt_doc_id: String,
    pub input_doc_id: String,
    pub output_doc_id: String,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

#[tracing::instrument(skip(state, request), fields(output_doc_id = %request.output_doc_id))]
pub async fn process_handler(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> impl IntoResponse {
    let direct = DirectRequest {
        system_instructions_ref: request.system_instructions_doc_id,
        base_prompt_ref: request.base_prompt_doc_id,
        input_doc_ref: request.input_doc_id,
        output_ref: request.output_doc_id,
        additional_params: request.additional_params,
    };

    match state.direct.run(&direct).await {
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
            tracing::error!(error = %error, "direct processing failed");
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
