use std::sync::Arc;

use serde_json::{Map, Value};

use crate::application::ports::{DocumentStore, LlmClient};
use crate::application::services::pipeline::{JobOutcome, PipelineError};
use crate::application::services::prompts;

/// Input for the plain document flow: system/base/input documents in, one
/// completion out.
#[derive(Debug, Clone)]
pub struct DirectRequest {
    pub system_instructions_ref: String,
    pub base_prompt_ref: String,
    pub input_doc_ref: String,
    pub output_ref: String,
    pub additional_params: Map<String, Value>,
}

/// Whole-document path: read the prompts and the input document, make one
/// LLM call, write the result. No sampling, routing or map-reduce.
pub struct DirectPipeline {
    docs: Arc<dyn DocumentStore>,
    llm: Arc<dyn LlmClient>,
}

impl DirectPipeline {
    pub fn new(docs: Arc<dyn DocumentStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self { docs, llm }
    }

    #[tracing::instrument(skip(self, request), fields(output_ref = %request.output_ref))]
    pub async fn run(&self, request: &DirectRequest) -> Result<JobOutcome, PipelineError> {
        for doc_id in [
            &request.system_instructions_ref,
            &request.base_prompt_ref,
            &request.input_doc_ref,
            &request.output_ref,
        ] {
            self.docs.check_access(doc_id).await?;
        }

        let system_text = self.docs.get_text(&request.system_instructions_ref).await?;
        let base_prompt = self.docs.get_text(&request.base_prompt_ref).await?;
        let input_text = self.docs.get_text(&request.input_doc_ref).await?;

        let prompt = prompts::build_prompt(
            &system_text,
            &base_prompt,
            &input_text,
            &request.additional_params,
        );
        tracing::info!("prompt assembled, requesting completion");

        let output = self.llm.complete(&prompt).await?;
        self.docs.write(&request.output_ref, &output).await?;

        let output_link = self.docs.output_link(&request.output_ref);
        tracing::info!(%output_link, "direct processing complete");

        Ok(JobOutcome {
            status: "success".to_string(),
            message: "El resultado fue escrito correctamente en el documento.".to_string(),
            output_link,
        })
    }
}
