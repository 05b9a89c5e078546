use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::application::ports::{
    AttachmentRef, BlobStore, BlobStoreError, DocumentStore, DocumentStoreError, LlmClient,
    LlmClientError, PdfEngine, PdfEngineError, ProgressSink,
};
use crate::application::services::detector::QuestionDetector;
use crate::application::services::map_reduce::{AnswerEngine, CancelFlag};
use crate::application::services::router::{self, RouterConfig};
use crate::application::services::sampler::Sampler;
use crate::application::services::segmenter::{self, ChunkSegmenter};
use crate::application::services::prompts;
use crate::domain::{Job, JobStage, SourceDocument};

pub const OUTPUT_TITLE: &str = "Respuestas";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sampling_first_pages: usize,
    pub sampling_last_pages: usize,
    pub detect_limit: usize,
    /// Floored at 5 before segmentation.
    pub pages_per_chunk: usize,
    /// Documents below this page count take the direct whole-document path.
    pub small_doc_threshold: usize,
    pub k_top: usize,
    pub min_cover: usize,
    pub chunk_cap: usize,
    pub throttle: Duration,
    pub concurrency: usize,
    /// Staging bucket for LLM attachments; empty disables attachment upload
    /// and the pipeline falls back to inline text.
    pub staging_bucket: String,
    /// Visa-type (lowercased) to base-prompt document id, with a "default"
    /// entry.
    pub base_prompt_ids: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct JobRequest {
    pub system_instructions_ref: String,
    pub base_prompt_ref: Option<String>,
    pub source_ref: String,
    pub output_ref: String,
    pub sampling_first_pages: Option<usize>,
    pub sampling_last_pages: Option<usize>,
    pub additional_params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub status: String,
    pub message: String,
    pub output_link: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration: {0}")]
    Config(String),
    #[error("document store: {0}")]
    Store(#[from] DocumentStoreError),
    #[error("blob store: {0}")]
    Blob(#[from] BlobStoreError),
    #[error("pdf: {0}")]
    Pdf(#[from] PdfEngineError),
    #[error("llm: {0}")]
    Llm(#[from] LlmClientError),
    #[error("job cancelled")]
    Cancelled,
}

/// Orchestrates one follow-up-questions job: fetch, size branch, sample,
/// detect, segment, route, map, reduce, fallback, write. Progress milestones
/// go to the progress sink at every stage transition; sink failures are the
/// sink's problem, never the job's.
pub struct BackQuestionsPipeline {
    docs: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    llm: Arc<dyn LlmClient>,
    pdf: Arc<dyn PdfEngine>,
    progress: Arc<dyn ProgressSink>,
    sampler: Sampler,
    segmenter: ChunkSegmenter,
    detector: QuestionDetector,
    engine: AnswerEngine,
    config: PipelineConfig,
}

impl BackQuestionsPipeline {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        llm: Arc<dyn LlmClient>,
        pdf: Arc<dyn PdfEngine>,
        progress: Arc<dyn ProgressSink>,
        config: PipelineConfig,
    ) -> Self {
        let sampler = Sampler::new(Arc::clone(&pdf));
        let segmenter = ChunkSegmenter::new(Arc::clone(&pdf));
        let detector = QuestionDetector::new(Arc::clone(&llm));
        let engine = AnswerEngine::new(Arc::clone(&llm), config.throttle, config.concurrency);

        Self {
            docs,
            blobs,
            llm,
            pdf,
            progress,
            sampler,
            segmenter,
            detector,
            engine,
            config,
        }
    }

    pub async fn run(&self, request: JobRequest) -> Result<JobOutcome, PipelineError> {
        self.run_with_cancel(request, CancelFlag::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        request: JobRequest,
        cancel: CancelFlag,
    ) -> Result<JobOutcome, PipelineError> {
        let mut job = Job::new();
        let span = tracing::info_span!("back_questions_job", job_id = %job.id.as_uuid());

        async {
            match self.execute(&request, &mut job, &cancel).await {
                Ok(outcome) => {
                    self.advance(&mut job, JobStage::Done).await;
                    Ok(outcome)
                }
                Err(error) => {
                    tracing::error!(stage = %job.stage, error = %error, "job failed");
                    self.advance(&mut job, JobStage::Failed(error.to_string()))
                        .await;
                    Err(error)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: &JobRequest,
        job: &mut Job,
        cancel: &CancelFlag,
    ) -> Result<JobOutcome, PipelineError> {
        // Configuration must resolve before any store or LLM spend.
        let base_prompt_ref = self.resolve_base_prompt_ref(request)?;
        let source_id = resolve_source_id(&request.source_ref)?;

        for doc_id in [
            &request.system_instructions_ref,
            &base_prompt_ref,
            &request.output_ref,
        ] {
            self.docs.check_access(doc_id).await?;
        }
        self.advance(job, JobStage::AccessChecked).await;

        let system_text = self.docs.get_text(&request.system_instructions_ref).await?;
        let base_prompt = self.docs.get_text(&base_prompt_ref).await?;
        self.advance(job, JobStage::PromptsLoaded).await;

        let data = self.blobs.download(&source_id).await?;
        let page_count = self.pdf.page_count(&data).await?;
        let document = SourceDocument::new(data, page_count);
        tracing::info!(page_count, "source document fetched");
        self.advance(job, JobStage::DocumentFetched).await;

        if page_count < self.config.small_doc_threshold {
            tracing::info!(
                page_count,
                threshold = self.config.small_doc_threshold,
                "small document, using direct path"
            );
            return self.run_small(request, job, &document, &system_text, &base_prompt).await;
        }

        let take_first = request
            .sampling_first_pages
            .unwrap_or(self.config.sampling_first_pages)
            .max(1);
        let take_last = request
            .sampling_last_pages
            .unwrap_or(self.config.sampling_last_pages)
            .max(1);
        let sample = self.sampler.sample(&document, take_first, take_last).await?;
        self.advance(job, JobStage::Sampled).await;

        let sample_text = self.pdf.extract_page_texts(&sample.data).await?.join("\n\n");
        let attachment = self.stage_attachment(&sample).await?;
        let questions = self
            .detector
            .detect(&sample_text, attachment.as_ref(), self.config.detect_limit)
            .await;
        tracing::info!(detected = questions.len(), "question detection finished");
        self.advance(job, JobStage::Detected).await;

        if questions.is_empty() {
            self.docs
                .write_answers(&request.output_ref, OUTPUT_TITLE, &[])
                .await?;
            self.advance(job, JobStage::Written).await;
            let output_link = self.docs.output_link(&request.output_ref);
            return Ok(JobOutcome {
                status: "success".to_string(),
                message: "No se detectaron preguntas de regreso en el documento.".to_string(),
                output_link,
            });
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let pages_per_chunk = self.config.pages_per_chunk.max(5);
        let page_texts = self.pdf.extract_page_texts(&document.data).await?;
        let chunks = self
            .segmenter
            .segment(&document, pages_per_chunk, &page_texts)
            .await?;
        tracing::info!(chunks = chunks.len(), pages_per_chunk, "document segmented");
        self.advance(job, JobStage::Segmented).await;

        let texts = segmenter::chunk_texts(&chunks);
        let routing = router::route(
            &questions,
            &texts,
            &RouterConfig {
                k_top: self.config.k_top,
                min_cover: self.config.min_cover,
                chunk_cap: self.config.chunk_cap,
            },
        );
        for (question_id, covering) in &routing.coverage {
            tracing::debug!(question_id = %question_id, chunks = ?covering, "routing coverage");
        }
        self.advance(job, JobStage::Routed).await;

        let partials = self
            .engine
            .map_all(&system_text, &base_prompt, &chunks, &routing, cancel)
            .await;
        tracing::info!(
            answered_questions = partials.len(),
            "map step finished"
        );
        self.advance(job, JobStage::Mapped).await;
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mut answers = self
            .engine
            .reduce_all(&system_text, &base_prompt, &questions, &partials, cancel)
            .await;
        self.advance(job, JobStage::Reduced).await;

        self.engine
            .fallback_pass(
                &system_text,
                &base_prompt,
                &questions,
                &texts,
                &mut answers,
                cancel,
            )
            .await;
        self.advance(job, JobStage::FallbackResolved).await;
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.docs
            .write_answers(&request.output_ref, OUTPUT_TITLE, &answers)
            .await?;
        self.advance(job, JobStage::Written).await;

        let output_link = self.docs.output_link(&request.output_ref);
        self.progress
            .report("100%", Some(output_link.as_str()))
            .await;

        Ok(JobOutcome {
            status: "success".to_string(),
            message: "Q/A escritos en el documento.".to_string(),
            output_link,
        })
    }

    /// Small-document branch: one LLM call over the whole document, no
    /// detection, routing or map-reduce.
    async fn run_small(
        &self,
        request: &JobRequest,
        job: &mut Job,
        document: &SourceDocument,
        system_text: &str,
        base_prompt: &str,
    ) -> Result<JobOutcome, PipelineError> {
        let output = if self.config.staging_bucket.is_empty() {
            let input_text = self.pdf.extract_page_texts(&document.data).await?.join("\n\n");
            let prompt = prompts::build_prompt(
                system_text,
                base_prompt,
                &input_text,
                &request.additional_params,
            );
            self.llm.complete(&prompt).await?
        } else {
            let uri = self
                .blobs
                .upload(&self.config.staging_bucket, document.data.clone(), ".pdf")
                .await?;
            let prompt = prompts::build_attachment_prompt(
                system_text,
                base_prompt,
                &request.additional_params,
            );
            self.llm
                .complete_with_attachments(&prompt, &[AttachmentRef::pdf(uri)])
                .await?
        };

        self.docs.write(&request.output_ref, &output).await?;
        self.advance(job, JobStage::Written).await;

        let output_link = self.docs.output_link(&request.output_ref);
        self.progress
            .report("100%", Some(output_link.as_str()))
            .await;

        Ok(JobOutcome {
            status: "success".to_string(),
            message: "El resultado de la IA fue escrito correctamente en el documento.".to_string(),
            output_link,
        })
    }

    async fn stage_attachment(
        &self,
        sample: &SourceDocument,
    ) -> Result<Option<AttachmentRef>, PipelineError> {
        if self.config.staging_bucket.is_empty() || sample.is_empty() {
            return Ok(None);
        }
        let uri = self
            .blobs
            .upload(&self.config.staging_bucket, sample.data.clone(), ".pdf")
            .await?;
        Ok(Some(AttachmentRef::pdf(uri)))
    }

    fn resolve_base_prompt_ref(&self, request: &JobRequest) -> Result<String, PipelineError> {
        if let Some(doc_ref) = &request.base_prompt_ref {
            return Ok(doc_ref.clone());
        }

        let visa_type = request
            .additional_params
            .get("visa_type")
            .and_then(Value::as_str)
            .map(str::to_lowercase);

        let by_type = visa_type
            .as_deref()
            .and_then(|key| self.config.base_prompt_ids.get(key));

        by_type
            .or_else(|| self.config.base_prompt_ids.get("default"))
            .cloned()
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "no base prompt configured for visa type {:?} and no default",
                    visa_type
                ))
            })
    }

    async fn advance(&self, job: &mut Job, stage: JobStage) {
        job.advance(stage);
        tracing::info!(stage = %job.stage, "stage reached");
        let status = format!("{}% {}", job.stage.progress_percent(), job.stage.as_str());
        self.progress.report(&status, None).await;
    }
}

static DRIVE_FILE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/file/d/([a-zA-Z0-9_-]+)/").unwrap());

/// Extract the file id from `https://drive.google.com/file/d/<ID>/...` URLs.
pub fn parse_drive_url_to_id(url: &str) -> Option<String> {
    DRIVE_FILE_URL.captures(url).map(|caps| caps[1].to_string())
}

/// Resolve the job's source reference to a blob id. Drive-style URLs are
/// parsed; `gs://` URIs are rejected because page-level sampling needs the
/// raw bytes locally.
pub fn resolve_source_id(source_ref: &str) -> Result<String, PipelineError> {
    if source_ref.starts_with("gs://") {
        return Err(PipelineError::Config(
            "gs:// sources are not supported for page-level detection; pass a file id or Drive URL"
                .to_string(),
        ));
    }
    if let Some(id) = parse_drive_url_to_id(source_ref) {
        return Ok(id);
    }
    if source_ref.trim().is_empty() {
        return Err(PipelineError::Config("empty source reference".to_string()));
    }
    Ok(source_ref.to_string())
}
