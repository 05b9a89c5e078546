use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use montoro::application::ports::{
    AttachmentRef, BlobStore, BlobStoreError, DocumentStore, DocumentStoreError, LlmClient,
    LlmClientError, NullProgressSink, PdfEngine, PdfEngineError,
};
use montoro::application::services::{
    BackQuestionsPipeline, JobRequest, PipelineConfig, PipelineError, resolve_source_id,
};
use montoro::infrastructure::stores::InMemoryDocumentStore;

const PAGE_SEPARATOR: char = '\u{000C}';

/// Test PDF engine: a "document" is page texts joined by form feeds.
struct TextPdf;

fn split_pages(data: &Bytes) -> Vec<String> {
    if data.is_empty() {
        return Vec::new();
    }
    String::from_utf8_lossy(data)
        .split(PAGE_SEPARATOR)
        .map(str::to_string)
        .collect()
}

fn join_pages(pages: &[String]) -> Bytes {
    Bytes::from(pages.join(&PAGE_SEPARATOR.to_string()))
}

#[async_trait]
impl PdfEngine for TextPdf {
    async fn page_count(&self, data: &Bytes) -> Result<usize, PdfEngineError> {
        Ok(split_pages(data).len())
    }

    async fn extract_page_texts(&self, data: &Bytes) -> Result<Vec<String>, PdfEngineError> {
        Ok(split_pages(data))
    }

    async fn subset(&self, data: &Bytes, pages: &[usize]) -> Result<Bytes, PdfEngineError> {
        let all = split_pages(data);
        let selected: Vec<String> = pages
            .iter()
            .map(|&p| all.get(p).cloned().ok_or(PdfEngineError::PageOutOfRange(p)))
            .collect::<Result<_, _>>()?;
        Ok(join_pages(&selected))
    }
}

struct FakeBlobs {
    files: Mutex<HashMap<String, Bytes>>,
}

impl FakeBlobs {
    fn with_file(file_id: &str, data: Bytes) -> Arc<Self> {
        Arc::new(Self {
            files: Mutex::new(HashMap::from([(file_id.to_string(), data)])),
        })
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn download(&self, file_id: &str) -> Result<Bytes, BlobStoreError> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(file_id.to_string()))
    }

    async fn upload(
        &self,
        bucket: &str,
        _data: Bytes,
        suffix: &str,
    ) -> Result<String, BlobStoreError> {
        Ok(format!("gs://{bucket}/staged{suffix}"))
    }
}

/// Responds by prompt shape, so call ordering never matters.
struct KeywordLlm {
    prompts: Mutex<Vec<String>>,
}

impl KeywordLlm {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for KeywordLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.contains("extractor de 'Preguntas") {
            return Ok(r#"{"questions": [
                {"id": "q1", "text": "¿Mencionó la coyote 'Flaca' alguna amenaza?"},
                {"id": "q2", "text": "¿Usaron armas durante los 10 días?"}
            ]}"#
                .to_string());
        }
        if prompt.contains("[INPUT_CHUNK 1/2]") {
            return Ok(
                r#"{"chunk_id": 0, "answers": [{"id": "q1", "answer": "La Flaca amenazó al grupo."}]}"#
                    .to_string(),
            );
        }
        if prompt.contains("[INPUT_CHUNK 2/2]") {
            return Ok(
                r#"{"chunk_id": 1, "answers": [{"id": "q2", "answer": "Había hombres armados."}]}"#
                    .to_string(),
            );
        }
        if prompt.contains("[PREGUNTA]") && prompt.contains("Flaca") {
            return Ok("Sí, la 'Flaca' profirió amenazas según el relato.".to_string());
        }
        if prompt.contains("[PREGUNTA]") && prompt.contains("armas") {
            return Ok("Sí, hombres armados vigilaban durante el trayecto.".to_string());
        }
        if prompt.contains("[INPUT]") {
            return Ok("Resumen directo del expediente.".to_string());
        }

        let preview: String = prompt.chars().take(80).collect();
        Err(LlmClientError::ApiRequestFailed(format!(
            "prompt inesperado: {preview}"
        )))
    }

    async fn complete_with_attachments(
        &self,
        prompt: &str,
        _attachments: &[AttachmentRef],
    ) -> Result<String, LlmClientError> {
        self.complete(prompt).await
    }
}

/// Detection-only variant that reports no questions.
struct NoQuestionsLlm {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmClient for NoQuestionsLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("extractor de 'Preguntas") {
            return Ok(r#"{"questions": []}"#.to_string());
        }
        Err(LlmClientError::ApiRequestFailed(
            "sólo se esperaba detección".to_string(),
        ))
    }

    async fn complete_with_attachments(
        &self,
        prompt: &str,
        _attachments: &[AttachmentRef],
    ) -> Result<String, LlmClientError> {
        self.complete(prompt).await
    }
}

fn config() -> PipelineConfig {
    PipelineConfig {
        sampling_first_pages: 2,
        sampling_last_pages: 2,
        detect_limit: 50,
        pages_per_chunk: 50,
        small_doc_threshold: 80,
        k_top: 1,
        min_cover: 1,
        chunk_cap: 5,
        throttle: Duration::ZERO,
        concurrency: 1,
        staging_bucket: String::new(),
        base_prompt_ids: HashMap::new(),
    }
}

fn large_document() -> Bytes {
    // 100 pages; evidence for q1 lives in the first half, q2 in the second.
    let pages: Vec<String> = (0..100)
        .map(|i| {
            if i < 50 {
                format!("Página {i}. La Flaca repetía sus amenazas al grupo.")
            } else {
                format!("Página {i}. Hombres con armas vigilaban los días enteros.")
            }
        })
        .collect();
    join_pages(&pages)
}

fn prompt_docs() -> Arc<InMemoryDocumentStore> {
    Arc::new(
        InMemoryDocumentStore::new()
            .with_document("sys-doc", "Instrucciones del sistema.")
            .with_document("base-doc", "Prompt base del caso."),
    )
}

fn request() -> JobRequest {
    JobRequest {
        system_instructions_ref: "sys-doc".to_string(),
        base_prompt_ref: Some("base-doc".to_string()),
        source_ref: "file-1".to_string(),
        output_ref: "out-doc".to_string(),
        sampling_first_pages: None,
        sampling_last_pages: None,
        additional_params: serde_json::Map::new(),
    }
}

fn pipeline(
    docs: Arc<InMemoryDocumentStore>,
    blobs: Arc<FakeBlobs>,
    llm: Arc<dyn LlmClient>,
    config: PipelineConfig,
) -> BackQuestionsPipeline {
    BackQuestionsPipeline::new(
        docs,
        blobs,
        llm,
        Arc::new(TextPdf),
        Arc::new(NullProgressSink),
        config,
    )
}

#[tokio::test]
async fn given_large_document_when_running_then_answers_are_written_in_order() {
    let docs = prompt_docs();
    let blobs = FakeBlobs::with_file("file-1", large_document());
    let llm = KeywordLlm::new();

    let outcome = pipeline(Arc::clone(&docs), blobs, llm.clone(), config())
        .run(request())
        .await
        .expect("job succeeds");

    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.message, "Q/A escritos en el documento.");

    let written = docs.document("out-doc").expect("output written");
    assert!(written.contains("## 1. ¿Mencionó la coyote 'Flaca' alguna amenaza?"));
    assert!(written.contains("## 2. ¿Usaron armas durante los 10 días?"));
    assert!(written.contains("profirió amenazas"));
    assert!(written.contains("hombres armados vigilaban"));

    let first = written.find("## 1.").unwrap();
    let second = written.find("## 2.").unwrap();
    assert!(first < second, "answers must follow detection order");
}

#[tokio::test]
async fn given_small_document_when_running_then_direct_path_skips_detection() {
    let docs = prompt_docs();
    let pages: Vec<String> = (0..10).map(|i| format!("Página {i}.")).collect();
    let blobs = FakeBlobs::with_file("file-1", join_pages(&pages));
    let llm = KeywordLlm::new();

    let outcome = pipeline(Arc::clone(&docs), blobs, llm.clone(), config())
        .run(request())
        .await
        .expect("job succeeds");

    assert_eq!(outcome.status, "success");
    assert_eq!(
        outcome.message,
        "El resultado de la IA fue escrito correctamente en el documento."
    );
    assert_eq!(
        docs.document("out-doc").as_deref(),
        Some("Resumen directo del expediente.")
    );

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1, "exactly one whole-document call");
    assert!(
        prompts.iter().all(|p| !p.contains("extractor de 'Preguntas")),
        "small documents must never reach the detector"
    );
}

#[tokio::test]
async fn given_no_questions_detected_when_running_then_empty_report_and_success() {
    let docs = prompt_docs();
    // Neutral content: no heading variants, so the regex fallback stays empty.
    let pages: Vec<String> = (0..100).map(|i| format!("Contenido neutro {i}.")).collect();
    let blobs = FakeBlobs::with_file("file-1", join_pages(&pages));
    let llm = Arc::new(NoQuestionsLlm {
        prompts: Mutex::new(Vec::new()),
    });

    let outcome = pipeline(Arc::clone(&docs), blobs, llm, config())
        .run(request())
        .await
        .expect("no questions is success, not error");

    assert_eq!(outcome.status, "success");
    assert_eq!(
        outcome.message,
        "No se detectaron preguntas de regreso en el documento."
    );

    let written = docs.document("out-doc").expect("empty report still written");
    assert!(written.starts_with("# Respuestas"));
    assert!(!written.contains("## 1."));
}

#[tokio::test]
async fn given_unresolvable_base_prompt_when_running_then_config_error_before_any_spend() {
    let docs = prompt_docs();
    let blobs = FakeBlobs::with_file("file-1", large_document());
    let llm = KeywordLlm::new();

    let mut job = request();
    job.base_prompt_ref = None;

    let error = pipeline(docs, blobs, llm.clone(), config())
        .run(job)
        .await
        .expect_err("missing base prompt must fail");

    assert!(matches!(error, PipelineError::Config(_)));
    assert!(llm.prompts().is_empty(), "no LLM spend on config errors");
}

#[tokio::test]
async fn given_visa_type_mapping_when_resolving_then_default_entry_is_fallback() {
    let docs = Arc::new(
        InMemoryDocumentStore::new()
            .with_document("sys-doc", "Instrucciones.")
            .with_document("base-default", "Prompt base genérico."),
    );
    let pages: Vec<String> = (0..10).map(|i| format!("Página {i}.")).collect();
    let blobs = FakeBlobs::with_file("file-1", join_pages(&pages));
    let llm = KeywordLlm::new();

    let mut cfg = config();
    cfg.base_prompt_ids = HashMap::from([("default".to_string(), "base-default".to_string())]);

    let mut job = request();
    job.base_prompt_ref = None;
    job.additional_params
        .insert("visa_type".to_string(), serde_json::json!("T-VISA"));

    let outcome = pipeline(docs, blobs, llm, cfg)
        .run(job)
        .await
        .expect("default mapping resolves");

    assert_eq!(outcome.status, "success");
}

#[tokio::test]
async fn given_gs_source_when_resolving_then_config_error() {
    let error = resolve_source_id("gs://bucket/archivo.pdf").expect_err("gs:// rejected");
    assert!(matches!(error, PipelineError::Config(_)));
}

#[test]
fn given_drive_url_when_resolving_then_file_id_is_extracted() {
    let id = resolve_source_id("https://drive.google.com/file/d/abc123_XYZ-9/view?usp=sharing")
        .expect("drive URL resolves");
    assert_eq!(id, "abc123_XYZ-9");

    let raw = resolve_source_id("plain-file-id").expect("raw ids pass through");
    assert_eq!(raw, "plain-file-id");
}

/// Store that denies access to everything: jobs must fail fast.
struct DenyingStore;

#[async_trait]
impl DocumentStore for DenyingStore {
    async fn check_access(&self, doc_id: &str) -> Result<(), DocumentStoreError> {
        Err(DocumentStoreError::AccessDenied(doc_id.to_string()))
    }

    async fn get_text(&self, doc_id: &str) -> Result<String, DocumentStoreError> {
        Err(DocumentStoreError::AccessDenied(doc_id.to_string()))
    }

    async fn write(&self, doc_id: &str, _text: &str) -> Result<(), DocumentStoreError> {
        Err(DocumentStoreError::AccessDenied(doc_id.to_string()))
    }
}

#[tokio::test]
async fn given_denied_store_access_when_running_then_job_fails_without_llm_spend() {
    let blobs = FakeBlobs::with_file("file-1", large_document());
    let llm = KeywordLlm::new();

    let error = BackQuestionsPipeline::new(
        Arc::new(DenyingStore),
        blobs,
        llm.clone(),
        Arc::new(TextPdf),
        Arc::new(NullProgressSink),
        config(),
    )
    .run(request())
    .await
    .expect_err("access denial is fatal");

    assert!(matches!(
        error,
        PipelineError::Store(DocumentStoreError::AccessDenied(_))
    ));
    assert!(llm.prompts().is_empty());
}
