use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use montoro::application::ports::{
    BlobStore, DocumentStore, LlmClient, NullProgressSink, ProgressSink,
};
use montoro::application::services::{BackQuestionsPipeline, DirectPipeline};
use montoro::infrastructure::google::{DriveBlobStore, GoogleDocsStore, SheetsProgressSink};
use montoro::infrastructure::llm::{MockLlmClient, VertexClient};
use montoro::infrastructure::observability::{TracingConfig, init_tracing};
use montoro::infrastructure::pdf::LopdfEngine;
use montoro::infrastructure::stores::{InMemoryDocumentStore, LocalBlobStore};
use montoro::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::default());
    let settings = Settings::from_env();

    let token = settings.google.access_token.clone();

    let (docs, blobs, llm): (Arc<dyn DocumentStore>, Arc<dyn BlobStore>, Arc<dyn LlmClient>) =
        if token.is_empty() {
            tracing::warn!("GOOGLE_ACCESS_TOKEN not set, wiring local adapters");
            (
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(LocalBlobStore::new(
                    std::env::temp_dir().join("montoro-staging"),
                )?),
                Arc::new(MockLlmClient),
            )
        } else {
            (
                Arc::new(GoogleDocsStore::new(token.clone())),
                Arc::new(DriveBlobStore::new(token.clone())),
                Arc::new(VertexClient::new(
                    settings.llm.project_id.clone(),
                    settings.llm.location.clone(),
                    settings.llm.model_id.clone(),
                    token.clone(),
                )),
            )
        };

    let progress: Arc<dyn ProgressSink> = match &settings.google.progress_sheet_id {
        Some(sheet_id) => Arc::new(SheetsProgressSink::new(
            token,
            sheet_id.clone(),
            settings.google.progress_cell.clone(),
        )),
        None => Arc::new(NullProgressSink),
    };

    let pdf = Arc::new(LopdfEngine::new());

    let back_questions = Arc::new(BackQuestionsPipeline::new(
        Arc::clone(&docs),
        blobs,
        Arc::clone(&llm),
        pdf,
        progress,
        settings.pipeline_config(),
    ));
    let direct = Arc::new(DirectPipeline::new(docs, llm));

    let state = AppState {
        back_questions,
        direct,
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
