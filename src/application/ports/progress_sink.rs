use async_trait::async_trait;

/// Fire-and-forget progress reporting. Implementations swallow and log their
/// own failures; a broken sink must never abort a job.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, status: &str, link: Option<&str>);
}

/// Sink that only logs. Used when no spreadsheet is configured.
pub struct NullProgressSink;

#[async_trait]
impl ProgressSink for NullProgressSink {
    async fn report(&self, status: &str, link: Option<&str>) {
        tracing::info!(status, link, "progress");
    }
}
