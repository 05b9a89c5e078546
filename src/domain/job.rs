use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::JobStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// One pipeline invocation. Everything a job creates lives and dies with it;
/// only configuration persists across jobs.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub stage: JobStage,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new() -> Self {
        Self {
            id: JobId::new(),
            stage: JobStage::Init,
            created_at: Utc::now(),
        }
    }

    pub fn advance(&mut self, stage: JobStage) {
        self.stage = stage;
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}
