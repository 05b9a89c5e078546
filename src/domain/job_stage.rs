use std::fmt;

/// Pipeline state machine. The small-document branch jumps straight from
/// `DocumentFetched` to `Written`; every other transition follows the listed
/// order. `Failed` is terminal and reachable from any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStage {
    Init,
    AccessChecked,
    PromptsLoaded,
    DocumentFetched,
    Sampled,
    Detected,
    Segmented,
    Routed,
    Mapped,
    Reduced,
    FallbackResolved,
    Written,
    Done,
    Failed(String),
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Init => "INIT",
            JobStage::AccessChecked => "ACCESS_CHECKED",
            JobStage::PromptsLoaded => "PROMPTS_LOADED",
            JobStage::DocumentFetched => "DOCUMENT_FETCHED",
            JobStage::Sampled => "SAMPLED",
            JobStage::Detected => "DETECTED",
            JobStage::Segmented => "SEGMENTED",
            JobStage::Routed => "ROUTED",
            JobStage::Mapped => "MAPPED",
            JobStage::Reduced => "REDUCED",
            JobStage::FallbackResolved => "FALLBACK_RESOLVED",
            JobStage::Written => "WRITTEN",
            JobStage::Done => "DONE",
            JobStage::Failed(_) => "FAILED",
        }
    }

    /// Percentage milestone reported to the progress sink when this stage is
    /// reached.
    pub fn progress_percent(&self) -> u8 {
        match self {
            JobStage::Init => 0,
            JobStage::AccessChecked => 5,
            JobStage::PromptsLoaded => 10,
            JobStage::DocumentFetched => 15,
            JobStage::Sampled => 25,
            JobStage::Detected => 35,
            JobStage::Segmented => 45,
            JobStage::Routed => 50,
            JobStage::Mapped => 75,
            JobStage::Reduced => 90,
            JobStage::FallbackResolved => 95,
            JobStage::Written => 99,
            JobStage::Done => 100,
            JobStage::Failed(_) => 100,
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Failed(reason) => write!(f, "FAILED: {}", reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
