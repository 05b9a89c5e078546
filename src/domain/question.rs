use serde::Deserialize;

/// A follow-up question detected in the sampled pages.
///
/// `id` is unique within a job and is the key used for routing and for
/// reduction of partial answers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub page_hint: Option<u32>,
    #[serde(default)]
    pub section_heading: Option<String>,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            page_hint: None,
            section_heading: None,
        }
    }
}
