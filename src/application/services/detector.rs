use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::application::ports::{AttachmentRef, LlmClient};
use crate::application::services::model_json::extract_model_json;
use crate::application::services::prompts;
use crate::domain::Question;

/// Heading variants that mark a follow-up-question section. A detected entry
/// without a question mark survives the post-filter only when its heading
/// matches one of these.
const HEADING_VARIANTS: [&str; 7] = [
    r"preguntas?\s+de\s+regreso",
    r"preguntas?\s+de\s+seguimiento",
    r"preguntas?\s+para\s+el\s+cliente",
    r"seguimiento",
    r"back\s*questions?",
    r"follow[-\s]?up",
    r"preguntas?\s+pendientes?",
];

static VARIANT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HEADING_VARIANTS
        .iter()
        .map(|v| Regex::new(&format!("(?i){v}")).unwrap())
        .collect()
});

static INTERROGATIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"¿[^?¿]+\?").unwrap());

fn heading_matches(heading: &str) -> bool {
    VARIANT_PATTERNS.iter().any(|re| re.is_match(heading))
}

/// Detects candidate follow-up questions in the sampled pages: an LLM pass
/// over the sample, with a local regex pass as the no-spend fallback.
pub struct QuestionDetector {
    llm: Arc<dyn LlmClient>,
}

impl QuestionDetector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Model pass first; when it yields nothing (failure, unparseable JSON
    /// or genuinely no questions), the regex fallback runs over the locally
    /// extracted sample text.
    pub async fn detect(
        &self,
        sample_text: &str,
        attachment: Option<&AttachmentRef>,
        max_questions: usize,
    ) -> Vec<Question> {
        let questions = self.detect_via_model(sample_text, attachment, max_questions).await;
        if !questions.is_empty() {
            return questions;
        }

        tracing::info!("model detection empty, trying regex fallback");
        detect_via_regex(sample_text)
    }

    pub async fn detect_via_model(
        &self,
        sample_text: &str,
        attachment: Option<&AttachmentRef>,
        max_questions: usize,
    ) -> Vec<Question> {
        let prompt = prompts::detection_prompt(max_questions);

        let raw = match attachment {
            Some(attachment) => {
                self.llm
                    .complete_with_attachments(&prompt, std::slice::from_ref(attachment))
                    .await
            }
            None => {
                self.llm
                    .complete(&format!("{prompt}\n\n[SAMPLE]\n{}", sample_text.trim()))
                    .await
            }
        };

        match raw {
            Ok(raw) => parse_detection(&raw, max_questions),
            Err(e) => {
                tracing::warn!(error = %e, "question detection call failed");
                Vec::new()
            }
        }
    }
}

/// Parse and post-filter the model's detection JSON. Unparseable output is
/// an empty list, not an error, so the caller can fall back.
pub fn parse_detection(raw: &str, max_questions: usize) -> Vec<Question> {
    let Some(value) = extract_model_json(raw) else {
        tracing::warn!("detection output was not parseable JSON");
        return Vec::new();
    };
    let Some(items) = value.get("questions").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let Ok(mut question) = serde_json::from_value::<Question>(item.clone()) else {
            continue;
        };

        question.text = question.text.trim().to_string();
        if question.text.is_empty() {
            continue;
        }
        if !question.text.contains('?') {
            let heading_ok = question
                .section_heading
                .as_deref()
                .is_some_and(heading_matches);
            if !heading_ok {
                continue;
            }
        }
        if question.id.trim().is_empty() {
            question.id = format!("q{}", idx + 1);
        }

        out.push(question);
        if out.len() == max_questions {
            break;
        }
    }

    out
}

/// Local fallback detector. Fires only when a heading variant appears
/// somewhere in the sample; collects each `¿...?` span as a standalone
/// question. Never calls the LLM.
pub fn detect_via_regex(sample_text: &str) -> Vec<Question> {
    if !heading_matches(sample_text) {
        return Vec::new();
    }

    let mut out = Vec::new();
    for line in sample_text.lines() {
        for span in INTERROGATIVE.find_iter(line) {
            out.push(Question::new(
                format!("q{}", out.len() + 1),
                span.as_str().trim(),
            ));
        }
    }
    out
}
