use serde::Serialize;

/// A chunk-level answer, produced only when the map step found supporting
/// evidence for the question inside that chunk. Absence is an expected
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialAnswer {
    pub question_id: String,
    pub chunk_index: usize,
    pub text: String,
}

/// Final reduced output, one per detected question, in detection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}
