use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;

use crate::application::ports::{LlmClient, LlmClientError};
use crate::application::services::model_json::extract_model_json;
use crate::application::services::{prompts, router};
use crate::domain::{DocumentChunk, PartialAnswer, Question, QuestionAnswer, RoutingTable};

/// Terminal answer for a question no chunk produced evidence for. A
/// first-class value, not an error.
pub const INSUFFICIENT_EVIDENCE: &str =
    "Sin evidencia suficiente en el documento para responder esta pregunta.";

/// Cooperative cancellation: the engine stops issuing new LLM calls once
/// set; in-flight calls run to completion.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome decision after a failed map call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapRetry {
    /// Retry once with half the question subset.
    RetryDegraded,
    /// Treat the chunk as having contributed no partial answers.
    GiveUp,
}

/// Degradation policy for map failures, kept as a pure function: quota
/// exhaustion on the first attempt earns one degraded retry, everything
/// else gives up (transport-level retries already happened in the client).
pub fn next_action(attempt: u32, error: &LlmClientError) -> MapRetry {
    match (attempt, error) {
        (0, LlmClientError::QuotaExhausted) => MapRetry::RetryDegraded,
        _ => MapRetry::GiveUp,
    }
}

/// Map-then-reduce answer synthesis over routed chunks.
pub struct AnswerEngine {
    llm: Arc<dyn LlmClient>,
    /// Inter-call delay for quota pacing.
    throttle: Duration,
    /// Concurrent in-flight LLM calls for the map and reduce fan-outs.
    concurrency: usize,
}

impl AnswerEngine {
    pub fn new(llm: Arc<dyn LlmClient>, throttle: Duration, concurrency: usize) -> Self {
        Self {
            llm,
            throttle,
            concurrency: concurrency.max(1),
        }
    }

    /// Run the map step over every chunk with routed questions. Results are
    /// accumulated into per-question buckets at a single collection point,
    /// so no synchronization beyond the stream is needed.
    pub async fn map_all(
        &self,
        system_text: &str,
        base_prompt: &str,
        chunks: &[DocumentChunk],
        routing: &RoutingTable,
        cancel: &CancelFlag,
    ) -> HashMap<String, Vec<PartialAnswer>> {
        let chunk_total = chunks.len();

        let map_futures: Vec<_> = routing
            .assignments
            .iter()
            .filter(|(_, questions)| !questions.is_empty())
            .map(|(&index, questions)| async move {
                if cancel.is_cancelled() {
                    return Vec::new();
                }
                let partials = self
                    .map_chunk(
                        system_text,
                        base_prompt,
                        &chunks[index].text,
                        index,
                        chunk_total,
                        questions,
                    )
                    .await;
                self.pace().await;
                partials
            })
            .collect();

        let per_chunk: Vec<Vec<PartialAnswer>> = futures::stream::iter(map_futures)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut accumulator: HashMap<String, Vec<PartialAnswer>> = HashMap::new();
        for partial in per_chunk.into_iter().flatten() {
            accumulator
                .entry(partial.question_id.clone())
                .or_default()
                .push(partial);
        }
        accumulator
    }

    /// One chunk's map call with quota-aware degradation: on quota
    /// exhaustion, retry once with half the question subset; a second
    /// failure yields zero partials and never aborts the job.
    pub async fn map_chunk(
        &self,
        system_text: &str,
        base_prompt: &str,
        chunk_text: &str,
        chunk_index: usize,
        chunk_total: usize,
        questions: &[Question],
    ) -> Vec<PartialAnswer> {
        match self
            .try_map(system_text, base_prompt, chunk_text, chunk_index, chunk_total, questions)
            .await
        {
            Ok(partials) => partials,
            Err(error) => match next_action(0, &error) {
                MapRetry::RetryDegraded => {
                    let degraded = &questions[..questions.len().div_ceil(2)];
                    tracing::warn!(
                        chunk_index,
                        original = questions.len(),
                        degraded = degraded.len(),
                        "quota exhausted, retrying map with reduced question subset"
                    );
                    match self
                        .try_map(system_text, base_prompt, chunk_text, chunk_index, chunk_total, degraded)
                        .await
                    {
                        Ok(partials) => partials,
                        Err(error) => {
                            tracing::error!(
                                chunk_index,
                                error = %error,
                                "degraded map call failed, chunk contributes no answers"
                            );
                            Vec::new()
                        }
                    }
                }
                MapRetry::GiveUp => {
                    tracing::error!(
                        chunk_index,
                        error = %error,
                        "map call failed, chunk contributes no answers"
                    );
                    Vec::new()
                }
            },
        }
    }

    async fn try_map(
        &self,
        system_text: &str,
        base_prompt: &str,
        chunk_text: &str,
        chunk_index: usize,
        chunk_total: usize,
        questions: &[Question],
    ) -> Result<Vec<PartialAnswer>, LlmClientError> {
        let prompt = prompts::map_prompt(
            system_text,
            base_prompt,
            chunk_index,
            chunk_total,
            chunk_text,
            questions,
        );
        let raw = self.llm.complete(&prompt).await?;
        Ok(parse_map_answers(&raw, chunk_index, questions))
    }

    /// Reduce one question. An empty candidate set short-circuits to the
    /// insufficient-evidence sentinel without touching the LLM.
    pub async fn reduce(
        &self,
        system_text: &str,
        base_prompt: &str,
        question_text: &str,
        partials: &[PartialAnswer],
    ) -> Result<String, LlmClientError> {
        if partials.is_empty() {
            return Ok(INSUFFICIENT_EVIDENCE.to_string());
        }

        let prompt = prompts::reduce_prompt(system_text, base_prompt, question_text, partials);
        let answer = self.llm.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }

    /// Reduce every question concurrently (bounded), preserving detection
    /// order in the output. An irrecoverable reduce failure yields the
    /// sentinel for that question only.
    pub async fn reduce_all(
        &self,
        system_text: &str,
        base_prompt: &str,
        questions: &[Question],
        partials: &HashMap<String, Vec<PartialAnswer>>,
        cancel: &CancelFlag,
    ) -> Vec<QuestionAnswer> {
        let no_partials: Vec<PartialAnswer> = Vec::new();

        let reduce_futures: Vec<_> = questions
            .iter()
            .enumerate()
            .map(|(position, question)| {
                let candidates = partials.get(&question.id).unwrap_or(&no_partials);
                async move {
                    let answer = if cancel.is_cancelled() {
                        INSUFFICIENT_EVIDENCE.to_string()
                    } else {
                        match self
                            .reduce(system_text, base_prompt, &question.text, candidates)
                            .await
                        {
                            Ok(answer) => {
                                if !candidates.is_empty() {
                                    self.pace().await;
                                }
                                answer
                            }
                            Err(error) => {
                                tracing::error!(
                                    question_id = %question.id,
                                    error = %error,
                                    "reduce failed, keeping sentinel answer"
                                );
                                INSUFFICIENT_EVIDENCE.to_string()
                            }
                        }
                    };
                    (
                        position,
                        QuestionAnswer {
                            question: question.text.clone(),
                            answer,
                        },
                    )
                }
            })
            .collect();

        let mut answered: Vec<(usize, QuestionAnswer)> = futures::stream::iter(reduce_futures)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        answered.sort_by_key(|(position, _)| *position);
        answered.into_iter().map(|(_, qa)| qa).collect()
    }

    /// Per-question retry outside the main routing: for each sentinel
    /// answer, map its top-2 ranked chunks directly (single attempt) and
    /// reduce again. On failure the sentinel stands.
    pub async fn fallback_pass(
        &self,
        system_text: &str,
        base_prompt: &str,
        questions: &[Question],
        chunk_texts: &[&str],
        answers: &mut [QuestionAnswer],
        cancel: &CancelFlag,
    ) {
        for (position, question) in questions.iter().enumerate() {
            if answers[position].answer != INSUFFICIENT_EVIDENCE {
                continue;
            }
            if cancel.is_cancelled() {
                break;
            }

            tracing::info!(question_id = %question.id, "retrying unanswered question over top chunks");

            let mut partials = Vec::new();
            for chunk_index in router::rank_chunks(&question.text, chunk_texts)
                .into_iter()
                .take(2)
            {
                match self
                    .try_map(
                        system_text,
                        base_prompt,
                        chunk_texts[chunk_index],
                        chunk_index,
                        chunk_texts.len(),
                        std::slice::from_ref(question),
                    )
                    .await
                {
                    Ok(found) => partials.extend(found),
                    Err(error) => {
                        tracing::warn!(
                            question_id = %question.id,
                            chunk_index,
                            error = %error,
                            "fallback map call failed"
                        );
                    }
                }
                self.pace().await;
            }

            if let Ok(answer) = self
                .reduce(system_text, base_prompt, &question.text, &partials)
                .await
            {
                answers[position].answer = answer;
            }
        }
    }

    async fn pace(&self) {
        if !self.throttle.is_zero() {
            tokio::time::sleep(self.throttle).await;
        }
    }
}

/// Parse the map step's strict-JSON contract. Malformed output or unknown
/// question ids contribute nothing; both are expected, tolerated outcomes.
pub fn parse_map_answers(
    raw: &str,
    chunk_index: usize,
    questions: &[Question],
) -> Vec<PartialAnswer> {
    let Some(value) = extract_model_json(raw) else {
        tracing::warn!(chunk_index, "map output was not parseable JSON");
        return Vec::new();
    };
    let Some(items) = value.get("answers").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let id = item.get("id")?.as_str()?.trim();
            let text = item.get("answer")?.as_str()?.trim();
            if text.is_empty() || !questions.iter().any(|q| q.id == id) {
                return None;
            }
            Some(PartialAnswer {
                question_id: id.to_string(),
                chunk_index,
                text: text.to_string(),
            })
        })
        .collect()
}
