use std::collections::{BTreeSet, HashMap};

use crate::domain::{Question, RoutingTable};

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Preferred chunks per question in the preliminary assignment.
    pub k_top: usize,
    /// Minimum distinct chunks each question must be routed to.
    pub min_cover: usize,
    /// Maximum questions per chunk after spill resolution.
    pub chunk_cap: usize,
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn score(question_tokens: &[String], chunk_counts: &HashMap<String, usize>) -> usize {
    question_tokens
        .iter()
        .map(|t| chunk_counts.get(t).copied().unwrap_or(0))
        .sum()
}

fn token_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// All chunk indices ordered by descending relevance to the question, ties
/// broken by ascending index. Zero-score chunks are included at the tail, so
/// the order is deterministic even for degenerate chunk texts.
pub fn rank_chunks(question_text: &str, chunk_texts: &[&str]) -> Vec<usize> {
    let question_tokens = tokenize(question_text);
    let mut scored: Vec<(usize, usize)> = chunk_texts
        .iter()
        .enumerate()
        .map(|(i, text)| (i, score(&question_tokens, &token_counts(text))))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(i, _)| i).collect()
}

/// Candidate chunks for one question. When every score is zero the list
/// falls back to the first `max(k_top, min_cover)` chunks by index, so
/// routing always succeeds.
fn candidate_chunks(question_text: &str, chunk_texts: &[&str], config: &RouterConfig) -> Vec<usize> {
    let question_tokens = tokenize(question_text);
    let mut scored: Vec<(usize, usize)> = chunk_texts
        .iter()
        .enumerate()
        .map(|(i, text)| (i, score(&question_tokens, &token_counts(text))))
        .collect();

    if scored.iter().all(|(_, s)| *s == 0) {
        let take = config.k_top.max(config.min_cover).min(chunk_texts.len());
        return (0..take).collect();
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(i, _)| i).collect()
}

/// Assign each question to chunks under the coverage and capacity
/// constraints.
///
/// 1. Preliminary: each question lands on its top `k_top` candidates.
/// 2. Coverage: questions below `min_cover` gain sentinel chunks (index 0,
///    then the last index, skipping duplicates) until covered or sentinels
///    run out.
/// 3. Capacity, in chunk-index order: an over-cap chunk keeps the questions
///    that prefer it most (ranked by the chunk's position in each question's
///    own candidate list) and spills the rest to their next-preferred chunk
///    with free capacity.
/// 4. Unplaceable questions are force-appended to the last chunk, the one
///    permitted capacity violation.
pub fn route(questions: &[Question], chunk_texts: &[&str], config: &RouterConfig) -> RoutingTable {
    let chunk_count = chunk_texts.len();
    if questions.is_empty() || chunk_count == 0 {
        return RoutingTable::default();
    }

    let candidates: Vec<Vec<usize>> = questions
        .iter()
        .map(|q| candidate_chunks(&q.text, chunk_texts, config))
        .collect();

    let mut lists: Vec<Vec<usize>> = vec![Vec::new(); chunk_count];
    let mut cover: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); questions.len()];

    for (qi, cands) in candidates.iter().enumerate() {
        for &chunk in cands.iter().take(config.k_top) {
            lists[chunk].push(qi);
            cover[qi].insert(chunk);
        }
    }

    let mut sentinels = vec![0, chunk_count - 1];
    sentinels.dedup();
    for qi in 0..questions.len() {
        for &sentinel in &sentinels {
            if cover[qi].len() >= config.min_cover {
                break;
            }
            if cover[qi].insert(sentinel) {
                lists[sentinel].push(qi);
            }
        }
    }

    let mut overflow: Vec<usize> = Vec::new();
    for chunk in 0..chunk_count {
        if lists[chunk].len() <= config.chunk_cap {
            continue;
        }

        let mut assigned = std::mem::take(&mut lists[chunk]);
        // Lower rank = the question prefers this chunk more; sentinel-only
        // placements rank last. Stable sort keeps assignment order on ties.
        assigned.sort_by_key(|&qi| {
            candidates[qi]
                .iter()
                .position(|&c| c == chunk)
                .unwrap_or(usize::MAX)
        });

        let spilled = assigned.split_off(config.chunk_cap);
        lists[chunk] = assigned;

        for qi in spilled {
            cover[qi].remove(&chunk);

            let placed = candidates[qi]
                .iter()
                .find(|&&alt| {
                    alt != chunk && !cover[qi].contains(&alt) && lists[alt].len() < config.chunk_cap
                })
                .copied();

            match placed {
                Some(alt) => {
                    lists[alt].push(qi);
                    cover[qi].insert(alt);
                }
                None => overflow.push(qi),
            }
        }
    }

    let last = chunk_count - 1;
    for qi in overflow {
        if cover[qi].insert(last) {
            lists[last].push(qi);
        }
    }

    let mut table = RoutingTable::default();
    for (chunk, assigned) in lists.into_iter().enumerate() {
        if assigned.is_empty() {
            continue;
        }
        table.assignments.insert(
            chunk,
            assigned.iter().map(|&qi| questions[qi].clone()).collect(),
        );
    }
    for (qi, chunks) in cover.into_iter().enumerate() {
        table.coverage.insert(questions[qi].id.clone(), chunks);
    }

    table
}
