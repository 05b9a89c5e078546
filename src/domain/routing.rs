use std::collections::{BTreeMap, BTreeSet};

use super::Question;

/// Assignment of questions to chunks, plus the per-question set of covering
/// chunk indices.
///
/// Coverage is kept alongside the assignments so callers (and tests) can
/// verify the minimum-coverage invariant without re-deriving it.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    pub assignments: BTreeMap<usize, Vec<Question>>,
    pub coverage: BTreeMap<String, BTreeSet<usize>>,
}

impl RoutingTable {
    pub fn questions_for(&self, chunk_index: usize) -> &[Question] {
        self.assignments
            .get(&chunk_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn coverage_of(&self, question_id: &str) -> usize {
        self.coverage.get(question_id).map_or(0, BTreeSet::len)
    }
}
