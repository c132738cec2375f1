//! Final output assembly and per-record traceability.

use std::collections::HashSet;

use serde::Serialize;

use crate::dedupe::DedupeResult;
use crate::merge::MergeOutcome;
use crate::model::Record;

/// Build the final record list.
///
/// Kept records survive unless discarded or named as a merge source by a
/// survivor; survivors not already present by identifier follow, in order.
/// No identifier appears twice in the result.
pub fn reconcile(kept: &[Record], survivors: &[Record], discarded: &[Record]) -> Vec<Record> {
    let discarded_ids: HashSet<&str> = discarded
        .iter()
        .map(Record::id_str)
        .filter(|id| !id.is_empty())
        .collect();
    let replaced_ids: HashSet<String> = survivors
        .iter()
        .flat_map(Record::merged_from)
        .map(|id| id.as_str().to_string())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(kept.len());

    for record in kept {
        let id = record.id_str();
        if discarded_ids.contains(id) || replaced_ids.contains(id) {
            continue;
        }
        // Records without identifiers cannot collide; keep them all.
        if !id.is_empty() && !seen.insert(id.to_string()) {
            continue;
        }
        out.push(record.clone());
    }

    for survivor in survivors {
        let id = survivor.id_str();
        if !id.is_empty() && !seen.insert(id.to_string()) {
            continue;
        }
        out.push(survivor.clone());
    }
    out
}

/// Where an input record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFate {
    Kept,
    AutoRemoved,
    PendingNearDuplicate,
    MergedSurvivor,
    MergedDiscard,
}

/// Classify `id` into exactly one fate. `None` if the run never saw it.
pub fn record_fate(id: &str, dedupe: &DedupeResult, outcome: &MergeOutcome) -> Option<RecordFate> {
    let has = |records: &[Record]| records.iter().any(|r| r.id_str() == id);

    if has(dedupe.removed_exact.as_slice()) {
        return Some(RecordFate::AutoRemoved);
    }
    if has(outcome.discarded.as_slice()) {
        return Some(RecordFate::MergedDiscard);
    }
    if has(outcome.survivors.as_slice()) {
        return Some(RecordFate::MergedSurvivor);
    }
    if dedupe.near_duplicate_groups.iter().any(|g| has(g.as_slice())) {
        return Some(RecordFate::PendingNearDuplicate);
    }
    if has(dedupe.kept.as_slice()) {
        return Some(RecordFate::Kept);
    }
    None
}

/// Counts for one run, suitable for logging and `--json` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupeSummary {
    pub input: usize,
    pub kept: usize,
    pub auto_removed: usize,
    pub exact_groups: usize,
    pub near_groups: usize,
    pub near_groups_resolved: usize,
    pub merged_discarded: usize,
    pub final_count: usize,
}

impl DedupeSummary {
    pub fn new(dedupe: &DedupeResult, outcome: &MergeOutcome, final_records: &[Record]) -> Self {
        Self {
            input: dedupe.input_count(),
            kept: dedupe.kept.len(),
            auto_removed: dedupe.removed_exact.len(),
            exact_groups: dedupe.exact_groups.len(),
            near_groups: dedupe.near_duplicate_groups.len(),
            near_groups_resolved: outcome.survivors.len(),
            merged_discarded: outcome.discarded.len(),
            final_count: final_records.len(),
        }
    }
}
