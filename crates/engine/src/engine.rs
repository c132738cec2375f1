use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::config::DedupeOptions;
use crate::dedupe::{dedupe_records, DedupeResult};
use crate::merge::{auto_resolve, resolve_directed, MergeDecision, MergeOutcome};
use crate::model::{assign_ids, Record};
use crate::reconcile::{reconcile, DedupeSummary};

/// How near-duplicate groups are settled during [`run`].
pub enum Resolution<'a> {
    /// Keep the best record of every group.
    Auto,
    /// Leave every group untouched.
    KeepAll,
    /// Ask the caller per group (1-based index, group members).
    Directed(&'a mut dyn FnMut(usize, &[Record]) -> MergeDecision),
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dedupe: DedupeResult,
    pub outcome: MergeOutcome,
    pub final_records: Vec<Record>,
    pub audit: AuditLog,
    pub summary: DedupeSummary,
}

/// Run the whole pipeline over imported records.
///
/// Engine-owned annotation keys already present on the input are dropped
/// before ids are assigned.
pub fn run(mut records: Vec<Record>, options: &DedupeOptions, resolution: Resolution<'_>) -> RunOutput {
    let stripped: usize = records.iter_mut().map(Record::strip_engine_keys).sum();
    if stripped > 0 {
        warn!(stripped, "dropped engine-owned annotation columns from input");
    }

    let assigned = assign_ids(&mut records);
    if assigned > 0 {
        info!(assigned, "assigned internal identifiers");
    }

    let dedupe = dedupe_records(&records, options);

    let outcome = if dedupe.near_duplicate_groups.is_empty() {
        MergeOutcome::default()
    } else {
        match resolution {
            Resolution::Auto => auto_resolve(&dedupe.near_duplicate_groups),
            Resolution::KeepAll => MergeOutcome {
                untouched_groups: (1..=dedupe.near_duplicate_groups.len()).collect(),
                ..MergeOutcome::default()
            },
            Resolution::Directed(decide) => resolve_directed(&dedupe.near_duplicate_groups, decide),
        }
    };

    let final_records = reconcile(&dedupe.kept, &outcome.survivors, &outcome.discarded);

    let mut audit = AuditLog::new();
    audit.record_dedupe(&dedupe);
    audit.record_outcome(&outcome);

    let summary = DedupeSummary::new(&dedupe, &outcome, &final_records);
    info!(
        input = summary.input,
        auto_removed = summary.auto_removed,
        near_groups = summary.near_groups,
        resolved = summary.near_groups_resolved,
        final_count = summary.final_count,
        "run complete"
    );

    RunOutput {
        dedupe,
        outcome,
        final_records,
        audit,
        summary,
    }
}
