//! Non-dominated frontier of a preferential study
//!
//! The frontier is every ready trial that was never reported as worse than
//! another trial:
//!
//! ```text
//! R = { t : t.state in {Complete, Running} and t is comparison-ready }
//! W = { s.worse : s in ledger }
//! frontier = { t in R : t.number not in W }
//! ```
//!
//! This is a set difference, not a ranking. Preference cycles are left
//! alone: with (A, B) and (B, A) recorded, both A and B are out.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::ledger::{PreferenceLedger, PreferenceStatement};
use super::readiness::is_comparison_ready;
use crate::storage::{StudyId, TrialStorage};
use crate::trial::{FrozenTrial, TrialState};
use crate::Result;

/// Select the frontier from candidate trials and ledger statements.
///
/// Candidates outside {Complete, Running} or without the readiness flag are
/// skipped. Returned trials are owned copies in candidate order. Runs in
/// O(candidates + statements).
#[must_use]
pub fn select_frontier(
    candidates: &[Arc<FrozenTrial>],
    statements: &[PreferenceStatement],
) -> Vec<FrozenTrial> {
    let worse: HashSet<u64> = statements.iter().map(|s| s.worse).collect();
    candidates
        .iter()
        .filter(|trial| TrialState::COMPARABLE.contains(&trial.state()))
        .filter(|trial| is_comparison_ready(trial))
        .filter(|trial| !worse.contains(&trial.number()))
        .map(|trial| FrozenTrial::clone(trial))
        .collect()
}

/// Compute the frontier of a study from its storage.
///
/// Trials and ledger are read with two separate calls; a preference reported
/// in between may or may not be reflected.
///
/// # Errors
///
/// Propagates storage and ledger errors.
pub async fn get_best_trials<S: TrialStorage>(
    storage: &S,
    study_id: StudyId,
) -> Result<Vec<FrozenTrial>> {
    let ready_pool = storage
        .get_all_trials(study_id, Some(&TrialState::COMPARABLE[..]))
        .await?;
    let statements = PreferenceLedger::new(storage, study_id).read_all().await?;
    let best = select_frontier(&ready_pool, &statements);
    debug!(
        %study_id,
        candidates = ready_pool.len(),
        statements = statements.len(),
        best = best.len(),
        "computed preference frontier"
    );
    Ok(best)
}
