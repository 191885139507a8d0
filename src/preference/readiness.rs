//! Readiness Marker - per-trial "comparison ready" flag

use tracing::debug;

use super::keys::SYSTEM_ATTR_COMPARISON_READY;
use crate::storage::{StudyId, TrialStorage};
use crate::trial::{FrozenTrial, Trial};
use crate::{Error, Result};

/// Reference to a trial of a study: a live handle or a trial number.
#[derive(Debug)]
pub enum TrialRef<'a, S> {
    /// Live handle returned by `ask`.
    Handle(&'a Trial<S>),
    /// Trial number within the study.
    Number(u64),
}

impl<'a, S> From<&'a Trial<S>> for TrialRef<'a, S> {
    fn from(trial: &'a Trial<S>) -> Self {
        Self::Handle(trial)
    }
}

impl<S> From<u64> for TrialRef<'_, S> {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

/// Mark a trial as ready to be compared.
///
/// Idempotent. No operation ever resets the flag.
///
/// # Errors
///
/// Returns `InvalidArgument` for a handle from another study,
/// `TrialNotFound` for an unknown number, or any storage error.
pub async fn mark_comparison_ready<S: TrialStorage>(
    storage: &S,
    study_id: StudyId,
    trial: TrialRef<'_, S>,
) -> Result<()> {
    let trial_id = match trial {
        TrialRef::Handle(handle) => {
            if handle.study_id() != study_id {
                return Err(Error::InvalidArgument(format!(
                    "trial #{} belongs to study id {}, not {study_id}",
                    handle.number(),
                    handle.study_id()
                )));
            }
            handle.trial_id()
        }
        TrialRef::Number(number) => {
            storage
                .get_trial_id_from_study_id_trial_number(study_id, number)
                .await?
        }
    };
    storage
        .set_trial_system_attr(trial_id, SYSTEM_ATTR_COMPARISON_READY, serde_json::Value::Bool(true))
        .await?;
    debug!(%study_id, %trial_id, "marked trial comparison-ready");
    Ok(())
}

/// Whether a trial carries the readiness flag.
#[must_use]
pub fn is_comparison_ready(trial: &FrozenTrial) -> bool {
    trial
        .system_attrs()
        .get(SYSTEM_ATTR_COMPARISON_READY)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}
