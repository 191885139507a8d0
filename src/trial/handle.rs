//! Live trial handle returned by `ask`

use std::fmt;
use std::sync::Arc;

use crate::storage::{StudyId, TrialId, TrialStorage};
use crate::Result;

use super::FrozenTrial;

/// Live handle to a running trial.
///
/// Writes go straight to the storage. Use [`Trial::snapshot`] to read the
/// current state back.
pub struct Trial<S> {
    storage: Arc<S>,
    study_id: StudyId,
    trial_id: TrialId,
    number: u64,
}

impl<S> Trial<S> {
    pub(crate) fn new(
        storage: Arc<S>,
        study_id: StudyId,
        trial_id: TrialId,
        number: u64,
    ) -> Self {
        Self {
            storage,
            study_id,
            trial_id,
            number,
        }
    }

    /// Get the owning study ID.
    #[must_use]
    pub const fn study_id(&self) -> StudyId {
        self.study_id
    }

    /// Get the trial ID.
    #[must_use]
    pub const fn trial_id(&self) -> TrialId {
        self.trial_id
    }

    /// Get the trial number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }
}

impl<S: TrialStorage> Trial<S> {
    /// Record a parameter value for this trial.
    ///
    /// # Errors
    ///
    /// Returns `TrialFinished` if the trial is no longer running, or any
    /// storage error.
    pub async fn set_param(&self, name: &str, value: serde_json::Value) -> Result<()> {
        self.storage.set_trial_param(self.trial_id, name, value).await
    }

    /// Set a user attribute on this trial.
    ///
    /// # Errors
    ///
    /// Returns `TrialFinished` if the trial is no longer running, or any
    /// storage error.
    pub async fn set_user_attr(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.storage
            .set_trial_user_attr(self.trial_id, key, value)
            .await
    }

    /// Read an owned snapshot of the trial.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn snapshot(&self) -> Result<FrozenTrial> {
        let trial = self.storage.get_trial(self.trial_id).await?;
        Ok(FrozenTrial::clone(&trial))
    }
}

impl<S> fmt::Debug for Trial<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trial")
            .field("study_id", &self.study_id)
            .field("trial_id", &self.trial_id)
            .field("number", &self.number)
            .finish_non_exhaustive()
    }
}
