//! Trial storage: the capability surface preferential studies run on
//!
//! The preference core never owns trials. It creates, reads and tags them
//! through [`TrialStorage`], which any backend (RDB, journal file, remote
//! service) can implement. [`InMemoryStorage`] is the bundled backend; data
//! is lost on process restart.
//!
//! # Example
//!
//! ```rust
//! use trueno_preference::storage::{InMemoryStorage, TrialStorage};
//!
//! # async fn example() -> trueno_preference::Result<()> {
//! let storage = InMemoryStorage::new();
//! let study_id = storage.create_new_study(Some("my-study")).await?;
//! let trial_id = storage.create_new_trial(study_id, None).await?;
//!
//! let trial = storage.get_trial(trial_id).await?;
//! assert_eq!(trial.number(), 0);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::InMemoryStorage;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::trial::{FrozenTrial, TrialState};
use crate::Result;

/// Attribute map. Iterates in insertion order (`serde_json` `preserve_order`).
pub type AttrMap = serde_json::Map<String, serde_json::Value>;

/// Storage-assigned study identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudyId(pub u64);

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned, globally unique trial identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialId(pub u64);

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of a stored study.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySummary {
    /// Study identifier.
    pub study_id: StudyId,
    /// Unique study name.
    pub study_name: String,
    /// Number of trials in the study.
    pub n_trials: usize,
}

/// Trial store trait.
///
/// Every method is atomic on its own; nothing spans two calls. Returned
/// trials are shared snapshots: implementations must replace, never mutate
/// in place, a snapshot that has been handed out.
pub trait TrialStorage: Send + Sync {
    /// Create a study. A unique name is generated when `study_name` is `None`.
    ///
    /// Fails with `DuplicatedStudy` if the name is taken.
    fn create_new_study(
        &self,
        study_name: Option<&str>,
    ) -> impl Future<Output = Result<StudyId>> + Send;

    /// Resolve a study name. Fails with `StudyNotFound`.
    fn get_study_id_from_name(
        &self,
        study_name: &str,
    ) -> impl Future<Output = Result<StudyId>> + Send;

    /// Get the name of a study.
    fn get_study_name(&self, study_id: StudyId) -> impl Future<Output = Result<String>> + Send;

    /// List all studies, ordered by study ID.
    fn get_all_studies(&self) -> impl Future<Output = Result<Vec<StudySummary>>> + Send;

    /// Set a user attribute on a study. Overwrites any existing value.
    fn set_study_user_attr(
        &self,
        study_id: StudyId,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get all user attributes of a study.
    fn get_study_user_attrs(&self, study_id: StudyId)
        -> impl Future<Output = Result<AttrMap>> + Send;

    /// Set a system attribute on a study. Overwrites any existing value.
    fn set_study_system_attr(
        &self,
        study_id: StudyId,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get all system attributes of a study, in insertion order.
    fn get_study_system_attrs(
        &self,
        study_id: StudyId,
    ) -> impl Future<Output = Result<AttrMap>> + Send;

    /// Create a trial with the next free number.
    ///
    /// Without a template the trial starts `Running`. A template keeps its
    /// state and attributes but gets a fresh trial ID and number.
    fn create_new_trial(
        &self,
        study_id: StudyId,
        template: Option<FrozenTrial>,
    ) -> impl Future<Output = Result<TrialId>> + Send;

    /// Get a trial by ID. Fails with `TrialIdNotFound`.
    fn get_trial(&self, trial_id: TrialId) -> impl Future<Output = Result<Arc<FrozenTrial>>> + Send;

    /// Get the trials of a study ordered by ascending number, optionally
    /// filtered by state.
    fn get_all_trials(
        &self,
        study_id: StudyId,
        states: Option<&[TrialState]>,
    ) -> impl Future<Output = Result<Vec<Arc<FrozenTrial>>>> + Send;

    /// Resolve a trial number within a study. Fails with `TrialNotFound`.
    fn get_trial_id_from_study_id_trial_number(
        &self,
        study_id: StudyId,
        number: u64,
    ) -> impl Future<Output = Result<TrialId>> + Send;

    /// Move a trial to a new state. Fails with `TrialFinished` once finished.
    fn set_trial_state(
        &self,
        trial_id: TrialId,
        state: TrialState,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Record a parameter value. Fails with `TrialFinished` once finished.
    fn set_trial_param(
        &self,
        trial_id: TrialId,
        name: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Set a user attribute. Fails with `TrialFinished` once finished.
    fn set_trial_user_attr(
        &self,
        trial_id: TrialId,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Set a system attribute. Allowed in any state.
    fn set_trial_system_attr(
        &self,
        trial_id: TrialId,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Count the trials of a study, optionally filtered by state.
    fn get_n_trials(
        &self,
        study_id: StudyId,
        states: Option<&[TrialState]>,
    ) -> impl Future<Output = Result<usize>> + Send {
        async move { Ok(self.get_all_trials(study_id, states).await?.len()) }
    }
}
