//! Error types for trueno-preference
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

use crate::storage::{StudyId, TrialId};
use crate::trial::TrialState;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-preference error types
#[derive(Error, Debug)]
pub enum Error {
    /// Loaded study was not created through `create_study` (domain mismatch)
    #[error("The study '{study_name}' is not a PreferentialStudy.\nCreate it with trueno_preference::create_study()")]
    NotPreferential {
        /// Name of the offending study
        study_name: String,
    },

    /// A study with the same name already exists
    #[error("Study '{0}' already exists.\nSet load_if_exists(true) to reuse it")]
    DuplicatedStudy(String),

    /// No study with the given name
    #[error("Study not found: '{0}'")]
    StudyNotFound(String),

    /// No study with the given id
    #[error("Study not found: id {0}")]
    StudyIdNotFound(StudyId),

    /// `load_study` without a name could not pick a single study
    #[error("Cannot pick a study: {0}\nPass an explicit study name")]
    AmbiguousStudy(String),

    /// No trial with the given number in the study
    #[error("Trial #{number} not found in study id {study_id}")]
    TrialNotFound {
        /// Study that was searched
        study_id: StudyId,
        /// Missing trial number
        number: u64,
    },

    /// No trial with the given id
    #[error("Trial not found: id {0}")]
    TrialIdNotFound(TrialId),

    /// Trial was already finished and cannot be modified
    #[error("Trial id {trial_id} is already finished with state {state:?}")]
    TrialFinished {
        /// Finished trial
        trial_id: TrialId,
        /// Its final state
        state: TrialState,
    },

    /// Invalid argument passed to a study operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Attribute value (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),
}
