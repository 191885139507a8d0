//! Frozen Trial - owned snapshot of a trial's state and attributes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{AttrMap, TrialId};

/// Lifecycle state of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialState {
    /// Trial is enqueued but not yet started.
    Waiting,
    /// Trial is currently being evaluated.
    Running,
    /// Trial finished successfully.
    Complete,
    /// Trial was stopped early.
    Pruned,
    /// Trial failed with an error.
    Fail,
}

impl TrialState {
    /// States eligible for the preference frontier.
    pub const COMPARABLE: [Self; 2] = [Self::Complete, Self::Running];

    /// Whether the trial has reached a final state.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Complete | Self::Pruned | Self::Fail)
    }
}

/// Frozen Trial is an owned snapshot of one trial.
///
/// Mutating a `FrozenTrial` never affects the storage it came from; use the
/// study or the live [`Trial`](super::Trial) handle to write attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrozenTrial {
    trial_id: TrialId,
    number: u64,
    state: TrialState,
    params: AttrMap,
    values: Option<Vec<f64>>,
    user_attrs: AttrMap,
    system_attrs: AttrMap,
    datetime_start: Option<DateTime<Utc>>,
    datetime_complete: Option<DateTime<Utc>>,
}

impl FrozenTrial {
    /// Create a builder for a trial template passed to `add_trial`.
    ///
    /// The trial id and number of a template are placeholders; the storage
    /// assigns fresh ones when the trial is added.
    #[must_use]
    pub fn builder(state: TrialState) -> FrozenTrialBuilder {
        FrozenTrialBuilder::new(state)
    }

    /// Get the globally unique trial ID.
    #[must_use]
    pub const fn trial_id(&self) -> TrialId {
        self.trial_id
    }

    /// Get the study-scoped trial number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Get the trial state.
    #[must_use]
    pub const fn state(&self) -> TrialState {
        self.state
    }

    /// Get the trial parameters.
    #[must_use]
    pub const fn params(&self) -> &AttrMap {
        &self.params
    }

    /// Get the objective values, if reported.
    #[must_use]
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    /// Get user attributes.
    #[must_use]
    pub const fn user_attrs(&self) -> &AttrMap {
        &self.user_attrs
    }

    /// Get system attributes (reserved keys live here).
    #[must_use]
    pub const fn system_attrs(&self) -> &AttrMap {
        &self.system_attrs
    }

    /// Get the start timestamp, if the trial has started.
    #[must_use]
    pub const fn datetime_start(&self) -> Option<DateTime<Utc>> {
        self.datetime_start
    }

    /// Get the completion timestamp, if the trial has finished.
    #[must_use]
    pub const fn datetime_complete(&self) -> Option<DateTime<Utc>> {
        self.datetime_complete
    }

    /// Set a user attribute on this snapshot only.
    pub fn set_user_attr(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.user_attrs.insert(key.into(), value);
    }

    pub(crate) fn with_identity(mut self, trial_id: TrialId, number: u64) -> Self {
        self.trial_id = trial_id;
        self.number = number;
        self
    }

    pub(crate) fn set_state(&mut self, state: TrialState) {
        let now = Utc::now();
        if state == TrialState::Running && self.datetime_start.is_none() {
            self.datetime_start = Some(now);
        }
        if state.is_finished() {
            self.datetime_start.get_or_insert(now);
            self.datetime_complete = Some(now);
        }
        self.state = state;
    }

    pub(crate) fn set_param(&mut self, name: String, value: serde_json::Value) {
        self.params.insert(name, value);
    }

    pub(crate) fn set_system_attr(&mut self, key: String, value: serde_json::Value) {
        self.system_attrs.insert(key, value);
    }
}

/// Builder for `FrozenTrial` templates.
#[derive(Debug)]
pub struct FrozenTrialBuilder {
    state: TrialState,
    params: AttrMap,
    values: Option<Vec<f64>>,
    user_attrs: AttrMap,
    system_attrs: AttrMap,
}

impl FrozenTrialBuilder {
    /// Create a new builder with the required state.
    #[must_use]
    pub fn new(state: TrialState) -> Self {
        Self {
            state,
            params: AttrMap::new(),
            values: None,
            user_attrs: AttrMap::new(),
            system_attrs: AttrMap::new(),
        }
    }

    /// Set a parameter value.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Set the objective values.
    #[must_use]
    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = Some(values);
        self
    }

    /// Set a user attribute.
    #[must_use]
    pub fn user_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.user_attrs.insert(key.into(), value);
        self
    }

    /// Set a system attribute.
    #[must_use]
    pub fn system_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.system_attrs.insert(key.into(), value);
        self
    }

    /// Build the `FrozenTrial`.
    #[must_use]
    pub fn build(self) -> FrozenTrial {
        let mut trial = FrozenTrial {
            trial_id: TrialId(0),
            number: 0,
            state: TrialState::Waiting,
            params: self.params,
            values: self.values,
            user_attrs: self.user_attrs,
            system_attrs: self.system_attrs,
            datetime_start: None,
            datetime_complete: None,
        };
        trial.set_state(self.state);
        trial
    }
}
