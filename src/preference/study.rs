//! Preferential Study - trial lifecycle, preference reporting and frontier

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::frontier;
use super::ledger::{PreferenceLedger, PreferenceStatement};
use super::readiness::{self, TrialRef};
use super::trial_set::TrialSet;
use crate::storage::{AttrMap, StudyId, TrialId, TrialStorage};
use crate::trial::{FrozenTrial, Trial, TrialState, TrialView};
use crate::{Error, Result};

/// A study for preferential optimization.
///
/// Trials are compared pairwise by a human or an automated judge instead of
/// being scored. Reported preferences go to the study's
/// [`PreferenceLedger`]; [`PreferentialStudy::get_best_trials`] derives the
/// trials no other trial has beaten.
///
/// Create or load one with [`create_study`](super::create_study) and
/// [`load_study`](super::load_study).
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use trueno_preference::preference::{create_study, StudyOptions};
/// use trueno_preference::storage::InMemoryStorage;
///
/// # async fn example() -> trueno_preference::Result<()> {
/// let study = create_study(Arc::new(InMemoryStorage::new()), StudyOptions::default()).await?;
///
/// let a = study.ask(None).await?;
/// let b = study.ask(None).await?;
/// study.mark_comparison_ready(&a).await?;
/// study.mark_comparison_ready(&b).await?;
///
/// study.report_preference(&a, &b).await?;
///
/// let best = study.get_best_trials().await?;
/// assert_eq!(best.len(), 1);
/// assert_eq!(best[0].number(), a.number());
/// # Ok(())
/// # }
/// ```
pub struct PreferentialStudy<S> {
    storage: Arc<S>,
    study_id: StudyId,
    study_name: String,
}

impl<S: TrialStorage> PreferentialStudy<S> {
    pub(crate) fn new(storage: Arc<S>, study_id: StudyId, study_name: String) -> Self {
        Self {
            storage,
            study_id,
            study_name,
        }
    }

    /// Get the study ID.
    #[must_use]
    pub const fn study_id(&self) -> StudyId {
        self.study_id
    }

    /// Get the study name.
    #[must_use]
    pub fn study_name(&self) -> &str {
        &self.study_name
    }

    /// Get the backing storage.
    #[must_use]
    pub const fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Open this study's preference ledger.
    #[must_use]
    pub fn ledger(&self) -> PreferenceLedger<'_, S> {
        PreferenceLedger::new(self.storage.as_ref(), self.study_id)
    }

    /// All trials as owned copies, ordered by number.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn trials(&self) -> Result<Vec<FrozenTrial>> {
        self.get_trials(None).await
    }

    /// Trials as owned copies, optionally filtered by state.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn get_trials(&self, states: Option<&[TrialState]>) -> Result<Vec<FrozenTrial>> {
        let trials = self.storage.get_all_trials(self.study_id, states).await?;
        Ok(trials.iter().map(|trial| FrozenTrial::clone(trial)).collect())
    }

    /// Trials as shared read-only views, optionally filtered by state.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn get_trial_views(&self, states: Option<&[TrialState]>) -> Result<Vec<TrialView>> {
        let trials = self.storage.get_all_trials(self.study_id, states).await?;
        Ok(trials.into_iter().map(TrialView::new).collect())
    }

    /// Create a running trial, recording `fixed_params` as its parameters.
    ///
    /// The trial and its parameters are stored in one write.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn ask(&self, fixed_params: Option<AttrMap>) -> Result<Trial<S>> {
        let template = fixed_params
            .unwrap_or_default()
            .into_iter()
            .fold(FrozenTrial::builder(TrialState::Running), |builder, (name, value)| {
                builder.param(name, value)
            })
            .build();
        let trial_id = self
            .storage
            .create_new_trial(self.study_id, Some(template))
            .await?;
        let number = self.storage.get_trial(trial_id).await?.number();
        Ok(Trial::new(Arc::clone(&self.storage), self.study_id, trial_id, number))
    }

    /// Finish a live trial with a final state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-final state or a trial of another
    /// study, `TrialFinished` if it already finished, or any storage error.
    pub async fn tell(&self, trial: &Trial<S>, state: TrialState) -> Result<()> {
        if !state.is_finished() {
            return Err(Error::InvalidArgument(format!(
                "cannot tell trial #{} with non-final state {state:?}",
                trial.number()
            )));
        }
        if trial.study_id() != self.study_id {
            return Err(Error::InvalidArgument(format!(
                "trial #{} belongs to study id {}",
                trial.number(),
                trial.study_id()
            )));
        }
        self.storage.set_trial_state(trial.trial_id(), state).await
    }

    /// Add a trial built elsewhere. It gets a fresh ID and number.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn add_trial(&self, trial: &FrozenTrial) -> Result<TrialId> {
        self.storage
            .create_new_trial(self.study_id, Some(trial.clone()))
            .await
    }

    /// Add several trials, in order.
    ///
    /// # Errors
    ///
    /// Propagates the first storage error; trials added before it remain.
    pub async fn add_trials(&self, trials: &[FrozenTrial]) -> Result<Vec<TrialId>> {
        let mut ids = Vec::with_capacity(trials.len());
        for trial in trials {
            ids.push(self.add_trial(trial).await?);
        }
        Ok(ids)
    }

    /// Report that every trial in `better` is preferred over every trial in
    /// `worse`.
    ///
    /// Records the full cross product, better outer and worse inner:
    /// `better = [A, B], worse = [C, D]` appends (A, C), (A, D), (B, C),
    /// (B, D) in one ledger batch.
    ///
    /// Live handles must belong to this study. Owned trials and views carry
    /// only their number, which is not checked.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a handle of another study (nothing is
    /// recorded), or propagates ledger errors.
    pub async fn report_preference(
        &self,
        better: impl Into<TrialSet>,
        worse: impl Into<TrialSet>,
    ) -> Result<()> {
        let better = better.into();
        let worse = worse.into();
        if let Some(other) = better
            .foreign_study(self.study_id)
            .or_else(|| worse.foreign_study(self.study_id))
        {
            return Err(Error::InvalidArgument(format!(
                "trial handle belongs to study id {other}, not {}",
                self.study_id
            )));
        }
        let statements: Vec<PreferenceStatement> = better
            .numbers()
            .iter()
            .flat_map(|&b| worse.numbers().iter().map(move |&w| PreferenceStatement::new(b, w)))
            .collect();
        debug!(
            study = %self.study_name,
            better = ?better.numbers(),
            worse = ?worse.numbers(),
            "reporting preference"
        );
        self.ledger().append(&statements).await
    }

    /// Reported preferences as owned `(better, worse)` pairs, in report order.
    ///
    /// # Errors
    ///
    /// Returns `TrialNotFound` if a statement names an unknown trial, or any
    /// storage error.
    pub async fn get_preferences(&self) -> Result<Vec<(FrozenTrial, FrozenTrial)>> {
        Ok(self
            .resolve_preferences()
            .await?
            .into_iter()
            .map(|(better, worse)| (FrozenTrial::clone(&better), FrozenTrial::clone(&worse)))
            .collect())
    }

    /// Alias of [`PreferentialStudy::get_preferences`].
    ///
    /// # Errors
    ///
    /// See [`PreferentialStudy::get_preferences`].
    pub async fn preferences(&self) -> Result<Vec<(FrozenTrial, FrozenTrial)>> {
        self.get_preferences().await
    }

    /// Reported preferences as shared read-only views, in report order.
    ///
    /// # Errors
    ///
    /// See [`PreferentialStudy::get_preferences`].
    pub async fn get_preference_views(&self) -> Result<Vec<(TrialView, TrialView)>> {
        Ok(self
            .resolve_preferences()
            .await?
            .into_iter()
            .map(|(better, worse)| (TrialView::new(better), TrialView::new(worse)))
            .collect())
    }

    async fn resolve_preferences(&self) -> Result<Vec<(Arc<FrozenTrial>, Arc<FrozenTrial>)>> {
        let trials = self.storage.get_all_trials(self.study_id, None).await?;
        let by_number: HashMap<u64, &Arc<FrozenTrial>> =
            trials.iter().map(|trial| (trial.number(), trial)).collect();
        let lookup = |number: u64| {
            by_number
                .get(&number)
                .map(|&trial| Arc::clone(trial))
                .ok_or_else(|| Error::TrialNotFound {
                    study_id: self.study_id,
                    number,
                })
        };
        self.ledger()
            .read_all()
            .await?
            .into_iter()
            .map(|statement| -> Result<_> {
                Ok((lookup(statement.better)?, lookup(statement.worse)?))
            })
            .collect()
    }

    /// The frontier: ready trials in {Complete, Running} never reported as
    /// worse, as owned copies ordered by number. Treat it as a set.
    ///
    /// # Errors
    ///
    /// Propagates storage and ledger errors.
    pub async fn get_best_trials(&self) -> Result<Vec<FrozenTrial>> {
        frontier::get_best_trials(self.storage.as_ref(), self.study_id).await
    }

    /// Alias of [`PreferentialStudy::get_best_trials`].
    ///
    /// # Errors
    ///
    /// See [`PreferentialStudy::get_best_trials`].
    pub async fn best_trials(&self) -> Result<Vec<FrozenTrial>> {
        self.get_best_trials().await
    }

    /// Mark a trial, by handle or number, as ready to compare.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a handle of another study,
    /// `TrialNotFound` for an unknown number, or any storage error.
    pub async fn mark_comparison_ready<'t>(&self, trial: impl Into<TrialRef<'t, S>>) -> Result<()>
    where
        S: 't,
    {
        readiness::mark_comparison_ready(self.storage.as_ref(), self.study_id, trial.into()).await
    }

    /// User attributes of the study.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn user_attrs(&self) -> Result<AttrMap> {
        self.storage.get_study_user_attrs(self.study_id).await
    }

    /// Set a user attribute on the study. Free-form metadata.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn set_user_attr(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.storage
            .set_study_user_attr(self.study_id, key, value)
            .await
    }
}

impl<S> std::fmt::Debug for PreferentialStudy<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferentialStudy")
            .field("study_id", &self.study_id)
            .field("study_name", &self.study_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::{create_study, StudyOptions};
    use crate::storage::InMemoryStorage;

    async fn new_study() -> PreferentialStudy<InMemoryStorage> {
        create_study(Arc::new(InMemoryStorage::new()), StudyOptions::default())
            .await
            .unwrap()
    }

    fn pairs(preferences: &[(FrozenTrial, FrozenTrial)]) -> Vec<(u64, u64)> {
        preferences
            .iter()
            .map(|(better, worse)| (better.number(), worse.number()))
            .collect()
    }

    #[tokio::test]
    async fn test_ask_assigns_sequential_numbers() {
        let study = new_study().await;

        let t0 = study.ask(None).await.unwrap();
        let t1 = study.ask(None).await.unwrap();

        assert_eq!(t0.number(), 0);
        assert_eq!(t1.number(), 1);
        assert_eq!(study.trials().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ask_records_fixed_params() {
        let study = new_study().await;
        let mut fixed = AttrMap::new();
        fixed.insert("lr".to_string(), serde_json::json!(0.01));

        let trial = study.ask(Some(fixed)).await.unwrap();

        let snapshot = trial.snapshot().await.unwrap();
        assert_eq!(snapshot.state(), TrialState::Running);
        assert_eq!(snapshot.params()["lr"], 0.01);
    }

    #[tokio::test]
    async fn test_ask_stores_params_with_the_trial() {
        let study = new_study().await;
        let mut fixed = AttrMap::new();
        fixed.insert("lr".to_string(), serde_json::json!(0.01));
        fixed.insert("depth".to_string(), serde_json::json!(4));

        let trial = study.ask(Some(fixed)).await.unwrap();

        let stored = study.storage().get_trial(trial.trial_id()).await.unwrap();
        let names: Vec<&str> = stored.params().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["lr", "depth"]);
        assert!(stored.datetime_start().is_some());
    }

    #[tokio::test]
    async fn test_ask_on_missing_study_leaves_no_trial() {
        let storage = Arc::new(InMemoryStorage::new());
        let study = PreferentialStudy::new(Arc::clone(&storage), StudyId(99), "gone".into());
        let mut fixed = AttrMap::new();
        fixed.insert("lr".to_string(), serde_json::json!(0.01));

        let err = study.ask(Some(fixed)).await.unwrap_err();

        assert!(matches!(err, Error::StudyIdNotFound(StudyId(99))));
        assert!(storage.get_trial(TrialId(0)).await.is_err());
    }

    #[tokio::test]
    async fn test_report_rejects_handle_of_other_study() {
        let storage = Arc::new(InMemoryStorage::new());
        let study = create_study(Arc::clone(&storage), StudyOptions::default())
            .await
            .unwrap();
        let other = create_study(storage, StudyOptions::default()).await.unwrap();
        let own = study.ask(None).await.unwrap();
        let foreign = other.ask(None).await.unwrap();

        let err = study.report_preference(&own, &foreign).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = study.report_preference([&foreign], &own).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        assert!(study.get_preferences().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_product_order() {
        let study = new_study().await;
        for _ in 0..4 {
            study.ask(None).await.unwrap();
        }
        let trials = study.trials().await.unwrap();

        study
            .report_preference(&trials[0..2], &trials[2..4])
            .await
            .unwrap();

        assert_eq!(
            pairs(&study.get_preferences().await.unwrap()),
            vec![(0, 2), (0, 3), (1, 2), (1, 3)]
        );
    }

    #[tokio::test]
    async fn test_scalar_and_list_arguments() {
        let study = new_study().await;
        let a = study.ask(None).await.unwrap();
        let b = study.ask(None).await.unwrap();
        let c = study.ask(None).await.unwrap();

        study.report_preference([&a, &b], &c).await.unwrap();

        assert_eq!(
            pairs(&study.preferences().await.unwrap()),
            vec![(0, 2), (1, 2)]
        );
    }

    #[tokio::test]
    async fn test_empty_side_records_nothing() {
        let study = new_study().await;
        let a = study.ask(None).await.unwrap();
        let none: Vec<FrozenTrial> = Vec::new();

        study.report_preference(&a, &none).await.unwrap();

        assert!(study.get_preferences().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preferences_resolve_current_snapshots() {
        let study = new_study().await;
        let a = study.ask(None).await.unwrap();
        let b = study.ask(None).await.unwrap();
        study.report_preference(&a, &b).await.unwrap();

        study.tell(&a, TrialState::Complete).await.unwrap();

        let preferences = study.get_preferences().await.unwrap();
        assert_eq!(preferences[0].0.state(), TrialState::Complete);
        assert_eq!(preferences[0].1.state(), TrialState::Running);
    }

    #[tokio::test]
    async fn test_dangling_preference_is_reported() {
        let study = new_study().await;
        study.ask(None).await.unwrap();
        study
            .ledger()
            .append(&[PreferenceStatement::new(0, 9)])
            .await
            .unwrap();

        let err = study.get_preferences().await.unwrap_err();

        assert!(matches!(err, Error::TrialNotFound { number: 9, .. }));
    }

    #[tokio::test]
    async fn test_preference_views_share_storage_snapshots() {
        let study = new_study().await;
        let a = study.ask(None).await.unwrap();
        let b = study.ask(None).await.unwrap();
        study.report_preference(&a, &b).await.unwrap();

        let views = study.get_preference_views().await.unwrap();
        let trial_views = study.get_trial_views(None).await.unwrap();

        assert!(views[0].0.ptr_eq(&trial_views[0]));
        assert!(views[0].1.ptr_eq(&trial_views[1]));
    }

    #[tokio::test]
    async fn test_tell_rejects_non_final_state() {
        let study = new_study().await;
        let trial = study.ask(None).await.unwrap();

        let err = study.tell(&trial, TrialState::Running).await.unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_tell_twice_fails() {
        let study = new_study().await;
        let trial = study.ask(None).await.unwrap();
        study.tell(&trial, TrialState::Complete).await.unwrap();

        let err = study.tell(&trial, TrialState::Fail).await.unwrap_err();

        assert!(matches!(err, Error::TrialFinished { .. }));
    }

    #[tokio::test]
    async fn test_add_trials_assigns_new_numbers() {
        let study = new_study().await;
        study.ask(None).await.unwrap();
        let imported = vec![
            FrozenTrial::builder(TrialState::Complete).values(vec![1.0]).build(),
            FrozenTrial::builder(TrialState::Pruned).build(),
        ];

        let ids = study.add_trials(&imported).await.unwrap();

        let trials = study.trials().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(trials[1].trial_id(), ids[0]);
        assert_eq!(trials[1].number(), 1);
        assert_eq!(trials[2].state(), TrialState::Pruned);
    }

    #[tokio::test]
    async fn test_study_user_attrs() {
        let study = new_study().await;

        study
            .set_user_attr("owner", serde_json::json!("design-team"))
            .await
            .unwrap();

        assert_eq!(study.user_attrs().await.unwrap()["owner"], "design-team");
    }
}
