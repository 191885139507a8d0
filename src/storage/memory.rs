//! In-memory trial storage using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{AttrMap, StudyId, StudySummary, TrialId, TrialStorage};
use crate::trial::{FrozenTrial, TrialState};
use crate::{Error, Result};

#[derive(Debug)]
struct StudyEntry {
    name: String,
    user_attrs: AttrMap,
    system_attrs: AttrMap,
    trials: Vec<Arc<FrozenTrial>>,
}

/// In-memory trial storage using lock-free concurrent hashmaps.
///
/// Thread-safe; every operation locks at most one study shard. Stored
/// trials are `Arc` snapshots updated copy-on-write, so views handed out
/// earlier keep the state they were read with.
///
/// # Example
///
/// ```rust
/// use trueno_preference::storage::{InMemoryStorage, TrialStorage};
///
/// # async fn example() -> trueno_preference::Result<()> {
/// let storage = InMemoryStorage::new();
/// let study_id = storage.create_new_study(None).await?;
/// assert!(storage.get_study_name(study_id).await?.starts_with("no-name-"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryStorage {
    studies: DashMap<StudyId, StudyEntry>,
    study_names: DashMap<String, StudyId>,
    trial_index: DashMap<TrialId, (StudyId, u64)>,
    next_study_id: AtomicU64,
    next_trial_id: AtomicU64,
}

impl InMemoryStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            studies: DashMap::new(),
            study_names: DashMap::new(),
            trial_index: DashMap::new(),
            next_study_id: AtomicU64::new(0),
            next_trial_id: AtomicU64::new(0),
        }
    }

    /// Get the number of studies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.studies.len()
    }

    /// Check if the storage holds no studies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }

    fn locate(&self, trial_id: TrialId) -> Result<(StudyId, usize)> {
        let (study_id, number) = *self
            .trial_index
            .get(&trial_id)
            .ok_or(Error::TrialIdNotFound(trial_id))?;
        let index = usize::try_from(number).map_err(|_| Error::TrialIdNotFound(trial_id))?;
        Ok((study_id, index))
    }

    /// Apply `update` to a trial, replacing its snapshot copy-on-write.
    fn update_trial<F>(&self, trial_id: TrialId, update: F) -> Result<()>
    where
        F: FnOnce(&mut FrozenTrial) -> Result<()>,
    {
        let (study_id, index) = self.locate(trial_id)?;
        let mut study = self
            .studies
            .get_mut(&study_id)
            .ok_or(Error::StudyIdNotFound(study_id))?;
        let slot = study
            .trials
            .get_mut(index)
            .ok_or(Error::TrialIdNotFound(trial_id))?;
        update(Arc::make_mut(slot))
    }

    fn update_running_trial<F>(&self, trial_id: TrialId, update: F) -> Result<()>
    where
        F: FnOnce(&mut FrozenTrial),
    {
        self.update_trial(trial_id, |trial| {
            if trial.state().is_finished() {
                return Err(Error::TrialFinished {
                    trial_id,
                    state: trial.state(),
                });
            }
            update(trial);
            Ok(())
        })
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TrialStorage for InMemoryStorage {
    async fn create_new_study(&self, study_name: Option<&str>) -> Result<StudyId> {
        let name = study_name.map_or_else(
            || format!("no-name-{}", uuid::Uuid::new_v4()),
            ToString::to_string,
        );
        match self.study_names.entry(name.clone()) {
            Entry::Occupied(_) => Err(Error::DuplicatedStudy(name)),
            Entry::Vacant(vacant) => {
                let study_id = StudyId(self.next_study_id.fetch_add(1, Ordering::Relaxed));
                self.studies.insert(
                    study_id,
                    StudyEntry {
                        name,
                        user_attrs: AttrMap::new(),
                        system_attrs: AttrMap::new(),
                        trials: Vec::new(),
                    },
                );
                vacant.insert(study_id);
                Ok(study_id)
            }
        }
    }

    async fn get_study_id_from_name(&self, study_name: &str) -> Result<StudyId> {
        self.study_names
            .get(study_name)
            .map(|id| *id.value())
            .ok_or_else(|| Error::StudyNotFound(study_name.to_string()))
    }

    async fn get_study_name(&self, study_id: StudyId) -> Result<String> {
        self.studies
            .get(&study_id)
            .map(|study| study.name.clone())
            .ok_or(Error::StudyIdNotFound(study_id))
    }

    async fn get_all_studies(&self) -> Result<Vec<StudySummary>> {
        let mut studies: Vec<StudySummary> = self
            .studies
            .iter()
            .map(|entry| StudySummary {
                study_id: *entry.key(),
                study_name: entry.name.clone(),
                n_trials: entry.trials.len(),
            })
            .collect();
        studies.sort_by_key(|summary| summary.study_id);
        Ok(studies)
    }

    async fn set_study_user_attr(
        &self,
        study_id: StudyId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut study = self
            .studies
            .get_mut(&study_id)
            .ok_or(Error::StudyIdNotFound(study_id))?;
        study.user_attrs.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_study_user_attrs(&self, study_id: StudyId) -> Result<AttrMap> {
        self.studies
            .get(&study_id)
            .map(|study| study.user_attrs.clone())
            .ok_or(Error::StudyIdNotFound(study_id))
    }

    async fn set_study_system_attr(
        &self,
        study_id: StudyId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut study = self
            .studies
            .get_mut(&study_id)
            .ok_or(Error::StudyIdNotFound(study_id))?;
        study.system_attrs.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_study_system_attrs(&self, study_id: StudyId) -> Result<AttrMap> {
        self.studies
            .get(&study_id)
            .map(|study| study.system_attrs.clone())
            .ok_or(Error::StudyIdNotFound(study_id))
    }

    async fn create_new_trial(
        &self,
        study_id: StudyId,
        template: Option<FrozenTrial>,
    ) -> Result<TrialId> {
        let mut study = self
            .studies
            .get_mut(&study_id)
            .ok_or(Error::StudyIdNotFound(study_id))?;
        let trial_id = TrialId(self.next_trial_id.fetch_add(1, Ordering::Relaxed));
        let number = study.trials.len() as u64;
        let trial = template
            .unwrap_or_else(|| FrozenTrial::builder(TrialState::Running).build())
            .with_identity(trial_id, number);
        study.trials.push(Arc::new(trial));
        self.trial_index.insert(trial_id, (study_id, number));
        Ok(trial_id)
    }

    async fn get_trial(&self, trial_id: TrialId) -> Result<Arc<FrozenTrial>> {
        let (study_id, index) = self.locate(trial_id)?;
        let study = self
            .studies
            .get(&study_id)
            .ok_or(Error::StudyIdNotFound(study_id))?;
        study
            .trials
            .get(index)
            .cloned()
            .ok_or(Error::TrialIdNotFound(trial_id))
    }

    async fn get_all_trials(
        &self,
        study_id: StudyId,
        states: Option<&[TrialState]>,
    ) -> Result<Vec<Arc<FrozenTrial>>> {
        let study = self
            .studies
            .get(&study_id)
            .ok_or(Error::StudyIdNotFound(study_id))?;
        Ok(study
            .trials
            .iter()
            .filter(|trial| states.map_or(true, |states| states.contains(&trial.state())))
            .cloned()
            .collect())
    }

    async fn get_trial_id_from_study_id_trial_number(
        &self,
        study_id: StudyId,
        number: u64,
    ) -> Result<TrialId> {
        let study = self
            .studies
            .get(&study_id)
            .ok_or(Error::StudyIdNotFound(study_id))?;
        usize::try_from(number)
            .ok()
            .and_then(|index| study.trials.get(index))
            .map(|trial| trial.trial_id())
            .ok_or(Error::TrialNotFound { study_id, number })
    }

    async fn set_trial_state(&self, trial_id: TrialId, state: TrialState) -> Result<()> {
        self.update_running_trial(trial_id, |trial| trial.set_state(state))
    }

    async fn set_trial_param(
        &self,
        trial_id: TrialId,
        name: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.update_running_trial(trial_id, |trial| trial.set_param(name.to_string(), value))
    }

    async fn set_trial_user_attr(
        &self,
        trial_id: TrialId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.update_running_trial(trial_id, |trial| {
            trial.set_user_attr(key.to_string(), value);
        })
    }

    async fn set_trial_system_attr(
        &self,
        trial_id: TrialId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.update_trial(trial_id, |trial| {
            trial.set_system_attr(key.to_string(), value);
            Ok(())
        })
    }
}
