//! One-or-many trial arguments for `report_preference`

use crate::storage::StudyId;
use crate::trial::{FrozenTrial, Trial, TrialView};

/// Trial numbers taken from one trial or a collection of trials.
///
/// Built through `From` so `report_preference` accepts a single trial as
/// well as slices and vectors of trials. Live handles also record their
/// study, so a handle from another study can be rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialSet {
    numbers: Vec<u64>,
    handle_studies: Vec<StudyId>,
}

impl TrialSet {
    /// Trial numbers in argument order.
    #[must_use]
    pub fn numbers(&self) -> &[u64] {
        &self.numbers
    }

    /// Number of trials in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// First study, other than `study_id`, that a handle in the set
    /// belongs to.
    #[must_use]
    pub fn foreign_study(&self, study_id: StudyId) -> Option<StudyId> {
        self.handle_studies.iter().copied().find(|&id| id != study_id)
    }

    fn from_numbers(numbers: Vec<u64>) -> Self {
        Self {
            numbers,
            handle_studies: Vec::new(),
        }
    }

    fn from_handles<'a, S: 'a>(trials: impl IntoIterator<Item = &'a Trial<S>>) -> Self {
        let (numbers, handle_studies) = trials
            .into_iter()
            .map(|trial| (trial.number(), trial.study_id()))
            .unzip();
        Self {
            numbers,
            handle_studies,
        }
    }
}

impl From<&FrozenTrial> for TrialSet {
    fn from(trial: &FrozenTrial) -> Self {
        Self::from_numbers(vec![trial.number()])
    }
}

impl From<&TrialView> for TrialSet {
    fn from(trial: &TrialView) -> Self {
        Self::from_numbers(vec![trial.number()])
    }
}

impl<S> From<&Trial<S>> for TrialSet {
    fn from(trial: &Trial<S>) -> Self {
        Self::from_handles([trial])
    }
}

impl From<&[FrozenTrial]> for TrialSet {
    fn from(trials: &[FrozenTrial]) -> Self {
        Self::from_numbers(trials.iter().map(FrozenTrial::number).collect())
    }
}

impl From<&Vec<FrozenTrial>> for TrialSet {
    fn from(trials: &Vec<FrozenTrial>) -> Self {
        Self::from(trials.as_slice())
    }
}

impl From<&[&FrozenTrial]> for TrialSet {
    fn from(trials: &[&FrozenTrial]) -> Self {
        Self::from_numbers(trials.iter().map(|trial| trial.number()).collect())
    }
}

impl<const N: usize> From<[&FrozenTrial; N]> for TrialSet {
    fn from(trials: [&FrozenTrial; N]) -> Self {
        Self::from(&trials[..])
    }
}

impl From<&[TrialView]> for TrialSet {
    fn from(trials: &[TrialView]) -> Self {
        Self::from_numbers(trials.iter().map(|trial| trial.number()).collect())
    }
}

impl From<&Vec<TrialView>> for TrialSet {
    fn from(trials: &Vec<TrialView>) -> Self {
        Self::from(trials.as_slice())
    }
}

impl<S> From<&[Trial<S>]> for TrialSet {
    fn from(trials: &[Trial<S>]) -> Self {
        Self::from_handles(trials)
    }
}

impl<S, const N: usize> From<[&Trial<S>; N]> for TrialSet {
    fn from(trials: [&Trial<S>; N]) -> Self {
        Self::from_handles(trials)
    }
}
