//! Read-only shared view of a stored trial

use std::ops::Deref;
use std::sync::Arc;

use super::FrozenTrial;

/// Borrowed, read-only view of a trial as held by the storage.
///
/// Views share the storage's snapshot instead of copying it. They only
/// hand out `&FrozenTrial`, so a caller cannot corrupt the stored trial;
/// later writes to the trial replace the storage's snapshot and leave
/// existing views unchanged. Call [`TrialView::to_owned_trial`] for an
/// independent copy.
#[derive(Debug, Clone)]
pub struct TrialView {
    inner: Arc<FrozenTrial>,
}

impl TrialView {
    pub(crate) fn new(inner: Arc<FrozenTrial>) -> Self {
        Self { inner }
    }

    /// Clone the underlying snapshot into an owned trial.
    #[must_use]
    pub fn to_owned_trial(&self) -> FrozenTrial {
        FrozenTrial::clone(&self.inner)
    }

    /// Whether two views share the same stored snapshot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for TrialView {
    type Target = FrozenTrial;

    fn deref(&self) -> &FrozenTrial {
        &self.inner
    }
}

impl AsRef<FrozenTrial> for TrialView {
    fn as_ref(&self) -> &FrozenTrial {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::TrialState;

    fn first_param(trial: impl AsRef<FrozenTrial>) -> Option<serde_json::Value> {
        trial.as_ref().params().values().next().cloned()
    }

    #[test]
    fn test_view_reads_through_as_ref() {
        let view = TrialView::new(Arc::new(
            FrozenTrial::builder(TrialState::Complete)
                .param("x", serde_json::json!(0.5))
                .build(),
        ));

        assert_eq!(first_param(&view), Some(serde_json::json!(0.5)));
        assert_eq!(view.as_ref().state(), TrialState::Complete);
    }

    #[test]
    fn test_clones_share_the_snapshot() {
        let view = TrialView::new(Arc::new(FrozenTrial::builder(TrialState::Running).build()));
        let clone = view.clone();
        let other = TrialView::new(Arc::new(view.to_owned_trial()));

        assert!(view.ptr_eq(&clone));
        assert!(!view.ptr_eq(&other));
        assert_eq!(*view, *other);
    }
}
