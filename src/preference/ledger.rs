//! Preference Ledger - append-only record of pairwise judgments

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::keys::SYSTEM_ATTR_PREFIX_PREFERENCE;
use crate::storage::{StudyId, TrialStorage};
use crate::Result;

/// One judgment: trial `better` is preferred over trial `worse`.
///
/// Both fields are trial numbers within the same study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceStatement {
    /// Number of the preferred trial.
    pub better: u64,
    /// Number of the trial it was preferred over.
    pub worse: u64,
}

impl PreferenceStatement {
    /// Create a statement.
    #[must_use]
    pub const fn new(better: u64, worse: u64) -> Self {
        Self { better, worse }
    }
}

impl From<(u64, u64)> for PreferenceStatement {
    fn from((better, worse): (u64, u64)) -> Self {
        Self::new(better, worse)
    }
}

/// Ledger of preference statements for one study.
///
/// Statements are kept in report order as a multiset: duplicates are kept
/// and nothing is ever rewritten or deleted. Each `append` call lands as one
/// study system attribute, so readers see a batch entirely or not at all.
///
/// ## Example
///
/// ```rust
/// use trueno_preference::preference::{PreferenceLedger, PreferenceStatement};
/// use trueno_preference::storage::{InMemoryStorage, TrialStorage};
///
/// # async fn example() -> trueno_preference::Result<()> {
/// let storage = InMemoryStorage::new();
/// let study_id = storage.create_new_study(None).await?;
/// let ledger = PreferenceLedger::new(&storage, study_id);
///
/// ledger.append(&[PreferenceStatement::new(0, 1)]).await?;
/// ledger.append(&[PreferenceStatement::new(0, 1)]).await?;
///
/// assert_eq!(ledger.read_all().await?.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PreferenceLedger<'a, S> {
    storage: &'a S,
    study_id: StudyId,
}

impl<'a, S: TrialStorage> PreferenceLedger<'a, S> {
    /// Open the ledger of a study.
    #[must_use]
    pub const fn new(storage: &'a S, study_id: StudyId) -> Self {
        Self { storage, study_id }
    }

    /// Append statements as one batch.
    ///
    /// Trial numbers are not validated. An empty batch writes nothing.
    ///
    /// # Errors
    ///
    /// Propagates storage errors (e.g. unknown study).
    pub async fn append(&self, statements: &[PreferenceStatement]) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }
        let pairs: Vec<(u64, u64)> = statements.iter().map(|s| (s.better, s.worse)).collect();
        let key = format!("{SYSTEM_ATTR_PREFIX_PREFERENCE}{}", Uuid::new_v4());
        self.storage
            .set_study_system_attr(self.study_id, &key, serde_json::to_value(pairs)?)
            .await?;
        debug!(
            study_id = %self.study_id,
            count = statements.len(),
            "appended preference batch"
        );
        Ok(())
    }

    /// Read every statement ever appended, in insertion order.
    ///
    /// # Errors
    ///
    /// Propagates storage errors; returns `Serialization` if a batch
    /// attribute is not a list of number pairs.
    pub async fn read_all(&self) -> Result<Vec<PreferenceStatement>> {
        let attrs = self.storage.get_study_system_attrs(self.study_id).await?;
        let mut statements = Vec::new();
        for (key, value) in attrs {
            if !key.starts_with(SYSTEM_ATTR_PREFIX_PREFERENCE) {
                continue;
            }
            let pairs: Vec<(u64, u64)> = serde_json::from_value(value)?;
            statements.extend(pairs.into_iter().map(PreferenceStatement::from));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::Error;

    fn pairs(statements: &[PreferenceStatement]) -> Vec<(u64, u64)> {
        statements.iter().map(|s| (s.better, s.worse)).collect()
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let storage = InMemoryStorage::new();
        let study_id = storage.create_new_study(None).await.unwrap();

        let ledger = PreferenceLedger::new(&storage, study_id);

        assert!(ledger.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_preserves_order_and_duplicates() {
        let storage = InMemoryStorage::new();
        let study_id = storage.create_new_study(None).await.unwrap();
        let ledger = PreferenceLedger::new(&storage, study_id);

        ledger
            .append(&[PreferenceStatement::new(2, 1), PreferenceStatement::new(0, 1)])
            .await
            .unwrap();
        ledger.append(&[PreferenceStatement::new(2, 1)]).await.unwrap();
        ledger.append(&[PreferenceStatement::new(1, 2)]).await.unwrap();

        let statements = ledger.read_all().await.unwrap();
        assert_eq!(pairs(&statements), vec![(2, 1), (0, 1), (2, 1), (1, 2)]);
    }

    #[tokio::test]
    async fn test_empty_append_writes_nothing() {
        let storage = InMemoryStorage::new();
        let study_id = storage.create_new_study(None).await.unwrap();
        let ledger = PreferenceLedger::new(&storage, study_id);

        ledger.append(&[]).await.unwrap();

        assert!(storage
            .get_study_system_attrs(study_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_system_attrs_are_ignored() {
        let storage = InMemoryStorage::new();
        let study_id = storage.create_new_study(None).await.unwrap();
        storage
            .set_study_system_attr(study_id, "preference:is_preferential", serde_json::json!(true))
            .await
            .unwrap();
        let ledger = PreferenceLedger::new(&storage, study_id);

        ledger.append(&[PreferenceStatement::new(0, 1)]).await.unwrap();

        assert_eq!(pairs(&ledger.read_all().await.unwrap()), vec![(0, 1)]);
    }

    #[tokio::test]
    async fn test_malformed_batch_is_a_serialization_error() {
        let storage = InMemoryStorage::new();
        let study_id = storage.create_new_study(None).await.unwrap();
        storage
            .set_study_system_attr(study_id, "preference:values:bad", serde_json::json!("oops"))
            .await
            .unwrap();

        let err = PreferenceLedger::new(&storage, study_id)
            .read_all()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_unknown_study_propagates() {
        let storage = InMemoryStorage::new();
        let ledger = PreferenceLedger::new(&storage, StudyId(42));

        let err = ledger.append(&[PreferenceStatement::new(0, 1)]).await.unwrap_err();

        assert!(matches!(err, Error::StudyIdNotFound(StudyId(42))));
    }
}
