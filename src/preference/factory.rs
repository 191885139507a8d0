//! Creating and loading preferential studies

use std::sync::Arc;

use tracing::info;

use super::keys::SYSTEM_ATTR_PREFERENTIAL_STUDY;
use super::study::PreferentialStudy;
use crate::storage::TrialStorage;
use crate::{Error, Result};

/// Options for [`create_study`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyOptions {
    study_name: Option<String>,
    load_if_exists: bool,
}

impl StudyOptions {
    /// Create a new options builder
    #[must_use]
    pub fn builder() -> StudyOptionsBuilder {
        StudyOptionsBuilder::default()
    }

    /// Requested study name, if any.
    #[must_use]
    pub fn study_name(&self) -> Option<&str> {
        self.study_name.as_deref()
    }

    /// Whether a name clash loads the existing study instead of failing.
    #[must_use]
    pub const fn load_if_exists(&self) -> bool {
        self.load_if_exists
    }
}

/// Builder for `StudyOptions`.
#[derive(Debug, Default)]
pub struct StudyOptionsBuilder {
    study_name: Option<String>,
    load_if_exists: bool,
}

impl StudyOptionsBuilder {
    /// Set the study name. A unique name is generated when unset.
    #[must_use]
    pub fn study_name(mut self, study_name: impl Into<String>) -> Self {
        self.study_name = Some(study_name.into());
        self
    }

    /// On a name clash, load the existing study instead of failing.
    #[must_use]
    pub const fn load_if_exists(mut self, load_if_exists: bool) -> Self {
        self.load_if_exists = load_if_exists;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> StudyOptions {
        StudyOptions {
            study_name: self.study_name,
            load_if_exists: self.load_if_exists,
        }
    }
}

/// Create a preferential study and tag it with the preferential marker.
///
/// # Errors
///
/// Returns `DuplicatedStudy` if the name is taken and `load_if_exists` is
/// off; with `load_if_exists` on, any error of [`load_study`]. Storage
/// errors propagate.
pub async fn create_study<S: TrialStorage>(
    storage: Arc<S>,
    options: StudyOptions,
) -> Result<PreferentialStudy<S>> {
    match storage.create_new_study(options.study_name()).await {
        Ok(study_id) => {
            storage
                .set_study_system_attr(
                    study_id,
                    SYSTEM_ATTR_PREFERENTIAL_STUDY,
                    serde_json::Value::Bool(true),
                )
                .await?;
            let study_name = storage.get_study_name(study_id).await?;
            info!(%study_id, %study_name, "created preferential study");
            Ok(PreferentialStudy::new(storage, study_id, study_name))
        }
        Err(Error::DuplicatedStudy(name)) if options.load_if_exists() => {
            info!("Using an existing study with name '{name}' instead of creating a new one.");
            load_study(storage, Some(&name)).await
        }
        Err(err) => Err(err),
    }
}

/// Load a preferential study.
///
/// Without a name, the storage must hold exactly one study.
///
/// # Errors
///
/// Returns `StudyNotFound` for an unknown name, `AmbiguousStudy` when no
/// name is given and the storage does not hold exactly one study, and
/// `NotPreferential` when the study lacks the preferential marker.
pub async fn load_study<S: TrialStorage>(
    storage: Arc<S>,
    study_name: Option<&str>,
) -> Result<PreferentialStudy<S>> {
    let study_id = match study_name {
        Some(name) => storage.get_study_id_from_name(name).await?,
        None => {
            let studies = storage.get_all_studies().await?;
            match studies.as_slice() {
                [only] => only.study_id,
                [] => return Err(Error::AmbiguousStudy("the storage holds no study".into())),
                _ => {
                    return Err(Error::AmbiguousStudy(format!(
                        "the storage holds {} studies",
                        studies.len()
                    )))
                }
            }
        }
    };

    let study_name = storage.get_study_name(study_id).await?;
    let system_attrs = storage.get_study_system_attrs(study_id).await?;
    let is_preferential = system_attrs
        .get(SYSTEM_ATTR_PREFERENTIAL_STUDY)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    if !is_preferential {
        return Err(Error::NotPreferential { study_name });
    }

    info!(%study_id, %study_name, "loaded preferential study");
    Ok(PreferentialStudy::new(storage, study_id, study_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    #[test]
    fn test_options_builder() {
        let options = StudyOptions::builder()
            .study_name("s")
            .load_if_exists(true)
            .build();

        assert_eq!(options.study_name(), Some("s"));
        assert!(options.load_if_exists());
    }

    #[test]
    fn test_options_default() {
        let options = StudyOptions::default();

        assert!(options.study_name().is_none());
        assert!(!options.load_if_exists());
    }

    #[tokio::test]
    async fn test_create_sets_marker() {
        let storage = Arc::new(InMemoryStorage::new());

        let study = create_study(Arc::clone(&storage), StudyOptions::default())
            .await
            .unwrap();

        let attrs = storage
            .get_study_system_attrs(study.study_id())
            .await
            .unwrap();
        assert_eq!(attrs[SYSTEM_ATTR_PREFERENTIAL_STUDY], true);
        assert!(study.study_name().starts_with("no-name-"));
    }

    #[tokio::test]
    async fn test_duplicate_without_load_if_exists() {
        let storage = Arc::new(InMemoryStorage::new());
        let options = StudyOptions::builder().study_name("dup").build();
        create_study(Arc::clone(&storage), options.clone())
            .await
            .unwrap();

        let err = create_study(storage, options).await.unwrap_err();

        assert!(matches!(err, Error::DuplicatedStudy(name) if name == "dup"));
    }

    #[tokio::test]
    async fn test_duplicate_with_load_if_exists() {
        let storage = Arc::new(InMemoryStorage::new());
        let first = create_study(
            Arc::clone(&storage),
            StudyOptions::builder().study_name("shared").build(),
        )
        .await
        .unwrap();

        let second = create_study(
            Arc::clone(&storage),
            StudyOptions::builder()
                .study_name("shared")
                .load_if_exists(true)
                .build(),
        )
        .await
        .unwrap();

        assert_eq!(first.study_id(), second.study_id());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_load_if_exists_still_checks_marker() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.create_new_study(Some("plain")).await.unwrap();

        let err = create_study(
            storage,
            StudyOptions::builder()
                .study_name("plain")
                .load_if_exists(true)
                .build(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::NotPreferential { .. }));
    }

    #[tokio::test]
    async fn test_load_without_name_picks_single_study() {
        let storage = Arc::new(InMemoryStorage::new());
        let created = create_study(Arc::clone(&storage), StudyOptions::default())
            .await
            .unwrap();

        let loaded = load_study(storage, None).await.unwrap();

        assert_eq!(loaded.study_id(), created.study_id());
        assert_eq!(loaded.study_name(), created.study_name());
    }

    #[tokio::test]
    async fn test_load_without_name_is_ambiguous() {
        let empty = Arc::new(InMemoryStorage::new());
        assert!(matches!(
            load_study(Arc::clone(&empty), None).await.unwrap_err(),
            Error::AmbiguousStudy(_)
        ));

        create_study(Arc::clone(&empty), StudyOptions::default())
            .await
            .unwrap();
        create_study(Arc::clone(&empty), StudyOptions::default())
            .await
            .unwrap();
        assert!(matches!(
            load_study(empty, None).await.unwrap_err(),
            Error::AmbiguousStudy(_)
        ));
    }

    #[tokio::test]
    async fn test_load_unknown_name() {
        let storage = Arc::new(InMemoryStorage::new());

        let err = load_study(storage, Some("missing")).await.unwrap_err();

        assert!(matches!(err, Error::StudyNotFound(_)));
    }
}
