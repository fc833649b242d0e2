//! Collaborator traits the engine depends on.
//!
//! Infrastructure crates implement these; the engine never sees HTTP, tokens,
//! or pagination. Every method is awaited to completion before the next call
//! is issued, so implementations need not be safe for concurrent use by one run.

use async_trait::async_trait;

use crate::{DirectoryError, LabelName, LabelUpdate, LookupError, NewLabel, RemoteLabel};

/// Read/write access to the labels of one remote repository, keyed by name.
#[async_trait]
pub trait LabelDirectory: Send + Sync {
    /// Fetches the label currently named `name`.
    ///
    /// Implementations must return [`LookupError::NotFound`] only when the
    /// remote positively reports the label as absent.
    async fn get_label(&self, name: &LabelName) -> Result<RemoteLabel, LookupError>;

    /// Creates a new label.
    async fn create_label(&self, label: &NewLabel) -> Result<RemoteLabel, DirectoryError>;

    /// Renames and overwrites the label currently named `current_name`.
    async fn update_label(
        &self,
        current_name: &LabelName,
        update: &LabelUpdate,
    ) -> Result<RemoteLabel, DirectoryError>;
}

/// Verifies the target repository is reachable before any label is touched.
#[async_trait]
pub trait RepositoryProbe: Send + Sync {
    /// Returns an error if the repository does not exist or cannot be read
    /// with the configured credentials.
    async fn ensure_repository(&self) -> Result<(), DirectoryError>;
}

#[async_trait]
impl<T: LabelDirectory + ?Sized> LabelDirectory for &T {
    async fn get_label(&self, name: &LabelName) -> Result<RemoteLabel, LookupError> {
        (**self).get_label(name).await
    }

    async fn create_label(&self, label: &NewLabel) -> Result<RemoteLabel, DirectoryError> {
        (**self).create_label(label).await
    }

    async fn update_label(
        &self,
        current_name: &LabelName,
        update: &LabelUpdate,
    ) -> Result<RemoteLabel, DirectoryError> {
        (**self).update_label(current_name, update).await
    }
}
