//! Interface to the remote file store.

use async_trait::async_trait;
use bulkfile_core::{BulkAction, DirectoryEntry, GatewayError, SelectionSet};

/// Remote operations the orchestrator relies on.
///
/// Implementations are thin: one remote call per method, no retries. A call
/// may reach the store more than once; callers never retry on their own.
#[async_trait]
pub trait RemoteFileGateway: Send + Sync {
    /// Fetch the authoritative listing of a directory.
    async fn list(&self, directory: &str) -> Result<Vec<DirectoryEntry>, GatewayError>;

    /// Pack the named entries into a new archive inside `directory`.
    async fn compress(
        &self,
        directory: &str,
        names: &SelectionSet,
    ) -> Result<DirectoryEntry, GatewayError>;

    /// Remove the named entries.
    async fn delete(&self, directory: &str, names: &SelectionSet) -> Result<(), GatewayError>;

    /// Move the named entries into `destination`.
    async fn move_entries(
        &self,
        directory: &str,
        names: &SelectionSet,
        destination: &str,
    ) -> Result<(), GatewayError>;

    /// Run a bulk action. Returns the archive created by a compress.
    async fn execute(
        &self,
        action: &BulkAction,
        directory: &str,
        names: &SelectionSet,
    ) -> Result<Option<DirectoryEntry>, GatewayError> {
        match action {
            BulkAction::Compress => self.compress(directory, names).await.map(Some),
            BulkAction::Delete => self.delete(directory, names).await.map(|()| None),
            BulkAction::Move { destination } => self
                .move_entries(directory, names, destination)
                .await
                .map(|()| None),
        }
    }
}
