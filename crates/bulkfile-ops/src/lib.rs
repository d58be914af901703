//! Bulk operation orchestrator for bulkfile.
//!
//! This crate sequences grouped actions (compress, move, delete) on a set
//! of selected entries: confirmation for destructive kinds, the call to the
//! file store, reconciliation of the local directory cache, and reset of the
//! selection. The file store and the notification surface are consumed
//! through the [`RemoteFileGateway`] and [`Notifier`] traits.

mod cache;
mod gate;
mod gateway;
mod local;
mod notify;
mod orchestrator;
mod selection_store;

pub use cache::{DirectoryCache, normalize_directory};
pub use gate::{ConfirmationGate, GateDecision, GateState};
pub use gateway::RemoteFileGateway;
pub use local::{LocalFileGateway, archive_file_name, unique_path, validate_entry_name};
pub use notify::{Flash, FlashBoard, FlashLevel, Notifier, TracingNotifier};
pub use orchestrator::{BulkOperationOrchestrator, OrchestratorState};
pub use selection_store::SelectionStore;
