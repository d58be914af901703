//! Core types for bulkfile.
//!
//! This crate provides the data structures shared by the bulk operation
//! orchestrator and its callers: directory entries, selection sets, operation
//! kinds with their policy table, outcomes, errors and configuration.

mod config;
mod entry;
mod error;
mod operation;
mod selection;

pub use config::{
    BulkConfig, ConfirmationPrompt, DEFAULT_CHANNEL, LocalGatewayConfig,
    LocalGatewayConfigBuilder, OrchestratorConfig, OrchestratorConfigBuilder,
};
pub use entry::{DirectoryEntry, EntryKind, EntryMetadata};
pub use error::{BulkError, GatewayError};
pub use operation::{
    BulkAction, KIND_POLICIES, KindPolicy, OperationKind, OperationOutcome, OperationRequest,
    ReconcileStrategy, policy_for,
};
pub use selection::SelectionSet;
