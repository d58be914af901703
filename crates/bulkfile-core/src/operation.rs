//! Bulk operation types and the per-kind policy table.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{BulkError, DirectoryEntry, SelectionSet};

/// The kind of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Compress,
    Delete,
    Move,
}

impl OperationKind {
    /// Look up this kind's policy.
    pub fn policy(self) -> &'static KindPolicy {
        policy_for(self)
    }

    /// Destructive kinds pass through the confirmation gate.
    pub fn is_destructive(self) -> bool {
        self.policy().destructive
    }

    /// Past-tense verb for summaries.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Compress => "Compressed",
            Self::Delete => "Deleted",
            Self::Move => "Moved",
        }
    }
}

/// A bulk action with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BulkAction {
    /// Pack the targets into a new archive in the same directory.
    Compress,
    /// Permanently remove the targets.
    Delete,
    /// Move the targets to another directory.
    Move { destination: CompactString },
}

impl BulkAction {
    /// Create a move action.
    pub fn move_to(destination: impl Into<CompactString>) -> Self {
        Self::Move {
            destination: destination.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Compress => OperationKind::Compress,
            Self::Delete => OperationKind::Delete,
            Self::Move { .. } => OperationKind::Move,
        }
    }
}

/// How the directory cache is brought back in line after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum ReconcileStrategy {
    /// Drop the targets from the cache without asking the store.
    OptimisticRemoval,
    /// Discard the cached listing and re-fetch it from the store.
    AuthoritativeRefresh,
}

/// Per-kind orchestration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPolicy {
    pub kind: OperationKind,
    /// Requires explicit confirmation before the remote call.
    pub destructive: bool,
    /// Reconciliation applied when the remote call succeeds.
    pub on_success: ReconcileStrategy,
}

impl KindPolicy {
    /// Reconciliation applied when the remote call fails.
    pub const ON_FAILURE: ReconcileStrategy = ReconcileStrategy::AuthoritativeRefresh;
}

/// Policy table, one row per [`OperationKind`].
///
/// Delete removes names the store no longer has, so the cache can drop them
/// directly. Compress and move create entries whose final names and
/// metadata only the store knows.
pub const KIND_POLICIES: [KindPolicy; 3] = [
    KindPolicy {
        kind: OperationKind::Compress,
        destructive: false,
        on_success: ReconcileStrategy::AuthoritativeRefresh,
    },
    KindPolicy {
        kind: OperationKind::Delete,
        destructive: true,
        on_success: ReconcileStrategy::OptimisticRemoval,
    },
    KindPolicy {
        kind: OperationKind::Move,
        destructive: false,
        on_success: ReconcileStrategy::AuthoritativeRefresh,
    },
];

/// Look up the policy for a kind.
pub fn policy_for(kind: OperationKind) -> &'static KindPolicy {
    match kind {
        OperationKind::Compress => &KIND_POLICIES[0],
        OperationKind::Delete => &KIND_POLICIES[1],
        OperationKind::Move => &KIND_POLICIES[2],
    }
}

/// One orchestration attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    action: BulkAction,
    targets: SelectionSet,
    directory: CompactString,
}

impl OperationRequest {
    /// Build a request from a selection snapshot.
    ///
    /// Returns `None` when the snapshot is empty.
    pub fn new(
        action: BulkAction,
        targets: SelectionSet,
        directory: impl Into<CompactString>,
    ) -> Option<Self> {
        if targets.is_empty() {
            return None;
        }
        Some(Self {
            action,
            targets,
            directory: directory.into(),
        })
    }

    pub fn action(&self) -> &BulkAction {
        &self.action
    }

    pub fn kind(&self) -> OperationKind {
        self.action.kind()
    }

    pub fn targets(&self) -> &SelectionSet {
        &self.targets
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub kind: OperationKind,
    pub directory: CompactString,
    pub success: bool,
    /// Names the operation was applied to.
    pub affected: SelectionSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkError>,
    /// The archive created by a successful compress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<DirectoryEntry>,
}

impl OperationOutcome {
    /// A dispatch with nothing selected: no calls were made.
    pub fn noop(kind: OperationKind, directory: impl Into<CompactString>) -> Self {
        Self {
            kind,
            directory: directory.into(),
            success: false,
            affected: SelectionSet::new(),
            error: None,
            archive: None,
        }
    }

    /// A successful operation on the request's targets.
    pub fn succeeded(request: &OperationRequest, archive: Option<DirectoryEntry>) -> Self {
        Self {
            kind: request.kind(),
            directory: request.directory.clone(),
            success: true,
            affected: request.targets.clone(),
            error: None,
            archive,
        }
    }

    /// A failed (or cancelled) operation on the request's targets.
    pub fn failed(request: &OperationRequest, error: BulkError) -> Self {
        Self {
            kind: request.kind(),
            directory: request.directory.clone(),
            success: false,
            affected: request.targets.clone(),
            error: Some(error),
            archive: None,
        }
    }

    /// A dispatch rejected before it started.
    pub fn rejected(kind: OperationKind, directory: impl Into<CompactString>, error: BulkError) -> Self {
        Self {
            error: Some(error),
            ..Self::noop(kind, directory)
        }
    }

    /// True when nothing was attempted because nothing was selected.
    pub fn is_noop(&self) -> bool {
        !self.success && self.error.is_none() && self.affected.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, Some(BulkError::UserCancelled))
    }

    /// Human-readable summary of the outcome.
    pub fn summary(&self) -> String {
        if self.success {
            let count = self.affected.len();
            let noun = if count == 1 { "item" } else { "items" };
            match &self.archive {
                Some(archive) => format!(
                    "{} {} {} into {}",
                    self.kind.past_tense(),
                    count,
                    noun,
                    archive.name
                ),
                None => format!("{} {} {}", self.kind.past_tense(), count, noun),
            }
        } else if let Some(error) = &self.error {
            format!("{} failed: {}", self.kind, error)
        } else {
            "Nothing selected".to_string()
        }
    }
}
