//! Bulk operation orchestration.
//!
//! One dispatch runs the whole flow for a selection: confirmation for
//! destructive kinds, the remote call, cache reconciliation and selection
//! reset. Failures never escape as errors; they come back as an
//! [`OperationOutcome`] and are reported on the notification channel.

use std::sync::Arc;

use bulkfile_core::{
    BulkAction, BulkError, GatewayError, KindPolicy, OperationOutcome, OperationRequest,
    OrchestratorConfig, ReconcileStrategy,
};
use compact_str::CompactString;
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    ConfirmationGate, DirectoryCache, GateDecision, Notifier, RemoteFileGateway, SelectionStore,
    normalize_directory,
};

/// Whether an operation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OrchestratorState {
    #[default]
    Idle,
    Busy,
}

/// Marks the orchestrator busy for as long as it lives.
struct BusyGuard<'a> {
    state: &'a watch::Sender<OrchestratorState>,
}

impl<'a> BusyGuard<'a> {
    /// Switch from idle to busy. Returns `None` if already busy.
    fn acquire(state: &'a watch::Sender<OrchestratorState>) -> Option<Self> {
        let acquired = state.send_if_modified(|current| {
            if *current == OrchestratorState::Busy {
                return false;
            }
            *current = OrchestratorState::Busy;
            true
        });
        acquired.then_some(Self { state })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(OrchestratorState::Idle);
    }
}

/// Runs bulk actions against the current selection.
///
/// The selection, cache and gate are shared handles so the rendering side
/// can read them (and answer the gate) while a dispatch is suspended.
pub struct BulkOperationOrchestrator {
    config: OrchestratorConfig,
    gateway: Arc<dyn RemoteFileGateway>,
    cache: Arc<DirectoryCache>,
    selection: SelectionStore,
    gate: Arc<ConfirmationGate>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<OrchestratorState>,
}

impl std::fmt::Debug for BulkOperationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkOperationOrchestrator")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("selection", &self.selection)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl BulkOperationOrchestrator {
    /// Create an orchestrator with its own confirmation gate and default config.
    pub fn new(
        gateway: Arc<dyn RemoteFileGateway>,
        cache: Arc<DirectoryCache>,
        selection: SelectionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(OrchestratorState::Idle);
        Self {
            config: OrchestratorConfig::default(),
            gateway,
            cache,
            selection,
            gate: Arc::new(ConfirmationGate::new()),
            notifier,
            state,
        }
    }

    /// Use a specific configuration.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing confirmation gate.
    pub fn with_gate(mut self, gate: Arc<ConfirmationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn gate(&self) -> &Arc<ConfirmationGate> {
        &self.gate
    }

    pub fn cache(&self) -> &Arc<DirectoryCache> {
        &self.cache
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    /// Callers should disable bulk actions while this is true.
    pub fn is_busy(&self) -> bool {
        self.state() == OrchestratorState::Busy
    }

    /// Observe idle/busy transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    /// Compress the current selection into an archive in `directory`.
    pub async fn compress(&self, directory: &str) -> OperationOutcome {
        self.dispatch(BulkAction::Compress, directory).await
    }

    /// Delete the current selection from `directory`, after confirmation.
    pub async fn delete(&self, directory: &str) -> OperationOutcome {
        self.dispatch(BulkAction::Delete, directory).await
    }

    /// Move the current selection from `directory` into `destination`.
    pub async fn move_to(
        &self,
        directory: &str,
        destination: impl Into<CompactString>,
    ) -> OperationOutcome {
        self.dispatch(BulkAction::move_to(destination), directory).await
    }

    /// Run `action` on a snapshot of the current selection.
    ///
    /// With nothing selected this returns a no-op outcome without touching
    /// any state. A `directory` other than the one the selection was made in
    /// is rejected with [`BulkError::DirectoryMismatch`]. While another
    /// dispatch is in flight it returns a [`BulkError::Busy`] outcome. Otherwise the orchestrator is busy until
    /// the cache has been reconciled, whichever way the dispatch ends.
    pub async fn dispatch(&self, action: BulkAction, directory: &str) -> OperationOutcome {
        let kind = action.kind();
        let Some(request) = OperationRequest::new(action, self.selection.snapshot(), directory)
        else {
            debug!(target: "bulkfile::orchestrator", %kind, directory, "nothing selected");
            return OperationOutcome::noop(kind, directory);
        };

        let selected = self.selection.directory();
        if normalize_directory(directory) != normalize_directory(&selected) {
            debug!(
                target: "bulkfile::orchestrator",
                %kind,
                directory,
                selected = %selected,
                "selection belongs to another directory"
            );
            let error = BulkError::DirectoryMismatch {
                selected: selected.to_string(),
                requested: directory.to_string(),
            };
            return OperationOutcome::rejected(kind, directory, error);
        }

        let Some(_busy) = BusyGuard::acquire(&self.state) else {
            debug!(target: "bulkfile::orchestrator", %kind, directory, "already busy");
            return OperationOutcome::rejected(kind, directory, BulkError::Busy);
        };

        self.run(request).await
    }

    #[instrument(
        name = "bulk_dispatch",
        skip_all,
        fields(
            kind = %request.kind(),
            directory = request.directory(),
            targets = request.targets().len()
        )
    )]
    async fn run(&self, request: OperationRequest) -> OperationOutcome {
        let channel = self.config.channel.as_str();
        self.notifier.clear_channel(channel);

        let policy = request.kind().policy();
        if policy.destructive {
            let decision = self.gate.request(self.config.delete_prompt.clone()).await;
            if decision == GateDecision::Dismissed {
                debug!(target: "bulkfile::orchestrator", "confirmation dismissed");
                return OperationOutcome::failed(&request, BulkError::UserCancelled);
            }
        }

        let result = self
            .gateway
            .execute(request.action(), request.directory(), request.targets())
            .await;
        self.invalidate_destination(&request);

        match result {
            Ok(archive) => {
                if let Err(err) = self.reconcile(&request, policy.on_success).await {
                    warn!(
                        target: "bulkfile::orchestrator",
                        error = %err,
                        "refresh after success failed"
                    );
                    self.notifier.report_error(channel, &BulkError::from(err));
                }
                self.selection.clear();

                let outcome = OperationOutcome::succeeded(&request, archive);
                info!(target: "bulkfile::orchestrator", "{}", outcome.summary());
                outcome
            }
            Err(err) => {
                warn!(target: "bulkfile::orchestrator", error = %err, "operation failed");
                if let Err(refresh_err) = self.reconcile(&request, KindPolicy::ON_FAILURE).await {
                    warn!(
                        target: "bulkfile::orchestrator",
                        error = %refresh_err,
                        "refresh after failure failed"
                    );
                }

                let error = BulkError::from(err);
                self.notifier.report_error(channel, &error);
                OperationOutcome::failed(&request, error)
            }
        }
    }

    /// Forget the cached listing of a move's destination, if any.
    fn invalidate_destination(&self, request: &OperationRequest) {
        if let BulkAction::Move { destination } = request.action() {
            let target = destination_directory(request.directory(), destination);
            debug!(target: "bulkfile::orchestrator", destination = %target, "invalidating destination");
            self.cache.invalidate(&target);
        }
    }

    async fn reconcile(
        &self,
        request: &OperationRequest,
        strategy: ReconcileStrategy,
    ) -> Result<(), GatewayError> {
        debug!(target: "bulkfile::orchestrator", %strategy, "reconciling cache");
        match strategy {
            ReconcileStrategy::OptimisticRemoval => {
                self.cache
                    .remove_names(request.directory(), request.targets());
                Ok(())
            }
            ReconcileStrategy::AuthoritativeRefresh => {
                self.cache.refresh(request.directory()).await.map(|_| ())
            }
        }
    }
}

/// Store directory a move lands in. A leading `/` is store-absolute, anything
/// else is relative to the source directory.
fn destination_directory(directory: &str, destination: &str) -> CompactString {
    if destination.starts_with('/') {
        normalize_directory(destination)
    } else {
        normalize_directory(&format!("{directory}/{destination}"))
    }
}
