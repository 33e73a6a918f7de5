use std::sync::Arc;

use labcoat_core::Build;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::action::{ActionError, ActionKind, ActionRequest, ActionRunId};
use crate::bus::{BusEvent, EventBus};
use crate::ports::{BuildService, BusyIndicator, NotificationSink};

/// Runs retry/erase/cancel against a remote build, one at a time.
///
/// `perform` returns immediately. The remote call runs on the tokio runtime and
/// its outcome is queued back to the owner, who applies it with [`tick`] (UI
/// loops) or [`wait_for_outcome`]. Only the owner touches the busy indicator and
/// the notification sink.
///
/// [`tick`]: BuildActionController::tick
/// [`wait_for_outcome`]: BuildActionController::wait_for_outcome
pub struct BuildActionController<S, N, B> {
    service: Arc<S>,
    notifier: N,
    busy: B,
    bus: EventBus,
    runtime: Handle,

    tx: mpsc::Sender<ActionOutcome>,
    rx: mpsc::Receiver<ActionOutcome>,
    in_flight: Option<InFlight>,
}

struct InFlight {
    run_id: ActionRunId,
    request: ActionRequest,
    cancel: CancellationToken,
}

struct ActionOutcome {
    run_id: ActionRunId,
    request: ActionRequest,
    result: anyhow::Result<Build>,
}

impl<S, N, B> BuildActionController<S, N, B>
where
    S: BuildService,
    N: NotificationSink,
    B: BusyIndicator,
{
    /// Uses the current tokio runtime, or a shared background runtime when
    /// called outside of one.
    pub fn new(service: S, notifier: N, busy: B, bus: EventBus) -> anyhow::Result<Self> {
        let runtime = crate::async_runtime::handle()?;
        Ok(Self::with_runtime(runtime, service, notifier, busy, bus))
    }

    pub fn with_runtime(runtime: Handle, service: S, notifier: N, busy: B, bus: EventBus) -> Self {
        let (tx, rx) = mpsc::channel(labcoat_config::OUTCOME_QUEUE_CAPACITY);
        Self {
            service: Arc::new(service),
            notifier,
            busy,
            bus,
            runtime,
            tx,
            rx,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn perform(&mut self, request: ActionRequest) -> Result<(), ActionError> {
        if let Some(current) = &self.in_flight {
            debug!(
                "Rejecting {} of {}: {} of {} still in flight",
                request.kind, request.target, current.request.kind, current.request.target
            );
            return Err(ActionError::Busy {
                target: current.request.target,
            });
        }

        let run_id: ActionRunId = uuid::Uuid::new_v4();
        let cancel = CancellationToken::new();

        self.busy.set_busy(true);
        info!(
            "Starting {} of build {} (run {})",
            request.kind, request.target, run_id
        );

        let service = self.service.clone();
        let tx = self.tx.clone();
        let token = cancel.clone();
        self.runtime.spawn(async move {
            // The request itself is left to finish; only delivery is cancelled.
            let call = tokio::spawn(async move { invoke(service.as_ref(), request).await });
            let result = tokio::select! {
                _ = token.cancelled() => return,
                joined = call => joined.unwrap_or_else(|e| {
                    Err(anyhow::anyhow!("build action task failed: {e}"))
                }),
            };
            let _ = tx
                .send(ActionOutcome {
                    run_id,
                    request,
                    result,
                })
                .await;
        });

        self.in_flight = Some(InFlight {
            run_id,
            request,
            cancel,
        });
        Ok(())
    }

    /// Apply every outcome that has already arrived. Never blocks.
    pub fn tick(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.rx.try_recv() {
            if self.apply(outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the in-flight action to finish and apply its outcome.
    /// Returns `None` when nothing is in flight.
    pub async fn wait_for_outcome(&mut self) -> Option<ActionKind> {
        while self.in_flight.is_some() {
            let outcome = self.rx.recv().await?;
            let kind = outcome.request.kind;
            if self.apply(outcome) {
                return Some(kind);
            }
        }
        None
    }

    fn apply(&mut self, outcome: ActionOutcome) -> bool {
        match &self.in_flight {
            Some(current) if current.run_id == outcome.run_id => {}
            _ => {
                debug!(
                    "Dropping stale outcome of {} for {} (run {})",
                    outcome.request.kind, outcome.request.target, outcome.run_id
                );
                return false;
            }
        }
        self.in_flight = None;

        let ActionOutcome {
            request, result, ..
        } = outcome;
        self.busy.set_busy(false);

        match result {
            Ok(build) => {
                self.notifier.show(request.kind.success_message());
                self.bus.publish(BusEvent::BuildChanged {
                    target: request.target,
                    build,
                });
            }
            Err(cause) => {
                let err = ActionError::RequestFailed {
                    kind: request.kind,
                    target: request.target,
                    cause,
                };
                error!("{}", err);
                self.notifier.show(request.kind.failure_message());
            }
        }
        true
    }
}

impl<S, N, B> BuildActionController<S, N, B> {
    /// Stop delivery of the pending outcome, if any. The busy indicator and the
    /// notification sink are left untouched: the surface is assumed gone.
    pub fn detach(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            debug!(
                "Detaching {} of {} (run {})",
                pending.request.kind, pending.request.target, pending.run_id
            );
            pending.cancel.cancel();
        }
    }

    pub fn teardown(mut self) {
        self.detach();
    }
}

impl<S, N, B> Drop for BuildActionController<S, N, B> {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn invoke<S: BuildService + ?Sized>(
    service: &S,
    request: ActionRequest,
) -> anyhow::Result<Build> {
    let ActionRequest { kind, target } = request;
    match kind {
        ActionKind::Retry => service.retry_build(target.project_id, target.build_id).await,
        ActionKind::Erase => service.erase_build(target.project_id, target.build_id).await,
        ActionKind::Cancel => service.cancel_build(target.project_id, target.build_id).await,
    }
}
