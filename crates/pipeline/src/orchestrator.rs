//! Single-writer actor owning the pipeline state.
//!
//! All events funnel through one unbounded intake and are applied in
//! arrival order by [`transition`]. Every applied event publishes a new
//! [`PipelineSnapshot`] on a `watch` channel, so readers never observe a
//! half-applied transition.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::machine::{transition, Disposition, PipelineContext, PipelineEvent, PipelineStep};
use crate::view::PipelineView;

/// The orchestrator task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Pipeline orchestrator is not running")]
pub struct OrchestratorClosed;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    pub step: PipelineStep,
    pub context: PipelineContext,
    /// Incremented on every applied event.
    pub revision: u64,
}

impl PipelineSnapshot {
    pub fn view(&self) -> PipelineView {
        PipelineView::of(self.step, &self.context)
    }
}

/// Result of [`OrchestratorHandle::dispatch_and_wait`].
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub disposition: Disposition,
    pub snapshot: PipelineSnapshot,
}

impl DispatchOutcome {
    pub fn applied(&self) -> bool {
        self.disposition == Disposition::Applied
    }
}

struct Envelope {
    event: PipelineEvent,
    reply: Option<oneshot::Sender<DispatchOutcome>>,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable sender side of the orchestrator.
#[derive(Clone)]
pub struct OrchestratorHandle {
    intake: mpsc::UnboundedSender<Envelope>,
    snapshots: watch::Receiver<PipelineSnapshot>,
}

impl OrchestratorHandle {
    /// Queue an event without waiting for it to be applied.
    pub fn dispatch(&self, event: PipelineEvent) -> Result<(), OrchestratorClosed> {
        self.intake
            .send(Envelope { event, reply: None })
            .map_err(|_| OrchestratorClosed)
    }

    /// Queue an event and wait for its disposition.
    pub async fn dispatch_and_wait(
        &self,
        event: PipelineEvent,
    ) -> Result<DispatchOutcome, OrchestratorClosed> {
        let (tx, rx) = oneshot::channel();
        self.intake
            .send(Envelope {
                event,
                reply: Some(tx),
            })
            .map_err(|_| OrchestratorClosed)?;
        rx.await.map_err(|_| OrchestratorClosed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every applied event.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.snapshots.clone()
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    step: PipelineStep,
    context: PipelineContext,
    revision: u64,
    intake: mpsc::UnboundedReceiver<Envelope>,
    publish: watch::Sender<PipelineSnapshot>,
}

impl Orchestrator {
    /// Start the actor in `idle`. It runs until `cancel` fires or every
    /// handle is dropped.
    pub fn spawn(cancel: CancellationToken) -> (OrchestratorHandle, JoinHandle<()>) {
        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let (publish, snapshots) = watch::channel(PipelineSnapshot::default());

        let actor = Orchestrator {
            step: PipelineStep::Idle,
            context: PipelineContext::default(),
            revision: 0,
            intake: intake_rx,
            publish,
        };
        let task = tokio::spawn(actor.run(cancel));

        let handle = OrchestratorHandle {
            intake: intake_tx,
            snapshots,
        };
        (handle, task)
    }

    async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Pipeline orchestrator started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Pipeline orchestrator shutting down");
                    break;
                }
                envelope = self.intake.recv() => {
                    let Some(envelope) = envelope else { break };
                    self.handle(envelope);
                }
            }
        }
    }

    fn handle(&mut self, Envelope { event, reply }: Envelope) {
        let from = self.step;
        let t = transition(self.step, &self.context, &event);

        match t.disposition {
            Disposition::Applied => {
                self.step = t.step;
                self.context = t.context;
                self.revision += 1;
                tracing::debug!(
                    event = event.name(),
                    from = %from,
                    to = %self.step,
                    revision = self.revision,
                    "Pipeline event applied",
                );
                self.publish.send_replace(self.snapshot());
            }
            Disposition::GuardRejected => {
                tracing::debug!(event = event.name(), step = %from, "Pipeline guard rejected event");
            }
            Disposition::Unhandled => {
                tracing::debug!(event = event.name(), step = %from, "Pipeline event ignored in step");
            }
        }

        if let Some(reply) = reply {
            let _ = reply.send(DispatchOutcome {
                disposition: t.disposition,
                snapshot: self.snapshot(),
            });
        }
    }

    fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            step: self.step,
            context: self.context.clone(),
            revision: self.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn applied_events_bump_revision_and_publish() {
        let (handle, _task) = Orchestrator::spawn(CancellationToken::new());
        let mut updates = handle.subscribe();

        let outcome = handle
            .dispatch_and_wait(PipelineEvent::SetIdea { idea: "x".into() })
            .await
            .unwrap();

        assert!(outcome.applied());
        assert_eq!(outcome.snapshot.step, PipelineStep::IdeaInput);
        assert_eq!(outcome.snapshot.revision, 1);
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().context.idea, "x");
    }

    #[tokio::test]
    async fn rejected_events_leave_snapshot_untouched() {
        let (handle, _task) = Orchestrator::spawn(CancellationToken::new());

        let outcome = handle
            .dispatch_and_wait(PipelineEvent::ConfirmAudio)
            .await
            .unwrap();

        assert_eq!(outcome.disposition, Disposition::Unhandled);
        assert_eq!(outcome.snapshot, PipelineSnapshot::default());
        assert_eq!(handle.snapshot().revision, 0);
    }

    #[tokio::test]
    async fn fire_and_forget_events_apply_in_order() {
        let (handle, _task) = Orchestrator::spawn(CancellationToken::new());

        handle.dispatch(PipelineEvent::SetIdea { idea: "x".into() }).unwrap();
        handle
            .dispatch(PipelineEvent::EditScript {
                script: "Draft.".into(),
            })
            .unwrap();
        let outcome = handle
            .dispatch_and_wait(PipelineEvent::ConfirmScript)
            .await
            .unwrap();

        assert_eq!(outcome.snapshot.step, PipelineStep::ScriptReady);
        assert!(outcome.snapshot.context.script_confirmed);
        assert_eq!(outcome.snapshot.revision, 3);
    }

    #[tokio::test]
    async fn cancelled_orchestrator_refuses_events() {
        let cancel = CancellationToken::new();
        let (handle, task) = Orchestrator::spawn(cancel.clone());

        cancel.cancel();
        task.await.unwrap();

        assert_matches!(handle.dispatch(PipelineEvent::GenerateScript), Err(OrchestratorClosed));
        assert_matches!(
            handle.dispatch_and_wait(PipelineEvent::GenerateScript).await,
            Err(OrchestratorClosed)
        );
    }
}
