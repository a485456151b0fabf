//! Draft actor: an isolated Tokio task that owns one live draft.
//!
//! Every pick, edit and read for a draft goes through its actor's channel
//! and is handled one at a time, so a pick's checks and its mutation can't
//! interleave with another pick on the same draft.
//!
//! The store is the source of truth. Before each command the actor reloads
//! the draft if the stored revision moved, so another process writing the
//! same draft can't leave the actor validating against a stale copy.
//!
//! An actor stops once its draft is completed (after finishing the commands
//! already queued) or after sitting idle for the configured timeout.

use std::sync::Arc;
use std::time::Duration;

use pokedrafter_protocol::{DraftId, UserId};
use tokio::sync::{mpsc, oneshot};

use crate::{Draft, DraftConfig, DraftError, DraftStore, DraftUpdate, StoreError};

/// Commands sent to a draft actor through its channel.
pub(crate) enum DraftCommand {
    Pick {
        participant: UserId,
        entry: String,
        reply: oneshot::Sender<Result<Draft, DraftError>>,
    },

    Update {
        update: DraftUpdate,
        reply: oneshot::Sender<Result<Draft, DraftError>>,
    },

    Get {
        reply: oneshot::Sender<Result<Draft, DraftError>>,
    },

    Shutdown,
}

/// Handle to a running draft actor.
///
/// Cheap to clone; the [`DraftManager`](crate::DraftManager) keeps one per
/// live draft.
#[derive(Clone)]
pub struct DraftHandle {
    draft_id: DraftId,
    sender: mpsc::Sender<DraftCommand>,
}

impl DraftHandle {
    pub fn draft_id(&self) -> DraftId {
        self.draft_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Submits a pick and returns the draft as it is after the pick.
    pub async fn submit_pick(
        &self,
        participant: UserId,
        entry: impl Into<String>,
    ) -> Result<Draft, DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DraftCommand::Pick {
                participant,
                entry: entry.into(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        reply_rx
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?
    }

    /// Applies a moderator edit and returns the edited draft.
    pub async fn update(&self, update: DraftUpdate) -> Result<Draft, DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DraftCommand::Update {
                update,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        reply_rx
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?
    }

    /// Returns a snapshot of the draft.
    pub async fn get(&self) -> Result<Draft, DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DraftCommand::Get { reply: reply_tx })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        reply_rx
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), DraftError> {
        self.sender
            .send(DraftCommand::Shutdown)
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct DraftActor<S: DraftStore> {
    draft: Draft,
    store: Arc<S>,
    receiver: mpsc::Receiver<DraftCommand>,
    idle_timeout: Duration,
}

impl<S: DraftStore> DraftActor<S> {
    async fn run(mut self) {
        let draft_id = self.draft.id();
        tracing::info!(%draft_id, status = %self.draft.status(), "draft actor started");

        loop {
            let cmd = match tokio::time::timeout(self.idle_timeout, self.receiver.recv()).await {
                Ok(Some(cmd)) => cmd,
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!(%draft_id, "draft actor idle");
                    break;
                }
            };

            match cmd {
                DraftCommand::Pick {
                    participant,
                    entry,
                    reply,
                } => {
                    let result = self.handle_pick(participant, &entry).await;
                    self.close_if_finished();
                    let _ = reply.send(result);
                }
                DraftCommand::Update { update, reply } => {
                    let result = self.handle_update(update).await;
                    self.close_if_finished();
                    let _ = reply.send(result);
                }
                DraftCommand::Get { reply } => {
                    let result = self.refresh().await.map(|()| self.draft.clone());
                    let _ = reply.send(result);
                }
                DraftCommand::Shutdown => break,
            }
        }

        tracing::info!(%draft_id, "draft actor stopped");
    }

    /// Refuses new commands once the draft is over. Commands already queued
    /// are still answered.
    fn close_if_finished(&mut self) {
        if !self.draft.status().is_active() {
            self.receiver.close();
        }
    }

    /// Adopts the stored draft if someone else wrote a newer revision.
    async fn refresh(&mut self) -> Result<(), DraftError> {
        let draft_id = self.draft.id();
        let stored = self
            .store
            .get_draft(draft_id)
            .await?
            .ok_or_else(|| StoreError::Missing(format!("draft {draft_id}")))?;
        if stored.revision() != self.draft.revision() {
            tracing::info!(
                %draft_id,
                live = self.draft.revision(),
                stored = stored.revision(),
                "reloaded draft from store"
            );
            self.draft = stored;
        }
        Ok(())
    }

    async fn handle_pick(&mut self, participant: UserId, entry: &str) -> Result<Draft, DraftError> {
        let draft_id = self.draft.id();
        self.refresh().await?;
        let mut next = self.draft.clone();
        let outcome = match next.submit_pick(participant, entry) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!(%draft_id, %participant, entry, kind = err.kind(), "pick rejected");
                return Err(err.into());
            }
        };

        self.commit(next).await?;

        tracing::info!(
            %draft_id,
            %participant,
            entry,
            cost = outcome.cost,
            score = outcome.score,
            "pick accepted"
        );
        if outcome.completed {
            tracing::info!(%draft_id, "draft completed");
        }
        Ok(self.draft.clone())
    }

    async fn handle_update(&mut self, update: DraftUpdate) -> Result<Draft, DraftError> {
        let draft_id = self.draft.id();
        self.refresh().await?;
        let was_active = self.draft.status().is_active();
        let mut next = self.draft.clone();
        if let Err(err) = next.apply_update(update) {
            tracing::debug!(%draft_id, error = %err, "draft update rejected");
            return Err(err);
        }

        self.commit(next).await?;

        tracing::info!(%draft_id, revision = self.draft.revision(), "draft updated");
        if was_active && !self.draft.status().is_active() {
            tracing::info!(%draft_id, "draft completed");
        }
        Ok(self.draft.clone())
    }

    /// Persists `next` against the current revision and, only if that
    /// succeeds, makes it the live draft.
    ///
    /// A lost compare-and-swap is reported, not retried; the live draft is
    /// reloaded so the next command sees what was actually stored.
    async fn commit(&mut self, mut next: Draft) -> Result<(), DraftError> {
        let expected = self.draft.revision();
        next.touch();
        let written = self.store.replace_draft(&next, expected).await;
        if let Err(err) = written {
            tracing::warn!(draft_id = %next.id(), error = %err, "failed to persist draft");
            if matches!(err, StoreError::Conflict { .. }) {
                if let Err(reload) = self.refresh().await {
                    tracing::warn!(draft_id = %next.id(), error = %reload, "failed to reload draft");
                }
            }
            return Err(err.into());
        }
        self.draft = next;
        Ok(())
    }
}

/// Spawns an actor that owns `draft` and returns its handle.
pub(crate) fn spawn_draft<S: DraftStore>(
    draft: Draft,
    store: Arc<S>,
    config: &DraftConfig,
) -> DraftHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);
    let draft_id = draft.id();

    let actor = DraftActor {
        draft,
        store,
        receiver: rx,
        idle_timeout: config.idle_timeout,
    };

    tokio::spawn(actor.run());

    DraftHandle {
        draft_id,
        sender: tx,
    }
}
