//! Confirmation workflow: resolving one waiting review item.
//!
//! A reviewer picks an item and a resolution mode, confirms (or cancels),
//! and on success the queue refreshes and the pending-delta badge resets.
//! The machine is `Closed -> Open -> Closed`; a failed backend call keeps
//! it open so the reviewer can retry or cancel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use revq_core::error::ActionError;
use revq_core::review::ReviewItem;
use revq_core::store::ReviewStore;
use revq_core::types::DbId;

use crate::controller::ReviewQueueController;
use crate::events::{ReviewEvent, ReviewEvents};

/// How an item gets resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Send the AI draft answer to the conversation, then mark confirmed
    /// (backend `approve`).
    Ai,
    /// Mark confirmed without sending the AI answer; the support team
    /// answers directly (backend `reject`).
    Manual,
}

impl ResolutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionMode::Ai => "ai",
            ResolutionMode::Manual => "manual",
        }
    }
}

/// Errors surfaced by the workflow.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// `confirm` was called without an open confirmation.
    #[error("no confirmation is open")]
    NotOpen,

    /// A confirm call is already in flight (rapid repeated clicks).
    #[error("a confirmation is already being submitted")]
    InFlight,

    /// The backend rejected the action; the confirmation stays open.
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Externally visible workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum WorkflowStatus {
    Closed,
    Open {
        id: DbId,
        mode: ResolutionMode,
        in_flight: bool,
    },
}

enum State {
    Closed,
    Open {
        item: ReviewItem,
        mode: ResolutionMode,
        in_flight: bool,
    },
}

/// Per-invocation confirmation machine.
pub struct ConfirmationWorkflow {
    store: Arc<dyn ReviewStore>,
    controller: Arc<ReviewQueueController>,
    events: ReviewEvents,
    state: Mutex<State>,
}

impl ConfirmationWorkflow {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        controller: Arc<ReviewQueueController>,
        events: ReviewEvents,
    ) -> Self {
        Self {
            store,
            controller,
            events,
            state: Mutex::new(State::Closed),
        }
    }

    pub async fn status(&self) -> WorkflowStatus {
        match &*self.state.lock().await {
            State::Closed => WorkflowStatus::Closed,
            State::Open {
                item,
                mode,
                in_flight,
            } => WorkflowStatus::Open {
                id: item.id,
                mode: *mode,
                in_flight: *in_flight,
            },
        }
    }

    /// Open a confirmation for `item`. Choosing the mode here has no side
    /// effects; nothing reaches the backend until [`confirm`](Self::confirm).
    pub async fn open(&self, item: ReviewItem, mode: ResolutionMode) -> Result<(), WorkflowError> {
        let mut state = self.state.lock().await;
        if matches!(*state, State::Open { in_flight: true, .. }) {
            return Err(WorkflowError::InFlight);
        }
        tracing::debug!(id = item.id, mode = mode.as_str(), "Confirmation opened");
        *state = State::Open {
            item,
            mode,
            in_flight: false,
        };
        Ok(())
    }

    /// Dispatch the chosen backend action.
    ///
    /// On success the queue is refreshed, the pending delta resets, and
    /// the workflow closes. On failure it stays open with nothing about
    /// the list changed, so the reviewer can retry or cancel. Calling
    /// this on a closed workflow is an error, not a silent double submit.
    pub async fn confirm(&self) -> Result<(), WorkflowError> {
        let (id, mode) = {
            let mut state = self.state.lock().await;
            match &mut *state {
                State::Closed => return Err(WorkflowError::NotOpen),
                State::Open {
                    in_flight: true, ..
                } => return Err(WorkflowError::InFlight),
                State::Open {
                    item,
                    mode,
                    in_flight,
                } => {
                    *in_flight = true;
                    (item.id, *mode)
                }
            }
        };

        let result = match mode {
            ResolutionMode::Ai => self.store.approve(id).await,
            ResolutionMode::Manual => self.store.reject(id).await,
        };

        match result {
            Ok(()) => {
                // Refresh before closing; the in-flight flag keeps
                // concurrent confirms out meanwhile.
                self.controller.refresh_after_action().await;
                self.events
                    .publish(ReviewEvent::ItemResolved { id, mode });
                tracing::info!(id, mode = mode.as_str(), "Review item resolved");
                *self.state.lock().await = State::Closed;
                Ok(())
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Confirmation failed; staying open");
                let mut state = self.state.lock().await;
                if let State::Open { in_flight, .. } = &mut *state {
                    *in_flight = false;
                }
                Err(WorkflowError::Action(e))
            }
        }
    }

    /// Close without touching the backend. Closing an already-closed
    /// workflow is a no-op.
    pub async fn cancel(&self) -> Result<(), WorkflowError> {
        let mut state = self.state.lock().await;
        if matches!(*state, State::Open { in_flight: true, .. }) {
            return Err(WorkflowError::InFlight);
        }
        *state = State::Closed;
        Ok(())
    }
}
