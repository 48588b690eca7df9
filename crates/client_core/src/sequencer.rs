//! One "current interpretation" per session.
//!
//! Every draw mints a fresh [`RequestId`] and makes it the active identity.
//! The previous in-flight task is aborted as cleanup, but correctness rests on
//! the identity check at completion: a result is applied only while its
//! request is still the active one and still loading.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use shared::{
    domain::{CardDefinition, DrawnSpread},
    protocol::SpreadRequest,
    spread::SpreadLayout,
};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    drawer::{draw_spread, DrawError},
    interpretation::{InterpretationError, Interpreter},
};

/// Opaque per-draw token. Only ever compared, never sent anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InterpretationStatus {
    #[default]
    Idle,
    Loading {
        request_id: RequestId,
    },
    Succeeded {
        request_id: RequestId,
        text: String,
    },
    Failed {
        request_id: RequestId,
        error: String,
    },
}

impl InterpretationStatus {
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            InterpretationStatus::Idle => None,
            InterpretationStatus::Loading { request_id }
            | InterpretationStatus::Succeeded { request_id, .. }
            | InterpretationStatus::Failed { request_id, .. } => Some(*request_id),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, InterpretationStatus::Loading { .. })
    }

    fn is_loading_for(&self, id: RequestId) -> bool {
        matches!(self, InterpretationStatus::Loading { request_id } if *request_id == id)
    }
}

/// What the presentation layer sees: the status plus the spread that the
/// active request was drawn from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerSnapshot {
    pub status: InterpretationStatus,
    pub spread: Option<Arc<DrawnSpread>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    Applied,
    Stale,
}

struct InFlight {
    request_id: RequestId,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Dispatch {
    last_request_id: u64,
    in_flight: Option<InFlight>,
}

pub struct RequestSequencer {
    interpreter: Arc<dyn Interpreter>,
    runtime: Handle,
    dispatch: Mutex<Dispatch>,
    state: watch::Sender<SequencerSnapshot>,
}

impl RequestSequencer {
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime; use
    /// [`RequestSequencer::with_runtime`] from other threads.
    pub fn new(interpreter: Arc<dyn Interpreter>) -> Arc<Self> {
        Self::with_runtime(interpreter, Handle::current())
    }

    pub fn with_runtime(interpreter: Arc<dyn Interpreter>, runtime: Handle) -> Arc<Self> {
        let (state, _) = watch::channel(SequencerSnapshot::default());
        Arc::new(Self {
            interpreter,
            runtime,
            dispatch: Mutex::new(Dispatch::default()),
            state,
        })
    }

    /// Draws a spread and starts interpreting it, superseding whatever was
    /// in flight. A draw failure leaves the current state untouched and no
    /// request is sent.
    pub fn draw(
        self: &Arc<Self>,
        available: &[Arc<CardDefinition>],
        layout: &SpreadLayout,
    ) -> Result<RequestId, DrawError> {
        let spread = draw_spread(available, layout).inspect_err(|err| {
            warn!(spread_type = %layout.spread_type, %err, "spread draw rejected");
        })?;
        let spread = Arc::new(spread);
        let request = SpreadRequest::from_spread(&spread);

        let mut dispatch = self.lock_dispatch();
        dispatch.last_request_id += 1;
        let request_id = RequestId(dispatch.last_request_id);

        if let Some(previous) = dispatch.in_flight.take() {
            previous.task.abort();
            debug!(
                superseded = %previous.request_id,
                by = %request_id,
                "aborted superseded interpretation request"
            );
        }

        self.state.send_replace(SequencerSnapshot {
            status: InterpretationStatus::Loading { request_id },
            spread: Some(Arc::clone(&spread)),
        });

        debug!(
            %request_id,
            spread_type = %spread.spread_type,
            card_count = spread.cards.len(),
            "interpretation requested"
        );

        let task = self.runtime.spawn(run_request(
            Arc::downgrade(self),
            Arc::clone(&self.interpreter),
            request_id,
            request,
        ));
        dispatch.in_flight = Some(InFlight { request_id, task });

        Ok(request_id)
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> InterpretationStatus {
        self.state.borrow().status.clone()
    }

    pub fn active_request(&self) -> Option<RequestId> {
        self.state.borrow().status.request_id()
    }

    pub fn subscribe(&self) -> watch::Receiver<SequencerSnapshot> {
        self.state.subscribe()
    }

    /// Waits until `request_id` stops loading, either because its result
    /// landed or because a newer draw replaced it.
    pub async fn settled(&self, request_id: RequestId) -> SequencerSnapshot {
        let mut updates = self.state.subscribe();
        let snapshot = match updates
            .wait_for(|snapshot| !snapshot.status.is_loading_for(request_id))
            .await
        {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    pub(crate) fn complete(
        &self,
        request_id: RequestId,
        outcome: Result<String, InterpretationError>,
    ) -> Completion {
        let failure = outcome.as_ref().err().cloned();
        let status = match outcome {
            Ok(text) => InterpretationStatus::Succeeded { request_id, text },
            Err(err) => InterpretationStatus::Failed {
                request_id,
                error: err.to_string(),
            },
        };

        let applied = self.state.send_if_modified(|snapshot| {
            if !snapshot.status.is_loading_for(request_id) {
                return false;
            }
            snapshot.status = status;
            true
        });

        if !applied {
            debug!(%request_id, "discarded stale interpretation result");
            return Completion::Stale;
        }

        match failure {
            None => info!(%request_id, "interpretation ready"),
            Some(err) => warn!(%request_id, %err, "interpretation failed"),
        }
        Completion::Applied
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, Dispatch> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RequestSequencer {
    fn drop(&mut self) {
        let dispatch = self
            .dispatch
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(in_flight) = dispatch.in_flight.take() {
            in_flight.task.abort();
        }
    }
}

async fn run_request(
    sequencer: Weak<RequestSequencer>,
    interpreter: Arc<dyn Interpreter>,
    request_id: RequestId,
    request: SpreadRequest,
) {
    let outcome = interpreter.interpret(&request).await;

    let Some(sequencer) = sequencer.upgrade() else {
        debug!(%request_id, "sequencer dropped before interpretation finished");
        return;
    };
    sequencer.complete(request_id, outcome);
}

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod tests;
