use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::AbortHandle;

/// Tracks the single live request of one kind (list or detail).
///
/// Every request holds a [`Ticket`]. Starting another request or cancelling
/// the scope invalidates older tickets and aborts their task, and an
/// invalidated ticket can no longer publish.
#[derive(Debug, Default)]
pub(crate) struct RequestScope {
    state: Arc<Mutex<ScopeState>>,
}

#[derive(Debug, Default)]
struct ScopeState {
    generation: u64,
    task: Option<AbortHandle>,
}

/// Permission to publish the outcome of one request.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    generation: u64,
    state: Arc<Mutex<ScopeState>>,
}

impl RequestScope {
    /// Start a new request, superseding the previous one.
    pub(crate) fn begin(&self) -> Ticket {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        Ticket {
            generation: state.generation,
            state: Arc::clone(&self.state),
        }
    }

    /// Remember the task serving `ticket` so a later request can abort it.
    pub(crate) fn track(&self, ticket: &Ticket, task: AbortHandle) {
        let mut state = self.state.lock();
        if state.generation == ticket.generation {
            state.task = Some(task);
        } else {
            task.abort();
        }
    }

    /// Invalidate the live request, if any.
    pub(crate) fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if let Some(task) = self.state.lock().task.take() {
            task.abort();
        }
    }
}

impl Ticket {
    /// Run `publish` if this ticket is still current. Returns whether it ran.
    ///
    /// The check and the write happen under the scope lock, so a concurrent
    /// `begin` or `cancel` either precedes the write or follows it.
    pub(crate) fn publish(&self, publish: impl FnOnce()) -> bool {
        let state = self.state.lock();
        if state.generation != self.generation {
            return false;
        }
        publish();
        true
    }
}
