use std::future::Future;

use tokio::{runtime::Handle, task::AbortHandle};
use tracing::warn;

/// Cancellable reference to a spawned timer task.
///
/// Owned exclusively by the scheduler registries. The generation lets a
/// firing task remove its own registry entry without touching a newer one
/// installed for the same id.
#[derive(Debug)]
pub(crate) struct TimerHandle {
    generation: u64,
    abort: AbortHandle,
}

impl TimerHandle {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn cancel(&self) {
        self.abort.abort();
    }
}

/// True when called from inside a tokio runtime.
pub(crate) fn runtime_available() -> bool {
    Handle::try_current().is_ok()
}

/// Spawn `task` on the current runtime and wrap it in a [`TimerHandle`].
///
/// Returns `None` (and logs) outside a runtime; callers treat that as a
/// silent no-op.
pub(crate) fn spawn_timer<F>(generation: u64, task: F) -> Option<TimerHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(rt) => Some(TimerHandle {
            generation,
            abort: rt.spawn(task).abort_handle(),
        }),
        Err(_) => {
            warn!("no tokio runtime available; timer not started");
            None
        }
    }
}

/// Spawn a task nobody can cancel (in-flight animations).
pub(crate) fn spawn_detached<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(rt) => {
            rt.spawn(task);
        }
        Err(_) => warn!("no tokio runtime available; animation not started"),
    }
}
