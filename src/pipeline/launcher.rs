use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

/// Spawns submission tasks onto a runtime, optionally capping how many run at once.
///
/// Without a cap every accepted sample gets its own task immediately, so a slow
/// backend can have several analyses outstanding. With a cap, a sample that
/// finds no free permit is not launched at all.
#[derive(Clone)]
pub struct SubmissionLauncher {
    runtime: Handle,
    limit: Option<Arc<Semaphore>>,
}

/// Reservation for one submission; holds a permit when the launcher is capped.
/// The permit returns when the slot is dropped.
pub struct LaunchSlot {
    _permit: Option<OwnedSemaphorePermit>,
}

impl SubmissionLauncher {
    /// `max_in_flight` of `None` or `Some(0)` means unbounded.
    pub fn new(runtime: Handle, max_in_flight: Option<usize>) -> Self {
        Self {
            runtime,
            limit: max_in_flight
                .filter(|&n| n > 0)
                .map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.limit.is_some()
    }

    /// Reserve room for a submission without waiting.
    pub fn try_reserve(&self) -> Option<LaunchSlot> {
        match &self.limit {
            None => Some(LaunchSlot { _permit: None }),
            Some(limit) => limit
                .clone()
                .try_acquire_owned()
                .ok()
                .map(|permit| LaunchSlot {
                    _permit: Some(permit),
                }),
        }
    }

    /// Run `task` on the runtime. The task owns its [`LaunchSlot`] and decides
    /// when to give it back.
    pub fn launch<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unbounded_always_reserves() {
        let launcher = SubmissionLauncher::new(Handle::current(), None);
        let slots: Vec<_> = (0..16).filter_map(|_| launcher.try_reserve()).collect();
        assert_eq!(slots.len(), 16);
        assert!(!launcher.is_bounded());
    }

    #[tokio::test]
    async fn zero_cap_is_unbounded() {
        let launcher = SubmissionLauncher::new(Handle::current(), Some(0));
        assert!(!launcher.is_bounded());
        assert!(launcher.try_reserve().is_some());
    }

    #[tokio::test]
    async fn capped_slots_return_when_task_ends() {
        let launcher = SubmissionLauncher::new(Handle::current(), Some(1));
        let slot = launcher.try_reserve().unwrap();
        assert!(launcher.try_reserve().is_none());

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = launcher.launch(async move {
            let _ = rx.await;
            drop(slot);
        });
        assert!(launcher.try_reserve().is_none());

        tx.send(()).unwrap();
        handle.await.unwrap();
        assert!(launcher.try_reserve().is_some());
    }
}
