// ── Concurrency coordinator ──
//
// The appliance applies concurrent config writes non-transactionally and
// can silently lose one of them. Every operation therefore runs under a
// single exclusive lock, held across multi-step sequences (read-then-delete,
// delete-then-create) so they appear atomic to other callers.

use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::CoreError;

static PROCESS_WIDE: LazyLock<Arc<Coordinator>> = LazyLock::new(|| Arc::new(Coordinator::new()));

/// One exclusive lock serializing appliance operations.
#[derive(Debug, Default)]
pub struct Coordinator {
    lock: Mutex<()>,
}

/// Proof of holding the coordinator. Released on drop, whatever the exit path.
#[derive(Debug)]
pub struct Permit<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        trace!("coordinator released");
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The coordinator shared by every controller in this process.
    pub fn process_wide() -> Arc<Self> {
        Arc::clone(&PROCESS_WIDE)
    }

    /// Wait for exclusive access, giving up when `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Permit<'_>, CoreError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::Cancelled),
            guard = self.lock.lock() => {
                trace!("coordinator acquired");
                Ok(Permit { _guard: guard })
            }
        }
    }

    /// Run `op` while holding the coordinator.
    ///
    /// `op` is raced against `cancel` for its whole duration, network calls
    /// and backoff sleeps included. On cancellation the future is dropped
    /// mid-flight and [`CoreError::Cancelled`] is returned.
    pub async fn run<T, F>(&self, cancel: &CancellationToken, op: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        let _permit = self.acquire(cancel).await?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::Cancelled),
            result = op => result,
        }
    }

    /// `true` when nobody holds the lock right now.
    pub fn is_idle(&self) -> bool {
        self.lock.try_lock().is_ok()
    }
}

/// A child of `parent` that also fires once `timeout` elapses.
///
/// The timer task ends as soon as the returned token is cancelled, so
/// cancelling it after the operation finishes frees the timer early.
pub fn deadline(parent: &CancellationToken, timeout: Duration) -> CancellationToken {
    let token = parent.child_token();
    let timer = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            biased;
            () = timer.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                trace!(?timeout, "deadline reached");
                timer.cancel();
            }
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_returns_cancelled() {
        let coordinator = Coordinator::new();
        let held = coordinator
            .acquire(&CancellationToken::new())
            .await
            .expect("uncontended");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = coordinator.acquire(&cancel).await;
        assert!(matches!(result, Err(CoreError::Cancelled)));

        drop(held);
        assert!(coordinator.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_running_operation_and_releases() {
        let coordinator = Coordinator::new();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result: Result<(), CoreError> = coordinator
            .run(&cancel, async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(CoreError::Cancelled)));
        assert!(coordinator.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn errors_release_the_lock() {
        let coordinator = Coordinator::new();
        let cancel = CancellationToken::new();
        let result: Result<(), CoreError> = coordinator
            .run(&cancel, async { Err(CoreError::Internal("boom".into())) })
            .await;
        assert!(matches!(result, Err(CoreError::Internal(_))));
        assert!(coordinator.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn operations_never_overlap() {
        let coordinator = Arc::new(Coordinator::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                coordinator
                    .run(&CancellationToken::new(), async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, CoreError>(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("task ran").expect("operation ok");
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_after_timeout() {
        let parent = CancellationToken::new();
        let token = deadline(&parent, Duration::from_secs(5));
        assert!(!token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(token.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_follows_parent() {
        let parent = CancellationToken::new();
        let token = deadline(&parent, Duration::from_secs(3600));
        parent.cancel();
        assert!(token.is_cancelled());
    }
}
