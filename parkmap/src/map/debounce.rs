//! Trailing-edge debounce for viewport change events.
//!
//! Change events arrive in bursts while the user pans or zooms. The
//! debouncer waits for a quiet period with no events and then runs its
//! action once. A burst ends when no trigger is received for `delay`.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default quiet period before a viewport callback fires.
pub const DEFAULT_VIEWPORT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Cheap handle used to signal an event to a [`Debouncer`].
#[derive(Debug, Clone)]
pub struct DebounceTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl DebounceTrigger {
    /// Records an event, restarting the quiet period.
    ///
    /// Triggers after the debouncer is dropped are ignored.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

/// Runs an action once per burst of triggers.
///
/// Dropping the debouncer stops its task; a pending action never fires.
#[derive(Debug)]
pub struct Debouncer {
    trigger: DebounceTrigger,
    task: JoinHandle<()>,
}

impl Debouncer {
    /// Spawns the debounce task on `runtime`.
    pub fn spawn<F>(runtime: &Handle, delay: Duration, action: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run(rx, delay, action));
        Self {
            trigger: DebounceTrigger { tx },
            task,
        }
    }

    pub fn trigger(&self) {
        self.trigger.trigger();
    }

    pub fn handle(&self) -> DebounceTrigger {
        self.trigger.clone()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<F>(mut rx: mpsc::UnboundedReceiver<()>, delay: Duration, action: F)
where
    F: Fn(),
{
    while rx.recv().await.is_some() {
        loop {
            match tokio::time::timeout(delay, rx.recv()).await {
                // Burst continues
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }
        action();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_debouncer(delay: Duration) -> (Debouncer, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let debouncer = Debouncer::spawn(&Handle::current(), delay, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (debouncer, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_after_quiet_period() {
        let (debouncer, count) = counting_debouncer(Duration::from_millis(500));

        for _ in 0..5 {
            debouncer.trigger();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (debouncer, count) = counting_debouncer(Duration::from_millis(500));

        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(600)).await;
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_trigger_no_action() {
        let (_debouncer, count) = counting_debouncer(Duration::from_millis(500));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_action() {
        let (debouncer, count) = counting_debouncer(Duration::from_millis(500));
        let handle = debouncer.handle();

        handle.trigger();
        drop(debouncer);
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.trigger();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
