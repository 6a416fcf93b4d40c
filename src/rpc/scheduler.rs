//! Named one-shot timers
//!
//! `run_later` debounces by name: scheduling a name that is still pending
//! replaces the pending callback and its deadline. Timers share the RPC
//! runtime with the listener, and callbacks run on its worker threads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

struct Pending {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Timers {
    next_generation: u64,
    pending: HashMap<String, Pending>,
}

struct Inner {
    runtime: Handle,
    timers: Mutex<Timers>,
    shut_down: AtomicBool,
}

impl Inner {
    fn timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deferred task scheduler
#[derive(Clone)]
pub struct DeferredTaskScheduler {
    inner: Arc<Inner>,
}

impl DeferredTaskScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                runtime,
                timers: Mutex::new(Timers::default()),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Run `callback` once after `delay`, replacing any pending task with
    /// the same name. Does nothing after `shutdown`.
    pub fn run_later<F>(&self, name: &str, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.shut_down.load(Ordering::Acquire) {
            debug!("Scheduler stopped, dropping deferred task {}", name);
            return;
        }

        let mut timers = self.inner.timers();
        // Re-check under the lock so shutdown cannot miss this entry
        if self.inner.shut_down.load(Ordering::Acquire) {
            return;
        }
        timers.next_generation += 1;
        let generation = timers.next_generation;

        let inner = Arc::clone(&self.inner);
        let key = name.to_string();
        let task = self.inner.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let current = {
                let mut timers = inner.timers();
                match timers.pending.get(&key) {
                    Some(pending) if pending.generation == generation => {
                        timers.pending.remove(&key);
                        true
                    }
                    _ => false,
                }
            };
            if current {
                debug!("Running deferred task {}", key);
                callback();
            }
        });

        if let Some(previous) = timers
            .pending
            .insert(name.to_string(), Pending { generation, task })
        {
            debug!("Rescheduling deferred task {} ({:?})", name, delay);
            previous.task.abort();
        }
    }

    /// Names with a timer still pending
    pub fn pending(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.timers().pending.keys().cloned().collect();
        names.sort();
        names
    }

    /// Cancel every pending task and refuse new ones
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::Release);
        let drained: Vec<(String, Pending)> = self.inner.timers().pending.drain().collect();
        for (name, pending) in drained {
            debug!("Cancelling deferred task {}", name);
            pending.task.abort();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for DeferredTaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredTaskScheduler")
            .field("pending", &self.pending())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hit = Arc::clone(&count);
        (count, move || {
            hit.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let scheduler = DeferredTaskScheduler::new(Handle::current());
        let (count, cb) = counter();
        scheduler.run_later("work", Duration::from_secs(3), cb);
        assert_eq!(scheduler.pending(), vec!["work".to_string()]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_name_replaces_pending() {
        let scheduler = DeferredTaskScheduler::new(Handle::current());
        let (first, cb1) = counter();
        let (second, cb2) = counter();
        scheduler.run_later("x", Duration::from_secs(5), cb1);
        scheduler.run_later("x", Duration::from_secs(10), cb2);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_names_are_independent() {
        let scheduler = DeferredTaskScheduler::new(Handle::current());
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        scheduler.run_later("a", Duration::from_secs(1), cb_a);
        scheduler.run_later("b", Duration::from_secs(2), cb_b);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_and_ignores_new_tasks() {
        let scheduler = DeferredTaskScheduler::new(Handle::current());
        let (count, cb) = counter();
        scheduler.run_later("x", Duration::from_secs(1), cb);
        scheduler.shutdown();
        assert!(scheduler.pending().is_empty());

        let (late, late_cb) = counter();
        scheduler.run_later("y", Duration::from_secs(1), late_cb);
        assert!(scheduler.pending().is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(late.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_after_fire() {
        let scheduler = DeferredTaskScheduler::new(Handle::current());
        let (count, cb) = counter();
        scheduler.run_later("x", Duration::from_secs(1), cb);
        tokio::time::sleep(Duration::from_secs(2)).await;

        let (again, cb2) = counter();
        scheduler.run_later("x", Duration::from_secs(1), cb2);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(again.load(Ordering::SeqCst), 1);
    }
}
