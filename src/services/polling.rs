//! Repeating re-fetch for list views.
//!
//! A poller runs one fetch right away and then one per interval tick. Each
//! fetch runs in its own task and is never awaited by the loop, so a slow
//! response can overlap the next one. Whichever response resolves last is
//! what the view ends up showing, even if it was requested first.
//!
//! Stopping the poller (or dropping its handle) cancels the timer and every
//! fetch still in flight; their results are discarded. Stopping and applying
//! a result exclude each other, so once `stop()` returns no result is applied.

use crate::error::AppError;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Commands accepted by a running poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Fetch now and restart the interval.
    Refresh,
    Stop,
}

/// Sends refresh requests to a poller without owning it.
#[derive(Debug, Clone)]
pub struct PollTrigger {
    command_tx: mpsc::Sender<PollCommand>,
}

impl PollTrigger {
    /// Request an immediate fetch. Returns `false` once the poller is gone.
    pub fn refresh(&self) -> bool {
        match self.command_tx.try_send(PollCommand::Refresh) {
            Ok(()) => true,
            // a refresh is already queued
            Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Owning handle of a running poller. Dropping it stops the poller.
#[derive(Debug)]
pub struct PollHandle {
    trigger: PollTrigger,
    cancel: CancellationToken,
    gate: Arc<Mutex<()>>,
}

impl PollHandle {
    pub fn refresh(&self) -> bool {
        self.trigger.refresh()
    }

    pub fn trigger(&self) -> PollTrigger {
        self.trigger.clone()
    }

    /// Tear down the timer and drop the results of in-flight fetches.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            log::debug!("[poll] stopping");
        }
        let _ = self.trigger.command_tx.try_send(PollCommand::Stop);
        self.cancel_gated();
    }

    /// Cancel once no result is being applied.
    fn cancel_gated(&self) {
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel_gated();
    }
}

pub struct Poller;

impl Poller {
    /// Start polling `fetch` every `interval`, handing each result to
    /// `apply`. Must be called inside a tokio runtime.
    pub fn start<F, Fut, T, A>(interval: Duration, fetch: F, apply: A) -> PollHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
        T: Send + 'static,
        A: Fn(Result<T, AppError>) + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<PollCommand>(1);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let apply = Arc::new(apply);
        let gate = Arc::new(Mutex::new(()));
        let fetch_gate = gate.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    // the first tick completes immediately
                    _ = ticker.tick() => {
                        spawn_fetch(fetch(), apply.clone(), token.clone(), fetch_gate.clone());
                    }
                    cmd = rx.recv() => match cmd {
                        Some(PollCommand::Refresh) => {
                            log::debug!("[poll] refresh requested");
                            ticker.reset();
                            spawn_fetch(fetch(), apply.clone(), token.clone(), fetch_gate.clone());
                        }
                        Some(PollCommand::Stop) | None => break,
                    }
                }
            }

            token.cancel();
            log::debug!("[poll] stopped");
        });

        PollHandle {
            trigger: PollTrigger { command_tx: tx },
            cancel,
            gate,
        }
    }
}

fn spawn_fetch<Fut, T, A>(fut: Fut, apply: Arc<A>, token: CancellationToken, gate: Arc<Mutex<()>>)
where
    Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
    A: Fn(Result<T, AppError>) + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = fut => result,
        };
        if let Err(e) = &result {
            log::warn!("[poll] fetch failed: {}", e);
        }
        let _gate = gate.lock().unwrap_or_else(|e| e.into_inner());
        if token.is_cancelled() {
            return;
        }
        apply(result);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const INTERVAL: Duration = Duration::from_secs(300);

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn counting() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_and_per_tick() {
        let (fetched, applied) = counting();
        let f = fetched.clone();
        let a = applied.clone();
        let handle = Poller::start(
            INTERVAL,
            move || {
                let n = f.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n) }
            },
            move |_| {
                a.fetch_add(1, Ordering::SeqCst);
            },
        );

        settle().await;
        assert_eq!(fetched.load(Ordering::SeqCst), 1);

        time::advance(INTERVAL).await;
        settle().await;
        assert_eq!(fetched.load(Ordering::SeqCst), 2);
        assert_eq!(applied.load(Ordering::SeqCst), 2);
        drop(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_fetches_now() {
        let (fetched, _) = counting();
        let f = fetched.clone();
        let handle = Poller::start(
            INTERVAL,
            move || {
                f.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            |_| {},
        );
        settle().await;

        assert!(handle.trigger().refresh());
        settle().await;
        assert_eq!(fetched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let (fetched, _) = counting();
        let f = fetched.clone();
        let handle = Poller::start(
            INTERVAL,
            move || {
                f.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            |_| {},
        );
        settle().await;
        handle.stop();
        settle().await;

        time::advance(INTERVAL * 3).await;
        settle().await;
        assert_eq!(fetched.load(Ordering::SeqCst), 1);
        assert!(handle.is_stopped());
        assert!(!handle.refresh());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_dropped_after_stop() {
        let (_, applied) = counting();
        let a = applied.clone();
        let handle = Poller::start(
            INTERVAL,
            || async {
                time::sleep(Duration::from_secs(10)).await;
                Ok(())
            },
            move |_| {
                a.fetch_add(1, Ordering::SeqCst);
            },
        );
        settle().await;

        time::advance(Duration::from_secs(5)).await;
        drop(handle);
        time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(applied.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_resolved_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shown = Arc::new(Mutex::new(None));
        let c = calls.clone();
        let s = shown.clone();
        let handle = Poller::start(
            INTERVAL,
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    // the first request is the slow one
                    let delay = if n == 0 { 20 } else { 1 };
                    time::sleep(Duration::from_secs(delay)).await;
                    Ok(n)
                }
            },
            move |result| {
                *s.lock().unwrap() = result.ok();
            },
        );
        settle().await;
        handle.refresh();
        settle().await;

        time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(*shown.lock().unwrap(), Some(1));

        time::advance(Duration::from_secs(20)).await;
        settle().await;
        assert_eq!(*shown.lock().unwrap(), Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_waits_for_result_being_applied() {
        let entered = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let e = entered.clone();
        let f = finished.clone();
        let handle = Poller::start(
            INTERVAL,
            || async { Ok(()) },
            move |_| {
                e.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(100));
                f.fetch_add(1, Ordering::SeqCst);
            },
        );

        while entered.load(Ordering::SeqCst) == 0 {
            time::sleep(Duration::from_millis(5)).await;
        }
        handle.stop();
        assert_eq!(finished.load(Ordering::SeqCst), 1);

        handle.refresh();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(entered.load(Ordering::SeqCst), 1);
    }
}
