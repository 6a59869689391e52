//! Background order polling loop
//!
//! One polling cycle fetches orders modified since the watermark, hands a
//! non-empty batch to the consumer, and only then advances the watermark.
//! The loop runs on its own thread until stopped and never exits because
//! a cycle failed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::handler::OrderHandler;
use super::pager::Pager;
use super::watermark::fetch_since;
use super::SyncOptions;
use crate::api::ApiSlot;
use crate::models::Watermark;

/// Outcome of a single polling cycle
#[derive(Debug, Clone)]
pub struct PollStats {
    /// Number of orders returned by the incremental fetch
    pub orders_found: usize,
    /// Whether a batch was handed to the consumer successfully
    pub delivered: bool,
    /// Watermark after the cycle
    pub watermark: DateTime<Utc>,
    /// Duration of the cycle
    pub duration_ms: u64,
}

fn lock_watermark(watermark: &Mutex<Watermark>) -> MutexGuard<'_, Watermark> {
    watermark.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one polling cycle
///
/// The watermark advances to the time the cycle started, and only when the
/// fetch returned orders and the handler accepted them. A failed fetch is
/// already logged by the fetch itself and counts as "nothing new".
///
/// # Errors
/// Returns the handler's error; the watermark is left untouched.
pub fn poll_once(
    pager: &Pager,
    handler: &dyn OrderHandler,
    watermark: &Mutex<Watermark>,
) -> Result<PollStats> {
    let start = Instant::now();
    let started_at = Utc::now();
    let since = lock_watermark(watermark).last_sync_at();

    let mut stats = PollStats {
        orders_found: 0,
        delivered: false,
        watermark: since,
        duration_ms: 0,
    };

    if let Some(orders) = fetch_since(pager, since)
        && !orders.is_empty()
    {
        stats.orders_found = orders.len();
        handler
            .handle(&orders)
            .with_context(|| format!("Order handler rejected batch of {}", orders.len()))?;

        let mut current = lock_watermark(watermark);
        current.advance(started_at);
        stats.watermark = current.last_sync_at();
        stats.delivered = true;
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Everything the background thread needs to run polling cycles
///
/// The API client is looked up at the start of every cycle, so a client
/// installed or replaced after the loop started is used from the next
/// cycle on.
pub struct Poller {
    api: ApiSlot,
    page_size: u32,
    handler: Arc<dyn OrderHandler>,
    watermark: Arc<Mutex<Watermark>>,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl Poller {
    pub fn new(
        api: ApiSlot,
        handler: Arc<dyn OrderHandler>,
        watermark: Arc<Mutex<Watermark>>,
        options: &SyncOptions,
    ) -> Self {
        Self {
            api,
            page_size: options.page_size,
            handler,
            watermark,
            poll_interval: options.poll_interval,
            error_backoff: options.error_backoff,
        }
    }

    /// Run one cycle against whichever client is installed right now
    fn cycle(&self) -> Result<PollStats> {
        let pager = Pager::new(self.api.get(), self.page_size);
        poll_once(&pager, self.handler.as_ref(), &self.watermark)
    }

    /// Poll until `running` is cleared
    fn run(self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.cycle()));

            let pause = match outcome {
                Ok(Ok(stats)) => {
                    if stats.delivered {
                        info!(
                            "Delivered {} updated orders in {}ms, watermark now {}",
                            stats.orders_found,
                            stats.duration_ms,
                            stats.watermark.to_rfc3339()
                        );
                    } else {
                        debug!("No new orders ({}ms)", stats.duration_ms);
                    }
                    self.poll_interval
                }
                Ok(Err(e)) => {
                    error!("Order polling failed: {:#}", e);
                    self.error_backoff
                }
                Err(_) => {
                    error!("Order polling panicked; backing off");
                    self.error_backoff
                }
            };

            sleep_while_running(running, pause);
        }
    }
}

/// Sleep for `duration`, waking early once `running` is cleared
///
/// The stopping side unparks the thread after clearing the flag.
fn sleep_while_running(running: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::park_timeout(deadline - now);
    }
}

/// A started polling thread and its private running flag
struct Session {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Start/stop control for the background polling thread
///
/// Two states: stopped and running. Stopping is cooperative: a request in
/// flight finishes, and no further cycle starts afterwards. Each start gets
/// a fresh flag, so a thread still winding down from an earlier stop can
/// never be revived by a later start.
#[derive(Default)]
pub struct SyncLoop {
    session: Mutex<Option<Session>>,
}

impl SyncLoop {
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the loop is currently running
    pub fn is_running(&self) -> bool {
        self.session()
            .as_ref()
            .is_some_and(|s| s.running.load(Ordering::SeqCst))
    }

    /// Start polling on a background thread
    ///
    /// Returns `Ok(false)` without doing anything if already running.
    pub fn start(&self, poller: Poller) -> std::io::Result<bool> {
        let mut session = self.session();

        if session
            .as_ref()
            .is_some_and(|s| s.running.load(Ordering::SeqCst))
        {
            return Ok(false);
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("order-sync".to_string())
            .spawn(move || poller.run(&flag))?;

        *session = Some(Session { running, handle });
        Ok(true)
    }

    /// Ask the background thread to stop
    ///
    /// Returns immediately; use [`SyncLoop::join`] to wait for the thread.
    /// Returns whether a running loop was told to stop.
    pub fn stop(&self) -> bool {
        match self.session().as_ref() {
            Some(session) if session.running.swap(false, Ordering::SeqCst) => {
                session.handle.thread().unpark();
                true
            }
            _ => false,
        }
    }

    /// Wait for a stopped background thread to exit
    ///
    /// Does nothing while the loop is still running.
    pub fn join(&self) {
        let session = {
            let mut guard = self.session();
            match guard.as_ref() {
                Some(s) if !s.running.load(Ordering::SeqCst) => guard.take(),
                _ => None,
            }
        };

        if let Some(session) = session
            && session.handle.join().is_err()
        {
            error!("Order sync thread exited with a panic");
        }
    }
}

impl Drop for SyncLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
