//! Countdown timer
//!
//! `CountdownTimer` holds the remaining time and owns the single tick
//! source driving it. The tick source itself comes from a [`Ticker`], so
//! tests can swap the tokio interval for ticks they issue by hand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer is not running; nothing changed
    Idle,
    /// Decremented, still counting
    Running(u32),
    /// Reached zero; the timer has stopped itself
    Expired,
}

/// Serializable view of the countdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub time_remaining: u32,
    pub is_running: bool,
}

/// Handle to an active tick source. Cancelling or dropping it aborts the task.
#[derive(Debug)]
pub struct TickHandle {
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Handle with no task behind it (ticks are delivered externally)
    pub fn detached() -> Self {
        Self { task: None }
    }

    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Let the task run to completion on its own
    pub fn release(mut self) {
        self.task.take();
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Receiver of ticks
#[async_trait]
pub trait TickTarget: Send + Sync {
    /// Handle one tick. Returns `false` once no further ticks are wanted.
    async fn on_tick(&self) -> bool;
}

/// Spawns repeating tick sources
pub trait Ticker: Send + Sync {
    fn spawn(&self, target: Weak<dyn TickTarget>) -> TickHandle;
}

/// Ticks on a tokio interval (one second in production)
#[derive(Debug, Clone)]
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for IntervalTicker {
    fn spawn(&self, target: Weak<dyn TickTarget>) -> TickHandle {
        let period = self.period;

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let Some(target) = target.upgrade() else {
                    break;
                };

                if !target.on_tick().await {
                    break;
                }
            }

            debug!("Tick source finished");
        });

        TickHandle::new(task)
    }
}

/// Spawns nothing; the caller delivers ticks itself. Counts spawn requests.
#[derive(Debug, Default)]
pub struct ManualTicker {
    spawned: AtomicUsize,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl Ticker for ManualTicker {
    fn spawn(&self, _target: Weak<dyn TickTarget>) -> TickHandle {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        TickHandle::detached()
    }
}

/// Countdown with at most one tick source
#[derive(Debug, Default)]
pub struct CountdownTimer {
    time_remaining: u32,
    is_running: bool,
    handle: Option<TickHandle>,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted snapshot. No tick source is attached, so the
    /// timer comes back stopped.
    pub fn from_snapshot(snapshot: TimerSnapshot) -> Self {
        Self {
            time_remaining: snapshot.time_remaining,
            is_running: false,
            handle: None,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            time_remaining: self.time_remaining,
            is_running: self.is_running,
        }
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn has_tick_source(&self) -> bool {
        self.handle.is_some()
    }

    /// Set the remaining time without starting
    pub fn arm(&mut self, seconds: u32) {
        self.cancel_tick_source();
        self.time_remaining = seconds;
        self.is_running = false;
    }

    /// Begin counting down. No-op when already running or nothing remains.
    /// Returns whether a new tick source was attached.
    pub fn start(&mut self, spawn: impl FnOnce() -> TickHandle) -> bool {
        if self.is_running || self.time_remaining == 0 {
            return false;
        }

        self.cancel_tick_source();
        self.handle = Some(spawn());
        self.is_running = true;
        true
    }

    pub fn stop(&mut self) {
        self.cancel_tick_source();
        self.is_running = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running {
            return TickOutcome::Idle;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);

        if self.time_remaining > 0 {
            return TickOutcome::Running(self.time_remaining);
        }

        // The expiry is being delivered on the tick task itself, which must
        // not be aborted underneath the handler.
        self.is_running = false;
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
        TickOutcome::Expired
    }

    fn cancel_tick_source(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_does_not_start() {
        let mut timer = CountdownTimer::new();
        timer.arm(20);

        assert_eq!(timer.time_remaining(), 20);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.time_remaining(), 20);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut timer = CountdownTimer::new();
        timer.arm(5);

        let mut spawns = 0;
        assert!(timer.start(|| {
            spawns += 1;
            TickHandle::detached()
        }));
        assert!(!timer.start(|| {
            spawns += 1;
            TickHandle::detached()
        }));
        assert_eq!(spawns, 1);
    }

    #[test]
    fn test_start_with_nothing_remaining_is_noop() {
        let mut timer = CountdownTimer::new();
        assert!(!timer.start(TickHandle::detached));
        assert!(!timer.is_running());
        assert!(!timer.has_tick_source());
    }

    #[test]
    fn test_countdown_expires_once() {
        let mut timer = CountdownTimer::new();
        timer.arm(3);
        timer.start(TickHandle::detached);

        assert_eq!(timer.tick(), TickOutcome::Running(2));
        assert_eq!(timer.tick(), TickOutcome::Running(1));
        assert_eq!(timer.tick(), TickOutcome::Expired);
        assert!(!timer.is_running());
        assert!(!timer.has_tick_source());
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.time_remaining(), 0);
    }

    #[test]
    fn test_stop_is_safe_when_idle() {
        let mut timer = CountdownTimer::new();
        timer.stop();
        timer.arm(10);
        timer.start(TickHandle::detached);
        timer.stop();
        timer.stop();

        assert!(!timer.is_running());
        assert!(!timer.has_tick_source());
        assert_eq!(timer.time_remaining(), 10);
    }

    #[test]
    fn test_from_snapshot_comes_back_stopped() {
        let timer = CountdownTimer::from_snapshot(TimerSnapshot {
            time_remaining: 12,
            is_running: true,
        });
        assert_eq!(timer.time_remaining(), 12);
        assert!(!timer.is_running());
    }

    #[tokio::test]
    async fn test_cancel_aborts_task() {
        let task = tokio::spawn(std::future::pending::<()>());
        let abort = task.abort_handle();
        let mut timer = CountdownTimer::new();
        timer.arm(5);
        timer.start(|| TickHandle::new(task));

        timer.arm(8);
        for _ in 0..10 {
            if abort.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abort.is_finished());
        assert!(!timer.has_tick_source());
    }
}
