use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Fixed-rate timer driving frame capture
///
/// At most one timer is live per throttle: [`start`](Self::start) cancels
/// the previous one before arming a new one. Each tick's handler is awaited
/// before the next tick, and late ticks are skipped rather than bursted, so
/// a slow handler never produces more than `target_frame_rate` ticks per
/// second.
pub struct FrameThrottle {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl FrameThrottle {
    pub fn new(target_frame_rate: u32) -> Self {
        Self {
            period: Self::period_for(target_frame_rate),
            task: None,
        }
    }

    /// Tick period for a frame rate, rounded up to the next nanosecond
    pub fn period_for(target_frame_rate: u32) -> Duration {
        let rate = u64::from(target_frame_rate.max(1));
        Duration::from_nanos(1_000_000_000u64.div_ceil(rate))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Arm the timer; `on_tick` runs once per period, the first time immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F, Fut>(&mut self, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let period = self.period;
        debug!("Frame throttle armed ({:?} period)", period);

        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                on_tick().await;
            }
        }));
    }

    /// Cancel the timer. Safe to call when nothing is running.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Frame throttle cancelled");
        }
    }
}

impl Drop for FrameThrottle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_period_rounds_up() {
        assert_eq!(FrameThrottle::period_for(30), Duration::from_nanos(33_333_334));
        assert_eq!(FrameThrottle::period_for(10), Duration::from_millis(100));
        assert_eq!(FrameThrottle::period_for(0), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_bounded_by_rate() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut throttle = FrameThrottle::new(30);

        let counter = Arc::clone(&ticks);
        throttle.start(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        });

        time::sleep(Duration::from_secs(1)).await;
        throttle.stop();

        let count = ticks.load(Ordering::SeqCst);
        assert!(count <= 30, "got {} ticks in one second", count);
        assert!(count >= 29, "got only {} ticks in one second", count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_leaves_single_timer() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut throttle = FrameThrottle::new(10);

        let counter = Arc::clone(&first);
        throttle.start(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        });
        time::sleep(Duration::from_millis(250)).await;

        let counter = Arc::clone(&second);
        throttle.start(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        });
        let first_before = first.load(Ordering::SeqCst);

        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(first.load(Ordering::SeqCst), first_before);
        assert!(second.load(Ordering::SeqCst) > 0);
        assert!(throttle.is_running());

        throttle.stop();
        throttle.stop();
        assert!(!throttle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_handler_skips_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut throttle = FrameThrottle::new(10);

        let counter = Arc::clone(&ticks);
        throttle.start(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            time::sleep(Duration::from_millis(250))
        });

        time::sleep(Duration::from_secs(1)).await;
        throttle.stop();

        let count = ticks.load(Ordering::SeqCst);
        assert!(count <= 5, "got {} ticks with a 250ms handler", count);
        assert!(count >= 3, "got only {} ticks", count);
    }
}
