use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

struct ArmedTimer {
    token: CancellationToken,
    armed_at: Instant,
}

/// Repeating background trigger for update checks.
///
/// At most one timer is armed; [`rearm`](Self::rearm) cancels the running
/// timer before starting a new one. The timer is a plain Tokio task, so it
/// never keeps the runtime (or the process) alive on its own.
pub struct IntervalScheduler {
    period: Duration,
    on_fire: Arc<dyn Fn() + Send + Sync>,
    armed: Option<ArmedTimer>,
}

impl IntervalScheduler {
    pub fn new(period: Duration, on_fire: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            period,
            on_fire: Arc::new(on_fire),
            armed: None,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Cancel any running timer and start a fresh one firing every period
    /// from now. Must be called from within a Tokio runtime.
    pub fn rearm(&mut self) {
        self.cancel();

        let token = CancellationToken::new();
        let armed_at = Instant::now();
        let mut ticker = tokio::time::interval_at(armed_at + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let cancelled = token.clone();
        let on_fire = Arc::clone(&self.on_fire);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        debug!("Update check interval elapsed");
                        on_fire();
                    }
                }
            }
        });

        debug!("Update check timer armed every {:?}", self.period);
        self.armed = Some(ArmedTimer { token, armed_at });
    }

    pub fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.token.cancel();
        }
    }

    /// When the armed timer fires next, if any.
    #[must_use]
    pub fn next_fire(&self) -> Option<Instant> {
        let armed = self.armed.as_ref()?;
        let period = self.period.as_nanos().max(1);
        let elapsed = armed.armed_at.elapsed().as_nanos();
        let ticks = u32::try_from(elapsed / period + 1).ok()?;
        Some(armed.armed_at + self.period.checked_mul(ticks)?)
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
