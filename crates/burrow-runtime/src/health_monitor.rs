//! Continuous health monitoring of a supervised server.
//!
//! The monitor only reports. A failing probe emits an error event and the
//! loop keeps going; stopping the session is never its decision.

use std::sync::Arc;
use std::time::Duration;

use burrow_core::{EventSink, HealthError, HealthProbe, ServerEvent};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Periodic prober for one health URL.
pub struct HealthMonitor {
    probe: Arc<dyn HealthProbe>,
    warmup: Duration,
    interval: Duration,
}

impl HealthMonitor {
    /// Create a monitor.
    ///
    /// # Arguments
    ///
    /// * `probe` - Performs each individual check
    /// * `warmup` - Delay before the first probe, giving the server time to bind
    /// * `interval` - Period between subsequent probes
    pub fn new(probe: Arc<dyn HealthProbe>, warmup: Duration, interval: Duration) -> Self {
        Self {
            probe,
            warmup,
            interval,
        }
    }

    /// Probe `url` until `cancel` fires, reporting every result to `events`.
    ///
    /// Every suspension point (warm-up, tick, in-flight probe) is raced
    /// against the token, so the task exits promptly once cancelled.
    pub async fn run(&self, cancel: CancellationToken, url: &str, events: &dyn EventSink) {
        tokio::select! {
            () = cancel.cancelled() => return,
            () = sleep(self.warmup) => {}
        }

        events.emit(ServerEvent::update("trying to reach server"));
        match self.probe_once(&cancel, url).await {
            None => return,
            Some(Ok(())) => {
                events.emit(ServerEvent::update("server reached, starting health checker"));
            }
            Some(Err(e)) => events.emit(ServerEvent::error(e.to_string())),
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(url, interval = ?self.interval, "Starting health monitor");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.probe_once(&cancel, url).await {
                        None => break,
                        Some(Ok(())) => events.emit(ServerEvent::update("server healthy")),
                        Some(Err(e)) => events.emit(ServerEvent::error(e.to_string())),
                    }
                }
            }
        }
        debug!(url, "Health monitor cancelled");
    }

    /// Run one probe, or `None` if cancelled while it was in flight.
    async fn probe_once(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Option<Result<(), HealthError>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.probe.probe(url) => Some(result),
        }
    }
}
