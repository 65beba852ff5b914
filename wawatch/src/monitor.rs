use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::WatchError;
use crate::extractor::{Observation, PresenceExtractor};
use crate::page::PageSession;
use crate::status_log::ChangeLogger;

/// One presence observation per poll tick.
///
/// Decouples the polling loop from the page so scenario tests can script a
/// tick sequence without a browser.
#[async_trait::async_trait]
pub trait PresenceSource: Send {
    async fn observe(&mut self) -> Observation;
}

/// [`PresenceSource`] over a live page session.
pub struct PagePresenceSource<'p> {
    extractor: PresenceExtractor,
    page: &'p dyn PageSession,
}

impl<'p> PagePresenceSource<'p> {
    pub fn new(extractor: PresenceExtractor, page: &'p dyn PageSession) -> Self {
        Self { extractor, page }
    }
}

#[async_trait::async_trait]
impl PresenceSource for PagePresenceSource<'_> {
    async fn observe(&mut self) -> Observation {
        self.extractor.observe(self.page).await
    }
}

/// The polling loop: periodically observes presence, hands each observation
/// to the change logger, and sleeps for the configured interval.
///
/// Strictly sequential; no two polls overlap. Cancellation is cooperative
/// and checked only at iteration boundaries, so an in-flight observation
/// completes before the loop stops.
pub struct MonitorSession {
    logger: ChangeLogger,
    interval: Duration,
}

impl MonitorSession {
    pub fn new(logger: ChangeLogger, interval: Duration) -> Self {
        Self { logger, interval }
    }

    /// Run until the token is cancelled or a log write fails.
    ///
    /// Per-tick extraction failures arrive as `error` observations and are
    /// logged as transitions like any other state. Consumes the session;
    /// the final flush/close runs exactly once on every exit path.
    pub async fn run<S: PresenceSource>(
        mut self,
        source: &mut S,
        cancel: CancellationToken,
    ) -> Result<(), WatchError> {
        info!(interval = ?self.interval, "monitoring started");
        let outcome = poll_loop(&mut self.logger, self.interval, source, &cancel).await;
        let closed = self.logger.close();
        outcome.and(closed)
    }
}

async fn poll_loop<S: PresenceSource>(
    logger: &mut ChangeLogger,
    interval: Duration,
    source: &mut S,
    cancel: &CancellationToken,
) -> Result<(), WatchError> {
    loop {
        if cancel.is_cancelled() {
            debug!("cancellation observed at tick boundary");
            return Ok(());
        }

        let observation = source.observe().await;
        logger.record_if_changed(&observation)?;

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("cancelled during inter-poll sleep");
                return Ok(());
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
