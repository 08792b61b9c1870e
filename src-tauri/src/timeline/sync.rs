use std::{future::Future, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Periodic background refresh. Dropping the guard cancels the loop; a tick
/// that is still running when that happens is abandoned.
pub struct LiveSync {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LiveSync {
    /// Calls `on_tick` every `period`, first after one full period. Each call
    /// receives the loop's token so late results can be recognized.
    pub fn spawn<F, Fut>(period: Duration, on_tick: F) -> Self
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sync_loop(period, cancel_token.clone(), on_tick));

        Self {
            cancel_token,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel_token.is_cancelled()
            && self
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the loop and waits for its task to exit.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    log_error!("live sync task panicked: {err}");
                }
            }
        }
    }
}

impl Drop for LiveSync {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn sync_loop<F, Fut>(period: Duration, cancel_token: CancellationToken, mut on_tick: F)
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    log_info!("live sync started ({} ms)", period.as_millis());

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        log_debug!("live sync tick abandoned");
                        break;
                    }
                    _ = on_tick(cancel_token.clone()) => {}
                }
            }
        }
    }

    log_info!("live sync stopped");
}
