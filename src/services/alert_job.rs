//! Execution side of a recurring alert: the timer loop and one tick's
//! fetch → render → notify pipeline.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::market_data::{MarketDataProvider, ProviderError};
use super::notifier::{Notifier, NotifyError, SendOptions};
use crate::models::{AlertInterval, AlertKey};
use crate::templates::{self, Hbs};

#[derive(Error, Debug)]
pub enum TickError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] ProviderError),
    #[error("render failed: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("delivery failed: {0}")]
    Notify(#[from] NotifyError),
}

/// Collaborators every alert job needs.
#[derive(Clone)]
pub struct JobContext {
    pub provider: Arc<dyn MarketDataProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub hbs: Hbs,
}

/// Spawns the timer task for `key`.
///
/// The first tick fires one full period after creation. Ticks run inline in
/// the task, so a slow tick delays (and, with `Skip`, drops) later ones rather
/// than overlapping them. Aborting the returned handle stops the job.
pub fn spawn(ctx: JobContext, key: AlertKey, interval: AlertInterval) -> JoinHandle<()> {
    let period = interval.period();

    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            match AssertUnwindSafe(run_tick(&ctx, &key)).catch_unwind().await {
                Ok(Ok(())) => {
                    debug!(chat_id = %key.destination, token = %key.token, "alert delivered");
                }
                Ok(Err(TickError::Fetch(e))) if e.is_not_found() => {
                    warn!(chat_id = %key.destination, token = %key.token, "alert token not found");
                }
                Ok(Err(e)) => {
                    warn!(chat_id = %key.destination, token = %key.token, error = %e, "alert tick failed");
                }
                Err(_) => {
                    error!(chat_id = %key.destination, token = %key.token, "alert tick panicked");
                }
            }
        }
    })
}

pub async fn run_tick(ctx: &JobContext, key: &AlertKey) -> Result<(), TickError> {
    let snapshot = ctx.provider.fetch(&key.token).await?;
    let text = templates::render_token_report(&ctx.hbs, &snapshot)?;
    ctx.notifier
        .send(key.destination, &text, SendOptions::html_report())
        .await?;
    Ok(())
}
