use chrono::Utc;
use log::{error, info};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::controller::TaskSynchronizer;

/// Scans the task list once per `period` until `cancel_token` fires. The
/// first scan happens one full period after start.
pub(super) async fn due_scan_loop(
    sync: TaskSynchronizer,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sync.scan_due_tasks(Utc::now()).await {
                    Ok(0) => {}
                    Ok(count) => info!("due scan notified {count} task(s)"),
                    Err(err) => error!("due scan failed to persist: {err}"),
                }
            }
            _ = cancel_token.cancelled() => {
                info!("due scanner shutting down");
                break;
            }
        }
    }
}
