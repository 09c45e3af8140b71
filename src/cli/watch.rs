use anyhow::Result;
use log::{error, info};

use crate::{notify::Permission, AppState, APP_NAME};

/// Foreground mode: pulls once if logged in, then scans for due tasks and
/// reports sync status changes until Ctrl-C.
pub async fn run(state: &AppState) -> Result<()> {
    if let Some(user_id) = state.auth.user_id() {
        state.sync.on_login(&user_id).await?;
    }

    if state.notifier.permission() != Permission::Granted {
        println!("Alerts are off. Run `lifesync notifications enable` to get due-task alerts.");
    }

    let mut status = state.auth.subscribe_status();
    state.sync.start().await;
    println!("{APP_NAME} is watching your tasks. Press Ctrl-C to stop.");

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                println!("sync: {}", current.as_str());
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    error!("failed to listen for Ctrl-C: {err}");
                }
                break;
            }
        }
    }

    info!("stopping watcher");
    state.sync.shutdown().await;
    Ok(())
}
