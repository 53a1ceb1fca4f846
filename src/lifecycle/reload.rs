//! Periodic config reload

use super::Application;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Reload `app` every `every` until the returned handle is aborted.
///
/// Reloads run on the blocking pool since they read the config file and may
/// re-run factory methods. A source that fails to parse is logged and the
/// previous values stay in place; a wiring error during recall ends the
/// process.
pub fn spawn_reload_task(app: Arc<Application>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let app = Arc::clone(&app);
            match tokio::task::spawn_blocking(move || app.reload()).await {
                Ok(Ok(summary)) if summary.is_empty() => {
                    tracing::trace!("Config unchanged");
                }
                Ok(Ok(summary)) => {
                    tracing::info!(
                        "Config reloaded: {} value(s) changed, {} factory method(s) recalled",
                        summary.changed.len(),
                        summary.recalled.len()
                    );
                }
                Ok(Err(e)) if e.is_wiring_error() => {
                    tracing::error!("Reload failed: {}", e);
                    std::process::exit(1);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Reload failed, keeping previous config: {}", e);
                }
                Err(e) => {
                    tracing::error!("Reload task failed: {}", e);
                }
            }
        }
    })
}
