use crate::session::SessionManager;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

/// Access tokens live 15 minutes; refreshing every 10 leaves a 5-minute
/// safety margin.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(600);

/// Keep the access token fresh for the lifetime of the process
///
/// Ticks at a fixed interval strictly shorter than the token lifetime and
/// refreshes only while a session is authenticated. A failed refresh has
/// already forced the session back to anonymous, so the loop stops.
pub fn spawn(manager: Arc<SessionManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval(period);

        // The first tick fires immediately; the startup check already ran.
        ticks.tick().await;

        loop {
            ticks.tick().await;

            if !manager.store().snapshot().is_authenticated() {
                continue;
            }

            match manager.refresh().await {
                Ok(()) => debug!("access token refreshed"),
                Err(err) => {
                    error!("periodic refresh failed: {err}");
                    break;
                }
            }
        }
    })
}
