use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::startup::ShareLinkContext;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 等待 Ctrl+C，然后排空访问队列
pub async fn listen_for_shutdown(ctx: &ShareLinkContext) {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining access queue..."),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), ctx.shutdown()).await {
        Ok(()) => info!("All shutdown tasks completed successfully"),
        Err(_) => error!(
            "Shutdown tasks timed out after {} seconds, queued access events may be lost",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
