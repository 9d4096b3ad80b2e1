//! 有界队列 + 后台 worker
//!
//! - 入队使用 try_send，永不阻塞请求路径
//! - 队列满时丢弃事件并计数
//! - shutdown 时关闭队列并处理完已入队的事件

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{AccessEvent, AccessLogProcessor};

#[derive(Clone)]
pub struct AccessTracker {
    sender: mpsc::Sender<AccessEvent>,
    dropped: Arc<AtomicU64>,
    shutdown: Arc<Notify>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AccessTracker {
    /// 启动后台 worker，需要在 tokio runtime 内调用
    pub fn spawn(processor: AccessLogProcessor, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let shutdown = Arc::new(Notify::new());

        let handle = tokio::spawn(run_worker(processor, receiver, shutdown.clone()));
        debug!("Access tracker started (queue capacity: {})", capacity);

        Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
            shutdown,
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// 入队；返回是否成功
    pub fn log_access(&self, event: AccessEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    "Access queue full, dropping event for {} (dropped so far: {})",
                    event.share_link_id, dropped
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Access tracker stopped, dropping event for {}",
                    event.share_link_id
                );
                false
            }
        }
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 停止接收并等待已入队事件处理完毕
    pub async fn shutdown(&self) {
        let Some(handle) = self.worker.lock().await.take() else {
            return;
        };

        self.shutdown.notify_one();
        if let Err(e) = handle.await {
            warn!("Access tracker worker ended abnormally: {}", e);
        }
        info!(
            "Access tracker stopped ({} events dropped)",
            self.dropped_events()
        );
    }
}

async fn run_worker(
    processor: AccessLogProcessor,
    mut receiver: mpsc::Receiver<AccessEvent>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Some(event) => processor.process(event).await,
                None => return,
            },
            _ = shutdown.notified() => break,
        }
    }

    receiver.close();
    let mut drained = 0usize;
    while let Some(event) = receiver.recv().await {
        processor.process(event).await;
        drained += 1;
    }
    debug!("Access tracker drained {} queued events", drained);
}
