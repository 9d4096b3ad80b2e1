use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::analytics::{AccessLogProcessor, AccessTracker, StorageAccessSink};
use crate::cache::{self, ShareLinkLookup};
use crate::config::StaticConfig;
use crate::scheduler::ShareLinkCleanupTask;
use crate::services::{
    AnalyticsService, AuthVerifier, ContentProvider, GeoIpProvider, JwtAuthVerifier,
    ShareLinkService, ShareLinkValidator, SharedContentService,
};
use crate::storage::{SeaOrmStorage, StorageFactory};
use crate::utils::generate_token;

/// 组装好的全部组件
pub struct ShareLinkContext {
    pub storage: Arc<SeaOrmStorage>,
    pub lookup: ShareLinkLookup,
    pub share_links: Arc<ShareLinkService>,
    pub validator: ShareLinkValidator,
    pub analytics: Arc<AnalyticsService>,
    pub cleanup: Arc<ShareLinkCleanupTask>,
    pub verifier: Arc<dyn AuthVerifier>,
    /// 仅在 analytics.enabled 时存在
    pub tracker: Option<AccessTracker>,
}

impl ShareLinkContext {
    /// 用宿主提供的内容源构建对外服务
    pub fn shared_content_service(&self, provider: Arc<dyn ContentProvider>) -> SharedContentService {
        SharedContentService::new(
            self.validator.clone(),
            self.share_links.clone(),
            self.verifier.clone(),
            provider,
            self.tracker.clone(),
        )
    }

    pub async fn shutdown(&self) {
        if let Some(tracker) = &self.tracker {
            tracker.shutdown().await;
        }
    }
}

/// 建立存储与缓存，并组装服务
///
/// `start_tracker` 为 true 时启动访问日志后台 worker（需要在 tokio runtime 内）。
pub async fn prepare_startup(config: &StaticConfig, start_tracker: bool) -> Result<ShareLinkContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let link_cache = cache::create_cache(&config.cache).await;
    let lookup = ShareLinkLookup::new(link_cache, storage.clone());

    let share_links = Arc::new(ShareLinkService::new(
        storage.clone(),
        lookup.clone(),
        config.share.clone(),
    ));
    let validator = ShareLinkValidator::new(lookup.clone(), config.share.token_min_length);
    let analytics = Arc::new(AnalyticsService::new(
        storage.clone(),
        config.analytics.top_n,
    ));
    let cleanup = Arc::new(ShareLinkCleanupTask::new(
        storage.clone(),
        lookup.clone(),
        analytics.clone(),
        config.share.allowed_inactivity_days.clone(),
        config.analytics.retention_days,
    ));

    let jwt_secret = if config.auth.jwt_secret.is_empty() {
        warn!("JWT secret not configured or empty, generating secure random secret");
        generate_token()
    } else {
        config.auth.jwt_secret.clone()
    };
    let verifier: Arc<dyn AuthVerifier> = Arc::new(JwtAuthVerifier::new(&jwt_secret));

    let tracker = if start_tracker && config.analytics.enabled {
        let sink = Arc::new(StorageAccessSink::new(storage.clone()));
        let processor = AccessLogProcessor::new(sink, GeoIpProvider::new(&config.analytics));
        Some(AccessTracker::spawn(
            processor,
            config.analytics.queue_capacity,
        ))
    } else {
        debug!("Access tracking disabled");
        None
    };

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(ShareLinkContext {
        storage,
        lookup,
        share_links,
        validator,
        analytics,
        cleanup,
        verifier,
        tracker,
    })
}
