//! Shared content path tests
//!
//! Token → validation → access-mode gate → provider → access counting and logging

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use sharelink::analytics::{AccessLogProcessor, AccessTracker, StorageAccessSink};
use sharelink::cache::{MokaLinkCache, ShareLinkLookup};
use sharelink::config::{ShareConfig, init_config};
use sharelink::errors::{PublicShareError, ShareLinkError};
use sharelink::services::{
    ClientInfo, ContentProvider, CreateShareLinkRequest, GeoIpProvider, JwtAuthVerifier,
    ResourceContent, ShareLinkService, ShareLinkValidator, SharedContentService,
    UpdateShareLinkRequest,
};
use sharelink::storage::{
    AccessMode, DeviceType, ResourceKind, SeaOrmStorage, ShareLink, SharedResource,
};
use tempfile::TempDir;
use tokio::sync::RwLock;

static INIT: Once = Once::new();

const JWT_SECRET: &str = "content_test_secret_32_bytes_ok!";

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

// =============================================================================
// Mock content provider
// =============================================================================

#[derive(Default)]
struct MockProvider {
    contents: RwLock<HashMap<(String, String), ResourceContent>>,
}

impl MockProvider {
    async fn put(&self, workspace_id: &str, resource_id: &str, title: &str) {
        self.contents.write().await.insert(
            (workspace_id.to_string(), resource_id.to_string()),
            ResourceContent {
                title: title.to_string(),
                data: json!({ "widgets": 3, "owner": "finance" }),
            },
        );
    }
}

#[async_trait]
impl ContentProvider for MockProvider {
    async fn get_content(
        &self,
        resource: &SharedResource,
        workspace_id: &str,
    ) -> anyhow::Result<Option<ResourceContent>> {
        if resource.id() == "broken" {
            anyhow::bail!("upstream timed out");
        }
        Ok(self
            .contents
            .read()
            .await
            .get(&(workspace_id.to_string(), resource.id().to_string()))
            .cloned())
    }
}

// =============================================================================
// Test context
// =============================================================================

struct TestContext {
    storage: Arc<SeaOrmStorage>,
    links: Arc<ShareLinkService>,
    validator: ShareLinkValidator,
    provider: Arc<MockProvider>,
    verifier: Arc<JwtAuthVerifier>,
    tracker: AccessTracker,
    content: SharedContentService,
    _temp: TempDir,
}

async fn create_test_context() -> TestContext {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("content.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    let cache = Arc::new(MokaLinkCache::new(1000, StdDuration::from_secs(300)));
    let lookup = ShareLinkLookup::new(cache, storage.clone());
    let share = ShareConfig::default();
    let validator = ShareLinkValidator::new(lookup.clone(), share.token_min_length);
    let links = Arc::new(ShareLinkService::new(storage.clone(), lookup, share));

    let sink = Arc::new(StorageAccessSink::new(storage.clone()));
    let tracker = AccessTracker::spawn(
        AccessLogProcessor::new(sink, GeoIpProvider::disabled()),
        64,
    );

    let provider = Arc::new(MockProvider::default());
    let verifier = Arc::new(JwtAuthVerifier::new(JWT_SECRET));
    let content = SharedContentService::new(
        validator.clone(),
        links.clone(),
        verifier.clone(),
        provider.clone(),
        Some(tracker.clone()),
    );

    TestContext {
        storage,
        links,
        validator,
        provider,
        verifier,
        tracker,
        content,
        _temp: temp_dir,
    }
}

async fn share(ctx: &TestContext, resource: SharedResource, mode: AccessMode) -> ShareLink {
    ctx.links
        .create_share_link(CreateShareLinkRequest {
            workspace_id: "ws-1".to_string(),
            created_by_id: "owner".to_string(),
            resource,
            access_mode: mode,
            expires_at: None,
            inactivity_expiration_days: None,
        })
        .await
        .expect("create share link")
        .link
}

fn browser_client() -> ClientInfo {
    ClientInfo {
        ip_address: "203.0.113.7".to_string(),
        user_agent: Some(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        ),
        referrer: Some("https://chat.example.com".to_string()),
    }
}

// =============================================================================
// Public access
// =============================================================================

#[cfg(test)]
mod public_tests {
    use super::*;

    #[tokio::test]
    async fn test_public_link_returns_content_and_tracks_access() {
        let ctx = create_test_context().await;
        ctx.provider.put("ws-1", "dash-1", "Quarterly revenue").await;
        let link = share(
            &ctx,
            SharedResource::Dashboard("dash-1".to_string()),
            AccessMode::Public,
        )
        .await;

        let content = ctx
            .content
            .get_shared_content(&link.token, None, browser_client())
            .await
            .unwrap();
        assert_eq!(content.resource_type, ResourceKind::Dashboard);
        assert_eq!(content.resource_id, "dash-1");
        assert_eq!(content.title, "Quarterly revenue");
        assert_eq!(content.data["widgets"], 3);
        assert_eq!(content.metadata.access_mode, AccessMode::Public);
        assert_eq!(content.metadata.shared_at, link.created_at);

        ctx.tracker.shutdown().await;

        let stored = ctx.storage.find_by_id(&link.id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 1);
        assert!(stored.last_accessed_at.is_some());

        let logs = ctx
            .storage
            .list_access_logs_since(&link.id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].ip_address, "203.0.113.7");
        assert_eq!(logs[0].device_type, DeviceType::Desktop);
        assert!(!logs[0].is_bot);
        assert_eq!(logs[0].access_method, AccessMode::Public);
        assert_eq!(logs[0].referrer.as_deref(), Some("https://chat.example.com"));
        assert!(logs[0].authenticated_user_id.is_none());
    }

    #[tokio::test]
    async fn test_access_counted_without_tracker() {
        let ctx = create_test_context().await;
        ctx.provider.put("ws-1", "dash-2", "Pipeline").await;
        let link = share(
            &ctx,
            SharedResource::Dashboard("dash-2".to_string()),
            AccessMode::Public,
        )
        .await;

        let untracked = SharedContentService::new(
            ctx.validator.clone(),
            ctx.links.clone(),
            ctx.verifier.clone(),
            ctx.provider.clone(),
            None,
        );
        for _ in 0..2 {
            untracked
                .get_shared_content(&link.token, None, browser_client())
                .await
                .unwrap();
        }

        // 无分析队列时计数与最近访问时间仍同步落库
        let stored = ctx.storage.find_by_id(&link.id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 2);
        assert!(stored.last_accessed_at.is_some());

        let logs = ctx
            .storage
            .list_access_logs_since(&link.id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_public_link_ignores_credentials() {
        let ctx = create_test_context().await;
        ctx.provider.put("ws-1", "rec-1", "Customer").await;
        let link = share(
            &ctx,
            SharedResource::Record("rec-1".to_string()),
            AccessMode::Public,
        )
        .await;

        let result = ctx
            .content
            .get_shared_content(&link.token, Some("not-a-jwt"), ClientInfo::default())
            .await;
        assert!(result.is_ok());
    }
}

// =============================================================================
// Login required
// =============================================================================

#[cfg(test)]
mod login_required_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_or_invalid_credential_is_unauthorized() {
        let ctx = create_test_context().await;
        ctx.provider.put("ws-1", "chart-1", "Churn").await;
        let link = share(
            &ctx,
            SharedResource::Chart("chart-1".to_string()),
            AccessMode::LoginRequired,
        )
        .await;

        let err = ctx
            .content
            .resolve(&link.token, None, ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShareLinkError::AuthRequired(_)));

        let err = ctx
            .content
            .resolve(&link.token, Some("   "), ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShareLinkError::AuthRequired(_)));

        let public = ctx
            .content
            .get_shared_content(&link.token, Some("forged.jwt.value"), ClientInfo::default())
            .await
            .unwrap_err();
        assert_eq!(public, PublicShareError::Unauthorized);
        assert_eq!(public.status_code(), 401);
    }

    #[tokio::test]
    async fn test_valid_credential_records_user() {
        let ctx = create_test_context().await;
        ctx.provider.put("ws-1", "chart-1", "Churn").await;
        let link = share(
            &ctx,
            SharedResource::Chart("chart-1".to_string()),
            AccessMode::LoginRequired,
        )
        .await;

        let jwt = ctx.verifier.generate_access_token("viewer-42", 5).unwrap();
        let bearer = format!("Bearer {}", jwt);
        let content = ctx
            .content
            .get_shared_content(&link.token, Some(bearer.as_str()), browser_client())
            .await
            .unwrap();
        assert_eq!(content.metadata.access_mode, AccessMode::LoginRequired);

        ctx.tracker.shutdown().await;

        let logs = ctx
            .storage
            .list_access_logs_since(&link.id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].access_method, AccessMode::LoginRequired);
        assert_eq!(logs[0].authenticated_user_id.as_deref(), Some("viewer-42"));
    }
}

// =============================================================================
// Failure mapping
// =============================================================================

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_and_malformed_tokens_are_not_found() {
        let ctx = create_test_context().await;

        let unknown = "u".repeat(43);
        for token in ["short", unknown.as_str()] {
            let err = ctx
                .content
                .get_shared_content(token, None, ClientInfo::default())
                .await
                .unwrap_err();
            assert_eq!(err, PublicShareError::NotFound);
        }
    }

    #[tokio::test]
    async fn test_disabled_link_is_forbidden() {
        let ctx = create_test_context().await;
        ctx.provider.put("ws-1", "rec-1", "Customer").await;
        let link = share(
            &ctx,
            SharedResource::Record("rec-1".to_string()),
            AccessMode::Public,
        )
        .await;

        ctx.links
            .update_share_link(
                &link.token,
                "ws-1",
                "owner",
                UpdateShareLinkRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = ctx
            .content
            .get_shared_content(&link.token, None, ClientInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err, PublicShareError::Forbidden);
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_missing_resource_is_not_found() {
        let ctx = create_test_context().await;
        // 资源在另一个 workspace，不会泄漏
        ctx.provider.put("ws-other", "rec-2", "Elsewhere").await;
        let link = share(
            &ctx,
            SharedResource::Record("rec-2".to_string()),
            AccessMode::Public,
        )
        .await;

        let err = ctx
            .content
            .resolve(&link.token, None, ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShareLinkError::ResourceNotFound(_)));
        assert_eq!(err.public_error(), PublicShareError::NotFound);
    }

    #[tokio::test]
    async fn test_provider_failure_is_internal() {
        let ctx = create_test_context().await;
        let link = share(
            &ctx,
            SharedResource::Record("broken".to_string()),
            AccessMode::Public,
        )
        .await;

        let err = ctx
            .content
            .get_shared_content(&link.token, None, ClientInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err, PublicShareError::Internal);
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_rejected_access_is_not_tracked() {
        let ctx = create_test_context().await;
        let link = share(
            &ctx,
            SharedResource::Record("rec-missing".to_string()),
            AccessMode::Public,
        )
        .await;

        assert!(
            ctx.content
                .get_shared_content(&link.token, None, ClientInfo::default())
                .await
                .is_err()
        );
        ctx.tracker.shutdown().await;

        let stored = ctx.storage.find_by_id(&link.id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 0);
        assert_eq!(ctx.tracker.dropped_events(), 0);
    }
}
