//! SeaORM storage tests
//!
//! 直接针对 SQLite 后端的读写谓词

use std::sync::Arc;
use std::sync::Once;

use chrono::{Duration, Utc};
use sharelink::config::init_config;
use sharelink::storage::{
    AccessMode, DeviceType, InsertOutcome, NewAccessLog, SeaOrmStorage, ShareLink, ShareLinkPatch,
    SharedResource,
};
use sharelink::utils::generate_token;
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("storage.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");
    (Arc::new(storage), temp_dir)
}

fn sample_link(workspace_id: &str, user_id: &str, resource: SharedResource) -> ShareLink {
    let now = Utc::now();
    ShareLink {
        id: uuid::Uuid::new_v4().to_string(),
        token: generate_token(),
        workspace_id: workspace_id.to_string(),
        resource,
        created_by_id: user_id.to_string(),
        access_mode: AccessMode::Public,
        is_active: true,
        expires_at: None,
        inactivity_expiration_days: None,
        access_count: 0,
        last_accessed_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn sample_log(share_link_id: &str, ip: &str) -> NewAccessLog {
    NewAccessLog {
        share_link_id: share_link_id.to_string(),
        ip_address: ip.to_string(),
        device_type: DeviceType::Mobile,
        browser_name: Some("Safari".to_string()),
        operating_system: Some("iOS".to_string()),
        is_bot: false,
        country_code: Some("DE".to_string()),
        city: Some("Berlin".to_string()),
        referrer: None,
        access_method: AccessMode::Public,
        authenticated_user_id: None,
        accessed_at: Utc::now(),
    }
}

// =============================================================================
// Insert / query
// =============================================================================

#[cfg(test)]
mod insert_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Dashboard("d-1".to_string()));

        let outcome = storage.insert_link(&link).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);

        let by_token = storage.find_by_token(&link.token).await.unwrap().unwrap();
        assert_eq!(by_token.id, link.id);
        assert_eq!(by_token.resource, link.resource);
        assert_eq!(by_token.access_mode, AccessMode::Public);

        let by_id = storage.find_by_id(&link.id).await.unwrap().unwrap();
        assert_eq!(by_id.token, link.token);
        assert!(storage.token_exists(&link.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_token_reports_conflict() {
        let (storage, _temp) = create_temp_storage().await;
        let first = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&first).await.unwrap();

        let mut second = sample_link("ws", "bob", SharedResource::Record("r-2".to_string()));
        second.token = first.token.clone();

        let outcome = storage.insert_link(&second).await.unwrap();
        assert_eq!(outcome, InsertOutcome::TokenConflict);
        assert!(storage.find_by_id(&second.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_queries_are_scoped() {
        let (storage, _temp) = create_temp_storage().await;
        let resource = SharedResource::Chart("c-1".to_string());
        let link = sample_link("ws", "alice", resource.clone());
        storage.insert_link(&link).await.unwrap();

        let found = storage
            .find_by_owner_resource("ws", &resource, "alice")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        assert!(
            storage
                .find_by_owner_resource("other-ws", &resource, "alice")
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            storage
                .find_by_owner_token(&link.token, "ws", "bob")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(storage.list_by_user("ws", "alice").await.unwrap().len(), 1);
        assert!(storage.list_by_user("ws", "bob").await.unwrap().is_empty());
    }
}

// =============================================================================
// Conditional writes
// =============================================================================

#[cfg(test)]
mod mutation_tests {
    use super::*;

    #[tokio::test]
    async fn test_record_access_increments_counter() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&link).await.unwrap();

        let at = Utc::now();
        assert!(storage.record_access(&link.token, at).await.unwrap());
        assert!(storage.record_access(&link.token, at).await.unwrap());

        let stored = storage.find_by_id(&link.id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 2);
        assert!(stored.last_accessed_at.is_some());

        assert!(!storage.record_access("missing", at).await.unwrap());
    }

    #[tokio::test]
    async fn test_deactivate_if_active_is_idempotent() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&link).await.unwrap();

        assert!(storage.deactivate_if_active(&link.id, Utc::now()).await.unwrap());
        assert!(!storage.deactivate_if_active(&link.id, Utc::now()).await.unwrap());

        let stored = storage.find_by_id(&link.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_reuse_patch_skips_deactivated_link() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Chart("c-1".to_string()));
        storage.insert_link(&link).await.unwrap();

        let patch = ShareLinkPatch {
            access_mode: Some(AccessMode::LoginRequired),
            expires_at: Some(Some(Utc::now() + Duration::days(3))),
            inactivity_expiration_days: Some(Some(14)),
            ..Default::default()
        };

        // 读取与更新之间被清理任务停用
        assert!(storage.deactivate_if_active(&link.id, Utc::now()).await.unwrap());
        assert!(
            !storage
                .apply_patch_if_active(&link.id, &patch, Utc::now())
                .await
                .unwrap()
        );

        let stored = storage.find_by_id(&link.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.access_mode, AccessMode::Public);
        assert!(stored.expires_at.is_none());
        assert!(stored.inactivity_expiration_days.is_none());

        let live = sample_link("ws", "alice", SharedResource::Chart("c-2".to_string()));
        storage.insert_link(&live).await.unwrap();
        assert!(
            storage
                .apply_patch_if_active(&live.id, &patch, Utc::now())
                .await
                .unwrap()
        );
        let patched = storage.find_by_id(&live.id).await.unwrap().unwrap();
        assert_eq!(patched.access_mode, AccessMode::LoginRequired);
        assert_eq!(patched.inactivity_expiration_days, Some(14));
    }

    #[tokio::test]
    async fn test_update_owned_requires_ownership() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&link).await.unwrap();

        let patch = ShareLinkPatch {
            access_mode: Some(AccessMode::LoginRequired),
            inactivity_expiration_days: Some(Some(30)),
            ..Default::default()
        };

        let denied = storage
            .update_owned(&link.token, "ws", "mallory", &patch, Utc::now())
            .await
            .unwrap();
        assert!(denied.is_none());

        let updated = storage
            .update_owned(&link.token, "ws", "alice", &patch, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.access_mode, AccessMode::LoginRequired);
        assert_eq!(updated.inactivity_expiration_days, Some(30));
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn test_delete_owned_removes_access_logs() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&link).await.unwrap();
        storage
            .insert_access_log(&sample_log(&link.id, "203.0.113.5"))
            .await
            .unwrap();

        assert!(!storage.delete_owned(&link.token, "ws", "bob").await.unwrap());
        assert!(storage.delete_owned(&link.token, "ws", "alice").await.unwrap());

        assert!(storage.find_by_id(&link.id).await.unwrap().is_none());
        let logs = storage
            .list_access_logs_since(&link.id, Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert!(logs.is_empty());
    }
}

// =============================================================================
// Sweeper queries
// =============================================================================

#[cfg(test)]
mod sweep_query_tests {
    use super::*;

    #[tokio::test]
    async fn test_find_expired_active() {
        let (storage, _temp) = create_temp_storage().await;
        let now = Utc::now();

        let mut expired = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        expired.expires_at = Some(now - Duration::minutes(5));
        let mut future = sample_link("ws", "alice", SharedResource::Record("r-2".to_string()));
        future.expires_at = Some(now + Duration::days(1));
        let open = sample_link("ws", "alice", SharedResource::Record("r-3".to_string()));

        for link in [&expired, &future, &open] {
            storage.insert_link(link).await.unwrap();
        }

        let found = storage.find_expired_active(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, expired.id);
    }

    #[tokio::test]
    async fn test_find_inactive_for_threshold() {
        let (storage, _temp) = create_temp_storage().await;
        let now = Utc::now();

        let mut stale = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        stale.inactivity_expiration_days = Some(7);
        stale.created_at = now - Duration::days(10);

        let mut touched = sample_link("ws", "alice", SharedResource::Record("r-2".to_string()));
        touched.inactivity_expiration_days = Some(7);
        touched.created_at = now - Duration::days(10);
        touched.last_accessed_at = Some(now - Duration::days(1));

        let mut other_threshold =
            sample_link("ws", "alice", SharedResource::Record("r-3".to_string()));
        other_threshold.inactivity_expiration_days = Some(30);
        other_threshold.created_at = now - Duration::days(10);

        for link in [&stale, &touched, &other_threshold] {
            storage.insert_link(link).await.unwrap();
        }

        let found = storage
            .find_inactive_for_threshold(7, now - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, stale.id);
    }
}

// =============================================================================
// Access logs
// =============================================================================

#[cfg(test)]
mod access_log_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_list_access_logs() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&link).await.unwrap();

        let first = storage
            .insert_access_log(&sample_log(&link.id, "203.0.113.1"))
            .await
            .unwrap();
        let second = storage
            .insert_access_log(&sample_log(&link.id, "203.0.113.2"))
            .await
            .unwrap();
        assert_ne!(first, second);

        let logs = storage
            .list_access_logs_since(&link.id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].device_type, DeviceType::Mobile);
        assert_eq!(logs[0].country_code.as_deref(), Some("DE"));
        assert_eq!(logs[0].session_duration_seconds, 0);
    }

    #[tokio::test]
    async fn test_session_duration_is_written_once() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&link).await.unwrap();
        let log_id = storage
            .insert_access_log(&sample_log(&link.id, "203.0.113.1"))
            .await
            .unwrap();

        assert!(storage.update_session_duration(log_id, 42).await.unwrap());
        assert!(!storage.update_session_duration(log_id, 99).await.unwrap());
        assert!(!storage.update_session_duration(log_id + 1000, 5).await.unwrap());

        let logs = storage
            .list_access_logs_since(&link.id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(logs[0].session_duration_seconds, 42);
    }

    #[tokio::test]
    async fn test_delete_access_logs_before_in_batches() {
        let (storage, _temp) = create_temp_storage().await;
        let link = sample_link("ws", "alice", SharedResource::Record("r-1".to_string()));
        storage.insert_link(&link).await.unwrap();

        for n in 0..5 {
            let mut log = sample_log(&link.id, &format!("198.51.100.{}", n));
            log.accessed_at = Utc::now() - Duration::days(200);
            storage.insert_access_log(&log).await.unwrap();
        }
        storage
            .insert_access_log(&sample_log(&link.id, "198.51.100.99"))
            .await
            .unwrap();

        let deleted = storage
            .delete_access_logs_before(Utc::now() - Duration::days(90), 2)
            .await
            .unwrap();
        assert_eq!(deleted, 5);

        let again = storage
            .delete_access_logs_before(Utc::now() - Duration::days(90), 2)
            .await
            .unwrap();
        assert_eq!(again, 0);
    }
}
