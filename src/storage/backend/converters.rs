use crate::errors::{Result, ShareLinkError};
use crate::storage::models::{AccessLogRecord, AccessMode, NewAccessLog, ShareLink, SharedResource};
use migration::entities::{share_link, share_link_access_log};

fn parse_access_mode(raw: &str) -> Result<AccessMode> {
    raw.parse()
        .map_err(|_| ShareLinkError::serialization(format!("Unknown access mode: {}", raw)))
}

/// 将 Sea-ORM Model 转换为 ShareLink
pub fn model_to_share_link(model: share_link::Model) -> Result<ShareLink> {
    Ok(ShareLink {
        resource: SharedResource::from_parts(&model.resource_type, &model.resource_id)?,
        access_mode: parse_access_mode(&model.access_mode)?,
        id: model.id,
        token: model.token,
        workspace_id: model.workspace_id,
        created_by_id: model.created_by_id,
        is_active: model.is_active,
        expires_at: model.expires_at,
        inactivity_expiration_days: model
            .inactivity_expiration_days
            .and_then(|d| u32::try_from(d).ok()),
        access_count: model.access_count.max(0) as u64,
        last_accessed_at: model.last_accessed_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// 将 ShareLink 转换为插入用的 ActiveModel
pub fn share_link_to_active_model(link: &ShareLink) -> share_link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    share_link::ActiveModel {
        id: Set(link.id.clone()),
        token: Set(link.token.clone()),
        workspace_id: Set(link.workspace_id.clone()),
        resource_type: Set(link.resource.kind().as_ref().to_string()),
        resource_id: Set(link.resource.id().to_string()),
        created_by_id: Set(link.created_by_id.clone()),
        access_mode: Set(link.access_mode.as_ref().to_string()),
        is_active: Set(link.is_active),
        expires_at: Set(link.expires_at),
        inactivity_expiration_days: Set(link.inactivity_expiration_days.map(|d| d as i32)),
        access_count: Set(link.access_count as i64),
        last_accessed_at: Set(link.last_accessed_at),
        created_at: Set(link.created_at),
        updated_at: Set(link.updated_at),
    }
}

pub fn access_log_model_to_record(model: share_link_access_log::Model) -> Result<AccessLogRecord> {
    Ok(AccessLogRecord {
        device_type: model.device_type.parse().unwrap_or_default(),
        access_method: parse_access_mode(&model.access_method)?,
        id: model.id,
        share_link_id: model.share_link_id,
        ip_address: model.ip_address,
        browser_name: model.browser_name,
        operating_system: model.operating_system,
        is_bot: model.is_bot,
        country_code: model.country_code,
        city: model.city,
        referrer: model.referrer,
        authenticated_user_id: model.authenticated_user_id,
        session_duration_seconds: model.session_duration_seconds.max(0) as u32,
        accessed_at: model.accessed_at,
    })
}

pub fn new_access_log_to_active_model(log: &NewAccessLog) -> share_link_access_log::ActiveModel {
    use sea_orm::ActiveValue::{NotSet, Set};

    share_link_access_log::ActiveModel {
        id: NotSet,
        share_link_id: Set(log.share_link_id.clone()),
        ip_address: Set(log.ip_address.clone()),
        device_type: Set(log.device_type.as_ref().to_string()),
        browser_name: Set(log.browser_name.clone()),
        operating_system: Set(log.operating_system.clone()),
        is_bot: Set(log.is_bot),
        country_code: Set(log.country_code.clone()),
        city: Set(log.city.clone()),
        referrer: Set(log.referrer.clone()),
        access_method: Set(log.access_method.as_ref().to_string()),
        authenticated_user_id: Set(log.authenticated_user_id.clone()),
        session_duration_seconds: Set(0),
        accessed_at: Set(log.accessed_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::DeviceType;
    use chrono::Utc;
    use sea_orm::ActiveValue;

    fn sample_model() -> share_link::Model {
        let now = Utc::now();
        share_link::Model {
            id: "0b9c".to_string(),
            token: "tok".to_string(),
            workspace_id: "ws-1".to_string(),
            resource_type: "CHART".to_string(),
            resource_id: "chart-7".to_string(),
            created_by_id: "user-1".to_string(),
            access_mode: "LOGIN_REQUIRED".to_string(),
            is_active: true,
            expires_at: None,
            inactivity_expiration_days: Some(7),
            access_count: 3,
            last_accessed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_model_to_share_link() {
        let link = model_to_share_link(sample_model()).unwrap();
        assert_eq!(link.resource, SharedResource::Chart("chart-7".to_string()));
        assert_eq!(link.access_mode, AccessMode::LoginRequired);
        assert_eq!(link.inactivity_expiration_days, Some(7));
        assert_eq!(link.access_count, 3);
    }

    #[test]
    fn test_model_to_share_link_clamps_negative_count() {
        let mut model = sample_model();
        model.access_count = -4;
        model.inactivity_expiration_days = Some(-1);
        let link = model_to_share_link(model).unwrap();
        assert_eq!(link.access_count, 0);
        assert_eq!(link.inactivity_expiration_days, None);
    }

    #[test]
    fn test_model_to_share_link_rejects_unknown_kinds() {
        let mut model = sample_model();
        model.resource_type = "WIDGET".to_string();
        assert!(model_to_share_link(model).is_err());

        let mut model = sample_model();
        model.access_mode = "SECRET".to_string();
        assert!(matches!(
            model_to_share_link(model),
            Err(ShareLinkError::Serialization(_))
        ));
    }

    #[test]
    fn test_share_link_to_active_model() {
        let link = model_to_share_link(sample_model()).unwrap();
        let active = share_link_to_active_model(&link);
        assert_eq!(active.resource_type, ActiveValue::Set("CHART".to_string()));
        assert_eq!(
            active.access_mode,
            ActiveValue::Set("LOGIN_REQUIRED".to_string())
        );
        assert_eq!(active.inactivity_expiration_days, ActiveValue::Set(Some(7)));
    }

    #[test]
    fn test_new_access_log_starts_with_zero_duration() {
        let log = NewAccessLog {
            share_link_id: "link".to_string(),
            ip_address: "203.0.113.9".to_string(),
            device_type: DeviceType::Tablet,
            browser_name: Some("Safari".to_string()),
            operating_system: Some("iPad".to_string()),
            is_bot: false,
            country_code: None,
            city: None,
            referrer: None,
            access_method: AccessMode::Public,
            authenticated_user_id: None,
            accessed_at: Utc::now(),
        };
        let active = new_access_log_to_active_model(&log);
        assert!(matches!(active.id, ActiveValue::NotSet));
        assert_eq!(active.session_duration_seconds, ActiveValue::Set(0));
        assert_eq!(active.device_type, ActiveValue::Set("tablet".to_string()));
    }
}
