use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareLinkError {
    InvalidToken(String),
    LinkNotFound(String),
    LinkDisabled(String),
    LinkExpired(String),
    LinkInactiveExpired(String),
    AuthRequired(String),
    AuthInvalid(String),
    NotFoundOrForbidden(String),
    WorkspaceMismatch(String),
    Validation(String),
    ResourceNotFound(String),
    ContentProvider(String),
    CacheConnection(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
}

impl ShareLinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShareLinkError::InvalidToken(_) => "E001",
            ShareLinkError::LinkNotFound(_) => "E002",
            ShareLinkError::LinkDisabled(_) => "E003",
            ShareLinkError::LinkExpired(_) => "E004",
            ShareLinkError::LinkInactiveExpired(_) => "E005",
            ShareLinkError::AuthRequired(_) => "E006",
            ShareLinkError::AuthInvalid(_) => "E007",
            ShareLinkError::NotFoundOrForbidden(_) => "E008",
            ShareLinkError::WorkspaceMismatch(_) => "E009",
            ShareLinkError::Validation(_) => "E010",
            ShareLinkError::ResourceNotFound(_) => "E011",
            ShareLinkError::ContentProvider(_) => "E012",
            ShareLinkError::CacheConnection(_) => "E013",
            ShareLinkError::DatabaseConfig(_) => "E014",
            ShareLinkError::DatabaseConnection(_) => "E015",
            ShareLinkError::DatabaseOperation(_) => "E016",
            ShareLinkError::Serialization(_) => "E017",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShareLinkError::InvalidToken(_) => "Invalid Token",
            ShareLinkError::LinkNotFound(_) => "Link Not Found",
            ShareLinkError::LinkDisabled(_) => "Link Disabled",
            ShareLinkError::LinkExpired(_) => "Link Expired",
            ShareLinkError::LinkInactiveExpired(_) => "Link Inactive Expired",
            ShareLinkError::AuthRequired(_) => "Authentication Required",
            ShareLinkError::AuthInvalid(_) => "Authentication Invalid",
            ShareLinkError::NotFoundOrForbidden(_) => "Not Found Or Forbidden",
            ShareLinkError::WorkspaceMismatch(_) => "Workspace Mismatch",
            ShareLinkError::Validation(_) => "Validation Error",
            ShareLinkError::ResourceNotFound(_) => "Resource Not Found",
            ShareLinkError::ContentProvider(_) => "Content Provider Error",
            ShareLinkError::CacheConnection(_) => "Cache Connection Error",
            ShareLinkError::DatabaseConfig(_) => "Database Configuration Error",
            ShareLinkError::DatabaseConnection(_) => "Database Connection Error",
            ShareLinkError::DatabaseOperation(_) => "Database Operation Error",
            ShareLinkError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShareLinkError::InvalidToken(msg)
            | ShareLinkError::LinkNotFound(msg)
            | ShareLinkError::LinkDisabled(msg)
            | ShareLinkError::LinkExpired(msg)
            | ShareLinkError::LinkInactiveExpired(msg)
            | ShareLinkError::AuthRequired(msg)
            | ShareLinkError::AuthInvalid(msg)
            | ShareLinkError::NotFoundOrForbidden(msg)
            | ShareLinkError::WorkspaceMismatch(msg)
            | ShareLinkError::Validation(msg)
            | ShareLinkError::ResourceNotFound(msg)
            | ShareLinkError::ContentProvider(msg)
            | ShareLinkError::CacheConnection(msg)
            | ShareLinkError::DatabaseConfig(msg)
            | ShareLinkError::DatabaseConnection(msg)
            | ShareLinkError::DatabaseOperation(msg)
            | ShareLinkError::Serialization(msg) => msg,
        }
    }

    /// 格式化为简洁输出（用于 CLI 和日志）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 对外暴露时的错误分类
    ///
    /// 外部调用方只能看到粗粒度的分类，具体原因仅记录在日志中。
    pub fn public_error(&self) -> PublicShareError {
        match self {
            ShareLinkError::InvalidToken(_)
            | ShareLinkError::LinkNotFound(_)
            | ShareLinkError::ResourceNotFound(_) => PublicShareError::NotFound,
            ShareLinkError::LinkDisabled(_)
            | ShareLinkError::LinkExpired(_)
            | ShareLinkError::LinkInactiveExpired(_) => PublicShareError::Forbidden,
            ShareLinkError::AuthRequired(_) | ShareLinkError::AuthInvalid(_) => {
                PublicShareError::Unauthorized
            }
            _ => PublicShareError::Internal,
        }
    }
}

impl fmt::Display for ShareLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShareLinkError {}

// 便捷的构造函数
impl ShareLinkError {
    pub fn invalid_token<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::InvalidToken(msg.into())
    }

    pub fn link_not_found<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::LinkNotFound(msg.into())
    }

    pub fn link_disabled<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::LinkDisabled(msg.into())
    }

    pub fn link_expired<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::LinkExpired(msg.into())
    }

    pub fn link_inactive_expired<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::LinkInactiveExpired(msg.into())
    }

    pub fn auth_required<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::AuthRequired(msg.into())
    }

    pub fn auth_invalid<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::AuthInvalid(msg.into())
    }

    pub fn not_found_or_forbidden<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::NotFoundOrForbidden(msg.into())
    }

    pub fn workspace_mismatch<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::WorkspaceMismatch(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::Validation(msg.into())
    }

    pub fn resource_not_found<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::ResourceNotFound(msg.into())
    }

    pub fn content_provider<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::ContentProvider(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::CacheConnection(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShareLinkError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ShareLinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShareLinkError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShareLinkError {
    fn from(err: serde_json::Error) -> Self {
        ShareLinkError::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for ShareLinkError {
    fn from(err: redis::RedisError) -> Self {
        ShareLinkError::CacheConnection(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ShareLinkError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ShareLinkError::AuthInvalid(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShareLinkError>;

/// 外部可见的错误分类，与 HTTP 状态码一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicShareError {
    NotFound,
    Forbidden,
    Unauthorized,
    Internal,
}

impl PublicShareError {
    pub fn status_code(&self) -> u16 {
        match self {
            PublicShareError::NotFound => 404,
            PublicShareError::Forbidden => 403,
            PublicShareError::Unauthorized => 401,
            PublicShareError::Internal => 500,
        }
    }

    /// 通用提示，不包含具体失败原因
    pub fn message(&self) -> &'static str {
        match self {
            PublicShareError::NotFound => "Shared content not found",
            PublicShareError::Forbidden => "This share link is no longer available",
            PublicShareError::Unauthorized => "Authentication is required to view this content",
            PublicShareError::Internal => "Internal server error",
        }
    }
}

impl fmt::Display for PublicShareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code(), self.message())
    }
}

impl std::error::Error for PublicShareError {}

impl From<&ShareLinkError> for PublicShareError {
    fn from(err: &ShareLinkError) -> Self {
        err.public_error()
    }
}

impl From<ShareLinkError> for PublicShareError {
    fn from(err: ShareLinkError) -> Self {
        err.public_error()
    }
}
