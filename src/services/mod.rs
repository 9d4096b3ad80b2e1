//! Service layer
//!
//! Lifecycle, validation, shared-content resolution and analytics, plus the
//! collaborators they consume (credential verifier, GeoIP, user-agent parser).

mod analytics_service;
pub mod auth;
mod content_service;
pub mod geoip;
mod share_link_service;
pub mod user_agent;
pub mod validation;

pub use analytics_service::*;
pub use auth::{AuthVerifier, AuthenticatedUser, JwtAuthVerifier};
pub use content_service::*;
pub use geoip::{GeoInfo, GeoIpLookup, GeoIpProvider};
pub use share_link_service::*;
pub use user_agent::{ParsedUserAgent, UserAgentParser};
pub use validation::{ShareLinkValidator, check_format, evaluate_link, is_live};
