//! 访问者地理位置解析
//!
//! 本地 MaxMind 数据库优先，其次外部 HTTP API，也可整体关闭。

mod external_api;
mod maxmind;
mod provider;

pub use external_api::ExternalApiProvider;
pub use maxmind::MaxMindProvider;
pub use provider::{DisabledGeoIp, GeoInfo, GeoIpLookup, GeoIpProvider};
