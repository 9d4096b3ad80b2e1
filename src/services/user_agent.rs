//! User-Agent 解析（woothee），结果按原始字符串缓存

use moka::sync::Cache;
use woothee::parser::Parser;

use crate::storage::DeviceType;

const UA_CACHE_CAPACITY: u64 = 10_000;

/// 从 User-Agent 推导出的字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub device_type: DeviceType,
    pub browser_name: Option<String>,
    pub operating_system: Option<String>,
    pub is_bot: bool,
}

pub struct UserAgentParser {
    parser: Parser,
    cache: Cache<String, ParsedUserAgent>,
}

impl Default for UserAgentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            cache: Cache::new(UA_CACHE_CAPACITY),
        }
    }

    /// 缺失或空的 UA 视为未知桌面访问
    pub fn parse(&self, user_agent: Option<&str>) -> ParsedUserAgent {
        let Some(ua) = user_agent.map(str::trim).filter(|s| !s.is_empty()) else {
            return ParsedUserAgent::default();
        };

        if let Some(hit) = self.cache.get(ua) {
            return hit;
        }

        let parsed = self.parse_uncached(ua);
        self.cache.insert(ua.to_string(), parsed.clone());
        parsed
    }

    fn parse_uncached(&self, ua: &str) -> ParsedUserAgent {
        let result = self.parser.parse(ua).unwrap_or_default();
        let lower = ua.to_ascii_lowercase();

        let is_bot = result.category == "crawler"
            || ["bot", "spider", "crawler", "slurp", "headless"]
                .iter()
                .any(|marker| lower.contains(marker));

        ParsedUserAgent {
            device_type: classify_device(result.category, &lower),
            browser_name: known(result.name),
            operating_system: known(result.os),
            is_bot,
        }
    }
}

fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}

/// woothee 不区分平板，按 UA 关键字补充判断
fn classify_device(category: &str, lower_ua: &str) -> DeviceType {
    if lower_ua.contains("ipad")
        || lower_ua.contains("tablet")
        || (lower_ua.contains("android") && !lower_ua.contains("mobile"))
    {
        return DeviceType::Tablet;
    }
    match category {
        "smartphone" | "mobilephone" => DeviceType::Mobile,
        _ => DeviceType::Desktop,
    }
}
