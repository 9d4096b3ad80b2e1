use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 和环境变量加载，启动时使用）
///
/// - database: 数据库连接与重试
/// - cache: 分享链接读缓存
/// - logging: 日志
/// - share: token 与过期阈值
/// - analytics: 访问追踪与地理位置
/// - cleanup: 定时清理任务
/// - auth: LOGIN_REQUIRED 模式的凭证校验
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub share: ShareConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：SHARELINK，分隔符：__
    /// 示例：SHARELINK__CACHE__DEFAULT_TTL=60
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SHARELINK")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// memory | redis | none
    #[serde(rename = "type")]
    #[serde(default = "default_cache_type")]
    pub cache_type: String,
    /// 秒；实际 TTL 不会超过链接自身的 expires_at
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// text | json
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 分享链接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// 低于该长度的 token 直接判定为格式错误，不访问存储
    #[serde(default = "default_token_min_length")]
    pub token_min_length: usize,
    /// 允许的不活跃过期天数
    #[serde(default = "default_allowed_inactivity_days")]
    pub allowed_inactivity_days: Vec<u32>,
    /// 插入时遇到 token 唯一约束冲突的最大重试次数
    #[serde(default = "default_max_token_attempts")]
    pub max_token_attempts: u32,
}

impl ShareConfig {
    pub fn is_allowed_threshold(&self, days: u32) -> bool {
        self.allowed_inactivity_days.contains(&days)
    }
}

/// 访问统计配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 访问事件队列容量，队列满时丢弃新事件
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// 访问日志保留天数
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// 各维度排行返回条数
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_true")]
    pub geoip_enabled: bool,
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    /// 如果配置且文件可读，使用本地解析；否则 fallback 到外部 API
    #[serde(default)]
    pub maxminddb_path: Option<String>,
    /// 外部 GeoIP API URL，`{ip}` 为占位符
    #[serde(default = "default_geoip_api_url")]
    pub geoip_api_url: String,
}

/// 定时清理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cleanup_interval_hours")]
    pub interval_hours: u64,
    #[serde(default = "default_cleanup_initial_delay_secs")]
    pub initial_delay_secs: u64,
}

/// 凭证校验配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// HS256 密钥；为空时启动时随机生成
    #[serde(default)]
    pub jwt_secret: String,
}

// ============================================================
// Default value functions
// ============================================================

fn default_true() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite://sharelink.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_cache_type() -> String {
    "memory".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "sharelink:".to_string()
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_token_min_length() -> usize {
    32
}

fn default_allowed_inactivity_days() -> Vec<u32> {
    vec![1, 7, 14, 30, 60, 90]
}

fn default_max_token_attempts() -> u32 {
    5
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_retention_days() -> u32 {
    90
}

fn default_top_n() -> usize {
    5
}

fn default_geoip_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,countryCode,city".to_string()
}

fn default_cleanup_interval_hours() -> u64 {
    24
}

fn default_cleanup_initial_delay_secs() -> u64 {
    60
}

// ============================================================
// Default implementations
// ============================================================

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            default_ttl: default_cache_ttl(),
            redis: RedisConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            token_min_length: default_token_min_length(),
            allowed_inactivity_days: default_allowed_inactivity_days(),
            max_token_attempts: default_max_token_attempts(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
            retention_days: default_retention_days(),
            top_n: default_top_n(),
            geoip_enabled: true,
            maxminddb_path: None,
            geoip_api_url: default_geoip_api_url(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: default_cleanup_interval_hours(),
            initial_delay_secs: default_cleanup_initial_delay_secs(),
        }
    }
}
