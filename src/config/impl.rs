use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Panics if neither `init_config` nor `init_config_with` has run.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// Like `get_config`, but returns `None` before initialization
pub fn try_get_config() -> Option<Arc<StaticConfig>> {
    CONFIG.get().map(|c| c.load_full())
}

/// Initialize the global configuration from `config.toml` and `SHARELINK__*`
/// environment variables, falling back to defaults.
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// Initialize (or replace) the global configuration with an explicit value
pub fn init_config_with(config: StaticConfig) {
    match CONFIG.get() {
        Some(existing) => existing.store(Arc::new(config)),
        None => {
            let mut pending = Some(config);
            let slot = CONFIG.get_or_init(|| {
                ArcSwap::from_pointee(pending.take().unwrap_or_default())
            });
            // 并发初始化时另一方先完成，覆盖为传入值
            if let Some(config) = pending {
                slot.store(Arc::new(config));
            }
        }
    }
}
