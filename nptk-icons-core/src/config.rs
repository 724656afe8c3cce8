// SPDX-License-Identifier: LGPL-3.0-only
//! Icon cache configuration.

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use xdg::BaseDirectories;

/// Tunables of an [`IconCache`](crate::IconCache).
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```toml
/// workers = 2
/// default_icon_size = 32
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IconCacheConfig {
    /// Number of worker threads resolving and decoding icons. Defaults to half of the available threads.
    pub workers: NonZeroUsize,
    /// Stack size of each worker thread. Defaults to 1 MB.
    pub stack_size: usize,
    /// Control-thread time spent dispatching queued requests per drain batch, in milliseconds.
    pub drain_budget_ms: u64,
    /// Smallest accepted bound. Requests with a smaller bound are rejected.
    pub min_icon_size: u32,
    /// Themed lookup size when a request gives neither bound.
    pub default_icon_size: u32,
    /// Fraction of an annotated icon's height reserved for the ribbon.
    pub ribbon_reserve: f32,
}

impl Default for IconCacheConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .ok()
                .and_then(|threads| NonZeroUsize::new(threads.get() / 2))
                .unwrap_or(NonZeroUsize::MIN),
            stack_size: 1024 * 1024, // 1 MB
            drain_budget_ms: 1,
            min_icon_size: 1,
            default_icon_size: 48,
            ribbon_reserve: 0.2,
        }
    }
}

impl IconCacheConfig {
    /// Per-batch dispatch budget.
    pub fn drain_budget(&self) -> Duration {
        Duration::from_millis(self.drain_budget_ms)
    }

    /// Ribbon height for an annotated icon of `size` pixels. Never below 6 px
    /// unless the icon itself is smaller.
    pub fn ribbon_height(&self, size: u32) -> u32 {
        let ratio = self.ribbon_reserve.clamp(0.0, 0.5);
        let height = (size as f32 * ratio).round() as u32;
        height.max(6).min(size / 2)
    }

    /// Parse a configuration from TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `icons.toml` from the standard locations.
    ///
    /// Order (later overrides earlier, key by key):
    /// 1. System data: `/usr/share/nptk-0/icons.toml` (and `XDG_DATA_DIRS`)
    /// 2. Config: `XDG_CONFIG_DIRS`, then `~/.config/nptk-0/icons.toml`
    ///
    /// Unreadable or invalid files are skipped with a warning.
    pub fn load() -> Result<Self> {
        let xdg_dirs = BaseDirectories::with_prefix("nptk-0")?;
        let filename = "icons.toml";

        let mut merged = toml::Table::new();
        for path in xdg_dirs.find_data_files(filename).rev() {
            merge_file(&mut merged, &path);
        }
        for path in xdg_dirs.find_config_files(filename).rev() {
            merge_file(&mut merged, &path);
        }

        Ok(toml::Value::Table(merged).try_into()?)
    }
}

fn merge_file(merged: &mut toml::Table, path: &Path) {
    log::info!("Loading icon cache config from: {:?}", path);
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Failed to read icon cache config {:?}: {}", path, e);
            return;
        },
    };
    match content.parse::<toml::Table>() {
        Ok(table) => merged.extend(table),
        Err(e) => log::warn!("Failed to parse icon cache config {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = IconCacheConfig::from_toml("workers = 3\ndefault_icon_size = 32\n").unwrap();
        assert_eq!(config.workers.get(), 3);
        assert_eq!(config.default_icon_size, 32);
        assert_eq!(config.drain_budget(), Duration::from_millis(1));
        assert_eq!(config.min_icon_size, 1);
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        assert!(IconCacheConfig::from_toml("workers = 0").is_err());
    }

    #[test]
    fn test_ribbon_height() {
        let config = IconCacheConfig::default();
        assert_eq!(config.ribbon_height(100), 20);
        assert_eq!(config.ribbon_height(16), 6);
        assert_eq!(config.ribbon_height(8), 4);
    }
}
