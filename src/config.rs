//! Build configuration.
//!
//! Handles loading, validating, and merging `linkpage.toml`. This file controls
//! *how* the page is generated (where the data lives, icon fetch policy, toast
//! timing, favicon raster size). It is distinct from `config.json`, which holds
//! the page's own content and is parsed into [`crate::types::SiteConfig`].
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── linkpage.toml            # Build config (optional, overrides stock defaults)
//! ├── index.css
//! └── assets/
//!     ├── js/
//!     │   ├── config.json      # Site config
//!     │   └── data.json        # Link catalog
//!     └── img/icons/*.svg      # One SVG per icon name
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [data]
//! links = "assets/js/data.json"
//! site = "assets/js/config.json"
//! icons = "assets/img/icons"
//!
//! [render]
//! min_placeholders = 6         # Skeleton rows reserved per section
//! fetch_policy = "sequential"  # or "concurrent"
//!
//! [page]
//! fallback_title = "Links"
//! lang = "en"
//! stylesheets = []
//!
//! [favicon]
//! default_background = "#667eea"
//! png_size = 32
//!
//! [interaction]
//! toast_ms = 3000
//! stagger_ms = 100
//!
//! [processing]
//! max_processes = 4            # Only used by the concurrent fetch policy
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the build config file within the site directory.
pub const CONFIG_FILENAME: &str = "linkpage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `linkpage.toml`.
///
/// All fields have defaults; user files only specify what they override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Where the JSON data and icon files live, relative to the site directory.
    pub data: DataConfig,
    /// Section rendering settings.
    pub render: RenderConfig,
    /// Document-level settings not carried by `config.json`.
    pub page: PageConfig,
    /// Favicon generation settings.
    pub favicon: FaviconConfig,
    /// Client-side interaction timing.
    pub interaction: InteractionConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl BuildConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("data.links", &self.data.links),
            ("data.site", &self.data.site),
            ("data.icons", &self.data.icons),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.render.min_placeholders > 64 {
            return Err(ConfigError::Validation(
                "render.min_placeholders must be 0-64".into(),
            ));
        }
        if self.page.fallback_title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "page.fallback_title must not be empty".into(),
            ));
        }
        if !(16..=1024).contains(&self.favicon.png_size) {
            return Err(ConfigError::Validation(
                "favicon.png_size must be 16-1024".into(),
            ));
        }
        if !self.favicon.default_background.starts_with('#') {
            return Err(ConfigError::Validation(
                "favicon.default_background must be a hex color".into(),
            ));
        }
        if self.interaction.toast_ms == 0 {
            return Err(ConfigError::Validation(
                "interaction.toast_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Locations of the site's input files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Link catalog (`data.json`).
    pub links: String,
    /// Site configuration (`config.json`).
    pub site: String,
    /// Directory holding one `{name}.svg` per icon.
    pub icons: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            links: "assets/js/data.json".to_string(),
            site: "assets/js/config.json".to_string(),
            icons: "assets/img/icons".to_string(),
        }
    }
}

/// Order in which the icons of a section are fetched.
///
/// Results are always assembled in entry order; the policy only decides
/// whether fetches overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPolicy {
    /// One icon at a time, in entry order.
    #[default]
    Sequential,
    /// All icons of a section at once on the rayon pool.
    Concurrent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Minimum number of skeleton rows reserved while a section is built.
    pub min_placeholders: usize,
    pub fetch_policy: FetchPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_placeholders: 6,
            fetch_policy: FetchPolicy::Sequential,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Document title when `site.title` is absent.
    pub fallback_title: String,
    /// `lang` attribute of the `<html>` element.
    pub lang: String,
    /// Extra stylesheet URLs linked from the head, in order.
    pub stylesheets: Vec<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            fallback_title: "Links".to_string(),
            lang: "en".to_string(),
            stylesheets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaviconConfig {
    /// Background when `site.favicon.backgroundColor` is absent.
    pub default_background: String,
    /// Edge length of the PNG fallback icon, in pixels.
    pub png_size: u32,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            default_background: crate::types::DEFAULT_FAVICON_BACKGROUND.to_string(),
            png_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    /// How long the toast stays visible after a copy, in milliseconds.
    pub toast_ms: u64,
    /// Delay between consecutive card entrance animations, in milliseconds.
    pub stagger_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            toast_ms: 3000,
            stagger_ms: 100,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel icon fetch workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BuildConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `linkpage.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BuildConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the build config for a site directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(site_dir: &Path) -> Result<BuildConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(site_dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `linkpage.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# linkpage build configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Page content (title, profile, footer) lives in config.json, not here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Input files, relative to the site directory
# ---------------------------------------------------------------------------
[data]
# Link catalog: mainLinks, socialLinks, projects, affiliateLinks,
# sponsorsAffiliates, openSourceSoftware, books.
links = "assets/js/data.json"

# Site config: site, profile, footer.
site = "assets/js/config.json"

# One {name}.svg per icon. Missing icons render as a circle.
icons = "assets/img/icons"

# ---------------------------------------------------------------------------
# Section rendering
# ---------------------------------------------------------------------------
[render]
# Skeleton rows reserved per section while its cards are built.
min_placeholders = 6

# "sequential" fetches icons one by one; "concurrent" fetches a whole
# section at once. Output order is identical either way.
fetch_policy = "sequential"

# ---------------------------------------------------------------------------
# Document
# ---------------------------------------------------------------------------
[page]
# Used when config.json has no site.title.
fallback_title = "Links"

# <html lang="...">
lang = "en"

# Extra stylesheets linked from <head>, in order.
stylesheets = []

# ---------------------------------------------------------------------------
# Favicon
# ---------------------------------------------------------------------------
[favicon]
# Background when site.favicon.backgroundColor is not set.
default_background = "#667eea"

# Edge length of the PNG fallback icon.
png_size = 32

# ---------------------------------------------------------------------------
# Interaction timing
# ---------------------------------------------------------------------------
[interaction]
# Toast display time after a copy, in milliseconds.
toast_ms = 3000

# Delay between card entrance animations, in milliseconds.
stagger_ms = 100

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel icon fetch workers (concurrent policy only).
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_data_paths() {
        let config = BuildConfig::default();
        assert_eq!(config.data.links, "assets/js/data.json");
        assert_eq!(config.data.site, "assets/js/config.json");
        assert_eq!(config.data.icons, "assets/img/icons");
    }

    #[test]
    fn default_config_has_render_settings() {
        let config = BuildConfig::default();
        assert_eq!(config.render.min_placeholders, 6);
        assert_eq!(config.render.fetch_policy, FetchPolicy::Sequential);
        assert_eq!(config.interaction.toast_ms, 3000);
        assert_eq!(config.interaction.stagger_ms, 100);
        assert_eq!(config.favicon.default_background, "#667eea");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[render]
fetch_policy = "concurrent"
"#;
        let config: BuildConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.render.fetch_policy, FetchPolicy::Concurrent);
        // Defaults preserved
        assert_eq!(config.render.min_placeholders, 6);
        assert_eq!(config.page.fallback_title, "Links");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.data.links, "assets/js/data.json");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[data]
links = "links.json"

[interaction]
toast_ms = 1500
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.data.links, "links.json");
        assert_eq!(config.interaction.toast_ms, 1500);
        // Unspecified values should be defaults
        assert_eq!(config.data.site, "assets/js/config.json");
        assert_eq!(config.interaction.stagger_ms, 100);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<BuildConfig, _> = toml::from_str(
            r#"
[render]
min_placeholder = 6
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_fetch_policy_rejected() {
        let result: Result<BuildConfig, _> = toml::from_str(
            r#"
[render]
fetch_policy = "eager"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(BuildConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_toast() {
        let mut config = BuildConfig::default();
        config.interaction.toast_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("toast_ms"));
    }

    #[test]
    fn validate_rejects_png_size_out_of_range() {
        let mut config = BuildConfig::default();
        config.favicon.png_size = 8;
        assert!(config.validate().is_err());
        config.favicon.png_size = 2048;
        assert!(config.validate().is_err());
        config.favicon.png_size = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_paths() {
        let mut config = BuildConfig::default();
        config.data.icons = " ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("data.icons"));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[render]
min_placeholders = 500
"#,
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r#"
[render]
min_placeholders = 6
fetch_policy = "sequential"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[render]
fetch_policy = "concurrent"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let render = merged.get("render").unwrap();
        assert_eq!(render.get("fetch_policy").unwrap().as_str(), Some("concurrent"));
        assert_eq!(render.get("min_placeholders").unwrap().as_integer(), Some(6));
    }

    #[test]
    fn resolve_config_with_overlay() {
        let overlay: toml::Value = toml::from_str(
            r#"
[page]
stylesheets = ["https://cdn.example.com/site.css"]
"#,
        )
        .unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.page.stylesheets, vec!["https://cdn.example.com/site.css"]);
        assert_eq!(config.page.lang, "en");
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: BuildConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.render.min_placeholders, 6);
        assert_eq!(config.render.fetch_policy, FetchPolicy::Sequential);
        assert_eq!(config.favicon.png_size, 32);
        assert_eq!(config.interaction.toast_ms, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in [
            "[data]",
            "[render]",
            "[page]",
            "[favicon]",
            "[interaction]",
            "[processing]",
        ] {
            assert!(content.contains(section), "missing {section}");
        }
    }
}
