//! Suite configuration.
//!
//! Defaults describe a visible Chromium at 1920x1080 with a Russian locale
//! against `https://habr.com`. A YAML file can override any field, then the
//! `SMOKECHECK_*` environment variables override the file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::result::{SmokeError, SmokeResult};

/// Default target site
pub const DEFAULT_BASE_URL: &str = "https://habr.com";

/// Environment variable overriding [`SuiteConfig::base_url`]
pub const ENV_BASE_URL: &str = "SMOKECHECK_BASE_URL";
/// Environment variable overriding [`BrowserConfig::headless`]
pub const ENV_HEADLESS: &str = "SMOKECHECK_HEADLESS";
/// Environment variable overriding [`SuiteConfig::output_dir`]
pub const ENV_OUTPUT_DIR: &str = "SMOKECHECK_OUTPUT_DIR";
/// Environment variable overriding [`BrowserConfig::chromium_path`]
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Browser locale
    pub locale: String,
    /// Delay before each page action, in milliseconds
    pub slow_mo_ms: u64,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "ru-RU".to_string(),
            slow_mo_ms: 100,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Slow-motion delay
    #[must_use]
    pub const fn slow_mo(&self) -> Duration {
        Duration::from_millis(self.slow_mo_ms)
    }
}

/// Timeouts used by page objects and steps, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Header wait after navigation
    pub navigation_ms: u64,
    /// Load-state settling after navigation
    pub load_ms: u64,
    /// Element verification
    pub element_ms: u64,
    /// Elements inside embedded frames
    pub frame_element_ms: u64,
    /// Login modal appearance
    pub modal_ms: u64,
    /// Delay between polls
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            load_ms: 10_000,
            element_ms: 5_000,
            frame_element_ms: 15_000,
            modal_ms: 10_000,
            poll_interval_ms: 50,
        }
    }
}

impl Timeouts {
    /// Navigation timeout
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Load settling timeout
    #[must_use]
    pub const fn load(&self) -> Duration {
        Duration::from_millis(self.load_ms)
    }

    /// Element timeout
    #[must_use]
    pub const fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    /// In-frame element timeout
    #[must_use]
    pub const fn frame_element(&self) -> Duration {
        Duration::from_millis(self.frame_element_ms)
    }

    /// Modal timeout
    #[must_use]
    pub const fn modal(&self) -> Duration {
        Duration::from_millis(self.modal_ms)
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Complete suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Site under test
    pub base_url: String,
    /// Browser settings
    pub browser: BrowserConfig,
    /// Timeouts
    pub timeouts: Timeouts,
    /// Results directory
    pub output_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserConfig::default(),
            timeouts: Timeouts::default(),
            output_dir: PathBuf::from("reports/smokecheck-results"),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> SmokeResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SmokeError::ConfigError {
            message: format!("{key}: expected a boolean, got {other:?}"),
        }),
    }
}

impl SuiteConfig {
    /// Parse YAML
    pub fn from_yaml(text: &str) -> SmokeResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load from an optional YAML file, apply process environment, validate
    pub fn load(path: Option<&Path>) -> SmokeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SMOKECHECK_*` overrides from a lookup function
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> SmokeResult<()> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(headless) = lookup(ENV_HEADLESS) {
            self.browser.headless = parse_bool(ENV_HEADLESS, &headless)?;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH) {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Reject configurations no scenario can run with
    pub fn validate(&self) -> SmokeResult<()> {
        let fail = |message: String| Err(SmokeError::ConfigError { message });
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return fail(format!("base_url must be http(s), got {:?}", self.base_url));
        }
        let t = &self.timeouts;
        let named = [
            ("navigation_ms", t.navigation_ms),
            ("load_ms", t.load_ms),
            ("element_ms", t.element_ms),
            ("frame_element_ms", t.frame_element_ms),
            ("modal_ms", t.modal_ms),
            ("poll_interval_ms", t.poll_interval_ms),
        ];
        if let Some((name, _)) = named.iter().find(|(_, v)| *v == 0) {
            return fail(format!("timeouts.{name} must be positive"));
        }
        if t.poll_interval_ms >= t.element_ms {
            return fail("timeouts.poll_interval_ms must be below timeouts.element_ms".to_string());
        }
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return fail("browser viewport must be non-empty".to_string());
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// URL of a path on the site under test
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base(), path.trim_start_matches('/'))
    }

    /// Properties written to `environment.properties`
    #[must_use]
    pub fn environment_properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        props.insert("Base.URL".to_string(), self.base_url.clone());
        props.insert(
            "Browser".to_string(),
            if self.browser.headless {
                "Chromium (headless)".to_string()
            } else {
                "Chromium".to_string()
            },
        );
        props.insert("Browser.Locale".to_string(), self.browser.locale.clone());
        props.insert(
            "Browser.Viewport".to_string(),
            format!("{}x{}", self.browser.viewport_width, self.browser.viewport_height),
        );
        props.insert(
            "Platform".to_string(),
            format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        );
        props.insert(
            "Smokecheck".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        props
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_mirror_suite() {
        let config = SuiteConfig::default();
        assert_eq!(config.base_url, "https://habr.com");
        assert_eq!(config.browser.viewport_width, 1920);
        assert_eq!(config.browser.viewport_height, 1080);
        assert_eq!(config.browser.locale, "ru-RU");
        assert_eq!(config.browser.slow_mo(), Duration::from_millis(100));
        assert_eq!(config.timeouts.element(), Duration::from_millis(5000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SuiteConfig::from_yaml(
            "base_url: https://habr.example\nbrowser:\n  headless: true\ntimeouts:\n  element_ms: 2500\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "https://habr.example");
        assert!(config.browser.headless);
        assert_eq!(config.browser.locale, "ru-RU");
        assert_eq!(config.timeouts.element_ms, 2500);
        assert_eq!(config.timeouts.navigation_ms, 30_000);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://staging.habr.com"),
            (ENV_HEADLESS, "yes"),
            (ENV_OUTPUT_DIR, "/tmp/results"),
        ]
        .into_iter()
        .collect();
        let mut config = SuiteConfig::default();
        config
            .apply_env(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.base_url, "https://staging.habr.com");
        assert!(config.browser.headless);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/results"));
    }

    #[test]
    fn test_env_rejects_bad_bool() {
        let mut config = SuiteConfig::default();
        let err = config
            .apply_env(|k| (k == ENV_HEADLESS).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, SmokeError::ConfigError { .. }));
    }

    #[test]
    fn test_validation() {
        let mut config = SuiteConfig::default();
        config.timeouts.modal_ms = 0;
        assert!(config.validate().unwrap_err().to_string().contains("modal_ms"));

        let mut config = SuiteConfig::default();
        config.timeouts.poll_interval_ms = 5000;
        assert!(config.validate().is_err());

        let mut config = SuiteConfig::default();
        config.base_url = "habr.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_urls_and_properties() {
        let mut config = SuiteConfig::default();
        config.base_url = "https://habr.com/".into();
        assert_eq!(config.url("/ru/articles/"), "https://habr.com/ru/articles/");
        let props = config.environment_properties();
        assert_eq!(props["Browser.Viewport"], "1920x1080");
        assert_eq!(props["Base.URL"], "https://habr.com/");
        assert!(props.contains_key("Platform"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "timeouts:\n  load_ms: 4000\n").unwrap();
        let config = SuiteConfig::load(Some(tmp.path())).unwrap();
        assert_eq!(config.timeouts.load_ms, 4000);
    }
}
