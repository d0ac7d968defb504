//! CLI configuration

use serde::{Deserialize, Serialize};
use smokecheck::{FailureMode, SuiteConfig};
use std::path::PathBuf;

use crate::error::CliResult;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - per-element logs
    Verbose,
    /// Debug - every strategy attempt
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default `tracing` filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "smokecheck=debug,info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// CLI configuration, layered over the suite configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Stop after the first failed scenario
    pub fail_fast: bool,
    /// YAML suite configuration
    pub config_file: Option<PathBuf>,
    /// Overrides the configured base URL
    pub base_url: Option<String>,
    /// Overrides headless mode
    pub headless: Option<bool>,
    /// Overrides the results directory
    pub output_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the YAML configuration file
    #[must_use]
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: Option<String>) -> Self {
        self.base_url = url;
        self
    }

    /// Override headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: Option<bool>) -> Self {
        self.headless = headless;
        self
    }

    /// Override the results directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Scenario failure handling
    #[must_use]
    pub const fn failure_mode(&self) -> FailureMode {
        if self.fail_fast {
            FailureMode::AndonCord
        } else {
            FailureMode::CollectAll
        }
    }

    /// File, then environment, then flags
    pub fn suite_config(&self) -> CliResult<SuiteConfig> {
        let mut suite = SuiteConfig::load(self.config_file.as_deref())?;
        self.apply_to(&mut suite);
        suite.validate()?;
        Ok(suite)
    }

    fn apply_to(&self, suite: &mut SuiteConfig) {
        if let Some(url) = &self.base_url {
            suite.base_url.clone_from(url);
        }
        if let Some(headless) = self.headless {
            suite.browser.headless = headless;
        }
        if let Some(dir) = &self.output_dir {
            suite.output_dir.clone_from(dir);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_verbosity_filters() {
        assert_eq!(Verbosity::Normal.filter_directive(), "info");
        assert_eq!(Verbosity::Debug.filter_directive(), "debug");
        assert!(Verbosity::Quiet.is_quiet());
        assert!(Verbosity::Verbose.is_verbose());
        assert!(!Verbosity::Normal.is_verbose());
    }

    #[test]
    fn test_color_choice() {
        assert!(ColorChoice::Always.should_color());
        assert!(!ColorChoice::Never.should_color());
    }

    #[test]
    fn test_failure_mode() {
        assert_eq!(CliConfig::new().failure_mode(), FailureMode::CollectAll);
        assert_eq!(
            CliConfig::new().with_fail_fast(true).failure_mode(),
            FailureMode::AndonCord
        );
    }

    #[test]
    fn test_flags_override_suite_config() {
        let mut suite = SuiteConfig::default();
        CliConfig::new()
            .with_base_url(Some("https://staging.habr.com".to_string()))
            .with_headless(Some(true))
            .with_output_dir(Some(PathBuf::from("out")))
            .apply_to(&mut suite);
        assert_eq!(suite.base_url, "https://staging.habr.com");
        assert!(suite.browser.headless);
        assert_eq!(suite.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_missing_flags_keep_suite_config() {
        let mut suite = SuiteConfig::default();
        CliConfig::new().apply_to(&mut suite);
        assert_eq!(suite.base_url, SuiteConfig::default().base_url);
        assert!(!suite.browser.headless);
    }

    #[test]
    fn test_suite_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeouts:\n  element_ms: 7000").unwrap();
        let suite = CliConfig::new()
            .with_config_file(Some(file.path().to_path_buf()))
            .with_base_url(Some("https://habr.com".to_string()))
            .suite_config()
            .unwrap();
        assert_eq!(suite.timeouts.element_ms, 7000);
        assert_eq!(suite.base_url, "https://habr.com");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = CliConfig::new()
            .with_base_url(Some("habr.com".to_string()))
            .suite_config()
            .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }
}
