//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ColorChoice;
use crate::runner::Scenario;

/// Smokecheck: smoke scenarios for habr.com
#[derive(Parser, Debug)]
#[command(name = "smokecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures are printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Suite configuration file (YAML)
    #[arg(short, long, global = true, env = "SMOKECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run smoke scenarios against the site
    Run(RunArgs),

    /// List available scenarios
    List,

    /// Show the effective suite configuration
    Config,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenarios to run (default: all)
    #[arg(short, long, value_enum)]
    pub scenario: Vec<Scenario>,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Site under test
    #[arg(long)]
    pub base_url: Option<String>,

    /// Results directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Requested scenarios, all of them when none is named
    #[must_use]
    pub fn scenarios(&self) -> Vec<Scenario> {
        if self.scenario.is_empty() {
            Scenario::ALL.to_vec()
        } else {
            self.scenario.clone()
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults_to_all_scenarios() {
        let cli = Cli::parse_from(["smokecheck", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenarios(), Scenario::ALL.to_vec());
        assert!(!args.fail_fast);
        assert!(!args.headless);
    }

    #[test]
    fn test_run_with_scenarios() {
        let cli = Cli::parse_from([
            "smokecheck", "run", "-s", "login", "--scenario", "main-menu", "--fail-fast", "--headless",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenarios(), vec![Scenario::Login, Scenario::MainMenu]);
        assert!(args.fail_fast);
        assert!(args.headless);
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        assert!(Cli::try_parse_from(["smokecheck", "run", "-s", "footer"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["smokecheck", "-vv", "--color", "never", "list"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.color, ColorArg::Never));
        assert!(matches!(cli.command, Commands::List));

        let cli = Cli::parse_from(["smokecheck", "config", "--config", "suite.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("suite.yaml")));
    }
}
