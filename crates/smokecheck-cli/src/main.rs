//! Smokecheck CLI: smoke scenarios for habr.com
//!
//! ## Usage
//!
//! ```bash
//! smokecheck list                          # Show scenarios
//! smokecheck run                           # Run every scenario
//! smokecheck run -s login --headless       # One scenario, no window
//! smokecheck run --fail-fast -o results/   # Stop at the first failure
//! ```

use clap::Parser;
use smokecheck::{DirectoryReporter, PageDriver, Session, SmokeError, SuiteConfig};
use smokecheck_cli::{
    Cli, CliConfig, CliError, CliResult, Commands, ProgressReporter, RunArgs, Scenario,
    ScenarioRunner, Verbosity,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Run summary written next to the evidence
const SUMMARY_FILE: &str = "summary.json";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::Run(args) => run_scenarios(config, &args),
        Commands::List => {
            list_scenarios();
            Ok(())
        }
        Commands::Config => show_config(&config),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(cli.color.into())
        .with_config_file(cli.config.clone())
}

fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn list_scenarios() {
    for scenario in Scenario::ALL {
        println!("{:<10} {}", scenario.name(), scenario.title());
    }
}

fn show_config(config: &CliConfig) -> CliResult<()> {
    let suite = config.suite_config()?;
    let yaml = serde_yaml_ng::to_string(&suite)
        .map_err(|e| CliError::config(format!("cannot render configuration: {e}")))?;
    print!("{yaml}");
    Ok(())
}

fn run_scenarios(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = config
        .with_fail_fast(args.fail_fast)
        .with_base_url(args.base_url.clone())
        .with_headless(args.headless.then_some(true))
        .with_output_dir(args.output.clone());
    let suite = config.suite_config()?;
    let out = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let reporter = Arc::new(DirectoryReporter::create(suite.output_dir.clone())?);
    reporter.write_environment(&suite.environment_properties())?;
    out.info(&format!("Results: {}", reporter.dir().display()));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("failed to start async runtime: {e}")))?;
    let summary = rt.block_on(async {
        let driver = launch(&suite).await?;
        let session = Session::new(driver, reporter.clone(), suite.clone());
        out.header(&format!("Smoke scenarios against {}", suite.base()));
        let runner = ScenarioRunner::new(&session, config.failure_mode());
        let summary = runner.run(&args.scenarios()).await;
        for report in &summary.reports {
            out.scenario(report);
        }
        if let Err(e) = session.close().await {
            warn!(error = %e, "closing the browser failed");
        }
        info!(passed = summary.passed(), failed = summary.failed(), "run finished");
        Ok::<_, CliError>(summary)
    })?;

    reporter.flush()?;
    let json = serde_json::to_string_pretty(&summary).map_err(SmokeError::from)?;
    std::fs::write(reporter.dir().join(SUMMARY_FILE), json)?;
    out.summary(&summary);
    if summary.all_passed() {
        Ok(())
    } else {
        Err(CliError::scenario_failed(format!(
            "{} failed, {} skipped",
            summary.failed(),
            summary.skipped.len()
        )))
    }
}

#[cfg(feature = "browser")]
async fn launch(suite: &SuiteConfig) -> CliResult<Arc<dyn PageDriver>> {
    let driver = smokecheck::CdpDriver::launch(&suite.browser).await?;
    Ok(Arc::new(driver))
}

#[cfg(not(feature = "browser"))]
async fn launch(_suite: &SuiteConfig) -> CliResult<Arc<dyn PageDriver>> {
    Err(CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}
