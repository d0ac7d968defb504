//! Terminal output for scenario runs

use console::{style, Style, Term};
use smokecheck::{ScenarioReport, TestStatus};

use crate::runner::RunSummary;

/// Writes scenario results to stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one scenario result; failures are printed even in quiet mode
    pub fn scenario(&self, report: &ScenarioReport) {
        if report.passed() && self.quiet {
            return;
        }
        let _ = self.term.write_line(&self.format_scenario(report));
        for failure in &report.failures {
            let _ = self.term.write_line(&format!("    - {failure}"));
        }
    }

    fn format_scenario(&self, report: &ScenarioReport) -> String {
        let secs = report.duration.as_secs_f64();
        let label = match report.status {
            TestStatus::Passed => "PASS",
            TestStatus::Failed => "FAIL",
            TestStatus::Broken => "BROKEN",
        };
        if !self.use_color {
            return format!("{label} {} ({secs:.2}s)", report.name);
        }
        let mark = match report.status {
            TestStatus::Passed => style("✓").green().bold(),
            TestStatus::Failed => style("✗").red().bold(),
            TestStatus::Broken => style("!").yellow().bold(),
        };
        format!("{mark} {} ({secs:.2}s)", report.name)
    }

    /// Print the run summary
    pub fn summary(&self, summary: &RunSummary) {
        let failed = summary.failed();
        if self.quiet && failed == 0 {
            return;
        }
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&self.format_summary(summary));
    }

    fn format_summary(&self, summary: &RunSummary) -> String {
        let passed = summary.passed();
        let failed = summary.failed();
        let skipped = summary.skipped.len();
        let total = passed + failed + skipped;
        let secs = summary.duration.as_secs_f64();
        let verdict = if summary.all_passed() { "PASSED" } else { "FAILED" };
        if !self.use_color {
            return format!(
                "{verdict} {total} scenarios in {secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            );
        }
        let verdict_style = if summary.all_passed() {
            Style::new().green().bold()
        } else {
            Style::new().red().bold()
        };
        format!(
            "{} {total} scenarios in {secs:.2}s ({} passed, {} failed, {} skipped)",
            verdict_style.apply_to(verdict),
            Style::new().green().apply_to(passed),
            Style::new().red().apply_to(failed),
            Style::new().yellow().apply_to(skipped),
        )
    }
}
