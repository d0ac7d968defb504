//! Scenario runner
//!
//! Scenarios run sequentially on one session. A failed check is recorded and
//! the scenario keeps going; an error (malformed query, navigation timeout)
//! marks the scenario broken.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use smokecheck::steps::{LoginPageSteps, MainPageSteps};
use smokecheck::{
    FailureMode, ScenarioReport, Session, SmokeResult, TestStatus, Verification, VerificationSet,
};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// A runnable smoke scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Header, logo, content tabs, main content and footer
    MainPage,
    /// Open the main menu, check its options and services, close it
    MainMenu,
    /// Open the login modal and check its form, social block and captcha
    Login,
}

impl Scenario {
    /// Every scenario, in run order
    pub const ALL: [Self; 3] = [Self::MainPage, Self::MainMenu, Self::Login];

    /// Command-line name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainPage => "main-page",
            Self::MainMenu => "main-menu",
            Self::Login => "login",
        }
    }

    /// Human-readable title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::MainPage => "Main page elements are displayed",
            Self::MainMenu => "Main menu opens and closes",
            Self::Login => "Login modal is displayed",
        }
    }

    async fn run(self, session: &Session, checks: &mut Checks) -> SmokeResult<()> {
        match self {
            Self::MainPage => main_page(session, checks).await,
            Self::MainMenu => main_menu(session, checks).await,
            Self::Login => login(session, checks).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failed-check collector for one scenario
#[derive(Debug, Default)]
struct Checks {
    failures: Vec<String>,
}

impl Checks {
    fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.failures.push(message.into());
        }
    }

    fn visible(&mut self, v: &Verification) {
        self.check(v.visible, format!("{} should be visible", v.name));
    }

    fn clickable(&mut self, v: &Verification) {
        self.check(v.is_clickable(), format!("{} should be visible and enabled", v.name));
    }

    fn all_visible(&mut self, set: &VerificationSet, what: &str) {
        let missing = set.missing();
        self.check(
            missing.is_empty(),
            format!("{what} not visible: {}", missing.join(", ")),
        );
    }

    fn all_clickable(&mut self, set: &VerificationSet, what: &str) {
        let failed: Vec<&str> = set
            .iter()
            .filter(|v| !v.is_clickable())
            .map(|v| v.name.as_str())
            .collect();
        self.check(
            failed.is_empty(),
            format!("{what} not clickable: {}", failed.join(", ")),
        );
    }
}

async fn main_page(session: &Session, checks: &mut Checks) -> SmokeResult<()> {
    let steps = MainPageSteps::new(session);
    steps.navigate_to_main_page().await?;
    checks.visible(&steps.verify_header_container().await?);
    checks.visible(&steps.verify_logo_link().await?);
    checks.all_visible(&steps.verify_all_content_tabs().await?, "content tabs");
    checks.all_visible(&steps.verify_header_elements().await?, "header elements");
    checks.visible(&steps.verify_main_content_area().await?);
    checks.visible(&steps.verify_footer_section().await?);
    Ok(())
}

async fn main_menu(session: &Session, checks: &mut Checks) -> SmokeResult<()> {
    let steps = MainPageSteps::new(session);
    steps.navigate_to_main_page().await?;
    checks.clickable(&steps.verify_menu_button().await?);
    checks.check(steps.open_menu().await?, "menu panel did not open");
    checks.visible(&steps.verify_menu_panel_displayed().await?);
    checks.all_clickable(&steps.verify_menu_options().await?, "menu options");
    let services = steps.verify_services_section().await?;
    checks.visible(&services.header);
    checks.all_clickable(&services.links, "service links");
    steps.close_menu().await?;
    checks.check(
        steps.verify_menu_panel_hidden().await?,
        "menu panel should be hidden after closing",
    );
    Ok(())
}

async fn login(session: &Session, checks: &mut Checks) -> SmokeResult<()> {
    MainPageSteps::new(session).navigate_to_main_page().await?;
    let steps = LoginPageSteps::new(session);
    checks.clickable(&steps.verify_login_button().await?);
    steps.click_login_button().await?;
    checks.visible(&steps.verify_login_window_displayed().await?);

    let fields = steps.verify_login_form_fields().await?;
    checks.all_visible(&fields.labels, "login form labels");
    checks.clickable(&fields.email);
    checks.clickable(&fields.password);
    checks.all_clickable(&steps.verify_login_form_buttons().await?, "login form buttons");

    let social = steps.verify_social_login_options().await?;
    checks.visible(&social.block);
    checks.visible(&social.text);
    checks.all_clickable(&social.buttons, "social buttons");
    checks.all_visible(&social.icons, "social icons");

    let registration = steps.verify_registration_link().await?;
    checks.visible(&registration.text);
    checks.clickable(&registration.link);

    let captcha = steps.verify_captcha().await?;
    checks.visible(&captcha.container);
    checks.check(captcha.all_ok(), "captcha widget incomplete");
    Ok(())
}

/// Reports of a whole run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// One report per scenario that ran
    pub reports: Vec<ScenarioReport>,
    /// Scenarios skipped after a fail-fast stop
    pub skipped: Vec<String>,
    /// Total duration
    pub duration: Duration,
}

impl RunSummary {
    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    /// Number of failed or broken scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    /// Whether every scenario ran and passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && self.skipped.is_empty()
    }
}

/// Runs scenarios against one session
#[derive(Debug)]
pub struct ScenarioRunner<'a> {
    session: &'a Session,
    mode: FailureMode,
}

impl<'a> ScenarioRunner<'a> {
    /// Create a runner
    #[must_use]
    pub const fn new(session: &'a Session, mode: FailureMode) -> Self {
        Self { session, mode }
    }

    /// Run one scenario to a report
    pub async fn run_one(&self, scenario: Scenario) -> ScenarioReport {
        info!(scenario = scenario.name(), "starting scenario");
        self.session.step(scenario.title());
        let start = Instant::now();
        let mut checks = Checks::default();
        let status = match scenario.run(self.session, &mut checks).await {
            Ok(()) if checks.failures.is_empty() => TestStatus::Passed,
            Ok(()) => TestStatus::Failed,
            Err(e) => {
                error!(scenario = scenario.name(), error = %e, "scenario broken");
                checks.failures.push(e.to_string());
                TestStatus::Broken
            }
        };
        ScenarioReport {
            name: scenario.name().to_string(),
            status,
            failures: checks.failures,
            duration: start.elapsed(),
        }
    }

    /// Run scenarios in order, stopping early under [`FailureMode::AndonCord`]
    pub async fn run(&self, scenarios: &[Scenario]) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();
        for (i, scenario) in scenarios.iter().enumerate() {
            let report = self.run_one(*scenario).await;
            let stop = !report.passed() && self.mode == FailureMode::AndonCord;
            summary.reports.push(report);
            if stop {
                summary.skipped = scenarios[i + 1..].iter().map(|s| s.name().to_string()).collect();
                break;
            }
        }
        summary.duration = start.elapsed();
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use smokecheck::mock::{MockNode, MockPage};
    use smokecheck::pages::{CONTENT_TABS, HEADER_SELECTOR};
    use smokecheck::{EvidenceLog, SuiteConfig};
    use std::sync::Arc;

    fn page(with_footer: bool) -> MockPage {
        let header = MockNode::new("div").selector(HEADER_SELECTOR).children([
            MockNode::link("Хабр", "/"),
            MockNode::link("Все потоки", "/ru/feed/"),
            MockNode::link("Поиск", "/ru/search/"),
            MockNode::link("Написать публикацию", "/ru/sandbox/start/"),
            MockNode::button("Настройки"),
            MockNode::button("Войти"),
        ]);
        let mut nodes = vec![
            header,
            MockNode::new("main").children(CONTENT_TABS.iter().map(|t| MockNode::link(t.label, t.href))),
        ];
        if with_footer {
            nodes.push(MockNode::new("footer"));
        }
        MockPage::new(nodes)
    }

    fn session(page: MockPage) -> Session {
        Session::new(Arc::new(page), Arc::new(EvidenceLog::new()), SuiteConfig::default())
    }

    #[test]
    fn test_scenario_names() {
        let names: Vec<&str> = Scenario::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["main-page", "main-menu", "login"]);
        assert_eq!(Scenario::from_str("main-menu", true).unwrap(), Scenario::MainMenu);
        assert_eq!(Scenario::Login.to_string(), "login");
    }

    #[tokio::test(start_paused = true)]
    async fn test_main_page_passes() {
        let session = session(page(true));
        let report = ScenarioRunner::new(&session, FailureMode::CollectAll)
            .run_one(Scenario::MainPage)
            .await;
        assert_eq!(report.status, TestStatus::Passed, "{:?}", report.failures);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_footer_fails_with_message() {
        let session = session(page(false));
        let report = ScenarioRunner::new(&session, FailureMode::CollectAll)
            .run_one(Scenario::MainPage)
            .await;
        assert_eq!(report.status, TestStatus::Failed);
        assert_eq!(report.failures, vec!["footer_section should be visible".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_header_is_broken() {
        let session = session(MockPage::new(vec![MockNode::new("main")]));
        let report = ScenarioRunner::new(&session, FailureMode::CollectAll)
            .run_one(Scenario::MainPage)
            .await;
        assert_eq!(report.status, TestStatus::Broken);
        assert!(report.failures[0].contains("Timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_andon_cord_skips_the_rest() {
        let session = session(page(false));
        let summary = ScenarioRunner::new(&session, FailureMode::AndonCord)
            .run(&Scenario::ALL)
            .await;
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.skipped, vec!["main-menu", "login"]);
        assert!(!summary.all_passed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_all_runs_everything() {
        let session = session(page(true));
        let summary = ScenarioRunner::new(&session, FailureMode::CollectAll)
            .run(&Scenario::ALL)
            .await;
        assert_eq!(summary.reports.len(), 3);
        assert_eq!(summary.passed(), 1);
        // no menu button and no login modal on this page
        assert_eq!(summary.failed(), 2);
        assert!(summary.skipped.is_empty());
    }
}
