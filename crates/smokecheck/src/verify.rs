//! Verification facade.
//!
//! Composes waiting, resolution and evidence capture into structured
//! [`Verification`] results. Timeouts, missing elements and unreachable
//! frames become `false` fields; only malformed queries are returned as
//! errors.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::driver::{ElementRef, PageDriver};
use crate::engine::Locator;
use crate::locator::{ElementQuery, DEFAULT_TIMEOUT_MS};
use crate::reporter::{Attachment, Reporter};
use crate::result::SmokeResult;
use crate::wait::{Condition, Waiter, DEFAULT_POLL_INTERVAL_MS};

/// Which side of a verification produces evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidencePolicy {
    /// Screenshot the element when it is visible
    pub on_success: bool,
    /// Attach a text note when it is not
    pub on_failure: bool,
}

impl Default for EvidencePolicy {
    fn default() -> Self {
        Self {
            on_success: true,
            on_failure: true,
        }
    }
}

impl EvidencePolicy {
    /// Only failure notes, no screenshots
    #[must_use]
    pub const fn failures_only() -> Self {
        Self {
            on_success: false,
            on_failure: true,
        }
    }

    /// No evidence at all
    #[must_use]
    pub const fn none() -> Self {
        Self {
            on_success: false,
            on_failure: false,
        }
    }
}

/// What a verification checks and records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectations {
    /// How long to wait for visibility
    pub timeout: Duration,
    /// Also record whether the element is enabled
    pub check_enabled: bool,
    /// Evidence policy
    pub evidence: EvidencePolicy,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            check_enabled: false,
            evidence: EvidencePolicy::default(),
        }
    }
}

impl Expectations {
    /// Visibility with the default timeout
    #[must_use]
    pub fn visible() -> Self {
        Self::default()
    }

    /// Visibility plus enablement
    #[must_use]
    pub fn clickable() -> Self {
        Self::default().with_enabled_check()
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record enablement too
    #[must_use]
    pub const fn with_enabled_check(mut self) -> Self {
        self.check_enabled = true;
        self
    }

    /// Set evidence policy
    #[must_use]
    pub const fn with_evidence(mut self, evidence: EvidencePolicy) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Structured result for one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Query name
    pub name: String,
    /// Element was attached
    pub exists: bool,
    /// Element was rendered within the timeout
    pub visible: bool,
    /// Enablement, when requested
    pub enabled: Option<bool>,
    /// The embedding frame refused access
    pub frame_unreachable: bool,
    /// Matches of the winning strategy
    pub match_count: usize,
    /// Time the verification took
    pub elapsed: Duration,
}

impl Verification {
    /// Negative result for an element that was not checked
    #[must_use]
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: false,
            visible: false,
            enabled: None,
            frame_unreachable: false,
            match_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Visible and enabled
    #[must_use]
    pub fn is_clickable(&self) -> bool {
        self.visible && self.enabled == Some(true)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: exists={} visible={}",
            self.name, self.exists, self.visible
        )?;
        if let Some(enabled) = self.enabled {
            write!(f, " enabled={enabled}")?;
        }
        if self.frame_unreachable {
            write!(f, " (frame unreachable)")?;
        }
        Ok(())
    }
}

/// Ordered results for several elements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationSet {
    items: Vec<Verification>,
}

impl VerificationSet {
    /// Result by query name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Verification> {
        self.items.iter().find(|v| v.name == name)
    }

    /// Whether a named element is visible
    #[must_use]
    pub fn is_visible(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| v.visible)
    }

    /// Names of elements that were not visible
    #[must_use]
    pub fn missing(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|v| !v.visible)
            .map(|v| v.name.as_str())
            .collect()
    }

    /// Every element visible
    #[must_use]
    pub fn all_visible(&self) -> bool {
        self.items.iter().all(|v| v.visible)
    }

    /// Every element visible and enabled
    #[must_use]
    pub fn all_clickable(&self) -> bool {
        self.items.iter().all(Verification::is_clickable)
    }

    /// Results in query order
    pub fn iter(&self) -> impl Iterator<Item = &Verification> {
        self.items.iter()
    }

    /// Number of results
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Verification> for VerificationSet {
    fn from_iter<I: IntoIterator<Item = Verification>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Runs verifications and records evidence
#[derive(Clone, Copy)]
pub struct Verifier<'a> {
    driver: &'a dyn PageDriver,
    reporter: &'a dyn Reporter,
    poll_interval: Duration,
}

impl fmt::Debug for Verifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'a> Verifier<'a> {
    /// Create a verifier
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, reporter: &'a dyn Reporter) -> Self {
        Self {
            driver,
            reporter,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set polling interval for visibility waits
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn waiter(&self) -> Waiter<'a> {
        Waiter::new(self.driver).with_poll_interval(self.poll_interval)
    }

    /// Verify one element; failure evidence is named `<name>_not_visible`
    pub async fn verify(
        &self,
        query: &ElementQuery,
        expectations: &Expectations,
    ) -> SmokeResult<Verification> {
        let failure_note = format!("{}_not_visible", query.name());
        self.run(query, expectations, &failure_note).await
    }

    /// Verify every element independently; failure evidence is named
    /// `missing_<name>`
    ///
    /// Queries are validated up front and a malformed one fails the whole
    /// set. Errors that only show up against the live page, such as a strict
    /// query matching several nodes, become a negative result for that
    /// element and the rest of the set is still verified.
    pub async fn verify_all<'q>(
        &self,
        queries: impl IntoIterator<Item = &'q ElementQuery>,
        expectations: &Expectations,
    ) -> SmokeResult<VerificationSet> {
        let queries: Vec<&ElementQuery> = queries.into_iter().collect();
        for query in &queries {
            query.validate()?;
        }

        let mut items = Vec::with_capacity(queries.len());
        for query in queries {
            let failure_note = format!("missing_{}", query.name());
            let start = Instant::now();
            match self.run(query, expectations, &failure_note).await {
                Ok(verification) => items.push(verification),
                Err(e) => {
                    warn!(element = query.name(), error = %e, "verification failed");
                    if expectations.evidence.on_failure {
                        self.note(
                            &failure_note,
                            Attachment::Text(format!(
                                "Element '{}' could not be verified: {e}",
                                query.name()
                            )),
                        );
                    }
                    let mut verification = Verification::absent(query.name());
                    verification.elapsed = start.elapsed();
                    items.push(verification);
                }
            }
        }
        Ok(items.into_iter().collect())
    }

    /// Whether the element is hidden (or gone) within `timeout`
    pub async fn verify_hidden(&self, query: &ElementQuery, timeout: Duration) -> SmokeResult<bool> {
        self.reporter.step(&format!("Verify {} is hidden", query.name()));
        let hidden = self
            .waiter()
            .await_state(query, Condition::Hidden, timeout, &[])
            .await?;
        if !hidden {
            self.note(
                &format!("{}_still_visible", query.name()),
                Attachment::Text(format!(
                    "Element '{}' was still visible after {}ms",
                    query.name(),
                    timeout.as_millis()
                )),
            );
        }
        Ok(hidden)
    }

    async fn run(
        &self,
        query: &ElementQuery,
        expectations: &Expectations,
        failure_note: &str,
    ) -> SmokeResult<Verification> {
        let name = query.name();
        self.reporter.step(&format!("Verify {name}"));
        let start = Instant::now();

        self.waiter()
            .await_state(query, Condition::Visible, expectations.timeout, &[])
            .await?;
        let obs = Locator::new(self.driver)
            .with_poll_interval(self.poll_interval)
            .observe(query)
            .await?;

        let verification = Verification {
            name: name.to_string(),
            exists: obs.exists(),
            visible: obs.visible(),
            enabled: expectations.check_enabled.then(|| obs.enabled()),
            frame_unreachable: obs.resolution.is_frame_unreachable(),
            match_count: obs.match_count(),
            elapsed: start.elapsed(),
        };
        info!(
            element = name,
            visible = verification.visible,
            exists = verification.exists,
            "verified"
        );

        if verification.visible {
            if expectations.evidence.on_success {
                let element = obs.resolution.found().map(|r| &r.element);
                self.capture(name, element).await;
            }
        } else if expectations.evidence.on_failure {
            self.note(
                failure_note,
                Attachment::Text(format!(
                    "Element '{name}' was not visible within {}ms ({}, attached: {})",
                    expectations.timeout.as_millis(),
                    obs.resolution,
                    verification.exists
                )),
            );
        }
        Ok(verification)
    }

    /// Screenshot of the whole page; `<name>_screenshot_failed` on error
    pub async fn capture_page(&self, name: &str) {
        match self.driver.screenshot(None).await {
            Ok(shot) => self.note(name, Attachment::Png(shot.data)),
            Err(e) => {
                warn!(evidence = name, error = %e, "page screenshot failed");
                self.note(
                    &format!("{name}_screenshot_failed"),
                    Attachment::Text(format!("Screenshot failed: {e}")),
                );
            }
        }
    }

    /// Element screenshot with a page-screenshot fallback
    pub async fn capture(&self, name: &str, element: Option<&ElementRef>) {
        let Some(element) = element else {
            self.capture_page(name).await;
            return;
        };
        let err = match self.driver.screenshot(Some(element)).await {
            Ok(shot) => {
                self.note(name, Attachment::Png(shot.data));
                return;
            }
            Err(e) => e,
        };
        warn!(evidence = name, error = %err, "element screenshot failed, capturing page");
        match self.driver.screenshot(None).await {
            Ok(shot) => {
                self.note(&format!("{name}_page_fallback"), Attachment::Png(shot.data));
                self.note(
                    &format!("{name}_screenshot_info"),
                    Attachment::Text(format!(
                        "Element screenshot failed ({err}); attached a full-page screenshot instead"
                    )),
                );
            }
            Err(page_err) => self.note(
                &format!("{name}_screenshot_failed"),
                Attachment::Text(format!(
                    "Element screenshot failed ({err}); page screenshot failed ({page_err})"
                )),
            ),
        }
    }

    fn note(&self, name: &str, attachment: Attachment) {
        if let Err(e) = self.reporter.attach(name, attachment) {
            warn!(evidence = name, error = %e, "could not attach evidence");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locator::Strategy;
    use crate::mock::{FramePolicy, MockFrame, MockNode, MockPage, ScreenshotMode};
    use crate::reporter::EvidenceLog;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    mod verify_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_login_button_exists_visible_clickable() {
            let page = MockPage::new(vec![MockNode::button("Войти")]);
            let log = EvidenceLog::new();
            let verifier = Verifier::new(&page, &log);
            let query = ElementQuery::new("login_button", Strategy::role("button", "Войти"));
            let v = verifier.verify(&query, &Expectations::clickable()).await.unwrap();
            assert!(v.exists);
            assert!(v.visible);
            assert_eq!(v.enabled, Some(true));
            assert!(v.is_clickable());
            assert_eq!(log.names(), vec!["login_button"]);
            assert_eq!(log.steps(), vec!["Verify login_button"]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_element_is_negative_result() {
            let page = MockPage::new(Vec::new());
            let log = EvidenceLog::new();
            let verifier = Verifier::new(&page, &log);
            let query = ElementQuery::css("footer", "footer");
            let v = verifier
                .verify(&query, &Expectations::visible().with_timeout(ms(200)))
                .await
                .unwrap();
            assert!(!v.exists);
            assert!(!v.visible);
            assert!(v.enabled.is_none());
            let note = log.text("footer_not_visible").unwrap();
            assert!(note.contains("200ms"));
            assert!(note.contains("not found"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_but_attached() {
            let page = MockPage::new(vec![MockNode::new("div").selector("div.menu").hidden()]);
            let log = EvidenceLog::new();
            let v = Verifier::new(&page, &log)
                .verify(
                    &ElementQuery::css("menu", "div.menu"),
                    &Expectations::clickable().with_timeout(ms(100)),
                )
                .await
                .unwrap();
            assert!(v.exists);
            assert!(!v.visible);
            assert!(!v.is_clickable());
        }

        #[tokio::test(start_paused = true)]
        async fn test_cross_origin_frame_reads_as_not_visible() {
            let page = MockPage::new(vec![MockNode::new("iframe").frame(MockFrame::new(
                FramePolicy::CrossOrigin,
                vec![MockNode::new("span").selector("span#checkbox-label")],
            ))]);
            let log = EvidenceLog::new();
            let query = ElementQuery::css("checkbox_label", "span#checkbox-label")
                .in_frame(ElementQuery::css("captcha_frame", "iframe"));
            let v = Verifier::new(&page, &log)
                .verify(&query, &Expectations::visible().with_timeout(ms(100)))
                .await
                .unwrap();
            assert!(!v.visible);
            assert!(!v.exists);
            assert!(v.frame_unreachable);
        }

        #[tokio::test(start_paused = true)]
        async fn test_malformed_propagates() {
            let page = MockPage::new(Vec::new());
            let log = EvidenceLog::new();
            let err = Verifier::new(&page, &log)
                .verify(&ElementQuery::from_strategies("none", Vec::new()), &Expectations::visible())
                .await
                .unwrap_err();
            assert!(err.is_malformed());
        }
    }

    mod set_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_one_missing_tab_does_not_short_circuit() {
            let tabs = ["articles", "posts", "news", "hubs", "authors", "companies"];
            let nodes = tabs
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != 3)
                .map(|(_, t)| MockNode::new("a").selector(format!("a.tab-{t}")))
                .collect();
            let page = MockPage::new(nodes);
            let log = EvidenceLog::new();
            let queries: Vec<ElementQuery> = tabs
                .iter()
                .map(|t| ElementQuery::css(format!("tab_{t}"), format!("a.tab-{t}")))
                .collect();
            let set = Verifier::new(&page, &log)
                .verify_all(&queries, &Expectations::visible().with_timeout(ms(300)))
                .await
                .unwrap();
            assert_eq!(set.len(), 6);
            assert_eq!(set.iter().filter(|v| v.visible).count(), 5);
            assert_eq!(set.missing(), vec!["tab_hubs"]);
            assert!(!set.all_visible());
            assert!(set.is_visible("tab_companies"));
            assert!(log.text("missing_tab_hubs").is_some());
        }

        #[tokio::test(start_paused = true)]
        async fn test_ambiguous_element_does_not_abort_set() {
            let page = MockPage::new(vec![
                MockNode::new("div").selector("div.dup"),
                MockNode::new("div").selector("div.dup"),
                MockNode::new("footer"),
            ]);
            let log = EvidenceLog::new();
            let queries = [
                ElementQuery::css("dup", "div.dup"),
                ElementQuery::css("footer", "footer"),
            ];
            let set = Verifier::new(&page, &log)
                .verify_all(&queries, &Expectations::visible().with_timeout(ms(200)))
                .await
                .unwrap();
            assert_eq!(set.len(), 2);
            assert_eq!(set.missing(), vec!["dup"]);
            assert!(!set.get("dup").unwrap().exists);
            assert!(set.is_visible("footer"));
            let note = log.text("missing_dup").unwrap();
            assert!(note.contains("tie-break"));
            assert!(log.names().contains(&"footer".to_string()));
        }

        #[tokio::test(start_paused = true)]
        async fn test_malformed_query_fails_set_before_any_lookup() {
            let page = MockPage::new(vec![MockNode::new("footer")]);
            let log = EvidenceLog::new();
            let queries = [
                ElementQuery::css("footer", "footer"),
                ElementQuery::from_strategies("none", Vec::new()),
            ];
            let err = Verifier::new(&page, &log)
                .verify_all(&queries, &Expectations::visible())
                .await
                .unwrap_err();
            assert!(err.is_malformed());
            assert!(!page.was_called("count"));
            assert!(log.names().is_empty());
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_configured_poll_interval_drives_lookups() {
            let page = MockPage::new(Vec::new());
            let log = EvidenceLog::new();
            let query = ElementQuery::css("footer", "footer");
            let expectations = Expectations::visible()
                .with_timeout(ms(1000))
                .with_evidence(EvidencePolicy::none());

            Verifier::new(&page, &log)
                .with_poll_interval(ms(250))
                .verify(&query, &expectations)
                .await
                .unwrap();
            // checks at 0, 250, 500, 750 and 1000ms, then one observation
            assert_eq!(page.calls("count"), 6);

            let page = MockPage::new(Vec::new());
            Verifier::new(&page, &log)
                .verify(&query, &expectations)
                .await
                .unwrap();
            assert_eq!(page.calls("count"), 22);
        }
    }

    mod evidence_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_element_screenshot_falls_back_to_page() {
            let page = MockPage::new(vec![MockNode::new("main")])
                .with_screenshots(ScreenshotMode::ElementFails);
            let log = EvidenceLog::new();
            Verifier::new(&page, &log)
                .verify(&ElementQuery::css("main_content", "main"), &Expectations::visible())
                .await
                .unwrap();
            assert_eq!(
                log.names(),
                vec!["main_content_page_fallback", "main_content_screenshot_info"]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_all_screenshots_fail() {
            let page = MockPage::new(vec![MockNode::new("main")]).with_screenshots(ScreenshotMode::Fails);
            let log = EvidenceLog::new();
            let verifier = Verifier::new(&page, &log);
            verifier
                .verify(&ElementQuery::css("main_content", "main"), &Expectations::visible())
                .await
                .unwrap();
            verifier.capture_page("main_page_loaded").await;
            assert_eq!(
                log.names(),
                vec!["main_content_screenshot_failed", "main_page_loaded_screenshot_failed"]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_evidence_policy_none() {
            let page = MockPage::new(vec![MockNode::new("main")]);
            let log = EvidenceLog::new();
            Verifier::new(&page, &log)
                .verify(
                    &ElementQuery::css("main_content", "main"),
                    &Expectations::visible().with_evidence(EvidencePolicy::none()),
                )
                .await
                .unwrap();
            assert!(log.names().is_empty());
            assert!(!page.was_called("screenshot"));
        }
    }

    mod hidden_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_verify_hidden() {
            let page = MockPage::new(vec![MockNode::new("div").selector("div.panel")]);
            let log = EvidenceLog::new();
            let verifier = Verifier::new(&page, &log);
            let panel = ElementQuery::css("menu_panel", "div.panel");
            assert!(!verifier.verify_hidden(&panel, ms(200)).await.unwrap());
            assert!(log.text("menu_panel_still_visible").is_some());
            let gone = ElementQuery::css("gone", "div.gone");
            assert!(verifier.verify_hidden(&gone, ms(200)).await.unwrap());
        }
    }
}
