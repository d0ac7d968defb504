//! Steps over the habr.com main page and its menu.

use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::pages::MainPage;
use crate::result::SmokeResult;
use crate::session::Session;
use crate::verify::{EvidencePolicy, Expectations, Verification, VerificationSet};
use crate::wait::Condition;

/// "Все сервисы Хабра" block of the main menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicesSection {
    /// Section heading
    pub header: Verification,
    /// Service links
    pub links: VerificationSet,
}

impl ServicesSection {
    /// Heading visible and every link clickable
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.header.visible && self.links.all_clickable()
    }
}

/// Steps on the main page
#[derive(Debug)]
pub struct MainPageSteps<'a> {
    session: &'a Session,
    page: MainPage,
}

impl<'a> MainPageSteps<'a> {
    /// Steps bound to a session
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            page: MainPage::new(),
        }
    }

    /// The page object
    #[must_use]
    pub const fn page(&self) -> &MainPage {
        &self.page
    }

    fn element_timeout(&self) -> Duration {
        self.session.timeouts().element()
    }

    fn visible(&self) -> Expectations {
        Expectations::visible().with_timeout(self.element_timeout())
    }

    fn clickable(&self) -> Expectations {
        Expectations::clickable().with_timeout(self.element_timeout())
    }

    /// Open the site and attach `main_page_loaded`
    pub async fn navigate_to_main_page(&self) -> SmokeResult<String> {
        self.session.step("Navigate to main page");
        let url = self.page.open(self.session).await?;
        self.session.verifier().capture_page("main_page_loaded").await;
        info!(url = %url, "main page loaded");
        Ok(url)
    }

    /// Header container, screenshotted when visible
    pub async fn verify_header_container(&self) -> SmokeResult<Verification> {
        self.session
            .verifier()
            .verify(&self.page.header, &self.visible())
            .await
    }

    /// Logo link
    pub async fn verify_logo_link(&self) -> SmokeResult<Verification> {
        let expectations = self.visible().with_evidence(EvidencePolicy::failures_only());
        self.session
            .verifier()
            .verify(&self.page.logo, &expectations)
            .await
    }

    /// All six content tabs, each checked independently
    pub async fn verify_all_content_tabs(&self) -> SmokeResult<VerificationSet> {
        self.session.step("Verify all content tabs are present and visible");
        let expectations = self.visible().with_evidence(EvidencePolicy::failures_only());
        self.session
            .verifier()
            .verify_all(&self.page.tabs, &expectations)
            .await
    }

    /// Header links and buttons
    pub async fn verify_header_elements(&self) -> SmokeResult<VerificationSet> {
        self.session.step("Verify header elements are present and visible");
        let expectations = self.visible().with_evidence(EvidencePolicy::failures_only());
        self.session
            .verifier()
            .verify_all(self.page.header_controls(), &expectations)
            .await
    }

    /// Main content area
    pub async fn verify_main_content_area(&self) -> SmokeResult<Verification> {
        self.session
            .verifier()
            .verify(&self.page.main_content, &self.visible())
            .await
    }

    /// Footer, after scrolling to the bottom of the page
    pub async fn verify_footer_section(&self) -> SmokeResult<Verification> {
        self.session.step("Scroll to footer");
        self.session.driver().scroll_to_bottom().await?;
        self.session
            .verifier()
            .verify(&self.page.footer, &self.visible())
            .await
    }

    /// Menu button, visible and enabled
    pub async fn verify_menu_button(&self) -> SmokeResult<Verification> {
        self.session
            .verifier()
            .verify(&self.page.menu_button, &self.clickable())
            .await
    }

    /// Click the menu button and wait for the panel; `menu_opened` is attached
    pub async fn open_menu(&self) -> SmokeResult<bool> {
        self.session.step("Open the menu");
        self.session.locator().click(&self.page.menu_button).await?;
        let opened = self
            .session
            .waiter()
            .await_state(
                &self.page.menu_panel,
                Condition::Visible,
                self.element_timeout(),
                &[],
            )
            .await?;
        self.session.verifier().capture_page("menu_opened").await;
        Ok(opened)
    }

    /// Menu panel visible
    pub async fn verify_menu_panel_displayed(&self) -> SmokeResult<Verification> {
        self.session
            .verifier()
            .verify(&self.page.menu_panel, &self.visible())
            .await
    }

    /// Every menu option, visible and enabled
    pub async fn verify_menu_options(&self) -> SmokeResult<VerificationSet> {
        self.session.step("Verify main menu options are displayed");
        let expectations = self.clickable().with_evidence(EvidencePolicy::failures_only());
        self.session
            .verifier()
            .verify_all(&self.page.menu_options, &expectations)
            .await
    }

    /// Services heading and links
    pub async fn verify_services_section(&self) -> SmokeResult<ServicesSection> {
        self.session.step("Verify 'Все сервисы Хабра' section");
        let verifier = self.session.verifier();
        let header = verifier
            .verify(&self.page.services_header, &self.visible())
            .await?;
        let links = verifier
            .verify_all(
                &self.page.service_links,
                &self.clickable().with_evidence(EvidencePolicy::failures_only()),
            )
            .await?;
        Ok(ServicesSection { header, links })
    }

    /// Click the menu button again
    pub async fn close_menu(&self) -> SmokeResult<()> {
        self.session.step("Close the menu");
        self.session.locator().click(&self.page.menu_button).await
    }

    /// Menu panel hidden or gone
    pub async fn verify_menu_panel_hidden(&self) -> SmokeResult<bool> {
        self.session
            .verifier()
            .verify_hidden(&self.page.menu_panel, self.element_timeout())
            .await
    }
}
