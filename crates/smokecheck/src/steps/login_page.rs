//! Steps over the login modal, including the captcha frame.

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::pages::{LoginPage, MainPage, SOCIAL_PROVIDERS};
use crate::result::SmokeResult;
use crate::session::Session;
use crate::verify::{EvidencePolicy, Expectations, Verification, VerificationSet};
use crate::wait::{Fallback, Signal, WaitOutcome, WaitSpec};

/// Nested icons get a shorter budget than their buttons
const ICON_TIMEOUT: Duration = Duration::from_millis(2000);

/// Title, labels and inputs of the login form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginFormFields {
    /// "Вход", "Email" and "Пароль"
    pub labels: VerificationSet,
    /// Email input, with enablement
    pub email: Verification,
    /// Password input, with enablement
    pub password: Verification,
}

impl LoginFormFields {
    /// Labels visible and both inputs usable
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.labels.all_visible() && self.email.is_clickable() && self.password.is_clickable()
    }
}

/// Social sign-in block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialLoginResults {
    /// `div.socials-buttons`
    pub block: Verification,
    /// Invitation text
    pub text: Verification,
    /// Provider buttons
    pub buttons: VerificationSet,
    /// Provider icons; not checked for buttons that were not visible
    pub icons: VerificationSet,
}

impl SocialLoginResults {
    /// Everything visible, every button clickable
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.block.visible && self.text.visible && self.buttons.all_clickable() && self.icons.all_visible()
    }
}

/// Registration prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationResults {
    /// "Ещё нет аккаунта?"
    pub text: Verification,
    /// "Зарегистрируйтесь"
    pub link: Verification,
}

impl RegistrationResults {
    /// Text visible and link clickable
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.text.visible && self.link.is_clickable()
    }
}

/// Captcha widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptchaResults {
    /// `smartCaptcha-container`
    pub container: Verification,
    /// Whether the iframe is attached
    pub iframe_attached: bool,
    /// Checkbox, title, description and links inside the frame
    pub parts: VerificationSet,
}

impl CaptchaResults {
    /// Whether the frame refused access to its document
    #[must_use]
    pub fn frame_unreachable(&self) -> bool {
        self.parts.iter().any(|p| p.frame_unreachable)
    }

    /// Container visible; in-frame parts visible unless the frame is closed
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.container.visible && self.parts.iter().all(|p| p.visible || p.frame_unreachable)
    }
}

/// Steps on the login modal
#[derive(Debug)]
pub struct LoginPageSteps<'a> {
    session: &'a Session,
    main: MainPage,
    login: LoginPage,
}

impl<'a> LoginPageSteps<'a> {
    /// Steps bound to a session
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            main: MainPage::new(),
            login: LoginPage::new(),
        }
    }

    /// The login page object
    #[must_use]
    pub const fn page(&self) -> &LoginPage {
        &self.login
    }

    fn visible(&self) -> Expectations {
        Expectations::visible().with_timeout(self.session.timeouts().element())
    }

    fn clickable(&self) -> Expectations {
        Expectations::clickable().with_timeout(self.session.timeouts().element())
    }

    /// Header login button, visible and enabled
    pub async fn verify_login_button(&self) -> SmokeResult<Verification> {
        self.session
            .verifier()
            .verify(&self.main.login_button, &self.clickable())
            .await
    }

    /// Click the login button and wait for the modal, then for the email
    /// input, then for the password input. Proceeds even when none shows up.
    pub async fn click_login_button(&self) -> SmokeResult<WaitOutcome> {
        self.session.step("Click login button and wait for modal to appear");
        self.session.locator().click(&self.main.login_button).await?;

        let modal_timeout = self.session.timeouts().modal();
        let spec = WaitSpec::new(Signal::visible(self.login.modal.clone()), modal_timeout)
            .with_fallbacks([
                Fallback::with_timeout(Signal::visible(self.login.email_input.clone()), modal_timeout),
                Fallback::with_timeout(Signal::visible(self.login.password_input.clone()), modal_timeout),
            ])
            .with_poll_interval(self.session.timeouts().poll_interval());
        let outcome = self.session.waiter().wait(&spec).await?;
        if outcome.satisfied {
            info!(by = ?outcome.satisfied_by, "login modal opened");
        } else {
            warn!("login modal did not appear, continuing");
        }
        self.session.verifier().capture_page("login_modal_opened").await;
        Ok(outcome)
    }

    /// Modal container; `login_modal_not_visible` on failure
    pub async fn verify_login_window_displayed(&self) -> SmokeResult<Verification> {
        self.session
            .verifier()
            .verify(&self.login.modal, &self.visible())
            .await
    }

    /// Title, labels and inputs
    pub async fn verify_login_form_fields(&self) -> SmokeResult<LoginFormFields> {
        self.session.step("Verify login form fields");
        let verifier = self.session.verifier();
        let labels = verifier.verify_all(self.login.labels(), &self.visible()).await?;
        let inputs = self.clickable().with_evidence(EvidencePolicy::failures_only());
        let email = verifier.verify(&self.login.email_input, &inputs).await?;
        let password = verifier.verify(&self.login.password_input, &inputs).await?;
        Ok(LoginFormFields {
            labels,
            email,
            password,
        })
    }

    /// Submit button and forgot-password link
    pub async fn verify_login_form_buttons(&self) -> SmokeResult<VerificationSet> {
        self.session.step("Verify login form buttons");
        self.session
            .verifier()
            .verify_all(
                [&self.login.submit_button, &self.login.forgot_password_link],
                &self.clickable(),
            )
            .await
    }

    /// Social block, text, provider buttons and their icons
    pub async fn verify_social_login_options(&self) -> SmokeResult<SocialLoginResults> {
        self.session.step("Verify social login options are displayed");
        let verifier = self.session.verifier();
        let block = verifier.verify(&self.login.social_block, &self.visible()).await?;
        let text = verifier.verify(&self.login.social_text, &self.visible()).await?;

        let button_expectations = self.clickable().with_evidence(EvidencePolicy::failures_only());
        let icon_expectations = Expectations::visible()
            .with_timeout(ICON_TIMEOUT)
            .with_evidence(EvidencePolicy::failures_only());
        let mut buttons = Vec::with_capacity(SOCIAL_PROVIDERS.len());
        let mut icons = Vec::with_capacity(SOCIAL_PROVIDERS.len());
        for (button, icon) in self.login.social_buttons.iter().zip(&self.login.social_icons) {
            let checked = verifier.verify(button, &button_expectations).await?;
            let icon_checked = if checked.visible {
                verifier.verify(icon, &icon_expectations).await?
            } else {
                Verification::absent(icon.name())
            };
            buttons.push(checked);
            icons.push(icon_checked);
        }
        Ok(SocialLoginResults {
            block,
            text,
            buttons: buttons.into_iter().collect(),
            icons: icons.into_iter().collect(),
        })
    }

    /// Registration text and link
    pub async fn verify_registration_link(&self) -> SmokeResult<RegistrationResults> {
        self.session.step("Verify registration link is displayed and clickable");
        let verifier = self.session.verifier();
        let text = verifier
            .verify(&self.login.registration_text, &self.visible())
            .await?;
        let link = verifier
            .verify(&self.login.registration_link, &self.clickable())
            .await?;
        Ok(RegistrationResults { text, link })
    }

    /// Captcha container, iframe and the parts inside the frame
    pub async fn verify_captcha(&self) -> SmokeResult<CaptchaResults> {
        self.session.step("Verify captcha container is displayed");
        let verifier = self.session.verifier();
        let container = verifier
            .verify(&self.login.captcha_container, &self.visible())
            .await?;
        let iframe_attached = self
            .session
            .locator()
            .observe(&self.login.captcha_iframe)
            .await?
            .exists();

        let parts = if container.visible && iframe_attached {
            let in_frame = Expectations::visible()
                .with_timeout(self.session.timeouts().frame_element())
                .with_evidence(EvidencePolicy::failures_only());
            verifier.verify_all(self.login.captcha_parts(), &in_frame).await?
        } else {
            self.login
                .captcha_parts()
                .into_iter()
                .map(|q| Verification::absent(q.name()))
                .collect()
        };
        let results = CaptchaResults {
            container,
            iframe_attached,
            parts,
        };
        if results.frame_unreachable() {
            warn!("captcha frame is not reachable, in-frame parts not verified");
        }
        Ok(results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::mock::{FramePolicy, MockFrame, MockNode, MockPage};
    use crate::pages::HEADER_SELECTOR;
    use crate::reporter::EvidenceLog;
    use std::sync::Arc;

    const MODAL: &str = "div[class*=\"modal\"]";

    fn modal(policy: FramePolicy) -> MockNode {
        let socials = SOCIAL_PROVIDERS.iter().map(|p| {
            MockNode::button(p.button_label()).child(
                MockNode::new("img").selector(format!("img[alt*=\"{}\"]", p.name)),
            )
        });
        MockNode::new("div").selector(MODAL).hidden().children([
            MockNode::new("h2").text("Вход"),
            MockNode::new("label").text("Email"),
            MockNode::new("input").label("Email").selector("input[type=\"email\"]"),
            MockNode::new("label").text("Пароль"),
            MockNode::new("input").label("Пароль").selector("input[type=\"password\"]"),
            MockNode::button("Войти"),
            MockNode::link("Забыли пароль?", "/auth/forgot"),
            MockNode::new("span").text("Или войдите с помощью других сервисов"),
            MockNode::new("div").selector("div.socials-buttons").children(socials),
            MockNode::new("span").text("Ещё нет аккаунта?"),
            MockNode::link("Зарегистрируйтесь", "/auth/register"),
            MockNode::new("div").test_id("smartCaptcha-container").child(
                MockNode::new("iframe").frame(MockFrame::new(
                    policy,
                    vec![
                        MockNode::new("div").selector("div.CheckboxCaptcha-Checkbox"),
                        MockNode::new("span").selector("span#checkbox-label").text("Я не робот"),
                        MockNode::new("span")
                            .selector("span#checkbox-description")
                            .text("Нажмите, чтобы продолжить"),
                        MockNode::new("div").selector("div.CaptchaLinks-Links"),
                    ],
                )),
            ),
        ])
    }

    fn habr(policy: FramePolicy) -> MockPage {
        MockPage::new(vec![
            MockNode::new("div")
                .selector(HEADER_SELECTOR)
                .child(MockNode::button("Войти").toggles(MODAL)),
            modal(policy),
        ])
    }

    fn session(page: MockPage) -> (Arc<EvidenceLog>, Session) {
        let log = Arc::new(EvidenceLog::new());
        let session = Session::new(Arc::new(page), log.clone(), SuiteConfig::default());
        (log, session)
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_flow_against_open_captcha() {
        let (log, session) = session(habr(FramePolicy::ContentDocumentOnly));
        let steps = LoginPageSteps::new(&session);

        assert!(steps.verify_login_button().await.unwrap().is_clickable());
        let opened = steps.click_login_button().await.unwrap();
        assert!(opened.satisfied);
        assert!(!opened.used_fallback());
        assert!(log.get("login_modal_opened").is_some());

        assert!(steps.verify_login_window_displayed().await.unwrap().visible);
        assert!(steps.verify_login_form_fields().await.unwrap().all_ok());
        assert!(steps.verify_login_form_buttons().await.unwrap().all_clickable());
        let social = steps.verify_social_login_options().await.unwrap();
        assert!(social.all_ok(), "{:?} {:?}", social.buttons.missing(), social.icons.missing());
        assert!(steps.verify_registration_link().await.unwrap().all_ok());

        let captcha = steps.verify_captcha().await.unwrap();
        assert!(captcha.iframe_attached);
        assert!(!captcha.frame_unreachable());
        assert!(captcha.parts.all_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cross_origin_captcha_is_not_a_failure() {
        let (_, session) = session(habr(FramePolicy::CrossOrigin));
        let steps = LoginPageSteps::new(&session);
        steps.click_login_button().await.unwrap();
        let captcha = steps.verify_captcha().await.unwrap();
        assert!(captcha.frame_unreachable());
        assert!(!captcha.parts.all_visible());
        assert!(captcha.all_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_modal_never_opens() {
        let (log, session) = session(MockPage::new(vec![MockNode::new("div")
            .selector(HEADER_SELECTOR)
            .child(MockNode::button("Войти"))]));
        let steps = LoginPageSteps::new(&session);
        let start = tokio::time::Instant::now();
        let outcome = steps.click_login_button().await.unwrap();
        assert!(!outcome.satisfied);
        assert_eq!(outcome.attempts.len(), 3);
        // 10s primary, two fallbacks capped at 6s
        assert!(start.elapsed() >= Duration::from_millis(22_000));
        assert!(log.get("login_modal_opened").is_some());

        let captcha = steps.verify_captcha().await.unwrap();
        assert!(!captcha.container.visible);
        assert_eq!(captcha.parts.len(), 4);
        assert!(!captcha.all_ok());
    }
}
