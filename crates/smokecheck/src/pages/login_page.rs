//! Login modal: form, social sign-in, registration and the captcha widget.

use crate::locator::{ElementQuery, Strategy};
use crate::page_object::PageObject;

const MODAL_CONTAINERS: &str = "div[class*=\"modal\"], div[class*=\"dialog\"], div[class*=\"popup\"], form[class*=\"login\"], div[class*=\"auth\"]";
const CREDENTIALS_CONTAINER: &str = "div:has(input[type=\"email\"]):has(input[type=\"password\"])";

/// Selectors tried for the captcha checkbox, in order
pub const CAPTCHA_CHECKBOX_SELECTORS: [&str; 6] = [
    "div.CheckboxCaptcha-Checkbox",
    "div[class*=\"CheckboxCaptcha\"]",
    "div[class*=\"checkbox\"]",
    "span[role=\"checkbox\"]",
    "#checkbox-captcha",
    ".checkbox-captcha",
];

/// A social sign-in provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocialProvider {
    /// Display name
    pub name: &'static str,
    /// Lowercase key used in icon URLs and query names
    pub key: &'static str,
}

impl SocialProvider {
    /// Accessible name of the provider's button
    #[must_use]
    pub fn button_label(&self) -> String {
        format!("Войти с помощью {}", self.name)
    }
}

/// Providers offered by the modal, in display order
pub const SOCIAL_PROVIDERS: [SocialProvider; 6] = [
    SocialProvider {
        name: "GitHub",
        key: "github",
    },
    SocialProvider {
        name: "VK",
        key: "vk",
    },
    SocialProvider {
        name: "Google",
        key: "google",
    },
    SocialProvider {
        name: "Facebook",
        key: "facebook",
    },
    SocialProvider {
        name: "Twitter",
        key: "twitter",
    },
    SocialProvider {
        name: "Yandex",
        key: "yandex",
    },
];

fn modal_scope() -> Strategy {
    Strategy::css(MODAL_CONTAINERS).containing(Strategy::text("Войти"))
}

fn input(name: &str, label: &str, kind: &str) -> ElementQuery {
    ElementQuery::from_strategies(
        name,
        vec![
            Strategy::label(label),
            Strategy::css(format!("input[type=\"{kind}\"]")),
            Strategy::css(format!("input[name*=\"{kind}\"], input[id*=\"{kind}\"]")),
        ],
    )
    .first()
}

fn social_button_strategies(provider: &SocialProvider) -> Vec<Strategy> {
    vec![
        Strategy::role("button", provider.button_label()),
        Strategy::css("button, a").with_text(provider.name),
    ]
}

fn captcha_part(name: &str, selector: &str, frame: &ElementQuery) -> ElementQuery {
    ElementQuery::css(name, selector).first().in_frame(frame.clone())
}

/// Page object for the login modal
#[derive(Debug, Clone)]
pub struct LoginPage {
    /// Modal container
    pub modal: ElementQuery,
    /// "Вход"
    pub title: ElementQuery,
    /// "Email" label
    pub email_label: ElementQuery,
    /// "Пароль" label
    pub password_label: ElementQuery,
    /// Email input
    pub email_input: ElementQuery,
    /// Password input
    pub password_input: ElementQuery,
    /// Submit button
    pub submit_button: ElementQuery,
    /// "Забыли пароль?"
    pub forgot_password_link: ElementQuery,
    /// Social buttons block
    pub social_block: ElementQuery,
    /// "Или войдите с помощью других сервисов"
    pub social_text: ElementQuery,
    /// Provider buttons, in [`SOCIAL_PROVIDERS`] order
    pub social_buttons: Vec<ElementQuery>,
    /// Icons nested in the provider buttons, same order
    pub social_icons: Vec<ElementQuery>,
    /// "Ещё нет аккаунта?"
    pub registration_text: ElementQuery,
    /// "Зарегистрируйтесь"
    pub registration_link: ElementQuery,
    /// Captcha container
    pub captcha_container: ElementQuery,
    /// Captcha iframe
    pub captcha_iframe: ElementQuery,
    /// Checkbox inside the captcha frame
    pub captcha_checkbox: ElementQuery,
    /// Checkbox label inside the captcha frame
    pub captcha_title: ElementQuery,
    /// Checkbox description inside the captcha frame
    pub captcha_description: ElementQuery,
    /// Links block inside the captcha frame
    pub captcha_links: ElementQuery,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginPage {
    /// Build every query
    #[must_use]
    pub fn new() -> Self {
        let captcha = Strategy::test_id("smartCaptcha-container");
        let captcha_iframe =
            ElementQuery::new("captcha_iframe", Strategy::within(captcha.clone(), Strategy::css("iframe")))
                .first();

        let social_buttons = SOCIAL_PROVIDERS
            .iter()
            .map(|p| {
                ElementQuery::from_strategies(format!("social_{}", p.key), social_button_strategies(p))
                    .first()
            })
            .collect();
        let social_icons = SOCIAL_PROVIDERS
            .iter()
            .map(|p| {
                let icon = Strategy::css(format!(
                    "img[alt*=\"{}\"], img[src*=\"{}\"], svg, img",
                    p.name, p.key
                ));
                let strategies = social_button_strategies(p)
                    .into_iter()
                    .map(|button| Strategy::within(button, icon.clone()))
                    .collect();
                ElementQuery::from_strategies(format!("social_icon_{}", p.key), strategies).first()
            })
            .collect();

        Self {
            modal: ElementQuery::from_strategies(
                "login_modal",
                vec![modal_scope(), Strategy::css(CREDENTIALS_CONTAINER)],
            )
            .first(),
            title: ElementQuery::new("login_title", Strategy::exact_text("Вход")).first(),
            email_label: ElementQuery::new("email_label", Strategy::exact_text("Email")).first(),
            password_label: ElementQuery::new("password_label", Strategy::exact_text("Пароль")).first(),
            email_input: input("email_input", "Email", "email"),
            password_input: input("password_input", "Пароль", "password"),
            submit_button: ElementQuery::from_strategies(
                "login_submit_button",
                vec![
                    Strategy::within(modal_scope(), Strategy::role("button", "Войти")),
                    Strategy::within(
                        Strategy::css(CREDENTIALS_CONTAINER),
                        Strategy::role("button", "Войти"),
                    ),
                ],
            )
            .first(),
            forgot_password_link: ElementQuery::from_strategies(
                "forgot_password_link",
                vec![
                    Strategy::role("link", "Забыли пароль?"),
                    Strategy::text("Забыли пароль?"),
                ],
            )
            .first(),
            social_block: ElementQuery::css("social_buttons_block", "div.socials-buttons").first(),
            social_text: ElementQuery::from_strategies(
                "social_login_text",
                vec![
                    Strategy::text("Или войдите с помощью других сервисов"),
                    Strategy::text("войдите с помощью других сервисов"),
                ],
            )
            .first(),
            social_buttons,
            social_icons,
            registration_text: ElementQuery::new("registration_text", Strategy::text("Ещё нет аккаунта?"))
                .first(),
            registration_link: ElementQuery::from_strategies(
                "registration_link",
                vec![
                    Strategy::role("link", "Зарегистрируйтесь"),
                    Strategy::text("Зарегистрируйтесь"),
                ],
            )
            .first(),
            captcha_container: ElementQuery::new("captcha_container", captcha).first(),
            captcha_checkbox: ElementQuery::from_strategies(
                "captcha_checkbox",
                CAPTCHA_CHECKBOX_SELECTORS.iter().map(|s| Strategy::css(*s)).collect(),
            )
            .first()
            .in_frame(captcha_iframe.clone()),
            captcha_title: captcha_part("captcha_title", "span#checkbox-label", &captcha_iframe),
            captcha_description: captcha_part(
                "captcha_description",
                "span#checkbox-description",
                &captcha_iframe,
            ),
            captcha_links: captcha_part("captcha_links", "div.CaptchaLinks-Links", &captcha_iframe),
            captcha_iframe,
        }
    }

    /// Title and field labels
    #[must_use]
    pub fn labels(&self) -> Vec<&ElementQuery> {
        vec![&self.title, &self.email_label, &self.password_label]
    }

    /// Elements inside the captcha frame
    #[must_use]
    pub fn captcha_parts(&self) -> Vec<&ElementQuery> {
        vec![
            &self.captcha_checkbox,
            &self.captcha_title,
            &self.captcha_description,
            &self.captcha_links,
        ]
    }
}

impl PageObject for LoginPage {
    fn url_pattern(&self) -> &str {
        "habr.com"
    }

    fn ready_marker(&self) -> &ElementQuery {
        &self.modal
    }

    fn queries(&self) -> Vec<&ElementQuery> {
        let mut all = vec![&self.modal];
        all.extend(self.labels());
        all.extend([
            &self.email_input,
            &self.password_input,
            &self.submit_button,
            &self.forgot_password_link,
            &self.social_block,
            &self.social_text,
        ]);
        all.extend(&self.social_buttons);
        all.extend(&self.social_icons);
        all.extend([
            &self.registration_text,
            &self.registration_link,
            &self.captcha_container,
            &self.captcha_iframe,
        ]);
        all.extend(self.captcha_parts());
        all
    }

    fn load_timeout_ms(&self) -> u64 {
        10_000
    }

    fn page_name(&self) -> &str {
        "login modal"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_queries_are_well_formed() {
        let page = LoginPage::new();
        assert!(page.validate().is_ok());
        assert_eq!(page.social_buttons.len(), 6);
        assert_eq!(page.social_icons.len(), 6);
    }

    #[test]
    fn test_captcha_parts_live_in_the_frame() {
        let page = LoginPage::new();
        for part in page.captcha_parts() {
            assert_eq!(part.frame().map(ElementQuery::name), Some("captcha_iframe"));
        }
        assert!(page.captcha_iframe.frame().is_none());
        assert_eq!(
            page.captcha_checkbox.strategies().len(),
            CAPTCHA_CHECKBOX_SELECTORS.len()
        );
    }

    #[test]
    fn test_captcha_container_tolerates_duplicates() {
        let page = LoginPage::new();
        assert_eq!(page.captcha_container.pick(), Some(crate::locator::Pick::First));
    }

    #[test]
    fn test_input_fallback_order() {
        let page = LoginPage::new();
        let strategies = page.email_input.strategies();
        assert_eq!(strategies[0], Strategy::label("Email"));
        assert_eq!(strategies[1], Strategy::css("input[type=\"email\"]"));
        assert_eq!(
            strategies[2],
            Strategy::css("input[name*=\"email\"], input[id*=\"email\"]")
        );
    }

    #[test]
    fn test_icons_are_scoped_to_buttons() {
        let page = LoginPage::new();
        let github = &page.social_icons[0];
        assert_eq!(github.name(), "social_icon_github");
        assert!(github
            .strategies()
            .iter()
            .all(|s| matches!(s, Strategy::Within { .. })));
        assert_eq!(SOCIAL_PROVIDERS[0].button_label(), "Войти с помощью GitHub");
    }
}
