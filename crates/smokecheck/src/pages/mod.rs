//! Page objects for habr.com.

mod login_page;
mod main_page;

pub use login_page::{LoginPage, SocialProvider, CAPTCHA_CHECKBOX_SELECTORS, SOCIAL_PROVIDERS};
pub use main_page::{
    ContentTab, MainPage, ARTICLES_PATH, CONTENT_TABS, FEED_PATH, HEADER_SELECTOR, MENU_OPTIONS,
    SERVICES_HEADER, SERVICE_LINKS,
};
