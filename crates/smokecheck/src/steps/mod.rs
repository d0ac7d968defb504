//! Scenario steps over the page objects.
//!
//! Each step annotates the reporter, runs its verifications and returns
//! structured results; assertions are left to the scenario.

mod login_page;
mod main_page;

pub use login_page::{
    CaptchaResults, LoginFormFields, LoginPageSteps, RegistrationResults, SocialLoginResults,
};
pub use main_page::{MainPageSteps, ServicesSection};
