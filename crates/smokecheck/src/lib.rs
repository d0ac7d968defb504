//! Smokecheck: resilient element location and readiness waiting for
//! browser smoke suites.
//!
//! Pages of a live site re-render, lazy-load and embed third-party frames.
//! Smokecheck describes elements as ordered fallback strategies, waits on
//! layered readiness signals and turns every check into a structured result
//! with evidence attached, so a suite against `habr.com` keeps running past
//! a single missing element.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   SMOKECHECK Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Steps      │───►│ Verifier   │───►│ Reporter   │            │
//! │   │ (pages/)   │    │            │    │ (evidence) │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │                                     │
//! │              ┌────────────┼─────────────┐                       │
//! │              ▼            ▼             ▼                       │
//! │        ┌──────────┐ ┌──────────┐ ┌──────────────┐               │
//! │        │ Waiter   │ │ Locator  │ │ FrameAccessor│               │
//! │        └────┬─────┘ └────┬─────┘ └──────┬───────┘               │
//! │             └────────────┼──────────────┘                       │
//! │                          ▼                                      │
//! │                ┌───────────────────┐                            │
//! │                │ PageDriver        │                            │
//! │                │ CdpDriver/MockPage│                            │
//! │                └───────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use smokecheck::mock::{MockNode, MockPage};
//! use smokecheck::{ElementQuery, EvidenceLog, Expectations, Session, Strategy, SuiteConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let page = MockPage::new(vec![MockNode::button("Войти")]);
//! let log = Arc::new(EvidenceLog::new());
//! let session = Session::new(Arc::new(page), log.clone(), SuiteConfig::default());
//!
//! let login = ElementQuery::from_strategies(
//!     "login_button",
//!     vec![Strategy::css("button.tm-header-user-menu__login"), Strategy::role("button", "Войти")],
//! )
//! .first();
//! let result = session.verifier().verify(&login, &Expectations::clickable()).await.unwrap();
//! assert!(result.is_clickable());
//! assert!(log.get("login_button").is_some());
//! # });
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
pub mod config;
mod driver;
mod engine;
mod frame;
mod locator;
/// Scripted in-memory page for tests and examples
pub mod mock;
mod page_object;
/// Page objects for habr.com
pub mod pages;
mod reporter;
mod result;
mod session;
/// Scenario steps over the page objects
pub mod steps;
mod verify;
mod wait;

#[cfg(feature = "browser")]
pub use browser::CdpDriver;
pub use browser::{Rect, Reply, Request, INTERPRETER};
pub use config::{BrowserConfig, SuiteConfig, Timeouts};
pub use driver::{Context, ElementRef, ElementState, FrameAccess, PageDriver, Screenshot};
pub use engine::{Locator, Observation, Resolution, ResolvedElement};
pub use frame::FrameAccessor;
pub use locator::{ElementQuery, Pick, Strategy, DEFAULT_TIMEOUT_MS};
pub use page_object::PageObject;
pub use reporter::{
    Attachment, DirectoryReporter, Evidence, EvidenceIndex, EvidenceLog, FailureMode, Reporter,
    ScenarioReport, TestStatus, ENVIRONMENT_FILE, INDEX_FILE,
};
pub use result::{SmokeError, SmokeResult};
pub use session::Session;
pub use verify::{EvidencePolicy, Expectations, Verification, VerificationSet, Verifier};
pub use wait::{
    Condition, Fallback, LoadState, Signal, UrlPattern, WaitAttempt, WaitOutcome, WaitSpec, Waiter,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        Condition, ElementQuery, EvidencePolicy, Expectations, Fallback, LoadState, Locator,
        PageDriver, PageObject, Resolution, Session, Signal, SmokeError, SmokeResult, Strategy,
        SuiteConfig, Verification, VerificationSet, Verifier, WaitSpec, Waiter,
    };
}
