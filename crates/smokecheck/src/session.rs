//! One browser page plus the evidence sink for a scenario.

use std::fmt;
use std::sync::Arc;

use crate::config::{SuiteConfig, Timeouts};
use crate::driver::PageDriver;
use crate::engine::Locator;
use crate::frame::FrameAccessor;
use crate::reporter::Reporter;
use crate::result::SmokeResult;
use crate::verify::Verifier;
use crate::wait::Waiter;

/// Driver, reporter and configuration shared by the steps of a scenario
#[derive(Clone)]
pub struct Session {
    driver: Arc<dyn PageDriver>,
    reporter: Arc<dyn Reporter>,
    config: SuiteConfig,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, reporter: Arc<dyn Reporter>, config: SuiteConfig) -> Self {
        Self {
            driver,
            reporter,
            config,
        }
    }

    /// The page driver
    #[must_use]
    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    /// The evidence sink
    #[must_use]
    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Configured timeouts
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.config.timeouts
    }

    /// Locator using the configured poll interval
    #[must_use]
    pub fn locator(&self) -> Locator<'_> {
        Locator::new(self.driver()).with_poll_interval(self.config.timeouts.poll_interval())
    }

    /// Readiness waiter using the configured poll interval
    #[must_use]
    pub fn waiter(&self) -> Waiter<'_> {
        Waiter::new(self.driver()).with_poll_interval(self.config.timeouts.poll_interval())
    }

    /// Verification facade reporting into this session's sink
    #[must_use]
    pub fn verifier(&self) -> Verifier<'_> {
        Verifier::new(self.driver(), self.reporter())
            .with_poll_interval(self.config.timeouts.poll_interval())
    }

    /// Cross-frame accessor
    #[must_use]
    pub fn frames(&self) -> FrameAccessor<'_> {
        FrameAccessor::new(self.driver())
    }

    /// Annotate a step
    pub fn step(&self, label: &str) {
        self.reporter.step(label);
    }

    /// Close the browser
    pub async fn close(&self) -> SmokeResult<()> {
        self.driver.close().await
    }
}
