//! Locator resolution engine.
//!
//! Turns an [`ElementQuery`] into a [`Resolution`] by trying its strategies
//! in declaration order against a [`PageDriver`]. The first strategy with a
//! usable match wins and later strategies are never evaluated.
//!
//! Failure categories:
//!
//! - **Malformed query** (`Err`): empty strategy list, empty selector,
//!   nested frame, rejected selector, ambiguous strict match
//! - **Not found**: no strategy produced a usable match
//! - **Frame unreachable**: the embedding frame could not be entered
//!
//! A driver error on a single strategy in the page document is logged and
//! counted as zero matches, so the next strategy still gets its turn.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::driver::{Context, ElementRef, ElementState, PageDriver};
use crate::frame::FrameAccessor;
use crate::locator::ElementQuery;
use crate::result::{SmokeError, SmokeResult};
use crate::wait::DEFAULT_POLL_INTERVAL_MS;

/// A query that matched, with the element it matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedElement {
    /// Query name
    pub query: String,
    /// Index of the winning strategy
    pub strategy_index: usize,
    /// Number of matches the winning strategy produced
    pub match_count: usize,
    /// Path to the selected match
    pub element: ElementRef,
}

/// Outcome of resolving a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A strategy produced a usable match
    Found(ResolvedElement),
    /// No strategy produced a usable match
    NotFound,
    /// The embedding frame refused access
    FrameUnreachable {
        /// Reason reported by the driver
        reason: String,
    },
}

impl Resolution {
    /// Whether an element was found
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The resolved element, if any
    #[must_use]
    pub const fn found(&self) -> Option<&ResolvedElement> {
        match self {
            Self::Found(resolved) => Some(resolved),
            _ => None,
        }
    }

    /// Whether the embedding frame was unreachable
    #[must_use]
    pub const fn is_frame_unreachable(&self) -> bool {
        matches!(self, Self::FrameUnreachable { .. })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(r) => write!(
                f,
                "found via strategy {} ({} match(es))",
                r.strategy_index, r.match_count
            ),
            Self::NotFound => write!(f, "not found"),
            Self::FrameUnreachable { reason } => write!(f, "frame unreachable: {reason}"),
        }
    }
}

/// Resolution plus the element state read right after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// How the query resolved
    pub resolution: Resolution,
    /// State of the resolved element, `None` if absent
    pub state: Option<ElementState>,
}

impl Observation {
    /// Element is attached
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.state.is_some()
    }

    /// Element is attached and rendered
    #[must_use]
    pub fn visible(&self) -> bool {
        self.state.is_some_and(|s| s.visible)
    }

    /// Element is attached and accepts interaction
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.state.is_some_and(|s| s.enabled)
    }

    /// Match count of the winning strategy, 0 when not found
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.resolution.found().map_or(0, |r| r.match_count)
    }
}

/// Resolves element queries against a driver
#[derive(Clone, Copy)]
pub struct Locator<'a> {
    driver: &'a dyn PageDriver,
    poll_interval: Duration,
}

impl fmt::Debug for Locator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'a> Locator<'a> {
    /// Create a locator over a driver
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self {
            driver,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set the polling interval used by [`Locator::resolve_within`]
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &'a dyn PageDriver {
        self.driver
    }

    /// Resolve a query once, without waiting
    pub async fn resolve(&self, query: &ElementQuery) -> SmokeResult<Resolution> {
        query.validate()?;
        match query.frame() {
            Some(frame) => {
                FrameAccessor::new(self.driver)
                    .resolve_in_frame(frame, &query.without_frame())
                    .await
            }
            None => self.resolve_in(&Context::Page, query).await,
        }
    }

    /// Resolve a query, polling until found or `timeout` elapses
    pub async fn resolve_within(
        &self,
        query: &ElementQuery,
        timeout: Duration,
    ) -> SmokeResult<Resolution> {
        let start = Instant::now();
        loop {
            let resolution = self.resolve(query).await?;
            let elapsed = start.elapsed();
            if resolution.is_found() || elapsed >= timeout {
                return Ok(resolution);
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Evaluate strategies of `query` in a single document.
    ///
    /// Ignores `query.frame()`; callers pass the context explicitly.
    /// Errors from frame contexts are returned so the accessor can classify
    /// them.
    pub(crate) async fn resolve_in(
        &self,
        context: &Context,
        query: &ElementQuery,
    ) -> SmokeResult<Resolution> {
        for (index, strategy) in query.strategies().iter().enumerate() {
            let count = match self.driver.count(context, strategy).await {
                Ok(count) => count,
                Err(SmokeError::InvalidSelector { selector, message }) => {
                    return Err(SmokeError::malformed(
                        query.name(),
                        format!("invalid selector {selector:?}: {message}"),
                    ));
                }
                Err(e) if e.is_frame_failure() || context.is_frame() => return Err(e),
                Err(e) => {
                    debug!(query = query.name(), %strategy, error = %e, "lookup failed, counting as no match");
                    0
                }
            };

            let selected = match query.pick() {
                Some(pick) => pick.select(count),
                None if count > 1 => {
                    return Err(SmokeError::malformed(
                        query.name(),
                        format!("{count} elements match {strategy}; state a tie-break"),
                    ));
                }
                None => (count == 1).then_some(0),
            };

            if let Some(selected) = selected {
                debug!(query = query.name(), %context, strategy_index = index, count, "resolved");
                return Ok(Resolution::Found(ResolvedElement {
                    query: query.name().to_string(),
                    strategy_index: index,
                    match_count: count,
                    element: ElementRef::new(context.clone(), strategy.clone(), selected),
                }));
            }
        }
        debug!(query = query.name(), %context, "no strategy matched");
        Ok(Resolution::NotFound)
    }

    /// Re-read the state of a resolved element, `None` if it went away
    pub async fn state(&self, resolved: &ResolvedElement) -> SmokeResult<Option<ElementState>> {
        match self.driver.state(&resolved.element).await {
            Ok(state) => Ok(state),
            Err(SmokeError::InvalidSelector { selector, message }) => Err(SmokeError::malformed(
                &resolved.query,
                format!("invalid selector {selector:?}: {message}"),
            )),
            Err(e) => {
                debug!(query = %resolved.query, error = %e, "state unavailable");
                Ok(None)
            }
        }
    }

    /// Resolve once and read the element state
    pub async fn observe(&self, query: &ElementQuery) -> SmokeResult<Observation> {
        let resolution = self.resolve(query).await?;
        let state = match &resolution {
            Resolution::Found(resolved) => self.state(resolved).await?,
            _ => None,
        };
        Ok(Observation { resolution, state })
    }

    /// Resolve and click
    pub async fn click(&self, query: &ElementQuery) -> SmokeResult<()> {
        let resolved = self.require_found(query).await?;
        self.driver.click(&resolved.element).await
    }

    /// Resolve and replace the input value
    pub async fn fill(&self, query: &ElementQuery, text: &str) -> SmokeResult<()> {
        let resolved = self.require_found(query).await?;
        self.driver.fill(&resolved.element, text).await
    }

    async fn require_found(&self, query: &ElementQuery) -> SmokeResult<ResolvedElement> {
        match self.resolve(query).await? {
            Resolution::Found(resolved) => Ok(resolved),
            _ => Err(SmokeError::ElementNotFound {
                query: query.name().to_string(),
            }),
        }
    }
}
