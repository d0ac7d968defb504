//! Readiness waiter.
//!
//! Polls a primary [`Signal`] until it holds or its timeout elapses, then
//! tries each [`Fallback`] in order with a shorter sub-timeout. The first
//! satisfied signal ends the wait; later fallbacks are never attempted.
//!
//! Every poll checks before it sleeps, so waiting on a condition that
//! already holds returns immediately and has no side effects. Time is taken
//! from `tokio::time`, which lets tests drive the clock.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::driver::PageDriver;
use crate::engine::Locator;
use crate::locator::ElementQuery;
use crate::result::{SmokeError, SmokeResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Fallback sub-timeouts are capped at this share of the primary timeout
const FALLBACK_SHARE_NUM: u32 = 3;
const FALLBACK_SHARE_DEN: u32 = 5;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// `DOMContentLoaded` has fired
    DomContentLoaded,
    /// The `load` event has fired
    #[default]
    Load,
    /// No network activity for 500ms
    NetworkIdle,
}

impl LoadState {
    /// Get the event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::DomContentLoaded => "domcontentloaded",
            Self::Load => "load",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// SIGNALS
// =============================================================================

/// Element condition to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Resolved in the document
    Attached,
    /// Resolved and rendered
    Visible,
    /// Not resolved, or resolved but not rendered
    Hidden,
    /// Resolved and accepting interaction
    Enabled,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Enabled => "enabled",
        };
        write!(f, "{name}")
    }
}

/// Something a wait can be satisfied by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// An element condition
    Element {
        /// Element to observe
        query: ElementQuery,
        /// Condition it must meet
        condition: Condition,
    },
    /// A page load state
    Load(LoadState),
}

impl Signal {
    /// Element condition signal
    #[must_use]
    pub fn element(query: ElementQuery, condition: Condition) -> Self {
        Self::Element { query, condition }
    }

    /// Element visibility signal
    #[must_use]
    pub fn visible(query: ElementQuery) -> Self {
        Self::element(query, Condition::Visible)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element { query, condition } => write!(f, "{query} {condition}"),
            Self::Load(state) => write!(f, "load state {state}"),
        }
    }
}

/// Secondary signal tried after the primary times out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    /// Signal to wait for
    pub signal: Signal,
    /// Requested sub-timeout; capped, and defaulted, to 60% of the primary
    pub timeout: Option<Duration>,
}

impl Fallback {
    /// Fallback with the default sub-timeout
    #[must_use]
    pub const fn new(signal: Signal) -> Self {
        Self {
            signal,
            timeout: None,
        }
    }

    /// Fallback with a requested sub-timeout
    #[must_use]
    pub const fn with_timeout(signal: Signal, timeout: Duration) -> Self {
        Self {
            signal,
            timeout: Some(timeout),
        }
    }
}

// =============================================================================
// WAIT SPEC AND OUTCOME
// =============================================================================

/// Full description of one wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    /// Signal tried first
    pub primary: Signal,
    /// Timeout for the primary signal
    pub timeout: Duration,
    /// Signals tried in order after the primary times out
    pub fallbacks: Vec<Fallback>,
    /// Delay between polls
    pub poll_interval: Duration,
}

impl WaitSpec {
    /// Wait for `primary` for at most `timeout`
    #[must_use]
    pub const fn new(primary: Signal, timeout: Duration) -> Self {
        Self {
            primary,
            timeout,
            fallbacks: Vec::new(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Append a fallback
    #[must_use]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallbacks.push(fallback);
        self
    }

    /// Append several fallbacks
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: impl IntoIterator<Item = Fallback>) -> Self {
        self.fallbacks.extend(fallbacks);
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Longest sub-timeout any fallback may use
    #[must_use]
    pub fn fallback_cap(&self) -> Duration {
        self.timeout * FALLBACK_SHARE_NUM / FALLBACK_SHARE_DEN
    }

    /// Effective sub-timeout of a fallback
    #[must_use]
    pub fn fallback_timeout(&self, fallback: &Fallback) -> Duration {
        let cap = self.fallback_cap();
        fallback.timeout.map_or(cap, |t| t.min(cap))
    }
}

/// Record of one signal's wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitAttempt {
    /// Signal description
    pub signal: String,
    /// Timeout applied
    pub timeout: Duration,
    /// Whether it was satisfied
    pub satisfied: bool,
    /// Time spent on this signal
    pub elapsed: Duration,
    /// Number of checks performed
    pub polls: u32,
}

/// Result of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Whether any signal was satisfied
    pub satisfied: bool,
    /// Description of the signal that satisfied the wait
    pub satisfied_by: Option<String>,
    /// Total time spent
    pub elapsed: Duration,
    /// Attempts in the order they ran
    pub attempts: Vec<WaitAttempt>,
}

impl WaitOutcome {
    /// Whether a fallback, not the primary, satisfied the wait
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.satisfied && self.attempts.len() > 1
    }
}

// =============================================================================
// URL PATTERN
// =============================================================================

/// URL pattern for navigation checks
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(Regex),
}

impl UrlPattern {
    /// Compile a regex pattern
    pub fn regex(pattern: &str) -> SmokeResult<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| SmokeError::ConfigError {
                message: format!("invalid URL pattern {pattern:?}: {e}"),
            })
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern.as_str()),
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::Regex(re) => re.is_match(url),
        }
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Waits for readiness signals
#[derive(Clone, Copy)]
pub struct Waiter<'a> {
    locator: Locator<'a>,
    poll_interval: Duration,
}

impl fmt::Debug for Waiter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'a> Waiter<'a> {
    /// Create a waiter over a driver
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self {
            locator: Locator::new(driver),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set the polling interval used by waits this waiter builds itself
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.locator = self.locator.with_poll_interval(poll_interval);
        self.poll_interval = poll_interval;
        self
    }

    /// Spec for `primary` polled at this waiter's interval
    #[must_use]
    pub fn spec(&self, primary: Signal, timeout: Duration) -> WaitSpec {
        WaitSpec::new(primary, timeout).with_poll_interval(self.poll_interval)
    }

    /// Check a signal once
    pub async fn check(&self, signal: &Signal) -> SmokeResult<bool> {
        match signal {
            Signal::Element { query, condition } => {
                let obs = self.locator.observe(query).await?;
                Ok(match condition {
                    Condition::Attached => obs.exists(),
                    Condition::Visible => obs.visible(),
                    Condition::Hidden => !obs.visible(),
                    Condition::Enabled => obs.enabled(),
                })
            }
            Signal::Load(state) => match self.locator.driver().load_state_reached(*state).await {
                Ok(reached) => Ok(reached),
                Err(e) => {
                    debug!(%state, error = %e, "load state check failed");
                    Ok(false)
                }
            },
        }
    }

    async fn poll(
        &self,
        signal: &Signal,
        timeout: Duration,
        poll_interval: Duration,
    ) -> SmokeResult<WaitAttempt> {
        let start = Instant::now();
        let mut polls = 0;
        loop {
            polls += 1;
            let satisfied = self.check(signal).await?;
            let elapsed = start.elapsed();
            if satisfied || elapsed >= timeout {
                return Ok(WaitAttempt {
                    signal: signal.to_string(),
                    timeout,
                    satisfied,
                    elapsed,
                    polls,
                });
            }
            tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Wait for the primary signal, then each fallback in order
    pub async fn wait(&self, spec: &WaitSpec) -> SmokeResult<WaitOutcome> {
        let start = Instant::now();
        let mut attempts = Vec::with_capacity(1 + spec.fallbacks.len());

        let primary = self
            .poll(&spec.primary, spec.timeout, spec.poll_interval)
            .await?;
        let mut satisfied_by = primary.satisfied.then(|| primary.signal.clone());
        attempts.push(primary);

        if satisfied_by.is_none() {
            for fallback in &spec.fallbacks {
                let timeout = spec.fallback_timeout(fallback);
                warn!(
                    primary = %spec.primary,
                    fallback = %fallback.signal,
                    timeout_ms = timeout.as_millis() as u64,
                    "primary wait timed out, trying fallback"
                );
                let attempt = self
                    .poll(&fallback.signal, timeout, spec.poll_interval)
                    .await?;
                let done = attempt.satisfied;
                if done {
                    satisfied_by = Some(attempt.signal.clone());
                }
                attempts.push(attempt);
                if done {
                    break;
                }
            }
        }

        let outcome = WaitOutcome {
            satisfied: satisfied_by.is_some(),
            satisfied_by,
            elapsed: start.elapsed(),
            attempts,
        };
        debug!(
            signal = %spec.primary,
            satisfied = outcome.satisfied,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "wait finished"
        );
        Ok(outcome)
    }

    /// Wait for an element condition; `false` once every signal timed out
    pub async fn await_state(
        &self,
        query: &ElementQuery,
        condition: Condition,
        timeout: Duration,
        fallbacks: &[Fallback],
    ) -> SmokeResult<bool> {
        let spec = self
            .spec(Signal::element(query.clone(), condition), timeout)
            .with_fallbacks(fallbacks.iter().cloned());
        Ok(self.wait(&spec).await?.satisfied)
    }

    /// Wait that must succeed; a timeout becomes [`SmokeError::Timeout`]
    pub async fn require(&self, spec: &WaitSpec) -> SmokeResult<WaitOutcome> {
        let outcome = self.wait(spec).await?;
        if outcome.satisfied {
            Ok(outcome)
        } else {
            Err(SmokeError::Timeout {
                condition: spec.primary.to_string(),
                ms: spec.timeout.as_millis() as u64,
            })
        }
    }

    /// Wait for `load`, fall back to `networkidle`, then proceed regardless
    pub async fn settle_load(&self, timeout: Duration) -> SmokeResult<WaitOutcome> {
        let spec = self
            .spec(Signal::Load(LoadState::Load), timeout)
            .with_fallback(Fallback::new(Signal::Load(LoadState::NetworkIdle)));
        let outcome = self.wait(&spec).await?;
        if !outcome.satisfied {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "page never settled, proceeding anyway"
            );
        }
        Ok(outcome)
    }

    /// Wait until the current URL matches `pattern`
    pub async fn wait_for_url(
        &self,
        pattern: &UrlPattern,
        timeout: Duration,
        poll_interval: Duration,
    ) -> SmokeResult<bool> {
        let start = Instant::now();
        loop {
            if let Ok(url) = self.locator.driver().current_url().await {
                if pattern.matches(&url) {
                    return Ok(true);
                }
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
        }
    }
}
