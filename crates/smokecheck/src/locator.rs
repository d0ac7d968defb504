//! Element queries: immutable descriptions of how to find one element.
//!
//! A query carries an ordered list of [`Strategy`] values. Resolution tries
//! them in declaration order and stops at the first one that yields a usable
//! match; there is no scoring or merging across strategies.
//!
//! # Design Philosophy
//!
//! - **Strict Selection**: without a [`Pick`], more than one match is an error
//! - **Explicit Fallbacks**: alternatives are listed, not chained at runtime
//! - **Serializable**: strategies are shipped as JSON to the page interpreter

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{SmokeError, SmokeResult};

/// Default timeout for element verification (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// One way of finding elements in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// CSS selector (e.g., "div.tm-header__container")
    Css {
        /// Selector text
        selector: String,
    },
    /// ARIA role with an optional accessible name
    Role {
        /// Role name (button, link, checkbox, ...)
        role: String,
        /// Accessible name to match
        name: Option<String>,
        /// Require an exact name match instead of a substring
        exact: bool,
    },
    /// Element whose own text content matches
    Text {
        /// Text to match
        text: String,
        /// Exact (trimmed) match instead of a substring
        exact: bool,
    },
    /// Form control associated with a label
    Label {
        /// Label text
        text: String,
        /// Exact match instead of a substring
        exact: bool,
    },
    /// `data-testid` attribute
    TestId {
        /// Test id value
        id: String,
    },
    /// Elements of `base` that contain a text and/or a descendant
    Filter {
        /// Candidate elements
        base: Box<Strategy>,
        /// Substring the candidate's text must contain
        has_text: Option<String>,
        /// Descendant the candidate must contain
        has: Option<Box<Strategy>>,
    },
    /// Descendants of `scope` matching `inner`
    Within {
        /// Scoping elements
        scope: Box<Strategy>,
        /// Strategy evaluated under each scope element
        inner: Box<Strategy>,
    },
    /// Union of several strategies, deduplicated, in document order
    Any {
        /// Member strategies
        strategies: Vec<Strategy>,
    },
}

impl Strategy {
    /// Create a CSS strategy
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    /// Create a role strategy with a substring name match
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        }
    }

    /// Create a role strategy with an exact name match
    #[must_use]
    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: true,
        }
    }

    /// Create a role strategy matching any accessible name
    #[must_use]
    pub fn any_role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: None,
            exact: false,
        }
    }

    /// Create a substring text strategy
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Create an exact text strategy
    #[must_use]
    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: true,
        }
    }

    /// Create a label strategy
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label {
            text: text.into(),
            exact: false,
        }
    }

    /// Create a test id strategy
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId { id: id.into() }
    }

    /// Create a union strategy
    #[must_use]
    pub fn any(strategies: impl IntoIterator<Item = Strategy>) -> Self {
        Self::Any {
            strategies: strategies.into_iter().collect(),
        }
    }

    /// Descendants of `scope` matching `inner`
    #[must_use]
    pub fn within(scope: Strategy, inner: Strategy) -> Self {
        Self::Within {
            scope: Box::new(scope),
            inner: Box::new(inner),
        }
    }

    /// Keep only matches whose text contains `text`
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Filter { base, has, .. } => Self::Filter {
                base,
                has_text: Some(text.into()),
                has,
            },
            other => Self::Filter {
                base: Box::new(other),
                has_text: Some(text.into()),
                has: None,
            },
        }
    }

    /// Keep only matches that contain a descendant matching `inner`
    #[must_use]
    pub fn containing(self, inner: Strategy) -> Self {
        match self {
            Self::Filter { base, has_text, .. } => Self::Filter {
                base,
                has_text,
                has: Some(Box::new(inner)),
            },
            other => Self::Filter {
                base: Box::new(other),
                has_text: None,
                has: Some(Box::new(inner)),
            },
        }
    }

    /// Check the strategy can be evaluated at all
    pub fn validate(&self) -> Result<(), String> {
        fn non_empty(field: &str, value: &str) -> Result<(), String> {
            if value.trim().is_empty() {
                Err(format!("empty {field}"))
            } else {
                Ok(())
            }
        }

        match self {
            Self::Css { selector } => non_empty("CSS selector", selector),
            Self::Role { role, name, .. } => {
                non_empty("role", role)?;
                match name {
                    Some(name) => non_empty("accessible name", name),
                    None => Ok(()),
                }
            }
            Self::Text { text, .. } => non_empty("text", text),
            Self::Label { text, .. } => non_empty("label", text),
            Self::TestId { id } => non_empty("test id", id),
            Self::Filter {
                base,
                has_text,
                has,
            } => {
                base.validate()?;
                if has_text.is_none() && has.is_none() {
                    return Err("filter without text or descendant".to_string());
                }
                if let Some(text) = has_text {
                    non_empty("filter text", text)?;
                }
                match has {
                    Some(inner) => inner.validate(),
                    None => Ok(()),
                }
            }
            Self::Within { scope, inner } => {
                scope.validate()?;
                inner.validate()
            }
            Self::Any { strategies } => {
                if strategies.is_empty() {
                    return Err("empty union".to_string());
                }
                strategies.iter().try_for_each(Self::validate)
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css={selector:?}"),
            Self::Role { role, name, exact } => match name {
                Some(name) if *exact => write!(f, "role={role}[name={name:?}, exact]"),
                Some(name) => write!(f, "role={role}[name={name:?}]"),
                None => write!(f, "role={role}"),
            },
            Self::Text { text, exact: true } => write!(f, "text={text:?}, exact"),
            Self::Text { text, .. } => write!(f, "text={text:?}"),
            Self::Label { text, .. } => write!(f, "label={text:?}"),
            Self::TestId { id } => write!(f, "testid={id:?}"),
            Self::Filter {
                base,
                has_text,
                has,
            } => {
                write!(f, "{base}")?;
                if let Some(text) = has_text {
                    write!(f, " >> has-text={text:?}")?;
                }
                if let Some(inner) = has {
                    write!(f, " >> has=({inner})")?;
                }
                Ok(())
            }
            Self::Within { scope, inner } => write!(f, "{scope} >> {inner}"),
            Self::Any { strategies } => {
                let parts: Vec<String> = strategies.iter().map(ToString::to_string).collect();
                write!(f, "any({})", parts.join(" | "))
            }
        }
    }
}

/// Tie-break among several matches of the winning strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pick {
    /// First match in document order
    First,
    /// Last match in document order
    Last,
    /// Zero-based match index
    Nth(usize),
}

impl Pick {
    /// Index to use among `count` matches, if any is usable
    #[must_use]
    pub const fn select(self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        match self {
            Self::First => Some(0),
            Self::Last => Some(count - 1),
            Self::Nth(n) if n < count => Some(n),
            Self::Nth(_) => None,
        }
    }
}

/// Immutable description of one element on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementQuery {
    name: String,
    strategies: Vec<Strategy>,
    pick: Option<Pick>,
    frame: Option<Box<ElementQuery>>,
}

impl ElementQuery {
    /// Create a query with a single strategy
    #[must_use]
    pub fn new(name: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            strategies: vec![strategy],
            pick: None,
            frame: None,
        }
    }

    /// Create a query from an ordered strategy list
    #[must_use]
    pub fn from_strategies(name: impl Into<String>, strategies: Vec<Strategy>) -> Self {
        Self {
            name: name.into(),
            strategies,
            pick: None,
            frame: None,
        }
    }

    /// Shorthand for a single CSS strategy
    #[must_use]
    pub fn css(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::new(name, Strategy::css(selector))
    }

    /// Append a fallback strategy, tried after all earlier ones
    #[must_use]
    pub fn or(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Take the first match
    #[must_use]
    pub const fn first(mut self) -> Self {
        self.pick = Some(Pick::First);
        self
    }

    /// Take the last match
    #[must_use]
    pub const fn last(mut self) -> Self {
        self.pick = Some(Pick::Last);
        self
    }

    /// Take the n-th match (zero-based)
    #[must_use]
    pub const fn nth(mut self, n: usize) -> Self {
        self.pick = Some(Pick::Nth(n));
        self
    }

    /// Restrict every strategy to descendants of `scope`
    #[must_use]
    pub fn within(mut self, scope: &Strategy) -> Self {
        self.strategies = self
            .strategies
            .into_iter()
            .map(|inner| Strategy::within(scope.clone(), inner))
            .collect();
        self
    }

    /// Look the element up inside the document embedded by `frame`
    #[must_use]
    pub fn in_frame(mut self, frame: ElementQuery) -> Self {
        self.frame = Some(Box::new(frame));
        self
    }

    /// Query name, used in logs and evidence
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategies in evaluation order
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Tie-break, `None` for strict queries
    #[must_use]
    pub const fn pick(&self) -> Option<Pick> {
        self.pick
    }

    /// Embedding frame query, if any
    #[must_use]
    pub fn frame(&self) -> Option<&ElementQuery> {
        self.frame.as_deref()
    }

    /// The same query evaluated in the page instead of the frame
    #[must_use]
    pub fn without_frame(&self) -> Self {
        Self {
            frame: None,
            ..self.clone()
        }
    }

    /// Reject queries that cannot be evaluated
    pub fn validate(&self) -> SmokeResult<()> {
        if self.name.trim().is_empty() {
            return Err(SmokeError::malformed("<unnamed>", "query has no name"));
        }
        if self.strategies.is_empty() {
            return Err(SmokeError::malformed(&self.name, "no strategies"));
        }
        for (index, strategy) in self.strategies.iter().enumerate() {
            strategy
                .validate()
                .map_err(|reason| SmokeError::malformed(&self.name, format!("strategy {index}: {reason}")))?;
        }
        if let Some(frame) = &self.frame {
            if frame.frame.is_some() {
                return Err(SmokeError::malformed(
                    &self.name,
                    format!("frame '{}' is itself inside a frame", frame.name),
                ));
            }
            frame.validate()?;
        }
        Ok(())
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(frame) = &self.frame {
            write!(f, " in frame {}", frame.name)?;
        }
        Ok(())
    }
}
