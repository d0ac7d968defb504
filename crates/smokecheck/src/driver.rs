//! PageDriver - the automation-engine seam.
//!
//! Every browser interaction goes through [`PageDriver`]. Element handles
//! are never cached: an [`ElementRef`] is a path (context, strategy, index)
//! that the driver re-resolves on each call, so a node that re-rendered or
//! went away is observed as such instead of surfacing a stale handle.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait)                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐      ┌──────────────────────────┐ │
//! │  │  CdpDriver           │      │  MockPage                │ │
//! │  │  chromiumoxide, CDP  │      │  scripted DOM + timeline │ │
//! │  │  (feature: browser)  │      │  (unit tests)            │ │
//! │  └──────────────────────┘      └──────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::locator::Strategy;
use crate::result::SmokeResult;
use crate::wait::LoadState;

/// How a driver should enter an embedded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAccess {
    /// Engine-native frame scoping
    Direct,
    /// Explicit lookup through the frame element's content document
    ContentDocument,
}

impl fmt::Display for FrameAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::ContentDocument => write!(f, "content-document"),
        }
    }
}

/// Document in which a strategy is evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Context {
    /// The top-level page document
    Page,
    /// The document embedded by `owner`
    Frame {
        /// The iframe element
        owner: Box<ElementRef>,
        /// Access path into the frame
        access: FrameAccess,
    },
}

impl Context {
    /// Frame context for an owner element
    #[must_use]
    pub fn frame(owner: ElementRef, access: FrameAccess) -> Self {
        Self::Frame {
            owner: Box::new(owner),
            access,
        }
    }

    /// Whether this is a frame context
    #[must_use]
    pub const fn is_frame(&self) -> bool {
        matches!(self, Self::Frame { .. })
    }

    /// Owner element of a frame reached through its own execution context
    #[must_use]
    pub fn direct_owner(&self) -> Option<&ElementRef> {
        match self {
            Self::Frame {
                owner,
                access: FrameAccess::Direct,
            } => Some(owner.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Frame { access, .. } => write!(f, "frame({access})"),
        }
    }
}

/// Re-resolvable reference to one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    /// Document the strategy is evaluated in
    pub context: Context,
    /// Strategy that produced the match
    pub strategy: Strategy,
    /// Index among the strategy's matches, in document order
    pub index: usize,
}

impl ElementRef {
    /// Create an element reference
    #[must_use]
    pub const fn new(context: Context, strategy: Strategy, index: usize) -> Self {
        Self {
            context,
            strategy,
            index,
        }
    }

    /// The same element addressed from inside its own document
    #[must_use]
    pub fn in_own_document(&self) -> Self {
        Self::new(Context::Page, self.strategy.clone(), self.index)
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.context, self.strategy, self.index)
    }
}

/// Observable state of an attached element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementState {
    /// Rendered and not hidden
    pub visible: bool,
    /// Accepts interaction
    pub enabled: bool,
}

impl ElementState {
    /// Create an element state
    #[must_use]
    pub const fn new(visible: bool, enabled: bool) -> Self {
        Self { visible, enabled }
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// When the screenshot was taken
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot is valid (has data)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Abstract automation engine.
///
/// Implementations report permanent frame conditions with
/// [`SmokeError::FrameDetached`](crate::SmokeError::FrameDetached),
/// [`SmokeError::FrameUnreachable`](crate::SmokeError::FrameUnreachable) and
/// [`SmokeError::Unsupported`](crate::SmokeError::Unsupported); a rejected
/// selector is [`SmokeError::InvalidSelector`](crate::SmokeError::InvalidSelector).
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Number of elements matching `strategy` in `context`
    async fn count(&self, context: &Context, strategy: &Strategy) -> SmokeResult<usize>;

    /// Current state of the referenced element, `None` if it is gone
    async fn state(&self, element: &ElementRef) -> SmokeResult<Option<ElementState>>;

    /// Click the referenced element
    async fn click(&self, element: &ElementRef) -> SmokeResult<()>;

    /// Replace the value of the referenced input
    async fn fill(&self, element: &ElementRef, text: &str) -> SmokeResult<()>;

    /// Screenshot of one element, or of the page when `element` is `None`
    async fn screenshot(&self, element: Option<&ElementRef>) -> SmokeResult<Screenshot>;

    /// Navigate to URL
    async fn navigate(&self, url: &str) -> SmokeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> SmokeResult<String>;

    /// Whether the page has reached a load state
    async fn load_state_reached(&self, state: LoadState) -> SmokeResult<bool>;

    /// Scroll the page to the bottom
    async fn scroll_to_bottom(&self) -> SmokeResult<()>;

    /// Close the browser
    async fn close(&self) -> SmokeResult<()>;
}

#[async_trait]
impl<T: PageDriver + ?Sized> PageDriver for Arc<T> {
    async fn count(&self, context: &Context, strategy: &Strategy) -> SmokeResult<usize> {
        (**self).count(context, strategy).await
    }

    async fn state(&self, element: &ElementRef) -> SmokeResult<Option<ElementState>> {
        (**self).state(element).await
    }

    async fn click(&self, element: &ElementRef) -> SmokeResult<()> {
        (**self).click(element).await
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> SmokeResult<()> {
        (**self).fill(element, text).await
    }

    async fn screenshot(&self, element: Option<&ElementRef>) -> SmokeResult<Screenshot> {
        (**self).screenshot(element).await
    }

    async fn navigate(&self, url: &str) -> SmokeResult<()> {
        (**self).navigate(url).await
    }

    async fn current_url(&self) -> SmokeResult<String> {
        (**self).current_url().await
    }

    async fn load_state_reached(&self, state: LoadState) -> SmokeResult<bool> {
        (**self).load_state_reached(state).await
    }

    async fn scroll_to_bottom(&self) -> SmokeResult<()> {
        (**self).scroll_to_bottom().await
    }

    async fn close(&self) -> SmokeResult<()> {
        (**self).close().await
    }
}
