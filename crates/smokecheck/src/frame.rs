//! Cross-frame accessor.
//!
//! Reaches elements inside an embedded document (the captcha widget on the
//! login modal). The owner iframe is resolved on the page, then the inner
//! query is tried through the engine's native frame scoping and, if that
//! path errors, through the frame element's content document.
//!
//! Permanent frame conditions never escape as errors: a detached frame is
//! reported as [`Resolution::NotFound`], a cross-origin or otherwise closed
//! frame as [`Resolution::FrameUnreachable`]. Nothing is cached between
//! calls; the owner is re-resolved every time.

use std::fmt;
use tracing::{debug, warn};

use crate::driver::{Context, FrameAccess, PageDriver};
use crate::engine::{Locator, Resolution};
use crate::locator::ElementQuery;
use crate::result::{SmokeError, SmokeResult};

/// Resolves queries inside embedded documents
#[derive(Clone, Copy)]
pub struct FrameAccessor<'a> {
    locator: Locator<'a>,
}

impl fmt::Debug for FrameAccessor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameAccessor").finish_non_exhaustive()
    }
}

impl<'a> FrameAccessor<'a> {
    /// Create an accessor over a driver
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self {
            locator: Locator::new(driver),
        }
    }

    /// Resolve `inner` inside the document embedded by `outer`
    pub async fn resolve_in_frame(
        &self,
        outer: &ElementQuery,
        inner: &ElementQuery,
    ) -> SmokeResult<Resolution> {
        outer.validate()?;
        inner.validate()?;
        if outer.frame().is_some() {
            return Err(SmokeError::malformed(
                inner.name(),
                format!("frame '{}' is itself inside a frame", outer.name()),
            ));
        }

        let owner = match self.locator.resolve_in(&Context::Page, outer).await? {
            Resolution::Found(resolved) => resolved.element,
            other => {
                debug!(frame = outer.name(), query = inner.name(), "frame element not found");
                return Ok(other);
            }
        };

        let direct = Context::frame(owner.clone(), FrameAccess::Direct);
        match self.locator.resolve_in(&direct, inner).await {
            Ok(resolution) => return Ok(resolution),
            Err(e) if e.is_malformed() => return Err(e),
            Err(e) => {
                debug!(frame = outer.name(), query = inner.name(), error = %e, "direct frame access failed, trying content document");
            }
        }

        let content = Context::frame(owner, FrameAccess::ContentDocument);
        match self.locator.resolve_in(&content, inner).await {
            Ok(resolution) => Ok(resolution),
            Err(e) if e.is_malformed() => Err(e),
            Err(SmokeError::FrameDetached) => {
                debug!(frame = outer.name(), query = inner.name(), "frame detached during lookup");
                Ok(Resolution::NotFound)
            }
            Err(e) => {
                warn!(frame = outer.name(), query = inner.name(), error = %e, "frame unreachable");
                Ok(Resolution::FrameUnreachable {
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locator::Strategy;
    use crate::mock::{FramePolicy, MockFrame, MockNode, MockPage};

    fn captcha_page(policy: FramePolicy) -> MockPage {
        MockPage::new(vec![MockNode::new("div")
            .test_id("smartCaptcha-container")
            .child(MockNode::new("iframe").frame(MockFrame::new(
                policy,
                vec![MockNode::new("span")
                    .selector("span#checkbox-label")
                    .text("Я не робот")],
            )))])
    }

    fn outer() -> ElementQuery {
        ElementQuery::new(
            "captcha_frame",
            Strategy::within(Strategy::test_id("smartCaptcha-container"), Strategy::css("iframe")),
        )
    }

    fn inner() -> ElementQuery {
        ElementQuery::css("checkbox_label", "span#checkbox-label")
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_access_used_first() {
        let page = captcha_page(FramePolicy::Open);
        let res = FrameAccessor::new(&page)
            .resolve_in_frame(&outer(), &inner())
            .await
            .unwrap();
        assert!(res.is_found());
        assert!(!page.was_called("count:frame(content-document)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_content_document() {
        let page = captcha_page(FramePolicy::ContentDocumentOnly);
        let res = FrameAccessor::new(&page)
            .resolve_in_frame(&outer(), &inner())
            .await
            .unwrap();
        let found = res.found().unwrap();
        assert!(matches!(
            found.element.context,
            Context::Frame {
                access: FrameAccess::ContentDocument,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cross_origin_is_unreachable_not_error() {
        let page = captcha_page(FramePolicy::CrossOrigin);
        let res = FrameAccessor::new(&page)
            .resolve_in_frame(&outer(), &inner())
            .await
            .unwrap();
        assert!(res.is_frame_unreachable());
        assert!(!res.is_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_frame_is_not_found() {
        let page = MockPage::new(Vec::new());
        let res = FrameAccessor::new(&page)
            .resolve_in_frame(&outer(), &inner())
            .await
            .unwrap();
        assert_eq!(res, Resolution::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_removed_before_inner_lookup_is_not_found() {
        let page = MockPage::new(vec![MockNode::new("iframe")
            .vanishes_after_lookups(1)
            .frame(MockFrame::new(
                FramePolicy::Open,
                vec![MockNode::new("span").selector("span#checkbox-label")],
            ))]);
        let res = FrameAccessor::new(&page)
            .resolve_in_frame(&ElementQuery::css("captcha_frame", "iframe"), &inner())
            .await
            .unwrap();
        assert_eq!(res, Resolution::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_miss_inside_reachable_frame() {
        let page = captcha_page(FramePolicy::Open);
        let res = FrameAccessor::new(&page)
            .resolve_in_frame(&outer(), &ElementQuery::css("links", "div.CaptchaLinks-Links"))
            .await
            .unwrap();
        assert_eq!(res, Resolution::NotFound);
        // a clean miss through direct access does not retry via content document
        assert!(!page.was_called("count:frame(content-document)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_inner_propagates() {
        let page = captcha_page(FramePolicy::Open);
        let err = FrameAccessor::new(&page)
            .resolve_in_frame(&outer(), &ElementQuery::css("bad", ""))
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_routes_framed_queries() {
        let page = captcha_page(FramePolicy::ContentDocumentOnly);
        let query = inner().in_frame(outer());
        let obs = Locator::new(&page).observe(&query).await.unwrap();
        assert!(obs.visible());
    }
}
