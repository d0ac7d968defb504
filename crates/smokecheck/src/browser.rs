//! Chromium driver over the Chrome DevTools Protocol.
//!
//! Element work happens in the page: each [`PageDriver`] call is serialized
//! into a [`Request`], evaluated by a small interpreter script, and answered
//! with a [`Reply`]. The protocol types are always compiled so the request
//! shape can be tested without a browser; the CDP driver itself needs the
//! `browser` feature.
//!
//! Frames reached with [`FrameAccess::Direct`](crate::FrameAccess) are not
//! entered from the page: the driver looks up the CDP frame behind the owner
//! element, creates an isolated world in it and runs the interpreter there
//! against the frame's own document. That path works for cross-origin frames
//! too, which the content-document path cannot read.

use serde::{Deserialize, Serialize};

use crate::driver::{Context, ElementRef};
use crate::locator::Strategy;
use crate::result::{SmokeError, SmokeResult};
use crate::wait::NETWORK_IDLE_THRESHOLD_MS;

/// In-page interpreter, called with one request object
pub const INTERPRETER: &str = r#"(req) => {
  class Fail {
    constructor(code, message, selector) {
      this.code = code;
      this.message = message;
      this.selector = selector || null;
    }
  }
  const implicitRole = (el) => {
    const tag = el.tagName.toLowerCase();
    if (tag === 'a' && el.hasAttribute('href')) return 'link';
    if (tag === 'button') return 'button';
    if (/^h[1-6]$/.test(tag)) return 'heading';
    if (tag === 'dialog') return 'dialog';
    if (tag === 'img') return 'img';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'input') {
      const type = (el.getAttribute('type') || 'text').toLowerCase();
      if (type === 'checkbox') return 'checkbox';
      if (type === 'radio') return 'radio';
      if (['button', 'submit', 'reset', 'image'].includes(type)) return 'button';
      if (type === 'search') return 'searchbox';
      return 'textbox';
    }
    return null;
  };
  const roleOf = (el) => el.getAttribute('role') || implicitRole(el);
  const nameOf = (el) =>
    (el.getAttribute('aria-label') || el.getAttribute('title') || el.getAttribute('alt') || el.textContent || '').trim();
  const textMatch = (actual, expected, exact) =>
    exact ? actual.trim() === expected.trim() : actual.toLowerCase().includes(expected.toLowerCase());
  const ownText = (el) =>
    Array.from(el.childNodes).filter((n) => n.nodeType === 3).map((n) => n.textContent).join('').trim();
  const ordered = (els) =>
    Array.from(new Set(els)).sort((a, b) =>
      a === b ? 0 : a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1);
  const css = (root, selector) => {
    try {
      return Array.from(root.querySelectorAll(selector));
    } catch (e) {
      throw new Fail('invalid_selector', e.message, selector);
    }
  };
  const labelled = (root, text, exact) => {
    const out = [];
    for (const label of root.querySelectorAll('label')) {
      if (!textMatch(label.textContent || '', text, exact)) continue;
      const target = label.control || (label.htmlFor && root.getElementById(label.htmlFor));
      if (target) out.push(target);
    }
    for (const el of root.querySelectorAll('input[aria-label], textarea[aria-label], select[aria-label]')) {
      if (textMatch(el.getAttribute('aria-label'), text, exact)) out.push(el);
    }
    return out;
  };
  const evaluate = (root, s) => {
    switch (s.kind) {
      case 'css':
        return css(root, s.selector);
      case 'role':
        return css(root, '*').filter((el) =>
          roleOf(el) === s.role && (s.name == null || textMatch(nameOf(el), s.name, s.exact)));
      case 'text':
        return css(root, '*').filter((el) => {
          const t = ownText(el);
          return t !== '' && textMatch(t, s.text, s.exact);
        });
      case 'label':
        return labelled(root, s.text, s.exact);
      case 'test_id':
        return css(root, `[data-testid="${CSS.escape(s.id)}"]`);
      case 'filter': {
        const inner = s.has ? evaluate(root, s.has) : null;
        return evaluate(root, s.base).filter((el) =>
          (s.has_text == null || textMatch(el.textContent || '', s.has_text, false)) &&
          (inner == null || inner.some((d) => d !== el && el.contains(d))));
      }
      case 'within': {
        const scopes = evaluate(root, s.scope);
        return evaluate(root, s.inner).filter((el) => scopes.some((sc) => sc !== el && sc.contains(el)));
      }
      case 'any':
        return s.strategies.flatMap((m) => evaluate(root, m));
      default:
        throw new Fail('script', `unknown strategy ${s.kind}`);
    }
  };
  const documentOf = (ctx) => {
    if (ctx.type === 'page') return document;
    const owner = element(ctx.owner);
    if (!owner) throw new Fail('detached', 'frame element is detached');
    if (ctx.access === 'direct') throw new Fail('unsupported', 'direct access runs in the frame context');
    if (!('contentDocument' in owner)) {
      throw new Fail('script', `<${owner.tagName.toLowerCase()}> does not embed a document`);
    }
    let inner = null;
    try {
      inner = owner.contentDocument;
    } catch (e) {
      throw new Fail('cross_origin', e.message);
    }
    if (!inner) throw new Fail('cross_origin', 'frame document is not accessible');
    return inner;
  };
  const matches = (ctx, s) => ordered(evaluate(documentOf(ctx), s));
  const element = (r) => matches(r.context, r.strategy)[r.index] || null;
  const required = (r) => {
    const el = element(r);
    if (!el) throw new Fail('not_found', 'element is not attached');
    return el;
  };
  const visible = (el) => {
    const style = el.ownerDocument.defaultView.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden' || Number(style.opacity) === 0) return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  };
  const enabled = (el) => !el.disabled && el.getAttribute('aria-disabled') !== 'true';
  const rect = (r) => {
    const el = required(r);
    el.scrollIntoView({ block: 'center', inline: 'center' });
    const box = el.getBoundingClientRect();
    let x = box.x;
    let y = box.y;
    let ctx = r.context;
    while (ctx.type === 'frame') {
      const owner = required(ctx.owner);
      const outer = owner.getBoundingClientRect();
      x += outer.x + owner.clientLeft;
      y += outer.y + owner.clientTop;
      ctx = ctx.owner.context;
    }
    return { x: x + window.scrollX, y: y + window.scrollY, width: box.width, height: box.height };
  };
  try {
    switch (req.op) {
      case 'count':
        return { ok: true, value: matches(req.context, req.strategy).length };
      case 'state': {
        const el = element(req.element);
        return { ok: true, value: el ? { visible: visible(el), enabled: enabled(el) } : null };
      }
      case 'click': {
        const el = required(req.element);
        el.scrollIntoView({ block: 'center' });
        el.click();
        return { ok: true, value: null };
      }
      case 'fill': {
        const el = required(req.element);
        el.focus();
        const proto = Object.getPrototypeOf(el);
        const setter = Object.getOwnPropertyDescriptor(proto, 'value');
        if (setter && setter.set) setter.set.call(el, req.text); else el.value = req.text;
        el.dispatchEvent(new Event('input', { bubbles: true }));
        el.dispatchEvent(new Event('change', { bubbles: true }));
        return { ok: true, value: null };
      }
      case 'rect':
        return { ok: true, value: rect(req.element) };
      case 'viewport_rect': {
        const el = required(req.element);
        el.scrollIntoView({ block: 'center', inline: 'center' });
        const box = el.getBoundingClientRect();
        return { ok: true, value: { x: box.x, y: box.y, width: box.width, height: box.height } };
      }
      case 'content_origin': {
        const owner = required(req.element);
        const box = owner.getBoundingClientRect();
        return {
          ok: true,
          value: {
            x: box.x + owner.clientLeft + window.scrollX,
            y: box.y + owner.clientTop + window.scrollY,
            width: owner.clientWidth,
            height: owner.clientHeight,
          },
        };
      }
      case 'frame_owner': {
        const owner = element(req.element);
        if (!owner) throw new Fail('detached', 'frame element is detached');
        if (!('contentWindow' in owner)) {
          throw new Fail('script', `<${owner.tagName.toLowerCase()}> does not embed a document`);
        }
        return { ok: true, value: owner };
      }
      case 'scroll_bottom':
        window.scrollTo(0, document.body.scrollHeight);
        return { ok: true, value: null };
      case 'network_idle': {
        const entries = [...performance.getEntriesByType('navigation'), ...performance.getEntriesByType('resource')];
        const last = entries.reduce((m, e) => Math.max(m, e.responseEnd), 0);
        return { ok: true, value: performance.now() - last >= req.threshold_ms };
      }
      case 'ready_state':
        return { ok: true, value: document.readyState };
      default:
        throw new Fail('script', `unknown op ${req.op}`);
    }
  } catch (e) {
    if (e instanceof Fail) return { ok: false, code: e.code, message: e.message, selector: e.selector };
    return { ok: false, code: 'script', message: String((e && e.message) || e) };
  }
}"#;

/// One interpreter call
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request<'a> {
    /// Count matches of a strategy
    Count {
        /// Document to search
        context: &'a Context,
        /// Strategy to evaluate
        strategy: &'a Strategy,
    },
    /// Visibility and enablement of one element
    State {
        /// Target element
        element: &'a ElementRef,
    },
    /// Click one element
    Click {
        /// Target element
        element: &'a ElementRef,
    },
    /// Replace an input's value
    Fill {
        /// Target element
        element: &'a ElementRef,
        /// New value
        text: &'a str,
    },
    /// Page-space bounding box of one element
    Rect {
        /// Target element
        element: &'a ElementRef,
    },
    /// Bounding box relative to the element's own viewport
    ViewportRect {
        /// Target element, addressed inside its own document
        element: &'a ElementRef,
    },
    /// Page-space origin of a frame element's content box
    ContentOrigin {
        /// The iframe element
        element: &'a ElementRef,
    },
    /// The iframe element itself, as a remote object
    FrameOwner {
        /// The iframe element
        element: &'a ElementRef,
    },
    /// Scroll to the bottom of the page
    ScrollBottom,
    /// Whether the network has been quiet for `threshold_ms`
    NetworkIdle {
        /// Quiet period
        threshold_ms: u64,
    },
    /// `document.readyState`
    ReadyState,
}

impl Request<'_> {
    /// Network-idle probe with the standard quiet period
    #[must_use]
    pub const fn network_idle() -> Self {
        Self::NetworkIdle {
            threshold_ms: NETWORK_IDLE_THRESHOLD_MS,
        }
    }

    /// JavaScript expression applying the interpreter to this request
    pub fn expression(&self) -> SmokeResult<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("({INTERPRETER})({json})"))
    }

    /// Expression yielding the element on success and the serialized
    /// [`Reply`] on failure, for calls evaluated by reference
    pub fn reference_expression(&self) -> SmokeResult<String> {
        Ok(format!(
            "((r) => r.ok ? r.value : JSON.stringify(r))({})",
            self.expression()?
        ))
    }
}

/// Interpreter answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reply {
    /// Whether the call succeeded
    pub ok: bool,
    /// Result payload
    #[serde(default)]
    pub value: serde_json::Value,
    /// Failure code
    #[serde(default)]
    pub code: Option<String>,
    /// Failure message
    #[serde(default)]
    pub message: Option<String>,
    /// Selector that failed to parse
    #[serde(default)]
    pub selector: Option<String>,
}

impl Reply {
    /// Payload on success, a typed error otherwise
    pub fn into_result(self) -> SmokeResult<serde_json::Value> {
        if self.ok {
            return Ok(self.value);
        }
        let message = self.message.unwrap_or_default();
        Err(match self.code.as_deref() {
            Some("detached") => SmokeError::FrameDetached,
            Some("cross_origin") => SmokeError::FrameUnreachable { reason: message },
            Some("unsupported") => SmokeError::Unsupported {
                operation: "direct frame access".to_string(),
            },
            Some("invalid_selector") => SmokeError::InvalidSelector {
                selector: self.selector.unwrap_or_default(),
                message,
            },
            Some("not_found") => SmokeError::ElementNotFound { query: message },
            _ => SmokeError::ScriptError { message },
        })
    }
}

/// Page-space box of an element
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Whether the box has an area
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Move a frame-viewport box into page space
    #[must_use]
    pub fn offset_by(self, origin: &Self) -> Self {
        Self {
            x: self.x + origin.x,
            y: self.y + origin.y,
            ..self
        }
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(
    clippy::significant_drop_tightening,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
mod cdp {
    use super::{Rect, Reply, Request};
    use crate::config::BrowserConfig;
    use crate::driver::{Context, ElementRef, ElementState, PageDriver, Screenshot};
    use crate::locator::Strategy;
    use crate::result::{SmokeError, SmokeResult};
    use crate::wait::LoadState;
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::dom::DescribeNodeParams;
    use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams, CreateIsolatedWorldParams, Viewport,
    };
    use chromiumoxide::cdp::js_protocol::runtime::{
        EvaluateParams, ExecutionContextId, ReleaseObjectParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tracing::{debug, info};

    /// Isolated world the interpreter runs in inside a frame
    const WORLD_NAME: &str = "smokecheck";

    /// Keeps cross-origin frames in the page's renderer so their CDP frame
    /// can be entered from the page session
    const SAME_PROCESS_FRAMES: [&str; 2] = [
        "--disable-site-isolation-trials",
        "--disable-features=IsolateOrigins,site-per-process",
    ];

    fn launch_error(e: impl ToString) -> SmokeError {
        SmokeError::BrowserLaunchError {
            message: e.to_string(),
        }
    }

    fn script_error(e: impl ToString) -> SmokeError {
        SmokeError::ScriptError {
            message: e.to_string(),
        }
    }

    fn screenshot_error(e: impl ToString) -> SmokeError {
        SmokeError::ScreenshotError {
            message: e.to_string(),
        }
    }

    /// [`PageDriver`] backed by a launched Chromium
    #[derive(Debug)]
    pub struct CdpDriver {
        page: Mutex<CdpPage>,
        browser: Mutex<CdpBrowser>,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
        viewport: (u32, u32),
        slow_mo: Duration,
    }

    impl CdpDriver {
        /// Launch Chromium and open a blank page
        pub async fn launch(config: &BrowserConfig) -> SmokeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .arg(format!("--lang={}", config.locale))
                .args(SAME_PROCESS_FRAMES);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(launch_error)?;
            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(launch_error)?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser.new_page("about:blank").await.map_err(launch_error)?;
            page.execute(SetDeviceMetricsOverrideParams::new(
                i64::from(config.viewport_width),
                i64::from(config.viewport_height),
                1.0,
                false,
            ))
            .await
            .map_err(launch_error)?;

            info!(
                headless = config.headless,
                width = config.viewport_width,
                height = config.viewport_height,
                "chromium launched"
            );
            Ok(Self {
                page: Mutex::new(page),
                browser: Mutex::new(browser),
                handle,
                viewport: (config.viewport_width, config.viewport_height),
                slow_mo: config.slow_mo(),
            })
        }

        async fn call(&self, request: &Request<'_>) -> SmokeResult<serde_json::Value> {
            let expression = request.expression()?;
            let page = self.page.lock().await;
            let result = page.evaluate(expression).await.map_err(script_error)?;
            let reply: Reply = result.into_value().map_err(script_error)?;
            reply.into_result()
        }

        /// Run `request` inside the frame embedded by `owner`
        async fn call_direct(
            &self,
            owner: &ElementRef,
            request: &Request<'_>,
        ) -> SmokeResult<serde_json::Value> {
            let page = self.page.lock().await;
            let context_id = frame_context(&page, owner).await?;
            let params = EvaluateParams::builder()
                .expression(request.expression()?)
                .context_id(context_id)
                .return_by_value(true)
                .build()
                .map_err(script_error)?;
            let evaluated = page.execute(params).await.map_err(script_error)?.result;
            if let Some(details) = evaluated.exception_details {
                return Err(script_error(details.text));
            }
            let value = evaluated
                .result
                .value
                .ok_or_else(|| script_error("interpreter returned no value"))?;
            let reply: Reply = serde_json::from_value(value)?;
            reply.into_result()
        }

        /// Run an element request in the document the element lives in
        async fn call_for(
            &self,
            element: &ElementRef,
            request: impl Fn(&ElementRef) -> Request<'_>,
        ) -> SmokeResult<serde_json::Value> {
            match element.context.direct_owner() {
                Some(owner) => {
                    let local = element.in_own_document();
                    self.call_direct(owner, &request(&local)).await
                }
                None => self.call(&request(element)).await,
            }
        }

        async fn pause(&self) {
            if !self.slow_mo.is_zero() {
                tokio::time::sleep(self.slow_mo).await;
            }
        }

        async fn capture(&self, clip: Option<Viewport>) -> SmokeResult<Vec<u8>> {
            let mut params = CaptureScreenshotParams::builder().format(CaptureScreenshotFormat::Png);
            if let Some(clip) = clip {
                params = params.clip(clip).capture_beyond_viewport(true);
            }
            let page = self.page.lock().await;
            let screenshot = page.execute(params.build()).await.map_err(screenshot_error)?;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(screenshot_error)
        }
    }

    /// Execution context of a fresh isolated world in the frame `owner` embeds
    async fn frame_context(page: &CdpPage, owner: &ElementRef) -> SmokeResult<ExecutionContextId> {
        let params = EvaluateParams::builder()
            .expression(Request::FrameOwner { element: owner }.reference_expression()?)
            .return_by_value(false)
            .build()
            .map_err(script_error)?;
        let evaluated = page.execute(params).await.map_err(script_error)?.result;
        if let Some(details) = evaluated.exception_details {
            return Err(script_error(details.text));
        }
        let Some(object_id) = evaluated.result.object_id else {
            let failure = evaluated
                .result
                .value
                .as_ref()
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| script_error("frame owner lookup returned nothing"))?;
            let reply: Reply = serde_json::from_str(failure)?;
            return Err(reply
                .into_result()
                .err()
                .unwrap_or_else(|| script_error("frame owner is not an element")));
        };

        let described = page
            .execute(DescribeNodeParams::builder().object_id(object_id.clone()).build())
            .await;
        if let Err(e) = page.execute(ReleaseObjectParams::new(object_id)).await {
            debug!(error = %e, "releasing frame owner failed");
        }
        let frame_id = described
            .map_err(script_error)?
            .result
            .node
            .frame_id
            .ok_or(SmokeError::FrameDetached)?;

        let world = CreateIsolatedWorldParams::builder()
            .frame_id(frame_id)
            .world_name(WORLD_NAME)
            .build()
            .map_err(script_error)?;
        let created = page.execute(world).await.map_err(|e| SmokeError::Unsupported {
            operation: format!("direct frame access ({e})"),
        })?;
        Ok(created.result.execution_context_id)
    }

    #[async_trait]
    impl PageDriver for CdpDriver {
        async fn count(&self, context: &Context, strategy: &Strategy) -> SmokeResult<usize> {
            let value = match context.direct_owner() {
                Some(owner) => {
                    let request = Request::Count {
                        context: &Context::Page,
                        strategy,
                    };
                    self.call_direct(owner, &request).await?
                }
                None => self.call(&Request::Count { context, strategy }).await?,
            };
            Ok(serde_json::from_value(value)?)
        }

        async fn state(&self, element: &ElementRef) -> SmokeResult<Option<ElementState>> {
            match self.call_for(element, |element| Request::State { element }).await {
                Ok(value) => Ok(serde_json::from_value(value)?),
                Err(SmokeError::FrameDetached) => Ok(None),
                Err(e) => Err(e),
            }
        }

        async fn click(&self, element: &ElementRef) -> SmokeResult<()> {
            self.pause().await;
            debug!(element = %element, "click");
            self.call_for(element, |element| Request::Click { element })
                .await
                .map(drop)
        }

        async fn fill(&self, element: &ElementRef, text: &str) -> SmokeResult<()> {
            self.pause().await;
            debug!(element = %element, "fill");
            match element.context.direct_owner() {
                Some(owner) => {
                    let local = element.in_own_document();
                    let request = Request::Fill {
                        element: &local,
                        text,
                    };
                    self.call_direct(owner, &request).await.map(drop)
                }
                None => self.call(&Request::Fill { element, text }).await.map(drop),
            }
        }

        async fn screenshot(&self, element: Option<&ElementRef>) -> SmokeResult<Screenshot> {
            let Some(element) = element else {
                let data = self.capture(None).await?;
                return Ok(Screenshot::new(data, self.viewport.0, self.viewport.1));
            };
            let rect: Rect = match element.context.direct_owner() {
                Some(owner) => {
                    let local = element.in_own_document();
                    let inner: Rect = serde_json::from_value(
                        self.call_direct(owner, &Request::ViewportRect { element: &local })
                            .await?,
                    )?;
                    let origin: Rect = serde_json::from_value(
                        self.call(&Request::ContentOrigin { element: owner }).await?,
                    )?;
                    inner.offset_by(&origin)
                }
                None => serde_json::from_value(self.call(&Request::Rect { element }).await?)?,
            };
            if rect.is_empty() {
                return Err(screenshot_error(format!("element {element} has no area")));
            }
            let clip = Viewport::builder()
                .x(rect.x)
                .y(rect.y)
                .width(rect.width)
                .height(rect.height)
                .scale(1.0)
                .build()
                .map_err(screenshot_error)?;
            let data = self.capture(Some(clip)).await?;
            Ok(Screenshot::new(
                data,
                rect.width.ceil() as u32,
                rect.height.ceil() as u32,
            ))
        }

        async fn navigate(&self, url: &str) -> SmokeResult<()> {
            self.pause().await;
            let page = self.page.lock().await;
            page.goto(url)
                .await
                .map_err(|e| SmokeError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            info!(url, "navigated");
            Ok(())
        }

        async fn current_url(&self) -> SmokeResult<String> {
            let page = self.page.lock().await;
            Ok(page.url().await.map_err(script_error)?.unwrap_or_default())
        }

        async fn load_state_reached(&self, state: LoadState) -> SmokeResult<bool> {
            match state {
                LoadState::NetworkIdle => {
                    let value = self.call(&Request::network_idle()).await?;
                    Ok(value.as_bool().unwrap_or(false))
                }
                LoadState::DomContentLoaded | LoadState::Load => {
                    let value = self.call(&Request::ReadyState).await?;
                    let ready = value.as_str().unwrap_or_default();
                    Ok(match state {
                        LoadState::DomContentLoaded => ready == "interactive" || ready == "complete",
                        _ => ready == "complete",
                    })
                }
            }
        }

        async fn scroll_to_bottom(&self) -> SmokeResult<()> {
            self.call(&Request::ScrollBottom).await.map(drop)
        }

        async fn close(&self) -> SmokeResult<()> {
            let mut browser = self.browser.lock().await;
            browser.close().await.map_err(launch_error)?;
            info!("chromium closed");
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::CdpDriver;
