//! Scripted in-memory page for unit tests.
//!
//! [`MockPage`] implements [`PageDriver`] over a tree of [`MockNode`]s with
//! a timeline: nodes can appear, become visible or disappear at fixed
//! offsets from the last navigation. Offsets are measured with
//! `tokio::time::Instant`, so tests running under a paused clock see exact
//! timings.
//!
//! CSS matching is literal: a node answers to its tag name and to every
//! selector string registered with [`MockNode::selector`]. Comma-separated
//! selector lists match when any member does.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::driver::{Context, ElementRef, ElementState, FrameAccess, PageDriver, Screenshot};
use crate::locator::Strategy;
use crate::result::{SmokeError, SmokeResult};
use crate::wait::LoadState;

/// PNG signature followed by a marker, enough for evidence tests
const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmock";

type Path = Vec<usize>;

/// When a node is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Always rendered
    Always,
    /// Never rendered
    Never,
    /// Rendered from this offset on
    After(Duration),
    /// Rendered until this offset
    Until(Duration),
}

impl Visibility {
    fn at(self, elapsed: Duration) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::After(at) => elapsed >= at,
            Self::Until(at) => elapsed < at,
        }
    }
}

/// How an embedded document can be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePolicy {
    /// Both access paths work
    Open,
    /// Only the content-document path works
    ContentDocumentOnly,
    /// Neither path works
    CrossOrigin,
}

/// Document embedded by an iframe node
#[derive(Debug, Clone)]
pub struct MockFrame {
    policy: FramePolicy,
    document: Vec<MockNode>,
}

impl MockFrame {
    /// Create a frame document
    #[must_use]
    pub fn new(policy: FramePolicy, document: Vec<MockNode>) -> Self {
        Self { policy, document }
    }
}

/// One element of the scripted DOM
#[derive(Debug, Clone)]
pub struct MockNode {
    tag: String,
    role: Option<String>,
    name: Option<String>,
    text: String,
    label: Option<String>,
    test_id: Option<String>,
    selectors: Vec<String>,
    appears_after: Duration,
    removed_after: Option<Duration>,
    vanishes_after_lookups: Option<usize>,
    visibility: Visibility,
    enabled: bool,
    value: String,
    toggles: Vec<String>,
    children: Vec<MockNode>,
    frame: Option<MockFrame>,
}

impl MockNode {
    /// Create a node with a tag name
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: None,
            name: None,
            text: String::new(),
            label: None,
            test_id: None,
            selectors: Vec::new(),
            appears_after: Duration::ZERO,
            removed_after: None,
            vanishes_after_lookups: None,
            visibility: Visibility::Always,
            enabled: true,
            value: String::new(),
            toggles: Vec::new(),
            children: Vec::new(),
            frame: None,
        }
    }

    /// `<button>` with role and accessible name
    #[must_use]
    pub fn button(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new("button").role("button").name(name.clone()).text(name)
    }

    /// `<a href>` with role, accessible name and an `a[href="..."]` selector
    #[must_use]
    pub fn link(name: impl Into<String>, href: &str) -> Self {
        let name = name.into();
        Self::new("a")
            .role("link")
            .name(name.clone())
            .text(name)
            .selector(format!("a[href=\"{href}\"]"))
    }

    /// Set the ARIA role
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the accessible name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the node's own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Associate a label with the node
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set `data-testid`
    #[must_use]
    pub fn test_id(mut self, id: impl Into<String>) -> Self {
        self.test_id = Some(id.into());
        self
    }

    /// Register a CSS selector string the node answers to
    #[must_use]
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    /// Attach the node only after `ms` milliseconds
    #[must_use]
    pub const fn appears_after(mut self, ms: u64) -> Self {
        self.appears_after = Duration::from_millis(ms);
        self
    }

    /// Detach the node after `ms` milliseconds
    #[must_use]
    pub const fn removed_after(mut self, ms: u64) -> Self {
        self.removed_after = Some(Duration::from_millis(ms));
        self
    }

    /// Detach the node once the page has served `lookups` count queries
    #[must_use]
    pub const fn vanishes_after_lookups(mut self, lookups: usize) -> Self {
        self.vanishes_after_lookups = Some(lookups);
        self
    }

    /// Set the rendering timeline
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attached but never rendered
    #[must_use]
    pub const fn hidden(self) -> Self {
        self.visibility(Visibility::Never)
    }

    /// Rendered from `ms` milliseconds on
    #[must_use]
    pub const fn visible_after(self, ms: u64) -> Self {
        self.visibility(Visibility::After(Duration::from_millis(ms)))
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Clicking this node flips the visibility of nodes matching `selector`
    #[must_use]
    pub fn toggles(mut self, selector: impl Into<String>) -> Self {
        self.toggles.push(selector.into());
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: MockNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = MockNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Make the node an iframe embedding `frame`
    #[must_use]
    pub fn frame(mut self, frame: MockFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    fn present(&self, env: Env) -> bool {
        env.elapsed >= self.appears_after
            && self.removed_after.map_or(true, |at| env.elapsed < at)
            && self.vanishes_after_lookups.map_or(true, |n| env.lookups < n)
    }

    fn accessible_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.text)
    }

    fn css_matches(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|part| part == self.tag || self.selectors.iter().any(|s| s == part))
    }

    fn subtree_text(&self, env: Env) -> String {
        let mut text = self.text.clone();
        for child in self.children.iter().filter(|c| c.present(env)) {
            let child_text = child.subtree_text(env);
            if !child_text.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&child_text);
            }
        }
        text
    }
}

fn text_matches(actual: &str, expected: &str, exact: bool) -> bool {
    if exact {
        actual.trim() == expected.trim()
    } else {
        actual.to_lowercase().contains(&expected.to_lowercase())
    }
}

/// Screenshot behaviour of the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenshotMode {
    /// Element and page screenshots succeed
    #[default]
    Works,
    /// Element screenshots fail, page screenshots succeed
    ElementFails,
    /// Every screenshot fails
    Fails,
}

#[derive(Debug, Clone, Copy)]
struct Env {
    elapsed: Duration,
    lookups: usize,
}

fn flatten<'a>(nodes: &'a [MockNode], prefix: &Path, env: Env, out: &mut Vec<(Path, &'a MockNode)>) {
    for (i, node) in nodes.iter().enumerate() {
        if !node.present(env) {
            continue;
        }
        let mut path = prefix.clone();
        path.push(i);
        out.push((path.clone(), node));
        flatten(&node.children, &path, env, out);
    }
}

fn is_descendant(path: &Path, ancestor: &Path) -> bool {
    path.len() > ancestor.len() && path.starts_with(ancestor)
}

fn eval(all: &[(Path, &MockNode)], strategy: &Strategy, env: Env) -> BTreeSet<Path> {
    let select = |pred: &dyn Fn(&MockNode) -> bool| -> BTreeSet<Path> {
        all.iter()
            .filter(|(_, node)| pred(node))
            .map(|(path, _)| path.clone())
            .collect()
    };

    match strategy {
        Strategy::Css { selector } => select(&|n| n.css_matches(selector)),
        Strategy::Role { role, name, exact } => select(&|n| {
            n.role.as_deref() == Some(role.as_str())
                && name
                    .as_deref()
                    .map_or(true, |name| text_matches(n.accessible_name(), name, *exact))
        }),
        Strategy::Text { text, exact } => {
            select(&|n| !n.text.is_empty() && text_matches(&n.text, text, *exact))
        }
        Strategy::Label { text, exact } => select(&|n| {
            n.label
                .as_deref()
                .is_some_and(|label| text_matches(label, text, *exact))
        }),
        Strategy::TestId { id } => select(&|n| n.test_id.as_deref() == Some(id.as_str())),
        Strategy::Filter {
            base,
            has_text,
            has,
        } => {
            let candidates = eval(all, base, env);
            let inner = has.as_ref().map(|h| eval(all, h, env));
            let lookup: HashMap<&Path, &MockNode> = all.iter().map(|(p, n)| (p, *n)).collect();
            candidates
                .into_iter()
                .filter(|path| {
                    let text_ok = has_text.as_deref().map_or(true, |t| {
                        lookup
                            .get(path)
                            .is_some_and(|n| text_matches(&n.subtree_text(env), t, false))
                    });
                    let has_ok = inner
                        .as_ref()
                        .map_or(true, |set| set.iter().any(|p| is_descendant(p, path)));
                    text_ok && has_ok
                })
                .collect()
        }
        Strategy::Within { scope, inner } => {
            let scopes = eval(all, scope, env);
            eval(all, inner, env)
                .into_iter()
                .filter(|p| scopes.iter().any(|s| is_descendant(p, s)))
                .collect()
        }
        Strategy::Any { strategies } => strategies
            .iter()
            .flat_map(|s| eval(all, s, env))
            .collect(),
    }
}

fn matching(doc: &[MockNode], strategy: &Strategy, env: Env) -> Vec<Path> {
    let mut all = Vec::new();
    flatten(doc, &Vec::new(), env, &mut all);
    eval(&all, strategy, env).into_iter().collect()
}

fn node_at<'a>(doc: &'a [MockNode], path: &[usize]) -> Option<&'a MockNode> {
    let (first, rest) = path.split_first()?;
    let mut node = doc.get(*first)?;
    for i in rest {
        node = node.children.get(*i)?;
    }
    Some(node)
}

fn node_at_mut<'a>(doc: &'a mut [MockNode], path: &[usize]) -> Option<&'a mut MockNode> {
    let (first, rest) = path.split_first()?;
    let mut node = doc.get_mut(*first)?;
    for i in rest {
        node = node.children.get_mut(*i)?;
    }
    Some(node)
}

fn rendered(doc: &[MockNode], path: &[usize], elapsed: Duration) -> bool {
    (1..=path.len()).all(|len| node_at(doc, &path[..len]).is_some_and(|n| n.visibility.at(elapsed)))
}

fn document_at<'a>(root: &'a [MockNode], frames: &[Path]) -> Option<&'a [MockNode]> {
    let mut doc = root;
    for path in frames {
        doc = &node_at(doc, path)?.frame.as_ref()?.document;
    }
    Some(doc)
}

fn document_at_mut<'a>(root: &'a mut [MockNode], frames: &[Path]) -> Option<&'a mut [MockNode]> {
    let mut doc = root;
    for path in frames {
        doc = &mut node_at_mut(doc, path)?.frame.as_mut()?.document;
    }
    Some(doc)
}

fn mentions_selector(strategy: &Strategy, selector: &str) -> bool {
    match strategy {
        Strategy::Css { selector: s } => s == selector,
        Strategy::Filter { base, has, .. } => {
            mentions_selector(base, selector)
                || has.as_ref().is_some_and(|h| mentions_selector(h, selector))
        }
        Strategy::Within { scope, inner } => {
            mentions_selector(scope, selector) || mentions_selector(inner, selector)
        }
        Strategy::Any { strategies } => strategies.iter().any(|s| mentions_selector(s, selector)),
        _ => false,
    }
}

#[derive(Debug)]
struct MockState {
    document: Vec<MockNode>,
    url: String,
    navigated_at: Instant,
    lookups: usize,
    load_timing: HashMap<LoadState, Option<Duration>>,
    redirects: HashMap<String, String>,
    screenshots: ScreenshotMode,
    invalid_selectors: Vec<String>,
    flaky_selectors: HashMap<String, usize>,
    call_history: Vec<String>,
}

impl MockState {
    fn env(&self) -> Env {
        Env {
            elapsed: self.navigated_at.elapsed(),
            lookups: self.lookups,
        }
    }

    fn frames_for(&self, context: &Context, env: Env) -> SmokeResult<Vec<Path>> {
        match context {
            Context::Page => Ok(Vec::new()),
            Context::Frame { owner, access } => {
                let mut frames = self.frames_for(&owner.context, env)?;
                let doc = document_at(&self.document, &frames).ok_or(SmokeError::FrameDetached)?;
                let path = matching(doc, &owner.strategy, env)
                    .into_iter()
                    .nth(owner.index)
                    .ok_or(SmokeError::FrameDetached)?;
                let node = node_at(doc, &path).ok_or(SmokeError::FrameDetached)?;
                let frame = node.frame.as_ref().ok_or_else(|| SmokeError::ScriptError {
                    message: format!("<{}> does not embed a document", node.tag),
                })?;
                match (frame.policy, access) {
                    (FramePolicy::CrossOrigin, _) => {
                        return Err(SmokeError::FrameUnreachable {
                            reason: "cross-origin frame".to_string(),
                        })
                    }
                    (FramePolicy::ContentDocumentOnly, FrameAccess::Direct) => {
                        return Err(SmokeError::Unsupported {
                            operation: "direct frame access".to_string(),
                        })
                    }
                    _ => {}
                }
                frames.push(path);
                Ok(frames)
            }
        }
    }

    /// Frames plus node path, `None` when the element is gone
    fn address(&self, element: &ElementRef) -> SmokeResult<Option<(Vec<Path>, Path)>> {
        let env = self.env();
        let frames = match self.frames_for(&element.context, env) {
            Ok(frames) => frames,
            Err(SmokeError::FrameDetached) => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(doc) = document_at(&self.document, &frames) else {
            return Ok(None);
        };
        let path = matching(doc, &element.strategy, env)
            .into_iter()
            .nth(element.index);
        Ok(path.map(|p| (frames, p)))
    }
}

/// Scripted page implementing [`PageDriver`]
#[derive(Debug)]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl MockPage {
    /// Create a page whose document holds `nodes`
    #[must_use]
    pub fn new(nodes: Vec<MockNode>) -> Self {
        let load_timing = [LoadState::DomContentLoaded, LoadState::Load, LoadState::NetworkIdle]
            .into_iter()
            .map(|s| (s, Some(Duration::ZERO)))
            .collect();
        Self {
            state: Mutex::new(MockState {
                document: nodes,
                url: "about:blank".to_string(),
                navigated_at: Instant::now(),
                lookups: 0,
                load_timing,
                redirects: HashMap::new(),
                screenshots: ScreenshotMode::Works,
                invalid_selectors: Vec::new(),
                flaky_selectors: HashMap::new(),
                call_history: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reach `state` `ms` milliseconds after navigation, `None` for never
    #[must_use]
    pub fn with_load_state(self, state: LoadState, ms: Option<u64>) -> Self {
        self.lock()
            .load_timing
            .insert(state, ms.map(Duration::from_millis));
        self
    }

    /// Navigating to `from` lands on `to`
    #[must_use]
    pub fn with_redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.lock().redirects.insert(from.into(), to.into());
        self
    }

    /// Set screenshot behaviour
    #[must_use]
    pub fn with_screenshots(self, mode: ScreenshotMode) -> Self {
        self.lock().screenshots = mode;
        self
    }

    /// Reject a CSS selector as invalid
    #[must_use]
    pub fn with_invalid_selector(self, selector: impl Into<String>) -> Self {
        self.lock().invalid_selectors.push(selector.into());
        self
    }

    /// Fail the first `failures` counts involving a CSS selector
    #[must_use]
    pub fn with_flaky_selector(self, selector: impl Into<String>, failures: usize) -> Self {
        self.lock().flaky_selectors.insert(selector.into(), failures);
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().call_history.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn calls(&self, prefix: &str) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Value of the first top-level-document node answering to `selector`
    #[must_use]
    pub fn input_value(&self, selector: &str) -> Option<String> {
        let state = self.lock();
        let env = state.env();
        let path = matching(&state.document, &Strategy::css(selector), env)
            .into_iter()
            .next()?;
        node_at(&state.document, &path).map(|n| n.value.clone())
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn count(&self, context: &Context, strategy: &Strategy) -> SmokeResult<usize> {
        let mut state = self.lock();
        state.call_history.push(format!("count:{context}:{strategy}"));
        let env = state.env();
        state.lookups += 1;

        if let Some(selector) = state
            .invalid_selectors
            .iter()
            .find(|s| mentions_selector(strategy, s))
        {
            return Err(SmokeError::InvalidSelector {
                selector: selector.clone(),
                message: "not a valid selector".to_string(),
            });
        }
        for (selector, remaining) in &mut state.flaky_selectors {
            if *remaining > 0 && mentions_selector(strategy, selector) {
                *remaining -= 1;
                return Err(SmokeError::ScriptError {
                    message: "Execution context was destroyed".to_string(),
                });
            }
        }

        let frames = state.frames_for(context, env)?;
        let doc = document_at(&state.document, &frames).ok_or(SmokeError::FrameDetached)?;
        Ok(matching(doc, strategy, env).len())
    }

    async fn state(&self, element: &ElementRef) -> SmokeResult<Option<ElementState>> {
        let mut state = self.lock();
        state.call_history.push(format!("state:{element}"));
        let elapsed = state.env().elapsed;
        let Some((frames, path)) = state.address(element)? else {
            return Ok(None);
        };
        let Some(doc) = document_at(&state.document, &frames) else {
            return Ok(None);
        };
        Ok(node_at(doc, &path)
            .map(|node| ElementState::new(rendered(doc, &path, elapsed), node.enabled)))
    }

    async fn click(&self, element: &ElementRef) -> SmokeResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("click:{element}"));
        let env = state.env();
        let (frames, path) = state
            .address(element)?
            .ok_or_else(|| SmokeError::ElementNotFound {
                query: element.to_string(),
            })?;
        let doc = document_at(&state.document, &frames).ok_or(SmokeError::FrameDetached)?;
        let targets: Vec<Path> = node_at(doc, &path)
            .map(|n| n.toggles.clone())
            .unwrap_or_default()
            .iter()
            .flat_map(|selector| matching(doc, &Strategy::css(selector.as_str()), env))
            .collect();

        let doc = document_at_mut(&mut state.document, &frames).ok_or(SmokeError::FrameDetached)?;
        for target in targets {
            if let Some(node) = node_at_mut(doc, &target) {
                node.visibility = if node.visibility.at(env.elapsed) {
                    Visibility::Never
                } else {
                    Visibility::Always
                };
            }
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> SmokeResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("fill:{element}"));
        let (frames, path) = state
            .address(element)?
            .ok_or_else(|| SmokeError::ElementNotFound {
                query: element.to_string(),
            })?;
        let doc = document_at_mut(&mut state.document, &frames).ok_or(SmokeError::FrameDetached)?;
        if let Some(node) = node_at_mut(doc, &path) {
            node.value = text.to_string();
        }
        Ok(())
    }

    async fn screenshot(&self, element: Option<&ElementRef>) -> SmokeResult<Screenshot> {
        let mut state = self.lock();
        match element {
            Some(element) => {
                state.call_history.push(format!("screenshot:{element}"));
                if state.screenshots != ScreenshotMode::Works {
                    return Err(SmokeError::ScreenshotError {
                        message: "element is not visible in the viewport".to_string(),
                    });
                }
                if state.address(element)?.is_none() {
                    return Err(SmokeError::ScreenshotError {
                        message: format!("element {element} is detached"),
                    });
                }
                Ok(Screenshot::new(FAKE_PNG.to_vec(), 120, 40))
            }
            None => {
                state.call_history.push("screenshot:page".to_string());
                if state.screenshots == ScreenshotMode::Fails {
                    return Err(SmokeError::ScreenshotError {
                        message: "target closed".to_string(),
                    });
                }
                Ok(Screenshot::new(FAKE_PNG.to_vec(), 1920, 1080))
            }
        }
    }

    async fn navigate(&self, url: &str) -> SmokeResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("navigate:{url}"));
        let landed = state
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        state.url = landed;
        state.navigated_at = Instant::now();
        Ok(())
    }

    async fn current_url(&self) -> SmokeResult<String> {
        let mut state = self.lock();
        state.call_history.push("current_url".to_string());
        Ok(state.url.clone())
    }

    async fn load_state_reached(&self, load: LoadState) -> SmokeResult<bool> {
        let mut state = self.lock();
        state.call_history.push(format!("load_state:{load}"));
        let elapsed = state.env().elapsed;
        Ok(state
            .load_timing
            .get(&load)
            .copied()
            .flatten()
            .is_some_and(|at| elapsed >= at))
    }

    async fn scroll_to_bottom(&self) -> SmokeResult<()> {
        self.lock().call_history.push("scroll_to_bottom".to_string());
        Ok(())
    }

    async fn close(&self) -> SmokeResult<()> {
        self.lock().call_history.push("close".to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page_ref(strategy: Strategy, index: usize) -> ElementRef {
        ElementRef::new(Context::Page, strategy, index)
    }

    mod matching_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_css_matches_tag_and_registered_selectors() {
            let page = MockPage::new(vec![
                MockNode::new("header").selector("div.tm-header__container"),
                MockNode::new("main"),
            ]);
            assert_eq!(page.count(&Context::Page, &Strategy::css("main")).await.unwrap(), 1);
            assert_eq!(
                page.count(&Context::Page, &Strategy::css("div.tm-header__container"))
                    .await
                    .unwrap(),
                1
            );
            assert_eq!(
                page.count(&Context::Page, &Strategy::css("footer, main"))
                    .await
                    .unwrap(),
                1
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_role_and_filter() {
            let page = MockPage::new(vec![MockNode::new("div")
                .selector("div[class*=\"modal\"]")
                .children([MockNode::new("h2").text("Вход"), MockNode::button("Войти")])]);

            let role = Strategy::role("button", "войти");
            assert_eq!(page.count(&Context::Page, &role).await.unwrap(), 1);

            let filtered = Strategy::css("div[class*=\"modal\"]").with_text("Вход");
            assert_eq!(page.count(&Context::Page, &filtered).await.unwrap(), 1);

            let missing = Strategy::css("div[class*=\"modal\"]").containing(Strategy::css("input"));
            assert_eq!(page.count(&Context::Page, &missing).await.unwrap(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_within_and_any_are_document_ordered() {
            let page = MockPage::new(vec![
                MockNode::new("nav").children([MockNode::link("A", "/a"), MockNode::link("B", "/b")]),
                MockNode::link("C", "/c"),
            ]);
            let within = Strategy::within(Strategy::css("nav"), Strategy::any_role("link"));
            assert_eq!(page.count(&Context::Page, &within).await.unwrap(), 2);

            let union = Strategy::any([
                Strategy::css("a[href=\"/c\"]"),
                Strategy::css("a[href=\"/a\"]"),
                Strategy::css("a[href=\"/a\"]"),
            ]);
            assert_eq!(page.count(&Context::Page, &union).await.unwrap(), 2);
            let state = page.state(&page_ref(union, 1)).await.unwrap();
            assert!(state.is_some());
        }
    }

    mod timeline_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_visibility_follows_clock() {
            let page = MockPage::new(vec![MockNode::button("Войти").visible_after(2000)]);
            let el = page_ref(Strategy::role("button", "Войти"), 0);
            assert_eq!(page.state(&el).await.unwrap(), Some(ElementState::new(false, true)));
            tokio::time::advance(Duration::from_millis(2000)).await;
            assert_eq!(page.state(&el).await.unwrap(), Some(ElementState::new(true, true)));
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_parent_hides_children() {
            let page = MockPage::new(vec![MockNode::new("div")
                .hidden()
                .child(MockNode::link("Хабр", "https://habr.com/"))]);
            let el = page_ref(Strategy::role("link", "Хабр"), 0);
            assert_eq!(page.state(&el).await.unwrap().map(|s| s.visible), Some(false));
        }

        #[tokio::test(start_paused = true)]
        async fn test_removed_node_reports_none() {
            let page = MockPage::new(vec![MockNode::new("footer").removed_after(100)]);
            let el = page_ref(Strategy::css("footer"), 0);
            assert!(page.state(&el).await.unwrap().is_some());
            tokio::time::advance(Duration::from_millis(100)).await;
            assert!(page.state(&el).await.unwrap().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_load_states() {
            let page = MockPage::new(Vec::new())
                .with_load_state(LoadState::Load, Some(300))
                .with_load_state(LoadState::NetworkIdle, None);
            assert!(page.load_state_reached(LoadState::DomContentLoaded).await.unwrap());
            assert!(!page.load_state_reached(LoadState::Load).await.unwrap());
            tokio::time::advance(Duration::from_millis(300)).await;
            assert!(page.load_state_reached(LoadState::Load).await.unwrap());
            assert!(!page.load_state_reached(LoadState::NetworkIdle).await.unwrap());
        }
    }

    mod frame_tests {
        use super::*;

        fn captcha(policy: FramePolicy) -> MockPage {
            MockPage::new(vec![MockNode::new("iframe").frame(MockFrame::new(
                policy,
                vec![MockNode::new("span").selector("span#checkbox-label")],
            ))])
        }

        fn frame_ctx(access: FrameAccess) -> Context {
            Context::frame(page_ref(Strategy::css("iframe"), 0), access)
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_frame() {
            let page = captcha(FramePolicy::Open);
            let inner = Strategy::css("span#checkbox-label");
            assert_eq!(page.count(&frame_ctx(FrameAccess::Direct), &inner).await.unwrap(), 1);
            assert_eq!(page.count(&Context::Page, &inner).await.unwrap(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_policies() {
            let inner = Strategy::css("span#checkbox-label");
            let page = captcha(FramePolicy::ContentDocumentOnly);
            let err = page.count(&frame_ctx(FrameAccess::Direct), &inner).await.unwrap_err();
            assert!(matches!(err, SmokeError::Unsupported { .. }));
            assert_eq!(
                page.count(&frame_ctx(FrameAccess::ContentDocument), &inner)
                    .await
                    .unwrap(),
                1
            );

            let page = captcha(FramePolicy::CrossOrigin);
            let err = page
                .count(&frame_ctx(FrameAccess::ContentDocument), &inner)
                .await
                .unwrap_err();
            assert!(matches!(err, SmokeError::FrameUnreachable { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_non_frame_owner() {
            let page = MockPage::new(vec![MockNode::new("div")]);
            let ctx = Context::frame(page_ref(Strategy::css("div"), 0), FrameAccess::Direct);
            let err = page.count(&ctx, &Strategy::css("span")).await.unwrap_err();
            assert!(matches!(err, SmokeError::ScriptError { .. }));
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_click_toggles_panel() {
            let page = MockPage::new(vec![
                MockNode::button("Меню").toggles("div.menu-panel"),
                MockNode::new("div").selector("div.menu-panel").hidden(),
            ]);
            let panel = page_ref(Strategy::css("div.menu-panel"), 0);
            let button = page_ref(Strategy::role("button", "Меню"), 0);
            page.click(&button).await.unwrap();
            assert_eq!(page.state(&panel).await.unwrap().map(|s| s.visible), Some(true));
            page.click(&button).await.unwrap();
            assert_eq!(page.state(&panel).await.unwrap().map(|s| s.visible), Some(false));
        }

        #[tokio::test(start_paused = true)]
        async fn test_fill_and_missing_click() {
            let page = MockPage::new(vec![MockNode::new("input").selector("input[type=\"email\"]")]);
            page.fill(&page_ref(Strategy::css("input[type=\"email\"]"), 0), "qa@example.com")
                .await
                .unwrap();
            assert_eq!(
                page.input_value("input[type=\"email\"]").as_deref(),
                Some("qa@example.com")
            );
            let err = page
                .click(&page_ref(Strategy::css("button"), 0))
                .await
                .unwrap_err();
            assert!(matches!(err, SmokeError::ElementNotFound { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_redirect_and_history() {
            let page = MockPage::new(Vec::new())
                .with_redirect("https://habr.com", "https://habr.com/ru/feed/");
            page.navigate("https://habr.com").await.unwrap();
            assert_eq!(page.current_url().await.unwrap(), "https://habr.com/ru/feed/");
            assert!(page.was_called("navigate:https://habr.com"));
            assert_eq!(page.calls("current_url"), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_screenshot_modes() {
            let page = MockPage::new(vec![MockNode::new("main")])
                .with_screenshots(ScreenshotMode::ElementFails);
            let main = page_ref(Strategy::css("main"), 0);
            assert!(page.screenshot(Some(&main)).await.is_err());
            assert!(page.screenshot(None).await.unwrap().is_valid());
        }

        #[tokio::test(start_paused = true)]
        async fn test_flaky_and_invalid_selectors() {
            let page = MockPage::new(vec![MockNode::new("main")])
                .with_flaky_selector("main", 1)
                .with_invalid_selector("div[");
            assert!(page.count(&Context::Page, &Strategy::css("main")).await.is_err());
            assert_eq!(page.count(&Context::Page, &Strategy::css("main")).await.unwrap(), 1);
            let err = page
                .count(&Context::Page, &Strategy::css("div["))
                .await
                .unwrap_err();
            assert!(matches!(err, SmokeError::InvalidSelector { .. }));
        }
    }
}
