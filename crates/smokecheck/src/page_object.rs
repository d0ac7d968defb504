//! Page Object Model support.
//!
//! A page object owns the [`ElementQuery`] values describing one page or
//! modal. Queries are plain values, built once; nothing is looked up until a
//! step hands them to the [`Locator`](crate::Locator) or [`Verifier`](crate::Verifier).

use crate::locator::ElementQuery;
use crate::result::SmokeResult;

/// A page or component of the site under test.
///
/// # Example
///
/// ```ignore
/// struct SearchPage {
///     field: ElementQuery,
/// }
///
/// impl PageObject for SearchPage {
///     fn url_pattern(&self) -> &str {
///         "/ru/search/"
///     }
///
///     fn ready_marker(&self) -> &ElementQuery {
///         &self.field
///     }
///
///     fn queries(&self) -> Vec<&ElementQuery> {
///         vec![&self.field]
///     }
/// }
/// ```
pub trait PageObject {
    /// URL fragment identifying this page (e.g., "/ru/articles/")
    fn url_pattern(&self) -> &str;

    /// Element whose visibility means the page is usable
    fn ready_marker(&self) -> &ElementQuery;

    /// Every query the page object declares
    fn queries(&self) -> Vec<&ElementQuery>;

    /// Wait budget for the ready marker, in milliseconds
    fn load_timeout_ms(&self) -> u64 {
        30_000
    }

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `url` belongs to this page
    fn matches_url(&self, url: &str) -> bool {
        url.contains(self.url_pattern())
    }

    /// Validate every declared query; the first malformed one is returned
    fn validate(&self) -> SmokeResult<()> {
        self.queries().into_iter().try_for_each(ElementQuery::validate)
    }
}
