//! Browser driving
//!
//! [`UiDriver`] is the one interactive-element capability every page object
//! composes. Pages hold a `&dyn UiDriver` plus their own selector tables and
//! expose user-intent operations only.
//!
//! Every interaction waits up to an explicit bound for its target and fails
//! with [`E2eError::UiTimeout`](crate::E2eError::UiTimeout) instead of
//! hanging. Presence checks return [`Presence`] rather than failing.

pub mod pages;
pub mod playwright;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::E2eResult;

pub use playwright::{Browser, PlaywrightDriver, PlaywrightLauncher};

/// An element query in Playwright selector syntax
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn css(selector: impl AsRef<str>) -> Self {
        Self(format!("css={}", selector.as_ref()))
    }

    pub fn xpath(expression: impl AsRef<str>) -> Self {
        Self(format!("xpath={}", expression.as_ref()))
    }

    pub fn id(id: &str) -> Self {
        Self::css(format!("#{}", id))
    }

    pub fn class(name: &str) -> Self {
        Self::css(format!(".{}", name))
    }

    pub fn name(name: &str) -> Self {
        Self::css(format!("[name=\"{}\"]", name))
    }

    /// Anchor whose visible text is exactly `text`
    pub fn link_text(text: &str) -> Self {
        Self::xpath(format!("//a[normalize-space(.)={}]", xpath_literal(text)))
    }

    /// The `index`-th match, zero based
    pub fn nth(&self, index: usize) -> Self {
        Self(format!("{} >> nth={}", self.0, index))
    }

    /// `child` searched inside the first match of `self`
    pub fn within(&self, child: &Locator) -> Self {
        Self(format!("{} >> {}", self.0, child.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote `value` as an XPath string literal
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Found,
    NotFound,
}

impl Presence {
    pub fn is_found(&self) -> bool {
        matches!(self, Presence::Found)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    /// Real pointer click once the element is actionable
    Native,
    /// `element.click()` from script, for controls the page overlays
    Script,
}

#[async_trait]
pub trait UiDriver: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;
    async fn refresh(&self) -> E2eResult<()>;

    async fn click(&self, locator: &Locator, mode: ClickMode, timeout_ms: u64) -> E2eResult<()>;
    /// Replace the value of an input
    async fn fill(&self, locator: &Locator, value: &str, timeout_ms: u64) -> E2eResult<()>;
    async fn press(&self, locator: &Locator, key: &str, timeout_ms: u64) -> E2eResult<()>;

    /// Visible text of the first match
    async fn text(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<String>;
    /// Visible text of every match, once at least one is present
    async fn texts(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<Vec<String>>;
    /// Current number of matches, without waiting
    async fn count(&self, locator: &Locator) -> E2eResult<usize>;
    async fn attribute(&self, locator: &Locator, name: &str, timeout_ms: u64) -> E2eResult<Option<String>>;

    async fn find(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<Presence>;
    /// Succeeds at once when nothing matches
    async fn wait_gone(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<()>;
    /// Wait until more than `count` elements match; returns the new count
    async fn wait_count_above(&self, locator: &Locator, count: usize, timeout_ms: u64) -> E2eResult<usize>;

    async fn select_option(&self, locator: &Locator, label: &str, timeout_ms: u64) -> E2eResult<()>;
    async fn selected_option(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<String>;
    async fn set_input_files(&self, locator: &Locator, path: &Path, timeout_ms: u64) -> E2eResult<()>;

    /// Scope later lookups to the iframe `locator`
    async fn enter_frame(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<()>;
    async fn leave_frame(&self) -> E2eResult<()>;

    /// Text of the next native dialog. Dialogs are accepted as they open.
    async fn wait_alert(&self, timeout_ms: u64) -> E2eResult<String>;

    async fn switch_window(&self, index: usize, timeout_ms: u64) -> E2eResult<()>;
    async fn window_count(&self) -> E2eResult<usize>;

    /// Evaluate a script expression in the current page
    async fn eval(&self, script: &str) -> E2eResult<Value>;
    /// Full-page PNG
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;
    async fn close(&self) -> E2eResult<()>;
}

/// Launches one browser per scenario
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn launch(&self) -> E2eResult<Arc<dyn UiDriver>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_builders() {
        assert_eq!(Locator::id("email").as_str(), "css=#email");
        assert_eq!(Locator::class("cart__item").as_str(), "css=.cart__item");
        assert_eq!(Locator::name("category").as_str(), "css=[name=\"category\"]");
        assert_eq!(
            Locator::link_text("女裝").as_str(),
            "xpath=//a[normalize-space(.)='女裝']"
        );

        let item = Locator::css("div.cart__item").nth(1);
        assert_eq!(item.as_str(), "css=div.cart__item >> nth=1");
        assert_eq!(
            item.within(&Locator::class("cart__item-id")).as_str(),
            "css=div.cart__item >> nth=1 >> css=.cart__item-id"
        );
    }

    #[test]
    fn test_xpath_literal() {
        assert_eq!(xpath_literal("連身裙"), "'連身裙'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(xpath_literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
    }
}
