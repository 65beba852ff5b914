use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::WatchError;
use crate::selector::Selector;

/// The capability surface the presence extractor needs from a rendered chat
/// page.
///
/// A live browser session implements this over WebDriver; tests implement it
/// over plain in-memory data, which keeps the keyword-priority detection
/// logic independent of any real browser.
#[async_trait::async_trait]
pub trait PageSession: Send + Sync {
    /// Load a URL and wait for the navigation to commit.
    async fn navigate(&self, url: &str) -> Result<(), WatchError>;

    /// Single lookup. `Ok(None)` when nothing matching is currently rendered
    /// and visible; absence here is data, not an error.
    async fn find_visible(&self, selector: &Selector)
        -> Result<Option<PageElement>, WatchError>;

    /// All currently rendered matches.
    async fn find_all(&self, selector: &Selector) -> Result<Vec<PageElement>, WatchError>;

    /// Bounded wait for a visible match; `WatchError::Timeout` on expiry.
    async fn wait_visible(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<PageElement, WatchError>;
}

/// Backend-specific part of an element handle.
#[async_trait::async_trait]
pub trait PageElementImpl: Send + Sync {
    async fn click(&self) -> Result<(), WatchError>;
    async fn text(&self) -> Result<String, WatchError>;
    async fn attribute(&self, name: &str) -> Result<Option<String>, WatchError>;
    async fn is_displayed(&self) -> Result<bool, WatchError>;
}

/// One element handle on the rendered page.
#[derive(Clone)]
pub struct PageElement {
    inner: Arc<dyn PageElementImpl>,
}

impl PageElement {
    pub fn new(inner: impl PageElementImpl + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Invoke the element. May trigger a UI navigation.
    pub async fn click(&self) -> Result<(), WatchError> {
        self.inner.click().await
    }

    /// Visible text of the element and its descendants.
    pub async fn text(&self) -> Result<String, WatchError> {
        self.inner.text().await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>, WatchError> {
        self.inner.attribute(name).await
    }

    pub async fn is_displayed(&self) -> Result<bool, WatchError> {
        self.inner.is_displayed().await
    }
}

impl fmt::Debug for PageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageElement").finish_non_exhaustive()
    }
}
