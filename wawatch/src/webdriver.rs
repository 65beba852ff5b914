use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, Locator};
use tracing::debug;

use crate::errors::WatchError;
use crate::page::{PageElement, PageElementImpl, PageSession};
use crate::selector::Selector;

const WAIT_POLL_PERIOD: Duration = Duration::from_millis(250);

/// [`PageSession`] over a live WebDriver-controlled browser.
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// End the WebDriver session.
    pub async fn close(mut self) -> Result<(), WatchError> {
        self.client.close().await.map_err(map_cmd_error)
    }
}

#[async_trait]
impl PageSession for WebDriverPage {
    async fn navigate(&self, url: &str) -> Result<(), WatchError> {
        debug!(url, "navigating");
        self.client
            .goto(url)
            .await
            .map_err(|err| WatchError::Navigation(format!("goto {url}: {err}")))
    }

    async fn find_visible(
        &self,
        selector: &Selector,
    ) -> Result<Option<PageElement>, WatchError> {
        let xpath = to_xpath(selector)?;
        match self.client.find(Locator::XPath(&xpath)).await {
            Ok(element) => {
                if element.is_displayed().await.map_err(map_cmd_error)? {
                    Ok(Some(wrap(element)))
                } else {
                    Ok(None)
                }
            }
            Err(err) if err.is_no_such_element() => Ok(None),
            Err(err) => Err(map_cmd_error(err)),
        }
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<PageElement>, WatchError> {
        let xpath = to_xpath(selector)?;
        let elements = self
            .client
            .find_all(Locator::XPath(&xpath))
            .await
            .map_err(map_cmd_error)?;
        Ok(elements.into_iter().map(wrap).collect())
    }

    async fn wait_visible(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<PageElement, WatchError> {
        let xpath = to_xpath(selector)?;
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .every(WAIT_POLL_PERIOD)
            .for_element(Locator::XPath(&xpath))
            .await
            .map_err(|err| match err {
                CmdError::WaitTimeout => WatchError::Timeout(format!(
                    "no element matching {selector} within {timeout:?}"
                )),
                other => map_cmd_error(other),
            })?;
        Ok(wrap(element))
    }
}

struct WebDriverElement {
    element: Element,
}

fn wrap(element: Element) -> PageElement {
    PageElement::new(WebDriverElement { element })
}

#[async_trait]
impl PageElementImpl for WebDriverElement {
    async fn click(&self) -> Result<(), WatchError> {
        self.element
            .click()
            .await
            .map_err(|err| WatchError::Navigation(format!("click: {err}")))
    }

    async fn text(&self) -> Result<String, WatchError> {
        self.element.text().await.map_err(map_cmd_error)
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, WatchError> {
        self.element.attr(name).await.map_err(map_cmd_error)
    }

    async fn is_displayed(&self) -> Result<bool, WatchError> {
        self.element.is_displayed().await.map_err(map_cmd_error)
    }
}

fn map_cmd_error(err: CmdError) -> WatchError {
    match err {
        CmdError::Standard(inner) if inner.error == ErrorStatus::NoSuchElement => {
            WatchError::ElementNotFound(inner.to_string())
        }
        CmdError::WaitTimeout => WatchError::Timeout("bounded wait exceeded".to_string()),
        other => WatchError::Session(other.to_string()),
    }
}

/// Translate a [`Selector`] into the XPath dialect the chat page is queried
/// with. Text containment goes through `translate()` so matching stays
/// case-insensitive regardless of how the page capitalizes the phrase.
pub(crate) fn to_xpath(selector: &Selector) -> Result<String, WatchError> {
    let mut xpath = String::new();
    append_xpath(selector, &mut xpath)?;
    Ok(xpath)
}

fn append_xpath(selector: &Selector, out: &mut String) -> Result<(), WatchError> {
    match selector {
        Selector::Title(value) => {
            out.push_str("//span[@title=");
            out.push_str(&xpath_literal(value));
            out.push(']');
        }
        Selector::TextContains(needle) => {
            out.push_str(
                "//span[contains(translate(text(), \
                 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), ",
            );
            out.push_str(&xpath_literal(&needle.to_lowercase()));
            out.push_str(")]");
        }
        Selector::Region(name) => {
            out.push_str("//");
            out.push_str(name);
        }
        Selector::Chain(parts) => {
            for part in parts {
                append_xpath(part, out)?;
            }
        }
        Selector::Invalid(reason) => {
            return Err(WatchError::Session(format!("invalid selector: {reason}")));
        }
    }
    Ok(())
}

/// Quote a string as an XPath literal. XPath 1.0 has no escaping inside
/// string literals, so values containing both quote kinds need `concat()`.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
