//! In-memory stand-in for a rendered chat page.
//!
//! Holds the chat list and the conversation header as plain data and records
//! clicks, so extractor behavior can be asserted without a browser.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::WatchError;
use crate::page::{PageElement, PageElementImpl, PageSession};
use crate::selector::Selector;

/// Forced failure mode for lookups.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Timeout,
    Session,
}

impl Failure {
    fn to_error(self) -> WatchError {
        match self {
            Failure::Timeout => WatchError::Timeout("scripted lookup timeout".to_string()),
            Failure::Session => WatchError::Session("scripted session failure".to_string()),
        }
    }
}

#[derive(Default)]
struct PageState {
    /// Titles present in the chat list.
    chat_entries: Vec<String>,
    /// Title shown by the conversation header, if a chat is open.
    open_chat: Option<String>,
    /// Text fragments under the header once a chat is open.
    header_fragments: Vec<String>,
    /// Titles clicked, in order.
    clicks: Vec<String>,
    /// When set, every lookup fails this way.
    fail_lookups: Option<Failure>,
}

pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState::default())),
        }
    }

    pub fn with_chat_entry(self, title: &str) -> Self {
        self.state.lock().unwrap().chat_entries.push(title.to_string());
        self
    }

    pub fn with_open_chat(self, title: &str) -> Self {
        self.state.lock().unwrap().open_chat = Some(title.to_string());
        self
    }

    pub fn with_header_fragment(self, text: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .header_fragments
            .push(text.to_string());
        self
    }

    pub fn fail_lookups(&self, failure: Failure) {
        self.state.lock().unwrap().fail_lookups = Some(failure);
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    fn check_failure(&self) -> Result<(), WatchError> {
        match self.state.lock().unwrap().fail_lookups {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn matches(&self, selector: &Selector) -> Vec<ElementKind> {
        let state = self.state.lock().unwrap();
        match selector {
            Selector::Title(title) => {
                if state.chat_entries.iter().any(|entry| entry == title) {
                    vec![ElementKind::ChatEntry(title.clone())]
                } else {
                    Vec::new()
                }
            }
            Selector::Region(region) if region == "header" => state
                .open_chat
                .as_ref()
                .map(|title| vec![ElementKind::Header(title.clone())])
                .unwrap_or_default(),
            Selector::Chain(parts) => match parts.as_slice() {
                [Selector::Region(region), scoped] if region == "header" => {
                    let Some(open) = state.open_chat.as_ref() else {
                        return Vec::new();
                    };
                    match scoped {
                        Selector::Title(title) if title == open => {
                            vec![ElementKind::Header(open.clone())]
                        }
                        Selector::TextContains(needle) => {
                            let needle = needle.to_lowercase();
                            state
                                .header_fragments
                                .iter()
                                .filter(|fragment| fragment.to_lowercase().contains(&needle))
                                .map(|fragment| ElementKind::Fragment(fragment.clone()))
                                .collect()
                        }
                        _ => Vec::new(),
                    }
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn element(&self, kind: ElementKind) -> PageElement {
        PageElement::new(FakeElement {
            state: self.state.clone(),
            kind,
        })
    }
}

#[derive(Debug, Clone)]
enum ElementKind {
    ChatEntry(String),
    Header(String),
    Fragment(String),
}

struct FakeElement {
    state: Arc<Mutex<PageState>>,
    kind: ElementKind,
}

#[async_trait]
impl PageElementImpl for FakeElement {
    async fn click(&self) -> Result<(), WatchError> {
        if let ElementKind::ChatEntry(title) = &self.kind {
            let mut state = self.state.lock().unwrap();
            state.clicks.push(title.clone());
            state.open_chat = Some(title.clone());
        }
        Ok(())
    }

    async fn text(&self) -> Result<String, WatchError> {
        let text = match &self.kind {
            ElementKind::ChatEntry(title) | ElementKind::Header(title) => title.clone(),
            ElementKind::Fragment(text) => text.clone(),
        };
        Ok(text)
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, WatchError> {
        let value = match (&self.kind, name) {
            (ElementKind::ChatEntry(title) | ElementKind::Header(title), "title") => {
                Some(title.clone())
            }
            _ => None,
        };
        Ok(value)
    }

    async fn is_displayed(&self) -> Result<bool, WatchError> {
        Ok(true)
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&self, _url: &str) -> Result<(), WatchError> {
        Ok(())
    }

    async fn find_visible(
        &self,
        selector: &Selector,
    ) -> Result<Option<PageElement>, WatchError> {
        self.check_failure()?;
        Ok(self
            .matches(selector)
            .into_iter()
            .next()
            .map(|kind| self.element(kind)))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<PageElement>, WatchError> {
        self.check_failure()?;
        Ok(self
            .matches(selector)
            .into_iter()
            .map(|kind| self.element(kind))
            .collect())
    }

    async fn wait_visible(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<PageElement, WatchError> {
        self.check_failure()?;
        self.matches(selector)
            .into_iter()
            .next()
            .map(|kind| self.element(kind))
            .ok_or_else(|| {
                WatchError::Timeout(format!("no element matching {selector} within {timeout:?}"))
            })
    }
}
