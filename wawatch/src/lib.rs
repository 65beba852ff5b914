//! Presence monitoring for a web chat conversation partner.
//!
//! Polls the rendered chat page for a single contact's presence indicator
//! (online / typing / recording / offline) and appends each state transition
//! to a per-run CSV log. The page is reached through the object-safe
//! [`PageSession`] capability trait, so the detection logic runs identically
//! against a live WebDriver-controlled browser or an in-memory fake.

pub mod config;
pub mod driver;
pub mod errors;
pub mod extractor;
pub mod monitor;
pub mod page;
pub mod selector;
pub mod status_log;
pub mod webdriver;

#[cfg(test)]
mod tests;

pub use config::MonitorConfig;
pub use errors::WatchError;
pub use extractor::{Observation, PresenceExtractor, PresenceState};
pub use monitor::{MonitorSession, PagePresenceSource, PresenceSource};
pub use page::{PageElement, PageSession};
pub use selector::Selector;
pub use status_log::{ChangeLogger, StatusLog, StatusRecord};
pub use webdriver::WebDriverPage;
