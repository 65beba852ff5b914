use std::fmt;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::errors::WatchError;
use crate::page::PageSession;
use crate::selector::Selector;

/// Presence of the monitored contact as shown by the conversation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Online,
    Typing,
    Recording,
    Offline,
    /// No status text was resolvable. Legitimate (privacy settings, header
    /// not yet rendered), distinct from a failed extraction.
    Unknown,
    /// The extraction itself failed for this tick.
    Error,
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PresenceState::Online => "online",
            PresenceState::Typing => "typing",
            PresenceState::Recording => "recording",
            PresenceState::Offline => "offline",
            PresenceState::Unknown => "unknown",
            PresenceState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Outcome of a single poll: the mapped state plus the raw matched text
/// (or the failure description), kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub state: PresenceState,
    pub raw: String,
}

impl Observation {
    pub fn new(state: PresenceState, raw: impl Into<String>) -> Self {
        Self {
            state,
            raw: raw.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(PresenceState::Unknown, "")
    }

    pub fn error(raw: impl Into<String>) -> Self {
        Self::new(PresenceState::Error, raw)
    }
}

/// Keyword probes in canonical priority order; the first keyword with any
/// matching header fragment wins. Matching is case-insensitive substring
/// containment, since the surrounding phrase is unpredictable.
const KEYWORD_PRIORITY: [(&str, PresenceState); 4] = [
    ("online", PresenceState::Online),
    ("typing", PresenceState::Typing),
    ("recording", PresenceState::Recording),
    ("last seen", PresenceState::Offline),
];

/// Detects the presence state of one contact on the rendered page.
pub struct PresenceExtractor {
    contact: String,
    /// Pause after opening a conversation so the header can re-render.
    settle_delay: Duration,
    /// Bound on the wait for the contact's chat-list entry.
    lookup_timeout: Duration,
}

impl PresenceExtractor {
    pub fn new(contact: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
            settle_delay: Duration::from_millis(1500),
            lookup_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    /// Observe the contact's current presence.
    ///
    /// Never fails: extraction errors are absorbed into an
    /// [`PresenceState::Error`] observation with the cause as raw text, so
    /// flakiness shows up in the transition log instead of stopping the
    /// polling loop. An absent contact is an error too, never `Offline`.
    #[instrument(level = "debug", skip(self, page), fields(contact = %self.contact))]
    pub async fn observe(&self, page: &dyn PageSession) -> Observation {
        match self.extract(page).await {
            Ok(observation) => observation,
            Err(err) => {
                warn!(error = %err, "extraction failed for this tick");
                Observation::error(err.to_string())
            }
        }
    }

    async fn extract(&self, page: &dyn PageSession) -> Result<Observation, WatchError> {
        self.ensure_foreground(page).await?;

        for (keyword, state) in KEYWORD_PRIORITY {
            let probe = Selector::text_contains(keyword).within(Selector::header());
            let hits = page.find_all(&probe).await?;
            if let Some(fragment) = hits.first() {
                // The fragment can detach between lookup and read.
                let raw = match fragment.text().await {
                    Ok(text) => text,
                    Err(_) => keyword.to_string(),
                };
                debug!(%state, raw = %raw, "status fragment matched");
                return Ok(Observation::new(state, raw));
            }
        }

        debug!("no status fragment under the header");
        Ok(Observation::unknown())
    }

    /// Bring the contact's conversation to the foreground if it is not
    /// already. The header check exists to skip a redundant click that would
    /// interrupt rendering mid-measurement.
    async fn ensure_foreground(&self, page: &dyn PageSession) -> Result<(), WatchError> {
        let header_title = Selector::title(&self.contact).within(Selector::header());
        if page.find_visible(&header_title).await?.is_some() {
            return Ok(());
        }

        let entry = page
            .wait_visible(&Selector::title(&self.contact), self.lookup_timeout)
            .await
            .map_err(|err| match err {
                WatchError::ElementNotFound(_) => WatchError::ElementNotFound(format!(
                    "contact '{}' not present in the chat list",
                    self.contact
                )),
                other => other,
            })?;
        entry.click().await?;
        // Let the header re-render before measuring.
        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }
}
