/// Represents ways to locate an element on the chat page.
///
/// The target application's markup is unversioned, so queries stay at the
/// level of accessible attributes and visible text rather than structural
/// paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Element whose accessible `title` attribute equals the value.
    Title(String),
    /// Element whose visible text contains the substring, case-insensitively.
    TextContains(String),
    /// A named landmark container, e.g. the conversation header.
    Region(String),
    /// Descendant scoping, outermost ancestor first.
    Chain(Vec<Selector>),
    /// An unparsable selector string, with the reason.
    Invalid(String),
}

impl Selector {
    pub fn title(value: impl Into<String>) -> Self {
        Selector::Title(value.into())
    }

    pub fn text_contains(needle: impl Into<String>) -> Self {
        Selector::TextContains(needle.into())
    }

    pub fn region(name: impl Into<String>) -> Self {
        Selector::Region(name.into())
    }

    /// The conversation header region.
    pub fn header() -> Self {
        Selector::Region("header".to_string())
    }

    /// Scope this selector under an ancestor.
    pub fn within(self, ancestor: Selector) -> Self {
        let mut parts = match ancestor {
            Selector::Chain(parts) => parts,
            other => vec![other],
        };
        match self {
            Selector::Chain(mut tail) => parts.append(&mut tail),
            other => parts.push(other),
        }
        Selector::Chain(parts)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        // Handle chained selectors first
        let parts: Vec<&str> = s.split(">>").map(|p| p.trim()).collect();
        if parts.len() > 1 {
            return Selector::Chain(parts.into_iter().map(Selector::from).collect());
        }

        match s {
            _ if s.to_lowercase().starts_with("title:") => {
                Selector::Title(s["title:".len()..].trim().to_string())
            }
            _ if s.to_lowercase().starts_with("text:") => {
                Selector::TextContains(s["text:".len()..].trim().to_string())
            }
            _ if s.to_lowercase().starts_with("region:") => {
                Selector::Region(s["region:".len()..].trim().to_string())
            }
            "header" => Selector::header(),
            _ => Selector::Invalid(format!(
                "Unknown selector format: \"{s}\". Use 'title:', 'text:' or 'region:' prefixes, chained with '>>'."
            )),
        }
    }
}
