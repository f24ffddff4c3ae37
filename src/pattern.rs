//! Filter/request pattern definitions.
//!
//! A [`Pattern`] is the unit the caller hands the engine: a matching mode plus a
//! source string. Its identity (the "GUID") is a deterministic key derived from
//! both, used to deduplicate filters and to key per-row verdict maps.

/// How a pattern's value is interpreted by the match engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternMode {
    /// Case-sensitive substring test per line.
    Text,
    /// Case-insensitive regular expression scanned over the whole document.
    Regex,
}

impl PatternMode {
    fn tag(self) -> &'static str {
        match self {
            PatternMode::Text => "text",
            PatternMode::Regex => "reg",
        }
    }
}

/// A filter or request pattern. Filters gate row visibility; requests only
/// annotate rows for secondary highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub mode: PatternMode,
    pub value: String,
}

impl Pattern {
    pub fn new(mode: PatternMode, value: impl Into<String>) -> Self {
        Self {
            mode,
            value: value.into(),
        }
    }

    /// An empty text pattern — the initial active filter, matching everything.
    pub fn empty() -> Self {
        Self::new(PatternMode::Text, "")
    }

    /// Deterministic identity key: mode tag + value. Not a random identifier.
    pub fn guid(&self) -> String {
        format!("{}{}", self.mode.tag(), self.value)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The cleaned literal handed to highlight rendering.
    ///
    /// Text patterns pass through verbatim. Regex patterns are reduced to the
    /// characters a highlighter can match literally; everything outside
    /// `[0-9A-Za-z_,\-+|@#$=]` is stripped.
    pub fn match_value(&self) -> String {
        if self.value.is_empty() {
            return String::new();
        }
        match self.mode {
            PatternMode::Text => self.value.clone(),
            PatternMode::Regex => self
                .value
                .chars()
                .filter(|c| {
                    c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '-' | '+' | '|' | '@' | '#' | '$' | '=')
                })
                .collect(),
        }
    }
}

/// Strip the trailing run of backslashes from a regex source.
///
/// A pattern typed incrementally often ends in a dangling `\` that would fail to
/// compile; the sanitized form is what actually reaches the regex builder.
pub fn sanitize_regex_source(source: &str) -> &str {
    source.trim_end_matches('\\')
}
