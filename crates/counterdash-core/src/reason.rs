//! Counter change reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the counter changed.
///
/// The contract defines four variants. Tags the dashboard does not know are
/// kept verbatim (upper-cased) in `Other` rather than being forced into the
/// closed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ChangeReason {
    Increased,
    Decreased,
    Reset,
    Set,
    Unknown,
    Other(String),
}

impl ChangeReason {
    /// Map an upper-case tag onto the fixed variants, passing anything else
    /// through.
    pub fn from_tag(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        match tag.as_str() {
            "INCREASED" => ChangeReason::Increased,
            "DECREASED" => ChangeReason::Decreased,
            "RESET" => ChangeReason::Reset,
            "SET" => ChangeReason::Set,
            "UNKNOWN" => ChangeReason::Unknown,
            _ => ChangeReason::Other(tag),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChangeReason::Increased => "INCREASED",
            ChangeReason::Decreased => "DECREASED",
            ChangeReason::Reset => "RESET",
            ChangeReason::Set => "SET",
            ChangeReason::Unknown => "UNKNOWN",
            ChangeReason::Other(tag) => tag,
        }
    }

    /// Tailwind text color class for the history entry.
    pub fn color_class(&self) -> &'static str {
        match self.as_str().to_lowercase().as_str() {
            "increased" => "text-green-500",
            "decreased" => "text-red-500",
            "reset" => "text-yellow-500",
            "set" => "text-blue-500",
            _ => "text-gray-500",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.as_str().to_lowercase().as_str() {
            "increased" => "📈",
            "decreased" => "📉",
            "reset" => "🔄",
            "set" => "🎯",
            _ => "📊",
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ChangeReason> for String {
    fn from(r: ChangeReason) -> Self {
        r.as_str().to_string()
    }
}

impl From<String> for ChangeReason {
    fn from(tag: String) -> Self {
        ChangeReason::from_tag(tag.to_uppercase())
    }
}
