//! # Command Resolution
//!
//! Turns a free-text command into an [`Intent`] by keyword matching.
//!
//! ## Rules
//!
//! - **click**: the lowercased text contains `click`. A double-quoted
//!   substring, if any, names the reference image to click on.
//! - **type**: otherwise, the text contains `type`. The substring between the
//!   first and last double quote is the text to type.
//! - **unknown**: anything else.
//!
//! Keywords are plain substrings, so `prototype` counts as `type`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Parameter key holding the text of a type intent.
pub const TEXT_PARAM: &str = "text";

/// Errors from command resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("type command has no quoted text: {0}")]
    MissingQuotedText(String),
}

/// Result type for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// What a command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Click,
    Type,
    #[default]
    Unknown,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click => write!(f, "click"),
            Self::Type => write!(f, "type"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A resolved command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Intent {
    /// The sentinel intent: does nothing when executed.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Click on the reference image at `target`.
    pub fn click(target: Option<String>) -> Self {
        Self {
            kind: IntentKind::Click,
            target,
            ..Self::default()
        }
    }

    /// Type `text` as keystrokes.
    pub fn type_text(text: impl Into<String>) -> Self {
        let mut parameters = HashMap::new();
        parameters.insert(TEXT_PARAM.to_string(), text.into());
        Self {
            kind: IntentKind::Type,
            parameters,
            target: None,
        }
    }

    /// The text parameter, if present.
    pub fn text(&self) -> Option<&str> {
        self.parameters.get(TEXT_PARAM).map(String::as_str)
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == IntentKind::Unknown
    }
}

/// Resolver behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Reject type commands without a quoted pair instead of producing an
    /// empty type intent
    pub strict_quotes: bool,
}

/// The substring between the first and last double quote, if there are two.
fn quoted(text: &str) -> Option<&str> {
    let start = text.find('"')?;
    let end = text.rfind('"')?;
    (end > start).then(|| &text[start + 1..end])
}

/// Keyword-based command resolver.
#[derive(Debug, Clone, Default)]
pub struct CommandResolver {
    config: ResolverConfig,
}

impl CommandResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `text`, reporting malformed commands as errors.
    pub fn try_resolve(&self, text: &str) -> ResolveResult<Intent> {
        let lower = text.to_lowercase();

        let intent = if lower.contains("click") {
            let target = quoted(text)
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string);
            Intent::click(target)
        } else if lower.contains("type") {
            match quoted(text) {
                Some(body) => Intent::type_text(body),
                None if self.config.strict_quotes => {
                    return Err(ResolveError::MissingQuotedText(text.to_string()));
                }
                None => {
                    warn!(command = text, "Type command without quoted text");
                    Intent {
                        kind: IntentKind::Type,
                        ..Intent::default()
                    }
                }
            }
        } else {
            Intent::unknown()
        };

        debug!(kind = %intent.kind, image = ?intent.target, "Resolved command");
        Ok(intent)
    }

    /// Resolve `text`; never fails. Errors degrade to [`Intent::unknown`].
    pub fn resolve(&self, text: &str) -> Intent {
        self.try_resolve(text).unwrap_or_else(|e| {
            error!(error = %e, "Error parsing command");
            Intent::unknown()
        })
    }
}
