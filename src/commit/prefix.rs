//! Ticket prefixes: resolution from the CLI or branch name, and formatting.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::git::GitBackend;

/// Branch patterns tried in order; the first capture group is the prefix.
static BRANCH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // feature/JR-1234-add-auth
        r"(?i)^[a-z0-9_.-]+/([a-z][a-z0-9]*-[0-9]+)(?:[-_/.]|$)",
        // JR-1234 or JR-1234-add-auth
        r"(?i)^([a-z][a-z0-9]*-[0-9]+)(?:[-_/.]|$)",
        // JR1234 or JR1234-add-auth, at the start of the name only
        r"(?i)^([a-z]+[0-9]+)(?:[-_/.]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("branch prefix pattern is valid"))
    .collect()
});

/// Accepted shapes for an explicit prefix: `ABC-123`, `ABC123`, `#123`.
static VALID_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9]*-[0-9]+|[A-Za-z]+[0-9]+|#[0-9]+)$")
        .expect("prefix validation pattern is valid")
});

/// How a prefix is rendered in front of the message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixFormat {
    /// `[ABC-123] message`
    #[default]
    Brackets,
    /// `ABC-123: message`
    Colon,
}

impl PrefixFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefixFormat::Brackets => "brackets",
            PrefixFormat::Colon => "colon",
        }
    }
}

impl fmt::Display for PrefixFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrefixFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brackets" => Ok(PrefixFormat::Brackets),
            "colon" => Ok(PrefixFormat::Colon),
            other => Err(ConfigError::InvalidPrefixFormat(other.to_string())),
        }
    }
}

/// Where a prefix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixSource {
    Override,
    Branch,
}

/// A resolved ticket prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub value: String,
    pub source: PrefixSource,
    /// Advisory only; an invalid override is still applied.
    pub valid: bool,
}

/// Resolve the prefix for this run.
///
/// An explicit override always wins. Otherwise, when `auto_detect` is set, the
/// current branch name is matched against the known ticket patterns. A failure
/// to read the branch is logged and treated as no prefix.
pub fn resolve_prefix<G: GitBackend + ?Sized>(
    override_value: Option<&str>,
    auto_detect: bool,
    git: &G,
) -> Option<Prefix> {
    if let Some(value) = override_value.map(str::trim).filter(|v| !v.is_empty()) {
        let valid = is_valid_prefix(value);
        if !valid {
            debug!("Prefix '{}' does not look like a ticket id", value);
        }
        return Some(Prefix {
            value: value.to_string(),
            source: PrefixSource::Override,
            valid,
        });
    }

    if !auto_detect {
        return None;
    }

    let branch = match git.current_branch() {
        Ok(Some(branch)) => branch,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read current branch, skipping prefix detection: {e}");
            return None;
        }
    };

    let value = prefix_from_branch(&branch)?;
    debug!("Detected prefix {} from branch {}", value, branch);
    Some(Prefix {
        value,
        source: PrefixSource::Branch,
        valid: true,
    })
}

/// Extract an uppercase ticket prefix from a branch name.
pub fn prefix_from_branch(branch: &str) -> Option<String> {
    BRANCH_PATTERNS.iter().find_map(|re| {
        re.captures(branch)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_uppercase())
    })
}

/// Whether an explicit prefix has a recognised ticket shape.
pub fn is_valid_prefix(value: &str) -> bool {
    VALID_PREFIX.is_match(value)
}

/// Render `message` with `prefix` in the given style; no prefix leaves it untouched.
pub fn format_with_prefix(message: &str, prefix: Option<&Prefix>, format: PrefixFormat) -> String {
    match prefix {
        None => message.to_string(),
        Some(prefix) => match format {
            PrefixFormat::Brackets => format!("[{}] {}", prefix.value, message),
            PrefixFormat::Colon => format!("{}: {}", prefix.value, message),
        },
    }
}
