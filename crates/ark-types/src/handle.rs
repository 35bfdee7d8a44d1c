use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Globally unique, persistent identifier for a repository object.
///
/// A `Handle` is rendered as `prefix/suffix` (e.g. `10673/42`). The prefix
/// names the naming authority, the suffix is unique within it. Once assigned
/// to an object a handle never changes and is never reused; archive packages
/// embed handles so that a restore can recreate the original identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Build a handle from a naming-authority prefix and a local suffix.
    pub fn new(prefix: &str, suffix: &str) -> Result<Self, TypeError> {
        Self::parse(&format!("{prefix}/{suffix}"))
    }

    /// Parse and validate a canonical `prefix/suffix` handle string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let Some((prefix, suffix)) = s.split_once('/') else {
            return Err(TypeError::InvalidHandle(format!(
                "missing '/' separator in '{s}'"
            )));
        };
        if prefix.is_empty() || suffix.is_empty() {
            return Err(TypeError::InvalidHandle(format!(
                "empty prefix or suffix in '{s}'"
            )));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidHandle(format!(
                "whitespace in handle '{s}'"
            )));
        }
        if suffix.contains('/') {
            return Err(TypeError::InvalidHandle(format!(
                "multiple '/' separators in '{s}'"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The naming-authority prefix.
    pub fn prefix(&self) -> &str {
        self.0.split_once('/').map(|(p, _)| p).unwrap_or(&self.0)
    }

    /// The local suffix.
    pub fn suffix(&self) -> &str {
        self.0.split_once('/').map(|(_, s)| s).unwrap_or("")
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename-safe form: the `/` separator flattened to `-`.
    pub fn for_filename(&self) -> String {
        self.0.replace('/', "-")
    }

    /// Parse back from the filename-safe form produced by [`for_filename`].
    ///
    /// Only the first `-` is treated as the flattened separator.
    ///
    /// [`for_filename`]: Handle::for_filename
    pub fn from_filename(s: &str) -> Result<Self, TypeError> {
        let Some((prefix, suffix)) = s.split_once('-') else {
            return Err(TypeError::InvalidHandle(format!(
                "missing '-' separator in filename form '{s}'"
            )));
        };
        Self::new(prefix, suffix)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
