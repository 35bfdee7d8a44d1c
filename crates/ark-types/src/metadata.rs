use serde::{Deserialize, Serialize};

/// One descriptive metadata value on a repository object.
///
/// Entries are ordered; repeating the same field accumulates values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Field name, e.g. `title` or `creator`.
    pub field: String,
    /// Optional field qualifier, e.g. `alternative`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// Optional ISO language tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// The value itself.
    pub value: String,
}

impl MetadataEntry {
    /// Unqualified entry with no language tag.
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            qualifier: None,
            language: None,
            value: value.into(),
        }
    }

    /// The object display name is the first `title` value.
    pub const TITLE_FIELD: &'static str = "title";
}

/// First `title` value in an entry list, if any.
pub fn display_name(entries: &[MetadataEntry]) -> Option<&str> {
    entries
        .iter()
        .find(|e| e.field == MetadataEntry::TITLE_FIELD)
        .map(|e| e.value.as_str())
}
