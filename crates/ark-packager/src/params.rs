use std::collections::BTreeMap;

/// Recognized-option bag controlling dissemination and ingestion.
///
/// Parameters are constructed builder-style and never mutated once an
/// operation starts. Unrecognized properties are carried unmodified and
/// handed to the metadata crosswalk.
#[derive(Clone, Debug, Default)]
pub struct PackageParameters {
    properties: BTreeMap<String, Vec<String>>,
}

impl PackageParameters {
    /// Reuse package-embedded handles instead of minting new ones.
    pub const RESTORE_MODE: &'static str = "restoreMode";
    /// On a missing parent reference, skip that branch instead of failing
    /// the whole operation.
    pub const SKIP_IF_PARENT_MISSING: &'static str = "skipIfParentMissing";
    /// During restore, skip an object whose handle is already live instead
    /// of failing.
    pub const KEEP_EXISTING: &'static str = "keepExisting";

    /// Empty parameter bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters with restore mode enabled.
    pub fn restore() -> Self {
        Self::new().with_flag(Self::RESTORE_MODE, true)
    }

    /// Append a property value.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Set a boolean flag property.
    pub fn with_flag(self, name: impl Into<String>, value: bool) -> Self {
        self.with_property(name, value.to_string())
    }

    /// First value of a property, if any.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|vs| vs.first())
            .map(String::as_str)
    }

    /// All values of a property.
    pub fn values(&self, name: &str) -> &[String] {
        self.properties.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Boolean flag: `true` only if the first value parses as true.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.property(name), Some("true") | Some("yes") | Some("1"))
    }

    /// Whether ingestion reuses package-embedded handles.
    pub fn restore_mode_enabled(&self) -> bool {
        self.flag(Self::RESTORE_MODE)
    }

    /// Whether a missing parent degrades to a skipped branch.
    pub fn skip_if_parent_missing(&self) -> bool {
        self.flag(Self::SKIP_IF_PARENT_MISSING)
    }

    /// Whether a restore skips objects whose handle is already live.
    pub fn keep_existing_enabled(&self) -> bool {
        self.flag(Self::KEEP_EXISTING)
    }

    /// Every property, for pass-through to the crosswalk.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
