use std::fmt;

use serde::{Deserialize, Serialize};

/// Action a resource policy grants on a repository object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyAction {
    /// Read the object and its metadata.
    Read,
    /// Modify the object's own state.
    Write,
    /// Attach children under the object.
    Add,
    /// Detach children from the object.
    Remove,
    /// Administer the object, implies all other actions on it.
    Admin,
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

/// One access rule on a repository object: a group granted an action.
///
/// Policy sets are restored exactly as exported. An object exported with an
/// empty policy set is restored with an empty policy set; absence is a valid
/// state, not a trigger for default inheritance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePolicy {
    /// Optional administrative label for the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Group the rule applies to.
    pub group: String,
    /// Action the group is granted.
    pub action: PolicyAction,
}

impl ResourcePolicy {
    /// Unnamed rule granting `action` to `group`.
    pub fn new(group: impl Into<String>, action: PolicyAction) -> Self {
        Self {
            name: None,
            group: group.into(),
            action,
        }
    }

    /// Named rule granting `action` to `group`.
    pub fn named(
        name: impl Into<String>,
        group: impl Into<String>,
        action: PolicyAction,
    ) -> Self {
        Self {
            name: Some(name.into()),
            group: group.into(),
            action,
        }
    }
}
