use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The kind of a repository object.
///
/// The hierarchy is closed and small: top-level containers hold
/// sub-containers and collections, sub-containers hold further
/// sub-containers and collections, collections hold items, items hold
/// bundles, bundles hold bitstreams. Bitstreams are leaves carrying raw
/// content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root-level container. The only kind with no parent.
    TopContainer,
    /// Nested container under another container.
    SubContainer,
    /// Holds items; the unit items are mapped into.
    Collection,
    /// A single archival work, member of one or more collections.
    Item,
    /// Named grouping of bitstreams within an item.
    Bundle,
    /// Leaf node carrying raw content with a checksum.
    Bitstream,
}

impl NodeKind {
    /// Stable lower-case label used in logs and package file names.
    pub fn type_text(&self) -> &'static str {
        match self {
            Self::TopContainer => "top-container",
            Self::SubContainer => "sub-container",
            Self::Collection => "collection",
            Self::Item => "item",
            Self::Bundle => "bundle",
            Self::Bitstream => "bitstream",
        }
    }

    /// Parse a [`type_text`](Self::type_text) label.
    pub fn from_type_text(s: &str) -> Result<Self, TypeError> {
        match s {
            "top-container" => Ok(Self::TopContainer),
            "sub-container" => Ok(Self::SubContainer),
            "collection" => Ok(Self::Collection),
            "item" => Ok(Self::Item),
            "bundle" => Ok(Self::Bundle),
            "bitstream" => Ok(Self::Bitstream),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }

    /// Containment rule: may a node of this kind hold a `child` directly?
    pub fn allows_child(&self, child: NodeKind) -> bool {
        matches!(
            (*self, child),
            (Self::TopContainer | Self::SubContainer, Self::SubContainer)
                | (Self::TopContainer | Self::SubContainer, Self::Collection)
                | (Self::Collection, Self::Item)
                | (Self::Item, Self::Bundle)
                | (Self::Bundle, Self::Bitstream)
        )
    }

    /// Returns `true` for the container kinds (anything that is not a leaf
    /// item component).
    pub fn is_container(&self) -> bool {
        matches!(self, Self::TopContainer | Self::SubContainer)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_text())
    }
}
