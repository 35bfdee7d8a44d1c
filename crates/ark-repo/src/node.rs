use serde::{Deserialize, Serialize};

use ark_types::{metadata, Checksum, Handle, MetadataEntry, NodeKind};

/// Per-kind payload of a repository object.
///
/// The kind set is closed; codec and orchestrator logic match on it
/// exhaustively. Only bitstreams carry extra state of their own -- edges and
/// policies live in the store collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeBody {
    TopContainer,
    SubContainer,
    Collection,
    Item,
    Bundle,
    Bitstream {
        /// Checksum of the content stream recorded at write time.
        checksum: Checksum,
        /// Content length in bytes.
        length: u64,
    },
}

impl NodeBody {
    /// The kind discriminant of this payload.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::TopContainer => NodeKind::TopContainer,
            Self::SubContainer => NodeKind::SubContainer,
            Self::Collection => NodeKind::Collection,
            Self::Item => NodeKind::Item,
            Self::Bundle => NodeKind::Bundle,
            Self::Bitstream { .. } => NodeKind::Bitstream,
        }
    }

    /// Payload for a kind with no per-kind state.
    ///
    /// Returns `None` for [`NodeKind::Bitstream`], which requires a checksum
    /// and length.
    pub fn for_kind(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::TopContainer => Some(Self::TopContainer),
            NodeKind::SubContainer => Some(Self::SubContainer),
            NodeKind::Collection => Some(Self::Collection),
            NodeKind::Item => Some(Self::Item),
            NodeKind::Bundle => Some(Self::Bundle),
            NodeKind::Bitstream => None,
        }
    }

    /// Bitstream payload.
    pub fn bitstream(checksum: Checksum, length: u64) -> Self {
        Self::Bitstream { checksum, length }
    }
}

/// One repository entity: stable handle, ordered metadata, kind-tagged
/// payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectNode {
    /// Globally unique stable identifier, immutable for the node's life.
    pub handle: Handle,
    /// Ordered descriptive metadata.
    pub metadata: Vec<MetadataEntry>,
    /// Kind-tagged payload.
    pub body: NodeBody,
}

impl ObjectNode {
    /// Create a node with empty metadata.
    pub fn new(handle: Handle, body: NodeBody) -> Self {
        Self {
            handle,
            metadata: Vec::new(),
            body,
        }
    }

    /// Builder-style metadata attachment.
    pub fn with_metadata(mut self, metadata: Vec<MetadataEntry>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builder-style title attachment.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata
            .push(MetadataEntry::new(MetadataEntry::TITLE_FIELD, title));
        self
    }

    /// The kind discriminant.
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// Display name: first `title` metadata value, or empty.
    pub fn display_name(&self) -> &str {
        metadata::display_name(&self.metadata).unwrap_or("")
    }
}

/// One collection membership of an item.
///
/// An item may be a member of several collections; exactly one membership is
/// flagged primary (the owning collection) whenever any membership exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The collection the item is a member of.
    pub collection: Handle,
    /// Whether this is the owning membership.
    pub primary: bool,
}
