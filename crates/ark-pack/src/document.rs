use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ark_types::{Checksum, Handle, NodeKind, ResourcePolicy};

/// Manifest reference to one direct child of the packaged object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    /// The child's handle at export time.
    pub handle: Handle,
    /// The child's kind at export time.
    pub kind: NodeKind,
}

impl ChildRef {
    /// Manifest reference for a child.
    pub fn new(handle: Handle, kind: NodeKind) -> Self {
        Self { handle, kind }
    }
}

/// Content envelope recorded for a bitstream package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfo {
    /// Checksum of the raw content stream at export time.
    pub checksum: Checksum,
    /// Content length in bytes.
    pub length: u64,
}

/// The descriptive snapshot of exactly one object's own state.
///
/// A document never describes descendants beyond the child manifest: one
/// package per node, and packages for a subtree form a forest keyed by
/// handle. The `descriptive` bytes are produced by the metadata crosswalk
/// and are opaque to the container layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDocument {
    /// Original handle of the packaged object. Always written on export;
    /// optional on input so externally produced packages can omit it (plain
    /// ingest mints identities anyway).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
    /// Kind of the packaged object.
    pub kind: NodeKind,
    /// When the package was produced.
    pub exported_at: DateTime<Utc>,
    /// Crosswalk-encoded descriptive metadata, opaque here.
    #[serde(default)]
    pub descriptive: Vec<u8>,
    /// The object's access policies at export time. An empty set is a
    /// faithful state, not an omission.
    #[serde(default)]
    pub policies: Vec<ResourcePolicy>,
    /// Every direct child that existed at export time.
    #[serde(default)]
    pub children: Vec<ChildRef>,
    /// For items: every collection membership, owning collection first.
    #[serde(default)]
    pub member_of: Vec<Handle>,
    /// For bitstreams: the content envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentInfo>,
}

/// One archive package: descriptive document plus, for bitstreams, the raw
/// content stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    pub document: PackageDocument,
    pub content: Option<Vec<u8>>,
}

impl Package {
    /// Package with no content stream.
    pub fn new(document: PackageDocument) -> Self {
        Self {
            document,
            content: None,
        }
    }

    /// Package carrying a content stream.
    pub fn with_content(document: PackageDocument, content: Vec<u8>) -> Self {
        Self {
            document,
            content: Some(content),
        }
    }

    /// The embedded handle, if the producer recorded one.
    pub fn handle(&self) -> Option<&Handle> {
        self.document.handle.as_ref()
    }

    /// Kind of the packaged object.
    pub fn kind(&self) -> NodeKind {
        self.document.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(kind: NodeKind) -> PackageDocument {
        PackageDocument {
            handle: Some(Handle::parse("10673/5").unwrap()),
            kind,
            exported_at: Utc::now(),
            descriptive: b"{}".to_vec(),
            policies: Vec::new(),
            children: Vec::new(),
            member_of: Vec::new(),
            content: None,
        }
    }

    #[test]
    fn document_serde_roundtrip() {
        let mut d = doc(NodeKind::Collection);
        d.children.push(ChildRef::new(
            Handle::parse("10673/6").unwrap(),
            NodeKind::Item,
        ));
        let json = serde_json::to_vec(&d).unwrap();
        let back: PackageDocument = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn document_defaults_for_sparse_input() {
        // A minimal externally produced document: kind and timestamp only.
        let json = format!(
            "{{\"kind\":\"Item\",\"exported_at\":\"{}\"}}",
            Utc::now().to_rfc3339()
        );
        let d: PackageDocument = serde_json::from_str(&json).unwrap();
        assert!(d.handle.is_none());
        assert!(d.policies.is_empty());
        assert!(d.children.is_empty());
        assert!(d.content.is_none());
    }

    #[test]
    fn package_accessors() {
        let p = Package::with_content(
            {
                let mut d = doc(NodeKind::Bitstream);
                d.content = Some(ContentInfo {
                    checksum: Checksum::from_content(b"bytes"),
                    length: 5,
                });
                d
            },
            b"bytes".to_vec(),
        );
        assert_eq!(p.kind(), NodeKind::Bitstream);
        assert_eq!(p.handle().unwrap().as_str(), "10673/5");
    }
}
