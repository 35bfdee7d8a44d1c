use ark_pack::PackageError;
use ark_repo::{AccessError, RepoError};
use ark_types::{Handle, NodeKind};
use thiserror::Error;

use crate::crosswalk::CrosswalkError;

/// Errors from packaging operations.
///
/// I/O failures on the container surface through [`PackagerError::Package`]
/// (`PackageError::Io`) before any graph mutation is attempted. A
/// [`MissingParent`](PackagerError::MissingParent) is fatal to the whole
/// operation unless the parameters allow skipping the affected branch.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The package is structurally unusable for the requested operation.
    #[error("malformed package: {0}")]
    Malformed(String),

    /// Recomputed content checksum disagrees with the recorded one.
    #[error("checksum mismatch for {handle}: recorded {recorded}, computed {computed}")]
    ChecksumMismatch {
        handle: Handle,
        recorded: String,
        computed: String,
    },

    /// Restore found the embedded handle already live.
    #[error("handle already in use: {0}")]
    HandleInUse(Handle),

    /// The package's embedded handle names a different object than the
    /// replace target.
    #[error("embedded handle {embedded} does not match target {target}")]
    HandleMismatch { embedded: Handle, target: Handle },

    /// Restore requires the package to embed its original handle.
    #[error("restore requires an embedded handle in the package")]
    MissingEmbeddedHandle,

    /// The package kind cannot be placed under the given parent kind.
    #[error("a {child} package cannot be placed under a {parent} object")]
    InvalidPlacement { parent: NodeKind, child: NodeKind },

    /// The package kind disagrees with the replace target's kind.
    #[error("package kind {package} does not match {handle} which is a {target}")]
    KindConflict {
        handle: Handle,
        package: NodeKind,
        target: NodeKind,
    },

    /// Only a root-level restore of a top-level container may omit the
    /// parent.
    #[error("parent required to ingest a {0} package")]
    ParentRequired(NodeKind),

    /// A referenced parent or subtree anchor could not be located.
    #[error("missing parent {handle}")]
    MissingParent { handle: Handle },

    /// Metadata translation failure, fatal to the affected node.
    #[error("crosswalk failure: {0}")]
    Crosswalk(#[from] CrosswalkError),

    /// The principal lacks a required permission.
    #[error("authorization failure: {0}")]
    Authorization(#[from] AccessError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type PackagerResult<T> = Result<T, PackagerError>;
