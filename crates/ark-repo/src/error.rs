use ark_types::{Handle, NodeKind, PolicyAction};

/// Errors from repository graph operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The referenced object does not exist.
    #[error("object not found: {0}")]
    NotFound(Handle),

    /// An object with this handle already exists.
    #[error("handle already in use: {0}")]
    DuplicateHandle(Handle),

    /// A containment or membership edge that violates the hierarchy rules.
    #[error("invalid link {parent} -> {child}: {reason}")]
    InvalidLink {
        parent: Handle,
        child: Handle,
        reason: String,
    },

    /// The operation expected a different node kind.
    #[error("kind mismatch for {handle}: expected {expected}, got {actual}")]
    KindMismatch {
        handle: Handle,
        expected: NodeKind,
        actual: NodeKind,
    },

    /// A bitstream node with no stored content.
    #[error("no content stored for bitstream {0}")]
    MissingContent(Handle),

    /// Internal store inconsistency.
    #[error("store inconsistency: {0}")]
    Inconsistent(String),
}

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from access-control operations.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The principal lacks the required permission.
    #[error("{principal} denied {action} on {handle}")]
    Denied {
        principal: String,
        action: PolicyAction,
        handle: Handle,
    },

    /// The principal lacks administrative rights required by the operation.
    #[error("{principal} is not an administrator")]
    NotAdmin { principal: String },
}

/// Result alias for access-control operations.
pub type AccessResult<T> = Result<T, AccessError>;
