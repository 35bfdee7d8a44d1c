//! Identity & hierarchy resolution against the repository collaborator.
//!
//! Absence of a handle is an expected outcome the orchestrator branches on,
//! never an error by itself; the skip-if-parent-missing policy turns an
//! unresolvable reference into either a clean early return (`Ok(None)`) or a
//! fatal [`PackagerError::MissingParent`].

use ark_repo::{ObjectNode, Repository};
use ark_types::Handle;

use crate::error::{PackagerError, PackagerResult};
use crate::params::PackageParameters;

/// Maps package-embedded references to live graph objects and allocates
/// identities per the active mode.
pub struct IdentityResolver<'a> {
    repo: &'a dyn Repository,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Live object for a handle, or `None` if nothing carries it.
    pub fn lookup(&self, handle: &Handle) -> PackagerResult<Option<ObjectNode>> {
        Ok(self.repo.resolve(handle)?)
    }

    /// Live object for a handle that must exist.
    pub fn require(&self, handle: &Handle) -> PackagerResult<ObjectNode> {
        self.lookup(handle)?
            .ok_or_else(|| PackagerError::MissingParent {
                handle: handle.clone(),
            })
    }

    /// Resolve a referenced parent, applying the skip policy.
    ///
    /// `Ok(None)` means the caller should skip the affected branch; without
    /// the skip flag an unresolvable reference fails the whole operation.
    pub fn resolve_parent(
        &self,
        handle: &Handle,
        params: &PackageParameters,
    ) -> PackagerResult<Option<ObjectNode>> {
        match self.lookup(handle)? {
            Some(node) => Ok(Some(node)),
            None if params.skip_if_parent_missing() => {
                tracing::warn!(parent = %handle, "referenced parent missing, skipping branch");
                Ok(None)
            }
            None => Err(PackagerError::MissingParent {
                handle: handle.clone(),
            }),
        }
    }

    /// Allocate the identity for a node about to be materialized.
    ///
    /// Reuse mode returns the package-embedded handle (which must be
    /// present); create mode mints a fresh one from the store.
    pub fn allocate(
        &self,
        embedded: Option<&Handle>,
        reuse_identity: bool,
    ) -> PackagerResult<Handle> {
        if reuse_identity {
            embedded
                .cloned()
                .ok_or(PackagerError::MissingEmbeddedHandle)
        } else {
            Ok(self.repo.mint_handle()?)
        }
    }
}
