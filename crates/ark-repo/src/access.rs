//! Access-control seam: policy CRUD and permission checks.
//!
//! The real access-control engine lives outside this workspace; the packager
//! only needs to read a node's policy set, replace it wholesale during a
//! restore, and ask whether a principal may act. [`MemoryAccessControl`] is
//! the in-memory reference implementation used by tests and embedders.

use std::collections::HashMap;
use std::sync::RwLock;

use ark_types::{Handle, PolicyAction, ResourcePolicy};

use crate::error::{AccessError, AccessResult};

/// The acting identity for an engine invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Account name, used in denial messages.
    pub name: String,
    /// Groups the principal belongs to.
    pub groups: Vec<String>,
    /// Whether the principal holds repository-wide administrative rights.
    pub admin: bool,
}

impl Principal {
    /// A repository administrator.
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            admin: true,
        }
    }

    /// An ordinary principal with group memberships.
    pub fn member_of(name: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            name: name.into(),
            groups,
            admin: false,
        }
    }
}

/// Policy storage and permission checks for repository objects.
///
/// Policy sets restore exactly as written: `replace_policies` with an empty
/// slice leaves the object with zero policies, and `policies` then returns
/// an empty list rather than any inherited default.
pub trait AccessControl: Send + Sync {
    /// The policy set recorded on an object. Empty if none.
    fn policies(&self, handle: &Handle) -> AccessResult<Vec<ResourcePolicy>>;

    /// Replace an object's policy set wholesale.
    fn replace_policies(&self, handle: &Handle, policies: &[ResourcePolicy]) -> AccessResult<()>;

    /// Remove every policy from an object.
    fn remove_policies(&self, handle: &Handle) -> AccessResult<()> {
        self.replace_policies(handle, &[])
    }

    /// Check that `principal` may perform `action` on the object.
    ///
    /// Administrators pass every check. Returns
    /// [`AccessError::Denied`] otherwise when no policy grants the action to
    /// one of the principal's groups.
    fn authorize(
        &self,
        principal: &Principal,
        handle: &Handle,
        action: PolicyAction,
    ) -> AccessResult<()>;

    /// Whether the principal holds repository-wide administrative rights.
    fn is_admin(&self, principal: &Principal) -> bool;
}

/// An in-memory implementation of [`AccessControl`].
///
/// Deny-by-default: a non-admin principal is authorized only by an explicit
/// policy granting the action (or `Admin`) to one of its groups.
#[derive(Default)]
pub struct MemoryAccessControl {
    policies: RwLock<HashMap<Handle, Vec<ResourcePolicy>>>,
}

impl MemoryAccessControl {
    /// Create an empty policy table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccessControl for MemoryAccessControl {
    fn policies(&self, handle: &Handle) -> AccessResult<Vec<ResourcePolicy>> {
        let table = self.policies.read().expect("lock poisoned");
        Ok(table.get(handle).cloned().unwrap_or_default())
    }

    fn replace_policies(&self, handle: &Handle, policies: &[ResourcePolicy]) -> AccessResult<()> {
        let mut table = self.policies.write().expect("lock poisoned");
        if policies.is_empty() {
            table.remove(handle);
        } else {
            table.insert(handle.clone(), policies.to_vec());
        }
        Ok(())
    }

    fn authorize(
        &self,
        principal: &Principal,
        handle: &Handle,
        action: PolicyAction,
    ) -> AccessResult<()> {
        if principal.admin {
            return Ok(());
        }
        let table = self.policies.read().expect("lock poisoned");
        let granted = table.get(handle).is_some_and(|policies| {
            policies.iter().any(|p| {
                (p.action == action || p.action == PolicyAction::Admin)
                    && principal.groups.iter().any(|g| g == &p.group)
            })
        });
        if granted {
            Ok(())
        } else {
            Err(AccessError::Denied {
                principal: principal.name.clone(),
                action,
                handle: handle.clone(),
            })
        }
    }

    fn is_admin(&self, principal: &Principal) -> bool {
        principal.admin
    }
}

impl std::fmt::Debug for MemoryAccessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.policies.read().expect("lock poisoned").len();
        f.debug_struct("MemoryAccessControl")
            .field("objects_with_policies", &count)
            .finish()
    }
}
