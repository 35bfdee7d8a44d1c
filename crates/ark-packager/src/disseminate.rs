//! Dissemination: exporting repository subtrees into archive packages.
//!
//! Dissemination is purely read-and-serialize. Nothing in the graph is
//! mutated; authorization requires Read on every exported node.

use chrono::Utc;

use ark_pack::{ChildRef, ContentInfo, Package, PackageDocument, PackageSet};
use ark_repo::{AccessControl, ObjectNode, Principal, Repository};
use ark_types::{Checksum, Handle, NodeKind, PolicyAction};

use crate::crosswalk::MetadataCrosswalk;
use crate::error::PackagerResult;
use crate::params::PackageParameters;
use crate::resolver::IdentityResolver;

/// Walks the object graph outward from a root and produces packages.
pub struct Disseminator<'a> {
    repo: &'a dyn Repository,
    access: &'a dyn AccessControl,
    crosswalk: &'a dyn MetadataCrosswalk,
    principal: &'a Principal,
}

impl<'a> Disseminator<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        access: &'a dyn AccessControl,
        crosswalk: &'a dyn MetadataCrosswalk,
        principal: &'a Principal,
    ) -> Self {
        Self {
            repo,
            access,
            crosswalk,
            principal,
        }
    }

    /// Produce exactly one package describing `root`'s own state.
    ///
    /// The package records metadata, policies, the handle and kind of every
    /// direct child, item memberships, and for a bitstream the content
    /// stream with its checksum. It does not recurse.
    pub fn disseminate(
        &self,
        root: &Handle,
        params: &PackageParameters,
    ) -> PackagerResult<Package> {
        let resolver = IdentityResolver::new(self.repo);
        let node = resolver.require(root)?;
        self.package_node(&node, params)
    }

    /// Recursively disseminate `root` and every descendant.
    ///
    /// One package per node, parent before children. A mapped item reached
    /// through several collections is packaged once.
    pub fn disseminate_all(
        &self,
        root: &Handle,
        params: &PackageParameters,
    ) -> PackagerResult<PackageSet> {
        let resolver = IdentityResolver::new(self.repo);
        let mut set = PackageSet::new(root.clone());

        let mut stack: Vec<Handle> = vec![root.clone()];
        while let Some(handle) = stack.pop() {
            if set.get(&handle).is_some() {
                // Already packaged: an item mapped into several collections.
                continue;
            }
            let node = resolver.require(&handle)?;
            let package = self.package_node(&node, params)?;
            // Children in reverse so the stack pops them in stored order.
            for child in package.document.children.iter().rev() {
                stack.push(child.handle.clone());
            }
            set.insert(package)?;
        }

        tracing::info!(root = %root, count = set.len(), "disseminated package set");
        Ok(set)
    }

    fn package_node(
        &self,
        node: &ObjectNode,
        params: &PackageParameters,
    ) -> PackagerResult<Package> {
        self.access
            .authorize(self.principal, &node.handle, PolicyAction::Read)?;

        let descriptive = self.crosswalk.to_descriptive(&node.metadata, params)?;
        let policies = self.access.policies(&node.handle)?;

        let resolver = IdentityResolver::new(self.repo);
        let mut children = Vec::new();
        for child_handle in self.repo.children(&node.handle)? {
            let child = resolver.require(&child_handle)?;
            children.push(ChildRef::new(child_handle, child.kind()));
        }

        let member_of: Vec<Handle> = if node.kind() == NodeKind::Item {
            self.repo
                .memberships(&node.handle)?
                .into_iter()
                .map(|m| m.collection)
                .collect()
        } else {
            Vec::new()
        };

        let mut document = PackageDocument {
            handle: Some(node.handle.clone()),
            kind: node.kind(),
            exported_at: Utc::now(),
            descriptive,
            policies,
            children,
            member_of,
            content: None,
        };

        if node.kind() == NodeKind::Bitstream {
            let content = self.repo.read_content(&node.handle)?;
            document.content = Some(ContentInfo {
                checksum: Checksum::from_content(&content),
                length: content.len() as u64,
            });
            tracing::debug!(handle = %node.handle, bytes = content.len(), "packaged bitstream");
            return Ok(Package::with_content(document, content));
        }

        tracing::debug!(handle = %node.handle, kind = %node.kind(), "packaged object");
        Ok(Package::new(document))
    }
}
