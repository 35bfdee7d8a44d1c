//! Ingestion: creating, restoring, and replacing repository subtrees from
//! archive packages.
//!
//! Three modes share one materialization path:
//!
//! - **Create** mints new handles for every node
//! - **Restore** reuses the package-embedded handles
//! - **Replace** keeps the target's handle and overwrites its own state,
//!   reconciling children against the package manifest
//!
//! The recursive entries drive an explicit worklist over the package forest,
//! resolving every reference through the [`IdentityResolver`]; a branch
//! whose anchor cannot be located is either a fatal failure or, under
//! `skipIfParentMissing`, a logged skip.

use std::collections::{HashMap, HashSet};

use ark_pack::{ChildRef, Package, PackageSet};
use ark_repo::{
    AccessControl, AccessError, NodeBody, ObjectNode, Principal, RepoError, Repository,
};
use ark_types::{Checksum, Handle, NodeKind, PolicyAction};

use crate::crosswalk::MetadataCrosswalk;
use crate::error::{PackagerError, PackagerResult};
use crate::params::PackageParameters;
use crate::resolver::IdentityResolver;

/// How one package was handled by [`Ingester::materialize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// A node was newly created; its manifest children still need work.
    Created,
    /// An existing node was deliberately kept (`keepExisting`); the node
    /// itself is untouched but its children are still traversed, so an
    /// interrupted restore can be resumed.
    Kept,
    /// This operation already processed the node through another path;
    /// nothing below it needs revisiting.
    Duplicate,
}

impl Outcome {
    fn traverse(self) -> bool {
        matches!(self, Self::Created | Self::Kept)
    }
}

/// Per-operation bookkeeping.
#[derive(Default)]
struct IngestState {
    /// Handles materialized, replaced, or deliberately kept this operation.
    /// A second reference to one of these is a duplicate (the mapped-item
    /// case), not an identity collision.
    processed: HashSet<Handle>,
    /// Original handle -> minted handle, create mode only.
    minted: HashMap<Handle, Handle>,
    /// Branches and memberships skipped under `skipIfParentMissing`.
    skipped: Vec<Handle>,
}

/// Consumes packages and mutates the graph per the active mode.
pub struct Ingester<'a> {
    repo: &'a dyn Repository,
    access: &'a dyn AccessControl,
    crosswalk: &'a dyn MetadataCrosswalk,
    principal: &'a Principal,
}

impl<'a> Ingester<'a> {
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

    /// Construct (or restore) exactly one object from one package and attach
    /// it under `parent`.
    ///
    /// `parent` may be `None` only for a root-level restore of a top-level
    /// container, which requires administrative rights. The package's policy
    /// set replaces whatever the node would otherwise carry; zero policies
    /// restore as zero.
    pub fn ingest(
        &self,
        parent: Option<&Handle>,
        package: &Package,
        params: &PackageParameters,
    ) -> PackagerResult<ObjectNode> {
        let mut state = IngestState::default();
        let parent_node = self.resolve_supplied_parent(parent)?;
        let (node, _) = self.materialize(
            parent_node.as_ref(),
            package,
            params,
            params.restore_mode_enabled(),
            &mut state,
        )?;
        Ok(node)
    }

    /// Recursively ingest a package forest under `parent`.
    ///
    /// The root package is processed first, then every manifest child
    /// reference, in an explicit worklist. A referenced package missing from
    /// the set fails the whole operation unless `skipIfParentMissing`
    /// degrades it to a skipped branch.
    pub fn ingest_all(
        &self,
        parent: Option<&Handle>,
        set: &PackageSet,
        params: &PackageParameters,
    ) -> PackagerResult<ObjectNode> {
        let root_pkg = root_package(set)?;
        let reuse = params.restore_mode_enabled();
        let mut state = IngestState::default();

        let parent_node = self.resolve_supplied_parent(parent)?;
        let (root_node, outcome) =
            self.materialize(parent_node.as_ref(), root_pkg, params, reuse, &mut state)?;

        let mut stack = Vec::new();
        if outcome.traverse() {
            push_children(&mut stack, &root_node.handle, &root_pkg.document.children);
        }
        self.drain(stack, set, params, reuse, false, &mut state)?;
        self.finish(&state);
        Ok(root_node)
    }

    /// Overwrite exactly one existing object's own state from a package.
    ///
    /// The target keeps its handle; metadata, content, and policies come
    /// from the package. Children are untouched.
    pub fn replace(
        &self,
        target: &Handle,
        package: &Package,
        params: &PackageParameters,
    ) -> PackagerResult<ObjectNode> {
        let mut state = IngestState::default();
        self.replace_node(target, package, params, &mut state)
    }

    /// Recursively replace `target` and its subtree from a package forest.
    ///
    /// Each node's children are reconciled against its manifest: live
    /// children absent from the manifest are detached, manifest children
    /// absent live are created restore-style with their original handles,
    /// and matches are replaced recursively.
    pub fn replace_all(
        &self,
        target: &Handle,
        set: &PackageSet,
        params: &PackageParameters,
    ) -> PackagerResult<ObjectNode> {
        let root_pkg = root_package(set)?;
        let mut state = IngestState::default();

        let root_node = self.replace_node(target, root_pkg, params, &mut state)?;
        self.reconcile_children(&root_node.handle, &root_pkg.document.children)?;

        let mut stack = Vec::new();
        push_children(&mut stack, &root_node.handle, &root_pkg.document.children);
        self.drain(stack, set, params, true, true, &mut state)?;
        self.finish(&state);
        Ok(root_node)
    }

    /// Worklist loop shared by the recursive entries.
    fn drain(
        &self,
        mut stack: Vec<(Handle, ChildRef)>,
        set: &PackageSet,
        params: &PackageParameters,
        reuse_identity: bool,
        replace: bool,
        state: &mut IngestState,
    ) -> PackagerResult<()> {
        let resolver = IdentityResolver::new(self.repo);
        while let Some((parent_handle, child_ref)) = stack.pop() {
            let Some(child_pkg) = set.get(&child_ref.handle) else {
                // The branch has no anchor package; same policy as a
                // missing parent.
                if params.skip_if_parent_missing() {
                    tracing::warn!(
                        handle = %child_ref.handle,
                        "package missing from set, skipping branch"
                    );
                    state.skipped.push(child_ref.handle.clone());
                    continue;
                }
                return Err(PackagerError::MissingParent {
                    handle: child_ref.handle.clone(),
                });
            };

            if replace
                && !state.processed.contains(&child_ref.handle)
                && resolver.lookup(&child_ref.handle)?.is_some()
            {
                let node = self.replace_node(&child_ref.handle, child_pkg, params, state)?;
                self.reconcile_children(&node.handle, &child_pkg.document.children)?;
                push_children(&mut stack, &node.handle, &child_pkg.document.children);
                continue;
            }

            let parent_node = resolver.require(&parent_handle)?;
            let (node, outcome) =
                self.materialize(Some(&parent_node), child_pkg, params, reuse_identity, state)?;
            if outcome.traverse() {
                push_children(&mut stack, &node.handle, &child_pkg.document.children);
            }
        }
        Ok(())
    }

    /// Construct one object from one package.
    ///
    /// A duplicate reference or a kept existing object comes back with its
    /// live node and only its memberships reconciled.
    fn materialize(
        &self,
        parent: Option<&ObjectNode>,
        package: &Package,
        params: &PackageParameters,
        reuse_identity: bool,
        state: &mut IngestState,
    ) -> PackagerResult<(ObjectNode, Outcome)> {
        let doc = &package.document;
        let resolver = IdentityResolver::new(self.repo);

        // Duplicate and collision detection, before any mutation.
        if reuse_identity {
            if let Some(embedded) = &doc.handle {
                if let Some(existing) = resolver.lookup(embedded)? {
                    if state.processed.contains(embedded) {
                        // This operation already reached the object through
                        // another collection.
                        self.reconcile_memberships(&existing, package, params, state)?;
                        return Ok((existing, Outcome::Duplicate));
                    }
                    if params.keep_existing_enabled() {
                        tracing::debug!(
                            handle = %embedded,
                            "handle already live, keeping existing object"
                        );
                        self.reconcile_memberships(&existing, package, params, state)?;
                        state.processed.insert(embedded.clone());
                        return Ok((existing, Outcome::Kept));
                    }
                    return Err(PackagerError::HandleInUse(embedded.clone()));
                }
            }
        } else if let Some(original) = &doc.handle {
            if let Some(minted) = state.minted.get(original).cloned() {
                let existing = resolver.require(&minted)?;
                self.reconcile_memberships(&existing, package, params, state)?;
                return Ok((existing, Outcome::Duplicate));
            }
        }

        match parent {
            Some(p) => {
                if !p.kind().allows_child(doc.kind) {
                    return Err(PackagerError::InvalidPlacement {
                        parent: p.kind(),
                        child: doc.kind,
                    });
                }
                self.access
                    .authorize(self.principal, &p.handle, PolicyAction::Add)?;
            }
            None => {
                if !(reuse_identity && doc.kind == NodeKind::TopContainer) {
                    return Err(PackagerError::ParentRequired(doc.kind));
                }
                if !self.access.is_admin(self.principal) {
                    return Err(PackagerError::Authorization(AccessError::NotAdmin {
                        principal: self.principal.name.clone(),
                    }));
                }
            }
        }

        let handle = resolver.allocate(doc.handle.as_ref(), reuse_identity)?;
        let metadata = self.crosswalk.from_descriptive(&doc.descriptive, params)?;
        let body = self.decode_body(&handle, package)?;

        let node = ObjectNode::new(handle.clone(), body).with_metadata(metadata);
        self.repo.insert(node.clone())?;
        if let Some(p) = parent {
            if p.kind() == NodeKind::Collection && doc.kind == NodeKind::Item {
                // The supplied parent becomes (or remains) the owning
                // collection.
                self.repo.map_item(&p.handle, &handle, true)?;
            } else {
                self.repo.add_child(&p.handle, &handle)?;
            }
        }
        if let Some(content) = &package.content {
            self.repo.write_content(&handle, content)?;
        }
        self.access.replace_policies(&handle, &doc.policies)?;

        if !reuse_identity {
            if let Some(original) = &doc.handle {
                state.minted.insert(original.clone(), handle.clone());
            }
        }
        state.processed.insert(handle.clone());

        self.reconcile_memberships(&node, package, params, state)?;

        tracing::debug!(handle = %handle, kind = %doc.kind, "materialized object");
        Ok((node, Outcome::Created))
    }

    /// Overwrite one existing object's own state from a package.
    fn replace_node(
        &self,
        target_handle: &Handle,
        package: &Package,
        params: &PackageParameters,
        state: &mut IngestState,
    ) -> PackagerResult<ObjectNode> {
        let doc = &package.document;
        let resolver = IdentityResolver::new(self.repo);
        let target = resolver
            .lookup(target_handle)?
            .ok_or_else(|| PackagerError::Repo(RepoError::NotFound(target_handle.clone())))?;

        self.access
            .authorize(self.principal, target_handle, PolicyAction::Write)?;
        if doc.kind != target.kind() {
            return Err(PackagerError::KindConflict {
                handle: target_handle.clone(),
                package: doc.kind,
                target: target.kind(),
            });
        }
        if let Some(embedded) = &doc.handle {
            if embedded != target_handle {
                return Err(PackagerError::HandleMismatch {
                    embedded: embedded.clone(),
                    target: target_handle.clone(),
                });
            }
        }

        let metadata = self.crosswalk.from_descriptive(&doc.descriptive, params)?;
        let body = self.decode_body(target_handle, package)?;
        let node = ObjectNode::new(target_handle.clone(), body).with_metadata(metadata);
        self.repo.update(&node)?;
        if let Some(content) = &package.content {
            self.repo.write_content(target_handle, content)?;
        }
        self.access.replace_policies(target_handle, &doc.policies)?;
        state.processed.insert(target_handle.clone());

        self.reconcile_memberships(&node, package, params, state)?;

        tracing::debug!(handle = %target_handle, kind = %doc.kind, "replaced object");
        Ok(node)
    }

    /// Detach live children that the package manifest no longer lists.
    ///
    /// An item detached from a collection is deleted only when that was its
    /// last membership; other kinds go with their subtrees.
    fn reconcile_children(&self, handle: &Handle, manifest: &[ChildRef]) -> PackagerResult<()> {
        let keep: HashSet<&Handle> = manifest.iter().map(|c| &c.handle).collect();
        for live in self.repo.children(handle)? {
            if !keep.contains(&live) {
                tracing::warn!(
                    parent = %handle,
                    child = %live,
                    "removing child absent from package manifest"
                );
                self.repo.remove_child(handle, &live)?;
            }
        }
        Ok(())
    }

    /// Re-establish an item's membership in every collection its package
    /// declares.
    ///
    /// A declared collection that does not resolve is skipped (and recorded)
    /// under `skipIfParentMissing`, otherwise fatal. Mapping is idempotent,
    /// so duplicate encounters converge once the collection exists.
    fn reconcile_memberships(
        &self,
        item: &ObjectNode,
        package: &Package,
        params: &PackageParameters,
        state: &mut IngestState,
    ) -> PackagerResult<()> {
        if item.kind() != NodeKind::Item {
            return Ok(());
        }
        let resolver = IdentityResolver::new(self.repo);
        for declared in &package.document.member_of {
            let target = state
                .minted
                .get(declared)
                .cloned()
                .unwrap_or_else(|| declared.clone());
            match resolver.resolve_parent(&target, params)? {
                Some(col) if col.kind() == NodeKind::Collection => {
                    self.repo.map_item(&col.handle, &item.handle, false)?;
                }
                Some(other) => {
                    return Err(PackagerError::InvalidPlacement {
                        parent: other.kind(),
                        child: NodeKind::Item,
                    });
                }
                None => {
                    state.skipped.push(target);
                }
            }
        }
        Ok(())
    }

    /// Decode a package into a node body, verifying content fidelity.
    ///
    /// A bitstream package must carry a content envelope and stream whose
    /// recomputed checksum matches the recorded one; any other kind must
    /// carry neither.
    fn decode_body(&self, handle: &Handle, package: &Package) -> PackagerResult<NodeBody> {
        let doc = &package.document;
        if doc.kind == NodeKind::Bitstream {
            let envelope = doc.content.ok_or_else(|| {
                PackagerError::Malformed("bitstream package has no content envelope".into())
            })?;
            let content = package.content.as_deref().ok_or_else(|| {
                PackagerError::Malformed("bitstream package has no content stream".into())
            })?;
            if content.len() as u64 != envelope.length {
                return Err(PackagerError::Malformed(format!(
                    "content length {} does not match recorded length {}",
                    content.len(),
                    envelope.length
                )));
            }
            let computed = Checksum::from_content(content);
            if computed != envelope.checksum {
                return Err(PackagerError::ChecksumMismatch {
                    handle: handle.clone(),
                    recorded: envelope.checksum.to_hex(),
                    computed: computed.to_hex(),
                });
            }
            Ok(NodeBody::bitstream(computed, envelope.length))
        } else {
            if package.content.is_some() || doc.content.is_some() {
                return Err(PackagerError::Malformed(format!(
                    "a {} package must not carry a content stream",
                    doc.kind
                )));
            }
            NodeBody::for_kind(doc.kind).ok_or_else(|| {
                PackagerError::Malformed(format!("unsupported package kind {}", doc.kind))
            })
        }
    }

    fn resolve_supplied_parent(
        &self,
        parent: Option<&Handle>,
    ) -> PackagerResult<Option<ObjectNode>> {
        let resolver = IdentityResolver::new(self.repo);
        parent.map(|h| resolver.require(h)).transpose()
    }

    fn finish(&self, state: &IngestState) {
        if state.skipped.is_empty() {
            tracing::debug!(processed = state.processed.len(), "ingest complete");
        } else {
            tracing::info!(
                processed = state.processed.len(),
                skipped = state.skipped.len(),
                "ingest complete with skipped branches"
            );
        }
    }
}

fn root_package(set: &PackageSet) -> PackagerResult<&Package> {
    set.root_package().ok_or_else(|| {
        PackagerError::Malformed(format!(
            "package set has no package for root {}",
            set.root_handle()
        ))
    })
}

fn push_children(stack: &mut Vec<(Handle, ChildRef)>, parent: &Handle, children: &[ChildRef]) {
    // Reverse so the stack pops manifest children in recorded order.
    for child in children.iter().rev() {
        stack.push((parent.clone(), child.clone()));
    }
}
