//! In-memory repository for tests and ephemeral use.
//!
//! [`InMemoryRepository`] keeps the whole graph in `HashMap` tables behind a
//! single `RwLock`: nodes by handle, containment edges, membership edges,
//! and bitstream content. It implements the full [`Repository`] trait,
//! including the cascade rules (an item disappears with its last
//! membership; mapped items survive the removal of one of their
//! collections).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use ark_types::{Handle, NodeKind};

use crate::error::{RepoError, RepoResult};
use crate::node::{Membership, ObjectNode};
use crate::traits::Repository;

#[derive(Default)]
struct Tables {
    nodes: HashMap<Handle, ObjectNode>,
    /// Containment edges, ordered. Collection -> item edges are NOT here.
    children: HashMap<Handle, Vec<Handle>>,
    /// Item -> memberships.
    memberships: HashMap<Handle, Vec<Membership>>,
    /// Collection -> member items, ordered (owned and mapped).
    collection_items: HashMap<Handle, Vec<Handle>>,
    /// Bitstream -> content bytes.
    content: HashMap<Handle, Vec<u8>>,
}

/// An in-memory implementation of [`Repository`].
///
/// Handles are minted as `prefix/N` from an atomic sequence. All data is
/// lost when the repository is dropped.
pub struct InMemoryRepository {
    prefix: String,
    next_suffix: AtomicU64,
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    /// Create an empty repository minting handles under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_suffix: AtomicU64::new(1),
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.tables.read().expect("lock poisoned").nodes.len()
    }

    /// Returns `true` if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.tables.read().expect("lock poisoned").nodes.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new("10673")
    }
}

/// Remove a node and its subtree from the tables.
///
/// Collection removal detaches each member item; an item is deleted only
/// when the detached membership was its last one.
fn delete_subtree(t: &mut Tables, handle: &Handle) {
    let Some(kind) = t.nodes.get(handle).map(ObjectNode::kind) else {
        return;
    };
    match kind {
        NodeKind::TopContainer | NodeKind::SubContainer => {
            for child in t.children.remove(handle).unwrap_or_default() {
                delete_subtree(t, &child);
            }
        }
        NodeKind::Collection => {
            for item in t.collection_items.remove(handle).unwrap_or_default() {
                detach_membership(t, handle, &item);
            }
        }
        NodeKind::Item => {
            for m in t.memberships.remove(handle).unwrap_or_default() {
                if let Some(items) = t.collection_items.get_mut(&m.collection) {
                    items.retain(|h| h != handle);
                }
            }
            for bundle in t.children.remove(handle).unwrap_or_default() {
                delete_subtree(t, &bundle);
            }
        }
        NodeKind::Bundle => {
            for bitstream in t.children.remove(handle).unwrap_or_default() {
                delete_subtree(t, &bitstream);
            }
        }
        NodeKind::Bitstream => {
            t.content.remove(handle);
        }
    }
    t.nodes.remove(handle);
}

/// Remove one membership edge. Returns `true` if the edge existed.
fn detach_membership(t: &mut Tables, collection: &Handle, item: &Handle) -> bool {
    if let Some(items) = t.collection_items.get_mut(collection) {
        items.retain(|h| h != item);
    }
    let (was_primary, now_empty) = {
        let Some(ms) = t.memberships.get_mut(item) else {
            return false;
        };
        let Some(primary) = ms
            .iter()
            .find(|m| &m.collection == collection)
            .map(|m| m.primary)
        else {
            return false;
        };
        ms.retain(|m| &m.collection != collection);
        (primary, ms.is_empty())
    };
    if now_empty {
        t.memberships.remove(item);
        delete_subtree(t, item);
    } else if was_primary {
        if let Some(first) = t.memberships.get_mut(item).and_then(|ms| ms.first_mut()) {
            first.primary = true;
        }
    }
    true
}

impl Repository for InMemoryRepository {
    fn resolve(&self, handle: &Handle) -> RepoResult<Option<ObjectNode>> {
        let t = self.tables.read().expect("lock poisoned");
        Ok(t.nodes.get(handle).cloned())
    }

    fn mint_handle(&self) -> RepoResult<Handle> {
        let t = self.tables.read().expect("lock poisoned");
        loop {
            let suffix = self.next_suffix.fetch_add(1, Ordering::SeqCst);
            let handle = Handle::new(&self.prefix, &suffix.to_string())
                .map_err(|e| RepoError::Inconsistent(e.to_string()))?;
            // A restore may have re-inserted a handle ahead of the sequence.
            if !t.nodes.contains_key(&handle) {
                return Ok(handle);
            }
        }
    }

    fn insert(&self, node: ObjectNode) -> RepoResult<()> {
        let mut t = self.tables.write().expect("lock poisoned");
        if t.nodes.contains_key(&node.handle) {
            return Err(RepoError::DuplicateHandle(node.handle.clone()));
        }
        t.nodes.insert(node.handle.clone(), node);
        Ok(())
    }

    fn update(&self, node: &ObjectNode) -> RepoResult<()> {
        let mut t = self.tables.write().expect("lock poisoned");
        if !t.nodes.contains_key(&node.handle) {
            return Err(RepoError::NotFound(node.handle.clone()));
        }
        t.nodes.insert(node.handle.clone(), node.clone());
        Ok(())
    }

    fn remove_subtree(&self, handle: &Handle) -> RepoResult<bool> {
        let mut t = self.tables.write().expect("lock poisoned");
        if !t.nodes.contains_key(handle) {
            return Ok(false);
        }
        let before = t.nodes.len();
        delete_subtree(&mut t, handle);
        tracing::debug!(
            handle = %handle,
            removed = before - t.nodes.len(),
            "removed subtree"
        );
        Ok(true)
    }

    fn add_child(&self, parent: &Handle, child: &Handle) -> RepoResult<()> {
        let mut t = self.tables.write().expect("lock poisoned");
        let parent_kind = t
            .nodes
            .get(parent)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(parent.clone()))?;
        let child_kind = t
            .nodes
            .get(child)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(child.clone()))?;
        if parent_kind == NodeKind::Collection && child_kind == NodeKind::Item {
            return Err(RepoError::InvalidLink {
                parent: parent.clone(),
                child: child.clone(),
                reason: "collection membership goes through map_item".into(),
            });
        }
        if !parent_kind.allows_child(child_kind) {
            return Err(RepoError::InvalidLink {
                parent: parent.clone(),
                child: child.clone(),
                reason: format!("{parent_kind} cannot hold {child_kind}"),
            });
        }
        let children = t.children.entry(parent.clone()).or_default();
        if !children.contains(child) {
            children.push(child.clone());
        }
        Ok(())
    }

    fn remove_child(&self, parent: &Handle, child: &Handle) -> RepoResult<bool> {
        let mut t = self.tables.write().expect("lock poisoned");
        let parent_kind = t
            .nodes
            .get(parent)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(parent.clone()))?;
        if parent_kind == NodeKind::Collection {
            return Ok(detach_membership(&mut t, parent, child));
        }
        let existed = match t.children.get_mut(parent) {
            Some(children) => {
                let before = children.len();
                children.retain(|h| h != child);
                children.len() != before
            }
            None => false,
        };
        if existed {
            delete_subtree(&mut t, child);
        }
        Ok(existed)
    }

    fn children(&self, handle: &Handle) -> RepoResult<Vec<Handle>> {
        let t = self.tables.read().expect("lock poisoned");
        let kind = t
            .nodes
            .get(handle)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(handle.clone()))?;
        let table = if kind == NodeKind::Collection {
            &t.collection_items
        } else {
            &t.children
        };
        Ok(table.get(handle).cloned().unwrap_or_default())
    }

    fn map_item(&self, collection: &Handle, item: &Handle, primary: bool) -> RepoResult<()> {
        let mut t = self.tables.write().expect("lock poisoned");
        let collection_kind = t
            .nodes
            .get(collection)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(collection.clone()))?;
        if collection_kind != NodeKind::Collection {
            return Err(RepoError::KindMismatch {
                handle: collection.clone(),
                expected: NodeKind::Collection,
                actual: collection_kind,
            });
        }
        let item_kind = t
            .nodes
            .get(item)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(item.clone()))?;
        if item_kind != NodeKind::Item {
            return Err(RepoError::KindMismatch {
                handle: item.clone(),
                expected: NodeKind::Item,
                actual: item_kind,
            });
        }

        let ms = t.memberships.entry(item.clone()).or_default();
        let primary = primary || ms.is_empty();
        match ms.iter().position(|m| &m.collection == collection) {
            Some(existing) => {
                if primary {
                    for (i, m) in ms.iter_mut().enumerate() {
                        m.primary = i == existing;
                    }
                }
            }
            None => {
                if primary {
                    for m in ms.iter_mut() {
                        m.primary = false;
                    }
                }
                ms.push(Membership {
                    collection: collection.clone(),
                    primary,
                });
            }
        }

        let items = t.collection_items.entry(collection.clone()).or_default();
        if !items.contains(item) {
            items.push(item.clone());
        }
        Ok(())
    }

    fn unmap_item(&self, collection: &Handle, item: &Handle) -> RepoResult<bool> {
        let mut t = self.tables.write().expect("lock poisoned");
        Ok(detach_membership(&mut t, collection, item))
    }

    fn memberships(&self, item: &Handle) -> RepoResult<Vec<Membership>> {
        let t = self.tables.read().expect("lock poisoned");
        let mut ms = t.memberships.get(item).cloned().unwrap_or_default();
        // Primary first, remaining order preserved.
        ms.sort_by_key(|m| !m.primary);
        Ok(ms)
    }

    fn read_content(&self, bitstream: &Handle) -> RepoResult<Vec<u8>> {
        let t = self.tables.read().expect("lock poisoned");
        let kind = t
            .nodes
            .get(bitstream)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(bitstream.clone()))?;
        if kind != NodeKind::Bitstream {
            return Err(RepoError::KindMismatch {
                handle: bitstream.clone(),
                expected: NodeKind::Bitstream,
                actual: kind,
            });
        }
        t.content
            .get(bitstream)
            .cloned()
            .ok_or_else(|| RepoError::MissingContent(bitstream.clone()))
    }

    fn write_content(&self, bitstream: &Handle, content: &[u8]) -> RepoResult<()> {
        let mut t = self.tables.write().expect("lock poisoned");
        let kind = t
            .nodes
            .get(bitstream)
            .map(ObjectNode::kind)
            .ok_or_else(|| RepoError::NotFound(bitstream.clone()))?;
        if kind != NodeKind::Bitstream {
            return Err(RepoError::KindMismatch {
                handle: bitstream.clone(),
                expected: NodeKind::Bitstream,
                actual: kind,
            });
        }
        t.content.insert(bitstream.clone(), content.to_vec());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("prefix", &self.prefix)
            .field("node_count", &self.len())
            .finish()
    }
}
