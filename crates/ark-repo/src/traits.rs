use ark_types::Handle;

use crate::error::RepoResult;
use crate::node::{Membership, ObjectNode};

/// Graph store for repository objects.
///
/// All implementations must satisfy these invariants:
/// - Handles are unique store-wide; once assigned they never change and are
///   never reused for a different object.
/// - `resolve` reports absence as `Ok(None)`, never as an error. Absence is
///   an expected outcome callers branch on.
/// - Containment edges follow the kind hierarchy; collection -> item
///   relations go through the membership operations, never `add_child`.
/// - Whenever an item has any membership, exactly one is primary.
/// - Removing an item's last membership removes the item and its subtree;
///   removing a container subtree leaves mapped items alive in collections
///   outside the removed subtree.
/// - Transaction boundaries are the caller's concern; the store applies each
///   operation as requested.
pub trait Repository: Send + Sync {
    /// Look up a live object by handle.
    ///
    /// Returns `Ok(None)` if no object carries the handle.
    fn resolve(&self, handle: &Handle) -> RepoResult<Option<ObjectNode>>;

    /// Allocate a fresh, never-used handle.
    fn mint_handle(&self) -> RepoResult<Handle>;

    /// Insert a new object. Fails if the handle is already in use.
    ///
    /// The object starts unlinked; attach it with [`add_child`] or
    /// [`map_item`].
    ///
    /// [`add_child`]: Repository::add_child
    /// [`map_item`]: Repository::map_item
    fn insert(&self, node: ObjectNode) -> RepoResult<()>;

    /// Overwrite an existing object's own state (metadata, payload).
    ///
    /// Edges and content are unaffected. Fails if the handle is unknown.
    fn update(&self, node: &ObjectNode) -> RepoResult<()>;

    /// Remove an object and its whole subtree.
    ///
    /// Mapped items survive when they retain a membership outside the
    /// removed subtree. Returns `false` if the handle was unknown.
    fn remove_subtree(&self, handle: &Handle) -> RepoResult<bool>;

    /// Attach `child` under `parent` as a containment edge.
    ///
    /// Rejects edges the kind hierarchy forbids, including
    /// collection -> item (use [`map_item`](Repository::map_item)).
    fn add_child(&self, parent: &Handle, child: &Handle) -> RepoResult<()>;

    /// Detach `child` from `parent` and remove the child's subtree.
    ///
    /// For a collection parent this is membership removal: the item is
    /// deleted only when this was its last membership. Returns `false` if no
    /// such edge existed.
    fn remove_child(&self, parent: &Handle, child: &Handle) -> RepoResult<bool>;

    /// Direct children of an object, in stored order.
    ///
    /// For a collection, the member items (owned and mapped).
    fn children(&self, handle: &Handle) -> RepoResult<Vec<Handle>>;

    /// Establish an item's membership in a collection. Idempotent.
    ///
    /// When `primary` is set, this membership becomes the owning one and any
    /// previous primary is demoted. An item's first membership is always
    /// primary regardless of the flag.
    fn map_item(&self, collection: &Handle, item: &Handle, primary: bool) -> RepoResult<()>;

    /// Remove an item's membership in a collection.
    ///
    /// Removing the last membership removes the item and its subtree; if the
    /// primary membership is removed and others remain, one of them is
    /// promoted. Returns `false` if no such membership existed.
    fn unmap_item(&self, collection: &Handle, item: &Handle) -> RepoResult<bool>;

    /// All memberships of an item, primary first.
    fn memberships(&self, item: &Handle) -> RepoResult<Vec<Membership>>;

    /// Read a bitstream's content stream.
    fn read_content(&self, bitstream: &Handle) -> RepoResult<Vec<u8>>;

    /// Store a bitstream's content stream, replacing any previous bytes.
    fn write_content(&self, bitstream: &Handle, content: &[u8]) -> RepoResult<()>;

    /// Check whether a handle resolves to a live object.
    fn exists(&self, handle: &Handle) -> RepoResult<bool> {
        Ok(self.resolve(handle)?.is_some())
    }
}
