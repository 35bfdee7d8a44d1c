//! End-to-end backup and restore scenarios over a realistic hierarchy:
//!
//! ```text
//! "University Archives"            (top container)
//!   "Sciences Division"            (sub-container)
//!     "Physics Department"         (sub-container)
//!       "Lab Notebooks"            (collection)
//!         "Lab Notebooks Item #1"
//!         "Lab Notebooks Item #2"
//!         "Mapped Item"            (mapped membership)
//!     "Field Recordings"           (collection)
//!       "Field Recordings Item #1" (bundle + bitstream)
//!       "Mapped Item"              (owning membership)
//! ```

use std::collections::HashMap;

use ark_packager::{Disseminator, Ingester, JsonCrosswalk, PackageParameters, PackagerError};
use ark_repo::{
    AccessControl, InMemoryRepository, MemoryAccessControl, NodeBody, ObjectNode, Principal,
    Repository,
};
use ark_types::{Checksum, Handle, NodeKind, PolicyAction, ResourcePolicy};

const BITSTREAM_CONTENT: &[u8] = b"field recording waveform bytes";

struct World {
    repo: InMemoryRepository,
    access: MemoryAccessControl,
    admin: Principal,
}

impl World {
    fn new() -> Self {
        Self {
            repo: InMemoryRepository::new("10673"),
            access: MemoryAccessControl::new(),
            admin: Principal::admin("root"),
        }
    }

    fn disseminator(&self) -> Disseminator<'_> {
        Disseminator::new(&self.repo, &self.access, &JsonCrosswalk, &self.admin)
    }

    fn ingester(&self) -> Ingester<'_> {
        Ingester::new(&self.repo, &self.access, &JsonCrosswalk, &self.admin)
    }

    fn insert(&self, body: NodeBody, title: &str) -> Handle {
        let handle = self.repo.mint_handle().unwrap();
        self.repo
            .insert(ObjectNode::new(handle.clone(), body).with_title(title))
            .unwrap();
        handle
    }

    fn insert_bitstream(&self, bundle: &Handle, title: &str, content: &[u8]) -> Handle {
        let handle = self.repo.mint_handle().unwrap();
        self.repo
            .insert(
                ObjectNode::new(
                    handle.clone(),
                    NodeBody::bitstream(Checksum::from_content(content), content.len() as u64),
                )
                .with_title(title),
            )
            .unwrap();
        self.repo.add_child(bundle, &handle).unwrap();
        self.repo.write_content(&handle, content).unwrap();
        handle
    }

    fn rename(&self, handle: &Handle, title: &str) {
        let node = self.repo.resolve(handle).unwrap().unwrap();
        self.repo
            .update(&ObjectNode::new(node.handle.clone(), node.body).with_title(title))
            .unwrap();
    }
}

struct Hierarchy {
    top: Handle,
    child: Handle,
    grandchild: Handle,
    main_col: Handle,
    deep_col: Handle,
    test_item: Handle,
    mapped: Handle,
    deep_item1: Handle,
    deep_item2: Handle,
    bundle: Handle,
    bitstream: Handle,
}

fn build(world: &World) -> Hierarchy {
    let top = world.insert(NodeBody::TopContainer, "University Archives");
    let child = world.insert(NodeBody::SubContainer, "Sciences Division");
    world.repo.add_child(&top, &child).unwrap();
    let grandchild = world.insert(NodeBody::SubContainer, "Physics Department");
    world.repo.add_child(&child, &grandchild).unwrap();

    let deep_col = world.insert(NodeBody::Collection, "Lab Notebooks");
    world.repo.add_child(&grandchild, &deep_col).unwrap();
    let main_col = world.insert(NodeBody::Collection, "Field Recordings");
    world.repo.add_child(&child, &main_col).unwrap();

    let test_item = world.insert(NodeBody::Item, "Field Recordings Item #1");
    world.repo.map_item(&main_col, &test_item, true).unwrap();
    let bundle = world.insert(NodeBody::Bundle, "ORIGINAL");
    world.repo.add_child(&test_item, &bundle).unwrap();
    let bitstream = world.insert_bitstream(&bundle, "Test Recording", BITSTREAM_CONTENT);

    let mapped = world.insert(NodeBody::Item, "Mapped Item");
    world.repo.map_item(&main_col, &mapped, true).unwrap();
    world.repo.map_item(&deep_col, &mapped, false).unwrap();

    let deep_item1 = world.insert(NodeBody::Item, "Lab Notebooks Item #1");
    world.repo.map_item(&deep_col, &deep_item1, true).unwrap();
    let deep_item2 = world.insert(NodeBody::Item, "Lab Notebooks Item #2");
    world.repo.map_item(&deep_col, &deep_item2, true).unwrap();

    Hierarchy {
        top,
        child,
        grandchild,
        main_col,
        deep_col,
        test_item,
        mapped,
        deep_item1,
        deep_item2,
        bundle,
        bitstream,
    }
}

/// Handle -> (kind, display name) snapshot of a subtree.
fn save_info(
    repo: &dyn Repository,
    handle: &Handle,
    info: &mut HashMap<Handle, (NodeKind, String)>,
) {
    let node = repo.resolve(handle).unwrap().unwrap();
    info.insert(
        handle.clone(),
        (node.kind(), node.display_name().to_string()),
    );
    for child in repo.children(handle).unwrap() {
        if !info.contains_key(&child) {
            save_info(repo, &child, info);
        }
    }
}

fn assert_all_exist(repo: &dyn Repository, info: &HashMap<Handle, (NodeKind, String)>) {
    assert!(!info.is_empty(), "cannot assert against an empty snapshot");
    for (handle, (kind, name)) in info {
        let node = repo
            .resolve(handle)
            .unwrap()
            .unwrap_or_else(|| panic!("object {handle} should exist"));
        assert_eq!(node.kind(), *kind, "kind of {handle}");
        assert_eq!(node.display_name(), name, "name of {handle}");
    }
}

fn assert_none_exist(repo: &dyn Repository, info: &HashMap<Handle, (NodeKind, String)>) {
    assert!(!info.is_empty(), "cannot assert against an empty snapshot");
    for handle in info.keys() {
        assert!(
            repo.resolve(handle).unwrap().is_none(),
            "object {handle} should not exist"
        );
    }
}

#[test]
fn restore_full_hierarchy_reproduces_identity() {
    let world = World::new();
    let h = build(&world);

    let mut info = HashMap::new();
    save_info(&world.repo, &h.top, &mut info);
    assert_eq!(info.len(), 11);

    // Export through the disk round trip, the way an operator would.
    let set = world
        .disseminator()
        .disseminate_all(&h.top, &PackageParameters::new())
        .unwrap();
    assert_eq!(set.len(), 11);
    let dir = tempfile::tempdir().unwrap();
    let root_path = set.write_to_dir(dir.path()).unwrap();

    world.repo.remove_subtree(&h.top).unwrap();
    assert_none_exist(&world.repo, &info);

    // Hierarchical restores with mapped items need the skip flag: the
    // mapped item's owning collection is reached after the item itself.
    let loaded = ark_pack::PackageSet::load(&root_path).unwrap();
    let params = PackageParameters::restore()
        .with_flag(PackageParameters::SKIP_IF_PARENT_MISSING, true);
    let restored = world.ingester().ingest_all(None, &loaded, &params).unwrap();
    assert_eq!(restored.handle, h.top);

    assert_all_exist(&world.repo, &info);
    assert_eq!(world.repo.memberships(&h.mapped).unwrap().len(), 2);
}

#[test]
fn restore_restricted_container_keeps_policies() {
    let world = World::new();
    let h = build(&world);

    let wing = world.insert(NodeBody::SubContainer, "Restricted Wing");
    world.repo.add_child(&h.top, &wing).unwrap();
    let policies = vec![ResourcePolicy::named(
        "Admin Read-Only",
        "administrators",
        PolicyAction::Read,
    )];
    world.access.replace_policies(&wing, &policies).unwrap();

    let package = world
        .disseminator()
        .disseminate(&wing, &PackageParameters::new())
        .unwrap();

    world.repo.remove_child(&h.top, &wing).unwrap();
    assert!(world.repo.resolve(&wing).unwrap().is_none());

    world
        .ingester()
        .ingest(Some(&h.top), &package, &PackageParameters::restore())
        .unwrap();

    let restored = world.access.policies(&wing).unwrap();
    assert_eq!(restored.len(), policies.len());
    assert_eq!(restored[0].name, policies[0].name);
    assert_eq!(restored[0].group, policies[0].group);
    assert_eq!(restored[0].action, policies[0].action);
}

#[test]
fn replace_full_hierarchy_restores_counts() {
    let world = World::new();
    let h = build(&world);

    let mut info = HashMap::new();
    save_info(&world.repo, &h.top, &mut info);
    let collections_before = info
        .values()
        .filter(|(kind, _)| *kind == NodeKind::Collection)
        .count();
    let items_before = world.repo.children(&h.main_col).unwrap().len();

    let set = world
        .disseminator()
        .disseminate_all(&h.top, &PackageParameters::new())
        .unwrap();

    // Delete one collection; its exclusive item dies with it, the mapped
    // item survives in the other collection.
    world.repo.remove_child(&h.child, &h.main_col).unwrap();
    assert!(world.repo.resolve(&h.main_col).unwrap().is_none());
    assert!(world.repo.resolve(&h.test_item).unwrap().is_none());
    assert!(world.repo.resolve(&h.mapped).unwrap().is_some());

    let params = PackageParameters::restore()
        .with_flag(PackageParameters::SKIP_IF_PARENT_MISSING, true);
    world.ingester().replace_all(&h.top, &set, &params).unwrap();

    assert!(world.repo.resolve(&h.main_col).unwrap().is_some());
    assert!(world.repo.resolve(&h.test_item).unwrap().is_some());

    let mut info_after = HashMap::new();
    save_info(&world.repo, &h.top, &mut info_after);
    let collections_after = info_after
        .values()
        .filter(|(kind, _)| *kind == NodeKind::Collection)
        .count();
    assert_eq!(collections_after, collections_before);
    assert_eq!(
        world.repo.children(&h.main_col).unwrap().len(),
        items_before
    );
    assert_eq!(world.repo.memberships(&h.mapped).unwrap().len(), 2);
}

#[test]
fn replace_container_only_reverts_name() {
    let world = World::new();
    let h = build(&world);

    let package = world
        .disseminator()
        .disseminate(&h.top, &PackageParameters::new())
        .unwrap();

    world.rename(&h.top, "This is NOT my container name!");
    assert_eq!(
        world.repo.resolve(&h.top).unwrap().unwrap().display_name(),
        "This is NOT my container name!"
    );

    let replaced = world
        .ingester()
        .replace(&h.top, &package, &PackageParameters::restore())
        .unwrap();
    assert_eq!(replaced.handle, h.top);
    assert_eq!(
        world.repo.resolve(&h.top).unwrap().unwrap().display_name(),
        "University Archives"
    );
}

#[test]
fn interrupted_restore_resumes_with_keep_existing() {
    let world = World::new();
    let h = build(&world);

    let mut info = HashMap::new();
    save_info(&world.repo, &h.main_col, &mut info);

    let set = world
        .disseminator()
        .disseminate_all(&h.main_col, &PackageParameters::new())
        .unwrap();

    // Deleting the collection kills its exclusive item; the mapped item
    // survives in the other collection.
    world.repo.remove_child(&h.child, &h.main_col).unwrap();
    assert!(world.repo.resolve(&h.main_col).unwrap().is_none());
    assert_eq!(world.repo.memberships(&h.mapped).unwrap().len(), 1);

    // The surviving mapped item makes a strict restore collide.
    let err = world
        .ingester()
        .ingest_all(Some(&h.child), &set, &PackageParameters::restore())
        .unwrap_err();
    assert!(matches!(err, PackagerError::HandleInUse(ref handle) if *handle == h.mapped));

    // Rerunning with keepExisting completes the restore: existing objects
    // are kept, missing ones are filled in, and the mapped membership is
    // re-established.
    let params = PackageParameters::restore()
        .with_flag(PackageParameters::KEEP_EXISTING, true);
    world
        .ingester()
        .ingest_all(Some(&h.child), &set, &params)
        .unwrap();

    assert_all_exist(&world.repo, &info);
    assert_eq!(world.repo.memberships(&h.mapped).unwrap().len(), 2);
}

#[test]
fn restore_item_with_bitstream_preserves_checksum() {
    let world = World::new();
    let h = build(&world);

    let exported_checksum = Checksum::from_content(BITSTREAM_CONTENT);

    let set = world
        .disseminator()
        .disseminate_all(&h.test_item, &PackageParameters::new())
        .unwrap();
    assert_eq!(set.len(), 3);

    world.repo.unmap_item(&h.main_col, &h.test_item).unwrap();
    assert!(world.repo.resolve(&h.test_item).unwrap().is_none());
    assert!(world.repo.resolve(&h.bitstream).unwrap().is_none());

    world
        .ingester()
        .ingest_all(Some(&h.main_col), &set, &PackageParameters::restore())
        .unwrap();

    let restored = world.repo.resolve(&h.bitstream).unwrap().unwrap();
    assert_eq!(restored.display_name(), "Test Recording");
    match restored.body {
        NodeBody::Bitstream { checksum, length } => {
            assert_eq!(checksum, exported_checksum);
            assert_eq!(length, BITSTREAM_CONTENT.len() as u64);
        }
        other => panic!("expected a bitstream body, got {other:?}"),
    }
    let content = world.repo.read_content(&h.bitstream).unwrap();
    assert_eq!(content, BITSTREAM_CONTENT);
    assert_eq!(Checksum::from_content(&content), exported_checksum);
    assert_eq!(
        world.repo.children(&h.bundle).unwrap(),
        vec![h.bitstream.clone()]
    );
}

#[test]
fn restore_restricted_item_keeps_policy_triples() {
    let world = World::new();
    let h = build(&world);

    let item = world.insert(NodeBody::Item, "Restricted Scan");
    world.repo.map_item(&h.main_col, &item, true).unwrap();
    let bundle = world.insert(NodeBody::Bundle, "ORIGINAL");
    world.repo.add_child(&item, &bundle).unwrap();
    world.insert_bitstream(&bundle, "Scan Page", b"restricted page bytes");

    let policies = vec![ResourcePolicy::named(
        "Admin Read-Only",
        "administrators",
        PolicyAction::Read,
    )];
    world.access.replace_policies(&item, &policies).unwrap();

    let set = world
        .disseminator()
        .disseminate_all(&item, &PackageParameters::new())
        .unwrap();

    world.repo.unmap_item(&h.main_col, &item).unwrap();
    assert!(world.repo.resolve(&item).unwrap().is_none());

    world
        .ingester()
        .ingest_all(Some(&h.main_col), &set, &PackageParameters::restore())
        .unwrap();

    let restored = world.access.policies(&item).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].name.as_deref(), Some("Admin Read-Only"));
    assert_eq!(restored[0].group, "administrators");
    assert_eq!(restored[0].action, PolicyAction::Read);
}

#[test]
fn replace_item_reverts_metadata() {
    let world = World::new();
    let h = build(&world);

    let set = world
        .disseminator()
        .disseminate_all(&h.test_item, &PackageParameters::new())
        .unwrap();

    world.rename(&h.test_item, "This is NOT my item name!");

    let replaced = world
        .ingester()
        .replace_all(&h.test_item, &set, &PackageParameters::restore())
        .unwrap();
    assert_eq!(replaced.handle, h.test_item);
    assert_eq!(
        world
            .repo
            .resolve(&h.test_item)
            .unwrap()
            .unwrap()
            .display_name(),
        "Field Recordings Item #1"
    );
}

#[test]
fn restore_mapped_item_recovers_both_memberships() {
    let world = World::new();
    let h = build(&world);

    assert_eq!(world.repo.memberships(&h.mapped).unwrap().len(), 2);

    let package = world
        .disseminator()
        .disseminate(&h.mapped, &PackageParameters::new())
        .unwrap();
    // Owning collection first in the declared memberships.
    assert_eq!(
        package.document.member_of,
        vec![h.main_col.clone(), h.deep_col.clone()]
    );

    // The item must be removed from both collections to delete it.
    world.repo.unmap_item(&h.main_col, &h.mapped).unwrap();
    world.repo.unmap_item(&h.deep_col, &h.mapped).unwrap();
    assert!(world.repo.resolve(&h.mapped).unwrap().is_none());

    world
        .ingester()
        .ingest(Some(&h.main_col), &package, &PackageParameters::restore())
        .unwrap();

    let memberships = world.repo.memberships(&h.mapped).unwrap();
    assert_eq!(memberships.len(), 2);
    assert!(memberships[0].primary);
    assert_eq!(memberships[0].collection, h.main_col);
}

#[test]
fn missing_package_fails_without_skip_flag() {
    let world = World::new();
    let h = build(&world);

    let mut set = world
        .disseminator()
        .disseminate_all(&h.top, &PackageParameters::new())
        .unwrap();
    set.remove(&h.deep_col).unwrap();

    world.repo.remove_subtree(&h.top).unwrap();

    let err = world
        .ingester()
        .ingest_all(None, &set, &PackageParameters::restore())
        .unwrap_err();
    assert!(matches!(err, PackagerError::MissingParent { .. }));
}

#[test]
fn missing_package_skips_branch_with_flag() {
    let world = World::new();
    let h = build(&world);

    let mut set = world
        .disseminator()
        .disseminate_all(&h.top, &PackageParameters::new())
        .unwrap();
    set.remove(&h.deep_col).unwrap();

    world.repo.remove_subtree(&h.top).unwrap();

    let params = PackageParameters::restore()
        .with_flag(PackageParameters::SKIP_IF_PARENT_MISSING, true);
    world.ingester().ingest_all(None, &set, &params).unwrap();

    // Everything outside the skipped branch is back.
    for handle in [&h.top, &h.child, &h.grandchild, &h.main_col, &h.test_item, &h.mapped] {
        assert!(
            world.repo.resolve(handle).unwrap().is_some(),
            "{handle} should be restored"
        );
    }
    // The skipped branch stays absent, including items only it anchored.
    for handle in [&h.deep_col, &h.deep_item1, &h.deep_item2] {
        assert!(
            world.repo.resolve(handle).unwrap().is_none(),
            "{handle} should remain absent"
        );
    }
    // The mapped item lost only the membership into the skipped collection.
    assert_eq!(world.repo.memberships(&h.mapped).unwrap().len(), 1);
}

#[test]
fn replace_all_removes_children_missing_from_manifest() {
    let world = World::new();
    let h = build(&world);

    let set = world
        .disseminator()
        .disseminate_all(&h.main_col, &PackageParameters::new())
        .unwrap();

    let interloper = world.insert(NodeBody::Item, "Interloper");
    world.repo.map_item(&h.main_col, &interloper, true).unwrap();
    assert_eq!(world.repo.children(&h.main_col).unwrap().len(), 3);

    world
        .ingester()
        .replace_all(&h.main_col, &set, &PackageParameters::restore())
        .unwrap();

    assert!(world.repo.resolve(&interloper).unwrap().is_none());
    assert_eq!(world.repo.children(&h.main_col).unwrap().len(), 2);
}
