use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ark_types::{Handle, NodeKind};

use crate::document::Package;
use crate::error::{PackageError, PackageResult};

/// File extension for archive packages.
pub const PACKAGE_EXTENSION: &str = "aip";

/// File name for a package: `TYPE@handle.aip`, handle separator flattened.
pub fn package_filename(kind: NodeKind, handle: &Handle) -> String {
    format!(
        "{}@{}.{}",
        kind.type_text().to_uppercase(),
        handle.for_filename(),
        PACKAGE_EXTENSION
    )
}

/// The package forest for one subtree: the root package plus one package per
/// descendant, keyed by embedded handle.
///
/// Insertion order is preserved and a disseminated set is parent-before-
/// child, so a single pass can resolve parents first; consumers must not
/// rely on it and should resolve handles explicitly.
#[derive(Debug)]
pub struct PackageSet {
    root: Handle,
    packages: Vec<Package>,
    index: HashMap<Handle, usize>,
}

impl PackageSet {
    /// Empty set rooted at `root`.
    pub fn new(root: Handle) -> Self {
        Self {
            root,
            packages: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The root object's handle.
    pub fn root_handle(&self) -> &Handle {
        &self.root
    }

    /// The root package, if it has been inserted.
    pub fn root_package(&self) -> Option<&Package> {
        self.get(&self.root)
    }

    /// Add a package. It must carry an embedded handle, unique in the set.
    pub fn insert(&mut self, package: Package) -> PackageResult<()> {
        let handle = package
            .handle()
            .cloned()
            .ok_or(PackageError::MissingHandle)?;
        if self.index.contains_key(&handle) {
            return Err(PackageError::DuplicatePackage(handle));
        }
        self.index.insert(handle, self.packages.len());
        self.packages.push(package);
        Ok(())
    }

    /// Look up a package by embedded handle.
    pub fn get(&self, handle: &Handle) -> Option<&Package> {
        self.index.get(handle).map(|&i| &self.packages[i])
    }

    /// Remove a package by handle, keeping the rest of the set intact.
    pub fn remove(&mut self, handle: &Handle) -> Option<Package> {
        let i = self.index.remove(handle)?;
        let package = self.packages.remove(i);
        for idx in self.index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(package)
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns `true` if no packages have been inserted.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    /// Write every package into `dir` under the naming convention.
    ///
    /// Returns the path of the root package file.
    pub fn write_to_dir(&self, dir: &Path) -> PackageResult<PathBuf> {
        let root_package = self.root_package().ok_or_else(|| PackageError::CorruptEntry {
            offset: 0,
            reason: format!("set has no package for root {}", self.root),
        })?;
        let root_path = dir.join(package_filename(root_package.kind(), &self.root));
        for package in &self.packages {
            let handle = package.handle().ok_or(PackageError::MissingHandle)?;
            let path = dir.join(package_filename(package.kind(), handle));
            package.write_to(&path)?;
        }
        tracing::debug!(count = self.len(), dir = %dir.display(), "wrote package set");
        Ok(root_path)
    }

    /// Load a set starting from the root package file.
    ///
    /// Every sibling `.aip` file in the root's directory joins the set; the
    /// root package must embed its handle.
    pub fn load(root_path: &Path) -> PackageResult<Self> {
        let root_package = Package::open(root_path)?;
        let root = root_package
            .handle()
            .cloned()
            .ok_or(PackageError::MissingHandle)?;
        let mut set = Self::new(root);
        set.insert(root_package)?;

        let dir = root_path.parent().unwrap_or_else(|| Path::new("."));
        let mut siblings: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension().and_then(|e| e.to_str()) == Some(PACKAGE_EXTENSION)
                    && p != root_path
            })
            .collect();
        siblings.sort();
        for path in siblings {
            set.insert(Package::open(&path)?)?;
        }
        tracing::debug!(count = set.len(), root = %set.root, "loaded package set");
        Ok(set)
    }
}
