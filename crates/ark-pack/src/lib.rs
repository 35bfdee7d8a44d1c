//! Archive package container format for the Ark repository.
//!
//! A package is a single self-describing file holding the descriptive
//! snapshot of exactly one repository object (document section) and, for
//! bitstreams, the raw content stream (content section). Both sections are
//! zstd-compressed and CRC-checked, and the file carries a BLAKE3 trailer.
//!
//! # Architecture
//!
//! - [`PackageDocument`]: one object's own state -- handle, kind, crosswalk
//!   bytes, policy set, child manifest, memberships, content envelope
//! - [`Package`]: document + optional content, with framed
//!   serialize/deserialize and file I/O
//! - [`PackageSet`]: the forest for a subtree, keyed by handle, with the
//!   `TYPE@handle.aip` directory convention

pub mod document;
pub mod error;
pub mod reader;
pub mod set;
pub mod writer;

pub use document::{ChildRef, ContentInfo, Package, PackageDocument};
pub use error::{PackageError, PackageResult};
pub use set::{package_filename, PackageSet, PACKAGE_EXTENSION};
