//! AIP export/import engine for the Ark repository.
//!
//! Serializes a hierarchical object graph (top-level container ->
//! sub-container -> collection -> item -> bundle -> bitstream) into
//! self-describing archive packages and reconstructs it under three
//! semantics: plain ingest (new identities), restore (original identities),
//! and replace (overwrite in place, children reconciled).
//!
//! # Architecture
//!
//! - [`PackageParameters`]: recognized options plus an open extension bag
//! - [`MetadataCrosswalk`]: seam to the external metadata translation layer
//! - [`Disseminator`]: read-only export, one package per node
//! - [`Ingester`]: the restore/replace orchestrator
//! - [`IdentityResolver`]: handle lookup and identity allocation
//!
//! One call is a sequential depth-first traversal; transaction boundaries
//! around it belong to the caller. The only sanctioned partial outcome is a
//! branch skipped under `skipIfParentMissing`.

pub mod crosswalk;
pub mod disseminate;
pub mod error;
pub mod ingest;
pub mod params;
pub mod resolver;

pub use crosswalk::{CrosswalkError, JsonCrosswalk, MetadataCrosswalk};
pub use disseminate::Disseminator;
pub use error::{PackagerError, PackagerResult};
pub use ingest::Ingester;
pub use params::PackageParameters;
pub use resolver::IdentityResolver;
