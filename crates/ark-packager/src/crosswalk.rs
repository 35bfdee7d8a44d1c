//! Metadata crosswalk seam.
//!
//! The crosswalk translates between the repository's metadata entry list and
//! the descriptive document embedded in a package. Real deployments plug in
//! schema-aware crosswalks; [`JsonCrosswalk`] is the reference
//! implementation used by tests and embedders.

use ark_types::MetadataEntry;
use thiserror::Error;

use crate::params::PackageParameters;

/// Errors from metadata translation.
#[derive(Debug, Error)]
pub enum CrosswalkError {
    #[error("descriptive encoding failed: {0}")]
    Encode(String),

    #[error("descriptive decoding failed: {0}")]
    Decode(String),
}

/// Translates metadata entries to and from package-embedded descriptive
/// documents. The document bytes are opaque to every other component.
pub trait MetadataCrosswalk: Send + Sync {
    /// Encode an entry list into a descriptive document.
    fn to_descriptive(
        &self,
        metadata: &[MetadataEntry],
        params: &PackageParameters,
    ) -> Result<Vec<u8>, CrosswalkError>;

    /// Decode a descriptive document back into an entry list.
    fn from_descriptive(
        &self,
        descriptive: &[u8],
        params: &PackageParameters,
    ) -> Result<Vec<MetadataEntry>, CrosswalkError>;
}

/// Reference crosswalk: the entry list as a JSON array.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCrosswalk;

impl MetadataCrosswalk for JsonCrosswalk {
    fn to_descriptive(
        &self,
        metadata: &[MetadataEntry],
        _params: &PackageParameters,
    ) -> Result<Vec<u8>, CrosswalkError> {
        serde_json::to_vec(metadata).map_err(|e| CrosswalkError::Encode(e.to_string()))
    }

    fn from_descriptive(
        &self,
        descriptive: &[u8],
        _params: &PackageParameters,
    ) -> Result<Vec<MetadataEntry>, CrosswalkError> {
        serde_json::from_slice(descriptive).map_err(|e| CrosswalkError::Decode(e.to_string()))
    }
}
