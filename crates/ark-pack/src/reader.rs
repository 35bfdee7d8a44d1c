use std::path::Path;

use crate::document::{Package, PackageDocument};
use crate::error::{PackageError, PackageResult};
use crate::writer::{decode_varint, MAGIC, VERSION};

// magic + version + content flag + trailer
const MIN_LEN: usize = 4 + 4 + 1 + 32;

impl Package {
    /// Parse a package from its framed container bytes.
    ///
    /// Verifies magic, version, the BLAKE3 trailer, and each section's
    /// CRC32 and declared lengths before decoding the document. The content
    /// flag must agree with the document's content envelope.
    pub fn from_bytes(data: &[u8]) -> PackageResult<Self> {
        if data.len() < MIN_LEN {
            return Err(PackageError::CorruptEntry {
                offset: 0,
                reason: "package data too short".into(),
            });
        }
        if &data[0..4] != MAGIC {
            return Err(PackageError::InvalidMagic {
                expected: String::from_utf8_lossy(MAGIC).into(),
                actual: String::from_utf8_lossy(&data[0..4]).into(),
            });
        }
        let version = u32::from_be_bytes(data[4..8].try_into().expect("4-byte slice"));
        if version != VERSION {
            return Err(PackageError::UnsupportedVersion(version));
        }

        let body_end = data.len() - 32;
        let trailer: [u8; 32] = data[body_end..].try_into().expect("32-byte slice");
        if *blake3::hash(&data[..body_end]).as_bytes() != trailer {
            return Err(PackageError::TrailerMismatch);
        }

        let has_content = match data[8] {
            0 => false,
            1 => true,
            other => {
                return Err(PackageError::CorruptEntry {
                    offset: 8,
                    reason: format!("invalid content flag: {other}"),
                })
            }
        };

        let mut pos = 9usize;
        let doc_bytes = read_section(&data[..body_end], &mut pos, "document")?;
        let content = if has_content {
            Some(read_section(&data[..body_end], &mut pos, "content")?)
        } else {
            None
        };
        if pos != body_end {
            return Err(PackageError::CorruptEntry {
                offset: pos as u64,
                reason: "trailing bytes after last section".into(),
            });
        }

        let document: PackageDocument = serde_json::from_slice(&doc_bytes)
            .map_err(|e| PackageError::Serialization(e.to_string()))?;

        // The envelope and the content section must agree.
        if document.content.is_some() != content.is_some() {
            return Err(PackageError::CorruptEntry {
                offset: 9,
                reason: "content envelope and content section disagree".into(),
            });
        }

        Ok(Self { document, content })
    }

    /// Read a package from a file.
    ///
    /// A missing or unreadable file surfaces immediately as
    /// [`PackageError::Io`], before any interpretation of the content.
    pub fn open(path: &Path) -> PackageResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }
}

/// Read one varint-prefixed, zstd-compressed, CRC-checked section.
fn read_section(data: &[u8], pos: &mut usize, section: &'static str) -> PackageResult<Vec<u8>> {
    let offset = *pos as u64;

    let (uncompressed_len, consumed) = decode_varint(&data[*pos..])?;
    *pos += consumed;
    let (compressed_len, consumed) = decode_varint(&data[*pos..])?;
    *pos += consumed;

    let end = *pos + compressed_len as usize;
    if end + 4 > data.len() {
        return Err(PackageError::CorruptEntry {
            offset,
            reason: "section extends beyond package".into(),
        });
    }
    let compressed = &data[*pos..end];
    *pos = end;

    let expected_crc = u32::from_be_bytes(data[*pos..*pos + 4].try_into().expect("4-byte slice"));
    *pos += 4;
    if crc32fast::hash(compressed) != expected_crc {
        return Err(PackageError::CrcMismatch { section });
    }

    let decompressed = zstd::decode_all(compressed)
        .map_err(|e| PackageError::DecompressionFailed(e.to_string()))?;
    if decompressed.len() != uncompressed_len as usize {
        return Err(PackageError::CorruptEntry {
            offset,
            reason: format!(
                "size mismatch: expected {uncompressed_len}, got {}",
                decompressed.len()
            ),
        });
    }
    Ok(decompressed)
}
