use std::path::Path;

use crate::document::Package;
use crate::error::{PackageError, PackageResult};

pub(crate) const MAGIC: &[u8; 4] = b"ARKP";
pub(crate) const VERSION: u32 = 1;

impl Package {
    /// Serialize to the framed container format.
    ///
    /// Layout: magic + version + content flag, then the zstd-compressed
    /// document section and (for bitstream packages) the compressed content
    /// section, each varint-length-prefixed and CRC32-checked, ending in a
    /// BLAKE3 trailer over everything before it.
    pub fn to_bytes(&self) -> PackageResult<Vec<u8>> {
        let doc_bytes = serde_json::to_vec(&self.document)
            .map_err(|e| PackageError::Serialization(e.to_string()))?;

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.push(u8::from(self.content.is_some()));

        write_section(&mut out, &doc_bytes)?;
        if let Some(content) = &self.content {
            write_section(&mut out, content)?;
        }

        let trailer = *blake3::hash(&out).as_bytes();
        out.extend_from_slice(&trailer);
        Ok(out)
    }

    /// Write the package to a file.
    pub fn write_to(&self, path: &Path) -> PackageResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        Ok(())
    }
}

/// Write one varint-prefixed, zstd-compressed, CRC-checked section.
fn write_section(out: &mut Vec<u8>, data: &[u8]) -> PackageResult<()> {
    let compressed =
        zstd::encode_all(data, 3).map_err(|e| PackageError::CompressionFailed(e.to_string()))?;
    encode_varint(out, data.len() as u64);
    encode_varint(out, compressed.len() as u64);
    out.extend_from_slice(&compressed);
    out.extend_from_slice(&crc32fast::hash(&compressed).to_be_bytes());
    Ok(())
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> PackageResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(PackageError::CorruptEntry {
                offset: 0,
                reason: "varint overflow".into(),
            });
        }
    }
    Err(PackageError::CorruptEntry {
        offset: 0,
        reason: "truncated varint".into(),
    })
}
