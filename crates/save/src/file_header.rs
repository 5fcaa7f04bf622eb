// ---------------------------------------------------------------------------
// file_header – on-disk container around the logical save stream
// ---------------------------------------------------------------------------
//
// Header format (20 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "DSG1"
//   [4..8]   Container format version (u32)
//   [8..12]  Uncompressed logical stream size (u32)
//   [12..16] xxHash32 checksum of the compressed payload
//   [16..20] Reserved flags (u32, 0)
//
// The payload is one LZ4 block with its size prepended.

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

/// Magic bytes identifying a save container.
pub const MAGIC: [u8; 4] = *b"DSG1";

/// Size of the container header in bytes.
pub const HEADER_SIZE: usize = 20;

/// Current container layout version; independent of the save stream version.
pub const CONTAINER_VERSION: u32 = 1;

/// Seed for xxHash32 checksum.
const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub format_version: u32,
    pub uncompressed_size: u32,
    pub checksum: u32,
    pub flags: u32,
}

/// Compresses the logical stream and prepends the container header.
pub fn wrap_container(stream: &[u8]) -> Vec<u8> {
    let payload = lz4_flex::compress_prepend_size(stream);
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
    out.extend_from_slice(&(stream.len() as u32).to_le_bytes());
    out.extend_from_slice(&xxh32(&payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Parses and validates the container header without decompressing.
pub fn read_container_header(bytes: &[u8]) -> Result<ContainerHeader, SaveError> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        return Err(SaveError::BadMagic(
            "file does not start with the save container magic".to_string(),
        ));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::corrupt(format!(
            "container header truncated ({} bytes, need {HEADER_SIZE})",
            bytes.len()
        )));
    }
    let header = ContainerHeader {
        format_version: le_u32(bytes, 4),
        uncompressed_size: le_u32(bytes, 8),
        checksum: le_u32(bytes, 12),
        flags: le_u32(bytes, 16),
    };
    if header.format_version > CONTAINER_VERSION {
        return Err(SaveError::UnsupportedVersion {
            what: "container",
            found: header.format_version,
        });
    }
    Ok(header)
}

/// Validates the container and returns the decompressed logical stream.
pub fn unwrap_container(bytes: &[u8]) -> Result<Vec<u8>, SaveError> {
    let header = read_container_header(bytes)?;
    let payload = &bytes[HEADER_SIZE..];

    let computed = xxh32(payload, XXHASH_SEED);
    if computed != header.checksum {
        return Err(SaveError::corrupt(format!(
            "checksum mismatch (expected {:#010X}, got {computed:#010X})",
            header.checksum
        )));
    }

    let stream = lz4_flex::decompress_size_prepended(payload)?;
    if stream.len() != header.uncompressed_size as usize {
        return Err(SaveError::corrupt(format!(
            "stream size {} does not match header size {}",
            stream.len(),
            header.uncompressed_size
        )));
    }
    Ok(stream)
}
