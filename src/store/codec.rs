//! Store codec
//!
//! Encoding and decoding of the whole store image.

use crate::error::{EntityError, Result};

use super::{Table, HEADER_SIZE, MAGIC, VERSION};

/// Encode a table into a complete store image (header + payload)
pub fn encode_table(table: &Table) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(table).map_err(|e| EntityError::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let mut image = Vec::with_capacity(HEADER_SIZE + payload.len());
    image.extend_from_slice(MAGIC);
    image.extend_from_slice(&VERSION.to_le_bytes());
    image.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    image.extend_from_slice(&crc.to_le_bytes());
    image.extend_from_slice(&payload);

    Ok(image)
}

/// Decode a store image
///
/// An empty image is an empty table.
pub fn decode_table(bytes: &[u8]) -> Result<Table> {
    if bytes.is_empty() {
        return Ok(Table::new());
    }

    if bytes.len() < HEADER_SIZE {
        return Err(EntityError::Corrupted(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let (header, payload) = bytes.split_at(HEADER_SIZE);

    if &header[0..4] != MAGIC {
        return Err(EntityError::Corrupted(format!(
            "Invalid store magic: expected ATEM, got {:?}",
            &header[0..4]
        )));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(EntityError::Corrupted(format!(
            "Unsupported store version: {}",
            version
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&header[6..14]);
    let payload_len = u64::from_le_bytes(len_bytes);
    if payload_len != payload.len() as u64 {
        return Err(EntityError::Corrupted(format!(
            "Payload length mismatch: header says {}, file has {}",
            payload_len,
            payload.len()
        )));
    }

    let expected_crc = u32::from_le_bytes([header[14], header[15], header[16], header[17]]);
    let actual_crc = crc32fast::hash(payload);
    if expected_crc != actual_crc {
        return Err(EntityError::Corrupted(format!(
            "Checksum mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    bincode::deserialize(payload)
        .map_err(|e| EntityError::Corrupted(format!("Undecodable payload: {}", e)))
}
