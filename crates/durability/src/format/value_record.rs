//! Value log record format
//!
//! # Record Layout
//!
//! ```text
//! ┌──────────────┬─────────────┬──────────────────┬─────────────────────┐
//! │ Length (4)   │ CRC32 (4)   │ Reference (32)   │ Payload (Length)    │
//! └──────────────┴─────────────┴──────────────────┴─────────────────────┘
//! ```
//!
//! All integers are little-endian. The CRC covers the reference and the
//! payload. The payload is the bincode encoding of the value.

use byteorder::{ByteOrder, LittleEndian};
use vault_core::{Reference, Value, VaultError, VaultResult, REFERENCE_LEN};

/// Size of the fixed record header in bytes
pub const RECORD_HEADER_SIZE: usize = 4 + 4 + REFERENCE_LEN;

/// Largest payload a single record may carry (1 GiB)
pub const MAX_RECORD_PAYLOAD: usize = 1 << 30;

/// A value encoded for the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecord {
    /// Content reference of the value
    pub reference: Reference,
    /// bincode-encoded value
    pub payload: Vec<u8>,
}

/// Fixed-size record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Payload length
    pub len: u32,
    /// CRC over reference + payload
    pub crc: u32,
    /// Content reference
    pub reference: Reference,
}

impl RecordHeader {
    /// Parse a header from exactly `RECORD_HEADER_SIZE` bytes
    pub fn from_bytes(bytes: &[u8; RECORD_HEADER_SIZE]) -> Self {
        let len = LittleEndian::read_u32(&bytes[0..4]);
        let crc = LittleEndian::read_u32(&bytes[4..8]);
        let mut r = [0u8; REFERENCE_LEN];
        r.copy_from_slice(&bytes[8..RECORD_HEADER_SIZE]);
        RecordHeader {
            len,
            crc,
            reference: Reference::from_bytes(r),
        }
    }

    /// Check a payload against this header's CRC
    pub fn verify(&self, payload: &[u8]) -> bool {
        record_crc(&self.reference, payload) == self.crc
    }
}

impl ValueRecord {
    /// Encode a value, computing its reference
    pub fn encode(value: &Value) -> VaultResult<Self> {
        let payload = bincode::serialize(value)
            .map_err(|e| VaultError::storage(format!("failed to encode value: {}", e)))?;
        if payload.len() > MAX_RECORD_PAYLOAD {
            return Err(VaultError::storage(format!(
                "value of {} bytes exceeds the {} byte record limit",
                payload.len(),
                MAX_RECORD_PAYLOAD
            )));
        }
        Ok(ValueRecord {
            reference: Reference::of(value),
            payload,
        })
    }

    /// Decode the payload back into a value
    pub fn decode_payload(payload: &[u8]) -> VaultResult<Value> {
        bincode::deserialize(payload)
            .map_err(|e| VaultError::corruption(format!("undecodable value payload: {}", e)))
    }

    /// Total on-disk size of this record
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.payload.len()
    }

    /// Serialize header and payload into `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let mut header = [0u8; 8];
        LittleEndian::write_u32(&mut header[0..4], self.payload.len() as u32);
        LittleEndian::write_u32(
            &mut header[4..8],
            record_crc(&self.reference, &self.payload),
        );
        out.extend_from_slice(&header);
        out.extend_from_slice(self.reference.as_bytes());
        out.extend_from_slice(&self.payload);
    }
}

fn record_crc(reference: &Reference, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(reference.as_bytes());
    hasher.update(payload);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let value = Value::from("hello");
        let record = ValueRecord::encode(&value).unwrap();
        let mut buf = Vec::new();
        record.write_to(&mut buf);

        assert_eq!(buf.len(), record.encoded_len());
        let header_bytes: [u8; RECORD_HEADER_SIZE] = buf[..RECORD_HEADER_SIZE].try_into().unwrap();
        let header = RecordHeader::from_bytes(&header_bytes);
        assert_eq!(header.len as usize, record.payload.len());
        assert_eq!(header.reference, Reference::of(&value));
        assert!(header.verify(&buf[RECORD_HEADER_SIZE..]));
        assert_eq!(
            ValueRecord::decode_payload(&buf[RECORD_HEADER_SIZE..]).unwrap(),
            value
        );
    }

    #[test]
    fn test_crc_detects_flipped_bit() {
        let record = ValueRecord::encode(&Value::Int(42)).unwrap();
        let mut buf = Vec::new();
        record.write_to(&mut buf);
        let last = buf.len() - 1;
        buf[last] ^= 0x01;

        let header_bytes: [u8; RECORD_HEADER_SIZE] = buf[..RECORD_HEADER_SIZE].try_into().unwrap();
        let header = RecordHeader::from_bytes(&header_bytes);
        assert!(!header.verify(&buf[RECORD_HEADER_SIZE..]));
    }
}
