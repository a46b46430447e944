//! Retained network record
//!
//! The only state carried across deep sleep: channel and BSSID of the last
//! successful join, sealed with a CRC-32.
//!
//! # Layout (little-endian, 12 bytes)
//!
//! ```text
//! 0..4   checksum   CRC-32 over bytes 4..12
//! 4      channel
//! 5..11  bssid
//! 11     padding    written as 0, covered by the checksum
//! ```

use plant_node_hal::AccessPoint;

use crate::crc::crc32;
use crate::error::NodeError;

/// Encoded record size in bytes
pub const RECORD_LEN: usize = 12;

/// Size of the checksum field that precedes the payload
const CHECKSUM_LEN: usize = 4;

/// Why a retained record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Retention memory read reported failure
    ReadFailed,
    /// Stored checksum does not match the payload
    ChecksumMismatch {
        /// Checksum found in memory
        stored: u32,
        /// Checksum recomputed over the payload
        computed: u32,
    },
}

impl core::fmt::Display for RecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "Retention read failed"),
            Self::ChecksumMismatch { stored, computed } => write!(
                f,
                "Checksum mismatch (stored {:#010x}, computed {:#010x})",
                stored, computed
            ),
        }
    }
}

impl core::error::Error for RecordError {}

impl From<RecordError> for NodeError {
    fn from(_: RecordError) -> Self {
        NodeError::PersistentDataInvalid
    }
}

/// Checksum-sealed network metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PersistentRecord {
    /// CRC-32 over the encoded payload
    pub checksum: u32,
    /// Last known good radio channel
    pub channel: u8,
    /// Last known good access point hardware address
    pub bssid: [u8; 6],
    /// Alignment filler
    pub padding: u8,
}

impl PersistentRecord {
    /// Build a sealed record for a freshly joined access point
    pub fn seal(channel: u8, bssid: [u8; 6]) -> Self {
        let mut record = Self {
            checksum: 0,
            channel,
            bssid,
            padding: 0,
        };
        record.checksum = crc32(&record.payload());
        record
    }

    /// Payload bytes covered by the checksum
    fn payload(&self) -> [u8; RECORD_LEN - CHECKSUM_LEN] {
        let mut payload = [0u8; RECORD_LEN - CHECKSUM_LEN];
        payload[0] = self.channel;
        payload[1..7].copy_from_slice(&self.bssid);
        payload[7] = self.padding;
        payload
    }

    /// Encode into the retention layout
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[..CHECKSUM_LEN].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[CHECKSUM_LEN..].copy_from_slice(&self.payload());
        bytes
    }

    /// Decode and validate a record read from retention memory
    ///
    /// # Errors
    ///
    /// Returns `RecordError::ChecksumMismatch` if the stored checksum does
    /// not match the CRC-32 of the payload bytes.
    pub fn decode(bytes: &[u8; RECORD_LEN]) -> Result<Self, RecordError> {
        let stored = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let computed = crc32(&bytes[CHECKSUM_LEN..]);
        if stored != computed {
            return Err(RecordError::ChecksumMismatch { stored, computed });
        }

        let mut bssid = [0u8; 6];
        bssid.copy_from_slice(&bytes[5..11]);
        Ok(Self {
            checksum: stored,
            channel: bytes[4],
            bssid,
            padding: bytes[11],
        })
    }

    /// Access point identity held by this record
    pub const fn access_point(&self) -> AccessPoint {
        AccessPoint::new(self.channel, self.bssid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BSSID: [u8; 6] = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];

    #[test]
    fn test_seal_checksum() {
        let record = PersistentRecord::seal(6, BSSID);
        assert_eq!(record.checksum, 0x8828_74F3);
        assert_eq!(record.padding, 0);
    }

    #[test]
    fn test_encode_layout() {
        let bytes = PersistentRecord::seal(6, BSSID).encode();
        assert_eq!(&bytes[..4], &0x8828_74F3u32.to_le_bytes());
        assert_eq!(bytes[4], 6);
        assert_eq!(&bytes[5..11], &BSSID);
        assert_eq!(bytes[11], 0);
    }

    #[test]
    fn test_decode_sealed_record() {
        let record = PersistentRecord::seal(11, BSSID);
        let decoded = PersistentRecord::decode(&record.encode()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.access_point(), AccessPoint::new(11, BSSID));
    }

    #[test]
    fn test_decode_rejects_blank_memory() {
        let result = PersistentRecord::decode(&[0u8; RECORD_LEN]);
        assert!(matches!(
            result,
            Err(RecordError::ChecksumMismatch { stored: 0, .. })
        ));
    }

    #[test]
    fn test_padding_is_covered() {
        let mut bytes = PersistentRecord::seal(1, BSSID).encode();
        bytes[11] = 0xff;
        assert!(PersistentRecord::decode(&bytes).is_err());
    }

    #[test]
    fn test_record_error_maps_to_node_error() {
        assert_eq!(
            NodeError::from(RecordError::ReadFailed),
            NodeError::PersistentDataInvalid
        );
    }
}
