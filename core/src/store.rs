//! Persistent state store
//!
//! Reads and writes the single [`PersistentRecord`] through a
//! [`RetentionMemory`] backend. Validity is binary: a record either passes
//! its checksum or is treated as absent.

use plant_node_hal::RetentionMemory;

use crate::error::NodeError;
use crate::record::{PersistentRecord, RecordError, RECORD_LEN};

/// Checksum-guarded record store on top of retention memory
pub struct PersistentStore<M> {
    memory: M,
    offset: usize,
}

impl<M: RetentionMemory> PersistentStore<M> {
    /// Create a store keeping its record at offset 0
    pub fn new(memory: M) -> Self {
        Self::with_offset(memory, 0)
    }

    /// Create a store keeping its record at `offset`
    pub fn with_offset(memory: M, offset: usize) -> Self {
        Self { memory, offset }
    }

    /// Read and validate the retained record
    ///
    /// # Errors
    ///
    /// - `RecordError::ReadFailed` if the backend read fails
    /// - `RecordError::ChecksumMismatch` if the record does not validate
    pub fn load_checked(&mut self) -> Result<PersistentRecord, RecordError> {
        let mut bytes = [0u8; RECORD_LEN];
        self.memory
            .read_block(self.offset, &mut bytes)
            .map_err(|_| RecordError::ReadFailed)?;
        PersistentRecord::decode(&bytes)
    }

    /// Read the retained record, or `None` if it is absent or invalid
    pub fn load(&mut self) -> Option<PersistentRecord> {
        match self.load_checked() {
            Ok(record) => {
                debug!("retained record valid: {}", record.access_point());
                Some(record)
            }
            Err(RecordError::ReadFailed) => {
                warn!("retention read failed");
                None
            }
            Err(RecordError::ChecksumMismatch { stored, computed }) => {
                info!(
                    "retained record invalid (stored {=u32:#x}, computed {=u32:#x})",
                    stored, computed
                );
                None
            }
        }
    }

    /// Seal and write a record for a freshly joined access point
    ///
    /// Overwrites whatever was stored before. Only call this after a
    /// connection has been confirmed.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::RetentionWriteFailed` if the backend rejects the
    /// write.
    pub fn store(&mut self, channel: u8, bssid: [u8; 6]) -> Result<PersistentRecord, NodeError> {
        let record = PersistentRecord::seal(channel, bssid);
        self.memory
            .write_block(self.offset, &record.encode())
            .map_err(|_| NodeError::RetentionWriteFailed)?;
        debug!("retained record written: {}", record.access_point());
        Ok(record)
    }

    /// Release the retention backend
    pub fn into_inner(self) -> M {
        self.memory
    }
}
