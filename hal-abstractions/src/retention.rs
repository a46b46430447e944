//! Retention memory trait
//!
//! Retention memory is cleared on full power loss but preserved across the
//! deep sleep mode the node uses between wake cycles.

/// Byte-addressed memory that survives deep sleep
///
/// Implementors report failures through `Self::Error`; callers treat any
/// failed read as "no data" and any failed write as "nothing persisted".
pub trait RetentionMemory {
    /// Backend-specific error type
    type Error: core::fmt::Debug;

    /// Read `buf.len()` bytes starting at `offset`
    ///
    /// # Errors
    ///
    /// Returns an error if the range does not fit in the memory or the
    /// backend cannot be read.
    fn read_block(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` starting at `offset`
    ///
    /// # Errors
    ///
    /// Returns an error if the range does not fit in the memory or the
    /// backend rejects the write.
    fn write_block(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error>;

    /// Total addressable size in bytes
    fn capacity(&self) -> usize;
}

impl<T: RetentionMemory + ?Sized> RetentionMemory for &mut T {
    type Error = T::Error;

    fn read_block(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read_block(self, offset, buf)
    }

    fn write_block(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        T::write_block(self, offset, data)
    }

    fn capacity(&self) -> usize {
        T::capacity(self)
    }
}
