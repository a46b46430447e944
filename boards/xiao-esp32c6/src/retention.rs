#![deny(warnings)]
//! Deep-sleep retained memory
//!
//! A small region of RTC fast memory that the bootloader leaves untouched
//! on a deep sleep wake. After a power-on reset the contents are arbitrary,
//! which the record checksum detects.

#![allow(unsafe_code)] // Required for the retained static

use core::sync::atomic::{AtomicBool, Ordering};

use plant_node_hal::RetentionMemory;

use crate::error::RetentionError;

/// Size of the retained region in bytes
pub const RETAINED_LEN: usize = 64;

#[esp_hal::ram(unstable(rtc_fast, persistent))]
static mut RETAINED: [u8; RETAINED_LEN] = [0; RETAINED_LEN];

static TAKEN: AtomicBool = AtomicBool::new(false);

/// Owner of the retained region
///
/// At most one instance exists per boot, see [`LpRetention::take`].
pub struct LpRetention {
    _private: (),
}

impl LpRetention {
    /// Claim the retained region
    ///
    /// Returns `None` if it was already claimed.
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self { _private: () })
        }
    }

    fn region(&mut self) -> &mut [u8; RETAINED_LEN] {
        // SAFETY: `take` hands out a single `LpRetention`, and the returned
        // borrow is tied to `&mut self`, so no other reference to the static
        // can be live.
        unsafe { &mut *core::ptr::addr_of_mut!(RETAINED) }
    }
}

impl RetentionMemory for LpRetention {
    type Error = RetentionError;

    fn read_block(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error> {
        let end = offset.checked_add(buf.len()).ok_or(RetentionError::OutOfRange)?;
        let src = self
            .region()
            .get(offset..end)
            .ok_or(RetentionError::OutOfRange)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_block(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        let end = offset
            .checked_add(data.len())
            .ok_or(RetentionError::OutOfRange)?;
        self.region()
            .get_mut(offset..end)
            .ok_or(RetentionError::OutOfRange)?
            .copy_from_slice(data);
        Ok(())
    }

    fn capacity(&self) -> usize {
        RETAINED_LEN
    }
}
