//! CRC-32 used to seal the retained record
//!
//! MSB-first, non-reflected CRC-32 with polynomial `0x04C11DB7`, seeded with
//! `0xFFFFFFFF` and no final XOR (the CRC-32/MPEG-2 parameter set).
//!
//! Records written by earlier firmware must keep validating after an update,
//! so this routine must stay bit-for-bit identical.

/// Generator polynomial
pub const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Initial checksum value
pub const SEED: u32 = 0xFFFF_FFFF;

/// Compute the CRC-32 of `data`
///
/// Total over any input, including the empty slice (which yields [`SEED`]).
///
/// # Example
///
/// ```
/// use plant_node_core::crc32;
/// assert_eq!(crc32(b"123456789"), 0x0376_E6E7);
/// ```
pub const fn crc32(data: &[u8]) -> u32 {
    let mut crc = SEED;
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        let mut mask: u8 = 0x80;
        while mask != 0 {
            // Top bit before the shift, flipped by the current input bit
            let mut bit = crc & 0x8000_0000 != 0;
            if byte & mask != 0 {
                bit = !bit;
            }
            crc <<= 1;
            if bit {
                crc ^= POLYNOMIAL;
            }
            mask >>= 1;
        }
        i += 1;
    }
    crc
}
