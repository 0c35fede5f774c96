//! Packet checksum
//!
//! 16-bit running checksum updated one byte at a time. The mixing step is
//! the CCITT accumulator used by MCRF4XX/X.25-style links (reflected
//! polynomial 0x8408, init 0xFFFF, no final XOR), computed without a table.

/// Checksum value before any byte has been folded in
pub const INITIAL_CRC: u16 = 0xFFFF;

/// Fold a single byte into the running checksum
#[inline]
pub const fn update_crc(byte: u8, crc: u16) -> u16 {
    let mut byte = byte ^ (crc & 0x00FF) as u8;
    byte ^= byte << 4;
    ((byte as u16) << 8 | (crc >> 8)) ^ (byte >> 4) as u16 ^ ((byte as u16) << 3)
}

/// Checksum of a byte slice, starting from [`INITIAL_CRC`]
pub fn crc_of(bytes: &[u8]) -> u16 {
    let mut crc = Crc::new();
    crc.update_slice(bytes);
    crc.value()
}

/// Checksum accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Crc(u16);

impl Default for Crc {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc {
    /// Create an accumulator seeded with [`INITIAL_CRC`]
    pub const fn new() -> Self {
        Self(INITIAL_CRC)
    }

    /// Fold one byte
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.0 = update_crc(byte, self.0);
    }

    /// Fold every byte of `bytes`, in order
    pub fn update_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.update(byte);
        }
    }

    /// Current checksum value
    pub const fn value(&self) -> u16 {
        self.0
    }
}
