//! Byte-order detection and fixed-width byte-order manipulation.
//!
//! The 16- and 32-bit decoders and encoders are parameterised by an
//! [`Endianness`] value; all of their byte-order-dependent reads and writes
//! go through the unit primitives defined here.

use serde::Serialize;
use std::fmt;

/// Byte order of a multi-byte code unit in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Endianness {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first.
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little-endian"),
            Endianness::Big => write!(f, "big-endian"),
        }
    }
}

impl Endianness {
    /// Read a 16-bit code unit stored in this byte order.
    #[inline]
    pub fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Read a 32-bit code unit stored in this byte order.
    #[inline]
    pub fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Write a 16-bit code unit in this byte order.
    #[inline]
    pub fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }

    /// Write a 32-bit code unit in this byte order.
    #[inline]
    pub fn write_u32(self, value: u32) -> [u8; 4] {
        match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }
}

/// Returns the native byte order of the running system.
#[inline]
pub fn system_endianness() -> Endianness {
    if cfg!(target_endian = "big") {
        Endianness::Big
    } else {
        Endianness::Little
    }
}

/// Reverses the byte order of a fixed-width unsigned integer.
///
/// The one-byte width is the identity.
pub trait ReverseBytes: Copy {
    /// Returns the value with its bytes in the opposite order.
    fn reverse_bytes(self) -> Self;
}

macro_rules! impl_reverse_bytes {
    ($($t:ty),*) => {
        $(impl ReverseBytes for $t {
            #[inline]
            fn reverse_bytes(self) -> Self {
                self.swap_bytes()
            }
        })*
    };
}

impl_reverse_bytes!(u8, u16, u32, u64);
