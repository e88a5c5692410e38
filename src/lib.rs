//! # Uniconv - Streaming Character Encoding Conversion
//!
//! A character-encoding conversion engine for the Unicode transformation
//! formats (UTF-8, UTF-16 and UTF-32 in both byte orders) and the
//! single-byte Latin encodings (ASCII, ISO-8859-1), built around a shared
//! code-point intermediate representation.
//!
//! ## Features
//!
//! - **Caller-owned buffers**: every entry point reads from and writes to
//!   slices the caller supplies; the conversion hot path allocates nothing
//!   beyond a small stack-resident code-point buffer
//! - **Streaming resumption**: multi-byte sequences split across chunk
//!   boundaries are left unconsumed and picked up on the next call
//! - **Three-way error policy**: replace, skip, or stop on malformed input
//!   and unrepresentable code points
//! - **Endianness-aware**: explicit little/big-endian variants for the 16-
//!   and 32-bit formats, with a byte-swap fast path between them
//!
//! ## Quick Start
//!
//! ```rust
//! use uniconv::{convert_to_vec, Encoding, ErrorPolicy};
//!
//! let utf16 = convert_to_vec(
//!     "Hello".as_bytes(),
//!     Encoding::UTF8,
//!     Encoding::UTF16LE,
//!     ErrorPolicy::Replace,
//! )
//! .unwrap();
//! assert_eq!(utf16, &[0x48, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00]);
//! ```
//!
//! For repeated or chunked conversions, construct a [`Converter`] once and
//! call [`Converter::convert`] with successive source windows, resuming each
//! time at the reported consumed offset:
//!
//! ```rust
//! use uniconv::{Converter, Encoding};
//!
//! let converter = Converter::new(Encoding::UTF16BE, Encoding::UTF8);
//! let mut out = [0u8; 8];
//! let (consumed, written) = converter.convert(b"\x00A\x00B\x00", &mut out).unwrap();
//! assert_eq!((consumed, written), (4, 2)); // the odd trailing byte waits
//! assert_eq!(&out[..written], b"AB");
//! ```

#![deny(missing_docs)]

use serde::Serialize;
use std::fmt;

pub mod endian;

mod convert;
mod decode;
mod encode;

pub use convert::{ConversionStrategy, Converter};
pub use decode::Decoder;
pub use encode::Encoder;
pub use endian::{system_endianness, Endianness, ReverseBytes};

/// U+FFFD REPLACEMENT CHARACTER, the default substitute for malformed or
/// unrepresentable data under [`ErrorPolicy::Replace`].
pub const REPLACEMENT_CHARACTER: u32 = 0xFFFD;

/// Largest Unicode code point, U+10FFFF.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

#[inline]
pub(crate) fn is_surrogate(code_point: u32) -> bool {
    (0xD800..=0xDFFF).contains(&code_point)
}

/// A Unicode scalar value: in range and not a surrogate.
#[inline]
pub(crate) fn is_scalar_value(code_point: u32) -> bool {
    code_point <= MAX_CODE_POINT && !is_surrogate(code_point)
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during conversion operations.
///
/// The `consumed`/`produced` fields carry the counts successfully processed
/// before the fault, in the units of the failing operation (bytes in, code
/// points out for [`Decoder::decode`]; code points in, bytes out for
/// [`Encoder::encode`]; bytes both ways for [`Converter::convert`]), so a
/// caller can locate the fault and resume past it manually.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A byte pattern violates the source encoding's grammar
    #[error("malformed {encoding} sequence at offset {consumed}")]
    MalformedSequence {
        /// The source encoding being decoded
        encoding: Encoding,
        /// Units consumed before the fault; also the fault's offset
        consumed: usize,
        /// Units produced before the fault
        produced: usize,
    },
    /// A code point has no representation in the destination encoding
    #[error("U+{code_point:04X} has no representation in {encoding}")]
    UnrepresentableCodePoint {
        /// The destination encoding being encoded
        encoding: Encoding,
        /// The offending code point
        code_point: u32,
        /// Units consumed before the fault
        consumed: usize,
        /// Units produced before the fault
        produced: usize,
    },
    /// A configured replacement character is invalid or not representable
    /// in the encoding it would be written to
    #[error("U+{code_point:04X} is not usable as a replacement character for {encoding}")]
    InvalidReplacement {
        /// The encoding that rejected the replacement
        encoding: Encoding,
        /// The rejected code point
        code_point: u32,
    },
    /// An encoding name was not recognized
    #[error("unknown encoding name: {0}")]
    UnknownEncoding(String),
}

/// Supported character encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    /// UTF-8 Unicode encoding (variable length, 1-4 bytes)
    UTF8,
    /// UTF-16LE Unicode encoding (little endian)
    UTF16LE,
    /// UTF-16BE Unicode encoding (big endian)
    UTF16BE,
    /// UTF-32LE Unicode encoding (little endian)
    UTF32LE,
    /// UTF-32BE Unicode encoding (big endian)
    UTF32BE,
    /// ASCII (7-bit, 0-127)
    ASCII,
    /// ISO-8859-1 (Latin-1) - Western European
    ISO_8859_1,
}

impl Encoding {
    /// All supported encodings, in a stable order.
    pub const ALL: [Encoding; 7] = [
        Encoding::UTF8,
        Encoding::UTF16LE,
        Encoding::UTF16BE,
        Encoding::UTF32LE,
        Encoding::UTF32BE,
        Encoding::ASCII,
        Encoding::ISO_8859_1,
    ];

    /// Get the canonical name of this encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::UTF8 => "UTF-8",
            Encoding::UTF16LE => "UTF-16LE",
            Encoding::UTF16BE => "UTF-16BE",
            Encoding::UTF32LE => "UTF-32LE",
            Encoding::UTF32BE => "UTF-32BE",
            Encoding::ASCII => "US-ASCII",
            Encoding::ISO_8859_1 => "ISO-8859-1",
        }
    }

    /// Look up an encoding by name. Matching is case-insensitive and
    /// tolerant of the common aliases (`utf8`, `latin1`, `ascii`, ...).
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "UTF8" => Ok(Encoding::UTF8),
            "UTF16LE" => Ok(Encoding::UTF16LE),
            "UTF16BE" => Ok(Encoding::UTF16BE),
            "UTF32LE" => Ok(Encoding::UTF32LE),
            "UTF32BE" => Ok(Encoding::UTF32BE),
            "ASCII" | "USASCII" => Ok(Encoding::ASCII),
            "ISO88591" | "LATIN1" => Ok(Encoding::ISO_8859_1),
            _ => Err(Error::UnknownEncoding(name.to_string())),
        }
    }

    /// Size in bytes of this encoding's code unit (1, 2 or 4).
    pub fn unit_size(self) -> usize {
        match self {
            Encoding::UTF8 | Encoding::ASCII | Encoding::ISO_8859_1 => 1,
            Encoding::UTF16LE | Encoding::UTF16BE => 2,
            Encoding::UTF32LE | Encoding::UTF32BE => 4,
        }
    }

    /// Largest number of bytes one code point can occupy in this encoding.
    pub fn max_encoded_len(self) -> usize {
        match self {
            Encoding::ASCII | Encoding::ISO_8859_1 => 1,
            _ => 4,
        }
    }

    /// Byte order of this encoding's code units, if it has multi-byte units.
    pub fn endianness(self) -> Option<Endianness> {
        match self {
            Encoding::UTF16LE | Encoding::UTF32LE => Some(Endianness::Little),
            Encoding::UTF16BE | Encoding::UTF32BE => Some(Endianness::Big),
            _ => None,
        }
    }

    /// Check if this encoding maps every code point to exactly one byte.
    pub fn is_single_byte(self) -> bool {
        matches!(self, Encoding::ASCII | Encoding::ISO_8859_1)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Behavior on malformed input (decode side) and unrepresentable code
/// points (encode side).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorPolicy {
    /// Substitute the replacement character and continue
    #[default]
    Replace,
    /// Drop the offending unit and continue
    Skip,
    /// Halt at the fault and report it
    Stop,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Replace => write!(f, "replace"),
            ErrorPolicy::Skip => write!(f, "skip"),
            ErrorPolicy::Stop => write!(f, "stop"),
        }
    }
}

/// One-shot conversion between two caller-supplied buffers.
///
/// Constructs a transient [`Converter`], applies `policy` to both stages and
/// performs a single [`Converter::convert`] call, returning
/// `(bytes_consumed, bytes_written)`. The destination is never resized;
/// callers wanting the whole source converted must pre-size it or loop
/// until `bytes_consumed` reaches the source length.
pub fn convert_bytes(
    src: &[u8],
    from: Encoding,
    dst: &mut [u8],
    to: Encoding,
    policy: ErrorPolicy,
) -> Result<(usize, usize)> {
    let mut converter = Converter::new(from, to);
    converter.set_error_policy(policy);
    converter.convert(src, dst)
}

/// Convert a complete source buffer, returning the output as a `Vec`.
///
/// Unlike the streaming entry points, this treats the source as final: a
/// truncated multi-byte sequence at the end of the input is handled through
/// `policy` like any other malformed sequence instead of waiting for more
/// bytes.
pub fn convert_to_vec(
    src: &[u8],
    from: Encoding,
    to: Encoding,
    policy: ErrorPolicy,
) -> Result<Vec<u8>> {
    let mut converter = Converter::new(from, to);
    converter.set_error_policy(policy);
    let mut out = vec![0u8; src.len() * to.max_encoded_len() + 4];
    let (consumed, written) = converter.convert(src, &mut out)?;
    out.truncate(written);
    if consumed < src.len() {
        // Only a truncated trailing sequence can be left over: the
        // destination was sized for the worst-case expansion.
        match policy {
            ErrorPolicy::Stop => {
                return Err(Error::MalformedSequence {
                    encoding: from,
                    consumed,
                    produced: out.len(),
                });
            }
            ErrorPolicy::Skip => {}
            ErrorPolicy::Replace => {
                let encoder = Encoder::new(to);
                let mut tail = [0u8; 4];
                let (_, written) = encoder.encode(&[encoder.replacement_char()], &mut tail)?;
                out.extend_from_slice(&tail[..written]);
            }
        }
    }
    Ok(out)
}
