//! Encoders: Unicode code points to raw bytes in a destination encoding.
//!
//! The encoded width of a code point is computed before anything is written,
//! so a destination buffer that runs out of room never receives a partial
//! multi-byte unit; the caller grows the buffer and re-invokes with the
//! unconsumed code points.

use crate::endian::Endianness;
use crate::{is_scalar_value, Encoding, Error, ErrorPolicy, Result, REPLACEMENT_CHARACTER};

/// Converts Unicode code points into bytes of one destination encoding.
#[derive(Debug, Clone)]
pub struct Encoder {
    encoding: Encoding,
    policy: ErrorPolicy,
    replacement: u32,
}

impl Encoder {
    /// Create an encoder for `encoding` with the default policy
    /// ([`ErrorPolicy::Replace`]).
    ///
    /// The default substitution character is U+FFFD where the destination
    /// can express it, otherwise `?`.
    pub fn new(encoding: Encoding) -> Self {
        let replacement = if encoding.is_single_byte() {
            b'?' as u32
        } else {
            REPLACEMENT_CHARACTER
        };
        Self {
            encoding,
            policy: ErrorPolicy::default(),
            replacement,
        }
    }

    /// Create an encoder with an explicit error policy.
    pub fn with_policy(encoding: Encoding, policy: ErrorPolicy) -> Self {
        Self {
            policy,
            ..Self::new(encoding)
        }
    }

    /// The destination encoding this encoder writes.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The active error policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Change the error policy; takes effect on the next encode step.
    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    /// The substitution character written for unrepresentable code points
    /// under [`ErrorPolicy::Replace`].
    pub fn replacement_char(&self) -> u32 {
        self.replacement
    }

    /// Set the substitution character. It must itself be representable in
    /// the destination encoding.
    pub fn set_replacement_char(&mut self, code_point: u32) -> Result<()> {
        if self.encoded_len(code_point).is_none() {
            return Err(Error::InvalidReplacement {
                encoding: self.encoding,
                code_point,
            });
        }
        self.replacement = code_point;
        Ok(())
    }

    /// Encoded byte width of `code_point` in the destination encoding, or
    /// `None` when the destination cannot represent it (including surrogate
    /// values and values beyond U+10FFFF, which no encoding represents).
    pub fn encoded_len(&self, code_point: u32) -> Option<usize> {
        if !is_scalar_value(code_point) {
            return None;
        }
        match self.encoding {
            Encoding::UTF8 => Some(match code_point {
                0..=0x7F => 1,
                0x80..=0x7FF => 2,
                0x800..=0xFFFF => 3,
                _ => 4,
            }),
            Encoding::UTF16LE | Encoding::UTF16BE => {
                Some(if code_point < 0x1_0000 { 2 } else { 4 })
            }
            Encoding::UTF32LE | Encoding::UTF32BE => Some(4),
            Encoding::ASCII => (code_point <= 0x7F).then_some(1),
            Encoding::ISO_8859_1 => (code_point <= 0xFF).then_some(1),
        }
    }

    /// Encode code points from `src` into `dst`, returning
    /// `(code_points_consumed, bytes_written)`.
    ///
    /// Stops before a code point whose full encoded width would not fit in
    /// the remaining destination capacity. Under [`ErrorPolicy::Stop`] an
    /// unrepresentable code point aborts the call with
    /// [`Error::UnrepresentableCodePoint`] carrying the counts processed
    /// before the fault.
    pub fn encode(&self, src: &[u32], dst: &mut [u8]) -> Result<(usize, usize)> {
        let mut consumed = 0;
        let mut written = 0;
        while consumed < src.len() {
            let code_point = src[consumed];
            let code_point = match self.encoded_len(code_point) {
                Some(_) => code_point,
                None => match self.policy {
                    ErrorPolicy::Replace => self.replacement,
                    ErrorPolicy::Skip => {
                        consumed += 1;
                        continue;
                    }
                    ErrorPolicy::Stop => {
                        return Err(Error::UnrepresentableCodePoint {
                            encoding: self.encoding,
                            code_point,
                            consumed,
                            produced: written,
                        });
                    }
                },
            };
            let len = match self.encoded_len(code_point) {
                Some(len) => len,
                // The replacement character is validated on construction
                // and in the setter.
                None => unreachable!("replacement character must be encodable"),
            };
            if written + len > dst.len() {
                break;
            }
            self.write_code_point(code_point, &mut dst[written..written + len]);
            written += len;
            consumed += 1;
        }
        Ok((consumed, written))
    }

    /// Write one representable code point into an exactly-sized slice.
    fn write_code_point(&self, code_point: u32, dst: &mut [u8]) {
        match self.encoding {
            Encoding::UTF8 => write_utf8(code_point, dst),
            Encoding::UTF16LE => write_utf16(code_point, dst, Endianness::Little),
            Encoding::UTF16BE => write_utf16(code_point, dst, Endianness::Big),
            Encoding::UTF32LE => dst.copy_from_slice(&Endianness::Little.write_u32(code_point)),
            Encoding::UTF32BE => dst.copy_from_slice(&Endianness::Big.write_u32(code_point)),
            Encoding::ASCII | Encoding::ISO_8859_1 => dst[0] = code_point as u8,
        }
    }
}

fn write_utf8(code_point: u32, dst: &mut [u8]) {
    match dst.len() {
        1 => dst[0] = code_point as u8,
        2 => {
            dst[0] = 0xC0 | (code_point >> 6) as u8;
            dst[1] = 0x80 | (code_point & 0x3F) as u8;
        }
        3 => {
            dst[0] = 0xE0 | (code_point >> 12) as u8;
            dst[1] = 0x80 | ((code_point >> 6) & 0x3F) as u8;
            dst[2] = 0x80 | (code_point & 0x3F) as u8;
        }
        _ => {
            dst[0] = 0xF0 | (code_point >> 18) as u8;
            dst[1] = 0x80 | ((code_point >> 12) & 0x3F) as u8;
            dst[2] = 0x80 | ((code_point >> 6) & 0x3F) as u8;
            dst[3] = 0x80 | (code_point & 0x3F) as u8;
        }
    }
}

fn write_utf16(code_point: u32, dst: &mut [u8], endian: Endianness) {
    if code_point < 0x1_0000 {
        dst.copy_from_slice(&endian.write_u16(code_point as u16));
    } else {
        let offset = code_point - 0x1_0000;
        let high = 0xD800 + (offset >> 10) as u16;
        let low = 0xDC00 + (offset & 0x3FF) as u16;
        dst[..2].copy_from_slice(&endian.write_u16(high));
        dst[2..].copy_from_slice(&endian.write_u16(low));
    }
}
