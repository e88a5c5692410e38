//! Decoders: raw bytes in a source encoding to Unicode code points.
//!
//! Each decode call reads whole code-unit-sized steps, never past the end of
//! the source slice. A multi-byte sequence cut off by the end of the slice is
//! left unconsumed so the caller can supply the missing bytes in the next
//! call; truncation is a resumption point, not a fault.

use crate::endian::Endianness;
use crate::{is_scalar_value, is_surrogate, Encoding, Error, ErrorPolicy, Result};
use crate::{MAX_CODE_POINT, REPLACEMENT_CHARACTER};

/// Outcome of examining the next sequence at the head of a source slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeStep {
    /// A complete, valid sequence of `len` bytes yielding one code point.
    Scalar { code_point: u32, len: usize },
    /// A malformed span of `len` bytes (the offending leader unit plus, for
    /// UTF-8, any continuation bytes glued to it).
    Malformed { len: usize },
    /// The slice ends inside a multi-byte sequence.
    Incomplete,
    /// The slice is empty.
    End,
}

/// Converts bytes in one source encoding into Unicode code points.
///
/// The only mutable state is the configured error policy and replacement
/// character; resumption across buffer boundaries is driven entirely by the
/// byte counts returned from [`decode`](Decoder::decode).
#[derive(Debug, Clone)]
pub struct Decoder {
    encoding: Encoding,
    policy: ErrorPolicy,
    replacement: u32,
}

impl Decoder {
    /// Create a decoder for `encoding` with the default policy
    /// ([`ErrorPolicy::Replace`]).
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            policy: ErrorPolicy::default(),
            replacement: REPLACEMENT_CHARACTER,
        }
    }

    /// Create a decoder with an explicit error policy.
    pub fn with_policy(encoding: Encoding, policy: ErrorPolicy) -> Self {
        Self {
            policy,
            ..Self::new(encoding)
        }
    }

    /// The source encoding this decoder reads.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The active error policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Change the error policy; takes effect on the next decode step.
    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    /// The code point emitted for malformed input under
    /// [`ErrorPolicy::Replace`]. Defaults to U+FFFD.
    pub fn replacement_char(&self) -> u32 {
        self.replacement
    }

    /// Set the code point emitted for malformed input under
    /// [`ErrorPolicy::Replace`]. Must be a Unicode scalar value.
    pub fn set_replacement_char(&mut self, code_point: u32) -> Result<()> {
        if !is_scalar_value(code_point) {
            return Err(Error::InvalidReplacement {
                encoding: self.encoding,
                code_point,
            });
        }
        self.replacement = code_point;
        Ok(())
    }

    /// Decode bytes from `src` into `dst`, returning
    /// `(bytes_consumed, code_points_produced)`.
    ///
    /// Stops when `dst` is full, when `src` is exhausted, or when the next
    /// sequence is truncated by the end of `src`. Under
    /// [`ErrorPolicy::Stop`] a malformed sequence aborts the call with
    /// [`Error::MalformedSequence`] carrying the counts processed before the
    /// fault; code points decoded before the fault are already in `dst`.
    pub fn decode(&self, src: &[u8], dst: &mut [u32]) -> Result<(usize, usize)> {
        let mut consumed = 0;
        let mut produced = 0;
        while produced < dst.len() {
            match self.step(&src[consumed..]) {
                DecodeStep::Scalar { code_point, len } => {
                    dst[produced] = code_point;
                    produced += 1;
                    consumed += len;
                }
                DecodeStep::Malformed { len } => match self.policy {
                    ErrorPolicy::Replace => {
                        dst[produced] = self.replacement;
                        produced += 1;
                        consumed += len;
                    }
                    ErrorPolicy::Skip => consumed += len,
                    ErrorPolicy::Stop => {
                        return Err(Error::MalformedSequence {
                            encoding: self.encoding,
                            consumed,
                            produced,
                        });
                    }
                },
                DecodeStep::Incomplete | DecodeStep::End => break,
            }
        }
        Ok((consumed, produced))
    }

    /// Check `src` for conformance to the source encoding.
    ///
    /// Returns the byte offset of the first sequence that is not a complete,
    /// valid sequence (malformed data or a truncated tail), or `None` when
    /// the whole input is well formed.
    pub fn check(&self, src: &[u8]) -> Option<usize> {
        let mut offset = 0;
        loop {
            match self.step(&src[offset..]) {
                DecodeStep::Scalar { len, .. } => offset += len,
                DecodeStep::End => return None,
                DecodeStep::Malformed { .. } | DecodeStep::Incomplete => return Some(offset),
            }
        }
    }

    /// Length of the well-formed prefix of `src`, or `None` if the input
    /// contains malformed data before its (possibly truncated) end.
    pub(crate) fn well_formed_prefix(&self, src: &[u8]) -> Option<usize> {
        let mut offset = 0;
        loop {
            match self.step(&src[offset..]) {
                DecodeStep::Scalar { len, .. } => offset += len,
                DecodeStep::End | DecodeStep::Incomplete => return Some(offset),
                DecodeStep::Malformed { .. } => return None,
            }
        }
    }

    /// Examine the next sequence at the head of `src`.
    pub(crate) fn step(&self, src: &[u8]) -> DecodeStep {
        match self.encoding {
            Encoding::UTF8 => next_utf8(src),
            Encoding::UTF16LE => next_utf16(src, Endianness::Little),
            Encoding::UTF16BE => next_utf16(src, Endianness::Big),
            Encoding::UTF32LE => next_utf32(src, Endianness::Little),
            Encoding::UTF32BE => next_utf32(src, Endianness::Big),
            Encoding::ASCII => next_single_byte(src, 0x7F),
            Encoding::ISO_8859_1 => next_single_byte(src, 0xFF),
        }
    }
}

#[inline]
fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// A malformed UTF-8 span covers the leader byte and any continuation bytes
/// glued to it, but never a following valid leader.
fn utf8_malformed_span(src: &[u8]) -> DecodeStep {
    let len = 1 + src[1..].iter().take_while(|&&b| is_continuation(b)).count();
    DecodeStep::Malformed { len }
}

fn next_utf8(src: &[u8]) -> DecodeStep {
    let Some(&lead) = src.first() else {
        return DecodeStep::End;
    };
    if lead < 0x80 {
        return DecodeStep::Scalar {
            code_point: lead as u32,
            len: 1,
        };
    }
    // 0xC0/0xC1 always produce overlong forms; 0xF5.. exceed U+10FFFF;
    // a continuation byte cannot lead a sequence.
    let len = match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return utf8_malformed_span(src),
    };
    let mut code_point = (lead as u32) & (0x7Fu32 >> len);
    for i in 1..len {
        match src.get(i) {
            None => return DecodeStep::Incomplete,
            Some(&b) if is_continuation(b) => {
                code_point = (code_point << 6) | (b & 0x3F) as u32;
            }
            Some(_) => return utf8_malformed_span(src),
        }
    }
    let min = match len {
        2 => 0x80,
        3 => 0x800,
        _ => 0x1_0000,
    };
    if code_point < min || is_surrogate(code_point) || code_point > MAX_CODE_POINT {
        return utf8_malformed_span(src);
    }
    DecodeStep::Scalar { code_point, len }
}

fn next_utf16(src: &[u8], endian: Endianness) -> DecodeStep {
    if src.is_empty() {
        return DecodeStep::End;
    }
    if src.len() < 2 {
        return DecodeStep::Incomplete;
    }
    let unit = endian.read_u16([src[0], src[1]]) as u32;
    match unit {
        0xD800..=0xDBFF => {
            if src.len() < 4 {
                return DecodeStep::Incomplete;
            }
            let low = endian.read_u16([src[2], src[3]]) as u32;
            if (0xDC00..=0xDFFF).contains(&low) {
                DecodeStep::Scalar {
                    code_point: 0x1_0000 + ((unit - 0xD800) << 10) + (low - 0xDC00),
                    len: 4,
                }
            } else {
                // Unpaired high surrogate; the following unit may be valid.
                DecodeStep::Malformed { len: 2 }
            }
        }
        0xDC00..=0xDFFF => DecodeStep::Malformed { len: 2 },
        _ => DecodeStep::Scalar {
            code_point: unit,
            len: 2,
        },
    }
}

fn next_utf32(src: &[u8], endian: Endianness) -> DecodeStep {
    if src.is_empty() {
        return DecodeStep::End;
    }
    if src.len() < 4 {
        return DecodeStep::Incomplete;
    }
    let value = endian.read_u32([src[0], src[1], src[2], src[3]]);
    if is_scalar_value(value) {
        DecodeStep::Scalar {
            code_point: value,
            len: 4,
        }
    } else {
        DecodeStep::Malformed { len: 4 }
    }
}

fn next_single_byte(src: &[u8], max: u8) -> DecodeStep {
    let Some(&byte) = src.first() else {
        return DecodeStep::End;
    };
    if byte <= max {
        DecodeStep::Scalar {
            code_point: byte as u32,
            len: 1,
        }
    } else {
        DecodeStep::Malformed { len: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(encoding: Encoding, policy: ErrorPolicy, src: &[u8]) -> Result<Vec<u32>> {
        let decoder = Decoder::with_policy(encoding, policy);
        let mut buf = [0u32; 64];
        let (_, produced) = decoder.decode(src, &mut buf)?;
        Ok(buf[..produced].to_vec())
    }

    #[test]
    fn test_utf8_ascii_passthrough() {
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Stop, b"Hello").unwrap();
        assert_eq!(out, vec![0x48, 0x65, 0x6C, 0x6C, 0x6F]);
    }

    #[test]
    fn test_utf8_multibyte_scalars() {
        // Æ (2 bytes), Ω (2 bytes), € (3 bytes), 😀 (4 bytes)
        let src = "ÆΩ€😀".as_bytes();
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Stop, src).unwrap();
        assert_eq!(out, vec![0xC6, 0x3A9, 0x20AC, 0x1F600]);
    }

    #[test]
    fn test_utf8_invalid_sequence_replace() {
        // 0xE0 expects a continuation in 0xA0..=0xBF; 0x80 makes the whole
        // span malformed, and the span swallows the glued continuation byte.
        let src = &[0xE0, 0x80, b' ', b'F'];
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Replace, src).unwrap();
        assert_eq!(out, vec![REPLACEMENT_CHARACTER, b' ' as u32, b'F' as u32]);
    }

    #[test]
    fn test_utf8_invalid_sequence_skip() {
        let src = &[0xE0, 0x80, b' ', b'F'];
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Skip, src).unwrap();
        assert_eq!(out, vec![b' ' as u32, b'F' as u32]);
    }

    #[test]
    fn test_utf8_invalid_sequence_stop() {
        let decoder = Decoder::with_policy(Encoding::UTF8, ErrorPolicy::Stop);
        let mut buf = [0u32; 8];
        let err = decoder.decode(&[b'A', 0xE0, 0x80, b'F'], &mut buf).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedSequence {
                encoding: Encoding::UTF8,
                consumed: 1,
                produced: 1,
            }
        );
        assert_eq!(buf[0], b'A' as u32);
    }

    #[test]
    fn test_utf8_overlong_rejected() {
        // 0xC0 0x80 is the classic overlong NUL.
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Replace, &[0xC0, 0x80, b'A']).unwrap();
        assert_eq!(out, vec![REPLACEMENT_CHARACTER, b'A' as u32]);
        // 0xE0 0x80 0x80 would be an overlong U+0000 as well.
        let out =
            decode_all(Encoding::UTF8, ErrorPolicy::Replace, &[0xE0, 0x80, 0x80, b'A']).unwrap();
        assert_eq!(out, vec![REPLACEMENT_CHARACTER, b'A' as u32]);
    }

    #[test]
    fn test_utf8_surrogate_rejected() {
        // U+D800 encoded directly: ED A0 80.
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Skip, &[0xED, 0xA0, 0x80, b'x']).unwrap();
        assert_eq!(out, vec![b'x' as u32]);
    }

    #[test]
    fn test_utf8_stray_continuation() {
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Replace, &[0x80, b'A']).unwrap();
        assert_eq!(out, vec![REPLACEMENT_CHARACTER, b'A' as u32]);
    }

    #[test]
    fn test_utf8_leader_followed_by_valid_unit_keeps_the_unit() {
        // The truncated 2-byte leader is the whole malformed span; 'A' survives.
        let out = decode_all(Encoding::UTF8, ErrorPolicy::Replace, &[0xC3, b'A']).unwrap();
        assert_eq!(out, vec![REPLACEMENT_CHARACTER, b'A' as u32]);
    }

    #[test]
    fn test_utf8_truncated_tail_left_unconsumed() {
        let decoder = Decoder::new(Encoding::UTF8);
        let mut buf = [0u32; 8];
        // "A" followed by the first two bytes of a 3-byte sequence.
        let (consumed, produced) = decoder.decode(&[b'A', 0xE2, 0x82], &mut buf).unwrap();
        assert_eq!((consumed, produced), (1, 1));
        // Resume with the missing byte supplied.
        let (consumed, produced) = decoder.decode(&[0xE2, 0x82, 0xAC], &mut buf).unwrap();
        assert_eq!((consumed, produced), (3, 1));
        assert_eq!(buf[0], 0x20AC);
    }

    #[test]
    fn test_utf16be_bounded_destination_and_resume() {
        let decoder = Decoder::new(Encoding::UTF16BE);
        let mut buf = [0u32; 2];
        let src = b"\x00A\x00B\x00C";
        let (consumed, produced) = decoder.decode(src, &mut buf).unwrap();
        assert_eq!((consumed, produced), (4, 2));
        assert_eq!(&buf[..2], &[b'A' as u32, b'B' as u32]);
        // Second call picks up at the reported offset with more data appended.
        let mut rest = src[consumed..].to_vec();
        rest.extend_from_slice(b"\x00D");
        let (consumed, produced) = decoder.decode(&rest, &mut buf).unwrap();
        assert_eq!((consumed, produced), (4, 2));
        assert_eq!(&buf[..2], &[b'C' as u32, b'D' as u32]);
    }

    #[test]
    fn test_utf16_surrogate_pair() {
        // 😀 U+1F600 = D83D DE00
        let out = decode_all(
            Encoding::UTF16LE,
            ErrorPolicy::Stop,
            &[0x3D, 0xD8, 0x00, 0xDE],
        )
        .unwrap();
        assert_eq!(out, vec![0x1F600]);
    }

    #[test]
    fn test_utf16_unpaired_high_surrogate() {
        // High surrogate followed by 'A'; the valid unit must survive.
        let src = &[0x3D, 0xD8, 0x41, 0x00];
        let out = decode_all(Encoding::UTF16LE, ErrorPolicy::Replace, src).unwrap();
        assert_eq!(out, vec![REPLACEMENT_CHARACTER, b'A' as u32]);
        let out = decode_all(Encoding::UTF16LE, ErrorPolicy::Skip, src).unwrap();
        assert_eq!(out, vec![b'A' as u32]);
    }

    #[test]
    fn test_utf16_stray_low_surrogate() {
        let out =
            decode_all(Encoding::UTF16BE, ErrorPolicy::Replace, &[0xDC, 0x00, 0x00, 0x41]).unwrap();
        assert_eq!(out, vec![REPLACEMENT_CHARACTER, b'A' as u32]);
    }

    #[test]
    fn test_utf16_high_surrogate_at_chunk_boundary_is_incomplete() {
        let decoder = Decoder::with_policy(Encoding::UTF16LE, ErrorPolicy::Stop);
        let mut buf = [0u32; 4];
        // 'A' then a lone high surrogate unit; the pair may continue in the
        // next chunk, so nothing is consumed past 'A'.
        let (consumed, produced) = decoder.decode(&[0x41, 0x00, 0x3D, 0xD8], &mut buf).unwrap();
        assert_eq!((consumed, produced), (2, 1));
    }

    #[test]
    fn test_utf16_odd_trailing_byte_is_incomplete() {
        let decoder = Decoder::with_policy(Encoding::UTF16BE, ErrorPolicy::Stop);
        let mut buf = [0u32; 4];
        let (consumed, produced) = decoder.decode(&[0x00, 0x41, 0x00], &mut buf).unwrap();
        assert_eq!((consumed, produced), (2, 1));
    }

    #[test]
    fn test_utf32_range_validation() {
        let mut src = Vec::new();
        src.extend_from_slice(&0x41u32.to_le_bytes());
        src.extend_from_slice(&0x0011_0000u32.to_le_bytes()); // beyond U+10FFFF
        src.extend_from_slice(&0xD800u32.to_le_bytes()); // surrogate
        src.extend_from_slice(&0x1F600u32.to_le_bytes());
        let out = decode_all(Encoding::UTF32LE, ErrorPolicy::Replace, &src).unwrap();
        assert_eq!(
            out,
            vec![0x41, REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER, 0x1F600]
        );
        let out = decode_all(Encoding::UTF32LE, ErrorPolicy::Skip, &src).unwrap();
        assert_eq!(out, vec![0x41, 0x1F600]);
    }

    #[test]
    fn test_utf32be_reads_big_endian_units() {
        let out =
            decode_all(Encoding::UTF32BE, ErrorPolicy::Stop, &[0x00, 0x01, 0xF6, 0x00]).unwrap();
        assert_eq!(out, vec![0x1F600]);
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        let src = &[b'A', 0x80, b'B'];
        let out = decode_all(Encoding::ASCII, ErrorPolicy::Replace, src).unwrap();
        assert_eq!(out, vec![b'A' as u32, REPLACEMENT_CHARACTER, b'B' as u32]);
        let err = decode_all(Encoding::ASCII, ErrorPolicy::Stop, src).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedSequence {
                encoding: Encoding::ASCII,
                consumed: 1,
                produced: 1,
            }
        );
    }

    #[test]
    fn test_latin1_accepts_all_bytes() {
        let src: Vec<u8> = (0..=255).collect();
        let decoder = Decoder::new(Encoding::ISO_8859_1);
        let mut buf = [0u32; 256];
        let (consumed, produced) = decoder.decode(&src, &mut buf).unwrap();
        assert_eq!((consumed, produced), (256, 256));
        assert_eq!(buf[0xE6], 0xE6);
    }

    #[test]
    fn test_check_reports_first_invalid_offset() {
        let decoder = Decoder::new(Encoding::UTF8);
        assert_eq!(decoder.check("ÆΩ".as_bytes()), None);
        assert_eq!(decoder.check(&[b'A', 0xFF, b'B']), Some(1));
        // A truncated tail is not a complete valid sequence.
        assert_eq!(decoder.check(&[b'A', 0xE2, 0x82]), Some(1));
        let decoder = Decoder::new(Encoding::UTF16LE);
        assert_eq!(decoder.check(&[0x41, 0x00, 0x3D, 0xD8]), Some(2));
    }

    #[test]
    fn test_set_replacement_char_validation() {
        let mut decoder = Decoder::new(Encoding::UTF8);
        decoder.set_replacement_char(b'?' as u32).unwrap();
        assert_eq!(decoder.replacement_char(), b'?' as u32);
        assert!(decoder.set_replacement_char(0xD800).is_err());
        assert!(decoder.set_replacement_char(0x0011_0000).is_err());
    }

    #[test]
    fn test_custom_replacement_is_emitted() {
        let mut decoder = Decoder::new(Encoding::ASCII);
        decoder.set_replacement_char(b'?' as u32).unwrap();
        let mut buf = [0u32; 4];
        let (_, produced) = decoder.decode(&[b'A', 0xC6], &mut buf).unwrap();
        assert_eq!(&buf[..produced], &[b'A' as u32, b'?' as u32]);
    }
}
