//! The conversion pipeline: a decoder and an encoder composed through a
//! fixed intermediate code-point buffer.

use crate::decode::{DecodeStep, Decoder};
use crate::encode::Encoder;
use crate::{Encoding, Error, ErrorPolicy, Result};

/// Number of code points in the intermediate hand-off buffer.
const CODE_POINT_BUFFER_LEN: usize = 256;

/// How a source/destination pair is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStrategy {
    /// Full decode/encode pipeline.
    Convert,
    /// Identical encodings: validated byte copy.
    Copy,
    /// Same encoding, opposite byte order: validated copy with each code
    /// unit's bytes reversed.
    SwapEndianness,
}

/// Converts byte buffers from a source encoding to a destination encoding.
///
/// A `Converter` is stateless across calls: no decoded-but-unencoded code
/// points survive an invocation. The byte counts returned from
/// [`convert`](Converter::convert) are the only continuation state, so a
/// caller streaming chunks resumes by re-invoking at `source[consumed..]`.
#[derive(Debug, Clone)]
pub struct Converter {
    decoder: Decoder,
    encoder: Encoder,
    strategy: ConversionStrategy,
}

impl Converter {
    /// Create a converter from `source` to `destination`.
    pub fn new(source: Encoding, destination: Encoding) -> Self {
        Self {
            decoder: Decoder::new(source),
            encoder: Encoder::new(destination),
            strategy: classify(source, destination),
        }
    }

    /// The source encoding.
    pub fn source_encoding(&self) -> Encoding {
        self.decoder.encoding()
    }

    /// The destination encoding.
    pub fn destination_encoding(&self) -> Encoding {
        self.encoder.encoding()
    }

    /// How this source/destination pair is executed.
    pub fn strategy(&self) -> ConversionStrategy {
        self.strategy
    }

    /// Set the error policy for both the decode and encode stages.
    ///
    /// Takes effect on the next decode/encode step, not retroactively.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.decoder.set_policy(policy);
        self.encoder.set_policy(policy);
    }

    /// The decode-side error policy.
    pub fn decoder_error_policy(&self) -> ErrorPolicy {
        self.decoder.policy()
    }

    /// Set the error policy for malformed source sequences only.
    pub fn set_decoder_error_policy(&mut self, policy: ErrorPolicy) {
        self.decoder.set_policy(policy);
    }

    /// The encode-side error policy.
    pub fn encoder_error_policy(&self) -> ErrorPolicy {
        self.encoder.policy()
    }

    /// Set the error policy for unrepresentable code points only.
    pub fn set_encoder_error_policy(&mut self, policy: ErrorPolicy) {
        self.encoder.set_policy(policy);
    }

    /// Set the replacement character for both stages. It must be a scalar
    /// value the destination encoding can represent.
    pub fn set_replacement_char(&mut self, code_point: u32) -> Result<()> {
        self.encoder.set_replacement_char(code_point)?;
        self.decoder.set_replacement_char(code_point)
    }

    /// Convert bytes from `src` into `dst`, returning
    /// `(bytes_consumed, bytes_written)`.
    ///
    /// Both counts are byte offsets. Conversion stops when the source is
    /// exhausted, when the next decoded code point no longer fits in the
    /// destination, or when a truncated multi-byte sequence ends the source;
    /// in every case the reported `bytes_consumed` is the exact offset at
    /// which a subsequent call must resume.
    pub fn convert(&self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        match self.strategy {
            ConversionStrategy::Convert => self.convert_pipeline(src, dst),
            ConversionStrategy::Copy => match self.decoder.well_formed_prefix(src) {
                Some(prefix) => Ok(self.copy_sequences(&src[..prefix], dst, false)),
                None => self.convert_pipeline(src, dst),
            },
            ConversionStrategy::SwapEndianness => match self.decoder.well_formed_prefix(src) {
                Some(prefix) => Ok(self.copy_sequences(&src[..prefix], dst, true)),
                None => self.convert_pipeline(src, dst),
            },
        }
    }

    fn convert_pipeline(&self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let mut buf = [0u32; CODE_POINT_BUFFER_LEN];
        let mut consumed = 0;
        let mut written = 0;
        while consumed < src.len() && written < dst.len() {
            let source = &src[consumed..];
            let (dec_consumed, produced, decode_fault) =
                match self.decoder.decode(source, &mut buf) {
                    Ok((bytes, count)) => (bytes, count, false),
                    Err(Error::MalformedSequence {
                        consumed: bytes,
                        produced: count,
                        ..
                    }) => (bytes, count, true),
                    Err(other) => return Err(other),
                };
            if dec_consumed == 0 && produced == 0 && !decode_fault {
                // Truncated sequence at the head of the remaining source.
                break;
            }
            let (enc_consumed, enc_written) =
                match self.encoder.encode(&buf[..produced], &mut dst[written..]) {
                    Ok(pair) => pair,
                    Err(Error::UnrepresentableCodePoint {
                        encoding,
                        code_point,
                        consumed: count,
                        produced: bytes,
                    }) => {
                        return Err(Error::UnrepresentableCodePoint {
                            encoding,
                            code_point,
                            consumed: consumed + self.source_bytes_for(source, count),
                            produced: written + bytes,
                        });
                    }
                    Err(other) => return Err(other),
                };
            written += enc_written;
            if enc_consumed < produced {
                // Destination full. The decoded-but-unencoded code points
                // are dropped; report only the source bytes behind what was
                // actually encoded so the caller re-decodes from there.
                consumed += self.source_bytes_for(source, enc_consumed);
                return Ok((consumed, written));
            }
            consumed += dec_consumed;
            if decode_fault {
                return Err(Error::MalformedSequence {
                    encoding: self.decoder.encoding(),
                    consumed,
                    produced: written,
                });
            }
        }
        Ok((consumed, written))
    }

    /// Source byte length of the first `count` code points of `source`.
    ///
    /// Re-runs the decoder with a capped destination; decoding is
    /// deterministic, so this replays the exact byte positions of the
    /// current call.
    fn source_bytes_for(&self, source: &[u8], count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let mut scratch = [0u32; CODE_POINT_BUFFER_LEN];
        match self.decoder.decode(source, &mut scratch[..count]) {
            Ok((bytes, _)) => bytes,
            // Unreachable in practice: the capped decode stops at `count`
            // code points, all of which decoded cleanly moments ago.
            Err(Error::MalformedSequence { consumed, .. }) => consumed,
            Err(_) => 0,
        }
    }

    /// Copy whole valid sequences from an already-validated source,
    /// optionally reversing the bytes of each code unit.
    fn copy_sequences(&self, src: &[u8], dst: &mut [u8], swap: bool) -> (usize, usize) {
        let mut len = 0;
        loop {
            match self.decoder.step(&src[len..]) {
                DecodeStep::Scalar { len: step, .. } if len + step <= dst.len() => len += step,
                _ => break,
            }
        }
        dst[..len].copy_from_slice(&src[..len]);
        if swap {
            let unit = self.source_encoding().unit_size();
            for chunk in dst[..len].chunks_exact_mut(unit) {
                chunk.reverse();
            }
        }
        (len, len)
    }
}

fn classify(source: Encoding, destination: Encoding) -> ConversionStrategy {
    use Encoding::*;
    if source == destination {
        return ConversionStrategy::Copy;
    }
    match (source, destination) {
        (UTF16LE, UTF16BE) | (UTF16BE, UTF16LE) | (UTF32LE, UTF32BE) | (UTF32BE, UTF32LE) => {
            ConversionStrategy::SwapEndianness
        }
        _ => ConversionStrategy::Convert,
    }
}
