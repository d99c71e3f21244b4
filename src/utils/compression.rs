//! Payload compression strategies.
//!
//! The DEFLATE and LZ4 strategies share one frame shape:
//!
//! ```text
//! [ratio(1)] [compressed-or-raw payload(N)]
//! ```
//!
//! `ratio` is `original_len / compressed_len + 1`. A ratio of zero marks the
//! remainder as raw bytes, so a sender can skip compression per call without
//! any flag elsewhere. On receipt the ratio is recomputed from the inflated
//! length and a mismatch is reported as corruption. This witness only catches
//! gross damage such as truncation; it is not an integrity check.
//!
//! [`NoCompression`] is the identity and carries no ratio byte at all.

use crate::config::{DEFAULT_COMPRESSION_LEVEL, MAX_PAYLOAD_SIZE};
use crate::error::{constants, ProtocolError, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use tracing::{debug, warn};

/// Ratio byte value meaning "payload sent uncompressed"
pub const RATIO_PASSTHROUGH: u8 = 0;

/// Selects one of the compression strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    None,
    #[default]
    Deflate,
    Lz4,
}

impl CompressionKind {
    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            CompressionKind::None => "none",
            CompressionKind::Deflate => "deflate",
            CompressionKind::Lz4 => "lz4",
        }
    }

    /// Whether frames produced by this strategy start with a ratio byte
    pub fn is_ratio_framed(self) -> bool {
        !matches!(self, CompressionKind::None)
    }
}

impl FromStr for CompressionKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "dummy" => Ok(CompressionKind::None),
            "deflate" | "zlib" => Ok(CompressionKind::Deflate),
            "lz4" | "lzo" => Ok(CompressionKind::Lz4),
            other => Err(ProtocolError::ConfigError(format!(
                "Unknown compression kind: '{other}'"
            ))),
        }
    }
}

/// A payload compression strategy.
///
/// Implementations are stateless per call. [`duplicate`](Self::duplicate)
/// returns an independent instance so concurrent users never share one.
pub trait CompressionAlgorithm: Send + Sync + fmt::Debug {
    /// Which strategy this is
    fn kind(&self) -> CompressionKind;

    /// Compress `data` into a self-describing frame
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Recover the original payload from a frame produced by `compress`
    /// (or by [`frame_raw`](Self::frame_raw))
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Produce a freshly initialized instance of the same strategy
    fn duplicate(&self) -> Box<dyn CompressionAlgorithm>;

    /// Frame `data` without compressing it
    fn frame_raw(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + 1);
        out.push(RATIO_PASSTHROUGH);
        out.extend_from_slice(data);
        out
    }
}

/// Prefix `compressed` with its ratio byte.
///
/// # Errors
/// `EmptyCompressedOutput` if the compressor produced nothing, `RatioOverflow`
/// if the ratio does not fit in a byte.
pub fn wrap_with_ratio(original_len: usize, compressed: &[u8]) -> Result<Vec<u8>> {
    if compressed.is_empty() {
        return Err(ProtocolError::EmptyCompressedOutput);
    }

    let ratio = original_len / compressed.len() + 1;
    let ratio_byte = u8::try_from(ratio).map_err(|_| ProtocolError::RatioOverflow(ratio))?;

    let mut out = Vec::with_capacity(compressed.len() + 1);
    out.push(ratio_byte);
    out.extend_from_slice(compressed);
    Ok(out)
}

/// Strip the ratio byte, inflate the body and verify the witness.
pub fn unwrap_with_ratio<F>(framed: &[u8], inflate: F) -> Result<Vec<u8>>
where
    F: FnOnce(&[u8]) -> Result<Vec<u8>>,
{
    let (&ratio, body) = framed
        .split_first()
        .ok_or(ProtocolError::MissingRatioByte)?;

    if ratio == RATIO_PASSTHROUGH {
        return Ok(body.to_vec());
    }

    if body.is_empty() {
        return Err(ProtocolError::DecompressionFailure(format!(
            "ratio {ratio} with an empty body"
        )));
    }

    let decompressed = inflate(body)?;
    let check = decompressed.len() / body.len() + 1;
    if check != ratio as usize {
        warn!(
            expected = ratio,
            actual = check,
            compressed_len = body.len(),
            decompressed_len = decompressed.len(),
            "Compression ratio witness mismatch"
        );
        return Err(ProtocolError::RatioMismatch {
            expected: ratio,
            actual: check,
        });
    }

    Ok(decompressed)
}

/// Identity strategy; frames are the payload itself
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl CompressionAlgorithm for NoCompression {
    fn kind(&self) -> CompressionKind {
        CompressionKind::None
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn duplicate(&self) -> Box<dyn CompressionAlgorithm> {
        Box::new(NoCompression)
    }

    fn frame_raw(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }
}

/// zlib-wrapped DEFLATE
#[derive(Debug, Clone)]
pub struct DeflateCompression {
    level: u32,
    max_output: usize,
}

impl Default for DeflateCompression {
    fn default() -> Self {
        Self::new()
    }
}

impl DeflateCompression {
    pub fn new() -> Self {
        Self::with_level(DEFAULT_COMPRESSION_LEVEL)
    }

    /// Levels above 9 are clamped
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
            max_output: MAX_PAYLOAD_SIZE,
        }
    }

    /// Cap the size of any decompressed payload
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    fn inflate(&self, body: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        // One byte past the cap so an oversized stream is detectable
        ZlibDecoder::new(body)
            .take(self.max_output as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| ProtocolError::DecompressionFailure(e.to_string()))?;

        if out.len() > self.max_output {
            return Err(ProtocolError::DecompressedTooLarge(out.len()));
        }
        Ok(out)
    }
}

impl CompressionAlgorithm for DeflateCompression {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Deflate
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder
            .write_all(data)
            .map_err(|e| ProtocolError::CompressionFailure(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| ProtocolError::CompressionFailure(e.to_string()))?;

        debug!(
            original_len = data.len(),
            compressed_len = compressed.len(),
            "Deflate compressed payload"
        );
        wrap_with_ratio(data.len(), &compressed)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        unwrap_with_ratio(data, |body| self.inflate(body))
    }

    fn duplicate(&self) -> Box<dyn CompressionAlgorithm> {
        Box::new(DeflateCompression::with_level(self.level).with_max_output(self.max_output))
    }
}

/// LZ4 block compression with the uncompressed size prepended.
///
/// Fills the byte-oriented LZ77 ("LZO-style") slot of the strategy family.
#[derive(Debug, Clone)]
pub struct Lz4Compression {
    max_output: usize,
}

impl Default for Lz4Compression {
    fn default() -> Self {
        Self::new()
    }
}

impl Lz4Compression {
    pub fn new() -> Self {
        Self {
            max_output: MAX_PAYLOAD_SIZE,
        }
    }

    /// Cap the size of any decompressed payload
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    fn inflate(&self, body: &[u8]) -> Result<Vec<u8>> {
        // Validate the claimed size before lz4_flex allocates for it
        if body.len() < 4 {
            return Err(ProtocolError::DecompressionFailure(
                constants::ERR_DECOMPRESSION_FAILED.to_string(),
            ));
        }

        let claimed_size = u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize;
        if claimed_size > self.max_output {
            return Err(ProtocolError::DecompressedTooLarge(claimed_size));
        }

        lz4_flex::decompress_size_prepended(body)
            .map_err(|e| ProtocolError::DecompressionFailure(e.to_string()))
    }
}

impl CompressionAlgorithm for Lz4Compression {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Lz4
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let compressed = lz4_flex::compress_prepend_size(data);
        debug!(
            original_len = data.len(),
            compressed_len = compressed.len(),
            "LZ4 compressed payload"
        );
        wrap_with_ratio(data.len(), &compressed)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        unwrap_with_ratio(data, |body| self.inflate(body))
    }

    fn duplicate(&self) -> Box<dyn CompressionAlgorithm> {
        Box::new(Lz4Compression::new().with_max_output(self.max_output))
    }
}

/// Compress `data` if it meets the threshold, otherwise frame it raw.
///
/// Payloads whose ratio would overflow the ratio byte are framed raw as well.
/// Returns the frame and whether compression was applied.
pub fn maybe_compress(
    algorithm: &dyn CompressionAlgorithm,
    data: &[u8],
    threshold_bytes: usize,
) -> Result<(Vec<u8>, bool)> {
    if data.len() < threshold_bytes {
        return Ok((algorithm.frame_raw(data), false));
    }

    match algorithm.compress(data) {
        Ok(frame) => Ok((frame, algorithm.kind().is_ratio_framed())),
        Err(ProtocolError::RatioOverflow(ratio)) => {
            debug!(ratio, len = data.len(), "Ratio overflow, sending payload raw");
            Ok((algorithm.frame_raw(data), false))
        }
        Err(e) => Err(e),
    }
}
