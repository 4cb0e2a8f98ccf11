//! Payload codec utilities.
//!
//! Drains response streams into memory and inflates zlib/gzip payloads before
//! they are turned into text.

use std::io::Read;

use bytes::{Bytes, BytesMut};
use flate2::read::{GzDecoder, ZlibDecoder};
use thiserror::Error;

const DEFAULT_DRAIN_CAPACITY: usize = 8 * 1024;
/// Upper bound on the buffer reserved up front from `Content-Length`.
const MAX_PREALLOCATION: usize = 64 * 1024;

/// How the raw response bytes are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompressionMode {
    /// Interpret the bytes as UTF-8 directly.
    #[default]
    None,
    Zlib,
    Gzip,
}

/// Failure while inflating a compressed payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("zlib inflate failed: {0}")]
    Zlib(#[source] std::io::Error),
    #[error("gzip inflate failed: {0}")]
    Gzip(#[source] std::io::Error),
}

/// Initial buffer size for a body announcing `content_length` bytes.
///
/// The announced length is server controlled, so it only sizes the first
/// allocation up to [`MAX_PREALLOCATION`]; the buffer grows as data arrives.
pub fn preallocation(content_length: Option<u64>) -> usize {
    content_length.map_or(DEFAULT_DRAIN_CAPACITY, |len| {
        usize::try_from(len).map_or(MAX_PREALLOCATION, |len| len.min(MAX_PREALLOCATION))
    })
}

/// Reads a response body chunk by chunk until the stream ends.
pub async fn drain_response(mut response: reqwest::Response) -> Result<Bytes, reqwest::Error> {
    let mut buffer = BytesMut::with_capacity(preallocation(response.content_length()));
    while let Some(chunk) = response.chunk().await? {
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Drains a blocking reader into memory.
pub fn drain_reader<R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut output = Vec::with_capacity(DEFAULT_DRAIN_CAPACITY);
    reader.read_to_end(&mut output)?;
    Ok(output)
}

/// Inflates a complete zlib (RFC 1950) buffer.
pub fn zlib_decompress(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    drain_reader(ZlibDecoder::new(data)).map_err(DecodeError::Zlib)
}

/// Inflates a complete gzip (RFC 1952) buffer.
pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    drain_reader(GzDecoder::new(data)).map_err(DecodeError::Gzip)
}

/// Decodes raw response bytes into text according to `mode`.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, so only a
/// malformed compressed payload can fail.
pub fn decode_text(data: &[u8], mode: DecompressionMode) -> Result<String, DecodeError> {
    let text = match mode {
        DecompressionMode::None => String::from_utf8_lossy(data).into_owned(),
        DecompressionMode::Zlib => String::from_utf8_lossy(&zlib_decompress(data)?).into_owned(),
        DecompressionMode::Gzip => String::from_utf8_lossy(&gzip_decompress(data)?).into_owned(),
    };
    Ok(text)
}
