//! FlateDecode via flate2.

use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// Inflate zlib data, falling back to a raw deflate stream.
///
/// Truncated input yields whatever was decoded before the damage.
pub fn inflate(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let zlib_err = match ZlibDecoder::new(input).read_to_end(&mut output) {
        Ok(_) => return Ok(output),
        Err(e) if !output.is_empty() => {
            log::warn!("FlateDecode partial recovery: {} bytes before error: {}", output.len(), e);
            return Ok(output);
        },
        Err(e) => e,
    };

    log::info!("Zlib decode failed ({}), trying raw deflate", zlib_err);
    output.clear();
    match DeflateDecoder::new(input).read_to_end(&mut output) {
        Ok(_) => Ok(output),
        Err(_) if !output.is_empty() => {
            log::warn!("Raw deflate partial recovery: {} bytes", output.len());
            Ok(output)
        },
        Err(e) => Err(Error::Decode(format!("FlateDecode failed: {}", e))),
    }
}
