//! Stream filter collaborator.
//!
//! The resolver never decodes stream data on its own initiative. Callers and
//! the two places that must read packed data (cross-reference streams and
//! object streams) go through a [`StreamFilters`] implementation, which takes
//! the raw bytes plus the stream dictionary.
//!
//! [`StandardFilters`] covers what those structures use in practice:
//! unfiltered data, `FlateDecode` and `ASCIIHexDecode`, with PNG/TIFF
//! predictors from `/DecodeParms`.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object};

mod flate;
mod predictor;

pub use flate::inflate;
pub use predictor::{DecodeParams, apply_predictor};

/// Decodes stream data according to its dictionary.
pub trait StreamFilters {
    /// Apply every filter named by `/Filter`, in order.
    fn decode(&self, data: &[u8], dict: &Dictionary) -> Result<Vec<u8>>;
}

/// Built-in filter set.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFilters;

impl StandardFilters {
    fn decode_one(&self, name: &str, data: &[u8], params: Option<&Dictionary>) -> Result<Vec<u8>> {
        let decoded = match name {
            "FlateDecode" | "Fl" => inflate(data)?,
            "ASCIIHexDecode" | "AHx" => decode_ascii_hex(data)?,
            other => return Err(Error::UnsupportedFilter(other.to_string())),
        };
        match params.map(DecodeParams::from_dict) {
            Some(p) if p.predictor > 1 => apply_predictor(&decoded, &p),
            _ => Ok(decoded),
        }
    }
}

impl StreamFilters for StandardFilters {
    fn decode(&self, data: &[u8], dict: &Dictionary) -> Result<Vec<u8>> {
        let names = filter_names(dict);
        let params = decode_parms(dict, names.len());
        let mut current = data.to_vec();
        for (index, name) in names.iter().enumerate() {
            log::debug!("applying {} to {} bytes", name, current.len());
            current = self.decode_one(name, &current, params.get(index).copied().flatten())?;
        }
        Ok(current)
    }
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get("Filter") {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// One optional parameter dictionary per filter.
fn decode_parms(dict: &Dictionary, count: usize) -> Vec<Option<&Dictionary>> {
    let mut out = match dict.get("DecodeParms").or_else(|| dict.get("DP")) {
        Some(Object::Dictionary(d)) => vec![Some(d)],
        Some(Object::Array(items)) => items
            .iter()
            .map(|o| match o {
                Object::Dictionary(d) => Some(d),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    out.resize(count, None);
    out
}

fn decode_ascii_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;
    for &b in data {
        if b == b'>' {
            break;
        }
        if crate::lexer::is_whitespace(b) {
            continue;
        }
        let nibble = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(Error::Decode(format!("invalid ASCIIHex digit 0x{:02x}", b))),
        };
        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}
