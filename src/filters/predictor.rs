//! PNG and TIFF predictors (`/DecodeParms /Predictor`).

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object};

/// Predictor parameters from a `/DecodeParms` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    /// 1 = none, 2 = TIFF, 10-15 = PNG
    pub predictor: i64,
    /// Samples per row
    pub columns: usize,
    /// Components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    /// Read parameters, keeping defaults for absent or non-integer entries.
    pub fn from_dict(dict: &Dictionary) -> Self {
        let get = |key: &str| dict.get(key).and_then(Object::as_integer);
        let defaults = Self::default();
        Self {
            predictor: get("Predictor").unwrap_or(defaults.predictor),
            columns: get("Columns").and_then(|v| usize::try_from(v).ok()).unwrap_or(defaults.columns),
            colors: get("Colors").and_then(|v| usize::try_from(v).ok()).unwrap_or(defaults.colors),
            bits_per_component: get("BitsPerComponent")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.bits_per_component),
        }
    }

    fn row_bytes(&self) -> Result<usize> {
        self.columns
            .checked_mul(self.colors)
            .and_then(|n| n.checked_mul(self.bits_per_component))
            .map(|bits| bits.div_ceil(8))
            .ok_or_else(|| Error::Decode(format!("predictor row of {} columns overflows", self.columns)))
    }

    fn pixel_bytes(&self) -> Result<usize> {
        self.colors
            .checked_mul(self.bits_per_component)
            .map(|bits| bits.div_ceil(8).max(1))
            .ok_or_else(|| Error::Decode(format!("predictor pixel of {} colors overflows", self.colors)))
    }
}

/// Undo the predictor described by `params`.
pub fn apply_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => tiff(data, params),
        10..=15 => png(data, params),
        other => Err(Error::Decode(format!("Unsupported predictor: {}", other))),
    }
}

fn tiff(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(Error::Decode(format!(
            "TIFF predictor with {} bits per component",
            params.bits_per_component
        )));
    }
    let row = params.row_bytes()?.max(1);
    let bpp = params.colors.max(1);
    let mut out = data.to_vec();
    for chunk in out.chunks_mut(row) {
        for i in bpp..chunk.len() {
            chunk[i] = chunk[i].wrapping_add(chunk[i - bpp]);
        }
    }
    Ok(out)
}

fn png(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let row = params.row_bytes()?;
    if row == 0 {
        return Err(Error::Decode("PNG predictor with empty rows".to_string()));
    }
    let bpp = params.pixel_bytes()?;
    let mut out = Vec::with_capacity(data.len());
    // no decoded row is longer than the input
    let mut prev = vec![0u8; row.min(data.len())];

    // Every row carries its own algorithm tag; a short final row is decoded as far as it goes.
    for encoded in data.chunks(row + 1) {
        let (tag, body) = match encoded.split_first() {
            Some((tag, body)) => (*tag, body),
            None => break,
        };
        let mut cur = vec![0u8; body.len()];
        for i in 0..body.len() {
            let left = if i >= bpp { cur[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => return Err(Error::Decode(format!("Invalid PNG predictor tag: {}", other))),
            };
            cur[i] = body[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&cur);
        prev[..cur.len()].copy_from_slice(&cur);
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_params(columns: usize) -> DecodeParams {
        DecodeParams {
            predictor: 12,
            columns,
            ..Default::default()
        }
    }

    #[test]
    fn test_png_sub_and_none_rows() {
        let data = [1u8, 5, 1, 1, 0, 9, 9, 9];
        let out = apply_predictor(&data, &png_params(3)).unwrap();
        assert_eq!(out, vec![5, 6, 7, 9, 9, 9]);
    }

    #[test]
    fn test_png_average_and_paeth() {
        let data = [0u8, 10, 20, 3, 2, 2, 4, 1, 1];
        let out = apply_predictor(&data, &png_params(2)).unwrap();
        // average: 2 + (0+10)/2 = 7, 2 + (7+20)/2 = 15
        assert_eq!(&out[..4], &[10, 20, 7, 15]);
        // paeth on row 3 against row 2 (7, 15)
        assert_eq!(out[4], 1 + 7);
    }

    #[test]
    fn test_invalid_png_tag() {
        assert!(apply_predictor(&[7u8, 1, 2], &png_params(2)).is_err());
    }

    #[test]
    fn test_tiff_predictor() {
        let params = DecodeParams {
            predictor: 2,
            columns: 4,
            ..Default::default()
        };
        assert_eq!(apply_predictor(&[1, 1, 1, 1], &params).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_oversized_rows_are_errors() {
        let params = png_params(usize::MAX / 2);
        assert!(matches!(apply_predictor(&[0u8, 1, 2], &params), Err(Error::Decode(_))));

        let params = DecodeParams {
            predictor: 2,
            colors: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(apply_predictor(&[1u8, 2], &params), Err(Error::Decode(_))));
    }

    #[test]
    fn test_wide_rows_use_only_the_input() {
        // declared row far wider than the data: decoded as a short final row
        let out = apply_predictor(&[2u8, 4, 5], &png_params(1 << 40)).unwrap();
        assert_eq!(out, vec![4, 5]);
    }

    #[test]
    fn test_from_dict_defaults() {
        let mut dict = Dictionary::new();
        dict.insert("Columns".to_string(), Object::Integer(5));
        let params = DecodeParams::from_dict(&dict);
        assert_eq!(params.columns, 5);
        assert_eq!(params.predictor, 1);
    }
}
