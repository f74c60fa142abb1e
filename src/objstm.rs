//! Object streams (PDF 1.5+).
//!
//! An object stream packs several non-stream objects into one stream:
//!
//! ```text
//! 5 0 obj
//! << /Type /ObjStm /N 3 /First 15 /Filter /FlateDecode >>
//! stream
//! 10 0 11 3 12 8      % N pairs: object number, offset relative to /First
//! 42 (hi) <</A 1>>    % object data, starting at byte /First
//! endstream
//! endobj
//! ```
//!
//! A cross-reference entry `Compressed { stream, index }` names the container
//! and the position of the pair in the header, not the object number. The
//! header is parsed once per container and the result shared.

use crate::cursor::{ByteSource, MemoryCursor};
use crate::error::{Error, Result};
use crate::lexer::is_whitespace;
use crate::object::{Dictionary, Object};
use crate::parser::read_value;
use crate::parser_config::ParserOptions;
use crate::scanner::TokenScanner;
use crate::warnings::WarningSink;
use bytes::Bytes;
use nom::{
    IResult,
    bytes::complete::{take_while, take_while1},
    character::complete::digit1,
    combinator::map_res,
    multi::many_m_n,
    sequence::{preceded, separated_pair},
};

/// Decoded object stream with its parsed header.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectStream {
    data: Bytes,
    first: u64,
    entries: Vec<(u32, u64)>,
}

fn decimal(input: &[u8]) -> IResult<&[u8], u64> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u64>().map_err(|_| ()))
    })(input)
}

fn pair(input: &[u8]) -> IResult<&[u8], (u64, u64)> {
    preceded(take_while(is_whitespace), separated_pair(decimal, take_while1(is_whitespace), decimal))(input)
}

/// Up to `n` `number offset` pairs.
fn header_pairs(input: &[u8], n: usize) -> IResult<&[u8], Vec<(u64, u64)>> {
    many_m_n(0, n, pair)(input)
}

impl ObjectStream {
    /// Parse the header of an already decoded object stream.
    ///
    /// `/N` and `/First` are required. A header with fewer than `/N` pairs is an
    /// error in strict mode; lenient mode keeps the pairs it could read.
    pub fn parse(decoded: impl Into<Bytes>, dict: &Dictionary, options: &ParserOptions) -> Result<Self> {
        let data = decoded.into();
        if let Some(kind) = dict.get("Type").and_then(Object::as_name) {
            if kind != "ObjStm" {
                return Err(Error::InvalidObjectStream(format!("expected /Type /ObjStm, got /{}", kind)));
            }
        }

        let n = dict
            .get("N")
            .and_then(Object::as_integer)
            .ok_or_else(|| Error::InvalidObjectStream("missing /N".to_string()))?;
        let first = dict
            .get("First")
            .and_then(Object::as_integer)
            .ok_or_else(|| Error::InvalidObjectStream("missing /First".to_string()))?;

        let n = usize::try_from(n)
            .ok()
            .filter(|n| *n <= options.max_object_stream_objects)
            .ok_or_else(|| Error::InvalidObjectStream(format!("invalid /N {}", n)))?;
        let first = u64::try_from(first)
            .ok()
            .filter(|f| *f <= data.len() as u64)
            .ok_or_else(|| {
                Error::InvalidObjectStream(format!("/First {} outside {} bytes of data", first, data.len()))
            })?;

        let header = &data[..first as usize];
        let pairs = header_pairs(header, n)
            .map(|(_, pairs)| pairs)
            .map_err(|_| Error::InvalidObjectStream("unreadable header".to_string()))?;
        if pairs.len() < n {
            if !options.lenient {
                return Err(Error::InvalidObjectStream(format!(
                    "header declares {} objects but holds {}",
                    n,
                    pairs.len()
                )));
            }
            log::warn!("object stream header declares {} objects but holds {}", n, pairs.len());
        }

        let entries = pairs
            .into_iter()
            .filter_map(|(number, offset)| u32::try_from(number).ok().map(|number| (number, offset)))
            .collect();
        Ok(Self { data, first, entries })
    }

    /// `(object number, relative offset)` pairs in header order.
    pub fn entries(&self) -> &[(u32, u64)] {
        &self.entries
    }

    /// Number of objects in the header.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the header is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the object at header position `index`, which must be object `number`.
    ///
    /// On a number mismatch, lenient mode looks the object up by number instead.
    pub fn object_at(
        &self,
        index: u32,
        number: u32,
        options: &ParserOptions,
        sink: &dyn WarningSink,
    ) -> Result<Object> {
        let relative = match self.entries.get(index as usize) {
            Some(&(found, offset)) if found == number => offset,
            entry if options.lenient => {
                log::warn!(
                    "object stream slot {} holds {:?}, looking up object {} by number",
                    index,
                    entry.map(|e| e.0),
                    number
                );
                self.entries
                    .iter()
                    .find(|(found, _)| *found == number)
                    .map(|&(_, offset)| offset)
                    .ok_or_else(|| {
                        Error::InvalidObjectStream(format!("object {} is not in this stream", number))
                    })?
            },
            Some(&(found, _)) => {
                return Err(Error::InvalidObjectStream(format!(
                    "slot {} holds object {}, expected {}",
                    index, found, number
                )));
            },
            None => {
                return Err(Error::InvalidObjectStream(format!(
                    "slot {} out of range ({} objects)",
                    index,
                    self.entries.len()
                )));
            },
        };

        let mut cursor = MemoryCursor::new(self.data.clone());
        let offset = self
            .first
            .checked_add(relative)
            .filter(|offset| *offset < cursor.len())
            .ok_or_else(|| {
                Error::InvalidObjectStream(format!(
                    "object {} at {} + {} is past the end of the stream",
                    number, self.first, relative
                ))
            })?;
        cursor.seek(offset)?;
        let mut scanner = TokenScanner::new(&mut cursor, options).with_sink(sink);
        read_value(&mut scanner)?
            .ok_or_else(|| Error::InvalidObjectStream(format!("object {} has no value", number)))
    }
}
