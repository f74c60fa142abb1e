//! PDF object parser.
//!
//! Turns scanner tokens into [`Object`] values and reads indirect objects at a
//! byte offset. Reading an indirect object is split in two phases:
//!
//! 1. [`read_object_prefix`] reads `N G obj`, the body value and, for streams,
//!    the position of the first data byte.
//! 2. [`read_stream_data`] captures the raw stream bytes once the caller knows
//!    the stream length.
//!
//! The split lets the resolver look up an indirect `/Length` between the two
//! phases without holding the scanner across that lookup.

use crate::cursor::ByteSource;
use crate::error::{Error, Result};
use crate::lexer::{self, NumericValue, Token};
use crate::object::{Dictionary, Object, ObjectId};
use crate::parser_config::ParserOptions;
use crate::scanner::TokenScanner;
use crate::warnings::{ParseWarning, WarningSink};
use bytes::Bytes;

const ENDSTREAM: &[u8] = b"endstream";

/// Header, body and stream position of an indirect object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPrefix {
    /// Identity declared by the `N G obj` header
    pub id: ObjectId,
    /// Offset of the header's first byte
    pub offset: u64,
    /// Body value; the stream dictionary for streams
    pub body: Object,
    /// Offset of the first stream data byte, if the body is a stream
    pub stream_start: Option<u64>,
}

fn is_value_token(token: &Token) -> bool {
    matches!(
        token,
        Token::Numeric(_)
            | Token::Name(_)
            | Token::LiteralString(_)
            | Token::HexString(_)
            | Token::Boolean(_)
            | Token::Null
            | Token::Array(_)
            | Token::Dictionary(_)
            | Token::Reference(_)
    )
}

/// Convert a value token into an object.
///
/// Keywords and delimiters are not values. Strict mode rejects them; lenient
/// mode drops them from arrays and turns them into Null elsewhere.
pub fn object_from_token(
    token: Token,
    offset: u64,
    options: &ParserOptions,
    sink: &dyn WarningSink,
) -> Result<Object> {
    let object = match token {
        Token::Numeric(n) => match n.value() {
            NumericValue::Integer(i) => Object::Integer(i),
            NumericValue::Real(r) => Object::Real(r),
        },
        Token::Name(name) => Object::Name(name),
        Token::LiteralString(bytes) | Token::HexString(bytes) => Object::String(bytes),
        Token::Boolean(b) => Object::Boolean(b),
        Token::Null => Object::Null,
        Token::Reference(id) => Object::Reference(id),
        Token::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if !is_value_token(&item) && options.lenient {
                    sink.warn(ParseWarning::NoiseSkipped {
                        offset,
                        reason: format!("{} inside array", item.describe()),
                    });
                    continue;
                }
                out.push(object_from_token(item, offset, options, sink)?);
            }
            Object::Array(out)
        },
        Token::Dictionary(entries) => {
            let mut dict = Dictionary::with_capacity(entries.len());
            for (key, value) in entries {
                dict.insert(key, object_from_token(value, offset, options, sink)?);
            }
            Object::Dictionary(dict)
        },
        other => {
            if !options.lenient {
                return Err(Error::InvalidObjectType {
                    expected: "value".to_string(),
                    found: other.describe(),
                });
            }
            sink.warn(ParseWarning::NoiseSkipped {
                offset,
                reason: format!("{} used as a value", other.describe()),
            });
            Object::Null
        },
    };
    Ok(object)
}

/// Next token that is not a comment.
pub fn next_significant(scanner: &mut TokenScanner<'_>) -> Result<Option<Token>> {
    loop {
        match scanner.next_token()? {
            Some(Token::Comment(_)) => continue,
            other => return Ok(other),
        }
    }
}

/// Read one value, folding a top-level `N G R` into a reference.
///
/// Returns `Ok(None)` at end of input.
pub fn read_value(scanner: &mut TokenScanner<'_>) -> Result<Option<Object>> {
    scanner.skip_whitespace()?;
    let offset = scanner.position();
    let Some(token) = next_significant(scanner)? else {
        return Ok(None);
    };

    if let Some(number) = token.as_integer() {
        let after_first = scanner.position();
        if let Some(id) = try_reference_tail(scanner, number)? {
            return Ok(Some(Object::Reference(id)));
        }
        scanner.seek(after_first)?;
    }

    let options = *scanner.options();
    object_from_token(token, offset, &options, scanner.sink()).map(Some)
}

/// After an integer, look for `G R`. Leaves the cursor anywhere on failure.
fn try_reference_tail(scanner: &mut TokenScanner<'_>, number: i64) -> Result<Option<ObjectId>> {
    let generation = match next_significant(scanner) {
        Ok(Some(token)) => token.as_integer(),
        _ => None,
    };
    let Some(generation) = generation else {
        return Ok(None);
    };
    match next_significant(scanner) {
        Ok(Some(Token::ReferenceMarker)) => Ok(ObjectId::from_numbers(number, generation)),
        _ => Ok(None),
    }
}

/// Read a value that must be a dictionary.
pub fn read_dictionary(scanner: &mut TokenScanner<'_>) -> Result<Dictionary> {
    let offset = scanner.position();
    match read_value(scanner)? {
        Some(Object::Dictionary(dict)) => Ok(dict),
        Some(other) => Err(Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: other.type_name().to_string(),
        }),
        None => Err(Error::parse(offset, "expected dictionary, found end of input")),
    }
}

/// Read an `N G obj` header at the current position.
pub fn read_object_header(scanner: &mut TokenScanner<'_>) -> Result<ObjectId> {
    scanner.skip_whitespace()?;
    let offset = scanner.position();
    let number = scanner.next_token()?.and_then(|t| t.as_integer());
    let generation = scanner.next_token()?.and_then(|t| t.as_integer());
    let keyword = scanner.next_token()?;
    match (number, generation, keyword) {
        (Some(n), Some(g), Some(Token::ObjStart)) => ObjectId::from_numbers(n, g)
            .ok_or_else(|| Error::parse(offset, format!("object number {} {} out of range", n, g))),
        _ => Err(Error::parse(offset, "expected 'N G obj' header")),
    }
}

/// Read the header and body of the indirect object at `offset`.
///
/// For a stream, the cursor is left on the first data byte and its position is
/// returned in [`ObjectPrefix::stream_start`].
pub fn read_object_prefix(scanner: &mut TokenScanner<'_>, offset: u64) -> Result<ObjectPrefix> {
    scanner.seek(offset)?;
    let id = read_object_header(scanner)?;
    let body_offset = scanner.position();
    let Some(body) = read_value(scanner)? else {
        return Err(Error::parse(body_offset, format!("object {} has no body", id)));
    };

    scanner.skip_whitespace()?;
    let after_body = scanner.position();
    let options = *scanner.options();
    let sink = scanner.sink();
    match scanner.next_token()? {
        Some(Token::StreamStart) => {
            if !matches!(body, Object::Dictionary(_)) {
                return Err(Error::parse(
                    after_body,
                    format!("stream keyword after {} in object {}", body.type_name(), id),
                ));
            }
            skip_stream_eol(scanner.cursor(), &options, sink)?;
            Ok(ObjectPrefix {
                id,
                offset,
                body,
                stream_start: Some(scanner.position()),
            })
        },
        Some(Token::ObjEnd) => Ok(ObjectPrefix {
            id,
            offset,
            body,
            stream_start: None,
        }),
        _ if options.lenient => {
            sink.warn(ParseWarning::MissingEndobj { object: id });
            Ok(ObjectPrefix {
                id,
                offset,
                body,
                stream_start: None,
            })
        },
        _ => Err(Error::parse(after_body, format!("expected endobj after object {}", id))),
    }
}

/// Skip the end-of-line marker after the `stream` keyword.
///
/// CRLF and LF are accepted in both modes. Lenient mode also accepts a lone CR
/// and trailing spaces before the line ending.
fn skip_stream_eol(
    cursor: &mut dyn ByteSource,
    options: &ParserOptions,
    sink: &dyn WarningSink,
) -> Result<()> {
    let offset = cursor.position();
    if options.lenient {
        while matches!(cursor.peek()?, Some(b' ') | Some(b'\t')) {
            cursor.advance()?;
        }
    }
    match cursor.peek()? {
        Some(b'\n') => cursor.advance(),
        Some(b'\r') => {
            cursor.advance()?;
            if cursor.peek()? == Some(b'\n') {
                return cursor.advance();
            }
            if !options.lenient {
                return Err(Error::parse(offset, "stream keyword followed by CR alone"));
            }
            sink.warn(ParseWarning::NoiseSkipped {
                offset,
                reason: "stream keyword followed by CR alone".to_string(),
            });
            Ok(())
        },
        _ if options.lenient => {
            sink.warn(ParseWarning::NoiseSkipped {
                offset,
                reason: "no line ending after stream keyword".to_string(),
            });
            Ok(())
        },
        _ => Err(Error::parse(offset, "stream keyword must be followed by CRLF or LF")),
    }
}

/// True (and the cursor moved past it) when `endstream` follows, after optional whitespace.
fn consume_endstream(cursor: &mut dyn ByteSource) -> Result<bool> {
    while let Some(b) = cursor.peek()? {
        if !lexer::is_whitespace(b) {
            break;
        }
        cursor.advance()?;
    }
    let pos = cursor.position();
    let found = cursor.read_range(pos, ENDSTREAM.len())? == ENDSTREAM;
    if !found {
        cursor.seek(pos)?;
    }
    Ok(found)
}

/// Capture the raw bytes of a stream starting at `start`.
///
/// With a usable `length` the bytes must be followed by `endstream`. Otherwise
/// strict mode fails and lenient mode delimits the data by scanning for the
/// next `endstream`, dropping the line ending before it.
pub fn read_stream_data(
    cursor: &mut dyn ByteSource,
    start: u64,
    length: Option<u64>,
    options: &ParserOptions,
    sink: &dyn WarningSink,
) -> Result<Bytes> {
    let total = cursor.len();
    if let Some(n) = length {
        if start.saturating_add(n) <= total {
            let data = cursor.read_range(start, n as usize)?;
            if consume_endstream(cursor)? {
                return Ok(Bytes::from(data));
            }
        }
        if !options.lenient {
            return Err(Error::parse(start, format!("stream /Length {} does not end at endstream", n)));
        }
    } else if !options.lenient {
        return Err(Error::parse(start, "stream has no usable /Length"));
    }

    let rest = cursor.read_range(start, (total - start.min(total)) as usize)?;
    let Some(pos) = find_endstream(&rest) else {
        return Err(Error::parse(start, "endstream not found"));
    };
    let mut end = pos;
    if end > 0 && rest[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && rest[end - 1] == b'\r' {
        end -= 1;
    }
    sink.warn(ParseWarning::StreamLengthRecovered {
        offset: start,
        length: end as u64,
    });
    cursor.seek(start + (pos + ENDSTREAM.len()) as u64)?;
    Ok(Bytes::copy_from_slice(&rest[..end]))
}

/// Position of the first `endstream` keyword in `input`.
pub fn find_endstream(input: &[u8]) -> Option<usize> {
    input
        .windows(ENDSTREAM.len())
        .position(|window| window == ENDSTREAM)
}

/// Direct `/Length` of a stream dictionary, when it is a non-negative integer.
pub fn direct_length(dict: &Dictionary) -> Option<u64> {
    dict.get("Length")
        .and_then(Object::as_integer)
        .and_then(|n| u64::try_from(n).ok())
}
