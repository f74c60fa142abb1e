//! PDF lexer (tokenizer).
//!
//! Turns the byte at a cursor position into a single [`Token`]. The lookahead
//! byte is classified into a [`ByteClass`] and the matching sub-scanner runs:
//!
//! - digits, `+`, `-`, `.`: numeric
//! - `/`: name, with `#XX` escapes decoded inline
//! - `(`: literal string with escapes and balanced parentheses
//! - `<`: hex string, or the start of a dictionary when followed by `<`
//! - `[`: array start
//! - `%`: comment to end of line
//! - anything else: bare word (keywords and operators)
//!
//! A sub-scanner whose first byte is not in its class declines by returning
//! `Ok(None)`. Once it has started consuming a construct, invalid content is an
//! error. Arrays and dictionaries are only opened here; assembling them into
//! composite tokens is the job of [`crate::scanner::TokenScanner`].

use crate::cursor::ByteSource;
use crate::error::{Error, Result};
use crate::object::ObjectId;
use indexmap::IndexMap;
use nom::{
    IResult,
    character::complete::{char, digit0, one_of},
    combinator::opt,
    sequence::{preceded, tuple},
};

/// PDF whitespace: NUL, TAB, LF, FF, CR, SPACE.
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, 0 | b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

/// PDF delimiter characters.
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// First-byte dispatch classes of the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// Insignificant whitespace
    Whitespace,
    /// Start of a number
    Numeric,
    /// `/`
    Name,
    /// `(`
    LiteralString,
    /// `<`: hex string or dictionary start
    Angle,
    /// `[`
    ArrayOpen,
    /// `%`
    Comment,
    /// `{` or `}`
    Brace,
    /// `)`, `>`, `]`: closes something, never starts a token
    CloseDelimiter,
    /// Everything else
    BareWord,
}

/// Classify a lookahead byte.
pub fn classify(b: u8) -> ByteClass {
    match b {
        _ if is_whitespace(b) => ByteClass::Whitespace,
        b'0'..=b'9' | b'+' | b'-' | b'.' => ByteClass::Numeric,
        b'/' => ByteClass::Name,
        b'(' => ByteClass::LiteralString,
        b'<' => ByteClass::Angle,
        b'[' => ByteClass::ArrayOpen,
        b'%' => ByteClass::Comment,
        b'{' | b'}' => ByteClass::Brace,
        b')' | b'>' | b']' => ByteClass::CloseDelimiter,
        _ => ByteClass::BareWord,
    }
}

/// Parsed value of a numeric token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    /// No fractional part
    Integer(i64),
    /// Has a fractional part, or overflowed `i64`
    Real(f64),
}

impl std::fmt::Display for NumericValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericValue::Integer(i) => write!(f, "{}", i),
            NumericValue::Real(r) => write!(f, "{}", r),
        }
    }
}

/// A numeric token: the raw text as it appeared plus its best-effort value.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericToken {
    raw: String,
    value: NumericValue,
}

/// `[sign] digits [. digits]`, all parts optional.
fn numeric_prefix(input: &[u8]) -> IResult<&[u8], (Option<char>, &[u8], Option<&[u8]>)> {
    tuple((opt(one_of("+-")), digit0, opt(preceded(char('.'), digit0))))(input)
}

impl NumericToken {
    /// Interpret raw numeric text.
    ///
    /// Malformed input never fails: the longest well-formed prefix is used and
    /// an empty prefix counts as zero, so `-` is 0 and `1.2.3` is 1.2.
    pub fn parse(raw: &[u8]) -> Self {
        let (sign, int_digits, frac_digits) = match numeric_prefix(raw) {
            Ok((_, parts)) => parts,
            Err(_) => (None, &b""[..], None),
        };
        let negative = sign == Some('-');
        let int_text = std::str::from_utf8(int_digits).unwrap_or("");

        let value = match frac_digits {
            None => {
                let magnitude = if int_text.is_empty() { "0" } else { int_text };
                let signed = if negative {
                    format!("-{}", magnitude)
                } else {
                    magnitude.to_string()
                };
                match signed.parse::<i64>() {
                    Ok(i) => NumericValue::Integer(i),
                    Err(_) => NumericValue::Real(signed.parse::<f64>().unwrap_or(0.0)),
                }
            },
            Some(frac) => {
                let frac_text = std::str::from_utf8(frac).unwrap_or("");
                let text = format!(
                    "{}{}.{}",
                    if negative { "-" } else { "" },
                    if int_text.is_empty() { "0" } else { int_text },
                    if frac_text.is_empty() { "0" } else { frac_text }
                );
                NumericValue::Real(text.parse::<f64>().unwrap_or(0.0))
            },
        };

        Self {
            raw: String::from_utf8_lossy(raw).into_owned(),
            value,
        }
    }

    /// Raw text as scanned.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed value.
    pub fn value(&self) -> NumericValue {
        self.value
    }

    /// The value if it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self.value {
            NumericValue::Integer(i) => Some(i),
            NumericValue::Real(_) => None,
        }
    }

    /// The value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match self.value {
            NumericValue::Integer(i) => i as f64,
            NumericValue::Real(r) => r,
        }
    }
}

impl std::fmt::Display for NumericToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lexical and composite tokens.
///
/// The tokenizer produces every variant except `Array`, `Dictionary` and
/// `Reference`, which the scanner assembles.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer or real number
    Numeric(NumericToken),
    /// Name with escapes decoded (without the leading /)
    Name(String),
    /// Decoded literal string bytes
    LiteralString(Vec<u8>),
    /// Decoded hex string bytes
    HexString(Vec<u8>),
    /// `true` / `false`
    Boolean(bool),
    /// `null`
    Null,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
    /// `R`
    ReferenceMarker,
    /// `obj`
    ObjStart,
    /// `endobj`
    ObjEnd,
    /// `stream`
    StreamStart,
    /// `endstream`
    StreamEnd,
    /// Comment text after `%`, without the line ending
    Comment(Vec<u8>),
    /// Any other bare word
    Operator(String),
    /// Assembled array
    Array(Vec<Token>),
    /// Assembled dictionary
    Dictionary(IndexMap<String, Token>),
    /// Assembled `N G R` reference
    Reference(ObjectId),
}

impl Token {
    /// Integer value of a numeric token.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Token::Numeric(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Name payload.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Token::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Numeric(n) => format!("number {}", n),
            Token::Name(n) => format!("name /{}", n),
            Token::Operator(op) => format!("keyword '{}'", op),
            Token::LiteralString(_) | Token::HexString(_) => "string".to_string(),
            Token::Array(_) => "array".to_string(),
            Token::Dictionary(_) => "dictionary".to_string(),
            other => format!("{:?}", other),
        }
    }
}

/// Read one token at the cursor, dispatching on the class of the lookahead byte.
///
/// Returns `Ok(None)` at end of input, on whitespace and on close delimiters;
/// those are the scanner's business.
pub fn next_token(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    let Some(b) = cursor.peek()? else {
        return Ok(None);
    };
    match classify(b) {
        ByteClass::Numeric => scan_numeric(cursor),
        ByteClass::Name => scan_name(cursor),
        ByteClass::LiteralString => scan_literal_string(cursor),
        ByteClass::Angle => scan_angle(cursor),
        ByteClass::ArrayOpen => scan_array_open(cursor),
        ByteClass::Comment => scan_comment(cursor),
        ByteClass::Brace => scan_brace(cursor),
        ByteClass::BareWord => scan_bare_word(cursor),
        ByteClass::Whitespace | ByteClass::CloseDelimiter => Ok(None),
    }
}

/// Peek and check the lookahead byte class; `None` means decline.
fn lookahead_in(cursor: &mut dyn ByteSource, class: ByteClass) -> Result<Option<u8>> {
    Ok(cursor.peek()?.filter(|&b| classify(b) == class))
}

/// Consume bytes up to the next whitespace or delimiter.
fn read_regular(cursor: &mut dyn ByteSource) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(b) = cursor.peek()? {
        if is_whitespace(b) || is_delimiter(b) {
            break;
        }
        buf.push(b);
        cursor.advance()?;
    }
    Ok(buf)
}

/// Numeric sub-scanner.
pub fn scan_numeric(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    if lookahead_in(cursor, ByteClass::Numeric)?.is_none() {
        return Ok(None);
    }
    let raw = read_regular(cursor)?;
    Ok(Some(Token::Numeric(NumericToken::parse(&raw))))
}

/// Name sub-scanner.
pub fn scan_name(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    if lookahead_in(cursor, ByteClass::Name)?.is_none() {
        return Ok(None);
    }
    cursor.advance()?;
    let raw = read_regular(cursor)?;
    Ok(Some(Token::Name(decode_name_escapes(&raw))))
}

/// Decode `#XX` escapes in a raw name.
///
/// A `#` not followed by two hex digits is kept literally.
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let (Some(hi), Some(lo)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Literal string sub-scanner.
///
/// Stops exactly after the matching unescaped `)`.
pub fn scan_literal_string(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    if lookahead_in(cursor, ByteClass::LiteralString)?.is_none() {
        return Ok(None);
    }
    let start = cursor.position();
    cursor.advance()?;

    let mut out = Vec::new();
    let mut depth = 1usize;
    loop {
        let Some(b) = cursor.read_byte()? else {
            return Err(Error::parse(start, "unterminated literal string"));
        };
        match b {
            b'(' => {
                depth += 1;
                out.push(b);
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                out.push(b);
            },
            b'\\' => read_string_escape(cursor, &mut out)?,
            _ => out.push(b),
        }
    }
    Ok(Some(Token::LiteralString(out)))
}

/// Handle the bytes after a backslash inside a literal string.
fn read_string_escape(cursor: &mut dyn ByteSource, out: &mut Vec<u8>) -> Result<()> {
    let Some(b) = cursor.read_byte()? else {
        return Ok(());
    };
    match b {
        b'n' => out.push(b'\n'),
        b'r' => out.push(b'\r'),
        b't' => out.push(b'\t'),
        b'b' => out.push(0x08),
        b'f' => out.push(0x0C),
        b'(' | b')' | b'\\' => out.push(b),
        // Line continuation
        b'\n' => {},
        b'\r' => {
            if cursor.peek()? == Some(b'\n') {
                cursor.advance()?;
            }
        },
        b'0'..=b'7' => {
            let mut value = u32::from(b - b'0');
            for _ in 0..2 {
                match cursor.peek()? {
                    Some(d @ b'0'..=b'7') => {
                        value = value * 8 + u32::from(d - b'0');
                        cursor.advance()?;
                    },
                    _ => break,
                }
            }
            out.push((value & 0xFF) as u8);
        },
        // Unknown escape: the backslash is dropped
        other => out.push(other),
    }
    Ok(())
}

/// `<` sub-scanner: dictionary start for `<<`, hex string otherwise.
pub fn scan_angle(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    if lookahead_in(cursor, ByteClass::Angle)?.is_none() {
        return Ok(None);
    }
    let start = cursor.position();
    cursor.advance()?;
    if cursor.peek()? == Some(b'<') {
        cursor.advance()?;
        return Ok(Some(Token::DictStart));
    }

    let mut out = Vec::new();
    let mut pending: Option<u8> = None;
    loop {
        let offset = cursor.position();
        let Some(b) = cursor.read_byte()? else {
            return Err(Error::parse(start, "unterminated hex string"));
        };
        if b == b'>' {
            break;
        }
        if is_whitespace(b) {
            continue;
        }
        let Some(nibble) = hex_value(b) else {
            return Err(Error::lexical(
                offset,
                format!("invalid hex digit '{}' in hex string", b.escape_ascii()),
            ));
        };
        match pending.take() {
            Some(hi) => out.push((hi << 4) | nibble),
            None => pending = Some(nibble),
        }
    }
    if let Some(hi) = pending {
        out.push(hi << 4);
    }
    Ok(Some(Token::HexString(out)))
}

/// `[` sub-scanner.
pub fn scan_array_open(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    if lookahead_in(cursor, ByteClass::ArrayOpen)?.is_none() {
        return Ok(None);
    }
    cursor.advance()?;
    Ok(Some(Token::ArrayStart))
}

/// Comment sub-scanner: consumes to the end of the line, leaving the EOL.
pub fn scan_comment(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    if lookahead_in(cursor, ByteClass::Comment)?.is_none() {
        return Ok(None);
    }
    cursor.advance()?;
    let mut text = Vec::new();
    while let Some(b) = cursor.peek()? {
        if b == b'\n' || b == b'\r' {
            break;
        }
        text.push(b);
        cursor.advance()?;
    }
    Ok(Some(Token::Comment(text)))
}

/// `{` / `}` sub-scanner (PostScript calculator functions).
pub fn scan_brace(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    let Some(b) = lookahead_in(cursor, ByteClass::Brace)? else {
        return Ok(None);
    };
    cursor.advance()?;
    Ok(Some(Token::Operator((b as char).to_string())))
}

/// Bare-word sub-scanner: keywords and operators.
pub fn scan_bare_word(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    if lookahead_in(cursor, ByteClass::BareWord)?.is_none() {
        return Ok(None);
    }
    let raw = read_regular(cursor)?;
    let token = match raw.as_slice() {
        b"true" => Token::Boolean(true),
        b"false" => Token::Boolean(false),
        b"null" => Token::Null,
        b"R" => Token::ReferenceMarker,
        b"obj" => Token::ObjStart,
        b"endobj" => Token::ObjEnd,
        b"stream" => Token::StreamStart,
        b"endstream" => Token::StreamEnd,
        _ => Token::Operator(String::from_utf8_lossy(&raw).into_owned()),
    };
    Ok(Some(token))
}

/// Close-delimiter reader used by flat scans: `]` or `>>`.
///
/// Declines without consuming on anything else, including a lone `>`.
pub fn scan_close_delimiter(cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
    match cursor.peek()? {
        Some(b']') => {
            cursor.advance()?;
            Ok(Some(Token::ArrayEnd))
        },
        Some(b'>') => {
            let start = cursor.position();
            cursor.advance()?;
            if cursor.peek()? == Some(b'>') {
                cursor.advance()?;
                Ok(Some(Token::DictEnd))
            } else {
                cursor.seek(start)?;
                Ok(None)
            }
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MemoryCursor;

    fn lex(input: &[u8]) -> Result<Option<Token>> {
        let mut cursor = MemoryCursor::new(input.to_vec());
        next_token(&mut cursor)
    }

    fn lex_ok(input: &[u8]) -> Token {
        lex(input).unwrap().unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(b' '), ByteClass::Whitespace);
        assert_eq!(classify(0), ByteClass::Whitespace);
        assert_eq!(classify(b'-'), ByteClass::Numeric);
        assert_eq!(classify(b'/'), ByteClass::Name);
        assert_eq!(classify(b']'), ByteClass::CloseDelimiter);
        assert_eq!(classify(b'T'), ByteClass::BareWord);
    }

    #[test]
    fn test_numeric_values() {
        assert_eq!(NumericToken::parse(b"42").value(), NumericValue::Integer(42));
        assert_eq!(NumericToken::parse(b"-17").value(), NumericValue::Integer(-17));
        assert_eq!(NumericToken::parse(b"+5").value(), NumericValue::Integer(5));
        assert_eq!(NumericToken::parse(b"3.14").value(), NumericValue::Real(3.14));
        assert_eq!(NumericToken::parse(b".5").value(), NumericValue::Real(0.5));
        assert_eq!(NumericToken::parse(b"-.25").value(), NumericValue::Real(-0.25));
        assert_eq!(NumericToken::parse(b"4.").value(), NumericValue::Real(4.0));
    }

    #[test]
    fn test_numeric_malformed_is_best_effort() {
        assert_eq!(NumericToken::parse(b"-").value(), NumericValue::Integer(0));
        assert_eq!(NumericToken::parse(b".").value(), NumericValue::Real(0.0));
        assert_eq!(NumericToken::parse(b"1.2.3").value(), NumericValue::Real(1.2));
        assert_eq!(NumericToken::parse(b"12abc").value(), NumericValue::Integer(12));
    }

    #[test]
    fn test_numeric_overflow_becomes_real() {
        let token = NumericToken::parse(b"99999999999999999999");
        assert!(matches!(token.value(), NumericValue::Real(_)));
        assert_eq!(token.raw(), "99999999999999999999");
    }

    #[test]
    fn test_numeric_stops_at_delimiter() {
        let mut cursor = MemoryCursor::new(&b"12/Name"[..]);
        let token = next_token(&mut cursor).unwrap().unwrap();
        assert_eq!(token.as_integer(), Some(12));
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_name_escapes() {
        assert_eq!(lex_ok(b"/Type"), Token::Name("Type".into()));
        assert_eq!(lex_ok(b"/A#20B"), Token::Name("A B".into()));
        assert_eq!(lex_ok(b"/A#2"), Token::Name("A#2".into()));
        assert_eq!(lex_ok(b"/A#zzB"), Token::Name("A#zzB".into()));
        assert_eq!(lex_ok(b"/"), Token::Name(String::new()));
    }

    #[test]
    fn test_literal_string_escapes() {
        assert_eq!(lex_ok(b"(a\\nb)"), Token::LiteralString(b"a\nb".to_vec()));
        assert_eq!(lex_ok(b"(\\(x\\))"), Token::LiteralString(b"(x)".to_vec()));
        assert_eq!(lex_ok(b"(\\101\\7)"), Token::LiteralString(vec![b'A', 7]));
        assert_eq!(lex_ok(b"(\\0053)"), Token::LiteralString(vec![5, b'3']));
        assert_eq!(lex_ok(b"(ab\\\ncd)"), Token::LiteralString(b"abcd".to_vec()));
        assert_eq!(lex_ok(b"(ab\\\r\ncd)"), Token::LiteralString(b"abcd".to_vec()));
        assert_eq!(lex_ok(b"(\\q)"), Token::LiteralString(b"q".to_vec()));
    }

    #[test]
    fn test_literal_string_balanced_parens() {
        let mut cursor = MemoryCursor::new(&b"(a(b)c) rest"[..]);
        let token = next_token(&mut cursor).unwrap().unwrap();
        assert_eq!(token, Token::LiteralString(b"a(b)c".to_vec()));
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn test_literal_string_escaped_paren_does_not_nest() {
        assert_eq!(lex_ok(b"(a\\(b)"), Token::LiteralString(b"a(b".to_vec()));
    }

    #[test]
    fn test_literal_string_unterminated() {
        let err = lex(b"(abc").unwrap_err();
        assert!(matches!(err, Error::ParseError { offset: 0, .. }));
    }

    #[test]
    fn test_hex_strings() {
        assert_eq!(lex_ok(b"<03>"), Token::HexString(vec![0x03]));
        assert_eq!(lex_ok(b"<9a37eF>"), Token::HexString(vec![0x9a, 0x37, 0xef]));
        assert_eq!(lex_ok(b"<901FA>"), Token::HexString(vec![0x90, 0x1f, 0xa0]));
        assert_eq!(lex_ok(b"<48 65\n6C>"), Token::HexString(b"Hel".to_vec()));
        assert_eq!(lex_ok(b"<>"), Token::HexString(Vec::new()));
    }

    #[test]
    fn test_hex_string_bad_digit_is_lexical() {
        let err = lex(b"<03AR>").unwrap_err();
        assert!(matches!(err, Error::Lexical { offset: 4, .. }));
    }

    #[test]
    fn test_dict_start_and_close() {
        assert_eq!(lex_ok(b"<<"), Token::DictStart);
        let mut cursor = MemoryCursor::new(&b">>"[..]);
        assert_eq!(next_token(&mut cursor).unwrap(), None);
        assert_eq!(scan_close_delimiter(&mut cursor).unwrap(), Some(Token::DictEnd));

        let mut cursor = MemoryCursor::new(&b"> "[..]);
        assert_eq!(scan_close_delimiter(&mut cursor).unwrap(), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_comment() {
        let mut cursor = MemoryCursor::new(&b"%PDF-1.7\r\n1"[..]);
        assert_eq!(next_token(&mut cursor).unwrap(), Some(Token::Comment(b"PDF-1.7".to_vec())));
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(lex_ok(b"true"), Token::Boolean(true));
        assert_eq!(lex_ok(b"false"), Token::Boolean(false));
        assert_eq!(lex_ok(b"null"), Token::Null);
        assert_eq!(lex_ok(b"R"), Token::ReferenceMarker);
        assert_eq!(lex_ok(b"obj"), Token::ObjStart);
        assert_eq!(lex_ok(b"endobj"), Token::ObjEnd);
        assert_eq!(lex_ok(b"stream\r\n"), Token::StreamStart);
        assert_eq!(lex_ok(b"endstream"), Token::StreamEnd);
        assert_eq!(lex_ok(b"Tj"), Token::Operator("Tj".into()));
        assert_eq!(lex_ok(b"T*"), Token::Operator("T*".into()));
        assert_eq!(lex_ok(b"{"), Token::Operator("{".into()));
    }

    #[test]
    fn test_sub_scanners_decline_foreign_bytes() {
        let mut cursor = MemoryCursor::new(&b"/Name"[..]);
        assert_eq!(scan_numeric(&mut cursor).unwrap(), None);
        assert_eq!(scan_literal_string(&mut cursor).unwrap(), None);
        assert_eq!(scan_bare_word(&mut cursor).unwrap(), None);
        assert_eq!(cursor.position(), 0);
        assert_eq!(scan_name(&mut cursor).unwrap(), Some(Token::Name("Name".into())));
    }
}
