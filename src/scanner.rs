//! Token scanner.
//!
//! [`TokenScanner`] drives the tokenizer over a [`ByteSource`], skipping
//! whitespace and noise, and (in [`ScanMode::Nested`]) assembling arrays,
//! dictionaries and `N G R` references into composite tokens. A bounded
//! [`ScanScope`] tells it when the composite being read has reached its close
//! delimiter.
//!
//! Upstream consumers can register extra byte-triggered tokenizers with
//! [`TokenScanner::register_tokenizer`]; these are tried before the built-in
//! sub-scanners.

use crate::cursor::ByteSource;
use crate::error::{Error, ErrorCategory, Result};
use crate::lexer::{self, Token};
use crate::object::ObjectId;
use crate::parser_config::ParserOptions;
use crate::warnings::{LOG_SINK, ParseWarning, WarningSink};
use indexmap::IndexMap;

/// What kind of composite the scanner is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    /// Top level
    None,
    /// Inside `[ ... ]`
    Array,
    /// Inside `<< ... >>`
    Dictionary,
}

/// How composite delimiters are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Arrays, dictionaries and references come back as single composite tokens
    Nested,
    /// Every delimiter comes back as its own token; nothing is assembled
    Flat,
}

/// An upstream tokenizer triggered by a specific lookahead byte.
///
/// The cursor is positioned on the trigger byte. Returning `Ok(None)` declines
/// and the built-in sub-scanners run instead.
pub trait CustomTokenizer {
    /// Try to read one token.
    fn scan(&mut self, cursor: &mut dyn ByteSource) -> Result<Option<Token>>;
}

impl<F> CustomTokenizer for F
where
    F: FnMut(&mut dyn ByteSource) -> Result<Option<Token>>,
{
    fn scan(&mut self, cursor: &mut dyn ByteSource) -> Result<Option<Token>> {
        self(cursor)
    }
}

/// Pull-based token reader with scope tracking.
pub struct TokenScanner<'a> {
    cursor: &'a mut dyn ByteSource,
    options: ParserOptions,
    sink: &'a dyn WarningSink,
    scope: ScanScope,
    mode: ScanMode,
    depth: usize,
    custom: Vec<(u8, Box<dyn CustomTokenizer + 'a>)>,
}

impl<'a> TokenScanner<'a> {
    /// Create a nested-mode scanner reporting warnings to the log.
    pub fn new(cursor: &'a mut dyn ByteSource, options: &ParserOptions) -> Self {
        Self {
            cursor,
            options: *options,
            sink: &LOG_SINK,
            scope: ScanScope::None,
            mode: ScanMode::Nested,
            depth: 0,
            custom: Vec::new(),
        }
    }

    /// Report warnings to `sink` instead of the log.
    pub fn with_sink(mut self, sink: &'a dyn WarningSink) -> Self {
        self.sink = sink;
        self
    }

    /// Switch between nested and flat scanning.
    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Register a tokenizer for `trigger`. Later registrations for the same byte
    /// are tried after earlier ones.
    pub fn register_tokenizer(&mut self, trigger: u8, tokenizer: impl CustomTokenizer + 'a) {
        self.custom.push((trigger, Box::new(tokenizer)));
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Move the cursor. The scope is left untouched.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.cursor.seek(pos)
    }

    /// Active scope.
    pub fn scope(&self) -> ScanScope {
        self.scope
    }

    /// Options this scanner was built with.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Warning sink in use.
    pub fn sink(&self) -> &'a dyn WarningSink {
        self.sink
    }

    /// Direct access to the underlying cursor, for raw reads such as stream data.
    pub fn cursor(&mut self) -> &mut dyn ByteSource {
        &mut *self.cursor
    }

    /// Skip whitespace and NUL bytes.
    pub fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.cursor.peek()? {
            if !lexer::is_whitespace(b) {
                break;
            }
            self.cursor.advance()?;
        }
        Ok(())
    }

    /// Read the next token.
    ///
    /// Returns `Ok(None)` at end of input, or when the active scope's close
    /// delimiter is next (the delimiter is not consumed).
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            self.skip_whitespace()?;
            let start = self.cursor.position();
            let Some(b) = self.cursor.peek()? else {
                return Ok(None);
            };
            if self.at_terminal(b)? {
                return Ok(None);
            }

            match self.scan_one(b) {
                Ok(Some(token)) => return self.finish(token, start),
                Ok(None) => self.skip_noise(start, b)?,
                Err(e) if self.options.lenient && e.category() == ErrorCategory::Lexical => {
                    self.sink.warn(ParseWarning::NoiseSkipped {
                        offset: start,
                        reason: e.to_string(),
                    });
                    self.skip_to_boundary()?;
                },
                Err(e) => return Err(e),
            }
        }
    }

    fn at_terminal(&mut self, b: u8) -> Result<bool> {
        match (self.scope, b) {
            (ScanScope::Array, b']') => Ok(true),
            (ScanScope::Dictionary, b'>') => self.followed_by(b'>'),
            _ => Ok(false),
        }
    }

    /// True when the byte after the lookahead is `next`. Does not move the cursor.
    fn followed_by(&mut self, next: u8) -> Result<bool> {
        let pos = self.cursor.position();
        self.cursor.advance()?;
        let found = self.cursor.peek()? == Some(next);
        self.cursor.seek(pos)?;
        Ok(found)
    }

    fn scan_one(&mut self, b: u8) -> Result<Option<Token>> {
        if self.mode == ScanMode::Flat {
            if let Some(token) = lexer::scan_close_delimiter(&mut *self.cursor)? {
                return Ok(Some(token));
            }
        }

        let pos = self.cursor.position();
        for (trigger, tokenizer) in self.custom.iter_mut() {
            if *trigger != b {
                continue;
            }
            match tokenizer.scan(&mut *self.cursor)? {
                Some(token) => return Ok(Some(token)),
                None => self.cursor.seek(pos)?,
            }
        }

        lexer::next_token(&mut *self.cursor)
    }

    fn skip_noise(&mut self, start: u64, b: u8) -> Result<()> {
        let width = if b == b'>' && self.followed_by(b'>')? { 2 } else { 1 };
        self.cursor.seek(start + width)?;
        let text = if width == 2 { ">>".to_string() } else { b.escape_ascii().to_string() };
        self.sink.warn(ParseWarning::NoiseSkipped {
            offset: start,
            reason: format!("stray '{}'", text),
        });
        Ok(())
    }

    fn skip_to_boundary(&mut self) -> Result<()> {
        while let Some(b) = self.cursor.peek()? {
            if lexer::is_whitespace(b) || lexer::is_delimiter(b) {
                break;
            }
            self.cursor.advance()?;
        }
        Ok(())
    }

    fn finish(&mut self, token: Token, start: u64) -> Result<Option<Token>> {
        if self.mode == ScanMode::Flat {
            return Ok(Some(token));
        }
        match token {
            Token::ArrayStart => {
                let items = self.read_composite(ScanScope::Array, start)?;
                Ok(Some(Token::Array(items)))
            },
            Token::DictStart => {
                let items = self.read_composite(ScanScope::Dictionary, start)?;
                self.pair_entries(items, start).map(|d| Some(Token::Dictionary(d)))
            },
            other => Ok(Some(other)),
        }
    }

    /// Collect the items of a composite up to and including its close delimiter.
    fn read_composite(&mut self, scope: ScanScope, start: u64) -> Result<Vec<Token>> {
        if self.depth >= self.options.max_nesting {
            return Err(Error::NestingLimitExceeded(self.options.max_nesting));
        }
        let outer = std::mem::replace(&mut self.scope, scope);
        self.depth += 1;
        let collected = self.collect_items();
        self.depth -= 1;
        self.scope = outer;
        let items = collected?;

        let close: &[u8] = if scope == ScanScope::Array { b"]" } else { b">>" };
        if self.cursor.is_eof() {
            if !self.options.lenient {
                return Err(Error::parse(start, "composite never closed"));
            }
            self.sink.warn(ParseWarning::UnterminatedComposite { offset: start });
        } else {
            self.cursor.seek(self.cursor.position() + close.len() as u64)?;
        }
        Ok(items)
    }

    fn collect_items(&mut self) -> Result<Vec<Token>> {
        let mut items = Vec::new();
        while let Some(token) = self.next_token()? {
            if matches!(token, Token::Comment(_)) {
                continue;
            }
            items.push(token);
            fold_reference(&mut items);
        }
        Ok(items)
    }

    fn pair_entries(&mut self, items: Vec<Token>, start: u64) -> Result<IndexMap<String, Token>> {
        let mut dict = IndexMap::new();
        let mut iter = items.into_iter();
        while let Some(key) = iter.next() {
            let Token::Name(name) = key else {
                if !self.options.lenient {
                    return Err(Error::parse(
                        start,
                        format!("dictionary key must be a name, found {}", key.describe()),
                    ));
                }
                self.sink.warn(ParseWarning::NoiseSkipped {
                    offset: start,
                    reason: format!("dictionary key {}", key.describe()),
                });
                continue;
            };
            match iter.next() {
                Some(value) => {
                    dict.insert(name, value);
                },
                None if self.options.lenient => {
                    self.sink.warn(ParseWarning::NoiseSkipped {
                        offset: start,
                        reason: format!("dictionary key /{} has no value", name),
                    });
                },
                None => {
                    return Err(Error::parse(start, format!("dictionary key /{} has no value", name)));
                },
            }
        }
        Ok(dict)
    }
}

/// Replace a trailing `int int R` with a single reference token.
fn fold_reference(items: &mut Vec<Token>) {
    let n = items.len();
    if n < 3 || items[n - 1] != Token::ReferenceMarker {
        return;
    }
    let id = match (items[n - 3].as_integer(), items[n - 2].as_integer()) {
        (Some(num), Some(gen)) => ObjectId::from_numbers(num, gen),
        _ => None,
    };
    if let Some(id) = id {
        items.truncate(n - 3);
        items.push(Token::Reference(id));
    }
}
