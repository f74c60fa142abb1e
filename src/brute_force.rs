//! Brute-force object location.
//!
//! When the declared cross-reference structure is missing or unusable, the
//! whole source is scanned once for `N G obj` headers. Candidates are found
//! with a byte regex and confirmed by running a flat-mode scanner over the
//! candidate, which must produce Numeric, Numeric, `obj`.
//!
//! If an identity occurs more than once, the later offset wins: in an
//! incrementally updated file the later copy supersedes the earlier one.
//!
//! Results are memoized per [`SourceId`], so repeated recovery attempts against
//! the same source never rescan it.

use crate::cursor::{ByteSource, MemoryCursor, SourceId};
use crate::error::Result;
use crate::lexer::{self, Token};
use crate::object::ObjectId;
use crate::parser_config::ParserOptions;
use crate::scanner::{ScanMode, TokenScanner};
use bytes::Bytes;
use lazy_static::lazy_static;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

lazy_static! {
    /// Candidate "N G obj" headers
    static ref RE_OBJ_PATTERN: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(\d+)[\x00\t\n\x0C\r ]+(\d+)[\x00\t\n\x0C\r ]+obj").unwrap();

    /// "trailer <<" keyword
    static ref RE_TRAILER: regex::bytes::Regex = regex::bytes::Regex::new(r"trailer[\x00\t\n\x0C\r ]*<<").unwrap();
}

/// Everything one brute-force pass learned about a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BruteForceTable {
    offsets: HashMap<ObjectId, u64>,
    trailers: Vec<u64>,
}

impl BruteForceTable {
    /// Offset of the object header for `id`.
    pub fn get(&self, id: ObjectId) -> Option<u64> {
        self.offsets.get(&id).copied()
    }

    /// All located objects.
    pub fn offsets(&self) -> &HashMap<ObjectId, u64> {
        &self.offsets
    }

    /// Located objects ordered by offset.
    pub fn by_offset(&self) -> BTreeMap<u64, ObjectId> {
        self.offsets.iter().map(|(id, off)| (*off, *id)).collect()
    }

    /// Offsets of `trailer` keywords, ascending.
    pub fn trailer_offsets(&self) -> &[u64] {
        &self.trailers
    }

    /// Number of located objects.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when nothing was found.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Brute-force searcher owning the per-source memo.
#[derive(Debug, Default)]
pub struct BruteForceSearcher {
    memo: HashMap<SourceId, Arc<BruteForceTable>>,
}

impl BruteForceSearcher {
    /// Create a searcher with an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate every object header in `cursor`, scanning at most once per source.
    ///
    /// The cursor position is restored afterwards.
    pub fn locate(&mut self, cursor: &mut dyn ByteSource) -> Result<Arc<BruteForceTable>> {
        let id = cursor.source_id();
        if let Some(table) = self.memo.get(&id) {
            log::debug!("brute-force table for {:?} served from memo", id);
            return Ok(table.clone());
        }

        let saved = cursor.position();
        let data = cursor.read_range(0, cursor.len() as usize)?;
        cursor.seek(saved)?;

        let table = Arc::new(scan(Bytes::from(data)));
        log::info!("brute-force scan located {} objects", table.len());
        self.memo.insert(id, table.clone());
        Ok(table)
    }

    /// True when `source` has already been scanned.
    pub fn is_memoized(&self, source: SourceId) -> bool {
        self.memo.contains_key(&source)
    }
}

/// Scan an in-memory copy of the source.
fn scan(data: Bytes) -> BruteForceTable {
    let mut table = BruteForceTable::default();
    let mut confirm_cursor = MemoryCursor::new(data.clone());
    let options = ParserOptions::lenient();

    for m in RE_OBJ_PATTERN.find_iter(&data) {
        let start = m.start();
        if start > 0 && !is_boundary(data[start - 1]) {
            continue;
        }
        if let Some(id) = confirm(&mut confirm_cursor, start as u64, &options) {
            // ascending scan order, so a later occurrence overwrites
            table.offsets.insert(id, start as u64);
        }
    }

    table.trailers = RE_TRAILER.find_iter(&data).map(|m| m.start() as u64).collect();
    table
}

fn is_boundary(b: u8) -> bool {
    lexer::is_whitespace(b) || lexer::is_delimiter(b)
}

/// Re-tokenize a regex candidate and accept it only as Numeric, Numeric, `obj`.
fn confirm(cursor: &mut MemoryCursor, offset: u64, options: &ParserOptions) -> Option<ObjectId> {
    cursor.seek(offset).ok()?;
    let mut scanner = TokenScanner::new(cursor, options).with_mode(ScanMode::Flat);
    let number = scanner.next_token().ok()??.as_integer()?;
    let generation = scanner.next_token().ok()??.as_integer()?;
    match scanner.next_token().ok()?? {
        Token::ObjStart => ObjectId::from_numbers(number, generation),
        _ => None,
    }
}
