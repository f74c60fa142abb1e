//! Cross-reference resolution.
//!
//! Builds the object-identity → location index of a document from its
//! cross-reference sections. Two section forms exist:
//!
//! - classic tables: `xref`, subsection headers `<first> <count>`, fixed-width
//!   entries `oooooooooo ggggg n|f`, then `trailer << ... >>`
//! - cross-reference streams: a stream object whose decoded bytes are packed
//!   rows laid out by `/W`, grouped by `/Index`
//!
//! Sections are chained backward through `/Prev` (and `/XRefStm` in hybrid
//! files). The chain is walked with an explicit loop over a visited-offset set.
//! The first section read is the most current, so entries and trailer keys are
//! merged first-writer-wins.
//!
//! In lenient mode an unusable main section makes the index fall back to a
//! brute-force scan (see [`crate::brute_force`]).

use crate::brute_force::{BruteForceSearcher, BruteForceTable};
use crate::cursor::ByteSource;
use crate::error::{Error, Result};
use crate::filters::StreamFilters;
use crate::lexer::Token;
use crate::object::{Dictionary, Object, ObjectId};
use crate::parser::{self, read_dictionary, read_object_prefix};
use crate::parser_config::ParserOptions;
use crate::scanner::TokenScanner;
use crate::warnings::{ParseWarning, WarningSink};
use byteorder::{BigEndian, ByteOrder};
use nom::{
    IResult,
    bytes::complete::take_while_m_n,
    character::complete::{char, digit1, multispace0, one_of, space1},
    combinator::{all_consuming, map_res},
    sequence::{preceded, separated_pair, tuple},
};
use std::collections::{HashMap, HashSet};

/// Keys of a cross-reference stream dictionary that describe the stream, not the document.
const STREAM_ONLY_KEYS: &[&str] = &["Length", "Filter", "DecodeParms", "DP", "F", "W", "Index", "Type"];

/// Location of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// Free slot
    Free,
    /// Uncompressed object at a byte offset
    InUse {
        /// Offset of the `N G obj` header
        offset: u64,
    },
    /// Object packed inside an object stream
    Compressed {
        /// Object number of the containing object stream
        stream: u32,
        /// Index of the object within that stream
        index: u32,
    },
}

/// Merged index of every section in the chain, plus the merged trailer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossReferenceIndex {
    entries: HashMap<ObjectId, XrefEntry>,
    trailer: Dictionary,
    recovered: bool,
}

impl CrossReferenceIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index holding only the InUse offsets of a brute-force scan.
    pub fn from_brute_force(table: &BruteForceTable) -> Self {
        let entries = table
            .offsets()
            .iter()
            .map(|(id, offset)| (*id, XrefEntry::InUse { offset: *offset }))
            .collect();
        Self {
            entries,
            trailer: Dictionary::new(),
            recovered: true,
        }
    }

    /// Entry for `id`.
    pub fn get(&self, id: ObjectId) -> Option<XrefEntry> {
        self.entries.get(&id).copied()
    }

    /// Insert unless `id` already has an entry. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, id: ObjectId, entry: XrefEntry) -> bool {
        match self.entries.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            },
        }
    }

    /// Merge trailer keys, keeping values already present.
    pub fn merge_trailer(&mut self, trailer: &Dictionary) {
        for (key, value) in trailer {
            if !self.trailer.contains_key(key) {
                self.trailer.insert(key.clone(), value.clone());
            }
        }
    }

    /// Merged trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &XrefEntry)> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the index was synthesized by a brute-force scan.
    pub fn is_recovered(&self) -> bool {
        self.recovered
    }
}

/// One parsed section before merging.
#[derive(Debug, Default)]
struct Section {
    entries: Vec<(ObjectId, XrefEntry)>,
    trailer: Dictionary,
    prev: Option<u64>,
    xref_stm: Option<u64>,
}

/// Locate the offset named by the last `startxref` in the tail of the file.
pub fn find_startxref(cursor: &mut dyn ByteSource, options: &ParserOptions) -> Result<u64> {
    let len = cursor.len();
    let window = len.min(options.startxref_window);
    let tail = cursor.read_range(len - window, window as usize)?;

    let keyword = b"startxref";
    let pos = tail
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .ok_or_else(|| Error::InvalidXref("startxref not found".to_string()))?;

    let after = &tail[pos + keyword.len()..];
    let (_, offset) = preceded(multispace0, decimal)(after)
        .map_err(|_| Error::InvalidXref("startxref is not followed by an offset".to_string()))?;
    log::debug!("startxref points to byte {}", offset);
    Ok(offset)
}

fn decimal(input: &[u8]) -> IResult<&[u8], u64> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u64>().map_err(|_| ()))
    })(input)
}

fn subsection_header(line: &[u8]) -> IResult<&[u8], (u64, u64)> {
    all_consuming(separated_pair(decimal, space1, decimal))(line)
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn digits_to_u64(digits: &[u8]) -> std::result::Result<u64, ()> {
    std::str::from_utf8(digits)
        .map_err(|_| ())
        .and_then(|s| s.parse::<u64>().map_err(|_| ()))
}

/// `oooooooooo ggggg n` with exact field widths.
fn strict_entry(line: &[u8]) -> IResult<&[u8], (u64, u64, char)> {
    let (rest, (offset, _, generation, _, flag)) = all_consuming(tuple((
        map_res(take_while_m_n(10, 10, is_digit), digits_to_u64),
        char(' '),
        map_res(take_while_m_n(5, 5, is_digit), digits_to_u64),
        char(' '),
        one_of("fn"),
    )))(line)?;
    Ok((rest, (offset, generation, flag)))
}

/// Entry with any digit counts and any amount of spacing.
fn lenient_entry(line: &[u8]) -> IResult<&[u8], (u64, u64, char)> {
    let (rest, (offset, _, generation, _, flag)) =
        all_consuming(tuple((decimal, space1, decimal, space1, one_of("fn"))))(line)?;
    Ok((rest, (offset, generation, flag)))
}

fn trim(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|b| !crate::lexer::is_whitespace(*b)).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !crate::lexer::is_whitespace(*b)).map_or(start, |p| p + 1);
    &line[start..end.max(start)]
}

/// Read one line, consuming its CR, LF or CRLF ending.
fn read_line(cursor: &mut dyn ByteSource) -> Result<Option<Vec<u8>>> {
    if cursor.is_eof() {
        return Ok(None);
    }
    let mut line = Vec::new();
    while let Some(b) = cursor.read_byte()? {
        match b {
            b'\n' => break,
            b'\r' => {
                if cursor.peek()? == Some(b'\n') {
                    cursor.advance()?;
                }
                break;
            },
            _ => line.push(b),
        }
    }
    Ok(Some(line))
}

/// Cross-reference resolver for one document.
pub struct XrefResolver<'a> {
    options: ParserOptions,
    filters: &'a dyn StreamFilters,
    sink: &'a dyn WarningSink,
}

impl<'a> XrefResolver<'a> {
    /// Create a resolver.
    pub fn new(options: &ParserOptions, filters: &'a dyn StreamFilters, sink: &'a dyn WarningSink) -> Self {
        Self {
            options: *options,
            filters,
            sink,
        }
    }

    /// Build the index from the section at `start` and everything it chains to.
    ///
    /// Strict mode fails on the first unreadable section. Lenient mode falls back
    /// to a brute-force index when the main section is unusable, and skips
    /// unreadable older sections.
    pub fn resolve(
        &self,
        cursor: &mut dyn ByteSource,
        start: u64,
        searcher: &mut BruteForceSearcher,
    ) -> Result<CrossReferenceIndex> {
        let mut index = CrossReferenceIndex::new();
        let mut visited = HashSet::new();
        let mut pending = vec![start];
        let mut sections = 0usize;

        while let Some(offset) = pending.pop() {
            if !visited.insert(offset) {
                log::warn!("cross-reference chain revisits byte {}, stopping", offset);
                self.sink.warn(ParseWarning::PrevChainCycle { offset });
                continue;
            }
            if sections >= self.options.max_prev_chain {
                log::warn!("cross-reference chain longer than {} sections", self.options.max_prev_chain);
                break;
            }

            let section = match self.read_section(cursor, offset, searcher) {
                Ok(section) => section,
                Err(e) if !self.options.lenient => return Err(e),
                Err(e) if sections == 0 => {
                    return self.recover(cursor, searcher, &format!("main cross-reference section: {}", e));
                },
                Err(e) => {
                    log::warn!("skipping unreadable cross-reference section at byte {}: {}", offset, e);
                    continue;
                },
            };
            sections += 1;

            log::debug!(
                "cross-reference section at byte {}: {} entries, prev {:?}, xrefstm {:?}",
                offset,
                section.entries.len(),
                section.prev,
                section.xref_stm
            );
            for (id, entry) in section.entries {
                index.insert_if_absent(id, entry);
            }
            index.merge_trailer(&section.trailer);

            if let Some(prev) = section.prev {
                pending.push(prev);
            }
            // popped before /Prev: hybrid stream entries outrank older sections
            if let Some(stm) = section.xref_stm {
                pending.push(stm);
            }
        }

        Ok(index)
    }

    /// Build an index purely from a brute-force scan.
    ///
    /// Only InUse locations are recoverable. The trailer is taken from the last
    /// readable `trailer` dictionary, else the last cross-reference stream
    /// dictionary, and `/Root` is filled from the first `/Type /Catalog` object
    /// if still missing.
    pub fn recover(
        &self,
        cursor: &mut dyn ByteSource,
        searcher: &mut BruteForceSearcher,
        reason: &str,
    ) -> Result<CrossReferenceIndex> {
        log::info!("rebuilding cross-reference index by brute-force scan: {}", reason);
        self.sink.warn(ParseWarning::BruteForceFallback {
            reason: reason.to_string(),
        });

        let table = searcher.locate(cursor)?;
        if table.is_empty() {
            return Err(Error::InvalidXref(format!("{}; brute-force scan found no objects", reason)));
        }
        let mut index = CrossReferenceIndex::from_brute_force(&table);

        let trailer = self
            .last_trailer_dictionary(cursor, &table)
            .or_else(|| self.last_xref_stream_dictionary(cursor, &table))
            .unwrap_or_default();
        index.merge_trailer(&trailer);

        if !index.trailer.contains_key("Root") {
            if let Some(root) = self.find_catalog(cursor, &table) {
                log::info!("using {} as document catalog", root);
                index.trailer.insert("Root".to_string(), Object::Reference(root));
            }
        }
        if !index.trailer.contains_key("Size") {
            let size = table.offsets().keys().map(|id| i64::from(id.number) + 1).max().unwrap_or(0);
            index.trailer.insert("Size".to_string(), Object::Integer(size));
        }
        Ok(index)
    }

    fn last_trailer_dictionary(&self, cursor: &mut dyn ByteSource, table: &BruteForceTable) -> Option<Dictionary> {
        for &offset in table.trailer_offsets().iter().rev() {
            let mut scanner = TokenScanner::new(cursor, &self.options).with_sink(self.sink);
            if scanner.seek(offset + b"trailer".len() as u64).is_err() {
                continue;
            }
            if let Ok(dict) = read_dictionary(&mut scanner) {
                return Some(dict);
            }
        }
        None
    }

    fn last_xref_stream_dictionary(&self, cursor: &mut dyn ByteSource, table: &BruteForceTable) -> Option<Dictionary> {
        for (&offset, _) in table.by_offset().iter().rev() {
            let mut scanner = TokenScanner::new(cursor, &self.options).with_sink(self.sink);
            let Ok(prefix) = read_object_prefix(&mut scanner, offset) else {
                continue;
            };
            if let Object::Dictionary(dict) = prefix.body {
                if dict.get("Type").and_then(Object::as_name) == Some("XRef") {
                    return Some(strip_stream_keys(dict));
                }
            }
        }
        None
    }

    fn find_catalog(&self, cursor: &mut dyn ByteSource, table: &BruteForceTable) -> Option<ObjectId> {
        for (&offset, &id) in table.by_offset().iter() {
            let mut scanner = TokenScanner::new(cursor, &self.options).with_sink(self.sink);
            let Ok(prefix) = read_object_prefix(&mut scanner, offset) else {
                continue;
            };
            let is_catalog = prefix
                .body
                .as_dict()
                .and_then(|d| d.get("Type"))
                .and_then(Object::as_name)
                == Some("Catalog");
            if is_catalog {
                return Some(id);
            }
        }
        None
    }

    fn read_section(
        &self,
        cursor: &mut dyn ByteSource,
        offset: u64,
        searcher: &mut BruteForceSearcher,
    ) -> Result<Section> {
        if offset >= cursor.len() {
            return Err(Error::OffsetOutOfRange {
                offset,
                len: cursor.len(),
            });
        }

        let first = {
            let mut scanner = TokenScanner::new(cursor, &self.options).with_sink(self.sink);
            scanner.seek(offset)?;
            scanner.next_token()?
        };
        match first {
            Some(Token::Operator(ref word)) if word == "xref" => self.read_classic(cursor, offset, searcher),
            Some(Token::Numeric(_)) => self.read_stream(cursor, offset),
            other => Err(Error::InvalidXref(format!(
                "expected 'xref' or a cross-reference stream at byte {}, found {}",
                offset,
                other.map_or_else(|| "end of input".to_string(), |t| t.describe())
            ))),
        }
    }

    /// Parse a classic table. The cursor is just past the `xref` keyword.
    fn read_classic(
        &self,
        cursor: &mut dyn ByteSource,
        table_start: u64,
        searcher: &mut BruteForceSearcher,
    ) -> Result<Section> {
        let mut entries: Vec<(ObjectId, XrefEntry)> = Vec::new();
        let mut skipping = false;

        let table_end = loop {
            let line_start = cursor.position();
            let Some(raw) = read_line(cursor)? else {
                return Err(Error::InvalidXref(format!(
                    "table at byte {} is not followed by a trailer",
                    table_start
                )));
            };
            let line = trim(&raw);
            if line.is_empty() {
                continue;
            }
            if line.starts_with(b"trailer") {
                let keyword_at = raw.iter().position(|b| !crate::lexer::is_whitespace(*b)).unwrap_or(0);
                cursor.seek(line_start + (keyword_at + b"trailer".len()) as u64)?;
                break line_start;
            }

            let (first, count) = match subsection_header(line) {
                Ok((_, header)) => header,
                Err(_) if skipping && lenient_entry(line).is_ok() => continue,
                Err(_) => {
                    self.malformed(line_start, format!("bad subsection header '{}'", line.escape_ascii()))?;
                    skipping = true;
                    continue;
                },
            };
            if count > self.options.max_subsection_count {
                self.malformed(line_start, format!("subsection declares {} entries", count))?;
                skipping = true;
                continue;
            }
            skipping = false;
            self.read_subsection(cursor, first, count, &mut entries)?;
        };

        let mut section = Section::default();
        for (id, entry) in entries {
            match entry {
                XrefEntry::InUse { offset } if (table_start..table_end).contains(&offset) => {
                    if !self.options.lenient {
                        return Err(Error::XrefSelfReference {
                            object: id,
                            offset,
                            table_start,
                            table_end,
                        });
                    }
                    self.sink.warn(ParseWarning::XrefSelfReference { object: id, offset });
                    if let Some(found) = searcher.locate(cursor)?.get(id) {
                        section.entries.push((id, XrefEntry::InUse { offset: found }));
                    }
                },
                _ => section.entries.push((id, entry)),
            }
        }

        let mut scanner = TokenScanner::new(cursor, &self.options).with_sink(self.sink);
        section.trailer = read_dictionary(&mut scanner)?;
        section.prev = offset_value(&section.trailer, "Prev");
        section.xref_stm = offset_value(&section.trailer, "XRefStm");
        Ok(section)
    }

    /// Read `count` entries; a non-entry line before that ends the subsection early.
    fn read_subsection(
        &self,
        cursor: &mut dyn ByteSource,
        first: u64,
        count: u64,
        entries: &mut Vec<(ObjectId, XrefEntry)>,
    ) -> Result<()> {
        let mut k = 0u64;
        while k < count {
            let line_start = cursor.position();
            let Some(raw) = read_line(cursor)? else {
                return Err(Error::InvalidXref(format!("subsection {} {} runs past end of input", first, count)));
            };
            let line = trim(&raw);
            if line.is_empty() {
                continue;
            }

            let parsed = if self.options.lenient {
                lenient_entry(line)
            } else {
                strict_entry(line)
            };
            let Ok((_, (offset, generation, flag))) = parsed else {
                self.malformed(
                    line_start,
                    format!("subsection {} {} ends after {} entries", first, count, k),
                )?;
                cursor.seek(line_start)?;
                return Ok(());
            };

            let id = first
                .checked_add(k)
                .and_then(|n| u32::try_from(n).ok())
                .zip(u16::try_from(generation).ok())
                .map(|(n, g)| ObjectId::new(n, g));
            match id {
                Some(id) if flag == 'n' => entries.push((id, XrefEntry::InUse { offset })),
                Some(id) => entries.push((id, XrefEntry::Free)),
                None => self.malformed(
                    line_start,
                    format!("entry {} of subsection {} {} out of range", k, first, count),
                )?,
            }
            k += 1;
        }
        Ok(())
    }

    /// Strict: fail. Lenient: report and carry on.
    fn malformed(&self, offset: u64, reason: String) -> Result<()> {
        if !self.options.lenient {
            return Err(Error::InvalidXref(format!("byte {}: {}", offset, reason)));
        }
        self.sink.warn(ParseWarning::MalformedSubsection { offset, reason });
        Ok(())
    }

    fn read_stream(&self, cursor: &mut dyn ByteSource, offset: u64) -> Result<Section> {
        let prefix = {
            let mut scanner = TokenScanner::new(cursor, &self.options).with_sink(self.sink);
            read_object_prefix(&mut scanner, offset)?
        };
        let (Object::Dictionary(dict), Some(start)) = (prefix.body, prefix.stream_start) else {
            return Err(Error::InvalidXref(format!("object at byte {} is not a stream", offset)));
        };
        if dict.get("Type").and_then(Object::as_name) != Some("XRef") {
            if !self.options.lenient {
                return Err(Error::InvalidXref(format!("stream at byte {} is not /Type /XRef", offset)));
            }
            log::warn!("cross-reference stream at byte {} lacks /Type /XRef", offset);
        }

        let raw = parser::read_stream_data(cursor, start, parser::direct_length(&dict), &self.options, self.sink)?;
        let data = self.filters.decode(&raw, &dict)?;
        let entries = self.unpack_stream_entries(&data, &dict)?;

        Ok(Section {
            entries,
            prev: offset_value(&dict, "Prev"),
            xref_stm: None,
            trailer: strip_stream_keys(dict),
        })
    }

    fn unpack_stream_entries(&self, data: &[u8], dict: &Dictionary) -> Result<Vec<(ObjectId, XrefEntry)>> {
        let widths: Vec<usize> = dict
            .get("W")
            .and_then(Object::as_array)
            .map(|w| w.iter().filter_map(|o| o.as_integer().and_then(|v| usize::try_from(v).ok())).collect())
            .unwrap_or_default();
        if widths.len() != 3 || widths.iter().any(|&w| w > 8) {
            return Err(Error::InvalidXref(format!("invalid /W {:?}", widths)));
        }
        let row = widths.iter().sum::<usize>();
        if row == 0 {
            return Err(Error::InvalidXref("/W describes empty rows".to_string()));
        }

        let size = dict
            .get("Size")
            .and_then(Object::as_integer)
            .ok_or_else(|| Error::InvalidXref("cross-reference stream has no /Size".to_string()))?;
        let ranges: Vec<(i64, i64)> = match dict.get("Index").and_then(Object::as_array) {
            Some(items) => items
                .chunks_exact(2)
                .filter_map(|pair| Some((pair[0].as_integer()?, pair[1].as_integer()?)))
                .collect(),
            None => vec![(0, size)],
        };

        let mut entries = Vec::new();
        let mut rows = data.chunks_exact(row);
        for (first, count) in ranges {
            for k in 0..count.max(0) {
                let Some(bytes) = rows.next() else {
                    if !self.options.lenient {
                        return Err(Error::InvalidXref(format!(
                            "stream data ends before entry {} of subsection {} {}",
                            k, first, count
                        )));
                    }
                    self.sink.warn(ParseWarning::MalformedSubsection {
                        offset: 0,
                        reason: format!("stream data ends before entry {} of subsection {} {}", k, first, count),
                    });
                    return Ok(entries);
                };
                let (f1, rest) = bytes.split_at(widths[0]);
                let (f2, f3) = rest.split_at(widths[1]);
                let kind = if widths[0] == 0 { 1 } else { read_field(f1) };
                let Some(number) = first.checked_add(k).and_then(|n| u32::try_from(n).ok()) else {
                    continue;
                };
                let field2 = read_field(f2);
                let field3 = read_field(f3);
                match kind {
                    0 => {
                        if let Ok(generation) = u16::try_from(field3) {
                            entries.push((ObjectId::new(number, generation), XrefEntry::Free));
                        }
                    },
                    1 => {
                        if let Ok(generation) = u16::try_from(field3) {
                            entries.push((ObjectId::new(number, generation), XrefEntry::InUse { offset: field2 }));
                        }
                    },
                    2 => {
                        if let (Ok(stream), Ok(index)) = (u32::try_from(field2), u32::try_from(field3)) {
                            entries.push((ObjectId::new(number, 0), XrefEntry::Compressed { stream, index }));
                        }
                    },
                    // unknown types are references to the null object
                    _ => {},
                }
            }
        }
        Ok(entries)
    }
}

/// Big-endian unsigned field of 0 to 8 bytes.
fn read_field(bytes: &[u8]) -> u64 {
    if bytes.is_empty() {
        0
    } else {
        BigEndian::read_uint(bytes, bytes.len())
    }
}

fn offset_value(dict: &Dictionary, key: &str) -> Option<u64> {
    dict.get(key).and_then(Object::as_integer).and_then(|v| u64::try_from(v).ok())
}

fn strip_stream_keys(mut dict: Dictionary) -> Dictionary {
    dict.retain(|key, _| !STREAM_ONLY_KEYS.contains(&key.as_str()));
    dict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MemoryCursor;
    use crate::filters::StandardFilters;
    use crate::warnings::CollectingSink;

    const SAMPLE: &[u8] = b"xref\n0 3\n0000000000 65535 f\n0000000100 00000 n\n0000000200 00005 n\ntrailer\n<<>>\n";

    fn resolve_with(data: Vec<u8>, start: u64, options: ParserOptions, sink: &CollectingSink) -> Result<CrossReferenceIndex> {
        let mut cursor = MemoryCursor::new(data);
        let mut searcher = BruteForceSearcher::new();
        XrefResolver::new(&options, &StandardFilters, sink).resolve(&mut cursor, start, &mut searcher)
    }

    #[test]
    fn test_sample_table() {
        let sink = CollectingSink::new();
        let index = resolve_with(SAMPLE.to_vec(), 0, ParserOptions::strict(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 100 }));
        assert_eq!(index.get(ObjectId::new(2, 5)), Some(XrefEntry::InUse { offset: 200 }));
        assert_eq!(index.get(ObjectId::new(0, 65535)), Some(XrefEntry::Free));
        assert!(!matches!(index.get(ObjectId::new(0, 0)), Some(XrefEntry::InUse { .. })));
        assert!(index.trailer().is_empty());
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let data = b"xref\r\n0 2\r\n\r\n0000000000 65535 f\r\n\r\n0000000300 00000 n\r\ntrailer\r\n<< /Size 2 >>\r\n";
        let sink = CollectingSink::new();
        let index = resolve_with(data.to_vec(), 0, ParserOptions::strict(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 300 }));
        assert_eq!(index.trailer().get("Size"), Some(&Object::Integer(2)));
    }

    #[test]
    fn test_multiple_subsections() {
        let data = b"xref\n0 1\n0000000000 65535 f \n4 2\n0000000400 00000 n \n0000000500 00002 n \ntrailer <<>>";
        let sink = CollectingSink::new();
        let index = resolve_with(data.to_vec(), 0, ParserOptions::strict(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(4, 0)), Some(XrefEntry::InUse { offset: 400 }));
        assert_eq!(index.get(ObjectId::new(5, 2)), Some(XrefEntry::InUse { offset: 500 }));
    }

    #[test]
    fn test_malformed_subsection_header() {
        let data = b"xref\n0 x\n0000000000 65535 f\n3 1\n0000000600 00000 n\ntrailer\n<<>>\n";
        let sink = CollectingSink::new();
        assert!(matches!(
            resolve_with(data.to_vec(), 0, ParserOptions::strict(), &sink),
            Err(Error::InvalidXref(_))
        ));

        let index = resolve_with(data.to_vec(), 0, ParserOptions::lenient(), &sink).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(ObjectId::new(3, 0)), Some(XrefEntry::InUse { offset: 600 }));
        assert!(matches!(sink.warnings()[0], ParseWarning::MalformedSubsection { offset: 5, .. }));
    }

    #[test]
    fn test_subsection_overflow_fails_fast() {
        let data = b"xref\n0 3\n0000000000 65535 f\n0000000100 00000 n\ntrailer\n<<>>\n";
        let sink = CollectingSink::new();
        assert!(resolve_with(data.to_vec(), 0, ParserOptions::strict(), &sink).is_err());

        let index = resolve_with(data.to_vec(), 0, ParserOptions::lenient(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 100 }));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_subsection_numbers_past_u64() {
        let data = b"xref\n18446744073709551615 2\n0000000100 00000 n \n0000000200 00000 n \n3 1\n0000000300 00000 n \ntrailer\n<<>>\n";
        let sink = CollectingSink::new();
        assert!(matches!(
            resolve_with(data.to_vec(), 0, ParserOptions::strict(), &sink),
            Err(Error::InvalidXref(_))
        ));

        let index = resolve_with(data.to_vec(), 0, ParserOptions::lenient(), &sink).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(ObjectId::new(3, 0)), Some(XrefEntry::InUse { offset: 300 }));
        let malformed = sink
            .warnings()
            .iter()
            .filter(|w| matches!(w, ParseWarning::MalformedSubsection { .. }))
            .count();
        assert_eq!(malformed, 2);
    }

    #[test]
    fn test_strict_entry_widths() {
        let data = b"xref\n0 1\n100 0 n\ntrailer\n<<>>\n";
        let sink = CollectingSink::new();
        assert!(resolve_with(data.to_vec(), 0, ParserOptions::strict(), &sink).is_err());
        let index = resolve_with(data.to_vec(), 0, ParserOptions::lenient(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(0, 0)), Some(XrefEntry::InUse { offset: 100 }));
    }

    #[test]
    fn test_self_referencing_entry() {
        let mut data = b"%PDF-1.4\n1 0 obj\n42\nendobj\n".to_vec();
        let obj_offset = 9u64;
        let table_start = data.len() as u64;
        data.extend_from_slice(
            format!(
                "xref\n0 2\n0000000000 65535 f \n{:010} 00000 n \ntrailer\n<< /Size 2 >>\n",
                table_start + 5
            )
            .as_bytes(),
        );

        let sink = CollectingSink::new();
        let err = resolve_with(data.clone(), table_start, ParserOptions::strict(), &sink).unwrap_err();
        assert!(matches!(err, Error::XrefSelfReference { offset, .. } if offset == table_start + 5));

        let index = resolve_with(data, table_start, ParserOptions::lenient(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: obj_offset }));
        assert!(sink
            .warnings()
            .iter()
            .any(|w| matches!(w, ParseWarning::XrefSelfReference { .. })));
    }

    #[test]
    fn test_prev_chain_first_writer_wins() {
        let older = b"xref\n0 2\n0000000000 65535 f \n0000000999 00000 n \ntrailer\n<< /Size 2 /Root 9 0 R /Info 8 0 R >>\n";
        let mut data = older.to_vec();
        let main_start = data.len();
        data.extend_from_slice(
            b"xref\n1 3\n0000001111 00000 n \n0000002222 00000 n \n0000003333 00000 n \ntrailer\n<< /Size 4 /Root 1 0 R /Prev 0 >>\n",
        );

        let sink = CollectingSink::new();
        let index = resolve_with(data, main_start as u64, ParserOptions::strict(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 1111 }));
        assert_eq!(index.get(ObjectId::new(0, 65535)), Some(XrefEntry::Free));
        assert_eq!(index.trailer().get("Root"), Some(&Object::Reference(ObjectId::new(1, 0))));
        assert_eq!(index.trailer().get("Size"), Some(&Object::Integer(4)));
        assert_eq!(index.trailer().get("Info"), Some(&Object::Reference(ObjectId::new(8, 0))));
    }

    #[test]
    fn test_prev_cycle_is_soft() {
        let mut data = Vec::new();
        data.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Prev 60 >>\n");
        while data.len() < 60 {
            data.push(b'\n');
        }
        data.extend_from_slice(b"xref\n1 1\n0000000500 00000 n \ntrailer\n<< /Prev 0 >>\n");

        let sink = CollectingSink::new();
        let index = resolve_with(data, 60, ParserOptions::strict(), &sink).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(sink.warnings(), vec![ParseWarning::PrevChainCycle { offset: 60 }]);
    }

    fn xref_stream(rows: &[[u8; 4]], size: usize, extra: &str) -> Vec<u8> {
        let body: Vec<u8> = rows.iter().flatten().copied().collect();
        let mut out = format!(
            "9 0 obj\n<< /Type /XRef /W [1 2 1] /Size {} {} /Length {} >>\nstream\n",
            size,
            extra,
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(&body);
        out.extend_from_slice(b"\nendstream\nendobj\n");
        out
    }

    #[test]
    fn test_xref_stream_entries() {
        let data = xref_stream(
            &[[0, 0, 0, 255], [1, 0, 15, 0], [2, 0, 5, 3], [3, 0, 0, 0]],
            10,
            "/Index [0 2 7 2] /Root 1 0 R",
        );
        let sink = CollectingSink::new();
        let index = resolve_with(data, 0, ParserOptions::strict(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(0, 255)), Some(XrefEntry::Free));
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 15 }));
        assert_eq!(index.get(ObjectId::new(7, 0)), Some(XrefEntry::Compressed { stream: 5, index: 3 }));
        assert_eq!(index.get(ObjectId::new(8, 0)), None);
        assert_eq!(index.trailer().get("Root"), Some(&Object::Reference(ObjectId::new(1, 0))));
        assert!(!index.trailer().contains_key("W"));
    }

    #[test]
    fn test_xref_stream_default_index() {
        let data = xref_stream(&[[0, 0, 0, 0], [1, 0, 42, 0]], 2, "");
        let sink = CollectingSink::new();
        let index = resolve_with(data, 0, ParserOptions::strict(), &sink).unwrap();
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 42 }));
    }

    #[test]
    fn test_xref_stream_extreme_index() {
        let data = xref_stream(
            &[[1, 0, 10, 0], [1, 0, 20, 0], [1, 0, 30, 0]],
            10,
            "/Index [9223372036854775807 2 4 1]",
        );
        let sink = CollectingSink::new();
        let index = resolve_with(data, 0, ParserOptions::lenient(), &sink).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(ObjectId::new(4, 0)), Some(XrefEntry::InUse { offset: 30 }));
    }

    #[test]
    fn test_garbage_start_falls_back_in_lenient_mode() {
        let data = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n2 0 obj\n5\nendobj\nstartxref\n3\n%%EOF".to_vec();
        let sink = CollectingSink::new();
        assert!(resolve_with(data.clone(), 3, ParserOptions::strict(), &sink).is_err());

        let index = resolve_with(data, 3, ParserOptions::lenient(), &sink).unwrap();
        assert!(index.is_recovered());
        assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 9 }));
        assert_eq!(index.trailer().get("Root"), Some(&Object::Reference(ObjectId::new(1, 0))));
        assert_eq!(index.trailer().get("Size"), Some(&Object::Integer(3)));
        assert!(sink
            .warnings()
            .iter()
            .any(|w| matches!(w, ParseWarning::BruteForceFallback { .. })));
    }

    #[test]
    fn test_find_startxref() {
        let mut cursor = MemoryCursor::new(&b"%PDF-1.4\nstartxref\n1\nstuff\nstartxref\r\n  1234\r\n%%EOF\r\n"[..]);
        assert_eq!(find_startxref(&mut cursor, &ParserOptions::strict()).unwrap(), 1234);

        let mut cursor = MemoryCursor::new(&b"%PDF-1.4\n%%EOF"[..]);
        assert!(find_startxref(&mut cursor, &ParserOptions::strict()).is_err());
    }

    #[test]
    fn test_read_field_widths() {
        assert_eq!(read_field(&[]), 0);
        assert_eq!(read_field(&[0x01, 0x02]), 0x0102);
        assert_eq!(read_field(&[0, 0, 1, 0]), 256);
    }
}
