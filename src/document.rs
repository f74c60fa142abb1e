//! PDF document: start-up sequence and the indirect object resolver.
//!
//! Opening a document reads the `%PDF-M.m` header, locates `startxref`, and
//! builds the cross-reference index (falling back to a brute-force scan in
//! lenient mode). Objects are then loaded on demand through
//! [`PdfDocument::get`] and cached.
//!
//! Nested references inside a loaded object stay as [`Object::Reference`]
//! values; they are only followed when the caller asks. Re-entering `get` for
//! an object that is still being resolved yields [`Object::Null`] instead of
//! recursing.

use crate::brute_force::BruteForceSearcher;
use crate::cursor::{ByteSource, MemoryCursor};
use crate::error::{Error, Result};
use crate::filters::{StandardFilters, StreamFilters};
use crate::object::{Dictionary, Object, ObjectId, StreamObject};
use crate::objstm::ObjectStream;
use crate::parser::{self, read_object_prefix};
use crate::parser_config::ParserOptions;
use crate::scanner::TokenScanner;
use crate::warnings::{LogSink, ParseWarning, WarningSink};
use crate::xref::{self, CrossReferenceIndex, XrefEntry, XrefResolver};
use bytes::Bytes;
use nom::{
    IResult,
    character::complete::{char, digit1},
    combinator::map_res,
    sequence::separated_pair,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Bytes searched for the `%PDF-` marker.
const HEADER_WINDOW: usize = 1024;

/// Version assumed when the header is unreadable in lenient mode.
const DEFAULT_VERSION: (u8, u8) = (1, 4);

fn version_digit(input: &[u8]) -> IResult<&[u8], u8> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u8>().map_err(|_| ()))
    })(input)
}

/// Read the `%PDF-M.m` header from the start of the source.
///
/// Strict mode requires the marker within the first 1024 bytes. Lenient mode
/// assumes PDF 1.4 when it is missing.
pub fn parse_header(
    cursor: &mut dyn ByteSource,
    options: &ParserOptions,
    sink: &dyn WarningSink,
) -> Result<(u8, u8)> {
    let head = cursor.read_range(0, HEADER_WINDOW)?;
    let marker = head.windows(5).position(|w| w == b"%PDF-");
    let version = marker.and_then(|pos| {
        separated_pair(version_digit, char('.'), version_digit)(&head[pos + 5..])
            .ok()
            .map(|(_, v)| v)
    });

    match (marker, version) {
        (Some(pos), Some(version)) => {
            if pos > 0 {
                log::warn!("PDF header found at byte {} instead of 0", pos);
            }
            Ok(version)
        },
        _ => {
            let reason = if marker.is_some() {
                "unreadable version after %PDF-".to_string()
            } else {
                format!("no %PDF- marker in the first {} bytes", HEADER_WINDOW)
            };
            if !options.lenient {
                return Err(Error::InvalidHeader(reason));
            }
            sink.warn(ParseWarning::InvalidHeader { reason });
            Ok(DEFAULT_VERSION)
        },
    }
}

/// An open PDF document over a byte source.
///
/// Owns its cursor, cross-reference index, object cache and brute-force memo.
/// Nothing is shared between documents.
pub struct PdfDocument<S: ByteSource = MemoryCursor> {
    source: S,
    options: ParserOptions,
    version: (u8, u8),
    index: CrossReferenceIndex,
    cache: HashMap<ObjectId, Object>,
    in_progress: HashSet<ObjectId>,
    searcher: BruteForceSearcher,
    object_streams: HashMap<u32, Arc<ObjectStream>>,
    filters: Box<dyn StreamFilters>,
    sink: Arc<dyn WarningSink>,
}

impl<S: ByteSource> std::fmt::Debug for PdfDocument<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("version", &format!("{}.{}", self.version.0, self.version.1))
            .field("lenient", &self.options.lenient)
            .field("xref_entries", &self.index.len())
            .field("recovered", &self.index.is_recovered())
            .field("cached_objects", &self.cache.len())
            .finish()
    }
}

impl PdfDocument<MemoryCursor> {
    /// Open a document held in memory.
    pub fn from_bytes(data: impl Into<Bytes>, options: &ParserOptions) -> Result<Self> {
        Self::open(MemoryCursor::new(data), options)
    }

    /// Read a file into memory and open it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pdf_strata::document::PdfDocument;
    /// use pdf_strata::parser_config::ParserOptions;
    ///
    /// let mut doc = PdfDocument::open_path("sample.pdf", &ParserOptions::lenient())?;
    /// let catalog = doc.catalog()?;
    /// # Ok::<(), pdf_strata::error::Error>(())
    /// ```
    pub fn open_path(path: impl AsRef<Path>, options: &ParserOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data, options)
    }
}

impl<S: ByteSource> PdfDocument<S> {
    /// Open a document with the standard filters, reporting warnings to the log.
    pub fn open(source: S, options: &ParserOptions) -> Result<Self> {
        Self::open_with(source, options, Box::new(StandardFilters), Arc::new(LogSink))
    }

    /// Open a document with a custom filter collaborator and warning sink.
    ///
    /// The start-up sequence is:
    ///
    /// 1. read the header
    /// 2. locate `startxref`
    /// 3. resolve the cross-reference chain
    ///
    /// In lenient mode a missing `startxref` or an unusable main section
    /// rebuilds the index from a brute-force scan.
    pub fn open_with(
        mut source: S,
        options: &ParserOptions,
        filters: Box<dyn StreamFilters>,
        sink: Arc<dyn WarningSink>,
    ) -> Result<Self> {
        let version = parse_header(&mut source, options, &*sink)?;
        let mut searcher = BruteForceSearcher::new();

        let index = {
            let resolver = XrefResolver::new(options, &*filters, &*sink);
            match xref::find_startxref(&mut source, options) {
                Ok(start) => resolver.resolve(&mut source, start, &mut searcher)?,
                Err(e) if options.lenient => resolver.recover(&mut source, &mut searcher, &e.to_string())?,
                Err(e) => return Err(e),
            }
        };
        log::info!(
            "opened PDF {}.{}: {} cross-reference entries{}",
            version.0,
            version.1,
            index.len(),
            if index.is_recovered() { " (recovered)" } else { "" }
        );

        Ok(Self {
            source,
            options: *options,
            version,
            index,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
            searcher,
            object_streams: HashMap::new(),
            filters,
            sink,
        })
    }

    /// Header version as `(major, minor)`.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Options the document was opened with.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Merged trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        self.index.trailer()
    }

    /// Cross-reference index.
    pub fn xref(&self) -> &CrossReferenceIndex {
        &self.index
    }

    /// Number of cached objects.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Release the byte source, dropping the index and all caches.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Resolve the document catalog named by the trailer's `/Root`.
    pub fn catalog(&mut self) -> Result<Object> {
        let root = self
            .trailer()
            .get("Root")
            .and_then(Object::as_reference)
            .ok_or_else(|| Error::InvalidXref("trailer has no /Root reference".to_string()))?;
        let catalog = self.get(root)?;
        if catalog.as_dict().is_none() {
            return Err(Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: catalog.type_name().to_string(),
            });
        }
        Ok(catalog)
    }

    /// Decode a stream's data through the filter collaborator.
    pub fn decode_stream(&self, stream: &StreamObject) -> Result<Vec<u8>> {
        self.filters.decode(&stream.data, &stream.dict)
    }

    /// Resolve an indirect object.
    ///
    /// Successful results are cached; failures are not. An object requested
    /// while its own resolution is still running resolves to Null. Strict-mode
    /// failures are wrapped in [`Error::ObjectResolution`].
    pub fn get(&mut self, id: ObjectId) -> Result<Object> {
        if let Some(cached) = self.cache.get(&id) {
            return Ok(cached.clone());
        }
        if self.in_progress.contains(&id) {
            log::debug!("{} requested during its own resolution", id);
            self.sink.warn(ParseWarning::ReferenceCycle { object: id });
            return Ok(Object::Null);
        }

        self.in_progress.insert(id);
        let result = self.load(id);
        self.in_progress.remove(&id);

        match result {
            Ok(object) => {
                self.cache.insert(id, object.clone());
                Ok(object)
            },
            Err(e @ Error::ObjectResolution { .. }) => Err(e),
            Err(e) if !self.options.lenient => Err(Error::ObjectResolution {
                object: id,
                source: Box::new(e),
            }),
            Err(e) => Err(e),
        }
    }

    /// Resolve `id` and replace nested references with their targets, following
    /// at most `max_depth` reference hops. A reference back into the chain being
    /// expanded becomes Null.
    pub fn resolve_deep(&mut self, id: ObjectId, max_depth: usize) -> Result<Object> {
        let root = self.get(id)?;
        let mut path = HashSet::from([id]);
        self.expand(root, max_depth, &mut path)
    }

    /// `path` holds the references being expanded above `object`; it is kept
    /// apart from `in_progress`, which only tracks objects being loaded.
    fn expand(&mut self, object: Object, depth: usize, path: &mut HashSet<ObjectId>) -> Result<Object> {
        match object {
            Object::Reference(target) if depth > 0 => {
                if path.contains(&target) {
                    self.sink.warn(ParseWarning::ReferenceCycle { object: target });
                    return Ok(Object::Null);
                }
                let resolved = self.get(target)?;
                path.insert(target);
                let result = self.expand(resolved, depth - 1, path);
                path.remove(&target);
                result
            },
            Object::Array(items) => items
                .into_iter()
                .map(|item| self.expand(item, depth, path))
                .collect::<Result<Vec<_>>>()
                .map(Object::Array),
            Object::Dictionary(dict) => self.expand_dict(dict, depth, path).map(Object::Dictionary),
            Object::Stream(mut stream) => {
                stream.dict = self.expand_dict(stream.dict, depth, path)?;
                Ok(Object::Stream(stream))
            },
            other => Ok(other),
        }
    }

    fn expand_dict(&mut self, dict: Dictionary, depth: usize, path: &mut HashSet<ObjectId>) -> Result<Dictionary> {
        let mut out = Dictionary::with_capacity(dict.len());
        for (key, value) in dict {
            let value = self.expand(value, depth, path)?;
            out.insert(key, value);
        }
        Ok(out)
    }

    fn load(&mut self, id: ObjectId) -> Result<Object> {
        match self.index.get(id) {
            Some(XrefEntry::InUse { offset }) => match self.load_at(id, offset) {
                Ok(object) => Ok(object),
                Err(e) if self.options.lenient && e.is_recoverable() => {
                    log::warn!("{} unreadable at byte {}: {}; searching the file", id, offset, e);
                    if matches!(e, Error::ObjectHeaderMismatch { .. } | Error::OffsetOutOfRange { .. }) {
                        self.sink.warn(ParseWarning::ObjectHeaderMismatch { object: id, offset });
                    }
                    match self.load_by_scan(id, Some(offset))? {
                        Some(object) => Ok(object),
                        None => Err(e),
                    }
                },
                Err(e) => Err(e),
            },
            Some(XrefEntry::Compressed { stream, index }) => self.load_compressed(id, stream, index),
            Some(XrefEntry::Free) => self.missing(id),
            None => {
                if self.options.lenient {
                    if let Some(object) = self.load_by_scan(id, None)? {
                        return Ok(object);
                    }
                }
                self.missing(id)
            },
        }
    }

    fn missing(&self, id: ObjectId) -> Result<Object> {
        if !self.options.lenient {
            return Err(Error::ObjectNotFound(id));
        }
        self.sink.warn(ParseWarning::MissingObject { object: id });
        Ok(Object::Null)
    }

    /// Load `id` from the brute-force table, unless it points at `skip`.
    fn load_by_scan(&mut self, id: ObjectId, skip: Option<u64>) -> Result<Option<Object>> {
        let table = self.searcher.locate(&mut self.source)?;
        match table.get(id) {
            Some(offset) if Some(offset) != skip => {
                log::info!("{} relocated to byte {} by brute-force scan", id, offset);
                self.load_at(id, offset).map(Some)
            },
            _ => Ok(None),
        }
    }

    /// Read the uncompressed object at `offset`.
    fn load_at(&mut self, id: ObjectId, offset: u64) -> Result<Object> {
        if offset >= self.source.len() {
            return Err(Error::OffsetOutOfRange {
                offset,
                len: self.source.len(),
            });
        }
        log::debug!("loading {} from byte {}", id, offset);

        let prefix = {
            let mut scanner = TokenScanner::new(&mut self.source, &self.options).with_sink(&*self.sink);
            read_object_prefix(&mut scanner, offset)?
        };
        if prefix.id != id {
            let same_number = prefix.id.number == id.number;
            if !(self.options.lenient && same_number) {
                return Err(Error::ObjectHeaderMismatch {
                    expected: id,
                    offset,
                    found: prefix.id.to_string(),
                });
            }
            log::warn!("{} found with header {} at byte {}", id, prefix.id, offset);
        }

        let Some(start) = prefix.stream_start else {
            return Ok(prefix.body);
        };
        let Object::Dictionary(dict) = prefix.body else {
            return Err(Error::parse(offset, format!("stream object {} has no dictionary", id)));
        };

        let length = match dict.get("Length") {
            Some(Object::Reference(length_id)) => {
                let length_id = *length_id;
                match self.get(length_id) {
                    Ok(value) => value.as_integer().and_then(|n| u64::try_from(n).ok()),
                    Err(e) if self.options.lenient => {
                        log::warn!("stream length {} of {} unresolvable: {}", length_id, id, e);
                        None
                    },
                    Err(e) => return Err(e),
                }
            },
            _ => parser::direct_length(&dict),
        };

        let data = parser::read_stream_data(&mut self.source, start, length, &self.options, &*self.sink)?;
        Ok(Object::Stream(StreamObject {
            dict,
            data_offset: start,
            data,
        }))
    }

    fn load_compressed(&mut self, id: ObjectId, container: u32, index: u32) -> Result<Object> {
        let stream = self.object_stream(container)?;
        log::debug!("loading {} from object stream {} slot {}", id, container, index);
        stream.object_at(index, id.number, &self.options, &*self.sink)
    }

    /// Decoded and parsed object stream, shared across all its objects.
    fn object_stream(&mut self, number: u32) -> Result<Arc<ObjectStream>> {
        if let Some(stream) = self.object_streams.get(&number) {
            return Ok(stream.clone());
        }

        let container = self.get(ObjectId::new(number, 0))?;
        let Object::Stream(stream) = container else {
            return Err(Error::InvalidObjectStream(format!(
                "object {} is {}, not a stream",
                number,
                container.type_name()
            )));
        };
        let decoded = self.filters.decode(&stream.data, &stream.dict)?;
        let parsed = Arc::new(ObjectStream::parse(decoded, &stream.dict, &self.options)?);
        self.object_streams.insert(number, parsed.clone());
        Ok(parsed)
    }
}
