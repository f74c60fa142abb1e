//! Error types for the structure resolution core.
//!
//! Every failure surfaced by the tokenizer, the cross-reference resolver and
//! the object resolver is an [`Error`]. Recoverable violations in lenient mode
//! are not errors; they are reported through [`crate::warnings::WarningSink`].

use crate::object::ObjectId;

/// Result type alias for structure resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A sub-scanner hit an impossible byte inside its construct.
    Lexical,
    /// A required keyword or shape is missing.
    Structural,
    /// An offset or header does not match what the index promised.
    Integrity,
    /// The byte source itself failed.
    Io,
    /// A feature this core does not implement was requested.
    Unsupported,
}

/// Error types that can occur while resolving document structure.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Missing or unreadable `%PDF-M.m` header
    #[error("Invalid PDF header: {0}")]
    InvalidHeader(String),

    /// A sub-scanner started a construct and met a byte that cannot occur in it
    #[error("Lexical error at byte {offset}: {reason}")]
    Lexical {
        /// Byte offset of the offending byte
        offset: u64,
        /// What was wrong
        reason: String,
    },

    /// Structural parse error at a byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: u64,
        /// Reason for parse failure
        reason: String,
    },

    /// Invalid cross-reference section
    #[error("Invalid cross-reference section: {0}")]
    InvalidXref(String),

    /// An InUse entry points inside the table that declared it
    #[error(
        "Cross-reference entry for {object} points to {offset}, inside its own table ({table_start}..{table_end})"
    )]
    XrefSelfReference {
        /// Object whose entry is invalid
        object: ObjectId,
        /// Offset the entry declared
        offset: u64,
        /// First byte of the table
        table_start: u64,
        /// One past the last byte of the table
        table_end: u64,
    },

    /// Object not found in the cross-reference index
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The bytes at an indexed offset do not start with the expected header
    #[error("Expected header '{expected}' at byte {offset}, found {found}")]
    ObjectHeaderMismatch {
        /// Object the index promised
        expected: ObjectId,
        /// Offset that was read
        offset: u64,
        /// Description of what was actually there
        found: String,
    },

    /// Offset outside the byte source
    #[error("Offset {offset} is outside the source (length {len})")]
    OffsetOutOfRange {
        /// Requested offset
        offset: u64,
        /// Length of the source
        len: u64,
    },

    /// Object had a different type than the caller needed
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected type name
        expected: String,
        /// Found type name
        found: String,
    },

    /// Malformed object stream
    #[error("Invalid object stream: {0}")]
    InvalidObjectStream(String),

    /// Composite tokens nested deeper than the configured limit
    #[error("Nesting limit of {0} exceeded")]
    NestingLimitExceeded(usize),

    /// Unexpected end of input
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// Filter not handled by the stream filter collaborator
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Stream decoding failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Strict-mode wrapper for a failed indirect object resolution
    #[error("Failed to resolve object {object}: {source}")]
    ObjectResolution {
        /// Object being resolved
        object: ObjectId,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// I/O error from the byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a structural [`Error::ParseError`].
    pub fn parse(offset: u64, reason: impl Into<String>) -> Self {
        Error::ParseError {
            offset,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`Error::Lexical`] error.
    pub fn lexical(offset: u64, reason: impl Into<String>) -> Self {
        Error::Lexical {
            offset,
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Lexical { .. } => ErrorCategory::Lexical,
            Error::InvalidHeader(_)
            | Error::ParseError { .. }
            | Error::InvalidXref(_)
            | Error::ObjectNotFound(_)
            | Error::InvalidObjectType { .. }
            | Error::InvalidObjectStream(_)
            | Error::NestingLimitExceeded(_)
            | Error::UnexpectedEof => ErrorCategory::Structural,
            Error::XrefSelfReference { .. }
            | Error::ObjectHeaderMismatch { .. }
            | Error::OffsetOutOfRange { .. } => ErrorCategory::Integrity,
            Error::UnsupportedFilter(_) | Error::Decode(_) => ErrorCategory::Unsupported,
            Error::Io(_) => ErrorCategory::Io,
            Error::ObjectResolution { source, .. } => source.category(),
        }
    }

    /// True for errors that lenient mode may recover from by re-locating the
    /// object through the brute-force table.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Lexical | ErrorCategory::Structural | ErrorCategory::Integrity
        )
    }
}
