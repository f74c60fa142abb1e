//! Recoverable-violation reporting.
//!
//! Lenient parsing keeps going past damage it knows how to repair. Each repair
//! is reported as a [`ParseWarning`] to an injectable [`WarningSink`]. Sinks are
//! advisory: nothing in the core depends on what a sink does with a warning.

use crate::object::ObjectId;
use std::sync::Mutex;

/// A recoverable violation observed while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A classic xref subsection header or entry was malformed and skipped
    MalformedSubsection {
        /// Offset of the offending line
        offset: u64,
        /// What was wrong
        reason: String,
    },
    /// An xref entry pointed inside its own table
    XrefSelfReference {
        /// Object whose entry was rejected
        object: ObjectId,
        /// Offset the entry declared
        offset: u64,
    },
    /// A `/Prev` or `/XRefStm` offset was already visited
    PrevChainCycle {
        /// Repeated offset
        offset: u64,
    },
    /// The declared cross-reference structure was unusable; brute-force scan used
    BruteForceFallback {
        /// Why the fallback was taken
        reason: String,
    },
    /// The bytes at an indexed offset did not carry the expected header
    ObjectHeaderMismatch {
        /// Object the index promised
        object: ObjectId,
        /// Offset that was read
        offset: u64,
    },
    /// An object was requested while it was still being resolved
    ReferenceCycle {
        /// Object that closed the cycle
        object: ObjectId,
    },
    /// An object body was not followed by `endobj`
    MissingEndobj {
        /// Object being read
        object: ObjectId,
    },
    /// Stream data was delimited by scanning for `endstream`
    StreamLengthRecovered {
        /// Offset of the first data byte
        offset: u64,
        /// Length that was recovered
        length: u64,
    },
    /// Bytes that fit no token were skipped
    NoiseSkipped {
        /// Offset of the skipped input
        offset: u64,
        /// What was skipped
        reason: String,
    },
    /// An array or dictionary reached end of input before its close delimiter
    UnterminatedComposite {
        /// Offset of the opening delimiter
        offset: u64,
    },
    /// An object has no location in the index or brute-force table
    MissingObject {
        /// Requested object
        object: ObjectId,
    },
    /// The `%PDF-M.m` header was missing or unreadable; a default version was assumed
    InvalidHeader {
        /// What was wrong
        reason: String,
    },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::MalformedSubsection { offset, reason } => {
                write!(f, "malformed xref subsection at byte {}: {}", offset, reason)
            },
            ParseWarning::XrefSelfReference { object, offset } => {
                write!(f, "xref entry for {} points inside its own table (byte {})", object, offset)
            },
            ParseWarning::PrevChainCycle { offset } => {
                write!(f, "xref chain revisits byte {}", offset)
            },
            ParseWarning::BruteForceFallback { reason } => {
                write!(f, "falling back to brute-force object scan: {}", reason)
            },
            ParseWarning::ObjectHeaderMismatch { object, offset } => {
                write!(f, "object {} not found at indexed byte {}", object, offset)
            },
            ParseWarning::ReferenceCycle { object } => {
                write!(f, "reference cycle through {}", object)
            },
            ParseWarning::MissingEndobj { object } => {
                write!(f, "object {} has no endobj", object)
            },
            ParseWarning::StreamLengthRecovered { offset, length } => {
                write!(f, "stream at byte {} delimited by endstream scan ({} bytes)", offset, length)
            },
            ParseWarning::NoiseSkipped { offset, reason } => {
                write!(f, "skipped noise at byte {}: {}", offset, reason)
            },
            ParseWarning::UnterminatedComposite { offset } => {
                write!(f, "composite opened at byte {} is never closed", offset)
            },
            ParseWarning::MissingObject { object } => {
                write!(f, "object {} is not in the document", object)
            },
            ParseWarning::InvalidHeader { reason } => {
                write!(f, "bad file header, assuming PDF 1.4: {}", reason)
            },
        }
    }
}

/// Receiver for recoverable-violation reports.
pub trait WarningSink {
    /// Record one warning.
    fn warn(&self, warning: ParseWarning);
}

/// Forwards every warning to `log::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl WarningSink for LogSink {
    fn warn(&self, warning: ParseWarning) {
        log::warn!("{}", warning);
    }
}

/// Shared default sink.
pub static LOG_SINK: LogSink = LogSink;

/// Stores warnings for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    warnings: Mutex<Vec<ParseWarning>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn warnings(&self) -> Vec<ParseWarning> {
        match self.warnings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl WarningSink for CollectingSink {
    fn warn(&self, warning: ParseWarning) {
        log::debug!("collected warning: {}", warning);
        match self.warnings.lock() {
            Ok(mut guard) => guard.push(warning),
            Err(poisoned) => poisoned.into_inner().push(warning),
        }
    }
}

impl<T: WarningSink + ?Sized> WarningSink for std::sync::Arc<T> {
    fn warn(&self, warning: ParseWarning) {
        (**self).warn(warning)
    }
}
