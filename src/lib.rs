// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]

//! # PDF Strata
//!
//! Document-structure resolution for PDF files: the layer between raw bytes
//! and the typed objects consumed by font, content-stream and filter code.
//!
//! ## Layers
//!
//! - **Tokenizer** ([`lexer`]): byte-class dispatch to sub-scanners for numbers,
//!   names, literal and hex strings, comments and keywords
//! - **Token scanner** ([`scanner`]): whitespace/noise skipping, scope-bounded
//!   assembly of arrays and dictionaries, custom tokenizer hooks
//! - **Cross-reference resolver** ([`xref`]): classic tables and xref streams,
//!   `/Prev` and `/XRefStm` chains, first-writer-wins merging
//! - **Brute-force searcher** ([`brute_force`]): whole-file scan for `N G obj`
//!   headers, memoized per source
//! - **Object resolver** ([`document`]): lazy, cached, cycle-safe loading of
//!   indirect objects, including objects packed in object streams ([`objstm`])
//!
//! Every entry point takes [`ParserOptions`]. Strict mode fails on the first
//! structural violation; lenient mode repairs what it can and reports each
//! repair to a [`warnings::WarningSink`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_strata::{ObjectId, ParserOptions, PdfDocument};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = PdfDocument::open_path("paper.pdf", &ParserOptions::lenient())?;
//! println!("PDF {}.{}", doc.version().0, doc.version().1);
//!
//! let catalog = doc.catalog()?;
//! if let Some(pages) = catalog.as_dict().and_then(|d| d.get("Pages")) {
//!     println!("pages at {:?}", pages);
//! }
//! let info = doc.get(ObjectId::new(2, 0))?;
//! println!("{:?}", info);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration and diagnostics
pub mod parser_config;
pub mod warnings;

// Byte access and tokenizing
pub mod cursor;
pub mod lexer;
pub mod scanner;

// Objects
pub mod object;
pub mod parser;

// Document structure
pub mod brute_force;
pub mod document;
pub mod objstm;
pub mod xref;

// Stream decoders
pub mod filters;

pub use cursor::{ByteSource, MemoryCursor};
pub use document::PdfDocument;
pub use error::{Error, Result};
pub use lexer::Token;
pub use object::{Dictionary, Object, ObjectId};
pub use parser_config::ParserOptions;
pub use scanner::TokenScanner;
