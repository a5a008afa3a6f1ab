//! # propline
//! Line-preserving reader and writer for java `.properties` translation files.
//!
//! Unlike a plain key/value parser, every logical line of the file is kept:
//! comments, blank lines and key/value pairs come back in file order, so a
//! translation can be edited and written out again without losing the
//! structure of the reference file it was made from.
//!
//! On disk the files are ISO-8859-1. Everything outside the displayable
//! ISO-8859-1 range is written as `\uXXXX` escapes and decoded again on read.
//!
//! ```rust
//! use propline::{PropertyModel, WriterConfig};
//!
//! fn example() -> Result<(), propline::Error> {
//!     let model = PropertyModel::from_bytes(b"# header\ngreeting = Gr\\u00FC\\u00DF dich\n")?;
//!     assert_eq!(model.property("greeting").map(|p| p.value()), Some("Grüß dich"));
//!
//!     let bytes = model.to_bytes(&WriterConfig::default().with_line_separator("\n"))?;
//!     assert!(bytes.starts_with(b"# header\n"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
#![deny(
    clippy::correctness,
    clippy::perf,
    clippy::complexity,
    clippy::style,
    clippy::nursery,
    clippy::pedantic,
    clippy::clone_on_ref_ptr,
    clippy::decimal_literal_representation,
    clippy::float_cmp_const,
    clippy::missing_docs_in_private_items,
    clippy::multiple_inherent_impl,
    clippy::unwrap_used,
    clippy::used_underscore_binding
)]

pub mod event;
pub mod keys;
pub mod line;
pub mod model;
pub mod reader;
pub mod writer;

use core::fmt::{Display, Formatter};
use thiserror::Error;

pub use event::ListenerId;
pub use keys::{KeyComparison, KeyIndex, KeyStatus, SearchQuery};
pub use line::{CommentLine, Line, LineChange, LineField, PropertyLine};
pub use model::{merge, ModelEvent, PropertyModel};
pub use reader::{unescape, PropertiesReader};
pub use writer::{escape, PropertiesWriter, WriterConfig};

/// Location of a logical line in the input.
#[derive(Debug, Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct ParserPosition {
    /// 1-based physical line on which the logical line started.
    pub line: u64,
}

impl Display for ParserPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("line: {}", self.line))
    }
}

/// Violations of the `.properties` text format.
#[derive(Debug, Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash, Error)]
pub enum FormatError {
    /// A key/value line has nothing in front of its separator.
    #[error("key or value missing")]
    MissingKey,
    /// a \uXXXX escape sequence did not have one of the 'X' characters be a hexadecimal digit,
    /// or the line ended before all four digits were read.
    #[error("malformed unicode escape sequence")]
    MalformedUnicodeEscape,
    /// a \uXXXX escape sequence contained an utf-16 surrogate that has no matching partner.
    #[error("unpaired utf-16 surrogate \\u{0:04X}")]
    UnpairedSurrogate(u16),
}

/// Everything that can go wrong while reading, writing or editing a document.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a valid properties file.
    #[error("invalid properties file ({position}): {source}")]
    Format {
        position: ParserPosition,
        #[source]
        source: FormatError,
    },

    /// Reading, writing or closing the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A character that ISO-8859-1 cannot represent reached the output without being escaped.
    #[error("unencoded character in stream: {0:?}")]
    Unencoded(char),

    /// Comment lines must start with '#' or '!'.
    #[error("not a valid comment line: {0:?}")]
    InvalidComment(String),

    /// Property keys must not be empty.
    #[error("property key must not be empty")]
    EmptyKey,
}
