//! Encoding of logical lines into ISO-8859-1 byte streams.

use crate::line::Line;
use crate::Error;
use std::io::Write;

/// Line separator of the platform.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// Line separator of the platform.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Layout of written files.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriterConfig {
    /// Column the '=' of key/value lines is aligned to.
    pub value_indent: usize,
    /// Indentation of continuation lines.
    pub wrap_indent: usize,
    /// Soft maximum line length. 0 disables wrapping.
    pub line_length: usize,
    pub line_separator: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            value_indent: 24,
            wrap_indent: 4,
            line_length: 79,
            line_separator: LINE_SEPARATOR.to_string(),
        }
    }
}

impl WriterConfig {
    #[must_use]
    pub fn with_value_indent(mut self, value_indent: usize) -> Self {
        self.value_indent = value_indent;
        self
    }

    #[must_use]
    pub fn with_wrap_indent(mut self, wrap_indent: usize) -> Self {
        self.wrap_indent = wrap_indent;
        self
    }

    #[must_use]
    pub fn with_line_length(mut self, line_length: usize) -> Self {
        self.line_length = line_length;
        self
    }

    #[must_use]
    pub fn with_line_separator(mut self, line_separator: impl Into<String>) -> Self {
        self.line_separator = line_separator.into();
        self
    }
}

/// Character-based output
trait CharacterOutput {
    /// Write a single character to the character output
    ///
    /// # Errors
    /// IO Errors, or the character cannot be represented by the output.
    fn write(&mut self, data: char) -> Result<(), Error>;
}

/// ISO-8859-1 character output. Every character becomes exactly one byte.
struct Latin1Out<'a>(
    /// Encoded bytes.
    &'a mut Vec<u8>,
);

impl CharacterOutput for Latin1Out<'_> {
    fn write(&mut self, data: char) -> Result<(), Error> {
        let byte = u8::try_from(u32::from(data)).map_err(|_| Error::Unencoded(data))?;
        self.0.push(byte);
        Ok(())
    }
}

/// Emits the 6-character sequence (\uXXXX, XXXX being HEX) needed to escape a single char.
/// For characters that need 2 utf-16 escape sequences (surrogates), it emits 12 characters.
fn escape_unicode(target: &mut String, c: char) {
    static LUT: [char; 16] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F',
    ];

    let mut buf = [0; 2];
    let bf = c.encode_utf16(&mut buf);
    for n in bf {
        let n = *n;
        target.push('\\');
        target.push('u');
        target.push(LUT[((n >> 12) & 0xF) as usize]);
        target.push(LUT[((n >> 8) & 0xF) as usize]);
        target.push(LUT[((n >> 4) & 0xF) as usize]);
        target.push(LUT[(n & 0xF) as usize]);
    }
}

/// Escaping shared by keys, values and comments.
fn escape_char(target: &mut String, c: char) {
    match c {
        '\\' => target.push_str("\\\\"),
        '\t' => target.push_str("\\t"),
        '\r' => target.push_str("\\r"),
        '\n' => target.push_str("\\n"),
        '\x0C' => target.push_str("\\f"),
        ' '..='\x7F' | '\u{A0}'..='\u{FF}' => target.push(c),
        other => escape_unicode(target, other),
    }
}

/// Escape a text so it can be written to an ISO-8859-1 properties file.
///
/// Displayable ISO-8859-1 characters are kept, backslashes are doubled, the usual
/// control characters get their short escape and everything else becomes `\uXXXX`.
///
/// If `escape_leading_space` is set, a space at the very first position is written as `\ `
/// so that it survives the whitespace trimming of the reader. Spaces further in are kept.
#[must_use]
pub fn escape(text: &str, escape_leading_space: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for (idx, c) in text.chars().enumerate() {
        if idx == 0 && escape_leading_space && c == ' ' {
            result.push_str("\\ ");
            continue;
        }

        escape_char(&mut result, c);
    }

    result
}

/// Escape a key. Whitespace and separators would end the key early on read,
/// and a leading comment marker would turn the line into a comment.
fn escape_key(key: &str) -> String {
    let mut result = String::with_capacity(key.len() + 4);
    for (idx, c) in key.chars().enumerate() {
        match c {
            ' ' | ':' | '=' => {
                result.push('\\');
                result.push(c);
            }
            '#' | '!' if idx == 0 => {
                result.push('\\');
                result.push(c);
            }
            other => escape_char(&mut result, other),
        }
    }

    result
}

/// Writes logical lines as an ISO-8859-1 properties stream.
///
/// Key/value lines are aligned on [`WriterConfig::value_indent`] and long values are wrapped
/// with backslash continuations. Nothing is buffered except by `W` itself, call
/// [`PropertiesWriter::flush`] when done.
pub struct PropertiesWriter<W: Write> {
    /// Byte sink.
    out: W,
    /// Layout settings.
    config: WriterConfig,
}

impl<W: Write> PropertiesWriter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self::with_config(out, WriterConfig::default())
    }

    #[must_use]
    pub const fn with_config(out: W, config: WriterConfig) -> Self {
        Self { out, config }
    }

    #[must_use]
    pub const fn config(&self) -> &WriterConfig {
        &self.config
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.out.flush()?;
        Ok(())
    }

    /// Write text as it is. It must already be escaped.
    ///
    /// # Errors
    /// * IO Errors of the underlying stream.
    /// * [`Error::Unencoded`] if the text contains a character beyond ISO-8859-1,
    ///   nothing is written in that case.
    pub fn write_raw(&mut self, text: &str) -> Result<(), Error> {
        let mut bytes = Vec::with_capacity(text.len());
        let mut latin1 = Latin1Out(&mut bytes);
        for c in text.chars() {
            latin1.write(c)?;
        }

        self.out.write_all(&bytes)?;
        Ok(())
    }

    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn new_line(&mut self) -> Result<(), Error> {
        let separator = self.config.line_separator.clone();
        self.write_raw(&separator)
    }

    /// Escape and write a text. A leading space is escaped.
    ///
    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn write_escaped(&mut self, text: &str) -> Result<(), Error> {
        self.write_raw(&escape(text, true))
    }

    /// Write a key padded up to the value indentation.
    /// Returns the column reached, not counting escape characters.
    ///
    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn write_key(&mut self, key: &str) -> Result<usize, Error> {
        let length = key.chars().count();
        let padding = self.config.value_indent.saturating_sub(length);

        let mut text = escape_key(key);
        text.extend(core::iter::repeat(' ').take(padding));
        self.write_raw(&text)?;
        Ok(length + padding)
    }

    /// Write a value that starts at column `mark`. It is wrapped if it contains
    /// line breaks or would run past the line length.
    ///
    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn write_wrappable(&mut self, text: &str, mark: usize) -> Result<(), Error> {
        let line_length = self.config.line_length;
        if text.contains(['\r', '\n']) {
            return self.write_wrapped(text);
        }

        if line_length == 0 || mark + text.chars().count() < line_length {
            return self.write_escaped(text);
        }

        self.write_wrapped(text)
    }

    /// Write a value on continuation lines. Each chunk ending with a line feed
    /// is wrapped on its own.
    ///
    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn write_wrapped(&mut self, text: &str) -> Result<(), Error> {
        if self.config.line_length == 0 {
            return self.write_escaped(text);
        }

        for chunk in text.split_inclusive('\n') {
            self.write_wrapped_line(chunk)?;
        }

        Ok(())
    }

    /// Cut a chunk into continuation lines, preferably after a space.
    fn write_wrapped_line(&mut self, chunk: &str) -> Result<(), Error> {
        let threshold = self.config.line_length.saturating_sub(4);
        let limit = self
            .config
            .line_length
            .saturating_sub(self.config.wrap_indent)
            .max(1);

        let mut rest = chunk;
        while rest.chars().count() > threshold {
            self.write_continuation()?;
            let (head, tail) = rest.split_at(wrap_point(rest, limit));
            self.write_escaped(head)?;
            rest = tail;
        }

        if !rest.is_empty() {
            self.write_continuation()?;
            self.write_escaped(rest)?;
        }

        Ok(())
    }

    /// Backslash, line separator and the indentation of the next line.
    fn write_continuation(&mut self) -> Result<(), Error> {
        self.write_raw("\\")?;
        self.new_line()?;
        self.write_wrap_indent()
    }

    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn write_wrap_indent(&mut self) -> Result<(), Error> {
        let indent = " ".repeat(self.config.wrap_indent);
        self.write_raw(&indent)
    }

    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn write_line(&mut self, line: &Line) -> Result<(), Error> {
        line.write(self)
    }
}

/// Byte offset to cut `text` at: after the last space within the first `limit`
/// characters, or hard after `limit` characters if there is none.
fn wrap_point(text: &str, limit: usize) -> usize {
    let mut last_space = None;
    let mut end = text.len();
    for (count, (pos, c)) in text.char_indices().enumerate() {
        if count == limit {
            end = pos;
            break;
        }
        if c == ' ' {
            last_space = Some(pos + 1);
        }
    }

    last_space.unwrap_or(end)
}
