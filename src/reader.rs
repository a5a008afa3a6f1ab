//! Decoding of ISO-8859-1 byte streams into logical lines.
//!
//! The input passes three character stages before lines are cut out of it:
//! raw bytes as ISO-8859-1 characters, line terminator normalization
//! (CRLF and CR become LF) and unwrapping of backslash continued lines.

use crate::line::{CommentLine, Line};
use crate::{Error, FormatError, ParserPosition};
use log::trace;
use std::io::{self, Read};

/// Character source of one reading stage.
trait CharacterInput {
    /// Read the next character.
    ///
    /// # Return values
    /// 1. Ok(None) to signal EOF.
    /// 2. Ok(Some) to give the next character to the next stage.
    ///
    /// # Errors
    /// IO Errors of the underlying stream.
    fn next_character(&mut self) -> io::Result<Option<char>>;

    /// Push back a single character, it is returned by the next `next_character` call.
    /// Only one character can be pushed back at a time.
    fn unread(&mut self, ch: char);
}

/// Stage 0: every byte is one ISO-8859-1 character.
struct RawInput<T: Read> {
    /// Byte source.
    inner: T,
    /// Pushed back character.
    pending: Option<char>,
}

impl<T: Read> CharacterInput for RawInput<T> {
    fn next_character(&mut self) -> io::Result<Option<char>> {
        if let Some(ch) = self.pending.take() {
            return Ok(Some(ch));
        }

        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(char::from(buf[0]))),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    fn unread(&mut self, ch: char) {
        debug_assert!(self.pending.is_none(), "stage 0 character store is full");
        self.pending = Some(ch);
    }
}

/// Stage 1: CRLF and CR are turned into LF.
struct Normalized<T: Read> {
    /// Stage 0.
    inner: RawInput<T>,
    /// Pushed back character.
    pending: Option<char>,
    /// Number of line feeds handed out so far.
    line_feeds: u64,
}

impl<T: Read> CharacterInput for Normalized<T> {
    fn next_character(&mut self) -> io::Result<Option<char>> {
        if let Some(ch) = self.pending.take() {
            return Ok(Some(ch));
        }

        let ch = match self.inner.next_character()? {
            Some('\r') => {
                match self.inner.next_character()? {
                    Some('\n') | None => {}
                    Some(other) => self.inner.unread(other),
                }
                Some('\n')
            }
            other => other,
        };

        if ch == Some('\n') {
            self.line_feeds += 1;
        }

        Ok(ch)
    }

    fn unread(&mut self, ch: char) {
        debug_assert!(self.pending.is_none(), "stage 1 character store is full");
        self.pending = Some(ch);
    }
}

/// Stage 2: a backslash directly followed by LF joins two physical lines.
/// Whitespace at the start of the continued line is skipped.
struct Unwrapped<T: Read> {
    /// Stage 1.
    inner: Normalized<T>,
    /// The next character was escaped by a backslash and must not start a continuation.
    literal: bool,
}

impl<T: Read> Unwrapped<T> {
    /// Read the next character of the joined logical line stream.
    fn next_character(&mut self) -> io::Result<Option<char>> {
        loop {
            if self.literal {
                self.literal = false;
                return self.inner.next_character();
            }

            let ch = self.inner.next_character()?;
            if ch != Some('\\') {
                return Ok(ch);
            }

            match self.inner.next_character()? {
                Some('\n') => loop {
                    match self.inner.next_character()? {
                        Some(' ' | '\t' | '\x0C') => {}
                        Some(other) => {
                            self.inner.unread(other);
                            break;
                        }
                        None => return Ok(None),
                    }
                },
                Some(other) => {
                    self.inner.unread(other);
                    self.literal = true;
                    return Ok(ch);
                }
                None => return Ok(ch),
            }
        }
    }

    /// Physical line the stream is currently on, 1-based.
    const fn current_line(&self) -> u64 {
        self.inner.line_feeds + 1
    }
}

/// Whitespace as understood by the properties format.
const fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\x0C')
}

/// Reads logical lines from an ISO-8859-1 encoded properties stream.
///
/// Wrap the source in a `BufReader` if single byte reads are expensive, for example for files.
pub struct PropertiesReader<T: Read> {
    /// Stage 2 on top of the byte source.
    input: Unwrapped<T>,
    /// Where the last logical line started.
    position: ParserPosition,
}

impl<T: Read> PropertiesReader<T> {
    #[must_use]
    pub const fn new(input: T) -> Self {
        Self {
            input: Unwrapped {
                inner: Normalized {
                    inner: RawInput {
                        inner: input,
                        pending: None,
                    },
                    pending: None,
                    line_feeds: 0,
                },
                literal: false,
            },
            position: ParserPosition { line: 0 },
        }
    }

    /// Position of the logical line that was read last.
    #[must_use]
    pub const fn position(&self) -> ParserPosition {
        self.position
    }

    /// Give back the byte source.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.input.inner.inner.inner
    }

    /// Read the next logical line as text, with leading whitespace trimmed
    /// and continuation lines already joined. Escapes are left as they are.
    ///
    /// Returns None at the end of the stream.
    ///
    /// # Errors
    /// IO Errors of the underlying stream.
    pub fn read_string(&mut self) -> Result<Option<String>, Error> {
        self.position = ParserPosition {
            line: self.input.current_line(),
        };

        let Some(mut ch) = self.input.next_character()? else {
            return Ok(None);
        };

        let mut buf = String::new();
        while is_whitespace(ch) {
            match self.input.next_character()? {
                Some(next) => ch = next,
                None => return Ok(Some(buf)),
            }
        }

        while ch != '\n' {
            buf.push(ch);
            match self.input.next_character()? {
                Some(next) => ch = next,
                None => break,
            }
        }

        Ok(Some(buf))
    }

    /// Read and classify the next logical line.
    ///
    /// Returns None at the end of the stream.
    ///
    /// # Errors
    /// * IO Errors of the underlying stream.
    /// * [`Error::Format`] if the line has no key or contains a broken unicode escape.
    pub fn read_line(&mut self) -> Result<Option<Line>, Error> {
        let Some(text) = self.read_string()? else {
            return Ok(None);
        };

        let line = parse_line(&text).map_err(|source| Error::Format {
            position: self.position,
            source,
        })?;
        trace!("{}: {:?}", self.position, line);
        Ok(Some(line))
    }
}

impl<T: Read> Iterator for PropertiesReader<T> {
    type Item = Result<Line, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

/// Classify a trimmed logical line.
fn parse_line(text: &str) -> Result<Line, FormatError> {
    if text.is_empty() {
        return Ok(Line::Empty);
    }

    if text.starts_with('#') || text.starts_with('!') {
        let comment = CommentLine::new(unescape(text)?);
        // Unescaping keeps the leading marker, so the comment is always valid.
        return Ok(comment.map_or(Line::Empty, Line::Comment));
    }

    let (key, value) = split_key_value(text)?;
    let key = unescape(key)?;
    let value = unescape(value)?;
    // An escaped key can only decode to an empty string if it was a lone backslash.
    Line::property(key, value).map_err(|_| FormatError::MissingKey)
}

/// Split a key/value line into its still escaped key and value.
///
/// The key ends at the first unescaped ':', '=' or whitespace. The value starts after
/// any further whitespace and at most one more ':' or '=', but only if the key wasn't
/// already terminated by one.
fn split_key_value(text: &str) -> Result<(&str, &str), FormatError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    let mut split = 0;
    let mut break_char = false;
    while split < chars.len() {
        let ch = chars[split].1;
        if ch == '\\' {
            split += 2;
            continue;
        }

        if ch == ':' || ch == '=' || is_whitespace(ch) {
            break_char = ch == ':' || ch == '=';
            break;
        }

        split += 1;
    }
    let split = split.min(chars.len());

    if split == 0 {
        return Err(FormatError::MissingKey);
    }

    let mut value_start = split + 1;
    while value_start < chars.len() {
        let ch = chars[value_start].1;
        if ch == ':' || ch == '=' {
            if break_char {
                break;
            }
            break_char = true;
        } else if !is_whitespace(ch) {
            break;
        }
        value_start += 1;
    }

    let byte_at = |idx: usize| chars.get(idx).map_or(text.len(), |(pos, _)| *pos);
    Ok((&text[..byte_at(split)], &text[byte_at(value_start)..]))
}

/// Decode the backslash escapes of a properties text.
///
/// `\t`, `\r`, `\n` and `\f` become the control characters, `\uXXXX` the given
/// code point (utf-16 surrogate pairs are combined). Before any other character
/// the backslash is just dropped, so `\ `, `\:`, `\=` and `\\` give the plain
/// character. A lone backslash at the very end is dropped as well.
///
/// # Errors
/// * [`FormatError::MalformedUnicodeEscape`] if a `\u` is not followed by four hex digits.
/// * [`FormatError::UnpairedSurrogate`] for a surrogate escape without its partner.
pub fn unescape(text: &str) -> Result<String, FormatError> {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            None => {}
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('n') => result.push('\n'),
            Some('f') => result.push('\x0C'),
            Some('u') => {
                let unit = read_utf16_unit(&mut chars)?;
                let decoded = if (0xD800..0xDC00).contains(&unit) {
                    let mut lookahead = chars.clone();
                    if lookahead.next() != Some('\\') || lookahead.next() != Some('u') {
                        return Err(FormatError::UnpairedSurrogate(unit));
                    }

                    let low = read_utf16_unit(&mut lookahead)?;
                    let Some(Ok(decoded)) = char::decode_utf16([unit, low]).next() else {
                        return Err(FormatError::UnpairedSurrogate(unit));
                    };
                    chars = lookahead;
                    decoded
                } else {
                    char::from_u32(u32::from(unit)).ok_or(FormatError::UnpairedSurrogate(unit))?
                };
                result.push(decoded);
            }
            Some(other) => result.push(other),
        }
    }

    Ok(result)
}

/// Read the four hex digits of a `\uXXXX` escape.
fn read_utf16_unit(chars: &mut core::str::Chars<'_>) -> Result<u16, FormatError> {
    let mut unit = 0u16;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .and_then(|d| u16::try_from(d).ok())
            .ok_or(FormatError::MalformedUnicodeEscape)?;
        unit = (unit << 4) | digit;
    }

    Ok(unit)
}
