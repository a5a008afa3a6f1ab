//! The three kinds of logical lines a properties file is made of.

use crate::event::{ListenerId, Listeners};
use crate::writer::PropertiesWriter;
use crate::Error;
use std::io::Write;

/// Which payload of a line was changed.
#[derive(Debug, Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum LineField {
    Comment,
    Value,
}

/// Notification sent to line listeners after a payload changed.
#[derive(Debug, Eq, PartialEq, Clone, PartialOrd, Ord, Hash)]
pub struct LineChange {
    pub field: LineField,
    pub old: String,
    pub new: String,
}

/// A comment line, starting with '#' or '!'.
#[derive(Debug)]
pub struct CommentLine {
    /// Full comment text including the leading marker.
    comment: String,
    /// Observers of `comment`.
    listeners: Listeners<LineChange>,
}

impl CommentLine {
    /// # Errors
    /// [`Error::InvalidComment`] if `comment` is empty or does not start with '#' or '!'.
    pub fn new(comment: impl Into<String>) -> Result<Self, Error> {
        let comment = comment.into();
        check_comment(&comment)?;
        Ok(Self {
            comment,
            listeners: Listeners::new(),
        })
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Replace the comment text and notify the listeners if it actually changed.
    ///
    /// # Errors
    /// [`Error::InvalidComment`], the line is left unchanged.
    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<(), Error> {
        let comment = comment.into();
        check_comment(&comment)?;
        let old = core::mem::replace(&mut self.comment, comment);
        if old != self.comment {
            self.listeners.fire(&LineChange {
                field: LineField::Comment,
                old,
                new: self.comment.clone(),
            });
        }
        Ok(())
    }

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&LineChange) + Send + 'static,
    ) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Copy of the comment without any of the listeners.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            comment: self.comment.clone(),
            listeners: Listeners::new(),
        }
    }
}

/// Comments are only recognized by their first character.
fn check_comment(comment: &str) -> Result<(), Error> {
    if comment.starts_with('#') || comment.starts_with('!') {
        return Ok(());
    }

    Err(Error::InvalidComment(comment.to_string()))
}

/// A key/value line. The key is fixed once the line exists, the value may change.
#[derive(Debug)]
pub struct PropertyLine {
    /// Never empty.
    key: String,
    /// Decoded value, may be empty.
    value: String,
    /// Observers of `value`.
    listeners: Listeners<LineChange>,
}

impl PropertyLine {
    /// # Errors
    /// [`Error::EmptyKey`] if `key` is empty.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }

        Ok(Self {
            key,
            value: value.into(),
            listeners: Listeners::new(),
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value. Listeners are only notified if the value actually changed.
    /// Returns true in that case.
    pub fn set_value(&mut self, value: impl Into<String>) -> bool {
        let old = core::mem::replace(&mut self.value, value.into());
        if old == self.value {
            return false;
        }

        self.listeners.fire(&LineChange {
            field: LineField::Value,
            old,
            new: self.value.clone(),
        });
        true
    }

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&LineChange) + Send + 'static,
    ) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Copy of key and value without any of the listeners.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            listeners: Listeners::new(),
        }
    }
}

/// One logical line of a properties file.
#[derive(Debug)]
pub enum Line {
    Empty,
    Comment(CommentLine),
    Property(PropertyLine),
}

impl Line {
    /// # Errors
    /// see [`CommentLine::new`]
    pub fn comment(comment: impl Into<String>) -> Result<Self, Error> {
        CommentLine::new(comment).map(Self::Comment)
    }

    /// # Errors
    /// see [`PropertyLine::new`]
    pub fn property(key: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        PropertyLine::new(key, value).map(Self::Property)
    }

    /// Key of a property line.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Property(prop) => Some(prop.key()),
            Self::Empty | Self::Comment(_) => None,
        }
    }

    #[must_use]
    pub const fn as_property(&self) -> Option<&PropertyLine> {
        match self {
            Self::Property(prop) => Some(prop),
            Self::Empty | Self::Comment(_) => None,
        }
    }

    #[must_use]
    pub const fn as_comment(&self) -> Option<&CommentLine> {
        match self {
            Self::Comment(comment) => Some(comment),
            Self::Empty | Self::Property(_) => None,
        }
    }

    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Independent copy that can be mutated without affecting this line.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Comment(comment) => Self::Comment(comment.duplicate()),
            Self::Property(prop) => Self::Property(prop.duplicate()),
        }
    }

    /// Serialize this line, including its line separator.
    ///
    /// # Errors
    /// Propagated from the writer.
    pub fn write<W: Write>(&self, writer: &mut PropertiesWriter<W>) -> Result<(), Error> {
        match self {
            Self::Empty => writer.new_line(),
            Self::Comment(comment) => {
                writer.write_escaped(comment.comment())?;
                writer.new_line()
            }
            Self::Property(prop) => {
                let mark = writer.write_key(prop.key())?;
                writer.write_raw("= ")?;
                writer.write_wrappable(prop.value(), mark + 2)?;
                writer.new_line()
            }
        }
    }
}

/// Lines compare by content only, listeners are ignored.
impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Comment(a), Self::Comment(b)) => a.comment == b.comment,
            (Self::Property(a), Self::Property(b)) => a.key == b.key && a.value == b.value,
            _ => false,
        }
    }
}

impl Eq for Line {}
