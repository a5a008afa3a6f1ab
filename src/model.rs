//! The document: an ordered list of lines plus a key index into it.

use crate::event::{ListenerId, Listeners};
use crate::line::{Line, LineChange};
use crate::reader::PropertiesReader;
use crate::writer::{PropertiesWriter, WriterConfig};
use crate::Error;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Structural change of a [`PropertyModel`]. Ranges are inclusive line indices.
#[derive(Debug, Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum ModelEvent {
    Added { first: usize, last: usize },
    Removed { first: usize, last: usize },
    Changed { index: usize },
}

/// Lines of a properties file in file order.
///
/// Every property line can be looked up by its key. If a key occurs more than once,
/// the lookup finds the last occurrence, but all of them stay in the document.
#[derive(Debug, Default)]
pub struct PropertyModel {
    /// The document.
    lines: Vec<Line>,
    /// Key to index into `lines`.
    keys: HashMap<String, usize>,
    /// Observers of structural changes.
    listeners: Listeners<ModelEvent>,
}

impl PropertyModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete document from memory.
    ///
    /// # Errors
    /// see [`PropertyModel::read`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut model = Self::new();
        model.read(bytes)?;
        Ok(model)
    }

    /// Read a file, replacing the current content.
    ///
    /// # Errors
    /// see [`PropertyModel::read`]
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!("reading {}", path.display());
        self.read(BufReader::new(file))
    }

    /// Replace the current content with everything read from `input`.
    /// On error the model keeps the lines read up to that point.
    ///
    /// # Errors
    /// * IO Errors
    /// * [`Error::Format`] for the first line that cannot be parsed.
    pub fn read(&mut self, input: impl Read) -> Result<(), Error> {
        self.read_from(&mut PropertiesReader::new(input))
    }

    /// # Errors
    /// see [`PropertyModel::read`]
    pub fn read_from<T: Read>(&mut self, reader: &mut PropertiesReader<T>) -> Result<(), Error> {
        self.clear();
        while let Some(line) = reader.read_line()? {
            self.add_line(line);
        }
        debug!("read {} lines, {} keys", self.lines.len(), self.keys.len());
        Ok(())
    }

    /// Write the document to a file, with the file closed again before returning.
    ///
    /// A failure to flush or close the file is only returned if writing itself worked.
    ///
    /// # Errors
    /// IO Errors, or the first error of [`PropertyModel::write`].
    pub fn write_file(&self, path: impl AsRef<Path>, config: &WriterConfig) -> Result<(), Error> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        let written = self.write(&mut out, config);

        let closed = out
            .into_inner()
            .map_err(std::io::IntoInnerError::into_error)
            .and_then(|file| file.sync_all());

        match (written, closed) {
            (Err(e), Err(close)) => {
                warn!("closing {} failed after an earlier error: {close}", path.display());
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), Err(close)) => Err(close.into()),
            (Ok(()), Ok(())) => {
                debug!("saved {}", path.display());
                Ok(())
            }
        }
    }

    /// # Errors
    /// IO Errors, or [`Error::Unencoded`].
    pub fn write(&self, output: impl Write, config: &WriterConfig) -> Result<(), Error> {
        let mut writer = PropertiesWriter::with_config(output, config.clone());
        self.write_with(&mut writer)?;
        writer.flush()
    }

    /// Write all lines in order. Every line brings its own line separator.
    ///
    /// # Errors
    /// IO Errors, or [`Error::Unencoded`].
    pub fn write_with<W: Write>(&self, writer: &mut PropertiesWriter<W>) -> Result<(), Error> {
        for line in &self.lines {
            writer.write_line(line)?;
        }
        debug!("wrote {} lines", self.lines.len());
        Ok(())
    }

    /// # Errors
    /// [`Error::Unencoded`], which would be a bug in the escaping.
    pub fn to_bytes(&self, config: &WriterConfig) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.write(&mut out, config)?;
        Ok(out)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[must_use]
    pub fn line_at(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// The property line for `key`, the last one if the key is not unique.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&crate::PropertyLine> {
        self.keys
            .get(key)
            .and_then(|idx| self.lines.get(*idx))
            .and_then(Line::as_property)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Keys of all property lines in document order, duplicates included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(Line::key)
    }

    /// Change the value of the property `key`.
    ///
    /// Returns false if there is no such key or the value was the same already.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> bool {
        let Some(index) = self.keys.get(key).copied() else {
            return false;
        };

        let changed = match self.lines.get_mut(index) {
            Some(Line::Property(prop)) => prop.set_value(value),
            _ => false,
        };

        if changed {
            self.listeners.fire(&ModelEvent::Changed { index });
        }
        changed
    }

    /// Change the text of the comment line at `index`.
    ///
    /// Returns false if there is no comment line at `index` or the text was the same already.
    ///
    /// # Errors
    /// [`Error::InvalidComment`]
    pub fn set_comment(&mut self, index: usize, comment: impl Into<String>) -> Result<bool, Error> {
        let Some(Line::Comment(line)) = self.lines.get_mut(index) else {
            return Ok(false);
        };

        let comment = comment.into();
        if line.comment() == comment {
            return Ok(false);
        }

        line.set_comment(comment)?;
        self.listeners.fire(&ModelEvent::Changed { index });
        Ok(true)
    }

    /// Register a listener for value changes of the property `key`.
    pub fn add_line_listener(
        &mut self,
        key: &str,
        listener: impl FnMut(&LineChange) + Send + 'static,
    ) -> Option<ListenerId> {
        let index = *self.keys.get(key)?;
        match self.lines.get_mut(index) {
            Some(Line::Property(prop)) => Some(prop.add_listener(listener)),
            _ => None,
        }
    }

    pub fn remove_line_listener(&mut self, key: &str, id: ListenerId) -> bool {
        let Some(index) = self.keys.get(key).copied() else {
            return false;
        };
        match self.lines.get_mut(index) {
            Some(Line::Property(prop)) => prop.remove_listener(id),
            _ => false,
        }
    }

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&ModelEvent) + Send + 'static,
    ) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.take_lines();
    }

    /// Remove all lines and hand them out.
    fn take_lines(&mut self) -> Vec<Line> {
        let lines = core::mem::take(&mut self.lines);
        self.keys.clear();
        if !lines.is_empty() {
            self.listeners.fire(&ModelEvent::Removed {
                first: 0,
                last: lines.len() - 1,
            });
        }
        lines
    }

    /// Append a line at the end of the document.
    pub fn add_line(&mut self, line: Line) {
        let index = self.lines.len();
        if let Some(key) = line.key() {
            if let Some(previous) = self.keys.insert(key.to_string(), index) {
                warn!("key {key:?} of line {index} shadows line {previous}");
            }
        }
        self.lines.push(line);
        self.listeners.fire(&ModelEvent::Added {
            first: index,
            last: index,
        });
    }

    /// Insert a line before `index`, or append it if `index` is past the end.
    pub fn insert_line(&mut self, index: usize, line: Line) {
        let index = index.min(self.lines.len());
        self.lines.insert(index, line);
        self.rebuild_keys();
        self.listeners.fire(&ModelEvent::Added {
            first: index,
            last: index,
        });
    }

    /// Remove the line at `index`. If it was a duplicate key, the previous occurrence
    /// of the key becomes visible again.
    pub fn remove_line(&mut self, index: usize) -> Option<Line> {
        if index >= self.lines.len() {
            return None;
        }

        let line = self.lines.remove(index);
        self.rebuild_keys();
        self.listeners.fire(&ModelEvent::Removed {
            first: index,
            last: index,
        });
        Some(line)
    }

    /// Recompute the key index from the lines, later keys winning.
    fn rebuild_keys(&mut self) {
        self.keys.clear();
        for (index, line) in self.lines.iter().enumerate() {
            if let Some(key) = line.key() {
                self.keys.insert(key.to_string(), index);
            }
        }
    }

    /// Copy of all lines, without any listeners.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::new();
        for line in &self.lines {
            copy.add_line(line.duplicate());
        }
        copy
    }

    /// Rebuild this document from `reference`, keeping the translations that still apply.
    ///
    /// * The leading comment block of this document is kept. If there is none, the one of
    ///   the reference is copied.
    /// * Every other line of the reference is copied in order. Property lines get the value
    ///   this document had for the key, if it had one.
    /// * Keys that only this document had are dropped.
    ///
    /// Returns the keys that this document did not have before.
    pub fn merge(&mut self, reference: &Self) -> HashSet<String> {
        let translations: HashMap<String, String> = self
            .lines
            .iter()
            .filter_map(Line::as_property)
            .map(|prop| (prop.key().to_string(), prop.value().to_string()))
            .collect();

        let header_len = self.lines.iter().take_while(|line| line.is_comment()).count();
        let mut header = self.take_lines();
        header.truncate(header_len);

        let reference_header = reference
            .lines
            .iter()
            .take_while(|line| line.is_comment())
            .count();

        if header.is_empty() {
            for line in &reference.lines[..reference_header] {
                self.add_line(line.duplicate());
            }
        } else {
            for line in header {
                self.add_line(line);
            }
        }

        let mut new_keys = HashSet::new();
        for line in &reference.lines[reference_header..] {
            let mut copy = line.duplicate();
            if let Line::Property(prop) = &mut copy {
                if let Some(value) = translations.get(prop.key()) {
                    prop.set_value(value.clone());
                } else {
                    new_keys.insert(prop.key().to_string());
                }
            }
            self.add_line(copy);
        }

        let dropped = translations
            .keys()
            .filter(|key| !reference.contains_key(key))
            .count();
        debug!(
            "merged {} lines, {} new keys, {} keys dropped",
            self.lines.len(),
            new_keys.len(),
            dropped
        );
        new_keys
    }
}

/// Merge `reference` into a copy of `current`, see [`PropertyModel::merge`].
/// Neither input is changed.
#[must_use]
pub fn merge(current: &PropertyModel, reference: &PropertyModel) -> (PropertyModel, HashSet<String>) {
    let mut merged = current.duplicate();
    let new_keys = merged.merge(reference);
    (merged, new_keys)
}
