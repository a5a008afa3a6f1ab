//! Key navigation over a document and comparison of a translation with its reference.

use crate::model::PropertyModel;
use std::collections::HashSet;

/// Keys of a document in document order, for going to, stepping through and searching keys.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct KeyIndex {
    /// Keys as they appear, duplicates included.
    keys: Vec<String>,
}

impl KeyIndex {
    #[must_use]
    pub fn from_model(model: &PropertyModel) -> Self {
        Self {
            keys: model.keys().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.find_key(key).is_some()
    }

    /// Index of the first occurrence of `key`.
    #[must_use]
    pub fn find_key(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// The key following `after`, or the first key if `after` is None or unknown.
    #[must_use]
    pub fn next_key(&self, after: Option<&str>) -> Option<&str> {
        self.key_at(self.start_after(after))
    }

    /// The key preceding `before`, or the last key if `before` is None or unknown.
    #[must_use]
    pub fn previous_key(&self, before: Option<&str>) -> Option<&str> {
        match before.and_then(|key| self.find_key(key)) {
            Some(index) => index.checked_sub(1).and_then(|idx| self.key_at(idx)),
            None => self.keys.last().map(String::as_str),
        }
    }

    /// The next key after `after` whose value in `model` contains the search term.
    /// Keys that `model` does not have are skipped.
    #[must_use]
    pub fn search(
        &self,
        model: &PropertyModel,
        query: &SearchQuery,
        after: Option<&str>,
    ) -> Option<&str> {
        let term = query.normalize(&query.term);
        self.keys[self.start_after(after).min(self.keys.len())..]
            .iter()
            .find(|key| {
                model
                    .property(key)
                    .is_some_and(|prop| query.normalize(prop.value()).contains(term.as_str()))
            })
            .map(String::as_str)
    }

    /// Index to continue from when stepping past `after`.
    fn start_after(&self, after: Option<&str>) -> usize {
        after
            .and_then(|key| self.find_key(key))
            .map_or(0, |index| index + 1)
    }
}

/// Text to look for in the values of a document.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub struct SearchQuery {
    pub term: String,
    pub case_sensitive: bool,
}

impl SearchQuery {
    #[must_use]
    pub fn new(term: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            term: term.into(),
            case_sensitive,
        }
    }

    /// Case folding, if the query asks for it.
    fn normalize(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }
}

/// How a key of the translation relates to the reference.
#[derive(Debug, Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum KeyStatus {
    /// Added by the last merge.
    New,
    /// Still has the reference value.
    Untranslated,
    /// Has a value that differs from the reference.
    Translated,
    /// Only the translation has this key.
    Surplus,
}

/// A translation held against the reference it was made from.
#[derive(Debug, Clone, Copy)]
pub struct KeyComparison<'a> {
    pub translation: &'a PropertyModel,
    pub reference: &'a PropertyModel,
    /// Keys reported by the merge that produced `translation`.
    pub new_keys: Option<&'a HashSet<String>>,
}

impl<'a> KeyComparison<'a> {
    #[must_use]
    pub const fn new(translation: &'a PropertyModel, reference: &'a PropertyModel) -> Self {
        Self {
            translation,
            reference,
            new_keys: None,
        }
    }

    #[must_use]
    pub const fn with_new_keys(mut self, new_keys: &'a HashSet<String>) -> Self {
        self.new_keys = Some(new_keys);
        self
    }

    #[must_use]
    pub fn is_new(&self, key: &str) -> bool {
        self.new_keys.is_some_and(|keys| keys.contains(key))
    }

    /// Both documents have the key and the values differ.
    #[must_use]
    pub fn is_changed(&self, key: &str) -> bool {
        match (self.translation.property(key), self.reference.property(key)) {
            (Some(translated), Some(original)) => translated.value() != original.value(),
            _ => false,
        }
    }

    /// The translation has the key with an empty value.
    #[must_use]
    pub fn is_empty(&self, key: &str) -> bool {
        self.translation
            .property(key)
            .is_some_and(|prop| prop.value().is_empty())
    }

    #[must_use]
    pub fn is_surplus(&self, key: &str) -> bool {
        self.translation.contains_key(key) && !self.reference.contains_key(key)
    }

    #[must_use]
    pub fn status(&self, key: &str) -> KeyStatus {
        if self.is_changed(key) {
            KeyStatus::Translated
        } else if self.is_new(key) {
            KeyStatus::New
        } else if self.is_surplus(key) {
            KeyStatus::Surplus
        } else {
            KeyStatus::Untranslated
        }
    }

    /// The next key of the translation after `after` that still needs work:
    /// new, or not changed from the reference. Surplus keys have no reference
    /// value and count as not changed.
    #[must_use]
    pub fn find_next_untranslated(&self, after: Option<&str>) -> Option<String> {
        let index = KeyIndex::from_model(self.translation);
        let start = index.start_after(after);
        let found = index
            .iter()
            .skip(start)
            .find(|key| self.is_new(key) || !self.is_changed(key))
            .map(str::to_string);
        found
    }
}
