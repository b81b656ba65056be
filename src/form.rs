// Copyright 2022 jmjoy
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Decoded form fields.

use bytes::Bytes;
use std::{collections::HashMap, fmt};

/// An uploaded file.
#[derive(Clone, PartialEq, Eq)]
pub struct FileField {
    pub filename: String,
    pub media_type: String,
    pub content: Bytes,
}

impl fmt::Debug for FileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileField")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// A decoded form field.
///
/// A multipart part becomes [`FieldValue::File`] exactly when its
/// disposition carries a `filename` attribute, even an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File(FileField),
}

impl FieldValue {
    /// The text value, `None` for files.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            FieldValue::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileField> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::File(file) => Some(file),
        }
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        matches!(self, FieldValue::File(_))
    }
}

/// Ordered mapping from field name to value.
///
/// Inserting a name that is already present replaces its value and keeps
/// the position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCollection {
    entries: Vec<(String, FieldValue)>,
    /// Name to position in `entries`.
    index: HashMap<String, usize>,
}

impl FieldCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.index
            .get(name)
            .map(|&position| &self.entries[position].1)
    }

    /// Shorthand for the text value of a field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl<'a> IntoIterator for &'a FieldCollection {
    type Item = (&'a str, &'a FieldValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_value_wins_first_position_kept() {
        let mut fields = FieldCollection::new();
        fields.insert("a", FieldValue::Text("1".into()));
        fields.insert("b", FieldValue::Text("2".into()));
        let replaced = fields.insert("a", FieldValue::Text("3".into()));

        assert_eq!(replaced, Some(FieldValue::Text("1".into())));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.text("a"), Some("3"));
        assert_eq!(
            fields.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_text_of_file_is_none() {
        let mut fields = FieldCollection::new();
        fields.insert(
            "upload",
            FieldValue::File(FileField {
                filename: "a.bin".into(),
                media_type: "application/octet-stream".into(),
                content: Bytes::from_static(b"\x00\x01"),
            }),
        );

        assert!(fields.contains("upload"));
        assert_eq!(fields.text("upload"), None);
        assert!(fields.get("upload").is_some_and(FieldValue::is_file));
    }
}
