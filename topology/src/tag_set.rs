// Copyright (c) 2018-2022 The Botho Foundation

//! Replica set member tags.

use crate::document::Value;
use serde::{ser::SerializeMap, Serialize, Serializer};

/// Operator-assigned `name -> value` labels of a member, in the order the
/// member reported them.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct TagSet {
    tags: Vec<(String, String)>,
}

impl TagSet {
    /// An empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from the fields of a `tags` subdocument. Values that
    /// are not strings are stored in their text form.
    pub fn from_document(fields: &[(String, Value)]) -> Self {
        fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_text()))
            .collect()
    }

    /// Set a tag. An existing tag keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.tags.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.tags.push((name, value)),
        }
    }

    /// Value of a tag.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True when there are no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.tags.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// True when every tag in `required` is present here with the same value.
    /// An empty `required` set matches any member.
    pub fn matches(&self, required: &TagSet) -> bool {
        required
            .iter()
            .all(|(name, value)| self.get(name) == Some(value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tags.len()))?;
        for (name, value) in &self.tags {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
