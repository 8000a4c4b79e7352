//! Ordered property map shared by game-level and node-level properties.
//!
//! A property may be defined several times in one node (`AB[aa][bb]`). The
//! values are kept as a list in arrival order; readers that want a single
//! string see them joined with [`VALUE_SEPARATOR`].

use std::borrow::Cow;

use crate::constants::{
    PASS_COORD, POINT_LIST_PROPERTIES, PROP_BLACK, PROP_WHITE, VALUE_SEPARATOR,
};
use crate::coord::{alpha_to_coords, expand_point_list};
use crate::error::Result;

/// Property identifier to value list, in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: Vec<(String, Vec<String>)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Append a value, merging with any values already stored under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    /// Like [`add`](Self::add), but point-list values (`AB[aa:cc]`,
    /// `AW[aa,bb]`) are expanded to single points and move values must be a
    /// point on the board or a pass.
    pub fn add_checked(&mut self, key: &str, value: String) -> Result<()> {
        if POINT_LIST_PROPERTIES.contains(&key) {
            for point in expand_point_list(&value)? {
                self.add(key, point);
            }
            return Ok(());
        }
        if (key == PROP_BLACK || key == PROP_WHITE) && !value.is_empty() && value != PASS_COORD {
            alpha_to_coords(&value)?;
        }
        self.add(key, value);
        Ok(())
    }

    /// Rebuild through [`add_checked`](Self::add_checked).
    pub fn checked(self) -> Result<Properties> {
        let mut props = Properties::new();
        for (key, values) in self.entries {
            for value in values {
                props.add_checked(&key, value)?;
            }
        }
        Ok(props)
    }

    /// Replace all values stored under `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = vec![value.into()],
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// All values under `key` joined with the value separator.
    pub fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        self.values(key).map(|values| match values {
            [single] => Cow::Borrowed(single.as_str()),
            many => Cow::Owned(many.join(VALUE_SEPARATOR.to_string().as_str())),
        })
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.position(key).map(|i| self.entries[i].1.as_slice())
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Merge every property of `other` into `self`.
    pub fn merge(&mut self, other: Properties) {
        for (key, values) in other.entries {
            for value in values {
                self.add(key.clone(), value);
            }
        }
    }

    /// Key/value pairs sorted by key with trimmed joined values, for
    /// order-insensitive comparison.
    pub(crate) fn canonical(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|(k, v)| {
                let joined = v.join(VALUE_SEPARATOR.to_string().as_str());
                (k.clone(), joined.trim().to_string())
            })
            .collect();
        pairs.sort();
        pairs
    }

    /// Same key set and same trimmed values, ignoring insertion order.
    pub fn same_as(&self, other: &Properties) -> bool {
        self.len() == other.len() && self.canonical() == other.canonical()
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.add(k, v);
        }
        props
    }
}
