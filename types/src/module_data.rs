//! Module-data: the string-to-string baggage carried per call.

use std::collections::BTreeMap;

/// Maximum length, in bytes, of a single module-data value.
///
/// Round-tripping preserves any UTF-8 string up to 4 KiB per value. Keys are
/// not separately bounded; in practice they are short fixed tag names chosen
/// by filters.
pub const MAX_VALUE_LEN: usize = 4 * 1024;

/// A finite string-to-string mapping attached to one call.
///
/// This is the sole vehicle for cross-cutting metadata (tracing ids, auth
/// tokens, arbitrary tags): it is populated by filters, readable and writable
/// from handler code through the call context, and copied into/out of each
/// protocol's meta encoding at the connection boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleData {
    entries: BTreeMap<String, String>,
}

/// An error raised while mutating a [`ModuleData`] map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleDataError {
    #[error("module-data value for key {key:?} is {len} bytes, exceeding the {MAX_VALUE_LEN}-byte limit")]
    ValueTooLarge { key: String, len: usize },
}

impl ModuleData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key-value pair, enforcing the per-value size ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleDataError::ValueTooLarge`] if `value` exceeds
    /// [`MAX_VALUE_LEN`] bytes; the map is left unchanged.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, ModuleDataError> {
        let key = key.into();
        let value = value.into();

        if value.len() > MAX_VALUE_LEN {
            return Err(ModuleDataError::ValueTooLarge {
                key,
                len: value.len(),
            });
        }

        Ok(self.entries.insert(key, value))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merges `other` into `self`, with `other`'s values taking precedence on key
    /// collision. Used when copying inbound meta into a fresh call context.
    pub fn extend_from(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            self.entries.insert(key.to_owned(), value.to_owned());
        }
    }
}

impl FromIterator<(String, String)> for ModuleData {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ModuleData {
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;
    type Item = (String, String);

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
