//! Insertion-ordered parameter maps.
//!
//! Parameter order is significant: it fixes the axis order of the batch
//! cartesian product, so a plain hash map is not enough here.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Mapping from parameter name to a concrete value that remembers the order
/// in which names were first inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: Vec<(String, f64)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value. An existing name keeps its position and has its value
    /// replaced; the previous value is returned.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((name, value));
        None
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        set.extend(iter);
        set
    }
}

impl<K: Into<String>> Extend<(K, f64)> for ParamSet {
    fn extend<I: IntoIterator<Item = (K, f64)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl Serialize for ParamSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_first_position() {
        let mut set = ParamSet::new();
        set.insert("b", 1.0);
        set.insert("a", 2.0);
        assert_eq!(set.insert("b", 3.0), Some(1.0));

        let pairs: Vec<_> = set.iter().collect();
        assert_eq!(pairs, vec![("b", 3.0), ("a", 2.0)]);
    }

    #[test]
    fn test_serialize_in_insertion_order() {
        let set: ParamSet = [("z", 1.5), ("a", 2.0)].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"z":1.5,"a":2.0}"#);
    }
}
