use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::ast::Value;

/// Named bind parameters in insertion order.
///
/// Names are stored without the `@` marker used in SQL text. Equality
/// compares the bags as mappings, ignoring order.
#[derive(Debug, Clone, Default)]
pub struct ParamBag {
    entries: Vec<(String, Value)>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `name`, replacing an existing binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Merge another bag into this one; its bindings win on conflict.
    pub fn extend(&mut self, other: ParamBag) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }
}

impl PartialEq for ParamBag {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(n, v)| other.get(n) == Some(v))
    }
}

impl FromIterator<(String, Value)> for ParamBag {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut bag = ParamBag::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

impl IntoIterator for ParamBag {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ParamBag {
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
    fn test_insert_replaces() {
        let mut bag = ParamBag::new();
        bag.insert("Id", 1);
        bag.insert("Name", "a");
        bag.insert("Id", 2);
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("Id"), Some(&Value::Int(2)));
        assert_eq!(bag.names().collect::<Vec<_>>(), vec!["Id", "Name"]);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = ParamBag::new().with("A", 1).with("B", 2);
        let b = ParamBag::new().with("B", 2).with("A", 1);
        assert_eq!(a, b);
        assert_ne!(a, ParamBag::new().with("A", 1));
    }

    #[test]
    fn test_serializes_as_object() {
        let bag = ParamBag::new().with("NAME_0", "2");
        assert_eq!(serde_json::to_string(&bag).unwrap(), r#"{"NAME_0":"2"}"#);
    }
}
