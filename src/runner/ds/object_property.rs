use std::collections::HashMap;

use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    pub fn new_data(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Built-in methods and internal slots such as `Error.prototype.message`.
    pub fn new_hidden(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }
}

/// Returns the index if `key` is a canonical array index ("0", "17", not "01").
pub fn as_array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|i| *i != u32::MAX).map(|i| i as usize)
}

/// Insertion-ordered property storage.
///
/// Keys are reported the way JS reports own keys: integer-like keys in ascending
/// order first, then every other key in insertion order.
#[derive(Debug, Default)]
pub struct PropertyMap {
    slots: Vec<(String, PropertyDescriptor)>,
    index: HashMap<String, usize>,
}

impl PropertyMap {
    pub fn new() -> Self {
        PropertyMap {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.index.get(key).map(|i| &self.slots[*i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PropertyDescriptor> {
        match self.index.get(key) {
            Some(i) => Some(&mut self.slots[*i].1),
            None => None,
        }
    }

    /// Inserts or replaces a property, keeping its original position on replace.
    pub fn insert(&mut self, key: String, descriptor: PropertyDescriptor) {
        match self.index.get(&key) {
            Some(i) => self.slots[*i].1 = descriptor,
            None => {
                self.index.insert(key.clone(), self.slots.len());
                self.slots.push((key, descriptor));
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyDescriptor> {
        let i = self.index.remove(key)?;
        let (_, descriptor) = self.slots.remove(i);
        for (_, idx) in self.index.iter_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(descriptor)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut integer_keys: Vec<(usize, &String)> = self
            .slots
            .iter()
            .filter_map(|(k, _)| as_array_index(k).map(|i| (i, k)))
            .collect();
        integer_keys.sort_by_key(|(i, _)| *i);
        let mut keys: Vec<String> = integer_keys.into_iter().map(|(_, k)| k.to_string()).collect();
        for (k, _) in &self.slots {
            if as_array_index(k).is_none() {
                keys.push(k.to_string());
            }
        }
        keys
    }

    pub fn enumerable_keys(&self) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| self.get(k).map_or(false, |d| d.enumerable))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyDescriptor)> {
        self.slots.iter().map(|(k, d)| (k, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_keys_come_first_in_ascending_order() {
        let mut map = PropertyMap::new();
        map.insert("b".to_string(), PropertyDescriptor::new_data(JsValue::Null));
        map.insert("10".to_string(), PropertyDescriptor::new_data(JsValue::Null));
        map.insert("a".to_string(), PropertyDescriptor::new_data(JsValue::Null));
        map.insert("2".to_string(), PropertyDescriptor::new_data(JsValue::Null));
        assert_eq!(map.keys(), vec!["2", "10", "b", "a"]);
    }

    #[test]
    fn test_replace_keeps_position_and_remove_reindexes() {
        let mut map = PropertyMap::new();
        map.insert("x".to_string(), PropertyDescriptor::new_data(JsValue::Boolean(true)));
        map.insert("y".to_string(), PropertyDescriptor::new_data(JsValue::Null));
        map.insert("z".to_string(), PropertyDescriptor::new_data(JsValue::Null));
        map.insert("x".to_string(), PropertyDescriptor::new_data(JsValue::Boolean(false)));
        assert_eq!(map.keys(), vec!["x", "y", "z"]);
        assert!(map.remove("y").is_some());
        assert_eq!(map.keys(), vec!["x", "z"]);
        assert_eq!(map.get("z").map(|d| d.value.clone()), Some(JsValue::Null));
        assert_eq!(map.get("x").map(|d| d.value.clone()), Some(JsValue::Boolean(false)));
    }

    #[test]
    fn test_array_index_recognition() {
        assert_eq!(as_array_index("0"), Some(0));
        assert_eq!(as_array_index("42"), Some(42));
        assert_eq!(as_array_index("042"), None);
        assert_eq!(as_array_index("-1"), None);
        assert_eq!(as_array_index("1.5"), None);
        assert_eq!(as_array_index(""), None);
    }
}
