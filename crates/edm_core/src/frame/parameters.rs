//! Typed parameter store attached to a frame.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

mod sealed {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for String {}
}

/// A value kind the parameter store accepts.
///
/// Implemented for `i32`, `f32`, `f64` and `String`; every key holds a
/// vector of values, with single values stored as one-element vectors.
pub trait ParameterValue: sealed::Sealed + Clone + Send + Sync + 'static {
    #[doc(hidden)]
    fn slot(store: &ParameterStore) -> &RwLock<HashMap<String, Vec<Self>>>;
}

impl ParameterValue for i32 {
    fn slot(store: &ParameterStore) -> &RwLock<HashMap<String, Vec<Self>>> {
        &store.ints
    }
}

impl ParameterValue for f32 {
    fn slot(store: &ParameterStore) -> &RwLock<HashMap<String, Vec<Self>>> {
        &store.floats
    }
}

impl ParameterValue for f64 {
    fn slot(store: &ParameterStore) -> &RwLock<HashMap<String, Vec<Self>>> {
        &store.doubles
    }
}

impl ParameterValue for String {
    fn slot(store: &ParameterStore) -> &RwLock<HashMap<String, Vec<Self>>> {
        &store.strings
    }
}

/// String-keyed parameters, one map per value kind.
///
/// Insertion and lookup take `&self`; each value kind is guarded by its
/// own lock, so writers of different kinds never contend.
#[derive(Default)]
pub struct ParameterStore {
    ints: RwLock<HashMap<String, Vec<i32>>>,
    floats: RwLock<HashMap<String, Vec<f32>>>,
    doubles: RwLock<HashMap<String, Vec<f64>>>,
    strings: RwLock<HashMap<String, Vec<String>>>,
}

impl ParameterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a single value under `key`, replacing what was there.
    pub fn set<V: ParameterValue>(&self, key: impl Into<String>, value: V) {
        self.set_vec(key, vec![value]);
    }

    /// Stores a vector of values under `key`, replacing what was there.
    pub fn set_vec<V: ParameterValue>(&self, key: impl Into<String>, values: Vec<V>) {
        V::slot(self).write().insert(key.into(), values);
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get<V: ParameterValue>(&self, key: &str) -> Option<V> {
        V::slot(self)
            .read()
            .get(key)
            .and_then(|values| values.first().cloned())
    }

    /// All values stored under `key`.
    #[must_use]
    pub fn get_vec<V: ParameterValue>(&self, key: &str) -> Option<Vec<V>> {
        V::slot(self).read().get(key).cloned()
    }

    /// Whether a value of kind `V` is stored under `key`.
    #[must_use]
    pub fn contains<V: ParameterValue>(&self, key: &str) -> bool {
        V::slot(self).read().contains_key(key)
    }

    /// Sorted keys holding values of kind `V`.
    #[must_use]
    pub fn keys<V: ParameterValue>(&self) -> Vec<String> {
        let mut keys: Vec<String> = V::slot(self).read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All entries of kind `V`, sorted by key.
    #[must_use]
    pub fn entries<V: ParameterValue>(&self) -> Vec<(String, Vec<V>)> {
        let mut entries: Vec<_> = V::slot(self)
            .read()
            .iter()
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of keys across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ints.read().len()
            + self.floats.read().len()
            + self.doubles.read().len()
            + self.strings.read().len()
    }

    /// Returns true if no parameter is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for ParameterStore {
    fn clone(&self) -> Self {
        Self {
            ints: RwLock::new(self.ints.read().clone()),
            floats: RwLock::new(self.floats.read().clone()),
            doubles: RwLock::new(self.doubles.read().clone()),
            strings: RwLock::new(self.strings.read().clone()),
        }
    }
}

impl PartialEq for ParameterStore {
    fn eq(&self, other: &Self) -> bool {
        self.entries::<i32>() == other.entries::<i32>()
            && self.entries::<f32>() == other.entries::<f32>()
            && self.entries::<f64>() == other.entries::<f64>()
            && self.entries::<String>() == other.entries::<String>()
    }
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("ints", &self.entries::<i32>())
            .field("floats", &self.entries::<f32>())
            .field("doubles", &self.entries::<f64>())
            .field("strings", &self.entries::<String>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn kinds_are_kept_apart() {
        let store = ParameterStore::new();
        store.set("run", 7i32);
        store.set("run", 1.5f64);
        store.set("label", String::from("calibration"));

        assert_eq!(store.get::<i32>("run"), Some(7));
        assert_eq!(store.get::<f64>("run"), Some(1.5));
        assert_eq!(store.get::<f32>("run"), None);
        assert_eq!(store.get::<String>("label").as_deref(), Some("calibration"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn vectors_and_replacement() {
        let store = ParameterStore::new();
        store.set_vec("thresholds", vec![0.5f32, 1.0, 2.0]);

        assert_eq!(store.get::<f32>("thresholds"), Some(0.5));
        assert_eq!(
            store.get_vec::<f32>("thresholds"),
            Some(vec![0.5, 1.0, 2.0])
        );

        store.set("thresholds", 3.0f32);
        assert_eq!(store.get_vec::<f32>("thresholds"), Some(vec![3.0]));
    }

    #[test]
    fn empty_vector_has_no_first_value() {
        let store = ParameterStore::new();
        store.set_vec::<i32>("none", Vec::new());

        assert!(store.contains::<i32>("none"));
        assert_eq!(store.get::<i32>("none"), None);
    }

    #[test]
    fn keys_are_sorted() {
        let store = ParameterStore::new();
        store.set("b", 2i32);
        store.set("a", 1i32);

        assert_eq!(store.keys::<i32>(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.keys::<String>().is_empty());
    }

    #[test]
    fn concurrent_insertion() {
        let store = Arc::new(ParameterStore::new());
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.set(format!("int-{worker}-{i}"), i);
                        store.set(format!("str-{worker}-{i}"), format!("{i}"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.keys::<i32>().len(), 400);
        assert_eq!(store.keys::<String>().len(), 400);
    }

    #[test]
    fn clone_is_deep() {
        let store = ParameterStore::new();
        store.set("x", 1i32);
        let copy = store.clone();
        store.set("x", 2i32);

        assert_eq!(copy.get::<i32>("x"), Some(1));
        assert_ne!(copy, store);
    }
}
