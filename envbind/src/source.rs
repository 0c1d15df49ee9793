use std::collections::HashMap;

use parking_lot::RwLock;

/// Where the binder reads raw values from.
pub trait KeySource: Send + Sync {
    /// The value stored under exactly `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under exactly `key`. `None` removes the key.
    fn set(&self, key: &str, value: Option<&str>);
}

/// Reads and writes the variables of the current process.
///
/// Writes go through [`std::env::set_var`] and [`std::env::remove_var`].
/// Only write while no other thread, including foreign code calling
/// `getenv`, reads the environment; configuration is usually seeded once at
/// startup or from tests serialized with `temp_env`.
///
/// # Panics
///
/// [`KeySource::set`] panics if `key` is empty or contains `=` or NUL, or if
/// `value` contains NUL.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl KeySource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: Option<&str>) {
        // SAFETY: writers uphold the single-threaded access documented on
        // `ProcessEnv`.
        unsafe {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// An in-memory key source.
#[derive(Debug, Default)]
pub struct MapSource {
    values: RwLock<HashMap<String, String>>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V> FromIterator<(K, V)> for MapSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            values: RwLock::new(values),
        }
    }
}

impl KeySource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Option<&str>) {
        let mut values = self.values.write();
        match value {
            Some(value) => values.insert(key.to_owned(), value.to_owned()),
            None => values.remove(key),
        };
    }
}
