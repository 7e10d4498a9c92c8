//! Small string key-value stores backing persisted preferences.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Key-value store errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("value for {key} cannot be stored: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// String key-value storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Preferences kept in the browser's own cookies.
///
/// Reads come from the cookies seen when the store was created. Writes are
/// held until `write_to` turns them into `Set-Cookie` headers.
#[derive(Debug, Default)]
pub struct CookieStore {
    values: HashMap<String, String>,
    dirty: BTreeSet<String>,
}

impl CookieStore {
    /// Load the listed keys from a request's cookies.
    pub fn from_jar(jar: &CookieJar, keys: &[&str]) -> Self {
        let values = keys
            .iter()
            .filter_map(|key| jar.get(key).map(|c| (key.to_string(), c.value().to_string())))
            .collect();
        Self {
            values,
            dirty: BTreeSet::new(),
        }
    }

    /// Add the changed keys to `jar`, as long-lived cookies or removals.
    pub fn write_to(&mut self, mut jar: CookieJar) -> CookieJar {
        for key in std::mem::take(&mut self.dirty) {
            jar = match self.values.get(&key) {
                Some(value) => {
                    let mut cookie = Cookie::new(key, value.clone());
                    cookie.set_path("/");
                    cookie.set_same_site(SameSite::Lax);
                    cookie.make_permanent();
                    jar.add(cookie)
                }
                None => jar.remove(Cookie::build((key, String::new())).path("/")),
            };
        }
        jar
    }
}

impl KeyValueStore for CookieStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let bad = |c: char| c.is_whitespace() || c.is_control() || matches!(c, ';' | ',' | '"' | '\\');
        if value.chars().any(bad) {
            return Err(StoreError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        self.values.insert(key.to_string(), value.to_string());
        self.dirty.insert(key.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.dirty.insert(key.to_string());
        }
        Ok(())
    }
}

/// Volatile store for tests.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}
