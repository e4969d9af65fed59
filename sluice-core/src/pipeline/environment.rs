//! Environment variable maps

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::Value;

/// Ordered `KEY -> value` map
///
/// Accepts either a YAML map of scalars or a list of `KEY=value` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Environment(BTreeMap<String, String>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Adds every key of `other` that is not already set here.
    ///
    /// Existing values are never replaced.
    pub fn merge_missing(&mut self, other: &Environment) {
        for (key, value) in &other.0 {
            self.0
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Sets every key from `vars`, replacing existing values.
    pub fn overlay<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.0.insert(key.into(), value.into());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for Environment {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnvironment {
    Map(BTreeMap<String, Value>),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawEnvironment>::deserialize(deserializer)?;

        let map = match raw {
            None => BTreeMap::new(),
            Some(RawEnvironment::Map(map)) => map
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect(),
            Some(RawEnvironment::List(entries)) => {
                let mut map = BTreeMap::new();
                for entry in entries {
                    let (key, value) = entry.split_once('=').ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            "invalid environment entry `{}`: expected KEY=value",
                            entry
                        ))
                    })?;
                    map.insert(key.to_string(), value.to_string());
                }
                map
            }
        };

        Ok(Self(map))
    }
}
