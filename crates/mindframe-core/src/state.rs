//! Shallow state snapshots and deltas.
//!
//! A delta records every top-level key whose value changed: `Some(value)`
//! for set or changed keys, `None` for removed ones. Applying the delta to
//! the snapshot it was computed from reproduces the target exactly.
//! Snapshot equality ignores key order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    entries: IndexMap<String, Value>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Changed top-level keys between two snapshots. An empty delta serializes as `{}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDelta {
    changes: IndexMap<String, Option<Value>>,
}

impl StateDelta {
    pub fn between(prev: &StateSnapshot, next: &StateSnapshot) -> Self {
        let mut changes = IndexMap::new();
        for (key, value) in &next.entries {
            if prev.entries.get(key) != Some(value) {
                changes.insert(key.clone(), Some(value.clone()));
            }
        }
        for key in prev.entries.keys() {
            if !next.entries.contains_key(key) {
                changes.insert(key.clone(), None);
            }
        }
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, key: &str) -> Option<Option<&Value>> {
        self.changes.get(key).map(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.changes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    pub fn apply_to(&self, snapshot: &StateSnapshot) -> StateSnapshot {
        let mut next = snapshot.clone();
        self.apply_in_place(&mut next);
        next
    }

    pub fn apply_in_place(&self, snapshot: &mut StateSnapshot) {
        for (key, change) in &self.changes {
            match change {
                Some(value) => {
                    snapshot.entries.insert(key.clone(), value.clone());
                }
                None => {
                    snapshot.entries.shift_remove(key);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, key: &str, change: Option<Value>) {
        self.changes.insert(key.to_owned(), change);
    }
}

pub fn diff(prev: &StateSnapshot, next: &StateSnapshot) -> StateDelta {
    StateDelta::between(prev, next)
}

pub fn apply(snapshot: &StateSnapshot, delta: &StateDelta) -> StateSnapshot {
    delta.apply_to(snapshot)
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
