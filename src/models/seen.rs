//! Persisted seen-state: which message identities were already handled.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Metadata stored per handled record identity.
///
/// Entries are written once when a record is accepted as new and never
/// mutated or removed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeenEntry {
    /// Title of the record at the time it was handled
    pub title: String,

    /// When the record was accepted
    pub processed_at: DateTime<Utc>,

    /// Keys written by other versions, carried through saves untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SeenEntry {
    /// Create an entry stamped with the current time.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            processed_at: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Identity to entry map with stable insertion order.
///
/// Serializes as a single JSON object, oldest entry first, so the state
/// file stays diffable and new entries always appear at the bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenSet {
    entries: HashMap<String, SeenEntry>,
    order: Vec<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an identity was already handled in some prior run.
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Record an identity as handled.
    ///
    /// Returns `false` (and changes nothing) if it was already present.
    pub fn record(&mut self, identity: impl Into<String>, entry: SeenEntry) -> bool {
        let identity = identity.into();
        if self.entries.contains_key(&identity) {
            return false;
        }
        self.order.push(identity.clone());
        self.entries.insert(identity, entry);
        true
    }

    pub fn get(&self, identity: &str) -> Option<&SeenEntry> {
        self.entries.get(identity)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeenEntry)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| (id.as_str(), entry)))
    }
}

impl Serialize for SeenSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (identity, entry) in self.iter() {
            map.serialize_entry(identity, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeenSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeenSetVisitor;

        impl<'de> Visitor<'de> for SeenSetVisitor {
            type Value = SeenSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of record identities to seen entries")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut set = SeenSet::new();
                while let Some((identity, entry)) = access.next_entry::<String, SeenEntry>()? {
                    set.record(identity, entry);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SeenSetVisitor)
    }
}
