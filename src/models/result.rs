//! Report payload.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::Stratagem;

/// Insertion-ordered mapping from a key (phase or unit) to rule names.
///
/// Serialized as a JSON object whose key order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    entries: Vec<(String, Vec<String>)>,
}

impl Grouping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a key exists, keeping its position if already present.
    pub fn ensure(&mut self, key: &str) {
        if !self.contains(key) {
            self.entries.push((key.to_string(), Vec::new()));
        }
    }

    /// Append a name under `key`, creating the key if needed.
    /// Names are not repeated within a key.
    pub fn push(&mut self, key: &str, name: &str) {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        let names = &mut self.entries[idx].1;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable sort of keys by the given rank.
    pub fn sort_by_key<K: Ord>(&mut self, mut rank: impl FnMut(&str) -> K) {
        self.entries.sort_by_key(|(k, _)| rank(k));
    }
}

impl Serialize for Grouping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, names) in &self.entries {
            map.serialize_entry(key, names)?;
        }
        map.end()
    }
}

/// A rule as reported, without internal presentation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportStratagem {
    pub id: String,
    pub name: String,
    pub faction_id: String,
    #[serde(rename = "type")]
    pub stratagem_type: String,
    pub cp_cost: u32,
    pub legend: String,
    pub description: String,
    pub phase: String,
    pub detachment: Option<String>,
    pub subfaction_id: Option<String>,
}

impl From<&Stratagem> for ReportStratagem {
    fn from(s: &Stratagem) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            faction_id: s.faction_id.clone(),
            stratagem_type: s.type_label().to_string(),
            cp_cost: s.cp_cost,
            legend: s.legend.clone(),
            description: s.description.clone(),
            phase: s.phase.clone(),
            detachment: s.detachment.clone(),
            subfaction_id: s.subfaction_id.clone(),
        }
    }
}

/// Final report: one phase grouping and one unit grouping per force,
/// plus the deduplicated rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    pub phases: Vec<Grouping>,
    pub units: Vec<Grouping>,
    pub all_rules: Vec<ReportStratagem>,
}

impl ProcessingResult {
    pub fn force_count(&self) -> usize {
        self.phases.len()
    }
}
