//! Detachment lookup built from the detachment ability table.

use std::collections::HashMap;

use crate::models::{DetachmentAbility, Force};

/// Roster selection whose children name the chosen detachment.
const DETACHMENT_SELECTION: &str = "Detachment";

/// Canonical detachment names and their ids.
#[derive(Debug, Clone, Default)]
pub struct DetachmentIndex {
    /// normalized name -> canonical name
    names: HashMap<String, String>,
    /// lowercase canonical name -> detachment ids
    ids: HashMap<String, Vec<String>>,
}

impl DetachmentIndex {
    pub fn new(abilities: &[DetachmentAbility]) -> Self {
        let mut index = Self::default();
        for ability in abilities {
            let name = ability.detachment.trim();
            if name.is_empty() {
                continue;
            }
            index
                .names
                .entry(normalize(name))
                .or_insert_with(|| name.to_string());

            let id = ability.detachment_id.trim();
            if !id.is_empty() {
                let ids = index.ids.entry(name.to_lowercase()).or_default();
                if !ids.iter().any(|i| i == id) {
                    ids.push(id.to_string());
                }
            }
        }
        index
    }

    /// Canonical spelling of a detachment name, ignoring case and spaces.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.names.get(&normalize(name)).map(String::as_str)
    }

    /// Ids recorded for a detachment name.
    pub fn ids_for(&self, detachment: &str) -> &[String] {
        self.ids
            .get(&detachment.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The detachment a force declares.
    ///
    /// Children of a "Detachment" selection are checked first; otherwise any
    /// category label that names a known detachment.
    pub fn resolve(&self, force: &Force) -> Option<String> {
        let selections = || force.selections.iter().flat_map(|s| s.walk());

        let structural = selections()
            .filter(|s| s.name == DETACHMENT_SELECTION)
            .flat_map(|s| s.selections.iter())
            .find_map(|child| self.canonical(&child.name));
        if let Some(name) = structural {
            return Some(name.to_string());
        }

        selections()
            .flat_map(|s| s.categories.iter())
            .find_map(|category| self.canonical(category))
            .map(str::to_string)
    }

    /// True if the rule's detachment name or id belongs to `detachment`.
    pub fn matches(
        &self,
        detachment: &str,
        rule_detachment: Option<&str>,
        rule_detachment_id: Option<&str>,
    ) -> bool {
        let by_name = rule_detachment
            .map(|d| d.trim().eq_ignore_ascii_case(detachment.trim()))
            .unwrap_or(false);
        let by_id = rule_detachment_id
            .map(|id| self.ids_for(detachment).iter().any(|known| known == id.trim()))
            .unwrap_or(false);
        by_name || by_id
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
