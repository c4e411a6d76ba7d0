//! Reference dataset snapshot.
//!
//! A [`ReferenceData`] holds one immutable load of the five reference tables
//! with lookup indices. Row order is preserved exactly as loaded, since
//! first-match scans (faction resolution in particular) depend on it. A
//! refresh builds a new snapshot and swaps it in whole.

pub mod csv;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::engine::phases;
use crate::models::{Datasheet, DetachmentAbility, Faction, Stratagem, UnitStratagemLink};

/// Reference loading errors.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Reference table {0} is missing")]
    MissingTable(PathBuf),

    #[error("Failed to read reference table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference table {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: ::csv::Error,
    },
}

/// A stratagem whose phase string does not normalize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseIssue {
    pub stratagem_id: String,
    pub phase: String,
    pub unknown: Vec<String>,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableSizes {
    pub factions: usize,
    pub datasheets: usize,
    pub stratagems: usize,
    pub datasheet_stratagems: usize,
    pub detachment_abilities: usize,
}

/// One loaded reference dataset.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    factions: Vec<Faction>,
    datasheets: Vec<Datasheet>,
    stratagems: Vec<Stratagem>,
    links: Vec<UnitStratagemLink>,
    detachment_abilities: Vec<DetachmentAbility>,
    last_update: Option<String>,

    faction_index: HashMap<String, usize>,
    stratagem_index: HashMap<String, usize>,
    links_by_datasheet: HashMap<String, Vec<usize>>,
    linked_stratagems: HashSet<String>,
    phase_issues: Vec<PhaseIssue>,
}

impl ReferenceData {
    /// Build a snapshot and its indices.
    ///
    /// Duplicate faction or stratagem ids keep the first row.
    pub fn new(
        factions: Vec<Faction>,
        datasheets: Vec<Datasheet>,
        stratagems: Vec<Stratagem>,
        links: Vec<UnitStratagemLink>,
        detachment_abilities: Vec<DetachmentAbility>,
    ) -> Self {
        let factions = dedup_by_id(factions, |f| f.id.as_str());
        let stratagems = dedup_by_id(stratagems, |s| s.id.as_str());

        let faction_index = factions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
        let stratagem_index = stratagems
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        let mut links_by_datasheet: HashMap<String, Vec<usize>> = HashMap::new();
        let mut linked_stratagems = HashSet::new();
        for (i, link) in links.iter().enumerate() {
            links_by_datasheet
                .entry(link.datasheet_id.clone())
                .or_default()
                .push(i);
            linked_stratagems.insert(link.stratagem_id.clone());
        }

        let mut phase_issues = Vec::new();
        for stratagem in &stratagems {
            let normalized = phases::normalize(&stratagem.phase);
            if !normalized.is_clean() {
                tracing::warn!(
                    stratagem_id = %stratagem.id,
                    phase = %stratagem.phase,
                    "Phase does not match the canonical phase list"
                );
                phase_issues.push(PhaseIssue {
                    stratagem_id: stratagem.id.clone(),
                    phase: stratagem.phase.clone(),
                    unknown: normalized.unknown,
                });
            }
        }

        Self {
            factions,
            datasheets,
            stratagems,
            links,
            detachment_abilities,
            last_update: None,
            faction_index,
            stratagem_index,
            links_by_datasheet,
            linked_stratagems,
            phase_issues,
        }
    }

    /// Builder method to record the dataset's last-update marker.
    pub fn with_last_update(mut self, last_update: impl Into<String>) -> Self {
        self.last_update = Some(last_update.into());
        self
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    pub fn faction(&self, id: &str) -> Option<&Faction> {
        self.faction_index.get(id).map(|&i| &self.factions[i])
    }

    pub fn datasheets(&self) -> &[Datasheet] {
        &self.datasheets
    }

    pub fn stratagems(&self) -> &[Stratagem] {
        &self.stratagems
    }

    pub fn stratagem(&self, id: &str) -> Option<&Stratagem> {
        self.stratagem_index.get(id).map(|&i| &self.stratagems[i])
    }

    pub fn links(&self) -> &[UnitStratagemLink] {
        &self.links
    }

    /// Links of one datasheet, in table order.
    pub fn links_for(&self, datasheet_id: &str) -> impl Iterator<Item = &UnitStratagemLink> {
        self.links_by_datasheet
            .get(datasheet_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.links[i])
    }

    /// True if any unit links to the stratagem.
    pub fn is_linked(&self, stratagem_id: &str) -> bool {
        self.linked_stratagems.contains(stratagem_id)
    }

    pub fn detachment_abilities(&self) -> &[DetachmentAbility] {
        &self.detachment_abilities
    }

    pub fn last_update(&self) -> Option<&str> {
        self.last_update.as_deref()
    }

    /// Stratagems whose phase is outside the canonical vocabulary.
    pub fn phase_issues(&self) -> &[PhaseIssue] {
        &self.phase_issues
    }

    pub fn sizes(&self) -> TableSizes {
        TableSizes {
            factions: self.factions.len(),
            datasheets: self.datasheets.len(),
            stratagems: self.stratagems.len(),
            datasheet_stratagems: self.links.len(),
            detachment_abilities: self.detachment_abilities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty() && self.stratagems.is_empty()
    }
}

fn dedup_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(id(&item).to_string()) {
            out.push(item);
        } else {
            tracing::warn!(id = id(&item), "Duplicate reference id, keeping first row");
        }
    }
    out
}
