//! Stratagem model and type classification.
//!
//! The reference dataset describes a stratagem's category as free text
//! (e.g. "Ultramarines – Battle Tactic Stratagem"). The text is classified
//! once, when the record is built, into a [`StratagemCategory`]; the
//! eligibility engine only ever looks at the category.

use serde::Serialize;

use super::vocabulary::{ARMY_OF_RENOWN, INVALID_STRATAGEM_TYPES, VALID_STRATAGEM_TYPES};
use super::ModelError;

/// Playable stratagem kinds, in allowlist order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StratagemKind {
    BattleTactic,
    StrategicPloy,
    EpicDeed,
    Requisition,
    Wargear,
    Core,
}

impl StratagemKind {
    const ALL: [StratagemKind; 6] = [
        StratagemKind::BattleTactic,
        StratagemKind::StrategicPloy,
        StratagemKind::EpicDeed,
        StratagemKind::Requisition,
        StratagemKind::Wargear,
        StratagemKind::Core,
    ];

    /// The type fragment that identifies this kind.
    pub fn label(&self) -> &'static str {
        match self {
            StratagemKind::BattleTactic => VALID_STRATAGEM_TYPES[0],
            StratagemKind::StrategicPloy => VALID_STRATAGEM_TYPES[1],
            StratagemKind::EpicDeed => VALID_STRATAGEM_TYPES[2],
            StratagemKind::Requisition => VALID_STRATAGEM_TYPES[3],
            StratagemKind::Wargear => VALID_STRATAGEM_TYPES[4],
            StratagemKind::Core => VALID_STRATAGEM_TYPES[5],
        }
    }
}

/// Category derived from the raw type text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratagemCategory {
    /// Allowlisted kind, eligible subject to phase and scoping checks.
    Playable(StratagemKind),
    /// Belongs to the named special army variant only.
    ArmyOfRenown(&'static str),
    /// Edition or format variant that is never reported.
    Excluded,
    /// Generic "Stratagem" or an unrecognized type.
    Unclassified,
}

impl StratagemCategory {
    /// Classify a raw type string.
    ///
    /// Precedence: blocklist, then army variants, then the allowlist.
    pub fn classify(raw: &str) -> Self {
        if INVALID_STRATAGEM_TYPES.iter().any(|t| raw.contains(t)) {
            return StratagemCategory::Excluded;
        }
        let bare = raw.replace('\'', "");
        if let Some(variant) = ARMY_OF_RENOWN.iter().find(|v| bare.contains(*v)) {
            return StratagemCategory::ArmyOfRenown(variant);
        }
        if raw == "Stratagem" {
            return StratagemCategory::Unclassified;
        }
        StratagemKind::ALL
            .into_iter()
            .find(|kind| raw.contains(kind.label()))
            .map(StratagemCategory::Playable)
            .unwrap_or(StratagemCategory::Unclassified)
    }
}

/// A usable special rule from the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stratagem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    type_label: String,
    pub cp_cost: u32,
    pub description: String,
    pub legend: String,
    pub phase: String,
    pub faction_id: String,
    pub subfaction_id: Option<String>,
    pub detachment: Option<String>,
    pub detachment_id: Option<String>,
    /// Publisher source tag; never reported.
    #[serde(skip)]
    pub source_id: Option<String>,
    #[serde(skip)]
    category: StratagemCategory,
    #[serde(skip)]
    core: bool,
}

impl Stratagem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        type_label: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        let name = name.into();
        if id.is_empty() || name.is_empty() {
            return Err(ModelError::MissingField {
                entity: "stratagem",
                field: if id.is_empty() { "id" } else { "name" },
            });
        }
        let type_label = type_label.into();
        Ok(Self {
            category: StratagemCategory::classify(&type_label),
            core: type_label.to_lowercase().contains("core"),
            id,
            name,
            type_label,
            cp_cost: 0,
            description: String::new(),
            legend: String::new(),
            phase: String::new(),
            faction_id: String::new(),
            subfaction_id: None,
            detachment: None,
            detachment_id: None,
            source_id: None,
        })
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    pub fn with_faction(mut self, faction_id: impl Into<String>) -> Self {
        self.faction_id = faction_id.into();
        self
    }

    pub fn with_cp_cost(mut self, cp_cost: u32) -> Self {
        self.cp_cost = cp_cost;
        self
    }

    pub fn with_text(mut self, legend: impl Into<String>, description: impl Into<String>) -> Self {
        self.legend = legend.into();
        self.description = description.into();
        self
    }

    pub fn with_subfaction(mut self, subfaction_id: impl Into<String>) -> Self {
        self.subfaction_id = non_empty(subfaction_id.into());
        self
    }

    pub fn with_detachment(
        mut self,
        detachment: impl Into<String>,
        detachment_id: impl Into<String>,
    ) -> Self {
        self.detachment = non_empty(detachment.into());
        self.detachment_id = non_empty(detachment_id.into());
        self
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = non_empty(source_id.into());
        self
    }

    /// Raw type text as published.
    pub fn type_label(&self) -> &str {
        &self.type_label
    }

    pub fn category(&self) -> StratagemCategory {
        self.category
    }

    /// True if the type text mentions "core" in any case.
    pub fn is_core(&self) -> bool {
        self.core
    }

    /// True if the rule names a detachment by name or id.
    pub fn is_detachment_scoped(&self) -> bool {
        self.detachment.is_some() || self.detachment_id.is_some()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_playable_kinds() {
        assert_eq!(
            StratagemCategory::classify("Gladius Task Force – Battle Tactic Stratagem"),
            StratagemCategory::Playable(StratagemKind::BattleTactic)
        );
        assert_eq!(
            StratagemCategory::classify("Core – Strategic Ploy Stratagem"),
            StratagemCategory::Playable(StratagemKind::StrategicPloy)
        );
        assert_eq!(
            StratagemCategory::classify("Core Stratagem"),
            StratagemCategory::Playable(StratagemKind::Core)
        );
    }

    #[test]
    fn test_classify_generic_is_unclassified() {
        assert_eq!(
            StratagemCategory::classify("Stratagem"),
            StratagemCategory::Unclassified
        );
        assert_eq!(
            StratagemCategory::classify("Detachment Rule"),
            StratagemCategory::Unclassified
        );
    }

    #[test]
    fn test_classify_blocklist_wins() {
        assert_eq!(
            StratagemCategory::classify("Boarding Actions – Battle Tactic Stratagem"),
            StratagemCategory::Excluded
        );
        assert_eq!(
            StratagemCategory::classify("Crusade – Requisition Stratagem"),
            StratagemCategory::Excluded
        );
    }

    #[test]
    fn test_classify_army_of_renown() {
        assert_eq!(
            StratagemCategory::classify("Vanguard Spearhead – Epic Deed Stratagem"),
            StratagemCategory::ArmyOfRenown("Vanguard Spearhead")
        );
    }

    #[test]
    fn test_classify_army_of_renown_ignores_apostrophes() {
        assert_eq!(
            StratagemCategory::classify("Disciples of Be'lakor – Strategic Ploy Stratagem"),
            StratagemCategory::ArmyOfRenown("Disciples of Belakor")
        );
    }

    #[test]
    fn test_core_flag_is_case_insensitive() {
        let s = Stratagem::new("1", "COMMAND RE-ROLL", "Core – Battle Tactic Stratagem").unwrap();
        assert!(s.is_core());
        let s = Stratagem::new("2", "ARMOUR OF CONTEMPT", "Battle Tactic Stratagem").unwrap();
        assert!(!s.is_core());
    }

    #[test]
    fn test_blank_detachment_fields_are_none() {
        let s = Stratagem::new("1", "X", "Stratagem")
            .unwrap()
            .with_detachment("  ", "");
        assert!(!s.is_detachment_scoped());
    }

    #[test]
    fn test_serialization_uses_type_and_hides_source() {
        let s = Stratagem::new("1", "X", "Wargear Stratagem")
            .unwrap()
            .with_source("SRC");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "Wargear Stratagem");
        assert!(json.get("source_id").is_none());
    }
}
