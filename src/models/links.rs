//! Link tables: unit-to-stratagem edges and detachment abilities.

use serde::{Deserialize, Serialize};

/// Many-to-many edge between a datasheet and a stratagem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStratagemLink {
    pub datasheet_id: String,
    pub stratagem_id: String,
}

impl UnitStratagemLink {
    pub fn new(datasheet_id: impl Into<String>, stratagem_id: impl Into<String>) -> Self {
        Self {
            datasheet_id: datasheet_id.into(),
            stratagem_id: stratagem_id.into(),
        }
    }
}

/// A detachment ability row. Only the detachment name and id are used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachmentAbility {
    pub detachment: String,
    pub detachment_id: String,
    #[serde(default)]
    pub faction_id: String,
    #[serde(default)]
    pub name: String,
}

impl DetachmentAbility {
    pub fn new(detachment: impl Into<String>, detachment_id: impl Into<String>) -> Self {
        Self {
            detachment: detachment.into(),
            detachment_id: detachment_id.into(),
            faction_id: String::new(),
            name: String::new(),
        }
    }
}
