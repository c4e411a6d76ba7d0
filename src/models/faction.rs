//! Faction model.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// A top-level army affiliation, or a subfaction pointing at its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Faction {
    /// Create a faction, rejecting an empty id or name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() || name.trim().is_empty() {
            return Err(ModelError::MissingField {
                entity: "faction",
                field: if id.trim().is_empty() { "id" } else { "name" },
            });
        }
        Ok(Self {
            id,
            name,
            parent_id: None,
        })
    }

    /// Builder method to set the parent faction.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        let parent_id = parent_id.into();
        self.parent_id = if parent_id.is_empty() {
            None
        } else {
            Some(parent_id)
        };
        self
    }

    /// True if `faction_id` is this faction or its parent.
    pub fn owns(&self, faction_id: &str) -> bool {
        self.id == faction_id || self.parent_id.as_deref() == Some(faction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faction_creation() {
        let faction = Faction::new("SM", "Space Marines").unwrap();
        assert_eq!(faction.id, "SM");
        assert_eq!(faction.name, "Space Marines");
        assert!(faction.parent_id.is_none());
    }

    #[test]
    fn test_faction_rejects_empty_fields() {
        assert!(Faction::new("", "Space Marines").is_err());
        assert!(Faction::new("SM", "  ").is_err());
    }

    #[test]
    fn test_faction_owns_parent() {
        let faction = Faction::new("CHUL", "Ultramarines").unwrap().with_parent("SM");
        assert!(faction.owns("CHUL"));
        assert!(faction.owns("SM"));
        assert!(!faction.owns("CSM"));
    }

    #[test]
    fn test_empty_parent_is_none() {
        let faction = Faction::new("SM", "Space Marines").unwrap().with_parent("");
        assert!(faction.parent_id.is_none());
    }
}
