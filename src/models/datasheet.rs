//! Datasheet (unit type) model.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// A unit type defined by the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasheet {
    pub id: String,
    pub name: String,
    pub faction_id: String,
    /// Keywords, e.g. "Faction: Ultramarines"
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Datasheet {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        faction_id: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        let name = name.into();
        if id.is_empty() || name.is_empty() {
            return Err(ModelError::MissingField {
                entity: "datasheet",
                field: if id.is_empty() { "id" } else { "name" },
            });
        }
        Ok(Self {
            id,
            name,
            faction_id: faction_id.into(),
            keywords: Vec::new(),
        })
    }

    /// Builder method to add keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Name with apostrophes stripped, used for fuzzy comparison.
    pub fn clean_name(&self) -> String {
        self.name.replace('\'', "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_strips_apostrophes() {
        let ds = Datasheet::new("000001", "Kor'sarro Khan", "SM").unwrap();
        assert_eq!(ds.clean_name(), "Korsarro Khan");
    }

    #[test]
    fn test_datasheet_requires_id() {
        assert!(Datasheet::new("", "Captain", "SM").is_err());
    }
}
