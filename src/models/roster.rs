//! Roster models: the normalized selection tree and the per-force
//! resolution produced from it.

use serde::Serialize;

use super::vocabulary::{ARMY_OF_RENOWN_LABEL, NON_UNIT_SELECTIONS, SUBFACTION_TYPES};
use super::Faction;

const FACTION_KEYWORD_PREFIX: &str = "faction: ";

/// A parsed roster file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub name: String,
    pub forces: Vec<Force>,
}

/// One detachment/army block of a roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Force {
    pub catalogue_name: String,
    pub selections: Vec<Selection>,
}

/// A roster selection and its nested selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub name: String,
    pub entry_type: String,
    /// Category labels, e.g. "Faction: Ultramarines" or "Infantry"
    pub categories: Vec<String>,
    pub selections: Vec<Selection>,
}

impl Selection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_child(mut self, child: Selection) -> Self {
        self.selections.push(child);
        self
    }

    /// Depth-first walk over this selection and all descendants.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Selection> + '_> {
        Box::new(std::iter::once(self).chain(self.selections.iter().flat_map(|s| s.walk())))
    }

    /// Category labels of the form "Faction: X", with the prefix removed.
    pub fn faction_keywords(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().filter_map(|c| strip_faction_prefix(c))
    }
}

impl Force {
    pub fn new(catalogue_name: impl Into<String>) -> Self {
        Self {
            catalogue_name: catalogue_name.into(),
            selections: Vec::new(),
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }

    /// Top-level selections that may be units.
    pub fn unit_candidates(&self) -> impl Iterator<Item = &Selection> {
        self.selections
            .iter()
            .filter(|s| !NON_UNIT_SELECTIONS.contains(&s.name.as_str()))
    }

    /// Children of subfaction-choice selections, apostrophes stripped.
    pub fn subfaction_candidates(&self) -> Vec<String> {
        self.selections
            .iter()
            .filter(|s| SUBFACTION_TYPES.contains(&s.name.as_str()))
            .flat_map(|s| s.selections.iter())
            .map(|child| child.name.replace('\'', ""))
            .collect()
    }

    /// "Faction: X" keywords declared on any selection, in tree order.
    pub fn faction_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for selection in self.selections.iter().flat_map(|s| s.walk()) {
            for keyword in selection.faction_keywords() {
                if !keywords.iter().any(|k| k == keyword) {
                    keywords.push(keyword.to_string());
                }
            }
        }
        keywords
    }

    /// Special army variant chosen for this force, if any.
    ///
    /// A selection named exactly "Army of Renown" carries the variant as its
    /// first child; otherwise the variant follows the label in the name.
    pub fn army_of_renown(&self) -> Option<String> {
        for selection in &self.selections {
            if selection.name == ARMY_OF_RENOWN_LABEL {
                return selection
                    .selections
                    .first()
                    .map(|child| child.name.replace('\'', ""))
                    .filter(|name| !name.is_empty());
            }
            if let Some(pos) = selection.name.find(ARMY_OF_RENOWN_LABEL) {
                let rest = &selection.name[pos + ARMY_OF_RENOWN_LABEL.len()..];
                let variant = rest
                    .trim_start_matches(|c: char| c == ' ' || c == '-' || c == ':')
                    .replace('\'', "");
                let variant = variant.trim();
                if !variant.is_empty() {
                    return Some(variant.to_string());
                }
            }
        }
        None
    }
}

/// Strip a case-insensitive "Faction: " prefix.
pub fn strip_faction_prefix(keyword: &str) -> Option<&str> {
    let head = keyword.get(..FACTION_KEYWORD_PREFIX.len())?;
    if head.eq_ignore_ascii_case(FACTION_KEYWORD_PREFIX) {
        Some(keyword[FACTION_KEYWORD_PREFIX.len()..].trim())
    } else {
        None
    }
}

/// A roster unit matched to a datasheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredUnit {
    /// Datasheet id
    pub id: String,
    /// Datasheet name
    pub name: String,
    /// Datasheet keywords merged with the roster's category labels
    pub keywords: Vec<String>,
}

/// A force after name reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterForce {
    pub catalogue_name: String,
    pub faction: Option<Faction>,
    pub detachment: Option<String>,
    pub army_of_renown: Option<String>,
    pub units: Vec<DeclaredUnit>,
    #[serde(skip)]
    pub selections: Vec<Selection>,
}

impl RosterForce {
    /// 1-based position of a datasheet in the declared unit list.
    pub fn unit_index(&self, datasheet_id: &str) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u.id == datasheet_id)
            .map(|i| i + 1)
    }

    pub fn has_unit(&self, datasheet_id: &str) -> bool {
        self.units.iter().any(|u| u.id == datasheet_id)
    }
}
