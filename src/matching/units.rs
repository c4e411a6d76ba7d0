//! Unit name matching and subfaction inference.

use crate::models::{strip_faction_prefix, Datasheet, DeclaredUnit, Faction, Force, Selection};
use crate::reference::ReferenceData;

use super::aliases;

/// True if a roster unit name refers to the given datasheet name.
///
/// Apostrophes are stripped from the roster name; it then matches if it is
/// spelled exactly like a unit alias for `reference_name`, or if the two
/// names are equal. Case is significant and there is no fuzzy fallback.
pub fn compare_unit_names(reference_name: &str, roster_name: &str) -> bool {
    let roster_name = roster_name.replace('\'', "");
    if aliases::units().lookup_exact(&roster_name) == Some(reference_name) {
        return true;
    }
    reference_name == roster_name
}

/// Datasheets declared by a force, in roster order and without repeats.
///
/// Only datasheets of the force's faction or its parent faction are
/// considered. A force without a faction declares no units.
pub fn resolve_units(force: &Force, faction: Option<&Faction>, reference: &ReferenceData) -> Vec<DeclaredUnit> {
    let Some(faction) = faction else {
        return Vec::new();
    };
    let in_scope: Vec<&Datasheet> = reference
        .datasheets()
        .iter()
        .filter(|d| faction.owns(&d.faction_id))
        .collect();

    let mut units: Vec<DeclaredUnit> = Vec::new();
    for selection in force.unit_candidates() {
        let Some(datasheet) = in_scope
            .iter()
            .find(|d| compare_unit_names(&d.clean_name(), &selection.name))
        else {
            tracing::debug!(unit = %selection.name, faction = %faction.name, "No datasheet for roster unit");
            continue;
        };
        if units.iter().any(|u| u.id == datasheet.id) {
            continue;
        }
        units.push(DeclaredUnit {
            id: datasheet.id.clone(),
            name: datasheet.name.clone(),
            keywords: merged_keywords(datasheet, selection),
        });
    }
    units
}

fn merged_keywords(datasheet: &Datasheet, selection: &Selection) -> Vec<String> {
    let mut keywords = datasheet.keywords.clone();
    for category in selection.walk().flat_map(|s| s.categories.iter()) {
        if !keywords.contains(category) {
            keywords.push(category.clone());
        }
    }
    keywords
}

/// Subfaction named by the first unit keyword found in the subfaction alias
/// table, e.g. "Ultramarines" for "Faction: Ultramarines".
pub fn subfaction_from_units(units: &[DeclaredUnit]) -> Option<&'static str> {
    let table = aliases::subfactions();
    units
        .iter()
        .flat_map(|u| u.keywords.iter())
        .find_map(|keyword| {
            let name = strip_faction_prefix(keyword).unwrap_or(keyword.as_str());
            table.find_alias(name)
        })
}

/// True if a rule's subfaction id refers to the inferred subfaction.
///
/// The id is compared directly and through the faction table, since the
/// reference data stores subfactions as faction rows.
pub fn subfaction_matches(subfaction_id: &str, inferred: Option<&str>, reference: &ReferenceData) -> bool {
    let Some(inferred) = inferred else {
        return false;
    };
    if subfaction_id.eq_ignore_ascii_case(inferred) {
        return true;
    }
    reference
        .faction(subfaction_id)
        .map(|f| aliases::alias_key(&f.name) == aliases::alias_key(inferred))
        .unwrap_or(false)
}
