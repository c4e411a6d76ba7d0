//! Faction resolution for one roster force.

use crate::models::{Faction, Force};

use super::aliases::{self, AliasTable};

/// Catalogue segment that names an army group rather than a faction.
const CRAFTWORLDS: &str = "Craftworlds";

/// Minimum share of words two names must have in common to match by overlap.
const MIN_WORD_OVERLAP: f64 = 0.5;

/// Words ignored when scoring word overlap.
const STOP_WORDS: &[&str] = &["of", "the", "and"];

/// Resolves a force to a reference faction.
///
/// Implementations scan `factions` in the order given; callers pass the
/// dataset's row order.
pub trait FactionMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve<'a>(&self, force: &Force, factions: &'a [Faction]) -> Option<&'a Faction>;
}

/// First-match-wins heuristic, tried layer by layer:
///
/// 1. exact name of the cleaned catalogue label
/// 2. substring in either direction
/// 3. subfaction choices and "Faction: X" keywords through the alias table
/// 4. word overlap with the catalogue label
#[derive(Debug, Clone, Copy)]
pub struct LayeredFactionMatcher {
    aliases: &'static AliasTable,
}

impl Default for LayeredFactionMatcher {
    fn default() -> Self {
        Self {
            aliases: aliases::subfactions(),
        }
    }
}

impl LayeredFactionMatcher {
    pub fn new(aliases: &'static AliasTable) -> Self {
        Self { aliases }
    }

    /// Faction label from a catalogue name such as "Imperium - Space Marines".
    pub fn clean_catalogue_name(&self, catalogue_name: &str) -> String {
        let segments: Vec<&str> = catalogue_name.split(" - ").map(str::trim).collect();
        let label = match segments.as_slice() {
            [first, .., last] if *last == CRAFTWORLDS => *first,
            [.., last] => *last,
            [] => "",
        };
        let label = collapse(&label.replace('\'', "").replace('_', " "));
        match self.aliases.lookup(&label) {
            Some(canonical) => canonical.replace('\'', ""),
            None => label,
        }
    }

    /// Names worth resolving through the alias table, in roster order.
    fn subfaction_hints(force: &Force) -> Vec<String> {
        let mut hints = force.subfaction_candidates();
        for keyword in force.faction_keywords() {
            if !hints.iter().any(|h| h.eq_ignore_ascii_case(&keyword)) {
                hints.push(keyword);
            }
        }
        hints
    }
}

impl FactionMatcher for LayeredFactionMatcher {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn resolve<'a>(&self, force: &Force, factions: &'a [Faction]) -> Option<&'a Faction> {
        let label = self.clean_catalogue_name(&force.catalogue_name);

        if !label.is_empty() {
            if let Some(hit) = find_exact(&label, factions).or_else(|| find_substring(&label, factions)) {
                return Some(hit);
            }
        }

        for hint in Self::subfaction_hints(force) {
            let target = self
                .aliases
                .lookup(&hint)
                .map(str::to_string)
                .unwrap_or(hint);
            if let Some(hit) = find_exact(&target, factions).or_else(|| find_substring(&target, factions)) {
                tracing::debug!(hint = %target, faction = %hit.name, "Faction resolved from subfaction hint");
                return Some(hit);
            }
        }

        find_by_overlap(&label, factions)
    }
}

fn comparable(name: &str) -> String {
    collapse(&name.replace('\'', "")).to_lowercase()
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_exact<'a>(name: &str, factions: &'a [Faction]) -> Option<&'a Faction> {
    let name = comparable(name);
    if name.is_empty() {
        return None;
    }
    factions.iter().find(|f| comparable(&f.name) == name)
}

fn find_substring<'a>(name: &str, factions: &'a [Faction]) -> Option<&'a Faction> {
    let name = comparable(name);
    if name.is_empty() {
        return None;
    }
    factions.iter().find(|f| {
        let faction = comparable(&f.name);
        !faction.is_empty() && (faction.contains(&name) || name.contains(&faction))
    })
}

fn words(name: &str) -> Vec<String> {
    comparable(name)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Best word-overlap score above the threshold; ties keep row order.
fn find_by_overlap<'a>(name: &str, factions: &'a [Faction]) -> Option<&'a Faction> {
    let wanted = words(name);
    if wanted.is_empty() {
        return None;
    }
    let mut best: Option<(&Faction, f64)> = None;
    for faction in factions {
        let have = words(&faction.name);
        if have.is_empty() {
            continue;
        }
        let shared = wanted.iter().filter(|w| have.contains(w)).count();
        let score = shared as f64 / wanted.len().max(have.len()) as f64;
        if score > MIN_WORD_OVERLAP && best.map_or(true, |(_, s)| score > s) {
            best = Some((faction, score));
        }
    }
    best.map(|(faction, _)| faction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Selection;

    fn factions() -> Vec<Faction> {
        vec![
            Faction::new("SM", "Space Marines").unwrap(),
            Faction::new("AC", "Adeptus Custodes").unwrap(),
            Faction::new("CSM", "Chaos Space Marines").unwrap(),
            Faction::new("TAU", "T'au Empire").unwrap(),
            Faction::new("AE", "Aeldari").unwrap(),
            Faction::new("LoV", "Leagues of Votann").unwrap(),
        ]
    }

    fn resolve(force: &Force) -> Option<String> {
        let factions = factions();
        LayeredFactionMatcher::default()
            .resolve(force, &factions)
            .map(|f| f.id.clone())
    }

    #[test]
    fn test_clean_catalogue_name() {
        let m = LayeredFactionMatcher::default();
        assert_eq!(m.clean_catalogue_name("Imperium - Space Marines"), "Space Marines");
        assert_eq!(m.clean_catalogue_name("Aeldari - Craftworlds"), "Aeldari");
        assert_eq!(m.clean_catalogue_name("Xenos - T'au Empire"), "Tau Empire");
        assert_eq!(m.clean_catalogue_name("Imperium - Ultramarines"), "Space Marines");
        assert_eq!(m.clean_catalogue_name(""), "");
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        // "Space Marines" is a substring of "Chaos Space Marines" and comes first,
        // but the exact pass runs before the substring pass.
        let force = Force::new("Chaos - Chaos Space Marines");
        assert_eq!(resolve(&force).as_deref(), Some("CSM"));
    }

    #[test]
    fn test_apostrophes_ignored_on_both_sides() {
        let force = Force::new("Xenos - T'au Empire");
        assert_eq!(resolve(&force).as_deref(), Some("TAU"));
    }

    #[test]
    fn test_substring_first_hit_wins() {
        let force = Force::new("Imperium - Space Marines - Codex Compliant");
        // No exact or substring hit on "Codex Compliant"; falls through to None.
        assert_eq!(resolve(&force), None);

        let force = Force::new("Imperium - Space Marine");
        assert_eq!(resolve(&force).as_deref(), Some("SM"));
    }

    #[test]
    fn test_falls_back_to_faction_keywords() {
        let force = Force::new("Adeptus Astartes").with_selection(
            Selection::new("Intercessor Squad")
                .with_categories(["Faction: Adeptus Astartes", "Faction: Ultramarines"]),
        );
        assert_eq!(resolve(&force).as_deref(), Some("SM"));
    }

    #[test]
    fn test_falls_back_to_subfaction_choice() {
        let force = Force::new("Eldar").with_selection(
            Selection::new("Craftworld Selection").with_child(Selection::new("Biel-Tan")),
        );
        assert_eq!(resolve(&force).as_deref(), Some("AE"));
    }

    #[test]
    fn test_word_overlap() {
        let force = Force::new("Xenos - Votann Leagues");
        assert_eq!(resolve(&force).as_deref(), Some("LoV"));
    }

    #[test]
    fn test_single_shared_word_is_not_enough() {
        let force = Force::new("Adeptus Astartes");
        assert_eq!(resolve(&force), None);
    }
}
