//! Eligibility engine.
//!
//! For one resolved force, candidates are gathered from four buckets:
//!
//! - rules linked to a declared unit
//! - faction-wide rules with no unit link (only with `show_empty`)
//! - core rules (only with `show_core`)
//! - rules of the force's detachment (always)
//!
//! Each candidate then has to pass the validity predicate and the
//! detachment and subfaction scoping checks. The engine reads the reference
//! snapshot and never mutates it, so evaluating the same force twice gives
//! the same answer.

pub mod phases;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::matching::units::{subfaction_from_units, subfaction_matches};
use crate::matching::DetachmentIndex;
use crate::models::vocabulary::EXCLUDED_CORE_STRATAGEMS;
use crate::models::{ProcessingOptions, RosterForce, Stratagem, StratagemCategory};
use crate::reference::ReferenceData;

/// Why a rule was considered for a force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    UnitLinked,
    Independent,
    Core,
    Detachment,
}

/// A rule that applies to a force.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicable<'r> {
    pub rule: &'r Stratagem,
    pub bucket: Bucket,
    /// 1-based positions of the declared units the rule is linked to
    pub units: Vec<usize>,
    /// Canonical phases the rule is reported under
    pub phases: Vec<&'static str>,
}

/// Evaluates rules for forces of one roster.
pub struct EligibilityEngine<'a> {
    reference: &'a ReferenceData,
    detachments: &'a DetachmentIndex,
    options: &'a ProcessingOptions,
    ignored_phases: Vec<&'static str>,
}

impl<'a> EligibilityEngine<'a> {
    pub fn new(
        reference: &'a ReferenceData,
        detachments: &'a DetachmentIndex,
        options: &'a ProcessingOptions,
    ) -> Self {
        Self {
            reference,
            detachments,
            options,
            ignored_phases: options.ignored_phases(),
        }
    }

    /// The validity predicate.
    ///
    /// Blocklisted types never pass. A rule of the force's own army variant
    /// passes outright unless variants are suppressed; any other variant rule
    /// fails. Remaining rules pass if their phase is not ignored and their
    /// type is an allowlisted kind.
    pub fn is_valid(&self, rule: &Stratagem, army_of_renown: Option<&str>) -> bool {
        let category = rule.category();
        if category == StratagemCategory::Excluded {
            return false;
        }

        if !self.options.dont_show_renown {
            if let Some(variant) = army_of_renown.filter(|v| !v.is_empty()) {
                if rule.type_label().replace('\'', "").contains(variant) {
                    return true;
                }
            }
        }
        if matches!(category, StratagemCategory::ArmyOfRenown(_)) {
            return false;
        }

        let phase = rule.phase.trim();
        if self
            .ignored_phases
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(phase))
        {
            return false;
        }

        matches!(category, StratagemCategory::Playable(_))
    }

    /// Rules that apply to a force, in candidate order.
    pub fn evaluate(&self, force: &RosterForce) -> Vec<Applicable<'a>> {
        let candidates = self.candidates(force);
        let gathered = candidates.len();
        let subfaction = subfaction_from_units(&force.units);

        let applicable: Vec<Applicable<'a>> = candidates
            .into_iter()
            .filter(|c| self.options.show_core || !self.is_core(&c.rule.id))
            .filter(|c| self.is_valid(c.rule, force.army_of_renown.as_deref()))
            .filter(|c| self.in_detachment_scope(c, force))
            .filter(|c| self.in_subfaction_scope(c, subfaction))
            .map(|mut c| {
                c.phases = phases::normalize(&c.rule.phase).phases;
                c
            })
            .collect();

        debug!(
            catalogue = %force.catalogue_name,
            subfaction = ?subfaction,
            gathered,
            applicable = applicable.len(),
            "Evaluated force"
        );
        applicable
    }

    fn candidates(&self, force: &RosterForce) -> Vec<Applicable<'a>> {
        let mut set = CandidateSet::default();

        for (i, unit) in force.units.iter().enumerate() {
            for link in self.reference.links_for(&unit.id) {
                if let Some(rule) = self.reference.stratagem(&link.stratagem_id) {
                    set.add(rule, Bucket::UnitLinked, Some(i + 1));
                }
            }
        }

        if self.options.show_empty {
            if let Some(faction) = &force.faction {
                for rule in self.reference.stratagems() {
                    let scoped = rule.faction_id == faction.id
                        || rule.subfaction_id.as_deref() == Some(faction.id.as_str())
                        || faction.parent_id.as_deref() == Some(rule.faction_id.as_str());
                    if scoped && !self.reference.is_linked(&rule.id) {
                        set.add(rule, Bucket::Independent, None);
                    }
                }
            }
        }

        if self.options.show_core {
            for rule in self.reference.stratagems() {
                if rule.is_core()
                    && !EXCLUDED_CORE_STRATAGEMS.contains(&rule.name.as_str())
                    && !self.reference.is_linked(&rule.id)
                {
                    set.add(rule, Bucket::Core, None);
                }
            }
        }

        if let Some(detachment) = &force.detachment {
            for rule in self.reference.stratagems() {
                if rule.detachment.as_deref() == Some(detachment.as_str()) {
                    set.add(rule, Bucket::Detachment, None);
                }
            }
        }

        set.items
    }

    /// Core status from the current reference record, not the candidate copy.
    fn is_core(&self, id: &str) -> bool {
        self.reference
            .stratagem(id)
            .map(Stratagem::is_core)
            .unwrap_or(false)
    }

    fn in_detachment_scope(&self, candidate: &Applicable, force: &RosterForce) -> bool {
        let rule = candidate.rule;
        if candidate.bucket == Bucket::Detachment || !rule.is_detachment_scoped() {
            return true;
        }
        match &force.detachment {
            Some(detachment) => self.detachments.matches(
                detachment,
                rule.detachment.as_deref(),
                rule.detachment_id.as_deref(),
            ),
            None => false,
        }
    }

    fn in_subfaction_scope(&self, candidate: &Applicable, subfaction: Option<&str>) -> bool {
        if candidate.bucket != Bucket::UnitLinked {
            return true;
        }
        match &candidate.rule.subfaction_id {
            Some(id) => subfaction_matches(id, subfaction, self.reference),
            None => true,
        }
    }
}

/// Candidates in first-seen order, one entry per rule id.
#[derive(Default)]
struct CandidateSet<'r> {
    items: Vec<Applicable<'r>>,
    index: HashMap<&'r str, usize>,
}

impl<'r> CandidateSet<'r> {
    fn add(&mut self, rule: &'r Stratagem, bucket: Bucket, unit: Option<usize>) {
        let idx = match self.index.get(rule.id.as_str()) {
            Some(&idx) => idx,
            None => {
                self.index.insert(rule.id.as_str(), self.items.len());
                self.items.push(Applicable {
                    rule,
                    bucket,
                    units: Vec::new(),
                    phases: Vec::new(),
                });
                self.items.len() - 1
            }
        };
        if let Some(unit) = unit {
            let units = &mut self.items[idx].units;
            if !units.contains(&unit) {
                units.push(unit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Reconciler;
    use crate::testing;
    use pretty_assertions::assert_eq;

    fn ids(options: &ProcessingOptions, renown: Option<&str>) -> Vec<String> {
        let reference = testing::reference();
        let reconciler = Reconciler::new(&reference);
        let mut force = reconciler.resolve_force(&testing::gladius_force());
        force.army_of_renown = renown.map(str::to_string);
        let engine = EligibilityEngine::new(&reference, reconciler.detachments(), options);
        engine
            .evaluate(&force)
            .iter()
            .map(|a| a.rule.id.clone())
            .collect()
    }

    fn all_on() -> ProcessingOptions {
        ProcessingOptions {
            show_units: true,
            show_phases: true,
            show_empty: true,
            show_core: true,
            dont_show_renown: false,
            dont_show_before: false,
        }
    }

    #[test]
    fn test_default_options() {
        let got = ids(&ProcessingOptions::default(), None);
        assert_eq!(
            got,
            vec!["000000001", "000000002", "000000015", "000000012", "000000005"]
        );
    }

    #[test]
    fn test_linked_units_are_recorded() {
        let reference = testing::reference();
        let reconciler = Reconciler::new(&reference);
        let force = reconciler.resolve_force(&testing::gladius_force());
        let options = ProcessingOptions::default();
        let engine = EligibilityEngine::new(&reference, reconciler.detachments(), &options);

        let applicable = engine.evaluate(&force);
        let first = &applicable[0];
        assert_eq!(first.rule.id, "000000001");
        assert_eq!(first.bucket, Bucket::UnitLinked);
        assert_eq!(first.units, vec![1, 2]);
        assert_eq!(first.phases, vec!["Shooting phase"]);

        let detachment = applicable.last().unwrap();
        assert_eq!(detachment.bucket, Bucket::Detachment);
        assert!(detachment.units.is_empty());
    }

    #[test]
    fn test_detachment_scoping_ignores_flags() {
        for options in [ProcessingOptions::default(), all_on()] {
            let got = ids(&options, None);
            assert!(got.contains(&"000000005".to_string()));
            assert!(!got.contains(&"000000004".to_string()));
        }
    }

    #[test]
    fn test_independent_rules_need_show_empty() {
        let without = ids(&ProcessingOptions::default(), None);
        assert!(!without.contains(&"000000003".to_string()));

        let options = ProcessingOptions {
            show_empty: true,
            ..Default::default()
        };
        let with = ids(&options, None);
        assert!(with.contains(&"000000003".to_string()));
        // Another faction's unlinked rule stays out.
        assert!(!with.contains(&"000000014".to_string()));
    }

    #[test]
    fn test_core_toggle() {
        let reference = testing::reference();
        let without = ids(&ProcessingOptions::default(), None);
        assert!(without
            .iter()
            .all(|id| !reference.stratagem(id).unwrap().is_core()));

        let options = ProcessingOptions {
            show_core: true,
            ..Default::default()
        };
        let with = ids(&options, None);
        assert!(with.contains(&"000000006".to_string()));
        assert!(with.contains(&"000000008".to_string()));
        assert!(!with.contains(&"000000007".to_string()));
    }

    #[test]
    fn test_subfaction_scoping() {
        let got = ids(&ProcessingOptions::default(), None);
        // Ultramarines rule kept, White Scars rule dropped.
        assert!(got.contains(&"000000002".to_string()));
        assert!(!got.contains(&"000000013".to_string()));
    }

    #[test]
    fn test_army_of_renown() {
        let none = ids(&ProcessingOptions::default(), None);
        assert!(!none.contains(&"000000009".to_string()));

        let chosen = ids(&ProcessingOptions::default(), Some("Vanguard Spearhead"));
        assert!(chosen.contains(&"000000009".to_string()));

        let other = ids(&ProcessingOptions::default(), Some("Freeblade Lance"));
        assert!(!other.contains(&"000000009".to_string()));

        let options = ProcessingOptions {
            dont_show_renown: true,
            ..Default::default()
        };
        let suppressed = ids(&options, Some("Vanguard Spearhead"));
        assert!(!suppressed.contains(&"000000009".to_string()));
    }

    #[test]
    fn test_dont_show_before() {
        let options = ProcessingOptions {
            dont_show_before: true,
            ..Default::default()
        };
        let got = ids(&options, None);
        assert!(!got.contains(&"000000012".to_string()));
    }

    #[test]
    fn test_is_valid_rejects_blocklist_and_generic() {
        let reference = testing::reference();
        let detachments = DetachmentIndex::default();
        let options = ProcessingOptions::default();
        let engine = EligibilityEngine::new(&reference, &detachments, &options);

        let excluded = reference.stratagem("000000010").unwrap();
        assert!(!engine.is_valid(excluded, None));
        let generic = reference.stratagem("000000011").unwrap();
        assert!(!engine.is_valid(generic, None));
        let playable = reference.stratagem("000000003").unwrap();
        assert!(engine.is_valid(playable, None));
    }

    #[test]
    fn test_renown_variant_with_apostrophe() {
        let reference = testing::reference();
        let detachments = DetachmentIndex::default();
        let options = ProcessingOptions::default();
        let engine = EligibilityEngine::new(&reference, &detachments, &options);

        let rule = Stratagem::new("900", "BELAKOR'S GIFT", "Disciples of Be'lakor – Strategic Ploy Stratagem")
            .unwrap()
            .with_phase("Shooting phase");
        assert!(!engine.is_valid(&rule, None));
        assert!(engine.is_valid(&rule, Some("Disciples of Belakor")));
    }

    #[test]
    fn test_core_bucket_skips_unit_linked_rules() {
        use crate::models::{Datasheet, Faction, UnitStratagemLink};

        let linked = Stratagem::new("901", "LINKED CORE", "Core – Battle Tactic Stratagem")
            .unwrap()
            .with_phase("Fight phase");
        let unlinked = Stratagem::new("902", "FREE CORE", "Core – Battle Tactic Stratagem")
            .unwrap()
            .with_phase("Fight phase");
        let reference = ReferenceData::new(
            vec![Faction::new("SM", "Space Marines").unwrap()],
            vec![Datasheet::new("D1", "Captain", "SM").unwrap()],
            vec![linked, unlinked],
            vec![UnitStratagemLink::new("D1", "901")],
            Vec::new(),
        );
        let force = RosterForce {
            catalogue_name: "Imperium - Space Marines".into(),
            faction: reference.faction("SM").cloned(),
            detachment: None,
            army_of_renown: None,
            units: Vec::new(),
            selections: Vec::new(),
        };
        let detachments = DetachmentIndex::default();
        let options = ProcessingOptions {
            show_core: true,
            ..Default::default()
        };
        let engine = EligibilityEngine::new(&reference, &detachments, &options);

        let got: Vec<_> = engine
            .evaluate(&force)
            .iter()
            .map(|a| (a.rule.id.clone(), a.bucket))
            .collect();
        assert_eq!(got, vec![("902".to_string(), Bucket::Core)]);
    }

    #[test]
    fn test_force_without_faction_gets_detachment_rules_only() {
        let reference = testing::reference();
        let reconciler = Reconciler::new(&reference);
        let mut force = reconciler.resolve_force(&testing::gladius_force());
        force.faction = None;
        force.units.clear();
        let options = all_on();
        let engine = EligibilityEngine::new(&reference, reconciler.detachments(), &options);

        let got: Vec<_> = engine
            .evaluate(&force)
            .iter()
            .map(|a| a.bucket)
            .collect();
        assert!(got.iter().all(|b| matches!(b, Bucket::Core | Bucket::Detachment)));
        assert!(got.contains(&Bucket::Detachment));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let options = all_on();
        assert_eq!(ids(&options, None), ids(&options, None));
    }
}
