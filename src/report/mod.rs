//! Result organizer: turns per-force applicable rules into the report.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::engine::{phases, Applicable};
use crate::models::{Grouping, ProcessingOptions, ProcessingResult, ReportStratagem, RosterForce};

/// Phase and unit views for one force.
pub fn organize_force(force: &RosterForce, applicable: &[Applicable], options: &ProcessingOptions) -> (Grouping, Grouping) {
    let mut by_phase = Grouping::new();
    for item in applicable {
        let name = if options.show_units {
            let tags: String = item.units.iter().map(|n| format!("[{n}]")).collect();
            format!("{}{tags}", item.rule.name)
        } else {
            item.rule.name.clone()
        };
        for phase in &item.phases {
            by_phase.push(phase, &name);
        }
    }
    by_phase.sort_by_key(phases::rank);

    let unit_key = |position: usize, name: &str| {
        if options.show_units {
            format!("[{position}] {name}")
        } else {
            name.to_string()
        }
    };

    let mut by_unit = Grouping::new();
    for (i, unit) in force.units.iter().enumerate() {
        by_unit.ensure(&unit_key(i + 1, &unit.name));
    }
    for item in applicable {
        let name = if options.show_phases {
            format!("{} [{}]", item.rule.name, phases::initials(&item.rule.phase))
        } else {
            item.rule.name.clone()
        };
        for &position in &item.units {
            if let Some(unit) = force.units.get(position - 1) {
                by_unit.push(&unit_key(position, &unit.name), &name);
            }
        }
    }

    (by_phase, by_unit)
}

/// Build the report for every force of a roster.
///
/// `forces` pairs each resolved force with its applicable rules, in roster
/// order. The flat rule list holds each rule once, sorted by id.
pub fn organize(forces: &[(RosterForce, Vec<Applicable>)], options: &ProcessingOptions) -> ProcessingResult {
    let mut result = ProcessingResult::default();
    let mut rules: BTreeMap<&str, ReportStratagem> = BTreeMap::new();

    for (force, applicable) in forces {
        let (by_phase, by_unit) = organize_force(force, applicable, options);
        result.phases.push(by_phase);
        result.units.push(by_unit);

        for item in applicable {
            rules.entry(item.rule.id.as_str()).or_insert_with(|| {
                let mut report = ReportStratagem::from(item.rule);
                report.description = clean_description(&report.description);
                report
            });
        }
    }

    result.all_rules = rules.into_values().collect();
    result
}

/// Drop link and span wrapper tags, keeping their text.
pub fn clean_description(text: &str) -> String {
    static MARKUP: OnceLock<Option<Regex>> = OnceLock::new();
    match MARKUP.get_or_init(|| Regex::new(r"(?i)</?(a|span)\b[^>]*>").ok()) {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EligibilityEngine;
    use crate::matching::Reconciler;
    use crate::testing;
    use pretty_assertions::assert_eq;

    fn run(options: &ProcessingOptions) -> ProcessingResult {
        let reference = testing::reference();
        let reconciler = Reconciler::new(&reference);
        let engine = EligibilityEngine::new(&reference, reconciler.detachments(), options);
        let force = reconciler.resolve_force(&testing::gladius_force());
        let applicable = engine.evaluate(&force);
        organize(&[(force, applicable)], options)
    }

    #[test]
    fn test_phase_view_is_sorted() {
        let result = run(&ProcessingOptions::default());
        assert_eq!(result.force_count(), 1);
        let phases: Vec<_> = result.phases[0].keys().collect();
        assert_eq!(
            phases,
            vec!["Before battle", "Any phase", "Command phase", "Shooting phase"]
        );
        assert_eq!(
            result.phases[0].get("Shooting phase"),
            Some(&["FIRE DISCIPLINE".to_string(), "STORM OF FIRE".to_string()][..])
        );
    }

    #[test]
    fn test_every_unit_has_a_key() {
        let result = run(&ProcessingOptions::default());
        let units = &result.units[0];
        assert_eq!(
            units.keys().collect::<Vec<_>>(),
            vec!["Captain", "Intercessor Squad", "Redemptor Dreadnought", "Kor'sarro Khan"]
        );
        assert_eq!(units.get("Kor'sarro Khan"), Some(&[][..]));
        assert_eq!(
            units.get("Captain"),
            Some(&["FIRE DISCIPLINE".to_string(), "HONOURED BY MACRAGGE".to_string()][..])
        );
    }

    #[test]
    fn test_show_units_tags() {
        let options = ProcessingOptions {
            show_units: true,
            ..Default::default()
        };
        let result = run(&options);
        assert!(result.units[0].contains("[1] Captain"));
        assert!(result.units[0].contains("[4] Kor'sarro Khan"));
        assert_eq!(
            result.phases[0].get("Shooting phase"),
            Some(&["FIRE DISCIPLINE[1][2]".to_string(), "STORM OF FIRE".to_string()][..])
        );
    }

    #[test]
    fn test_show_phases_tags() {
        let options = ProcessingOptions {
            show_phases: true,
            ..Default::default()
        };
        let result = run(&options);
        assert_eq!(
            result.units[0].get("Redemptor Dreadnought"),
            Some(&["DUTY AND HONOUR [Bb]".to_string()][..])
        );
    }

    #[test]
    fn test_disjunctive_phase_keeps_canonical_segment() {
        let options = ProcessingOptions {
            show_empty: true,
            ..Default::default()
        };
        let result = run(&options);
        let phases = &result.phases[0];
        let armour = "ARMOUR OF CONTEMPT".to_string();
        assert!(phases.get("Fight phase").unwrap().contains(&armour));
        assert!(!phases
            .get("Shooting phase")
            .is_some_and(|names| names.contains(&armour)));
    }

    #[test]
    fn test_all_rules_sorted_and_unique() {
        let reference = testing::reference();
        let reconciler = Reconciler::new(&reference);
        let options = ProcessingOptions::default();
        let engine = EligibilityEngine::new(&reference, reconciler.detachments(), &options);
        let force = reconciler.resolve_force(&testing::gladius_force());
        let applicable = engine.evaluate(&force);
        let result = organize(
            &[(force.clone(), applicable.clone()), (force, applicable)],
            &options,
        );

        let ids: Vec<_> = result.all_rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["000000001", "000000002", "000000005", "000000012", "000000015"]
        );
        assert_eq!(result.phases.len(), 2);
        assert_eq!(result.units.len(), 2);
    }

    #[test]
    fn test_description_markup_is_stripped() {
        let result = run(&ProcessingOptions::default());
        let rule = result
            .all_rules
            .iter()
            .find(|r| r.id == "000000001")
            .unwrap();
        assert_eq!(
            rule.description,
            "Until the end of the phase, ADEPTUS ASTARTES units re-roll hits."
        );
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(
            clean_description(r#"<span class="kwb">ORKS</span> and <a href="/x">this</a><b>kept</b>"#),
            "ORKS and this<b>kept</b>"
        );
    }

    #[test]
    fn test_organize_is_idempotent() {
        let options = ProcessingOptions {
            show_units: true,
            show_empty: true,
            show_core: true,
            ..Default::default()
        };
        assert_eq!(run(&options), run(&options));
    }
}
