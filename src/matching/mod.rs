//! Name reconciliation: roster labels to reference records.
//!
//! Misses are not errors. A force whose faction cannot be resolved still
//! yields a [`RosterForce`], with no faction and no units.

pub mod aliases;
pub mod detachment;
pub mod faction;
pub mod units;

pub use detachment::DetachmentIndex;
pub use faction::{FactionMatcher, LayeredFactionMatcher};
pub use units::{compare_unit_names, subfaction_from_units};

use tracing::{info, warn};

use crate::models::{Force, Roster, RosterForce};
use crate::reference::ReferenceData;

/// Resolves roster forces against one reference snapshot.
pub struct Reconciler<'a> {
    reference: &'a ReferenceData,
    detachments: DetachmentIndex,
    matcher: Box<dyn FactionMatcher>,
}

impl<'a> Reconciler<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self {
            reference,
            detachments: DetachmentIndex::new(reference.detachment_abilities()),
            matcher: Box::new(LayeredFactionMatcher::default()),
        }
    }

    /// Builder method to swap the faction matching strategy.
    pub fn with_faction_matcher(mut self, matcher: Box<dyn FactionMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn detachments(&self) -> &DetachmentIndex {
        &self.detachments
    }

    pub fn resolve_roster(&self, roster: &Roster) -> Vec<RosterForce> {
        roster.forces.iter().map(|f| self.resolve_force(f)).collect()
    }

    pub fn resolve_force(&self, force: &Force) -> RosterForce {
        let faction = self
            .matcher
            .resolve(force, self.reference.factions())
            .cloned();
        match &faction {
            Some(f) => info!(
                catalogue = %force.catalogue_name,
                faction = %f.name,
                matcher = self.matcher.name(),
                "Detected faction"
            ),
            None => warn!(catalogue = %force.catalogue_name, "Could not determine faction"),
        }

        let detachment = self.detachments.resolve(force);
        match &detachment {
            Some(d) => info!(catalogue = %force.catalogue_name, detachment = %d, "Detected detachment"),
            None => warn!(catalogue = %force.catalogue_name, "Could not determine detachment"),
        }

        let army_of_renown = force.army_of_renown();
        if let Some(variant) = &army_of_renown {
            info!(catalogue = %force.catalogue_name, variant = %variant, "Detected army of renown");
        }

        let units = units::resolve_units(force, faction.as_ref(), self.reference);
        info!(
            catalogue = %force.catalogue_name,
            declared = force.unit_candidates().count(),
            matched = units.len(),
            "Matched roster units"
        );

        RosterForce {
            catalogue_name: force.catalogue_name.clone(),
            faction,
            detachment,
            army_of_renown,
            units,
            selections: force.selections.clone(),
        }
    }
}
