//! Phase normalization and ordering.
//!
//! Published phase strings may name several phases joined by " or "
//! ("Shooting or Fight phase"). Only segments that are canonical phases
//! as written survive, so that string files the rule under "Fight phase".

use crate::models::vocabulary::PHASES;

/// Result of normalizing one raw phase string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPhase {
    /// Canonical phases, in the order the segments appear.
    pub phases: Vec<&'static str>,
    /// Segments that match no canonical phase.
    pub unknown: Vec<String>,
}

impl NormalizedPhase {
    pub fn is_clean(&self) -> bool {
        self.unknown.is_empty() && !self.phases.is_empty()
    }
}

/// Look up a canonical phase by exact name.
pub fn canonical(name: &str) -> Option<&'static str> {
    PHASES.iter().copied().find(|p| *p == name)
}

/// Position of a canonical phase in game order.
pub fn rank(phase: &str) -> usize {
    PHASES
        .iter()
        .position(|p| *p == phase)
        .unwrap_or(PHASES.len())
}

/// Split a raw phase string into canonical phases.
///
/// Only " or " segments that are themselves canonical phases are kept, so
/// "Shooting or Fight phase" yields just "Fight phase". Dropped segments are
/// returned in `unknown`.
pub fn normalize(raw: &str) -> NormalizedPhase {
    let raw = raw.trim();
    let mut out = NormalizedPhase::default();
    if raw.is_empty() {
        out.unknown.push(String::new());
        return out;
    }

    for segment in raw.split(" or ").map(str::trim) {
        match canonical(segment) {
            Some(phase) if !out.phases.contains(&phase) => out.phases.push(phase),
            Some(_) => {}
            None => out.unknown.push(segment.to_string()),
        }
    }
    out
}

/// Initial letter of every word, e.g. "Fight phase" -> "Fp".
pub fn initials(phase: &str) -> String {
    phase
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .collect()
}
