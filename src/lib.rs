//! # Stratascribe
//!
//! Turns a Warhammer 40k army roster into a report of the stratagems that
//! army can use, grouped by game phase and by unit.
//!
//! ## Architecture
//!
//! - **models**: Reference entities, roster tree, options and report payload
//! - **reference**: Pipe-delimited table loading and the indexed snapshot
//! - **fetch**: Dataset downloads with bounded retry
//! - **storage**: Dataset cache with refresh policy, upload retention
//! - **roster**: `.ros`/`.rosz` parsing
//! - **matching**: Faction, detachment and unit name reconciliation
//! - **engine**: Stratagem eligibility and phase normalization
//! - **report**: Phase and unit views of the eligible rules
//! - **service**: The report boundary shared by the CLI and the API
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod matching;
pub mod models;
pub mod reference;
pub mod report;
pub mod roster;
pub mod service;
pub mod storage;

#[cfg(test)]
mod testing;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}
