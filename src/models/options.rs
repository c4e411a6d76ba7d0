//! User-selected report options.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::vocabulary::PHASE_BEFORE_BATTLE;

const VALUE_ON: &str = "on";

/// Report flags. Immutable per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Index-prefix unit names and tag phase entries with unit indices
    #[serde(default)]
    pub show_units: bool,
    /// Tag unit-view entries with phase initials
    #[serde(default)]
    pub show_phases: bool,
    /// Include faction-wide rules with no unit linkage
    #[serde(default)]
    pub show_empty: bool,
    #[serde(default)]
    pub show_core: bool,
    /// Never report army-of-renown rules
    #[serde(default)]
    pub dont_show_renown: bool,
    #[serde(default)]
    pub dont_show_before: bool,
}

impl ProcessingOptions {
    /// Build from a form-like mapping where only the value "on" enables a flag.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let on = |key: &str| form.get(key).map(|v| v == VALUE_ON).unwrap_or(false);
        Self {
            show_units: on("show_units"),
            show_phases: on("show_phases"),
            show_empty: on("show_empty"),
            show_core: on("show_core"),
            dont_show_renown: on("dont_show_renown"),
            dont_show_before: on("dont_show_before"),
        }
    }

    /// Phases whose rules are dropped entirely.
    pub fn ignored_phases(&self) -> Vec<&'static str> {
        if self.dont_show_before {
            vec![PHASE_BEFORE_BATTLE]
        } else {
            Vec::new()
        }
    }
}
