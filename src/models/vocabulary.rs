//! Fixed game vocabulary: stratagem type labels, army-of-renown names,
//! roster selection labels and the canonical phase order.

/// Selection labels that hold a subfaction choice as their child.
pub const SUBFACTION_TYPES: &[&str] = &[
    "Order Convictions",
    "Forge World Choice",
    "Brotherhood",
    "Noble Household",
    "Chapter",
    "Chaos Allegiance",
    "Dread Household",
    "Legion",
    "Plague Company",
    "Cult of the Legion",
    "Craftworld Selection",
    "Kabal",
    "Wych Cult",
    "Haemonculus Coven",
    "Cult Creed",
    "League",
    "Dynasty Choice",
    "Clan Kultur",
    "Sept Choice",
    "Hive Fleet",
];

/// Top-level selections that are configuration, not units.
pub const NON_UNIT_SELECTIONS: &[&str] = &[
    "**Chapter Selector**",
    "Game Type",
    "Detachment Command Cost",
    "Battle Size",
    "Arks of Omen Compulsory Type",
    "Detachment",
    "Show/Hide Options",
];

/// Type fragments of playable stratagems.
pub const VALID_STRATAGEM_TYPES: &[&str] = &[
    "Battle Tactic Stratagem",
    "Strategic Ploy Stratagem",
    "Epic Deed Stratagem",
    "Requisition Stratagem",
    "Wargear Stratagem",
    "Core Stratagem",
];

/// Type fragments of edition/format variants this tool does not model.
pub const INVALID_STRATAGEM_TYPES: &[&str] = &[
    "(Supplement)",
    "Crusher Stampede",
    "Crusade",
    "Fallen Angels",
    "Boarding Actions",
];

/// Known special army variants ("armies of renown").
pub const ARMY_OF_RENOWN: &[&str] = &[
    "Kill Team Strike Force",
    "Vanguard Spearhead",
    "Mechanicus Defence Cohort",
    "Skitarii Veteran Cohort",
    "Freeblade Lance",
    "Disciples of Belakor",
    "Terminus Est Assault Force",
    "Warpmeld Pact",
    "Coteries of the Haemonculi",
    "Cult of the Cryptek",
    "Annihilation Legion",
    "Speed Freeks Speed Mob",
    "Cogs of Vashtorr",
];

/// Roster selection label for a special army variant.
pub const ARMY_OF_RENOWN_LABEL: &str = "Army of Renown";

/// Phase dropped when the user excludes before-battle rules.
pub const PHASE_BEFORE_BATTLE: &str = "Before battle";

/// Core stratagems that the reference data lists but never apply.
pub const EXCLUDED_CORE_STRATAGEMS: &[&str] = &["NEW ORDERS"];

/// Canonical phases in game order.
pub const PHASES: &[&str] = &[
    "Any time",
    "Before battle",
    "During deployment",
    "At the start of battle round",
    "Any phase",
    "Any of your phases",
    "At the start of your turn",
    "At the start of enemy turn",
    "Start of any phase",
    "Command phase",
    "Start of the Command phase",
    "End of the Command phase",
    "Enemy Command phase",
    "Movement phase",
    "Enemy Movement phase",
    "Psychic phase",
    "Enemy Psychic phase",
    "Shooting phase",
    "Enemy Shooting phase",
    "Shooting or Fight phase",
    "Being targeted",
    "Charge phase",
    "Start of the Charge phase",
    "Enemy Charge phase",
    "Fight phase",
    "Start of the Fight phase",
    "Enemy Fight phase",
    "Morale phase",
    "Enemy Morale phase",
    "Taking casualties",
    "Enemy taking casualties",
    "End of your turn",
    "End of enemy turn",
    "End of the turn",
    "End of the phase",
    "End of the battle round",
    "End of the Battle",
    "After enemy unit ends Normal, Advance or Fall Back move",
    "End of any phase",
];
