//! Static rename tables for roster names the reference dataset spells
//! differently.
//!
//! Keys are compared after stripping apostrophes, collapsing whitespace and
//! lowercasing, so "T'au" and "Tau" are the same alias. Each alias must map
//! to exactly one canonical name; a table built with a conflicting second
//! mapping keeps the first and records the conflict.

use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{table}: alias '{alias}' maps to both '{first}' and '{second}'")]
pub struct AliasConflict {
    pub table: &'static str,
    pub alias: &'static str,
    pub first: &'static str,
    pub second: &'static str,
}

#[derive(Debug, Clone)]
struct AliasEntry {
    alias: &'static str,
    canonical: &'static str,
}

/// Alias → canonical name lookup.
#[derive(Debug, Clone)]
pub struct AliasTable {
    name: &'static str,
    entries: Vec<AliasEntry>,
    index: HashMap<String, usize>,
    conflicts: Vec<AliasConflict>,
}

impl AliasTable {
    pub fn new(name: &'static str, pairs: &[(&'static str, &'static str)]) -> Self {
        let mut table = Self {
            name,
            entries: Vec::with_capacity(pairs.len()),
            index: HashMap::with_capacity(pairs.len()),
            conflicts: Vec::new(),
        };
        for &(alias, canonical) in pairs {
            let key = alias_key(alias);
            match table.index.get(&key) {
                Some(&i) => {
                    let first = table.entries[i].canonical;
                    if first != canonical {
                        tracing::warn!(table = name, alias, first, second = canonical, "Conflicting alias");
                        table.conflicts.push(AliasConflict {
                            table: name,
                            alias,
                            first,
                            second: canonical,
                        });
                    }
                }
                None => {
                    table.index.insert(key, table.entries.len());
                    table.entries.push(AliasEntry { alias, canonical });
                }
            }
        }
        table
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Canonical name for an alias.
    pub fn lookup(&self, name: &str) -> Option<&'static str> {
        self.entry(name).map(|e| e.canonical)
    }

    /// Canonical name for an alias spelled exactly as in the table.
    pub fn lookup_exact(&self, name: &str) -> Option<&'static str> {
        self.entry(name)
            .filter(|e| e.alias == name)
            .map(|e| e.canonical)
    }

    /// The alias as written in the table, e.g. "Ultramarines" for "ULTRAMARINES".
    pub fn find_alias(&self, name: &str) -> Option<&'static str> {
        self.entry(name).map(|e| e.alias)
    }

    /// Fails on the first alias that was declared with two canonical names.
    pub fn validate(&self) -> Result<(), AliasConflict> {
        match self.conflicts.first() {
            Some(conflict) => Err(conflict.clone()),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&AliasEntry> {
        self.index.get(&alias_key(name)).map(|&i| &self.entries[i])
    }
}

/// Comparison key: apostrophes stripped, whitespace collapsed, lowercase.
pub fn alias_key(name: &str) -> String {
    name.replace('\'', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Roster unit names → datasheet names.
pub fn units() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new("units", UNIT_ALIASES))
}

/// Subfaction and catalogue names → faction names.
pub fn subfactions() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new("subfactions", SUBFACTION_ALIASES))
}

const UNIT_ALIASES: &[(&str, &str)] = &[
    // Knights
    ("War Dog Brigand Squadron", "War Dog Brigand"),
    ("War Dog Executioner Squadron", "War Dog Executioner"),
    ("War Dog Huntsman Squadron", "War Dog Huntsman"),
    ("War Dog Karnivore Squadron", "War Dog Karnivore"),
    ("War Dog Stalker Squadron", "War Dog Stalker"),
    ("Armiger Helverins", "Armiger Helverin"),
    ("Armiger Warglaives", "Armiger Warglaive"),
    ("Knight Moiraxes", "Knight Moirax"),
    // Votann: the reference tables lose accented characters
    ("K\u{e2}hl", "Khl"),
    ("K\u{c3}\u{a2}hl", "Khl"),
    ("Br\u{f4}khyr Thunderkyn w/ bolt cannons", "Brkhyr Thunderkyn"),
    ("Br\u{f4}khyr Thunderkyn w/ graviton blast cannons", "Brkhyr Thunderkyn"),
    ("Br\u{f4}khyr Thunderkyn w/ SP conversion beamers", "Brkhyr Thunderkyn"),
    ("Br\u{c3}\u{b4}khyr Thunderkyn w/ bolt cannons", "Brkhyr Thunderkyn"),
    ("Br\u{c3}\u{b4}khyr Thunderkyn w/ graviton blast cannons", "Brkhyr Thunderkyn"),
    ("Br\u{c3}\u{b4}khyr Thunderkyn w/ SP conversion beamers", "Brkhyr Thunderkyn"),
    ("Hearthguard w/ disintegrators and plasma blade gauntlets", "Einhyr Hearthguard"),
    ("Hearthguard w/ disintegrators and concussion gauntlets", "Einhyr Hearthguard"),
    ("Hearthguard w/ plasma guns and concussion gauntlets", "Einhyr Hearthguard"),
    ("Hearthguard w/ plasma guns and plasma blade gauntlets", "Einhyr Hearthguard"),
    ("Cthonian Beserks w/ heavy plasma axes", "Cthonian Beserks"),
    ("Cthonian Beserks w/ concussion mauls", "Cthonian Beserks"),
    ("Hearthkyn Warriors w/ ion blasters", "Hearthkyn Warriors"),
    ("Hearthkyn Warriors w/ bolters", "Hearthkyn Warriors"),
    ("\u{db}thar the Destined", "thar the Destined"),
    ("\u{c3}\u{203a}thar the Destined", "thar the Destined"),
    ("Br\u{f4}khyr Iron-master", "Brkhyr Iron-master"),
    ("Br\u{c3}\u{b4}khyr Iron-master", "Brkhyr Iron-master"),
    // Space Marines
    ("Chapter Master", "Captain"),
    ("Chapter Master in Phobos Armour", "Captain in Phobos Armour"),
    ("Chapter Master in Terminator Armour", "Captain in Terminator Armour"),
    ("Chapter Master on Bike", "Captain on Bike"),
    (
        "Chapter Master with Master-crafted Heavy Bolt Rifle",
        "Captain with Master-crafted Heavy Bolt Rifle",
    ),
    ("Primaris Chapter Master", "Primaris Captain"),
    ("Chapter Master in Gravis Armour", "Captain in Gravis Armour"),
];

const SUBFACTION_ALIASES: &[(&str, &str)] = &[
    // Adepta Sororitas
    ("Order: Our Martyred Lady", "Order of Our Martyred Lady"),
    ("Order: Argent Shroud", "Order of the Argent Shroud"),
    ("Order: Bloody Rose", "Order of the Bloody Rose"),
    ("Order: Ebon Chalice", "Order of the Ebon Chalice"),
    ("Order: Sacred Rose", "Order of the Sacred Rose"),
    ("Order: Valorous Heart", "Order of the Valorous Heart"),
    // Astra Militarum
    ("Death Korps of Krieg", "Astra Militarum"),
    ("Catachan", "Astra Militarum"),
    ("Cadian", "Astra Militarum"),
    ("Tallarn", "Astra Militarum"),
    ("Vostroyan", "Astra Militarum"),
    ("Mordian", "Astra Militarum"),
    ("Armageddon", "Astra Militarum"),
    // Space Marines
    ("Dark Angels", "Space Marines"),
    ("Blood Angels", "Space Marines"),
    ("Space Wolves", "Space Marines"),
    ("Ultramarines", "Space Marines"),
    ("Salamanders", "Space Marines"),
    ("Raven Guard", "Space Marines"),
    ("White Scars", "Space Marines"),
    ("Iron Hands", "Space Marines"),
    ("Imperial Fists", "Space Marines"),
    ("Black Templars", "Space Marines"),
    ("Crimson Fists", "Space Marines"),
    ("Deathwatch", "Space Marines"),
    // Chaos Space Marines
    ("Alpha Legion", "Chaos Space Marines"),
    ("Black Legion", "Chaos Space Marines"),
    ("Iron Warriors", "Chaos Space Marines"),
    ("Night Lords", "Chaos Space Marines"),
    ("Word Bearers", "Chaos Space Marines"),
    ("Red Corsairs", "Chaos Space Marines"),
    // Factions that are their own parent
    ("World Eaters", "World Eaters"),
    ("Emperor's Children", "Emperors Children"),
    ("Death Guard", "Death Guard"),
    ("Thousand Sons", "Thousand Sons"),
    ("Genestealer Cults", "Genestealer Cults"),
    ("Adeptus Mechanicus", "Adeptus Mechanicus"),
    ("Adeptus Custodes", "Adeptus Custodes"),
    ("Imperial Knights", "Imperial Knights"),
    ("Chaos Knights", "Chaos Knights"),
    ("T'au Empire", "Tau Empire"),
    ("T'au", "Tau Empire"),
    ("Leagues of Votann", "Leagues of Votann"),
    ("Tyranids", "Tyranids"),
    ("Necrons", "Necrons"),
    ("Orks", "Orks"),
    ("Drukhari", "Drukhari"),
    ("Aeldari", "Aeldari"),
    ("Harlequins", "Aeldari"),
    ("Ynnari", "Aeldari"),
    ("Grey Knights", "Grey Knights"),
    // Craftworlds
    ("Biel-Tan", "Aeldari"),
    ("Ulthw\u{e9}", "Aeldari"),
    ("Saim-Hann", "Aeldari"),
    ("Alaitoc", "Aeldari"),
    // Drukhari
    ("Kabal of the Black Heart", "Drukhari"),
    ("Wych Cult of Strife", "Drukhari"),
    ("Haemonculus Coven", "Drukhari"),
    // T'au
    ("T'au Sept", "Tau Empire"),
    ("Farsight Enclaves", "Tau Empire"),
    // Necrons
    ("Sautekh Dynasty", "Necrons"),
    ("Mephrit Dynasty", "Necrons"),
    // Orks
    ("Goffs", "Orks"),
    ("Evil Sunz", "Orks"),
    ("Bad Moons", "Orks"),
    // Tyranids
    ("Hive Fleet Leviathan", "Tyranids"),
    ("Hive Fleet Behemoth", "Tyranids"),
    ("Hive Fleet Kraken", "Tyranids"),
    // Agents and allies
    ("Inquisition", "Imperial Agents"),
    ("Officio Assassinorum", "Imperial Agents"),
    ("Agents of the Imperium", "Imperial Agents"),
    ("Unaligned", "Unaligned Forces"),
    ("Adeptus Titanicus", "Adeptus Titanicus"),
];
