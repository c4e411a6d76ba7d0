//! Pipe-delimited reference table loading.
//!
//! Tables have a header row and no quoting. Bytes outside ASCII are dropped
//! before parsing. Rows that fail to deserialize, or that violate a model
//! invariant, are skipped with a warning.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ReferenceData, ReferenceError};
use crate::models::{Datasheet, DetachmentAbility, Faction, Stratagem, UnitStratagemLink};

pub const FACTIONS: &str = "Factions.csv";
pub const DATASHEETS: &str = "Datasheets.csv";
pub const STRATAGEMS: &str = "Stratagems.csv";
pub const DATASHEET_STRATAGEMS: &str = "Datasheets_stratagems.csv";
pub const DETACHMENT_ABILITIES: &str = "Detachment_abilities.csv";
pub const LAST_UPDATE: &str = "Last_update.csv";

/// The tables a snapshot is built from.
pub const TABLES: [&str; 5] = [
    FACTIONS,
    DATASHEETS,
    STRATAGEMS,
    DATASHEET_STRATAGEMS,
    DETACHMENT_ABILITIES,
];

#[derive(Debug, Deserialize)]
struct FactionRow {
    id: String,
    name: String,
    #[serde(default)]
    parent_id: String,
}

#[derive(Debug, Deserialize)]
struct DatasheetRow {
    id: String,
    name: String,
    #[serde(default)]
    faction_id: String,
}

#[derive(Debug, Deserialize)]
struct StratagemRow {
    id: String,
    name: String,
    #[serde(default)]
    faction_id: String,
    #[serde(rename = "type", default)]
    stratagem_type: String,
    #[serde(default)]
    cp_cost: String,
    #[serde(default)]
    legend: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    phase: String,
    #[serde(default)]
    detachment: String,
    #[serde(default)]
    detachment_id: String,
    #[serde(default)]
    subfaction_id: String,
    #[serde(default)]
    source_id: String,
}

#[derive(Debug, Deserialize)]
struct LastUpdateRow {
    last_update: String,
}

/// Drop every non-ASCII byte.
pub fn ascii_only(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().copied().filter(u8::is_ascii).collect()
}

/// Deserialize every well-formed row of a table.
///
/// Only an unreadable header fails the whole table.
pub fn read_rows<T: DeserializeOwned>(bytes: &[u8], table: &str) -> Result<Vec<T>, ReferenceError> {
    let clean = ascii_only(bytes);
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(b'|')
        .quoting(false)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(clean.as_slice());

    let headers = reader
        .headers()
        .map_err(|source| ReferenceError::Csv {
            table: table.to_string(),
            source,
        })?
        .clone();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let parsed = record.and_then(|r| r.deserialize::<T>(Some(&headers)));
        match parsed {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                tracing::warn!(table, row = line + 2, error = %e, "Skipping malformed row");
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(table, skipped, kept = rows.len(), "Table loaded with skipped rows");
    }
    Ok(rows)
}

pub fn parse_factions(bytes: &[u8]) -> Result<Vec<Faction>, ReferenceError> {
    let rows: Vec<FactionRow> = read_rows(bytes, FACTIONS)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match Faction::new(row.id, row.name) {
            Ok(f) => Some(f.with_parent(row.parent_id)),
            Err(e) => skip(FACTIONS, e),
        })
        .collect())
}

pub fn parse_datasheets(bytes: &[u8]) -> Result<Vec<Datasheet>, ReferenceError> {
    let rows: Vec<DatasheetRow> = read_rows(bytes, DATASHEETS)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match Datasheet::new(row.id, row.name, row.faction_id) {
            Ok(d) => Some(d),
            Err(e) => skip(DATASHEETS, e),
        })
        .collect())
}

pub fn parse_stratagems(bytes: &[u8]) -> Result<Vec<Stratagem>, ReferenceError> {
    let rows: Vec<StratagemRow> = read_rows(bytes, STRATAGEMS)?;
    Ok(rows.into_iter().filter_map(stratagem_from_row).collect())
}

pub fn parse_links(bytes: &[u8]) -> Result<Vec<UnitStratagemLink>, ReferenceError> {
    let rows: Vec<UnitStratagemLink> = read_rows(bytes, DATASHEET_STRATAGEMS)?;
    Ok(rows
        .into_iter()
        .filter(|l| !l.datasheet_id.is_empty() && !l.stratagem_id.is_empty())
        .collect())
}

pub fn parse_detachment_abilities(bytes: &[u8]) -> Result<Vec<DetachmentAbility>, ReferenceError> {
    read_rows(bytes, DETACHMENT_ABILITIES)
}

/// The `last_update` value of the marker table.
pub fn parse_last_update(bytes: &[u8]) -> Option<String> {
    read_rows::<LastUpdateRow>(bytes, LAST_UPDATE)
        .ok()?
        .into_iter()
        .next()
        .map(|row| row.last_update)
        .filter(|v| !v.is_empty())
}

/// Load a snapshot from a directory holding every table.
pub fn load_dir(dir: &Path) -> Result<ReferenceData, ReferenceError> {
    let read = |name: &str| -> Result<Vec<u8>, ReferenceError> {
        let path = dir.join(name);
        if !path.exists() {
            return Err(ReferenceError::MissingTable(path));
        }
        std::fs::read(&path).map_err(|source| ReferenceError::Io { path, source })
    };

    let data = ReferenceData::new(
        parse_factions(&read(FACTIONS)?)?,
        parse_datasheets(&read(DATASHEETS)?)?,
        parse_stratagems(&read(STRATAGEMS)?)?,
        parse_links(&read(DATASHEET_STRATAGEMS)?)?,
        parse_detachment_abilities(&read(DETACHMENT_ABILITIES)?)?,
    );

    let data = match std::fs::read(dir.join(LAST_UPDATE))
        .ok()
        .and_then(|bytes| parse_last_update(&bytes))
    {
        Some(marker) => data.with_last_update(marker),
        None => data,
    };

    tracing::info!(sizes = ?data.sizes(), last_update = ?data.last_update(), "Reference data loaded");
    Ok(data)
}

fn stratagem_from_row(row: StratagemRow) -> Option<Stratagem> {
    let subfaction = if row.subfaction_id.is_empty() {
        subfaction_fixup(&row.faction_id, &row.name, &row.stratagem_type)
            .map(str::to_string)
            .unwrap_or_default()
    } else {
        row.subfaction_id
    };
    let cp_cost = row.cp_cost.trim().parse::<u32>().unwrap_or(0);

    match Stratagem::new(row.id, row.name, row.stratagem_type) {
        Ok(s) => Some(
            s.with_faction(row.faction_id)
                .with_cp_cost(cp_cost)
                .with_text(row.legend, row.description)
                .with_phase(row.phase)
                .with_subfaction(subfaction)
                .with_detachment(row.detachment, row.detachment_id)
                .with_source(row.source_id),
        ),
        Err(e) => skip(STRATAGEMS, e),
    }
}

/// Subfaction ids the publisher leaves off specific stratagems.
fn subfaction_fixup(faction_id: &str, name: &str, type_label: &str) -> Option<&'static str> {
    match faction_id {
        "AE" => match bracket_text(type_label)? {
            "Alaitoc" => Some("CWAL"),
            "Altansar" => Some("CWAR"),
            "Biel-Tan" => Some("CWBT"),
            "Harlequins" => Some("CWHA"),
            "Iyanden" => Some("CWIY"),
            "Saim-Hann" => Some("CWSH"),
            "Ulthw" => Some("CWUL"),
            _ => None,
        },
        "ORK" => match name {
            "UNBRIDLED CARNAGE" => Some("CLGF"),
            "DED SNEAKY" => Some("CLBA"),
            _ => None,
        },
        "SM" => match name {
            "HONOURED BY MACRAGGE" => Some("CHUL"),
            "GIFT OF THE KHANS" => Some("CHWS"),
            "BEQUEATHED BY THE IRON COUNCIL" => Some("CHIH"),
            _ => None,
        },
        _ => None,
    }
}

/// Text between the first '(' and the first ')' after it.
fn bracket_text(s: &str) -> Option<&str> {
    let start = s.find('(')?;
    let end = s[start..].find(')')?;
    Some(&s[start + 1..start + end])
}

fn skip<T>(table: &str, error: crate::models::ModelError) -> Option<T> {
    tracing::warn!(table, error = %error, "Skipping invalid row");
    None
}
