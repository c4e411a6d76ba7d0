//! Roster file parsing.
//!
//! A `.ros` file is BattleScribe XML; a `.rosz` file is a zip archive holding
//! one `.ros` entry. Archives are recognized by content, so a renamed file
//! still parses. The XML tree is normalized straight into [`Roster`], with
//! every repeated node held as a `Vec`.

use std::io::{Cursor, Read};
use std::path::Path;

use roxmltree::Node;
use thiserror::Error;

use crate::models::{Force, Roster, Selection};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Roster input errors.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster file is empty")]
    Empty,

    #[error("Archive contains no .ros file")]
    NoRosterInArchive,

    #[error("Invalid roster archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid roster XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Document has no roster element")]
    MissingRoster,

    #[error("Failed to read roster: {0}")]
    Io(#[from] std::io::Error),
}

/// True if the bytes start with a zip local-file header.
pub fn is_archive(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Read and parse a roster file.
pub fn parse_file(path: &Path) -> Result<Roster, RosterError> {
    let bytes = std::fs::read(path)?;
    parse(&bytes)
}

/// Parse roster bytes, unpacking an archive if needed.
pub fn parse(bytes: &[u8]) -> Result<Roster, RosterError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(RosterError::Empty);
    }
    if is_archive(bytes) {
        let inner = extract_roster(bytes)?;
        return parse_xml(&inner);
    }
    parse_xml(bytes)
}

fn extract_roster(bytes: &[u8]) -> Result<Vec<u8>, RosterError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_file() && entry.name().to_lowercase().ends_with(".ros") {
            let mut out = Vec::new();
            entry.read_to_end(&mut out)?;
            tracing::debug!(entry = entry.name(), bytes = out.len(), "Extracted roster");
            return Ok(out);
        }
    }
    Err(RosterError::NoRosterInArchive)
}

fn parse_xml(bytes: &[u8]) -> Result<Roster, RosterError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(RosterError::Empty);
    }

    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "roster" {
        return Err(RosterError::MissingRoster);
    }

    let mut forces = Vec::new();
    for container in children(root, "forces") {
        for force in children(container, "force") {
            collect_force(force, &mut forces);
        }
    }

    Ok(Roster {
        name: attr(root, "name"),
        forces,
    })
}

/// Push a force and any forces nested inside it, in document order.
fn collect_force(node: Node, out: &mut Vec<Force>) {
    out.push(Force {
        catalogue_name: attr(node, "catalogueName"),
        selections: selections_of(node),
    });
    for container in children(node, "forces") {
        for nested in children(container, "force") {
            collect_force(nested, out);
        }
    }
}

fn selections_of(node: Node) -> Vec<Selection> {
    children(node, "selections")
        .flat_map(|container| children(container, "selection"))
        .map(|s| Selection {
            name: attr(s, "name"),
            entry_type: attr(s, "type"),
            categories: children(s, "categories")
                .flat_map(|c| children(c, "category"))
                .map(|c| attr(c, "name"))
                .filter(|name| !name.is_empty())
                .collect(),
            selections: selections_of(s),
        })
        .collect()
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn attr(node: Node, name: &str) -> String {
    node.attribute(name).unwrap_or_default().trim().to_string()
}
