//! Shared fixtures: a small reference dataset and a Gladius Task Force roster.

use std::path::Path;

use crate::fetch::MockSource;
use crate::models::{Force, Selection};
use crate::reference::csv::{self as tables, LAST_UPDATE};
use crate::reference::ReferenceData;

pub const MARKER: &str = "2024-05-01 10:00:00";

const FACTIONS: &str = "\
id|name|link|parent_id|
SM|Space Marines|https://example.test/sm||
CHUL|Ultramarines|https://example.test/ul|SM|
CHWS|White Scars|https://example.test/ws|SM|
CSM|Chaos Space Marines|https://example.test/csm||
AC|Adeptus Custodes|https://example.test/ac||
AE|Aeldari|https://example.test/ae||
";

const DATASHEETS: &str = "\
id|name|faction_id|source_id|legend|role|
000000101|Captain|SM|1||Characters|
000000102|Intercessor Squad|SM|1||Battleline|
000000103|Redemptor Dreadnought|SM|1||Other|
000000104|Kor'sarro Khan|SM|1||Characters|
000000201|Custodian Guard|AC|1||Battleline|
000000301|Legionaries|CSM|1||Battleline|
";

const STRATAGEMS: &str = "\
faction_id|name|id|type|cp_cost|legend|turn|phase|detachment|detachment_id|description|subfaction_id|
SM|FIRE DISCIPLINE|000000001|Gladius Task Force \u{2013} Battle Tactic Stratagem|1||Your turn|Shooting phase|Gladius Task Force|000000123|Until the end of the phase, <span class=\"kwb\">ADEPTUS ASTARTES</span> units <a href=\"/rules\">re-roll</a> hits.||
SM|HONOURED BY MACRAGGE|000000002|Wargear Stratagem|1||Your turn|Command phase|||Upgrade one weapon.|CHUL|
SM|ARMOUR OF CONTEMPT|000000003|Battle Tactic Stratagem|1||Either player's turn|Shooting or Fight phase|||Worsen AP by 1.||
SM|HAMMERFALL BOMBARDMENT|000000004|Anvil Siege Force \u{2013} Strategic Ploy Stratagem|1||Your turn|Shooting phase|Anvil Siege Force|000000456|Artillery strike.||
SM|STORM OF FIRE|000000005|Gladius Task Force \u{2013} Battle Tactic Stratagem|1||Your turn|Shooting phase|Gladius Task Force|000000123|Ignores cover.||
|FIRE OVERWATCH|000000006|Core \u{2013} Strategic Ploy Stratagem|1||Opponent's turn|Movement or Charge phase|||Shoot at an enemy.||
|NEW ORDERS|000000007|Core \u{2013} Strategic Ploy Stratagem|1||Your turn|Command phase|||Swap a secondary.||
|COMMAND RE-ROLL|000000008|Core \u{2013} Battle Tactic Stratagem|1||Either player's turn|Any phase|||Re-roll one roll.||
SM|VANGUARD INFILTRATION|000000009|Vanguard Spearhead \u{2013} Strategic Ploy Stratagem|1||Your turn|Movement phase|||Redeploy.||
SM|CRUSADE RELIC|000000010|Crusade \u{2013} Requisition Stratagem|1||Before battle|Before battle|||Gain a relic.||
SM|RAPID EMBARKATION|000000011|Stratagem|1||Your turn|Any phase|||Embark.||
SM|DUTY AND HONOUR|000000012|Battle Tactic Stratagem|1||Before battle|Before battle|||Gain an oath.||
SM|GIFT OF THE KHANS|000000013|Battle Tactic Stratagem|1||Your turn|Fight phase|||Charge bonus.|CHWS|
AC|ARCANE GENETIC ALCHEMY|000000014|Battle Tactic Stratagem|1||Either player's turn|Fight phase|||Feel no pain.||
SM|SHIELD OF THE SOUL|000000015|Battle Tactic Stratagem|1||Either player's turn|Any phase||000000123|Invulnerable save.||
";

const LINKS: &str = "\
datasheet_id|stratagem_id|
000000101|000000001|
000000102|000000001|
000000101|000000002|
000000101|000000009|
000000101|000000010|
000000102|000000011|
000000103|000000012|
000000101|000000013|
000000102|000000015|
";

const DETACHMENT_ABILITIES: &str = "\
id|faction_id|name|legend|description|detachment|detachment_id|
000010001|SM|Combat Doctrines||Pick a doctrine.|Gladius Task Force|000000123|
000010002|SM|Shield of the Imperium||Hold the line.|Anvil Siege Force|000000456|
";

/// Every table file with its contents, marker excluded.
pub fn table_files() -> Vec<(&'static str, String)> {
    vec![
        (tables::FACTIONS, FACTIONS.to_string()),
        (tables::DATASHEETS, DATASHEETS.to_string()),
        (tables::STRATAGEMS, STRATAGEMS.to_string()),
        (tables::DATASHEET_STRATAGEMS, LINKS.to_string()),
        (tables::DETACHMENT_ABILITIES, DETACHMENT_ABILITIES.to_string()),
    ]
}

fn marker_file() -> String {
    format!("last_update|\n{MARKER}|\n")
}

/// Write every table and the marker into `dir`.
pub fn write_tables(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    for (name, body) in table_files() {
        std::fs::write(dir.join(name), body).unwrap();
    }
    std::fs::write(dir.join(LAST_UPDATE), marker_file()).unwrap();
}

/// A source serving the full fixture dataset.
pub fn mock_source() -> MockSource {
    let source = MockSource::new();
    for (name, body) in table_files() {
        source.set_file(name, body);
    }
    source.set_file(LAST_UPDATE, marker_file());
    source
}

pub fn reference() -> ReferenceData {
    ReferenceData::new(
        tables::parse_factions(FACTIONS.as_bytes()).unwrap(),
        tables::parse_datasheets(DATASHEETS.as_bytes()).unwrap(),
        tables::parse_stratagems(STRATAGEMS.as_bytes()).unwrap(),
        tables::parse_links(LINKS.as_bytes()).unwrap(),
        tables::parse_detachment_abilities(DETACHMENT_ABILITIES.as_bytes()).unwrap(),
    )
    .with_last_update(MARKER)
}

/// Space Marines force in the Gladius Task Force detachment.
pub fn gladius_force() -> Force {
    Force::new("Imperium - Space Marines")
        .with_selection(Selection::new("Battle Size").with_child(Selection::new("Strike Force")))
        .with_selection(Selection::new("Detachment").with_child(Selection::new("Gladius Task Force")))
        .with_selection(
            Selection::new("Captain")
                .with_categories([
                    "Faction: Adeptus Astartes",
                    "Faction: Ultramarines",
                    "Character",
                    "Infantry",
                ])
                .with_child(Selection::new("Master-crafted power weapon")),
        )
        .with_selection(
            Selection::new("Intercessor Squad")
                .with_categories(["Faction: Adeptus Astartes", "Infantry", "Battleline"])
                .with_child(Selection::new("Intercessor Sergeant")),
        )
        .with_selection(
            Selection::new("Intercessor Squad")
                .with_categories(["Faction: Adeptus Astartes", "Infantry", "Battleline"]),
        )
        .with_selection(
            Selection::new("Redemptor Dreadnought")
                .with_categories(["Faction: Adeptus Astartes", "Vehicle"]),
        )
        .with_selection(Selection::new("Kor'sarro Khan"))
        .with_selection(Selection::new("Primaris Ancient"))
}

/// The same force as BattleScribe XML.
pub fn gladius_ros() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<roster id="r1" name="Gladius Test" battleScribeVersion="2.03" xmlns="http://www.battlescribe.net/schema/rosterSchema">
  <forces>
    <force id="f1" name="Army Roster" catalogueName="Imperium - Space Marines">
      <selections>
        <selection id="s1" name="Battle Size" type="upgrade">
          <selections>
            <selection id="s1a" name="Strike Force" type="upgrade"/>
          </selections>
        </selection>
        <selection id="s2" name="Detachment" type="upgrade">
          <selections>
            <selection id="s2a" name="Gladius Task Force" type="upgrade"/>
          </selections>
        </selection>
        <selection id="s3" name="Captain" type="model">
          <selections>
            <selection id="s3a" name="Master-crafted power weapon" type="upgrade"/>
          </selections>
          <categories>
            <category id="c1" name="Faction: Adeptus Astartes" primary="false"/>
            <category id="c2" name="Faction: Ultramarines" primary="false"/>
            <category id="c3" name="Character" primary="true"/>
            <category id="c4" name="Infantry" primary="false"/>
          </categories>
        </selection>
        <selection id="s4" name="Intercessor Squad" type="unit">
          <selections>
            <selection id="s4a" name="Intercessor Sergeant" type="model"/>
          </selections>
          <categories>
            <category id="c1" name="Faction: Adeptus Astartes" primary="false"/>
            <category id="c5" name="Infantry" primary="false"/>
            <category id="c6" name="Battleline" primary="true"/>
          </categories>
        </selection>
        <selection id="s5" name="Redemptor Dreadnought" type="model">
          <categories>
            <category id="c1" name="Faction: Adeptus Astartes" primary="false"/>
            <category id="c7" name="Vehicle" primary="true"/>
          </categories>
        </selection>
        <selection id="s6" name="Kor&apos;sarro Khan" type="model"/>
      </selections>
    </force>
  </forces>
</roster>
"#
    .to_string()
}
