use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::fetch::{Collection, Extraction, Record};

/// Natural key as supplied by the source: integer or text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EntityId::Int(id) => serde_json::Value::from(*id),
            EntityId::Text(id) => serde_json::Value::from(id.as_str()),
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{id}"),
            EntityId::Text(id) => f.write_str(id),
        }
    }
}

// --- Relational rows ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRow {
    pub id: EntityId,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub nationality: Option<String>,
    pub position: Option<String>,
    pub birth_date: Option<String>,
}

impl PlayerRow {
    /// Nationality usable as a national team key; empty strings count as absent.
    pub fn country(&self) -> Option<&str> {
        self.nationality.as_deref().filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRow {
    pub id: EntityId,
    pub name: Option<String>,
    pub country: Option<String>,
    pub league: Option<String>,
    pub founded_year: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerRow {
    pub id: EntityId,
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerTeamRow {
    pub player_id: EntityId,
    pub team_id: EntityId,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub loan: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerManagerRow {
    pub player_id: EntityId,
    pub manager_id: EntityId,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerTeamRow {
    pub manager_id: EntityId,
    pub team_id: EntityId,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Typed view of one extraction, ready for loading.
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub players: Vec<PlayerRow>,
    pub teams: Vec<TeamRow>,
    pub managers: Vec<ManagerRow>,
    pub player_teams: Vec<PlayerTeamRow>,
    pub player_managers: Vec<PlayerManagerRow>,
    pub manager_teams: Vec<ManagerTeamRow>,
}

impl SourceData {
    /// Decodes every extracted collection, skipping rows that do not fit the
    /// expected shape. Returns the skipped row count per collection.
    pub fn decode(extraction: &Extraction) -> (Self, BTreeMap<Collection, usize>) {
        let mut skipped = BTreeMap::new();
        let data = Self {
            players: decode_rows(extraction, Collection::Players, &mut skipped),
            teams: decode_rows(extraction, Collection::Teams, &mut skipped),
            managers: decode_rows(extraction, Collection::Managers, &mut skipped),
            player_teams: decode_rows(extraction, Collection::PlayerTeams, &mut skipped),
            player_managers: decode_rows(extraction, Collection::PlayerManagers, &mut skipped),
            manager_teams: decode_rows(extraction, Collection::ManagerTeams, &mut skipped),
        };
        (data, skipped)
    }
}

fn decode_rows<T: DeserializeOwned>(
    extraction: &Extraction,
    collection: Collection,
    skipped: &mut BTreeMap<Collection, usize>,
) -> Vec<T> {
    let records: &[Record] = extraction.records(collection);
    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match serde_json::from_value::<T>(serde_json::Value::Object(record.clone())) {
            Ok(row) => rows.push(row),
            Err(err) => {
                log::warn!("Skipping {} row {}: {}", collection, index, err);
                *skipped.entry(collection).or_insert(0) += 1;
            }
        }
    }
    rows
}

// --- Reports ---

/// Aggregate counts read back from the loaded graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub players: u64,
    pub teams: u64,
    pub managers: u64,
    pub national_teams: u64,
    pub relationships: u64,
}

/// Result of a bounded shortest-path probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathProbe {
    pub hops: u32,
    pub nodes: Vec<String>,
    pub relationships: Vec<String>,
}

/// Association records whose endpoints were not among the loaded nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReferences {
    pub relationship: String,
    pub missing_from: usize,
    pub missing_to: usize,
    pub samples: Vec<String>,
}

impl UnresolvedReferences {
    pub fn is_empty(&self) -> bool {
        self.missing_from == 0 && self.missing_to == 0
    }
}

/// What the load stages wrote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub nodes: BTreeMap<String, u64>,
    pub relationships: BTreeMap<String, u64>,
    pub unresolved: Vec<UnresolvedReferences>,
}

/// Everything reported about one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub extracted: BTreeMap<Collection, usize>,
    pub failed_collections: Vec<Collection>,
    pub skipped_rows: BTreeMap<Collection, usize>,
    pub load: LoadReport,
    pub summary: Option<GraphSummary>,
    pub path: Option<PathProbe>,
    pub elapsed_secs: f64,
}

/// One row of the run ledger.
#[derive(Debug)]
pub struct RunRecord {
    pub run_id: i64,
    pub run_name: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: String,
    pub details: Option<String>,
}
