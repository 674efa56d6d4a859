use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One row of a relational collection, as returned by the source.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The relational collections a pipeline run extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Players,
    Teams,
    Managers,
    PlayerTeams,
    PlayerManagers,
    ManagerTeams,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Players,
        Collection::Teams,
        Collection::Managers,
        Collection::PlayerTeams,
        Collection::PlayerManagers,
        Collection::ManagerTeams,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Players => "players",
            Collection::Teams => "teams",
            Collection::Managers => "managers",
            Collection::PlayerTeams => "player_teams",
            Collection::PlayerManagers => "player_managers",
            Collection::ManagerTeams => "manager_teams",
        }
    }

    /// Columns that give the collection a repeatable row order for offset paging.
    pub fn order_columns(&self) -> &'static [&'static str] {
        match self {
            Collection::Players | Collection::Teams | Collection::Managers => &["id"],
            Collection::PlayerTeams => &["player_id", "team_id", "start_date"],
            Collection::PlayerManagers => &["player_id", "manager_id", "start_date"],
            Collection::ManagerTeams => &["manager_id", "team_id", "start_date"],
        }
    }

    pub fn from_table_name(table: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.table_name() == table)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A relational source that serves a collection one page at a time.
///
/// Implementations return the rows in `[offset, offset + limit)` in a stable
/// order, such as the one given by [`Collection::order_columns`]. Fewer than `limit` rows (or none) means the collection is exhausted.
#[async_trait]
pub trait RowSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_page(&self, collection: &str, offset: usize, limit: usize)
        -> Result<Vec<Record>>;
}

/// Rows of one collection together with the error that cut extraction short, if any.
#[derive(Debug, Clone)]
pub struct ExtractedCollection {
    pub collection: Collection,
    pub records: Vec<Record>,
    pub error: Option<String>,
}

/// Everything pulled from the source during one run.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub collections: Vec<ExtractedCollection>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, extracted: ExtractedCollection) {
        self.collections.push(extracted);
    }

    pub fn records(&self, collection: Collection) -> &[Record] {
        self.collections
            .iter()
            .find(|c| c.collection == collection)
            .map(|c| c.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn failed_collections(&self) -> Vec<Collection> {
        self.collections
            .iter()
            .filter(|c| c.error.is_some())
            .map(|c| c.collection)
            .collect()
    }
}
