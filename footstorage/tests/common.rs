use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use footstorage::{
    config::BatchConfig,
    errors::Result,
    models::{
        EntityId, GraphSummary, ManagerRow, ManagerTeamRow, PathProbe, PlayerManagerRow,
        PlayerRow, PlayerTeamRow, TeamRow,
    },
    memory::MemoryGraph,
    schema,
    store::{GraphStore, NodeLabel, Properties, RelationshipRow, RelationshipSpec, SchemaDeclaration},
    FootStorage,
};

#[allow(dead_code)]
pub struct TestContext {
    pub graph: Arc<MemoryGraph>,
    pub storage: FootStorage,
}

pub async fn init_test_context(batches: BatchConfig) -> TestContext {
    let graph = Arc::new(MemoryGraph::new());
    let storage = FootStorage::new(graph.clone(), batches);
    schema::ensure_indexes(storage.store.as_ref()).await;
    TestContext { graph, storage }
}

/// Forwards to a [`MemoryGraph`] and records the size of every write batch.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingStore {
    pub graph: MemoryGraph,
    pub node_batches: Mutex<Vec<(NodeLabel, usize)>>,
    pub relationship_batches: Mutex<Vec<(String, usize)>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn node_batch_sizes(&self, label: NodeLabel) -> Vec<usize> {
        self.node_batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == label)
            .map(|(_, size)| *size)
            .collect()
    }

    pub fn relationship_batch_sizes(&self, rel_type: &str) -> Vec<usize> {
        self.relationship_batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == rel_type)
            .map(|(_, size)| *size)
            .collect()
    }
}

#[async_trait]
impl GraphStore for RecordingStore {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn ping(&self) -> Result<()> {
        self.graph.ping().await
    }

    async fn declare(&self, declaration: &SchemaDeclaration) -> Result<()> {
        self.graph.declare(declaration).await
    }

    async fn wipe(&self) -> Result<()> {
        self.graph.wipe().await
    }

    async fn create_nodes(&self, label: NodeLabel, rows: Vec<Properties>) -> Result<u64> {
        self.node_batches.lock().unwrap().push((label, rows.len()));
        self.graph.create_nodes(label, rows).await
    }

    async fn create_relationships(
        &self,
        spec: &RelationshipSpec,
        rows: Vec<RelationshipRow>,
    ) -> Result<u64> {
        self.relationship_batches
            .lock()
            .unwrap()
            .push((spec.rel_type.to_string(), rows.len()));
        self.graph.create_relationships(spec, rows).await
    }

    async fn summarize(&self) -> Result<GraphSummary> {
        self.graph.summarize().await
    }

    async fn shortest_path(&self, from: &str, to: &str, max_hops: u32) -> Result<Option<PathProbe>> {
        self.graph.shortest_path(from, to, max_hops).await
    }
}

#[allow(dead_code)]
pub fn player(id: i64, name: &str, nationality: Option<&str>) -> PlayerRow {
    PlayerRow {
        id: EntityId::Int(id),
        name: Some(name.to_string()),
        full_name: None,
        nationality: nationality.map(String::from),
        position: None,
        birth_date: None,
    }
}

#[allow(dead_code)]
pub fn team(id: i64, name: &str) -> TeamRow {
    TeamRow {
        id: EntityId::Int(id),
        name: Some(name.to_string()),
        country: Some("England".to_string()),
        league: Some("Premier League".to_string()),
        founded_year: Some(1886),
    }
}

#[allow(dead_code)]
pub fn manager(id: i64, name: &str) -> ManagerRow {
    ManagerRow {
        id: EntityId::Int(id),
        name: Some(name.to_string()),
        nationality: Some("Spain".to_string()),
        birth_date: None,
    }
}

#[allow(dead_code)]
pub fn stint(player_id: i64, team_id: i64, end_date: Option<&str>) -> PlayerTeamRow {
    PlayerTeamRow {
        player_id: EntityId::Int(player_id),
        team_id: EntityId::Int(team_id),
        start_date: Some("2020-07-01".to_string()),
        end_date: end_date.map(String::from),
        loan: None,
    }
}

#[allow(dead_code)]
pub fn coached(player_id: i64, manager_id: i64) -> PlayerManagerRow {
    PlayerManagerRow {
        player_id: EntityId::Int(player_id),
        manager_id: EntityId::Int(manager_id),
        start_date: Some("2019-11-20".to_string()),
        end_date: Some("2021-04-19".to_string()),
    }
}

#[allow(dead_code)]
pub fn tenure(manager_id: i64, team_id: i64, end_date: Option<&str>) -> ManagerTeamRow {
    ManagerTeamRow {
        manager_id: EntityId::Int(manager_id),
        team_id: EntityId::Int(team_id),
        start_date: Some("2019-12-20".to_string()),
        end_date: end_date.map(String::from),
    }
}
