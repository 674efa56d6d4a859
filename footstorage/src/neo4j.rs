//! Bolt-backed [`GraphStore`] issuing `UNWIND` batches of Cypher.

use std::collections::HashMap;

use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Query};
use serde_json::Value as JsonValue;

use crate::config::GraphConfig;
use crate::errors::{Result, StorageError};
use crate::models::{GraphSummary, PathProbe};
use crate::store::{
    DeclarationKind, GraphStore, NodeLabel, Properties, RelationshipRow, RelationshipSpec,
    SchemaDeclaration,
};

const WIPE_CYPHER: &str = "MATCH (n) DETACH DELETE n";

const SUMMARY_CYPHER: &str = "OPTIONAL MATCH (p:Player) WITH count(p) AS players
OPTIONAL MATCH (t:Team) WITH players, count(t) AS teams
OPTIONAL MATCH (m:Manager) WITH players, teams, count(m) AS managers
OPTIONAL MATCH (nt:NationalTeam) WITH players, teams, managers, count(nt) AS nationalTeams
OPTIONAL MATCH ()-[r]->() WITH players, teams, managers, nationalTeams, count(r) AS relationships
RETURN players, teams, managers, nationalTeams, relationships";

pub(crate) fn create_nodes_cypher(label: NodeLabel) -> String {
    format!("UNWIND $rows AS row\nCREATE (n:{label})\nSET n = row\nRETURN count(n) AS created")
}

pub(crate) fn create_relationships_cypher(spec: &RelationshipSpec) -> String {
    format!(
        "UNWIND $rows AS row\n\
         MATCH (a:{from_label} {{{from_key}: row.from}})\n\
         MATCH (b:{to_label} {{{to_key}: row.to}})\n\
         CREATE (a)-[r:{rel_type}]->(b)\n\
         SET r = row.props\n\
         RETURN count(r) AS created",
        from_label = spec.from.label,
        from_key = spec.from.key,
        to_label = spec.to.label,
        to_key = spec.to.key,
        rel_type = spec.rel_type,
    )
}

pub(crate) fn declaration_cypher(declaration: &SchemaDeclaration) -> String {
    let SchemaDeclaration {
        name,
        label,
        property,
        kind,
    } = declaration;
    match kind {
        DeclarationKind::Index => {
            format!("CREATE INDEX {name} IF NOT EXISTS FOR (n:{label}) ON (n.{property})")
        }
        DeclarationKind::Unique => format!(
            "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{label}) REQUIRE n.{property} IS UNIQUE"
        ),
    }
}

pub(crate) fn shortest_path_cypher(max_hops: u32) -> String {
    format!(
        "MATCH path = shortestPath(\n\
         (a:Player {{name: $from}})-[*..{max_hops}]-(b:Player {{name: $to}})\n\
         )\n\
         RETURN length(path) AS hops,\n\
         [n IN nodes(path) | coalesce(n.name, n.country)] AS names,\n\
         [r IN relationships(path) | type(r)] AS types"
    )
}

/// Converts a JSON value into the Bolt value sent as a query parameter.
pub(crate) fn json_to_bolt(value: &JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        JsonValue::String(s) => s.as_str().into(),
        JsonValue::Array(items) => items.iter().map(json_to_bolt).collect::<Vec<_>>().into(),
        JsonValue::Object(map) => properties_to_bolt(map).into(),
    }
}

fn properties_to_bolt(properties: &Properties) -> HashMap<String, BoltType> {
    properties
        .iter()
        .map(|(key, value)| (key.clone(), json_to_bolt(value)))
        .collect()
}

fn relationship_to_bolt(row: &RelationshipRow) -> HashMap<String, BoltType> {
    let mut m: HashMap<String, BoltType> = HashMap::new();
    m.insert("from".to_string(), json_to_bolt(&row.from));
    m.insert("to".to_string(), json_to_bolt(&row.to));
    m.insert("props".to_string(), properties_to_bolt(&row.properties).into());
    m
}

fn is_already_exists(err: &neo4rs::Error) -> bool {
    let message = err.to_string();
    message.contains("already exists") || message.contains("EquivalentSchemaRule")
}

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Opens a pooled Bolt connection and verifies it with a trivial query.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let bolt_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.username.as_str())
            .password(config.password.as_str())
            .fetch_size(config.fetch_size)
            .max_connections(config.max_connections)
            .build()
            .map_err(|err| StorageError::Config(format!("invalid Neo4j config: {err}")))?;

        let graph = Graph::connect(bolt_config).await.map_err(|err| {
            StorageError::Connection(format!("failed to connect to {}: {err}", config.uri))
        })?;

        let store = Self { graph };
        store.ping().await?;
        log::info!("Connected to Neo4j at {}", config.uri);
        Ok(store)
    }

    async fn fetch_one(&self, q: Query) -> Result<Option<neo4rs::Row>> {
        let mut stream = self.graph.execute(q).await?;
        Ok(stream.next().await?)
    }

    async fn fetch_count(&self, q: Query, column: &str) -> Result<u64> {
        let row = self.fetch_one(q).await?;
        match row {
            Some(row) => read_count(&row, column),
            None => Ok(0),
        }
    }
}

fn read_count(row: &neo4rs::Row, column: &str) -> Result<u64> {
    let value = row
        .get::<i64>(column)
        .map_err(|err| StorageError::Internal(format!("failed to read '{column}': {err}")))?;
    Ok(value.max(0) as u64)
}

#[async_trait]
impl GraphStore for Neo4jStore {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    async fn ping(&self) -> Result<()> {
        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(|err| StorageError::Connection(format!("Neo4j ping failed: {err}")))
    }

    async fn declare(&self, declaration: &SchemaDeclaration) -> Result<()> {
        match self.graph.run(query(&declaration_cypher(declaration))).await {
            Ok(()) => Ok(()),
            Err(err) if is_already_exists(&err) => {
                Err(StorageError::SchemaConflict(format!("{}: {err}", declaration.name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn wipe(&self) -> Result<()> {
        self.graph.run(query(WIPE_CYPHER)).await?;
        Ok(())
    }

    async fn create_nodes(&self, label: NodeLabel, rows: Vec<Properties>) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let params: Vec<HashMap<String, BoltType>> = rows.iter().map(properties_to_bolt).collect();
        let q = query(&create_nodes_cypher(label)).param("rows", params);
        self.fetch_count(q, "created").await.map_err(|err| match err {
            StorageError::Neo4j(inner) if inner.to_string().contains("already exists") => {
                StorageError::ConstraintViolation(format!("{label}: {inner}"))
            }
            other => other,
        })
    }

    async fn create_relationships(
        &self,
        spec: &RelationshipSpec,
        rows: Vec<RelationshipRow>,
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let params: Vec<HashMap<String, BoltType>> = rows.iter().map(relationship_to_bolt).collect();
        let q = query(&create_relationships_cypher(spec)).param("rows", params);
        self.fetch_count(q, "created").await
    }

    async fn summarize(&self) -> Result<GraphSummary> {
        let row = self
            .fetch_one(query(SUMMARY_CYPHER))
            .await?
            .ok_or_else(|| StorageError::NotFound("summary query returned no rows".to_string()))?;

        Ok(GraphSummary {
            players: read_count(&row, "players")?,
            teams: read_count(&row, "teams")?,
            managers: read_count(&row, "managers")?,
            national_teams: read_count(&row, "nationalTeams")?,
            relationships: read_count(&row, "relationships")?,
        })
    }

    async fn shortest_path(
        &self,
        from: &str,
        to: &str,
        max_hops: u32,
    ) -> Result<Option<PathProbe>> {
        let q = query(&shortest_path_cypher(max_hops))
            .param("from", from)
            .param("to", to);
        let Some(row) = self.fetch_one(q).await? else {
            return Ok(None);
        };

        let hops = read_count(&row, "hops")? as u32;
        let nodes = row
            .get::<Vec<String>>("names")
            .map_err(|err| StorageError::Internal(format!("failed to read path nodes: {err}")))?;
        let relationships = row
            .get::<Vec<String>>("types")
            .map_err(|err| StorageError::Internal(format!("failed to read path types: {err}")))?;

        Ok(Some(PathProbe {
            hops,
            nodes,
            relationships,
        }))
    }
}
