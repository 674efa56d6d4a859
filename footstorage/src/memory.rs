//! In-process [`GraphStore`] with the same write semantics as the Bolt store.
//!
//! Backs `--dry-run` migrations and the test-suite.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::errors::{Result, StorageError};
use crate::models::{GraphSummary, PathProbe};
use crate::store::{
    DeclarationKind, GraphStore, NodeLabel, Properties, RelationshipRow, RelationshipSpec,
    RelationshipType, SchemaDeclaration,
};

#[derive(Debug, Clone)]
struct MemoryNode {
    label: NodeLabel,
    properties: Properties,
}

#[derive(Debug, Clone)]
struct MemoryRelationship {
    rel_type: RelationshipType,
    from: usize,
    to: usize,
    properties: Properties,
}

/// `(label, property, JSON-encoded value)` lookup key.
type IndexKey = (NodeLabel, String, String);

fn index_key(label: NodeLabel, key: &str, value: &JsonValue) -> IndexKey {
    (label, key.to_string(), value.to_string())
}

#[derive(Default)]
struct GraphState {
    nodes: Vec<MemoryNode>,
    relationships: Vec<MemoryRelationship>,
    declarations: BTreeMap<&'static str, SchemaDeclaration>,
    // Every non-null node property, so endpoint lookups never scan.
    index: HashMap<IndexKey, Vec<usize>>,
}

impl GraphState {
    fn find_nodes(&self, label: NodeLabel, key: &str, value: &JsonValue) -> Vec<usize> {
        if value.is_null() {
            return Vec::new();
        }
        self.index
            .get(&index_key(label, key, value))
            .cloned()
            .unwrap_or_default()
    }

    fn push_node(&mut self, label: NodeLabel, properties: Properties) {
        let idx = self.nodes.len();
        for (key, value) in &properties {
            self.index
                .entry(index_key(label, key, value))
                .or_default()
                .push(idx);
        }
        self.nodes.push(MemoryNode { label, properties });
    }

    fn unique_keys(&self, label: NodeLabel) -> Vec<&'static str> {
        self.declarations
            .values()
            .filter(|d| d.kind == DeclarationKind::Unique && d.label == label.as_str())
            .map(|d| d.property)
            .collect()
    }

    fn display_name(&self, idx: usize) -> String {
        let props = &self.nodes[idx].properties;
        props
            .get("name")
            .or_else(|| props.get("country"))
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

fn strip_nulls(properties: Properties) -> Properties {
    properties.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

#[derive(Default)]
pub struct MemoryGraph {
    state: Mutex<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, GraphState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::Internal("memory graph lock poisoned".to_string()))
    }

    /// Properties of every node carrying `label`, in creation order.
    pub fn nodes(&self, label: NodeLabel) -> Result<Vec<Properties>> {
        let state = self.state()?;
        Ok(state
            .nodes
            .iter()
            .filter(|node| node.label == label)
            .map(|node| node.properties.clone())
            .collect())
    }

    /// `(from, to, relationship)` property triples for every relationship of `rel_type`.
    pub fn relationships(
        &self,
        rel_type: RelationshipType,
    ) -> Result<Vec<(Properties, Properties, Properties)>> {
        let state = self.state()?;
        Ok(state
            .relationships
            .iter()
            .filter(|rel| rel.rel_type == rel_type)
            .map(|rel| {
                (
                    state.nodes[rel.from].properties.clone(),
                    state.nodes[rel.to].properties.clone(),
                    rel.properties.clone(),
                )
            })
            .collect())
    }

    pub fn declarations(&self) -> Result<Vec<SchemaDeclaration>> {
        Ok(self.state()?.declarations.values().copied().collect())
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        self.state().map(|_| ())
    }

    async fn declare(&self, declaration: &SchemaDeclaration) -> Result<()> {
        let mut state = self.state()?;
        match state.declarations.get(declaration.name) {
            Some(existing) if existing == declaration => Ok(()),
            Some(_) => Err(StorageError::SchemaConflict(format!(
                "{} already exists with a different definition",
                declaration.name
            ))),
            None => {
                state.declarations.insert(declaration.name, *declaration);
                Ok(())
            }
        }
    }

    async fn wipe(&self) -> Result<()> {
        let mut state = self.state()?;
        state.nodes.clear();
        state.relationships.clear();
        state.index.clear();
        Ok(())
    }

    async fn create_nodes(&self, label: NodeLabel, rows: Vec<Properties>) -> Result<u64> {
        let mut state = self.state()?;
        let rows: Vec<Properties> = rows.into_iter().map(strip_nulls).collect();

        // The whole batch is rejected on a violation, as a failed transaction would be.
        for key in state.unique_keys(label) {
            let mut seen: HashSet<String> = HashSet::new();
            for row in &rows {
                if let Some(value) = row.get(key) {
                    let taken = state.index.contains_key(&index_key(label, key, value));
                    if taken || !seen.insert(value.to_string()) {
                        return Err(StorageError::ConstraintViolation(format!(
                            "{label} with {key} = {value} already exists"
                        )));
                    }
                }
            }
        }

        let created = rows.len() as u64;
        for properties in rows {
            state.push_node(label, properties);
        }
        Ok(created)
    }

    async fn create_relationships(
        &self,
        spec: &RelationshipSpec,
        rows: Vec<RelationshipRow>,
    ) -> Result<u64> {
        let mut state = self.state()?;
        let mut created = 0u64;
        for row in rows {
            let sources = state.find_nodes(spec.from.label, spec.from.key, &row.from);
            let targets = state.find_nodes(spec.to.label, spec.to.key, &row.to);
            let properties = strip_nulls(row.properties);
            for &from in &sources {
                for &to in &targets {
                    state.relationships.push(MemoryRelationship {
                        rel_type: spec.rel_type,
                        from,
                        to,
                        properties: properties.clone(),
                    });
                    created += 1;
                }
            }
        }
        Ok(created)
    }

    async fn summarize(&self) -> Result<GraphSummary> {
        let state = self.state()?;
        let count = |label: NodeLabel| state.nodes.iter().filter(|n| n.label == label).count() as u64;
        Ok(GraphSummary {
            players: count(NodeLabel::Player),
            teams: count(NodeLabel::Team),
            managers: count(NodeLabel::Manager),
            national_teams: count(NodeLabel::NationalTeam),
            relationships: state.relationships.len() as u64,
        })
    }

    async fn shortest_path(
        &self,
        from: &str,
        to: &str,
        max_hops: u32,
    ) -> Result<Option<PathProbe>> {
        let state = self.state()?;
        let from_value = JsonValue::from(from);
        let to_value = JsonValue::from(to);
        let starts = state.find_nodes(NodeLabel::Player, "name", &from_value);
        let targets: HashSet<usize> = state
            .find_nodes(NodeLabel::Player, "name", &to_value)
            .into_iter()
            .collect();
        if starts.is_empty() || targets.is_empty() {
            return Ok(None);
        }

        let mut adjacency: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
        for (rel_idx, rel) in state.relationships.iter().enumerate() {
            adjacency.entry(rel.from).or_default().push((rel.to, rel_idx));
            adjacency.entry(rel.to).or_default().push((rel.from, rel_idx));
        }

        // Breadth-first from every start node; parent links rebuild the path.
        let mut parent: HashMap<usize, (usize, usize)> = HashMap::new();
        let mut depth: HashMap<usize, u32> = HashMap::new();
        let mut queue = VecDeque::new();
        for &start in &starts {
            depth.insert(start, 0);
            queue.push_back(start);
        }

        let mut found = None;
        while let Some(node) = queue.pop_front() {
            let node_depth = depth[&node];
            if node_depth > 0 && targets.contains(&node) {
                found = Some(node);
                break;
            }
            if node_depth == max_hops {
                continue;
            }
            for &(next, rel_idx) in adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                if depth.contains_key(&next) {
                    continue;
                }
                depth.insert(next, node_depth + 1);
                parent.insert(next, (node, rel_idx));
                queue.push_back(next);
            }
        }

        let Some(end) = found else {
            return Ok(None);
        };

        let mut node_path = vec![end];
        let mut rel_path = Vec::new();
        let mut cursor = end;
        while let Some(&(prev, rel_idx)) = parent.get(&cursor) {
            rel_path.push(rel_idx);
            node_path.push(prev);
            cursor = prev;
        }
        node_path.reverse();
        rel_path.reverse();

        Ok(Some(PathProbe {
            hops: rel_path.len() as u32,
            nodes: node_path.iter().map(|&idx| state.display_name(idx)).collect(),
            relationships: rel_path
                .iter()
                .map(|&idx| state.relationships[idx].rel_type.as_str().to_string())
                .collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: JsonValue) -> Properties {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unique_constraint_rejects_whole_batch() {
        let graph = MemoryGraph::new();
        graph
            .declare(&SchemaDeclaration {
                name: "player_name_unique",
                label: "Player",
                property: "name",
                kind: DeclarationKind::Unique,
            })
            .await
            .unwrap();

        let result = graph
            .create_nodes(
                NodeLabel::Player,
                vec![
                    props(json!({"id": 1, "name": "Harry Kane"})),
                    props(json!({"id": 2, "name": "Harry Kane"})),
                ],
            )
            .await;
        assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
        assert!(graph.nodes(NodeLabel::Player).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redeclaring_same_index_is_a_no_op() {
        let graph = MemoryGraph::new();
        let declaration = SchemaDeclaration {
            name: "team_id",
            label: "Team",
            property: "id",
            kind: DeclarationKind::Index,
        };
        graph.declare(&declaration).await.unwrap();
        graph.declare(&declaration).await.unwrap();

        let conflicting = SchemaDeclaration {
            property: "name",
            ..declaration
        };
        assert!(matches!(
            graph.declare(&conflicting).await,
            Err(StorageError::SchemaConflict(_))
        ));
        assert_eq!(graph.declarations().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_relationship_requires_both_endpoints() {
        let graph = MemoryGraph::new();
        graph
            .create_nodes(NodeLabel::Player, vec![props(json!({"id": 1, "name": "A"}))])
            .await
            .unwrap();
        graph
            .create_nodes(NodeLabel::Team, vec![props(json!({"id": 10, "name": "T"}))])
            .await
            .unwrap();

        let created = graph
            .create_relationships(
                &RelationshipSpec::PLAYED_FOR,
                vec![
                    RelationshipRow {
                        from: json!(1),
                        to: json!(10),
                        properties: props(json!({"endDate": null, "current": true})),
                    },
                    RelationshipRow {
                        from: json!(1),
                        to: json!(99),
                        properties: Properties::new(),
                    },
                    RelationshipRow {
                        from: JsonValue::Null,
                        to: json!(10),
                        properties: Properties::new(),
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(created, 1);

        let rels = graph.relationships(RelationshipType::PlayedFor).unwrap();
        assert_eq!(rels.len(), 1);
        assert!(!rels[0].2.contains_key("endDate"));
        assert_eq!(rels[0].2.get("current"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_shortest_path_is_undirected_and_bounded() {
        let graph = MemoryGraph::new();
        graph
            .create_nodes(
                NodeLabel::Player,
                vec![
                    props(json!({"id": 1, "name": "Harry Kane", "nationality": "England"})),
                    props(json!({"id": 2, "name": "Bukayo Saka", "nationality": "England"})),
                ],
            )
            .await
            .unwrap();
        graph
            .create_nodes(
                NodeLabel::NationalTeam,
                vec![props(json!({"country": "England", "name": "England National Team"}))],
            )
            .await
            .unwrap();
        graph
            .create_relationships(
                &RelationshipSpec::REPRESENTS,
                vec![
                    RelationshipRow {
                        from: json!(1),
                        to: json!("England"),
                        properties: Properties::new(),
                    },
                    RelationshipRow {
                        from: json!(2),
                        to: json!("England"),
                        properties: Properties::new(),
                    },
                ],
            )
            .await
            .unwrap();

        let probe = graph
            .shortest_path("Harry Kane", "Bukayo Saka", 6)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(probe.hops, 2);
        assert_eq!(
            probe.nodes,
            vec!["Harry Kane", "England National Team", "Bukayo Saka"]
        );
        assert_eq!(probe.relationships, vec!["REPRESENTS", "REPRESENTS"]);

        assert!(graph
            .shortest_path("Harry Kane", "Bukayo Saka", 1)
            .await
            .unwrap()
            .is_none());
        assert!(graph
            .shortest_path("Harry Kane", "Nobody", 6)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_wipe_clears_endpoint_lookups() {
        let graph = MemoryGraph::new();
        graph
            .declare(&SchemaDeclaration {
                name: "player_name_unique",
                label: "Player",
                property: "name",
                kind: DeclarationKind::Unique,
            })
            .await
            .unwrap();
        graph
            .create_nodes(NodeLabel::Player, vec![props(json!({"id": 1, "name": "A"}))])
            .await
            .unwrap();
        graph
            .create_nodes(NodeLabel::Team, vec![props(json!({"id": 10, "name": "T"}))])
            .await
            .unwrap();
        graph.wipe().await.unwrap();

        let row = RelationshipRow {
            from: json!(1),
            to: json!(10),
            properties: Properties::new(),
        };
        let created = graph
            .create_relationships(&RelationshipSpec::PLAYED_FOR, vec![row.clone()])
            .await
            .unwrap();
        assert_eq!(created, 0);

        // Same unique name is free again after the wipe.
        graph
            .create_nodes(NodeLabel::Player, vec![props(json!({"id": 1, "name": "A"}))])
            .await
            .unwrap();
        graph
            .create_nodes(NodeLabel::Team, vec![props(json!({"id": 10, "name": "T"}))])
            .await
            .unwrap();
        let created = graph
            .create_relationships(&RelationshipSpec::PLAYED_FOR, vec![row])
            .await
            .unwrap();
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_unique_check_sees_earlier_batches() {
        let graph = MemoryGraph::new();
        graph
            .declare(&SchemaDeclaration {
                name: "player_name_unique",
                label: "Player",
                property: "name",
                kind: DeclarationKind::Unique,
            })
            .await
            .unwrap();
        graph
            .create_nodes(NodeLabel::Player, vec![props(json!({"id": 1, "name": "A"}))])
            .await
            .unwrap();
        let result = graph
            .create_nodes(NodeLabel::Player, vec![props(json!({"id": 2, "name": "A"}))])
            .await;
        assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
        // Same value under another label is unaffected.
        graph
            .create_nodes(NodeLabel::Team, vec![props(json!({"id": 2, "name": "A"}))])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stitching_large_tables_uses_key_lookups() {
        const NODES: i64 = 20_000;
        let graph = MemoryGraph::new();
        let players = (0..NODES)
            .map(|i| props(json!({"id": i, "name": format!("Player {i}")})))
            .collect();
        let teams = (0..NODES)
            .map(|i| props(json!({"id": i, "name": format!("Team {i}")})))
            .collect();
        graph.create_nodes(NodeLabel::Player, players).await.unwrap();
        graph.create_nodes(NodeLabel::Team, teams).await.unwrap();

        let rows: Vec<RelationshipRow> = (0..NODES * 2)
            .map(|i| RelationshipRow {
                from: json!(i % NODES),
                to: json!((i * 7) % NODES),
                properties: Properties::new(),
            })
            .collect();
        let created = graph
            .create_relationships(&RelationshipSpec::PLAYED_FOR, rows)
            .await
            .unwrap();
        assert_eq!(created, (NODES * 2) as u64);
    }
}
