use async_trait::async_trait;
use serde::Serialize;

use crate::errors::Result;
use crate::models::{GraphSummary, PathProbe};

/// Property map of a node or relationship. Null values are not stored.
pub type Properties = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeLabel {
    Player,
    Team,
    Manager,
    NationalTeam,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Player => "Player",
            NodeLabel::Team => "Team",
            NodeLabel::Manager => "Manager",
            NodeLabel::NationalTeam => "NationalTeam",
        }
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RelationshipType {
    PlayedFor,
    Represents,
    ManagedBy,
    Managed,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::PlayedFor => "PLAYED_FOR",
            RelationshipType::Represents => "REPRESENTS",
            RelationshipType::ManagedBy => "MANAGED_BY",
            RelationshipType::Managed => "MANAGED",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node located by the value of one of its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub label: NodeLabel,
    pub key: &'static str,
}

/// Shape of a relationship kind: its type and how both endpoints are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipSpec {
    pub rel_type: RelationshipType,
    pub from: Endpoint,
    pub to: Endpoint,
}

impl RelationshipSpec {
    pub const PLAYED_FOR: RelationshipSpec = RelationshipSpec {
        rel_type: RelationshipType::PlayedFor,
        from: Endpoint { label: NodeLabel::Player, key: "id" },
        to: Endpoint { label: NodeLabel::Team, key: "id" },
    };

    pub const REPRESENTS: RelationshipSpec = RelationshipSpec {
        rel_type: RelationshipType::Represents,
        from: Endpoint { label: NodeLabel::Player, key: "id" },
        to: Endpoint { label: NodeLabel::NationalTeam, key: "country" },
    };

    pub const MANAGED_BY: RelationshipSpec = RelationshipSpec {
        rel_type: RelationshipType::ManagedBy,
        from: Endpoint { label: NodeLabel::Player, key: "id" },
        to: Endpoint { label: NodeLabel::Manager, key: "id" },
    };

    pub const MANAGED: RelationshipSpec = RelationshipSpec {
        rel_type: RelationshipType::Managed,
        from: Endpoint { label: NodeLabel::Manager, key: "id" },
        to: Endpoint { label: NodeLabel::Team, key: "id" },
    };
}

/// One relationship to create: endpoint key values plus its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipRow {
    pub from: serde_json::Value,
    pub to: serde_json::Value,
    pub properties: Properties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Index,
    Unique,
}

/// An index or uniqueness constraint on one label/property pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDeclaration {
    pub name: &'static str,
    pub label: &'static str,
    pub property: &'static str,
    pub kind: DeclarationKind,
}

/// The graph store a pipeline run writes to.
///
/// Writes are batch-oriented: every call carries a whole batch and is applied
/// in one round trip. Relationship creation is match-then-create: rows whose
/// endpoints cannot be found produce nothing and do not fail the batch.
#[async_trait]
pub trait GraphStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Round-trips a trivial request to prove the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Declares an index or constraint with "if not exists" semantics.
    /// Returns `StorageError::SchemaConflict` when an incompatible one exists.
    async fn declare(&self, declaration: &SchemaDeclaration) -> Result<()>;

    /// Deletes every node and relationship.
    async fn wipe(&self) -> Result<()>;

    async fn create_nodes(&self, label: NodeLabel, rows: Vec<Properties>) -> Result<u64>;

    async fn create_relationships(
        &self,
        spec: &RelationshipSpec,
        rows: Vec<RelationshipRow>,
    ) -> Result<u64>;

    async fn summarize(&self) -> Result<GraphSummary>;

    /// Shortest undirected path between two players (by name) of at most `max_hops`.
    async fn shortest_path(&self, from: &str, to: &str, max_hops: u32)
        -> Result<Option<PathProbe>>;
}
