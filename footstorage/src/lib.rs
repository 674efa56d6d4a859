pub mod catalog;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod mapper;
pub mod memory;
pub mod models;
pub mod neo4j;
pub mod schema;
pub mod store;
pub mod sync;
pub mod verify;

use crate::catalog::Catalog;
use crate::config::{BatchConfig, GraphConfig};
use crate::errors::Result;
use crate::memory::MemoryGraph;
use crate::neo4j::Neo4jStore;
use crate::store::GraphStore;
use crate::sync::GraphSynchronizer;
use crate::verify::Verifier;
use std::path::Path;
use std::sync::Arc;

/// The main entry point for the `footstorage` library.
///
/// `FootStorage` owns the connection to the target graph store for the
/// duration of one run and hands out the components that work against it:
/// - A `GraphSynchronizer` that rebuilds the graph from extracted source data.
/// - A `Verifier` for read-only summary counts and path probes.
/// - An optional SQLite `Catalog` recording each pipeline run.
///
/// The store connection is released when `FootStorage` is dropped, on every
/// exit path.
///
/// # Example
///
/// ```rust,no_run
/// use footstorage::{FootStorage, config::{BatchConfig, GraphConfig}};
///
/// #[tokio::main]
/// async fn main() {
///     let config = GraphConfig::new("neo4j://localhost:7687", "neo4j", "secret");
///     let storage = FootStorage::connect(&config, BatchConfig::default()).await.unwrap();
///     let summary = storage.verifier.summarize().await.unwrap();
///     println!("{} players", summary.players);
/// }
/// ```
pub struct FootStorage {
    pub store: Arc<dyn GraphStore>,
    pub synchronizer: Arc<GraphSynchronizer>,
    pub verifier: Arc<Verifier>,
    pub catalog: Option<Arc<Catalog>>,
}

impl FootStorage {
    pub fn new(store: Arc<dyn GraphStore>, batches: BatchConfig) -> Self {
        let synchronizer = Arc::new(GraphSynchronizer::new(Arc::clone(&store), batches));
        let verifier = Arc::new(Verifier::new(Arc::clone(&store)));
        Self {
            store,
            synchronizer,
            verifier,
            catalog: None,
        }
    }

    /// Connects to Neo4j. Fails before anything is written if the store is unreachable.
    pub async fn connect(config: &GraphConfig, batches: BatchConfig) -> Result<Self> {
        let store = Neo4jStore::connect(config).await?;
        Ok(Self::new(Arc::new(store), batches))
    }

    /// Uses a fresh in-process graph instead of a remote store.
    pub fn in_memory(batches: BatchConfig) -> Self {
        Self::new(Arc::new(MemoryGraph::new()), batches)
    }

    /// Opens (or creates) the run ledger at `path`.
    pub fn with_catalog(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let catalog = Catalog::open(path)?;
        catalog.initialize_schema()?;
        self.catalog = Some(Arc::new(catalog));
        Ok(self)
    }
}
