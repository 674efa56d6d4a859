use std::sync::Arc;

use crate::errors::Result;
use crate::models::{GraphSummary, PathProbe};
use crate::store::GraphStore;

/// Read-only smoke checks against a loaded graph.
pub struct Verifier {
    store: Arc<dyn GraphStore>,
}

impl Verifier {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn summarize(&self) -> Result<GraphSummary> {
        let summary = self.store.summarize().await?;
        log::info!("Graph summary:");
        log::info!("   Players: {}", summary.players);
        log::info!("   Teams: {}", summary.teams);
        log::info!("   Managers: {}", summary.managers);
        log::info!("   National Teams: {}", summary.national_teams);
        log::info!("   Total Relationships: {}", summary.relationships);
        Ok(summary)
    }

    /// Bounded shortest path between two players; `Ok(None)` when unreachable.
    pub async fn probe_path(
        &self,
        from: &str,
        to: &str,
        max_hops: u32,
    ) -> Result<Option<PathProbe>> {
        log::info!("Testing pathfinding {} -> {} (max {} hops)...", from, to, max_hops);
        let probe = self.store.shortest_path(from, to, max_hops).await?;
        match &probe {
            Some(path) => log::info!(
                "Found path from {} to {}: {} steps ({})",
                from,
                to,
                path.hops,
                path.nodes.join(" -> ")
            ),
            None => log::info!("Could not find path between {} and {}", from, to),
        }
        Ok(probe)
    }
}
