use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::config::BatchConfig;
use crate::errors::Result;
use crate::mapper;
use crate::models::{LoadReport, PlayerRow, SourceData, UnresolvedReferences};
use crate::store::{GraphStore, NodeLabel, Properties, RelationshipRow, RelationshipSpec};

const UNRESOLVED_SAMPLE_LIMIT: usize = 5;

/// Splits `rows` into batches of `size`; `None` keeps everything in one batch.
fn batches<T>(rows: &[T], size: Option<usize>) -> impl Iterator<Item = &[T]> {
    let size = size.filter(|s| *s > 0).unwrap_or(rows.len().max(1));
    rows.chunks(size)
}

/// Natural keys of the nodes a run has written, per endpoint.
#[derive(Debug, Default)]
struct KeyIndex {
    players: HashSet<String>,
    teams: HashSet<String>,
    managers: HashSet<String>,
    countries: HashSet<String>,
}

impl KeyIndex {
    fn keys(&self, label: NodeLabel) -> &HashSet<String> {
        match label {
            NodeLabel::Player => &self.players,
            NodeLabel::Team => &self.teams,
            NodeLabel::Manager => &self.managers,
            NodeLabel::NationalTeam => &self.countries,
        }
    }
}

fn key_of(props: &Properties, key: &str) -> Option<String> {
    props.get(key).filter(|v| !v.is_null()).map(|v| v.to_string())
}

/// Rebuilds the graph from a [`SourceData`] snapshot.
///
/// Stages run strictly in order: reset, node loading, national team synthesis
/// and relationship stitching. Every write is a batch; nothing is updated in place.
pub struct GraphSynchronizer {
    store: Arc<dyn GraphStore>,
    batches: BatchConfig,
}

impl GraphSynchronizer {
    pub fn new(store: Arc<dyn GraphStore>, batches: BatchConfig) -> Self {
        Self { store, batches }
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batches
    }

    /// Deletes every node and relationship in the target graph.
    pub async fn reset(&self) -> Result<()> {
        log::info!("Cleaning graph store ({})...", self.store.name());
        self.store.wipe().await?;
        log::info!("Graph store cleaned");
        Ok(())
    }

    /// Creates one node per row, one store round trip per batch.
    pub async fn load_nodes(
        &self,
        label: NodeLabel,
        rows: Vec<Properties>,
        batch_size: Option<usize>,
    ) -> Result<u64> {
        let total = rows.len();
        log::info!("Creating {} {} nodes...", total, label);

        let mut created = 0u64;
        let mut written = 0usize;
        for batch in batches(&rows, batch_size) {
            created += self.store.create_nodes(label, batch.to_vec()).await?;
            written += batch.len();
            log::info!("  Created {} / {} {} nodes", written, total, label);
        }
        Ok(created)
    }

    /// Creates one NationalTeam per distinct nationality among `players`.
    pub async fn synthesize_national_teams(&self, players: &[PlayerRow]) -> Result<u64> {
        log::info!("Creating national team nodes...");
        let countries: BTreeSet<&str> = players.iter().filter_map(PlayerRow::country).collect();
        let rows = countries
            .into_iter()
            .map(mapper::national_team_properties)
            .collect();
        let created = self
            .load_nodes(NodeLabel::NationalTeam, rows, self.batches.national_team_batch)
            .await?;
        log::info!("  Created {} national team nodes", created);
        Ok(created)
    }

    /// Matches both endpoints of each mapped record by natural key and creates
    /// the relationship only when both exist. Misses are skipped, not errors.
    pub async fn stitch<R, F>(
        &self,
        records: &[R],
        spec: &RelationshipSpec,
        mapper: F,
        batch_size: Option<usize>,
    ) -> Result<u64>
    where
        F: Fn(&R) -> Option<RelationshipRow>,
    {
        let rows: Vec<RelationshipRow> = records.iter().filter_map(mapper).collect();
        log::info!("  Creating {} relationships ({} candidates)...", spec.rel_type, rows.len());

        let mut created = 0u64;
        for batch in batches(&rows, batch_size) {
            created += self.store.create_relationships(spec, batch.to_vec()).await?;
        }
        log::info!("    Created {} {} relationships", created, spec.rel_type);
        Ok(created)
    }

    /// Runs every write stage against `data`, starting from an empty graph.
    pub async fn rebuild(&self, data: &SourceData) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let mut keys = KeyIndex::default();

        self.reset().await?;

        let players: Vec<Properties> = data.players.iter().map(mapper::player_properties).collect();
        keys.players = players.iter().filter_map(|p| key_of(p, "id")).collect();
        let created = self
            .load_nodes(NodeLabel::Player, players, self.batches.player_batch)
            .await?;
        report.nodes.insert(NodeLabel::Player.to_string(), created);

        let teams: Vec<Properties> = data.teams.iter().map(mapper::team_properties).collect();
        keys.teams = teams.iter().filter_map(|t| key_of(t, "id")).collect();
        let created = self
            .load_nodes(NodeLabel::Team, teams, self.batches.team_batch)
            .await?;
        report.nodes.insert(NodeLabel::Team.to_string(), created);

        let managers: Vec<Properties> =
            data.managers.iter().map(mapper::manager_properties).collect();
        keys.managers = managers.iter().filter_map(|m| key_of(m, "id")).collect();
        let created = self
            .load_nodes(NodeLabel::Manager, managers, self.batches.manager_batch)
            .await?;
        report.nodes.insert(NodeLabel::Manager.to_string(), created);

        let created = self.synthesize_national_teams(&data.players).await?;
        keys.countries = data
            .players
            .iter()
            .filter_map(PlayerRow::country)
            .map(|c| serde_json::Value::from(c).to_string())
            .collect();
        report.nodes.insert(NodeLabel::NationalTeam.to_string(), created);

        log::info!("Creating relationships...");

        report.unresolved.push(unresolved(
            &data.player_teams,
            &RelationshipSpec::PLAYED_FOR,
            mapper::played_for,
            &keys,
        ));
        let created = self
            .stitch(
                &data.player_teams,
                &RelationshipSpec::PLAYED_FOR,
                mapper::played_for,
                self.batches.played_for_batch,
            )
            .await?;
        report.relationships.insert(RelationshipSpec::PLAYED_FOR.rel_type.to_string(), created);

        report.unresolved.push(unresolved(
            &data.players,
            &RelationshipSpec::REPRESENTS,
            mapper::represents,
            &keys,
        ));
        let created = self
            .stitch(
                &data.players,
                &RelationshipSpec::REPRESENTS,
                mapper::represents,
                self.batches.represents_batch,
            )
            .await?;
        report.relationships.insert(RelationshipSpec::REPRESENTS.rel_type.to_string(), created);

        if data.player_managers.is_empty() {
            log::info!("  No player-manager associations, skipping MANAGED_BY");
        } else {
            report.unresolved.push(unresolved(
                &data.player_managers,
                &RelationshipSpec::MANAGED_BY,
                mapper::managed_by,
                &keys,
            ));
            let created = self
                .stitch(
                    &data.player_managers,
                    &RelationshipSpec::MANAGED_BY,
                    mapper::managed_by,
                    self.batches.managed_by_batch,
                )
                .await?;
            report.relationships.insert(RelationshipSpec::MANAGED_BY.rel_type.to_string(), created);
        }

        if data.manager_teams.is_empty() {
            log::info!("  No manager-team associations, skipping MANAGED");
        } else {
            report.unresolved.push(unresolved(
                &data.manager_teams,
                &RelationshipSpec::MANAGED,
                mapper::managed,
                &keys,
            ));
            let created = self
                .stitch(
                    &data.manager_teams,
                    &RelationshipSpec::MANAGED,
                    mapper::managed,
                    self.batches.managed_batch,
                )
                .await?;
            report.relationships.insert(RelationshipSpec::MANAGED.rel_type.to_string(), created);
        }

        report.unresolved.retain(|u| !u.is_empty());
        for entry in &report.unresolved {
            log::warn!(
                "{}: {} records with unknown source endpoint, {} with unknown target endpoint (e.g. {})",
                entry.relationship,
                entry.missing_from,
                entry.missing_to,
                entry.samples.join(", ")
            );
        }

        Ok(report)
    }
}

/// Counts mapped records whose endpoints are absent from `keys`.
fn unresolved<R, F>(
    records: &[R],
    spec: &RelationshipSpec,
    mapper: F,
    keys: &KeyIndex,
) -> UnresolvedReferences
where
    F: Fn(&R) -> Option<RelationshipRow>,
{
    let mut report = UnresolvedReferences {
        relationship: spec.rel_type.to_string(),
        ..Default::default()
    };
    let from_keys = keys.keys(spec.from.label);
    let to_keys = keys.keys(spec.to.label);

    for row in records.iter().filter_map(mapper) {
        let from = row.from.to_string();
        let to = row.to.to_string();
        let from_missing = row.from.is_null() || !from_keys.contains(&from);
        let to_missing = row.to.is_null() || !to_keys.contains(&to);
        if from_missing {
            report.missing_from += 1;
        }
        if to_missing {
            report.missing_to += 1;
        }
        if (from_missing || to_missing) && report.samples.len() < UNRESOLVED_SAMPLE_LIMIT {
            report.samples.push(format!(
                "{}.{}={} -> {}.{}={}",
                spec.from.label, spec.from.key, from, spec.to.label, spec.to.key, to
            ));
        }
    }
    report
}
