use std::time::Instant;

use anyhow::Context;
use footstorage::{
    catalog::{STATUS_FAILED, STATUS_SUCCESS},
    config::ProbeConfig,
    errors::StorageError,
    fetch::RowSource,
    models::{RunReport, SourceData},
    schema::ensure_indexes,
    FootStorage,
};
use tablefetcher::extract_all;
use tracing::{info, warn};

/// Per-run knobs that are not batch sizes.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub run_name: String,
    /// Reachability probe after loading; `None` skips it.
    pub probe: Option<ProbeConfig>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            run_name: "migrate".to_string(),
            probe: Some(ProbeConfig::default()),
        }
    }
}

/// Runs one full migration from `source` into the store behind `storage`.
///
/// When `storage` carries a run ledger, the run is recorded there whatever the
/// outcome. Verification failures are logged and never fail the run.
pub async fn run_pipeline(
    source: &dyn RowSource,
    storage: &FootStorage,
    options: &PipelineOptions,
) -> anyhow::Result<RunReport> {
    let run_id = match &storage.catalog {
        Some(catalog) => Some(
            catalog
                .create_run(&options.run_name)
                .context("failed to record run start")?,
        ),
        None => None,
    };

    let outcome = migrate(source, storage, options).await;

    if let (Some(catalog), Some(run_id)) = (&storage.catalog, run_id) {
        let recorded = match &outcome {
            Ok(report) => serde_json::to_string(report)
                .map_err(StorageError::from)
                .and_then(|details| catalog.finish_run(run_id, STATUS_SUCCESS, &details)),
            Err(err) => catalog.finish_run(run_id, STATUS_FAILED, &format!("{err:#}")),
        };
        if let Err(err) = recorded {
            warn!("Failed to record outcome of run {}: {}", run_id, err);
        }
    }

    outcome
}

async fn migrate(
    source: &dyn RowSource,
    storage: &FootStorage,
    options: &PipelineOptions,
) -> anyhow::Result<RunReport> {
    let started = Instant::now();
    let page_size = storage.synchronizer.batch_config().page_size;
    info!(
        "Starting migration from {} into {}...",
        source.name(),
        storage.store.name()
    );

    let (extraction, _) = tokio::join!(
        extract_all(source, page_size),
        ensure_indexes(storage.store.as_ref())
    );

    let (data, skipped_rows) = SourceData::decode(&extraction);
    let mut report = RunReport {
        extracted: extraction
            .collections
            .iter()
            .map(|c| (c.collection, c.records.len()))
            .collect(),
        failed_collections: extraction.failed_collections(),
        skipped_rows,
        ..RunReport::default()
    };

    report.load = storage
        .synchronizer
        .rebuild(&data)
        .await
        .context("graph rebuild failed")?;

    match storage.verifier.summarize().await {
        Ok(summary) => report.summary = Some(summary),
        Err(err) => warn!("Could not read graph summary: {}", err),
    }

    if let Some(probe) = &options.probe {
        match storage
            .verifier
            .probe_path(&probe.from, &probe.to, probe.max_hops)
            .await
        {
            Ok(path) => report.path = path,
            Err(err) => warn!("Path probe failed: {}", err),
        }
    }

    report.elapsed_secs = started.elapsed().as_secs_f64();
    info!("Migration completed in {:.2} seconds", report.elapsed_secs);
    Ok(report)
}
