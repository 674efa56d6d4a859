use async_trait::async_trait;
use footstorage::{
    errors::{Result, StorageError},
    fetch::{Collection, Record, RowSource},
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use tablefetcher::{extract_all, fetch_all};

/// Serves fixed tables page by page and fails on request for chosen offsets.
#[derive(Default)]
struct MockRowSource {
    tables: HashMap<&'static str, Vec<Record>>,
    fail_at: HashMap<&'static str, usize>,
    calls: Mutex<Vec<(String, usize, usize)>>,
}

impl MockRowSource {
    fn with_table(mut self, table: &'static str, rows: usize) -> Self {
        let records = (0..rows)
            .map(|i| json!({"id": i, "name": format!("{table}-{i}")}))
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        self.tables.insert(table, records);
        self
    }

    fn failing_at(mut self, table: &'static str, offset: usize) -> Self {
        self.fail_at.insert(table, offset);
        self
    }

    fn calls_for(&self, table: &str) -> Vec<(usize, usize)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _, _)| t == table)
            .map(|(_, offset, limit)| (*offset, *limit))
            .collect()
    }
}

#[async_trait]
impl RowSource for MockRowSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_page(&self, collection: &str, offset: usize, limit: usize) -> Result<Vec<Record>> {
        self.calls
            .lock()
            .unwrap()
            .push((collection.to_string(), offset, limit));

        if self.fail_at.get(collection) == Some(&offset) {
            return Err(StorageError::SyncError(format!("{collection}: connection reset")));
        }

        let rows = self.tables.get(collection).cloned().unwrap_or_default();
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

#[tokio::test]
async fn test_exact_multiple_of_page_size_needs_one_empty_fetch() {
    let source = MockRowSource::default().with_table("players", 4);

    let extracted = fetch_all(&source, Collection::Players, 2).await;

    assert_eq!(extracted.records.len(), 4);
    assert!(extracted.error.is_none());
    assert_eq!(source.calls_for("players"), vec![(0, 2), (2, 2), (4, 2)]);
}

#[tokio::test]
async fn test_short_page_ends_extraction() {
    let source = MockRowSource::default().with_table("teams", 5);

    let extracted = fetch_all(&source, Collection::Teams, 2).await;

    assert_eq!(extracted.records.len(), 5);
    assert_eq!(source.calls_for("teams"), vec![(0, 2), (2, 2), (4, 2)]);
    assert_eq!(extracted.records[4]["name"], json!("teams-4"));
}

#[tokio::test]
async fn test_empty_collection_is_not_an_error() {
    let source = MockRowSource::default();

    let extracted = fetch_all(&source, Collection::Managers, 1000).await;

    assert!(extracted.records.is_empty());
    assert!(extracted.error.is_none());
    assert_eq!(source.calls_for("managers").len(), 1);
}

#[tokio::test]
async fn test_failed_page_keeps_rows_already_fetched() {
    let source = MockRowSource::default()
        .with_table("player_teams", 10)
        .failing_at("player_teams", 6);

    let extracted = fetch_all(&source, Collection::PlayerTeams, 3).await;

    assert_eq!(extracted.records.len(), 6);
    let error = extracted.error.expect("error should be recorded");
    assert!(error.contains("connection reset"));
    assert_eq!(source.calls_for("player_teams").len(), 3);
}

#[tokio::test]
async fn test_zero_page_size_is_reported() {
    let source = MockRowSource::default().with_table("players", 3);

    let extracted = fetch_all(&source, Collection::Players, 0).await;

    assert!(extracted.records.is_empty());
    assert!(extracted.error.is_some());
    assert!(source.calls_for("players").is_empty());
}

#[tokio::test]
async fn test_extract_all_continues_past_a_failed_collection() {
    let source = MockRowSource::default()
        .with_table("players", 3)
        .with_table("teams", 2)
        .with_table("player_teams", 4)
        .failing_at("teams", 0);

    let extraction = extract_all(&source, 1000).await;

    assert_eq!(extraction.collections.len(), Collection::ALL.len());
    assert_eq!(extraction.records(Collection::Players).len(), 3);
    assert!(extraction.records(Collection::Teams).is_empty());
    assert_eq!(extraction.records(Collection::PlayerTeams).len(), 4);
    assert_eq!(extraction.failed_collections(), vec![Collection::Teams]);
}
