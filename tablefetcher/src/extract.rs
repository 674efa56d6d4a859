use footstorage::fetch::{Collection, ExtractedCollection, Extraction, RowSource};

/// Pulls every row of `collection`, one page of `page_size` at a time.
///
/// Stops on an empty page or a short page. A failed page ends extraction for
/// this collection: the rows gathered so far are kept and the error is logged
/// and recorded, never returned.
pub async fn fetch_all(
    source: &dyn RowSource,
    collection: Collection,
    page_size: usize,
) -> ExtractedCollection {
    let table = collection.table_name();
    let mut records = Vec::new();

    if page_size == 0 {
        let error = "page size must be positive".to_string();
        log::error!("Error fetching from {}: {}", table, error);
        return ExtractedCollection {
            collection,
            records,
            error: Some(error),
        };
    }

    let mut offset = 0;
    let mut error = None;
    loop {
        match source.fetch_page(table, offset, page_size).await {
            Ok(page) => {
                if page.is_empty() {
                    break;
                }
                let fetched = page.len();
                records.extend(page);
                log::info!(
                    "  Fetched {} records from {} (total: {})",
                    fetched,
                    table,
                    records.len()
                );
                if fetched < page_size {
                    break;
                }
                offset += fetched;
            }
            Err(err) => {
                log::error!("Error fetching from {}: {}", table, err);
                error = Some(err.to_string());
                break;
            }
        }
    }

    ExtractedCollection {
        collection,
        records,
        error,
    }
}

/// Extracts every collection the graph is built from, in a fixed order.
pub async fn extract_all(source: &dyn RowSource, page_size: usize) -> Extraction {
    log::info!("Starting data extraction from {}...", source.name());

    let mut extraction = Extraction::new();
    for collection in Collection::ALL {
        extraction.push(fetch_all(source, collection, page_size).await);
    }

    log::info!("Extraction complete:");
    log::info!("   Players: {}", extraction.records(Collection::Players).len());
    log::info!("   Teams: {}", extraction.records(Collection::Teams).len());
    log::info!("   Managers: {}", extraction.records(Collection::Managers).len());
    for failed in extraction.failed_collections() {
        log::warn!("   {} is incomplete after a fetch error", failed);
    }

    extraction
}
