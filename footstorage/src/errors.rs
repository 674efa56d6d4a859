use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Neo4j operation failed: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("SQLite operation failed: {0}")]
    SQLite(#[from] rusqlite::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Schema declaration conflict: {0}")]
    SchemaConflict(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Synchronization failed: {0}")]
    SyncError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
