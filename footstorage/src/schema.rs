use crate::errors::StorageError;
use crate::store::{DeclarationKind, GraphStore, SchemaDeclaration};

const fn index(name: &'static str, label: &'static str, property: &'static str) -> SchemaDeclaration {
    SchemaDeclaration {
        name,
        label,
        property,
        kind: DeclarationKind::Index,
    }
}

/// Indexes and constraints declared before any bulk write.
pub const DECLARATIONS: [SchemaDeclaration; 8] = [
    index("player_id", "Player", "id"),
    SchemaDeclaration {
        name: "player_name_unique",
        label: "Player",
        property: "name",
        kind: DeclarationKind::Unique,
    },
    index("player_nationality", "Player", "nationality"),
    index("team_id", "Team", "id"),
    index("team_name", "Team", "name"),
    index("manager_id", "Manager", "id"),
    index("national_team_country", "NationalTeam", "country"),
    index("season_year", "Season", "year"),
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReport {
    pub declared: usize,
    pub already_present: usize,
    pub failed: usize,
}

/// Declares every index and constraint. Never fails: a declaration that
/// already exists is ignored, any other failure is logged and skipped.
pub async fn ensure_indexes(store: &dyn GraphStore) -> SchemaReport {
    log::info!("Creating indexes...");
    let mut report = SchemaReport::default();

    for declaration in &DECLARATIONS {
        match store.declare(declaration).await {
            Ok(()) => report.declared += 1,
            Err(StorageError::SchemaConflict(msg)) => {
                log::debug!("Declaration {} already present: {}", declaration.name, msg);
                report.already_present += 1;
            }
            Err(err) => {
                log::warn!("Declaration {} failed: {}", declaration.name, err);
                report.failed += 1;
            }
        }
    }

    log::info!(
        "Indexes ready ({} declared, {} already present, {} failed)",
        report.declared,
        report.already_present,
        report.failed
    );
    report
}
