//! Resolved entity model: declaration validated and flattened for runtime use.

use crate::config::ColumnType;
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Whether the column has a DB default; the primary key always does.
    pub has_default: bool,
    pub primary_key: bool,
}

impl ColumnInfo {
    /// Must be supplied on create.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.has_default && !self.primary_key
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub schema_name: String,
    pub table_name: String,
    pub pk_column: String,
    pub columns: Vec<ColumnInfo>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Immutable registry of entities, built once at start-up.
#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub entities: Vec<ResolvedEntity>,
}

impl ResolvedModel {
    /// Look up an entity by its storage (table) name.
    pub fn entity(&self, table: &str) -> Result<&ResolvedEntity, AppError> {
        tracing::debug!(table = %table, "resolving entity");
        self.entities
            .iter()
            .find(|e| e.table_name == table)
            .ok_or_else(|| {
                tracing::warn!(table = %table, "no entity registered for table");
                AppError::NotFound(format!("table '{}' not found", table))
            })
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.table_name.as_str())
    }
}
