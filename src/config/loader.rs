//! Load the model declaration (embedded or from a file) and resolve it for runtime use.

use crate::config::resolved::{ColumnInfo, ResolvedEntity, ResolvedModel};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const LENDING_MODEL: &str = include_str!("../../model/lending.json");

/// The lending model shipped with the binary.
pub fn builtin_model() -> Result<ModelConfig, ConfigError> {
    parse_model(LENDING_MODEL)
}

pub fn parse_model(json: &str) -> Result<ModelConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read a model document from disk.
pub async fn load_from_path(path: &Path) -> Result<ModelConfig, ConfigError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_model(&json)
}

/// The model at `path` when given, otherwise the embedded one.
pub async fn load_model(path: Option<&Path>) -> Result<ModelConfig, ConfigError> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading model from file");
            load_from_path(p).await
        }
        None => builtin_model(),
    }
}

/// Build resolved model from the declaration (validates first).
pub fn resolve(config: &ModelConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut entities = Vec::with_capacity(config.tables.len());
    for table in &config.tables {
        let columns = table
            .columns
            .iter()
            .map(|c| {
                let primary_key = c.name == table.primary_key;
                ColumnInfo {
                    name: c.name.clone(),
                    column_type: c.type_.clone(),
                    nullable: c.nullable && !primary_key,
                    has_default: c.default.is_some() || primary_key,
                    primary_key,
                }
            })
            .collect();
        entities.push(ResolvedEntity {
            schema_name: config.schema.clone(),
            table_name: table.name.clone(),
            pk_column: table.primary_key.clone(),
            columns,
        });
    }
    tracing::debug!(tables = entities.len(), "model resolved");
    Ok(ResolvedModel { entities })
}

/// Tables ordered so that every referenced table comes before the tables referencing it.
pub fn creation_order(config: &ModelConfig) -> Result<Vec<&TableConfig>, ConfigError> {
    let mut deps: HashMap<&str, HashSet<&str>> = config
        .tables
        .iter()
        .map(|t| (t.name.as_str(), HashSet::new()))
        .collect();
    for rel in &config.relationships {
        if rel.from_table != rel.to_table {
            if let Some(d) = deps.get_mut(rel.from_table.as_str()) {
                d.insert(rel.to_table.as_str());
            }
        }
    }

    let mut ordered: Vec<&TableConfig> = Vec::with_capacity(config.tables.len());
    let mut placed: HashSet<&str> = HashSet::new();
    while ordered.len() < config.tables.len() {
        let before = ordered.len();
        for t in &config.tables {
            if placed.contains(t.name.as_str()) {
                continue;
            }
            let ready = deps
                .get(t.name.as_str())
                .map(|d| d.iter().all(|dep| placed.contains(dep)))
                .unwrap_or(true);
            if ready {
                placed.insert(t.name.as_str());
                ordered.push(t);
            }
        }
        if ordered.len() == before {
            let stuck: Vec<&str> = config
                .tables
                .iter()
                .map(|t| t.name.as_str())
                .filter(|n| !placed.contains(n))
                .collect();
            return Err(ConfigError::Validation(format!(
                "relationship cycle between tables: {}",
                stuck.join(", ")
            )));
        }
    }
    Ok(ordered)
}
