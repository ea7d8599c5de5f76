//! Model validation: identifiers, primary keys and referential integrity.

use crate::config::{ColumnType, ModelConfig, TableConfig};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::{HashMap, HashSet};

const REFERENTIAL_ACTIONS: &[&str] = &["CASCADE", "SET NULL", "SET DEFAULT", "RESTRICT", "NO ACTION"];

const IDENTIFIER_PATTERN: &str = r"^[a-z_][a-z0-9_]{0,62}$";

fn check_identifier(name: &str) -> Result<(), ConfigError> {
    let re = Regex::new(IDENTIFIER_PATTERN)
        .map_err(|e| ConfigError::Validation(format!("identifier pattern: {}", e)))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

fn check_action(action: Option<&str>) -> Result<(), ConfigError> {
    match action {
        Some(a) if !REFERENTIAL_ACTIONS.contains(&a.to_uppercase().as_str()) => Err(
            ConfigError::Validation(format!("unsupported referential action '{}'", a)),
        ),
        _ => Ok(()),
    }
}

fn validate_table(t: &TableConfig) -> Result<(), ConfigError> {
    check_identifier(&t.name)?;
    let mut seen = HashSet::new();
    for c in &t.columns {
        check_identifier(&c.name)?;
        if !seen.insert(c.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "column",
                name: format!("{}.{}", t.name, c.name),
            });
        }
        if let ColumnType::Enum(values) = &c.type_ {
            if values.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "enum column {}.{} has no values",
                    t.name, c.name
                )));
            }
        }
    }
    let pk = t
        .columns
        .iter()
        .find(|c| c.name == t.primary_key)
        .ok_or_else(|| ConfigError::InvalidPrimaryKey {
            table: t.name.clone(),
            column: t.primary_key.clone(),
        })?;
    if pk.type_ != ColumnType::BigInt {
        return Err(ConfigError::InvalidPrimaryKey {
            table: t.name.clone(),
            column: t.primary_key.clone(),
        });
    }
    for group in &t.unique {
        if group.is_empty() {
            return Err(ConfigError::Validation(format!("empty unique constraint on {}", t.name)));
        }
        for col in group {
            if !seen.contains(col.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    name: format!("{}.{}", t.name, col),
                });
            }
        }
    }
    Ok(())
}

pub fn validate(config: &ModelConfig) -> Result<(), ConfigError> {
    check_identifier(&config.schema)?;
    if config.tables.is_empty() {
        return Err(ConfigError::Validation("at least one table required".into()));
    }

    let mut columns_by_table: HashMap<&str, HashSet<&str>> = HashMap::new();
    for t in &config.tables {
        validate_table(t)?;
        let cols = t.columns.iter().map(|c| c.name.as_str()).collect();
        if columns_by_table.insert(t.name.as_str(), cols).is_some() {
            return Err(ConfigError::Duplicate {
                kind: "table",
                name: t.name.clone(),
            });
        }
    }

    let mut constraint_names = HashSet::new();
    for rel in &config.relationships {
        for (table, column) in [(&rel.from_table, &rel.from_column), (&rel.to_table, &rel.to_column)] {
            let cols = columns_by_table
                .get(table.as_str())
                .ok_or_else(|| ConfigError::MissingReference {
                    kind: "table",
                    name: table.clone(),
                })?;
            if !cols.contains(column.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    name: format!("{}.{}", table, column),
                });
            }
        }
        let name = rel.constraint_name();
        check_identifier(&name)?;
        if !constraint_names.insert(name.clone()) {
            return Err(ConfigError::Duplicate {
                kind: "relationship",
                name,
            });
        }
        check_action(rel.on_delete.as_deref())?;
        check_action(rel.on_update.as_deref())?;
    }
    Ok(())
}
