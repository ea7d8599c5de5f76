//! Apply the model to the database: CREATE SCHEMA and CREATE TABLE with constraints.
//! Idempotent: every statement is IF NOT EXISTS, so it runs on every start.

use crate::config::{creation_order, validate, ColumnConfig, ColumnType, ModelConfig, RelationshipConfig, TableConfig};
use crate::error::AppError;
use crate::sql::{qualified_table, quoted};
use sqlx::PgPool;

fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn column_def(table: &TableConfig, c: &ColumnConfig) -> String {
    let name = quoted(&c.name);
    if c.name == table.primary_key {
        return format!("{} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY", name);
    }
    let mut def = format!("{} {}", name, c.type_.pg_type());
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(ref d) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(d);
    }
    if let ColumnType::Enum(values) = &c.type_ {
        let allowed: Vec<String> = values.iter().map(|v| literal(v)).collect();
        def.push_str(&format!(" CHECK ({} IN ({}))", name, allowed.join(", ")));
    }
    def
}

fn foreign_key_def(schema: &str, rel: &RelationshipConfig) -> String {
    format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
        quoted(&rel.constraint_name()),
        quoted(&rel.from_column),
        qualified_table(schema, &rel.to_table),
        quoted(&rel.to_column),
        rel.on_update.as_deref().unwrap_or("NO ACTION").to_uppercase(),
        rel.on_delete.as_deref().unwrap_or("NO ACTION").to_uppercase()
    )
}

/// CREATE TABLE IF NOT EXISTS for one table, including unique and foreign key constraints.
pub fn create_table_sql(config: &ModelConfig, table: &TableConfig) -> String {
    let mut defs: Vec<String> = table.columns.iter().map(|c| column_def(table, c)).collect();
    for u in &table.unique {
        let cols: Vec<String> = u.iter().map(|s| quoted(s)).collect();
        defs.push(format!("UNIQUE ({})", cols.join(", ")));
    }
    for rel in config.relationships.iter().filter(|r| r.from_table == table.name) {
        defs.push(foreign_key_def(&config.schema, rel));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(&config.schema, &table.name),
        defs.join(",\n  ")
    )
}

/// Create the schema and every table that does not exist yet. Validates the model first.
pub async fn apply_schema(pool: &PgPool, config: &ModelConfig) -> Result<(), AppError> {
    validate(config)?;
    let order = creation_order(config)?;

    let mut tx = pool.begin().await?;
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(&config.schema)))
        .execute(&mut *tx)
        .await?;
    for table in order {
        let sql = create_table_sql(config, table);
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(&mut *tx).await?;
        if let Some(ref comment) = table.comment {
            sqlx::query(&format!(
                "COMMENT ON TABLE {} IS {}",
                qualified_table(&config.schema, &table.name),
                literal(comment)
            ))
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;
    tracing::info!(tables = config.tables.len(), schema = %config.schema, "schema ready");
    Ok(())
}
