//! Raw model declaration types matching the JSON model document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn default_schema() -> String {
    "public".into()
}

fn default_true() -> bool {
    true
}

/// Declared column type. Serialized as a plain string (`"bigint"`, `"date"`, ...) or
/// `{ "enum": ["A", "B"] }` for a closed set of text values.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnType {
    BigInt,
    Integer,
    Double,
    Text,
    Boolean,
    Date,
    Enum(Vec<String>),
}

impl ColumnType {
    /// PostgreSQL type used in DDL.
    pub fn pg_type(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Text | ColumnType::Enum(_) => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
        }
    }

    /// Short name used in error messages and in the JSON document.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "bigint",
            ColumnType::Integer => "integer",
            ColumnType::Double => "double",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Enum(_) => "enum",
        }
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        match v {
            serde_json::Value::String(s) => match s.to_lowercase().as_str() {
                "bigint" | "int8" => Ok(ColumnType::BigInt),
                "integer" | "int" | "int4" => Ok(ColumnType::Integer),
                "double" | "float" | "float8" => Ok(ColumnType::Double),
                "text" | "string" => Ok(ColumnType::Text),
                "boolean" | "bool" => Ok(ColumnType::Boolean),
                "date" => Ok(ColumnType::Date),
                other => Err(serde::de::Error::custom(format!("unknown column type '{}'", other))),
            },
            serde_json::Value::Object(mut obj) => match obj.remove("enum") {
                Some(serde_json::Value::Array(values)) => {
                    let mut out = Vec::with_capacity(values.len());
                    for v in values {
                        match v {
                            serde_json::Value::String(s) => out.push(s),
                            other => {
                                return Err(serde::de::Error::custom(format!(
                                    "enum values must be strings; got {}",
                                    other
                                )))
                            }
                        }
                    }
                    Ok(ColumnType::Enum(out))
                }
                _ => Err(serde::de::Error::custom(format!(
                    "column type object must be {{ \"enum\": [...] }}; got keys: {:?}",
                    obj.keys().collect::<Vec<_>>()
                ))),
            },
            other => Err(serde::de::Error::custom(format!(
                "column type must be a string or {{ \"enum\": [...] }}; got {}",
                other
            ))),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ColumnType::Enum(values) => serde_json::json!({ "enum": values }).serialize(serializer),
            other => serializer.serialize_str(other.name()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ColumnType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// SQL default expression (e.g. `CURRENT_DATE`).
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationshipConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(default)]
    pub on_update: Option<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
}

impl RelationshipConfig {
    pub fn constraint_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("fk_{}_{}", self.from_table, self.from_column))
    }
}

/// The whole declared data model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
}
