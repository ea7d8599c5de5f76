//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resolved entity.

use crate::config::ResolvedEntity;
use crate::sql::SqlValue;

/// Quote identifier for PostgreSQL (safe: only from the validated model).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub(crate) fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

fn select_column_list(entity: &ResolvedEntity) -> String {
    entity
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn table_of(entity: &ResolvedEntity) -> String {
    qualified_table(&entity.schema_name, &entity.table_name)
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlValue::BigInt(Some(id)));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(entity),
        table_of(entity),
        quoted(&entity.pk_column),
        n
    );
    q
}

/// SELECT by primary key, locking the row for the rest of the transaction.
pub fn select_by_id_for_update(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = select_by_id(entity, id);
    q.sql.push_str(" FOR UPDATE");
    q
}

/// SELECT one page in primary key order.
pub fn select_page(entity: &ResolvedEntity, skip: i64, limit: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let limit_param = q.push_param(SqlValue::BigInt(Some(limit)));
    let skip_param = q.push_param(SqlValue::BigInt(Some(skip)));
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {} LIMIT ${} OFFSET ${}",
        select_column_list(entity),
        table_of(entity),
        quoted(&entity.pk_column),
        limit_param,
        skip_param
    );
    q
}

/// INSERT the given (column, value) pairs; columns left out take their DB default.
pub fn insert(entity: &ResolvedEntity, values: &[(String, SqlValue)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = table_of(entity);
    let returning = select_column_list(entity);
    if values.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
        return q;
    }
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (name, v) in values {
        let n = q.push_param(v.clone());
        cols.push(quoted(name));
        placeholders.push(format!("${}", n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        returning
    );
    q
}

/// UPDATE by id: SET only the given columns. Callers skip the statement when `values` is empty.
pub fn update(entity: &ResolvedEntity, id: i64, values: &[(String, SqlValue)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(values.len());
    for (name, v) in values {
        let n = q.push_param(v.clone());
        sets.push(format!("{} = ${}", quoted(name), n));
    }
    let id_param = q.push_param(SqlValue::BigInt(Some(id)));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        table_of(entity),
        sets.join(", "),
        quoted(&entity.pk_column),
        id_param,
        select_column_list(entity)
    );
    q
}

/// DELETE by id.
pub fn delete(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlValue::BigInt(Some(id)));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${}",
        table_of(entity),
        quoted(&entity.pk_column),
        n
    );
    q
}
