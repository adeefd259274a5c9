//! SQL terminal executor.
//!
//! Translates a pipeline-rewritten [`QueryDescriptor`] into parameterized
//! MySQL and shapes rows into JSON maps. Filters support equality and
//! IS NULL predicates; writes bind the payload in sorted column order so
//! generated SQL is deterministic.

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row, TypeInfo};
use tracing::debug;

use crate::config::db::DbConnection;
use crate::service::db::core::types::{
    AggregateSpec, Operation, QueryDescriptor, QueryParams, QueryResult, QueryRow,
};
use crate::service::traits::RelationalStore;
use crate::tool::error::AppError;

pub struct SqlStore {
    pool: DbConnection,
    log_queries: bool,
}

impl SqlStore {
    pub fn new(pool: DbConnection, log_queries: bool) -> Self {
        Self { pool, log_queries }
    }

    fn log_query(&self, sql: &str) {
        if self.log_queries {
            debug!("executing query: {sql}");
        }
    }

    /// Sorted filter columns; null values become IS NULL and bind nothing.
    fn where_clause(filter: &QueryParams) -> (String, Vec<&Value>) {
        if filter.is_empty() {
            return (String::new(), Vec::new());
        }
        let mut columns: Vec<&String> = filter.keys().collect();
        columns.sort();

        let mut clauses = Vec::with_capacity(columns.len());
        let mut binds = Vec::new();
        for column in columns {
            let value = &filter[column];
            if value.is_null() {
                clauses.push(format!("{column} IS NULL"));
            } else {
                clauses.push(format!("{column} = ?"));
                binds.push(value);
            }
        }
        (format!(" WHERE {}", clauses.join(" AND ")), binds)
    }

    fn bind_value<'q>(
        query: Query<'q, MySql, MySqlArguments>,
        value: &'q Value,
    ) -> Query<'q, MySql, MySqlArguments> {
        match value {
            Value::String(s) => query.bind(s.as_str()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else if let Some(f) = n.as_f64() {
                    query.bind(f)
                } else {
                    query.bind(n.to_string())
                }
            }
            Value::Bool(b) => query.bind(*b),
            Value::Null => query.bind(Option::<String>::None),
            // Arrays and objects are stored as serialized JSON
            other => query.bind(other.to_string()),
        }
    }

    fn bind_all<'q>(
        mut query: Query<'q, MySql, MySqlArguments>,
        values: &[&'q Value],
    ) -> Query<'q, MySql, MySqlArguments> {
        for value in values {
            query = Self::bind_value(query, value);
        }
        query
    }

    async fn find_one(&self, descriptor: &QueryDescriptor) -> Result<QueryResult, AppError> {
        let (where_sql, binds) = Self::where_clause(&descriptor.filter);
        let sql = format!("SELECT * FROM {}{} LIMIT 1", descriptor.model.table(), where_sql);
        self.log_query(&sql);

        let row = Self::bind_all(sqlx::query(&sql), &binds)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        match row {
            Some(row) => Ok(Value::Object(Self::row_to_map(&row)?)),
            None => Ok(Value::Null),
        }
    }

    async fn find_many(&self, descriptor: &QueryDescriptor) -> Result<QueryResult, AppError> {
        let (where_sql, binds) = Self::where_clause(&descriptor.filter);
        let limit_sql = descriptor
            .take
            .map(|take| format!(" LIMIT {take}"))
            .unwrap_or_default();
        let sql = format!(
            "SELECT * FROM {}{}{}",
            descriptor.model.table(),
            where_sql,
            limit_sql
        );
        self.log_query(&sql);

        let rows = Self::bind_all(sqlx::query(&sql), &binds)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            results.push(Value::Object(Self::row_to_map(row)?));
        }
        Ok(Value::Array(results))
    }

    async fn count(&self, descriptor: &QueryDescriptor) -> Result<QueryResult, AppError> {
        let (where_sql, binds) = Self::where_clause(&descriptor.filter);
        let sql = format!("SELECT COUNT(*) FROM {}{}", descriptor.model.table(), where_sql);
        self.log_query(&sql);

        let row = Self::bind_all(sqlx::query(&sql), &binds)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| AppError::DatabaseQuery(format!("failed to read count: {e}")))?;
        Ok(json!(count))
    }

    async fn aggregate(&self, descriptor: &QueryDescriptor) -> Result<QueryResult, AppError> {
        let spec = descriptor.aggregate.as_ref().ok_or_else(|| {
            AppError::InvalidInput("aggregate operation requires an aggregate spec".into())
        })?;
        let (where_sql, binds) = Self::where_clause(&descriptor.filter);
        let sql = Self::aggregate_sql(descriptor.model.table(), spec, &where_sql);
        self.log_query(&sql);

        let row = Self::bind_all(sqlx::query(&sql), &binds)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        let value: Option<f64> = row
            .try_get(0)
            .map_err(|e| AppError::DatabaseQuery(format!("failed to read aggregate: {e}")))?;
        Ok(json!(value))
    }

    /// MySQL surfaces COUNT as LONGLONG and SUM/AVG over integer columns as
    /// NEWDECIMAL, none of which decode as f64; the cast makes the result
    /// column DOUBLE regardless of the aggregated column type.
    fn aggregate_sql(table: &str, spec: &AggregateSpec, where_sql: &str) -> String {
        format!(
            "SELECT CAST({}({}) AS DOUBLE) FROM {}{}",
            spec.func.sql(),
            spec.column,
            table,
            where_sql
        )
    }

    async fn create(&self, descriptor: &QueryDescriptor) -> Result<QueryResult, AppError> {
        let data = descriptor
            .data
            .as_ref()
            .filter(|data| !data.is_empty())
            .ok_or_else(|| AppError::InvalidInput("create payload is empty".into()))?;

        let mut columns: Vec<&String> = data.keys().collect();
        columns.sort();
        let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
        let binds: Vec<&Value> = columns.iter().map(|c| &data[*c]).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            descriptor.model.table(),
            columns
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            placeholders.join(", ")
        );
        self.log_query(&sql);

        let result = Self::bind_all(sqlx::query(&sql), &binds)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(json!({
            "affectedRows": result.rows_affected(),
            "lastInsertId": result.last_insert_id(),
        }))
    }

    async fn update(&self, descriptor: &QueryDescriptor) -> Result<QueryResult, AppError> {
        let data = descriptor
            .data
            .as_ref()
            .filter(|data| !data.is_empty())
            .ok_or_else(|| AppError::InvalidInput("update payload is empty".into()))?;

        let mut set_columns: Vec<&String> = data.keys().collect();
        set_columns.sort();
        let set_sql: Vec<String> = set_columns.iter().map(|c| format!("{c} = ?")).collect();
        let mut binds: Vec<&Value> = set_columns.iter().map(|c| &data[*c]).collect();

        let (where_sql, where_binds) = Self::where_clause(&descriptor.filter);
        binds.extend(where_binds);

        let sql = format!(
            "UPDATE {} SET {}{}",
            descriptor.model.table(),
            set_sql.join(", "),
            where_sql
        );
        self.log_query(&sql);

        let result = Self::bind_all(sqlx::query(&sql), &binds)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(json!({ "affectedRows": result.rows_affected() }))
    }

    /// Physical delete. The pipeline rewrites deletes to soft-delete
    /// updates; this path exists for callers operating below the pipeline.
    async fn delete(&self, descriptor: &QueryDescriptor) -> Result<QueryResult, AppError> {
        let (where_sql, binds) = Self::where_clause(&descriptor.filter);
        if where_sql.is_empty() {
            return Err(AppError::InvalidInput("refusing unfiltered delete".into()));
        }
        let sql = format!("DELETE FROM {}{}", descriptor.model.table(), where_sql);
        self.log_query(&sql);

        let result = Self::bind_all(sqlx::query(&sql), &binds)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(json!({ "affectedRows": result.rows_affected() }))
    }

    fn row_to_map(row: &MySqlRow) -> Result<QueryRow, AppError> {
        let mut result = QueryRow::new();

        for column in row.columns() {
            let name = column.name();
            let value = match column.type_info().name() {
                "INT" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" => row
                    .try_get::<Option<i64>, _>(name)
                    .ok()
                    .flatten()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                "FLOAT" | "DOUBLE" | "DECIMAL" | "NUMERIC" => row
                    .try_get::<Option<f64>, _>(name)
                    .ok()
                    .flatten()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BOOLEAN" | "BOOL" | "TINYINT(1)" => row
                    .try_get::<Option<bool>, _>(name)
                    .ok()
                    .flatten()
                    .map(Value::Bool)
                    .unwrap_or(Value::Null),
                "DATE" | "DATETIME" | "TIMESTAMP" => row
                    .try_get::<Option<chrono::NaiveDateTime>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| Value::String(v.to_string()))
                    .unwrap_or(Value::Null),
                _ => row
                    .try_get::<Option<String>, _>(name)
                    .ok()
                    .flatten()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            };
            result.insert(name.to_string(), value);
        }

        Ok(result)
    }
}

#[async_trait]
impl RelationalStore for SqlStore {
    async fn execute(&self, query: &QueryDescriptor) -> Result<QueryResult, AppError> {
        match query.operation {
            Operation::FindOne => self.find_one(query).await,
            Operation::FindMany => self.find_many(query).await,
            Operation::Count => self.count(query).await,
            Operation::Aggregate => self.aggregate(query).await,
            Operation::Create => self.create(query).await,
            Operation::Update | Operation::UpdateMany => self.update(query).await,
            Operation::Delete | Operation::DeleteMany => self.delete(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::db::core::types::{AggFunc, Model};
    use serde_json::json;

    #[test]
    fn aggregates_are_cast_to_double() {
        let count = AggregateSpec {
            func: AggFunc::Count,
            column: "id".to_string(),
        };
        assert_eq!(
            SqlStore::aggregate_sql(Model::Job.table(), &count, ""),
            "SELECT CAST(COUNT(id) AS DOUBLE) FROM jobs"
        );

        let avg = AggregateSpec {
            func: AggFunc::Avg,
            column: "salary".to_string(),
        };
        let mut filter = QueryParams::new();
        filter.insert("status".to_string(), json!("open"));
        let (where_sql, binds) = SqlStore::where_clause(&filter);
        assert_eq!(binds.len(), 1);
        assert_eq!(
            SqlStore::aggregate_sql(Model::Job.table(), &avg, &where_sql),
            "SELECT CAST(AVG(salary) AS DOUBLE) FROM jobs WHERE status = ?"
        );
    }

    #[test]
    fn where_clause_sorts_columns_and_skips_null_binds() {
        let mut filter = QueryParams::new();
        filter.insert("status".to_string(), json!("open"));
        filter.insert("deletedAt".to_string(), Value::Null);
        filter.insert("city".to_string(), json!("Berlin"));

        let (sql, binds) = SqlStore::where_clause(&filter);
        assert_eq!(sql, " WHERE city = ? AND deletedAt IS NULL AND status = ?");
        assert_eq!(binds.len(), 2);
    }
}
