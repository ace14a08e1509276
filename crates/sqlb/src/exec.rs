//! Running built statements against a [`GenericClient`].
//!
//! [`Executor`] applies an [`ExecConfig`] (timeout, statement logging) around
//! the client calls. The `query*`/`execute` methods on the builders are
//! shorthands that run with the default configuration.

use crate::builder::{BuiltQuery, InsertBuilder, SelectBuilder, SelectKind};
use crate::client::GenericClient;
use crate::config::ExecConfig;
use crate::error::{SqlbError, SqlbResult};
use crate::metadata::Record;
use crate::scan::{RowSource, ScannedRows};
use crate::value::Value;
use std::future::Future;
use std::time::Instant;
use tokio_postgres::Row;

/// Truncate `sql` to at most `max_bytes`, backing off to a char boundary.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Fetched driver rows as a [`RowSource`].
pub struct PgRows {
    rows: std::vec::IntoIter<Row>,
    current: Option<Row>,
    index: usize,
}

impl PgRows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
            current: None,
            index: 0,
        }
    }
}

impl RowSource for PgRows {
    fn advance(&mut self) -> bool {
        if self.current.is_some() {
            self.index += 1;
        }
        self.current = self.rows.next();
        self.current.is_some()
    }

    fn scan(&mut self, dest: &mut [Value]) -> SqlbResult<()> {
        let Some(row) = &self.current else {
            return Err(SqlbError::Other("no current row".to_string()));
        };
        if row.len() != dest.len() {
            return Err(SqlbError::scan(
                self.index,
                format!("row has {} columns, expected {}", row.len(), dest.len()),
            ));
        }
        for (idx, slot) in dest.iter_mut().enumerate() {
            *slot = Value::from_row(row, idx)
                .map_err(|e| SqlbError::scan(self.index, e.to_string()))?;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.rows = Vec::new().into_iter();
        self.current = None;
    }
}

fn require_kind(builder: &SelectBuilder, kind: SelectKind) {
    if builder.kind() != kind {
        panic!("only {} is supported, got {}", kind, builder.kind());
    }
}

/// A client paired with execution settings.
pub struct Executor<C> {
    client: C,
    config: ExecConfig,
}

impl<C: GenericClient> Executor<C> {
    /// Wrap `client` with the default [`ExecConfig`].
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: ExecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    async fn with_timeout<T, F>(&self, future: F) -> SqlbResult<T>
    where
        F: Future<Output = SqlbResult<T>> + Send,
    {
        match self.config.query_timeout {
            Some(timeout) => {
                tokio::pin!(future);
                tokio::select! {
                    result = &mut future => result,
                    _ = tokio::time::sleep(timeout) => {
                        if let Some(cancel_token) = self.client.cancel_token() {
                            tokio::spawn(async move {
                                let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                            });
                        }
                        Err(SqlbError::Timeout(timeout))
                    }
                }
            }
            None => future.await,
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn log_statement(&self, kind: StatementKind, query: &BuiltQuery) {
        #[cfg(feature = "tracing")]
        if self.config.log_sql {
            let sql = match self.config.max_sql_length {
                Some(max) => truncate_sql_bytes(query.sql(), max),
                None => query.sql(),
            };
            tracing::debug!(
                target: "sqlb.sql",
                kind = kind.as_str(),
                params = query.args().len(),
                sql,
                "executing statement"
            );
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn log_done(&self, kind: StatementKind, started: Instant, count: u64) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sqlb.sql",
            kind = kind.as_str(),
            elapsed_us = started.elapsed().as_micros() as u64,
            count,
            "statement finished"
        );
    }

    async fn fetch(&self, kind: StatementKind, query: &BuiltQuery) -> SqlbResult<Vec<Row>> {
        self.log_statement(kind, query);
        let started = Instant::now();
        let params = query.params();
        let rows = self
            .with_timeout(self.client.query(query.sql(), &params))
            .await?;
        self.log_done(kind, started, rows.len() as u64);
        Ok(rows)
    }

    async fn fetch_one(&self, kind: StatementKind, query: &BuiltQuery) -> SqlbResult<Option<Row>> {
        self.log_statement(kind, query);
        let started = Instant::now();
        let params = query.params();
        let row = self
            .with_timeout(self.client.query_opt(query.sql(), &params))
            .await?;
        self.log_done(kind, started, u64::from(row.is_some()));
        Ok(row)
    }

    /// Run a basic SELECT and correlate its rows per table alias.
    ///
    /// # Panics
    ///
    /// Panics unless `builder` is a basic SELECT.
    pub async fn query(&self, builder: &SelectBuilder) -> SqlbResult<ScannedRows> {
        require_kind(builder, SelectKind::Basic);
        let query = builder.build();
        let rows = self.fetch(StatementKind::Select, &query).await?;
        builder.scan_rows(PgRows::new(rows))
    }

    /// Run a SELECT EXISTS.
    ///
    /// # Panics
    ///
    /// Panics unless `builder` was created with [`select_exists`](crate::select_exists).
    pub async fn query_exists(&self, builder: &SelectBuilder) -> SqlbResult<bool> {
        require_kind(builder, SelectKind::Exists);
        let query = builder.build();
        let row = self
            .fetch_one(StatementKind::Exists, &query)
            .await?
            .ok_or_else(|| SqlbError::not_found("SELECT EXISTS returned no rows"))?;
        row.try_get::<_, bool>(0)
            .map_err(|e| SqlbError::decode("exists", e.to_string()))
    }

    /// Run a SELECT COUNT.
    ///
    /// # Panics
    ///
    /// Panics unless `builder` was created with [`select_count`](crate::select_count).
    pub async fn query_count(&self, builder: &SelectBuilder) -> SqlbResult<i64> {
        require_kind(builder, SelectKind::Count);
        let query = builder.build();
        let row = self
            .fetch_one(StatementKind::Count, &query)
            .await?
            .ok_or_else(|| SqlbError::not_found("SELECT COUNT returned no rows"))?;
        row.try_get::<_, i64>(0)
            .map_err(|e| SqlbError::decode("count", e.to_string()))
    }

    /// Run an INSERT and return the number of affected rows.
    pub async fn execute<T: Record>(&self, builder: &InsertBuilder<T>) -> SqlbResult<u64> {
        let query = builder.build();
        self.log_statement(StatementKind::Insert, &query);
        let started = Instant::now();
        let params = query.params();
        let affected = self
            .with_timeout(self.client.execute(query.sql(), &params))
            .await?;
        self.log_done(StatementKind::Insert, started, affected);
        Ok(affected)
    }
}

/// Statement kind as logged.
#[derive(Debug, Clone, Copy)]
enum StatementKind {
    Select,
    Exists,
    Count,
    Insert,
}

impl StatementKind {
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Exists => "exists",
            StatementKind::Count => "count",
            StatementKind::Insert => "insert",
        }
    }
}

impl SelectBuilder {
    /// Run this SELECT on `client` and correlate the rows.
    pub async fn query<C: GenericClient>(&self, client: &C) -> SqlbResult<ScannedRows> {
        Executor::new(client).query(self).await
    }

    /// Run this SELECT EXISTS on `client`.
    pub async fn query_exists<C: GenericClient>(&self, client: &C) -> SqlbResult<bool> {
        Executor::new(client).query_exists(self).await
    }

    /// Run this SELECT COUNT on `client`.
    pub async fn query_count<C: GenericClient>(&self, client: &C) -> SqlbResult<i64> {
        Executor::new(client).query_count(self).await
    }
}

impl<T: Record> InsertBuilder<T> {
    /// Run this INSERT on `client` and return the number of affected rows.
    pub async fn execute<C: GenericClient>(&self, client: &C) -> SqlbResult<u64> {
        Executor::new(client).execute(self).await
    }
}

#[cfg(test)]
mod tests;
