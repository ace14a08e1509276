//! Fluent SELECT and INSERT statement builders.
//!
//! ## Design
//!
//! - Every call is checked against the calls it may follow; calling out of
//!   order is a programmer error and panics with the expected predecessors.
//! - A statement refers to tables through aliases. One alias denotes exactly
//!   one table instance for the lifetime of a builder.
//! - WHERE and DO UPDATE SET clauses are flat [`Token`] streams. Raw tokens
//!   are trusted SQL; values go through positional `$n` placeholders.
//! - Rendering is deterministic: the same calls always produce the same SQL.

mod insert;
mod pagination;
mod select;
mod state;
mod token;

pub use insert::InsertBuilder;
pub use pagination::Pagination;
pub use select::{JoinType, Order, SelectBuilder, SelectKind};
pub use token::Token;

use crate::column::ColumnRef;
use crate::metadata::Record;
use crate::table::{AnyTable, Table};
use crate::value::Value;
use std::collections::HashMap;
use tokio_postgres::types::ToSql;

/// Start a SELECT of `columns`.
pub fn select(columns: impl IntoIterator<Item = ColumnRef>) -> SelectBuilder {
    SelectBuilder::new(SelectKind::Basic).select(columns)
}

/// Start a `SELECT EXISTS(SELECT 1 ...)`.
pub fn select_exists() -> SelectBuilder {
    SelectBuilder::new(SelectKind::Exists)
}

/// Start a `SELECT COUNT(1) ...`.
pub fn select_count() -> SelectBuilder {
    SelectBuilder::new(SelectKind::Count)
}

/// Start an INSERT of every registered column of `table`.
pub fn insert_into<T: Record>(table: &Table<T>) -> InsertBuilder<T> {
    InsertBuilder::new(table, table.all_columns())
}

/// Start an INSERT of `columns` only. An empty list inserts every column.
pub fn insert_into_columns<T: Record>(
    table: &Table<T>,
    columns: impl IntoIterator<Item = ColumnRef>,
) -> InsertBuilder<T> {
    let columns: Vec<ColumnRef> = columns.into_iter().collect();
    if columns.is_empty() {
        return insert_into(table);
    }
    InsertBuilder::new(table, columns)
}

/// Rendered statement text with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    sql: String,
    args: Vec<Value>,
}

impl BuiltQuery {
    pub(crate) fn new(sql: String, args: Vec<Value>) -> Self {
        Self { sql, args }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Arguments in the form the driver takes them.
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }
}

/// Tables referenced by one statement, by alias and by instance id.
#[derive(Debug, Clone, Default)]
pub(crate) struct AliasRegistry {
    by_alias: HashMap<String, u64>,
    by_uid: HashMap<u64, String>,
}

impl AliasRegistry {
    /// Bind the table's alias to its instance. Registering the same instance
    /// again is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the alias is already bound to another instance.
    pub(crate) fn register(&mut self, table: &dyn AnyTable) {
        let alias = table.alias();
        let uid = table.uid();
        if let Some(&bound) = self.by_alias.get(alias) {
            if bound != uid {
                let owner = self.by_uid.get(&bound).map_or("?", String::as_str);
                panic!("alias {alias} already used by table (alias): {owner} ({alias})");
            }
            return;
        }
        self.by_alias.insert(alias.to_string(), uid);
        self.by_uid.insert(uid, table.name().to_string());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.by_alias.len()
    }
}
