//! Table descriptors: one use of a registered table within statements.
//!
//! [`UseTable`] is the configurable form handed out by
//! [`Registry::use_table`](crate::Registry::use_table). Sealing it yields a
//! [`Table`], which is immutable and carries an instance id that tells apart
//! two uses of the same table (a self-join, say) within one statement.

use crate::column::ColumnRef;
use crate::error::{SqlbError, SqlbResult};
use crate::keyword::quote_if_keyword;
use crate::metadata::{LoadError, Record, TableMetadata};
use crate::scan::ScannedRows;
use crate::value::Value;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TABLE_UID: AtomicU64 = AtomicU64::new(1);

/// Type-erased view of a sealed table, shared by columns and builders.
pub(crate) trait AnyTable: Send + Sync {
    fn uid(&self) -> u64;
    /// Physical table name used in FROM/JOIN/INSERT INTO.
    fn name(&self) -> &str;
    fn alias(&self) -> &str;
    /// Table name the metadata was registered under.
    fn registered_name(&self) -> &str;
    fn record_type(&self) -> &'static str;
    /// Build a record for one scanned row from the raw values of `columns`.
    fn load_record(&self, columns: &[String], raw: Vec<Value>, row: usize)
    -> SqlbResult<Box<dyn Any + Send>>;
}

/// A registered table being configured for use in statements.
pub struct UseTable<T> {
    metadata: Arc<TableMetadata<T>>,
    name: Option<String>,
    alias: Option<String>,
}

impl<T: Record> UseTable<T> {
    pub(crate) fn new(metadata: Arc<TableMetadata<T>>) -> Self {
        Self {
            metadata,
            name: None,
            alias: None,
        }
    }

    /// Use another physical table name, e.g. one partition of the table.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or a name was already set.
    pub fn table_name(mut self, name: &str) -> Self {
        if name.is_empty() {
            panic!("name cannot be empty");
        }
        if self.name.is_some() {
            panic!("name already set");
        }
        self.name = Some(name.to_string());
        self
    }

    /// Set the alias this table is referred to by within a statement.
    ///
    /// # Panics
    ///
    /// Panics if `alias` is empty or an alias was already set.
    pub fn alias(mut self, alias: &str) -> Self {
        if alias.is_empty() {
            panic!("alias cannot be empty");
        }
        if self.alias.is_some() {
            panic!("alias already set");
        }
        self.alias = Some(alias.to_string());
        self
    }

    /// Freeze name and alias. Both default to the registered table name.
    pub fn seal(self) -> Table<T> {
        let registered = self.metadata.name();
        let name = self.name.unwrap_or_else(|| registered.to_string());
        let alias = self.alias.unwrap_or_else(|| registered.to_string());
        Table {
            inner: Arc::new(TableInner {
                uid: NEXT_TABLE_UID.fetch_add(1, Ordering::Relaxed),
                name,
                alias,
                metadata: self.metadata,
            }),
        }
    }
}

struct TableInner<T> {
    uid: u64,
    name: String,
    alias: String,
    metadata: Arc<TableMetadata<T>>,
}

impl<T: Record> AnyTable for TableInner<T> {
    fn uid(&self) -> u64 {
        self.uid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn alias(&self) -> &str {
        &self.alias
    }

    fn registered_name(&self) -> &str {
        self.metadata.name()
    }

    fn record_type(&self) -> &'static str {
        self.metadata.record_type()
    }

    fn load_record(
        &self,
        columns: &[String],
        raw: Vec<Value>,
        row: usize,
    ) -> SqlbResult<Box<dyn Any + Send>> {
        let (mut record, specs) = self.metadata.select_spec_of_columns(columns);
        for ((spec, value), column) in specs.into_iter().zip(raw).zip(columns) {
            spec.apply(&mut record, value).map_err(|err| match err {
                LoadError::Transform(source) => SqlbError::Transform {
                    row,
                    column: format!("{}.{}", self.alias, column),
                    source,
                },
                LoadError::Scan(source) => {
                    SqlbError::scan(row, format!("{}.{}: {}", self.alias, column, source))
                }
            })?;
        }
        Ok(Box::new(record))
    }
}

/// A sealed table descriptor.
///
/// Cloning is cheap and keeps the instance id, so clones denote the same
/// table within a statement.
pub struct Table<T> {
    inner: Arc<TableInner<T>>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("uid", &self.inner.uid)
            .field("name", &self.inner.name)
            .field("alias", &self.inner.alias)
            .finish()
    }
}

impl<T: Record> Table<T> {
    pub fn uid(&self) -> u64 {
        self.inner.uid
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn alias(&self) -> &str {
        &self.inner.alias
    }

    pub fn metadata(&self) -> &TableMetadata<T> {
        &self.inner.metadata
    }

    pub(crate) fn erased(&self) -> Arc<dyn AnyTable> {
        self.inner.clone()
    }

    fn column_ref(&self, name: &str) -> ColumnRef {
        let column = self.inner.metadata.column(name);
        ColumnRef::new(column.name(), column.is_primary_key(), self.erased())
    }

    /// Columns by name, in the order given. An empty list returns every
    /// registered column in registration order.
    ///
    /// # Panics
    ///
    /// Panics if a name is not a registered column.
    pub fn columns<S: AsRef<str>>(&self, names: &[S]) -> Vec<ColumnRef> {
        if names.is_empty() {
            return self.all_columns();
        }
        names.iter().map(|name| self.column_ref(name.as_ref())).collect()
    }

    pub fn all_columns(&self) -> Vec<ColumnRef> {
        let table = self.erased();
        self.inner
            .metadata
            .columns()
            .iter()
            .map(|c| ColumnRef::new(c.name(), c.is_primary_key(), Arc::clone(&table)))
            .collect()
    }

    /// Every registered column except `names`.
    ///
    /// # Panics
    ///
    /// Panics if `names` is empty.
    pub fn columns_except<S: AsRef<str>>(&self, names: &[S]) -> Vec<ColumnRef> {
        if names.is_empty() {
            panic!("no columns to exclude");
        }
        let except: HashSet<String> = names.iter().map(|n| quote_if_keyword(n.as_ref())).collect();
        self.all_columns()
            .into_iter()
            .filter(|c| !except.contains(c.name_only()))
            .collect()
    }

    /// # Panics
    ///
    /// Panics if the table has no primary key.
    pub fn primary_key_columns(&self) -> Vec<ColumnRef> {
        let columns: Vec<ColumnRef> = self
            .all_columns()
            .into_iter()
            .filter(ColumnRef::is_primary_key)
            .collect();
        if columns.is_empty() {
            panic!("no primary key found in table {}", self.name());
        }
        columns
    }

    /// A single column by name.
    pub fn col(&self, name: &str) -> ColumnRef {
        self.column_ref(name)
    }

    /// Take this table's record from the current row of `rows`.
    pub fn read_from_row(&self, rows: &mut ScannedRows) -> T {
        rows.get_table::<T>(self.alias())
    }

    /// Advance through every remaining row and collect this table's records.
    ///
    /// Only suitable when this table is the sole one in the select list;
    /// otherwise advancing panics on the unread records of the others.
    pub fn read_all_from_rows(&self, rows: &mut ScannedRows) -> Vec<T> {
        let mut records = Vec::with_capacity(rows.len());
        while rows.advance() {
            records.push(self.read_from_row(rows));
        }
        records
    }
}

/// A sealed table of any record type, as accepted by the builders.
#[derive(Clone)]
pub struct TableRef(pub(crate) Arc<dyn AnyTable>);

impl TableRef {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn alias(&self) -> &str {
        self.0.alias()
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRef")
            .field("uid", &self.0.uid())
            .field("name", &self.0.name())
            .field("alias", &self.0.alias())
            .finish()
    }
}

impl<T: Record> From<&Table<T>> for TableRef {
    fn from(table: &Table<T>) -> Self {
        TableRef(table.erased())
    }
}

impl<T: Record> From<Table<T>> for TableRef {
    fn from(table: Table<T>) -> Self {
        TableRef(table.erased())
    }
}
