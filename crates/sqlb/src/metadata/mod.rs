//! Declarative per-record column mapping.
//!
//! A [`TableMetadata`] describes, for one record type, which columns exist,
//! which form the primary key, how to extract an insertable [`Value`] from a
//! record and how to write a scanned value back into one. Metadata is built
//! once at startup and handed to a [`Registry`].
//!
//! [`Value`]: crate::value::Value

mod column;
mod registry;

pub use column::{ColumnDef, ColumnMetadata, InsertFn, LoadError, Record, SelectSpec};
pub use registry::Registry;

use crate::keyword::quote_if_keyword;
use std::collections::HashMap;

/// Immutable column mapping of one record type.
pub struct TableMetadata<T> {
    name: String,
    columns: Vec<ColumnMetadata<T>>,
    by_name: HashMap<String, usize>,
}

impl<T: Record> TableMetadata<T> {
    /// Start declaring the table `name`.
    pub fn builder(name: &str) -> TableMetadataBuilder<T> {
        TableMetadataBuilder {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the record type this table maps to.
    pub fn record_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    /// Columns in registration order.
    pub fn columns(&self) -> &[ColumnMetadata<T>] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn primary_key_columns(&self) -> Vec<&ColumnMetadata<T>> {
        self.columns.iter().filter(|c| c.is_primary_key()).collect()
    }

    /// Look up a column by its bare name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata<T>> {
        self.by_name
            .get(&quote_if_keyword(name))
            .map(|&idx| &self.columns[idx])
    }

    /// Look up a column by its bare name.
    ///
    /// # Panics
    ///
    /// Panics if the column is not registered.
    pub fn column(&self, name: &str) -> &ColumnMetadata<T> {
        match self.get_column(name) {
            Some(column) => column,
            None => panic!("column with name {} not found in table {}", name, self.name),
        }
    }

    /// A fresh zero-valued record.
    pub fn new_row(&self) -> T {
        T::default()
    }

    /// Bind a fresh record and return the select accessors of `names`, in the
    /// order requested. An empty list selects every column.
    pub fn select_spec_of_columns<S: AsRef<str>>(&self, names: &[S]) -> (T, Vec<&SelectSpec<T>>) {
        let specs = if names.is_empty() {
            self.columns.iter().map(|c| c.select_spec()).collect()
        } else {
            names
                .iter()
                .map(|name| self.column(name.as_ref()).select_spec())
                .collect()
        };
        (self.new_row(), specs)
    }

    /// Insert extractors of `names`, in the order requested. An empty list
    /// selects every column.
    pub fn insert_spec_of_columns<S: AsRef<str>>(&self, names: &[S]) -> Vec<&InsertFn<T>> {
        if names.is_empty() {
            return self.columns.iter().map(|c| c.insert_spec()).collect();
        }
        names
            .iter()
            .map(|name| self.column(name.as_ref()).insert_spec())
            .collect()
    }
}

/// Builder for [`TableMetadata`].
pub struct TableMetadataBuilder<T> {
    name: String,
    columns: Vec<ColumnMetadata<T>>,
}

impl<T: Record> TableMetadataBuilder<T> {
    /// Add a column. Names colliding with a SQL keyword are double-quoted.
    pub fn column(mut self, def: ColumnDef<T>) -> Self {
        let mut column = def.column;
        column.name = quote_if_keyword(&column.name);
        self.columns.push(column);
        self
    }

    /// Add several columns at once.
    pub fn columns(self, defs: impl IntoIterator<Item = ColumnDef<T>>) -> Self {
        defs.into_iter().fold(self, Self::column)
    }

    /// Finish the declaration.
    ///
    /// `expected_primary_keys` must name exactly the columns marked as primary
    /// key, in any order. It guards against the code drifting from the schema.
    ///
    /// # Panics
    ///
    /// Panics on duplicate column names or a primary key mismatch.
    pub fn build(self, expected_primary_keys: &[&str]) -> TableMetadata<T> {
        let mut by_name = HashMap::with_capacity(self.columns.len());
        let mut primary_keys = Vec::new();
        for (idx, column) in self.columns.iter().enumerate() {
            if by_name.insert(column.name.clone(), idx).is_some() {
                panic!("column with name {} is already added", column.name);
            }
            if column.primary_key {
                primary_keys.push(column.name.clone());
            }
        }

        let mut expected: Vec<String> = expected_primary_keys
            .iter()
            .map(|name| quote_if_keyword(name.trim()))
            .collect();
        primary_keys.sort();
        expected.sort();
        if primary_keys != expected {
            panic!(
                "expected primary keys [{}] for table {}, but got [{}]",
                expected.join(", "),
                self.name,
                primary_keys.join(", ")
            );
        }

        TableMetadata {
            name: self.name,
            columns: self.columns,
            by_name,
        }
    }
}

#[cfg(test)]
mod tests;
