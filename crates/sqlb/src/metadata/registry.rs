use super::{Record, TableMetadata};
use crate::table::UseTable;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

struct Entry {
    type_name: &'static str,
    table_name: String,
    metadata: Arc<dyn Any + Send + Sync>,
}

/// Registry of table metadata, keyed by record type.
///
/// Owned by the application's composition root. Tables are registered during
/// setup, after which [`Registry::seal`] forbids further registration. Lookups
/// only need `&self`, so a sealed registry can be shared behind an `Arc`.
///
/// ```
/// use sqlb::{ColumnDef, Registry, TableMetadata};
///
/// #[derive(Default)]
/// struct Account {
///     id: i64,
/// }
///
/// let mut registry = Registry::new();
/// registry.register(
///     TableMetadata::<Account>::builder("accounts")
///         .column(
///             ColumnDef::new("id")
///                 .primary_key()
///                 .insert(|a: &Account| a.id)
///                 .select(|a: &mut Account, v: i64| a.id = v),
///         )
///         .build(&["id"]),
/// );
/// registry.seal();
///
/// let accounts = registry.use_table::<Account>().alias("a").seal();
/// assert_eq!(accounts.alias(), "a");
/// ```
#[derive(Default)]
pub struct Registry {
    entries: HashMap<TypeId, Entry>,
    sealed: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the metadata of record type `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is already registered or the registry is sealed.
    pub fn register<T: Record>(&mut self, metadata: TableMetadata<T>) -> Arc<TableMetadata<T>> {
        let type_name = std::any::type_name::<T>();
        if self.sealed {
            panic!(
                "cannot register table {} for type {}: registry is sealed",
                metadata.name(),
                type_name
            );
        }
        if self.entries.contains_key(&TypeId::of::<T>()) {
            panic!("table for type {type_name} is already registered");
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sqlb.registry",
            table = metadata.name(),
            record = type_name,
            columns = metadata.columns().len(),
            "registered table"
        );

        let table_name = metadata.name().to_string();
        let metadata = Arc::new(metadata);
        self.entries.insert(
            TypeId::of::<T>(),
            Entry {
                type_name,
                table_name,
                metadata: metadata.clone(),
            },
        );
        metadata
    }

    /// Mark setup as complete. Later calls to [`Registry::register`] panic.
    pub fn seal(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "sqlb.registry", tables = self.entries.len(), "registry sealed");

        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Metadata of `T`, if registered.
    pub fn get<T: Record>(&self) -> Option<Arc<TableMetadata<T>>> {
        let entry = self.entries.get(&TypeId::of::<T>())?;
        Arc::clone(&entry.metadata).downcast::<TableMetadata<T>>().ok()
    }

    /// Metadata of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    pub fn lookup<T: Record>(&self) -> Arc<TableMetadata<T>> {
        match self.get::<T>() {
            Some(metadata) => metadata,
            None => panic!("table for type {} is not registered", std::any::type_name::<T>()),
        }
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.values().map(|e| e.table_name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Record type names of every registered table, sorted.
    pub fn record_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.entries.values().map(|e| e.type_name).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a table descriptor for `T`. Name and alias default to the
    /// registered table name.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    pub fn use_table<T: Record>(&self) -> UseTable<T> {
        UseTable::new(self.lookup::<T>())
    }
}
