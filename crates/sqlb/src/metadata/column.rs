use crate::error::BoxError;
use crate::value::{FromValue, Value};
use std::sync::Arc;
use thiserror::Error;

/// Extracts the insertable value of one column from a record.
pub type InsertFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

type LoadFn<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), LoadError> + Send + Sync>;

/// Failure to write a scanned raw value into a record.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The raw value is not of the column's scan type.
    #[error("{0}")]
    Scan(BoxError),

    /// The column's transform rejected the raw value.
    #[error("{0}")]
    Transform(BoxError),
}

/// Marker for types that can be registered as table records.
///
/// A fresh `Default` instance is the zero value every scanned row starts from.
pub trait Record: Default + Send + 'static {}

impl<T: Default + Send + 'static> Record for T {}

/// Field accessor used when reading a column back into a record.
///
/// The driver fills a raw [`Value`] slot for the column; [`SelectSpec::apply`]
/// converts that raw value and writes it into the record. Columns declared with
/// [`ColumnDef::select_with`] run a fallible domain transform at this point.
pub struct SelectSpec<T> {
    load: LoadFn<T>,
    transform: bool,
}

impl<T> Clone for SelectSpec<T> {
    fn clone(&self) -> Self {
        Self {
            load: Arc::clone(&self.load),
            transform: self.transform,
        }
    }
}

impl<T> SelectSpec<T> {
    /// Write the scanned raw value into `record`.
    pub fn apply(&self, record: &mut T, raw: Value) -> Result<(), LoadError> {
        (self.load)(record, raw)
    }

    /// Whether this column converts its raw value with a deferred transform.
    pub fn has_transform(&self) -> bool {
        self.transform
    }
}

/// Registered metadata of one column.
pub struct ColumnMetadata<T> {
    pub(crate) name: String,
    pub(crate) primary_key: bool,
    insert: Option<InsertFn<T>>,
    select: Option<SelectSpec<T>>,
}

impl<T> ColumnMetadata<T> {
    /// Column name, double-quoted if it collides with a SQL keyword.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this column is the primary key or part of a composite one.
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Insert extractor of this column.
    ///
    /// # Panics
    ///
    /// Panics if the column was registered without one.
    pub fn insert_spec(&self) -> &InsertFn<T> {
        match &self.insert {
            Some(spec) => spec,
            None => panic!("column {} has no insert spec", self.name),
        }
    }

    /// Select accessor of this column.
    ///
    /// # Panics
    ///
    /// Panics if the column was registered without one.
    pub fn select_spec(&self) -> &SelectSpec<T> {
        match &self.select {
            Some(spec) => spec,
            None => panic!("column {} has no select spec", self.name),
        }
    }
}

/// Declarative definition of one column, consumed by
/// [`TableMetadataBuilder::column`](super::TableMetadataBuilder::column).
///
/// ```
/// use sqlb::ColumnDef;
///
/// #[derive(Default)]
/// struct Account {
///     id: i64,
///     balance: String,
/// }
///
/// let id = ColumnDef::<Account>::new("id")
///     .primary_key()
///     .insert(|a| a.id)
///     .select(|a, v: i64| a.id = v);
/// assert!(id.is_primary_key());
/// ```
pub struct ColumnDef<T> {
    pub(crate) column: ColumnMetadata<T>,
}

impl<T: Record> ColumnDef<T> {
    pub fn new(name: &str) -> Self {
        Self {
            column: ColumnMetadata {
                name: name.trim().to_string(),
                primary_key: false,
                insert: None,
                select: None,
            },
        }
    }

    /// Mark this column as the primary key or a part of a composite one.
    pub fn primary_key(mut self) -> Self {
        self.column.primary_key = true;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.column.primary_key
    }

    /// Set how the column value is extracted from a record for INSERT.
    pub fn insert<V, F>(mut self, extract: F) -> Self
    where
        V: Into<Value> + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.column.insert = Some(Arc::new(move |record: &T| extract(record).into()));
        self
    }

    /// Read the scanned value straight into a field.
    pub fn select<V, F>(mut self, assign: F) -> Self
    where
        V: FromValue + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.column.select = Some(SelectSpec {
            load: Arc::new(move |record: &mut T, raw: Value| -> Result<(), LoadError> {
                assign(record, V::from_value(raw).map_err(LoadError::Scan)?);
                Ok(())
            }),
            transform: false,
        });
        self
    }

    /// Scan the column as `V` and convert it into the domain field afterwards.
    ///
    /// Typical for values stored in an encoded form, e.g. a money amount kept
    /// as `"100usd"` text.
    pub fn select_with<V, F>(mut self, transform: F) -> Self
    where
        V: FromValue + 'static,
        F: Fn(&mut T, V) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.column.select = Some(SelectSpec {
            load: Arc::new(move |record: &mut T, raw: Value| -> Result<(), LoadError> {
                let scanned = V::from_value(raw).map_err(LoadError::Scan)?;
                transform(record, scanned).map_err(LoadError::Transform)
            }),
            transform: true,
        });
        self
    }
}
