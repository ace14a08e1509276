//! Row correlation: rebuild per-table records from flat scanned rows.
//!
//! A SELECT over several tables comes back from the driver as one flat list
//! of values per row. [`ScanLayout`] records, once per statement, which
//! positions of that list belong to which table alias. Correlating a
//! [`RowSource`] against the layout yields [`ScannedRows`]: one logical row
//! per physical row, holding a record per alias.
//!
//! ```ignore
//! let mut rows = select(t1.all_columns())
//!     .select(t2.columns(&["pk3", "amount"]))
//!     .from(&t1)
//!     .from(&t2)
//!     .scan_rows(source)?;
//! while rows.advance() {
//!     let a = t1.read_from_row(&mut rows);
//!     let b = t2.read_from_row(&mut rows);
//! }
//! ```

use crate::builder::{SelectBuilder, SelectKind};
use crate::column::ColumnRef;
use crate::error::{SqlbError, SqlbResult};
use crate::metadata::Record;
use crate::table::AnyTable;
use crate::value::Value;
use std::any::{Any, type_name};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Forward-only source of physical rows, such as a driver result set.
pub trait RowSource {
    /// Move to the next row. Returns `false` once the rows are exhausted.
    fn advance(&mut self) -> bool;

    /// Fill `dest` with the current row's values, one slot per selected
    /// column in select-list order.
    fn scan(&mut self, dest: &mut [Value]) -> SqlbResult<()>;

    /// Release the source. Calling it more than once is harmless.
    fn close(&mut self);
}

impl<R: RowSource + ?Sized> RowSource for &mut R {
    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn scan(&mut self, dest: &mut [Value]) -> SqlbResult<()> {
        (**self).scan(dest)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Rows already decoded into [`Value`]s, e.g. fetched up front or built by
/// hand in tests.
#[derive(Debug, Default)]
pub struct MemoryRows {
    pending: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl MemoryRows {
    pub fn new(rows: impl IntoIterator<Item = Vec<Value>>) -> Self {
        Self {
            pending: rows.into_iter().collect(),
            current: None,
        }
    }
}

impl RowSource for MemoryRows {
    fn advance(&mut self) -> bool {
        self.current = self.pending.pop_front();
        self.current.is_some()
    }

    fn scan(&mut self, dest: &mut [Value]) -> SqlbResult<()> {
        let Some(row) = self.current.as_mut() else {
            return Err(SqlbError::Other("no current row".to_string()));
        };
        if row.len() != dest.len() {
            return Err(SqlbError::Other(format!(
                "row has {} values, expected {}",
                row.len(),
                dest.len()
            )));
        }
        for (slot, value) in dest.iter_mut().zip(row.iter_mut()) {
            *slot = std::mem::take(value);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.pending.clear();
        self.current = None;
    }
}

struct AliasLayout {
    table: Arc<dyn AnyTable>,
    /// Distinct column names of this alias, in select-list order.
    columns: Vec<String>,
    /// Position in the flat row of each entry of `columns`.
    positions: Vec<usize>,
}

/// Mapping from a statement's flat select list to its table aliases.
pub struct ScanLayout {
    width: usize,
    tables: Vec<AliasLayout>,
}

impl ScanLayout {
    /// Build the layout of `columns`. A column selected twice is read from
    /// its first position.
    pub fn new(columns: &[ColumnRef]) -> Self {
        let mut tables: Vec<AliasLayout> = Vec::new();
        let mut by_alias: HashMap<&str, usize> = HashMap::new();
        for (position, column) in columns.iter().enumerate() {
            let idx = *by_alias.entry(column.table_alias()).or_insert_with(|| {
                tables.push(AliasLayout {
                    table: Arc::clone(&column.table),
                    columns: Vec::new(),
                    positions: Vec::new(),
                });
                tables.len() - 1
            });
            let layout = &mut tables[idx];
            if layout.columns.iter().any(|c| c == column.name_only()) {
                continue;
            }
            layout.columns.push(column.name_only().to_string());
            layout.positions.push(position);
        }
        Self {
            width: columns.len(),
            tables,
        }
    }

    /// Number of values in one physical row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Aliases in order of first appearance.
    pub fn aliases(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table.alias()).collect()
    }

    /// Read every row of `source` and build its records. The source is
    /// closed whether or not correlation succeeds.
    pub fn correlate<R: RowSource>(&self, mut source: R) -> SqlbResult<ScannedRows> {
        let result = self.correlate_rows(&mut source);
        source.close();
        let rows = result?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sqlb.scan",
            rows = rows.len(),
            tables = self.tables.len(),
            columns = self.width,
            "correlated rows"
        );

        Ok(ScannedRows::new(rows))
    }

    fn correlate_rows<R: RowSource>(&self, source: &mut R) -> SqlbResult<Vec<LogicalRow>> {
        let mut rows = Vec::new();
        let mut dest = vec![Value::Null; self.width];
        while source.advance() {
            let row = rows.len();
            dest.fill(Value::Null);
            source.scan(&mut dest).map_err(|e| match e {
                SqlbError::Scan { .. } => e,
                other => SqlbError::scan(row, other.to_string()),
            })?;

            let mut cells = HashMap::with_capacity(self.tables.len());
            for layout in &self.tables {
                let raw: Vec<Value> = layout
                    .positions
                    .iter()
                    .map(|&p| std::mem::take(&mut dest[p]))
                    .collect();
                let record = layout.table.load_record(&layout.columns, raw, row)?;
                cells.insert(
                    layout.table.alias().to_string(),
                    Cell {
                        record: Some(record),
                        record_type: layout.table.record_type(),
                    },
                );
            }
            rows.push(cells);
        }
        Ok(rows)
    }
}

struct Cell {
    record: Option<Box<dyn Any + Send>>,
    record_type: &'static str,
}

type LogicalRow = HashMap<String, Cell>;

/// Correlated rows of one SELECT, consumed forward-only.
///
/// Call [`ScannedRows::advance`] before reading each row, then take every
/// alias's record with [`ScannedRows::get_table`] (or
/// [`Table::read_from_row`](crate::Table::read_from_row)) before advancing
/// again.
pub struct ScannedRows {
    rows: Vec<LogicalRow>,
    cursor: Option<usize>,
}

impl ScannedRows {
    fn new(rows: Vec<LogicalRow>) -> Self {
        Self { rows, cursor: None }
    }

    /// Number of logical rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Move to the next row. Returns `false` once all rows are consumed.
    ///
    /// # Panics
    ///
    /// Panics if a record of the current row was not read.
    pub fn advance(&mut self) -> bool {
        let next = match self.cursor {
            None => 0,
            Some(current) => {
                if let Some(row) = self.rows.get(current) {
                    if row.values().any(|cell| cell.record.is_some()) {
                        panic!("not all columns are read before moving to the next row");
                    }
                }
                current + 1
            }
        };
        self.cursor = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    /// Take the record of `alias` from the current row.
    ///
    /// # Panics
    ///
    /// Panics if [`ScannedRows::advance`] has not moved onto a row, the
    /// alias is not in the select list, its record was already taken, or it
    /// holds another record type.
    pub fn get_table<T: Record>(&mut self, alias: &str) -> T {
        let row = match self.cursor {
            Some(idx) if idx < self.rows.len() => &mut self.rows[idx],
            _ => panic!("require calls advance() first"),
        };
        let Some(cell) = row.get_mut(alias) else {
            panic!("table with alias {alias} is not selected");
        };
        let Some(record) = cell.record.take() else {
            panic!("table with alias {alias} is already read");
        };
        match record.downcast::<T>() {
            Ok(record) => *record,
            Err(_) => panic!(
                "table with alias {alias} holds {}, not {}",
                cell.record_type,
                type_name::<T>()
            ),
        }
    }
}

impl SelectBuilder {
    /// The flat-row layout of this statement's select list.
    pub fn scan_layout(&self) -> ScanLayout {
        ScanLayout::new(self.selected_columns())
    }

    /// Correlate the rows of `source`, fetched with this statement.
    ///
    /// # Panics
    ///
    /// Panics unless this is a basic SELECT.
    pub fn scan_rows<R: RowSource>(&self, source: R) -> SqlbResult<ScannedRows> {
        if self.kind() != SelectKind::Basic {
            panic!("only {} is supported, got {}", SelectKind::Basic, self.kind());
        }
        self.scan_layout().correlate(source)
    }
}
