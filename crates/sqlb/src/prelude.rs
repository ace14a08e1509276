//! Convenient imports for typical `sqlb` usage.
//!
//! ```ignore
//! use sqlb::prelude::*;
//! ```

pub use crate::{
    ColumnDef, ColumnRef, GenericClient, JoinType, Order, Pagination, Registry, ScannedRows,
    SqlbError, SqlbResult, Table, TableMetadata, Token, Value, insert_into, insert_into_columns,
    select, select_count, select_exists, tokens,
};
