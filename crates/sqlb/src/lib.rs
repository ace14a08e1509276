//! # sqlb
//!
//! Typed SELECT / INSERT statement building for PostgreSQL, with multi-table
//! row correlation.
//!
//! ## Features
//!
//! - **Declarative mapping**: each record type registers its columns once, with
//!   how to extract an insert value and how to fill a field from a scanned one
//! - **Checked call order**: builder calls out of order panic with the calls
//!   that were expected
//! - **Aliases by instance**: one alias denotes one table instance per
//!   statement, so self-joins are explicit
//! - **Multi-table rows**: a SELECT over several tables comes back as one
//!   record per alias per row
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//!
//! ## Example
//!
//! ```ignore
//! use sqlb::prelude::*;
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     TableMetadata::builder("accounts")
//!         .column(
//!             ColumnDef::new("id")
//!                 .primary_key()
//!                 .insert(|a: &Account| a.id)
//!                 .select(|a: &mut Account, v: i64| a.id = v),
//!         )
//!         .column(
//!             ColumnDef::new("balance")
//!                 .insert(|a: &Account| a.balance)
//!                 .select(|a: &mut Account, v: i64| a.balance = v),
//!         )
//!         .build(&["id"]),
//! );
//! registry.seal();
//!
//! let accounts = registry.use_table::<Account>().alias("a").seal();
//!
//! // SELECT a.id, a.balance FROM accounts AS a WHERE a.balance > $1
//! let mut rows = select(accounts.all_columns())
//!     .from(&accounts)
//!     .r#where(tokens![accounts.col("balance"), "> $1"])
//!     .args([100])
//!     .query(&client)
//!     .await?;
//! let rich: Vec<Account> = accounts.read_all_from_rows(&mut rows);
//!
//! // INSERT ... ON CONFLICT (id) DO UPDATE SET balance = excluded.balance
//! insert_into(&accounts)
//!     .values(rich)
//!     .on_conflict(accounts.primary_key_columns())
//!     .do_update_except_primary_keys()
//!     .execute(&client)
//!     .await?;
//! ```

pub mod builder;
pub mod client;
pub mod column;
pub mod config;
pub mod error;
pub mod exec;
pub mod keyword;
pub mod metadata;
pub mod prelude;
pub mod scan;
pub mod table;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{
    BuiltQuery, InsertBuilder, JoinType, Order, Pagination, SelectBuilder, SelectKind, Token,
    insert_into, insert_into_columns, select, select_count, select_exists,
};
pub use client::GenericClient;
pub use column::ColumnRef;
pub use config::ExecConfig;
pub use error::{BoxError, SqlbError, SqlbResult};
pub use exec::{Executor, PgRows};
pub use keyword::{add_sql_keyword, is_sql_keyword};
pub use metadata::{ColumnDef, ColumnMetadata, LoadError, Record, Registry, TableMetadata};
pub use scan::{MemoryRows, RowSource, ScanLayout, ScannedRows};
pub use table::{Table, TableRef, UseTable};
pub use value::{FromValue, Value};
