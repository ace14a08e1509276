//! Column references and the SQL fragments commonly built from them.

use crate::table::AnyTable;
use std::fmt;
use std::sync::Arc;

/// One registered column of a sealed [`Table`](crate::Table).
///
/// A `ColumnRef` refers back to its table; it is only produced by the table's
/// column accessors. As a [`Token`](crate::Token) it renders as
/// `alias.column` in SELECT statements.
#[derive(Clone)]
pub struct ColumnRef {
    name: String,
    primary_key: bool,
    pub(crate) table: Arc<dyn AnyTable>,
}

impl ColumnRef {
    pub(crate) fn new(name: &str, primary_key: bool, table: Arc<dyn AnyTable>) -> Self {
        Self {
            name: name.to_string(),
            primary_key,
            table,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Alias of the owning table.
    pub fn table_alias(&self) -> &str {
        self.table.alias()
    }

    /// Physical name of the owning table.
    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub(crate) fn table_uid(&self) -> u64 {
        self.table.uid()
    }

    /// `column`
    pub fn name_only(&self) -> &str {
        &self.name
    }

    /// `alias.column`
    pub fn name_with_alias(&self) -> String {
        format!("{}.{}", self.table.alias(), self.name)
    }

    /// `table.column`, qualified by the registered table name.
    pub fn name_with_table_name(&self) -> String {
        format!("{}.{}", self.table.registered_name(), self.name)
    }

    /// `excluded.column`
    pub fn excluded(&self) -> String {
        format!("excluded.{}", self.name)
    }

    /// `column = excluded.column`, for ON CONFLICT DO UPDATE.
    pub fn from_excluded(&self) -> String {
        format!("{} = {}", self.name, self.excluded())
    }

    /// `column = COALESCE(table.column, excluded.column)`
    pub fn from_coalesce_with_excluded(&self) -> String {
        format!(
            "{} = COALESCE({}, {})",
            self.name,
            self.name_with_table_name(),
            self.excluded()
        )
    }

    /// `column = table.column`
    pub fn equals_to_current(&self) -> String {
        format!("{} = {}", self.name, self.name_with_table_name())
    }

    /// `column = GREATEST(table.column, excluded.column)`
    pub fn greatest(&self) -> String {
        format!(
            "{} = GREATEST({}, {})",
            self.name,
            self.name_with_table_name(),
            self.excluded()
        )
    }

    /// `column = LEAST(table.column, excluded.column)`
    pub fn least(&self) -> String {
        format!(
            "{} = LEAST({}, {})",
            self.name,
            self.name_with_table_name(),
            self.excluded()
        )
    }

    /// `column @> ARRAY[$n]::TEXT[]`
    pub fn gin_string_array_contains(&self, placeholder: usize) -> String {
        format!("{} @> ARRAY[${}]::TEXT[]", self.name, placeholder)
    }

    /// `column @> ARRAY[$n]::BYTEA[]`
    pub fn gin_2d_bytea_array_contains(&self, placeholder: usize) -> String {
        format!("{} @> ARRAY[${}]::BYTEA[]", self.name, placeholder)
    }

    /// `column IN (1,2,3)`
    pub fn in_numbers(&self, numbers: &[i64]) -> String {
        let list: Vec<String> = numbers.iter().map(i64::to_string).collect();
        format!("{} IN ({})", self.name, list.join(","))
    }
}

impl fmt::Debug for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnRef")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("table", &self.table.alias())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{Struct1, registry};

    #[test]
    fn upsert_fragments() {
        let table = registry()
            .use_table::<Struct1>()
            .table_name("table1_p1")
            .alias("t")
            .seal();
        let cost = table.col("cost");

        assert_eq!(cost.name_only(), "cost");
        assert_eq!(cost.name_with_alias(), "t.cost");
        assert_eq!(cost.name_with_table_name(), "table1.cost");
        assert_eq!(cost.excluded(), "excluded.cost");
        assert_eq!(cost.from_excluded(), "cost = excluded.cost");
        assert_eq!(
            cost.from_coalesce_with_excluded(),
            "cost = COALESCE(table1.cost, excluded.cost)"
        );
        assert_eq!(cost.equals_to_current(), "cost = table1.cost");
        assert_eq!(cost.greatest(), "cost = GREATEST(table1.cost, excluded.cost)");
        assert_eq!(cost.least(), "cost = LEAST(table1.cost, excluded.cost)");
    }

    #[test]
    fn filter_fragments() {
        let table = registry().use_table::<Struct1>().seal();
        let pk1 = table.col("pk1");

        assert_eq!(pk1.gin_string_array_contains(2), "pk1 @> ARRAY[$2]::TEXT[]");
        assert_eq!(pk1.gin_2d_bytea_array_contains(1), "pk1 @> ARRAY[$1]::BYTEA[]");
        assert_eq!(pk1.in_numbers(&[1, 2, 3]), "pk1 IN (1,2,3)");
        assert_eq!(pk1.in_numbers(&[]), "pk1 IN ()");
    }

    #[test]
    fn debug_names_owning_alias() {
        let table = registry().use_table::<Struct1>().alias("t1").seal();
        let dbg = format!("{:?}", table.col("pk2"));
        assert!(dbg.contains("\"pk2\""), "{dbg}");
        assert!(dbg.contains("\"t1\""), "{dbg}");
    }
}
