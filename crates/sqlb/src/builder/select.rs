use super::pagination::Pagination;
use super::state::{Call, CallOrder, Step};
use super::token::{ColumnStyle, Token, render_tokens};
use super::{AliasRegistry, BuiltQuery};
use crate::column::ColumnRef;
use crate::table::TableRef;
use crate::value::Value;
use std::fmt;
use std::fmt::Write as _;

/// What a SELECT statement returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectKind {
    /// The selected columns.
    Basic,
    /// Whether any row matches.
    Exists,
    /// How many rows match.
    Count,
}

impl SelectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectKind::Basic => "SELECT",
            SelectKind::Exists => "SELECT EXISTS",
            SelectKind::Count => "SELECT COUNT",
        }
    }
}

impl fmt::Display for SelectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinType {
    fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinType,
    table: TableRef,
    on: Vec<(ColumnRef, ColumnRef)>,
}

/// SELECT statement builder.
///
/// Created with [`select`](crate::select), [`select_exists`](crate::select_exists)
/// or [`select_count`](crate::select_count).
///
/// ```ignore
/// let (sql, args) = sqlb::select(t1.columns(&["cost", "amount"]))
///     .from(&t1)
///     .r#where(tokens![t1.col("amount"), "= $1"])
///     .args([100])
///     .build()
///     .into_parts();
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    kind: SelectKind,
    order: CallOrder,
    aliases: AliasRegistry,
    columns: Vec<ColumnRef>,
    from: Vec<TableRef>,
    joins: Vec<Join>,
    where_tokens: Vec<Token>,
    args: Vec<Value>,
    orders: Vec<(ColumnRef, Order)>,
    offset: u64,
    limit: u64,
}

impl SelectBuilder {
    pub(crate) fn new(kind: SelectKind) -> Self {
        let start = match kind {
            SelectKind::Basic => Step::None,
            SelectKind::Exists | SelectKind::Count => Step::Select,
        };
        Self {
            kind,
            order: CallOrder::starting_at(start),
            aliases: AliasRegistry::default(),
            columns: Vec::new(),
            from: Vec::new(),
            joins: Vec::new(),
            where_tokens: Vec::new(),
            args: Vec::new(),
            orders: Vec::new(),
            offset: 0,
            limit: 0,
        }
    }

    fn step(&mut self, call: Call) {
        self.order.check(call);
        self.order.advance(call);
    }

    fn require_basic(&self) {
        if self.kind != SelectKind::Basic {
            panic!("only {} is supported, got {}", SelectKind::Basic, self.kind);
        }
    }

    pub fn kind(&self) -> SelectKind {
        self.kind
    }

    /// Add more columns to the select list.
    pub fn select(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.require_basic();
        self.step(Call::Select);
        for column in columns {
            self.aliases.register(&*column.table);
            self.columns.push(column);
        }
        self
    }

    /// Add a table to the FROM list.
    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        self.step(Call::From);
        let table = table.into();
        self.aliases.register(&*table.0);
        self.from.push(table);
        self
    }

    /// Add a JOIN of `table` on `left = right` column pairs.
    ///
    /// # Panics
    ///
    /// Panics if `on` is empty, a pair refers to a single table instance, or
    /// neither side of a pair belongs to `table`.
    pub fn join(mut self, kind: JoinType, table: impl Into<TableRef>, on: &[(ColumnRef, ColumnRef)]) -> Self {
        self.step(Call::Join);
        let table = table.into();
        if on.is_empty() {
            panic!("join on table {} requires at least one column pair", table.alias());
        }
        let uid = table.0.uid();
        for (i, (left, right)) in on.iter().enumerate() {
            if left.table_uid() == right.table_uid() {
                panic!("join on the same table at pair no.{}", i + 1);
            }
            if left.table_uid() != uid && right.table_uid() != uid {
                panic!(
                    "either of the join must be table {}, got {} and {}",
                    table.alias(),
                    left.table_alias(),
                    right.table_alias()
                );
            }
            self.aliases.register(&*left.table);
            self.aliases.register(&*right.table);
        }
        self.aliases.register(&*table.0);
        self.joins.push(Join {
            kind,
            table,
            on: on.to_vec(),
        });
        self
    }

    /// Start or extend the WHERE clause. Arguments for `$n` placeholders are
    /// given with [`SelectBuilder::args`].
    pub fn r#where(mut self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.step(Call::Where);
        self.where_tokens.extend(tokens);
        self
    }

    fn connect(mut self, connective: &str, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.step(Call::Connect);
        let tokens: Vec<Token> = tokens.into_iter().collect();
        if self.where_tokens.is_empty() {
            panic!("{connective} must be after WHERE");
        }
        if tokens.is_empty() {
            panic!("{connective} must have at least one token");
        }
        self.where_tokens.push(Token::from(connective));
        self.where_tokens.extend(tokens);
        self
    }

    pub fn and(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.connect("AND", tokens)
    }

    pub fn or(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.connect("OR", tokens)
    }

    /// Append positional arguments for the WHERE placeholders.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.step(Call::Args);
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn has_where_tokens(&self) -> bool {
        !self.where_tokens.is_empty()
    }

    pub fn order_by(mut self, column: ColumnRef, order: Order) -> Self {
        self.require_basic();
        self.step(Call::OrderBy);
        self.orders.push((column, order));
        self
    }

    /// Add a secondary ORDER BY column.
    pub fn then_by(mut self, column: ColumnRef, order: Order) -> Self {
        self.require_basic();
        self.step(Call::ThenBy);
        self.orders.push((column, order));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.require_basic();
        self.step(Call::Offset);
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.require_basic();
        self.step(Call::Limit);
        self.limit = limit;
        self
    }

    /// Apply OFFSET and LIMIT from `pagination`, skipping zero values.
    pub fn pagination(self, pagination: Option<&Pagination>) -> Self {
        let Some(pagination) = pagination else {
            return self;
        };
        let mut builder = self;
        if pagination.offset() > 0 {
            builder = builder.offset(pagination.offset());
        }
        if pagination.limit() > 0 {
            builder = builder.limit(pagination.limit());
        }
        builder
    }

    pub(crate) fn selected_columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Render the statement.
    ///
    /// # Panics
    ///
    /// Panics if a basic SELECT has no columns or no table was added.
    pub fn build(&self) -> BuiltQuery {
        if self.columns.is_empty() && self.kind == SelectKind::Basic {
            panic!("no columns selected");
        }
        if self.from.is_empty() {
            panic!("no tables selected");
        }

        let mut sql = String::with_capacity(128);
        match self.kind {
            SelectKind::Exists => sql.push_str("SELECT 1 "),
            SelectKind::Count => sql.push_str("SELECT COUNT(1) "),
            SelectKind::Basic => {
                let columns: Vec<String> = self.columns.iter().map(ColumnRef::name_with_alias).collect();
                sql.push_str("SELECT ");
                sql.push_str(&columns.join(", "));
                sql.push('\n');
            }
        }

        let tables: Vec<String> = self
            .from
            .iter()
            .map(|t| format!("{} AS {}", t.name(), t.alias()))
            .collect();
        sql.push_str("FROM ");
        sql.push_str(&tables.join(", "));
        sql.push('\n');

        for join in &self.joins {
            let on: Vec<String> = join
                .on
                .iter()
                .map(|(left, right)| format!("{} = {}", left.name_with_alias(), right.name_with_alias()))
                .collect();
            let _ = writeln!(
                sql,
                "{} {} AS {} ON {}",
                join.kind.keyword(),
                join.table.name(),
                join.table.alias(),
                on.join(" AND ")
            );
        }

        if !self.where_tokens.is_empty() {
            sql.push_str("WHERE");
            render_tokens(&self.where_tokens, ColumnStyle::Alias, &mut sql);
            sql.push('\n');
        }

        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(column, order)| {
                    let dir = match order {
                        Order::Asc => "ASC",
                        Order::Desc => "DESC",
                    };
                    format!("{} {}", column.name_with_alias(), dir)
                })
                .collect();
            sql.push_str("ORDER BY ");
            sql.push_str(&orders.join(", "));
            sql.push('\n');
        }

        match (self.offset, self.limit) {
            (0, 0) => {}
            (offset, 0) => {
                let _ = writeln!(sql, "OFFSET {offset}");
            }
            (0, limit) => {
                let _ = writeln!(sql, "LIMIT {limit}");
            }
            (offset, limit) => {
                let _ = writeln!(sql, "OFFSET {offset} LIMIT {limit}");
            }
        }

        if self.kind == SelectKind::Exists {
            sql = format!("SELECT EXISTS({sql})");
        }

        BuiltQuery::new(sql, self.args.clone())
    }
}
