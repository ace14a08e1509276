use super::state::{Call, CallOrder, Step};
use super::token::{ColumnStyle, Token, render_tokens};
use super::BuiltQuery;
use crate::column::ColumnRef;
use crate::metadata::Record;
use crate::table::Table;
use crate::value::Value;
use std::fmt::Write as _;

/// INSERT statement builder with optional upsert clauses.
///
/// Created with [`insert_into`](crate::insert_into) or
/// [`insert_into_columns`](crate::insert_into_columns). Records passed to
/// [`InsertBuilder::values`] are of the table's record type by construction.
pub struct InsertBuilder<T> {
    order: CallOrder,
    table: Table<T>,
    columns: Vec<ColumnRef>,
    values: Vec<T>,
    conflict_keys: Vec<ColumnRef>,
    update_tokens: Vec<Token>,
    update_where_tokens: Vec<Token>,
    do_nothing: bool,
}

impl<T: Record> InsertBuilder<T> {
    pub(crate) fn new(table: &Table<T>, columns: Vec<ColumnRef>) -> Self {
        for column in &columns {
            if column.table_uid() != table.uid() {
                panic!("column {} is not from table {}", column.name_only(), table.name());
            }
        }
        Self {
            order: CallOrder::starting_at(Step::InsertInto),
            table: table.clone(),
            columns,
            values: Vec::new(),
            conflict_keys: Vec::new(),
            update_tokens: Vec::new(),
            update_where_tokens: Vec::new(),
            do_nothing: false,
        }
    }

    fn step(&mut self, call: Call) {
        self.order.check(call);
        self.order.advance(call);
    }

    /// Records to insert, one VALUES tuple each.
    pub fn values(mut self, records: impl IntoIterator<Item = T>) -> Self {
        self.step(Call::Values);
        self.values = records.into_iter().collect();
        self
    }

    /// Start an ON CONFLICT clause on `keys`. Keys may be empty when followed
    /// by [`InsertBuilder::do_nothing`].
    ///
    /// # Panics
    ///
    /// Panics if a key column belongs to another table instance.
    pub fn on_conflict(mut self, keys: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.step(Call::OnConflict);
        let keys: Vec<ColumnRef> = keys.into_iter().collect();
        for key in &keys {
            if key.table_uid() != self.table.uid() {
                panic!("column {} is not from table {}", key.name_only(), self.table.name());
            }
        }
        self.conflict_keys = keys;
        self
    }

    /// Append assignments to DO UPDATE SET. Successive calls are separated by
    /// a comma.
    ///
    /// # Panics
    ///
    /// Panics if no conflict keys were given.
    pub fn do_update(mut self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.step(Call::DoUpdate);
        if self.conflict_keys.is_empty() {
            panic!("ON CONFLICT keys not added");
        }
        if !self.update_tokens.is_empty() {
            self.update_tokens.push(Token::from(",\n"));
        }
        self.update_tokens.extend(tokens);
        self
    }

    /// DO UPDATE SET `column = excluded.column` for every column outside the
    /// primary key.
    pub fn do_update_except_primary_keys(self) -> Self {
        let mut tokens = Vec::new();
        for column in self.table.all_columns() {
            if column.is_primary_key() {
                continue;
            }
            if !tokens.is_empty() {
                tokens.push(Token::from(",\n"));
            }
            tokens.push(Token::from(column.from_excluded()));
        }
        self.do_update(tokens)
    }

    pub fn do_nothing(mut self) -> Self {
        self.step(Call::DoNothing);
        self.do_nothing = true;
        self
    }

    /// Condition of the DO UPDATE. Column tokens render as `table.column`.
    /// Replaces any earlier condition.
    pub fn r#where(mut self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.step(Call::UpsertWhere);
        self.update_where_tokens = tokens.into_iter().collect();
        self
    }

    fn connect(mut self, connective: &str, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.step(Call::UpsertConnect);
        let tokens: Vec<Token> = tokens.into_iter().collect();
        if self.update_where_tokens.is_empty() {
            panic!("{connective} must be after WHERE");
        }
        if tokens.is_empty() {
            panic!("{connective} must have at least one token");
        }
        self.update_where_tokens.push(Token::from(connective));
        self.update_where_tokens.extend(tokens);
        self
    }

    pub fn and(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.connect("AND", tokens)
    }

    pub fn or(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.connect("OR", tokens)
    }

    pub fn table(&self) -> &Table<T> {
        &self.table
    }

    /// Render the statement and extract the arguments of every record.
    ///
    /// Row `r` (0-based) of `c` columns uses placeholders `$(r*c+1)` to
    /// `$(r*c+c)`, and the arguments follow the same order.
    ///
    /// # Panics
    ///
    /// Panics if there are no columns or no records.
    pub fn build(&self) -> BuiltQuery {
        if self.columns.is_empty() {
            panic!("no columns selected for inserting");
        }
        if self.values.is_empty() {
            panic!("no values for inserting");
        }

        let names: Vec<&str> = self.columns.iter().map(ColumnRef::name_only).collect();
        let mut sql = String::with_capacity(64 + self.values.len() * names.len() * 4);
        let _ = write!(sql, "INSERT INTO {} ({})\nVALUES ", self.table.name(), names.join(", "));

        let extractors = self.table.metadata().insert_spec_of_columns(&names);
        let width = names.len();
        let mut args: Vec<Value> = Vec::with_capacity(width * self.values.len());
        for (r, record) in self.values.iter().enumerate() {
            if r > 0 {
                sql.push(',');
            }
            sql.push('(');
            for i in 1..=width {
                if i > 1 {
                    sql.push(',');
                }
                let _ = write!(sql, "${}", r * width + i);
            }
            sql.push(')');
            args.extend(extractors.iter().map(|extract| extract(record)));
        }

        if self.do_nothing {
            sql.push_str("\nON CONFLICT DO NOTHING");
        } else if !self.conflict_keys.is_empty() {
            let keys: Vec<&str> = self.conflict_keys.iter().map(ColumnRef::name_only).collect();
            let _ = write!(sql, "\nON CONFLICT ({}) DO UPDATE SET\n", keys.join(", "));
            render_tokens(&self.update_tokens, ColumnStyle::Bare, &mut sql);
            if !self.update_where_tokens.is_empty() {
                sql.push_str("\nWHERE");
                render_tokens(&self.update_where_tokens, ColumnStyle::TableName, &mut sql);
            }
        }

        BuiltQuery::new(sql, args)
    }
}
