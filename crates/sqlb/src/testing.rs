//! Record fixtures shared by the unit tests.

use crate::error::BoxError;
use crate::metadata::{ColumnDef, Registry, TableMetadata};
use std::fmt;

/// Amount of money stored as `"{amount}{currency}"` text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: i64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, BoxError> {
        let split = raw
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map_or(raw.len(), |(i, _)| i);
        let (amount, currency) = raw.split_at(split);
        if currency.is_empty() {
            return Err(format!("invalid money {raw:?}: missing currency").into());
        }
        Ok(Self {
            amount: amount.parse()?,
            currency: currency.to_string(),
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.currency)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct1 {
    pub pk1: String,
    pub pk2: i32,
    pub amount: i64,
    pub cost: Money,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct2 {
    pub pk1: String,
    pub pk2: i32,
    pub pk3: i64,
    pub amount: Money,
}

pub fn struct1_metadata() -> TableMetadata<Struct1> {
    TableMetadata::builder("table1")
        .column(
            ColumnDef::new("pk1")
                .primary_key()
                .insert(|r: &Struct1| r.pk1.clone())
                .select(|r: &mut Struct1, v: String| r.pk1 = v),
        )
        .column(
            ColumnDef::new("pk2")
                .primary_key()
                .insert(|r: &Struct1| r.pk2)
                .select(|r: &mut Struct1, v: i32| r.pk2 = v),
        )
        .column(
            ColumnDef::new("amount")
                .insert(|r: &Struct1| r.amount)
                .select(|r: &mut Struct1, v: i64| r.amount = v),
        )
        .column(
            ColumnDef::new("cost")
                .insert(|r: &Struct1| r.cost.to_string())
                .select_with(|r: &mut Struct1, v: String| {
                    r.cost = Money::parse(&v)?;
                    Ok(())
                }),
        )
        .build(&["pk1", "pk2"])
}

pub fn struct2_metadata() -> TableMetadata<Struct2> {
    TableMetadata::builder("table2")
        .column(
            ColumnDef::new("pk1")
                .primary_key()
                .insert(|r: &Struct2| r.pk1.clone())
                .select(|r: &mut Struct2, v: String| r.pk1 = v),
        )
        .column(
            ColumnDef::new("pk2")
                .primary_key()
                .insert(|r: &Struct2| r.pk2)
                .select(|r: &mut Struct2, v: i32| r.pk2 = v),
        )
        .column(
            ColumnDef::new("pk3")
                .primary_key()
                .insert(|r: &Struct2| r.pk3)
                .select(|r: &mut Struct2, v: i64| r.pk3 = v),
        )
        .column(
            ColumnDef::new("amount")
                .insert(|r: &Struct2| r.amount.to_string())
                .select_with(|r: &mut Struct2, v: String| {
                    r.amount = Money::parse(&v)?;
                    Ok(())
                }),
        )
        .build(&["pk1", "pk2", "pk3"])
}

/// A sealed registry holding both fixture tables.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(struct1_metadata());
    registry.register(struct2_metadata());
    registry.seal();
    registry
}
