use super::*;
use crate::testing::{Money, Struct1, Struct2, struct1_metadata, struct2_metadata};
use crate::value::Value;

#[derive(Debug, Default, PartialEq)]
struct Event {
    id: i64,
    order: i32,
    kind: String,
}

fn event_metadata() -> TableMetadata<Event> {
    TableMetadata::builder("events")
        .columns([
            ColumnDef::new("id")
                .primary_key()
                .insert(|e: &Event| e.id)
                .select(|e: &mut Event, v: i64| e.id = v),
            ColumnDef::new("order")
                .insert(|e: &Event| e.order)
                .select(|e: &mut Event, v: i32| e.order = v),
            ColumnDef::new(" kind ")
                .insert(|e: &Event| e.kind.clone())
                .select(|e: &mut Event, v: String| e.kind = v),
        ])
        .build(&["id"])
}

#[test]
fn primary_keys_are_collected_in_column_order() {
    let meta = struct2_metadata();
    let pks: Vec<&str> = meta.primary_key_columns().into_iter().map(|c| c.name()).collect();
    assert_eq!(pks, vec!["pk1", "pk2", "pk3"]);
    assert_eq!(meta.name(), "table2");
    assert_eq!(meta.column_names(), vec!["pk1", "pk2", "pk3", "amount"]);
}

#[test]
fn expected_primary_keys_match_in_any_order() {
    let meta = TableMetadata::<Struct1>::builder("table1")
        .column(ColumnDef::new("pk1").primary_key())
        .column(ColumnDef::new("pk2").primary_key())
        .build(&["pk2", "pk1"]);
    assert_eq!(meta.primary_key_columns().len(), 2);
}

#[test]
#[should_panic(expected = "expected primary keys [pk1] for table table1, but got [pk1, pk2]")]
fn primary_key_mismatch_panics() {
    TableMetadata::<Struct1>::builder("table1")
        .column(ColumnDef::new("pk1").primary_key())
        .column(ColumnDef::new("pk2").primary_key())
        .build(&["pk1"]);
}

#[test]
#[should_panic(expected = "expected primary keys [pk1, pk2] for table table1, but got [pk1]")]
fn missing_primary_key_panics() {
    TableMetadata::<Struct1>::builder("table1")
        .column(ColumnDef::new("pk1").primary_key())
        .column(ColumnDef::new("pk2"))
        .build(&["pk2", "pk1"]);
}

#[test]
#[should_panic(expected = "column with name amount is already added")]
fn duplicate_column_panics() {
    TableMetadata::<Struct1>::builder("table1")
        .column(ColumnDef::new("amount"))
        .column(ColumnDef::new("amount"))
        .build(&[]);
}

#[test]
fn keyword_columns_are_quoted_and_found_by_bare_name() {
    let meta = event_metadata();
    assert_eq!(meta.column_names(), vec!["id", "\"order\"", "kind"]);
    assert_eq!(meta.column("order").name(), "\"order\"");
    assert_eq!(meta.column("kind").name(), "kind");
    assert!(meta.get_column("missing").is_none());
}

#[test]
#[should_panic(expected = "column with name missing not found in table events")]
fn unknown_column_panics() {
    event_metadata().column("missing");
}

#[test]
fn select_specs_follow_requested_order() {
    let meta = struct1_metadata();
    let (mut record, specs) = meta.select_spec_of_columns(&["cost", "amount", "pk1"]);
    assert_eq!(specs.len(), 3);
    assert!(specs[0].has_transform());
    assert!(!specs[1].has_transform());

    let raw = [
        Value::from("120eur"),
        Value::Int(7),
        Value::from("key"),
    ];
    for (spec, value) in specs.iter().zip(raw) {
        spec.apply(&mut record, value).unwrap();
    }
    assert_eq!(
        record,
        Struct1 {
            pk1: "key".to_string(),
            pk2: 0,
            amount: 7,
            cost: Money::new(120, "eur"),
        }
    );
}

#[test]
fn empty_column_list_selects_everything() {
    let meta = struct2_metadata();
    let (record, specs) = meta.select_spec_of_columns::<&str>(&[]);
    assert_eq!(specs.len(), 4);
    assert_eq!(record, Struct2::default());
    assert_eq!(meta.insert_spec_of_columns::<&str>(&[]).len(), 4);
}

#[test]
fn failing_transform_is_an_error() {
    let meta = struct2_metadata();
    let (mut record, specs) = meta.select_spec_of_columns(&["amount"]);
    let err = specs[0].apply(&mut record, Value::from("12")).unwrap_err();
    assert!(matches!(err, LoadError::Transform(_)), "{err:?}");
    assert!(err.to_string().contains("missing currency"), "{err}");

    // Wrong raw kind fails before the transform runs.
    let err = specs[0].apply(&mut record, Value::Int(5)).unwrap_err();
    assert!(matches!(err, LoadError::Scan(_)), "{err:?}");
    assert_eq!(err.to_string(), "expected text, got int");
}

#[test]
fn insert_then_select_restores_the_record() {
    let meta = struct1_metadata();
    let original = Struct1 {
        pk1: "a".to_string(),
        pk2: 2,
        amount: 300,
        cost: Money::new(15, "usd"),
    };
    let raw: Vec<Value> = meta
        .insert_spec_of_columns::<&str>(&[])
        .into_iter()
        .map(|extract| extract(&original))
        .collect();
    assert_eq!(raw[3], Value::from("15usd"));

    let (mut restored, specs) = meta.select_spec_of_columns::<&str>(&[]);
    for (spec, value) in specs.iter().zip(raw) {
        spec.apply(&mut restored, value).unwrap();
    }
    assert_eq!(restored, original);
}

#[test]
#[should_panic(expected = "column pk1 has no insert spec")]
fn missing_insert_spec_panics() {
    let meta = TableMetadata::<Struct1>::builder("table1")
        .column(ColumnDef::new("pk1").primary_key())
        .build(&["pk1"]);
    meta.insert_spec_of_columns(&["pk1"]);
}

#[test]
fn registry_returns_registered_metadata() {
    let mut registry = Registry::new();
    assert!(registry.is_empty());
    registry.register(struct1_metadata());
    registry.register(struct2_metadata());

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.table_names(), vec!["table1", "table2"]);
    assert_eq!(registry.lookup::<Struct2>().name(), "table2");
    assert!(registry.get::<Event>().is_none());
}

#[test]
#[should_panic(expected = "is already registered")]
fn registry_rejects_duplicate_type() {
    let mut registry = Registry::new();
    registry.register(struct1_metadata());
    registry.register(struct1_metadata());
}

#[test]
#[should_panic(expected = "registry is sealed")]
fn sealed_registry_rejects_registration() {
    let mut registry = Registry::new();
    registry.register(struct1_metadata());
    registry.seal();
    assert!(registry.is_sealed());
    registry.register(struct2_metadata());
}

#[test]
#[should_panic(expected = "is not registered")]
fn lookup_of_unregistered_type_panics() {
    Registry::new().lookup::<Event>();
}
