use super::*;
use crate::builder::{insert_into, select, select_count, select_exists};
use crate::testing::{Money, Struct1, registry};
use crate::tokens;
use std::sync::Mutex;
use std::time::Duration;
use tokio_postgres::types::ToSql;

// ── Shared DummyClient for tests ──

/// Returns no rows and records every statement it receives.
#[derive(Default)]
struct DummyClient {
    statements: Mutex<Vec<(String, usize)>>,
    affected: u64,
}

impl DummyClient {
    fn statements(&self) -> Vec<(String, usize)> {
        self.statements.lock().unwrap().clone()
    }
}

impl GenericClient for DummyClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SqlbResult<Vec<Row>> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.len()));
        Ok(vec![])
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SqlbResult<u64> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.len()));
        Ok(self.affected)
    }
}

/// Serves single-row lookups from `query_opt` and counts them.
#[derive(Default)]
struct SingleRowClient {
    lookups: Mutex<Vec<String>>,
}

impl GenericClient for SingleRowClient {
    async fn query(&self, sql: &str, _: &[&(dyn ToSql + Sync)]) -> SqlbResult<Vec<Row>> {
        Err(SqlbError::Other(format!("unexpected multi-row query: {sql}")))
    }

    async fn query_opt(&self, sql: &str, _: &[&(dyn ToSql + Sync)]) -> SqlbResult<Option<Row>> {
        self.lookups.lock().unwrap().push(sql.to_string());
        Ok(None)
    }

    async fn execute(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> SqlbResult<u64> {
        Ok(0)
    }
}

struct HangingClient;

impl GenericClient for HangingClient {
    async fn query(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> SqlbResult<Vec<Row>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(vec![])
    }

    async fn execute(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> SqlbResult<u64> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(0)
    }
}

fn record(pk1: &str) -> Struct1 {
    Struct1 {
        pk1: pk1.to_string(),
        pk2: 1,
        amount: 10,
        cost: Money::new(3, "usd"),
    }
}

#[test]
fn truncate_sql_respects_char_boundaries() {
    assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
    assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
    // 'é' is two bytes; cutting inside it backs off.
    assert_eq!(truncate_sql_bytes("café", 4), "caf");
    assert_eq!(truncate_sql_bytes("café", 0), "");
}

#[tokio::test]
async fn insert_executes_rendered_statement() {
    let table1 = registry().use_table::<Struct1>().seal();
    let client = DummyClient {
        affected: 2,
        ..Default::default()
    };

    let affected = insert_into(&table1)
        .values([record("a"), record("b")])
        .on_conflict(table1.primary_key_columns())
        .do_nothing()
        .execute(&client)
        .await
        .unwrap();

    assert_eq!(affected, 2);
    assert_eq!(
        client.statements(),
        [(
            "INSERT INTO table1 (pk1, pk2, amount, cost)\n\
             VALUES ($1,$2,$3,$4),($5,$6,$7,$8)\n\
             ON CONFLICT DO NOTHING"
                .to_string(),
            8
        )]
    );
}

#[tokio::test]
async fn select_without_rows_is_empty() {
    let table1 = registry().use_table::<Struct1>().alias("t1").seal();
    let client = DummyClient::default();

    let mut rows = select(table1.columns(&["pk1", "amount"]))
        .from(&table1)
        .r#where(tokens![table1.col("amount"), "> $1"])
        .args([5])
        .query(&client)
        .await
        .unwrap();

    assert!(rows.is_empty());
    assert!(table1.read_all_from_rows(&mut rows).is_empty());
    assert_eq!(
        client.statements(),
        [(
            "SELECT t1.pk1, t1.amount\nFROM table1 AS t1\nWHERE t1.amount > $1\n".to_string(),
            1
        )]
    );
}

#[tokio::test]
async fn exists_without_rows_is_not_found() {
    let table1 = registry().use_table::<Struct1>().alias("t1").seal();
    let client = DummyClient::default();

    let err = select_exists()
        .from(&table1)
        .r#where(tokens![table1.col("pk1"), "= $1"])
        .args(["a"])
        .query_exists(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn count_without_rows_is_not_found() {
    let table1 = registry().use_table::<Struct1>().alias("t1").seal();
    let client = DummyClient::default();

    let err = select_count()
        .from(&table1)
        .query_count(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        client.statements()[0].0,
        "SELECT COUNT(1) FROM table1 AS t1\n"
    );
}

#[tokio::test]
async fn exists_and_count_fetch_a_single_row() {
    let table1 = registry().use_table::<Struct1>().alias("t1").seal();
    let client = SingleRowClient::default();
    let executor = Executor::new(&client);

    let err = executor
        .query_exists(&select_exists().from(&table1))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    let err = select_count()
        .from(&table1)
        .query_count(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");

    assert_eq!(
        *client.lookups.lock().unwrap(),
        [
            "SELECT EXISTS(SELECT 1 FROM table1 AS t1\n)".to_string(),
            "SELECT COUNT(1) FROM table1 AS t1\n".to_string(),
        ]
    );
}

#[tokio::test]
async fn executor_with_logging_disabled_still_runs() {
    let table1 = registry().use_table::<Struct1>().seal();
    let executor = Executor::new(DummyClient::default())
        .with_config(ExecConfig::new().with_log_sql(false).with_max_sql_length(Some(8)));

    let builder = select(table1.all_columns()).from(&table1);
    executor.query(&builder).await.unwrap();
    executor.query(&builder).await.unwrap();

    assert!(!executor.config().log_sql);
    assert_eq!(executor.into_inner().statements().len(), 2);
}

#[tokio::test]
async fn timeout_returns_error() {
    let table1 = registry().use_table::<Struct1>().seal();
    let executor = Executor::new(HangingClient)
        .with_config(ExecConfig::new().with_query_timeout(Duration::from_millis(20)));

    let builder = select(table1.all_columns()).from(&table1);
    let err = match executor.query(&builder).await {
        Ok(_) => panic!("expected a timeout"),
        Err(err) => err,
    };
    assert!(err.is_timeout());

    let insert = insert_into(&table1).values([record("a")]);
    let err = executor.execute(&insert).await.unwrap_err();
    assert!(matches!(err, SqlbError::Timeout(d) if d == Duration::from_millis(20)));
}

#[tokio::test]
#[should_panic(expected = "only SELECT EXISTS is supported, got SELECT COUNT")]
async fn exists_on_count_builder_panics() {
    let table1 = registry().use_table::<Struct1>().seal();
    let _ = select_count().from(&table1).query_exists(&DummyClient::default()).await;
}

#[tokio::test]
#[should_panic(expected = "only SELECT COUNT is supported, got SELECT")]
async fn count_on_basic_builder_panics() {
    let table1 = registry().use_table::<Struct1>().seal();
    let _ = select(table1.all_columns())
        .from(&table1)
        .query_count(&DummyClient::default())
        .await;
}

#[test]
fn pg_rows_without_rows() {
    let mut rows = PgRows::new(Vec::new());
    assert!(!rows.advance());
    let mut dest = [Value::Null];
    assert!(rows.scan(&mut dest).is_err());
    rows.close();
    rows.close();
}
