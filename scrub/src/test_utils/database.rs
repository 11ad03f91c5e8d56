//! Throwaway SQLite databases seeded with sales data.

use std::path::PathBuf;

use scrub_config::shared::SqliteConnectionConfig;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use crate::types::SalesRecord;

/// A uniquely named SQLite database seeded with a sales table.
///
/// Each spawn gets its own file under the system temp directory so tests can
/// run in parallel without interference. The file is removed on drop.
pub struct TestDatabase {
    pub config: SqliteConnectionConfig,
    path: PathBuf,
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Spawns a fresh SQLite database whose sales table holds `records`.
///
/// # Panics
///
/// Panics if the database cannot be created or seeded.
pub async fn spawn_sales_database(records: &[SalesRecord]) -> TestDatabase {
    let path = std::env::temp_dir().join(format!("scrub_test_{}.sqlite", Uuid::new_v4().simple()));
    let config = SqliteConnectionConfig {
        path: path.clone(),
        create_if_missing: true,
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(config.connect_options())
        .await
        .expect("failed to create test database");

    sqlx::query(
        "CREATE TABLE sales (row_id INTEGER PRIMARY KEY, agent_id INTEGER NOT NULL, \
         agent TEXT NOT NULL, amount INTEGER NOT NULL)",
    )
    .execute(&pool)
    .await
    .expect("failed to create sales table");

    for record in records {
        sqlx::query("INSERT INTO sales (row_id, agent_id, agent, amount) VALUES (?1, ?2, ?3, ?4)")
            .bind(record.row_id)
            .bind(record.agent_id)
            .bind(&record.agent)
            .bind(record.amount)
            .execute(&pool)
            .await
            .expect("failed to seed sales table");
    }

    pool.close().await;

    TestDatabase { config, path }
}

/// The two-agent scenario with one prime amount.
///
/// Clean subset: row ids 2, 3, 4 (amounts 8, 9, 4); row 1 has the prime
/// amount 7 and is excluded.
pub fn scenario_records() -> Vec<SalesRecord> {
    vec![
        SalesRecord::new(1, 10, "Alice", 7),
        SalesRecord::new(2, 10, "Alice", 8),
        SalesRecord::new(3, 20, "Bob", 9),
        SalesRecord::new(4, 20, "Bob", 4),
    ]
}

/// A larger mixed dataset: several agents, amounts spanning negatives,
/// zero, one, primes, and composites.
pub fn sample_records() -> Vec<SalesRecord> {
    let agents = ["Alice", "Bob", "Carol", "Dan", "Erin"];
    (0..50)
        .map(|n| {
            let agent = (n % agents.len() as i64) + 1;
            SalesRecord::new(
                n + 1,
                agent,
                agents[(agent - 1) as usize],
                (n * 13 % 37) - 5,
            )
        })
        .collect()
}

/// Sorts records by row id, for order-independent multiset comparison.
pub fn sorted_by_row_id(mut records: Vec<SalesRecord>) -> Vec<SalesRecord> {
    records.sort_by_key(|record| record.row_id);
    records
}
