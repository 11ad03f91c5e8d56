//! SQLite-backed record store over a sqlx connection pool.

use std::sync::Arc;

use scrub_config::shared::SqliteConnectionConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ErrorKind, ScrubResult};
use crate::store::base::RecordStore;
use crate::types::{AgentId, SalesRecord};
use crate::{bail, scrub_error};

/// Small fixed pool; fetches overlap on waiting, not on connections held.
const NUM_POOL_CONNECTIONS: u32 = 4;

const CREATE_CLEAN_TABLE: &str = "CREATE TABLE clean_sales (\
     row_id INTEGER PRIMARY KEY, agent_id INTEGER NOT NULL, \
     agent TEXT NOT NULL, amount INTEGER NOT NULL)";

/// Record store backed by a local SQLite file.
///
/// The pool is created on [`RecordStore::open`] and torn down on
/// [`RecordStore::close`]; in between, concurrent partition fetches share it.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    config: SqliteConnectionConfig,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteRecordStore {
    pub fn new(config: SqliteConnectionConfig) -> Self {
        Self {
            config,
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns a clone of the open pool, or fails when the store is closed.
    async fn pool(&self) -> ScrubResult<SqlitePool> {
        let pool = self.pool.lock().await;
        match pool.as_ref() {
            Some(pool) => Ok(pool.clone()),
            None => bail!(ErrorKind::InvalidState, "record store is not open"),
        }
    }

    /// Returns whether the store currently holds an open pool.
    pub async fn is_open(&self) -> bool {
        self.pool.lock().await.is_some()
    }
}

impl RecordStore for SqliteRecordStore {
    async fn open(&self) -> ScrubResult<()> {
        let mut pool = self.pool.lock().await;
        if pool.is_some() {
            bail!(ErrorKind::InvalidState, "record store is already open");
        }

        let options = self.config.connect_options();
        let connected = SqlitePoolOptions::new()
            .max_connections(NUM_POOL_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|err| {
                scrub_error!(
                    ErrorKind::ConnectionFailed,
                    "failed to open sqlite database",
                    self.config.path.display(),
                    source: err
                )
            })?;

        info!(path = %self.config.path.display(), "opened sqlite record store");
        *pool = Some(connected);

        Ok(())
    }

    async fn agent_ids(&self) -> ScrubResult<Vec<AgentId>> {
        let pool = self.pool().await?;

        let ids: Vec<i64> = sqlx::query_scalar("SELECT DISTINCT agent_id FROM sales ORDER BY agent_id")
            .fetch_all(&pool)
            .await
            .map_err(|err| {
                scrub_error!(
                    ErrorKind::QueryFailed,
                    "failed to list agent ids",
                    source: err
                )
            })?;

        Ok(ids.into_iter().map(AgentId).collect())
    }

    async fn fetch_by_agent(&self, agent_id: AgentId) -> ScrubResult<Vec<SalesRecord>> {
        let pool = self.pool().await?;

        debug!(agent_id = %agent_id, "fetching sales partition");

        sqlx::query_as::<_, SalesRecord>(
            "SELECT row_id, agent_id, agent, amount FROM sales \
             WHERE agent_id = ?1 ORDER BY row_id",
        )
        .bind(agent_id.0)
        .fetch_all(&pool)
        .await
        .map_err(|err| {
            scrub_error!(
                ErrorKind::FetchFailed,
                "failed to fetch sales partition",
                agent_id,
                source: err
            )
        })
    }

    async fn write_clean(&self, records: &[SalesRecord]) -> ScrubResult<u64> {
        let pool = self.pool().await?;

        // Single transaction: the drop, recreate, and all inserts become
        // visible atomically. On any failure the transaction rolls back and
        // the prior clean table remains.
        let mut tx = pool.begin().await.map_err(|err| {
            scrub_error!(
                ErrorKind::WriteFailed,
                "failed to begin clean table transaction",
                source: err
            )
        })?;

        sqlx::query("DROP TABLE IF EXISTS clean_sales")
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                scrub_error!(
                    ErrorKind::WriteFailed,
                    "failed to drop previous clean table",
                    source: err
                )
            })?;

        sqlx::query(CREATE_CLEAN_TABLE)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                scrub_error!(
                    ErrorKind::WriteFailed,
                    "failed to create clean table",
                    source: err
                )
            })?;

        for record in records {
            sqlx::query(
                "INSERT INTO clean_sales (row_id, agent_id, agent, amount) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(record.row_id)
            .bind(record.agent_id)
            .bind(&record.agent)
            .bind(record.amount)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                scrub_error!(
                    ErrorKind::WriteFailed,
                    "failed to insert clean record",
                    record.row_id,
                    source: err
                )
            })?;
        }

        tx.commit().await.map_err(|err| {
            scrub_error!(
                ErrorKind::WriteFailed,
                "failed to commit clean table transaction",
                source: err
            )
        })?;

        info!(rows = records.len(), "replaced clean table contents");

        Ok(records.len() as u64)
    }

    async fn read_clean(&self) -> ScrubResult<Vec<SalesRecord>> {
        let pool = self.pool().await?;

        sqlx::query_as::<_, SalesRecord>(
            "SELECT row_id, agent_id, agent, amount FROM clean_sales ORDER BY row_id",
        )
        .fetch_all(&pool)
        .await
        .map_err(|err| {
            scrub_error!(
                ErrorKind::QueryFailed,
                "failed to read clean table",
                source: err
            )
        })
    }

    async fn close(&self) -> ScrubResult<()> {
        let mut pool = self.pool.lock().await;
        match pool.take() {
            Some(open_pool) => {
                open_pool.close().await;
                info!(path = %self.config.path.display(), "closed sqlite record store");
                Ok(())
            }
            None => bail!(ErrorKind::InvalidState, "record store is not open"),
        }
    }
}
