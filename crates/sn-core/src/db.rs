use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// How long a writer waits for another process's write transaction.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory database. Every connection to `:memory:` is a
/// separate database, so the pool must never open a second one or drop the
/// first.
pub async fn connect_in_memory() -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn check_ready(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Pool handle plus the write queue. Reads go straight to the pool; every
/// write transaction waits for the queue so transactions apply one at a time.
/// Write transactions take SQLite's write lock at `BEGIN`, so other processes
/// on the same file wait on the busy timeout instead of failing mid-transaction.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    writer: Arc<Mutex<()>>,
}

impl Database {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn begin_write(&self) -> Result<WriteTx, sqlx::Error> {
        let permit = Arc::clone(&self.writer).lock_owned().await;
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(WriteTx {
            tx,
            on_commit: Vec::new(),
            _permit: permit,
        })
    }
}

type CommitHook = Box<dyn FnOnce() + Send>;

/// A queued write transaction. Dropping it without `commit` rolls back and
/// releases the queue.
pub struct WriteTx {
    // Field order matters: the transaction is released before the permit.
    tx: Transaction<'static, Sqlite>,
    on_commit: Vec<CommitHook>,
    _permit: OwnedMutexGuard<()>,
}

impl WriteTx {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Runs `hook` once the transaction commits. Rollback or drop discards it.
    pub fn after_commit(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.on_commit.push(Box::new(hook));
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        let WriteTx {
            tx,
            on_commit,
            _permit: permit,
        } = self;
        tx.commit().await?;
        drop(permit);
        for hook in on_commit {
            hook();
        }
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}
