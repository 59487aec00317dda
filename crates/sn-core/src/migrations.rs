use anyhow::Result;
use sqlx::{migrate::Migrator, Pool, Sqlite};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run(pool: &Pool<Sqlite>) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
