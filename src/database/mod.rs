pub mod unit_of_work;

pub use unit_of_work::UnitOfWork;

use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{info, instrument};

use crate::error::AppError;

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[instrument]
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, AppError> {
    info!("Connecting to SQLite database");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations completed successfully");
    Ok(())
}
