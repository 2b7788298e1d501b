use sqlx::{Pool, Sqlite, SqliteConnection, Transaction};
use tracing::debug;

use crate::error::AppError;

/// One database transaction scoped to a single domain operation.
///
/// Every storage function takes the `&mut SqliteConnection` this hands out, so
/// all writes of an operation land in the same transaction. Dropping the unit
/// without calling [`UnitOfWork::commit`] rolls everything back, which covers
/// early returns through `?`.
///
/// The transaction opens with `BEGIN IMMEDIATE` so the write lock is held from
/// the start. A second writer waits on the busy timeout instead of failing at
/// its first write, and its uniqueness pre-checks see the committed rows.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub async fn begin(pool: &Pool<Sqlite>) -> Result<Self, AppError> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
        debug!("Unit of work started");
        Ok(Self { tx })
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        debug!("Unit of work committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}
