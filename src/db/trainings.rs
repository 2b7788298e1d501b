use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::{info, instrument};

use crate::auth::RoleKind;
use crate::db::accounts::account_role_kind;
use crate::db::activities::get_activity;
use crate::error::{AppError, Reference};
use crate::models::{DbTrainingDetail, TrainingDetail, TrainingSession};

pub(crate) const SELECT_TRAINING_DETAIL: &str = "SELECT t.id, t.date,
            tr.id AS trainer_id, tr.first_name AS trainer_first_name,
            tr.last_name AS trainer_last_name, tr.email AS trainer_email,
            ac.id AS activity_id, ac.name AS activity_name
     FROM trainings t
     JOIN accounts tr ON tr.id = t.trainer_account_id
     JOIN activities ac ON ac.id = t.activity_id";

/// Only accounts holding the Trainer role may run a session. Administrators
/// are not trainers.
async fn ensure_trainer(conn: &mut SqliteConnection, account_id: i64) -> Result<(), AppError> {
    match account_role_kind(conn, account_id).await? {
        Some(RoleKind::Trainer) => Ok(()),
        _ => Err(AppError::InvalidTrainerRole(account_id)),
    }
}

#[instrument(skip(conn))]
pub async fn create_training(
    conn: &mut SqliteConnection,
    trainer_account_id: i64,
    activity_id: i64,
    date: NaiveDate,
) -> Result<TrainingSession, AppError> {
    info!("Creating training session");
    ensure_trainer(conn, trainer_account_id).await?;
    get_activity(conn, activity_id).await?;

    let res = sqlx::query(
        "INSERT INTO trainings (trainer_account_id, activity_id, date) VALUES (?, ?, ?)",
    )
    .bind(trainer_account_id)
    .bind(activity_id)
    .bind(date)
    .execute(&mut *conn)
    .await?;

    Ok(TrainingSession {
        id: res.last_insert_rowid(),
        trainer_account_id,
        activity_id,
        date,
    })
}

#[instrument(skip(conn))]
pub async fn get_training(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<TrainingSession, AppError> {
    sqlx::query_as::<_, TrainingSession>(
        "SELECT id, trainer_account_id, activity_id, date FROM trainings WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::UnknownReference(Reference::Training(id)))
}

#[instrument(skip(conn))]
pub async fn get_training_detail(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<TrainingDetail, AppError> {
    let sql = format!("{} WHERE t.id = ?", SELECT_TRAINING_DETAIL);
    sqlx::query_as::<_, DbTrainingDetail>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(TrainingDetail::from)
        .ok_or(AppError::UnknownReference(Reference::Training(id)))
}

/// Re-edits a session as a whole. The trainer check applies to the new trainer.
#[instrument(skip(conn))]
pub async fn update_training(
    conn: &mut SqliteConnection,
    id: i64,
    trainer_account_id: i64,
    activity_id: i64,
    date: NaiveDate,
) -> Result<TrainingSession, AppError> {
    info!("Updating training session");
    get_training(conn, id).await?;
    ensure_trainer(conn, trainer_account_id).await?;
    get_activity(conn, activity_id).await?;

    sqlx::query("UPDATE trainings SET trainer_account_id = ?, activity_id = ?, date = ? WHERE id = ?")
        .bind(trainer_account_id)
        .bind(activity_id)
        .bind(date)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(TrainingSession {
        id,
        trainer_account_id,
        activity_id,
        date,
    })
}

/// Removes the session and its attendance. Returns the number of attendance
/// rows removed with it.
#[instrument(skip(conn))]
pub async fn delete_training(conn: &mut SqliteConnection, id: i64) -> Result<u64, AppError> {
    info!("Deleting training session");
    get_training(conn, id).await?;

    let attendance = sqlx::query("DELETE FROM attendances WHERE training_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM trainings WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(attendance)
}

#[instrument(skip(conn))]
pub async fn list_trainings(conn: &mut SqliteConnection) -> Result<Vec<TrainingDetail>, AppError> {
    info!("Listing training sessions");
    let sql = format!("{} ORDER BY t.date DESC, t.id DESC", SELECT_TRAINING_DETAIL);
    let rows = sqlx::query_as::<_, DbTrainingDetail>(&sql)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(TrainingDetail::from).collect())
}

#[instrument(skip(conn))]
pub async fn list_trainings_for_trainer(
    conn: &mut SqliteConnection,
    trainer_account_id: i64,
) -> Result<Vec<TrainingDetail>, AppError> {
    info!("Listing training sessions for trainer");
    let sql = format!(
        "{} WHERE t.trainer_account_id = ? ORDER BY t.date DESC, t.id DESC",
        SELECT_TRAINING_DETAIL
    );
    let rows = sqlx::query_as::<_, DbTrainingDetail>(&sql)
        .bind(trainer_account_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(TrainingDetail::from).collect())
}
