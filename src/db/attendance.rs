use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::{info, instrument};

use crate::auth::RoleKind;
use crate::db::accounts::account_role_kind;
use crate::db::trainings::get_training;
use crate::error::{AppError, Reference};
use crate::models::{Attendance, AttendanceDetail, DbAttendanceDetail};
use crate::validation::AttendanceEntry;

pub(crate) const SELECT_ATTENDANCE_DETAIL: &str = "SELECT att.id, att.present, att.notes,
            m.id AS member_id, m.first_name AS member_first_name,
            m.last_name AS member_last_name, m.email AS member_email,
            t.id AS training_id, t.date AS training_date,
            tr.id AS trainer_id, tr.first_name AS trainer_first_name,
            tr.last_name AS trainer_last_name, tr.email AS trainer_email,
            ac.id AS activity_id, ac.name AS activity_name
     FROM attendances att
     JOIN accounts m ON m.id = att.member_account_id
     JOIN trainings t ON t.id = att.training_id
     JOIN accounts tr ON tr.id = t.trainer_account_id
     JOIN activities ac ON ac.id = t.activity_id";

async fn fetch_details(
    conn: &mut SqliteConnection,
    sql: &str,
    binds: &[i64],
) -> Result<Vec<AttendanceDetail>, AppError> {
    let mut query = sqlx::query_as::<_, DbAttendanceDetail>(sql);
    for value in binds {
        query = query.bind(*value);
    }
    let rows = query.fetch_all(&mut *conn).await?;

    Ok(rows.into_iter().map(AttendanceDetail::from).collect())
}

/// Records a member's attendance on a session. A second record for the same
/// pair is a conflict; amendments go through [`update_attendance`].
#[instrument(skip(conn, entry), fields(present = entry.present))]
pub async fn record_attendance(
    conn: &mut SqliteConnection,
    training_id: i64,
    member_account_id: i64,
    entry: &AttendanceEntry,
) -> Result<Attendance, AppError> {
    info!("Recording attendance");
    get_training(conn, training_id).await?;

    match account_role_kind(conn, member_account_id).await? {
        Some(RoleKind::Member) => {}
        _ => return Err(AppError::InvalidMemberRole(member_account_id)),
    }

    let duplicate = || AppError::DuplicateAttendance {
        training_id,
        member_account_id,
    };

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM attendances WHERE training_id = ? AND member_account_id = ?",
    )
    .bind(training_id)
    .bind(member_account_id)
    .fetch_optional(&mut *conn)
    .await?;

    if existing.is_some() {
        return Err(duplicate());
    }

    let res = sqlx::query(
        "INSERT INTO attendances (training_id, member_account_id, present, notes)
         VALUES (?, ?, ?, ?)",
    )
    .bind(training_id)
    .bind(member_account_id)
    .bind(entry.present)
    .bind(&entry.notes)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::on_unique_violation(e, duplicate()))?;

    Ok(Attendance {
        id: res.last_insert_rowid(),
        training_id,
        member_account_id,
        present: entry.present,
        notes: entry.notes.clone(),
    })
}

#[instrument(skip(conn))]
pub async fn get_attendance(conn: &mut SqliteConnection, id: i64) -> Result<Attendance, AppError> {
    sqlx::query_as::<_, Attendance>(
        "SELECT id, training_id, member_account_id, present, notes FROM attendances WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::UnknownReference(Reference::Attendance(id)))
}

#[instrument(skip(conn, entry), fields(present = entry.present))]
pub async fn update_attendance(
    conn: &mut SqliteConnection,
    id: i64,
    entry: &AttendanceEntry,
) -> Result<Attendance, AppError> {
    info!("Amending attendance");
    let mut attendance = get_attendance(conn, id).await?;

    sqlx::query("UPDATE attendances SET present = ?, notes = ? WHERE id = ?")
        .bind(entry.present)
        .bind(&entry.notes)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    attendance.present = entry.present;
    attendance.notes = entry.notes.clone();
    Ok(attendance)
}

#[instrument(skip(conn))]
pub async fn delete_attendance(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    info!("Deleting attendance");
    get_attendance(conn, id).await?;

    sqlx::query("DELETE FROM attendances WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Most recently recorded first.
#[instrument(skip(conn))]
pub async fn list_attendance_for_member(
    conn: &mut SqliteConnection,
    member_account_id: i64,
) -> Result<Vec<AttendanceDetail>, AppError> {
    info!("Listing attendance for member");
    let sql = format!(
        "{} WHERE att.member_account_id = ? ORDER BY att.id DESC",
        SELECT_ATTENDANCE_DETAIL
    );
    fetch_details(conn, &sql, &[member_account_id]).await
}

/// Attendance recorded on any session the trainer runs, most recent first.
#[instrument(skip(conn))]
pub async fn list_attendance_for_trainer(
    conn: &mut SqliteConnection,
    trainer_account_id: i64,
) -> Result<Vec<AttendanceDetail>, AppError> {
    info!("Listing attendance for trainer");
    let sql = format!(
        "{} WHERE t.trainer_account_id = ? ORDER BY att.id DESC",
        SELECT_ATTENDANCE_DETAIL
    );
    fetch_details(conn, &sql, &[trainer_account_id]).await
}

#[instrument(skip(conn))]
pub async fn list_attendance_for_training(
    conn: &mut SqliteConnection,
    training_id: i64,
) -> Result<Vec<AttendanceDetail>, AppError> {
    info!("Listing attendance for training");
    get_training(conn, training_id).await?;
    let sql = format!(
        "{} WHERE att.training_id = ? ORDER BY m.last_name, m.first_name, att.id",
        SELECT_ATTENDANCE_DETAIL
    );
    fetch_details(conn, &sql, &[training_id]).await
}

/// Attendance on sessions dated within `[start, end]`, latest session first.
#[instrument(skip(conn))]
pub async fn list_attendance_between(
    conn: &mut SqliteConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceDetail>, AppError> {
    info!("Listing attendance in date range");
    if start > end {
        return Err(AppError::InvalidDateRange(format!(
            "Start date {} is after end date {}",
            start, end
        )));
    }

    let sql = format!(
        "{} WHERE t.date BETWEEN ? AND ? ORDER BY t.date DESC, att.id DESC",
        SELECT_ATTENDANCE_DETAIL
    );
    let rows = sqlx::query_as::<_, DbAttendanceDetail>(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(AttendanceDetail::from).collect())
}
