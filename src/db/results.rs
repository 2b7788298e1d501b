use sqlx::SqliteConnection;
use tracing::{info, instrument};
use validator::Validate;

use crate::db::accounts::get_account;
use crate::db::competitions::get_competition;
use crate::error::{AppError, Reference};
use crate::models::{CompetitionResult, DbResultDetail, ResultDetail};
use crate::validation::ResultEntry;

pub(crate) const SELECT_RESULT_DETAIL: &str = "SELECT r.id, r.competition_id,
            c.name AS competition_name, c.date AS competition_date,
            a.id AS account_id, a.first_name AS account_first_name,
            a.last_name AS account_last_name, a.email AS account_email,
            r.position, r.mark, r.notes
     FROM results r
     JOIN competitions c ON c.id = r.competition_id
     JOIN accounts a ON a.id = r.account_id";

#[instrument(skip(conn, entry))]
pub async fn record_result(
    conn: &mut SqliteConnection,
    competition_id: i64,
    account_id: i64,
    entry: &ResultEntry,
) -> Result<CompetitionResult, AppError> {
    info!("Recording competition result");
    entry.validate()?;
    get_competition(conn, competition_id).await?;
    get_account(conn, account_id).await?;

    let duplicate = || AppError::DuplicateResult {
        competition_id,
        account_id,
    };

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM results WHERE competition_id = ? AND account_id = ?",
    )
    .bind(competition_id)
    .bind(account_id)
    .fetch_optional(&mut *conn)
    .await?;

    if existing.is_some() {
        return Err(duplicate());
    }

    let res = sqlx::query(
        "INSERT INTO results (competition_id, account_id, position, mark, notes)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(competition_id)
    .bind(account_id)
    .bind(entry.position)
    .bind(&entry.mark)
    .bind(&entry.notes)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::on_unique_violation(e, duplicate()))?;

    Ok(CompetitionResult {
        id: res.last_insert_rowid(),
        competition_id,
        account_id,
        position: entry.position,
        mark: entry.mark.clone(),
        notes: entry.notes.clone(),
    })
}

#[instrument(skip(conn))]
pub async fn get_result(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<CompetitionResult, AppError> {
    sqlx::query_as::<_, CompetitionResult>(
        "SELECT id, competition_id, account_id, position, mark, notes FROM results WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::UnknownReference(Reference::Result(id)))
}

#[instrument(skip(conn, entry))]
pub async fn update_result(
    conn: &mut SqliteConnection,
    id: i64,
    entry: &ResultEntry,
) -> Result<CompetitionResult, AppError> {
    info!("Updating competition result");
    entry.validate()?;
    let mut result = get_result(conn, id).await?;

    sqlx::query("UPDATE results SET position = ?, mark = ?, notes = ? WHERE id = ?")
        .bind(entry.position)
        .bind(&entry.mark)
        .bind(&entry.notes)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    result.position = entry.position;
    result.mark = entry.mark.clone();
    result.notes = entry.notes.clone();
    Ok(result)
}

#[instrument(skip(conn))]
pub async fn delete_result(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    info!("Deleting competition result");
    get_result(conn, id).await?;

    sqlx::query("DELETE FROM results WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Standings: placed results by position, unplaced ones after them.
#[instrument(skip(conn))]
pub async fn list_results_for_competition(
    conn: &mut SqliteConnection,
    competition_id: i64,
) -> Result<Vec<ResultDetail>, AppError> {
    info!("Listing results for competition");
    get_competition(conn, competition_id).await?;

    let sql = format!(
        "{} WHERE r.competition_id = ? ORDER BY r.position IS NULL, r.position, r.id",
        SELECT_RESULT_DETAIL
    );
    let rows = sqlx::query_as::<_, DbResultDetail>(&sql)
        .bind(competition_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(ResultDetail::from).collect())
}

#[instrument(skip(conn))]
pub async fn list_results_for_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<Vec<ResultDetail>, AppError> {
    info!("Listing results for account");
    let sql = format!(
        "{} WHERE r.account_id = ? ORDER BY c.date DESC, r.id DESC",
        SELECT_RESULT_DETAIL
    );
    let rows = sqlx::query_as::<_, DbResultDetail>(&sql)
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(ResultDetail::from).collect())
}

#[instrument(skip(conn))]
pub async fn list_results(conn: &mut SqliteConnection) -> Result<Vec<ResultDetail>, AppError> {
    info!("Listing all results");
    let sql = format!(
        "{} ORDER BY c.date DESC, r.competition_id, r.position IS NULL, r.position, r.id",
        SELECT_RESULT_DETAIL
    );
    let rows = sqlx::query_as::<_, DbResultDetail>(&sql)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(ResultDetail::from).collect())
}
