use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::{info, instrument};
use validator::Validate;

use crate::db::activities::get_activity;
use crate::error::{AppError, Reference};
use crate::models::{Competition, CompetitionDetail, DbCompetitionDetail};
use crate::validation::NewCompetition;

pub(crate) const SELECT_COMPETITION_DETAIL: &str = "SELECT c.id, c.name, c.date, c.venue, c.description,
            ac.id AS activity_id, ac.name AS activity_name
     FROM competitions c
     LEFT JOIN activities ac ON ac.id = c.activity_id";

async fn check_input(conn: &mut SqliteConnection, input: &NewCompetition) -> Result<(), AppError> {
    input.validate()?;
    if let Some(activity_id) = input.activity_id {
        get_activity(conn, activity_id).await?;
    }
    Ok(())
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[instrument(skip_all, fields(name = %input.name, date = %input.date))]
pub async fn create_competition(
    conn: &mut SqliteConnection,
    input: &NewCompetition,
) -> Result<Competition, AppError> {
    info!("Creating competition");
    check_input(conn, input).await?;

    let name = input.name.trim().to_string();
    let venue = blank_to_none(&input.venue);
    let description = blank_to_none(&input.description);

    let res = sqlx::query(
        "INSERT INTO competitions (name, date, venue, description, activity_id)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&name)
    .bind(input.date)
    .bind(&venue)
    .bind(&description)
    .bind(input.activity_id)
    .execute(&mut *conn)
    .await?;

    Ok(Competition {
        id: res.last_insert_rowid(),
        name,
        date: input.date,
        venue,
        description,
        activity_id: input.activity_id,
    })
}

#[instrument(skip(conn))]
pub async fn get_competition(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Competition, AppError> {
    sqlx::query_as::<_, Competition>(
        "SELECT id, name, date, venue, description, activity_id FROM competitions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::UnknownReference(Reference::Competition(id)))
}

#[instrument(skip_all, fields(competition_id = id))]
pub async fn update_competition(
    conn: &mut SqliteConnection,
    id: i64,
    input: &NewCompetition,
) -> Result<Competition, AppError> {
    info!("Updating competition");
    get_competition(conn, id).await?;
    check_input(conn, input).await?;

    let name = input.name.trim().to_string();
    let venue = blank_to_none(&input.venue);
    let description = blank_to_none(&input.description);

    sqlx::query(
        "UPDATE competitions
         SET name = ?, date = ?, venue = ?, description = ?, activity_id = ?
         WHERE id = ?",
    )
    .bind(&name)
    .bind(input.date)
    .bind(&venue)
    .bind(&description)
    .bind(input.activity_id)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(Competition {
        id,
        name,
        date: input.date,
        venue,
        description,
        activity_id: input.activity_id,
    })
}

/// Removes the competition with its results; returns how many results went.
#[instrument(skip(conn))]
pub async fn delete_competition(conn: &mut SqliteConnection, id: i64) -> Result<u64, AppError> {
    info!("Deleting competition");
    get_competition(conn, id).await?;

    let results = sqlx::query("DELETE FROM results WHERE competition_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM competitions WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(results)
}

#[instrument(skip(conn))]
pub async fn list_competitions(
    conn: &mut SqliteConnection,
) -> Result<Vec<CompetitionDetail>, AppError> {
    info!("Listing competitions");
    let sql = format!("{} ORDER BY c.date DESC, c.id DESC", SELECT_COMPETITION_DETAIL);
    let rows = sqlx::query_as::<_, DbCompetitionDetail>(&sql)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(CompetitionDetail::from).collect())
}

/// Competitions on or after `as_of`, soonest first with ties broken by id.
/// `limit` of `None` returns all of them.
#[instrument(skip(conn))]
pub async fn upcoming_competitions(
    conn: &mut SqliteConnection,
    as_of: NaiveDate,
    limit: Option<i64>,
) -> Result<Vec<CompetitionDetail>, AppError> {
    info!("Listing upcoming competitions");
    let sql = format!(
        "{} WHERE c.date >= ? ORDER BY c.date ASC, c.id ASC LIMIT ?",
        SELECT_COMPETITION_DETAIL
    );
    let rows = sqlx::query_as::<_, DbCompetitionDetail>(&sql)
        .bind(as_of)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(CompetitionDetail::from).collect())
}
