use sqlx::SqliteConnection;
use tracing::{info, instrument};

use crate::error::{AppError, Reference};
use crate::models::Activity;
use crate::validation::validate_name;

fn duplicate(name: &str) -> AppError {
    AppError::DuplicateName {
        entity: "Activity",
        name: name.to_string(),
    }
}

async fn name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    excluding_id: i64,
) -> Result<bool, AppError> {
    let existing =
        sqlx::query_scalar::<_, i64>("SELECT id FROM activities WHERE name = ? AND id != ?")
            .bind(name)
            .bind(excluding_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(existing.is_some())
}

#[instrument(skip(conn))]
pub async fn create_activity(conn: &mut SqliteConnection, name: &str) -> Result<Activity, AppError> {
    info!("Creating activity");
    validate_name(name)?;
    let name = name.trim();

    if name_taken(conn, name, 0).await? {
        return Err(duplicate(name));
    }

    let res = sqlx::query("INSERT INTO activities (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::on_unique_violation(e, duplicate(name)))?;

    Ok(Activity {
        id: res.last_insert_rowid(),
        name: name.to_string(),
    })
}

#[instrument(skip(conn))]
pub async fn get_activity(conn: &mut SqliteConnection, id: i64) -> Result<Activity, AppError> {
    sqlx::query_as::<_, Activity>("SELECT id, name FROM activities WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::UnknownReference(Reference::Activity(id)))
}

#[instrument(skip(conn))]
pub async fn rename_activity(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
) -> Result<Activity, AppError> {
    info!("Renaming activity");
    validate_name(name)?;
    let name = name.trim();

    get_activity(conn, id).await?;

    if name_taken(conn, name, id).await? {
        return Err(duplicate(name));
    }

    sqlx::query("UPDATE activities SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::on_unique_violation(e, duplicate(name)))?;

    Ok(Activity {
        id,
        name: name.to_string(),
    })
}

#[instrument(skip(conn))]
pub async fn list_activities(conn: &mut SqliteConnection) -> Result<Vec<Activity>, AppError> {
    info!("Listing activities");
    let activities =
        sqlx::query_as::<_, Activity>("SELECT id, name FROM activities ORDER BY name, id")
            .fetch_all(&mut *conn)
            .await?;

    Ok(activities)
}

/// Refused while any training session or competition still names the activity.
#[instrument(skip(conn))]
pub async fn delete_activity(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    info!("Deleting activity");
    get_activity(conn, id).await?;

    let trainings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trainings WHERE activity_id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if trainings > 0 {
        return Err(AppError::ReferenceInUse {
            entity: "activity",
            id,
            dependents: "trainings",
        });
    }

    let competitions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM competitions WHERE activity_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

    if competitions > 0 {
        return Err(AppError::ReferenceInUse {
            entity: "activity",
            id,
            dependents: "competitions",
        });
    }

    sqlx::query("DELETE FROM activities WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
