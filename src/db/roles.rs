use sqlx::SqliteConnection;
use tracing::{info, instrument};

use crate::auth::{DbRole, Role, RoleKind};
use crate::error::{AppError, Reference};
use crate::validation::validate_name;

#[instrument(skip(conn))]
pub async fn create_role(conn: &mut SqliteConnection, name: &str) -> Result<Role, AppError> {
    info!("Creating role");
    validate_name(name)?;
    let name = name.trim();

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    let duplicate = || AppError::DuplicateName {
        entity: "Role",
        name: name.to_string(),
    };

    if existing.is_some() {
        return Err(duplicate());
    }

    let res = sqlx::query("INSERT INTO roles (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::on_unique_violation(e, duplicate()))?;

    Ok(Role::new(res.last_insert_rowid(), name.to_string()))
}

#[instrument(skip(conn))]
pub async fn get_role(conn: &mut SqliteConnection, id: i64) -> Result<Role, AppError> {
    let row = sqlx::query_as::<_, DbRole>("SELECT id, name FROM roles WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(role) => Ok(Role::from(role)),
        None => Err(AppError::UnknownReference(Reference::Role(id))),
    }
}

#[instrument(skip(conn))]
pub async fn list_roles(conn: &mut SqliteConnection) -> Result<Vec<Role>, AppError> {
    info!("Listing roles");
    let rows = sqlx::query_as::<_, DbRole>("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Role::from).collect())
}

/// The role row whose name maps onto `kind`, if the catalog has one.
#[instrument(skip(conn))]
pub async fn find_role_by_kind(
    conn: &mut SqliteConnection,
    kind: RoleKind,
) -> Result<Option<Role>, AppError> {
    let row = sqlx::query_as::<_, DbRole>(
        "SELECT id, name FROM roles WHERE name = ? COLLATE NOCASE ORDER BY id LIMIT 1",
    )
    .bind(kind.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Role::from))
}

/// Roles are reference data: deleting one that still has accounts is refused.
#[instrument(skip(conn))]
pub async fn delete_role(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    info!("Deleting role");
    get_role(conn, id).await?;

    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role_id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if in_use > 0 {
        return Err(AppError::ReferenceInUse {
            entity: "role",
            id,
            dependents: "accounts",
        });
    }

    sqlx::query("DELETE FROM roles WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
