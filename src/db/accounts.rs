use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Account, DbAccount, RoleKind};
use crate::db::roles::get_role;
use crate::error::{AppError, Reference};
use crate::validation::{AccountUpdate, NewAccount, validate_optional_birth_date};

const SELECT_ACCOUNT: &str = "SELECT a.id, a.first_name, a.last_name, a.email, a.birth_date,
            a.role_id, r.name AS role_name
     FROM accounts a
     JOIN roles r ON r.id = a.role_id";

const MINIMUM_PASSWORD_LEN: usize = 6;

async fn email_taken(
    conn: &mut SqliteConnection,
    email: &str,
    excluding_id: Option<i64>,
) -> Result<bool, AppError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM accounts WHERE email = ? AND id != ?")
        .bind(email)
        .bind(excluding_id.unwrap_or(0))
        .fetch_optional(&mut *conn)
        .await?;

    Ok(existing.is_some())
}

/// Creates an account after checking the role exists, the birth date is
/// acceptable and the email is free. The password is stored hashed.
#[instrument(skip_all, fields(email = %account.email, role_id = account.role_id))]
pub async fn create_account(
    conn: &mut SqliteConnection,
    account: &NewAccount,
) -> Result<Account, AppError> {
    info!("Creating new account");
    let account = account.trimmed();
    account.validate()?;
    validate_optional_birth_date(account.birth_date)?;

    let email = account.email.as_str();

    get_role(conn, account.role_id).await?;

    if email_taken(conn, email, None).await? {
        return Err(AppError::DuplicateEmail(email.to_string()));
    }

    let password_hash = hash_password(&account.password)?;

    let res = sqlx::query(
        "INSERT INTO accounts (first_name, last_name, email, password_hash, birth_date, role_id)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&account.first_name)
    .bind(&account.last_name)
    .bind(email)
    .bind(password_hash)
    .bind(account.birth_date)
    .bind(account.role_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::on_unique_violation(e, AppError::DuplicateEmail(email.to_string())))?;

    get_account(conn, res.last_insert_rowid()).await
}

#[instrument(skip(conn))]
pub async fn get_account(conn: &mut SqliteConnection, id: i64) -> Result<Account, AppError> {
    info!("Fetching account by ID");
    let sql = format!("{} WHERE a.id = ?", SELECT_ACCOUNT);
    let row = sqlx::query_as::<_, DbAccount>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(account) => Ok(Account::from(account)),
        _ => Err(AppError::UnknownReference(Reference::Account(id))),
    }
}

#[instrument(skip(conn))]
pub async fn find_account_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<Account>, AppError> {
    let sql = format!("{} WHERE a.email = ?", SELECT_ACCOUNT);
    let row = sqlx::query_as::<_, DbAccount>(&sql)
        .bind(email.trim())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Account::from))
}

#[instrument(skip(conn))]
pub async fn list_accounts(conn: &mut SqliteConnection) -> Result<Vec<Account>, AppError> {
    info!("Listing accounts");
    let sql = format!("{} ORDER BY a.id", SELECT_ACCOUNT);
    let rows = sqlx::query_as::<_, DbAccount>(&sql)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Account::from).collect())
}

#[instrument(skip(conn))]
pub async fn list_accounts_by_role(
    conn: &mut SqliteConnection,
    kind: RoleKind,
) -> Result<Vec<Account>, AppError> {
    info!(role = %kind, "Listing accounts by role");
    let sql = format!(
        "{} WHERE r.name = ? COLLATE NOCASE ORDER BY a.last_name, a.first_name, a.id",
        SELECT_ACCOUNT
    );
    let rows = sqlx::query_as::<_, DbAccount>(&sql)
        .bind(kind.as_str())
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Account::from).collect())
}

/// Resolves the role kind an account currently holds.
pub(crate) async fn account_role_kind(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<Option<RoleKind>, AppError> {
    Ok(get_account(conn, account_id).await?.role_kind())
}

#[instrument(skip_all, fields(account_id = id))]
pub async fn update_account(
    conn: &mut SqliteConnection,
    id: i64,
    update: &AccountUpdate,
) -> Result<Account, AppError> {
    info!("Updating account");
    let update = update.trimmed();
    update.validate()?;
    validate_optional_birth_date(update.birth_date)?;

    let email = update.email.as_str();

    get_account(conn, id).await?;
    get_role(conn, update.role_id).await?;

    if email_taken(conn, email, Some(id)).await? {
        return Err(AppError::DuplicateEmail(email.to_string()));
    }

    sqlx::query(
        "UPDATE accounts
         SET first_name = ?, last_name = ?, email = ?, birth_date = ?, role_id = ?
         WHERE id = ?",
    )
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(email)
    .bind(update.birth_date)
    .bind(update.role_id)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::on_unique_violation(e, AppError::DuplicateEmail(email.to_string())))?;

    get_account(conn, id).await
}

#[instrument(skip(conn))]
pub async fn assign_role(
    conn: &mut SqliteConnection,
    account_id: i64,
    role_id: i64,
) -> Result<Account, AppError> {
    info!("Reassigning account role");
    get_account(conn, account_id).await?;
    get_role(conn, role_id).await?;

    sqlx::query("UPDATE accounts SET role_id = ? WHERE id = ?")
        .bind(role_id)
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

    get_account(conn, account_id).await
}

#[instrument(skip(conn, plaintext))]
pub async fn set_password(
    conn: &mut SqliteConnection,
    account_id: i64,
    plaintext: &str,
) -> Result<(), AppError> {
    info!("Updating account password");
    if plaintext.chars().count() < MINIMUM_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password: Password must be at least {} characters",
            MINIMUM_PASSWORD_LEN
        )));
    }

    get_account(conn, account_id).await?;

    let password_hash = hash_password(plaintext)?;

    sqlx::query("UPDATE accounts SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[instrument(skip(conn, password))]
pub async fn authenticate(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
) -> Result<Account, AppError> {
    info!("Authenticating account");
    let row = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, password_hash FROM accounts WHERE email = ?",
    )
    .bind(email.trim())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some((id, password_hash)) if verify_password(password, &password_hash) => {
            get_account(conn, id).await
        }
        _ => {
            warn!("Authentication failed");
            Err(AppError::InvalidCredentials)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountDeletion {
    pub trainings_deleted: u64,
    pub attendance_deleted: u64,
    pub results_deleted: u64,
}

/// Deletes an account together with everything that hangs off it: the
/// sessions it trains (and their attendance), its own attendance rows and its
/// competition results.
#[instrument(skip(conn))]
pub async fn delete_account(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<AccountDeletion, AppError> {
    info!("Deleting account and dependents");
    get_account(conn, id).await?;

    let session_attendance = sqlx::query(
        "DELETE FROM attendances
         WHERE training_id IN (SELECT id FROM trainings WHERE trainer_account_id = ?)",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let trainings_deleted = sqlx::query("DELETE FROM trainings WHERE trainer_account_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let own_attendance = sqlx::query("DELETE FROM attendances WHERE member_account_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let results_deleted = sqlx::query("DELETE FROM results WHERE account_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(AccountDeletion {
        trainings_deleted,
        attendance_deleted: session_attendance + own_attendance,
        results_deleted,
    })
}
