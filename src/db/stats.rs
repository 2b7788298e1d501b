use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, instrument};

use crate::auth::{Account, DbAccount};
use crate::db::accounts::get_account;
use crate::db::attendance::SELECT_ATTENDANCE_DETAIL;
use crate::db::competitions::upcoming_competitions;
use crate::error::AppError;
use crate::models::{AttendanceDetail, AttendanceSummary, CompetitionDetail, DbAttendanceDetail};

const RECENT_ACCOUNTS: i64 = 5;
const UPCOMING_COMPETITIONS: i64 = 5;
const RECENT_ATTENDANCE: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RoleCount {
    pub role_id: i64,
    pub role_name: String,
    pub accounts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_accounts: i64,
    pub accounts_by_role: Vec<RoleCount>,
    pub total_trainings: i64,
    pub total_competitions: i64,
    pub recent_accounts: Vec<Account>,
    pub upcoming_competitions: Vec<CompetitionDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainerStats {
    pub trainer_account_id: i64,
    pub total_trainings: i64,
    pub total_attendance: i64,
    pub recent_attendance: Vec<AttendanceDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDashboard {
    pub summary: AttendanceSummary,
    pub recent_attendance: Vec<AttendanceDetail>,
    pub upcoming_competitions: Vec<CompetitionDetail>,
}

async fn count(conn: &mut SqliteConnection, sql: &str) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(&mut *conn).await?)
}

async fn count_for(conn: &mut SqliteConnection, sql: &str, id: i64) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?)
}

/// Every role in the catalog with its account count, empty roles included.
#[instrument(skip(conn))]
pub async fn accounts_by_role(conn: &mut SqliteConnection) -> Result<Vec<RoleCount>, AppError> {
    let rows = sqlx::query_as::<_, RoleCount>(
        "SELECT r.id AS role_id, r.name AS role_name, COUNT(a.id) AS accounts
         FROM roles r
         LEFT JOIN accounts a ON a.role_id = r.id
         GROUP BY r.id, r.name
         ORDER BY r.id",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Club-wide dashboard, recomputed on every call.
#[instrument(skip(conn))]
pub async fn dashboard_stats(
    conn: &mut SqliteConnection,
    today: NaiveDate,
) -> Result<DashboardStats, AppError> {
    info!("Computing dashboard statistics");
    let total_accounts = count(conn, "SELECT COUNT(*) FROM accounts").await?;
    let total_trainings = count(conn, "SELECT COUNT(*) FROM trainings").await?;
    let total_competitions = count(conn, "SELECT COUNT(*) FROM competitions").await?;
    let accounts_by_role = accounts_by_role(conn).await?;

    let recent_accounts = sqlx::query_as::<_, DbAccount>(
        "SELECT a.id, a.first_name, a.last_name, a.email, a.birth_date,
                a.role_id, r.name AS role_name
         FROM accounts a
         JOIN roles r ON r.id = a.role_id
         ORDER BY a.id DESC
         LIMIT ?",
    )
    .bind(RECENT_ACCOUNTS)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(Account::from)
    .collect();

    let upcoming_competitions =
        upcoming_competitions(conn, today, Some(UPCOMING_COMPETITIONS)).await?;

    Ok(DashboardStats {
        total_accounts,
        accounts_by_role,
        total_trainings,
        total_competitions,
        recent_accounts,
        upcoming_competitions,
    })
}

#[instrument(skip(conn))]
pub async fn trainer_stats(
    conn: &mut SqliteConnection,
    trainer_account_id: i64,
) -> Result<TrainerStats, AppError> {
    info!("Computing trainer statistics");
    get_account(conn, trainer_account_id).await?;

    let total_trainings = count_for(
        conn,
        "SELECT COUNT(*) FROM trainings WHERE trainer_account_id = ?",
        trainer_account_id,
    )
    .await?;

    let total_attendance = count_for(
        conn,
        "SELECT COUNT(*) FROM attendances att
         JOIN trainings t ON t.id = att.training_id
         WHERE t.trainer_account_id = ?",
        trainer_account_id,
    )
    .await?;

    let sql = format!(
        "{} WHERE t.trainer_account_id = ? ORDER BY att.id DESC LIMIT ?",
        SELECT_ATTENDANCE_DETAIL
    );
    let recent_attendance = sqlx::query_as::<_, DbAttendanceDetail>(&sql)
        .bind(trainer_account_id)
        .bind(RECENT_ATTENDANCE)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(AttendanceDetail::from)
        .collect();

    Ok(TrainerStats {
        trainer_account_id,
        total_trainings,
        total_attendance,
        recent_attendance,
    })
}

/// The member's attendance count against every session the club has run.
/// Rows marked absent still count.
#[instrument(skip(conn))]
pub async fn member_summary(
    conn: &mut SqliteConnection,
    member_account_id: i64,
) -> Result<AttendanceSummary, AppError> {
    info!("Computing member attendance summary");
    get_account(conn, member_account_id).await?;

    let total_trainings = count(conn, "SELECT COUNT(*) FROM trainings").await?;
    let total_attendance = count_for(
        conn,
        "SELECT COUNT(*) FROM attendances WHERE member_account_id = ?",
        member_account_id,
    )
    .await?;

    Ok(AttendanceSummary::new(total_trainings, total_attendance))
}

#[instrument(skip(conn))]
pub async fn member_dashboard(
    conn: &mut SqliteConnection,
    member_account_id: i64,
    today: NaiveDate,
) -> Result<MemberDashboard, AppError> {
    let summary = member_summary(conn, member_account_id).await?;

    let sql = format!(
        "{} WHERE att.member_account_id = ? ORDER BY att.id DESC LIMIT ?",
        SELECT_ATTENDANCE_DETAIL
    );
    let recent_attendance = sqlx::query_as::<_, DbAttendanceDetail>(&sql)
        .bind(member_account_id)
        .bind(RECENT_ATTENDANCE)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(AttendanceDetail::from)
        .collect();

    let upcoming_competitions =
        upcoming_competitions(conn, today, Some(UPCOMING_COMPETITIONS)).await?;

    Ok(MemberDashboard {
        summary,
        recent_attendance,
        upcoming_competitions,
    })
}

/// Attendance count per training month, keyed `YYYY-MM`.
#[instrument(skip(conn))]
pub async fn monthly_attendance(
    conn: &mut SqliteConnection,
    member_account_id: i64,
) -> Result<BTreeMap<String, i64>, AppError> {
    info!("Computing monthly attendance history");
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT strftime('%Y-%m', t.date) AS month, COUNT(*) AS attended
         FROM attendances att
         JOIN trainings t ON t.id = att.training_id
         WHERE att.member_account_id = ?
         GROUP BY month
         ORDER BY month",
    )
    .bind(member_account_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().collect())
}
