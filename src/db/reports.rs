//! Read-only projections handed to report renderers. Every sub-entity is
//! already resolved so a renderer never goes back to storage.

use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, instrument};

use crate::auth::Account;
use crate::db::accounts::{get_account, list_accounts};
use crate::db::activities::list_activities;
use crate::db::attendance::{SELECT_ATTENDANCE_DETAIL, list_attendance_for_member};
use crate::db::competitions::list_competitions;
use crate::db::results::{list_results, list_results_for_account};
use crate::db::stats::member_summary;
use crate::db::trainings::list_trainings;
use crate::error::AppError;
use crate::models::{
    Activity, AttendanceDetail, AttendanceSummary, CompetitionDetail, DbAttendanceDetail,
    ResultDetail, TrainingDetail,
};

#[derive(Debug, Clone, Serialize)]
pub struct MemberReport {
    pub account: Account,
    pub attendance: Vec<AttendanceDetail>,
    pub results: Vec<ResultDetail>,
    pub summary: AttendanceSummary,
}

pub async fn accounts_report(conn: &mut SqliteConnection) -> Result<Vec<Account>, AppError> {
    list_accounts(conn).await
}

pub async fn activities_report(conn: &mut SqliteConnection) -> Result<Vec<Activity>, AppError> {
    list_activities(conn).await
}

pub async fn trainings_report(
    conn: &mut SqliteConnection,
) -> Result<Vec<TrainingDetail>, AppError> {
    list_trainings(conn).await
}

#[instrument(skip(conn))]
pub async fn attendance_report(
    conn: &mut SqliteConnection,
) -> Result<Vec<AttendanceDetail>, AppError> {
    info!("Building attendance report");
    let sql = format!("{} ORDER BY att.id DESC", SELECT_ATTENDANCE_DETAIL);
    let rows = sqlx::query_as::<_, DbAttendanceDetail>(&sql)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(AttendanceDetail::from).collect())
}

pub async fn competitions_report(
    conn: &mut SqliteConnection,
) -> Result<Vec<CompetitionDetail>, AppError> {
    list_competitions(conn).await
}

pub async fn results_report(conn: &mut SqliteConnection) -> Result<Vec<ResultDetail>, AppError> {
    list_results(conn).await
}

#[instrument(skip(conn))]
pub async fn member_report(
    conn: &mut SqliteConnection,
    member_account_id: i64,
) -> Result<MemberReport, AppError> {
    info!("Building member report");
    let account = get_account(conn, member_account_id).await?;
    let attendance = list_attendance_for_member(conn, member_account_id).await?;
    let results = list_results_for_account(conn, member_account_id).await?;
    let summary = member_summary(conn, member_account_id).await?;

    Ok(MemberReport {
        account,
        attendance,
        results,
        summary,
    })
}
