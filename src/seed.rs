use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::RoleKind;
use crate::database::UnitOfWork;
use crate::db;
use crate::error::AppError;
use crate::validation::{AttendanceEntry, NewAccount, NewCompetition, ResultEntry};

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const TRAINER_PASSWORD: &str = "trainer123";
const MEMBER_PASSWORD: &str = "member123";

const ACTIVITIES: [&str; 5] = ["Football", "Swimming", "Basketball", "Tennis", "Athletics"];

const TRAINERS: [(&str, &str, &str, (i32, u32, u32)); 3] = [
    ("Carlos", "Mendoza", "carlos@club.com", (1985, 3, 15)),
    ("Ana", "Rodríguez", "ana@club.com", (1988, 7, 22)),
    ("Luis", "García", "luis@club.com", (1982, 11, 8)),
];

const MEMBERS: [(&str, &str, &str, (i32, u32, u32)); 5] = [
    ("Juan", "Pérez", "juan@club.com", (1990, 5, 15)),
    ("María", "López", "maria@club.com", (1985, 8, 22)),
    ("Pedro", "Martínez", "pedro@club.com", (1992, 12, 3)),
    ("Laura", "González", "laura@club.com", (1988, 3, 18)),
    ("Diego", "Hernández", "diego@club.com", (1995, 7, 7)),
];

/// (name, days from today, venue, description, activity index)
const COMPETITIONS: [(&str, u64, &str, &str, usize); 3] = [
    (
        "Spring Football Tournament",
        30,
        "Municipal Sports Complex",
        "Annual football tournament for every category",
        0,
    ),
    (
        "Swimming Championship",
        45,
        "Olympic Pool",
        "Swimming races across the different strokes",
        1,
    ),
    (
        "Basketball League",
        60,
        "Main Gym",
        "Local basketball league",
        2,
    ),
];

const PAST_SESSION_DAYS: [u64; 5] = [1, 2, 3, 7, 8];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub roles: usize,
    pub activities: usize,
    pub trainers: usize,
    pub members: usize,
    pub trainings: usize,
    pub competitions: usize,
    pub attendance: usize,
    pub results: usize,
}

fn ymd((year, month, day): (i32, u32, u32)) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::Internal(format!("invalid seed date {}-{}-{}", year, month, day)))
}

fn shift(today: NaiveDate, days: u64, forward: bool) -> Result<NaiveDate, AppError> {
    let shifted = if forward {
        today.checked_add_days(Days::new(days))
    } else {
        today.checked_sub_days(Days::new(days))
    };
    shifted.ok_or_else(|| AppError::Internal(format!("seed date out of range: {} days", days)))
}

/// Fills an empty database with a demonstration club: the three roles, five
/// activities, an administrator, trainers, members, upcoming and past
/// sessions, attendance on the past sessions, competitions and results.
///
/// Returns `None` without writing anything when the role catalog is already
/// populated.
#[instrument(skip(pool, admin_password))]
pub async fn seed_sample_data(
    pool: &Pool<Sqlite>,
    admin_password: &str,
    today: NaiveDate,
) -> Result<Option<SeedSummary>, AppError> {
    let mut uow = UnitOfWork::begin(pool).await?;

    if !db::list_roles(uow.conn()).await?.is_empty() {
        info!("Roles already present, skipping sample data");
        return Ok(None);
    }

    info!("Seeding sample data");
    let mut summary = SeedSummary::default();

    let administrator = db::create_role(uow.conn(), RoleKind::Administrator.as_str()).await?;
    let trainer_role = db::create_role(uow.conn(), RoleKind::Trainer.as_str()).await?;
    let member_role = db::create_role(uow.conn(), RoleKind::Member.as_str()).await?;
    summary.roles = 3;

    let mut activities = Vec::with_capacity(ACTIVITIES.len());
    for name in ACTIVITIES {
        activities.push(db::create_activity(uow.conn(), name).await?);
    }
    summary.activities = activities.len();

    db::create_account(
        uow.conn(),
        &NewAccount {
            first_name: "Club".to_string(),
            last_name: "Administrator".to_string(),
            email: "admin@club.com".to_string(),
            password: admin_password.to_string(),
            birth_date: Some(ymd((1980, 1, 1))?),
            role_id: administrator.id,
        },
    )
    .await?;

    let mut trainers = Vec::with_capacity(TRAINERS.len());
    for (first_name, last_name, email, birth) in TRAINERS {
        let account = NewAccount {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: TRAINER_PASSWORD.to_string(),
            birth_date: Some(ymd(birth)?),
            role_id: trainer_role.id,
        };
        trainers.push(db::create_account(uow.conn(), &account).await?);
    }
    summary.trainers = trainers.len();

    let mut members = Vec::with_capacity(MEMBERS.len());
    for (first_name, last_name, email, birth) in MEMBERS {
        let account = NewAccount {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: MEMBER_PASSWORD.to_string(),
            birth_date: Some(ymd(birth)?),
            role_id: member_role.id,
        };
        members.push(db::create_account(uow.conn(), &account).await?);
    }
    summary.members = members.len();

    // Upcoming week: trainers and activities rotate.
    for (i, days) in (1..=5u64).enumerate() {
        let trainer = &trainers[i % 3];
        let activity = &activities[i % 3];
        db::create_training(uow.conn(), trainer.id, activity.id, shift(today, days, true)?)
            .await?;
        summary.trainings += 1;
    }

    let mut competitions = Vec::with_capacity(COMPETITIONS.len());
    for (name, days, venue, description, activity_index) in COMPETITIONS {
        let input = NewCompetition {
            name: name.to_string(),
            date: shift(today, days, true)?,
            venue: Some(venue.to_string()),
            description: Some(description.to_string()),
            activity_id: Some(activities[activity_index].id),
        };
        competitions.push(db::create_competition(uow.conn(), &input).await?);
    }
    summary.competitions = competitions.len();

    for (i, days) in PAST_SESSION_DAYS.into_iter().enumerate() {
        let date = shift(today, days, false)?;
        let trainer = &trainers[i % trainers.len()];
        let activity = &activities[i % activities.len()];
        let session = db::create_training(uow.conn(), trainer.id, activity.id, date).await?;
        summary.trainings += 1;

        for member in members.iter().take(3) {
            let entry = AttendanceEntry {
                present: true,
                notes: Some(format!("Attended on {}", date.format("%d/%m/%Y"))),
            };
            db::record_attendance(uow.conn(), session.id, member.id, &entry).await?;
            summary.attendance += 1;
        }
    }

    for (i, competition) in competitions.iter().enumerate() {
        for (j, member) in members.iter().take(2).enumerate() {
            let place = j as i32 + 1;
            let entry = ResultEntry {
                position: Some(place),
                mark: Some(format!("{}:{}:{}", i + 1, place * 10, place * 5)),
                notes: Some(format!("Result in {}", competition.name)),
            };
            db::record_result(uow.conn(), competition.id, member.id, &entry).await?;
            summary.results += 1;
        }
    }

    uow.commit().await?;
    info!(?summary, "Sample data created");
    Ok(Some(summary))
}
