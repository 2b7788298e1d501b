use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TrainingSession {
    pub id: i64,
    pub trainer_account_id: i64,
    pub activity_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: i64,
    pub training_id: i64,
    pub member_account_id: i64,
    pub present: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Competition {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub activity_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CompetitionResult {
    pub id: i64,
    pub competition_id: i64,
    pub account_id: i64,
    pub position: Option<i32>,
    pub mark: Option<String>,
    pub notes: Option<String>,
}

/// Account as it appears inside another record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingDetail {
    pub id: i64,
    pub date: NaiveDate,
    pub trainer: Person,
    pub activity: Activity,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTrainingDetail {
    pub id: i64,
    pub date: NaiveDate,
    pub trainer_id: i64,
    pub trainer_first_name: String,
    pub trainer_last_name: String,
    pub trainer_email: String,
    pub activity_id: i64,
    pub activity_name: String,
}

impl From<DbTrainingDetail> for TrainingDetail {
    fn from(row: DbTrainingDetail) -> Self {
        Self {
            id: row.id,
            date: row.date,
            trainer: Person {
                id: row.trainer_id,
                first_name: row.trainer_first_name,
                last_name: row.trainer_last_name,
                email: row.trainer_email,
            },
            activity: Activity {
                id: row.activity_id,
                name: row.activity_name,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceDetail {
    pub id: i64,
    pub present: bool,
    pub notes: Option<String>,
    pub member: Person,
    pub training: TrainingDetail,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAttendanceDetail {
    pub id: i64,
    pub present: bool,
    pub notes: Option<String>,
    pub member_id: i64,
    pub member_first_name: String,
    pub member_last_name: String,
    pub member_email: String,
    pub training_id: i64,
    pub training_date: NaiveDate,
    pub trainer_id: i64,
    pub trainer_first_name: String,
    pub trainer_last_name: String,
    pub trainer_email: String,
    pub activity_id: i64,
    pub activity_name: String,
}

impl From<DbAttendanceDetail> for AttendanceDetail {
    fn from(row: DbAttendanceDetail) -> Self {
        Self {
            id: row.id,
            present: row.present,
            notes: row.notes,
            member: Person {
                id: row.member_id,
                first_name: row.member_first_name,
                last_name: row.member_last_name,
                email: row.member_email,
            },
            training: TrainingDetail {
                id: row.training_id,
                date: row.training_date,
                trainer: Person {
                    id: row.trainer_id,
                    first_name: row.trainer_first_name,
                    last_name: row.trainer_last_name,
                    email: row.trainer_email,
                },
                activity: Activity {
                    id: row.activity_id,
                    name: row.activity_name,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionDetail {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub activity: Option<Activity>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCompetitionDetail {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub activity_id: Option<i64>,
    pub activity_name: Option<String>,
}

impl From<DbCompetitionDetail> for CompetitionDetail {
    fn from(row: DbCompetitionDetail) -> Self {
        let activity = match (row.activity_id, row.activity_name) {
            (Some(id), Some(name)) => Some(Activity { id, name }),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            date: row.date,
            venue: row.venue,
            description: row.description,
            activity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDetail {
    pub id: i64,
    pub competition_id: i64,
    pub competition_name: String,
    pub competition_date: NaiveDate,
    pub account: Person,
    pub position: Option<i32>,
    pub mark: Option<String>,
    pub notes: Option<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbResultDetail {
    pub id: i64,
    pub competition_id: i64,
    pub competition_name: String,
    pub competition_date: NaiveDate,
    pub account_id: i64,
    pub account_first_name: String,
    pub account_last_name: String,
    pub account_email: String,
    pub position: Option<i32>,
    pub mark: Option<String>,
    pub notes: Option<String>,
}

impl From<DbResultDetail> for ResultDetail {
    fn from(row: DbResultDetail) -> Self {
        Self {
            id: row.id,
            competition_id: row.competition_id,
            competition_name: row.competition_name,
            competition_date: row.competition_date,
            account: Person {
                id: row.account_id,
                first_name: row.account_first_name,
                last_name: row.account_last_name,
                email: row.account_email,
            },
            position: row.position,
            mark: row.mark,
            notes: row.notes,
        }
    }
}

/// Attendance rate over every training session in the club, not only the
/// sessions the member could have attended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub total_trainings: i64,
    pub total_attendance: i64,
    pub rate: f64,
}

impl AttendanceSummary {
    pub fn new(total_trainings: i64, total_attendance: i64) -> Self {
        let rate = if total_trainings > 0 {
            let percent = total_attendance as f64 / total_trainings as f64 * 100.0;
            (percent * 10.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            total_trainings,
            total_attendance,
            rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AttendanceSummary;

    #[test]
    fn test_attendance_rate_rounding() {
        assert_eq!(AttendanceSummary::new(3, 1).rate, 33.3);
        assert_eq!(AttendanceSummary::new(3, 2).rate, 66.7);
        assert_eq!(AttendanceSummary::new(0, 4).rate, 0.0);
    }
}
