#[cfg(test)]
pub mod test_db {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::str::FromStr;
    use std::sync::Once;

    use chrono::NaiveDate;
    use sqlx::pool::PoolConnection;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::{Pool, Sqlite};

    use crate::auth::RoleKind;
    use crate::database::{self, BUSY_TIMEOUT};
    use crate::db::{
        create_account, create_activity, create_competition, create_role, create_training,
        record_attendance,
    };
    use crate::error::AppError;
    use crate::service::ClubService;
    use crate::validation::{AttendanceEntry, NewAccount, NewCompetition};

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    pub fn date(value: &str) -> NaiveDate {
        value.parse().expect("test date must be YYYY-MM-DD")
    }

    pub fn email_for(first_name: &str) -> String {
        format!("{}@club.test", first_name.to_lowercase())
    }

    /// A migrated in-memory database with no rows at all. The pool holds a
    /// single connection, so release any acquired connection before handing
    /// the pool to code that acquires its own.
    pub async fn migrated_pool() -> Result<Pool<Sqlite>, AppError> {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("club_tracker=debug")
                .with_test_writer()
                .try_init();
        });

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(pool)
    }

    /// A migrated database in a temporary file, opened through the same pool
    /// setup the binary uses. Unlike [`migrated_pool`] it hands out several
    /// connections, so writers really contend for the database lock. The
    /// files are removed on drop.
    pub struct FileDb {
        path: PathBuf,
        pub pool: Pool<Sqlite>,
    }

    impl FileDb {
        pub async fn open() -> Result<Self, AppError> {
            let path =
                std::env::temp_dir().join(format!("club-tracker-{:016x}.db", rand::random::<u64>()));
            let pool = database::connect(&format!("sqlite://{}", path.display())).await?;
            database::run_migrations(&pool).await?;
            Ok(Self { path, pool })
        }

        pub fn service(&self) -> ClubService {
            ClubService::new(self.pool.clone())
        }

        pub async fn count(&self, table: &str) -> i64 {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            sqlx::query_scalar::<_, i64>(&sql)
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count rows")
        }
    }

    impl Drop for FileDb {
        fn drop(&mut self) {
            for suffix in ["", "-journal", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    struct TestAccount {
        first_name: String,
        last_name: String,
        role: String,
    }

    struct TestTraining {
        trainer: String,
        activity: String,
        date: NaiveDate,
    }

    struct TestCompetition {
        name: String,
        date: NaiveDate,
        venue: Option<String>,
        activity: Option<String>,
    }

    struct TestAttendance {
        training_index: usize,
        member: String,
        present: bool,
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        extra_roles: Vec<String>,
        accounts: Vec<TestAccount>,
        activities: Vec<String>,
        trainings: Vec<TestTraining>,
        competitions: Vec<TestCompetition>,
        attendance: Vec<TestAttendance>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// A role outside the three built-in kinds.
        pub fn role(mut self, name: &str) -> Self {
            self.extra_roles.push(name.to_string());
            self
        }

        pub fn account(mut self, first_name: &str, last_name: &str, role: &str) -> Self {
            self.accounts.push(TestAccount {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                role: role.to_string(),
            });
            self
        }

        pub fn admin(self, first_name: &str, last_name: &str) -> Self {
            self.account(first_name, last_name, RoleKind::Administrator.as_str())
        }

        pub fn trainer(self, first_name: &str, last_name: &str) -> Self {
            self.account(first_name, last_name, RoleKind::Trainer.as_str())
        }

        pub fn member(self, first_name: &str, last_name: &str) -> Self {
            self.account(first_name, last_name, RoleKind::Member.as_str())
        }

        pub fn activity(mut self, name: &str) -> Self {
            self.activities.push(name.to_string());
            self
        }

        /// Sessions are addressed later by insertion index.
        pub fn training(mut self, trainer: &str, activity: &str, on: &str) -> Self {
            self.trainings.push(TestTraining {
                trainer: trainer.to_string(),
                activity: activity.to_string(),
                date: date(on),
            });
            self
        }

        pub fn competition(
            mut self,
            name: &str,
            on: &str,
            venue: Option<&str>,
            activity: Option<&str>,
        ) -> Self {
            self.competitions.push(TestCompetition {
                name: name.to_string(),
                date: date(on),
                venue: venue.map(String::from),
                activity: activity.map(String::from),
            });
            self
        }

        pub fn attendance(mut self, training_index: usize, member: &str, present: bool) -> Self {
            self.attendance.push(TestAttendance {
                training_index,
                member: member.to_string(),
                present,
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            let pool = migrated_pool().await?;
            let mut conn = pool.acquire().await?;

            let mut role_ids: HashMap<String, i64> = HashMap::new();
            let builtin = [RoleKind::Administrator, RoleKind::Trainer, RoleKind::Member];
            let names = builtin
                .iter()
                .map(|kind| kind.as_str().to_string())
                .chain(self.extra_roles.iter().cloned());
            for name in names {
                let role = create_role(&mut conn, &name).await?;
                role_ids.insert(name, role.id);
            }

            let mut account_ids: HashMap<String, i64> = HashMap::new();
            for account in &self.accounts {
                let role_id = *role_ids
                    .get(&account.role)
                    .ok_or_else(|| AppError::Internal(format!("no role {}", account.role)))?;

                let created = create_account(
                    &mut conn,
                    &NewAccount {
                        first_name: account.first_name.clone(),
                        last_name: account.last_name.clone(),
                        email: email_for(&account.first_name),
                        password: STANDARD_PASSWORD.to_string(),
                        birth_date: None,
                        role_id,
                    },
                )
                .await?;
                account_ids.insert(account.first_name.clone(), created.id);
            }

            let mut activity_ids: HashMap<String, i64> = HashMap::new();
            for name in &self.activities {
                let activity = create_activity(&mut conn, name).await?;
                activity_ids.insert(name.clone(), activity.id);
            }

            let mut training_ids = Vec::with_capacity(self.trainings.len());
            for training in &self.trainings {
                let created = create_training(
                    &mut conn,
                    account_ids[&training.trainer],
                    activity_ids[&training.activity],
                    training.date,
                )
                .await?;
                training_ids.push(created.id);
            }

            let mut competition_ids: HashMap<String, i64> = HashMap::new();
            for competition in &self.competitions {
                let created = create_competition(
                    &mut conn,
                    &NewCompetition {
                        name: competition.name.clone(),
                        date: competition.date,
                        venue: competition.venue.clone(),
                        description: None,
                        activity_id: competition.activity.as_ref().map(|a| activity_ids[a]),
                    },
                )
                .await?;
                competition_ids.insert(competition.name.clone(), created.id);
            }

            for attendance in &self.attendance {
                record_attendance(
                    &mut conn,
                    training_ids[attendance.training_index],
                    account_ids[&attendance.member],
                    &AttendanceEntry {
                        present: attendance.present,
                        notes: None,
                    },
                )
                .await?;
            }

            drop(conn);

            Ok(TestDb {
                pool,
                role_ids,
                account_ids,
                activity_ids,
                training_ids,
                competition_ids,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub role_ids: HashMap<String, i64>,
        pub account_ids: HashMap<String, i64>,
        pub activity_ids: HashMap<String, i64>,
        pub training_ids: Vec<i64>,
        pub competition_ids: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn role_id(&self, name: &str) -> i64 {
            self.role_ids[name]
        }

        pub fn account_id(&self, first_name: &str) -> i64 {
            self.account_ids[first_name]
        }

        pub fn activity_id(&self, name: &str) -> i64 {
            self.activity_ids[name]
        }

        pub fn training_id(&self, index: usize) -> i64 {
            self.training_ids[index]
        }

        pub fn competition_id(&self, name: &str) -> i64 {
            self.competition_ids[name]
        }

        pub async fn conn(&self) -> PoolConnection<Sqlite> {
            self.pool
                .acquire()
                .await
                .expect("Failed to acquire test connection")
        }

        pub fn service(&self) -> ClubService {
            ClubService::new(self.pool.clone())
        }

        pub async fn count(&self, table: &str) -> i64 {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            let mut conn = self.conn().await;
            sqlx::query_scalar::<_, i64>(&sql)
                .fetch_one(&mut *conn)
                .await
                .expect("Failed to count rows")
        }
    }
}
