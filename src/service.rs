//! Authorized entry point for every club operation.
//!
//! Each method takes the id of the acting account, reloads that account so a
//! role change applies on the very next call, asks the access policy, and only
//! then touches data. Writes run inside one [`UnitOfWork`]; an error anywhere
//! drops the unit and nothing is kept.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::auth::password::generate_temporary_password;
use crate::auth::{Account, Operation, Ownership, Resource, Role, RoleKind};
use crate::database::UnitOfWork;
use crate::db::{self, AccountDeletion, DashboardStats, MemberDashboard, MemberReport};
use crate::db::{SearchHit, SearchKind, SearchQuery, TrainerStats};
use crate::error::{AppError, Reference};
use crate::models::{
    Activity, Attendance, AttendanceDetail, AttendanceSummary, Competition, CompetitionDetail,
    CompetitionResult, ResultDetail, TrainingDetail, TrainingSession,
};
use crate::validation::{
    AccountUpdate, AttendanceEntry, NewAccount, NewCompetition, ResultEntry, today,
};

/// Resolves the acting account. An id that matches no account is treated as
/// an unauthenticated caller.
async fn load_actor(conn: &mut SqliteConnection, actor_id: i64) -> Result<Account, AppError> {
    match db::get_account(conn, actor_id).await {
        Ok(account) => Ok(account),
        Err(AppError::UnknownReference(Reference::Account(_))) => Err(AppError::Unauthorized(
            format!("no account with id {}", actor_id),
        )),
        Err(e) => Err(e),
    }
}

fn search_resource(kind: SearchKind) -> Resource {
    match kind {
        SearchKind::Account => Resource::Account,
        SearchKind::Training => Resource::Training,
        SearchKind::Competition => Resource::Competition,
        SearchKind::Activity => Resource::Activity,
    }
}

#[derive(Clone)]
pub struct ClubService {
    pool: Pool<Sqlite>,
}

impl ClubService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    // Identity

    /// Self-service registration. Any role in the catalog may be chosen.
    #[instrument(skip_all, fields(email = %account.email))]
    pub async fn register(&self, account: &NewAccount) -> Result<Account, AppError> {
        info!("Registering account");
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let created = db::create_account(uow.conn(), account).await?;
        uow.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let mut conn = self.pool.acquire().await?;
        db::authenticate(&mut conn, email, password).await
    }

    /// Creates an account on someone else's behalf and returns it with the
    /// generated temporary password. The password is not retrievable later.
    #[instrument(skip(self, details), fields(email = %details.email))]
    pub async fn add_account(
        &self,
        actor_id: i64,
        details: &AccountUpdate,
    ) -> Result<(Account, String), AppError> {
        info!("Adding account with temporary password");
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Account, Operation::Create, Ownership::NotOwner)?;

        let password = generate_temporary_password();
        let new_account = NewAccount {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.clone(),
            password: password.clone(),
            birth_date: details.birth_date,
            role_id: details.role_id,
        };

        let created = db::create_account(uow.conn(), &new_account).await?;
        uow.commit().await?;
        Ok((created, password))
    }

    #[instrument(skip(self))]
    pub async fn get_account(&self, actor_id: i64, account_id: i64) -> Result<Account, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(
            Resource::Account,
            Operation::Read,
            Ownership::of(actor.id == account_id),
        )?;
        db::get_account(&mut conn, account_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_accounts(
        &self,
        actor_id: i64,
        role: Option<RoleKind>,
    ) -> Result<Vec<Account>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Account, Operation::Read, Ownership::NotOwner)?;

        match role {
            Some(kind) => db::list_accounts_by_role(&mut conn, kind).await,
            None => db::list_accounts(&mut conn).await,
        }
    }

    /// Profile edit. Holders edit their own profile; moving an account to
    /// another role needs role administration rights.
    #[instrument(skip(self, update))]
    pub async fn update_account(
        &self,
        actor_id: i64,
        account_id: i64,
        update: &AccountUpdate,
    ) -> Result<Account, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(
            Resource::Account,
            Operation::Update,
            Ownership::of(actor.id == account_id),
        )?;

        let current = db::get_account(uow.conn(), account_id).await?;
        if current.role.id != update.role_id {
            actor.require(Resource::Role, Operation::Update, Ownership::NotOwner)?;
        }

        let updated = db::update_account(uow.conn(), account_id, update).await?;
        uow.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn assign_role(
        &self,
        actor_id: i64,
        account_id: i64,
        role_id: i64,
    ) -> Result<Account, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Role, Operation::Update, Ownership::NotOwner)?;

        let updated = db::assign_role(uow.conn(), account_id, role_id).await?;
        uow.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self, new_password))]
    pub async fn change_password(
        &self,
        actor_id: i64,
        account_id: i64,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(
            Resource::Account,
            Operation::Update,
            Ownership::of(actor.id == account_id),
        )?;

        db::set_password(uow.conn(), account_id, new_password).await?;
        uow.commit().await
    }

    #[instrument(skip(self))]
    pub async fn delete_account(
        &self,
        actor_id: i64,
        account_id: i64,
    ) -> Result<AccountDeletion, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(
            Resource::Account,
            Operation::Delete,
            Ownership::of(actor.id == account_id),
        )?;

        let deletion = db::delete_account(uow.conn(), account_id).await?;
        uow.commit().await?;
        Ok(deletion)
    }

    // Reference data

    #[instrument(skip(self))]
    pub async fn create_role(&self, actor_id: i64, name: &str) -> Result<Role, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Role, Operation::Create, Ownership::NotOwner)?;

        let role = db::create_role(uow.conn(), name).await?;
        uow.commit().await?;
        Ok(role)
    }

    /// The role catalog is public: registration needs it before any account
    /// exists.
    #[instrument(skip(self))]
    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let mut conn = self.pool.acquire().await?;
        db::list_roles(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn delete_role(&self, actor_id: i64, role_id: i64) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Role, Operation::Delete, Ownership::NotOwner)?;

        db::delete_role(uow.conn(), role_id).await?;
        uow.commit().await
    }

    #[instrument(skip(self))]
    pub async fn create_activity(&self, actor_id: i64, name: &str) -> Result<Activity, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Activity, Operation::Create, Ownership::NotOwner)?;

        let activity = db::create_activity(uow.conn(), name).await?;
        uow.commit().await?;
        Ok(activity)
    }

    #[instrument(skip(self))]
    pub async fn rename_activity(
        &self,
        actor_id: i64,
        activity_id: i64,
        name: &str,
    ) -> Result<Activity, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Activity, Operation::Update, Ownership::NotOwner)?;

        let activity = db::rename_activity(uow.conn(), activity_id, name).await?;
        uow.commit().await?;
        Ok(activity)
    }

    #[instrument(skip(self))]
    pub async fn delete_activity(&self, actor_id: i64, activity_id: i64) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Activity, Operation::Delete, Ownership::NotOwner)?;

        db::delete_activity(uow.conn(), activity_id).await?;
        uow.commit().await
    }

    #[instrument(skip(self))]
    pub async fn list_activities(&self, actor_id: i64) -> Result<Vec<Activity>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Activity, Operation::Read, Ownership::NotOwner)?;
        db::list_activities(&mut conn).await
    }

    // Training sessions

    /// A trainer may only schedule sessions they run themselves.
    #[instrument(skip(self))]
    pub async fn create_training(
        &self,
        actor_id: i64,
        trainer_account_id: i64,
        activity_id: i64,
        date: NaiveDate,
    ) -> Result<TrainingSession, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(
            Resource::Training,
            Operation::Create,
            Ownership::of(actor.id == trainer_account_id),
        )?;

        let training =
            db::create_training(uow.conn(), trainer_account_id, activity_id, date).await?;
        uow.commit().await?;
        Ok(training)
    }

    /// Owning a session is not enough to hand it to another trainer.
    #[instrument(skip(self))]
    pub async fn update_training(
        &self,
        actor_id: i64,
        training_id: i64,
        trainer_account_id: i64,
        activity_id: i64,
        date: NaiveDate,
    ) -> Result<TrainingSession, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        let current = db::get_training(uow.conn(), training_id).await?;
        actor.require(
            Resource::Training,
            Operation::Update,
            Ownership::of(
                current.trainer_account_id == actor.id && trainer_account_id == actor.id,
            ),
        )?;

        let training = db::update_training(
            uow.conn(),
            training_id,
            trainer_account_id,
            activity_id,
            date,
        )
        .await?;
        uow.commit().await?;
        Ok(training)
    }

    #[instrument(skip(self))]
    pub async fn delete_training(&self, actor_id: i64, training_id: i64) -> Result<u64, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        let current = db::get_training(uow.conn(), training_id).await?;
        actor.require(
            Resource::Training,
            Operation::Delete,
            Ownership::of(current.trainer_account_id == actor.id),
        )?;

        let removed = db::delete_training(uow.conn(), training_id).await?;
        uow.commit().await?;
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn list_trainings(&self, actor_id: i64) -> Result<Vec<TrainingDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Training, Operation::Read, Ownership::NotOwner)?;
        db::list_trainings(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn trainings_for_trainer(
        &self,
        actor_id: i64,
        trainer_account_id: i64,
    ) -> Result<Vec<TrainingDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(
            Resource::Training,
            Operation::Read,
            Ownership::of(actor.id == trainer_account_id),
        )?;
        db::list_trainings_for_trainer(&mut conn, trainer_account_id).await
    }

    // Attendance

    #[instrument(skip(self, entry))]
    pub async fn record_attendance(
        &self,
        actor_id: i64,
        training_id: i64,
        member_account_id: i64,
        entry: &AttendanceEntry,
    ) -> Result<Attendance, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        let training = db::get_training(uow.conn(), training_id).await?;
        actor.require(
            Resource::Attendance,
            Operation::Create,
            Ownership::of(training.trainer_account_id == actor.id),
        )?;

        let attendance =
            db::record_attendance(uow.conn(), training_id, member_account_id, entry).await?;
        uow.commit().await?;
        Ok(attendance)
    }

    async fn require_session_owner(
        conn: &mut SqliteConnection,
        actor: &Account,
        attendance_id: i64,
        operation: Operation,
    ) -> Result<(), AppError> {
        let attendance = db::get_attendance(conn, attendance_id).await?;
        let training = db::get_training(conn, attendance.training_id).await?;
        actor.require(
            Resource::Attendance,
            operation,
            Ownership::of(training.trainer_account_id == actor.id),
        )
    }

    #[instrument(skip(self, entry))]
    pub async fn update_attendance(
        &self,
        actor_id: i64,
        attendance_id: i64,
        entry: &AttendanceEntry,
    ) -> Result<Attendance, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        Self::require_session_owner(uow.conn(), &actor, attendance_id, Operation::Update).await?;

        let attendance = db::update_attendance(uow.conn(), attendance_id, entry).await?;
        uow.commit().await?;
        Ok(attendance)
    }

    #[instrument(skip(self))]
    pub async fn delete_attendance(
        &self,
        actor_id: i64,
        attendance_id: i64,
    ) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        Self::require_session_owner(uow.conn(), &actor, attendance_id, Operation::Delete).await?;

        db::delete_attendance(uow.conn(), attendance_id).await?;
        uow.commit().await
    }

    #[instrument(skip(self))]
    pub async fn attendance_for_member(
        &self,
        actor_id: i64,
        member_account_id: i64,
    ) -> Result<Vec<AttendanceDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(
            Resource::Attendance,
            Operation::Read,
            Ownership::of(actor.id == member_account_id),
        )?;
        db::list_attendance_for_member(&mut conn, member_account_id).await
    }

    #[instrument(skip(self))]
    pub async fn attendance_for_training(
        &self,
        actor_id: i64,
        training_id: i64,
    ) -> Result<Vec<AttendanceDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        let training = db::get_training(&mut conn, training_id).await?;
        actor.require(
            Resource::Attendance,
            Operation::Read,
            Ownership::of(training.trainer_account_id == actor.id),
        )?;
        db::list_attendance_for_training(&mut conn, training_id).await
    }

    #[instrument(skip(self))]
    pub async fn attendance_for_trainer(
        &self,
        actor_id: i64,
        trainer_account_id: i64,
    ) -> Result<Vec<AttendanceDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(
            Resource::Attendance,
            Operation::Read,
            Ownership::of(actor.id == trainer_account_id),
        )?;
        db::list_attendance_for_trainer(&mut conn, trainer_account_id).await
    }

    #[instrument(skip(self))]
    pub async fn attendance_between(
        &self,
        actor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Attendance, Operation::Read, Ownership::NotOwner)?;
        db::list_attendance_between(&mut conn, start, end).await
    }

    // Competitions

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_competition(
        &self,
        actor_id: i64,
        input: &NewCompetition,
    ) -> Result<Competition, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Competition, Operation::Create, Ownership::NotOwner)?;

        let competition = db::create_competition(uow.conn(), input).await?;
        uow.commit().await?;
        Ok(competition)
    }

    #[instrument(skip(self, input))]
    pub async fn update_competition(
        &self,
        actor_id: i64,
        competition_id: i64,
        input: &NewCompetition,
    ) -> Result<Competition, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Competition, Operation::Update, Ownership::NotOwner)?;

        let competition = db::update_competition(uow.conn(), competition_id, input).await?;
        uow.commit().await?;
        Ok(competition)
    }

    #[instrument(skip(self))]
    pub async fn delete_competition(
        &self,
        actor_id: i64,
        competition_id: i64,
    ) -> Result<u64, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Competition, Operation::Delete, Ownership::NotOwner)?;

        let removed = db::delete_competition(uow.conn(), competition_id).await?;
        uow.commit().await?;
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn list_competitions(
        &self,
        actor_id: i64,
    ) -> Result<Vec<CompetitionDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Competition, Operation::Read, Ownership::NotOwner)?;
        db::list_competitions(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn upcoming_competitions(
        &self,
        actor_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<CompetitionDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Competition, Operation::Read, Ownership::NotOwner)?;
        db::upcoming_competitions(&mut conn, as_of, None).await
    }

    #[instrument(skip(self, entry))]
    pub async fn record_result(
        &self,
        actor_id: i64,
        competition_id: i64,
        account_id: i64,
        entry: &ResultEntry,
    ) -> Result<CompetitionResult, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Result, Operation::Create, Ownership::NotOwner)?;

        let result = db::record_result(uow.conn(), competition_id, account_id, entry).await?;
        uow.commit().await?;
        Ok(result)
    }

    #[instrument(skip(self, entry))]
    pub async fn update_result(
        &self,
        actor_id: i64,
        result_id: i64,
        entry: &ResultEntry,
    ) -> Result<CompetitionResult, AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Result, Operation::Update, Ownership::NotOwner)?;

        let result = db::update_result(uow.conn(), result_id, entry).await?;
        uow.commit().await?;
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn delete_result(&self, actor_id: i64, result_id: i64) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let actor = load_actor(uow.conn(), actor_id).await?;
        actor.require(Resource::Result, Operation::Delete, Ownership::NotOwner)?;

        db::delete_result(uow.conn(), result_id).await?;
        uow.commit().await
    }

    #[instrument(skip(self))]
    pub async fn results_for_competition(
        &self,
        actor_id: i64,
        competition_id: i64,
    ) -> Result<Vec<ResultDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Result, Operation::Read, Ownership::NotOwner)?;
        db::list_results_for_competition(&mut conn, competition_id).await
    }

    #[instrument(skip(self))]
    pub async fn results_for_account(
        &self,
        actor_id: i64,
        account_id: i64,
    ) -> Result<Vec<ResultDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(
            Resource::Result,
            Operation::Read,
            Ownership::of(actor.id == account_id),
        )?;
        db::list_results_for_account(&mut conn, account_id).await
    }

    // Search and statistics

    /// Kinds the actor may not read in general are not searched at all.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        actor_id: i64,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>, AppError> {
        if query.text.trim().chars().count() < db::MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let actor = {
            let mut conn = self.pool.acquire().await?;
            load_actor(&mut conn, actor_id).await?
        };

        if actor.role_kind().is_none() {
            return Err(AppError::Unauthorized(format!(
                "{} may not search",
                actor.role.name
            )));
        }

        let readable = SearchKind::ALL.into_iter().filter(|kind| {
            actor.can(search_resource(*kind), Operation::Read, Ownership::NotOwner)
        });
        let query = query.clone().visible_to(readable);
        Ok(db::search(&self.pool, &query).await)
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self, actor_id: i64) -> Result<DashboardStats, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(Resource::Statistics, Operation::Read, Ownership::NotOwner)?;
        db::dashboard_stats(&mut conn, today()).await
    }

    #[instrument(skip(self))]
    pub async fn trainer_dashboard(
        &self,
        actor_id: i64,
        trainer_account_id: i64,
    ) -> Result<TrainerStats, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(
            Resource::Statistics,
            Operation::Read,
            Ownership::of(actor.id == trainer_account_id),
        )?;
        db::trainer_stats(&mut conn, trainer_account_id).await
    }

    async fn require_member_history(
        conn: &mut SqliteConnection,
        actor_id: i64,
        member_account_id: i64,
    ) -> Result<(), AppError> {
        let actor = load_actor(conn, actor_id).await?;
        actor.require(
            Resource::Attendance,
            Operation::Read,
            Ownership::of(actor.id == member_account_id),
        )
    }

    #[instrument(skip(self))]
    pub async fn member_summary(
        &self,
        actor_id: i64,
        member_account_id: i64,
    ) -> Result<AttendanceSummary, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::require_member_history(&mut conn, actor_id, member_account_id).await?;
        db::member_summary(&mut conn, member_account_id).await
    }

    #[instrument(skip(self))]
    pub async fn member_dashboard(
        &self,
        actor_id: i64,
        member_account_id: i64,
    ) -> Result<MemberDashboard, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::require_member_history(&mut conn, actor_id, member_account_id).await?;
        db::member_dashboard(&mut conn, member_account_id, today()).await
    }

    #[instrument(skip(self))]
    pub async fn monthly_attendance(
        &self,
        actor_id: i64,
        member_account_id: i64,
    ) -> Result<BTreeMap<String, i64>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::require_member_history(&mut conn, actor_id, member_account_id).await?;
        db::monthly_attendance(&mut conn, member_account_id).await
    }

    // Reports

    async fn report_reader(conn: &mut SqliteConnection, actor_id: i64) -> Result<(), AppError> {
        let actor = load_actor(conn, actor_id).await?;
        actor.require(Resource::Report, Operation::Read, Ownership::NotOwner)
    }

    #[instrument(skip(self))]
    pub async fn accounts_report(&self, actor_id: i64) -> Result<Vec<Account>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::report_reader(&mut conn, actor_id).await?;
        db::accounts_report(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn activities_report(&self, actor_id: i64) -> Result<Vec<Activity>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::report_reader(&mut conn, actor_id).await?;
        db::activities_report(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn trainings_report(&self, actor_id: i64) -> Result<Vec<TrainingDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::report_reader(&mut conn, actor_id).await?;
        db::trainings_report(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn attendance_report(
        &self,
        actor_id: i64,
    ) -> Result<Vec<AttendanceDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::report_reader(&mut conn, actor_id).await?;
        db::attendance_report(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn competitions_report(
        &self,
        actor_id: i64,
    ) -> Result<Vec<CompetitionDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::report_reader(&mut conn, actor_id).await?;
        db::competitions_report(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn results_report(&self, actor_id: i64) -> Result<Vec<ResultDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::report_reader(&mut conn, actor_id).await?;
        db::results_report(&mut conn).await
    }

    #[instrument(skip(self))]
    pub async fn member_report(
        &self,
        actor_id: i64,
        member_account_id: i64,
    ) -> Result<MemberReport, AppError> {
        let mut conn = self.pool.acquire().await?;
        let actor = load_actor(&mut conn, actor_id).await?;
        actor.require(
            Resource::Report,
            Operation::Read,
            Ownership::of(actor.id == member_account_id),
        )?;
        db::member_report(&mut conn, member_account_id).await
    }
}
