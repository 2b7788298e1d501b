#[cfg(test)]
mod tests {
    use crate::database::UnitOfWork;
    use crate::db::{self, SearchKind, SearchQuery};
    use crate::error::{AppError, Reference};
    use crate::test::test_db::{TestDbBuilder, date, email_for};
    use crate::validation::{AccountUpdate, AttendanceEntry};

    fn update_for(role_id: i64, first_name: &str, last_name: &str) -> AccountUpdate {
        AccountUpdate {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email_for(first_name),
            birth_date: None,
            role_id,
        }
    }

    #[tokio::test]
    async fn test_trainer_schedules_only_own_sessions() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .trainer("Carlos", "Mendoza")
            .trainer("Ana", "Rodriguez")
            .member("Juan", "Perez")
            .activity("Swimming")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let carlos = test_db.account_id("Carlos");
        let swimming = test_db.activity_id("Swimming");

        let own = service
            .create_training(carlos, carlos, swimming, date("2024-06-01"))
            .await
            .expect("Trainer should schedule own session");
        assert_eq!(own.trainer_account_id, carlos);

        assert!(matches!(
            service
                .create_training(carlos, test_db.account_id("Ana"), swimming, date("2024-06-01"))
                .await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service
                .create_training(test_db.account_id("Juan"), carlos, swimming, date("2024-06-01"))
                .await,
            Err(AppError::Unauthorized(_))
        ));

        service
            .create_training(test_db.account_id("Admin"), test_db.account_id("Ana"), swimming, date("2024-06-02"))
            .await
            .expect("Administrator schedules for any trainer");

        assert_eq!(test_db.count("trainings").await, 2);
    }

    #[tokio::test]
    async fn test_trainer_cannot_hand_session_over() {
        let test_db = TestDbBuilder::new()
            .trainer("Carlos", "Mendoza")
            .trainer("Ana", "Rodriguez")
            .activity("Swimming")
            .training("Carlos", "Swimming", "2024-06-01")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let carlos = test_db.account_id("Carlos");
        let session = test_db.training_id(0);
        let swimming = test_db.activity_id("Swimming");

        service
            .update_training(carlos, session, carlos, swimming, date("2024-06-03"))
            .await
            .expect("Owner may reschedule");

        assert!(matches!(
            service
                .update_training(carlos, session, test_db.account_id("Ana"), swimming, date("2024-06-03"))
                .await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.delete_training(test_db.account_id("Ana"), session).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_attendance_only_on_own_sessions() {
        let test_db = TestDbBuilder::new()
            .trainer("Carlos", "Mendoza")
            .trainer("Ana", "Rodriguez")
            .member("Juan", "Perez")
            .activity("Swimming")
            .training("Carlos", "Swimming", "2024-06-01")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let session = test_db.training_id(0);
        let juan = test_db.account_id("Juan");

        assert!(matches!(
            service
                .record_attendance(test_db.account_id("Ana"), session, juan, &AttendanceEntry::default())
                .await,
            Err(AppError::Unauthorized(_))
        ));

        let recorded = service
            .record_attendance(test_db.account_id("Carlos"), session, juan, &AttendanceEntry::default())
            .await
            .expect("Session trainer records attendance");

        assert!(matches!(
            service
                .delete_attendance(test_db.account_id("Ana"), recorded.id)
                .await,
            Err(AppError::Unauthorized(_))
        ));

        let own = service
            .attendance_for_member(juan, juan)
            .await
            .expect("Member reads own attendance");
        assert_eq!(own.len(), 1);

        assert!(matches!(
            service.attendance_for_training(juan, session).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_actor_is_unauthorized() {
        let test_db = TestDbBuilder::new()
            .activity("Swimming")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();

        assert!(matches!(
            service.list_activities(404).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.search(404, &SearchQuery::new("swim")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.search(404, &SearchQuery::new("a")).await,
            Ok(hits) if hits.is_empty()
        ));
        assert!(matches!(
            service.dashboard(404).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_unmapped_role_grants_nothing() {
        let test_db = TestDbBuilder::new()
            .role("Guest")
            .account("Gus", "Visitor", "Guest")
            .activity("Swimming")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let gus = test_db.account_id("Gus");

        assert!(matches!(
            service.get_account(gus, gus).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.list_trainings(gus).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.search(gus, &SearchQuery::new("swim")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_role_change_needs_administrator() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .member("Juan", "Perez")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let juan = test_db.account_id("Juan");
        let member_role = test_db.role_id("Member");
        let trainer_role = test_db.role_id("Trainer");

        let renamed = service
            .update_account(juan, juan, &update_for(member_role, "Juan", "Perez Gil"))
            .await
            .expect("Member edits own profile");
        assert_eq!(renamed.last_name, "Perez Gil");

        assert!(matches!(
            service
                .update_account(juan, juan, &update_for(trainer_role, "Juan", "Perez Gil"))
                .await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.assign_role(juan, juan, trainer_role).await,
            Err(AppError::Unauthorized(_))
        ));

        let promoted = service
            .assign_role(test_db.account_id("Admin"), juan, trainer_role)
            .await
            .expect("Administrator assigns roles");
        assert_eq!(promoted.role.name, "Trainer");

        let own_trainings = service
            .trainings_for_trainer(juan, juan)
            .await
            .expect("New role applies on the next call");
        assert!(own_trainings.is_empty());
    }

    #[tokio::test]
    async fn test_add_account_returns_working_password() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .member("Juan", "Perez")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let details = update_for(test_db.role_id("Member"), "Laura", "Gonzalez");

        assert!(matches!(
            service.add_account(test_db.account_id("Juan"), &details).await,
            Err(AppError::Unauthorized(_))
        ));

        let (account, password) = service
            .add_account(test_db.account_id("Admin"), &details)
            .await
            .expect("Administrator adds accounts");

        let signed_in = service
            .authenticate(&details.email, &password)
            .await
            .expect("Temporary password should authenticate");
        assert_eq!(signed_in.id, account.id);

        service
            .change_password(account.id, account.id, "chosen-by-laura")
            .await
            .expect("Holder changes own password");
        assert!(matches!(
            service.authenticate(&details.email, &password).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_member_search_hides_accounts() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .trainer("Ana", "Swimmer")
            .member("Juan", "Perez")
            .activity("Swimming")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();

        let as_admin = service
            .search(test_db.account_id("Admin"), &SearchQuery::new("swim"))
            .await
            .expect("search");
        assert!(as_admin.iter().any(|h| h.kind == SearchKind::Account));
        assert!(as_admin.iter().any(|h| h.kind == SearchKind::Activity));

        let as_member = service
            .search(test_db.account_id("Juan"), &SearchQuery::new("swim"))
            .await
            .expect("search");
        assert!(as_member.iter().all(|h| h.kind != SearchKind::Account));
        assert_eq!(as_member.len(), 1);

        let short = service
            .search(test_db.account_id("Juan"), &SearchQuery::new("s"))
            .await
            .expect("search");
        assert!(short.is_empty());
    }

    #[tokio::test]
    async fn test_member_search_not_crowded_out_by_accounts() {
        let mut builder = TestDbBuilder::new()
            .admin("Admin", "Club")
            .member("Juan", "Perez")
            .activity("Running");
        for i in 0..10 {
            let trainer = format!("Zeta{}", i);
            builder = builder
                .trainer(&trainer, "Coach")
                .training(&trainer, "Running", "2024-06-01");
        }
        for i in 0..3 {
            builder = builder.competition(&format!("Zeta Cup {}", i), "2024-07-01", None, None);
        }
        let test_db = builder.build().await.expect("test db");
        let service = test_db.service();
        let query = SearchQuery::new("zeta");
        let count_of = |hits: &[db::SearchHit], kind: SearchKind| {
            hits.iter().filter(|h| h.kind == kind).count()
        };

        let as_admin = service
            .search(test_db.account_id("Admin"), &query)
            .await
            .expect("search");
        assert_eq!(as_admin.len(), db::TOTAL_LIMIT);
        assert_eq!(count_of(&as_admin, SearchKind::Account), 10);
        assert_eq!(count_of(&as_admin, SearchKind::Competition), 0);

        let as_member = service
            .search(test_db.account_id("Juan"), &query)
            .await
            .expect("search");
        assert_eq!(count_of(&as_member, SearchKind::Account), 0);
        assert_eq!(count_of(&as_member, SearchKind::Training), 10);
        assert_eq!(count_of(&as_member, SearchKind::Competition), 3);
    }

    #[tokio::test]
    async fn test_statistics_access() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .trainer("Carlos", "Mendoza")
            .member("Juan", "Perez")
            .member("Maria", "Lopez")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let carlos = test_db.account_id("Carlos");
        let juan = test_db.account_id("Juan");

        service
            .dashboard(test_db.account_id("Admin"))
            .await
            .expect("Administrator sees the club dashboard");
        assert!(matches!(
            service.dashboard(carlos).await,
            Err(AppError::Unauthorized(_))
        ));
        service
            .trainer_dashboard(carlos, carlos)
            .await
            .expect("Trainer sees own dashboard");

        service
            .member_summary(juan, juan)
            .await
            .expect("Member sees own summary");
        assert!(matches!(
            service.member_summary(juan, test_db.account_id("Maria")).await,
            Err(AppError::Unauthorized(_))
        ));

        service
            .member_report(juan, juan)
            .await
            .expect("Member exports own report");
        assert!(matches!(
            service.accounts_report(juan).await,
            Err(AppError::Unauthorized(_))
        ));
        service
            .accounts_report(carlos)
            .await
            .expect("Trainer reads club reports");
    }

    #[tokio::test]
    async fn test_catalog_deletes_are_restricted() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .trainer("Carlos", "Mendoza")
            .activity("Swimming")
            .training("Carlos", "Swimming", "2024-06-01")
            .build()
            .await
            .expect("test db");
        let service = test_db.service();
        let admin = test_db.account_id("Admin");

        assert!(matches!(
            service.delete_activity(admin, test_db.activity_id("Swimming")).await,
            Err(AppError::ReferenceInUse { .. })
        ));
        assert!(matches!(
            service.delete_role(admin, test_db.role_id("Trainer")).await,
            Err(AppError::ReferenceInUse { .. })
        ));
        assert!(matches!(
            service.delete_activity(test_db.account_id("Carlos"), 1).await,
            Err(AppError::Unauthorized(_))
        ));

        let roles = service.list_roles().await.expect("roles");
        assert_eq!(roles.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_operation_leaves_nothing_behind() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .build()
            .await
            .expect("test db");

        {
            let mut uow = UnitOfWork::begin(&test_db.pool).await.expect("begin");
            db::create_activity(uow.conn(), "Rowing")
                .await
                .expect("activity");
            let missing = db::create_training(uow.conn(), 999, 1, date("2024-06-01")).await;
            assert!(missing.is_err());
        }

        assert_eq!(test_db.count("activities").await, 0);

        let service = test_db.service();
        assert!(matches!(
            service
                .record_attendance(test_db.account_id("Admin"), 55, 1, &AttendanceEntry::default())
                .await,
            Err(AppError::UnknownReference(Reference::Training(55)))
        ));
        assert_eq!(test_db.count("attendances").await, 0);
    }
}
