#[cfg(test)]
mod tests {
    use crate::db::{
        accounts_report, activities_report, attendance_report, competitions_report, member_report, record_result,
        results_report, trainings_report,
    };
    use crate::error::{AppError, Reference};
    use crate::test::test_db::{TestDbBuilder, date};
    use crate::validation::ResultEntry;

    #[tokio::test]
    async fn test_member_report() {
        let test_db = TestDbBuilder::new()
            .trainer("Carlos", "Mendoza")
            .member("Juan", "Perez")
            .member("Maria", "Lopez")
            .activity("Athletics")
            .training("Carlos", "Athletics", "2024-06-01")
            .training("Carlos", "Athletics", "2024-06-08")
            .attendance(0, "Juan", true)
            .attendance(1, "Juan", false)
            .attendance(1, "Maria", true)
            .competition("Spring Meet", "2024-04-01", None, Some("Athletics"))
            .competition("Summer Meet", "2024-07-01", None, Some("Athletics"))
            .build()
            .await
            .expect("test db");
        let mut conn = test_db.conn().await;
        let juan = test_db.account_id("Juan");

        for (competition, position) in [("Spring Meet", 2), ("Summer Meet", 1)] {
            record_result(
                &mut conn,
                test_db.competition_id(competition),
                juan,
                &ResultEntry {
                    position: Some(position),
                    mark: Some("12.4s".to_string()),
                    notes: None,
                },
            )
            .await
            .expect("result");
        }

        let report = member_report(&mut conn, juan).await.expect("member report");

        assert_eq!(report.account.full_name(), "Juan Perez");
        assert_eq!(report.attendance.len(), 2);
        assert!(!report.attendance[0].present);
        assert_eq!(report.attendance[0].training.date, date("2024-06-08"));
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].competition_name, "Summer Meet");
        assert_eq!(report.summary.total_trainings, 2);
        assert_eq!(report.summary.total_attendance, 2);
        assert_eq!(report.summary.rate, 100.0);

        assert!(matches!(
            member_report(&mut conn, 321).await,
            Err(AppError::UnknownReference(Reference::Account(321)))
        ));
    }

    #[tokio::test]
    async fn test_report_projections() {
        let test_db = TestDbBuilder::new()
            .trainer("Carlos", "Mendoza")
            .member("Juan", "Perez")
            .activity("Swimming")
            .training("Carlos", "Swimming", "2024-06-01")
            .training("Carlos", "Swimming", "2024-06-15")
            .attendance(0, "Juan", true)
            .attendance(1, "Juan", true)
            .competition("Harbour Regatta", "2024-05-01", Some("Harbour"), None)
            .competition("Club Gala", "2024-08-01", None, Some("Swimming"))
            .build()
            .await
            .expect("test db");
        let mut conn = test_db.conn().await;

        let accounts = accounts_report(&mut conn).await.expect("accounts");
        let names: Vec<_> = accounts.iter().map(|a| a.first_name.as_str()).collect();
        assert_eq!(names, vec!["Carlos", "Juan"]);
        assert_eq!(accounts[1].role.name, "Member");

        let trainings = trainings_report(&mut conn).await.expect("trainings");
        assert_eq!(trainings[0].date, date("2024-06-15"));
        assert_eq!(trainings[0].trainer.full_name(), "Carlos Mendoza");

        let attendance = attendance_report(&mut conn).await.expect("attendance");
        assert_eq!(attendance.len(), 2);
        assert!(attendance[0].id > attendance[1].id);

        let competitions = competitions_report(&mut conn).await.expect("competitions");
        assert_eq!(competitions[0].name, "Club Gala");
        assert_eq!(
            competitions[0].activity.as_ref().map(|a| a.name.as_str()),
            Some("Swimming")
        );
        assert_eq!(competitions[1].activity, None);

        assert!(results_report(&mut conn).await.expect("results").is_empty());
    }

    #[tokio::test]
    async fn test_activities_report() {
        let test_db = TestDbBuilder::new()
            .admin("Admin", "Club")
            .trainer("Carlos", "Mendoza")
            .member("Juan", "Perez")
            .activity("Tennis")
            .activity("Athletics")
            .build()
            .await
            .expect("test db");
        let mut conn = test_db.conn().await;

        let activities = activities_report(&mut conn).await.expect("activities");
        let rows: Vec<_> = activities.iter().map(|a| (a.id, a.name.as_str())).collect();
        assert_eq!(
            rows,
            vec![
                (test_db.activity_id("Athletics"), "Athletics"),
                (test_db.activity_id("Tennis"), "Tennis"),
            ]
        );
        drop(conn);

        let service = test_db.service();
        assert_eq!(
            service
                .activities_report(test_db.account_id("Carlos"))
                .await
                .expect("Trainer reads the activities report"),
            activities
        );
        assert!(matches!(
            service.activities_report(test_db.account_id("Juan")).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
