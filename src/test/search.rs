#[cfg(test)]
mod tests {
    use crate::db::{PER_KIND_LIMIT, SearchKind, SearchQuery, TOTAL_LIMIT, search};
    use crate::test::test_db::{TestDbBuilder, date};

    fn count_of(hits: &[crate::db::SearchHit], kind: SearchKind) -> usize {
        hits.iter().filter(|h| h.kind == kind).count()
    }

    #[tokio::test]
    async fn test_search_finds_account_by_name() {
        let test_db = TestDbBuilder::new()
            .trainer("Carlos", "Mendoza")
            .member("Juan", "Perez")
            .activity("Swimming")
            .build()
            .await
            .expect("test db");

        let hits = search(&test_db.pool, &SearchQuery::new("mendo")).await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, SearchKind::Account);
        assert_eq!(hits[0].title, "Carlos Mendoza");
        assert_eq!(hits[0].description, "Trainer - carlos@club.test");
        assert_eq!(
            hits[0].target_reference,
            format!("account:{}", test_db.account_id("Carlos"))
        );
    }

    #[tokio::test]
    async fn test_short_or_unmatched_queries_are_empty() {
        let test_db = TestDbBuilder::new()
            .trainer("Ana", "Rodriguez")
            .activity("Athletics")
            .build()
            .await
            .expect("test db");

        assert!(search(&test_db.pool, &SearchQuery::new("a")).await.is_empty());
        assert!(search(&test_db.pool, &SearchQuery::new("  a  ")).await.is_empty());
        assert!(search(&test_db.pool, &SearchQuery::new("")).await.is_empty());
        assert!(
            search(&test_db.pool, &SearchQuery::new("no such activity"))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_search_respects_caps() {
        let mut builder = TestDbBuilder::new();
        for i in 0..12 {
            builder = builder
                .member(&format!("Ozzie{}", i), "Smith")
                .activity(&format!("Ozz Sport {}", i));
        }
        let test_db = builder
            .competition("Ozz Cup", "2024-06-15", None, None)
            .build()
            .await
            .expect("test db");

        let hits = search(&test_db.pool, &SearchQuery::new("ozz")).await;

        assert_eq!(hits.len(), TOTAL_LIMIT);
        assert_eq!(count_of(&hits, SearchKind::Account), PER_KIND_LIMIT as usize);
        assert_eq!(count_of(&hits, SearchKind::Competition), 1);
        assert_eq!(count_of(&hits, SearchKind::Activity), 9);
        assert_eq!(hits[10].title, "Ozz Cup");
    }

    #[tokio::test]
    async fn test_hidden_kinds_leave_room_for_others() {
        let mut builder = TestDbBuilder::new();
        for i in 0..12 {
            builder = builder
                .member(&format!("Ozzie{}", i), "Smith")
                .activity(&format!("Ozz Sport {}", i));
        }
        let test_db = builder
            .competition("Ozz Cup", "2024-06-15", None, None)
            .build()
            .await
            .expect("test db");

        let query = SearchQuery::new("ozz").visible_to([
            SearchKind::Training,
            SearchKind::Competition,
            SearchKind::Activity,
        ]);
        let hits = search(&test_db.pool, &query).await;

        assert_eq!(count_of(&hits, SearchKind::Account), 0);
        assert_eq!(count_of(&hits, SearchKind::Competition), 1);
        assert_eq!(count_of(&hits, SearchKind::Activity), PER_KIND_LIMIT as usize);
        assert_eq!(hits[0].title, "Ozz Cup");
    }

    #[tokio::test]
    async fn test_role_filter_narrows_accounts_only() {
        let test_db = TestDbBuilder::new()
            .trainer("Ana", "Rodriguez")
            .member("Juan", "Perez")
            .activity("Tango Dance")
            .build()
            .await
            .expect("test db");

        let unfiltered = search(&test_db.pool, &SearchQuery::new("an")).await;
        assert_eq!(count_of(&unfiltered, SearchKind::Account), 2);
        assert_eq!(count_of(&unfiltered, SearchKind::Activity), 1);

        let query = SearchQuery {
            role: Some("Trainer".to_string()),
            ..SearchQuery::new("an")
        };
        let hits = search(&test_db.pool, &query).await;
        assert_eq!(count_of(&hits, SearchKind::Account), 1);
        assert_eq!(hits[0].title, "Ana Rodriguez");
        assert_eq!(count_of(&hits, SearchKind::Activity), 1);
    }

    #[tokio::test]
    async fn test_date_filter_and_kind_filter() {
        let test_db = TestDbBuilder::new()
            .trainer("Carlos", "Mendoza")
            .activity("Swimming")
            .training("Carlos", "Swimming", "2024-06-01")
            .training("Carlos", "Swimming", "2024-06-08")
            .competition("Swimming Gala", "2024-06-08", Some("City Pool"), None)
            .build()
            .await
            .expect("test db");

        let query = SearchQuery {
            date: Some(date("2024-06-08")),
            ..SearchQuery::new("swim")
        };
        let hits = search(&test_db.pool, &query).await;
        assert_eq!(count_of(&hits, SearchKind::Training), 1);
        assert_eq!(count_of(&hits, SearchKind::Competition), 1);
        assert_eq!(count_of(&hits, SearchKind::Activity), 1);

        let training = hits
            .iter()
            .find(|h| h.kind == SearchKind::Training)
            .expect("training hit");
        assert_eq!(training.title, "Swimming training");
        assert_eq!(training.description, "Trainer: Carlos Mendoza - 08/06/2024");
        assert_eq!(
            training.target_reference,
            format!("training:{}", test_db.training_id(1))
        );

        let only_competitions = SearchQuery {
            kind: Some(SearchKind::Competition),
            ..SearchQuery::new("swim")
        };
        let hits = search(&test_db.pool, &only_competitions).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "City Pool - 08/06/2024");
    }

    #[tokio::test]
    async fn test_competition_without_activity_is_searchable() {
        let test_db = TestDbBuilder::new()
            .competition("Harbour Regatta", "2024-06-15", None, None)
            .build()
            .await
            .expect("test db");

        let hits = search(&test_db.pool, &SearchQuery::new("regatta")).await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Harbour Regatta");
        assert_eq!(hits[0].description, "No venue - 15/06/2024");
    }

    #[tokio::test]
    async fn test_wildcards_match_literally() {
        let test_db = TestDbBuilder::new()
            .activity("Swimming")
            .activity("100% Fitness")
            .build()
            .await
            .expect("test db");

        assert!(search(&test_db.pool, &SearchQuery::new("_w")).await.is_empty());

        let hits = search(&test_db.pool, &SearchQuery::new("0%")).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% Fitness");
    }
}
