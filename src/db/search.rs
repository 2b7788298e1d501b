//! Keyword search across accounts, training sessions, competitions and
//! activities. Each kind has its own query capped at [`PER_KIND_LIMIT`] rows;
//! [`search`] runs the requested kinds in a fixed order and keeps the first
//! [`TOTAL_LIMIT`] hits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

use crate::error::AppError;

pub const MIN_QUERY_LEN: usize = 2;
pub const PER_KIND_LIMIT: i64 = 10;
pub const TOTAL_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Account,
    Training,
    Competition,
    Activity,
}

impl SearchKind {
    pub const ALL: [SearchKind; 4] = [
        SearchKind::Account,
        SearchKind::Training,
        SearchKind::Competition,
        SearchKind::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Account => "account",
            SearchKind::Training => "training",
            SearchKind::Competition => "competition",
            SearchKind::Activity => "activity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub kind: Option<SearchKind>,
    /// Exact role name; narrows account hits only.
    pub role: Option<String>,
    /// Exact date; narrows training and competition hits only.
    pub date: Option<NaiveDate>,
    /// Kinds the caller may see. Hidden kinds are never queried, so they do
    /// not use up the shared [`TOTAL_LIMIT`].
    pub visible: Option<Vec<SearchKind>>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn visible_to(mut self, kinds: impl IntoIterator<Item = SearchKind>) -> Self {
        self.visible = Some(kinds.into_iter().collect());
        self
    }

    fn wants(&self, kind: SearchKind) -> bool {
        self.kind.is_none_or(|k| k == kind)
            && self.visible.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub title: String,
    pub description: String,
    /// `"<kind>:<id>"`, e.g. `"account:12"`.
    pub target_reference: String,
}

impl SearchHit {
    fn new(kind: SearchKind, id: i64, title: String, description: String) -> Self {
        Self {
            kind,
            title,
            description,
            target_reference: format!("{}:{}", kind.as_str(), id),
        }
    }
}

/// Wraps `text` for `LIKE ? ESCAPE '\'` so wildcards in user input match
/// literally.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[instrument(skip(conn))]
pub async fn search_accounts(
    conn: &mut SqliteConnection,
    text: &str,
    role: Option<&str>,
) -> Result<Vec<SearchHit>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String, String, String, String)>(
        "SELECT a.id, a.first_name, a.last_name, a.email, r.name
         FROM accounts a
         JOIN roles r ON r.id = a.role_id
         WHERE (?1 IS NULL OR r.name = ?1)
           AND (a.first_name LIKE ?2 ESCAPE '\\'
                OR a.last_name LIKE ?2 ESCAPE '\\'
                OR a.email LIKE ?2 ESCAPE '\\'
                OR r.name LIKE ?2 ESCAPE '\\')
         ORDER BY a.id
         LIMIT ?3",
    )
    .bind(role)
    .bind(like_pattern(text))
    .bind(PER_KIND_LIMIT)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, first_name, last_name, email, role_name)| {
            SearchHit::new(
                SearchKind::Account,
                id,
                format!("{} {}", first_name, last_name),
                format!("{} - {}", role_name, email),
            )
        })
        .collect())
}

#[instrument(skip(conn))]
pub async fn search_trainings(
    conn: &mut SqliteConnection,
    text: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<SearchHit>, AppError> {
    let rows = sqlx::query_as::<_, (i64, NaiveDate, String, String, String)>(
        "SELECT t.id, t.date, ac.name, tr.first_name, tr.last_name
         FROM trainings t
         JOIN activities ac ON ac.id = t.activity_id
         JOIN accounts tr ON tr.id = t.trainer_account_id
         WHERE (?1 IS NULL OR t.date = ?1)
           AND (ac.name LIKE ?2 ESCAPE '\\'
                OR tr.first_name LIKE ?2 ESCAPE '\\'
                OR tr.last_name LIKE ?2 ESCAPE '\\')
         ORDER BY t.id
         LIMIT ?3",
    )
    .bind(date)
    .bind(like_pattern(text))
    .bind(PER_KIND_LIMIT)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, date, activity, first_name, last_name)| {
            SearchHit::new(
                SearchKind::Training,
                id,
                format!("{} training", activity),
                format!(
                    "Trainer: {} {} - {}",
                    first_name,
                    last_name,
                    date.format("%d/%m/%Y")
                ),
            )
        })
        .collect())
}

#[instrument(skip(conn))]
pub async fn search_competitions(
    conn: &mut SqliteConnection,
    text: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<SearchHit>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String, NaiveDate, Option<String>)>(
        "SELECT c.id, c.name, c.date, c.venue
         FROM competitions c
         LEFT JOIN activities ac ON ac.id = c.activity_id
         WHERE (?1 IS NULL OR c.date = ?1)
           AND (c.name LIKE ?2 ESCAPE '\\'
                OR c.venue LIKE ?2 ESCAPE '\\'
                OR c.description LIKE ?2 ESCAPE '\\'
                OR ac.name LIKE ?2 ESCAPE '\\')
         ORDER BY c.id
         LIMIT ?3",
    )
    .bind(date)
    .bind(like_pattern(text))
    .bind(PER_KIND_LIMIT)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, date, venue)| {
            SearchHit::new(
                SearchKind::Competition,
                id,
                name,
                format!(
                    "{} - {}",
                    venue.unwrap_or_else(|| "No venue".to_string()),
                    date.format("%d/%m/%Y")
                ),
            )
        })
        .collect())
}

#[instrument(skip(conn))]
pub async fn search_activities(
    conn: &mut SqliteConnection,
    text: &str,
) -> Result<Vec<SearchHit>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, name FROM activities WHERE name LIKE ? ESCAPE '\\' ORDER BY id LIMIT ?",
    )
    .bind(like_pattern(text))
    .bind(PER_KIND_LIMIT)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| {
            SearchHit::new(SearchKind::Activity, id, name, "Sport activity".to_string())
        })
        .collect())
}

async fn run_search(
    pool: &Pool<Sqlite>,
    query: &SearchQuery,
    text: &str,
) -> Result<Vec<SearchHit>, AppError> {
    let mut conn = pool.acquire().await?;
    let mut hits = Vec::new();

    for kind in SearchKind::ALL {
        if !query.wants(kind) {
            continue;
        }

        let found = match kind {
            SearchKind::Account => {
                search_accounts(&mut conn, text, query.role.as_deref()).await?
            }
            SearchKind::Training => search_trainings(&mut conn, text, query.date).await?,
            SearchKind::Competition => search_competitions(&mut conn, text, query.date).await?,
            SearchKind::Activity => search_activities(&mut conn, text).await?,
        };
        hits.extend(found);
    }

    hits.truncate(TOTAL_LIMIT);
    Ok(hits)
}

/// Never fails: a short query returns nothing without touching the database,
/// and a storage failure in any kind empties the whole result.
#[instrument(skip(pool))]
pub async fn search(pool: &Pool<Sqlite>, query: &SearchQuery) -> Vec<SearchHit> {
    let text = query.text.trim();
    if text.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }

    match run_search(pool, query, text).await {
        Ok(hits) => {
            info!(hits = hits.len(), "Search completed");
            hits
        }
        Err(e) => {
            warn!(error = %e, "Search failed, returning no hits");
            Vec::new()
        }
    }
}
