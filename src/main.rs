use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use club_tracker::database::{connect, run_migrations};
use club_tracker::db::{SearchKind, SearchQuery};
use club_tracker::env::{Config, load_environment, log_env_files};
use club_tracker::seed::{DEFAULT_ADMIN_PASSWORD, seed_sample_data};
use club_tracker::telemetry::init_tracing;
use club_tracker::validation::today;
use club_tracker::{AppError, ClubService};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "club-tracker", version, about = "Sports club membership, training and competition records")]
struct Cli {
    /// Account the command acts as. Reads are filtered by that account's role.
    #[arg(long, global = true, env = "CLUB_ACTOR_ID", default_value_t = 1)]
    actor: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Create the demonstration club in an empty database
    Seed,
    /// Print dashboard statistics
    Stats {
        /// Dashboard of one trainer instead of the whole club
        #[arg(long, conflicts_with = "member")]
        trainer: Option<i64>,
        /// Dashboard of one member instead of the whole club
        #[arg(long)]
        member: Option<i64>,
    },
    /// Keyword search across accounts, trainings, competitions and activities
    Search {
        query: String,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Exact role name, applied to account hits
        #[arg(long)]
        role: Option<String>,
        /// Exact date (YYYY-MM-DD), applied to training and competition hits
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print a report projection as JSON
    Export {
        #[arg(value_enum)]
        report: ReportArg,
        /// Member id, required for the member report
        #[arg(long, required_if_eq("report", "member"))]
        id: Option<i64>,
        /// Start of the training date range for the attendance report
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// End of the training date range for the attendance report
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Account,
    Training,
    Competition,
    Activity,
}

impl From<KindArg> for SearchKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Account => SearchKind::Account,
            KindArg::Training => SearchKind::Training,
            KindArg::Competition => SearchKind::Competition,
            KindArg::Activity => SearchKind::Activity,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportArg {
    Accounts,
    Activities,
    Trainings,
    Attendance,
    Competitions,
    Results,
    Member,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn execute(cli: Cli, config: &Config) -> Result<(), Error> {
    let pool = connect(&config.database_url).await?;

    match cli.command {
        Command::Migrate => {
            run_migrations(&pool).await?;
        }
        Command::Seed => {
            run_migrations(&pool).await?;
            let password = config
                .seed_admin_password
                .as_deref()
                .unwrap_or(DEFAULT_ADMIN_PASSWORD);
            match seed_sample_data(&pool, password, today()).await? {
                Some(summary) => print_json(&summary)?,
                None => info!("Database already holds data, nothing seeded"),
            }
        }
        Command::Stats { trainer, member } => {
            let service = ClubService::new(pool);
            match (trainer, member) {
                (Some(id), _) => print_json(&service.trainer_dashboard(cli.actor, id).await?)?,
                (_, Some(id)) => print_json(&service.member_dashboard(cli.actor, id).await?)?,
                _ => print_json(&service.dashboard(cli.actor).await?)?,
            }
        }
        Command::Search {
            query,
            kind,
            role,
            date,
        } => {
            let service = ClubService::new(pool);
            let query = SearchQuery {
                kind: kind.map(SearchKind::from),
                role,
                date,
                ..SearchQuery::new(query)
            };
            print_json(&service.search(cli.actor, &query).await?)?;
        }
        Command::Export {
            report,
            id,
            from,
            to,
        } => {
            let service = ClubService::new(pool);
            let actor = cli.actor;
            match report {
                ReportArg::Accounts => print_json(&service.accounts_report(actor).await?)?,
                ReportArg::Activities => print_json(&service.activities_report(actor).await?)?,
                ReportArg::Trainings => print_json(&service.trainings_report(actor).await?)?,
                ReportArg::Attendance => match (from, to) {
                    (Some(start), Some(end)) => {
                        print_json(&service.attendance_between(actor, start, end).await?)?
                    }
                    _ => print_json(&service.attendance_report(actor).await?)?,
                },
                ReportArg::Competitions => {
                    print_json(&service.competitions_report(actor).await?)?
                }
                ReportArg::Results => print_json(&service.results_report(actor).await?)?,
                ReportArg::Member => {
                    let member_id = id.ok_or_else(|| {
                        AppError::Validation("id: the member report needs --id".to_string())
                    })?;
                    print_json(&service.member_report(actor, member_id).await?)?
                }
            }
        }
    }

    Ok(())
}

async fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    let env_files = load_environment()?;
    let config = Config::from_env()?;
    let _guard = init_tracing(&config)?;
    log_env_files(&env_files);

    info!(command = ?cli.command, "Starting club tracker");

    let context = format!("{:?}", cli.command);
    execute(cli, &config).await.inspect_err(|e| {
        if let Error::App(app_error) = e {
            app_error.log_and_record(&context);
        }
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
