use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

/// What happened to one environment file. Loading runs before the tracing
/// subscriber exists, so outcomes are collected and logged afterwards with
/// [`log_env_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFile {
    Loaded(PathBuf),
    Missing(PathBuf),
}

pub fn load_environment() -> Result<Vec<EnvFile>> {
    load_environment_from(Path::new("."))
}

pub fn load_environment_from(root: &Path) -> Result<Vec<EnvFile>> {
    let is_production =
        dotenvy::var("CLUB_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    env_files
        .into_iter()
        .map(|env_file| load_env_file(root.join(env_file)))
        .collect()
}

fn load_env_file(path: PathBuf) -> Result<EnvFile> {
    if !path.exists() {
        return Ok(EnvFile::Missing(path));
    }

    dotenvy::from_filename_override(&path)
        .with_context(|| format!("Failed to load environment file {}", path.display()))?;
    Ok(EnvFile::Loaded(path))
}

pub fn log_env_files(files: &[EnvFile]) {
    for file in files {
        match file {
            EnvFile::Loaded(path) => info!("Loaded environment from: {}", path.display()),
            EnvFile::Missing(path) => {
                warn!("Environment file {} not found, skipping", path.display())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub profile: String,
    pub log_filter: String,
    pub otlp_endpoint: Option<String>,
    pub honeycomb_api_key: Option<String>,
    pub seed_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            profile: std::env::var("CLUB_PROFILE").unwrap_or_else(|_| "development".to_string()),
            log_filter: std::env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: non_empty_var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            honeycomb_api_key: non_empty_var("HONEYCOMB_API_KEY"),
            seed_admin_password: non_empty_var("SEED_ADMIN_PASSWORD"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.profile == "production"
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
