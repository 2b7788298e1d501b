pub mod auth;
pub mod database;
pub mod db;
pub mod env;
pub mod error;
pub mod models;
pub mod seed;
pub mod service;
pub mod telemetry;
pub mod validation;

#[cfg(test)]
mod test;

pub use error::AppError;
pub use service::ClubService;
