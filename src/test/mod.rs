mod utils;
pub use utils::test_db;

mod reports;
mod search;
mod service;
