pub mod accounts;
pub mod activities;
pub mod attendance;
pub mod competitions;
pub mod reports;
pub mod results;
pub mod roles;
pub mod search;
pub mod stats;
pub mod trainings;

pub use accounts::*;
pub use activities::*;
pub use attendance::*;
pub use competitions::*;
pub use reports::*;
pub use results::*;
pub use roles::*;
pub use search::*;
pub use stats::*;
pub use trainings::*;
