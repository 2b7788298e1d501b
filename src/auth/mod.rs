pub mod account;
pub mod password;
pub mod permissions;
pub mod policy;

pub use account::*;
pub use permissions::*;
pub use policy::*;
