//! Command implementations for the roster CLI.

pub mod positions;
pub mod register;
pub mod users;

pub use positions::run_positions;
pub use register::{RegisterArgs, run_register};
pub use users::run_users;
