//! API request handlers

mod approvals;
mod commands;
mod dashboard;
mod roles;
mod rules;
mod users;

pub use approvals::*;
pub use commands::*;
pub use dashboard::*;
pub use roles::*;
pub use rules::*;
pub use users::*;
