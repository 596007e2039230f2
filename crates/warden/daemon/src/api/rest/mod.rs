//! REST API

mod auth;
mod handlers;
mod router;
mod state;

pub use router::create_router;
pub use state::AppState;
