//! HTTP API for driving capture sessions from the host application

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
