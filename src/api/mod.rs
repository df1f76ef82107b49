//! LarpScore API Module
//! REST surface over the scan pipeline: submit, poll, read cached reports

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
