//! # Modpoll API
//!
//! HTTP surface of the job scheduler.
//!
//! ```text
//! POST   /api/jobs        - Create job
//! GET    /api/jobs        - List jobs
//! GET    /api/jobs/{id}   - Job details with paged executions (?page=&size=)
//! DELETE /api/jobs/{id}   - Stop job
//! PATCH  /api/jobs/{id}   - Update or restart job
//! GET    /health          - Liveness and active task count
//! ```

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::{ApiConfig, ApiServer};
pub use state::AppState;
