//! HTTP boundary: converts parsed requests to service calls and service
//! results to responses. Routes are nested under `/api/v1`, except the
//! unauthenticated info/liveness endpoints mounted at the root.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod request_context;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
