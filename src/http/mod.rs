//! HTTP surface: book routes guarded by admission control.

mod handlers;
mod middleware;
mod response;
mod router;
mod server;

pub use handlers::BookInput;
pub use middleware::{admit, RouteGuard};
pub use response::{ApiError, ApiResponse};
pub use router::{router, AppState};
pub use server::HttpServer;
