//! HTTP layer for folio.
//!
//! - **Endpoints**: feeds, post detail, post forms, comments, follows
//! - **Extractors**: authenticated user, page number, post form payloads
//! - **Middleware**: token authentication, login guard, page cache
//! - **Response**: rendered page documents and redirects
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod page_cache;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
