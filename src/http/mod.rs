//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → relay.rs (preflight short-circuit)
//!     → request.rs (find `url`, parse, scheme allow-list)
//!     → upstream::Fetcher (one GET)
//!     → response.rs (relay or JSON error)
//!     → CORS headers added on the way out
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ProxyError;
pub use server::{build_router, HttpServer};
