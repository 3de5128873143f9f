//! Recipe Autofill Proxy Library
//!
//! A single CORS-enabling relay endpoint: `GET /?url=<page>` returns the
//! page's status and HTML with `Access-Control-Allow-Origin: *`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
