//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → /apiproxy/status → status.rs (plain-text status line)
//!     → anything else    → routing::PathMapper (legacy path → v5 path)
//!                        → forward.rs (headers, body, upstream call)
//!     → response.rs on failure (status code + JSON error body)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;
pub mod status;

pub use forward::Forwarder;
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{ErrorStatus, ProxyError};
pub use server::{AppState, HttpServer, ServerError, STATUS_PATH};
pub use status::{format_duration, ProxyStats};
