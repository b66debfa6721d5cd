//! Legacy API path-translation proxy.
//!
//! Accepts requests written against the retired kraken v3 API and forwards
//! them to v5, rewriting login names in the path to numeric user IDs.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                    API PROXY                     │
//!                        │                                                  │
//!   Client Request       │  ┌─────────┐   ┌──────────────┐   ┌───────────┐  │
//!   ─────────────────────┼─▶│  http   │──▶│   routing    │──▶│   http    │──┼──▶ v5 API
//!                        │  │ server  │   │ PathMapper   │   │ forward   │  │
//!                        │  └─────────┘   └──────┬───────┘   └───────────┘  │
//!                        │                       │ named segments           │
//!                        │                       ▼                          │
//!                        │                ┌──────────────┐                  │
//!                        │                │   resolver   │──────────────────┼──▶ users lookup
//!                        │                │ cache + 1×   │                  │
//!                        │                └──────────────┘                  │
//!                        │                                                  │
//!                        │  config · observability · lifecycle             │
//!                        └──────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resolver;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resolver::UserIdResolver;
pub use routing::{PathMapper, RouteTable};
