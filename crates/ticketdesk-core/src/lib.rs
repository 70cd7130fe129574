//! ticketdesk-core library.
//!
//! Mock authentication, the protected-route guard, and an async ticket
//! store with simulated backend latency.
//!
//! # Conventions
//!
//! - **Errors**: Each module exposes a `thiserror` error with a `code()`
//!   mapping to [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod lock;
pub mod model;
pub mod notice;
pub mod registry;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;
