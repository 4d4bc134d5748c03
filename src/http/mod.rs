//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, key check, allowlist check)
//!     → forward.rs (rewrite target, swap key, dispatch upstream)
//!     → response.rs (relay upstream response or reject)
//!     → Send to client
//! ```

pub mod forward;
pub mod response;
pub mod server;

pub use forward::{Upstream, UpstreamTarget, API_KEY_HEADER};
pub use response::Rejection;
pub use server::{GatewayServer, GatewayState, ServerError};
