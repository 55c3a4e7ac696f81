//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → RPC client → Session → Gateway → Read layer → Flows
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C (signals.rs) → broadcast → pollers exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, wallet last
//! - A missing wallet is not fatal; read-only commands still work

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{App, StartupError};
