//! Contract read layer.
//!
//! # Data Flow
//! ```text
//! flows / sequencer / poller
//!     → layer.rs (fetch, fetch_many, refresh)
//!     → ChainGateway::read
//!     → cache.rs (keyed mirror, explicit invalidation)
//! ```
//!
//! # Design Decisions
//! - Reads are idempotent and race freely; no ordering between them
//! - Writes invalidate only the keys they declare
//! - Polling is still available for long-running watchers

pub mod cache;
pub mod layer;
pub mod poller;
pub mod types;

pub use cache::ReadCache;
pub use layer::ReadLayer;
pub use poller::{PollRound, Poller};
pub use types::{Listing, ReadKey, ReadValue};
