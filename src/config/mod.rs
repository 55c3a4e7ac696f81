//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DappConfig (validated, immutable)
//!     → cloned into the client, sequencer and flows
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults pointing at the Kasplex testnet deployment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ApprovalPolicy, ContractsConfig, DappConfig, NetworkConfig, NftConfig, ObservabilityConfig,
    PollingConfig, SequencerConfig, SwapConfig, TokenConfig,
};
