//! Contract bindings and the chain gateway.
//!
//! # Data Flow
//! ```text
//! ReadKey      → gateway.rs (encode view call) → client.call → decode → ReadValue
//! ContractCall → gateway.rs (session wallet)   → TxBuilder   → TxHash → receipt
//! ```

pub mod abi;
pub mod calls;
pub mod gateway;

pub use calls::ContractCall;
pub use gateway::{ChainGateway, RpcGateway};
