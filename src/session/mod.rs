//! Wallet session.
//!
//! # Lifecycle
//! ```text
//! Session::new()            → Disconnected
//!     connect(wallet)       → Connected(address)
//!     disconnect()          → Disconnected (wallet dropped)
//! ```
//!
//! The session is explicit context: flows, the gateway and the sequencer
//! each hold a clone and observe the same connection state.

use std::sync::Arc;

use alloy::primitives::Address;
use arc_swap::ArcSwapOption;
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::Wallet;

/// Connection status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "address", rename_all = "snake_case")]
pub enum SessionStatus {
    Disconnected,
    Connected(Address),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("wallet not connected")]
    NotConnected,
}

/// Shared handle to the connected wallet, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    wallet: Arc<ArcSwapOption<Wallet>>,
}

impl Session {
    /// A session with no wallet attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already connected to `wallet`.
    pub fn connected(wallet: Wallet) -> Self {
        let session = Self::new();
        session.connect(wallet);
        session
    }

    /// Attach a wallet, replacing any previous one.
    pub fn connect(&self, wallet: Wallet) {
        let address = wallet.address();
        if let Some(previous) = self.wallet.swap(Some(Arc::new(wallet))) {
            tracing::info!(previous = %previous.address(), "Replacing connected wallet");
        }
        tracing::info!(address = %address, "Wallet connected");
    }

    /// Drop the wallet and return the address it had. Subsequent writes
    /// fail with `NotConnected`.
    pub fn disconnect(&self) -> Option<Address> {
        let previous = self.wallet.swap(None)?;
        let address = previous.address();
        tracing::info!(address = %address, "Wallet disconnected");
        Some(address)
    }

    pub fn status(&self) -> SessionStatus {
        match self.address() {
            Some(address) => SessionStatus::Connected(address),
            None => SessionStatus::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.wallet.load().is_some()
    }

    pub fn address(&self) -> Option<Address> {
        self.wallet.load_full().map(|w| w.address())
    }

    /// Address of the connected wallet, or `NotConnected`.
    pub fn require_address(&self) -> Result<Address, SessionError> {
        self.address().ok_or(SessionError::NotConnected)
    }

    /// Snapshot of the connected wallet.
    pub fn wallet(&self) -> Result<Arc<Wallet>, SessionError> {
        self.wallet.load_full().ok_or(SessionError::NotConnected)
    }
}
