//! API handlers for the Ledgerbox HTTP surface.

pub mod store;

pub use store::*;

use crate::store::Drive;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Store handle.
    pub drive: Drive,
}

impl AppState {
    /// Create application state around a store handle.
    pub fn new(drive: Drive) -> Self {
        Self { drive }
    }
}
