use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RentalError;
use crate::types::{Address, Sun};

/// Price offered by a rental market for a block of energy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalQuote {
    pub energy: u64,
    /// Total price in sun
    pub price: Sun,
    /// Rental period label as understood by the market (e.g. `1H`)
    pub period: String,
}

/// Third-party energy rental market
#[async_trait]
pub trait EnergyRentalMarket: Send + Sync {
    async fn get_energy_rental_quote(&self, energy: u64) -> Result<RentalQuote, RentalError>;

    /// Place an order delegating `energy` to `address`
    ///
    /// `Ok(None)` means the market accepted the request but returned no
    /// order identifier, which callers must treat as a rejection.
    async fn place_energy_rental_order(
        &self,
        address: &Address,
        energy: u64,
    ) -> Result<Option<String>, RentalError>;
}
