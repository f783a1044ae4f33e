//! Energy rental: market access and the waiting workflow

pub mod cancel;
pub mod coordinator;
pub mod errors;
pub mod itrx;
pub mod market;
pub mod order;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use coordinator::{EnergyRentalCoordinator, RentalOutcome};
pub use errors::RentalError;
pub use itrx::ItrxClient;
pub use market::{EnergyRentalMarket, RentalQuote};
pub use order::{AutoApprove, RentalApproval, RentalOrder, RentalState, RentalStatus, StateTrace};
