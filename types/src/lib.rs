//! Aviatron domain types.
//!
//! Defines credentials/gate configuration, predictions, flight phases,
//! wagers, round stats, and the constants and error enums shared by the
//! engine and its callers.
//!
//! ## Units
//! - Money amounts are `u64` chips.
//! - Multipliers are `u64` hundredths (`120` = 1.20x), so "two decimal
//!   places" is structural rather than a formatting concern.
//! - Times are `u64` milliseconds since the Unix epoch, read from the
//!   runtime clock.

mod constants;
mod credentials;
mod flight;
mod prediction;
mod stats;
mod wager;

pub use constants::*;
pub use credentials::{Credentials, GateConfig, ValidationError};
pub use flight::{FlightConfig, FlightError, FlightPhase};
pub use prediction::{Prediction, ServiceError};
pub use stats::{RoundRecord, RoundStats};
pub use wager::{LedgerError, Wager};
