//! Chip balance and wager settlement.
//!
//! The ledger holds at most one wager at a time. The stake is debited at
//! placement, the full payout (stake times live multiplier) is credited at
//! cashout, and the `settled` flag guarantees a wager pays out at most
//! once. All multiplication goes through checked math so a hostile config
//! cannot mint chips via overflow.

use aviatron_types::{FlightPhase, LedgerError, Wager, MULTIPLIER_SCALE};
use tracing::{debug, info};

pub struct WagerLedger {
    balance: u64,
    wager: Option<Wager>,
}

impl WagerLedger {
    pub fn new(starting_chips: u64) -> Self {
        Self {
            balance: starting_chips,
            wager: None,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn active_wager(&self) -> Option<&Wager> {
        self.wager.as_ref()
    }

    /// Debit `amount` and open a wager. Rejected while a flight is
    /// ascending or while another wager is open; a rejection never touches
    /// the balance.
    pub fn place_bet(&mut self, amount: u64, phase: FlightPhase) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidBet);
        }
        if phase == FlightPhase::Ascending {
            return Err(LedgerError::FlightInProgress);
        }
        if self.wager.as_ref().is_some_and(|wager| !wager.settled) {
            return Err(LedgerError::BetAlreadyPlaced);
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.wager = Some(Wager::new(amount));
        info!(amount, balance = self.balance, "bet placed");
        Ok(())
    }

    /// Bind the open wager to the flight it rides on.
    pub fn bind_flight(&mut self, flight_id: u64) {
        if let Some(wager) = self.wager.as_mut() {
            if !wager.settled {
                wager.flight_id = Some(flight_id);
            }
        }
    }

    /// Settle the open wager at `live` (hundredths), crediting the payout.
    /// Returns the payout in chips.
    pub fn cashout(&mut self, live: u64, phase: FlightPhase) -> Result<u64, LedgerError> {
        if phase != FlightPhase::Ascending {
            return Err(LedgerError::NotFlying);
        }
        let wager = self.wager.as_mut().ok_or(LedgerError::NoActiveBet)?;
        if wager.settled {
            return Err(LedgerError::AlreadySettled);
        }
        let payout = wager
            .amount
            .checked_mul(live)
            .map(|raw| raw / MULTIPLIER_SCALE)
            .ok_or(LedgerError::PayoutOverflow)?;
        wager.settled = true;
        wager.payout = payout;
        self.balance = self.balance.saturating_add(payout);
        info!(live, payout, balance = self.balance, "cashed out");
        Ok(payout)
    }

    /// Settle at `live` only if an automatic threshold is armed and the
    /// live multiplier has reached it.
    pub fn try_auto_cashout(&mut self, live: u64, threshold: Option<u64>) -> Option<u64> {
        let threshold = threshold?;
        if live < threshold {
            return None;
        }
        if !self.wager.as_ref().is_some_and(|wager| !wager.settled) {
            return None;
        }
        self.cashout(live, FlightPhase::Ascending).ok()
    }

    /// Close out the wager at flight resolution, settled or not. An
    /// unsettled wager is forfeit (the stake was already debited).
    pub fn resolve_flight(&mut self) -> Option<Wager> {
        let wager = self.wager.take()?;
        if !wager.settled {
            debug!(amount = wager.amount, "wager rode to resolution, forfeit");
        }
        Some(wager)
    }
}
