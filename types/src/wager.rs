use thiserror::Error as ThisError;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance (needed={needed}, available={available})")]
    InsufficientBalance { needed: u64, available: u64 },
    #[error("bet amount must be greater than zero")]
    InvalidBet,
    #[error("bets are locked while a flight is ascending")]
    FlightInProgress,
    #[error("a bet is already placed")]
    BetAlreadyPlaced,
    #[error("no flight is ascending")]
    NotFlying,
    #[error("no active bet to cash out")]
    NoActiveBet,
    #[error("wager already settled for this flight")]
    AlreadySettled,
    #[error("payout exceeds representable balance")]
    PayoutOverflow,
}

/// An open or settled wager.
///
/// At most one unsettled wager exists at a time; the flight id is bound
/// when the flight it rides on actually starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wager {
    /// Stake in chips, debited from the balance at placement.
    pub amount: u64,
    /// Flight this wager rides on, once one starts.
    pub flight_id: Option<u64>,
    /// Set exactly once, on cashout; a settled wager cannot settle again.
    pub settled: bool,
    /// Chips credited at settlement (0 until settled).
    pub payout: u64,
}

impl Wager {
    pub fn new(amount: u64) -> Self {
        Self {
            amount,
            flight_id: None,
            settled: false,
            payout: 0,
        }
    }
}
