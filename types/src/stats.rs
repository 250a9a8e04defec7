use super::ROUND_HISTORY_LIMIT;

/// Outcome of one completed round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundRecord {
    pub flight_id: u64,
    /// Predicted target multiplier in hundredths.
    pub target: u64,
    /// Live multiplier at resolution in hundredths.
    pub final_live: u64,
    /// Chips staked this round (0 if no bet was placed).
    pub wagered: u64,
    /// Chips credited at cashout (0 if the wager rode to the end).
    pub payout: u64,
    pub cashed_out: bool,
    pub resolved_at_ms: u64,
}

/// Rolling summary of completed rounds, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundStats {
    recent: Vec<RoundRecord>,
    pub rounds: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_wagered: u64,
    pub total_paid_out: u64,
}

impl RoundStats {
    pub fn record(&mut self, record: RoundRecord) {
        self.rounds += 1;
        if record.wagered > 0 {
            if record.cashed_out {
                self.wins += 1;
            } else {
                self.losses += 1;
            }
        }
        self.total_wagered = self.total_wagered.saturating_add(record.wagered);
        self.total_paid_out = self.total_paid_out.saturating_add(record.payout);
        self.recent.insert(0, record);
        self.recent.truncate(ROUND_HISTORY_LIMIT);
    }

    /// Completed rounds, newest first, capped at [ROUND_HISTORY_LIMIT].
    pub fn recent(&self) -> &[RoundRecord] {
        &self.recent
    }

    /// Net chips won (negative when the house is ahead). Totals beyond
    /// `i64::MAX` saturate instead of wrapping.
    pub fn net(&self) -> i64 {
        let paid_out = i64::try_from(self.total_paid_out).unwrap_or(i64::MAX);
        let wagered = i64::try_from(self.total_wagered).unwrap_or(i64::MAX);
        paid_out.saturating_sub(wagered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(flight_id: u64, wagered: u64, payout: u64, cashed_out: bool) -> RoundRecord {
        RoundRecord {
            flight_id,
            target: 300,
            final_live: 250,
            wagered,
            payout,
            cashed_out,
            resolved_at_ms: flight_id * 1_000,
        }
    }

    #[test]
    fn test_totals_and_net() {
        let mut stats = RoundStats::default();
        stats.record(record(1, 100, 200, true));
        stats.record(record(2, 100, 0, false));
        stats.record(record(3, 0, 0, false)); // spectated round

        assert_eq!(stats.rounds, 3);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.total_wagered, 200);
        assert_eq!(stats.total_paid_out, 200);
        assert_eq!(stats.net(), 0);
    }

    #[test]
    fn test_net_saturates_on_huge_totals() {
        let mut stats = RoundStats::default();
        stats.record(record(1, u64::MAX, 0, false));
        assert_eq!(stats.net(), -i64::MAX);

        let mut stats = RoundStats::default();
        stats.record(record(1, 0, u64::MAX, true));
        assert_eq!(stats.net(), i64::MAX);
    }

    #[test]
    fn test_recent_capped_newest_first() {
        let mut stats = RoundStats::default();
        for flight_id in 1..=(ROUND_HISTORY_LIMIT as u64 + 5) {
            stats.record(record(flight_id, 10, 0, false));
        }
        assert_eq!(stats.recent().len(), ROUND_HISTORY_LIMIT);
        assert_eq!(
            stats.recent()[0].flight_id,
            ROUND_HISTORY_LIMIT as u64 + 5
        );
        assert_eq!(stats.rounds, ROUND_HISTORY_LIMIT as u64 + 5);
    }
}
