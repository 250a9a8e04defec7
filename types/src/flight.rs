use thiserror::Error as ThisError;

use super::{
    FLIGHT_BASE_DURATION_MS, FLIGHT_LEAD_IN_MS, FLIGHT_MS_PER_HUNDREDTH, FLIGHT_TICK_MS,
    TICK_INCREMENT_MAX, TICK_INCREMENT_MIN,
};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum FlightError {
    #[error("a flight is already ascending")]
    AlreadyAscending,
    #[error("no prediction available to fly against")]
    NoPrediction,
}

/// Lifecycle of a flight.
///
/// `Resolved` reports a completed flight until the controller's next
/// advance clears it back to `Idle`; a new launch may also proceed
/// directly from it.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightPhase {
    Idle = 0,
    Ascending = 1,
    Resolved = 2,
}

impl TryFrom<u8> for FlightPhase {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlightPhase::Idle),
            1 => Ok(FlightPhase::Ascending),
            2 => Ok(FlightPhase::Resolved),
            _ => Err(()),
        }
    }
}

/// Flight timing configuration with durations in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlightConfig {
    /// Delay between start and the beginning of ascent.
    pub lead_in_ms: u64,
    /// Interval between live-multiplier ticks.
    pub tick_ms: u64,
    /// Fixed portion of every flight's duration.
    pub base_duration_ms: u64,
    /// Marginal duration per hundredth of target multiplier.
    pub ms_per_hundredth: u64,
    /// Per-tick live increment range in hundredths.
    pub tick_increment_min: u64,
    pub tick_increment_max: u64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            lead_in_ms: FLIGHT_LEAD_IN_MS,
            tick_ms: FLIGHT_TICK_MS,
            base_duration_ms: FLIGHT_BASE_DURATION_MS,
            ms_per_hundredth: FLIGHT_MS_PER_HUNDREDTH,
            tick_increment_min: TICK_INCREMENT_MIN,
            tick_increment_max: TICK_INCREMENT_MAX,
        }
    }
}

impl FlightConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.tick_ms == 0 {
            return Err("tick_ms must be greater than zero");
        }
        if self.base_duration_ms == 0 {
            return Err("base_duration_ms must be greater than zero");
        }
        if self.tick_increment_min == 0 {
            return Err("tick_increment_min must be greater than zero");
        }
        if self.tick_increment_max < self.tick_increment_min {
            return Err("tick_increment_max must be >= tick_increment_min");
        }
        Ok(())
    }

    /// Total duration of a flight against `target` (in hundredths),
    /// measured from `start` to resolution.
    pub fn duration_ms(&self, target: u64) -> u64 {
        self.lead_in_ms
            .saturating_add(self.base_duration_ms)
            .saturating_add(target.saturating_mul(self.ms_per_hundredth))
    }
}
