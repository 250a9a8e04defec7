/// Minimum length of a valid activation code
pub const MIN_ACTIVATION_CODE_LEN: usize = 8;

/// Starting chips for a fresh ledger
pub const STARTING_CHIPS: u64 = 1_000;

/// Fixed-point scale for multipliers (hundredths; 100 = 1.00x)
pub const MULTIPLIER_SCALE: u64 = 100;

/// Lower bound on a predicted multiplier (1.20x)
pub const MIN_PREDICTED_MULTIPLIER: u64 = 120;

/// Upper bound on a predicted multiplier (10.00x)
pub const MAX_PREDICTED_MULTIPLIER: u64 = 1_000;

/// Uniform base range for outcome generation (1.20x - 4.20x).
pub const PREDICTION_BASE_MIN: u64 = 120;
pub const PREDICTION_BASE_MAX: u64 = 420;

/// Period of the time-based drift applied to generated outcomes
pub const DRIFT_PERIOD_MS: u64 = 10_000;

/// Amplitude of the time-based drift (fraction of the base)
pub const DRIFT_SCALE: f64 = 0.1;

/// Confidence range attached to predictions (cosmetic only).
pub const CONFIDENCE_MIN: u8 = 80;
pub const CONFIDENCE_MAX: u8 = 99;

/// Number of predictions retained, newest first
pub const PREDICTION_HISTORY_LIMIT: usize = 5;

/// Number of completed rounds retained in stats, newest first
pub const ROUND_HISTORY_LIMIT: usize = 10;

/// Simulated generation latency range.
pub const GENERATION_LATENCY_MIN_MS: u64 = 500;
pub const GENERATION_LATENCY_MAX_MS: u64 = 1_000;

/// Delay between flight start and the beginning of ascent
pub const FLIGHT_LEAD_IN_MS: u64 = 500;

/// Interval between live-multiplier ticks
pub const FLIGHT_TICK_MS: u64 = 100;

/// Fixed portion of every flight's duration
pub const FLIGHT_BASE_DURATION_MS: u64 = 1_000;

/// Marginal duration per hundredth of target multiplier
/// (2 ms per hundredth = 200 ms per 1.00x)
pub const FLIGHT_MS_PER_HUNDREDTH: u64 = 2;

/// Per-tick live-multiplier increment range in hundredths (0.01x - 0.04x).
pub const TICK_INCREMENT_MIN: u64 = 1;
pub const TICK_INCREMENT_MAX: u64 = 4;
