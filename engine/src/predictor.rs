//! Outcome generation and the prediction session.
//!
//! The generator synthesizes a plausible-looking crash multiplier: a
//! uniform base in [1.20x, 4.20x], scaled by a slow sinusoidal drift of
//! the clock (`1 + sin(now / 10s) * 0.1`), clamped to [1.20x, 10.00x] and
//! expressed in hundredths. Confidence is a uniform integer in [80, 99].
//! Neither carries any statistical meaning.
//!
//! The session owns the bounded most-recent-first history and the single
//! pending-request slot. Requests are tagged with a monotonic sequence
//! number; a newer request supersedes the pending one and completions for
//! a superseded sequence are discarded (last-write-wins).

use aviatron_types::{
    Prediction, CONFIDENCE_MAX, CONFIDENCE_MIN, DRIFT_PERIOD_MS, DRIFT_SCALE,
    MAX_PREDICTED_MULTIPLIER, MIN_PREDICTED_MULTIPLIER, MULTIPLIER_SCALE, PREDICTION_BASE_MAX,
    PREDICTION_BASE_MIN, PREDICTION_HISTORY_LIMIT,
};
use rand::Rng;
use tracing::debug;

/// Synthesize a prediction from the provided randomness and clock reading.
pub fn generate<R: Rng>(rng: &mut R, now_ms: u64, sequence: u64) -> Prediction {
    let base =
        rng.gen_range(PREDICTION_BASE_MIN..=PREDICTION_BASE_MAX) as f64 / MULTIPLIER_SCALE as f64;
    let drift = (now_ms as f64 / DRIFT_PERIOD_MS as f64).sin() * DRIFT_SCALE;
    let value = base * (1.0 + drift);
    let multiplier = ((value * MULTIPLIER_SCALE as f64).round() as u64)
        .clamp(MIN_PREDICTED_MULTIPLIER, MAX_PREDICTED_MULTIPLIER);
    let confidence = rng.gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX);
    Prediction {
        multiplier,
        confidence,
        generated_at_ms: now_ms,
        sequence,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingRequest {
    sequence: u64,
    due_at_ms: u64,
}

/// Holds the current prediction, the pending request, and a bounded
/// most-recent-first history.
#[derive(Debug, Default)]
pub struct PredictionSession {
    next_sequence: u64,
    pending: Option<PendingRequest>,
    current: Option<Prediction>,
    history: Vec<Prediction>,
}

impl PredictionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request due at `due_at_ms`, superseding any pending
    /// one. Returns the sequence number assigned to the request.
    pub fn begin_request(&mut self, due_at_ms: u64) -> u64 {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        if let Some(superseded) = self.pending.replace(PendingRequest {
            sequence,
            due_at_ms,
        }) {
            debug!(
                superseded = superseded.sequence,
                sequence, "prediction request superseded"
            );
        }
        sequence
    }

    /// The pending request, if any, as `(sequence, due_at_ms)`.
    pub fn pending(&self) -> Option<(u64, u64)> {
        self.pending
            .map(|request| (request.sequence, request.due_at_ms))
    }

    /// Store a completed prediction. Returns false (and stores nothing)
    /// when `sequence` does not match the pending request.
    pub fn complete(&mut self, sequence: u64, prediction: Prediction) -> bool {
        match self.pending {
            Some(request) if request.sequence == sequence => {
                self.pending = None;
                self.history.insert(0, prediction.clone());
                self.history.truncate(PREDICTION_HISTORY_LIMIT);
                self.current = Some(prediction);
                true
            }
            _ => {
                debug!(sequence, "discarding stale prediction");
                false
            }
        }
    }

    pub fn current(&self) -> Option<&Prediction> {
        self.current.as_ref()
    }

    /// Clear the current prediction (history is retained). Called when the
    /// flight it targeted resolves.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// Past predictions, newest first, capped at [PREDICTION_HISTORY_LIMIT].
    pub fn history(&self) -> &[Prediction] {
        &self.history
    }
}
