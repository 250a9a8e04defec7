use thiserror::Error as ThisError;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ServiceError {
    #[error("prediction service unavailable: {reason}")]
    Unavailable { reason: &'static str },
}

/// A synthesized crash-multiplier prediction.
///
/// Superseded (never mutated) by each new request; the multiplier is in
/// hundredths and the confidence is a cosmetic percentage with no
/// statistical meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prediction {
    /// Predicted multiplier in hundredths (120..=1000).
    pub multiplier: u64,
    /// Confidence percentage (80..=99).
    pub confidence: u8,
    /// Clock reading when the prediction was generated.
    pub generated_at_ms: u64,
    /// Monotonic request sequence number; stale completions are discarded
    /// by comparing against the latest issued sequence.
    pub sequence: u64,
}
