//! Boundary to the downstream fraud model. The model itself lives elsewhere;
//! this crate only fixes the feature layout and the call contract.

use crate::assembler::VelocityRecord;
use thiserror::Error;

pub const FEATURE_DIM: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("expected {expected} features, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("model returned {0}, outside [0, 1]")]
    OutOfRange(f32),
}

/// Anything that maps a fixed-length feature vector to a fraud probability.
pub trait FraudModel {
    fn predict(&self, features: &[f32]) -> Result<f32, ScoringError>;
}

/// Model input, in the order the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionFeatures {
    pub amount: f32,
    /// Time-of-day bucket or seconds since midnight, as the model expects
    pub time: f32,
    /// 1.0 when billing and shipping details disagree
    pub mismatch: f32,
    /// `issuer_velocity_24h`
    pub frequency: f32,
}

impl TransactionFeatures {
    /// Fill `frequency` from a velocity record; the rest come from other feature sources.
    pub fn from_record<P>(record: &VelocityRecord<P>, amount: f32, time: f32, mismatch: bool) -> Self {
        Self {
            amount,
            time,
            mismatch: if mismatch { 1.0 } else { 0.0 },
            frequency: record.velocity as f32,
        }
    }

    pub fn to_array(&self) -> [f32; FEATURE_DIM] {
        [self.amount, self.time, self.mismatch, self.frequency]
    }
}

/// Training-time standardization: `(x - mean) / std` per feature
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub mean: [f32; FEATURE_DIM],
    pub std: [f32; FEATURE_DIM],
}

impl Default for Standardizer {
    fn default() -> Self {
        Self {
            mean: [0.0; FEATURE_DIM],
            std: [1.0; FEATURE_DIM],
        }
    }
}

impl Standardizer {
    pub fn apply(&self, raw: [f32; FEATURE_DIM]) -> [f32; FEATURE_DIM] {
        let mut out = raw;
        for (i, v) in out.iter_mut().enumerate() {
            // zero std leaves the feature centered but unscaled
            let s = if self.std[i] == 0.0 { 1.0 } else { self.std[i] };
            *v = (*v - self.mean[i]) / s;
        }
        out
    }
}

/// Standardize, call the model, and hold it to the probability contract.
pub fn score<M: FraudModel + ?Sized>(
    model: &M,
    standardizer: &Standardizer,
    features: &TransactionFeatures,
) -> Result<f32, ScoringError> {
    let input = standardizer.apply(features.to_array());
    let p = model.predict(&input)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(ScoringError::OutOfRange(p));
    }
    Ok(p)
}
