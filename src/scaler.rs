use ndarray::Array1;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalerError {
    #[error("failed to read scaler file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scaler file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scaler mean has {mean} entries but scale has {scale}")]
    Inconsistent { mean: usize, scale: usize },
    #[error("feature length mismatch: scaler was fit on {expected} features, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Affine feature normalization fit during training and persisted next to
/// the classifier. Applying it to a vector of any other length is a
/// configuration error, not something to recover from.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawScaler")]
pub struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

#[derive(Deserialize)]
struct RawScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl TryFrom<RawScaler> for Scaler {
    type Error = ScalerError;

    fn try_from(raw: RawScaler) -> Result<Self, Self::Error> {
        Scaler::new(raw.mean, raw.scale)
    }
}

impl Scaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ScalerError> {
        if mean.len() != scale.len() {
            return Err(ScalerError::Inconsistent {
                mean: mean.len(),
                scale: scale.len(),
            });
        }
        Ok(Self {
            mean: Array1::from_vec(mean),
            scale: Array1::from_vec(scale),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ScalerError> {
        let contents = std::fs::read_to_string(path)?;
        let scaler: Scaler = serde_json::from_str(&contents)?;
        Ok(scaler)
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, features: &Array1<f64>) -> Result<Array1<f64>, ScalerError> {
        if features.len() != self.mean.len() {
            return Err(ScalerError::LengthMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }
        Ok((features - &self.mean) / &self.scale)
    }
}
