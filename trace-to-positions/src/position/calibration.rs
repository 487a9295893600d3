use crate::{error::CalibrationError, pulse_detection::Real};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::debug;

/// The forward relation from a hit position along a plate to the delta-t it produces.
pub trait CalibrationModel {
    fn delta_t(&self, position: Real) -> Real;
}

/// The persisted result of the offline fit of delta-t against position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationArtifact {
    /// Slope then intercept.
    pub popt: [Real; 2],
    #[serde(default)]
    pub pcov: [[Real; 2]; 2],
}

/// `delta_t = slope * position + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationCurve {
    slope: Real,
    intercept: Real,
    covariance: [[Real; 2]; 2],
}

impl CalibrationCurve {
    pub fn new(slope: Real, intercept: Real) -> Result<Self, CalibrationError> {
        Self::from_artifact(CalibrationArtifact {
            popt: [slope, intercept],
            pcov: Default::default(),
        })
    }

    pub fn from_artifact(artifact: CalibrationArtifact) -> Result<Self, CalibrationError> {
        let [slope, intercept] = artifact.popt;
        if slope == 0.0 || !slope.is_finite() {
            return Err(CalibrationError::DegenerateSlope(slope));
        }
        if !intercept.is_finite() {
            return Err(CalibrationError::NonFiniteIntercept(intercept));
        }
        Ok(Self {
            slope,
            intercept,
            covariance: artifact.pcov,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CalibrationError> {
        Self::from_artifact(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, CalibrationError> {
        let json = fs::read_to_string(path).map_err(|source| CalibrationError::IO {
            path: path.to_owned(),
            source,
        })?;
        let curve = Self::from_json(&json)?;
        debug!(
            slope = curve.slope,
            intercept = curve.intercept,
            "Loaded calibration from {}",
            path.display()
        );
        Ok(curve)
    }

    pub fn slope(&self) -> Real {
        self.slope
    }

    pub fn intercept(&self) -> Real {
        self.intercept
    }

    /// Covariance of (slope, intercept) from the fit. Not used by the reconstruction.
    pub fn covariance(&self) -> &[[Real; 2]; 2] {
        &self.covariance
    }
}

impl CalibrationModel for CalibrationCurve {
    fn delta_t(&self, position: Real) -> Real {
        self.slope * position + self.intercept
    }
}
