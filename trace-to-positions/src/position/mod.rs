//! Maps each plate's delta-t back to the position of the hit along the plate.
mod calibration;

pub use calibration::{CalibrationArtifact, CalibrationCurve, CalibrationModel};

use crate::{
    error::{Indeterminate, Outcome, ParameterError},
    plate::DeltaTArray,
    pulse_detection::Real,
};
use itertools::Itertools;
use tracing::instrument;

pub const DEFAULT_GRID_POINTS: usize = 10_001;

/// The physical extent of a plate and how far beyond it a hit may fall
/// before it is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionBounds {
    pub min: Real,
    pub max: Real,
    pub tolerance: Real,
}

impl Default for PositionBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 144.0,
            tolerance: 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub value: Real,
    /// The raw position fell outside the plate, within tolerance, and was moved to its edge.
    pub clamped: bool,
}

/// One position per plate, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionArray(Vec<Outcome<Position>>);

impl PositionArray {
    pub fn iter(&self) -> impl Iterator<Item = &Outcome<Position>> {
        self.0.iter()
    }

    pub fn get(&self, plate: usize) -> Option<&Outcome<Position>> {
        self.0.get(plate)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn num_defined(&self) -> usize {
        self.0.iter().filter(|position| position.is_ok()).count()
    }
}

impl FromIterator<Outcome<Position>> for PositionArray {
    fn from_iter<T: IntoIterator<Item = Outcome<Position>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Inverts a calibration numerically, by tabulating it over the plate and its
/// tolerance margins and interpolating within the table.
#[derive(Debug, Clone)]
pub struct PositionReconstructor {
    bounds: PositionBounds,
    /// `(position, delta_t)` in increasing position.
    grid: Vec<(Real, Real)>,
}

impl PositionReconstructor {
    pub fn new<M: CalibrationModel>(
        model: &M,
        bounds: PositionBounds,
        grid_points: usize,
    ) -> Result<Self, ParameterError> {
        if !(bounds.min < bounds.max) {
            return Err(ParameterError::EmptyPositionBounds {
                min: bounds.min,
                max: bounds.max,
            });
        }
        if !(bounds.tolerance >= 0.0) || !bounds.tolerance.is_finite() {
            return Err(ParameterError::NegativeTolerance(bounds.tolerance));
        }
        if grid_points < 2 {
            return Err(ParameterError::GridTooCoarse(grid_points));
        }

        let start = bounds.min - bounds.tolerance;
        let end = bounds.max + bounds.tolerance;
        let last = grid_points - 1;
        let step = (end - start) / last as Real;
        // The last point is pinned to `end` so rounding cannot shorten the grid.
        let grid = (0..grid_points)
            .map(|i| if i == last { end } else { start + i as Real * step })
            .map(|position| (position, model.delta_t(position)))
            .collect();
        Ok(Self { bounds, grid })
    }

    pub fn bounds(&self) -> &PositionBounds {
        &self.bounds
    }

    #[instrument(skip_all, fields(num_defined))]
    pub fn reconstruct(&self, delta_t: &DeltaTArray) -> PositionArray {
        let positions = delta_t
            .iter()
            .map(|dt| dt.clone().and_then(|dt| self.position(dt)))
            .collect::<PositionArray>();
        tracing::Span::current().record("num_defined", positions.num_defined());
        positions
    }

    pub fn position(&self, delta_t: Real) -> Outcome<Position> {
        let out_of_range = Indeterminate::PositionOutOfCalibratedRange { delta_t };
        let raw = self.invert(delta_t).ok_or(out_of_range.clone())?;

        let PositionBounds {
            min,
            max,
            tolerance,
        } = self.bounds;
        if raw < min {
            (min - raw <= tolerance)
                .then_some(Position {
                    value: min,
                    clamped: true,
                })
                .ok_or(out_of_range)
        } else if raw > max {
            (raw - max <= tolerance)
                .then_some(Position {
                    value: max,
                    clamped: true,
                })
                .ok_or(out_of_range)
        } else {
            Ok(Position {
                value: raw,
                clamped: false,
            })
        }
    }

    /// The position at which the tabulated calibration passes through `delta_t`.
    fn invert(&self, delta_t: Real) -> Option<Real> {
        self.grid
            .iter()
            .tuple_windows()
            .find(|((_, d0), (_, d1))| d0.min(*d1) <= delta_t && delta_t <= d0.max(*d1))
            .map(|((p0, d0), (p1, d1))| {
                if d1 == d0 {
                    *p0
                } else {
                    p0 + (delta_t - d0) / (d1 - d0) * (p1 - p0)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn reconstructor(slope: Real, intercept: Real) -> PositionReconstructor {
        PositionReconstructor::new(
            &CalibrationCurve::new(slope, intercept).unwrap(),
            PositionBounds::default(),
            DEFAULT_GRID_POINTS,
        )
        .unwrap()
    }

    #[test]
    fn round_trip() {
        let position = reconstructor(2.0, 0.0).position(10.0).unwrap();
        assert_approx_eq!(position.value, 5.0, 1e-9);
        assert!(!position.clamped);
    }

    #[test]
    fn within_tolerance_is_clamped() {
        let reconstructor = reconstructor(2.0, 0.0);
        assert_eq!(
            reconstructor.position(300.0),
            Ok(Position {
                value: 144.0,
                clamped: true
            })
        );
        assert_eq!(
            reconstructor.position(-20.0),
            Ok(Position {
                value: 0.0,
                clamped: true
            })
        );
    }

    #[test]
    fn beyond_tolerance_is_undefined() {
        let reconstructor = reconstructor(2.0, 0.0);
        assert_eq!(
            reconstructor.position(400.0),
            Err(Indeterminate::PositionOutOfCalibratedRange { delta_t: 400.0 })
        );
        assert!(reconstructor.position(-60.0).is_err());
        assert!(reconstructor.position(Real::NAN).is_err());
    }

    #[test]
    fn grid_reaches_both_bounds() {
        let curve = CalibrationCurve::new(1.0, 0.0).unwrap();
        let bounds = PositionBounds {
            min: 0.0,
            max: 1.5,
            tolerance: 0.0,
        };
        let reconstructor =
            PositionReconstructor::new(&curve, bounds, DEFAULT_GRID_POINTS).unwrap();
        assert_eq!(
            reconstructor.position(1.5),
            Ok(Position {
                value: 1.5,
                clamped: false
            })
        );
        assert_eq!(
            reconstructor.position(0.0),
            Ok(Position {
                value: 0.0,
                clamped: false
            })
        );

        let bounds = PositionBounds {
            min: 0.0,
            max: 298.7,
            tolerance: 7.7,
        };
        let reconstructor =
            PositionReconstructor::new(&curve, bounds, DEFAULT_GRID_POINTS).unwrap();
        assert_eq!(
            reconstructor.position(306.4),
            Ok(Position {
                value: 298.7,
                clamped: true
            })
        );
    }

    #[test]
    fn decreasing_calibration() {
        let position = reconstructor(-0.5, 30.0).position(0.0).unwrap();
        assert_approx_eq!(position.value, 60.0, 1e-9);
    }

    #[test]
    fn non_linear_model() {
        struct Quadratic;
        impl CalibrationModel for Quadratic {
            fn delta_t(&self, position: Real) -> Real {
                position * position.abs() / 100.0
            }
        }
        let reconstructor =
            PositionReconstructor::new(&Quadratic, PositionBounds::default(), DEFAULT_GRID_POINTS)
                .unwrap();
        let position = reconstructor.position(Quadratic.delta_t(100.0)).unwrap();
        assert_approx_eq!(position.value, 100.0, 1e-3);
    }

    #[test]
    fn undefined_delta_t_stays_undefined() {
        let delta_t = [Ok(10.0), Err(Indeterminate::UnpairedPeak), Ok(400.0)]
            .into_iter()
            .collect::<DeltaTArray>();
        let positions = reconstructor(2.0, 0.0).reconstruct(&delta_t);
        assert_eq!(positions.len(), 3);
        assert_eq!(positions.num_defined(), 1);
        assert_eq!(positions.get(1), Some(&Err(Indeterminate::UnpairedPeak)));
        assert!(matches!(
            positions.get(2),
            Some(Err(Indeterminate::PositionOutOfCalibratedRange { .. }))
        ));
    }

    #[test]
    fn invalid_parameters() {
        let curve = CalibrationCurve::new(2.0, 0.0).unwrap();
        let bounds = PositionBounds {
            min: 10.0,
            max: 10.0,
            tolerance: 1.0,
        };
        assert!(PositionReconstructor::new(&curve, bounds, 100).is_err());
        let bounds = PositionBounds {
            tolerance: -1.0,
            ..PositionBounds::default()
        };
        assert_eq!(
            PositionReconstructor::new(&curve, bounds, 100).err(),
            Some(ParameterError::NegativeTolerance(-1.0))
        );
        assert_eq!(
            PositionReconstructor::new(&curve, PositionBounds::default(), 1).err(),
            Some(ParameterError::GridTooCoarse(1))
        );
    }
}
