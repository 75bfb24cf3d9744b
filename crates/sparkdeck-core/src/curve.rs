//! Curve Model
//!
//! Ordered RPM-keyed point sequences for ignition advance and quick-shifter
//! kill-time curves. Enforces strict ascending order and 2..=50 cardinality.
//! A curve is a detached working copy of device data: edits never touch the
//! map store's cache until an explicit save round-trip re-fetches it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum points a curve may hold
pub const MAX_POINTS: usize = 50;

/// Minimum points a curve may shrink to
pub const MIN_POINTS: usize = 2;

/// Maximum RPM key accepted by either curve type
pub const RPM_MAX: u32 = 25_000;

/// Errors from curve editing and validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("RPM {rpm} already exists in the curve")]
    DuplicateKey { rpm: u32 },

    #[error("curve is full (maximum {max} points)")]
    CapacityExceeded { max: usize },

    #[error("{what} {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("cannot delete: minimum {min} points required")]
    MinimumCardinality { min: usize },

    #[error("RPM values must be strictly ascending (row {index})")]
    UnorderedCurve { index: usize },

    #[error("no point at index {index}")]
    PointIndex { index: usize },
}

/// What a curve's values mean, and the bounds they must honor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveKind {
    /// RPM -> ignition advance in degrees
    Ignition,
    /// RPM -> spark kill time in milliseconds
    QuickShifter,
}

impl CurveKind {
    /// Inclusive bounds for the value axis
    pub fn value_bounds(&self) -> (f64, f64) {
        match self {
            CurveKind::Ignition => (-10.0, 60.0),
            CurveKind::QuickShifter => (0.0, 300.0),
        }
    }

    /// Unit suffix used when labeling the value axis
    pub fn value_unit(&self) -> &'static str {
        match self {
            CurveKind::Ignition => "°",
            CurveKind::QuickShifter => " ms",
        }
    }
}

/// One sample point on a curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub rpm: u32,
    pub value: f64,
}

impl CurvePoint {
    pub fn new(rpm: u32, value: f64) -> Self {
        Self { rpm, value }
    }
}

/// Wire shape of a curve: parallel key/value sequences plus a count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSeries {
    pub rpm: Vec<u32>,
    pub values: Vec<f64>,
    pub count: usize,
}

/// An editable curve owned by a single editing surface
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    kind: CurveKind,
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Create an empty curve of the given kind
    pub fn new(kind: CurveKind) -> Self {
        Self {
            kind,
            points: Vec::new(),
        }
    }

    /// The factory 8-point ignition template
    pub fn default_ignition() -> Self {
        let points = [
            (0, 5.0),
            (1000, 10.0),
            (3000, 20.0),
            (6000, 30.0),
            (9000, 35.0),
            (12000, 32.0),
            (15000, 28.0),
            (18000, 25.0),
        ]
        .into_iter()
        .map(|(rpm, value)| CurvePoint { rpm, value })
        .collect();
        Self {
            kind: CurveKind::Ignition,
            points,
        }
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Replace the working curve wholesale. Device data is assumed
    /// well-formed, so no validation happens here.
    pub fn load(&mut self, points: Vec<CurvePoint>) {
        self.points = points;
    }

    /// Insert a new point, keeping the curve sorted by RPM.
    ///
    /// The sort is the canonical ordering mechanism: callers never need to
    /// supply sorted input.
    pub fn add_point(&mut self, rpm: u32, value: f64) -> Result<(), CurveError> {
        if self.points.len() >= MAX_POINTS {
            return Err(CurveError::CapacityExceeded { max: MAX_POINTS });
        }
        if rpm > RPM_MAX {
            return Err(CurveError::OutOfRange {
                what: "RPM",
                value: rpm as f64,
                min: 0.0,
                max: RPM_MAX as f64,
            });
        }
        let (min, max) = self.kind.value_bounds();
        if value < min || value > max {
            return Err(CurveError::OutOfRange {
                what: "value",
                value,
                min,
                max,
            });
        }
        if self.points.iter().any(|p| p.rpm == rpm) {
            return Err(CurveError::DuplicateKey { rpm });
        }
        self.points.push(CurvePoint { rpm, value });
        self.points.sort_unstable_by_key(|p| p.rpm);
        Ok(())
    }

    /// Remove the point at `index`, preserving the order of the rest.
    pub fn delete_point(&mut self, index: usize) -> Result<CurvePoint, CurveError> {
        if self.points.len() <= MIN_POINTS {
            return Err(CurveError::MinimumCardinality { min: MIN_POINTS });
        }
        if index >= self.points.len() {
            return Err(CurveError::PointIndex { index });
        }
        Ok(self.points.remove(index))
    }

    /// Overwrite the point at `index` in place.
    ///
    /// This is the free-text edit path: ordering is deliberately not checked
    /// here. The curve may transiently violate ascending order until a save
    /// runs [`Curve::validate_ascending`].
    pub fn set_point(&mut self, index: usize, rpm: u32, value: f64) -> Result<(), CurveError> {
        match self.points.get_mut(index) {
            Some(p) => {
                p.rpm = rpm;
                p.value = value;
                Ok(())
            }
            None => Err(CurveError::PointIndex { index }),
        }
    }

    /// Produce the wire shape expected by the save operation.
    pub fn serialize(&self) -> CurveSeries {
        CurveSeries {
            rpm: self.points.iter().map(|p| p.rpm).collect(),
            values: self.points.iter().map(|p| p.value).collect(),
            count: self.points.len(),
        }
    }

    /// Save-time precondition: every adjacent pair must be strictly
    /// ascending by RPM. Ties and inversions both fail; nothing is
    /// auto-sorted on this path.
    pub fn validate_ascending(&self) -> Result<(), CurveError> {
        for (i, pair) in self.points.windows(2).enumerate() {
            if pair[0].rpm >= pair[1].rpm {
                return Err(CurveError::UnorderedCurve { index: i + 1 });
            }
        }
        Ok(())
    }
}
