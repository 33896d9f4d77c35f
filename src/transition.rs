//! Transition shapes: how a parameter moves between the targets of a rule window.
//!
//! A transition is an ordered list of [`PointOrSlope`]s. A [`Point`] places a value, expressed as a
//! percentage of the distance between two window targets, at a (possibly computed) time. A
//! [`SlopeRatio`] brackets a group of points with slopes whose weights decide how the total value
//! change is shared among the interior points.

use crate::error::{Error, Result};
use crate::formula::FormulaSymbolList;
use crate::model::Model;
use alloc::{borrow::ToOwned, string::String, vec::Vec};

/// Which pair of window targets a point interpolates between.
///
/// A `Diphone` point moves from target 1 to target 2, `Triphone` from 2 to 3 and `Tetraphone`
/// from 3 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointType {
    Diphone = 2,
    Triphone = 3,
    Tetraphone = 4,
}

impl PointType {
    /// Index of the target the point starts from.
    pub(crate) fn start_target(self) -> usize {
        self as usize - 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointTime {
    /// fixed time in milliseconds
    Free(f32),
    /// name of an equation evaluated against the rule symbols
    Equation(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub point_type: PointType,
    /// percentage of the target delta, or of the parameter range for special transitions
    pub value: f32,
    pub time: PointTime,
    /// phantom points position the curve but never produce an event
    pub is_phantom: bool,
}

impl Point {
    pub fn new(point_type: PointType, value: f32, time: PointTime) -> Self {
        Point {
            point_type,
            value,
            time,
            is_phantom: false,
        }
    }

    #[must_use]
    pub fn phantom(mut self) -> Self {
        self.is_phantom = true;
        self
    }

    /// Time of the point relative to the start of the rule.
    pub fn time(&self, model: &Model, symbols: &FormulaSymbolList) -> Result<f64> {
        match &self.time {
            PointTime::Free(time) => Ok(f64::from(*time)),
            PointTime::Equation(name) => Ok(f64::from(
                model.find_equation(name)?.eval_formula(symbols)?,
            )),
        }
    }

    /// Value of the point when moving `delta` away from `baseline`, clamped to `[min, max]`.
    pub fn value(&self, baseline: f64, delta: f64, min: f64, max: f64) -> f64 {
        clamp_value(baseline + ((f64::from(self.value) / 100.0) * delta), min, max)
    }
}

pub(crate) fn clamp_value(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slope {
    pub slope: f32,
    pub display_time: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlopeRatio {
    pub points: Vec<Point>,
    /// one slope between each pair of consecutive points
    pub slopes: Vec<Slope>,
}

impl SlopeRatio {
    pub fn total_slope_units(&self) -> f32 {
        self.slopes.iter().map(|slope| slope.slope).sum()
    }

    /// Shares `delta` among the slopes.
    ///
    /// Each slope gets a share proportional to `(slope / total slope units) * (interval / total
    /// interval)`; the shares are then rescaled so they add up to `delta`. `point_times` holds the
    /// time of every point. Returns one increment per slope, to be accumulated from the start
    /// value. Zero length intervals are not guarded and yield non-finite increments.
    pub fn distribute(&self, point_times: &[f64], delta: f64) -> Vec<f64> {
        let total_units = f64::from(self.total_slope_units());
        let (Some(&base_time), Some(&end_time)) = (point_times.first(), point_times.last()) else {
            return Vec::new();
        };
        let total_time = end_time - base_time;

        let mut sum = 0.0;
        let mut increments: Vec<f64> = self
            .slopes
            .iter()
            .zip(point_times.windows(2))
            .map(|(slope, interval)| {
                let mut share = f64::from(slope.slope) / total_units;
                share *= (interval[1] - interval[0]) / total_time;
                share *= delta;
                sum += share;
                share
            })
            .collect();

        let factor = delta / sum;
        for increment in &mut increments {
            *increment *= factor;
        }
        increments
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointOrSlope {
    Point(Point),
    SlopeRatio(SlopeRatio),
}

impl PointOrSlope {
    /// Type of the point that opens this entry.
    pub fn point_type(&self) -> Option<PointType> {
        match self {
            Self::Point(point) => Some(point.point_type),
            Self::SlopeRatio(slope_ratio) => slope_ratio.points.first().map(|p| p.point_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub name: String,
    pub group: String,
    pub transition_type: PointType,
    pub special: bool,
    pub point_or_slopes: Vec<PointOrSlope>,
}

impl Transition {
    pub fn new(name: &str, group: &str, transition_type: PointType) -> Self {
        Transition {
            name: name.to_owned(),
            group: group.to_owned(),
            transition_type,
            special: false,
            point_or_slopes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_point(mut self, point: Point) -> Self {
        self.point_or_slopes.push(PointOrSlope::Point(point));
        self
    }

    #[must_use]
    pub fn with_slope_ratio(mut self, slope_ratio: SlopeRatio) -> Self {
        self.point_or_slopes
            .push(PointOrSlope::SlopeRatio(slope_ratio));
        self
    }

    fn invalid(&self, reason: &str) -> Error {
        Error::InvalidTransition {
            name: self.name.clone(),
            reason: reason.to_owned(),
        }
    }

    /// Checks the shape invariants the event engine relies on.
    pub(crate) fn validate(&self) -> Result<()> {
        for entry in &self.point_or_slopes {
            let PointOrSlope::SlopeRatio(slope_ratio) = entry else {
                continue;
            };
            if self.special {
                return Err(self.invalid("special transitions can only hold points"));
            }
            if slope_ratio.points.len() < 2 {
                return Err(self.invalid("a slope ratio needs at least two points"));
            }
            if slope_ratio.slopes.len() + 1 != slope_ratio.points.len() {
                return Err(self.invalid("a slope ratio needs one slope per point interval"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1E-9;

    fn slope_ratio(slopes: &[f32]) -> SlopeRatio {
        SlopeRatio {
            points: (0..=slopes.len())
                .map(|i| Point::new(PointType::Diphone, 0.0, PointTime::Free(i as f32)))
                .collect(),
            slopes: slopes
                .iter()
                .map(|&slope| Slope {
                    slope,
                    display_time: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn distribution_conserves_delta() {
        let ratio = slope_ratio(&[1.0, 2.5, 0.5]);
        let times = [10.0, 25.0, 70.0, 95.0];
        let (start, end) = (12.0, 87.0);
        let increments = ratio.distribute(&times, end - start);
        assert_eq!(increments.len(), 3);
        let total = increments.iter().fold(start, |value, increment| value + increment);
        assert!((total - end).abs() < EPSILON, "{total} != {end}");
    }

    #[test]
    fn distribution_weights_slope_and_interval() {
        let ratio = slope_ratio(&[1.0, 3.0]);
        // equal intervals: shares follow the slopes
        let increments = ratio.distribute(&[0.0, 50.0, 100.0], 100.0);
        assert!((increments[0] - 25.0).abs() < EPSILON);
        assert!((increments[1] - 75.0).abs() < EPSILON);

        // equal slopes: shares follow the intervals
        let ratio = slope_ratio(&[2.0, 2.0]);
        let increments = ratio.distribute(&[0.0, 20.0, 100.0], -40.0);
        assert!((increments[0] + 8.0).abs() < EPSILON);
        assert!((increments[1] + 32.0).abs() < EPSILON);
    }

    #[test]
    fn zero_length_interval_is_not_guarded() {
        let ratio = slope_ratio(&[1.0, 1.0]);
        let increments = ratio.distribute(&[5.0, 5.0, 5.0], 10.0);
        assert!(increments.iter().all(|increment| !increment.is_finite()));
    }

    #[test]
    fn point_values_are_clamped() {
        let point = Point::new(PointType::Diphone, 50.0, PointTime::Free(0.0));
        assert_eq!(point.value(10.0, 40.0, 0.0, 100.0), 30.0);
        assert_eq!(point.value(90.0, 40.0, 0.0, 100.0), 100.0);
        assert_eq!(point.value(10.0, -40.0, 0.0, 100.0), 0.0);
    }

    #[test]
    fn validate_rejects_malformed_slope_ratios() {
        let mut short = slope_ratio(&[1.0]);
        short.points.pop();
        let transition = Transition::new("short", "test", PointType::Diphone).with_slope_ratio(short);
        assert!(matches!(transition.validate(), Err(Error::InvalidTransition { .. })));

        let mut uneven = slope_ratio(&[1.0, 1.0]);
        uneven.slopes.pop();
        let transition = Transition::new("uneven", "test", PointType::Diphone).with_slope_ratio(uneven);
        assert!(transition.validate().is_err());

        let mut special =
            Transition::new("special", "test", PointType::Diphone).with_slope_ratio(slope_ratio(&[1.0]));
        special.special = true;
        assert!(special.validate().is_err());

        let fine = Transition::new("fine", "test", PointType::Diphone)
            .with_point(Point::new(PointType::Diphone, 0.0, PointTime::Free(0.0)))
            .with_slope_ratio(slope_ratio(&[1.0, 2.0]));
        assert!(fine.validate().is_ok());
        assert_eq!(fine.point_or_slopes[1].point_type(), Some(PointType::Diphone));
    }
}
