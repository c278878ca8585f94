//! A piecewise linear color ramp for mapping finished noise values to colors.

use alloc::vec::Vec;

use bevy_math::{Curve, Vec4, curve::Interval};

use crate::{curves::Lerped, error::NoiseError};

/// A color pinned to a noise value.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorStop {
    /// The noise value this stop sits at.
    pub value: f32,
    /// The color, as linear rgba.
    pub color: Vec4,
}

impl ColorStop {
    /// Creates a [`ColorStop`].
    pub const fn new(value: f32, color: Vec4) -> Self {
        Self { value, color }
    }
}

/// Maps values to colors through sorted [`ColorStop`]s.
///
/// Values at or below the first stop take its color and values at or above the last take that one.
/// Anything between blends linearly between the two stops around it.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<ColorStop>", into = "Vec<ColorStop>")
)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl ColorRamp {
    /// Sorts `stops` by value into a ramp. Fails if there are none or any value is not finite.
    pub fn new(stops: impl IntoIterator<Item = ColorStop>) -> Result<Self, NoiseError> {
        let mut stops: Vec<_> = stops.into_iter().collect();
        if stops.is_empty() {
            return Err(NoiseError::EmptyColorRamp);
        }
        if let Some(bad) = stops.iter().find(|stop| !stop.value.is_finite()) {
            return Err(NoiseError::InvalidColorStop(bad.value));
        }
        stops.sort_by(|a, b| a.value.total_cmp(&b.value));
        Ok(Self { stops })
    }

    /// The stops, sorted by value.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// The color for `value`. NaN maps to the first stop.
    #[inline]
    pub fn color_at(&self, value: f32) -> Vec4 {
        self.sample_unchecked(value)
    }
}

impl Curve<Vec4> for ColorRamp {
    #[inline]
    fn domain(&self) -> Interval {
        Interval::EVERYWHERE
    }

    fn sample_unchecked(&self, t: f32) -> Vec4 {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Vec4::ZERO;
        };
        if t.is_nan() || t <= first.value {
            return first.color;
        }
        if t >= last.value {
            return last.color;
        }

        // first.value < t < last.value, so this lands in 1..len.
        let upper = self.stops.partition_point(|stop| stop.value <= t);
        let (low, high) = (self.stops[upper - 1], self.stops[upper]);
        Lerped {
            start: low.color,
            end: high.color,
        }
        .sample_unchecked((t - low.value) / (high.value - low.value))
    }
}

impl TryFrom<Vec<ColorStop>> for ColorRamp {
    type Error = NoiseError;

    fn try_from(stops: Vec<ColorStop>) -> Result<Self, Self::Error> {
        Self::new(stops)
    }
}

impl From<ColorRamp> for Vec<ColorStop> {
    fn from(ramp: ColorRamp) -> Self {
        ramp.stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn ramp() -> ColorRamp {
        ColorRamp::new([
            ColorStop::new(0.8, Vec4::new(1.0, 1.0, 1.0, 1.0)),
            ColorStop::new(0.2, Vec4::new(0.0, 0.0, 1.0, 1.0)),
            ColorStop::new(0.5, Vec4::new(0.0, 1.0, 0.0, 1.0)),
        ])
        .unwrap()
    }

    #[test]
    fn stops_are_sorted() {
        let values: Vec<f32> = ramp().stops().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.2, 0.5, 0.8]);
    }

    #[test]
    fn ends_clamp() {
        let ramp = ramp();
        assert_eq!(ramp.color_at(-4.0), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(ramp.color_at(0.2), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(ramp.color_at(0.8), Vec4::ONE);
        assert_eq!(ramp.color_at(9.0), Vec4::ONE);
        assert_eq!(ramp.color_at(f32::NAN), Vec4::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn interior_blends_bracketing_stops() {
        let ramp = ramp();
        let c = ramp.color_at(0.35);
        assert!((c - Vec4::new(0.0, 0.5, 0.5, 1.0)).length() < 1e-5);
        assert_eq!(ramp.color_at(0.5), Vec4::new(0.0, 1.0, 0.0, 1.0));
        let c = ramp.color_at(0.65);
        assert!((c - Vec4::new(0.5, 1.0, 0.5, 1.0)).length() < 1e-5);
    }

    #[test]
    fn single_stop_is_constant() {
        let ramp = ColorRamp::new([ColorStop::new(0.5, Vec4::X)]).unwrap();
        assert_eq!(ramp.color_at(0.0), Vec4::X);
        assert_eq!(ramp.color_at(1.0), Vec4::X);
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(ColorRamp::new([]), Err(NoiseError::EmptyColorRamp));
    }

    #[test]
    fn non_finite_stops_are_rejected() {
        for bad in [-f32::NAN, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let ramp = ColorRamp::new([
                ColorStop::new(bad, Vec4::X),
                ColorStop::new(0.5, Vec4::Y),
            ]);
            assert!(
                matches!(ramp, Err(NoiseError::InvalidColorStop(v)) if v.to_bits() == bad.to_bits()),
                "{bad} was accepted"
            );
        }
        assert!(ColorRamp::try_from(vec![ColorStop::new(f32::NAN, Vec4::X)]).is_err());
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&ramp()).unwrap();
        let back: ColorRamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ramp());
        assert!(serde_json::from_str::<ColorRamp>("[]").is_err());
    }
}
