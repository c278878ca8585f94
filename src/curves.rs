//! Contains the curves and blend functions noise kernels interpolate with.

use bevy_math::{Curve, VectorSpace, curve::Interval};

/// Linear interpolation.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Linear;

impl Curve<f32> for Linear {
    #[inline]
    fn domain(&self) -> Interval {
        Interval::EVERYWHERE
    }

    #[inline]
    fn sample_unchecked(&self, t: f32) -> f32 {
        t
    }
}

/// The quintic fade `t³(t(6t−15)+10)`.
/// Its first and second derivatives are zero at both ends, so lattice noise built on it is C² across cell borders.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Quintic;

impl Curve<f32> for Quintic {
    #[inline]
    fn domain(&self) -> Interval {
        Interval::UNIT
    }

    #[inline]
    fn sample_unchecked(&self, t: f32) -> f32 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }
}

/// Interpolates a domain of [0, 1] to values of type `T`.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Lerped<T> {
    /// The value when the input it 0.
    pub start: T,
    /// The value when the input it 1.
    pub end: T,
}

impl<T: VectorSpace> Curve<T> for Lerped<T> {
    #[inline]
    fn domain(&self) -> Interval {
        Interval::EVERYWHERE
    }

    #[inline]
    fn sample_unchecked(&self, t: f32) -> T {
        lerp(self.start, self.end, t)
    }
}

/// Blends `a` into `b` by `t` as `a(1 - t) + bt`.
/// This form is exact at both ends, which keeps lattice values intact at cell corners.
#[inline(always)]
pub fn lerp<T: VectorSpace>(a: T, b: T, t: f32) -> T {
    a * (1.0 - t) + b * t
}

/// The cubic noise basis through four consecutive lattice values `a, b, c, d`, sampled at `t` between `b` and `c`.
///
/// This is exactly `b` at `t = 0` and `c` at `t = 1`, but overshoots between them,
/// so results need renormalizing.
#[inline(always)]
pub fn cubic_mix<T: VectorSpace>(a: T, b: T, c: T, d: T, t: f32) -> T {
    let p = (d - c) - (a - b);
    ((p * t + ((a - b) - p)) * t + (c - a)) * t + b
}
