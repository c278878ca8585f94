//! Contains definitions for length/distance functions.

use bevy_math::{Vec2, Vec3, Vec4, VectorSpace};

/// Represents some function on a vector `T` that computes some version of it's length.
pub trait LengthFunction<T: VectorSpace> {
    /// Computes the length or magnitude of `vec`.
    /// Must always be non-negative
    #[inline]
    fn length_of(&self, vec: T) -> f32 {
        self.length_from_ordering(self.length_ordering(vec))
    }
    /// Returns some measure of the length of the `vec` such that if the length ordering of one vec is less than that of another, that same ordering applies to their actual lengths.
    fn length_ordering(&self, vec: T) -> f32;
    /// Returns the length of some `T` based on [`LengthFunction::length_ordering`].
    fn length_from_ordering(&self, ordering: f32) -> f32;
}

/// A [`LengthFunction`] for "as the crow flies" length
/// This is traditional length. If you're not sure which [`LengthFunction`] to use, use this one.
///
/// Orderings are squared lengths, so comparing candidates never needs a square root.
#[derive(Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct EuclideanLength;

macro_rules! impl_distances {
    ($t:path) => {
        impl LengthFunction<$t> for EuclideanLength {
            #[inline]
            fn length_ordering(&self, vec: $t) -> f32 {
                vec.length_squared()
            }

            #[inline]
            fn length_from_ordering(&self, ordering: f32) -> f32 {
                bevy_math::ops::sqrt(ordering)
            }
        }
    };
}

impl_distances!(Vec2);
impl_distances!(Vec3);
impl_distances!(Vec4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_orders_by_square() {
        let v = Vec3::new(1.0, 2.0, 2.0);
        assert_eq!(EuclideanLength.length_ordering(v), 9.0);
        assert_eq!(EuclideanLength.length_of(v), 3.0);
        assert_eq!(EuclideanLength.length_of(Vec2::new(3.0, 4.0)), 5.0);
        assert_eq!(EuclideanLength.length_of(Vec4::ZERO), 0.0);
    }
}
