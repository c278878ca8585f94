//! Contains common adaptive [`NoiseFunction`]s.

use bevy_math::{Vec3, Vec4};

use crate::{NoiseFunction, tables::Lattice};

/// Maps values from [-1, 1] to [0, 1] by `0.5x + 0.5`, clamping anything outside.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct SNormToUNorm;

impl NoiseFunction<f32> for SNormToUNorm {
    type Output = f32;

    #[inline]
    fn evaluate(&self, input: f32, _lattice: Lattice<'_>) -> Self::Output {
        (input * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

/// Rotates 3d space so the `xy` plane cuts the simplex lattice diagonally.
/// Slices along `z` then lose the axis aligned look of plain simplex noise.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct ImproveXyPlanes;

impl NoiseFunction<Vec3> for ImproveXyPlanes {
    type Output = Vec3;

    #[inline]
    fn evaluate(&self, input: Vec3, _lattice: Lattice<'_>) -> Self::Output {
        let xy = input.x + input.y;
        let s2 = xy * -0.211_324_87;
        let zz = input.z * 0.577_350_26;
        Vec3::new(
            input.x + s2 - zz,
            input.y + s2 - zz,
            zz + xy * 0.577_350_26,
        )
    }
}

/// Rotates 4d space so `xyz` volumes cut the simplex lattice diagonally, the 4d counterpart of [`ImproveXyPlanes`].
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct ImproveXyzSpaces;

impl NoiseFunction<Vec4> for ImproveXyzSpaces {
    type Output = Vec4;

    #[inline]
    fn evaluate(&self, input: Vec4, _lattice: Lattice<'_>) -> Self::Output {
        let xyz = input.x + input.y + input.z;
        let ww = input.w * 0.5;
        let s2 = xyz * (-1.0 / 6.0) + ww;
        Vec4::new(
            input.x + s2,
            input.y + s2,
            input.z + s2,
            -0.5 * xyz + ww,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::NoiseTables;

    #[test]
    fn snorm_to_unorm_clamps() {
        let tables = NoiseTables::new(0, 2).unwrap();
        let lattice = tables.lattice(0);
        assert_eq!(SNormToUNorm.evaluate(-1.0, lattice), 0.0);
        assert_eq!(SNormToUNorm.evaluate(0.0, lattice), 0.5);
        assert_eq!(SNormToUNorm.evaluate(1.0, lattice), 1.0);
        assert_eq!(SNormToUNorm.evaluate(-3.0, lattice), 0.0);
        assert_eq!(SNormToUNorm.evaluate(7.0, lattice), 1.0);
    }

    #[test]
    fn rotations_preserve_length() {
        let tables = NoiseTables::new(0, 2).unwrap();
        let lattice = tables.lattice(0);
        let v = Vec3::new(0.3, -1.2, 2.5);
        let r = ImproveXyPlanes.evaluate(v, lattice);
        assert!((r.length() - v.length()).abs() < 1e-4);
        let v = Vec4::new(0.3, -1.2, 2.5, 0.7);
        let r = ImproveXyzSpaces.evaluate(v, lattice);
        assert!((r.length() - v.length()).abs() < 1e-4);
    }
}
