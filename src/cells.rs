//! This contains logic for dividing a domain into cells of the integer lattice.

use bevy_math::{Curve, IVec2, IVec3, IVec4, Vec2, Vec3, Vec4, VectorSpace};

use crate::{
    curves::{cubic_mix, lerp},
    tables::Lattice,
};

/// Represents a portion or cell of some larger domain and a position within that cell.
pub trait DomainCell {
    /// The larger/full domain this is a segment of.
    type Full: VectorSpace;

    /// Hashes the least corner of this cell to a feature slot.
    fn slot(&self, lattice: Lattice<'_>) -> usize;
    /// Iterates the points that bound this cell.
    fn iter_points(&self, lattice: Lattice<'_>) -> impl Iterator<Item = CellPoint<Self::Full>>;
}

/// Represents a [`DomainCell`] that can be smoothly interpolated within.
pub trait InterpolatableCell: DomainCell {
    /// Interpolates between the bounding [`CellPoint`]s of this [`DomainCell`] according to some [`Curve`].
    /// Axes are blended one at a time, `x` first.
    fn interpolate_within<T: VectorSpace>(
        &self,
        lattice: Lattice<'_>,
        f: impl FnMut(CellPoint<Self::Full>) -> T,
        curve: &impl Curve<f32>,
    ) -> T;
}

/// Represents a [`DomainCell`] that can be interpolated with the cubic basis over the 4 lattice points surrounding it on each axis.
pub trait CubicCell: DomainCell {
    /// Interpolates the `4^d` lattice points around this cell with [`cubic_mix`], `x` first.
    fn interpolate_cubic<T: VectorSpace>(
        &self,
        lattice: Lattice<'_>,
        f: impl FnMut(CellPoint<Self::Full>) -> T,
    ) -> T;
}

/// Represents a [`DomainCell`] with a neighborhood of adjacent cells.
pub trait NeighborhoodCell: DomainCell {
    /// Iterates the least corners of this cell and every cell touching it, `3^d` in all.
    fn iter_neighborhood(
        &self,
        lattice: Lattice<'_>,
    ) -> impl Iterator<Item = CellPoint<Self::Full>>;
}

/// Represents a point in some domain `T` that is relevant to a particular [`DomainCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPoint<T> {
    /// The feature slot this point hashes to.
    /// Slots for the same point always match, even if they are from different [`DomainCell`]s.
    pub slot: usize,
    /// Defines the offset of the sample point from this one.
    pub offset: T,
}

/// Represents a type that can partition some domain `T` into cells.
pub trait Partitioner<T: VectorSpace> {
    /// The [`DomainCell`] this partitioner produces.
    type Cell: DomainCell<Full = T>;

    /// Finds the cell containing `full`.
    fn partition(&self, full: T) -> Self::Cell;
}

/// Represents a grid square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSquare<F: VectorSpace, I> {
    /// The least corner of this grid square.
    pub floored: I,
    /// The positive offset from [`floored`](Self::floored) to the point in the grid square.
    pub offset: F,
}

/// A [`Partitioner`] that produces various [`GridSquare`]s.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Grid;

#[inline(always)]
fn corner_digit(index: usize, axis: usize) -> i32 {
    ((index >> axis) & 1) as i32
}

#[inline(always)]
fn stencil_digit(index: usize, axis: usize) -> i32 {
    ((index >> (axis * 2)) & 3) as i32 - 1
}

#[inline(always)]
fn neighbor_digit(mut index: usize, axis: usize) -> i32 {
    for _ in 0..axis {
        index /= 3;
    }
    (index % 3) as i32 - 1
}

/// Blends adjacent pairs, halving the values.
#[inline(always)]
fn fold_pairs<T: VectorSpace, const N: usize, const H: usize>(values: [T; N], t: f32) -> [T; H] {
    core::array::from_fn(|i| lerp(values[i * 2], values[i * 2 + 1], t))
}

/// Cubic mixes adjacent quads, quartering the values.
#[inline(always)]
fn fold_quads<T: VectorSpace, const N: usize, const Q: usize>(values: [T; N], t: f32) -> [T; Q] {
    core::array::from_fn(|i| {
        cubic_mix(
            values[i * 4],
            values[i * 4 + 1],
            values[i * 4 + 2],
            values[i * 4 + 3],
            t,
        )
    })
}

macro_rules! impl_grid {
    (
        $f:ty, $i:ident, $as_f:ident, $as_i:ident,
        corners: $corners:literal, stencil: $stencil:literal, neighbors: $neighbors:literal,
        pairs: [$($pn:literal => $ph:literal @ $pa:literal),*],
        quads: [$($qn:literal => $qh:literal @ $qa:literal),*]
    ) => {
        impl GridSquare<$f, $i> {
            #[inline]
            fn point_at_offset(&self, lattice: Lattice<'_>, offset: $i) -> CellPoint<$f> {
                CellPoint {
                    slot: lattice.slot(self.floored.wrapping_add(offset)),
                    offset: self.offset - offset.$as_f(),
                }
            }

            /// Maps each corner, with `x` varying fastest.
            #[inline]
            fn corners_map<T>(
                &self,
                lattice: Lattice<'_>,
                mut f: impl FnMut(CellPoint<$f>) -> T,
            ) -> [T; $corners] {
                core::array::from_fn(|i| {
                    let offset = $i::from_array(core::array::from_fn(|axis| corner_digit(i, axis)));
                    f(self.point_at_offset(lattice, offset))
                })
            }

            /// Maps each lattice point from `-1` to `2` on every axis, with `x` varying fastest.
            #[inline]
            fn stencil_map<T>(
                &self,
                lattice: Lattice<'_>,
                mut f: impl FnMut(CellPoint<$f>) -> T,
            ) -> [T; $stencil] {
                core::array::from_fn(|i| {
                    let offset = $i::from_array(core::array::from_fn(|axis| stencil_digit(i, axis)));
                    f(self.point_at_offset(lattice, offset))
                })
            }
        }

        impl DomainCell for GridSquare<$f, $i> {
            type Full = $f;

            #[inline]
            fn slot(&self, lattice: Lattice<'_>) -> usize {
                lattice.slot(self.floored)
            }

            #[inline]
            fn iter_points(&self, lattice: Lattice<'_>) -> impl Iterator<Item = CellPoint<Self::Full>> {
                self.corners_map(lattice, |p| p).into_iter()
            }
        }

        impl InterpolatableCell for GridSquare<$f, $i> {
            #[inline]
            fn interpolate_within<T: VectorSpace>(
                &self,
                lattice: Lattice<'_>,
                f: impl FnMut(CellPoint<Self::Full>) -> T,
                curve: &impl Curve<f32>,
            ) -> T {
                let values = self.corners_map(lattice, f);
                let fades = self.offset.to_array().map(|t| curve.sample_unchecked(t));
                $(let values: [T; $ph] = fold_pairs::<T, $pn, $ph>(values, fades[$pa]);)*
                let [value] = values;
                value
            }
        }

        impl CubicCell for GridSquare<$f, $i> {
            #[inline]
            fn interpolate_cubic<T: VectorSpace>(
                &self,
                lattice: Lattice<'_>,
                f: impl FnMut(CellPoint<Self::Full>) -> T,
            ) -> T {
                let values = self.stencil_map(lattice, f);
                let t = self.offset.to_array();
                $(let values: [T; $qh] = fold_quads::<T, $qn, $qh>(values, t[$qa]);)*
                let [value] = values;
                value
            }
        }

        impl NeighborhoodCell for GridSquare<$f, $i> {
            #[inline]
            fn iter_neighborhood(
                &self,
                lattice: Lattice<'_>,
            ) -> impl Iterator<Item = CellPoint<Self::Full>> {
                let cell = *self;
                (0..$neighbors).map(move |i| {
                    let offset = $i::from_array(core::array::from_fn(|axis| neighbor_digit(i, axis)));
                    cell.point_at_offset(lattice, offset)
                })
            }
        }

        impl Partitioner<$f> for Grid {
            type Cell = GridSquare<$f, $i>;

            #[inline]
            fn partition(&self, full: $f) -> Self::Cell {
                let floor = full.floor();
                GridSquare {
                    floored: floor.$as_i(),
                    offset: full - floor,
                }
            }
        }
    };
}

impl_grid!(
    Vec2, IVec2, as_vec2, as_ivec2,
    corners: 4, stencil: 16, neighbors: 9,
    pairs: [4 => 2 @ 0, 2 => 1 @ 1],
    quads: [16 => 4 @ 0, 4 => 1 @ 1]
);
impl_grid!(
    Vec3, IVec3, as_vec3, as_ivec3,
    corners: 8, stencil: 64, neighbors: 27,
    pairs: [8 => 4 @ 0, 4 => 2 @ 1, 2 => 1 @ 2],
    quads: [64 => 16 @ 0, 16 => 4 @ 1, 4 => 1 @ 2]
);
impl_grid!(
    Vec4, IVec4, as_vec4, as_ivec4,
    corners: 16, stencil: 256, neighbors: 81,
    pairs: [16 => 8 @ 0, 8 => 4 @ 1, 4 => 2 @ 2, 2 => 1 @ 3],
    quads: [256 => 64 @ 0, 64 => 16 @ 1, 16 => 4 @ 2, 4 => 1 @ 3]
);

/// A [`Partitioner`] that skews space into simplices: triangles in 2d, tetrahedra in 3d, and so on.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct SimplexGrid;

/// Represents a simplex from a [`SimplexGrid`].
///
/// The corners form a chain from [`base`](Self::base): each steps one unit along the next axis of [`order`](Self::order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexCell<F: VectorSpace, I, const D: usize> {
    /// The least corner of the skewed cell containing this simplex.
    pub base: I,
    /// The unskewed offset from [`base`](Self::base) to the sample.
    pub offset: F,
    /// The axes in the order the corner chain steps along them.
    pub order: [u8; D],
}

/// Skews space into the simplex lattice: `(√(d+1) - 1) / d`.
pub const SKEW_2D: f32 = 0.366_025_42;
/// Unskews the simplex lattice: `(1 - 1/√(d+1)) / d`.
pub const UNSKEW_2D: f32 = 0.211_324_87;
/// See [`SKEW_2D`].
pub const SKEW_3D: f32 = 1.0 / 3.0;
/// See [`UNSKEW_2D`].
pub const UNSKEW_3D: f32 = 1.0 / 6.0;
/// See [`SKEW_2D`].
pub const SKEW_4D: f32 = 0.309_017;
/// See [`UNSKEW_2D`].
pub const UNSKEW_4D: f32 = 0.138_196_6;

/// The largest magnitude [`SimplexGrid`] partitions on each axis. Inputs beyond it are clamped.
/// Skewing the sum of every axis at this size stays finite and inside the `i32` lattice.
pub const SIMPLEX_DOMAIN_LIMIT: f32 = (1u32 << 29) as f32;

/// Corner orders for 2d, indexed by whether `x > y`.
pub const SIMPLEX_ORDER_2D: [[u8; 2]; 2] = [[1, 0], [0, 1]];

/// Corner orders for 3d.
/// Bit `k` of the index is set when the first axis of pair `k` is greater,
/// with pairs ordered `(x, y), (x, z), (y, z)`.
/// Contradictory patterns can't occur and hold the identity.
pub const SIMPLEX_ORDER_3D: [[u8; 3]; 8] = [
    [2, 1, 0], [2, 0, 1], [0, 1, 2], [0, 2, 1],
    [1, 2, 0], [0, 1, 2], [1, 0, 2], [0, 1, 2],
];

/// Corner orders for 4d, indexed like [`SIMPLEX_ORDER_3D`]
/// with pairs `(x, y), (x, z), (x, w), (y, z), (y, w), (z, w)`.
#[rustfmt::skip]
pub const SIMPLEX_ORDER_4D: [[u8; 4]; 64] = [
    [3, 2, 1, 0], [3, 2, 0, 1], [0, 1, 2, 3], [3, 0, 2, 1],
    [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3], [0, 3, 2, 1],
    [3, 1, 2, 0], [0, 1, 2, 3], [3, 1, 0, 2], [3, 0, 1, 2],
    [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3], [0, 3, 1, 2],
    [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3],
    [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3],
    [1, 3, 2, 0], [0, 1, 2, 3], [1, 3, 0, 2], [0, 1, 2, 3],
    [0, 1, 2, 3], [0, 1, 2, 3], [1, 0, 3, 2], [0, 1, 3, 2],
    [2, 3, 1, 0], [2, 3, 0, 1], [0, 1, 2, 3], [0, 1, 2, 3],
    [0, 1, 2, 3], [2, 0, 3, 1], [0, 1, 2, 3], [0, 2, 3, 1],
    [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3],
    [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3],
    [2, 1, 3, 0], [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3],
    [2, 1, 0, 3], [2, 0, 1, 3], [0, 1, 2, 3], [0, 2, 1, 3],
    [1, 2, 3, 0], [0, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3],
    [1, 2, 0, 3], [0, 1, 2, 3], [1, 0, 2, 3], [0, 1, 2, 3],
];

/// Builds the index into a corner order table from pairwise axis comparisons.
#[inline(always)]
fn comparison_bits<const D: usize>(offset: [f32; D]) -> usize {
    let mut bits = 0;
    let mut k = 0;
    for a in 0..D {
        for b in (a + 1)..D {
            if offset[a] > offset[b] {
                bits |= 1 << k;
            }
            k += 1;
        }
    }
    bits
}

macro_rules! impl_simplex {
    ($f:ty, $i:ident, $as_f:ident, $as_i:ident, $d:literal, $skew:expr, $unskew:expr, $table:expr) => {
        impl SimplexCell<$f, $i, $d> {
            /// The offset of corner `k` from the base, before unskewing.
            #[inline]
            fn corner(&self, k: usize) -> $i {
                let mut corner = $i::ZERO;
                for &axis in &self.order[..k] {
                    corner[axis as usize] = 1;
                }
                corner
            }

            #[inline]
            fn corners_map<T>(
                &self,
                lattice: Lattice<'_>,
                mut f: impl FnMut(CellPoint<$f>) -> T,
            ) -> [T; $d + 1] {
                core::array::from_fn(|k| {
                    let corner = self.corner(k);
                    f(CellPoint {
                        slot: lattice.slot(self.base.wrapping_add(corner)),
                        offset: self.offset - corner.$as_f() + k as f32 * $unskew,
                    })
                })
            }
        }

        impl DomainCell for SimplexCell<$f, $i, $d> {
            type Full = $f;

            #[inline]
            fn slot(&self, lattice: Lattice<'_>) -> usize {
                lattice.slot(self.base)
            }

            #[inline]
            fn iter_points(&self, lattice: Lattice<'_>) -> impl Iterator<Item = CellPoint<Self::Full>> {
                self.corners_map(lattice, |p| p).into_iter()
            }
        }

        impl Partitioner<$f> for SimplexGrid {
            type Cell = SimplexCell<$f, $i, $d>;

            #[inline]
            fn partition(&self, full: $f) -> Self::Cell {
                let full = full.clamp(
                    <$f>::splat(-SIMPLEX_DOMAIN_LIMIT),
                    <$f>::splat(SIMPLEX_DOMAIN_LIMIT),
                );
                let skewed = full + full.element_sum() * $skew;
                let base = skewed.floor();
                let offset = full - base + base.element_sum() * $unskew;
                SimplexCell {
                    base: base.$as_i(),
                    offset,
                    order: $table[comparison_bits(offset.to_array())],
                }
            }
        }
    };
}

impl_simplex!(Vec2, IVec2, as_vec2, as_ivec2, 2, SKEW_2D, UNSKEW_2D, SIMPLEX_ORDER_2D);
impl_simplex!(Vec3, IVec3, as_vec3, as_ivec3, 3, SKEW_3D, UNSKEW_3D, SIMPLEX_ORDER_3D);
impl_simplex!(Vec4, IVec4, as_vec4, as_ivec4, 4, SKEW_4D, UNSKEW_4D, SIMPLEX_ORDER_4D);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{curves::Linear, tables::NoiseTables};
    use alloc::vec::Vec;

    fn permutations(items: &[u8]) -> Vec<Vec<u8>> {
        if items.len() <= 1 {
            return alloc::vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for (i, &first) in items.iter().enumerate() {
            let mut rest = items.to_vec();
            rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, first);
                out.push(tail);
            }
        }
        out
    }

    /// Builds an offset whose axes are ranked by `descending`, largest first.
    fn ranked_offset<const D: usize>(descending: &[u8]) -> [f32; D] {
        let mut offset = [0.0; D];
        for (rank, &axis) in descending.iter().enumerate() {
            offset[axis as usize] = 0.9 - 0.2 * rank as f32;
        }
        offset
    }

    fn assert_valid_chain<const D: usize>(order: [u8; D]) {
        let mut seen = [false; D];
        for axis in order {
            assert!(!seen[axis as usize], "{order:?} steps along an axis twice");
            seen[axis as usize] = true;
        }
    }

    #[test]
    fn simplex_orders_cover_every_ranking() {
        for ranking in permutations(&[0, 1]) {
            let order = SIMPLEX_ORDER_2D[comparison_bits(ranked_offset::<2>(&ranking))];
            assert_eq!(order.as_slice(), ranking.as_slice());
        }
        let rankings_3d = permutations(&[0, 1, 2]);
        assert_eq!(rankings_3d.len(), 6);
        for ranking in rankings_3d {
            let order = SIMPLEX_ORDER_3D[comparison_bits(ranked_offset::<3>(&ranking))];
            assert_valid_chain(order);
            assert_eq!(order.as_slice(), ranking.as_slice());
        }
        let rankings_4d = permutations(&[0, 1, 2, 3]);
        assert_eq!(rankings_4d.len(), 24);
        for ranking in rankings_4d {
            let order = SIMPLEX_ORDER_4D[comparison_bits(ranked_offset::<4>(&ranking))];
            assert_valid_chain(order);
            assert_eq!(order.as_slice(), ranking.as_slice());
        }
        for order in SIMPLEX_ORDER_4D {
            assert_valid_chain(order);
        }
    }

    #[test]
    fn simplex_corners_form_a_unit_chain() {
        let tables = NoiseTables::new(0, 64).unwrap();
        let lattice = tables.lattice(0);
        let cell = SimplexGrid.partition(Vec4::new(0.3, 1.7, -2.2, 0.9));
        let corners: Vec<IVec4> = (0..5).map(|k| cell.corner(k)).collect();
        assert_eq!(corners[0], IVec4::ZERO);
        assert_eq!(corners[4], IVec4::ONE);
        for pair in corners.windows(2) {
            assert_eq!((pair[1] - pair[0]).element_sum(), 1);
        }
        assert_eq!(cell.iter_points(lattice).count(), 5);

        // The sample is never further from its first corner than the skewed cell allows.
        let cell = SimplexGrid.partition(Vec3::new(-4.1, 2.6, 0.2));
        let first = cell.iter_points(lattice).next().unwrap();
        assert!(first.offset.length_squared() < 1.0);
    }

    #[test]
    fn simplex_partition_stays_finite_at_extremes() {
        for v in [1e10, 2_147_483_648.0, f32::MAX] {
            for sign in [1.0, -1.0] {
                let v = v * sign;
                let cell = SimplexGrid.partition(Vec2::new(v, -v));
                assert!(cell.offset.is_finite(), "2d offset at {v}: {}", cell.offset);
                let cell = SimplexGrid.partition(Vec3::splat(v));
                assert!(cell.offset.is_finite(), "3d offset at {v}: {}", cell.offset);
                let cell = SimplexGrid.partition(Vec4::splat(v));
                assert!(cell.offset.is_finite(), "4d offset at {v}: {}", cell.offset);
                assert_valid_chain(cell.order);
            }
        }
    }

    #[test]
    fn grid_partitions_negative_space() {
        let cell = Grid.partition(Vec2::new(-0.25, 3.5));
        assert_eq!(cell.floored, IVec2::new(-1, 3));
        assert_eq!(cell.offset, Vec2::new(0.75, 0.5));
    }

    #[test]
    fn grid_iterates_every_corner() {
        let tables = NoiseTables::new(1, 256).unwrap();
        let lattice = tables.lattice(0);
        let cell = Grid.partition(Vec3::new(5.5, 6.5, 7.5));
        let offsets: Vec<Vec3> = cell.iter_points(lattice).map(|p| p.offset).collect();
        assert_eq!(offsets.len(), 8);
        assert_eq!(offsets[0], Vec3::splat(0.5));
        assert_eq!(offsets[1], Vec3::new(-0.5, 0.5, 0.5));
        assert_eq!(offsets[7], Vec3::splat(-0.5));
        assert_eq!(cell.slot(lattice), lattice.slot(IVec3::new(5, 6, 7)));
        assert_eq!(cell.iter_neighborhood(lattice).count(), 27);
    }

    #[test]
    fn linear_interpolation_reproduces_planes() {
        let tables = NoiseTables::new(2, 256).unwrap();
        let lattice = tables.lattice(0);
        let at = Vec2::new(3.25, -1.75);
        let cell = Grid.partition(at);
        // Every corner reports its own position along a plane, so blending must land on the sample.
        let value = cell.interpolate_within(
            lattice,
            |p| {
                let corner = at - p.offset;
                corner.x * 2.0 + corner.y
            },
            &Linear,
        );
        assert!((value - (at.x * 2.0 + at.y)).abs() < 1e-5);
    }

    #[test]
    fn cubic_interpolation_hits_lattice_values() {
        let tables = NoiseTables::new(3, 256).unwrap();
        let lattice = tables.lattice(0);
        let cell = Grid.partition(Vec3::new(2.0, -3.0, 4.0));
        let value = cell.interpolate_cubic(lattice, |p| tables.scalars().get(p.slot));
        let expected = tables.scalars().get(lattice.slot(IVec3::new(2, -3, 4)));
        assert_eq!(value, expected);
    }
}
