//! Contains the lattice noise kernels: value, gradient (perlin), simplex, cubic, and worley.
//!
//! Each kernel partitions its input into [`DomainCell`]s and reads per-point features from the [`Lattice`] it is evaluated on.

use bevy_math::{Curve, Vec2, Vec3, Vec4, VectorSpace};

use crate::{
    NoiseFunction,
    cells::{CubicCell, DomainCell, InterpolatableCell, NeighborhoodCell, Partitioner},
    lengths::{EuclideanLength, LengthFunction},
    tables::{Lattice, LatticeVector},
};

/// A [`NoiseFunction`] that mixes scalar features by a [`Curve`] `C` within some [`DomainCell`] from a [`Partitioner`] `P`.
/// With the grid and quintic fade, this is value noise, already in [0, 1].
#[derive(Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct MixCellValues<P, C> {
    /// The [`Partitioner`].
    pub cells: P,
    /// The [`Curve`].
    pub curve: C,
}

impl<I: VectorSpace, P: Partitioner<I, Cell: InterpolatableCell>, C: Curve<f32>> NoiseFunction<I>
    for MixCellValues<P, C>
{
    type Output = f32;

    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        let scalars = lattice.tables().scalars();
        self.cells.partition(input).interpolate_within(
            lattice,
            |point| scalars.get(point.slot),
            &self.curve,
        )
    }
}

/// This trait facilitates looking up gradients and computing their dot products.
pub trait GradientGenerator<I: VectorSpace> {
    /// Gets the gradient at `slot`.
    fn get_gradient(&self, lattice: Lattice<'_>, slot: usize) -> I;

    /// Gets the dot product of `offset` with the gradient at `slot`.
    #[inline]
    fn get_gradient_dot(&self, lattice: Lattice<'_>, slot: usize, offset: I) -> f32
    where
        I: GradientDot,
    {
        self.get_gradient(lattice, slot).gradient_dot(offset)
    }

    /// Scales gradient dots interpolated across a unit grid cell into [-1, 1].
    fn interpolated_dot_scale(&self) -> f32;
}

/// Vectors that can take a dot product.
pub trait GradientDot: VectorSpace {
    /// The dot product.
    fn gradient_dot(self, other: Self) -> f32;
}

/// A [`GradientGenerator`] that reads unit gradients from the [`NoiseTables`](crate::tables::NoiseTables).
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct TableGradients;

macro_rules! impl_table_gradients {
    ($t:ty, $scale:expr) => {
        impl GradientDot for $t {
            #[inline]
            fn gradient_dot(self, other: Self) -> f32 {
                self.dot(other)
            }
        }

        impl GradientGenerator<$t> for TableGradients {
            #[inline]
            fn get_gradient(&self, lattice: Lattice<'_>, slot: usize) -> $t {
                lattice.tables().gradients::<$t>().get(slot)
            }

            #[inline]
            fn interpolated_dot_scale(&self) -> f32 {
                $scale
            }
        }
    };
}

// A unit gradient dotted with an offset inside the cell reaches at most `√d / 2` after interpolation.
impl_table_gradients!(Vec2, core::f32::consts::SQRT_2);
impl_table_gradients!(Vec3, 1.154_700_5);
impl_table_gradients!(Vec4, 1.0);

/// A [`NoiseFunction`] that integrates gradients sourced from a [`GradientGenerator`] `G` by a [`Curve`] `C` within some [`DomainCell`] from a [`Partitioner`] `P`.
/// With the grid and quintic fade, this is perlin noise, in [-1, 1].
///
/// Corners are hashed without the lattice channel, so every channel sees the same gradients.
#[derive(Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct MixCellGradients<P, C, G> {
    /// The [`Partitioner`].
    pub cells: P,
    /// The [`GradientGenerator`].
    pub gradients: G,
    /// The [`Curve`].
    pub curve: C,
}

impl<
    I: GradientDot,
    P: Partitioner<I, Cell: InterpolatableCell>,
    C: Curve<f32>,
    G: GradientGenerator<I>,
> NoiseFunction<I> for MixCellGradients<P, C, G>
{
    type Output = f32;

    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        let lattice = lattice.unscrambled();
        let raw = self.cells.partition(input).interpolate_within(
            lattice,
            |point| {
                self.gradients
                    .get_gradient_dot(lattice, point.slot, point.offset)
            },
            &self.curve,
        );
        (raw * self.gradients.interpolated_dot_scale()).clamp(-1.0, 1.0)
    }
}

/// Allows blending between different [`CellPoint`](crate::cells::CellPoint)s.
pub trait Blender<I: VectorSpace> {
    /// Weighs the `value` by the offset of the sampled point to the point that generated the value.
    ///
    /// Usually this will scale the `value` based on the length of `offset`.
    fn weigh_value(&self, value: f32, offset: I) -> f32;

    /// When the value is computed as the dot product of the `offset` passed to [`weigh_value`](Blender::weigh_value), the value is already weighted to some extent.
    /// This counteracts that weight by operating on the already weighted value, mapping it into roughly [-1, 1].
    fn counter_dot_product(&self, value: f32) -> f32;

    /// Given some weighted values, combines them into one.
    fn collect_weighted(&self, weighed: impl Iterator<Item = f32>) -> f32;
}

/// A [`NoiseFunction`] that blends gradients sourced from a [`GradientGenerator`] `G` by a [`Blender`] `B` within some [`DomainCell`] from a [`Partitioner`] `P`.
/// With the simplex grid and [`SimplecticBlend`], this is simplex noise, in [-1, 1].
///
/// Unlike [`MixCellGradients`], corners are hashed on the lattice channel.
#[derive(Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct BlendCellGradients<P, B, G> {
    /// The [`Partitioner`].
    pub cells: P,
    /// The [`GradientGenerator`].
    pub gradients: G,
    /// The [`Blender`].
    pub blender: B,
}

impl<I: GradientDot, P: Partitioner<I>, B: Blender<I>, G: GradientGenerator<I>> NoiseFunction<I>
    for BlendCellGradients<P, B, G>
{
    type Output = f32;

    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        let segment = self.cells.partition(input);
        let weighted = segment.iter_points(lattice).map(|p| {
            let dot = self.gradients.get_gradient_dot(lattice, p.slot, p.offset);
            self.blender.weigh_value(dot, p.offset)
        });
        self.blender
            .counter_dot_product(self.blender.collect_weighted(weighted))
            .clamp(-1.0, 1.0)
    }
}

/// A [`Blender`] for [`SimplexGrid`](crate::cells::SimplexGrid).
/// Each corner contributes `t⁴` of its value, where `t` is the squared falloff radius less the squared distance to it.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct SimplecticBlend;

impl SimplecticBlend {
    /// The squared falloff radius in 2d.
    pub const RADIUS_SQUARED_2D: f32 = 0.5;
    /// The squared falloff radius in 3d and 4d.
    pub const RADIUS_SQUARED: f32 = 0.6;
    /// Normalizes 2d sums of unit gradient contributions.
    pub const NORMALIZER_2D: f32 = 99.836_85;
    /// Normalizes 3d sums: `32√2`, since the gradients are unit length instead of `√2`.
    pub const NORMALIZER_3D: f32 = 45.254_834;
    /// Normalizes 4d sums: `27√3`, since the gradients are unit length instead of `√3`.
    pub const NORMALIZER_4D: f32 = 46.765_37;
}

#[inline]
fn general_simplex_weight(radius_sqrd: f32, length_sqrd: f32) -> f32 {
    let t = radius_sqrd - length_sqrd;
    if t <= 0.0 {
        0.0
    } else {
        let s = t * t;
        s * s
    }
}

macro_rules! impl_simplectic_blend {
    ($t:ty, $radius:expr, $normalizer:expr) => {
        impl Blender<$t> for SimplecticBlend {
            #[inline]
            fn weigh_value(&self, value: f32, offset: $t) -> f32 {
                value * general_simplex_weight($radius, offset.length_squared())
            }

            #[inline]
            fn collect_weighted(&self, weighed: impl Iterator<Item = f32>) -> f32 {
                weighed.sum()
            }

            #[inline]
            fn counter_dot_product(&self, value: f32) -> f32 {
                value * $normalizer
            }
        }
    };
}

impl_simplectic_blend!(
    Vec2,
    SimplecticBlend::RADIUS_SQUARED_2D,
    SimplecticBlend::NORMALIZER_2D
);
impl_simplectic_blend!(
    Vec3,
    SimplecticBlend::RADIUS_SQUARED,
    SimplecticBlend::NORMALIZER_3D
);
impl_simplectic_blend!(
    Vec4,
    SimplecticBlend::RADIUS_SQUARED,
    SimplecticBlend::NORMALIZER_4D
);

/// A [`NoiseFunction`] that interpolates scalar features with the cubic basis over the `4^d` lattice points around each [`CubicCell`].
/// This is cubic noise, renormalized into [0, 1].
#[derive(Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct CubicCellValues<P> {
    /// The [`Partitioner`].
    pub cells: P,
}

impl<P> CubicCellValues<P> {
    /// The lowest raw value the cubic basis is expected to reach over features in [0, 1].
    pub const RAW_MIN: f32 = -0.3;
    /// The width of the expected raw range, from [`RAW_MIN`](Self::RAW_MIN) to 1.3.
    pub const RAW_RANGE: f32 = 1.6;
}

impl<I: VectorSpace, P: Partitioner<I, Cell: CubicCell>> NoiseFunction<I> for CubicCellValues<P> {
    type Output = f32;

    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        let scalars = lattice.tables().scalars();
        let raw = self
            .cells
            .partition(input)
            .interpolate_cubic(lattice, |point| scalars.get(point.slot));
        ((raw - Self::RAW_MIN) / Self::RAW_RANGE).clamp(0.0, 1.0)
    }
}

/// Selects which distance [`WorleyPointDistance`] reports.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum WorleyMode {
    /// The distance to the nearest feature point.
    #[default]
    Nearest,
    /// The distance to the second nearest feature point.
    SecondNearest,
}

impl WorleyMode {
    /// The `(scale, offset)` that maps raw distances of this mode in `dimension` dimensions into roughly [0, 1].
    /// These were tuned per combination; there is no formula behind them.
    pub const fn remap(self, dimension: u8) -> (f32, f32) {
        match (self, dimension) {
            (Self::Nearest, 2) => (0.8, 0.0),
            (Self::Nearest, 3) => (0.65, 0.0),
            (Self::Nearest, _) => (0.55, 0.0),
            (Self::SecondNearest, 2) => (0.7, -0.1),
            (Self::SecondNearest, 3) => (0.6, -0.1),
            (Self::SecondNearest, _) => (0.5, -0.1),
        }
    }
}

/// A [`NoiseFunction`] that finds distances to jittered feature points in the neighborhood of each [`NeighborhoodCell`].
/// This is worley, or cellular, noise.
///
/// Each cell owns one feature point, read from the point table at the cell's slot.
/// Candidates are ranked by [`LengthFunction::length_ordering`]: one closer than the nearest demotes the nearest to second nearest,
/// and one only closer than the second nearest replaces it.
#[derive(Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct WorleyPointDistance<P, L = EuclideanLength> {
    /// The [`Partitioner`].
    pub cells: P,
    /// The [`LengthFunction`] to measure distances by.
    pub length: L,
    /// Which distance to report.
    pub mode: WorleyMode,
}

impl<P, L> WorleyPointDistance<P, L> {
    /// Sets the [`WorleyMode`].
    pub fn with_mode(mut self, mode: WorleyMode) -> Self {
        self.mode = mode;
        self
    }

    /// The raw distances to the nearest and second nearest feature points around `input`.
    #[inline]
    pub fn distances<I>(&self, input: I, lattice: Lattice<'_>) -> [f32; 2]
    where
        I: LatticeVector + VectorSpace,
        P: Partitioner<I, Cell: NeighborhoodCell>,
        L: LengthFunction<I>,
    {
        let points = lattice.tables().points::<I>();
        let mut nearest = f32::INFINITY;
        let mut second = f32::INFINITY;
        for point in self.cells.partition(input).iter_neighborhood(lattice) {
            let ordering = self
                .length
                .length_ordering(point.offset - points.get(point.slot));
            if ordering < nearest {
                second = nearest;
                nearest = ordering;
            } else if ordering < second {
                second = ordering;
            }
        }
        [
            self.length.length_from_ordering(nearest),
            self.length.length_from_ordering(second),
        ]
    }
}

impl<
    I: LatticeVector + VectorSpace,
    P: Partitioner<I, Cell: NeighborhoodCell>,
    L: LengthFunction<I>,
> NoiseFunction<I> for WorleyPointDistance<P, L>
{
    type Output = f32;

    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        let [nearest, second] = self.distances(input, lattice);
        let distance = match self.mode {
            WorleyMode::Nearest => nearest,
            WorleyMode::SecondNearest => second,
        };
        let (scale, offset) = self.mode.remap(I::DIMENSION);
        (distance * scale + offset).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{prelude::common_noise, tables::NoiseTables};
    use bevy_math::{IVec2, IVec3, IVec4};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_vec2(rng: &mut ChaCha8Rng) -> Vec2 {
        Vec2::new(
            rng.random_range(-1000.0..1000.0),
            rng.random_range(-1000.0..1000.0),
        )
    }

    fn random_vec3(rng: &mut ChaCha8Rng) -> Vec3 {
        random_vec2(rng).extend(rng.random_range(-1000.0..1000.0))
    }

    fn random_vec4(rng: &mut ChaCha8Rng) -> Vec4 {
        random_vec3(rng).extend(rng.random_range(-1000.0..1000.0))
    }

    fn assert_unorm<I: Copy + core::fmt::Debug>(
        name: &str,
        kernel: &impl NoiseFunction<I, Output = f32>,
        tables: &NoiseTables,
        mut position: impl FnMut(&mut ChaCha8Rng) -> I,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(0xDEC0DE);
        for _ in 0..10_000 {
            let at = position(&mut rng);
            let channel = rng.random_range(-64..64);
            let v = kernel.evaluate(at, tables.lattice(channel));
            assert!(
                (0.0..=1.0).contains(&v),
                "{name} gave {v} at {at:?} on channel {channel}"
            );
        }
    }

    #[test]
    fn every_kernel_stays_in_unit_range() {
        let tables = NoiseTables::new(1234, 256).unwrap();
        let worley_second =
            common_noise::Worley::default().with_mode(WorleyMode::SecondNearest);

        assert_unorm("value 2d", &common_noise::Value::default(), &tables, random_vec2);
        assert_unorm("perlin 2d", &common_noise::Perlin::default(), &tables, random_vec2);
        assert_unorm("simplex 2d", &common_noise::Simplex::default(), &tables, random_vec2);
        assert_unorm("cubic 2d", &common_noise::Cubic::default(), &tables, random_vec2);
        assert_unorm("worley 2d", &common_noise::Worley::default(), &tables, random_vec2);
        assert_unorm("worley second 2d", &worley_second, &tables, random_vec2);

        assert_unorm("value 3d", &common_noise::Value::default(), &tables, random_vec3);
        assert_unorm("perlin 3d", &common_noise::Perlin::default(), &tables, random_vec3);
        assert_unorm("simplex 3d", &common_noise::Simplex::default(), &tables, random_vec3);
        assert_unorm("cubic 3d", &common_noise::Cubic::default(), &tables, random_vec3);
        assert_unorm("worley 3d", &common_noise::Worley::default(), &tables, random_vec3);
        assert_unorm("worley second 3d", &worley_second, &tables, random_vec3);

        assert_unorm("value 4d", &common_noise::Value::default(), &tables, random_vec4);
        assert_unorm("perlin 4d", &common_noise::Perlin::default(), &tables, random_vec4);
        assert_unorm("simplex 4d", &common_noise::Simplex::default(), &tables, random_vec4);
        assert_unorm("cubic 4d", &common_noise::Cubic::default(), &tables, random_vec4);
        assert_unorm("worley 4d", &common_noise::Worley::default(), &tables, random_vec4);
        assert_unorm("worley second 4d", &worley_second, &tables, random_vec4);
    }

    #[test]
    fn every_kernel_stays_in_unit_range_at_extremes() {
        let tables = NoiseTables::new(4321, 256).unwrap();
        let worley_second =
            common_noise::Worley::default().with_mode(WorleyMode::SecondNearest);
        let mut extremes = alloc::vec::Vec::new();
        for v in [1e10, 2_147_483_648.0, f32::MAX] {
            extremes.extend([Vec4::splat(v), Vec4::splat(-v), Vec4::new(v, -v, v, -v)]);
        }
        let extremes = extremes.into_iter().flat_map(|v| [v, Vec4::new(v.y, v.x, v.w, v.z) * 0.5]);

        fn check<I: Copy + core::fmt::Debug>(
            name: &str,
            kernel: &impl NoiseFunction<I, Output = f32>,
            tables: &NoiseTables,
            at: I,
        ) {
            for channel in [0, 7] {
                let v = kernel.evaluate(at, tables.lattice(channel));
                assert!((0.0..=1.0).contains(&v), "{name} gave {v} at {at:?}");
            }
        }

        for at in extremes {
            let (v2, v3) = (at.truncate().truncate(), at.truncate());
            check("value 2d", &common_noise::Value::default(), &tables, v2);
            check("perlin 2d", &common_noise::Perlin::default(), &tables, v2);
            check("simplex 2d", &common_noise::Simplex::default(), &tables, v2);
            check("cubic 2d", &common_noise::Cubic::default(), &tables, v2);
            check("worley 2d", &common_noise::Worley::default(), &tables, v2);
            check("worley second 2d", &worley_second, &tables, v2);

            check("value 3d", &common_noise::Value::default(), &tables, v3);
            check("perlin 3d", &common_noise::Perlin::default(), &tables, v3);
            check("simplex 3d", &common_noise::Simplex::default(), &tables, v3);
            check("cubic 3d", &common_noise::Cubic::default(), &tables, v3);
            check("worley 3d", &common_noise::Worley::default(), &tables, v3);
            check("worley second 3d", &worley_second, &tables, v3);

            check("value 4d", &common_noise::Value::default(), &tables, at);
            check("perlin 4d", &common_noise::Perlin::default(), &tables, at);
            check("simplex 4d", &common_noise::Simplex::default(), &tables, at);
            check("cubic 4d", &common_noise::Cubic::default(), &tables, at);
            check("worley 4d", &common_noise::Worley::default(), &tables, at);
            check("worley second 4d", &worley_second, &tables, at);
        }
    }

    #[test]
    fn simplex_decorrelates_channels() {
        let tables = NoiseTables::new(13, 256).unwrap();
        let simplex = common_noise::Simplex::default();
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let differing = (0..100)
            .filter(|_| {
                let at = random_vec3(&mut rng);
                simplex.evaluate(at, tables.lattice(0)) != simplex.evaluate(at, tables.lattice(5))
            })
            .count();
        assert!(differing > 90, "only {differing} of 100 samples differ");
    }

    #[test]
    fn same_seed_same_noise() {
        let a = NoiseTables::new(99, 128).unwrap();
        let b = NoiseTables::new(99, 128).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            let at = random_vec3(&mut rng);
            let channel = rng.random_range(-8..8);
            let kernel = common_noise::Simplex::default();
            assert_eq!(
                kernel.evaluate(at, a.lattice(channel)),
                kernel.evaluate(at, b.lattice(channel))
            );
            let kernel = common_noise::Worley::default();
            assert_eq!(
                kernel.evaluate(at, a.lattice(channel)),
                kernel.evaluate(at, b.lattice(channel))
            );
        }
    }

    #[test]
    fn value_reproduces_features_at_lattice_points() {
        let tables = NoiseTables::new(7, 256).unwrap();
        let value = common_noise::Value::default();
        for channel in [0, 3, -11] {
            let lattice = tables.lattice(channel);
            for (x, y) in [(0, 0), (3, -2), (-40, 17)] {
                let expected = tables.scalars().get(lattice.slot(IVec2::new(x, y)));
                assert_eq!(
                    value.evaluate(Vec2::new(x as f32, y as f32), lattice),
                    expected
                );
            }
            let expected = tables
                .scalars()
                .get(lattice.slot(IVec4::new(1, -2, 3, -4)));
            assert_eq!(
                value.evaluate(Vec4::new(1.0, -2.0, 3.0, -4.0), lattice),
                expected
            );
        }
    }

    #[test]
    fn perlin_vanishes_at_lattice_points() {
        let tables = NoiseTables::new(8, 256).unwrap();
        let lattice = tables.lattice(0);
        let perlin = common_noise::Perlin::default();
        for at in [Vec2::ZERO, Vec2::new(5.0, -9.0), Vec2::new(-128.0, 77.0)] {
            assert_eq!(perlin.evaluate(at, lattice), 0.5);
        }
        assert_eq!(perlin.evaluate(Vec3::new(2.0, 2.0, -1.0), lattice), 0.5);
        assert_eq!(perlin.evaluate(Vec4::new(2.0, 0.0, -1.0, 6.0), lattice), 0.5);

        // Between lattice points, neighboring gradients contribute.
        let off_lattice = (0..16)
            .filter(|&i| perlin.evaluate(Vec2::new(i as f32 + 0.5, 0.25), lattice) != 0.5)
            .count();
        assert!(off_lattice > 12);
    }

    #[test]
    fn cubic_reproduces_features_at_lattice_points() {
        let tables = NoiseTables::new(9, 256).unwrap();
        let cubic = common_noise::Cubic::default();
        let lattice = tables.lattice(2);
        let scalar = tables.scalars().get(lattice.slot(IVec3::new(4, -6, 1)));
        let v = cubic.evaluate(Vec3::new(4.0, -6.0, 1.0), lattice);
        assert!((v - (scalar + 0.3) / 1.6).abs() < 1e-6);
    }

    #[test]
    fn worley_second_is_never_nearer() {
        let tables = NoiseTables::new(10, 256).unwrap();
        let worley = common_noise::Worley::default();
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        for _ in 0..2_000 {
            let channel = rng.random_range(-4..4);
            let lattice = tables.lattice(channel);
            let [n, s] = worley.distances(random_vec2(&mut rng), lattice);
            assert!(s >= n, "2d: {s} < {n}");
            let [n, s] = worley.distances(random_vec3(&mut rng), lattice);
            assert!(s >= n, "3d: {s} < {n}");
            let [n, s] = worley.distances(random_vec4(&mut rng), lattice);
            assert!(s >= n, "4d: {s} < {n}");
        }
    }

    #[test]
    fn worley_finds_its_own_cell_point() {
        let tables = NoiseTables::new(11, 256).unwrap();
        let lattice = tables.lattice(0);
        let worley = common_noise::Worley::default();
        let cell = IVec2::new(12, -3);
        let feature = cell.as_vec2() + tables.points::<Vec2>().get(lattice.slot(cell));
        let [nearest, _] = worley.distances(feature, lattice);
        assert!(nearest < 1e-4, "{nearest}");
        assert_eq!(worley.evaluate(feature, lattice), nearest * 0.8);
    }

    #[test]
    fn simplex_responds_to_position() {
        let tables = NoiseTables::new(12, 256).unwrap();
        let lattice = tables.lattice(0);
        let simplex = common_noise::Simplex::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut low = 1.0f32;
        let mut high = 0.0f32;
        for _ in 0..2_000 {
            let v = simplex.evaluate(random_vec2(&mut rng), lattice);
            low = low.min(v);
            high = high.max(v);
        }
        assert!(low < 0.3 && high > 0.7, "range was only {low}..{high}");
    }
}
