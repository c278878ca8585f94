//! Contains the permutation and feature tables every kernel is built on, and the hashing of lattice coordinates through them.
//!
//! A [`PermutationTable`] turns integer lattice coordinates into slots, and each [`FeatureTable`] holds the per-slot data
//! (scalars, unit gradients, or jittered points) a kernel reads at that slot.
//! [`NoiseTables`] bundles one of each from a single seed.

use alloc::vec::Vec;

use bevy_math::{IVec2, IVec3, IVec4, Vec2, Vec3, Vec4, ops};
use rand::RngCore;

use crate::{
    error::NoiseError,
    rng::{NoiseRng, NoiseRngExt},
};

/// The smallest supported table size.
pub const MIN_TABLE_SIZE: usize = 2;
/// The largest supported table size.
pub const MAX_TABLE_SIZE: usize = 512;
/// The table size used when none is specified.
pub const DEFAULT_TABLE_SIZE: usize = 256;

/// Returns `size` if it is a power of two within [`MIN_TABLE_SIZE`]..=[`MAX_TABLE_SIZE`].
#[inline]
pub fn validate_table_size(size: usize) -> Result<usize, NoiseError> {
    if size.is_power_of_two() && (MIN_TABLE_SIZE..=MAX_TABLE_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(NoiseError::InvalidTableSize(size))
    }
}

/// A seeded bijection over `0..size`, stored twice back to back.
///
/// The second copy means nested lookups like `table[table[x] + y]` never need to wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationTable {
    table: Vec<u16>,
    mask: usize,
}

impl PermutationTable {
    /// Builds a table of `size` from a [`NoiseRng`] seeded with `seed`.
    pub fn new(seed: u64, size: usize) -> Result<Self, NoiseError> {
        Self::build_with(&mut NoiseRng::new(seed), size)
    }

    /// Builds a table of `size`, drawing the shuffle from `rng`.
    pub fn build_with(rng: &mut impl RngCore, size: usize) -> Result<Self, NoiseError> {
        let size = validate_table_size(size)?;
        let mut table = Vec::with_capacity(size * 2);
        Self::fill(&mut table, size, rng);
        tracing::debug!(size, "built permutation table");
        Ok(Self {
            table,
            mask: size - 1,
        })
    }

    /// Rebuilds this table in place with a new shuffle from `rng`, keeping its size.
    pub fn reseed(&mut self, rng: &mut impl RngCore) {
        let size = self.size();
        self.table.clear();
        Self::fill(&mut self.table, size, rng);
        tracing::debug!(size, "reseeded permutation table");
    }

    /// Identity, then a single forward Fisher-Yates pass, then the duplicate.
    fn fill(table: &mut Vec<u16>, size: usize, rng: &mut impl RngCore) {
        table.extend((0..size).map(|i| i as u16));
        for i in 0..size {
            let j = rng.next_index(size);
            table.swap(i, j);
        }
        table.extend_from_within(..);
    }

    /// The number of distinct values, `N`.
    #[inline]
    pub fn size(&self) -> usize {
        self.mask + 1
    }

    /// `N - 1`, applied to every coordinate before lookup.
    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// The full `2N` table, for uploading to some other backend.
    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.table
    }

    /// Looks up a single coordinate.
    #[inline]
    pub fn lookup1(&self, x: i32) -> usize {
        self.table[x as usize & self.mask] as usize
    }

    /// Looks up a 2d coordinate by folding `y` into the lookup of `x`.
    #[inline]
    pub fn lookup2(&self, x: i32, y: i32) -> usize {
        self.table[self.lookup1(x) + (y as usize & self.mask)] as usize
    }

    /// Looks up a 3d coordinate by folding `z` into the lookup of `(x, y)`.
    #[inline]
    pub fn lookup3(&self, x: i32, y: i32, z: i32) -> usize {
        self.table[self.lookup2(x, y) + (z as usize & self.mask)] as usize
    }

    /// Looks up a 4d coordinate by folding `w` into the lookup of `(x, y, z)`.
    #[inline]
    pub fn lookup4(&self, x: i32, y: i32, z: i32, w: i32) -> usize {
        self.table[self.lookup3(x, y, z) + (w as usize & self.mask)] as usize
    }
}

/// Something that can be stored per slot in a [`FeatureTable`].
pub trait Feature: Copy {
    /// How many `f32`s this takes when flattened.
    const COMPONENTS: usize;

    /// Appends the components of this feature to `out`.
    fn write_components(self, out: &mut Vec<f32>);
}

impl Feature for f32 {
    const COMPONENTS: usize = 1;

    #[inline]
    fn write_components(self, out: &mut Vec<f32>) {
        out.push(self);
    }
}

macro_rules! impl_vector_feature {
    ($t:ty, $n:expr) => {
        impl Feature for $t {
            const COMPONENTS: usize = $n;

            #[inline]
            fn write_components(self, out: &mut Vec<f32>) {
                out.extend_from_slice(&self.to_array());
            }
        }
    };
}

impl_vector_feature!(Vec2, 2);
impl_vector_feature!(Vec3, 3);
impl_vector_feature!(Vec4, 4);

/// Per-slot data, one entry for each value of a [`PermutationTable`].
/// This is only ever indexed through permutation lookups, never by coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable<T> {
    slots: Vec<T>,
}

impl<T: Feature> FeatureTable<T> {
    /// Creates a table from `n` successive calls to `f`.
    fn generate(n: usize, f: impl FnMut(usize) -> T) -> Self {
        Self {
            slots: (0..n).map(f).collect(),
        }
    }

    /// The number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Gets the feature at `slot`.
    #[inline]
    pub fn get(&self, slot: usize) -> T {
        self.slots[slot]
    }

    /// All the slots.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }

    /// All the slots' components interleaved into one buffer.
    pub fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.slots.len() * T::COMPONENTS);
        for slot in &self.slots {
            slot.write_components(&mut out);
        }
        out
    }
}

impl FeatureTable<f32> {
    /// `n` independent uniform values in [0, 1).
    pub fn scalars(rng: &mut impl RngCore, n: usize) -> Self {
        Self::generate(n, |_| rng.next_unorm())
    }
}

impl FeatureTable<Vec2> {
    /// `n` unit vectors evenly spaced around the circle; slot `i` points at angle `2πi/n`.
    /// This uses no randomness.
    pub fn unit_vectors(n: usize) -> Self {
        Self::generate(n, |i| {
            let angle = core::f32::consts::TAU * i as f32 / n as f32;
            let (sin, cos) = ops::sin_cos(angle);
            Vec2::new(cos, sin)
        })
    }

    /// `n` independent uniform points in [0, 1)^2.
    pub fn random_points(rng: &mut impl RngCore, n: usize) -> Self {
        Self::generate(n, |_| Vec2::new(rng.next_unorm(), rng.next_unorm()))
    }
}

/// A direction on the sphere from explicit azimuth and inclination draws.
#[inline]
fn sphere_direction(rng: &mut impl RngCore) -> Vec3 {
    let azimuth = core::f32::consts::TAU * rng.next_unorm();
    let inclination = ops::acos(2.0 * rng.next_unorm() - 1.0);
    let (sin_a, cos_a) = ops::sin_cos(azimuth);
    let (sin_i, cos_i) = ops::sin_cos(inclination);
    Vec3::new(sin_i * cos_a, sin_i * sin_a, cos_i)
}

impl FeatureTable<Vec3> {
    /// `n` random unit vectors from independent angle draws.
    ///
    /// The inclination goes through `acos`, which is steep near the poles,
    /// so f32 rounding leaves density there slightly uneven.
    pub fn unit_vectors(rng: &mut impl RngCore, n: usize) -> Self {
        Self::generate(n, |_| sphere_direction(rng))
    }

    /// `n` independent uniform points in [0, 1)^3.
    pub fn random_points(rng: &mut impl RngCore, n: usize) -> Self {
        Self::generate(n, |_| {
            Vec3::new(rng.next_unorm(), rng.next_unorm(), rng.next_unorm())
        })
    }
}

impl FeatureTable<Vec4> {
    /// `n` random unit vectors from independent angle draws.
    ///
    /// This extends [`FeatureTable::<Vec3>::unit_vectors`] by one more `acos` angle.
    /// That is not uniform on the 3-sphere: directions bunch toward the `w` poles.
    pub fn unit_vectors(rng: &mut impl RngCore, n: usize) -> Self {
        Self::generate(n, |_| {
            let direction = sphere_direction(rng);
            let hyper = ops::acos(2.0 * rng.next_unorm() - 1.0);
            let (sin_h, cos_h) = ops::sin_cos(hyper);
            (direction * sin_h).extend(cos_h)
        })
    }

    /// `n` independent uniform points in [0, 1)^4.
    pub fn random_points(rng: &mut impl RngCore, n: usize) -> Self {
        Self::generate(n, |_| {
            Vec4::new(
                rng.next_unorm(),
                rng.next_unorm(),
                rng.next_unorm(),
                rng.next_unorm(),
            )
        })
    }
}

/// What a kernel reads from a [`FeatureTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureKind {
    /// Scalars in [0, 1).
    Scalar,
    /// Unit length gradients.
    UnitVector,
    /// Jittered points in [0, 1)^d.
    Point,
}

/// The layout of the feature table a kernel needs, so a backend can size its buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureShape {
    /// What each slot holds.
    pub kind: FeatureKind,
    /// How many `f32`s each slot holds.
    pub components: u8,
}

/// A permutation table and every kind of feature table, all of the same size and built from one rng.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTables {
    permutation: PermutationTable,
    scalars: FeatureTable<f32>,
    gradients_2d: FeatureTable<Vec2>,
    gradients_3d: FeatureTable<Vec3>,
    gradients_4d: FeatureTable<Vec4>,
    points_2d: FeatureTable<Vec2>,
    points_3d: FeatureTable<Vec3>,
    points_4d: FeatureTable<Vec4>,
}

impl NoiseTables {
    /// Builds tables of `size` from a [`NoiseRng`] seeded with `seed`.
    pub fn new(seed: u64, size: usize) -> Result<Self, NoiseError> {
        tracing::debug!(seed, size, "building noise tables");
        Self::build_with(&mut NoiseRng::new(seed), size)
    }

    /// Builds tables of `size` from a system seeded [`NoiseRng`].
    #[cfg(feature = "std")]
    pub fn from_entropy(size: usize) -> Result<Self, NoiseError> {
        Self::build_with(&mut NoiseRng::from_entropy(), size)
    }

    /// Builds tables of `size`, drawing everything from `rng` in a fixed order:
    /// the permutation, scalars, 3d then 4d gradients, then 2d, 3d and 4d points.
    pub fn build_with(rng: &mut impl RngCore, size: usize) -> Result<Self, NoiseError> {
        let permutation = PermutationTable::build_with(rng, size)?;
        let scalars = FeatureTable::scalars(rng, size);
        let gradients_2d = FeatureTable::<Vec2>::unit_vectors(size);
        let gradients_3d = FeatureTable::<Vec3>::unit_vectors(rng, size);
        let gradients_4d = FeatureTable::<Vec4>::unit_vectors(rng, size);
        let points_2d = FeatureTable::<Vec2>::random_points(rng, size);
        let points_3d = FeatureTable::<Vec3>::random_points(rng, size);
        let points_4d = FeatureTable::<Vec4>::random_points(rng, size);
        Ok(Self {
            permutation,
            scalars,
            gradients_2d,
            gradients_3d,
            gradients_4d,
            points_2d,
            points_3d,
            points_4d,
        })
    }

    /// The shared table size, `N`.
    #[inline]
    pub fn size(&self) -> usize {
        self.permutation.size()
    }

    /// The [`PermutationTable`].
    #[inline]
    pub fn permutation(&self) -> &PermutationTable {
        &self.permutation
    }

    /// The scalar [`FeatureTable`], used by value and cubic noise.
    #[inline]
    pub fn scalars(&self) -> &FeatureTable<f32> {
        &self.scalars
    }

    /// The unit gradient [`FeatureTable`] for vectors of type `V`.
    #[inline]
    pub fn gradients<V: LatticeVector>(&self) -> &FeatureTable<V> {
        V::gradients(self)
    }

    /// The jittered point [`FeatureTable`] for vectors of type `V`.
    #[inline]
    pub fn points<V: LatticeVector>(&self) -> &FeatureTable<V> {
        V::points(self)
    }

    /// A [`Lattice`] over these tables on `channel`.
    #[inline]
    pub fn lattice(&self, channel: i32) -> Lattice<'_> {
        Lattice::new(self, channel)
    }
}

/// A vector type with gradient and point tables in [`NoiseTables`].
pub trait LatticeVector: Feature {
    /// The integer coordinate of a lattice point of this dimension.
    type Coord: LatticeCoord;
    /// The number of dimensions.
    const DIMENSION: u8;

    /// Selects this dimension's gradients.
    fn gradients(tables: &NoiseTables) -> &FeatureTable<Self>;
    /// Selects this dimension's points.
    fn points(tables: &NoiseTables) -> &FeatureTable<Self>;
}

impl LatticeVector for Vec2 {
    type Coord = IVec2;
    const DIMENSION: u8 = 2;

    #[inline]
    fn gradients(tables: &NoiseTables) -> &FeatureTable<Self> {
        &tables.gradients_2d
    }

    #[inline]
    fn points(tables: &NoiseTables) -> &FeatureTable<Self> {
        &tables.points_2d
    }
}

impl LatticeVector for Vec3 {
    type Coord = IVec3;
    const DIMENSION: u8 = 3;

    #[inline]
    fn gradients(tables: &NoiseTables) -> &FeatureTable<Self> {
        &tables.gradients_3d
    }

    #[inline]
    fn points(tables: &NoiseTables) -> &FeatureTable<Self> {
        &tables.points_3d
    }
}

impl LatticeVector for Vec4 {
    type Coord = IVec4;
    const DIMENSION: u8 = 4;

    #[inline]
    fn gradients(tables: &NoiseTables) -> &FeatureTable<Self> {
        &tables.gradients_4d
    }

    #[inline]
    fn points(tables: &NoiseTables) -> &FeatureTable<Self> {
        &tables.points_4d
    }
}

/// Represents an integer lattice coordinate that can be hashed through a [`PermutationTable`].
pub trait LatticeCoord: Copy {
    /// Shifts every axis by a per-axis multiple of `channel`.
    fn scrambled(self, channel: i32) -> Self;
    /// Folds each axis through `table`, one nested lookup per axis.
    fn fold_through(self, table: &PermutationTable) -> usize;
}

/// These keys spread channels apart on each axis.
const SCRAMBLE_KEYS: [i32; 4] = [1_619, 31_337, 6_971, 1_013];

#[inline(always)]
fn scramble_axis(value: i32, channel: i32, axis: usize) -> i32 {
    value.wrapping_add(channel.wrapping_mul(SCRAMBLE_KEYS[axis]))
}

impl LatticeCoord for i32 {
    #[inline(always)]
    fn scrambled(self, channel: i32) -> Self {
        scramble_axis(self, channel, 0)
    }

    #[inline(always)]
    fn fold_through(self, table: &PermutationTable) -> usize {
        table.lookup1(self)
    }
}

impl LatticeCoord for IVec2 {
    #[inline(always)]
    fn scrambled(self, channel: i32) -> Self {
        IVec2::new(
            scramble_axis(self.x, channel, 0),
            scramble_axis(self.y, channel, 1),
        )
    }

    #[inline(always)]
    fn fold_through(self, table: &PermutationTable) -> usize {
        table.lookup2(self.x, self.y)
    }
}

impl LatticeCoord for IVec3 {
    #[inline(always)]
    fn scrambled(self, channel: i32) -> Self {
        IVec3::new(
            scramble_axis(self.x, channel, 0),
            scramble_axis(self.y, channel, 1),
            scramble_axis(self.z, channel, 2),
        )
    }

    #[inline(always)]
    fn fold_through(self, table: &PermutationTable) -> usize {
        table.lookup3(self.x, self.y, self.z)
    }
}

impl LatticeCoord for IVec4 {
    #[inline(always)]
    fn scrambled(self, channel: i32) -> Self {
        IVec4::new(
            scramble_axis(self.x, channel, 0),
            scramble_axis(self.y, channel, 1),
            scramble_axis(self.z, channel, 2),
            scramble_axis(self.w, channel, 3),
        )
    }

    #[inline(always)]
    fn fold_through(self, table: &PermutationTable) -> usize {
        table.lookup4(self.x, self.y, self.z, self.w)
    }
}

/// The read-only context every noise function samples through: some [`NoiseTables`] and the channel to hash on.
///
/// Channel 0 hashes coordinates directly. Other channels shift coordinates before hashing,
/// which decorrelates fields that share one set of tables.
#[derive(Debug, Clone, Copy)]
pub struct Lattice<'a> {
    tables: &'a NoiseTables,
    channel: i32,
}

impl<'a> Lattice<'a> {
    /// Creates a [`Lattice`] over `tables` on `channel`.
    #[inline]
    pub fn new(tables: &'a NoiseTables, channel: i32) -> Self {
        Self { tables, channel }
    }

    /// The tables being sampled.
    #[inline]
    pub fn tables(&self) -> &'a NoiseTables {
        self.tables
    }

    /// The channel being hashed on.
    #[inline]
    pub fn channel(&self) -> i32 {
        self.channel
    }

    /// This lattice without its channel scramble.
    #[inline]
    pub fn unscrambled(self) -> Self {
        Self {
            tables: self.tables,
            channel: 0,
        }
    }

    /// Hashes `coord` to a feature slot.
    #[inline]
    pub fn slot(&self, coord: impl LatticeCoord) -> usize {
        coord
            .scrambled(self.channel)
            .fold_through(&self.tables.permutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assert_bijection(table: &PermutationTable) {
        let size = table.size();
        let values = table.as_slice();
        assert_eq!(values.len(), size * 2);
        let mut seen = alloc::vec![false; size];
        for &v in &values[..size] {
            let v = v as usize;
            assert!(v < size, "{v} out of range for size {size}");
            assert!(!seen[v], "{v} appears twice for size {size}");
            seen[v] = true;
        }
        assert_eq!(values[..size], values[size..]);
    }

    #[test]
    fn every_supported_size_is_a_duplicated_bijection() {
        let mut size = MIN_TABLE_SIZE;
        while size <= MAX_TABLE_SIZE {
            for seed in [0, 1, 12_345, u64::MAX] {
                let table = PermutationTable::new(seed, size).unwrap();
                assert_eq!(table.mask(), size - 1);
                assert_bijection(&table);
            }
            size *= 2;
        }
    }

    #[test]
    fn unsupported_sizes_are_rejected() {
        for size in [0, 1, 3, 100, 255, 1024] {
            assert_eq!(
                PermutationTable::new(7, size),
                Err(NoiseError::InvalidTableSize(size))
            );
            assert!(NoiseTables::new(7, size).is_err());
        }
    }

    #[test]
    fn any_rng_can_build_a_table() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let table = PermutationTable::build_with(&mut rng, 64).unwrap();
        assert_bijection(&table);
    }

    #[test]
    fn reseed_keeps_size_and_invariants() {
        let mut table = PermutationTable::new(1, 128).unwrap();
        let before = table.clone();
        table.reseed(&mut NoiseRng::new(2));
        assert_eq!(table.size(), 128);
        assert_bijection(&table);
        assert_ne!(table, before);
        assert_eq!(table, PermutationTable::new(2, 128).unwrap());
    }

    #[test]
    fn lookups_mask_and_nest() {
        let table = PermutationTable::new(9, 256).unwrap();
        let raw = table.as_slice();
        assert_eq!(table.lookup1(-1), table.lookup1(255));
        assert_eq!(table.lookup1(256), table.lookup1(0));
        assert_eq!(table.lookup2(-3, 700), table.lookup2(253, 700 - 512));
        assert_eq!(table.lookup2(4, 5), raw[raw[4] as usize + 5] as usize);
        assert_eq!(
            table.lookup3(4, 5, 6),
            raw[table.lookup2(4, 5) + 6] as usize
        );
        assert_eq!(
            table.lookup4(4, 5, 6, -1),
            raw[table.lookup3(4, 5, 6) + 255] as usize
        );
    }

    #[test]
    fn same_seed_same_tables() {
        let a = NoiseTables::new(2024, 256).unwrap();
        let b = NoiseTables::new(2024, 256).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, NoiseTables::new(2025, 256).unwrap());
        assert_ne!(
            NoiseTables::new(1, 256).unwrap(),
            NoiseTables::new(1 << 32, 256).unwrap()
        );
    }

    #[test]
    fn bundled_permutation_matches_standalone() {
        let tables = NoiseTables::new(77, 32).unwrap();
        assert_eq!(tables.permutation(), &PermutationTable::new(77, 32).unwrap());
    }

    #[test]
    fn features_are_in_range() {
        let tables = NoiseTables::new(5, 512).unwrap();
        assert_eq!(tables.scalars().len(), 512);
        for &s in tables.scalars().as_slice() {
            assert!((0.0..1.0).contains(&s));
        }
        for g in tables.gradients::<Vec3>().as_slice() {
            assert!((g.length() - 1.0).abs() < 1e-5, "{g} is not unit");
        }
        for g in tables.gradients::<Vec4>().as_slice() {
            assert!((g.length() - 1.0).abs() < 1e-5, "{g} is not unit");
        }
        for p in tables.points::<Vec2>().as_slice() {
            assert!(p.cmpge(Vec2::ZERO).all() && p.cmplt(Vec2::ONE).all());
        }
        for p in tables.points::<Vec3>().as_slice() {
            assert!(p.cmpge(Vec3::ZERO).all() && p.cmplt(Vec3::ONE).all());
        }
        for p in tables.points::<Vec4>().as_slice() {
            assert!(p.cmpge(Vec4::ZERO).all() && p.cmplt(Vec4::ONE).all());
        }
    }

    #[test]
    fn planar_gradients_are_evenly_spaced() {
        let gradients = FeatureTable::<Vec2>::unit_vectors(8);
        assert!((gradients.get(0) - Vec2::X).length() < 1e-6);
        assert!((gradients.get(2) - Vec2::Y).length() < 1e-6);
        assert!((gradients.get(4) + Vec2::X).length() < 1e-6);
        for i in 0..8 {
            let a = gradients.get(i);
            let b = gradients.get((i + 1) % 8);
            assert!((a.length() - 1.0).abs() < 1e-6);
            assert!((a.dot(b) - core::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        }
    }

    #[test]
    fn flatten_interleaves_components() {
        let tables = NoiseTables::new(1, 16).unwrap();
        let flat = tables.points::<Vec3>().flatten();
        assert_eq!(flat.len(), 16 * 3);
        assert_eq!(flat[3..6], tables.points::<Vec3>().get(1).to_array());
        assert_eq!(tables.scalars().flatten(), tables.scalars().as_slice());
    }

    #[test]
    fn channels_scramble_slots() {
        let tables = NoiseTables::new(8, 256).unwrap();
        let plain = tables.lattice(0);
        let coord = IVec2::new(10, -4);
        assert_eq!(plain.slot(coord), tables.permutation().lookup2(10, -4));
        assert_eq!(tables.lattice(3).unscrambled().slot(coord), plain.slot(coord));
        let differing = (1..16)
            .filter(|&c| tables.lattice(c).slot(coord) != plain.slot(coord))
            .count();
        assert!(differing > 10, "only {differing} channels moved the slot");
    }
}
