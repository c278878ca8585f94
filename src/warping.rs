//! Contains domain warping: displacing the sample position by other noise before evaluating the main field.

use bevy_math::{Vec2, Vec3, Vec4, VectorSpace};
use rand::RngCore;
use tracing::trace;

use crate::{NoiseFunction, rng::NoiseRngExt, tables::Lattice};

/// The largest magnitude of any warp offset component.
pub const WARP_OFFSET_RANGE: f32 = 100.0;

/// A [`VectorSpace`] that can be displaced one component at a time.
pub trait WarpSpace: VectorSpace {
    /// One offset vector per component.
    type Offsets: Copy + PartialEq + core::fmt::Debug + Send + Sync + 'static;

    /// Draws offsets with every component uniform in `[-WARP_OFFSET_RANGE, WARP_OFFSET_RANGE)`.
    fn random_offsets(rng: &mut impl RngCore) -> Self::Offsets;

    /// Builds a vector whose component `i` is `component(self + offsets[i])`.
    fn from_offset_samples(
        self,
        offsets: &Self::Offsets,
        component: impl FnMut(Self) -> f32,
    ) -> Self;
}

macro_rules! impl_warp_space {
    ($t:ty, $d:literal) => {
        impl WarpSpace for $t {
            type Offsets = [$t; $d];

            fn random_offsets(rng: &mut impl RngCore) -> Self::Offsets {
                core::array::from_fn(|_| {
                    <$t>::from_array(core::array::from_fn(|_| {
                        rng.next_snorm() * WARP_OFFSET_RANGE
                    }))
                })
            }

            #[inline]
            fn from_offset_samples(
                self,
                offsets: &Self::Offsets,
                mut component: impl FnMut(Self) -> f32,
            ) -> Self {
                <$t>::from_array(core::array::from_fn(|i| component(self + offsets[i])))
            }
        }
    };
}

impl_warp_space!(Vec2, 2);
impl_warp_space!(Vec3, 3);
impl_warp_space!(Vec4, 4);

/// A [`NoiseFunction`] that produces a vector of the input's type, each component sampled from the scalar noise `N` at the input shifted by a fixed offset.
///
/// The offsets keep the components from being copies of one another.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct OffsetElements<N, I: WarpSpace> {
    /// The scalar noise sampled per component.
    pub noise: N,
    /// Where each component samples, relative to the input.
    pub offsets: I::Offsets,
}

impl<N, I: WarpSpace> OffsetElements<N, I> {
    /// Draws fresh offsets for `noise` from `rng`.
    pub fn new(noise: N, rng: &mut impl RngCore) -> Self {
        Self {
            noise,
            offsets: I::random_offsets(rng),
        }
    }
}

impl<N: NoiseFunction<I, Output = f32>, I: WarpSpace> NoiseFunction<I> for OffsetElements<N, I> {
    type Output = I;

    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        input.from_offset_samples(&self.offsets, |at| self.noise.evaluate(at, lattice))
    }
}

/// A [`NoiseFunction`] that warps its input by one or two [`OffsetElements`] displacements before evaluating `N`.
///
/// Each pass moves the position by `strength` times the displacement sampled at the current position,
/// so a second pass samples where the first one landed.
/// Offsets are drawn once when the warp is built and shared by every sample.
///
/// ```
/// # use lattice_noise::prelude::*;
/// # use bevy_math::Vec2;
/// let mut rng = NoiseRng::new(7);
/// let warper = fbm(common_noise::Simplex::default(), 3, 0.5)?;
/// let main = fbm(common_noise::Perlin::default(), 5, 0.5)?;
/// let warped = Noise::seeded(DomainWarp::double(warper, 4.0, main, &mut rng), 7)?;
/// let value: f32 = warped.sample(Vec2::new(12.0, 3.5));
/// assert!((0.0..=1.0).contains(&value));
/// # Ok::<(), lattice_noise::error::NoiseError>(())
/// ```
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct DomainWarp<W, N, I: WarpSpace> {
    first: OffsetElements<W, I>,
    second: Option<OffsetElements<W, I>>,
    strength: f32,
    /// The [`NoiseFunction`] evaluated at the warped position.
    pub noise: N,
}

impl<W, N, I: WarpSpace> DomainWarp<W, N, I> {
    /// Warps `noise` once by `warper`.
    pub fn single(warper: W, strength: f32, noise: N, rng: &mut impl RngCore) -> Self {
        trace!(strength, "drawing single warp offsets");
        Self {
            first: OffsetElements::new(warper, rng),
            second: None,
            strength,
            noise,
        }
    }

    /// Warps `noise` twice by `warper`, with independent offsets for each pass.
    pub fn double(warper: W, strength: f32, noise: N, rng: &mut impl RngCore) -> Self
    where
        W: Clone,
    {
        trace!(strength, "drawing double warp offsets");
        let first = OffsetElements::new(warper.clone(), rng);
        let second = OffsetElements::new(warper, rng);
        Self {
            first,
            second: Some(second),
            strength,
            noise,
        }
    }

    /// How far each pass moves the position per unit of displacement.
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Whether this warps twice.
    pub fn is_double(&self) -> bool {
        self.second.is_some()
    }

    /// The displacement of the first pass.
    pub fn first(&self) -> &OffsetElements<W, I> {
        &self.first
    }

    /// The displacement of the second pass, if any.
    pub fn second(&self) -> Option<&OffsetElements<W, I>> {
        self.second.as_ref()
    }
}

impl<W: NoiseFunction<I, Output = f32>, N: NoiseFunction<I>, I: WarpSpace> NoiseFunction<I>
    for DomainWarp<W, N, I>
{
    type Output = N::Output;

    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        let mut loc = input + self.first.evaluate(input, lattice) * self.strength;
        if let Some(second) = &self.second {
            loc = loc + second.evaluate(loc, lattice) * self.strength;
        }
        self.noise.evaluate(loc, lattice)
    }
}
