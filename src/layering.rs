//! Contains logic for layering different [`NoiseFunction`]s on top of each other.

use bevy_math::VectorSpace;
use tracing::debug;

use crate::{NoiseFunction, error::NoiseError, tables::Lattice};

/// This represents the context of some [`LayerResult`].
/// This may store metadata collected in [`LayerOperation::prepare`].
pub trait LayerResultContext {
    /// Informs the context that this much weight is expected.
    /// This allows precomputing the total weight.
    fn expect_weight(&mut self, weight: f32);
}

/// A [`LayerResultContext`] that works for inputs of type `I`.
pub trait LayerResultContextFor<I>: LayerResultContext {
    /// The result the context makes.
    type Result: LayerResult;

    /// Based on some context, starts an empty result.
    fn start_result(&self) -> Self::Result;
}

/// Represents a working result of a noise sample.
pub trait LayerResult {
    /// The type the result finishes to.
    type Output;
    /// Collapses all accumulated noise results into a finished product.
    fn finish(self) -> Self::Output;
}

/// Specifies that this [`LayerResult`] can include values of type `V`.
pub trait LayerResultFor<V>: LayerResult {
    /// Includes `value` in the final result at this `weight`.
    /// The `value` should be kept plain, for example, if multiplication is needed, this will do so.
    fn include_value(&mut self, value: V, weight: f32);
}

/// Provides a user facing view of some [`LayerWeights`].
pub trait LayerWeightsSettings {
    /// The kind of [`LayerWeights`] produced by these settings.
    type Weights: LayerWeights;

    /// Prepares a new [`LayerWeights`] for a sample.
    fn start_weights(&self) -> Self::Weights;
}

/// Specifies that this generates configurable weights for different layers of noise.
pub trait LayerWeights {
    /// Generates the weight of the next layer of noise.
    fn next_weight(&mut self) -> f32;
}

/// An operation that contributes to some noise result.
/// `R` represents how the result is collected, and `W` represents how each layer is weighted.
///
/// Layers can be stacked in tuples: `(Layer1, Layer2, ...)`.
pub trait LayerOperation<R: LayerResultContext, W: LayerWeights> {
    /// Prepares the result context `R` for this noise. This is like a dry run of the noise to try to precompute anything it needs.
    fn prepare(&self, result_context: &mut R, weights: &mut W);
}

/// Specifies that this [`LayerOperation`] can be done on type `I`.
/// If this adds to the `result`, this is called an octave. The most common kind of octave is [`Octave`].
pub trait LayerOperationFor<I: VectorSpace, R: LayerResultContextFor<I>, W: LayerWeights>:
    LayerOperation<R, W>
{
    /// Performs the layer operation. Use `lattice` to drive randomness, `working_loc` to drive input, `result` to collect output, and `weights` to enable blending with other operations.
    fn do_noise_op(
        &self,
        lattice: Lattice<'_>,
        working_loc: &mut I,
        result: &mut R::Result,
        weights: &mut W,
    );
}

macro_rules! impl_all_operation_tuples {
    () => { };

    ($i:ident=$f:tt, $($ni:ident=$nf:tt),* $(,)?) => {
        impl<R: LayerResultContext, W: LayerWeights, $i: LayerOperation<R, W>, $($ni: LayerOperation<R, W>),* > LayerOperation<R, W> for ($i, $($ni),*) {
            #[inline]
            fn prepare(&self, result_context: &mut R, weights: &mut W) {
                self.$f.prepare(result_context, weights);
                $(self.$nf.prepare(result_context, weights);)*
            }
        }

        impl<I: VectorSpace, R: LayerResultContextFor<I>, W: LayerWeights, $i: LayerOperationFor<I, R, W>, $($ni: LayerOperationFor<I, R, W>),* > LayerOperationFor<I, R, W> for ($i, $($ni),*) {
            #[inline]
            fn do_noise_op(
                &self,
                lattice: Lattice<'_>,
                working_loc: &mut I,
                result: &mut R::Result,
                weights: &mut W,
            ) {
                self.$f.do_noise_op(lattice, working_loc, result, weights);
                $(self.$nf.do_noise_op(lattice, working_loc, result, weights);)*
            }
        }

        impl_all_operation_tuples!($($ni=$nf,)*);
    };
}

impl_all_operation_tuples!(
    T7 = 7,
    T6 = 6,
    T5 = 5,
    T4 = 4,
    T3 = 3,
    T2 = 2,
    T1 = 1,
    T0 = 0,
);

/// Represents a [`NoiseFunction`] based on layers of [`LayerOperation`]s.
///
/// ```
/// # use lattice_noise::prelude::*;
/// # use lattice_noise::layering::ContributionBounds;
/// // Create noise made of layers
/// let noise = LayeredNoise::new(
///     // that finishes to a value normalized by the analytic bounds of each layer,
///     Normed::new(ContributionBounds::UNORM),
///     // where each layer weighs 0.6 as much as the last,
///     Persistence::new(0.6)?,
///     // and the layers are:
///     (
///         // 4 octaves of simplex noise for the defining features,
///         FractalLayers::new(Octave(common_noise::Simplex::default()), 4, 1.8)?,
///         // then 4 more of perlin noise for cheaper detail.
///         FractalLayers::new(Octave(common_noise::Perlin::default()), 4, 2.0)?,
///     ),
/// );
/// let noise = Noise::seeded(noise, 42)?;
/// let value: f32 = noise.sample(bevy_math::Vec2::new(1.5, -3.0));
/// assert!((0.0..=1.0).contains(&value));
/// # Ok::<(), lattice_noise::error::NoiseError>(())
/// ```
#[derive(PartialEq, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct LayeredNoise<R, W, N> {
    result_context: R,
    weight_settings: W,
    noise: N,
}

impl<
    R: LayerResultContext + Default,
    W: LayerWeightsSettings + Default,
    N: LayerOperation<R, W::Weights> + Default,
> Default for LayeredNoise<R, W, N>
{
    fn default() -> Self {
        Self::new(Default::default(), Default::default(), Default::default())
    }
}

impl<R: LayerResultContext, W: LayerWeightsSettings, N: LayerOperation<R, W::Weights>>
    LayeredNoise<R, W, N>
{
    /// Constructs a [`LayeredNoise`] from this [`LayerResultContext`], [`LayerWeightsSettings`], and [`LayerOperation`].
    /// These values can not be directly mutated once set to preserve the totals computed in [`LayerOperation::prepare`].
    pub fn new(result_settings: R, weight_settings: W, noise: N) -> Self {
        let mut result_context = result_settings;
        let mut weights = weight_settings.start_weights();
        noise.prepare(&mut result_context, &mut weights);

        Self {
            result_context,
            weight_settings,
            noise,
        }
    }

    /// The prepared [`LayerResultContext`].
    pub fn result_context(&self) -> &R {
        &self.result_context
    }

    /// The [`LayerWeightsSettings`].
    pub fn weight_settings(&self) -> &W {
        &self.weight_settings
    }

    /// The layers.
    pub fn layers(&self) -> &N {
        &self.noise
    }
}

impl<
    I: VectorSpace,
    R: LayerResultContextFor<I>,
    W: LayerWeightsSettings,
    N: LayerOperationFor<I, R, W::Weights>,
> NoiseFunction<I> for LayeredNoise<R, W, N>
{
    type Output = <R::Result as LayerResult>::Output;

    #[inline]
    fn evaluate(&self, mut input: I, lattice: Lattice<'_>) -> Self::Output {
        let mut weights = self.weight_settings.start_weights();
        let mut result = self.result_context.start_result();
        self.noise
            .do_noise_op(lattice, &mut input, &mut result, &mut weights);
        result.finish()
    }
}

/// Represents a [`LayerOperationFor`] that contributes to the result via a [`NoiseFunction`] `T`.
/// This is the most common kind of [`LayerOperation`]. Without at least one octave layer, a [`LayeredNoise`] will not produce a meaningful result.
///
/// Every octave samples the same lattice; only its position and weight change.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Octave<T>(pub T);

impl<T, R: LayerResultContext, W: LayerWeights> LayerOperation<R, W> for Octave<T> {
    #[inline]
    fn prepare(&self, result_context: &mut R, weights: &mut W) {
        result_context.expect_weight(weights.next_weight());
    }
}

impl<
    T: NoiseFunction<I>,
    I: VectorSpace,
    R: LayerResultContextFor<I, Result: LayerResultFor<T::Output>>,
    W: LayerWeights,
> LayerOperationFor<I, R, W> for Octave<T>
{
    #[inline]
    fn do_noise_op(
        &self,
        lattice: Lattice<'_>,
        working_loc: &mut I,
        result: &mut R::Result,
        weights: &mut W,
    ) {
        let octave_result = self.0.evaluate(*working_loc, lattice);
        result.include_value(octave_result, weights.next_weight());
    }
}

/// Represents a [`LayerOperation`] that repeats the inner layer at different scales of input.
/// The most common use for this is fractal brownian motion (fbm).
///
/// The first pass runs at the working location unchanged.
/// Each later pass first multiplies the working location by the lacunarity.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct FractalLayers<T> {
    layer: T,
    octaves: u32,
    lacunarity: f32,
}

impl<T: Default> Default for FractalLayers<T> {
    fn default() -> Self {
        Self {
            layer: T::default(),
            octaves: 8,
            lacunarity: 2.0,
        }
    }
}

impl<T> FractalLayers<T> {
    /// Repeats `layer` `octaves` times, scaling the input by `lacunarity` between passes.
    ///
    /// Fails if `octaves` is 0 or `lacunarity` is not a finite, positive number.
    pub fn new(layer: T, octaves: u32, lacunarity: f32) -> Result<Self, NoiseError> {
        if octaves == 0 {
            return Err(NoiseError::InvalidOctaveCount(octaves));
        }
        if !lacunarity.is_finite() || lacunarity <= 0.0 {
            return Err(NoiseError::InvalidLacunarity(lacunarity));
        }
        Ok(Self {
            layer,
            octaves,
            lacunarity,
        })
    }

    /// The repeated [`LayerOperation`].
    pub fn layer(&self) -> &T {
        &self.layer
    }

    /// The number of times the inner layer runs.
    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Lacunarity measures how far apart each pass of the inner layer will be.
    /// Effectively, this is a frequency multiplier.
    /// Ex: if this is 3, each octave will operate on 1/3 the scale.
    pub fn lacunarity(&self) -> f32 {
        self.lacunarity
    }
}

impl<T: LayerOperation<R, W>, R: LayerResultContext, W: LayerWeights> LayerOperation<R, W>
    for FractalLayers<T>
{
    #[inline]
    fn prepare(&self, result_context: &mut R, weights: &mut W) {
        for _ in 0..self.octaves {
            self.layer.prepare(result_context, weights);
        }
    }
}

impl<I: VectorSpace, T: LayerOperationFor<I, R, W>, R: LayerResultContextFor<I>, W: LayerWeights>
    LayerOperationFor<I, R, W> for FractalLayers<T>
{
    #[inline]
    fn do_noise_op(
        &self,
        lattice: Lattice<'_>,
        working_loc: &mut I,
        result: &mut R::Result,
        weights: &mut W,
    ) {
        self.layer.do_noise_op(lattice, working_loc, result, weights);
        for _ in 1..self.octaves {
            *working_loc = *working_loc * self.lacunarity;
            self.layer.do_noise_op(lattice, working_loc, result, weights);
        }
    }
}

/// A [`LayerWeightsSettings`] for [`PersistenceWeights`].
/// This is a building block for traditional fractal brownian motion. See also [`FractalLayers`].
///
/// The first layer weighs the persistence itself, and each later layer weighs the persistence times the last.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Persistence(f32);

impl Default for Persistence {
    fn default() -> Self {
        Self(0.5)
    }
}

impl Persistence {
    /// Makes every octave get the same weight.
    pub const CONSTANT: Self = Self(1.0);

    /// Creates a [`Persistence`], which must lie in (0, 1].
    pub fn new(persistence: f32) -> Result<Self, NoiseError> {
        if persistence > 0.0 && persistence <= 1.0 {
            Ok(Self(persistence))
        } else {
            Err(NoiseError::InvalidPersistence(persistence))
        }
    }

    /// The weight multiplier between layers.
    pub fn get(self) -> f32 {
        self.0
    }
}

/// The [`LayerWeights`] for [`Persistence`].
#[derive(Clone, Copy, PartialEq)]
pub struct PersistenceWeights {
    persistence: f32,
    next: f32,
}

impl LayerWeights for PersistenceWeights {
    #[inline]
    fn next_weight(&mut self) -> f32 {
        let result = self.next;
        self.next *= self.persistence;
        result
    }
}

impl LayerWeightsSettings for Persistence {
    type Weights = PersistenceWeights;

    #[inline]
    fn start_weights(&self) -> Self::Weights {
        PersistenceWeights {
            persistence: self.0,
            next: self.0,
        }
    }
}

/// The range a single layer is assumed to contribute, before weighting.
/// `low` must be less than `high`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContributionBounds {
    /// The least a layer contributes.
    pub low: f32,
    /// The most a layer contributes.
    pub high: f32,
}

impl ContributionBounds {
    /// The full range of kernels that output in [0, 1].
    /// A single layer normalizes to itself.
    pub const UNORM: Self = Self {
        low: 0.0,
        high: 1.0,
    };

    /// A tighter range that treats the rare extremes of a layer as out of range.
    /// This raises contrast, and the finished result clamps.
    pub const CONTRACTED: Self = Self {
        low: 0.4,
        high: 0.6,
    };
}

impl Default for ContributionBounds {
    fn default() -> Self {
        Self::UNORM
    }
}

/// A [`LayerResultContext`] that normalizes the weighted sum of layers into [0, 1].
///
/// The bounds are tracked analytically: each expected weight adds `low * weight` and `high * weight` to the running totals,
/// and a finished sum maps from `[low_total, high_total]` to [0, 1], clamped.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Normed {
    bounds: ContributionBounds,
    low_total: f32,
    high_total: f32,
}

impl Default for Normed {
    fn default() -> Self {
        Self::new(ContributionBounds::UNORM)
    }
}

impl Normed {
    /// Creates an unprepared [`Normed`] with these per layer `bounds`.
    pub fn new(bounds: ContributionBounds) -> Self {
        Self {
            bounds,
            low_total: 0.0,
            high_total: 0.0,
        }
    }

    /// The per layer bounds.
    pub fn bounds(&self) -> ContributionBounds {
        self.bounds
    }

    /// The lowest weighted sum the prepared layers can produce.
    pub fn low_total(&self) -> f32 {
        self.low_total
    }

    /// The highest weighted sum the prepared layers can produce.
    pub fn high_total(&self) -> f32 {
        self.high_total
    }
}

impl LayerResultContext for Normed {
    #[inline]
    fn expect_weight(&mut self, weight: f32) {
        self.low_total += self.bounds.low * weight;
        self.high_total += self.bounds.high * weight;
    }
}

impl<I> LayerResultContextFor<I> for Normed {
    type Result = NormedResult;

    #[inline]
    fn start_result(&self) -> Self::Result {
        NormedResult {
            low_total: self.low_total,
            high_total: self.high_total,
            running_total: 0.0,
        }
    }
}

/// The in-progress result of a [`Normed`].
#[derive(Clone, Copy, PartialEq)]
pub struct NormedResult {
    low_total: f32,
    high_total: f32,
    running_total: f32,
}

impl LayerResult for NormedResult {
    type Output = f32;

    #[inline]
    fn finish(self) -> Self::Output {
        ((self.running_total - self.low_total) / (self.high_total - self.low_total)).clamp(0.0, 1.0)
    }
}

impl LayerResultFor<f32> for NormedResult {
    #[inline]
    fn include_value(&mut self, value: f32, weight: f32) {
        self.running_total += value * weight;
    }
}

/// Fractal brownian motion over the kernel `T`.
pub type Fbm<T> = LayeredNoise<Normed, Persistence, FractalLayers<Octave<T>>>;

/// Builds [`Fbm`] over `kernel` with a lacunarity of 2 and [`ContributionBounds::UNORM`].
///
/// Fails if `octaves` is 0 or `persistence` is outside (0, 1].
pub fn fbm<T>(kernel: T, octaves: u32, persistence: f32) -> Result<Fbm<T>, NoiseError> {
    debug!(octaves, persistence, "building fbm");
    Ok(LayeredNoise::new(
        Normed::default(),
        Persistence::new(persistence)?,
        FractalLayers::new(Octave(kernel), octaves, 2.0)?,
    ))
}
