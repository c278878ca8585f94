#![no_std]
#![allow(
    clippy::doc_markdown,
    reason = "These rules should not apply to the readme."
)]
#![doc = include_str!("../README.md")]

extern crate alloc;
#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod cell_noise;
pub mod cells;
pub mod common_adapters;
pub mod config;
pub mod curves;
pub mod error;
pub mod layering;
pub mod lengths;
pub mod prelude;
pub mod ramp;
pub mod rng;
pub mod tables;
pub mod warping;

use alloc::sync::Arc;

use bevy_math::VectorSpace;
use error::NoiseError;
use tables::{DEFAULT_TABLE_SIZE, Lattice, NoiseTables};

/// Represents a simple noise function with an input `I` and an output.
///
/// Every function reads its randomness from the [`Lattice`] it is handed, so evaluation is pure and can run on any number of threads at once.
pub trait NoiseFunction<I> {
    /// The output of the function.
    type Output;

    /// Evaluates the function at `input`.
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output;
}

impl<I, T0: NoiseFunction<I>> NoiseFunction<I> for (T0,) {
    type Output = T0::Output;
    #[inline]
    fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
        self.0.evaluate(input, lattice)
    }
}

macro_rules! impl_noise_function_tuple {
    ($($l:ident-$t:ident-$i:tt),*) => {
        impl<
            I,
            T0: NoiseFunction<I>,
            $($t: NoiseFunction<$l::Output>,)*
        > NoiseFunction<I> for (T0, $($t,)*)
        {
            type Output = <impl_noise_function_tuple!(last $($t),*)>::Output;

            #[inline]
            fn evaluate(&self, input: I, lattice: Lattice<'_>) -> Self::Output {
                let input = self.0.evaluate(input, lattice);
                $(let input = self.$i.evaluate(input, lattice);)*
                input
            }
        }
    };


    (last $f:ident $(,)? ) => {
        $f
    };

    (last $f:ident, $($items:ident),+ $(,)?) => {
        impl_noise_function_tuple!(last $($items),+)
    };
}

#[rustfmt::skip]
mod function_impls {
    use super::*;
    impl_noise_function_tuple!(T0-T1-1);
    impl_noise_function_tuple!(T0-T1-1, T1-T2-2);
    impl_noise_function_tuple!(T0-T1-1, T1-T2-2, T2-T3-3);
    impl_noise_function_tuple!(T0-T1-1, T1-T2-2, T2-T3-3, T3-T4-4);
    impl_noise_function_tuple!(T0-T1-1, T1-T2-2, T2-T3-3, T3-T4-4, T4-T5-5);
    impl_noise_function_tuple!(T0-T1-1, T1-T2-2, T2-T3-3, T3-T4-4, T4-T5-5, T5-T6-6);
    impl_noise_function_tuple!(T0-T1-1, T1-T2-2, T2-T3-3, T3-T4-4, T4-T5-5, T5-T6-6, T6-T7-7);
    impl_noise_function_tuple!(T0-T1-1, T1-T2-2, T2-T3-3, T3-T4-4, T4-T5-5, T5-T6-6, T6-T7-7, T7-T8-8);
}

/// Specifies that this noise is configurable.
pub trait ConfigurableNoise {
    /// Sets the channel the noise hashes on.
    fn set_channel(&mut self, channel: i32);

    /// Gets the channel the noise hashes on.
    fn get_channel(&self) -> i32;

    /// Sets the scale of the noise via its frequency.
    fn set_frequency(&mut self, frequency: f32);

    /// Gets the scale of the noise via its frequency.
    fn get_frequency(&self) -> f32;

    /// Sets the scale of the noise via its period.
    fn set_period(&mut self, period: f32) {
        self.set_frequency(1.0 / period);
    }

    /// Gets the scale of the noise via its period.
    fn get_period(&self) -> f32 {
        1.0 / self.get_frequency()
    }
}

/// Indicates that this noise is samplable by type `I`.
pub trait Sampleable<I: VectorSpace> {
    /// Represents the raw result of the sample.
    type Result;

    /// Samples the noise at `loc`, returning the raw result.
    fn sample_raw(&self, loc: I) -> Self::Result;

    /// Samples the noise at `loc` for a result of type `T`. This is a convenience over [`SampleableFor`] since it doesn't require `T` to be written in the trait.
    #[inline]
    fn sample_for<T>(&self, loc: I) -> T
    where
        Self: SampleableFor<I, T>,
    {
        self.sample(loc)
    }
}

/// Indicates that this noise is samplable by type `I` for type `T`.
pub trait SampleableFor<I: VectorSpace, T> {
    /// Samples the noise at `loc` for a result of type `T`.
    fn sample(&self, loc: I) -> T;
}

/// A version of [`Sampleable`] that is object safe.
/// This crate uses exact types whenever possible to enable more inlining and optimizations,
/// but this trait focuses instead on usability at the expense of speed.
///
/// Use [`Sampleable`] when you need performance and [`DynamicSampleable`] when you need object safety or don't want to bloat binary size with more inlining.
pub trait DynamicSampleable<I: VectorSpace, T>: ConfigurableNoise + SampleableFor<I, T> {
    /// This is the same as [`SampleableFor::sample`] but it is not inlined.
    fn sample_dyn(&self, loc: I) -> T {
        self.sample(loc)
    }
}

/// This is the standard end interface of a [`NoiseFunction`].
///
/// It owns a shared handle to the [`NoiseTables`] it samples,
/// so many [`Noise`]s on different channels can share one set of tables.
#[derive(Debug, PartialEq, Clone)]
pub struct Noise<N> {
    /// The [`NoiseFunction`] powering this noise.
    pub noise: N,
    /// The tables this noise samples.
    pub tables: Arc<NoiseTables>,
    /// The channel hashed on. Noise on different channels is decorrelated even when it shares tables,
    /// except for perlin gradients, which ignore it.
    pub channel: i32,
    /// The frequency or scale of the [`Noise`].
    pub frequency: f32,
}

impl<N> Noise<N> {
    /// Creates a [`Noise`] over `tables` on channel 0 with a frequency of 1.
    pub fn new(noise: N, tables: Arc<NoiseTables>) -> Self {
        Self {
            noise,
            tables,
            channel: 0,
            frequency: 1.0,
        }
    }

    /// Creates a [`Noise`] over freshly built tables of the default size.
    pub fn seeded(noise: N, seed: u64) -> Result<Self, NoiseError> {
        Ok(Self::new(
            noise,
            Arc::new(NoiseTables::new(seed, DEFAULT_TABLE_SIZE)?),
        ))
    }

    /// Sets the channel.
    pub fn with_channel(mut self, channel: i32) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the frequency.
    pub fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    /// The [`Lattice`] this noise samples through.
    #[inline]
    pub fn lattice(&self) -> Lattice<'_> {
        self.tables.lattice(self.channel)
    }
}

impl<N: Default> Noise<N> {
    /// Creates default noise over freshly built tables of the default size.
    pub fn with_seed(seed: u64) -> Result<Self, NoiseError> {
        Self::seeded(N::default(), seed)
    }
}

impl<I: VectorSpace, N: NoiseFunction<I>> NoiseFunction<I> for Noise<N> {
    type Output = N::Output;

    /// Evaluates on this noise's own tables and channel, ignoring `_lattice`.
    #[inline]
    fn evaluate(&self, input: I, _lattice: Lattice<'_>) -> Self::Output {
        self.sample_raw(input)
    }
}

impl<N> ConfigurableNoise for Noise<N> {
    fn set_channel(&mut self, channel: i32) {
        self.channel = channel;
    }

    fn get_channel(&self) -> i32 {
        self.channel
    }

    fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    fn get_frequency(&self) -> f32 {
        self.frequency
    }
}

impl<I: VectorSpace, N: NoiseFunction<I>> Sampleable<I> for Noise<N> {
    type Result = N::Output;

    #[inline]
    fn sample_raw(&self, loc: I) -> Self::Result {
        self.noise.evaluate(loc * self.frequency, self.lattice())
    }
}

impl<T, I: VectorSpace, N: NoiseFunction<I, Output: Into<T>>> SampleableFor<I, T> for Noise<N> {
    #[inline]
    fn sample(&self, loc: I) -> T {
        self.sample_raw(loc).into()
    }
}

impl<T, I: VectorSpace, N> DynamicSampleable<I, T> for Noise<N> where
    Self: SampleableFor<I, T> + Sampleable<I>
{
}
