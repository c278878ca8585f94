//! Contains common imports

pub use crate::{
    ConfigurableNoise, DynamicSampleable, Noise, NoiseFunction, Sampleable, SampleableFor,
    cell_noise::{
        BlendCellGradients, CubicCellValues, MixCellGradients, MixCellValues, SimplecticBlend,
        TableGradients, WorleyMode, WorleyPointDistance,
    },
    cells::{Grid, SimplexGrid},
    common_adapters::{ImproveXyPlanes, ImproveXyzSpaces, SNormToUNorm},
    config::{NoiseConfig, NoiseField},
    curves::{Linear, Quintic},
    error::NoiseError,
    layering::{FractalLayers, LayeredNoise, Normed, Octave, Persistence, fbm},
    lengths::EuclideanLength,
    ramp::{ColorRamp, ColorStop},
    rng::NoiseRng,
    tables::{Lattice, NoiseTables},
    warping::{DomainWarp, OffsetElements},
};

/// Contains type aliases for common noise types.
/// Every alias outputs `f32`s between 0 and 1.
pub mod common_noise {
    use super::*;

    /// Value noise: scalar features blended by the quintic fade.
    pub type Value = MixCellValues<Grid, Quintic>;

    /// Perlin noise: gradient dot products blended by the quintic fade.
    pub type Perlin = (MixCellGradients<Grid, Quintic, TableGradients>, SNormToUNorm);

    /// Simplex noise.
    pub type Simplex = (
        BlendCellGradients<SimplexGrid, SimplecticBlend, TableGradients>,
        SNormToUNorm,
    );

    /// Cubic noise.
    pub type Cubic = CubicCellValues<Grid>;

    /// Worley noise. Use [`WorleyPointDistance::with_mode`] for the second nearest distance.
    pub type Worley = WorleyPointDistance<Grid, EuclideanLength>;

    /// Represents traditional fractal brownian motion.
    pub type Fbm<T> = crate::layering::Fbm<T>;
}
