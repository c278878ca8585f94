//! A data driven description of a noise field, for when the kernel, dimension and transforms are only known at runtime.
//!
//! ```
//! # use lattice_noise::config::{KernelKind, NoiseConfig, Dimension};
//! # use bevy_math::Vec3;
//! let config: NoiseConfig = serde_json::from_str(r#"{
//!     "kind": "simplex",
//!     "dimension": "3d",
//!     "seed": 1337,
//!     "fractal": { "octaves": 5, "persistence": 0.5, "lacunarity": 2.0 },
//!     "warp": { "strength": 2.0, "octaves": 2, "double": true },
//!     "rotate": true
//! }"#).unwrap();
//! let field = config.build()?;
//! assert_eq!(field.dimension(), Dimension::D3);
//! let value = field.sample3(Vec3::new(0.5, 1.0, 1.5))?;
//! assert!((0.0..=1.0).contains(&value));
//! assert!(field.sample2(bevy_math::Vec2::ZERO).is_err());
//! # Ok::<(), lattice_noise::error::NoiseError>(())
//! ```

use alloc::{boxed::Box, sync::Arc};

use bevy_math::{Vec2, Vec3, Vec4};
use tracing::debug;

use crate::{
    ConfigurableNoise, DynamicSampleable, Noise, NoiseFunction,
    cell_noise::WorleyMode,
    common_adapters::{ImproveXyPlanes, ImproveXyzSpaces},
    error::NoiseError,
    layering::{Fbm, FractalLayers, LayeredNoise, Normed, Octave, Persistence},
    prelude::common_noise,
    rng::NoiseRng,
    tables::{DEFAULT_TABLE_SIZE, FeatureKind, FeatureShape, NoiseTables},
    warping::{DomainWarp, WarpSpace},
};

/// Which kernel a field evaluates.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum KernelKind {
    /// [`common_noise::Value`].
    Value,
    /// [`common_noise::Perlin`].
    #[default]
    Perlin,
    /// [`common_noise::Simplex`].
    Simplex,
    /// [`common_noise::Cubic`].
    Cubic,
    /// [`common_noise::Worley`] reporting the nearest distance.
    WorleyNearest,
    /// [`common_noise::Worley`] reporting the second nearest distance.
    WorleySecond,
}

impl KernelKind {
    /// The feature table this kernel reads in `dimension` dimensions.
    pub fn feature_shape(self, dimension: Dimension) -> FeatureShape {
        match self {
            Self::Value | Self::Cubic => FeatureShape {
                kind: FeatureKind::Scalar,
                components: 1,
            },
            Self::Perlin | Self::Simplex => FeatureShape {
                kind: FeatureKind::UnitVector,
                components: dimension.get(),
            },
            Self::WorleyNearest | Self::WorleySecond => FeatureShape {
                kind: FeatureKind::Point,
                components: dimension.get(),
            },
        }
    }
}

/// The dimension of positions a field takes.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Dimension {
    /// [`Vec2`] positions.
    #[default]
    #[cfg_attr(feature = "serialize", serde(rename = "2d"))]
    D2,
    /// [`Vec3`] positions.
    #[cfg_attr(feature = "serialize", serde(rename = "3d"))]
    D3,
    /// [`Vec4`] positions.
    #[cfg_attr(feature = "serialize", serde(rename = "4d"))]
    D4,
}

impl Dimension {
    /// The number of components.
    pub const fn get(self) -> u8 {
        match self {
            Self::D2 => 2,
            Self::D3 => 3,
            Self::D4 => 4,
        }
    }
}

/// Fractal layering settings. One octave is the plain kernel.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FractalConfig {
    /// How many octaves to sum.
    pub octaves: u32,
    /// The weight of the first octave, and the factor between the weights of consecutive octaves.
    pub persistence: f32,
    /// The factor between the frequencies of consecutive octaves.
    pub lacunarity: f32,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl FractalConfig {
    /// Layers `kernel` by these settings.
    pub fn build<K>(&self, kernel: K) -> Result<Fbm<K>, NoiseError> {
        Ok(LayeredNoise::new(
            Normed::default(),
            Persistence::new(self.persistence)?,
            FractalLayers::new(Octave(kernel), self.octaves, self.lacunarity)?,
        ))
    }
}

/// Domain warp settings.
/// The warp samples the same kernel as the field, with its own octave count.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WarpConfig {
    /// How far each pass moves the position per unit of displacement.
    pub strength: f32,
    /// The octaves of the displacement fractal.
    pub octaves: u32,
    /// Whether to warp a second time from where the first warp landed.
    pub double: bool,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            strength: 1.0,
            octaves: 3,
            double: false,
        }
    }
}

/// Everything needed to build a [`NoiseField`].
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct NoiseConfig {
    /// The kernel.
    pub kind: KernelKind,
    /// The dimension of positions.
    pub dimension: Dimension,
    /// Seeds the tables and the warp offsets.
    pub seed: u64,
    /// The permutation table size, a power of two in `2..=512`.
    pub table_size: usize,
    /// The lattice channel.
    pub channel: i32,
    /// Scales positions before anything else.
    pub frequency: f32,
    /// Fractal layering.
    pub fractal: FractalConfig,
    /// Optional domain warping.
    pub warp: Option<WarpConfig>,
    /// Rotates 3d and 4d positions off the lattice axes before sampling. Has no effect in 2d.
    ///
    /// This is a general transform: it applies to every [`KernelKind`], not only simplex.
    /// The rotations are orthonormal, so distances, and with them worley output ranges, are unchanged.
    pub rotate: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            kind: KernelKind::default(),
            dimension: Dimension::default(),
            seed: 0,
            table_size: DEFAULT_TABLE_SIZE,
            channel: 0,
            frequency: 1.0,
            fractal: FractalConfig::default(),
            warp: None,
            rotate: false,
        }
    }
}

impl NoiseConfig {
    /// Builds fresh tables and the field over them.
    pub fn build(&self) -> Result<NoiseField, NoiseError> {
        let tables = Arc::new(NoiseTables::new(self.seed, self.table_size)?);
        self.build_with_tables(tables)
    }

    /// Builds the field over existing `tables`, ignoring [`seed`](Self::seed) and [`table_size`](Self::table_size) for them.
    /// The warp offsets still derive from [`seed`](Self::seed).
    pub fn build_with_tables(&self, tables: Arc<NoiseTables>) -> Result<NoiseField, NoiseError> {
        debug!(
            kind = ?self.kind,
            dimension = self.dimension.get(),
            octaves = self.fractal.octaves,
            warped = self.warp.is_some(),
            rotate = self.rotate,
            "building noise field"
        );
        Ok(match self.dimension {
            Dimension::D2 => NoiseField::D2(Vec2::build_field(self, tables)?),
            Dimension::D3 => NoiseField::D3(Vec3::build_field(self, tables)?),
            Dimension::D4 => NoiseField::D4(Vec4::build_field(self, tables)?),
        })
    }

    /// The feature table the configured kernel reads.
    pub fn feature_shape(&self) -> FeatureShape {
        self.kind.feature_shape(self.dimension)
    }

    fn layered<V: FieldSpace, K>(
        &self,
        kernel: K,
        tables: Arc<NoiseTables>,
    ) -> Result<BoxedField<V>, NoiseError>
    where
        K: NoiseFunction<V, Output = f32> + Clone + Send + Sync + 'static,
    {
        let main = self.fractal.build(kernel.clone())?;
        let Some(warp) = self.warp else {
            return Ok(V::finish(main, self, tables));
        };

        let warper = FractalConfig {
            octaves: warp.octaves,
            ..self.fractal
        }
        .build(kernel)?;
        let mut rng = NoiseRng::new(self.seed).branch(1);
        let warped = if warp.double {
            DomainWarp::double(warper, warp.strength, main, &mut rng)
        } else {
            DomainWarp::single(warper, warp.strength, main, &mut rng)
        };
        Ok(V::finish(warped, self, tables))
    }
}

/// A type erased field sampling positions of type `V`.
pub type BoxedField<V> = Box<dyn DynamicSampleable<V, f32> + Send + Sync>;

/// A vector type [`NoiseConfig`] can build fields for.
pub trait FieldSpace: WarpSpace + Send + Sync + 'static {
    /// Builds the configured field for this dimension.
    fn build_field(
        config: &NoiseConfig,
        tables: Arc<NoiseTables>,
    ) -> Result<BoxedField<Self>, NoiseError>;

    /// Applies the configured rotation, channel and frequency, and erases the type of `noise`.
    fn finish<N>(noise: N, config: &NoiseConfig, tables: Arc<NoiseTables>) -> BoxedField<Self>
    where
        N: NoiseFunction<Self, Output = f32> + Send + Sync + 'static;
}

fn erase<V: FieldSpace, N>(noise: N, config: &NoiseConfig, tables: Arc<NoiseTables>) -> BoxedField<V>
where
    N: NoiseFunction<V, Output = f32> + Send + Sync + 'static,
{
    Box::new(
        Noise::new(noise, tables)
            .with_channel(config.channel)
            .with_frequency(config.frequency),
    )
}

macro_rules! impl_field_space {
    (@build $t:ty, $($finish:tt)*) => {
        impl FieldSpace for $t {
            fn build_field(
                config: &NoiseConfig,
                tables: Arc<NoiseTables>,
            ) -> Result<BoxedField<Self>, NoiseError> {
                let worley = common_noise::Worley::default();
                match config.kind {
                    KernelKind::Value => {
                        config.layered::<Self, _>(common_noise::Value::default(), tables)
                    }
                    KernelKind::Perlin => {
                        config.layered::<Self, _>(common_noise::Perlin::default(), tables)
                    }
                    KernelKind::Simplex => {
                        config.layered::<Self, _>(common_noise::Simplex::default(), tables)
                    }
                    KernelKind::Cubic => {
                        config.layered::<Self, _>(common_noise::Cubic::default(), tables)
                    }
                    KernelKind::WorleyNearest => config.layered::<Self, _>(worley, tables),
                    KernelKind::WorleySecond => config
                        .layered::<Self, _>(worley.with_mode(WorleyMode::SecondNearest), tables),
                }
            }

            $($finish)*
        }
    };

    ($t:ty) => {
        impl_field_space!(@build $t, fn finish<N>(noise: N, config: &NoiseConfig, tables: Arc<NoiseTables>) -> BoxedField<Self>
        where
            N: NoiseFunction<Self, Output = f32> + Send + Sync + 'static,
        {
            erase(noise, config, tables)
        });
    };

    ($t:ty, $rotation:ident) => {
        impl_field_space!(@build $t, fn finish<N>(noise: N, config: &NoiseConfig, tables: Arc<NoiseTables>) -> BoxedField<Self>
        where
            N: NoiseFunction<Self, Output = f32> + Send + Sync + 'static,
        {
            if config.rotate {
                erase(($rotation, noise), config, tables)
            } else {
                erase(noise, config, tables)
            }
        });
    };
}

impl_field_space!(Vec2);
impl_field_space!(Vec3, ImproveXyPlanes);
impl_field_space!(Vec4, ImproveXyzSpaces);

/// A field built from a [`NoiseConfig`], sampled by a position of its [`Dimension`].
pub enum NoiseField {
    /// Samples [`Vec2`]s.
    D2(BoxedField<Vec2>),
    /// Samples [`Vec3`]s.
    D3(BoxedField<Vec3>),
    /// Samples [`Vec4`]s.
    D4(BoxedField<Vec4>),
}

impl NoiseField {
    /// The dimension this field samples.
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::D2(_) => Dimension::D2,
            Self::D3(_) => Dimension::D3,
            Self::D4(_) => Dimension::D4,
        }
    }

    fn mismatch(&self, found: Dimension) -> NoiseError {
        NoiseError::DimensionMismatch {
            expected: self.dimension().get(),
            found: found.get(),
        }
    }

    /// Samples a 2d field.
    pub fn sample2(&self, at: Vec2) -> Result<f32, NoiseError> {
        match self {
            Self::D2(field) => Ok(field.sample_dyn(at)),
            _ => Err(self.mismatch(Dimension::D2)),
        }
    }

    /// Samples a 3d field.
    pub fn sample3(&self, at: Vec3) -> Result<f32, NoiseError> {
        match self {
            Self::D3(field) => Ok(field.sample_dyn(at)),
            _ => Err(self.mismatch(Dimension::D3)),
        }
    }

    /// Samples a 4d field.
    pub fn sample4(&self, at: Vec4) -> Result<f32, NoiseError> {
        match self {
            Self::D4(field) => Ok(field.sample_dyn(at)),
            _ => Err(self.mismatch(Dimension::D4)),
        }
    }
}

macro_rules! with_field {
    ($field:expr, $f:ident => $body:expr) => {
        match $field {
            NoiseField::D2($f) => $body,
            NoiseField::D3($f) => $body,
            NoiseField::D4($f) => $body,
        }
    };
}

impl ConfigurableNoise for NoiseField {
    fn set_channel(&mut self, channel: i32) {
        with_field!(self, field => field.set_channel(channel));
    }

    fn get_channel(&self) -> i32 {
        with_field!(self, field => field.get_channel())
    }

    fn set_frequency(&mut self, frequency: f32) {
        with_field!(self, field => field.set_frequency(frequency));
    }

    fn get_frequency(&self) -> f32 {
        with_field!(self, field => field.get_frequency())
    }
}
