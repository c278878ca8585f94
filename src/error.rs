//! Error types for constructing noise.
//!
//! Evaluating noise never fails. Everything here is raised while building tables, layers, or configurations.

use thiserror::Error;

/// Errors that can occur while constructing noise.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NoiseError {
    /// The permutation table size was not a power of two in `2..=512`.
    #[error("invalid table size {0}: expected a power of two between 2 and 512")]
    InvalidTableSize(usize),

    /// A fractal was requested with no octaves.
    #[error("invalid octave count {0}: at least one octave is required")]
    InvalidOctaveCount(u32),

    /// The persistence was outside `(0, 1]`.
    #[error("invalid persistence {0}: expected a value in (0, 1]")]
    InvalidPersistence(f32),

    /// The lacunarity was not a positive, finite number.
    #[error("invalid lacunarity {0}: expected a positive finite value")]
    InvalidLacunarity(f32),

    /// A [`ColorRamp`](crate::ramp::ColorRamp) needs at least one stop.
    #[error("a color ramp needs at least one stop")]
    EmptyColorRamp,

    /// A [`ColorStop`](crate::ramp::ColorStop) sat at a NaN or infinite value.
    #[error("invalid color stop value {0}: expected a finite value")]
    InvalidColorStop(f32),

    /// A field was sampled with a position of the wrong dimension.
    #[error("dimension mismatch: field is {expected}D but was sampled in {found}D")]
    DimensionMismatch {
        /// The dimension the field was built for.
        expected: u8,
        /// The dimension of the position passed in.
        found: u8,
    },
}
