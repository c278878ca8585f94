//! Defines the RNG used to build noise tables and warp offsets.
//!
//! [`NoiseRng`] is a small counter based generator, so every table is reproducible bit for bit from its seed,
//! independent of whatever stream a `rand` release happens to ship.
//! It still implements [`RngCore`], and everything that consumes randomness here takes `impl RngCore`,
//! so any other generator can be passed in its place.

use rand::RngCore;

/// A seeded, counter based RNG inspired by [FxHash](https://crates.io/crates/fxhash).
///
/// Each draw hashes an incrementing counter against the seed.
/// Every noise instance owns its own [`NoiseRng`], so tables can be built on many threads at once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoiseRng {
    seed: u32,
    counter: u32,
}

impl NoiseRng {
    /// This is a large prime number with even bit distribution.
    /// This lets use use this as a multiplier in the rng.
    const KEY: u32 = 249_222_277;

    /// Creates a new [`NoiseRng`] from a 64 bit seed.
    ///
    /// The high half is hashed before it is folded into the low half, so seeds below `2^32` are used as is
    /// and seeds differing only in their high half still diverge.
    /// The state is 32 bits, so distinct 64 bit seeds can still collide.
    #[inline]
    pub fn new(seed: u64) -> Self {
        // Odd multiplies and an xorshift are bijective, so only a zero high half leaves the low half as is.
        let high = ((seed >> 32) as u32).wrapping_mul(Self::KEY);
        let high = (high ^ (high >> 15)).wrapping_mul(Self::KEY);
        Self {
            seed: (seed as u32) ^ high,
            counter: 0,
        }
    }

    /// Creates a new [`NoiseRng`] seeded from the thread-local system RNG.
    #[cfg(feature = "std")]
    pub fn from_entropy() -> Self {
        Self::new(rand::rng().next_u64())
    }

    /// The folded 32 bit seed of this rng.
    #[inline]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Based on `input`, generates a random `u32` without advancing the rng.
    #[inline(always)]
    pub fn rand_u32(&self, input: u32) -> u32 {
        let a = input.wrapping_mul(Self::KEY);
        let b = (a ^ input ^ self.seed).wrapping_mul(Self::KEY);
        (b ^ (b >> 15)).wrapping_mul(Self::KEY)
    }

    /// Creates a new [`NoiseRng`] that will operate independently of this one and others that have different `branch_id`s.
    #[inline]
    pub fn branch(&self, branch_id: u32) -> Self {
        Self {
            seed: self.rand_u32(branch_id),
            counter: 0,
        }
    }

    /// Based on `bits`, generates an arbitrary `f32` in range [1, 2).
    /// Only the top 23 bits are used, since the rng puts more entropy in higher bits.
    #[inline(always)]
    #[expect(
        clippy::unusual_byte_groupings,
        reason = "In float rng, we do bit tricks and want to show what each part does."
    )]
    pub fn any_rng_float_32(bits: u32) -> f32 {
        /// Positive sign, exponent of 0, and 23 value bits.
        const BASE_VALUE: u32 = 0b0_01111111_00000000000000000000000;
        f32::from_bits(BASE_VALUE | (bits >> 9))
    }
}

impl RngCore for NoiseRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        let result = self.rand_u32(self.counter);
        self.counter = self.counter.wrapping_add(1);
        result
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let high = self.next_u32() as u64;
        let low = self.next_u32() as u64;
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Draws used when building tables, available on every [`RngCore`].
///
/// These only look at the high bits of each draw, so they behave the same for any generator.
pub trait NoiseRngExt: RngCore {
    /// A uniform `f32` in [0, 1).
    #[inline]
    fn next_unorm(&mut self) -> f32 {
        NoiseRng::any_rng_float_32(self.next_u32()) - 1.0
    }

    /// A uniform `f32` in [-1, 1).
    #[inline]
    fn next_snorm(&mut self) -> f32 {
        (NoiseRng::any_rng_float_32(self.next_u32()) - 1.5) * 2.0
    }

    /// An index in `0..len`, by multiply-shift.
    /// `len` must be non-zero and fit in a `u32`.
    #[inline]
    fn next_index(&mut self, len: usize) -> usize {
        ((self.next_u32() as u64 * len as u64) >> 32) as usize
    }
}

impl<R: RngCore + ?Sized> NoiseRngExt for R {}
