//! Seeded pseudo-random number generator for the samplers.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal, UnitSphere};

/// Odd multiplier used to spread worker stream seeds apart.
const STREAM_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Bunch generation random number generator.
///
/// Every sampler owns exactly one of these. Independent workers must use
/// independent instances, see [`BunchRng::stream`].
///
/// # Examples
///
/// ```rust
/// use bunch_sampling::rng::BunchRng;
///
/// let mut rng = BunchRng::from_seed(42);
/// let u = rng.gen_uniform();
/// assert!((0.0..1.0).contains(&u));
///
/// let s = rng.gen_symmetric();
/// assert!(s > -1.0 && s <= 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct BunchRng {
    inner: StdRng,
    seed: u64,
}

impl BunchRng {
    /// Creates a generator initialised with `seed`.
    ///
    /// The same seed always reproduces the same sequence.
    ///
    /// ```rust
    /// use bunch_sampling::rng::BunchRng;
    ///
    /// let mut a = BunchRng::from_seed(7);
    /// let mut b = BunchRng::from_seed(7);
    /// assert_eq!(a.gen_normal(), b.gen_normal());
    /// ```
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Generator for worker `index` of a run seeded with `seed`.
    ///
    /// Stream 0 is identical to [`from_seed`](Self::from_seed).
    #[inline]
    pub fn stream(seed: u64, index: u64) -> Self {
        Self::from_seed(seed.wrapping_add(index.wrapping_mul(STREAM_STRIDE)))
    }

    /// Returns the seed used for initialisation.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in [0, 1).
    #[inline]
    pub fn gen_uniform(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Standard normal variate via `rand_distr::StandardNormal`.
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Uniform value in (−1, 1], i.e. `1 − 2u`.
    ///
    /// Used to spread a coordinate symmetrically about its centre.
    #[inline]
    pub fn gen_symmetric(&mut self) -> f64 {
        1.0 - 2.0 * self.gen_uniform()
    }

    /// Uniform phase angle in [0, 2π).
    #[inline]
    pub fn gen_phase(&mut self) -> f64 {
        std::f64::consts::TAU * self.gen_uniform()
    }

    /// Isotropic unit direction.
    #[inline]
    pub fn unit_sphere(&mut self) -> Vector3<f64> {
        let [x, y, z]: [f64; 3] = UnitSphere.sample(&mut self.inner);
        Vector3::new(x, y, z)
    }

    /// Fills `buffer` with standard normal variates.
    #[inline]
    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = StandardNormal.sample(&mut self.inner);
        }
    }
}
