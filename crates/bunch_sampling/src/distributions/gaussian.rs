//! Gaussian family: uncorrelated, explicit covariance, and Twiss.
//!
//! All three draw the vector `(x, xp, y, yp, t, δ)` with `δ = ΔE/E0` from a
//! zero-mean multivariate normal and add it to the centre. They differ only
//! in how the 6×6 covariance is built:
//!
//! | Source | Covariance |
//! |--------|------------|
//! | `gauss` | diagonal from `sigma_x`, `sigma_xp`, `sigma_y`, `sigma_yp`, `sigma_t`, `sigma_e` |
//! | `gaussmatrix` | explicit `sigma_matrix`, upper triangle mirrored |
//! | `gausstwiss` | Twiss and dispersion per plane |
//!
//! With `offset_sample_mean` the whole run is pregenerated at begin of run
//! and the realised sample mean is subtracted, so the bunch centroid matches
//! the configured centre exactly.

use bunch_core::math::covariance::symmetric_from_upper;
use bunch_core::math::statistics::RunningMean;
use bunch_core::types::{
    calculate_zp, BunchError, ConfigurationError, FullLocalCoords, GenerationError,
};
use bunch_core::units::C_LIGHT;
use nalgebra::{Matrix6, Vector6};
use tracing::info;

use super::{check_non_negative, check_positive};
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::{BeamDefinition, DistributionType};
use crate::rng::{BunchRng, MultiGaussian};

/// Twiss and dispersion of one transverse plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwissPlane {
    /// Alpha
    pub alpha: f64,
    /// Beta (m)
    pub beta: f64,
    /// Geometric emittance (m)
    pub emittance: f64,
    /// Dispersion (m)
    pub dispersion: f64,
    /// Dispersion derivative
    pub dispersion_prime: f64,
}

impl TwissPlane {
    /// γ = (1 + α²)/β.
    #[inline]
    pub fn gamma(&self) -> f64 {
        (1.0 + self.alpha * self.alpha) / self.beta
    }
}

/// How the covariance is built.
#[derive(Clone, Debug, PartialEq)]
pub enum CovarianceSource {
    /// Independent spreads in (x, xp, y, yp)
    Diagonal {
        /// Horizontal size (m)
        sigma_x: f64,
        /// Horizontal divergence
        sigma_xp: f64,
        /// Vertical size (m)
        sigma_y: f64,
        /// Vertical divergence
        sigma_yp: f64,
    },
    /// Explicit matrix, upper triangle used
    Matrix([[f64; 6]; 6]),
    /// Twiss parameters per plane
    Twiss {
        /// Horizontal plane
        x: TwissPlane,
        /// Vertical plane
        y: TwissPlane,
    },
}

/// Multivariate Gaussian distribution.
#[derive(Clone, Debug)]
pub struct GaussianDistribution {
    kind: DistributionType,
    source: CovarianceSource,
    offset_sample_mean: bool,
    generator: Option<MultiGaussian>,
    pregenerated: Vec<Vector6<f64>>,
    replay_index: usize,
}

impl GaussianDistribution {
    /// Reads the covariance source for `kind`, which must be one of the
    /// three Gaussian tags.
    ///
    /// A `gaussmatrix` without `sigma_matrix` uses the zero matrix, which
    /// fails at initialisation.
    pub fn configure(kind: DistributionType, definition: &BeamDefinition) -> Self {
        let source = match kind {
            DistributionType::GaussMatrix => {
                CovarianceSource::Matrix(definition.sigma_matrix.unwrap_or([[0.0; 6]; 6]))
            }
            DistributionType::GaussTwiss => CovarianceSource::Twiss {
                x: TwissPlane {
                    alpha: definition.alfx,
                    beta: definition.betx,
                    emittance: definition.emitx,
                    dispersion: definition.dispx,
                    dispersion_prime: definition.dispxp,
                },
                y: TwissPlane {
                    alpha: definition.alfy,
                    beta: definition.bety,
                    emittance: definition.emity,
                    dispersion: definition.dispy,
                    dispersion_prime: definition.dispyp,
                },
            },
            _ => CovarianceSource::Diagonal {
                sigma_x: definition.sigma_x,
                sigma_xp: definition.sigma_xp,
                sigma_y: definition.sigma_y,
                sigma_yp: definition.sigma_yp,
            },
        };
        Self {
            kind,
            source,
            offset_sample_mean: definition.offset_sample_mean,
            generator: None,
            pregenerated: Vec::new(),
            replay_index: 0,
        }
    }

    /// `gauss`, `gaussmatrix` or `gausstwiss`.
    pub fn kind(&self) -> DistributionType {
        self.kind
    }

    /// Covariance source.
    pub fn source(&self) -> &CovarianceSource {
        &self.source
    }

    /// Covariance before any positive-definiteness correction.
    pub fn covariance(&self, centre: &BunchCentre) -> Matrix6<f64> {
        let sigma_t2 = centre.sigma_t * centre.sigma_t;
        let sigma_e2 = centre.sigma_e * centre.sigma_e;
        match &self.source {
            CovarianceSource::Diagonal {
                sigma_x,
                sigma_xp,
                sigma_y,
                sigma_yp,
            } => Matrix6::from_diagonal(&Vector6::new(
                sigma_x * sigma_x,
                sigma_xp * sigma_xp,
                sigma_y * sigma_y,
                sigma_yp * sigma_yp,
                sigma_t2,
                sigma_e2,
            )),
            CovarianceSource::Matrix(entries) => symmetric_from_upper(entries),
            CovarianceSource::Twiss { x, y } => {
                let mut m = Matrix6::zeros();
                for (plane, offset) in [(x, 0), (y, 2)] {
                    let d = plane.dispersion;
                    let dp = plane.dispersion_prime;
                    let eps = plane.emittance;
                    m[(offset, offset)] = eps * plane.beta + d * d * sigma_e2;
                    m[(offset, offset + 1)] = -eps * plane.alpha + d * dp * sigma_e2;
                    m[(offset + 1, offset)] = m[(offset, offset + 1)];
                    m[(offset + 1, offset + 1)] = eps * plane.gamma() + dp * dp * sigma_e2;
                    m[(offset, 5)] = d * sigma_e2;
                    m[(5, offset)] = m[(offset, 5)];
                    m[(offset + 1, 5)] = dp * sigma_e2;
                    m[(5, offset + 1)] = m[(offset + 1, 5)];
                }
                m[(4, 4)] = sigma_t2;
                m[(5, 5)] = sigma_e2;
                m
            }
        }
    }

    /// Generator built at initialisation.
    pub fn generator(&self) -> Option<&MultiGaussian> {
        self.generator.as_ref()
    }

    fn next_vector(&mut self, rng: &mut BunchRng) -> Result<Vector6<f64>, GenerationError> {
        if !self.pregenerated.is_empty() {
            let v = self.pregenerated[self.replay_index % self.pregenerated.len()];
            self.replay_index += 1;
            return Ok(v);
        }
        let generator = self.generator.as_ref().ok_or(GenerationError::NotInitialised {
            distribution: self.kind.as_str(),
        })?;
        Ok(generator.sample(rng))
    }
}

impl LocalDistribution for GaussianDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.source {
            CovarianceSource::Diagonal {
                sigma_x,
                sigma_xp,
                sigma_y,
                sigma_yp,
            } => {
                check_non_negative("sigma_x", *sigma_x)?;
                check_non_negative("sigma_xp", *sigma_xp)?;
                check_non_negative("sigma_y", *sigma_y)?;
                check_non_negative("sigma_yp", *sigma_yp)
            }
            CovarianceSource::Matrix(entries) => {
                const DIAGONAL: [&str; 6] = [
                    "sigma_matrix[0][0]",
                    "sigma_matrix[1][1]",
                    "sigma_matrix[2][2]",
                    "sigma_matrix[3][3]",
                    "sigma_matrix[4][4]",
                    "sigma_matrix[5][5]",
                ];
                for (i, name) in DIAGONAL.iter().enumerate() {
                    check_non_negative(name, entries[i][i])?;
                }
                Ok(())
            }
            CovarianceSource::Twiss { x, y } => {
                check_positive("betx", x.beta)?;
                check_positive("bety", y.beta)?;
                check_positive("emitx", x.emittance)?;
                check_positive("emity", y.emittance)
            }
        }
    }

    fn initialise(&mut self, centre: &BunchCentre) -> Result<(), BunchError> {
        let generator = MultiGaussian::new(Vector6::zeros(), self.covariance(centre))?;
        self.generator = Some(generator);
        Ok(())
    }

    fn begin_of_run(
        &mut self,
        _centre: &BunchCentre,
        rng: &mut BunchRng,
        number_of_events: usize,
        _batch_mode: bool,
    ) -> Result<(), BunchError> {
        if !self.offset_sample_mean || number_of_events == 0 {
            return Ok(());
        }
        let generator = self.generator.as_ref().ok_or(GenerationError::NotInitialised {
            distribution: self.kind.as_str(),
        })?;

        let mut mean = RunningMean::<6>::new();
        let mut vectors = Vec::with_capacity(number_of_events);
        for _ in 0..number_of_events {
            let v = generator.sample(rng);
            mean.push(&v.into());
            vectors.push(v);
        }
        let residual = Vector6::from(mean.mean());
        for v in vectors.iter_mut() {
            *v -= residual;
        }
        info!(
            events = number_of_events,
            "Pregenerated Gaussian coordinates with sample mean offset removed"
        );
        self.pregenerated = vectors;
        self.replay_index = 0;
        Ok(())
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let v = self.next_vector(rng)?;
        let xp = centre.xp0 + v[1];
        let yp = centre.yp0 + v[3];
        let zp = calculate_zp(xp, yp, centre.zp0)?;
        let dt = v[4];
        let z = centre.z0 + C_LIGHT * dt;

        Ok(FullLocalCoords {
            x: centre.x0 + v[0],
            y: centre.y0 + v[2],
            z,
            xp,
            yp,
            zp,
            t: centre.t0 + dt,
            s: centre.s_at(z),
            total_energy: centre.e0 * (1.0 + v[5]),
            weight: 1.0,
        })
    }
}
