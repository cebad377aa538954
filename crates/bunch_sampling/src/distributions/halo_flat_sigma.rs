//! Halo flat in beam sigma, uniform along the ellipse perimeter.

use bunch_core::math::ellipse::EllipsePerimeterSampler;
use bunch_core::types::{
    calculate_zp, BunchError, ConfigurationError, FullLocalCoords, GenerationError,
};

use super::{check_inner_outer, check_positive};
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

#[derive(Clone, Debug, PartialEq)]
struct FlatSigmaPlane {
    alpha: f64,
    beta: f64,
    emittance: f64,
    n_sigma_inner: f64,
    n_sigma_outer: f64,
}

impl FlatSigmaPlane {
    fn action(&self, u: f64) -> f64 {
        let n_sigma = self.n_sigma_inner + (self.n_sigma_outer - self.n_sigma_inner) * u;
        self.emittance * n_sigma * n_sigma
    }
}

/// Per plane: `nσ` uniform in `[inner, outer]`, action `W = ε·nσ²`, then a
/// point drawn uniformly along the perimeter of the ellipse of invariant `W`.
///
/// The perimeter tables are built at initialisation.
#[derive(Clone, Debug)]
pub struct HaloFlatSigmaDistribution {
    x: FlatSigmaPlane,
    y: FlatSigmaPlane,
    perimeters: Option<(EllipsePerimeterSampler, EllipsePerimeterSampler)>,
}

impl HaloFlatSigmaDistribution {
    /// Reads Twiss parameters and the n-sigma range of each plane.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            x: FlatSigmaPlane {
                alpha: definition.alfx,
                beta: definition.betx,
                emittance: definition.emitx,
                n_sigma_inner: definition.halo_n_sigma_x_inner,
                n_sigma_outer: definition.halo_n_sigma_x_outer,
            },
            y: FlatSigmaPlane {
                alpha: definition.alfy,
                beta: definition.bety,
                emittance: definition.emity,
                n_sigma_inner: definition.halo_n_sigma_y_inner,
                n_sigma_outer: definition.halo_n_sigma_y_outer,
            },
            perimeters: None,
        }
    }

    /// Perimeter tables `(x, y)` once initialised.
    pub fn perimeters(&self) -> Option<&(EllipsePerimeterSampler, EllipsePerimeterSampler)> {
        self.perimeters.as_ref()
    }
}

fn perimeter_table(
    name: &'static str,
    plane: &FlatSigmaPlane,
) -> Result<EllipsePerimeterSampler, ConfigurationError> {
    EllipsePerimeterSampler::new(plane.alpha, plane.beta).map_err(|e| {
        ConfigurationError::InvalidParameter {
            name,
            value: plane.beta,
            reason: e.to_string(),
        }
    })
}

impl LocalDistribution for HaloFlatSigmaDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("betx", self.x.beta)?;
        check_positive("bety", self.y.beta)?;
        check_positive("emitx", self.x.emittance)?;
        check_positive("emity", self.y.emittance)?;
        check_inner_outer(
            "halo_n_sigma_x_inner/halo_n_sigma_x_outer",
            self.x.n_sigma_inner,
            self.x.n_sigma_outer,
        )?;
        check_inner_outer(
            "halo_n_sigma_y_inner/halo_n_sigma_y_outer",
            self.y.n_sigma_inner,
            self.y.n_sigma_outer,
        )
    }

    fn initialise(&mut self, _centre: &BunchCentre) -> Result<(), BunchError> {
        let x = perimeter_table("betx", &self.x)?;
        let y = perimeter_table("bety", &self.y)?;
        self.perimeters = Some((x, y));
        Ok(())
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let (table_x, table_y) = self
            .perimeters
            .as_ref()
            .ok_or(GenerationError::NotInitialised {
                distribution: "haloflatsigma",
            })?;

        let action_x = self.x.action(rng.gen_uniform());
        let (dx, dxp) = table_x.sample(rng.gen_uniform(), action_x);
        let action_y = self.y.action(rng.gen_uniform());
        let (dy, dyp) = table_y.sample(rng.gen_uniform(), action_y);

        let xp = centre.xp0 + dxp;
        let yp = centre.yp0 + dyp;
        Ok(FullLocalCoords {
            x: centre.x0 + dx,
            y: centre.y0 + dy,
            z: centre.z0,
            xp,
            yp,
            zp: calculate_zp(xp, yp, centre.zp0)?,
            t: centre.t0,
            s: centre.s_at(centre.z0),
            total_energy: centre.e0 * (1.0 + centre.sigma_e * rng.gen_normal()),
            weight: 1.0,
        })
    }
}
