//! Twiss halo with emittance shells, absolute cuts and weighting.
//!
//! Candidates are drawn uniformly in the bounding box of the outer emittance
//! ellipse of each plane and then filtered:
//!
//! 1. both planes inside their inner (core) ellipse → reject
//! 2. either plane outside its outer ellipse → reject
//! 3. both `|x|`, `|y|` inside the inner position cuts → reject; either
//!    outside the outer position cuts → reject; same for the slopes
//! 4. weighting function: reject if `u > w_x` and `u' > w_y`
//!
//! The single-particle emittance `W = γx² + 2αxx' + βx'²` drives both the
//! shells and the weighting function.

use std::fmt;
use std::str::FromStr;

use bunch_core::math::ellipse::courant_snyder_invariant;
use bunch_core::types::{calculate_zp, ConfigurationError, FullLocalCoords, GenerationError};
use tracing::warn;

use super::{check_inner_outer, check_positive};
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

/// Consecutive rejections between two warnings.
pub const TRIALS_BETWEEN_WARNINGS: u64 = 1_000_000;

/// Acceptance weighting applied after the geometric cuts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HaloWeight {
    /// Every geometric survivor is accepted
    #[default]
    Flat,
    /// `(W_inner / W)^p`
    OneOverR,
    /// `(W_inner / W)^(2p)`
    OneOverRSquared,
    /// `exp(−W p / W_inner)`
    Exp,
}

impl HaloWeight {
    /// Acceptance probability for a particle of emittance `emittance`
    /// against the inner reference `inner` with exponent `power`.
    pub fn acceptance(&self, emittance: f64, inner: f64, power: f64) -> f64 {
        match self {
            HaloWeight::Flat => 1.0,
            HaloWeight::OneOverR => (inner / emittance).powf(power),
            HaloWeight::OneOverRSquared => (inner / emittance).powf(2.0 * power),
            HaloWeight::Exp => (-emittance * power / inner).exp(),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HaloWeight::Flat => "flat",
            HaloWeight::OneOverR => "oneoverr",
            HaloWeight::OneOverRSquared => "oneoverrsqrd",
            HaloWeight::Exp => "exp",
        }
    }
}

impl fmt::Display for HaloWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HaloWeight {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "flat" | "one" => Ok(HaloWeight::Flat),
            "oneoverr" => Ok(HaloWeight::OneOverR),
            "oneoverrsqrd" => Ok(HaloWeight::OneOverRSquared),
            "exp" => Ok(HaloWeight::Exp),
            _ => Err(ConfigurationError::UnknownWeightFunction(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct HaloPlane {
    alpha: f64,
    beta: f64,
    gamma: f64,
    emittance: f64,
    n_sigma_inner: f64,
    n_sigma_outer: f64,
    cut_inner: f64,
    cut_outer: f64,
    slope_cut_inner: f64,
    slope_cut_outer: f64,
}

impl HaloPlane {
    fn emit_inner(&self) -> f64 {
        self.emittance * self.n_sigma_inner * self.n_sigma_inner
    }

    fn emit_outer(&self) -> f64 {
        self.emittance * self.n_sigma_outer * self.n_sigma_outer
    }

    fn half_widths(&self) -> (f64, f64) {
        let outer = self.emit_outer();
        ((outer * self.beta).sqrt(), (outer * self.gamma).sqrt())
    }

    fn invariant(&self, x: f64, xp: f64) -> f64 {
        courant_snyder_invariant(self.alpha, self.beta, self.gamma, x, xp)
    }
}

/// Halo distribution in both transverse planes.
#[derive(Clone, Debug, PartialEq)]
pub struct HaloDistribution {
    x: HaloPlane,
    y: HaloPlane,
    pdf_type: String,
    weight: Option<HaloWeight>,
    pdf_power: f64,
    consecutive_rejections: u64,
}

impl HaloDistribution {
    /// Reads Twiss parameters, shells, cuts and the weighting function.
    pub fn configure(definition: &BeamDefinition) -> Self {
        let gamma = |alpha: f64, beta: f64| (1.0 + alpha * alpha) / beta;
        Self {
            x: HaloPlane {
                alpha: definition.alfx,
                beta: definition.betx,
                gamma: gamma(definition.alfx, definition.betx),
                emittance: definition.emitx,
                n_sigma_inner: definition.halo_n_sigma_x_inner,
                n_sigma_outer: definition.halo_n_sigma_x_outer,
                cut_inner: definition.halo_x_cut_inner,
                cut_outer: definition.halo_x_cut_outer,
                slope_cut_inner: definition.halo_xp_cut_inner,
                slope_cut_outer: definition.halo_xp_cut_outer,
            },
            y: HaloPlane {
                alpha: definition.alfy,
                beta: definition.bety,
                gamma: gamma(definition.alfy, definition.bety),
                emittance: definition.emity,
                n_sigma_inner: definition.halo_n_sigma_y_inner,
                n_sigma_outer: definition.halo_n_sigma_y_outer,
                cut_inner: definition.halo_y_cut_inner,
                cut_outer: definition.halo_y_cut_outer,
                slope_cut_inner: definition.halo_yp_cut_inner,
                slope_cut_outer: definition.halo_yp_cut_outer,
            },
            pdf_type: definition.halo_pdf_type.clone(),
            weight: definition.halo_pdf_type.parse().ok(),
            pdf_power: definition.halo_pdf_weight,
            consecutive_rejections: 0,
        }
    }

    /// Parsed weighting function, `None` if the name was not recognised.
    pub fn weight(&self) -> Option<HaloWeight> {
        self.weight
    }

    /// Inner and outer emittance of the horizontal plane.
    pub fn emittance_window_x(&self) -> (f64, f64) {
        (self.x.emit_inner(), self.x.emit_outer())
    }

    /// Inner and outer emittance of the vertical plane.
    pub fn emittance_window_y(&self) -> (f64, f64) {
        (self.y.emit_inner(), self.y.emit_outer())
    }

    /// Courant–Snyder invariants of an offset from the centre.
    pub fn invariants(&self, dx: f64, dxp: f64, dy: f64, dyp: f64) -> (f64, f64) {
        (self.x.invariant(dx, dxp), self.y.invariant(dy, dyp))
    }

    fn passes_geometry(&self, dx: f64, dxp: f64, dy: f64, dyp: f64, wx: f64, wy: f64) -> bool {
        let (x, y) = (&self.x, &self.y);
        if wx < x.emit_inner() && wy < y.emit_inner() {
            return false;
        }
        if wx > x.emit_outer() || wy > y.emit_outer() {
            return false;
        }
        if dx.abs() < x.cut_inner && dy.abs() < y.cut_inner {
            return false;
        }
        if dx.abs() > x.cut_outer || dy.abs() > y.cut_outer {
            return false;
        }
        if dxp.abs() < x.slope_cut_inner && dyp.abs() < y.slope_cut_inner {
            return false;
        }
        if dxp.abs() > x.slope_cut_outer || dyp.abs() > y.slope_cut_outer {
            return false;
        }
        true
    }

    fn record_rejection(&mut self) {
        self.consecutive_rejections += 1;
        if self.consecutive_rejections % TRIALS_BETWEEN_WARNINGS == 0 {
            warn!(
                trials = self.consecutive_rejections,
                "Halo distribution has rejected many consecutive candidates; check the shells and cuts"
            );
        }
    }
}

impl LocalDistribution for HaloDistribution {
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
        )?;
        check_inner_outer("halo_x_cut_inner/halo_x_cut_outer", self.x.cut_inner, self.x.cut_outer)?;
        check_inner_outer("halo_y_cut_inner/halo_y_cut_outer", self.y.cut_inner, self.y.cut_outer)?;
        check_inner_outer(
            "halo_xp_cut_inner/halo_xp_cut_outer",
            self.x.slope_cut_inner,
            self.x.slope_cut_outer,
        )?;
        check_inner_outer(
            "halo_yp_cut_inner/halo_yp_cut_outer",
            self.y.slope_cut_inner,
            self.y.slope_cut_outer,
        )?;

        let weight = self
            .weight
            .ok_or_else(|| ConfigurationError::UnknownWeightFunction(self.pdf_type.clone()))?;
        if weight != HaloWeight::Flat {
            // The weights are relative to the inner shell, which must exist.
            for (name, inner) in [
                ("halo_n_sigma_x_inner", self.x.n_sigma_inner),
                ("halo_n_sigma_y_inner", self.y.n_sigma_inner),
            ] {
                if !(inner > 0.0) {
                    return Err(ConfigurationError::InvalidParameter {
                        name,
                        value: inner,
                        reason: format!("must be positive for the '{weight}' weighting function"),
                    });
                }
            }
        }
        Ok(())
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let (x_max, xp_max) = self.x.half_widths();
        let (y_max, yp_max) = self.y.half_widths();
        let weight = self.weight.unwrap_or_default();

        let (dx, dxp, dy, dyp) = loop {
            let dx = x_max * rng.gen_symmetric();
            let dxp = xp_max * rng.gen_symmetric();
            let dy = y_max * rng.gen_symmetric();
            let dyp = yp_max * rng.gen_symmetric();

            let (wx, wy) = self.invariants(dx, dxp, dy, dyp);
            if !self.passes_geometry(dx, dxp, dy, dyp, wx, wy) {
                self.record_rejection();
                continue;
            }

            let accept_x = weight.acceptance(wx, self.x.emit_inner(), self.pdf_power);
            let accept_y = weight.acceptance(wy, self.y.emit_inner(), self.pdf_power);
            if rng.gen_uniform() > accept_x && rng.gen_uniform() > accept_y {
                self.record_rejection();
                continue;
            }
            break (dx, dxp, dy, dyp);
        };
        self.consecutive_rejections = 0;

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
