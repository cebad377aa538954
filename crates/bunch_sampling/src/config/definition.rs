//! External beam-definition record.

use serde::{Deserialize, Serialize};

use super::CompositeWeight;

/// All parameters a sampler may read, as supplied by the user.
///
/// Every field has a default, so any subset of keys deserialises. Zero means
/// "unset" for the optional floating-point parameters; window bounds default
/// to ±∞ (no cut).
///
/// # Examples
///
/// ```rust
/// use bunch_sampling::config::BeamDefinition;
///
/// let def: BeamDefinition = toml::from_str(r#"
///     distr_type = "gauss"
///     sigma_x = 1.0e-3
///     sigma_e = 1.0e-3
/// "#).unwrap();
/// assert_eq!(def.distr_type, "gauss");
/// assert_eq!(def.sigma_y, 0.0);
/// assert_eq!(def.halo_x_cut_outer, f64::INFINITY);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamDefinition {
    // --- distribution selection ---
    /// Distribution tag, e.g. `gauss` or `composite`
    pub distr_type: String,
    /// Horizontal child of a `composite` distribution
    pub x_distr_type: String,
    /// Vertical child of a `composite` distribution
    pub y_distr_type: String,
    /// Longitudinal child of a `composite` distribution
    pub z_distr_type: String,
    /// Spatial child of a `compositesde` distribution
    pub space_distr_type: String,
    /// Direction child of a `compositesde` distribution
    pub direction_distr_type: String,
    /// Energy child of a `compositesde` distribution
    pub energy_distr_type: String,
    /// How composite distributions combine child weights
    pub composite_weight: CompositeWeight,

    // --- file replay ---
    /// Input file for file-based distributions
    pub distr_file: String,
    /// Input file format (event generator only)
    pub distr_file_format: String,
    /// Loop the file indefinitely
    pub distr_file_loop: bool,
    /// Number of passes through the file when not looping indefinitely
    pub distr_file_loop_n_times: usize,
    /// Suggest the number of file entries as the number of events
    pub distr_file_match_length: bool,
    /// Leading lines to skip
    pub n_lines_ignore: usize,

    // --- centre ---
    /// Horizontal offset (m)
    pub x0: f64,
    /// Vertical offset (m)
    pub y0: f64,
    /// Longitudinal offset (m)
    pub z0: f64,
    /// Curvilinear start position (m)
    pub s0: f64,
    /// Horizontal direction component
    pub xp0: f64,
    /// Vertical direction component
    pub yp0: f64,
    /// Sign hint for the longitudinal direction component
    pub zp0: f64,
    /// Time offset (s)
    pub t0: f64,
    /// Central total energy (GeV)
    pub e0: f64,
    /// Central kinetic energy (GeV)
    pub ek0: f64,
    /// Central momentum (GeV/c)
    pub p0: f64,
    /// Rotation of the transverse plane (rad)
    pub tilt: f64,

    // --- spreads ---
    /// Relative total energy spread
    pub sigma_e: f64,
    /// Relative momentum spread
    pub sigma_p: f64,
    /// Relative kinetic energy spread
    pub sigma_ek: f64,
    /// Time spread (s)
    pub sigma_t: f64,
    /// Horizontal size (m)
    pub sigma_x: f64,
    /// Horizontal divergence
    pub sigma_xp: f64,
    /// Vertical size (m)
    pub sigma_y: f64,
    /// Vertical divergence
    pub sigma_yp: f64,
    /// Explicit covariance in (x, xp, y, yp, t, δ); upper triangle is used
    pub sigma_matrix: Option<[[f64; 6]; 6]>,
    /// Subtract the realised sample mean from pregenerated Gaussian particles
    pub offset_sample_mean: bool,

    // --- envelopes ---
    /// Horizontal half-width (m)
    pub envelope_x: f64,
    /// Horizontal direction half-width
    pub envelope_xp: f64,
    /// Vertical half-width (m)
    pub envelope_y: f64,
    /// Vertical direction half-width
    pub envelope_yp: f64,
    /// Longitudinal half-width (m)
    pub envelope_z: f64,
    /// Longitudinal direction half-width
    pub envelope_zp: f64,
    /// Time half-width (s)
    pub envelope_t: f64,
    /// Relative energy half-width
    pub envelope_e: f64,
    /// Radius of the `circle` position disk (m)
    pub envelope_r: f64,
    /// Radius of the `circle` direction disk
    pub envelope_rp: f64,

    // --- ring ---
    /// Inner radius (m)
    pub r_min: f64,
    /// Outer radius (m)
    pub r_max: f64,

    // --- elliptical shell ---
    /// Horizontal shell semi-axis (m)
    pub shell_x: f64,
    /// Horizontal direction shell semi-axis
    pub shell_xp: f64,
    /// Vertical shell semi-axis (m)
    pub shell_y: f64,
    /// Vertical direction shell semi-axis
    pub shell_yp: f64,
    /// Horizontal shell thickness (m)
    pub shell_x_width: f64,
    /// Horizontal direction shell thickness
    pub shell_xp_width: f64,
    /// Vertical shell thickness (m)
    pub shell_y_width: f64,
    /// Vertical direction shell thickness
    pub shell_yp_width: f64,

    // --- Twiss ---
    /// Horizontal alpha
    pub alfx: f64,
    /// Vertical alpha
    pub alfy: f64,
    /// Horizontal beta (m)
    pub betx: f64,
    /// Vertical beta (m)
    pub bety: f64,
    /// Horizontal geometric emittance (m)
    pub emitx: f64,
    /// Vertical geometric emittance (m)
    pub emity: f64,
    /// Horizontal dispersion (m)
    pub dispx: f64,
    /// Horizontal dispersion derivative
    pub dispxp: f64,
    /// Vertical dispersion (m)
    pub dispy: f64,
    /// Vertical dispersion derivative
    pub dispyp: f64,

    // --- halo ---
    /// Inner horizontal halo edge in beam sigma
    pub halo_n_sigma_x_inner: f64,
    /// Outer horizontal halo edge in beam sigma
    pub halo_n_sigma_x_outer: f64,
    /// Inner vertical halo edge in beam sigma
    pub halo_n_sigma_y_inner: f64,
    /// Outer vertical halo edge in beam sigma
    pub halo_n_sigma_y_outer: f64,
    /// Reject when |x| and |y| are both below their inner cuts (m)
    pub halo_x_cut_inner: f64,
    /// Reject when |x| exceeds this (m)
    pub halo_x_cut_outer: f64,
    /// Inner vertical cut (m)
    pub halo_y_cut_inner: f64,
    /// Outer vertical cut (m)
    pub halo_y_cut_outer: f64,
    /// Inner horizontal direction cut
    pub halo_xp_cut_inner: f64,
    /// Outer horizontal direction cut
    pub halo_xp_cut_outer: f64,
    /// Inner vertical direction cut
    pub halo_yp_cut_inner: f64,
    /// Outer vertical direction cut
    pub halo_yp_cut_outer: f64,
    /// Halo weighting function: flat, one, oneoverr, oneoverrsqrd or exp
    pub halo_pdf_type: String,
    /// Exponent of the halo weighting function
    pub halo_pdf_weight: f64,

    // --- bunch timing ---
    /// Bunch repetition frequency (Hz)
    pub bunch_frequency: f64,
    /// Bunch period (s)
    pub bunch_period: f64,
    /// Index of the first bunch
    pub bunch_offset: usize,
    /// Events per bunch
    pub events_per_bunch: usize,

    // --- event generator filter ---
    /// Minimum x (m)
    pub eventgenerator_min_x: f64,
    /// Maximum x (m)
    pub eventgenerator_max_x: f64,
    /// Minimum y (m)
    pub eventgenerator_min_y: f64,
    /// Maximum y (m)
    pub eventgenerator_max_y: f64,
    /// Minimum z (m)
    pub eventgenerator_min_z: f64,
    /// Maximum z (m)
    pub eventgenerator_max_z: f64,
    /// Minimum xp
    pub eventgenerator_min_xp: f64,
    /// Maximum xp
    pub eventgenerator_max_xp: f64,
    /// Minimum yp
    pub eventgenerator_min_yp: f64,
    /// Maximum yp
    pub eventgenerator_max_yp: f64,
    /// Minimum zp
    pub eventgenerator_min_zp: f64,
    /// Maximum zp
    pub eventgenerator_max_zp: f64,
    /// Minimum transverse direction magnitude √(xp² + yp²)
    pub eventgenerator_min_rp: f64,
    /// Maximum transverse direction magnitude
    pub eventgenerator_max_rp: f64,
    /// Minimum time (s)
    pub eventgenerator_min_t: f64,
    /// Maximum time (s)
    pub eventgenerator_max_t: f64,
    /// Minimum kinetic energy (GeV)
    pub eventgenerator_min_ek: f64,
    /// Maximum kinetic energy (GeV)
    pub eventgenerator_max_ek: f64,
    /// Allowed particles as PDG codes or names; empty allows all
    pub eventgenerator_particles: String,
    /// Log each particle skipped because its PDG code is unknown
    pub eventgenerator_warn_skipped_particles: bool,

    // --- one-turn map ---
    /// One-turn map table for recirculating machines
    pub one_turn_map_file: String,
}

impl Default for BeamDefinition {
    fn default() -> Self {
        let inf = f64::INFINITY;
        Self {
            distr_type: "reference".to_string(),
            x_distr_type: String::new(),
            y_distr_type: String::new(),
            z_distr_type: String::new(),
            space_distr_type: String::new(),
            direction_distr_type: String::new(),
            energy_distr_type: String::new(),
            composite_weight: CompositeWeight::default(),
            distr_file: String::new(),
            distr_file_format: String::new(),
            distr_file_loop: false,
            distr_file_loop_n_times: 1,
            distr_file_match_length: false,
            n_lines_ignore: 0,
            x0: 0.0,
            y0: 0.0,
            z0: 0.0,
            s0: 0.0,
            xp0: 0.0,
            yp0: 0.0,
            zp0: 0.0,
            t0: 0.0,
            e0: 0.0,
            ek0: 0.0,
            p0: 0.0,
            tilt: 0.0,
            sigma_e: 0.0,
            sigma_p: 0.0,
            sigma_ek: 0.0,
            sigma_t: 0.0,
            sigma_x: 0.0,
            sigma_xp: 0.0,
            sigma_y: 0.0,
            sigma_yp: 0.0,
            sigma_matrix: None,
            offset_sample_mean: false,
            envelope_x: 0.0,
            envelope_xp: 0.0,
            envelope_y: 0.0,
            envelope_yp: 0.0,
            envelope_z: 0.0,
            envelope_zp: 0.0,
            envelope_t: 0.0,
            envelope_e: 0.0,
            envelope_r: 0.0,
            envelope_rp: 0.0,
            r_min: 0.0,
            r_max: 0.0,
            shell_x: 0.0,
            shell_xp: 0.0,
            shell_y: 0.0,
            shell_yp: 0.0,
            shell_x_width: 0.0,
            shell_xp_width: 0.0,
            shell_y_width: 0.0,
            shell_yp_width: 0.0,
            alfx: 0.0,
            alfy: 0.0,
            betx: 0.0,
            bety: 0.0,
            emitx: 0.0,
            emity: 0.0,
            dispx: 0.0,
            dispxp: 0.0,
            dispy: 0.0,
            dispyp: 0.0,
            halo_n_sigma_x_inner: 0.0,
            halo_n_sigma_x_outer: 1.0,
            halo_n_sigma_y_inner: 0.0,
            halo_n_sigma_y_outer: 1.0,
            halo_x_cut_inner: 0.0,
            halo_x_cut_outer: inf,
            halo_y_cut_inner: 0.0,
            halo_y_cut_outer: inf,
            halo_xp_cut_inner: 0.0,
            halo_xp_cut_outer: inf,
            halo_yp_cut_inner: 0.0,
            halo_yp_cut_outer: inf,
            halo_pdf_type: "flat".to_string(),
            halo_pdf_weight: 1.0,
            bunch_frequency: 0.0,
            bunch_period: 0.0,
            bunch_offset: 0,
            events_per_bunch: 1,
            eventgenerator_min_x: -inf,
            eventgenerator_max_x: inf,
            eventgenerator_min_y: -inf,
            eventgenerator_max_y: inf,
            eventgenerator_min_z: -inf,
            eventgenerator_max_z: inf,
            eventgenerator_min_xp: -inf,
            eventgenerator_max_xp: inf,
            eventgenerator_min_yp: -inf,
            eventgenerator_max_yp: inf,
            eventgenerator_min_zp: -inf,
            eventgenerator_max_zp: inf,
            eventgenerator_min_rp: -inf,
            eventgenerator_max_rp: inf,
            eventgenerator_min_t: -inf,
            eventgenerator_max_t: inf,
            eventgenerator_min_ek: -inf,
            eventgenerator_max_ek: inf,
            eventgenerator_particles: String::new(),
            eventgenerator_warn_skipped_particles: false,
            one_turn_map_file: String::new(),
        }
    }
}

impl BeamDefinition {
    /// Definition of the given distribution type with all other fields at
    /// their defaults.
    pub fn of_type(distr_type: impl Into<String>) -> Self {
        Self {
            distr_type: distr_type.into(),
            ..Self::default()
        }
    }
}
