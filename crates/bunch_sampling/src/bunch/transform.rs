//! Local-to-global coordinate transform.
//!
//! Two paths convert generator-local coordinates into the global frame:
//!
//! - **flat**: a fixed rigid transform (the beamline placement) applied
//!   directly; used when the bunch starts at or before the beamline start
//! - **curvilinear**: the local `z` is taken as a path-length offset from
//!   `s0` and resolved through the [`BeamlineQuery`]; used when `s0` lies
//!   beyond the beamline start
//!
//! In both cases the injection point is nudged back by
//! [`LENGTH_SAFETY_LARGE`] along its local −z so it never starts exactly on
//! a geometry boundary.

use std::fmt;
use std::sync::{Arc, OnceLock};

use bunch_core::beamline::BeamlineQuery;
use bunch_core::types::{FullGlobalCoords, FullLocalCoords, GenerationError, GlobalCoords};
use bunch_core::units::{C_LIGHT, CURVILINEAR_S_TOLERANCE, LENGTH_SAFETY_LARGE};
use nalgebra::{Isometry3, Point3};
use tracing::debug;

use super::BunchTiming;

/// Closure that locates the beamline on first curvilinear use.
pub type BeamlineResolver = Arc<dyn Fn() -> Option<Arc<dyn BeamlineQuery>> + Send + Sync>;

/// How the transform engine obtains its beamline.
#[derive(Clone, Default)]
pub enum BeamlineHandle {
    /// No beamline; only the flat path is available.
    #[default]
    None,
    /// Beamline known at construction.
    Resolved(Arc<dyn BeamlineQuery>),
    /// Beamline looked up once, when first needed.
    Deferred(BeamlineResolver),
}

impl BeamlineHandle {
    /// Handle to an existing beamline.
    pub fn resolved(beamline: Arc<dyn BeamlineQuery>) -> Self {
        Self::Resolved(beamline)
    }

    /// Handle resolved lazily through `resolver`.
    pub fn deferred<F>(resolver: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn BeamlineQuery>> + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(resolver))
    }

    fn resolve(&self) -> Option<Arc<dyn BeamlineQuery>> {
        match self {
            Self::None => None,
            Self::Resolved(beamline) => Some(Arc::clone(beamline)),
            Self::Deferred(resolver) => resolver(),
        }
    }
}

impl fmt::Debug for BeamlineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("BeamlineHandle::None"),
            Self::Resolved(_) => f.write_str("BeamlineHandle::Resolved"),
            Self::Deferred(_) => f.write_str("BeamlineHandle::Deferred"),
        }
    }
}

/// Applies tilt, the flat or curvilinear transform, and bunch timing.
///
/// # Examples
///
/// ```rust
/// use bunch_core::types::FullLocalCoords;
/// use bunch_sampling::bunch::{BeamlineHandle, BunchTiming, CoordinateTransformEngine};
/// use nalgebra::Isometry3;
///
/// let engine = CoordinateTransformEngine::new(
///     Isometry3::translation(1.0, 0.0, 0.0),
///     0.0,
///     0.0,
///     0.0,
///     BeamlineHandle::None,
/// );
/// let out = engine
///     .apply_transform(FullLocalCoords::default(), &BunchTiming::default())
///     .unwrap();
/// assert!((out.global.x - 1.0).abs() < 1e-12);
/// assert!(out.beamline_index.is_none());
/// ```
pub struct CoordinateTransformEngine {
    tilt: f64,
    /// Flat transform including the length-safety nudge
    flat_transform: Isometry3<f64>,
    beamline_s: f64,
    s0: f64,
    handle: BeamlineHandle,
    resolved: OnceLock<Option<Arc<dyn BeamlineQuery>>>,
}

impl CoordinateTransformEngine {
    /// Creates the engine.
    ///
    /// `beamline_transform` places the beamline start in the global frame and
    /// `beamline_s` is the path length at that start.
    pub fn new(
        beamline_transform: Isometry3<f64>,
        beamline_s: f64,
        s0: f64,
        tilt: f64,
        handle: BeamlineHandle,
    ) -> Self {
        Self {
            tilt,
            flat_transform: beamline_transform
                * Isometry3::translation(0.0, 0.0, -LENGTH_SAFETY_LARGE),
            beamline_s,
            s0,
            handle,
            resolved: OnceLock::new(),
        }
    }

    /// Path length at the beamline start (m).
    #[inline]
    pub fn beamline_s(&self) -> f64 {
        self.beamline_s
    }

    /// True if coordinates are resolved through the beamline.
    #[inline]
    pub fn uses_curvilinear(&self) -> bool {
        self.s0 > self.beamline_s
    }

    /// The beamline, resolving the handle on first call.
    pub fn beamline(&self) -> Option<&Arc<dyn BeamlineQuery>> {
        self.resolved
            .get_or_init(|| {
                let beamline = self.handle.resolve();
                debug!(found = beamline.is_some(), "Resolved beamline handle");
                beamline
            })
            .as_ref()
    }

    /// Rotates `(x, y)` and `(xp, yp)` in place by the tilt angle.
    pub fn apply_tilt(&self, local: &mut FullLocalCoords) {
        if self.tilt == 0.0 {
            return;
        }
        let (sin, cos) = self.tilt.sin_cos();
        let (x, y) = (local.x, local.y);
        local.x = x * cos - y * sin;
        local.y = x * sin + y * cos;
        let (xp, yp) = (local.xp, local.yp);
        local.xp = xp * cos - yp * sin;
        local.yp = xp * sin + yp * cos;
    }

    /// Full transform: tilt, flat or curvilinear path, then bunch timing.
    ///
    /// The beamline start S is added to the returned local S.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`apply_curvilinear_transform`](Self::apply_curvilinear_transform).
    pub fn apply_transform(
        &self,
        mut local: FullLocalCoords,
        timing: &BunchTiming,
    ) -> Result<FullGlobalCoords, GenerationError> {
        self.apply_tilt(&mut local);
        let mut result = if self.uses_curvilinear() {
            self.apply_curvilinear_transform(local)?
        } else {
            self.apply_flat_transform(local)
        };
        result.global.t += timing.time_offset();
        result.local.s += self.beamline_s;
        Ok(result)
    }

    /// Applies the fixed beamline placement to the local coordinates.
    pub fn apply_flat_transform(&self, local: FullLocalCoords) -> FullGlobalCoords {
        let position = self.flat_transform * local.coords().position();
        let direction = self.flat_transform.rotation * local.coords().direction();
        FullGlobalCoords {
            local,
            global: GlobalCoords::from_parts(position, direction, local.t),
            beamline_index: None,
        }
    }

    /// Resolves `S = s0 + z` on the beamline.
    ///
    /// Global time is `S/c` plus the local time.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::NoBeamline`] if the handle resolves to nothing
    /// - [`GenerationError::OutsideBeamline`] if S lies more than 1 m outside
    ///   the beamline range or the beamline cannot resolve the point
    pub fn apply_curvilinear_transform(
        &self,
        local: FullLocalCoords,
    ) -> Result<FullGlobalCoords, GenerationError> {
        let beamline = self.beamline().ok_or(GenerationError::NoBeamline)?;
        let s = self.s0 + local.z;
        let (s_min, s_max) = (beamline.s_min(), beamline.s_max());
        let outside = GenerationError::OutsideBeamline { s, s_min, s_max };
        if !(s >= s_min - CURVILINEAR_S_TOLERANCE && s <= s_max + CURVILINEAR_S_TOLERANCE) {
            return Err(outside);
        }
        let frame = beamline.frame_at(s, local.x, local.y).ok_or(outside)?;

        let position = frame.transform * Point3::new(0.0, 0.0, -LENGTH_SAFETY_LARGE);
        let direction = frame.transform.rotation * local.coords().direction();
        Ok(FullGlobalCoords {
            local,
            global: GlobalCoords::from_parts(position, direction, s / C_LIGHT + local.t),
            beamline_index: frame.element_index,
        })
    }
}

impl fmt::Debug for CoordinateTransformEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateTransformEngine")
            .field("tilt", &self.tilt)
            .field("beamline_s", &self.beamline_s)
            .field("s0", &self.s0)
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bunch_core::beamline::SegmentedBeamline;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn local(x: f64, y: f64, z: f64, xp: f64, yp: f64) -> FullLocalCoords {
        FullLocalCoords {
            x,
            y,
            z,
            xp,
            yp,
            zp: (1.0 - xp * xp - yp * yp).sqrt(),
            ..FullLocalCoords::default()
        }
    }

    #[test]
    fn test_tilt_rotates_both_planes() {
        let engine = CoordinateTransformEngine::new(
            Isometry3::identity(),
            0.0,
            0.0,
            std::f64::consts::FRAC_PI_2,
            BeamlineHandle::None,
        );
        let mut c = local(1.0, 0.0, 0.0, 0.1, 0.0);
        engine.apply_tilt(&mut c);
        assert_relative_eq!(c.x, 0.0, epsilon = 1e-15);
        assert_relative_eq!(c.y, 1.0, epsilon = 1e-15);
        assert_relative_eq!(c.yp, 0.1, epsilon = 1e-15);
    }

    #[test]
    fn test_flat_path_nudges_back() {
        let engine = CoordinateTransformEngine::new(
            Isometry3::identity(),
            0.0,
            0.0,
            0.0,
            BeamlineHandle::None,
        );
        let out = engine.apply_flat_transform(local(0.0, 0.0, 0.5, 0.0, 0.0));
        assert_relative_eq!(out.global.z, 0.5 - LENGTH_SAFETY_LARGE, epsilon = 1e-15);
    }

    #[test]
    fn test_curvilinear_without_beamline_fails() {
        let engine = CoordinateTransformEngine::new(
            Isometry3::identity(),
            0.0,
            1.0,
            0.0,
            BeamlineHandle::None,
        );
        assert!(engine.uses_curvilinear());
        let err = engine
            .apply_transform(FullLocalCoords::default(), &BunchTiming::default())
            .unwrap_err();
        assert_eq!(err, GenerationError::NoBeamline);
    }

    #[test]
    fn test_curvilinear_range_tolerance() {
        let line: Arc<dyn BeamlineQuery> = Arc::new(SegmentedBeamline::straight(10.0));
        let engine = CoordinateTransformEngine::new(
            Isometry3::identity(),
            0.0,
            10.5,
            0.0,
            BeamlineHandle::resolved(line),
        );
        assert!(engine
            .apply_curvilinear_transform(local(0.0, 0.0, 0.0, 0.0, 0.0))
            .is_ok());
        let err = engine
            .apply_curvilinear_transform(local(0.0, 0.0, 0.6, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, GenerationError::OutsideBeamline { .. }));
    }

    #[test]
    fn test_deferred_handle_resolved_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = BeamlineHandle::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(Arc::new(SegmentedBeamline::straight(5.0)) as Arc<dyn BeamlineQuery>)
        });
        let engine = CoordinateTransformEngine::new(Isometry3::identity(), 0.0, 1.0, 0.0, handle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        for _ in 0..3 {
            let out = engine
                .apply_transform(local(0.0, 0.0, 0.0, 0.0, 0.0), &BunchTiming::default())
                .unwrap();
            assert_eq!(out.beamline_index, Some(0));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_curvilinear_time_and_output_s() {
        let line: Arc<dyn BeamlineQuery> = Arc::new(SegmentedBeamline::straight(10.0));
        let engine = CoordinateTransformEngine::new(
            Isometry3::identity(),
            0.0,
            2.0,
            0.0,
            BeamlineHandle::resolved(line),
        );
        let mut c = local(0.0, 0.0, 1.0, 0.0, 0.0);
        c.t = 1.0e-9;
        c.s = 3.0;
        let out = engine.apply_transform(c, &BunchTiming::default()).unwrap();
        assert_relative_eq!(out.global.t, 3.0 / C_LIGHT + 1.0e-9, max_relative = 1e-12);
        assert_relative_eq!(out.global.z, 3.0 - LENGTH_SAFETY_LARGE, epsilon = 1e-12);
        assert_relative_eq!(out.local.s, 3.0, epsilon = 1e-15);
    }
}
