//! Curvilinear beamline queries.
//!
//! The bunch generator treats the beamline as an opaque service: given a path
//! length `S` and transverse offsets `(x, y)` it returns the rigid transform
//! from the curvilinear frame at that point to the global frame. The
//! [`BeamlineQuery`] trait is that contract; [`SegmentedBeamline`] is a
//! reference implementation built from straight and bending elements.
//!
//! ## Example
//!
//! ```
//! use bunch_core::beamline::{BeamlineQuery, SegmentedBeamline};
//! use nalgebra::Point3;
//!
//! let line = SegmentedBeamline::straight(10.0);
//! let frame = line.frame_at(2.0, 0.001, 0.0).unwrap();
//! let origin = frame.transform * Point3::origin();
//! assert!((origin.z - 2.0).abs() < 1e-12);
//! assert_eq!(frame.element_index, Some(0));
//! ```

mod segmented;

pub use segmented::{BeamlineElement, SegmentedBeamline};

use nalgebra::Isometry3;

/// Rigid transform from the curvilinear frame at `(S, x, y)` to the global frame.
///
/// Applying `transform` to the local origin gives the global position of the
/// queried point; its rotation maps local directions to global ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvilinearFrame {
    /// Local-to-global transform
    pub transform: Isometry3<f64>,
    /// Index of the element containing the point, if it lies inside one
    pub element_index: Option<usize>,
}

/// Curvilinear-to-global lookup service.
///
/// Implementations must be shareable between independent samplers.
pub trait BeamlineQuery: Send + Sync {
    /// Transform at path length `s` and transverse offset `(x, y)`.
    ///
    /// Returns `None` if the beamline cannot resolve the point.
    fn frame_at(&self, s: f64, x: f64, y: f64) -> Option<CurvilinearFrame>;

    /// First valid S (m).
    fn s_min(&self) -> f64;

    /// Last valid S (m).
    fn s_max(&self) -> f64;
}
