//! Beamline made of straight and horizontally bending elements.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use super::{BeamlineQuery, CurvilinearFrame};
use crate::types::ConfigurationError;

/// Bend angles below this are treated as straight.
const MIN_BEND_ANGLE: f64 = 1e-12;

/// One element of a [`SegmentedBeamline`].
///
/// A positive `angle` bends the reference orbit towards negative x.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamlineElement {
    /// Element name
    pub name: String,
    /// Arc length along the reference orbit (m)
    pub length: f64,
    /// Horizontal bending angle (rad)
    #[serde(default)]
    pub angle: f64,
}

impl BeamlineElement {
    /// Straight element.
    pub fn drift(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
            angle: 0.0,
        }
    }

    /// Bending element.
    pub fn bend(name: impl Into<String>, length: f64, angle: f64) -> Self {
        Self {
            name: name.into(),
            length,
            angle,
        }
    }

    /// Transform from the element entrance to the orbit point `ds` inside it.
    fn local_frame(&self, ds: f64) -> Isometry3<f64> {
        if self.angle.abs() < MIN_BEND_ANGLE {
            return Isometry3::translation(0.0, 0.0, ds);
        }
        let rho = self.length / self.angle;
        let theta = ds / rho;
        Isometry3::from_parts(
            Translation3::new(rho * (theta.cos() - 1.0), 0.0, rho * theta.sin()),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -theta),
        )
    }
}

/// Sequence of elements laid end to end from an origin frame.
///
/// Points before the first element or after the last are extrapolated along
/// a straight line from the respective end; they carry no element index.
#[derive(Clone, Debug)]
pub struct SegmentedBeamline {
    elements: Vec<BeamlineElement>,
    /// Entrance frame of each element
    entrances: Vec<Isometry3<f64>>,
    /// Entrance S of each element
    s_entrances: Vec<f64>,
    s_start: f64,
    s_end: f64,
    exit: Isometry3<f64>,
}

impl SegmentedBeamline {
    /// Lays out the elements starting at `s_start` from the `origin` frame.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if there are no elements or any element
    /// has a non-positive length.
    pub fn new(
        elements: Vec<BeamlineElement>,
        s_start: f64,
        origin: Isometry3<f64>,
    ) -> Result<Self, ConfigurationError> {
        if elements.is_empty() {
            return Err(ConfigurationError::InvalidParameter {
                name: "beamline.elements",
                value: 0.0,
                reason: "beamline needs at least one element".to_string(),
            });
        }
        if let Some(bad) = elements.iter().find(|e| !(e.length > 0.0)) {
            return Err(ConfigurationError::InvalidParameter {
                name: "beamline.length",
                value: bad.length,
                reason: format!("element '{}' must have a positive length", bad.name),
            });
        }

        let mut entrances = Vec::with_capacity(elements.len());
        let mut s_entrances = Vec::with_capacity(elements.len());
        let mut frame = origin;
        let mut s = s_start;
        for element in &elements {
            entrances.push(frame);
            s_entrances.push(s);
            frame *= element.local_frame(element.length);
            s += element.length;
        }

        Ok(Self {
            elements,
            entrances,
            s_entrances,
            s_start,
            s_end: s,
            exit: frame,
        })
    }

    /// Single straight element of the given length along global +z.
    ///
    /// Non-positive lengths produce a zero-length line.
    pub fn straight(length: f64) -> Self {
        let length = length.max(0.0);
        Self {
            elements: vec![BeamlineElement::drift("drift", length)],
            entrances: vec![Isometry3::identity()],
            s_entrances: vec![0.0],
            s_start: 0.0,
            s_end: length,
            exit: Isometry3::translation(0.0, 0.0, length),
        }
    }

    /// Returns the elements.
    #[inline]
    pub fn elements(&self) -> &[BeamlineElement] {
        &self.elements
    }

    /// Total arc length (m).
    #[inline]
    pub fn total_length(&self) -> f64 {
        self.s_end - self.s_start
    }

    /// Reference orbit frame at `s`, without transverse offset.
    fn orbit_frame(&self, s: f64) -> (Isometry3<f64>, Option<usize>) {
        if s < self.s_start {
            return (
                self.entrances[0] * Isometry3::translation(0.0, 0.0, s - self.s_start),
                None,
            );
        }
        if s > self.s_end {
            return (
                self.exit * Isometry3::translation(0.0, 0.0, s - self.s_end),
                None,
            );
        }
        let index = self
            .s_entrances
            .partition_point(|&entrance| entrance <= s)
            .saturating_sub(1)
            .min(self.elements.len() - 1);
        let ds = s - self.s_entrances[index];
        (
            self.entrances[index] * self.elements[index].local_frame(ds),
            Some(index),
        )
    }
}

impl BeamlineQuery for SegmentedBeamline {
    fn frame_at(&self, s: f64, x: f64, y: f64) -> Option<CurvilinearFrame> {
        if !s.is_finite() || self.elements.is_empty() {
            return None;
        }
        let (orbit, element_index) = self.orbit_frame(s);
        let offset = orbit.rotation * Vector3::new(x, y, 0.0);
        let transform = Isometry3::from_parts(
            Translation3::from(orbit.translation.vector + offset),
            orbit.rotation,
        );
        Some(CurvilinearFrame {
            transform,
            element_index,
        })
    }

    fn s_min(&self) -> f64 {
        self.s_start
    }

    fn s_max(&self) -> f64 {
        self.s_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_straight_offsets() {
        let line = SegmentedBeamline::straight(5.0);
        let frame = line.frame_at(1.5, 0.01, -0.02).unwrap();
        let p = frame.transform * Point3::origin();
        assert_relative_eq!(p.x, 0.01, epsilon = 1e-15);
        assert_relative_eq!(p.y, -0.02, epsilon = 1e-15);
        assert_relative_eq!(p.z, 1.5, epsilon = 1e-15);
        assert_eq!(frame.element_index, Some(0));
    }

    #[test]
    fn test_quarter_bend_end_frame() {
        let radius = 2.0;
        let line = SegmentedBeamline::new(
            vec![BeamlineElement::bend("mb", radius * FRAC_PI_2, FRAC_PI_2)],
            0.0,
            Isometry3::identity(),
        )
        .unwrap();
        let frame = line.frame_at(line.s_max(), 0.0, 0.0).unwrap();
        let p = frame.transform * Point3::origin();
        assert_relative_eq!(p.x, -radius, epsilon = 1e-12);
        assert_relative_eq!(p.z, radius, epsilon = 1e-12);
        let forward = frame.transform.rotation * Vector3::z();
        assert_relative_eq!(forward.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(forward.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_element_index_and_extrapolation() {
        let line = SegmentedBeamline::new(
            vec![
                BeamlineElement::drift("d1", 1.0),
                BeamlineElement::bend("b1", 1.0, 0.1),
                BeamlineElement::drift("d2", 2.0),
            ],
            10.0,
            Isometry3::identity(),
        )
        .unwrap();
        assert_eq!(line.s_min(), 10.0);
        assert_relative_eq!(line.s_max(), 14.0, epsilon = 1e-12);
        assert_eq!(line.frame_at(10.5, 0.0, 0.0).unwrap().element_index, Some(0));
        assert_eq!(line.frame_at(11.5, 0.0, 0.0).unwrap().element_index, Some(1));
        assert_eq!(line.frame_at(13.0, 0.0, 0.0).unwrap().element_index, Some(2));

        let before = line.frame_at(9.5, 0.0, 0.0).unwrap();
        assert_eq!(before.element_index, None);
        assert_relative_eq!((before.transform * Point3::origin()).z, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_elements() {
        assert!(SegmentedBeamline::new(vec![], 0.0, Isometry3::identity()).is_err());
        let err = SegmentedBeamline::new(
            vec![BeamlineElement::drift("d", 0.0)],
            0.0,
            Isometry3::identity(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("'d'"));
    }
}
