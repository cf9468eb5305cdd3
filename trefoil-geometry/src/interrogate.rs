//! Frenet frame, curvature and torsion interrogation.

use serde::{Deserialize, Serialize};
use trefoil_base::cgmath64::*;
use trefoil_base::tolerance::Origin;
use trefoil_geotrait::ParametricCurve;

/// The differential data of a space curve at one parameter.
///
/// Degenerate configurations are reported instead of failing: on a straight
/// stretch the curvature is zero, the radius of curvature infinite, and the
/// normal and binormal collapse to zero vectors.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Interrogation {
    pub point: Point3,
    pub tangent: Vector3,
    pub normal: Vector3,
    pub binormal: Vector3,
    pub curvature: f64,
    pub torsion: f64,
    pub radius_of_curvature: f64,
}

/// Frenet-frame queries of any parametric space curve.
pub trait InterrogateCurve: ParametricCurve<Point = Point3, Vector = Vector3> {
    /// `|C' x C''| / |C'|^3`, zero where the speed degenerates.
    fn curvature(&self, t: f64) -> f64 {
        let der = self.der(t);
        let speed2 = der.magnitude2();
        if speed2.so_small2() {
            return 0.0;
        }
        der.cross(self.der2(t)).magnitude() / (speed2 * speed2.sqrt())
    }

    /// `(C' x C'') . C''' / |C' x C''|^2`, zero where the curvature vanishes.
    fn torsion(&self, t: f64) -> f64 {
        let cross = self.der(t).cross(self.der2(t));
        let cl2 = cross.magnitude2();
        match cl2.so_small2() {
            true => 0.0,
            false => cross.dot(self.der_n(3, t)) / cl2,
        }
    }

    fn interrogate(&self, t: f64) -> Interrogation {
        let point = self.subs(t);
        let der = self.der(t);
        let der2 = self.der2(t);
        let cross = der.cross(der2);
        let tangent = safe_normalize(der);

        let speed2 = der.magnitude2();
        let curvature = match speed2.so_small2() {
            true => 0.0,
            false => cross.magnitude() / (speed2 * speed2.sqrt()),
        };
        let (normal, binormal, torsion) = match cross.magnitude2().so_small2() {
            true => (Vector3::zero(), Vector3::zero(), 0.0),
            false => {
                let binormal = cross.normalize();
                let torsion = cross.dot(self.der_n(3, t)) / cross.magnitude2();
                (binormal.cross(tangent), binormal, torsion)
            }
        };
        let radius_of_curvature = match curvature.so_small() {
            true => f64::INFINITY,
            false => 1.0 / curvature,
        };
        Interrogation {
            point,
            tangent,
            normal,
            binormal,
            curvature,
            torsion,
            radius_of_curvature,
        }
    }
}

impl<C: ParametricCurve<Point = Point3, Vector = Vector3>> InterrogateCurve for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::circle;
    use crate::nurbs::{BSplineCurve, KnotVec};
    use trefoil_base::assert_near;

    #[test]
    fn circle_curvature_is_the_inverse_radius() {
        let circle = circle(Point3::new(1.0, 0.0, 0.0), Vector3::unit_z(), 2.0);
        for i in 0..8 {
            let t = 0.05 + 0.9 * i as f64 / 8.0;
            let data = circle.interrogate(t);
            assert_near!(data.curvature, 0.5);
            assert_near!(data.radius_of_curvature, 2.0);
            assert_near!(data.torsion, 0.0);
            // the normal points from the circle to its center
            let to_center = Point3::new(1.0, 0.0, 0.0) - data.point;
            assert_near!(data.normal, to_center.normalize());
            assert_near!(data.binormal.cross(data.tangent), data.normal);
        }
    }

    #[test]
    fn straight_line_degenerates_gracefully() {
        let line = BSplineCurve::new(
            KnotVec::bezier_knot(1),
            vec![Point3::origin(), Point3::new(1.0, 2.0, 3.0)],
        );
        let data = line.interrogate(0.5);
        assert_near!(data.curvature, 0.0);
        assert!(data.radius_of_curvature.is_infinite());
        assert_near!(data.normal, Vector3::zero());
        assert_near!(data.tangent, Vector3::new(1.0, 2.0, 3.0).normalize());
    }

    #[test]
    fn helix_torsion_is_constant() {
        // sampled circular helix x = cos t, y = sin t, z = 0.5 t
        let points: Vec<Point3> = (0..=24)
            .map(|i| {
                let t = i as f64 * 0.2;
                Point3::new(t.cos(), t.sin(), 0.5 * t)
            })
            .collect();
        let params: Vec<f64> = (0..=24).map(|i| i as f64 * 0.2).collect();
        let curve = crate::interpolate::interpolate_simple(&points, &params, 3).unwrap();
        // away from the clamped ends the fit reproduces the analytic values
        // kappa = 1/1.25, tau = 0.5/1.25
        let data = curve.interrogate(2.4);
        assert!((data.curvature - 0.8).abs() < 0.02);
        assert!((data.torsion - 0.4).abs() < 0.05);
    }
}
