use crate::nurbs::{BSplineCurve, KnotVec, NurbsCurve};
use std::f64::consts::{FRAC_PI_2, PI};
use trefoil_base::cgmath64::*;

fn orthonormal_frame(axis: Vector3) -> (Vector3, Vector3) {
    let seed = if axis.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let e1 = (seed - axis * axis.dot(seed)).normalize();
    (e1, axis.cross(e1))
}

/// An exact circular arc as a quadratic rational curve over `[0, 1]`.
///
/// The arc starts at `start`, turns around the line through `center` with
/// direction `axis` by `angle`, and is assembled from segments of at most a
/// quarter turn, the middle control point of each carrying weight
/// `cos(angle / 2 / segments)`. `start` must not lie on the axis.
pub fn circle_arc(start: Point3, center: Point3, axis: Vector3, angle: Rad<f64>) -> NurbsCurve<Vector4> {
    let axis = axis.normalize();
    let vec = start - center;
    let axial = axis * axis.dot(vec);
    let radial = vec - axial;
    let radius = radial.magnitude();
    let e1 = radial / radius;
    let e2 = axis.cross(e1);
    let center = center + axial;

    let n = (angle.0.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let beta = angle.0 / n as f64;
    let half = beta / 2.0;
    let w = half.cos();

    let at = |theta: f64, rho: f64| center + (e1 * theta.cos() + e2 * theta.sin()) * rho;

    let mut control_points = Vec::with_capacity(2 * n + 1);
    control_points.push(at(0.0, radius).to_homogeneous());
    for i in 0..n {
        let t0 = beta * i as f64;
        let mid = at(t0 + half, radius / w);
        control_points.push(mid.to_homogeneous() * w);
        control_points.push(at(t0 + beta, radius).to_homogeneous());
    }

    let mut knots = vec![0.0; 3];
    for i in 1..n {
        knots.push(i as f64 / n as f64);
        knots.push(i as f64 / n as f64);
    }
    knots.extend([1.0, 1.0, 1.0]);
    let knot_vec = KnotVec::try_from(knots).unwrap();
    NurbsCurve::new(BSplineCurve::new_unchecked(knot_vec, control_points))
}

/// An exact full circle of four quadratic rational segments.
pub fn circle(center: Point3, axis: Vector3, radius: f64) -> NurbsCurve<Vector4> {
    let axis = axis.normalize();
    let (e1, _) = orthonormal_frame(axis);
    circle_arc(center + e1 * radius, center, axis, Rad(2.0 * PI))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trefoil_base::assert_near;
    use trefoil_geotrait::ParametricCurve;

    #[test]
    fn arc_stays_on_the_circle() {
        let start = Point3::new(2.0, 1.0, 0.0);
        let center = Point3::new(1.0, 1.0, 0.0);
        let arc = circle_arc(start, center, Vector3::unit_z(), Rad(1.8));
        for i in 0..=32 {
            let t = i as f64 / 32.0;
            let pt = arc.subs(t);
            assert_near!(center.distance(pt), 1.0);
        }
        assert_near!(arc.subs(0.0), start);
        let end = Point3::new(1.0 + 1.8f64.cos(), 1.0 + 1.8f64.sin(), 0.0);
        assert_near!(arc.subs(1.0), end);
    }

    #[test]
    fn full_circle_has_nine_control_points() {
        let circle = circle(Point3::new(0.0, 0.0, 1.0), Vector3::unit_z(), 0.5);
        assert_eq!(circle.control_points().len(), 9);
        for i in 0..=64 {
            let t = i as f64 / 64.0;
            let pt = circle.subs(t);
            assert_near!(pt.x * pt.x + pt.y * pt.y, 0.25);
            assert_near!(pt.z, 1.0);
        }
        assert_near!(circle.subs(0.0), circle.subs(1.0));
    }

    #[test]
    fn tilted_axis_arc_lies_in_the_right_plane() {
        let axis = Vector3::new(1.0, 1.0, 1.0).normalize();
        let center = Point3::new(0.0, 0.0, 0.0);
        let start = Point3::new(1.0, -1.0, 0.0);
        let arc = circle_arc(start, center, axis, Rad(FRAC_PI_2));
        for i in 0..=16 {
            let t = i as f64 / 16.0;
            let pt = arc.subs(t);
            assert_near!(axis.dot(pt.to_vec()), 0.0);
            assert_near!(pt.to_vec().magnitude(), 2.0f64.sqrt());
        }
    }
}
