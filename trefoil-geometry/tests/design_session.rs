//! End-to-end sessions: design points in, edits, interrogation, exchange,
//! intersection, and offsetting across module boundaries.

use trefoil_base::{assert_near, cgmath64::*, tolerance::Tolerances};
use trefoil_geometry::offset::offset_curve;
use trefoil_geometry::prelude::*;
use trefoil_geotrait::{BoundedCurve, ParametricCurve, SPHint1D, SearchNearestParameter};

fn session_points() -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(3.0, 1.0, 1.0),
    ]
}

#[test]
fn edit_query_and_exchange_session() {
    let mut registry = CurveRegistry::new();
    let vertices = session_points().into_iter().map(Vertex::new).collect();
    let id = registry.insert(DesignCurve::new(vertices, 3, Parameterization::Chordal));
    let curve = registry.get_mut(id).unwrap();
    let tol = Tolerances::default();

    // the derived curve passes through every design point
    for pt in session_points() {
        let t = curve.closest_position(pt, &tol).unwrap().unwrap();
        assert_near!(curve.evaluate_at(t).unwrap(), pt);
    }

    // the exchange format reproduces the same evaluations bit for bit
    let json = to_json(&curve.clone().into()).unwrap();
    let CurveObject::Design(mut restored) = from_json(&json).unwrap() else {
        panic!("wrong kind restored");
    };
    assert_eq!(restored.sample(50).unwrap(), curve.sample(50).unwrap());

    // an edit invalidates the derived curve, the restored copy keeps the
    // old shape
    curve.modify(2, Point3::new(2.0, -1.0, 0.0)).unwrap();
    assert_ne!(restored.sample(50).unwrap(), curve.sample(50).unwrap());
}

#[test]
fn designed_profile_intersects_and_offsets() {
    let mut design = DesignCurve::new(
        vec![
            Vertex::new(Point3::origin()),
            Vertex::new(Point3::new(1.0, 0.3, 0.0)),
            Vertex::new(Point3::new(2.0, 0.0, 0.0)),
            Vertex::new(Point3::new(3.0, 0.3, 0.0)),
        ],
        3,
        Parameterization::Chordal,
    );
    let tol = Tolerances::default();
    let profile = design.ensure_current().unwrap().clone();

    let chord = BSplineCurve::new(
        KnotVec::bezier_knot(1),
        vec![Point3::new(1.5, -2.0, 0.0), Point3::new(1.5, 2.0, 0.0)],
    );
    let hits = profile.intersect_curve(&chord, &tol);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].gap() < tol.intersection);
    assert_near!(hits[0].point0.x, 1.5);

    let result = offset_curve(&Curve::BSpline(profile.clone()), Vector3::unit_z(), 0.25, &tol);
    assert!(!result.is_cusp);
    let (t0, t1) = result.curve.range_tuple();
    for i in 0..=40 {
        let t = t0 + (t1 - t0) * i as f64 / 40.0;
        let pt = result.curve.subs(t);
        let s = profile
            .search_nearest_parameter(pt, SPHint1D::None, tol.newton_trials)
            .expect("no foot point");
        let dist = profile.subs(s).distance(pt);
        assert!(
            (dist - 0.25).abs() < 3.0 * tol.offset_deviation,
            "offset gap {} at {}",
            dist,
            t
        );
    }
}
