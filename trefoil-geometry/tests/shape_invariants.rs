use proptest::prelude::*;
use trefoil_base::{cgmath64::*, prop_assert_near, tolerance::*};
use trefoil_geometry::interpolate::interpolate;
use trefoil_geometry::prelude::*;
use trefoil_geotrait::ParametricCurve;

fn cubic(coords: &[[f64; 3]]) -> BSplineCurve<Point3> {
    let control_points: Vec<Point3> = coords
        .iter()
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();
    let knots = KnotVec::uniform_knot(3, control_points.len() - 3);
    BSplineCurve::new(knots, control_points)
}

fn coords() -> impl Strategy<Value = Vec<[f64; 3]>> {
    prop::collection::vec(prop::array::uniform3(-5.0f64..=5.0), 4..10)
}

proptest! {
    #[test]
    fn basis_functions_sum_to_one(
        degree in 1usize..=4,
        division in 1usize..=6,
        t in 0.0f64..1.0,
    ) {
        let knots = KnotVec::uniform_knot(degree, division);
        let sum: f64 = knots.bspline_basis_functions(degree, 0, t).iter().sum();
        prop_assert!((sum - 1.0).abs() < 1.0e-12, "sum of the basis is {sum}");
    }

    #[test]
    fn derivative_basis_functions_sum_to_zero(
        degree in 1usize..=4,
        division in 1usize..=6,
        t in 0.0f64..1.0,
    ) {
        let knots = KnotVec::uniform_knot(degree, division);
        let sum: f64 = knots.bspline_basis_functions(degree, 1, t).iter().sum();
        prop_assert!(sum.abs() < 1.0e-9, "sum of the derivative basis is {sum}");
    }

    #[test]
    fn knot_insertion_keeps_the_mapping(coords in coords(), t in 0.05f64..=0.95) {
        let curve = cubic(&coords);
        let mut refined = curve.clone();
        refined.add_knot(t);
        prop_assert_eq!(
            refined.control_points().len(),
            curve.control_points().len() + 1,
        );
        for i in 0..=32 {
            let u = i as f64 / 32.0;
            prop_assert_near!(refined.subs(u), curve.subs(u));
        }
    }

    #[test]
    fn degree_elevation_keeps_the_mapping(coords in coords()) {
        let curve = cubic(&coords);
        let mut elevated = curve.clone();
        elevated.elevate_degree();
        prop_assert_eq!(elevated.degree(), 4);
        for i in 0..=32 {
            let u = i as f64 / 32.0;
            prop_assert_near!(elevated.subs(u), curve.subs(u));
        }
    }

    #[test]
    fn inserted_knots_are_removable(coords in coords(), t in 0.05f64..=0.95) {
        let curve = cubic(&coords);
        let mut refined = curve.clone();
        refined.add_knot(t);
        let idx = refined.knot_vec().floor(t).unwrap();
        prop_assert!(refined.try_remove_knot_within(idx, TOLERANCE).is_ok());
        prop_assert_eq!(refined.knot_vec().len(), curve.knot_vec().len());
        for i in 0..=32 {
            let u = i as f64 / 32.0;
            prop_assert_near!(refined.subs(u), curve.subs(u));
        }
    }

    #[test]
    fn interpolation_reproduces_the_samples(
        coords in prop::collection::vec(prop::array::uniform3(-5.0f64..=5.0), 3..8),
    ) {
        let points: Vec<Point3> = coords
            .iter()
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        prop_assume!(points.windows(2).all(|w| w[0].distance(w[1]) > 0.5));
        let vertices: Vec<Vertex> = points.iter().copied().map(Vertex::new).collect();
        let curve = interpolate(&vertices, 3, Parameterization::Chordal).unwrap();
        let params = Parameterization::Chordal.parameters(&points);
        for (t, pt) in params.iter().zip(&points) {
            prop_assert_near!(curve.subs(*t), *pt);
        }
    }

    #[test]
    fn exchange_round_trip_is_exact(coords in coords()) {
        let curve = cubic(&coords);
        let json = to_json(&curve.clone().into()).unwrap();
        let Ok(CurveObject::Shape(Curve::BSpline(restored))) = from_json(&json) else {
            panic!("wrong kind restored");
        };
        prop_assert_eq!(restored, curve);
    }
}
