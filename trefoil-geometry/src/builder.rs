//! Specialized surface constructors.
//!
//! Every builder produces a tensor-product surface whose u direction follows
//! the input curves and whose v direction is the constructed one: the
//! extrusion vector, the revolution angle, or the lofting parameter.

use crate::errors::Error;
use crate::intersect::IntersectCurve;
use crate::interpolate::{interpolate_simple, Parameterization};
use crate::nurbs::{BSplineCurve, BSplineSurface, KnotVec, NurbsSurface};
use crate::Result;
use std::f64::consts::FRAC_PI_2;
use trefoil_base::cgmath64::*;
use trefoil_base::tolerance::{Origin, Tolerance, Tolerances};

/// The degree-one patch through four corner points.
pub fn bilinear(p00: Point3, p01: Point3, p10: Point3, p11: Point3) -> BSplineSurface<Point3> {
    BSplineSurface::new_unchecked(
        (KnotVec::bezier_knot(1), KnotVec::bezier_knot(1)),
        vec![vec![p00, p01], vec![p10, p11]],
    )
}

/// Translational sweep: `S(u, v) = C(u) + v * vector` for `v` in `[0, 1]`.
pub fn extrude(curve: &BSplineCurve<Point3>, vector: Vector3) -> BSplineSurface<Point3> {
    let control_points = curve
        .control_points()
        .iter()
        .map(|&cp| vec![cp, cp + vector])
        .collect();
    BSplineSurface::new_unchecked(
        (curve.knot_vec().clone(), KnotVec::bezier_knot(1)),
        control_points,
    )
}

/// The linear blend between two curves, degree- and knot-unified first.
pub fn ruled(curve0: &BSplineCurve<Point3>, curve1: &BSplineCurve<Point3>) -> BSplineSurface<Point3> {
    let mut curve0 = curve0.clone();
    let mut curve1 = curve1.clone();
    curve0.knot_normalize();
    curve1.knot_normalize();
    curve0.syncro_degree(&mut curve1);
    curve0.syncro_knots(&mut curve1);
    let control_points = curve0
        .control_points()
        .iter()
        .zip(curve1.control_points())
        .map(|(&a, &b)| vec![a, b])
        .collect();
    BSplineSurface::new_unchecked(
        (curve0.knot_vec().clone(), KnotVec::bezier_knot(1)),
        control_points,
    )
}

/// Rotational sweep of a profile curve around the axis through `origin`.
///
/// Every control point is swept by an exact rational arc; the arcs share
/// one quadratic knot vector, so the result is a NURBS surface. A control
/// point on the axis degenerates to a constant row.
pub fn revolve(
    curve: &BSplineCurve<Point3>,
    origin: Point3,
    axis: Vector3,
    angle: Rad<f64>,
) -> NurbsSurface<Vector4> {
    let axis = axis.normalize();
    let n = (angle.0.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let beta = angle.0 / n as f64;
    let half = beta / 2.0;
    let w = half.cos();

    let control_points = curve
        .control_points()
        .iter()
        .map(|&cp| {
            let vec = cp - origin;
            let axial = axis * axis.dot(vec);
            let radial = vec - axial;
            let radius = radial.magnitude();
            let mut row = Vec::with_capacity(2 * n + 1);
            if radius.so_small() {
                row.push(cp.to_homogeneous());
                for _ in 0..n {
                    row.push(cp.to_homogeneous() * w);
                    row.push(cp.to_homogeneous());
                }
            } else {
                let center = origin + axial;
                let e1 = radial / radius;
                let e2 = axis.cross(e1);
                let at = |theta: f64, rho: f64| center + (e1 * theta.cos() + e2 * theta.sin()) * rho;
                row.push(at(0.0, radius).to_homogeneous());
                for i in 0..n {
                    let t0 = beta * i as f64;
                    row.push(at(t0 + half, radius / w).to_homogeneous() * w);
                    row.push(at(t0 + beta, radius).to_homogeneous());
                }
            }
            row
        })
        .collect();

    let mut vknots = vec![0.0; 3];
    for i in 1..n {
        vknots.push(i as f64 / n as f64);
        vknots.push(i as f64 / n as f64);
    }
    vknots.extend([1.0, 1.0, 1.0]);
    NurbsSurface::new(BSplineSurface::new_unchecked(
        (curve.knot_vec().clone(), KnotVec::from(vknots)),
        control_points,
    ))
}

/// Elevates the degree of every curve to the common maximum and inserts the
/// union of all knots into each, after normalizing every range to `[0, 1]`.
fn unify_curves(curves: &[BSplineCurve<Point3>]) -> Vec<BSplineCurve<Point3>> {
    let mut curves = curves.to_vec();
    let target = curves.iter().map(|c| c.degree()).max().unwrap_or(1);
    for curve in &mut curves {
        curve.knot_normalize();
        while curve.degree() < target {
            curve.elevate_degree();
        }
    }

    let mut union: Vec<(f64, usize)> = Vec::new();
    for curve in &curves {
        let (knots, mults) = curve.knot_vec().to_single_multi();
        for (knot, mult) in knots.into_iter().zip(mults) {
            match union.iter_mut().find(|(k, _)| knot.near(k)) {
                Some(entry) => entry.1 = entry.1.max(mult),
                None => union.push((knot, mult)),
            }
        }
    }
    for curve in &mut curves {
        let (knots, mults) = curve.knot_vec().to_single_multi();
        for &(knot, mult) in &union {
            let current = knots
                .iter()
                .zip(&mults)
                .find(|(k, _)| knot.near(k))
                .map_or(0, |(_, m)| *m);
            for _ in current..mult {
                curve.add_knot(knot);
            }
        }
    }
    curves
}

/// A shared cross-parameterization of unified sections: the normalized
/// chordal parameters of corresponding control points, averaged over all
/// control point indices.
fn section_parameters(curves: &[BSplineCurve<Point3>]) -> Vec<f64> {
    let count = curves.len();
    let cp_len = curves[0].control_points().len();
    let mut acc = vec![0.0; count];
    let mut contributing = 0;
    for i in 0..cp_len {
        let column: Vec<Point3> = curves.iter().map(|c| c.control_points()[i]).collect();
        let params = Parameterization::Chordal.parameters(&column);
        let total = params[count - 1];
        if total.so_small() {
            continue;
        }
        for (a, p) in acc.iter_mut().zip(&params) {
            *a += p / total;
        }
        contributing += 1;
    }
    match contributing {
        0 => (0..count)
            .map(|j| j as f64 / (count - 1) as f64)
            .collect(),
        _ => acc.into_iter().map(|a| a / contributing as f64).collect(),
    }
}

fn assemble(
    uknots: KnotVec,
    vknots: KnotVec,
    columns: &[BSplineCurve<Point3>],
) -> BSplineSurface<Point3> {
    let control_points = columns
        .iter()
        .map(|c| c.control_points().clone())
        .collect();
    BSplineSurface::new_unchecked((uknots, vknots), control_points)
}

fn loft_with_parameters(
    sections: &[BSplineCurve<Point3>],
    params: &[f64],
    vdegree: usize,
) -> Result<BSplineSurface<Point3>> {
    if sections.len() < 2 {
        return Err(Error::InsufficientPoints(sections.len()));
    }
    let unified = unify_curves(sections);
    let cp_len = unified[0].control_points().len();
    let mut columns = Vec::with_capacity(cp_len);
    for i in 0..cp_len {
        let column: Vec<Point3> = unified.iter().map(|c| c.control_points()[i]).collect();
        columns.push(interpolate_simple(&column, params, vdegree)?);
    }
    Ok(assemble(
        unified[0].knot_vec().clone(),
        columns[0].knot_vec().clone(),
        &columns,
    ))
}

/// Interpolates a sequence of section curves into a surface; sections run
/// in the u direction and are interpolated across v.
pub fn loft(sections: &[BSplineCurve<Point3>], vdegree: usize) -> Result<BSplineSurface<Point3>> {
    if sections.len() < 2 {
        return Err(Error::InsufficientPoints(sections.len()));
    }
    let unified = unify_curves(sections);
    let params = section_parameters(&unified);
    loft_with_parameters(&unified, &params, vdegree)
}

fn elevate_udegree_once(surface: &mut BSplineSurface<Point3>) {
    let vlen = surface.control_points()[0].len();
    let columns: Vec<BSplineCurve<Point3>> = (0..vlen)
        .map(|j| {
            let mut curve = surface.column_curve(j);
            curve.elevate_degree();
            curve
        })
        .collect();
    let uknots = columns[0].knot_vec().clone();
    let cp_len = columns[0].control_points().len();
    let control_points = (0..cp_len)
        .map(|i| columns.iter().map(|c| c.control_points()[i]).collect())
        .collect();
    *surface =
        BSplineSurface::new_unchecked((uknots, surface.knot_vecs().1.clone()), control_points);
}

fn elevate_vdegree_once(surface: &mut BSplineSurface<Point3>) {
    let ulen = surface.control_points().len();
    let rows: Vec<BSplineCurve<Point3>> = (0..ulen)
        .map(|i| {
            let mut curve = surface.row_curve(i);
            curve.elevate_degree();
            curve
        })
        .collect();
    let vknots = rows[0].knot_vec().clone();
    let control_points = rows.iter().map(|c| c.control_points().clone()).collect();
    *surface =
        BSplineSurface::new_unchecked((surface.knot_vecs().0.clone(), vknots), control_points);
}

/// Puts all surfaces on identical degrees and knot vectors in both
/// directions, the precondition for control-point arithmetic between them.
fn unify_surfaces(surfaces: &mut [&mut BSplineSurface<Point3>]) {
    let udeg = surfaces.iter().map(|s| s.udegree()).max().unwrap_or(1);
    let vdeg = surfaces.iter().map(|s| s.vdegree()).max().unwrap_or(1);
    for surface in surfaces.iter_mut() {
        surface.knot_normalize();
        while surface.udegree() < udeg {
            elevate_udegree_once(surface);
        }
        while surface.vdegree() < vdeg {
            elevate_vdegree_once(surface);
        }
    }

    for direction in 0..2 {
        let mut union: Vec<(f64, usize)> = Vec::new();
        for surface in surfaces.iter() {
            let knot_vec = match direction {
                0 => &surface.knot_vecs().0,
                _ => &surface.knot_vecs().1,
            };
            let (knots, mults) = knot_vec.to_single_multi();
            for (knot, mult) in knots.into_iter().zip(mults) {
                match union.iter_mut().find(|(k, _)| knot.near(k)) {
                    Some(entry) => entry.1 = entry.1.max(mult),
                    None => union.push((knot, mult)),
                }
            }
        }
        for surface in surfaces.iter_mut() {
            let (knots, mults) = match direction {
                0 => surface.knot_vecs().0.to_single_multi(),
                _ => surface.knot_vecs().1.to_single_multi(),
            };
            for &(knot, mult) in &union {
                let current = knots
                    .iter()
                    .zip(&mults)
                    .find(|(k, _)| knot.near(k))
                    .map_or(0, |(_, m)| *m);
                for _ in current..mult {
                    match direction {
                        0 => surface.add_uknot(knot),
                        _ => surface.add_vknot(knot),
                    };
                }
            }
        }
    }
}

/// The Gordon surface through a network of curves.
///
/// `u_curves` run in the u direction, one per v level; `v_curves` run in v,
/// one per u level. The families must intersect pairwise at the network
/// nodes. The result is `loft(u) + loft(v) - tensor(nodes)` after unifying
/// the three onto common degrees and knot vectors.
pub fn gordon(
    u_curves: &[BSplineCurve<Point3>],
    v_curves: &[BSplineCurve<Point3>],
    tol: &Tolerances,
) -> Result<BSplineSurface<Point3>> {
    if u_curves.len() < 2 || v_curves.len() < 2 {
        return Err(Error::InsufficientPoints(u_curves.len().min(v_curves.len())));
    }
    let u_curves = unify_curves(u_curves);
    let v_curves = unify_curves(v_curves);

    // locate the network nodes and their parameters on both families
    let mut nodes = vec![vec![Point3::origin(); u_curves.len()]; v_curves.len()];
    let mut u_params = vec![0.0; v_curves.len()];
    let mut v_params = vec![0.0; u_curves.len()];
    for (i, v_curve) in v_curves.iter().enumerate() {
        for (j, u_curve) in u_curves.iter().enumerate() {
            let hits = v_curve.intersect_curve(u_curve, tol);
            let hit = hits.first().ok_or(Error::DisjointCurveNetwork)?;
            nodes[i][j] = hit.point0 + (hit.point1 - hit.point0) / 2.0;
            u_params[i] += hit.param1 / u_curves.len() as f64;
            v_params[j] += hit.param0 / v_curves.len() as f64;
        }
    }

    let du = (v_curves.len() - 1).min(3);
    let dv = (u_curves.len() - 1).min(3);

    let mut loft_u = loft_with_parameters(&u_curves, &v_params, dv)?;
    let mut loft_v = loft_with_parameters(&v_curves, &u_params, du)?;
    loft_v.swap_axes();

    // the tensor surface interpolating the node grid
    let mut v_columns = Vec::with_capacity(v_curves.len());
    for row in &nodes {
        v_columns.push(interpolate_simple(row, &v_params, dv)?);
    }
    let mut u_columns = Vec::with_capacity(v_columns[0].control_points().len());
    for j in 0..v_columns[0].control_points().len() {
        let column: Vec<Point3> = v_columns.iter().map(|c| c.control_points()[j]).collect();
        u_columns.push(interpolate_simple(&column, &u_params, du)?);
    }
    // u_columns run in u and are indexed by v, so the net is transposed
    // relative to the [u][v] layout
    let cp_len = u_columns[0].control_points().len();
    let tensor_net = (0..cp_len)
        .map(|i| u_columns.iter().map(|c| c.control_points()[i]).collect())
        .collect();
    let mut tensor = BSplineSurface::new_unchecked(
        (
            u_columns[0].knot_vec().clone(),
            v_columns[0].knot_vec().clone(),
        ),
        tensor_net,
    );

    unify_surfaces(&mut [&mut loft_u, &mut loft_v, &mut tensor]);
    let control_points = loft_u
        .control_points()
        .iter()
        .zip(loft_v.control_points())
        .zip(tensor.control_points())
        .map(|((urow, vrow), trow)| {
            urow.iter()
                .zip(vrow)
                .zip(trow)
                .map(|((&a, &b), &c)| Point3::from_vec(a.to_vec() + b.to_vec() - c.to_vec()))
                .collect()
        })
        .collect();
    Ok(BSplineSurface::new_unchecked(
        loft_u.knot_vecs().clone(),
        control_points,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trefoil_base::assert_near;
    use trefoil_geotrait::ParametricSurface;

    #[test]
    fn bilinear_interpolates_its_corners() {
        let patch = bilinear(
            Point3::origin(),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 2.0),
        );
        assert_near!(patch.subs(0.0, 0.0), Point3::origin());
        assert_near!(patch.subs(0.0, 1.0), Point3::new(0.0, 1.0, 0.0));
        assert_near!(patch.subs(1.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert_near!(patch.subs(1.0, 1.0), Point3::new(1.0, 1.0, 2.0));
        assert_near!(patch.subs(0.5, 0.5), Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn extrusion_translates_the_profile() {
        let profile = BSplineCurve::new(
            KnotVec::bezier_knot(2),
            vec![
                Point3::origin(),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
        );
        let surface = extrude(&profile, Vector3::new(0.0, 0.0, 3.0));
        for i in 0..=4 {
            for j in 0..=4 {
                let (u, v) = (i as f64 / 4.0, j as f64 / 4.0);
                let expected = profile.subs(u) + Vector3::new(0.0, 0.0, 3.0) * v;
                assert_near!(surface.subs(u, v), expected);
            }
        }
    }

    #[test]
    fn ruled_surface_blends_mixed_degree_rails() {
        let rail0 = BSplineCurve::new(
            KnotVec::bezier_knot(1),
            vec![Point3::origin(), Point3::new(2.0, 0.0, 0.0)],
        );
        let rail1 = BSplineCurve::new(
            KnotVec::bezier_knot(2),
            vec![
                Point3::new(0.0, 1.0, 1.0),
                Point3::new(1.0, 1.0, 2.0),
                Point3::new(2.0, 1.0, 1.0),
            ],
        );
        let surface = ruled(&rail0, &rail1);
        for i in 0..=8 {
            let u = i as f64 / 8.0;
            assert_near!(surface.subs(u, 0.0), rail0.subs(u));
            assert_near!(surface.subs(u, 1.0), rail1.subs(u));
            let mid = rail0.subs(u) + (rail1.subs(u) - rail0.subs(u)) / 2.0;
            assert_near!(surface.subs(u, 0.5), mid);
        }
    }

    #[test]
    fn revolved_line_is_a_cone() {
        let generatrix = BSplineCurve::new(
            KnotVec::bezier_knot(1),
            vec![Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)],
        );
        let cone = revolve(
            &generatrix,
            Point3::origin(),
            Vector3::unit_z(),
            Rad(2.0 * std::f64::consts::PI),
        );
        for i in 0..=4 {
            for j in 0..=8 {
                let (u, v) = (i as f64 / 4.0, j as f64 / 8.0);
                let pt = cone.subs(u, v);
                assert_near!((pt.x * pt.x + pt.y * pt.y).sqrt(), 1.0 - u);
                assert_near!(pt.z, u);
            }
        }
    }

    #[test]
    fn loft_passes_through_its_sections() {
        let section = |y: f64, lift: f64| {
            BSplineCurve::new(
                KnotVec::bezier_knot(2),
                vec![
                    Point3::new(0.0, y, 0.0),
                    Point3::new(1.0, y, lift),
                    Point3::new(2.0, y, 0.0),
                ],
            )
        };
        let sections = [section(0.0, 0.5), section(1.0, 1.5), section(2.0, 0.5)];
        let surface = loft(&sections, 2).unwrap();
        let params = section_parameters(&unify_curves(&sections));
        for (section, &v) in sections.iter().zip(&params) {
            for i in 0..=8 {
                let u = i as f64 / 8.0;
                assert_near!(surface.subs(u, v), section.subs(u));
            }
        }
    }

    #[test]
    fn gordon_of_a_straight_network_is_bilinear() {
        let corners = [
            Point3::origin(),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 1.0),
            Point3::new(2.0, 2.0, 0.5),
        ];
        let line = |a: Point3, b: Point3| {
            BSplineCurve::new(KnotVec::bezier_knot(1), vec![a, b])
        };
        let u_curves = [line(corners[0], corners[1]), line(corners[2], corners[3])];
        let v_curves = [line(corners[0], corners[2]), line(corners[1], corners[3])];
        let surface = gordon(&u_curves, &v_curves, &Tolerances::default()).unwrap();
        assert_near!(surface.subs(0.0, 0.0), corners[0]);
        assert_near!(surface.subs(1.0, 0.0), corners[1]);
        assert_near!(surface.subs(0.0, 1.0), corners[2]);
        assert_near!(surface.subs(1.0, 1.0), corners[3]);
        let center = Point3::new(1.0, 1.0, 0.375);
        assert_near!(surface.subs(0.5, 0.5), center);
    }

    #[test]
    fn gordon_rejects_disconnected_networks() {
        let line = |a: Point3, b: Point3| {
            BSplineCurve::new(KnotVec::bezier_knot(1), vec![a, b])
        };
        let u_curves = [
            line(Point3::origin(), Point3::new(1.0, 0.0, 0.0)),
            line(Point3::new(0.0, 1.0, 0.0), Point3::new(1.0, 1.0, 0.0)),
        ];
        let v_curves = [
            line(Point3::new(0.0, 0.0, 5.0), Point3::new(0.0, 1.0, 5.0)),
            line(Point3::new(1.0, 0.0, 5.0), Point3::new(1.0, 1.0, 5.0)),
        ];
        assert!(matches!(
            gordon(&u_curves, &v_curves, &Tolerances::default()),
            Err(Error::DisjointCurveNetwork)
        ));
    }
}
