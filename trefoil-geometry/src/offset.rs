//! Offset-curve approximation by control-polygon translation.
//!
//! The progenitor is offset segment-wise in the plane perpendicular to a
//! reference axis: every control-polygon leg is translated along its local
//! offset normal and consecutive legs are re-intersected (Tiller-Hanson).
//! The approximation is refined by knot insertion until the sampled
//! deviation from the true offset distance is within tolerance, then
//! repaired topologically: loops caused by over-curvature are trimmed out,
//! convex corner gaps are bridged by exact arcs and concave corner overlaps
//! are intersected and trimmed.
//!
//! Everything runs on the rational representation, so circles and arcs
//! offset as well as polynomial curves; weights ride along unchanged while
//! the projected control points are translated.

use crate::conic::circle_arc;
use crate::curve::Curve;
use crate::intersect::IntersectCurve;
use crate::interrogate::InterrogateCurve;
use crate::nurbs::{BSplineCurve, KnotVec, NurbsCurve};
use trefoil_base::cgmath64::*;
use trefoil_base::tolerance::{Origin, Tolerances};
use trefoil_geotrait::{BoundedCurve, Concat, Cut, CurveCollector, ParametricCurve};

/// An approximated offset curve together with its repair diagnosis.
#[derive(Clone, Debug)]
pub struct OffsetResult {
    pub curve: NurbsCurve<Vector4>,
    /// `true` if any cusp test fired: the offset tangent flipped against the
    /// progenitor tangent, or the offset distance exceeded the local radius
    /// of curvature on the concave side.
    pub is_cusp: bool,
}

/// The local offset direction of tangent `der` around `axis`.
#[inline(always)]
fn offset_direction(der: Vector3, axis: Vector3) -> Vector3 {
    safe_normalize(der.cross(axis))
}

/// Nearest point of lines `a + s u` and `b + t v` on the first line, or
/// `None` when the lines are parallel.
fn intersect_lines(a: Point3, u: Vector3, b: Point3, v: Vector3) -> Option<Point3> {
    let w = a - b;
    let uu = u.magnitude2();
    let uv = u.dot(v);
    let vv = v.magnitude2();
    let denom = uu * vv - uv * uv;
    if (denom / (uu * vv)).so_small() {
        return None;
    }
    let s = (uv * v.dot(w) - vv * u.dot(w)) / denom;
    Some(a + u * s)
}

/// Translates every control-polygon leg by the offset distance along its
/// normal and re-intersects consecutive legs. The legs are those of the
/// projected control polygon; each control point keeps its weight. The
/// result shares the knot vector of the progenitor.
fn tiller_hanson(curve: &NurbsCurve<Vector4>, axis: Vector3, distance: f64) -> NurbsCurve<Vector4> {
    let weights = curve.weights();
    let cps = curve.rationalized_control_points();
    let n = cps.len();

    let mut legs: Vec<Option<Vector3>> = cps
        .windows(2)
        .map(|w| {
            let dir = w[1] - w[0];
            match dir.magnitude2().so_small2() {
                true => None,
                false => Some(dir),
            }
        })
        .collect();
    // zero-length legs inherit the direction of a neighbor
    for i in 1..legs.len() {
        if legs[i].is_none() {
            legs[i] = legs[i - 1];
        }
    }
    for i in (0..legs.len().saturating_sub(1)).rev() {
        if legs[i].is_none() {
            legs[i] = legs[i + 1];
        }
    }
    let normals: Vec<Vector3> = legs
        .iter()
        .map(|leg| offset_direction(leg.unwrap_or_else(Vector3::unit_x), axis))
        .collect();

    let mut moved = Vec::with_capacity(n);
    moved.push(cps[0] + normals[0] * distance);
    for i in 1..n - 1 {
        let a = cps[i - 1] + normals[i - 1] * distance;
        let b = cps[i] + normals[i] * distance;
        let joint = match legs[i - 1].zip(legs[i]) {
            Some((u, v)) => intersect_lines(a, u, b, v),
            None => None,
        };
        moved.push(joint.unwrap_or(b));
    }
    moved.push(cps[n - 1] + normals[n - 2] * distance);

    let control_points = moved
        .into_iter()
        .zip(weights)
        .map(|(pt, w)| Vector4::from_point_weight(pt, w))
        .collect();
    NurbsCurve::new(BSplineCurve::new_unchecked(
        curve.knot_vec().clone(),
        control_points,
    ))
}

/// Greville abscissae of the curve interleaved with their midpoints; the
/// natural residual-check samples of the control polygon.
fn residual_samples(curve: &NurbsCurve<Vector4>) -> Vec<f64> {
    let grevilles = curve.knot_vec().greville(curve.degree());
    let mut samples = Vec::with_capacity(2 * grevilles.len() - 1);
    for w in grevilles.windows(2) {
        samples.push(w[0]);
        samples.push((w[0] + w[1]) / 2.0);
    }
    samples.push(grevilles[grevilles.len() - 1]);
    samples
}

/// Splits `t` away from existing knots: the midpoint of the knot span
/// containing `t`, or `None` for a degenerate span.
fn span_midpoint(knots: &KnotVec, t: f64) -> Option<f64> {
    let idx = knots.floor(t)?;
    let lower = knots[idx];
    let upper = knots[idx + 1..].iter().copied().find(|&k| !(k - lower).so_small())?;
    let mid = (lower + upper) / 2.0;
    (!(mid - lower).so_small()).then_some(mid)
}

/// Offsets one tangent-continuous piece, refining by knot insertion until
/// the sampled deviation is within `tol.offset_deviation`.
fn offset_piece(
    piece: &NurbsCurve<Vector4>,
    axis: Vector3,
    distance: f64,
    tol: &Tolerances,
) -> NurbsCurve<Vector4> {
    let mut prog = piece.clone();
    let mut offset = tiller_hanson(&prog, axis, distance);
    for _ in 0..tol.refinement_rounds {
        let mut refinements: Vec<f64> = Vec::new();
        for t in residual_samples(&prog) {
            let deviation = (prog.subs(t).distance(offset.subs(t)) - distance.abs()).abs();
            if deviation > tol.offset_deviation {
                if let Some(mid) = span_midpoint(prog.knot_vec(), t) {
                    if refinements.iter().all(|r| !(r - mid).so_small()) {
                        refinements.push(mid);
                    }
                }
            }
        }
        if refinements.is_empty() {
            break;
        }
        for t in refinements {
            prog.add_knot(t);
        }
        offset = tiller_hanson(&prog, axis, distance);
    }
    offset
}

/// Cusp diagnosis of one piece: tangent flip between progenitor and offset,
/// or offset distance beyond the radius of curvature on the concave side.
fn piece_has_cusp(
    prog: &NurbsCurve<Vector4>,
    offset: &NurbsCurve<Vector4>,
    axis: Vector3,
    distance: f64,
) -> bool {
    residual_samples(prog).into_iter().any(|t| {
        let prog_der = prog.der(t);
        if prog_der.dot(offset.der(t)) < 0.0 {
            return true;
        }
        let data = prog.interrogate(t);
        let toward_center = offset_direction(prog_der, axis).dot(data.normal) * distance > 0.0;
        toward_center && distance.abs() * data.curvature > 1.0
    })
}

/// Cuts self-intersection loops out of an offset piece. Both remnants are
/// renormalized so the junction knots agree exactly.
fn remove_loops(mut curve: NurbsCurve<Vector4>, tol: &Tolerances) -> NurbsCurve<Vector4> {
    for _ in 0..tol.refinement_rounds {
        let hits = curve.self_intersect(tol);
        let Some(hit) = hits.first() else {
            break;
        };
        let mut front = curve;
        let mut excised = front.cut(hit.param0);
        let mut tail = excised.cut(hit.param1);
        front.knot_normalize();
        tail.knot_normalize().knot_translate(1.0);
        curve = front.concat(&tail);
    }
    curve
}

fn polygon_length(curve: &NurbsCurve<Vector4>) -> f64 {
    curve
        .rationalized_control_points()
        .windows(2)
        .map(|w| w[0].distance(w[1]))
        .sum()
}

/// A straight joint for corner overlaps that could not be trimmed.
fn line_joint(start: Point3, end: Point3) -> NurbsCurve<Vector4> {
    NurbsCurve::new(BSplineCurve::new_unchecked(
        KnotVec::bezier_knot(1),
        vec![start.to_homogeneous(), end.to_homogeneous()],
    ))
}

/// Splits a clamped curve at every interior knot of full multiplicity, the
/// tangent-discontinuous corners.
fn smooth_pieces(curve: &NurbsCurve<Vector4>) -> Vec<NurbsCurve<Vector4>> {
    let degree = curve.degree();
    let (knots, mults) = curve.knot_vec().to_single_multi();
    let corners: Vec<f64> = knots[1..knots.len() - 1]
        .iter()
        .zip(&mults[1..mults.len() - 1])
        .filter(|&(_, m)| *m >= degree)
        .map(|(k, _)| *k)
        .collect();
    let mut pieces = Vec::with_capacity(corners.len() + 1);
    let mut rest = curve.clone();
    for t in corners {
        let back = rest.cut(t);
        pieces.push(std::mem::replace(&mut rest, back));
    }
    pieces.push(rest);
    pieces
}

/// Approximates the offset of `progenitor` by `distance` in the plane
/// perpendicular to `axis`.
///
/// Positive distances move the curve to the right of the travel direction
/// seen with `axis` pointing at the viewer; for a counterclockwise circle
/// around `axis` that is outward. Corner gaps are bridged with exact
/// circular arcs, so the result is rational even for polynomial input.
pub fn offset_curve(progenitor: &Curve, axis: Vector3, distance: f64, tol: &Tolerances) -> OffsetResult {
    let progenitor: NurbsCurve<Vector4> = match progenitor {
        Curve::BSpline(curve) => curve.clone().into(),
        Curve::Nurbs(curve) => curve.clone(),
    };
    let axis = axis.normalize();
    let prog_pieces = smooth_pieces(&progenitor);

    let mut is_cusp = false;
    let mut segments: Vec<(NurbsCurve<Vector4>, NurbsCurve<Vector4>)> = Vec::new();
    for prog in prog_pieces {
        let offset = offset_piece(&prog, axis, distance, tol);
        let cusp = piece_has_cusp(&prog, &offset, axis, distance);
        is_cusp = is_cusp || cusp;
        let offset = match cusp {
            true => remove_loops(offset, tol),
            false => offset,
        };
        segments.push((prog, offset));
    }
    // a remnant shorter than the offset distance cannot carry a valid
    // offset and is dropped
    if segments.len() > 1 {
        let keep: Vec<bool> = segments
            .iter()
            .map(|(_, offset)| polygon_length(offset) >= distance.abs())
            .collect();
        if keep.iter().any(|&k| k) {
            segments = segments
                .into_iter()
                .zip(keep)
                .filter_map(|(seg, k)| k.then_some(seg))
                .collect();
        }
    }

    let mut chain: Vec<NurbsCurve<Vector4>> = Vec::new();
    let mut prev_end_der: Option<Vector3> = None;
    for (prog, mut offset) in segments {
        let (front, back) = prog.range_tuple();
        if let (Some(end_der), Some(previous)) = (prev_end_der, chain.last_mut()) {
            let end_point = previous.subs(previous.range_tuple().1);
            let start_point = offset.subs(offset.range_tuple().0);
            if end_point.distance(start_point) > tol.distance {
                let turn = end_der.cross(prog.der(front)).dot(axis);
                if turn * distance > 0.0 {
                    // convex corner: bridge the gap with an arc around the
                    // progenitor joint
                    let joint = prog.subs(front);
                    let n0 = (end_point - joint).normalize();
                    let n1 = (start_point - joint).normalize();
                    let angle = n0.cross(n1).dot(axis).atan2(n0.dot(n1));
                    chain.push(circle_arc(end_point, joint, axis, Rad(angle)));
                } else {
                    // concave corner: intersect the two offsets and trim the
                    // overlap, falling back to a straight joint
                    let hits = previous.intersect_curve(&offset, tol);
                    match hits.last() {
                        Some(hit) => {
                            previous.cut(hit.param0);
                            offset = offset.cut(hit.param1);
                        }
                        None => chain.push(line_joint(end_point, start_point)),
                    }
                }
            }
        }
        prev_end_der = Some(prog.der(back));
        chain.push(offset);
    }

    let target = chain.iter().map(|c| c.degree()).max().unwrap_or(1);
    let mut collector = CurveCollector::<NurbsCurve<Vector4>>::Singleton;
    let mut accumulated = 0.0;
    for mut segment in chain {
        while segment.degree() < target {
            segment.elevate_degree();
        }
        segment.knot_normalize().knot_translate(accumulated);
        accumulated += 1.0;
        collector.concat(&segment);
    }
    let mut curve = collector.unwrap();
    curve.knot_normalize();
    OffsetResult { curve, is_cusp }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::circle;
    use trefoil_base::assert_near;

    fn polynomial(knots: KnotVec, cps: Vec<Point3>) -> Curve {
        Curve::BSpline(BSplineCurve::new(knots, cps))
    }

    fn segment_distance(pt: Point3, a: Point3, b: Point3) -> f64 {
        let dir = b - a;
        let s = ((pt - a).dot(dir) / dir.magnitude2()).clamp(0.0, 1.0);
        pt.distance(a + dir * s)
    }

    #[test]
    fn line_offsets_to_a_parallel_line() {
        let line = polynomial(
            KnotVec::bezier_knot(1),
            vec![Point3::origin(), Point3::new(2.0, 0.0, 0.0)],
        );
        let result = offset_curve(&line, Vector3::unit_z(), 0.5, &Tolerances::default());
        assert!(!result.is_cusp);
        for i in 0..=16 {
            let t = i as f64 / 16.0;
            let pt = result.curve.subs(t);
            assert_near!(pt.y, -0.5);
            assert_near!(pt.z, 0.0);
        }
        assert_near!(result.curve.subs(0.0), Point3::new(0.0, -0.5, 0.0));
        assert_near!(result.curve.subs(1.0), Point3::new(2.0, -0.5, 0.0));
    }

    #[test]
    fn arch_offset_stays_within_the_deviation_tolerance() {
        let arch = polynomial(
            KnotVec::bezier_knot(3),
            vec![
                Point3::origin(),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(3.0, 2.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
            ],
        );
        let tol = Tolerances::default();
        let result = offset_curve(&arch, Vector3::unit_z(), 0.3, &tol);
        assert!(!result.is_cusp);
        for i in 0..=64 {
            let t = i as f64 / 64.0;
            let gap = ParametricCurve::subs(&arch, t).distance(result.curve.subs(t));
            assert!(
                (gap - 0.3).abs() < 2.0 * tol.offset_deviation,
                "deviation {} at {}",
                (gap - 0.3).abs(),
                t
            );
        }
    }

    #[test]
    fn circle_offsets_to_a_concentric_circle() {
        let circle = Curve::Nurbs(circle(Point3::origin(), Vector3::unit_z(), 1.0));
        let tol = Tolerances::default();
        let result = offset_curve(&circle, Vector3::unit_z(), 0.5, &tol);
        assert!(!result.is_cusp);
        // the offset definition holds at every Greville abscissa
        for t in result.curve.knot_vec().greville(result.curve.degree()) {
            let radius = result.curve.subs(t).to_vec().magnitude();
            assert!(
                (radius - 1.5).abs() < tol.offset_deviation,
                "radius {} at {}",
                radius,
                t
            );
        }
    }

    #[test]
    fn convex_corner_is_bridged_by_an_arc() {
        let elbow = polynomial(
            KnotVec::from(vec![0.0, 0.0, 0.5, 1.0, 1.0]),
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
        );
        let result = offset_curve(&elbow, Vector3::unit_z(), 0.2, &Tolerances::default());
        assert!(!result.is_cusp);
        let (t0, t1) = result.curve.range_tuple();
        assert_near!(result.curve.subs(t0), Point3::new(0.0, -0.2, 0.0));
        assert_near!(result.curve.subs(t1), Point3::new(1.2, 1.0, 0.0));
        let corner = Point3::new(1.0, 0.0, 0.0);
        for i in 0..=100 {
            let t = t0 + (t1 - t0) * i as f64 / 100.0;
            let pt = result.curve.subs(t);
            let dist = segment_distance(pt, Point3::origin(), corner)
                .min(segment_distance(pt, corner, Point3::new(1.0, 1.0, 0.0)));
            assert!((dist - 0.2).abs() < 0.02, "distance {} at {}", dist, t);
        }
    }

    #[test]
    fn concave_corner_is_trimmed() {
        let elbow = polynomial(
            KnotVec::from(vec![0.0, 0.0, 0.5, 1.0, 1.0]),
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
        );
        let result = offset_curve(&elbow, Vector3::unit_z(), -0.2, &Tolerances::default());
        let (t0, t1) = result.curve.range_tuple();
        assert_near!(result.curve.subs(t0), Point3::new(0.0, 0.2, 0.0));
        assert_near!(result.curve.subs(t1), Point3::new(0.8, 1.0, 0.0));
        // the trimmed joint sits at the inner miter point
        let mid = result.curve.subs((t0 + t1) / 2.0);
        assert_near!(mid, Point3::new(0.8, 0.2, 0.0));
    }

    #[test]
    fn over_curvature_offset_is_flagged_and_loop_free() {
        let hairpin = polynomial(
            KnotVec::bezier_knot(2),
            vec![
                Point3::origin(),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
        );
        let tol = Tolerances::default();
        // apex radius of curvature is 0.5, so offsetting by 0.6 into the
        // concave side folds the raw offset over itself
        let result = offset_curve(&hairpin, Vector3::unit_z(), 0.6, &tol);
        assert!(result.is_cusp);
        assert!(result.curve.self_intersect(&tol).is_empty());
    }
}
