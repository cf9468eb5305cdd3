//! Curve intersection by paired subdivision of control-polygon boxes.

use crate::nurbs::{BSplineCurve, NurbsCurve};
use trefoil_base::bounding_box::BoundingBox;
use trefoil_base::cgmath64::*;
use trefoil_base::newton::{self, CalcOutput};
use trefoil_base::tolerance::Tolerances;
use trefoil_geotrait::{BoundedCurve, Cut, ParametricCurve, ParametricCurve3D};

/// Fraction of the parameter span below which a candidate pair of a
/// self-intersection counts as trivially coincident and is discarded.
const DIAGONAL_FRACTION: f64 = 0.01;

/// One refined candidate intersection between two curves.
///
/// `point0` and `point1` are the evaluations at the two parameters; they
/// agree up to the acceptance tolerance of the refinement.
#[derive(Clone, Copy, Debug)]
pub struct CurveIntersection {
    pub param0: f64,
    pub param1: f64,
    pub point0: Point3,
    pub point1: Point3,
}

impl CurveIntersection {
    /// The gap left between the two evaluations by the refinement.
    #[inline(always)]
    pub fn gap(&self) -> f64 {
        self.point0.distance(self.point1)
    }
}

/// Curves that expose a control-polygon bounding box for subdivision.
///
/// By the convex hull property the box of the control polygon contains the
/// whole curve segment, which makes box pruning sound: segments with
/// disjoint boxes cannot meet.
pub trait IntersectCurve: ParametricCurve3D + BoundedCurve + Cut + Clone {
    fn polygon_bounding_box(&self) -> BoundingBox<Point3>;

    /// All transversal intersections with `other`, ordered along `self`.
    fn intersect_curve<R: IntersectCurve>(
        &self,
        other: &R,
        tol: &Tolerances,
    ) -> Vec<CurveIntersection> {
        intersect_curves(self, other, tol)
    }

    /// Self-intersections, with near-diagonal parameter pairs filtered out.
    fn self_intersect(&self, tol: &Tolerances) -> Vec<CurveIntersection> {
        self_intersect(self, tol)
    }

    /// Crossings of the plane through `origin` with unit normal direction
    /// `normal`, as `(parameter, point)` pairs ordered along the curve.
    fn intersect_plane(
        &self,
        origin: Point3,
        normal: Vector3,
        tol: &Tolerances,
    ) -> Vec<(f64, Point3)> {
        intersect_curve_plane(self, origin, normal, tol)
    }
}

impl IntersectCurve for BSplineCurve<Point3> {
    #[inline(always)]
    fn polygon_bounding_box(&self) -> BoundingBox<Point3> {
        self.roughly_bounding_box()
    }
}

impl IntersectCurve for NurbsCurve<Vector4> {
    #[inline(always)]
    fn polygon_bounding_box(&self) -> BoundingBox<Point3> {
        self.roughly_bounding_box()
    }
}

fn bisect<C: IntersectCurve>(curve: &C) -> (C, C) {
    let (t0, t1) = curve.range_tuple();
    let mut front = curve.clone();
    let back = front.cut((t0 + t1) / 2.0);
    (front, back)
}

fn midpoint<C: BoundedCurve>(curve: &C) -> f64 {
    let (t0, t1) = curve.range_tuple();
    (t0 + t1) / 2.0
}

/// Newton refinement of the stationary-distance system
/// `C0'(s) . (C0(s) - C1(t)) = 0`, `C1'(t) . (C0(s) - C1(t)) = 0`,
/// evaluated clamped to both parameter ranges.
fn refine_pair<C0, C1>(
    curve0: &C0,
    curve1: &C1,
    s: f64,
    t: f64,
    tol: &Tolerances,
) -> Option<CurveIntersection>
where
    C0: ParametricCurve3D + BoundedCurve,
    C1: ParametricCurve3D + BoundedCurve,
{
    let (s0, s1) = curve0.range_tuple();
    let (t0, t1) = curve1.range_tuple();
    let function = |hint: Vector2| {
        let s = hint.x.clamp(s0, s1);
        let t = hint.y.clamp(t0, t1);
        let gap = curve0.subs(s) - curve1.subs(t);
        let d0 = curve0.der(s);
        let d1 = curve1.der(t);
        CalcOutput {
            value: Vector2::new(d0.dot(gap), -d1.dot(gap)),
            derivation: Matrix2::new(
                curve0.der2(s).dot(gap) + d0.magnitude2(),
                -d1.dot(d0),
                -d0.dot(d1),
                -curve1.der2(t).dot(gap) + d1.magnitude2(),
            ),
        }
    };
    let solution = newton::solve(function, Vector2::new(s, t), tol.newton_trials).ok()?;
    let s = solution.x.clamp(s0, s1);
    let t = solution.y.clamp(t0, t1);
    let point0 = curve0.subs(s);
    let point1 = curve1.subs(t);
    match point0.distance(point1) < tol.intersection {
        true => Some(CurveIntersection {
            param0: s,
            param1: t,
            point0,
            point1,
        }),
        false => None,
    }
}

/// Merges candidates that landed in the same leaf-level neighborhood.
fn dedupe(
    mut candidates: Vec<CurveIntersection>,
    width0: f64,
    width1: f64,
) -> Vec<CurveIntersection> {
    candidates.sort_by(|a, b| {
        a.param0
            .total_cmp(&b.param0)
            .then(a.param1.total_cmp(&b.param1))
    });
    let mut results: Vec<CurveIntersection> = Vec::new();
    for candidate in candidates {
        let duplicate = results.iter().any(|r| {
            (r.param0 - candidate.param0).abs() <= width0
                && (r.param1 - candidate.param1).abs() <= width1
        });
        if !duplicate {
            results.push(candidate);
        }
    }
    results
}

fn leaf_width<C: BoundedCurve>(curve: &C, depth: usize) -> f64 {
    let (t0, t1) = curve.range_tuple();
    (t1 - t0) / (1 << depth) as f64
}

fn intersect_curves<C0, C1>(curve0: &C0, curve1: &C1, tol: &Tolerances) -> Vec<CurveIntersection>
where
    C0: IntersectCurve,
    C1: IntersectCurve,
{
    let mut candidates = Vec::new();
    let mut stack = vec![(curve0.clone(), curve1.clone(), 0_usize)];
    while let Some((c0, c1, depth)) = stack.pop() {
        if !c0
            .polygon_bounding_box()
            .intersects(&c1.polygon_bounding_box())
        {
            continue;
        }
        if depth >= tol.subdivision_depth {
            let hit = refine_pair(curve0, curve1, midpoint(&c0), midpoint(&c1), tol);
            candidates.extend(hit);
            continue;
        }
        let (a0, a1) = bisect(&c0);
        let (b0, b1) = bisect(&c1);
        stack.push((a0.clone(), b0.clone(), depth + 1));
        stack.push((a0, b1.clone(), depth + 1));
        stack.push((a1.clone(), b0, depth + 1));
        stack.push((a1, b1, depth + 1));
    }
    dedupe(
        candidates,
        leaf_width(curve0, tol.subdivision_depth),
        leaf_width(curve1, tol.subdivision_depth),
    )
}

fn self_intersect<C: IntersectCurve>(curve: &C, tol: &Tolerances) -> Vec<CurveIntersection> {
    let (t0, t1) = curve.range_tuple();
    let diagonal_eps = (t1 - t0) * DIAGONAL_FRACTION;

    let mut candidates = Vec::new();
    let mut stack = vec![(curve.clone(), curve.clone(), true, 0_usize)];
    while let Some((c0, c1, diagonal, depth)) = stack.pop() {
        if diagonal {
            // a segment trivially meets itself, so only its split halves
            // can contribute a genuine crossing
            if depth < tol.subdivision_depth {
                let (front, back) = bisect(&c0);
                stack.push((front.clone(), front.clone(), true, depth + 1));
                stack.push((back.clone(), back.clone(), true, depth + 1));
                stack.push((front, back, false, depth + 1));
            }
            continue;
        }
        if !c0
            .polygon_bounding_box()
            .intersects(&c1.polygon_bounding_box())
        {
            continue;
        }
        if depth >= tol.subdivision_depth {
            let hit = refine_pair(curve, curve, midpoint(&c0), midpoint(&c1), tol);
            candidates.extend(hit);
            continue;
        }
        let (a0, a1) = bisect(&c0);
        let (b0, b1) = bisect(&c1);
        stack.push((a0.clone(), b0.clone(), false, depth + 1));
        stack.push((a0, b1.clone(), false, depth + 1));
        stack.push((a1.clone(), b0, false, depth + 1));
        stack.push((a1, b1, false, depth + 1));
    }

    for candidate in &mut candidates {
        if candidate.param0 > candidate.param1 {
            std::mem::swap(&mut candidate.param0, &mut candidate.param1);
            std::mem::swap(&mut candidate.point0, &mut candidate.point1);
        }
    }
    candidates.retain(|c| (c.param1 - c.param0).abs() > diagonal_eps);
    let width = leaf_width(curve, tol.subdivision_depth);
    dedupe(candidates, width, width)
}

fn plane_overlaps_box(bbox: &BoundingBox<Point3>, origin: Point3, normal: Vector3) -> bool {
    if bbox.is_empty() {
        return false;
    }
    let center_dist = (bbox.center() - origin).dot(normal);
    let half = bbox.diagonal() / 2.0;
    let radius = half.x * normal.x.abs() + half.y * normal.y.abs() + half.z * normal.z.abs();
    center_dist.abs() <= radius
}

fn intersect_curve_plane<C: IntersectCurve>(
    curve: &C,
    origin: Point3,
    normal: Vector3,
    tol: &Tolerances,
) -> Vec<(f64, Point3)> {
    let normal = normal.normalize();
    let (t0, t1) = curve.range_tuple();

    let mut candidates = Vec::new();
    let mut stack = vec![(curve.clone(), 0_usize)];
    while let Some((segment, depth)) = stack.pop() {
        if !plane_overlaps_box(&segment.polygon_bounding_box(), origin, normal) {
            continue;
        }
        if depth >= tol.subdivision_depth {
            let function = |hint: f64| {
                let t = hint.clamp(t0, t1);
                CalcOutput {
                    value: (curve.subs(t) - origin).dot(normal),
                    derivation: curve.der(t).dot(normal),
                }
            };
            if let Ok(solution) = newton::solve(function, midpoint(&segment), tol.newton_trials) {
                let t = solution.clamp(t0, t1);
                if (curve.subs(t) - origin).dot(normal).abs() < tol.intersection {
                    candidates.push(t);
                }
            }
            continue;
        }
        let (front, back) = bisect(&segment);
        stack.push((front, depth + 1));
        stack.push((back, depth + 1));
    }

    candidates.sort_by(f64::total_cmp);
    let width = leaf_width(curve, tol.subdivision_depth);
    let mut results: Vec<(f64, Point3)> = Vec::new();
    for t in candidates {
        if results.iter().all(|(s, _)| (t - s).abs() > width) {
            results.push((t, curve.subs(t)));
        }
    }
    results
}
