//! Design-point curves with explicit recompute lifecycle, and the curve
//! registry.
//!
//! A design curve owns its vertex sequence and a derived interpolated
//! B-spline. Mutations only mark the derived data stale; every query goes
//! through [`DesignCurve::ensure_current`], which re-runs the interpolation
//! exactly when the state is dirty. Nothing is recomputed inside accessors
//! implicitly.

use crate::curve::Curve;
use crate::errors::Error;
use crate::interpolate::{interpolate, Parameterization};
pub use crate::interpolate::Vertex;
use crate::interrogate::{Interrogation, InterrogateCurve};
use crate::nurbs::BSplineCurve;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trefoil_base::cgmath64::*;
use trefoil_base::tolerance::Tolerances;
use trefoil_geotrait::algo;
use trefoil_geotrait::{BoundedCurve, ParametricCurve, SPHint1D, SearchNearestParameter};

/// Highest derivative order served by [`DesignCurve::derivatives_at`].
pub const MAX_DERIVATIVE_ORDER: usize = 3;

/// Which tangent slot of a vertex to assign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TangentSide {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum DesignState {
    Clean,
    #[default]
    Dirty,
}

/// An interpolated curve defined by mutable design points.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DesignCurve {
    vertices: Vec<Vertex>,
    max_degree: usize,
    parameterization: Parameterization,
    #[serde(skip)]
    cache: Option<BSplineCurve<Point3>>,
    #[serde(skip)]
    state: DesignState,
}

impl DesignCurve {
    pub fn new(
        vertices: Vec<Vertex>,
        max_degree: usize,
        parameterization: Parameterization,
    ) -> Self {
        DesignCurve {
            vertices,
            max_degree,
            parameterization,
            cache: None,
            state: DesignState::Dirty,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn parameterization(&self) -> Parameterization {
        self.parameterization
    }

    /// Re-runs the interpolation if any mutation invalidated the derived
    /// curve, and returns it. Every public query funnels through here.
    pub fn ensure_current(&mut self) -> Result<&BSplineCurve<Point3>> {
        if self.state == DesignState::Dirty || self.cache.is_none() {
            self.cache = Some(interpolate(
                &self.vertices,
                self.max_degree,
                self.parameterization,
            )?);
            self.state = DesignState::Clean;
        }
        match &self.cache {
            Some(curve) => Ok(curve),
            None => Err(Error::SingularSystem),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        match index < self.vertices.len() {
            true => Ok(()),
            false => Err(Error::IndexOutOfRange(index, self.vertices.len())),
        }
    }

    // mutation surface: every entry marks the derived curve stale

    pub fn append(&mut self, position: Point3) {
        self.vertices.push(Vertex::new(position));
        self.state = DesignState::Dirty;
    }

    pub fn append_vertex(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
        self.state = DesignState::Dirty;
    }

    pub fn insert(&mut self, index: usize, position: Point3) -> Result<()> {
        if index > self.vertices.len() {
            return Err(Error::IndexOutOfRange(index, self.vertices.len()));
        }
        self.vertices.insert(index, Vertex::new(position));
        self.state = DesignState::Dirty;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Vertex> {
        self.check_index(index)?;
        self.state = DesignState::Dirty;
        Ok(self.vertices.remove(index))
    }

    pub fn modify(&mut self, index: usize, position: Point3) -> Result<()> {
        self.check_index(index)?;
        self.vertices[index].position = position;
        self.state = DesignState::Dirty;
        Ok(())
    }

    /// Marks the vertex as a knuckle; tangent continuity is no longer
    /// enforced there.
    pub fn add_corner(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.vertices[index].is_corner = true;
        self.state = DesignState::Dirty;
        Ok(())
    }

    /// Sets one tangent slot of a corner vertex. Tangents on smooth
    /// vertices are stored but stay inactive until the vertex becomes a
    /// corner.
    pub fn add_tangent(&mut self, index: usize, vector: Vector3, side: TangentSide) -> Result<()> {
        self.check_index(index)?;
        match side {
            TangentSide::In => self.vertices[index].tangent_in = Some(vector),
            TangentSide::Out => self.vertices[index].tangent_out = Some(vector),
        }
        self.state = DesignState::Dirty;
        Ok(())
    }

    /// Inserts a knot into the derived curve. The refinement survives until
    /// the next vertex mutation re-runs the interpolation.
    pub fn insert_knot_at(&mut self, t: f64) -> Result<()> {
        self.ensure_current()?;
        if let Some(curve) = self.cache.as_mut() {
            curve.add_knot(t);
        }
        Ok(())
    }

    /// Attempts to remove up to `count` knots near `t` from the derived
    /// curve, each only if the reconstruction stays within
    /// `tol.knot_removal`. Returns the number actually removed.
    pub fn remove_knot_at(&mut self, t: f64, count: usize, tol: &Tolerances) -> Result<usize> {
        self.ensure_current()?;
        let Some(curve) = self.cache.as_mut() else {
            return Ok(0);
        };
        let mut removed = 0;
        for _ in 0..count {
            let Some(idx) = curve.knot_vec().floor(t) else {
                break;
            };
            if curve.try_remove_knot_within(idx, tol.knot_removal).is_err() {
                break;
            }
            removed += 1;
        }
        Ok(removed)
    }

    /// Splits the derived curve at `t`; `None` if `t` is not interior.
    pub fn split(&mut self, t: f64) -> Result<Option<(Curve, Curve)>> {
        let curve = self.ensure_current()?;
        Ok(curve
            .try_split(t)
            .map(|(front, back)| (front.into(), back.into())))
    }

    // query surface

    pub fn range(&mut self) -> Result<(f64, f64)> {
        Ok(self.ensure_current()?.range_tuple())
    }

    pub fn degree(&mut self) -> Result<usize> {
        Ok(self.ensure_current()?.degree())
    }

    pub fn evaluate_at(&mut self, t: f64) -> Result<Point3> {
        Ok(self.ensure_current()?.subs(t))
    }

    /// The point and its derivatives up to `order`, capped at
    /// [`MAX_DERIVATIVE_ORDER`].
    pub fn derivatives_at(&mut self, t: f64, order: usize) -> Result<Vec<Vector3>> {
        if order > MAX_DERIVATIVE_ORDER {
            return Err(Error::UnsupportedDerivativeOrder(order, MAX_DERIVATIVE_ORDER));
        }
        Ok(self.ensure_current()?.ders(order, t))
    }

    /// `n` points at uniform parameter spacing over the whole range.
    pub fn sample(&mut self, n: usize) -> Result<Vec<Point3>> {
        if n < 2 {
            return Err(Error::InsufficientPoints(n));
        }
        let curve = self.ensure_current()?;
        let (t0, t1) = curve.range_tuple();
        Ok((0..n)
            .map(|i| curve.subs(t0 + (t1 - t0) * i as f64 / (n - 1) as f64))
            .collect())
    }

    /// The parameter of the point on the curve nearest to `point`. The
    /// Newton iteration is seeded by a uniform presearch over
    /// `tol.presearch_division` samples.
    pub fn closest_position(&mut self, point: Point3, tol: &Tolerances) -> Result<Option<f64>> {
        let curve = self.ensure_current()?;
        let hint = algo::curve::presearch(curve, point, curve.range_tuple(), tol.presearch_division);
        Ok(curve.search_nearest_parameter(point, SPHint1D::Parameter(hint), tol.newton_trials))
    }

    pub fn interrogate_at(&mut self, t: f64) -> Result<Interrogation> {
        Ok(self.ensure_current()?.interrogate(t))
    }
}

/// Stable identifier of a registry entry.
pub type CurveId = u64;

/// An arena of design curves keyed by stable ids.
///
/// External layers hold ids instead of references, so rendering handles and
/// kernel curves can be released independently.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CurveRegistry {
    entries: HashMap<CurveId, DesignCurve>,
    next_id: CurveId,
}

impl CurveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, curve: DesignCurve) -> CurveId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, curve);
        id
    }

    pub fn get(&self, id: CurveId) -> Option<&DesignCurve> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: CurveId) -> Option<&mut DesignCurve> {
        self.entries.get_mut(&id)
    }

    pub fn remove(&mut self, id: CurveId) -> Option<DesignCurve> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CurveId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CurveId, &mut DesignCurve)> {
        self.entries.iter_mut().map(|(id, curve)| (*id, curve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trefoil_base::assert_near;

    fn zigzag() -> DesignCurve {
        let vertices = vec![
            Vertex::new(Point3::origin()),
            Vertex::new(Point3::new(1.0, 1.0, 0.0)),
            Vertex::new(Point3::new(2.0, 0.0, 0.0)),
            Vertex::new(Point3::new(3.0, 1.0, 0.0)),
        ];
        DesignCurve::new(vertices, 3, Parameterization::Chordal)
    }

    #[test]
    fn queries_rebuild_only_after_mutation() {
        let mut curve = zigzag();
        let before = curve.sample(10).unwrap();
        // a clean curve returns the same derived data
        assert_eq!(curve.sample(10).unwrap(), before);

        curve.modify(1, Point3::new(1.0, 2.0, 0.0)).unwrap();
        let after = curve.sample(10).unwrap();
        assert!(before
            .iter()
            .zip(&after)
            .skip(1)
            .take(8)
            .any(|(b, a)| b.distance(*a) > 0.1));
        let t = curve.range().unwrap();
        assert_near!(curve.evaluate_at(t.0).unwrap(), Point3::origin());
    }

    #[test]
    fn derivative_order_is_capped() {
        let mut curve = zigzag();
        let ders = curve.derivatives_at(0.5, 2).unwrap();
        assert_eq!(ders.len(), 3);
        assert!(matches!(
            curve.derivatives_at(0.5, 4),
            Err(Error::UnsupportedDerivativeOrder(4, 3))
        ));
    }

    #[test]
    fn knot_refinement_survives_until_the_next_edit() {
        let mut curve = zigzag();
        let (t0, t1) = curve.range().unwrap();
        let mid = (t0 + t1) / 2.0;
        let before = curve.ensure_current().unwrap().knot_vec().len();
        curve.insert_knot_at(mid).unwrap();
        assert_eq!(
            curve.ensure_current().unwrap().knot_vec().len(),
            before + 1
        );
        let shape = curve.sample(20).unwrap();
        curve.append(Point3::new(4.0, 0.0, 0.0));
        // re-interpolation drops the manual refinement
        assert_eq!(
            curve.ensure_current().unwrap().knot_vec().len(),
            before + 1
        );
        assert_ne!(curve.sample(20).unwrap(), shape);
    }

    #[test]
    fn knot_removal_honors_the_configured_tolerance() {
        let mut curve = zigzag();
        let (t0, t1) = curve.range().unwrap();
        let mid = (t0 + t1) / 2.0;
        curve.insert_knot_at(mid).unwrap();
        let shape = curve.sample(20).unwrap();

        // the freshly inserted knot reconstructs exactly
        let tol = Tolerances::default();
        assert_eq!(curve.remove_knot_at(mid, 1, &tol).unwrap(), 1);
        for (a, b) in curve.sample(20).unwrap().iter().zip(&shape) {
            assert_near!(*a, *b);
        }

        // an essential knot moves the curve past the configured budget,
        // but a looser budget lets it go
        assert_eq!(curve.remove_knot_at(mid, 1, &tol).unwrap(), 0);
        let loose = Tolerances {
            knot_removal: f64::INFINITY,
            ..Tolerances::default()
        };
        assert_eq!(curve.remove_knot_at(mid, 1, &loose).unwrap(), 1);
    }

    #[test]
    fn closest_position_is_orthogonal() {
        let mut curve = zigzag();
        let tol = Tolerances::default();
        let query = Point3::new(1.5, 2.0, 0.0);
        let t = curve.closest_position(query, &tol).unwrap().unwrap();
        let foot = curve.evaluate_at(t).unwrap();
        let der = curve.derivatives_at(t, 1).unwrap()[1];
        assert!(der.dot(foot - query).abs() < 1.0e-4);
    }

    #[test]
    fn closest_position_scans_the_whole_range() {
        let mut curve = zigzag();
        let tol = Tolerances {
            presearch_division: 16,
            ..Tolerances::default()
        };
        let query = Point3::new(3.0, 1.5, 0.0);
        let t = curve.closest_position(query, &tol).unwrap().unwrap();
        let (_, t1) = curve.range().unwrap();
        assert_near!(t, t1);
        assert_near!(curve.evaluate_at(t).unwrap(), Point3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn corner_split_and_registry_round_trip() {
        let mut registry = CurveRegistry::new();
        let id = registry.insert(zigzag());
        assert_eq!(registry.len(), 1);

        let curve = registry.get_mut(id).unwrap();
        curve.add_corner(2).unwrap();
        let (t0, t1) = curve.range().unwrap();
        let (front, back) = curve.split((t0 + t1) / 2.0).unwrap().unwrap();
        assert_near!(front.back(), back.front());

        assert!(registry.remove(id).is_some());
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }
}
