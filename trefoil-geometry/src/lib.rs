#![doc = "Trefoil-geometry implements the parametric geometry of the trefoil kernel: B-spline and NURBS curves and surfaces, point interpolation, differential interrogation, curve intersection, offset approximation, surface builders, and a JSON exchange format."]
#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(clippy::all, rust_2018_idioms)]

/// Errors the geometry routines can produce.
pub mod errors;
pub use errors::{Error, Result};

/// B-spline and NURBS curves and surfaces.
pub mod nurbs;

/// Exact conic sections as rational curves.
pub mod conic;
/// Global point interpolation with knuckle subdivision.
pub mod interpolate;
/// Differential interrogation: Frenet frames, curvature, torsion.
pub mod interrogate;
/// Curve-curve and curve-plane intersection.
pub mod intersect;
/// Offset curve approximation with cusp repair.
pub mod offset;

/// Surface builders: extrusion, revolution, lofting, Gordon surfaces.
pub mod builder;

/// The closed set of curve kinds the kernel exchanges.
pub mod curve;
/// Editable curves driven by design points.
pub mod design;
/// JSON serialization of curves and design points.
pub mod json;

pub mod prelude {
    pub use crate::curve::Curve;
    pub use crate::design::{CurveRegistry, DesignCurve, Vertex};
    pub use crate::errors::{Error, Result};
    pub use crate::interpolate::Parameterization;
    pub use crate::interrogate::Interrogation;
    pub use crate::intersect::{CurveIntersection, IntersectCurve};
    pub use crate::json::{from_json, to_json, CurveObject};
    pub use crate::nurbs::*;
}
