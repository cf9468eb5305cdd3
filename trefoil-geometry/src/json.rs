//! JSON exchange of curves.
//!
//! The serialized object is
//! `{ metadata: { version, type, generator }, degree, knots,
//! control_points: [{ x, y, z[, w] }], design_points? }`. Control points of
//! rational curves carry their weight in Euclidean (de-weighted) form.
//! Design-point curves serialize their raw vertices, so corner and tangent
//! constraints survive the round trip; the derived knots and control points
//! are emitted alongside for readers that only evaluate, but deserialization
//! rebuilds the curve from the vertices.

use crate::curve::Curve;
use crate::design::DesignCurve;
use crate::errors::Error;
use crate::interpolate::{Parameterization, Vertex};
use crate::nurbs::{BSplineCurve, KnotVec, NurbsCurve};
use crate::Result;
use serde::{Deserialize, Serialize};
use trefoil_base::cgmath64::*;

/// Version stamp of the serialization format, not of the crate.
pub const FORMAT_VERSION: &str = "1";
/// Generator stamp written into every metadata block.
pub const GENERATOR: &str = concat!("trefoil ", env!("CARGO_PKG_VERSION"));

const KIND_BSPLINE_CURVE: &str = "bspline_curve";
const KIND_NURBS_CURVE: &str = "nurbs_curve";
const KIND_INTERPOLATED_CURVE: &str = "interpolated_curve";

/// A curve under exchange: a shape curve carried by its control net, or a
/// design curve carried by its vertices.
#[derive(Clone, Debug)]
pub enum CurveObject {
    Shape(Curve),
    Design(DesignCurve),
}

/// The `metadata` block of every serialized object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub generator: String,
}

impl Metadata {
    fn stamp(kind: &str) -> Metadata {
        Metadata {
            version: FORMAT_VERSION.to_string(),
            kind: kind.to_string(),
            generator: GENERATOR.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
    z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    w: Option<f64>,
}

impl From<Point3> for PointRecord {
    fn from(p: Point3) -> Self {
        PointRecord {
            x: p.x,
            y: p.y,
            z: p.z,
            w: None,
        }
    }
}

impl From<Vector4> for PointRecord {
    fn from(v: Vector4) -> Self {
        let w = v.weight();
        let p = v.to_point();
        PointRecord {
            x: p.x,
            y: p.y,
            z: p.z,
            w: Some(w),
        }
    }
}

impl PointRecord {
    fn to_point(self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    fn to_weighted(self) -> Result<Vector4> {
        let w = self.w.unwrap_or(1.0);
        if w <= 0.0 {
            return Err(Error::NonpositiveWeight(w));
        }
        Ok(Vector4::from_point_weight(self.to_point(), w))
    }
}

#[derive(Serialize, Deserialize)]
struct CurveRecord {
    metadata: Metadata,
    degree: usize,
    knots: Vec<f64>,
    control_points: Vec<PointRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameterization: Option<Parameterization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    design_points: Option<Vec<Vertex>>,
}

impl CurveObject {
    /// Serializes to the exchange format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record()?)?)
    }

    /// Deserializes from the exchange format.
    pub fn from_json(json: &str) -> Result<CurveObject> {
        let record: CurveRecord = serde_json::from_str(json)?;
        CurveObject::from_record(record)
    }

    fn to_record(&self) -> Result<CurveRecord> {
        match self {
            CurveObject::Shape(Curve::BSpline(curve)) => Ok(CurveRecord {
                metadata: Metadata::stamp(KIND_BSPLINE_CURVE),
                degree: curve.degree(),
                knots: curve.knot_vec().to_vec(),
                control_points: curve.control_points().iter().map(|p| (*p).into()).collect(),
                parameterization: None,
                design_points: None,
            }),
            CurveObject::Shape(Curve::Nurbs(curve)) => Ok(CurveRecord {
                metadata: Metadata::stamp(KIND_NURBS_CURVE),
                degree: curve.degree(),
                knots: curve.knot_vec().to_vec(),
                control_points: curve.control_points().iter().map(|v| (*v).into()).collect(),
                parameterization: None,
                design_points: None,
            }),
            CurveObject::Design(design) => {
                // snapshot of the derived curve, for evaluation-only readers
                let mut design = design.clone();
                let degree = design.max_degree();
                let parameterization = design.parameterization();
                let derived = design.ensure_current()?;
                let knots = derived.knot_vec().to_vec();
                let control_points = derived.control_points().iter().map(|p| (*p).into()).collect();
                Ok(CurveRecord {
                    metadata: Metadata::stamp(KIND_INTERPOLATED_CURVE),
                    degree,
                    knots,
                    control_points,
                    parameterization: Some(parameterization),
                    design_points: Some(design.vertices().to_vec()),
                })
            }
        }
    }

    fn from_record(record: CurveRecord) -> Result<CurveObject> {
        match record.metadata.kind.as_str() {
            KIND_BSPLINE_CURVE => {
                let knots = KnotVec::try_from(record.knots)?;
                let control_points = record
                    .control_points
                    .iter()
                    .map(|r| r.to_point())
                    .collect();
                let curve = BSplineCurve::try_new(knots, control_points)?;
                if curve.degree() != record.degree {
                    return Err(Error::IrregularControlPoints);
                }
                Ok(CurveObject::Shape(Curve::BSpline(curve)))
            }
            KIND_NURBS_CURVE => {
                let knots = KnotVec::try_from(record.knots)?;
                let control_points = record
                    .control_points
                    .iter()
                    .map(|r| r.to_weighted())
                    .collect::<Result<Vec<_>>>()?;
                let curve = NurbsCurve::new(BSplineCurve::try_new(knots, control_points)?);
                if curve.degree() != record.degree {
                    return Err(Error::IrregularControlPoints);
                }
                Ok(CurveObject::Shape(Curve::Nurbs(curve)))
            }
            KIND_INTERPOLATED_CURVE => {
                let vertices = record.design_points.ok_or(Error::MissingDesignPoints)?;
                Ok(CurveObject::Design(DesignCurve::new(
                    vertices,
                    record.degree,
                    record.parameterization.unwrap_or_default(),
                )))
            }
            kind => Err(Error::UnknownCurveKind(kind.to_string())),
        }
    }
}

impl From<Curve> for CurveObject {
    fn from(curve: Curve) -> Self {
        CurveObject::Shape(curve)
    }
}

impl From<BSplineCurve<Point3>> for CurveObject {
    fn from(curve: BSplineCurve<Point3>) -> Self {
        CurveObject::Shape(Curve::BSpline(curve))
    }
}

impl From<NurbsCurve<Vector4>> for CurveObject {
    fn from(curve: NurbsCurve<Vector4>) -> Self {
        CurveObject::Shape(Curve::Nurbs(curve))
    }
}

impl From<DesignCurve> for CurveObject {
    fn from(design: DesignCurve) -> Self {
        CurveObject::Design(design)
    }
}

/// Serializes any curve object to the exchange format.
#[inline(always)]
pub fn to_json(object: &CurveObject) -> Result<String> {
    object.to_json()
}

/// Deserializes a curve object from the exchange format.
#[inline(always)]
pub fn from_json(json: &str) -> Result<CurveObject> {
    CurveObject::from_json(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::circle;
    use trefoil_base::assert_near;
    use trefoil_geotrait::ParametricCurve;

    #[test]
    fn bspline_round_trip_is_exact() {
        let curve = BSplineCurve::new(
            KnotVec::uniform_knot(3, 2),
            vec![
                Point3::origin(),
                Point3::new(0.3, 1.7, 0.0),
                Point3::new(1.1, 2.2, 0.4),
                Point3::new(2.0, 1.0, 1.0 / 3.0),
                Point3::new(3.0, 0.0, 0.1),
            ],
        );
        let json = to_json(&curve.clone().into()).unwrap();
        let CurveObject::Shape(Curve::BSpline(restored)) = from_json(&json).unwrap() else {
            panic!("wrong kind restored");
        };
        assert_eq!(restored, curve);
    }

    #[test]
    fn nurbs_round_trip_preserves_the_shape() {
        let circle = circle(Point3::new(1.0, 2.0, 0.0), Vector3::unit_z(), 1.5);
        let json = to_json(&circle.clone().into()).unwrap();
        let CurveObject::Shape(Curve::Nurbs(restored)) = from_json(&json).unwrap() else {
            panic!("wrong kind restored");
        };
        assert_eq!(restored.degree(), circle.degree());
        for i in 0..=50 {
            let t = i as f64 / 50.0;
            assert_near!(restored.subs(t), circle.subs(t));
        }
    }

    #[test]
    fn design_round_trip_keeps_the_constraints() {
        let mut design = DesignCurve::new(
            vec![
                Vertex::new(Point3::origin()),
                Vertex::new(Point3::new(1.0, 1.0, 1.0)),
                Vertex::corner(Point3::new(2.0, 0.0, 0.0)),
                Vertex::new(Point3::new(3.0, 1.0, 1.0)),
            ],
            3,
            Parameterization::Centripetal,
        );
        design.add_tangent(2, Vector3::unit_y(), crate::design::TangentSide::Out).unwrap();

        let json = to_json(&design.clone().into()).unwrap();
        let CurveObject::Design(mut restored) = from_json(&json).unwrap() else {
            panic!("wrong kind restored");
        };
        assert_eq!(restored.vertices(), design.vertices());
        assert_eq!(restored.max_degree(), 3);
        assert_eq!(restored.parameterization(), Parameterization::Centripetal);
        // raw vertices round-trip exactly, so the derived samples agree bit
        // for bit
        assert_eq!(restored.sample(50).unwrap(), design.sample(50).unwrap());
    }

    #[test]
    fn metadata_is_stamped() {
        let line = BSplineCurve::new(
            KnotVec::bezier_knot(1),
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
        );
        let json = to_json(&line.into()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["type"], "bspline_curve");
        assert_eq!(value["metadata"]["version"], FORMAT_VERSION);
        assert!(value["metadata"]["generator"]
            .as_str()
            .unwrap()
            .starts_with("trefoil"));
        assert!(value.get("design_points").is_none());
    }

    #[test]
    fn malformed_records_are_rejected() {
        let line = BSplineCurve::new(
            KnotVec::bezier_knot(1),
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
        );
        let json = to_json(&line.into()).unwrap();

        let alien = json.replace("bspline_curve", "hyperbola");
        assert!(matches!(
            from_json(&alien),
            Err(Error::UnknownCurveKind(kind)) if kind == "hyperbola"
        ));

        let circle = circle(Point3::origin(), Vector3::unit_z(), 1.0);
        let json = to_json(&circle.into()).unwrap();
        let negated = json.replacen("\"w\": 0.7", "\"w\": -0.7", 1);
        assert_ne!(json, negated);
        assert!(matches!(
            from_json(&negated),
            Err(Error::NonpositiveWeight(w)) if w < 0.0
        ));
    }
}
