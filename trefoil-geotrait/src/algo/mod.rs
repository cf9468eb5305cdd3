/// Parameter search algorithms for parametric curves.
pub mod curve;
/// Parameter search algorithms for parametric surfaces.
pub mod surface;
