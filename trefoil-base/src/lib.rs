#![doc = "Trefoil-base provides the foundational math, tolerance and solver utilities for the geometry kernel."]
#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

/// Axis-aligned bounding boxes and helpers for merging geometry.
pub mod bounding_box;
/// Double-precision convenience exports for `cgmath`.
pub mod cgmath64;
/// Dense linear solver with partial pivoting.
pub mod gaussian;
/// Homogeneous coordinates and rational derivative corrections.
pub mod homogeneous;
/// Newton solver and iteration logging helpers.
pub mod newton;
/// Tolerance constants, comparison macros, and traits.
pub mod tolerance;
