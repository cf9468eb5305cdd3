#![doc = "Trefoil-geotrait defines the trait seams shared by every curve and surface kind, together with the closest-position search algorithms built on them."]
#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(clippy::all, rust_2018_idioms)]

/// Shared parameter-search algorithms (presearch + clamped Newton).
pub mod algo;
mod traits;

pub use crate::traits::*;
