//! Topology decoding and geometry for the basemap.
//!
//! This module turns a TopoJSON document into the two geometries the map
//! draws: filled region features and a boundary mesh. It also converts those
//! geometries into drawing paths.

mod feature;
mod mesh;
mod path;
mod topology;

pub use feature::{feature, FeatureCollection};
pub use mesh::mesh_filtered;
pub use path::{feature_collection_path, mesh_path};
pub use topology::{TopoGeometry, Topology};
