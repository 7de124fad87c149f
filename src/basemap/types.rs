//! Type definitions for basemap loading.

use crate::geo::{self, FeatureCollection, Topology};
use geo_types::MultiLineString;
use std::fmt;
use tiny_skia::Path;

/// Topology object holding the filled national outline.
pub const NATION_OBJECT: &str = "nation";
/// Topology object holding the state regions.
pub const STATES_OBJECT: &str = "states";

/// Where the topology document comes from: a file path on native builds, a
/// URL in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource(pub String);

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why the basemap could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    #[error("failed to read {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    #[error("failed to fetch {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("malformed topology: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("topology has no {0:?} object")]
    MissingObject(String),
}

/// Result of a load operation, sent through the load channel.
#[derive(Debug)]
pub enum LoadResult {
    Success(BasemapGeometry),
    Error(LoadError),
}

/// The two geometries the basemap draws, derived once from a topology.
#[derive(Debug, Clone)]
pub struct BasemapGeometry {
    /// Filled outline of the nation
    pub nation: FeatureCollection,
    /// Boundaries shared by two distinct states
    pub states: MultiLineString<f64>,
    nation_path: Option<Path>,
    states_path: Option<Path>,
}

impl BasemapGeometry {
    /// Derives nation features and the interior state mesh.
    ///
    /// Deterministic: the same topology always yields the same geometry.
    pub fn from_topology(topology: &Topology) -> Result<Self, LoadError> {
        let nation_object = object(topology, NATION_OBJECT)?;
        let states_object = object(topology, STATES_OBJECT)?;

        let nation = geo::feature(topology, nation_object);
        if nation.is_empty() {
            log::warn!("Topology object {:?} has no features", NATION_OBJECT);
        }
        log::debug!(
            "Nation feature ids: {:?}",
            nation.features.iter().map(|f| f.id.as_ref()).collect::<Vec<_>>()
        );
        let states = geo::mesh_filtered(topology, states_object, |a, b| a != b);

        Ok(Self {
            nation_path: geo::feature_collection_path(&nation),
            states_path: geo::mesh_path(&states),
            nation,
            states,
        })
    }

    /// Parses topology bytes and derives the geometry.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let topology = Topology::from_slice(bytes)?;
        log::info!(
            "Parsed topology: {} arcs, quantized: {}, bbox: {:?}",
            topology.arcs().len(),
            topology.is_quantized(),
            topology.bbox()
        );
        Self::from_topology(&topology)
    }

    pub fn nation_path(&self) -> Option<&Path> {
        self.nation_path.as_ref()
    }

    pub fn states_path(&self) -> Option<&Path> {
        self.states_path.as_ref()
    }
}

fn object<'a>(topology: &'a Topology, name: &str) -> Result<&'a geo::TopoGeometry, LoadError> {
    topology.object(name).ok_or_else(|| {
        log::error!(
            "Topology object {:?} not found; available: {}",
            name,
            topology.object_names().collect::<Vec<_>>().join(", ")
        );
        LoadError::MissingObject(name.to_string())
    })
}
