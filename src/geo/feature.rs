//! Conversion of topology objects into standalone geometry.

use super::topology::{GeometryKind, TopoGeometry, Topology};
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde_json::{Map, Value};

/// A geometry with the identifier and properties of its topology object.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
    /// `None` for objects whose type is `null`.
    pub geometry: Option<Geometry<f64>>,
}

/// An ordered list of features.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterates over the non-null geometries.
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry<f64>> {
        self.features.iter().filter_map(|f| f.geometry.as_ref())
    }
}

/// Converts a topology object into features.
///
/// A geometry collection yields one feature per member; any other object
/// yields a single feature.
pub fn feature(topology: &Topology, object: &TopoGeometry) -> FeatureCollection {
    let features = match &object.kind {
        GeometryKind::GeometryCollection(geometries) => geometries
            .iter()
            .map(|g| to_feature(topology, g))
            .collect(),
        _ => vec![to_feature(topology, object)],
    };
    FeatureCollection { features }
}

fn to_feature(topology: &Topology, object: &TopoGeometry) -> Feature {
    Feature {
        id: object.id.clone(),
        properties: object.properties.clone().unwrap_or_default(),
        geometry: geometry(topology, object),
    }
}

/// Converts a single topology geometry, recursing into collections.
pub fn geometry(topology: &Topology, object: &TopoGeometry) -> Option<Geometry<f64>> {
    let converted = match &object.kind {
        GeometryKind::Null => return None,
        GeometryKind::Point(coord) => Geometry::Point(Point(*coord)),
        GeometryKind::MultiPoint(coords) => {
            Geometry::MultiPoint(MultiPoint(coords.iter().copied().map(Point).collect()))
        }
        GeometryKind::LineString(arcs) => Geometry::LineString(line(topology, arcs)),
        GeometryKind::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString(
            lines.iter().map(|arcs| line(topology, arcs)).collect(),
        )),
        GeometryKind::Polygon(rings) => Geometry::Polygon(polygon(topology, rings)),
        GeometryKind::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon(
            polygons.iter().map(|rings| polygon(topology, rings)).collect(),
        )),
        GeometryKind::GeometryCollection(geometries) => {
            Geometry::GeometryCollection(GeometryCollection(
                geometries
                    .iter()
                    .filter_map(|g| geometry(topology, g))
                    .collect(),
            ))
        }
    };
    Some(converted)
}

/// Joins a sequence of arcs into a coordinate list.
///
/// Consecutive arcs share their joint point, which is kept only once.
fn join_arcs(topology: &Topology, arcs: &[i32]) -> Vec<Coord<f64>> {
    let mut points: Vec<Coord<f64>> = Vec::new();
    for &reference in arcs {
        points.pop();
        points.extend(topology.arc_points(reference));
    }
    points
}

/// Builds a line string from arcs. A single point is doubled so the result
/// is still a drawable line.
pub(crate) fn line(topology: &Topology, arcs: &[i32]) -> LineString<f64> {
    let mut points = join_arcs(topology, arcs);
    if points.len() == 1 {
        points.push(points[0]);
    }
    LineString(points)
}

/// Builds a ring from arcs, padding degenerate rings to four points.
fn ring(topology: &Topology, arcs: &[i32]) -> LineString<f64> {
    let mut points = join_arcs(topology, arcs);
    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }
    LineString(points)
}

fn polygon(topology: &Topology, rings: &[Vec<i32>]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|arcs| ring(topology, arcs));
    let exterior = rings.next().unwrap_or_else(|| LineString(Vec::new()));
    Polygon::new(exterior, rings.collect())
}
