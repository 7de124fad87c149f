//! TopoJSON topology documents.
//!
//! A topology stores every boundary segment ("arc") exactly once and lets
//! geometries reference arcs by index. Parsing decodes the arcs into
//! absolute coordinates up front, so everything downstream works with plain
//! `geo_types` coordinates and never needs the quantization transform again.

use geo_types::Coord;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Errors found while validating a topology document.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("arc {arc} has a position with fewer than two coordinates")]
    ShortPosition { arc: usize },

    #[error("geometry references arc {index} but the topology has {len} arcs")]
    ArcOutOfRange { index: i32, len: usize },

    #[error("invalid {field} for {kind} geometry: {message}")]
    InvalidMember {
        kind: String,
        field: &'static str,
        message: String,
    },

    #[error("unknown geometry type {0:?}")]
    UnknownType(String),
}

/// Quantization transform from the `transform` member of a topology.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct QuantizeTransform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl QuantizeTransform {
    fn apply(&self, x: f64, y: f64) -> Coord<f64> {
        Coord {
            x: x * self.scale[0] + self.translate[0],
            y: y * self.scale[1] + self.translate[1],
        }
    }
}

/// Resolves a signed arc reference into `(arc index, reversed)`.
///
/// Negative references use one's complement, so `-1` is arc 0 reversed.
pub fn arc_index(reference: i32) -> (usize, bool) {
    if reference < 0 {
        ((!reference) as usize, true)
    } else {
        (reference as usize, false)
    }
}

/// The shape of a topology geometry object.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryKind {
    Point(Coord<f64>),
    MultiPoint(Vec<Coord<f64>>),
    LineString(Vec<i32>),
    MultiLineString(Vec<Vec<i32>>),
    Polygon(Vec<Vec<i32>>),
    MultiPolygon(Vec<Vec<Vec<i32>>>),
    GeometryCollection(Vec<TopoGeometry>),
    /// A geometry whose `type` is `null`.
    Null,
}

/// A geometry object inside a topology.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawGeometry")]
pub struct TopoGeometry {
    pub id: Option<Value>,
    pub properties: Option<Map<String, Value>>,
    pub kind: GeometryKind,
}

impl TopoGeometry {
    /// Calls `f` with every arc reference of this geometry, recursing into
    /// collections.
    fn for_each_arc(&self, f: &mut impl FnMut(i32)) {
        match &self.kind {
            GeometryKind::LineString(arcs) => arcs.iter().copied().for_each(f),
            GeometryKind::MultiLineString(lines) | GeometryKind::Polygon(lines) => {
                lines.iter().flatten().copied().for_each(f)
            }
            GeometryKind::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().copied().for_each(f)
            }
            GeometryKind::GeometryCollection(geometries) => {
                for geometry in geometries {
                    geometry.for_each_arc(f);
                }
            }
            GeometryKind::Point(_) | GeometryKind::MultiPoint(_) | GeometryKind::Null => {}
        }
    }

    /// Maps quantized point positions to absolute coordinates. Points are
    /// stored as absolute positions, so there is no delta to undo.
    fn dequantize_points(&mut self, transform: &QuantizeTransform) {
        match &mut self.kind {
            GeometryKind::Point(coord) => *coord = transform.apply(coord.x, coord.y),
            GeometryKind::MultiPoint(coords) => {
                for coord in coords {
                    *coord = transform.apply(coord.x, coord.y);
                }
            }
            GeometryKind::GeometryCollection(geometries) => {
                for geometry in geometries {
                    geometry.dequantize_points(transform);
                }
            }
            _ => {}
        }
    }
}

/// Wire form of a geometry object before its members are checked against
/// the declared type.
#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    coordinates: Option<Value>,
    #[serde(default)]
    geometries: Vec<TopoGeometry>,
}

impl RawGeometry {
    fn member<T: serde::de::DeserializeOwned>(
        kind: &str,
        field: &'static str,
        value: Option<Value>,
    ) -> Result<T, TopologyError> {
        serde_json::from_value(value.unwrap_or(Value::Null)).map_err(|e| {
            TopologyError::InvalidMember {
                kind: kind.to_string(),
                field,
                message: e.to_string(),
            }
        })
    }
}

fn position(kind: &str, coords: Vec<f64>) -> Result<Coord<f64>, TopologyError> {
    match coords.as_slice() {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(TopologyError::InvalidMember {
            kind: kind.to_string(),
            field: "coordinates",
            message: "position needs at least two coordinates".to_string(),
        }),
    }
}

impl TryFrom<RawGeometry> for TopoGeometry {
    type Error = TopologyError;

    fn try_from(raw: RawGeometry) -> Result<Self, Self::Error> {
        let RawGeometry {
            kind,
            id,
            properties,
            arcs,
            coordinates,
            geometries,
        } = raw;

        let kind = match kind.as_deref() {
            None => GeometryKind::Null,
            Some(name @ "Point") => {
                let coords: Vec<f64> = RawGeometry::member(name, "coordinates", coordinates)?;
                GeometryKind::Point(position(name, coords)?)
            }
            Some(name @ "MultiPoint") => {
                let points: Vec<Vec<f64>> =
                    RawGeometry::member(name, "coordinates", coordinates)?;
                GeometryKind::MultiPoint(
                    points
                        .into_iter()
                        .map(|p| position(name, p))
                        .collect::<Result<_, _>>()?,
                )
            }
            Some(name @ "LineString") => {
                GeometryKind::LineString(RawGeometry::member(name, "arcs", arcs)?)
            }
            Some(name @ "MultiLineString") => {
                GeometryKind::MultiLineString(RawGeometry::member(name, "arcs", arcs)?)
            }
            Some(name @ "Polygon") => GeometryKind::Polygon(RawGeometry::member(name, "arcs", arcs)?),
            Some(name @ "MultiPolygon") => {
                GeometryKind::MultiPolygon(RawGeometry::member(name, "arcs", arcs)?)
            }
            Some("GeometryCollection") => GeometryKind::GeometryCollection(geometries),
            Some(other) => return Err(TopologyError::UnknownType(other.to_string())),
        };

        Ok(Self {
            id,
            properties,
            kind,
        })
    }
}

#[derive(Deserialize)]
struct RawTopology {
    #[serde(default)]
    bbox: Option<Vec<f64>>,
    #[serde(default)]
    transform: Option<QuantizeTransform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: BTreeMap<String, TopoGeometry>,
}

/// A parsed and validated topology.
///
/// All arcs are stored in absolute coordinates and every arc reference held
/// by an object is guaranteed to be in range.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTopology")]
pub struct Topology {
    bbox: Option<Vec<f64>>,
    transform: Option<QuantizeTransform>,
    arcs: Vec<Vec<Coord<f64>>>,
    objects: BTreeMap<String, TopoGeometry>,
}

impl TryFrom<RawTopology> for Topology {
    type Error = TopologyError;

    fn try_from(raw: RawTopology) -> Result<Self, Self::Error> {
        let arcs = raw
            .arcs
            .into_iter()
            .enumerate()
            .map(|(index, arc)| decode_arc(index, arc, raw.transform.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let len = arcs.len();
        let mut out_of_range = None;
        for object in raw.objects.values() {
            object.for_each_arc(&mut |reference| {
                let (index, _) = arc_index(reference);
                if index >= len && out_of_range.is_none() {
                    out_of_range = Some(reference);
                }
            });
        }
        if let Some(index) = out_of_range {
            return Err(TopologyError::ArcOutOfRange { index, len });
        }

        let mut objects = raw.objects;
        if let Some(transform) = &raw.transform {
            for object in objects.values_mut() {
                object.dequantize_points(transform);
            }
        }

        Ok(Self {
            bbox: raw.bbox,
            transform: raw.transform,
            arcs,
            objects,
        })
    }
}

/// Decodes one arc, undoing delta encoding and quantization when the
/// topology carries a transform.
fn decode_arc(
    index: usize,
    positions: Vec<Vec<f64>>,
    transform: Option<&QuantizeTransform>,
) -> Result<Vec<Coord<f64>>, TopologyError> {
    let mut decoded = Vec::with_capacity(positions.len());
    let (mut x, mut y) = (0.0, 0.0);

    for p in positions {
        let [px, py, ..] = p.as_slice() else {
            return Err(TopologyError::ShortPosition { arc: index });
        };
        match transform {
            Some(t) => {
                x += px;
                y += py;
                decoded.push(t.apply(x, y));
            }
            None => decoded.push(Coord { x: *px, y: *py }),
        }
    }

    Ok(decoded)
}

impl Topology {
    /// Parses a topology from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Looks up a named object.
    pub fn object(&self, name: &str) -> Option<&TopoGeometry> {
        self.objects.get(name)
    }

    /// Names of all objects, in sorted order.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Decoded arcs in absolute coordinates.
    pub fn arcs(&self) -> &[Vec<Coord<f64>>] {
        &self.arcs
    }

    /// Returns the points of an arc reference, reversed for negative
    /// references.
    pub fn arc_points(&self, reference: i32) -> impl Iterator<Item = Coord<f64>> + '_ {
        let (index, reversed) = arc_index(reference);
        let arc = &self.arcs[index];
        let forward = (!reversed).then(|| arc.iter().copied());
        let backward = reversed.then(|| arc.iter().rev().copied());
        forward.into_iter().flatten().chain(backward.into_iter().flatten())
    }

    /// First and last point of an arc reference, in traversal order.
    pub fn arc_ends(&self, reference: i32) -> Option<(Coord<f64>, Coord<f64>)> {
        let (index, reversed) = arc_index(reference);
        let arc = &self.arcs[index];
        let (first, last) = (*arc.first()?, *arc.last()?);
        Some(if reversed { (last, first) } else { (first, last) })
    }

    /// The document bounding box, if declared.
    pub fn bbox(&self) -> Option<&[f64]> {
        self.bbox.as_deref()
    }

    /// Whether the document was quantized.
    pub fn is_quantized(&self) -> bool {
        self.transform.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arc_index_negative_reference() {
        assert_eq!(arc_index(0), (0, false));
        assert_eq!(arc_index(3), (3, false));
        assert_eq!(arc_index(-1), (0, true));
        assert_eq!(arc_index(-4), (3, true));
    }

    #[test]
    fn test_quantized_point_is_transformed() {
        let doc = json!({
            "type": "Topology",
            "transform": { "scale": [0.5, 0.5], "translate": [10.0, 20.0] },
            "arcs": [],
            "objects": {
                "marker": { "type": "Point", "coordinates": [4, 6] },
                "places": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "MultiPoint", "coordinates": [[0, 0], [4, 6]] }
                    ]
                }
            }
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();

        let marker = topology.object("marker").unwrap();
        assert_eq!(marker.kind, GeometryKind::Point(Coord { x: 12.0, y: 23.0 }));

        let collection = crate::geo::feature(&topology, topology.object("places").unwrap());
        assert_eq!(
            collection.features[0].geometry,
            Some(geo_types::Geometry::MultiPoint(geo_types::MultiPoint::from(vec![
                (10.0, 20.0),
                (12.0, 23.0),
            ])))
        );
    }

    #[test]
    fn test_unquantized_point_is_unchanged() {
        let doc = json!({
            "type": "Topology",
            "arcs": [],
            "objects": { "marker": { "type": "Point", "coordinates": [4, 6] } }
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();
        let marker = topology.object("marker").unwrap();
        assert_eq!(marker.kind, GeometryKind::Point(Coord { x: 4.0, y: 6.0 }));
    }

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let doc = json!({
            "type": "Topology",
            "transform": { "scale": [0.5, 0.5], "translate": [10.0, 20.0] },
            "arcs": [[[0, 0], [2, 0], [0, 2]]],
            "objects": {}
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();

        assert!(topology.is_quantized());
        assert_eq!(
            topology.arcs()[0],
            vec![
                Coord { x: 10.0, y: 20.0 },
                Coord { x: 11.0, y: 20.0 },
                Coord { x: 11.0, y: 21.0 },
            ]
        );
    }

    #[test]
    fn test_extra_dimensions_are_ignored() {
        let doc = json!({
            "type": "Topology",
            "arcs": [[[1, 2, 99], [3, 4, 99]]],
            "objects": {}
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();
        assert_eq!(topology.arcs()[0][1], Coord { x: 3.0, y: 4.0 });
    }

    #[test]
    fn test_reversed_arc_points() {
        let doc = json!({
            "type": "Topology",
            "arcs": [[[0, 0], [1, 0], [2, 0]]],
            "objects": {}
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();

        let xs: Vec<f64> = topology.arc_points(-1).map(|c| c.x).collect();
        assert_eq!(xs, vec![2.0, 1.0, 0.0]);
        assert_eq!(
            topology.arc_ends(-1),
            Some((Coord { x: 2.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }))
        );
    }

    #[test]
    fn test_geometry_types_parse() {
        let doc = json!({
            "type": "Topology",
            "arcs": [[[0, 0], [1, 1]]],
            "objects": {
                "things": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Point", "coordinates": [5, 6], "id": "p" },
                        { "type": "LineString", "arcs": [0], "properties": { "name": "l" } },
                        { "type": null, "id": 7 }
                    ]
                }
            }
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();
        let GeometryKind::GeometryCollection(geometries) = &topology.object("things").unwrap().kind
        else {
            panic!("expected a collection");
        };

        assert_eq!(geometries[0].kind, GeometryKind::Point(Coord { x: 5.0, y: 6.0 }));
        assert_eq!(geometries[0].id, Some(json!("p")));
        assert_eq!(geometries[1].kind, GeometryKind::LineString(vec![0]));
        assert_eq!(geometries[2].kind, GeometryKind::Null);
        assert_eq!(topology.object_names().collect::<Vec<_>>(), vec!["things"]);
    }

    #[test]
    fn test_out_of_range_arc_is_rejected() {
        let doc = json!({
            "type": "Topology",
            "arcs": [[[0, 0], [1, 1]]],
            "objects": {
                "bad": { "type": "Polygon", "arcs": [[0, -3]] }
            }
        });
        let err = serde_json::from_value::<Topology>(doc).unwrap_err();
        assert!(err.to_string().contains("references arc -3"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let doc = json!({
            "type": "Topology",
            "arcs": [],
            "objects": { "odd": { "type": "Circle" } }
        });
        assert!(serde_json::from_value::<Topology>(doc).is_err());
    }

    #[test]
    fn test_malformed_bytes_fail_to_parse() {
        assert!(Topology::from_slice(b"{ not json").is_err());
        assert!(Topology::from_slice(br#"{"objects": {}}"#).is_err());
    }
}
