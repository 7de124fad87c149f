//! Geometry to drawing path conversion.
//!
//! The basemap data is already projected into canvas space, so coordinates
//! pass through unchanged; only the view transform applied at draw time
//! moves them.

use super::FeatureCollection;
use geo_types::{Coord, Geometry, LineString, MultiLineString, Polygon};
use tiny_skia::{Path, PathBuilder};

/// Radius used for point geometries.
const POINT_RADIUS: f32 = 4.5;

/// Builds one path covering every geometry in a feature collection.
pub fn feature_collection_path(collection: &FeatureCollection) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for geometry in collection.geometries() {
        push_geometry(&mut pb, geometry);
    }
    pb.finish()
}

/// Builds an open path for a boundary mesh.
pub fn mesh_path(mesh: &MultiLineString<f64>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for line in mesh {
        push_line_string(&mut pb, line, false);
    }
    pb.finish()
}

fn push_geometry(pb: &mut PathBuilder, geometry: &Geometry<f64>) {
    match geometry {
        Geometry::Point(point) => push_point(pb, point.0),
        Geometry::MultiPoint(points) => {
            for point in points {
                push_point(pb, point.0);
            }
        }
        Geometry::Line(line) => push_line(pb, [line.start, line.end].into_iter(), false),
        Geometry::LineString(line) => push_line_string(pb, line, false),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                push_line_string(pb, line, false);
            }
        }
        Geometry::Polygon(polygon) => push_polygon(pb, polygon),
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                push_polygon(pb, polygon);
            }
        }
        Geometry::GeometryCollection(collection) => {
            for geometry in collection {
                push_geometry(pb, geometry);
            }
        }
        Geometry::Rect(rect) => push_polygon(pb, &rect.to_polygon()),
        Geometry::Triangle(triangle) => push_polygon(pb, &triangle.to_polygon()),
    }
}

fn push_point(pb: &mut PathBuilder, coord: Coord<f64>) {
    pb.push_circle(coord.x as f32, coord.y as f32, POINT_RADIUS);
}

/// Every ring of a polygon goes into the same path so the fill rule can cut
/// the holes out.
fn push_polygon(pb: &mut PathBuilder, polygon: &Polygon<f64>) {
    push_line_string(pb, polygon.exterior(), true);
    for interior in polygon.interiors() {
        push_line_string(pb, interior, true);
    }
}

fn push_line_string(pb: &mut PathBuilder, line: &LineString<f64>, closed: bool) {
    push_line(pb, line.coords().copied(), closed);
}

fn push_line(pb: &mut PathBuilder, coords: impl Iterator<Item = Coord<f64>>, closed: bool) {
    let mut started = false;
    for coord in coords {
        let (x, y) = (coord.x as f32, coord.y as f32);
        if started {
            pb.line_to(x, y);
        } else {
            pb.move_to(x, y);
            started = true;
        }
    }
    if started && closed {
        pb.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::feature::Feature;
    use geo_types::{line_string, polygon, Point};

    fn geometry_path(geometry: Geometry<f64>) -> Option<Path> {
        feature_collection_path(&FeatureCollection {
            features: vec![Feature {
                id: None,
                properties: Default::default(),
                geometry: Some(geometry),
            }],
        })
    }

    #[test]
    fn test_polygon_with_hole_bounds() {
        let polygon = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0)]],
        );
        let path = geometry_path(Geometry::Polygon(polygon)).unwrap();
        let bounds = path.bounds();

        assert_eq!(bounds.left(), 0.0);
        assert_eq!(bounds.top(), 0.0);
        assert_eq!(bounds.right(), 10.0);
        assert_eq!(bounds.bottom(), 10.0);
    }

    #[test]
    fn test_multi_line_string_path() {
        let lines = MultiLineString(vec![
            line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0)],
            line_string![(x: 5.0, y: 1.0), (x: 6.0, y: 3.0)],
        ]);
        let path = mesh_path(&lines).unwrap();
        assert_eq!(path.bounds().right(), 6.0);
        assert_eq!(path.bounds().bottom(), 3.0);
    }

    #[test]
    fn test_point_is_drawn_as_circle() {
        let path = geometry_path(Geometry::Point(Point::new(10.0, 10.0))).unwrap();
        assert!((path.bounds().width() - 2.0 * POINT_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn test_empty_collection_has_no_path() {
        assert!(feature_collection_path(&FeatureCollection::default()).is_none());
    }
}
