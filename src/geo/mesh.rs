//! Boundary mesh extraction.
//!
//! A mesh is the set of arcs referenced by an object, optionally filtered by
//! the pair of geometries on either side of each arc, and stitched back into
//! continuous lines.

use super::feature::line;
use super::topology::{arc_index, GeometryKind, TopoGeometry, Topology};
use geo_types::{Coord, MultiLineString};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// A leaf geometry adjacent to an arc.
///
/// Two references are equal when they point at the same geometry, which is
/// what an "interior boundaries only" filter compares.
#[derive(Debug, Clone, Copy)]
pub struct GeometryRef<'a> {
    /// Position of the geometry in depth-first traversal order.
    pub index: usize,
    pub geometry: &'a TopoGeometry,
}

impl PartialEq for GeometryRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && std::ptr::eq(self.geometry, other.geometry)
    }
}

impl Eq for GeometryRef<'_> {}

/// Meshes the arcs of `object` accepted by `filter`.
///
/// For each arc the filter receives the first and the last geometry that
/// reference it. An arc on the outer edge has a single neighbor, so
/// `|a, b| a != b` keeps only boundaries shared by two distinct geometries.
pub fn mesh_filtered<'a, F>(
    topology: &'a Topology,
    object: &'a TopoGeometry,
    filter: F,
) -> MultiLineString<f64>
where
    F: Fn(&GeometryRef<'a>, &GeometryRef<'a>) -> bool,
{
    let arcs = extract_arcs(object, filter);
    let fragments = stitch(topology, arcs);
    MultiLineString(fragments.iter().map(|arcs| line(topology, arcs)).collect())
}

/// Collects the arcs of `object` accepted by `filter`, one signed reference
/// per arc (the direction of its first use), ordered by arc index.
fn extract_arcs<'a, F>(object: &'a TopoGeometry, filter: F) -> Vec<i32>
where
    F: Fn(&GeometryRef<'a>, &GeometryRef<'a>) -> bool,
{
    let mut geoms_by_arc: BTreeMap<usize, Vec<(i32, GeometryRef<'a>)>> = BTreeMap::new();
    let mut next_index = 0;
    collect_neighbors(object, &mut next_index, &mut geoms_by_arc);

    geoms_by_arc
        .values()
        .filter_map(|geoms| {
            let (reference, first) = geoms.first()?;
            let (_, last) = geoms.last()?;
            filter(first, last).then_some(*reference)
        })
        .collect()
}

fn collect_neighbors<'a>(
    object: &'a TopoGeometry,
    next_index: &mut usize,
    geoms_by_arc: &mut BTreeMap<usize, Vec<(i32, GeometryRef<'a>)>>,
) {
    if let GeometryKind::GeometryCollection(geometries) = &object.kind {
        for geometry in geometries {
            collect_neighbors(geometry, next_index, geoms_by_arc);
        }
        return;
    }

    let neighbor = GeometryRef {
        index: *next_index,
        geometry: object,
    };
    *next_index += 1;

    let mut push = |reference: i32| {
        let (index, _) = arc_index(reference);
        geoms_by_arc
            .entry(index)
            .or_default()
            .push((reference, neighbor));
    };

    match &object.kind {
        GeometryKind::LineString(arcs) => arcs.iter().copied().for_each(&mut push),
        GeometryKind::MultiLineString(lines) | GeometryKind::Polygon(lines) => {
            lines.iter().flatten().copied().for_each(&mut push)
        }
        GeometryKind::MultiPolygon(polygons) => {
            polygons.iter().flatten().flatten().copied().for_each(&mut push)
        }
        _ => {}
    }
}

/// Hashable key for an exact end point.
type EndKey = (u64, u64);

fn end_key(coord: Coord<f64>) -> EndKey {
    // Normalize so -0.0 and 0.0 meet.
    ((coord.x + 0.0).to_bits(), (coord.y + 0.0).to_bits())
}

struct Fragment {
    arcs: VecDeque<i32>,
    start: EndKey,
    end: EndKey,
    merged: bool,
}

/// Joins arcs whose end points coincide into maximal fragments.
///
/// Each fragment is a list of signed arc references that can be walked end
/// to end. Fragments are returned in creation order.
fn stitch(topology: &Topology, mut arcs: Vec<i32>) -> Vec<Vec<i32>> {
    // Zero-length arcs go first so longer arcs can absorb them.
    let mut empty_index = 0;
    for j in 0..arcs.len() {
        let (index, _) = arc_index(arcs[j]);
        let arc = &topology.arcs()[index];
        if arc.len() < 3 && arc.first() == arc.last() {
            arcs.swap(empty_index, j);
            empty_index += 1;
        }
    }

    let mut fragments: Vec<Fragment> = Vec::new();
    let mut by_start: HashMap<EndKey, usize> = HashMap::new();
    let mut by_end: HashMap<EndKey, usize> = HashMap::new();

    for &reference in &arcs {
        let Some((first, last)) = topology.arc_ends(reference) else {
            continue;
        };
        let (start, end) = (end_key(first), end_key(last));

        if let Some(f) = by_end.remove(&start) {
            fragments[f].arcs.push_back(reference);
            fragments[f].end = end;

            // The extended fragment may now run into the start of another.
            if let Some(g) = by_start.get(&end).copied().filter(|&g| g != f) {
                by_start.remove(&end);
                let tail = std::mem::take(&mut fragments[g].arcs);
                fragments[g].merged = true;
                fragments[f].arcs.extend(tail);
                fragments[f].end = fragments[g].end;
            }

            by_start.insert(fragments[f].start, f);
            by_end.insert(fragments[f].end, f);
        } else if let Some(f) = by_start.remove(&end) {
            fragments[f].arcs.push_front(reference);
            fragments[f].start = start;
            by_start.insert(start, f);
            by_end.insert(fragments[f].end, f);
        } else {
            let id = fragments.len();
            fragments.push(Fragment {
                arcs: VecDeque::from([reference]),
                start,
                end,
                merged: false,
            });
            by_start.insert(start, id);
            by_end.insert(end, id);
        }
    }

    fragments
        .into_iter()
        .filter(|fragment| !fragment.merged)
        .map(|fragment| fragment.arcs.into_iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::tests::two_region_topology;
    use serde_json::json;

    #[test]
    fn test_interior_mesh_keeps_only_shared_arc() {
        let topology = two_region_topology();
        let states = topology.object("states").unwrap();
        let mesh = mesh_filtered(&topology, states, |a, b| a != b);

        assert_eq!(mesh.0.len(), 1);
        let coords: Vec<(f64, f64)> = mesh.0[0].coords().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords, vec![(1.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_exterior_mesh_keeps_only_outer_arcs() {
        let topology = two_region_topology();
        let states = topology.object("states").unwrap();
        let mesh = mesh_filtered(&topology, states, |a, b| a == b);

        // Both outer arcs meet at (1,0) and (1,1) and stitch into one ring.
        assert_eq!(mesh.0.len(), 1);
        assert_eq!(mesh.0[0].0.len(), 7);
        assert_eq!(mesh.0[0].0.first(), mesh.0[0].0.last());
    }

    #[test]
    fn test_unfiltered_mesh_stitches_all_arcs() {
        let topology = two_region_topology();
        let mesh = mesh_filtered(&topology, topology.object("states").unwrap(), |_, _| true);

        assert_eq!(mesh.0.len(), 1);
        assert_eq!(mesh.0[0].0.len(), 8);
    }

    #[test]
    fn test_no_output_arc_has_equal_neighbors() {
        let topology = two_region_topology();
        let states = topology.object("states").unwrap();

        let kept = extract_arcs(states, |a, b| a != b);
        assert_eq!(kept, vec![0]);

        // The outer arcs each have a single referencing geometry.
        let mut geoms_by_arc = BTreeMap::new();
        collect_neighbors(states, &mut 0, &mut geoms_by_arc);
        for reference in kept {
            let (index, _) = arc_index(reference);
            let geoms = &geoms_by_arc[&index];
            assert_ne!(geoms.first().unwrap().1, geoms.last().unwrap().1);
        }
    }

    #[test]
    fn test_stitch_joins_reversed_and_prepended_arcs() {
        // Three collinear arcs, listed out of order and one reversed.
        let doc = json!({
            "type": "Topology",
            "arcs": [
                [[1, 0], [2, 0]],
                [[0, 0], [1, 0]],
                [[3, 0], [2, 0]]
            ],
            "objects": {
                "line": { "type": "MultiLineString", "arcs": [[0], [1], [-3]] }
            }
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();
        let mesh = mesh_filtered(&topology, topology.object("line").unwrap(), |_, _| true);

        assert_eq!(mesh.0.len(), 1);
        let xs: Vec<f64> = mesh.0[0].coords().map(|c| c.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_disjoint_arcs_stay_separate() {
        let doc = json!({
            "type": "Topology",
            "arcs": [
                [[0, 0], [1, 0]],
                [[5, 5], [6, 5]]
            ],
            "objects": {
                "lines": { "type": "MultiLineString", "arcs": [[0], [1]] }
            }
        });
        let topology: Topology = serde_json::from_value(doc).unwrap();
        let mesh = mesh_filtered(&topology, topology.object("lines").unwrap(), |_, _| true);
        assert_eq!(mesh.0.len(), 2);
    }

    #[test]
    fn test_mesh_is_deterministic() {
        let topology = two_region_topology();
        let states = topology.object("states").unwrap();
        let first = mesh_filtered(&topology, states, |a, b| a != b);
        let second = mesh_filtered(&topology, states, |a, b| a != b);
        assert_eq!(first, second);
    }
}
