use std::collections::HashMap;

use nalgebra::Vector3;

use crate::{Octant, OctantCode};

use super::{OctantData, OctantStore, OctreeSettings};

/// Neighbor lists keyed by leaf code, each in pre-order of the neighbors. Leaves without
/// neighbors have no entry.
pub type Connections = HashMap<OctantCode, Vec<OctantCode>>;

/// Closed box of an octant on the integer lattice of the deepest configured level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LatticeBox {
    mins: Vector3<u32>,
    maxs: Vector3<u32>,
}

impl LatticeBox {
    fn of(code: OctantCode, max_depth: u8) -> Self {
        let span = 1u32 << (max_depth - code.depth());
        let mins = code.lattice() * span;
        Self {
            mins,
            maxs: mins.add_scalar(span),
        }
    }

    /// Whether the closed boxes share at least one lattice point (a face, edge, or corner).
    fn touches(&self, other: &Self) -> bool {
        (0..3).all(|i| self.mins[i] <= other.maxs[i] && other.mins[i] <= self.maxs[i])
    }
}

/// Link every pair of admitted leaves whose cubes share a face, an edge or a corner.
///
/// Adjacency is decided on the integer lattice of `max_depth`-sized cells, which is exact
/// for every octant the tree can hold, so it never depends on how world coordinates were
/// rounded.
pub(super) fn connect(store: &OctantStore, settings: &OctreeSettings) -> Connections {
    let admitted = |o: &OctantData| o.is_leaf() && settings.connection.admits(o.flags);
    let mut res = Connections::new();
    for leaf in store.iter().filter(|o| admitted(o)) {
        let bounds = LatticeBox::of(leaf.code, settings.max_depth);
        let mut found = Vec::new();
        let mut stack = vec![OctantCode::ROOT];
        while let Some(code) = stack.pop() {
            let Some(octant) = store.get(code) else {
                continue;
            };
            if !LatticeBox::of(code, settings.max_depth).touches(&bounds) {
                continue;
            }
            if octant.is_leaf() {
                if code != leaf.code && admitted(octant) {
                    found.push(code);
                }
            } else if store.has_children(code) {
                stack.extend(Octant::all().rev().map(|oct| code.child(oct)));
            }
        }
        if !found.is_empty() {
            res.insert(leaf.code, found);
        }
    }
    res
}

/// Number of undirected links in `connections`.
pub fn link_count(connections: &Connections) -> usize {
    connections.values().map(Vec::len).sum::<usize>() / 2
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::{
        spatial::{Aabb, BoxField},
        tree::{build::Builder, ConnectionType, OctantFlags},
    };

    fn baked(settings: &OctreeSettings, field: &BoxField) -> OctantStore {
        let mut store = OctantStore::new(settings.center);
        Builder::new(settings, field).run(&mut store).unwrap();
        store
    }

    #[test]
    fn lattice_boxes() {
        let a = LatticeBox::of(OctantCode::ROOT.child(Octant(0)), 2);
        assert_eq!(a.mins, Vector3::new(0, 0, 0));
        assert_eq!(a.maxs, Vector3::new(2, 2, 2));
        let b = LatticeBox::of(OctantCode::ROOT.child(Octant(7)).child(Octant(7)), 2);
        assert_eq!(b.mins, Vector3::new(3, 3, 3));
        assert!(!a.touches(&b));
        let c = LatticeBox::of(OctantCode::ROOT.child(Octant(7)).child(Octant(0)), 2);
        assert!(a.touches(&c));
    }

    #[test]
    fn uniform_split_is_fully_connected() {
        // eight equal children all share the center point
        let s = OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 1);
        let mut store = OctantStore::new(s.center);
        store.allocate_block(OctantCode::ROOT).unwrap();
        store.get_mut(OctantCode::ROOT).unwrap().flags = OctantFlags::empty();
        for oct in Octant::all() {
            store
                .set(OctantData::new(
                    OctantCode::ROOT.child(oct),
                    point![0.0, 0.0, 0.0],
                    OctantFlags::LEAF,
                ))
                .unwrap();
        }
        let links = connect(&store, &s);
        assert_eq!(links.len(), 8);
        assert!(links.values().all(|n| n.len() == 7));
        assert_eq!(link_count(&links), 28);
    }

    #[test]
    fn blocked_cells_are_filtered() {
        let s = OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 3);
        let field = BoxField::new().with(Aabb::new(point![0.1, 0.1, 0.1], point![0.9, 0.9, 0.9]));
        let store = baked(&s, &field);
        let blocked = store.iter().find(|o| !o.is_transitable()).unwrap().code;

        let links = connect(&store, &s);
        assert!(!links.contains_key(&blocked));
        assert!(links.values().all(|n| !n.contains(&blocked)));

        let both = connect(&store, &s.with_connection(ConnectionType::BOTH));
        // seven small siblings plus the seven large children of the root around the origin
        assert_eq!(both[&blocked].len(), 14);

        let only_blocked = connect(&store, &s.with_connection(ConnectionType::INTRANSITABLE));
        assert!(only_blocked.is_empty());
    }

    #[test]
    fn mixed_sizes_touch() {
        let s = OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 3);
        let field = BoxField::new().with(Aabb::new(point![0.1, 0.1, 0.1], point![0.9, 0.9, 0.9]));
        let store = baked(&s, &field);
        let links = connect(&store, &s);
        // the large -x+y+z child of the root shares a face with a small cell past the origin
        let big = OctantCode::ROOT.child(Octant(3));
        let small = OctantCode::ROOT
            .child(Octant(7))
            .child(Octant(0))
            .child(Octant(1));
        assert!(links[&big].contains(&small));
        assert!(links[&small].contains(&big));
    }
}
