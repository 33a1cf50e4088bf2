use nalgebra::distance;

use crate::{
    spatial::{LineOfSight, NoSight},
    Graph, OctantCode, Real, WorldPoint,
};

use super::Octree;

/// A [Graph] view of a baked [Octree].
///
/// Nodes are the codes of connected leaves, positioned at their centers; moving between two
/// leaves costs the distance between those centers.
#[derive(Debug)]
pub struct OctreeNavigator<'t, L = NoSight> {
    tree: &'t Octree,
    sight: Option<&'t L>,
    require_ground: bool,
}

impl<'t, L> Clone for OctreeNavigator<'t, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'t, L> Copy for OctreeNavigator<'t, L> {}

impl Octree {
    /// Navigate this tree without line of sight: searches follow leaf centers exactly.
    pub fn navigator(&self) -> OctreeNavigator<'_> {
        OctreeNavigator {
            tree: self,
            sight: None,
            require_ground: false,
        }
    }
}

impl<'t, L> OctreeNavigator<'t, L> {
    /// Use `sight` for any-angle shortcuts and path smoothing.
    pub fn with_sight<S: LineOfSight>(self, sight: &'t S) -> OctreeNavigator<'t, S> {
        OctreeNavigator {
            tree: self.tree,
            sight: Some(sight),
            require_ground: self.require_ground,
        }
    }

    /// Only snap coordinates to leaves with ground below them.
    pub fn require_ground(mut self, require: bool) -> Self {
        self.require_ground = require;
        self
    }

    #[inline]
    pub fn tree(&self) -> &'t Octree {
        self.tree
    }
}

impl<'t, L: LineOfSight> Graph for OctreeNavigator<'t, L> {
    type Node = OctantCode;
    type Coord = WorldPoint;
    type Cost = Real;

    fn closest_node(&self, coord: &WorldPoint) -> Option<OctantCode> {
        self.tree.closest_node(coord, self.require_ground)
    }

    fn position(&self, node: &OctantCode) -> WorldPoint {
        // unstored codes still have a well-defined cube
        self.tree
            .center_of(*node)
            .unwrap_or_else(|| self.tree.cube_of(*node).center)
    }

    fn neighbors(&self, node: &OctantCode) -> impl Iterator<Item = OctantCode> + '_ {
        self.tree.neighbors(*node).iter().copied()
    }

    fn cost(&self, a: &OctantCode, b: &OctantCode) -> Real {
        distance(&self.position(a), &self.position(b))
    }

    fn supports_line_of_sight(&self) -> bool {
        self.sight.is_some()
    }

    fn line_of_sight(&self, a: &WorldPoint, b: &WorldPoint) -> bool {
        self.sight.is_some_and(|s| s.line_of_sight(a, b))
    }

    fn generation(&self) -> u64 {
        self.tree.generation()
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::{
        spatial::{Aabb, BoxField},
        Octant, OctreeSettings,
    };

    #[test]
    fn graph_view() {
        let mut tree = Octree::new(OctreeSettings::new(point![0.0, 0.0, 0.0], 4.0, 1)).unwrap();
        let field = BoxField::new().with(Aabb::new(point![0.5, 0.5, 0.5], point![1.5, 1.5, 1.5]));
        tree.bake(&field).unwrap();

        let nav = tree.navigator();
        assert!(!nav.supports_line_of_sight());
        let a = OctantCode::ROOT.child(Octant(0));
        let b = OctantCode::ROOT.child(Octant(4));
        assert_eq!(nav.position(&a), point![-1.0, -1.0, -1.0]);
        assert_eq!(nav.cost(&a, &b), 2.0);
        assert_eq!(nav.neighbors(&a).count(), 6);
        assert!(nav.neighbors(&a).all(|n| n != OctantCode::ROOT.child(Octant(7))));
        assert_eq!(nav.closest_node(&point![-1.5, -0.5, -1.0]), Some(a));

        let sighted = nav.with_sight(&field);
        assert!(sighted.supports_line_of_sight());
        assert!(!sighted.line_of_sight(&point![-1.0, -1.0, -1.0], &point![1.8, 1.8, 1.8]));
        assert!(sighted.line_of_sight(&point![-1.0, -1.0, -1.0], &point![1.0, -1.0, -1.0]));
        assert_eq!(sighted.generation(), tree.generation());
    }
}
