use nalgebra::distance;

use crate::{
    spatial::{LineOfSight, NoSight},
    Graph, Real, WorldPoint,
};

use super::{ColumnGrid, ColumnNode};

/// A [Graph] view of a baked [ColumnGrid].
///
/// Nodes sit at the centers of their standing voxels; steps cost the distance between them.
#[derive(Debug)]
pub struct ColumnNavigator<'g, L = NoSight> {
    grid: &'g ColumnGrid,
    sight: Option<&'g L>,
}

impl<'g, L> Clone for ColumnNavigator<'g, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'g, L> Copy for ColumnNavigator<'g, L> {}

impl ColumnGrid {
    pub fn navigator(&self) -> ColumnNavigator<'_> {
        ColumnNavigator {
            grid: self,
            sight: None,
        }
    }
}

impl<'g, L> ColumnNavigator<'g, L> {
    /// Use `sight` for any-angle shortcuts and path smoothing.
    pub fn with_sight<S: LineOfSight>(self, sight: &'g S) -> ColumnNavigator<'g, S> {
        ColumnNavigator {
            grid: self.grid,
            sight: Some(sight),
        }
    }

    #[inline]
    pub fn grid(&self) -> &'g ColumnGrid {
        self.grid
    }
}

impl<'g, L: LineOfSight> Graph for ColumnNavigator<'g, L> {
    type Node = ColumnNode;
    type Coord = WorldPoint;
    type Cost = Real;

    fn closest_node(&self, coord: &WorldPoint) -> Option<ColumnNode> {
        self.grid.closest_node(coord)
    }

    fn position(&self, node: &ColumnNode) -> WorldPoint {
        self.grid.position(*node)
    }

    fn neighbors(&self, node: &ColumnNode) -> impl Iterator<Item = ColumnNode> + '_ {
        self.grid.neighbors(*node)
    }

    fn cost(&self, a: &ColumnNode, b: &ColumnNode) -> Real {
        distance(&self.position(a), &self.position(b))
    }

    fn supports_line_of_sight(&self) -> bool {
        self.sight.is_some()
    }

    fn line_of_sight(&self, a: &WorldPoint, b: &WorldPoint) -> bool {
        self.sight.is_some_and(|s| s.line_of_sight(a, b))
    }

    fn generation(&self) -> u64 {
        self.grid.generation()
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::{
        search::{find_path, Unbounded},
        spatial::{Aabb, BoxField},
        ColumnSettings, SearchMode,
    };

    #[test]
    fn walks_around_a_wall() {
        let settings = ColumnSettings::new(point![0.0, 0.0, 0.0], 1.0)
            .with_dimensions(5, 3, 5)
            .with_agent(0, 2);
        // a wall along z = 2 with a gap at x = 4
        let wall = BoxField::new().with(Aabb::new(point![0.0, 0.0, 2.0], point![4.0, 3.0, 3.0]));
        let mut grid = ColumnGrid::new(settings).unwrap();
        grid.bake(&wall).unwrap();
        assert_eq!(grid.len(), 21);

        let nav = grid.navigator();
        assert!(!nav.supports_line_of_sight());
        let (from, to) = (point![0.5, 0.5, 0.5], point![0.5, 0.5, 4.5]);
        let res = find_path(&nav, from, to, SearchMode::AStar, Unbounded).unwrap();
        assert!(res.is_found(), "{res:?}");
        let path = res.into_path().unwrap();
        assert_eq!(path.start(), Some(&from));
        assert_eq!(path.end(), Some(&to));
        // the route passes through the gap
        assert!(path.waypoints.iter().any(|p| p.x > 4.0 && p.z > 2.0 && p.z < 3.0));
        assert!(path.cost > 8.0);

        let sighted = nav.with_sight(&wall);
        let res = find_path(&sighted, from, to, SearchMode::Theta, Unbounded).unwrap();
        let smooth = res.into_path().unwrap();
        assert!(smooth.len() < path.len());
        assert!(smooth.cost <= path.cost);
    }
}
