//! The capabilities a navigable structure exposes to [searches](crate::Search).

use std::{fmt::Debug, hash::Hash, ops::Add};

use num_traits::Zero;

/// Trait alias for the cost type of a [Graph].
pub trait Cost: Copy + PartialOrd + Zero + Add<Output = Self> + Debug {}
impl<T> Cost for T where T: Copy + PartialOrd + Zero + Add<Output = Self> + Debug {}

/// A graph that can be searched for paths.
///
/// Nodes are small handles; `Coord` is whatever space they live in. Costs must be
/// non-negative, and [`heuristic`](Graph::heuristic) must never overestimate
/// [`cost`](Graph::cost) along any path for A* searches to stay optimal.
pub trait Graph {
    type Node: Copy + Eq + Hash + Debug;
    type Coord: Copy + Debug;
    type Cost: Cost;

    /// The node that best represents `coord`, if any node can.
    fn closest_node(&self, coord: &Self::Coord) -> Option<Self::Node>;

    fn position(&self, node: &Self::Node) -> Self::Coord;

    /// Nodes directly reachable from `node`. The order must be deterministic.
    fn neighbors(&self, node: &Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Cost of moving directly from `a` to `b`.
    fn cost(&self, a: &Self::Node, b: &Self::Node) -> Self::Cost;

    /// Estimated cost of getting from `a` to `b`.
    fn heuristic(&self, a: &Self::Node, b: &Self::Node) -> Self::Cost {
        self.cost(a, b)
    }

    /// Whether [`line_of_sight`](Graph::line_of_sight) answers meaningfully. Graphs without
    /// sight get neither any-angle shortcuts nor path smoothing.
    fn supports_line_of_sight(&self) -> bool {
        false
    }

    /// Whether the straight segment between `a` and `b` is unobstructed.
    fn line_of_sight(&self, _a: &Self::Coord, _b: &Self::Coord) -> bool {
        false
    }

    /// Revision of the graph's structure; searches resumed across a change of generation
    /// are rejected instead of producing a stale path.
    fn generation(&self) -> u64 {
        0
    }
}
