use num_traits::Zero;

use crate::Graph;

/// What a [Search](crate::Search) is looking for.
pub trait Goal<G: Graph> {
    /// Resolve the goal against `graph` before searching. Returns `false` if no node could
    /// ever satisfy it, which ends the search without a path.
    fn prepare(&mut self, graph: &G) -> bool;

    fn reached(&self, graph: &G, node: &G::Node) -> bool;

    /// Estimated remaining cost from `node`; zero turns A* into Dijkstra.
    fn estimate(&self, _graph: &G, _node: &G::Node) -> G::Cost {
        G::Cost::zero()
    }

    /// The coordinate a path ending at `reached` should finish on.
    fn endpoint(&self, graph: &G, reached: &G::Node) -> G::Coord {
        graph.position(reached)
    }
}

/// Reach the node closest to a coordinate, and end the path exactly on that coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Target<P, N> {
    coord: P,
    node: Option<N>,
}

impl<P, N> Target<P, N> {
    pub fn new(coord: P) -> Self {
        Self { coord, node: None }
    }

    /// The node `coord` resolved to, once prepared.
    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }
}

impl<G: Graph> Goal<G> for Target<G::Coord, G::Node> {
    fn prepare(&mut self, graph: &G) -> bool {
        self.node = graph.closest_node(&self.coord);
        self.node.is_some()
    }

    fn reached(&self, _: &G, node: &G::Node) -> bool {
        self.node.as_ref() == Some(node)
    }

    fn estimate(&self, graph: &G, node: &G::Node) -> G::Cost {
        match &self.node {
            Some(target) => graph.heuristic(node, target),
            None => G::Cost::zero(),
        }
    }

    fn endpoint(&self, _: &G, _: &G::Node) -> G::Coord {
        self.coord
    }
}

/// Reach one specific node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reach<N>(pub N);

impl<G: Graph> Goal<G> for Reach<G::Node> {
    fn prepare(&mut self, _: &G) -> bool {
        true
    }

    fn reached(&self, _: &G, node: &G::Node) -> bool {
        *node == self.0
    }

    fn estimate(&self, graph: &G, node: &G::Node) -> G::Cost {
        graph.heuristic(node, &self.0)
    }
}

/// Reach any node matching a predicate. Without a target to aim for, this always searches
/// as Dijkstra would.
#[derive(Debug, Clone, Copy)]
pub struct Matching<F>(pub F);

impl<G, F> Goal<G> for Matching<F>
where
    G: Graph,
    F: Fn(&G::Node) -> bool,
{
    fn prepare(&mut self, _: &G) -> bool {
        true
    }

    fn reached(&self, _: &G, node: &G::Node) -> bool {
        (self.0)(node)
    }
}
