use std::{collections::HashSet, hash::Hash};

use crate::Graph;

/// Waypoints from start to goal, with the cost the search found for them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path<P, K> {
    pub waypoints: Vec<P>,
    pub cost: K,
}

impl<P, K> Path<P, K> {
    #[inline]
    pub fn start(&self) -> Option<&P> {
        self.waypoints.first()
    }

    #[inline]
    pub fn end(&self) -> Option<&P> {
        self.waypoints.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Outcome of a finished [Search](crate::Search).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathResult<P, K> {
    Found(Path<P, K>),
    NotFound,
    /// The search was stopped by its watchdog. Partial progress is never exposed as a path.
    TimedOut,
}

impl<P, K> PathResult<P, K> {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn path(&self) -> Option<&Path<P, K>> {
        match self {
            Self::Found(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<Path<P, K>> {
        match self {
            Self::Found(p) => Some(p),
            _ => None,
        }
    }
}

/// Trace `goal` back to `start` through `came_from`, returning the nodes goal-first.
///
/// # Panics
///
/// * the trace revisits a node or runs out before reaching `start`; either means the search
///   recorded an inconsistent predecessor map
pub(super) fn trace<N>(came_from: impl Fn(&N) -> Option<N>, start: N, goal: N) -> Vec<N>
where
    N: Copy + Eq + Hash + std::fmt::Debug,
{
    let mut seen = HashSet::new();
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        assert!(seen.insert(current), "cycle in search predecessors at {current:?}");
        current = match came_from(&current) {
            Some(prev) => prev,
            None => panic!("search predecessors of {goal:?} end at {current:?}, not {start:?}"),
        };
        nodes.push(current);
    }
    nodes
}

/// Turn a goal-first node trace into start-to-goal waypoints.
///
/// The first and last waypoints are the exact requested coordinates. Without line of sight
/// they stand in for the positions of the first and last nodes. With it, every node position
/// is a candidate, and those visible from the last kept waypoint are dropped (string
/// pulling), so no kept segment crosses anything the graph cannot see through.
pub(super) fn waypoints<G: Graph>(
    graph: &G,
    trace: &[G::Node],
    start: G::Coord,
    end: G::Coord,
) -> Vec<G::Coord> {
    if trace.len() < 2 {
        return vec![start, end];
    }
    let sighted = graph.supports_line_of_sight();
    let inner = if sighted {
        trace
    } else {
        &trace[1..trace.len() - 1]
    };
    let mut points = Vec::with_capacity(inner.len() + 2);
    points.push(end);
    points.extend(inner.iter().map(|n| graph.position(n)));
    points.push(start);

    if !sighted {
        points.reverse();
        return points;
    }

    let mut out = vec![points[0]];
    let mut anchor = points[0];
    let mut prev = points[1];
    for &candidate in &points[2..] {
        if graph.line_of_sight(&anchor, &candidate) {
            prev = candidate;
        } else {
            out.push(prev);
            anchor = prev;
            prev = candidate;
        }
    }
    out.push(prev);
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn trace_walks_back() {
        let links = HashMap::from([(3, 2), (2, 1), (1, 0)]);
        assert_eq!(trace(|n| links.get(n).copied(), 0, 3), vec![3, 2, 1, 0]);
        assert_eq!(trace(|n| links.get(n).copied(), 3, 3), vec![3]);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn trace_rejects_cycles() {
        let links = HashMap::from([(3, 2), (2, 3)]);
        trace(|n| links.get(n).copied(), 0, 3);
    }

    /// Nodes on the x axis; sight is blocked across `x == 5`.
    struct Ruler {
        sighted: bool,
    }

    impl Graph for Ruler {
        type Node = u8;
        type Coord = (f32, f32);
        type Cost = f32;

        fn closest_node(&self, coord: &(f32, f32)) -> Option<u8> {
            Some(coord.0 as u8)
        }

        fn position(&self, node: &u8) -> (f32, f32) {
            (*node as f32, 0.0)
        }

        fn neighbors(&self, _: &u8) -> impl Iterator<Item = u8> + '_ {
            std::iter::empty()
        }

        fn cost(&self, a: &u8, b: &u8) -> f32 {
            (*a as f32 - *b as f32).abs()
        }

        fn supports_line_of_sight(&self) -> bool {
            self.sighted
        }

        fn line_of_sight(&self, a: &(f32, f32), b: &(f32, f32)) -> bool {
            (a.0 < 5.0) == (b.0 < 5.0) || (a.1 == 0.0 && b.1 == 0.0)
        }
    }

    #[test]
    fn string_pulling() {
        let nodes = [8, 6, 4, 2];
        let (start, end) = ((2.0, 1.0), (8.0, 1.0));

        let blind = waypoints(&Ruler { sighted: false }, &nodes, start, end);
        assert_eq!(blind, vec![start, (4.0, 0.0), (6.0, 0.0), end]);

        // the exact ends only see their own side; node centers see each other
        let sighted = waypoints(&Ruler { sighted: true }, &nodes, start, end);
        assert_eq!(sighted, vec![start, (2.0, 0.0), (6.0, 0.0), end]);

        assert_eq!(waypoints(&Ruler { sighted: true }, &[3], start, end), vec![start, end]);
    }

    #[test]
    fn result_accessors() {
        let found = PathResult::Found(Path {
            waypoints: vec![1, 2],
            cost: 1.0,
        });
        assert!(found.is_found());
        assert_eq!(found.path().and_then(Path::end), Some(&2));
        assert!(PathResult::<u8, f32>::TimedOut.into_path().is_none());
    }
}
