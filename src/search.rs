//! Resumable best-first search (Dijkstra, A*, and any-angle Theta*) over any [Graph].

mod error;
mod goal;
mod path;
mod pool;
mod state;
mod watchdog;

use std::{
    borrow::BorrowMut,
    fmt::Debug,
    hash::Hash,
    marker::PhantomData,
};

pub use error::*;
pub use goal::*;
pub use path::{Path, PathResult};
pub use pool::*;
pub use state::SearchState;
pub use watchdog::*;

use crate::{Cost, Graph};

/// How a [Search] orders and links nodes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchMode {
    /// Expand by cost so far alone.
    Dijkstra,
    /// Expand by cost so far plus the goal's estimate.
    #[default]
    AStar,
    /// A*, but a node may link straight to its predecessor's predecessor when the graph has
    /// line of sight between them, producing any-angle paths.
    Theta,
}

/// Where a [Search] stands after [`run`](Search::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Found,
    NotFound,
    /// Suspended by the watchdog; running again continues where the search stopped.
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
enum Phase<N> {
    Ready,
    Dequeue,
    /// Relaxing `state.frontier[next..]`, the neighbors of `node`.
    Expanding {
        node: N,
        next: usize,
    },
    Done {
        status: Status,
    },
}

/// One path request, run to completion across as many [`run`](Search::run) calls as its
/// watchdogs allow.
///
/// The search does not hold on to the graph between calls, so a graph behind a lock (see
/// [SharedOctree](crate::SharedOctree)) only needs to be locked while the search runs. If the
/// graph's [generation](Graph::generation) changes in between, the search fails with
/// [`SearchError::StaleGraph`].
///
/// `S` is the working state; pass a [pooled](SearchPool::rent) one to avoid allocating.
#[derive(Debug)]
pub struct Search<N, P, K, Q, S = SearchState<N, K>> {
    state: S,
    goal: Q,
    mode: SearchMode,
    from: P,
    start: Option<N>,
    reached: Option<N>,
    phase: Phase<N>,
    generation: u64,
    _cost: PhantomData<K>,
}

impl<N, P, K, Q> Search<N, P, K, Q>
where
    N: Copy + Eq + Hash + Debug,
    P: Copy + Debug,
    K: Cost,
{
    pub fn new(from: P, goal: Q, mode: SearchMode) -> Self {
        Self::with_state(SearchState::default(), from, goal, mode)
    }
}

impl<N, P, K, Q, S> Search<N, P, K, Q, S>
where
    N: Copy + Eq + Hash + Debug,
    P: Copy + Debug,
    K: Cost,
    S: BorrowMut<SearchState<N, K>>,
{
    /// Construct a search using `state` as working memory. The state must be clean.
    pub fn with_state(state: S, from: P, goal: Q, mode: SearchMode) -> Self {
        debug_assert!(state.borrow().is_clean(), "search state reused without a reset");
        Self {
            state,
            goal,
            mode,
            from,
            start: None,
            reached: None,
            phase: Phase::Ready,
            generation: 0,
            _cost: PhantomData,
        }
    }

    #[inline]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    #[inline]
    pub fn goal(&self) -> &Q {
        &self.goal
    }

    #[inline]
    pub fn state(&self) -> &SearchState<N, K> {
        self.state.borrow()
    }

    /// The status the search finished with, if it has.
    pub fn status(&self) -> Option<Status> {
        match self.phase {
            Phase::Done { status } => Some(status),
            _ => None,
        }
    }

    fn finish(&mut self, status: Status) -> Status {
        self.phase = Phase::Done { status };
        tracing::debug!(
            ?status,
            expanded = self.state.borrow().expanded(),
            "search finished"
        );
        status
    }

    fn check_generation<G: Graph>(&self, graph: &G) -> Result<(), SearchError> {
        let found = graph.generation();
        if found != self.generation {
            tracing::warn!(expected = self.generation, found, "graph changed under search");
            return Err(SearchError::StaleGraph {
                expected: self.generation,
                found,
            });
        }
        Ok(())
    }

    /// Search until the goal is reached, the graph is exhausted, or `watchdog` says stop.
    ///
    /// Running a finished search returns its final status again.
    #[tracing::instrument(level = "debug", skip_all, fields(mode = ?self.mode))]
    pub fn run<G, W>(&mut self, graph: &G, mut watchdog: W) -> Result<Status, SearchError>
    where
        G: Graph<Node = N, Coord = P, Cost = K>,
        Q: Goal<G>,
        W: Watchdog,
    {
        match self.phase {
            Phase::Done { status } => return Ok(status),
            Phase::Ready => {
                self.generation = graph.generation();
                if let Some(status) = self.prepare(graph) {
                    return Ok(self.finish(status));
                }
            }
            Phase::Dequeue | Phase::Expanding { .. } => self.check_generation(graph)?,
        }

        loop {
            match self.phase {
                Phase::Ready | Phase::Done { .. } => unreachable!("search stepped outside run"),
                Phase::Dequeue => {
                    if !watchdog.tick() {
                        return Ok(Status::TimedOut);
                    }
                    let state = self.state.borrow_mut();
                    let Some(entry) = state.open.pop() else {
                        return Ok(self.finish(Status::NotFound));
                    };
                    let node = entry.node;
                    if !state.visited.insert(node) {
                        continue;
                    }
                    if self.goal.reached(graph, &node) {
                        self.reached = Some(node);
                        return Ok(self.finish(Status::Found));
                    }
                    state.frontier.clear();
                    state.frontier.extend(graph.neighbors(&node));
                    self.phase = Phase::Expanding { node, next: 0 };
                }
                Phase::Expanding { node, next } => {
                    let Some(&neighbor) = self.state.borrow().frontier.get(next) else {
                        self.phase = Phase::Dequeue;
                        continue;
                    };
                    self.phase = Phase::Expanding {
                        node,
                        next: next + 1,
                    };
                    self.relax(graph, node, neighbor);
                    if !watchdog.tick() {
                        return Ok(Status::TimedOut);
                    }
                }
            }
        }
    }

    /// Resolve the endpoints and seed the open set. Returns a status if the search is
    /// already over.
    fn prepare<G>(&mut self, graph: &G) -> Option<Status>
    where
        G: Graph<Node = N, Coord = P, Cost = K>,
        Q: Goal<G>,
    {
        let Some(start) = graph.closest_node(&self.from) else {
            tracing::debug!(from = ?self.from, "no node near the start");
            return Some(Status::NotFound);
        };
        if !self.goal.prepare(graph) {
            tracing::debug!("goal cannot be resolved");
            return Some(Status::NotFound);
        }
        self.start = Some(start);
        if self.goal.reached(graph, &start) {
            self.reached = Some(start);
            return Some(Status::Found);
        }
        let state = self.state.borrow_mut();
        state.cost_so_far.insert(start, K::zero());
        state.push(start, K::zero());
        self.phase = Phase::Dequeue;
        None
    }

    fn edge_cost<G>(state: &mut SearchState<N, K>, graph: &G, a: N, b: N) -> K
    where
        G: Graph<Node = N, Cost = K>,
    {
        *state
            .edge_costs
            .entry((a, b))
            .or_insert_with(|| graph.cost(&a, &b))
    }

    fn sees<G>(state: &mut SearchState<N, K>, graph: &G, a: N, b: N) -> bool
    where
        G: Graph<Node = N, Cost = K>,
    {
        *state
            .sight
            .entry((a, b))
            .or_insert_with(|| graph.line_of_sight(&graph.position(&a), &graph.position(&b)))
    }

    fn relax<G>(&mut self, graph: &G, node: N, neighbor: N)
    where
        G: Graph<Node = N, Coord = P, Cost = K>,
        Q: Goal<G>,
    {
        let state = self.state.borrow_mut();
        if state.visited.contains(&neighbor) {
            return;
        }
        let mut pred = node;
        if self.mode == SearchMode::Theta && graph.supports_line_of_sight() {
            if let Some(parent) = state.came_from.get(&node).copied() {
                if Self::sees(state, graph, parent, neighbor) {
                    pred = parent;
                }
            }
        }
        let Some(base) = state.cost_so_far.get(&pred).copied() else {
            return;
        };
        let tentative = base + Self::edge_cost(state, graph, pred, neighbor);
        let improved = state
            .cost_so_far
            .get(&neighbor)
            .map_or(true, |&known| tentative < known);
        if !improved {
            return;
        }
        state.cost_so_far.insert(neighbor, tentative);
        state.came_from.insert(neighbor, pred);
        let priority = match self.mode {
            SearchMode::Dijkstra => tentative,
            SearchMode::AStar | SearchMode::Theta => {
                tentative + self.goal.estimate(graph, &neighbor)
            }
        };
        state.push(neighbor, priority);
    }

    /// End the search, producing its path.
    ///
    /// A search that is still suspended finalizes as [`PathResult::TimedOut`].
    ///
    /// # Panics
    ///
    /// * [`run`](Search::run) was never called
    pub fn finalize<G>(self, graph: &G) -> Result<PathResult<P, K>, SearchError>
    where
        G: Graph<Node = N, Coord = P, Cost = K>,
        Q: Goal<G>,
    {
        let status = match self.phase {
            Phase::Ready => panic!("finalized a search that never ran"),
            Phase::Dequeue | Phase::Expanding { .. } => return Ok(PathResult::TimedOut),
            Phase::Done { status } => status,
        };
        match (status, self.start, self.reached) {
            (Status::Found, Some(start), Some(reached)) => {
                self.check_generation(graph)?;
                let state = self.state.borrow();
                let trace = path::trace(|n| state.predecessor(n), start, reached);
                let end = self.goal.endpoint(graph, &reached);
                let cost = state.cost_of(&reached).unwrap_or_else(K::zero);
                Ok(PathResult::Found(Path {
                    waypoints: path::waypoints(graph, &trace, self.from, end),
                    cost,
                }))
            }
            (Status::Found, ..) => unreachable!("found search without endpoints"),
            (Status::NotFound, ..) => Ok(PathResult::NotFound),
            (Status::TimedOut, ..) => Ok(PathResult::TimedOut),
        }
    }
}

/// Find a path from `from` to the node closest to `to` in one go.
pub fn find_path<G, W>(
    graph: &G,
    from: G::Coord,
    to: G::Coord,
    mode: SearchMode,
    watchdog: W,
) -> Result<PathResult<G::Coord, G::Cost>, SearchError>
where
    G: Graph,
    W: Watchdog,
{
    let mut search = Search::new(from, Target::new(to), mode);
    search.run(graph, watchdog)?;
    search.finalize(graph)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// A small directed graph on a line, with optional shortcuts.
    #[derive(Debug, Default)]
    struct Line {
        edges: HashMap<u8, Vec<(u8, u32)>>,
        generation: u64,
    }

    impl Line {
        fn edge(mut self, a: u8, b: u8, cost: u32) -> Self {
            self.edges.entry(a).or_default().push((b, cost));
            self.edges.entry(b).or_default().push((a, cost));
            self
        }
    }

    impl Graph for Line {
        type Node = u8;
        type Coord = u8;
        type Cost = u32;

        fn closest_node(&self, coord: &u8) -> Option<u8> {
            self.edges.contains_key(coord).then_some(*coord)
        }

        fn position(&self, node: &u8) -> u8 {
            *node
        }

        fn neighbors(&self, node: &u8) -> impl Iterator<Item = u8> + '_ {
            self.edges
                .get(node)
                .into_iter()
                .flatten()
                .map(|(n, _)| *n)
        }

        fn cost(&self, a: &u8, b: &u8) -> u32 {
            self.edges[a]
                .iter()
                .find(|(n, _)| n == b)
                .map_or(u32::MAX / 4, |(_, c)| *c)
        }

        fn heuristic(&self, _: &u8, _: &u8) -> u32 {
            0
        }

        fn generation(&self) -> u64 {
            self.generation
        }
    }

    fn diamond() -> Line {
        Line::default()
            .edge(0, 1, 1)
            .edge(1, 3, 5)
            .edge(0, 2, 2)
            .edge(2, 3, 1)
            .edge(3, 4, 1)
    }

    #[test]
    fn cheapest_route() {
        let g = diamond();
        let res = find_path(&g, 0, 4, SearchMode::Dijkstra, Unbounded).unwrap();
        assert_eq!(
            res,
            PathResult::Found(Path {
                waypoints: vec![0, 2, 3, 4],
                cost: 4
            })
        );
    }

    #[test]
    fn trivial_and_missing() {
        let g = diamond();
        let same = find_path(&g, 3, 3, SearchMode::AStar, Unbounded).unwrap();
        assert_eq!(same.into_path().unwrap().waypoints, vec![3, 3]);
        let off = find_path(&g, 9, 3, SearchMode::AStar, Unbounded).unwrap();
        assert_eq!(off, PathResult::NotFound);
        let unreachable = find_path(&g.edge(7, 8, 1), 0, 8, SearchMode::AStar, Unbounded);
        assert_eq!(unreachable, Ok(PathResult::NotFound));
    }

    #[test]
    fn zero_budget_times_out() {
        let g = diamond();
        let mut search = Search::new(0, Target::new(4), SearchMode::AStar);
        assert_eq!(search.run(&g, StepBudget::new(0)), Ok(Status::TimedOut));
        assert_eq!(search.status(), None);
        assert_eq!(search.finalize(&g), Ok(PathResult::TimedOut));
    }

    #[test]
    fn resumes_without_losing_work() {
        let g = diamond();
        let mut search = Search::new(0, Target::new(4), SearchMode::AStar);
        let mut slices = 0;
        while search.run(&g, StepBudget::new(1)).unwrap() == Status::TimedOut {
            slices += 1;
            assert!(slices < 100);
        }
        assert!(slices > 1);
        let expected = find_path(&g, 0, 4, SearchMode::AStar, Unbounded).unwrap();
        assert_eq!(search.finalize(&g).unwrap(), expected);
    }

    #[test]
    fn stale_graph_is_rejected() {
        let mut g = diamond();
        let mut search = Search::new(0, Target::new(4), SearchMode::AStar);
        assert_eq!(search.run(&g, StepBudget::new(2)), Ok(Status::TimedOut));
        g.generation += 1;
        assert_eq!(
            search.run(&g, Unbounded),
            Err(SearchError::StaleGraph {
                expected: 0,
                found: 1
            })
        );
    }

    #[test]
    fn predicate_goal() {
        let g = diamond();
        let mut search = Search::new(0, Matching(|n: &u8| *n >= 3), SearchMode::Dijkstra);
        assert_eq!(search.run(&g, Unbounded), Ok(Status::Found));
        let path = search.finalize(&g).unwrap().into_path().unwrap();
        assert_eq!(path.waypoints, vec![0, 2, 3]);
        assert_eq!(path.cost, 3);
    }

    #[test]
    #[should_panic(expected = "never ran")]
    fn finalize_before_run_panics() {
        let g = diamond();
        let search: Search<u8, u8, u32, _> = Search::new(0, Target::new(4), SearchMode::AStar);
        let _ = search.finalize(&g);
    }
}
