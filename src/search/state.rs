use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
    hash::Hash,
};

/// An open-set entry. Lower priority comes out first; among equal priorities, the entry
/// pushed first does.
#[derive(Debug, Clone, Copy)]
pub(super) struct Entry<N, K> {
    pub priority: K,
    pub seq: u64,
    pub node: N,
}

impl<N, K: PartialOrd> PartialEq for Entry<N, K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N, K: PartialOrd> Eq for Entry<N, K> {}

impl<N, K: PartialOrd> PartialOrd for Entry<N, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N, K: PartialOrd> Ord for Entry<N, K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed, since BinaryHeap is a max-heap
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Working memory of one search.
///
/// Kept separate from [Search](crate::Search) so it can be [pooled](crate::SearchPool) and
/// reused without reallocating. A state must be [reset](SearchState::reset) before it is
/// handed to another search.
#[derive(Debug, Clone)]
pub struct SearchState<N, K> {
    pub(super) open: BinaryHeap<Entry<N, K>>,
    pub(super) seq: u64,
    pub(super) visited: HashSet<N>,
    pub(super) cost_so_far: HashMap<N, K>,
    pub(super) came_from: HashMap<N, N>,
    /// Neighbors of the node being expanded.
    pub(super) frontier: Vec<N>,
    pub(super) edge_costs: HashMap<(N, N), K>,
    pub(super) sight: HashMap<(N, N), bool>,
}

impl<N, K: PartialOrd> Default for SearchState<N, K> {
    fn default() -> Self {
        Self {
            open: BinaryHeap::new(),
            seq: 0,
            visited: HashSet::new(),
            cost_so_far: HashMap::new(),
            came_from: HashMap::new(),
            frontier: Vec::new(),
            edge_costs: HashMap::new(),
            sight: HashMap::new(),
        }
    }
}

impl<N: Copy + Eq + Hash, K: Copy + PartialOrd> SearchState<N, K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, keeping allocations.
    pub fn reset(&mut self) {
        self.open.clear();
        self.seq = 0;
        self.visited.clear();
        self.cost_so_far.clear();
        self.came_from.clear();
        self.frontier.clear();
        self.edge_costs.clear();
        self.sight.clear();
    }

    /// Whether the state holds nothing from a previous search.
    pub fn is_clean(&self) -> bool {
        self.open.is_empty()
            && self.seq == 0
            && self.visited.is_empty()
            && self.cost_so_far.is_empty()
            && self.came_from.is_empty()
            && self.frontier.is_empty()
            && self.edge_costs.is_empty()
            && self.sight.is_empty()
    }

    /// Number of nodes taken off the open set and expanded so far.
    pub fn expanded(&self) -> usize {
        self.visited.len()
    }

    pub fn cost_of(&self, node: &N) -> Option<K> {
        self.cost_so_far.get(node).copied()
    }

    pub fn predecessor(&self, node: &N) -> Option<N> {
        self.came_from.get(node).copied()
    }

    pub(super) fn push(&mut self, node: N, priority: K) {
        self.open.push(Entry {
            priority,
            seq: self.seq,
            node,
        });
        self.seq += 1;
    }
}
