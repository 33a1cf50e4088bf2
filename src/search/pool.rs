use std::{
    borrow::{Borrow, BorrowMut},
    fmt::Debug,
    hash::Hash,
    ops::{Deref, DerefMut},
};

use parking_lot::Mutex;

use crate::{Cost, Graph};

use super::{PathResult, Search, SearchError, SearchMode, SearchState, Target, Watchdog};

/// Reusable [SearchState]s, so back-to-back searches do not reallocate their working memory.
///
/// States are handed out by [`rent`](SearchPool::rent) and come back, reset, when the
/// [Pooled] guard drops. A state is only ever owned by one search at a time.
#[derive(Debug)]
pub struct SearchPool<N, K> {
    free: Mutex<Vec<SearchState<N, K>>>,
}

impl<N, K> Default for SearchPool<N, K> {
    fn default() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }
}

impl<N, K> SearchPool<N, K>
where
    N: Copy + Eq + Hash + Debug,
    K: Cost,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a clean state out of the pool, allocating one if none is free.
    pub fn rent(&self) -> Pooled<'_, N, K> {
        let state = self.free.lock().pop().unwrap_or_default();
        debug_assert!(state.is_clean(), "pooled search state was not reset");
        Pooled {
            pool: self,
            state: Some(state),
        }
    }

    /// Number of states waiting to be rented.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// [find_path](super::find_path), with working memory from this pool.
    pub fn find_path<G, W>(
        &self,
        graph: &G,
        from: G::Coord,
        to: G::Coord,
        mode: SearchMode,
        watchdog: W,
    ) -> Result<PathResult<G::Coord, G::Cost>, SearchError>
    where
        G: Graph<Node = N, Cost = K>,
        W: Watchdog,
    {
        let mut search = Search::with_state(self.rent(), from, Target::new(to), mode);
        search.run(graph, watchdog)?;
        search.finalize(graph)
    }
}

/// A [SearchState] rented from a [SearchPool]; returned to it, reset, on drop.
#[derive(Debug)]
pub struct Pooled<'p, N, K>
where
    N: Copy + Eq + Hash + Debug,
    K: Cost,
{
    pool: &'p SearchPool<N, K>,
    state: Option<SearchState<N, K>>,
}

impl<N, K> Drop for Pooled<'_, N, K>
where
    N: Copy + Eq + Hash + Debug,
    K: Cost,
{
    fn drop(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.reset();
            self.pool.free.lock().push(state);
        }
    }
}

impl<N, K> Deref for Pooled<'_, N, K>
where
    N: Copy + Eq + Hash + Debug,
    K: Cost,
{
    type Target = SearchState<N, K>;

    fn deref(&self) -> &Self::Target {
        self.state.as_ref().unwrap_or_else(|| unreachable!("state taken before drop"))
    }
}

impl<N, K> DerefMut for Pooled<'_, N, K>
where
    N: Copy + Eq + Hash + Debug,
    K: Cost,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state.as_mut().unwrap_or_else(|| unreachable!("state taken before drop"))
    }
}

impl<N, K> Borrow<SearchState<N, K>> for Pooled<'_, N, K>
where
    N: Copy + Eq + Hash + Debug,
    K: Cost,
{
    fn borrow(&self) -> &SearchState<N, K> {
        self
    }
}

impl<N, K> BorrowMut<SearchState<N, K>> for Pooled<'_, N, K>
where
    N: Copy + Eq + Hash + Debug,
    K: Cost,
{
    fn borrow_mut(&mut self) -> &mut SearchState<N, K> {
        self
    }
}
