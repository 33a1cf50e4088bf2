//! Sparse octree partitioning a cube of space into transitable and intransitable leaves.

mod build;
mod connect;
mod debug;
mod error;
mod locate;
mod navigator;
mod serialize;
mod settings;
mod shared;
mod store;

use std::sync::Arc;

pub use build::*;
pub use connect::{link_count, Connections};
pub use error::*;
pub use navigator::*;
pub use serialize::{FORMAT_VERSION, MAGIC};
pub use settings::*;
pub use shared::*;
pub use store::*;

use parking_lot::RwLock;

use crate::{
    spatial::{Aabc, ObstacleQuery},
    OctantCode, WorldPoint,
};

/// An octree over a fixed cube of space, together with the neighbor graph between its leaves.
///
/// The tree is (re)built by [baking](Octree::bake) it against an [ObstacleQuery]. Every change
/// to the stored octants or their connections bumps [`generation`](Octree::generation), so
/// anything holding on to results computed from an older tree can tell they are stale.
#[derive(Debug)]
pub struct Octree {
    settings: OctreeSettings,
    store: OctantStore,
    /// Allocation kept between bakes, so a bake can be built aside and then swapped in.
    spare: OctantStore,
    connections: Connections,
    generation: u64,
    nearest_cache: RwLock<[Option<Arc<locate::NearestIndex>>; 2]>,
}

impl Octree {
    /// Construct an unbaked tree: a single transitable root leaf with no connections.
    pub fn new(settings: OctreeSettings) -> Result<Self, Error> {
        settings.validate()?;
        Ok(Self {
            store: OctantStore::new(settings.center),
            settings,
            spare: OctantStore::default(),
            connections: Connections::new(),
            generation: 0,
            nearest_cache: Default::default(),
        })
    }

    #[inline]
    pub fn settings(&self) -> &OctreeSettings {
        &self.settings
    }

    /// Counter bumped by every successful bake, connect or load.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn store(&self) -> &OctantStore {
        &self.store
    }

    /// Number of stored octants, branches included.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Always `false`; the root is always stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn octant(&self, code: OctantCode) -> Option<&OctantData> {
        self.store.get(code)
    }

    /// Stored octants in pre-order.
    pub fn iter(&self) -> Iter<'_> {
        self.store.iter()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &OctantData> + '_ {
        self.store.iter().filter(|o| o.is_leaf())
    }

    /// The neighbors of `code`; empty if it is not a connected leaf.
    pub fn neighbors(&self, code: OctantCode) -> &[OctantCode] {
        self.connections.get(&code).map(Vec::as_slice).unwrap_or_default()
    }

    #[inline]
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// The cube covered by `code`, whether or not it is stored.
    pub fn cube_of(&self, code: OctantCode) -> Aabc {
        self.settings.root_cube().descend(code)
    }

    /// The center of the stored octant at `code`.
    pub fn center_of(&self, code: OctantCode) -> Option<WorldPoint> {
        self.store.get(code).map(|o| o.center)
    }

    /// Rebuild the tree against `query`, then reconnect it.
    ///
    /// The new tree is built aside, starting from the current one, and only replaces it once
    /// subdivision finished; if any obstacle query fails, the tree is left exactly as it was.
    #[tracing::instrument(skip_all, fields(size = self.settings.size, max_depth = self.settings.max_depth))]
    pub fn bake<Q: ObstacleQuery + ?Sized>(&mut self, query: &Q) -> Result<BakeStats, Error> {
        let mut scratch = std::mem::take(&mut self.spare);
        scratch.clone_from(&self.store);
        let res = Builder::new(&self.settings, query).run(&mut scratch);
        match res {
            Ok(mut stats) => {
                std::mem::swap(&mut self.store, &mut scratch);
                self.spare = scratch;
                stats.connections = self.connect();
                tracing::debug!(octants = self.store.len(), ?stats, "baked octree");
                Ok(stats)
            }
            Err(e) => {
                self.spare = scratch;
                tracing::warn!(error = %e, "bake aborted; previous tree kept");
                Err(e)
            }
        }
    }

    /// Recompute the neighbor graph with the configured
    /// [connection type](OctreeSettings::connection), returning the number of links.
    #[tracing::instrument(level = "debug", skip_all, fields(connection = ?self.settings.connection))]
    pub fn connect(&mut self) -> usize {
        self.connections = connect::connect(&self.store, &self.settings);
        self.touch();
        let links = link_count(&self.connections);
        tracing::debug!(nodes = self.connections.len(), links, "connected octree");
        links
    }

    /// Discard every octant and connection, leaving a single transitable root leaf.
    pub fn clear(&mut self) {
        self.store.reset(self.settings.center);
        self.connections.clear();
        self.touch();
    }

    /// Note that the tree changed.
    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        *self.nearest_cache.get_mut() = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::{
        spatial::{Aabb, BoxField, QueryError, QueryRegion},
        Octant,
    };

    fn settings() -> OctreeSettings {
        OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 3)
    }

    #[test]
    fn rejects_bad_settings() {
        let bad = OctreeSettings {
            max_depth: 12,
            ..settings()
        };
        assert_eq!(Octree::new(bad).unwrap_err(), Error::DepthTooLarge(12));
    }

    #[test]
    fn bake_bumps_generation() {
        let mut tree = Octree::new(settings()).unwrap();
        assert_eq!(tree.generation(), 0);
        let stats = tree.bake(&BoxField::new()).unwrap();
        assert_eq!(tree.generation(), 1);
        assert_eq!(stats.leaves(), 1);
        assert_eq!(stats.connections, 0);
        assert!(tree.neighbors(OctantCode::ROOT).is_empty());
    }

    #[test]
    fn failed_bake_keeps_tree() {
        let mut tree = Octree::new(settings()).unwrap();
        let field = BoxField::new().with(Aabb::new(point![0.1, 0.1, 0.1], point![0.9, 0.9, 0.9]));
        tree.bake(&field).unwrap();
        let before: Vec<_> = tree.iter().copied().collect();
        let links = tree.connections().clone();
        let generation = tree.generation();

        let flaky = |r: &QueryRegion| {
            if r.half_extent < 1.0 {
                Err(QueryError::new("lost"))
            } else {
                Ok(true)
            }
        };
        assert!(matches!(tree.bake(&flaky), Err(Error::QueryFailed { .. })));
        let after: Vec<_> = tree.iter().copied().collect();
        assert_eq!(before, after);
        assert_eq!(&links, tree.connections());
        assert_eq!(tree.generation(), generation);
    }

    #[test]
    fn cubes_and_centers_agree() {
        let mut tree = Octree::new(settings()).unwrap();
        let field = BoxField::new().with(Aabb::new(point![0.1, 0.1, 0.1], point![0.9, 0.9, 0.9]));
        tree.bake(&field).unwrap();
        for octant in tree.iter() {
            assert_eq!(tree.cube_of(octant.code).center, octant.center);
        }
        let code = OctantCode::ROOT.child(Octant(7)).child(Octant(0));
        assert_eq!(tree.cube_of(code).size(), 2.0);
        assert_eq!(tree.center_of(code), Some(point![1.0, 1.0, 1.0]));
    }

    #[test]
    fn clear_resets() {
        let mut tree = Octree::new(settings()).unwrap();
        let field = BoxField::new().with(Aabb::new(point![0.1, 0.1, 0.1], point![0.9, 0.9, 0.9]));
        tree.bake(&field).unwrap();
        tree.clear();
        assert_eq!(tree.len(), 1);
        assert!(tree.connections().is_empty());
        assert_eq!(tree.generation(), 2);
    }
}
