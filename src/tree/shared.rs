use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::spatial::ObstacleQuery;

use super::{BakeStats, Error, Octree};

/// An [Octree] shared between searching threads and whatever rebakes it.
///
/// Searches hold a read guard for as long as they touch the tree; a rebake takes the write
/// guard, so it can never run while a search is reading. Time-sliced searches release their
/// guard between slices and notice a rebake through [`Octree::generation`] when they resume.
#[derive(Debug, Clone)]
pub struct SharedOctree(Arc<RwLock<Octree>>);

impl From<Octree> for SharedOctree {
    fn from(tree: Octree) -> Self {
        Self::new(tree)
    }
}

impl SharedOctree {
    pub fn new(tree: Octree) -> Self {
        Self(Arc::new(RwLock::new(tree)))
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Octree> {
        self.0.read()
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Octree> {
        self.0.write()
    }

    /// Bake the tree again, waiting for every reader to finish first.
    pub fn rebake<Q: ObstacleQuery + ?Sized>(&self, query: &Q) -> Result<BakeStats, Error> {
        self.0.write().bake(query)
    }

    pub fn generation(&self) -> u64 {
        self.0.read().generation()
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::{
        spatial::{Aabb, BoxField},
        OctreeSettings,
    };

    #[test]
    fn rebake_waits_for_readers() {
        let shared =
            SharedOctree::new(Octree::new(OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 2)).unwrap());
        let field = BoxField::new().with(Aabb::new(point![0.1, 0.1, 0.1], point![0.9, 0.9, 0.9]));

        let guard = shared.read();
        let writer = {
            let shared = shared.clone();
            let field = field.clone();
            std::thread::spawn(move || shared.rebake(&field).map(|s| s.branches))
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        // the writer is still blocked on our guard
        assert_eq!(guard.generation(), 0);
        drop(guard);

        assert_eq!(writer.join().unwrap(), Ok(2));
        assert_eq!(shared.generation(), 1);
    }
}
