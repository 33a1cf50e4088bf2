use bitvec::vec::BitVec;
use nalgebra::point;

use crate::{OctantCode, WorldPoint};

use super::Error;

bitflags::bitflags! {
    /// Classification bits stored with every [OctantData].
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OctantFlags: u8 {
        const INTRANSITABLE = 0b001;
        const LEAF = 0b010;
        const HAS_GROUND = 0b100;
    }
}

/// A stored octant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctantData {
    pub code: OctantCode,
    pub center: WorldPoint,
    pub flags: OctantFlags,
}

impl OctantData {
    pub fn new(code: OctantCode, center: WorldPoint, flags: OctantFlags) -> Self {
        Self {
            code,
            center,
            flags,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.flags.contains(OctantFlags::LEAF)
    }

    #[inline]
    pub fn is_transitable(&self) -> bool {
        !self.flags.contains(OctantFlags::INTRANSITABLE)
    }

    #[inline]
    pub fn has_ground(&self) -> bool {
        self.flags.contains(OctantFlags::HAS_GROUND)
    }
}

const NO_BLOCK: u32 = 0;

#[derive(Debug, Clone, Copy)]
struct Slot {
    data: OctantData,
    /// Index of the first slot of this octant's child block, or [NO_BLOCK].
    children: u32,
}

impl Slot {
    fn vacant() -> Self {
        Self {
            data: OctantData::new(OctantCode::NONE, point![0.0, 0.0, 0.0], OctantFlags::empty()),
            children: NO_BLOCK,
        }
    }
}

/// Arena of octants addressed by [OctantCode].
///
/// Slot `0` always holds the root. Children are allocated in contiguous blocks of eight
/// (in [Octant](crate::Octant) order), and blocks freed by compaction are kept on a stack
/// for reuse, so repeated rebakes do not grow the arena.
///
/// # Invariants
///
/// * `occupied.len() == slots.len()`, and `slots.len() == 1 + 8k`
/// * a slot's `children` link is set ⟺ the block it names is allocated
/// * every block on `free` is fully vacant
#[derive(Debug)]
pub struct OctantStore {
    slots: Vec<Slot>,
    occupied: BitVec,
    free: Vec<u32>,
    count: usize,
}

impl Default for OctantStore {
    fn default() -> Self {
        Self::new(point![0.0, 0.0, 0.0])
    }
}

impl Clone for OctantStore {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            occupied: self.occupied.clone(),
            free: self.free.clone(),
            count: self.count,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.slots.clone_from(&source.slots);
        self.occupied.clone_from(&source.occupied);
        self.free.clone_from(&source.free);
        self.count = source.count;
    }
}

impl OctantStore {
    /// Construct a store holding only a transitable root leaf at `center`.
    pub fn new(center: WorldPoint) -> Self {
        let mut res = Self {
            slots: vec![Slot::vacant()],
            occupied: BitVec::repeat(false, 1),
            free: Vec::new(),
            count: 0,
        };
        res.reset(center);
        res
    }

    /// Discard every octant except a fresh transitable root leaf. Allocations are kept.
    pub fn reset(&mut self, center: WorldPoint) {
        self.slots.truncate(1);
        self.occupied.truncate(1);
        self.free.clear();
        self.slots[0] = Slot {
            data: OctantData::new(OctantCode::ROOT, center, OctantFlags::LEAF),
            children: NO_BLOCK,
        };
        self.occupied.set(0, true);
        self.count = 1;
    }

    /// Number of stored octants.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Always `false`; the root is always stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots held by the arena, stored or free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Resolve `code` to the index of the slot it would occupy, if its parent has a block.
    fn slot_index(&self, code: OctantCode) -> Option<usize> {
        if !code.is_valid() {
            return None;
        }
        let mut index = 0usize;
        for oct in code.path() {
            let block = self.slots[index].children;
            if block == NO_BLOCK {
                return None;
            }
            index = block as usize + oct.0 as usize;
        }
        Some(index)
    }

    fn occupied_index(&self, code: OctantCode) -> Option<usize> {
        self.slot_index(code).filter(|&i| self.occupied[i])
    }

    pub fn get(&self, code: OctantCode) -> Option<&OctantData> {
        self.occupied_index(code).map(|i| &self.slots[i].data)
    }

    pub fn get_mut(&mut self, code: OctantCode) -> Option<&mut OctantData> {
        self.occupied_index(code).map(|i| &mut self.slots[i].data)
    }

    #[inline]
    pub fn contains(&self, code: OctantCode) -> bool {
        self.occupied_index(code).is_some()
    }

    /// Whether `code` is stored with an allocated child block.
    pub fn has_children(&self, code: OctantCode) -> bool {
        self.occupied_index(code)
            .is_some_and(|i| self.slots[i].children != NO_BLOCK)
    }

    /// Insert or replace an octant, returning what was stored at its code before.
    ///
    /// * [`InvalidCode`](Error::InvalidCode) if `data.code` is malformed or its parent has no
    ///   child block to hold it.
    pub fn set(&mut self, data: OctantData) -> Result<Option<OctantData>, Error> {
        let index = self
            .slot_index(data.code)
            .ok_or(Error::InvalidCode(data.code))?;
        let slot = &mut self.slots[index];
        let prev = std::mem::replace(&mut slot.data, data);
        Ok(if self.occupied.replace(index, true) {
            Some(prev)
        } else {
            self.count += 1;
            None
        })
    }

    /// Give `parent` a block of eight vacant child slots, returning the code of its first
    /// child. An existing block is returned unchanged.
    ///
    /// * [`InvalidCode`](Error::InvalidCode) if `parent` is not stored or is already at
    ///   [`OctantCode::MAX_DEPTH`].
    pub fn allocate_block(&mut self, parent: OctantCode) -> Result<OctantCode, Error> {
        let index = self
            .occupied_index(parent)
            .filter(|_| parent.depth() < OctantCode::MAX_DEPTH)
            .ok_or(Error::InvalidCode(parent))?;
        if self.slots[index].children == NO_BLOCK {
            let block = match self.free.pop() {
                Some(block) => block,
                None => {
                    let block = self.slots.len() as u32;
                    self.slots.extend_from_slice(&[Slot::vacant(); 8]);
                    self.occupied.resize(self.slots.len(), false);
                    block
                }
            };
            self.slots[index].children = block;
        }
        Ok(parent.first_child())
    }

    /// Remove the eight children starting at `first_child`, along with everything below
    /// them, returning their blocks to the free list.
    ///
    /// * [`InvalidCode`](Error::InvalidCode) if `first_child` is not the first child of a
    ///   stored octant.
    pub fn remove_block_of_eight(&mut self, first_child: OctantCode) -> Result<(), Error> {
        if first_child.is_none() || first_child.is_root() || first_child.octant().0 != 0 {
            return Err(Error::InvalidCode(first_child));
        }
        let parent = self
            .occupied_index(first_child.parent())
            .ok_or(Error::InvalidCode(first_child))?;
        let block = std::mem::replace(&mut self.slots[parent].children, NO_BLOCK);
        if block == NO_BLOCK {
            return Err(Error::InvalidCode(first_child));
        }
        let mut to_free = vec![block];
        while let Some(block) = to_free.pop() {
            let start = block as usize;
            for index in start..start + 8 {
                let slot = std::mem::replace(&mut self.slots[index], Slot::vacant());
                if self.occupied.replace(index, false) {
                    self.count -= 1;
                }
                if slot.children != NO_BLOCK {
                    to_free.push(slot.children);
                }
            }
            self.free.push(block);
        }
        Ok(())
    }

    /// Iterate over stored octants in pre-order: each octant precedes its children, and
    /// siblings follow [Octant](crate::Octant) order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            stack: vec![0],
        }
    }
}

/// A pre-order iterator over the octants of an [OctantStore].
#[derive(Debug, Clone)]
pub struct Iter<'s> {
    store: &'s OctantStore,
    stack: Vec<usize>,
}

impl<'s> Iterator for Iter<'s> {
    type Item = &'s OctantData;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.stack.pop() {
            if !self.store.occupied[index] {
                continue;
            }
            let slot = &self.store.slots[index];
            if slot.children != NO_BLOCK {
                // pushed in reverse so the first child is visited next
                let start = slot.children as usize;
                self.stack.extend((start..start + 8).rev());
            }
            return Some(&slot.data);
        }
        None
    }
}

impl std::iter::FusedIterator for Iter<'_> {}

impl<'s> IntoIterator for &'s OctantStore {
    type Item = &'s OctantData;
    type IntoIter = Iter<'s>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
