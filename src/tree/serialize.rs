//! Binary persistence of baked octrees.
//!
//! Layout (little-endian):
//!
//! | field | type |
//! |---|---|
//! | magic `OCTP` | `[u8; 4]` |
//! | version | `u16` |
//! | center | `3 × f32` |
//! | size | `f32` |
//! | subdivisions | `u8` |
//! | include layers | `i32` |
//! | ground layers | `i32` |
//! | query mode | `i32` |
//! | connection type | `u8` |
//! | octant count | `i32` |
//! | connection count | `i32` |
//!
//! followed by, for each stored octant in pre-order: its code (`u32`), flags (`u8`), neighbor
//! count (`i32`) and neighbor codes (`u32` each). Centers are not stored; they are recomputed
//! from the code and root cube on load.

use std::io::{Read, Write};

use nalgebra::point;

use crate::{spatial::QueryMode, OctantCode};

use super::{
    link_count, ConnectionType, Connections, Error, OctantData, OctantFlags, OctantStore, Octree,
    OctreeSettings, SerializeError,
};

pub const MAGIC: [u8; 4] = *b"OCTP";
pub const FORMAT_VERSION: u16 = 1;

fn read_bytes<const N: usize>(r: &mut impl Read) -> Result<[u8; N], SerializeError> {
    let mut buf = [0; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u8(r: &mut impl Read) -> Result<u8, SerializeError> {
    Ok(read_bytes::<1>(r)?[0])
}

fn read_u16(r: &mut impl Read) -> Result<u16, SerializeError> {
    Ok(u16::from_le_bytes(read_bytes(r)?))
}

fn read_u32(r: &mut impl Read) -> Result<u32, SerializeError> {
    Ok(u32::from_le_bytes(read_bytes(r)?))
}

fn read_i32(r: &mut impl Read) -> Result<i32, SerializeError> {
    Ok(i32::from_le_bytes(read_bytes(r)?))
}

fn read_f32(r: &mut impl Read) -> Result<f32, SerializeError> {
    Ok(f32::from_le_bytes(read_bytes(r)?))
}

fn read_count(r: &mut impl Read, field: &'static str) -> Result<usize, SerializeError> {
    let value = read_i32(r)?;
    usize::try_from(value).map_err(|_| SerializeError::BadHeader {
        field,
        value: value as i64,
    })
}

fn write_count(w: &mut impl Write, count: usize) -> Result<(), SerializeError> {
    let count = i32::try_from(count).map_err(|_| SerializeError::BadHeader {
        field: "count",
        value: count as i64,
    })?;
    w.write_all(&count.to_le_bytes())?;
    Ok(())
}

/// Every listed neighbor must be a stored leaf the connection filter admits, and must list
/// its owner back.
fn check_links(
    store: &OctantStore,
    connections: &Connections,
    connection: ConnectionType,
) -> Result<(), SerializeError> {
    let admitted = |code: OctantCode| {
        code.is_valid()
            && store
                .get(code)
                .is_some_and(|o| o.is_leaf() && connection.admits(o.flags))
    };
    for (&owner, neighbors) in connections {
        for &neighbor in neighbors {
            let linked_back = connections
                .get(&neighbor)
                .is_some_and(|back| back.contains(&owner));
            if neighbor == owner || !admitted(owner) || !admitted(neighbor) || !linked_back {
                return Err(SerializeError::BadLink { owner, neighbor });
            }
        }
    }
    Ok(())
}

impl Octree {
    /// Persist the stored octants and their connections.
    pub fn write_to(&self, mut w: impl Write) -> Result<(), SerializeError> {
        let s = &self.settings;
        w.write_all(&MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_le_bytes())?;
        for c in s.center.iter() {
            w.write_all(&c.to_le_bytes())?;
        }
        w.write_all(&s.size.to_le_bytes())?;
        w.write_all(&[s.max_depth])?;
        w.write_all(&s.include_layers.to_le_bytes())?;
        w.write_all(&s.ground_layers.to_le_bytes())?;
        w.write_all(&(s.query_mode as i32).to_le_bytes())?;
        w.write_all(&[s.connection.bits()])?;
        write_count(&mut w, self.store.len())?;
        write_count(&mut w, link_count(&self.connections))?;

        for octant in self.store.iter() {
            w.write_all(&octant.code.raw().to_le_bytes())?;
            w.write_all(&[octant.flags.bits()])?;
            let neighbors = self.neighbors(octant.code);
            write_count(&mut w, neighbors.len())?;
            for n in neighbors {
                w.write_all(&n.raw().to_le_bytes())?;
            }
        }
        w.flush()?;
        Ok(())
    }

    /// Load an octree written by [`write_to`](Octree::write_to).
    pub fn read_from(mut r: impl Read) -> Result<Self, SerializeError> {
        let magic = read_bytes::<4>(&mut r)?;
        if magic != MAGIC {
            return Err(SerializeError::BadMagic(magic));
        }
        let version = read_u16(&mut r)?;
        if version != FORMAT_VERSION {
            return Err(SerializeError::UnsupportedVersion(version));
        }

        let center = point![read_f32(&mut r)?, read_f32(&mut r)?, read_f32(&mut r)?];
        let size = read_f32(&mut r)?;
        let max_depth = read_u8(&mut r)?;
        let include_layers = read_u32(&mut r)?;
        let ground_layers = read_u32(&mut r)?;
        let query_mode = QueryMode::try_from(read_i32(&mut r)?).map_err(|v| {
            SerializeError::BadHeader {
                field: "query mode",
                value: v as i64,
            }
        })?;
        let connection = read_u8(&mut r)?;
        let connection = ConnectionType::from_bits(connection).ok_or(SerializeError::BadHeader {
            field: "connection type",
            value: connection as i64,
        })?;
        let settings = OctreeSettings {
            center,
            size,
            max_depth,
            include_layers,
            ground_layers,
            query_mode,
            connection,
        };
        let mut tree = Octree::new(settings)?;
        let octant_count = read_count(&mut r, "octant count")?;
        let listed_links = read_count(&mut r, "connection count")?;

        let root = settings.root_cube();
        let mut store = OctantStore::new(center);
        let mut connections = Connections::new();
        for index in 0..octant_count {
            let code = OctantCode::from_raw(read_u32(&mut r)?);
            if !code.is_valid() {
                return Err(Error::InvalidCode(code).into());
            }
            if code.depth() > max_depth {
                return Err(Error::TooDeep { code, max_depth }.into());
            }
            let flags = read_u8(&mut r)?;
            let flags = OctantFlags::from_bits(flags).ok_or(SerializeError::BadHeader {
                field: "octant flags",
                value: flags as i64,
            })?;
            // the root is always present, so only a second copy of it is a duplicate
            if index > 0 && store.contains(code) {
                return Err(SerializeError::DuplicateOctant(code));
            }
            if !code.is_root() {
                store.allocate_block(code.parent())?;
            }
            store.set(OctantData::new(code, root.descend(code).center, flags))?;

            let count = read_count(&mut r, "neighbor count")?;
            if count > octant_count {
                return Err(SerializeError::BadHeader {
                    field: "neighbor count",
                    value: count as i64,
                });
            }
            if count > 0 {
                let mut neighbors = Vec::new();
                for _ in 0..count {
                    neighbors.push(OctantCode::from_raw(read_u32(&mut r)?));
                }
                if connections.insert(code, neighbors).is_some() {
                    return Err(SerializeError::DuplicateOctant(code));
                }
            }
        }

        check_links(&store, &connections, connection)?;
        let stored_links = link_count(&connections);
        if stored_links != listed_links {
            return Err(SerializeError::ConnectionCount {
                listed: listed_links,
                stored: stored_links,
            });
        }

        tree.store = store;
        tree.connections = connections;
        tree.touch();
        tracing::debug!(
            octants = tree.store.len(),
            links = stored_links,
            "loaded octree"
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::spatial::{Aabb, BoxField};

    fn baked() -> Octree {
        let settings = OctreeSettings::new(point![1.0, -2.0, 0.5], 8.0, 3)
            .with_layers(0b11, 0b100)
            .with_query_mode(QueryMode::Sphere);
        let mut tree = Octree::new(settings).unwrap();
        let mut field = BoxField::new();
        field.push(Aabb::new(point![1.1, -1.9, 0.6], point![1.9, -1.1, 1.4]), 0b01);
        field.push(Aabb::new(point![-3.0, -7.0, -3.5], point![5.0, -6.0, 4.5]), 0b100);
        tree.bake(&field).unwrap();
        tree
    }

    #[test]
    fn round_trip() {
        let tree = baked();
        let mut bytes = Vec::new();
        tree.write_to(&mut bytes).unwrap();
        let loaded = Octree::read_from(bytes.as_slice()).unwrap();

        assert_eq!(loaded.settings(), tree.settings());
        let a: Vec<_> = tree.iter().copied().collect();
        let b: Vec<_> = loaded.iter().copied().collect();
        assert_eq!(a, b);
        assert_eq!(loaded.connections(), tree.connections());
    }

    #[test]
    fn header_layout() {
        let tree = baked();
        let mut bytes = Vec::new();
        tree.write_to(&mut bytes).unwrap();
        assert_eq!(&bytes[0..4], b"OCTP");
        assert_eq!(&bytes[4..6], &1u16.to_le_bytes());
        assert_eq!(&bytes[6..10], &1.0f32.to_le_bytes());
        assert_eq!(bytes[22], 3);
        assert_eq!(bytes[35], ConnectionType::TRANSITABLE.bits());
        assert_eq!(&bytes[36..40], &(tree.len() as i32).to_le_bytes());
        // first record is the root
        assert_eq!(&bytes[44..48], &1u32.to_le_bytes());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Octree::read_from(&b"NOPE\x01\x00"[..]),
            Err(SerializeError::BadMagic(m)) if &m == b"NOPE"
        ));
        assert!(matches!(
            Octree::read_from(&b"OCTP\x09\x00"[..]),
            Err(SerializeError::UnsupportedVersion(9))
        ));
        assert!(matches!(
            Octree::read_from(&b"OCTP\x01\x00\x00"[..]),
            Err(SerializeError::Io(_))
        ));
    }

    /// Byte offset of the first neighbor count after the root record, i.e. child 0's.
    fn first_child_record(bytes: &[u8]) -> usize {
        // header, then the root: code, flags, neighbor count (the root is never a leaf here)
        let root = 44;
        assert_eq!(&bytes[root + 5..root + 9], &0i32.to_le_bytes());
        root + 9
    }

    #[test]
    fn rejects_oversized_neighbor_count() {
        let tree = baked();
        let mut bytes = Vec::new();
        tree.write_to(&mut bytes).unwrap();
        let count = first_child_record(&bytes) + 5;
        bytes[count..count + 4].copy_from_slice(&i32::MAX.to_le_bytes());
        bytes.truncate(count + 12);
        assert!(matches!(
            Octree::read_from(bytes.as_slice()),
            Err(SerializeError::BadHeader {
                field: "neighbor count",
                ..
            })
        ));
    }

    #[test]
    fn rejects_tampered_neighbors() {
        let tree = baked();
        let mut bytes = Vec::new();
        tree.write_to(&mut bytes).unwrap();
        let record = first_child_record(&bytes);
        let child = OctantCode::from_raw(u32::from_le_bytes(
            bytes[record..record + 4].try_into().unwrap(),
        ));
        assert!(!tree.neighbors(child).is_empty());
        let first = record + 9;

        let tamper = |code: u32| {
            let mut bytes = bytes.clone();
            bytes[first..first + 4].copy_from_slice(&code.to_le_bytes());
            Octree::read_from(bytes.as_slice())
        };
        // the sentinel, a malformed code, an unstored code
        for code in [0, 0b10, 0o17777] {
            assert!(
                matches!(tamper(code), Err(SerializeError::BadLink { .. })),
                "{code:o}"
            );
        }
        // a stored leaf that does not list the owner back
        let stranger = tree
            .leaves()
            .map(|l| l.code)
            .find(|&c| c != child && !tree.neighbors(child).contains(&c))
            .unwrap();
        assert!(matches!(
            tamper(stranger.raw()),
            Err(SerializeError::BadLink { .. })
        ));
    }

    #[test]
    fn rejects_link_mismatch() {
        let tree = baked();
        let mut bytes = Vec::new();
        tree.write_to(&mut bytes).unwrap();
        let listed = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
        bytes[40..44].copy_from_slice(&(listed + 1).to_le_bytes());
        assert!(matches!(
            Octree::read_from(bytes.as_slice()),
            Err(SerializeError::ConnectionCount { .. })
        ));
    }
}
