use indexmap::IndexMap;

use crate::{digit::Digit, frame::SLOT_COUNT};

/// Identifies one of the at most eight distinct meshes the clock can show.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MeshKey {
    pub digit: Digit,
    pub slot: usize,
}

impl MeshKey {
    pub fn new(digit: Digit, slot: usize) -> MeshKey {
        MeshKey {
            digit,
            slot,
        }
    }
}

/// Upper bound of cached meshes: two digit values in each slot.
pub const MAX_CACHED_MESHES: usize = 2 * SLOT_COUNT;

/// Keeps every mesh built so far, so each `(digit, slot)` pair is built exactly once and reused
/// by later frames. Generic over the mesh type so the GPU side can store uploaded buffers.
pub struct MeshCache<M> {
    meshes: IndexMap<MeshKey, M>,
}

impl<M> Default for MeshCache<M> {
    fn default() -> Self {
        Self {
            meshes: IndexMap::with_capacity(MAX_CACHED_MESHES),
        }
    }
}

impl<M> MeshCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mesh for `key`, building it with `build` if this is the first request.
    pub fn get_or_insert_with(&mut self, key: MeshKey, build: impl FnOnce() -> M) -> &M {
        debug_assert!(key.slot < SLOT_COUNT, "slot {} out of range", key.slot);
        self.meshes.entry(key).or_insert_with(build)
    }

    pub fn get(&self, key: &MeshKey) -> Option<&M> {
        self.meshes.get(key)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Drops every cached mesh, releasing its resources.
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        frame::frame_slots,
        mesh::{build_digit_mesh, DigitMesh},
    };

    #[test]
    fn builds_each_key_once() {
        let builds = Cell::new(0);
        let mut cache = MeshCache::<DigitMesh>::new();
        for _ in 0..3 {
            for slot in frame_slots(5) {
                cache.get_or_insert_with(MeshKey::new(slot.digit, slot.bit), || {
                    builds.set(builds.get() + 1);
                    build_digit_mesh(slot.digit, slot.x_offset)
                });
            }
        }
        assert_eq!(builds.get(), 4);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn full_cycle_is_bounded() {
        let mut cache = MeshCache::<DigitMesh>::new();
        // Several wraps of the counter
        for t in 0..64u32 {
            for slot in frame_slots((t % 16) as u8) {
                let mesh = cache.get_or_insert_with(MeshKey::new(slot.digit, slot.bit), || {
                    build_digit_mesh(slot.digit, slot.x_offset)
                });
                assert_eq!(mesh, &build_digit_mesh(slot.digit, slot.x_offset));
            }
        }
        assert_eq!(cache.len(), MAX_CACHED_MESHES);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_distinguish_slots() {
        let mut cache = MeshCache::new();
        cache.get_or_insert_with(MeshKey::new(Digit::One, 0), || 0);
        cache.get_or_insert_with(MeshKey::new(Digit::One, 3), || 3);
        assert_eq!(cache.get(&MeshKey::new(Digit::One, 0)), Some(&0));
        assert_eq!(cache.get(&MeshKey::new(Digit::One, 3)), Some(&3));
        assert_eq!(cache.get(&MeshKey::new(Digit::Zero, 3)), None);
    }
}
