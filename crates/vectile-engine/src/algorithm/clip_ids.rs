//! Stencil partitioning for overlapping tiles.
//!
//! Every visible tile gets a `(mask, reference)` pair over the 8-bit stencil
//! buffer. Tiles of one source get distinct references within a fresh run of
//! bits; each further source claims the next run. A tile that appears in
//! several sources with the same set of descendants reuses the reference it
//! already has, so it costs no extra bits.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::renderer::RenderTile;
use crate::tile::{CanonicalTileId, UnwrappedTileId};

/// Width of the stencil buffer.
pub const STENCIL_BITS: u32 = 8;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClipId {
    pub mask: u8,
    pub reference: u8,
}

impl ClipId {
    pub const fn new(mask: u8, reference: u8) -> Self {
        Self { mask, reference }
    }
}

impl BitOr for ClipId {
    type Output = ClipId;

    fn bitor(self, rhs: ClipId) -> ClipId {
        ClipId { mask: self.mask | rhs.mask, reference: self.reference | rhs.reference }
    }
}

impl BitOrAssign for ClipId {
    fn bitor_assign(&mut self, rhs: ClipId) {
        *self = *self | rhs;
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mask={:08b} ref={:08b}", self.mask, self.reference)
    }
}

/// A tile of one source together with the descendants it overlaps.
#[derive(Debug)]
struct Leaf {
    children: BTreeSet<CanonicalTileId>,
    clip: ClipId,
}

impl Leaf {
    /// Descendants of an already present child add nothing.
    fn add(&mut self, id: CanonicalTileId) {
        if self.children.iter().any(|child| id.is_child_of(child)) {
            return;
        }
        self.children.insert(id);
    }
}

#[derive(Debug, Default)]
pub struct ClipIdGenerator {
    bit_offset: u32,
    pool: BTreeMap<UnwrappedTileId, Vec<Leaf>>,
}

impl ClipIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stencil bits claimed so far.
    pub fn bits_used(&self) -> u32 {
        self.bit_offset
    }

    /// Assigns clips to the tiles of one source.
    ///
    /// Tiles that already carry a reference keep it and only gain the new
    /// mask bits.
    pub fn update(&mut self, tiles: &[&RenderTile]) {
        let mut tiles = tiles.to_vec();
        tiles.sort_by_key(|tile| tile.id);

        let mut leaves = Vec::with_capacity(tiles.len());
        let mut new_references = 0usize;

        for (i, tile) in tiles.iter().enumerate() {
            let mut leaf = Leaf { children: BTreeSet::new(), clip: tile.clip() };

            // Sorting puts every descendant after its ancestor and before
            // the next wrap.
            for child in tiles[i + 1..].iter().take_while(|t| t.id.wrap == tile.id.wrap) {
                if child.id.is_child_of(&tile.id) {
                    leaf.add(child.id.canonical);
                }
            }

            let existing = self
                .pool
                .get(&tile.id)
                .and_then(|leaves| leaves.iter().find(|l| l.children == leaf.children));
            if let Some(existing) = existing {
                leaf.clip = existing.clip;
                tile.set_clip(existing.clip);
            }

            if leaf.clip.reference == 0 {
                new_references += 1;
            }
            leaves.push(leaf);
        }

        if new_references > 0 {
            let bit_count = ceil_log2(new_references + 1);
            let mask = truncate_to_stencil(((1u64 << bit_count) - 1) << self.bit_offset);

            // Reference 0 is left for pixels no tile covers.
            let mut count = 1u64;
            for tile in &tiles {
                let mut clip = tile.clip();
                clip.mask |= mask;
                if clip.reference == 0 {
                    clip.reference = truncate_to_stencil(count << self.bit_offset);
                    count += 1;
                }
                tile.set_clip(clip);
            }
            self.bit_offset += bit_count;
        }

        if self.bit_offset > STENCIL_BITS {
            log::error!(
                "stencil mask overflow: {} bits needed, {STENCIL_BITS} available",
                self.bit_offset
            );
        }

        for (tile, mut leaf) in tiles.iter().zip(leaves) {
            leaf.clip = tile.clip();
            self.pool.entry(tile.id).or_default().push(leaf);
        }
    }

    /// One clip per tile id to draw into the stencil buffer.
    ///
    /// Clips of the same id from different sources are merged, every tile
    /// inherits the bits of its ancestors that it does not set itself, and
    /// tiles whose area is fully covered by descendants are dropped.
    pub fn stencils(&self) -> BTreeMap<UnwrappedTileId, ClipId> {
        let mut stencils: BTreeMap<UnwrappedTileId, ClipId> = BTreeMap::new();
        for (id, leaves) in &self.pool {
            for leaf in leaves {
                *stencils.entry(*id).or_default() |= leaf.clip;
            }
        }

        let ids: Vec<UnwrappedTileId> = stencils.keys().copied().collect();
        for (i, child_id) in ids.iter().enumerate() {
            // Nearest ancestors first.
            for parent_id in ids[..i].iter().rev() {
                if !child_id.is_child_of(parent_id) {
                    continue;
                }
                let parent = stencils[parent_id];
                let child = stencils.entry(*child_id).or_default();
                let unset = !(child.mask & parent.mask);
                child.reference |= unset & parent.reference;
                child.mask |= parent.mask;
            }
        }

        let covered: Vec<UnwrappedTileId> = ids
            .iter()
            .copied()
            .filter(|id| covered_by_children(id, &stencils))
            .collect();
        for id in covered {
            stencils.remove(&id);
        }

        stencils
    }
}

/// True when every quadrant of `id` is present, or itself covered, in `tiles`.
fn covered_by_children(id: &UnwrappedTileId, tiles: &BTreeMap<UnwrappedTileId, ClipId>) -> bool {
    id.children().iter().all(|child| {
        tiles.contains_key(child)
            || (tiles.keys().any(|t| t.is_child_of(child)) && covered_by_children(child, tiles))
    })
}

fn ceil_log2(n: usize) -> u32 {
    debug_assert!(n > 0);
    usize::BITS - (n - 1).leading_zeros()
}

/// Bits past the stencil width are lost; the overflow is reported by the caller.
fn truncate_to_stencil(bits: u64) -> u8 {
    (bits & 0xff) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(ids: &[(u8, i64, u32)]) -> Vec<RenderTile> {
        ids.iter().map(|&(z, x, y)| RenderTile::new(UnwrappedTileId::new(z, x, y))).collect()
    }

    fn update(generator: &mut ClipIdGenerator, tiles: &[RenderTile]) {
        let refs: Vec<&RenderTile> = tiles.iter().collect();
        generator.update(&refs);
    }

    #[test]
    fn ceil_log2_rounds_up() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(8), 3);
        assert_eq!(ceil_log2(9), 4);
    }

    #[test]
    fn a_single_tile_uses_one_bit() {
        let tiles = tiles(&[(0, 0, 0)]);
        let mut generator = ClipIdGenerator::new();
        update(&mut generator, &tiles);

        assert_eq!(tiles[0].clip(), ClipId::new(0b1, 0b1));
        assert_eq!(generator.bits_used(), 1);
    }

    #[test]
    fn siblings_get_disjoint_references() {
        let tiles = tiles(&[(1, 1, 1), (1, 0, 0), (1, 1, 0), (1, 0, 1)]);
        let mut generator = ClipIdGenerator::new();
        update(&mut generator, &tiles);

        let mut references: Vec<u8> = tiles.iter().map(|t| t.clip().reference).collect();
        references.sort();
        assert_eq!(references, vec![1, 2, 3, 4]);
        assert!(tiles.iter().all(|t| t.clip().mask == 0b111));

        // Sorted order assigns references: 1/0/0, 1/0/1, 1/1/0, 1/1/1.
        assert_eq!(tiles[1].clip().reference, 1);
        assert_eq!(tiles[0].clip().reference, 4);
    }

    #[test]
    fn parent_and_four_children_drop_the_covered_parent() {
        let tiles = tiles(&[(0, 0, 0), (1, 0, 0), (1, 1, 0), (1, 0, 1), (1, 1, 1)]);
        let mut generator = ClipIdGenerator::new();
        update(&mut generator, &tiles);

        assert_eq!(tiles[0].clip(), ClipId::new(0b111, 0b001));
        assert_eq!(tiles[1].clip(), ClipId::new(0b111, 0b010));

        let stencils = generator.stencils();
        assert_eq!(stencils.len(), 4);
        assert!(!stencils.contains_key(&UnwrappedTileId::new(0, 0, 0)));
    }

    #[test]
    fn partially_covered_parent_keeps_its_stencil() {
        let tiles = tiles(&[(0, 0, 0), (1, 0, 0), (2, 3, 3)]);
        let mut generator = ClipIdGenerator::new();
        update(&mut generator, &tiles);

        let stencils = generator.stencils();
        assert_eq!(stencils.len(), 3);
        let parent = stencils[&UnwrappedTileId::new(0, 0, 0)];
        for id in [UnwrappedTileId::new(1, 0, 0), UnwrappedTileId::new(2, 3, 3)] {
            let child = stencils[&id];
            assert_eq!(child.mask & parent.mask, parent.mask);
            assert_ne!(child, parent);
        }
    }

    #[test]
    fn second_source_claims_the_next_bits() {
        let first = tiles(&[(1, 0, 0), (1, 1, 0)]);
        let second = tiles(&[(2, 0, 0)]);
        let mut generator = ClipIdGenerator::new();
        update(&mut generator, &first);
        update(&mut generator, &second);

        assert_eq!(first[0].clip(), ClipId::new(0b011, 0b001));
        assert_eq!(first[1].clip(), ClipId::new(0b011, 0b010));
        assert_eq!(second[0].clip(), ClipId::new(0b100, 0b100));
        assert_eq!(generator.bits_used(), 3);
    }

    #[test]
    fn identical_tile_sets_share_clips_across_sources() {
        let first = tiles(&[(1, 0, 0), (1, 1, 0)]);
        let second = tiles(&[(1, 0, 0), (1, 1, 0)]);
        let mut generator = ClipIdGenerator::new();
        update(&mut generator, &first);
        update(&mut generator, &second);

        assert_eq!(generator.bits_used(), 2);
        assert_eq!(first[0].clip(), second[0].clip());
        assert_eq!(first[1].clip(), second[1].clip());
        assert_eq!(generator.stencils().len(), 2);
    }

    #[test]
    fn wrapped_copies_are_separate_tiles() {
        let tiles = tiles(&[(0, 0, 0), (0, 1, 0)]);
        let mut generator = ClipIdGenerator::new();
        update(&mut generator, &tiles);

        assert_ne!(tiles[0].clip().reference, tiles[1].clip().reference);
        assert_eq!(generator.stencils().len(), 2);
    }
}
