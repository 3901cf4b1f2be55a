use std::fmt;

/// Tile-local coordinate range; vertices span `0..EXTENT` on both axes.
pub const EXTENT: i16 = 8192;

/// A tile of the single-world grid.
///
/// Ordered by `(z, x, y)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalTileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl CanonicalTileId {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        debug_assert!(z <= 32, "zoom {z} out of range");
        debug_assert!(u64::from(x) < (1u64 << z), "x {x} out of range at z{z}");
        debug_assert!(u64::from(y) < (1u64 << z), "y {y} out of range at z{z}");
        Self { z, x, y }
    }

    /// True when `self` is strictly below `parent` in the quadtree.
    pub fn is_child_of(&self, parent: &CanonicalTileId) -> bool {
        if parent.z >= self.z {
            return false;
        }
        let dz = u32::from(self.z - parent.z);
        self.x.checked_shr(dz).unwrap_or(0) == parent.x
            && self.y.checked_shr(dz).unwrap_or(0) == parent.y
    }

    pub fn children(&self) -> [CanonicalTileId; 4] {
        let (z, x, y) = (self.z + 1, self.x * 2, self.y * 2);
        [
            Self { z, x, y },
            Self { z, x: x + 1, y },
            Self { z, x, y: y + 1 },
            Self { z, x: x + 1, y: y + 1 },
        ]
    }

    pub fn to_unwrapped(self, wrap: i16) -> UnwrappedTileId {
        UnwrappedTileId { wrap, canonical: self }
    }
}

impl fmt::Display for CanonicalTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A canonical tile repeated `wrap` worlds away from the primary one.
///
/// Field order gives the ordering `(wrap, z, x, y)`, which keeps every
/// descendant of a tile after it and inside the same wrap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnwrappedTileId {
    pub wrap: i16,
    pub canonical: CanonicalTileId,
}

impl UnwrappedTileId {
    /// `x` may fall outside the world; it is folded into `wrap`.
    pub fn new(z: u8, x: i64, y: u32) -> Self {
        let tiles = 1i64 << z;
        let wrap = x.div_euclid(tiles);
        Self {
            wrap: wrap as i16,
            canonical: CanonicalTileId::new(z, x.rem_euclid(tiles) as u32, y),
        }
    }

    pub fn is_child_of(&self, parent: &UnwrappedTileId) -> bool {
        self.wrap == parent.wrap && self.canonical.is_child_of(&parent.canonical)
    }

    pub fn children(&self) -> [UnwrappedTileId; 4] {
        self.canonical.children().map(|canonical| canonical.to_unwrapped(self.wrap))
    }

    /// Column index across wrapped worlds.
    pub fn unwrapped_x(&self) -> i64 {
        i64::from(self.canonical.x) + i64::from(self.wrap) * (1i64 << self.canonical.z)
    }
}

impl fmt::Display for UnwrappedTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wrap == 0 {
            write!(f, "{}", self.canonical)
        } else {
            write!(f, "{}@{}", self.canonical, self.wrap)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_outside_the_world_wraps() {
        let id = UnwrappedTileId::new(1, -1, 0);
        assert_eq!(id.wrap, -1);
        assert_eq!(id.canonical, CanonicalTileId::new(1, 1, 0));
        assert_eq!(id.unwrapped_x(), -1);

        let id = UnwrappedTileId::new(2, 9, 3);
        assert_eq!((id.wrap, id.canonical.x), (2, 1));
    }

    #[test]
    fn descendants_are_children_across_levels() {
        let parent = CanonicalTileId::new(1, 1, 0);
        let grandchild = CanonicalTileId::new(3, 5, 2);
        assert!(grandchild.is_child_of(&parent));
        assert!(!parent.is_child_of(&parent));
        assert!(!CanonicalTileId::new(3, 1, 2).is_child_of(&parent));

        for child in parent.children() {
            assert!(child.is_child_of(&parent));
        }
    }

    #[test]
    fn wraps_are_never_related() {
        let parent = UnwrappedTileId::new(0, 0, 0);
        let other_world = UnwrappedTileId::new(1, 2, 0);
        assert!(!other_world.is_child_of(&parent));
        assert!(UnwrappedTileId::new(1, 1, 1).is_child_of(&parent));
    }

    #[test]
    fn ordering_groups_by_wrap_then_zoom() {
        let mut ids = vec![
            UnwrappedTileId::new(1, 2, 0),
            UnwrappedTileId::new(1, 1, 0),
            UnwrappedTileId::new(0, 0, 0),
            UnwrappedTileId::new(1, -1, 0),
        ];
        ids.sort();
        let names: Vec<_> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["1/1/0@-1", "0/0/0", "1/1/0", "1/0/0@1"]);
    }
}
