//! Collision groups for body filtering and ray masks.
//!
//! A body belongs to one or more groups; a query carries a mask and only
//! considers bodies whose groups intersect it.

use serde::{Deserialize, Serialize};

/// Collision group bits.
///
/// Character feet rays use [`CollisionGroups::DEFAULT`] as their mask so a
/// character never grounds on itself or on other characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionGroups(pub u32);

impl CollisionGroups {
    pub const NONE: Self = Self(0);

    /// World geometry, vehicles and props.
    pub const DEFAULT: Self = Self(1 << 0);

    /// Character capsules.
    pub const CHARACTERS: Self = Self(1 << 1);

    /// Static triangle-mesh level colliders.
    pub const TRIMESH_COLLIDERS: Self = Self(1 << 2);

    /// Every group.
    pub const ALL: Self = Self(u32::MAX);

    /// Check if these groups contain all of `other`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any group is shared.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::ops::BitOr for CollisionGroups {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for CollisionGroups {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}
