//! Static collision geometry.
//!
//! Level geometry never moves, so it lives apart from the rigid bodies and is
//! queried by both the raycasts and the body contact pass.

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::na::{Quaternion, Translation3, UnitQuaternion};
use parry3d::query::{contact, Ray};
use parry3d::shape::{Shape, SharedShape};

use super::groups::CollisionGroups;
use super::ray::RaycastResult;

/// A piece of static geometry.
#[derive(Clone)]
pub struct CollisionBrush {
    pub id: u32,
    pub shape: SharedShape,
    pub transform: Isometry<Real>,
    pub groups: CollisionGroups,
}

impl std::fmt::Debug for CollisionBrush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionBrush")
            .field("id", &self.id)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

/// Ray hit against a single shape.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShapeHit {
    pub distance: f32,
    pub normal: Vec3,
}

/// Contact between a probe shape and static geometry.
#[derive(Debug, Clone, Copy)]
pub struct StaticContact {
    /// Direction to push the probe out, pointing away from the geometry.
    pub normal: Vec3,
    /// Penetration depth (positive when overlapping).
    pub depth: f32,
}

/// The static collision world.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    brushes: Vec<CollisionBrush>,
    next_id: u32,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self {
            brushes: Vec::new(),
            next_id: 0,
        }
    }

    /// Add an axis-aligned box.
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, groups: CollisionGroups) -> u32 {
        self.add_oriented_box(center, Quat::IDENTITY, half_extents, groups)
    }

    /// Add a rotated box, e.g. a ramp.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        rotation: Quat,
        half_extents: Vec3,
        groups: CollisionGroups,
    ) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        self.brushes.push(CollisionBrush {
            id,
            shape: SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
            transform: to_isometry(center, rotation),
            groups,
        });

        id
    }

    pub fn clear(&mut self) {
        self.brushes.clear();
    }

    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    /// Closest hit along the segment `from -> to` among brushes matching `mask`.
    pub fn raycast_closest(&self, from: Vec3, to: Vec3, mask: CollisionGroups) -> RaycastResult {
        let Some((ray, length)) = segment_ray(from, to) else {
            return RaycastResult::miss(to);
        };

        let mut closest: Option<ShapeHit> = None;

        for brush in &self.brushes {
            if !mask.intersects(brush.groups) {
                continue;
            }

            if let Some(hit) = cast_shape(brush.shape.as_ref(), &brush.transform, &ray, length) {
                if closest.map_or(true, |c| hit.distance < c.distance) {
                    closest = Some(hit);
                }
            }
        }

        match closest {
            Some(hit) => {
                let direction = (to - from) / length;
                RaycastResult::hit(from + direction * hit.distance, hit.normal, hit.distance, None)
            }
            None => RaycastResult::miss(to),
        }
    }

    /// Deepest overlap between `shape` at `transform` and brushes matching `mask`.
    pub fn deepest_contact(
        &self,
        shape: &dyn Shape,
        transform: &Isometry<Real>,
        mask: CollisionGroups,
    ) -> Option<StaticContact> {
        let mut deepest: Option<StaticContact> = None;

        for brush in &self.brushes {
            if !mask.intersects(brush.groups) {
                continue;
            }

            if let Ok(Some(found)) = contact(transform, shape, &brush.transform, brush.shape.as_ref(), 0.0)
            {
                let depth = -found.dist;
                if depth <= 0.0 {
                    continue;
                }

                // normal2 points out of the brush, toward the probe
                let normal = Vec3::new(found.normal2.x, found.normal2.y, found.normal2.z);
                if deepest.map_or(true, |d| depth > d.depth) {
                    deepest = Some(StaticContact { normal, depth });
                }
            }
        }

        deepest
    }
}

// ============================================================================
// parry3d conversions
// ============================================================================

/// Build a parry isometry from a glam position and rotation.
pub fn to_isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    Isometry::from_parts(
        Translation3::new(position.x, position.y, position.z),
        UnitQuaternion::new_normalize(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z)),
    )
}

/// Ray along a segment, with its length. `None` for a degenerate segment.
pub(crate) fn segment_ray(from: Vec3, to: Vec3) -> Option<(Ray, f32)> {
    let delta = to - from;
    let length = delta.length();
    if length < 1e-6 {
        return None;
    }

    let dir = delta / length;
    let ray = Ray::new(
        Point::new(from.x, from.y, from.z),
        Vector::new(dir.x, dir.y, dir.z),
    );
    Some((ray, length))
}

/// Cast a ray against one shape, returning distance and surface normal.
pub(crate) fn cast_shape(
    shape: &dyn Shape,
    transform: &Isometry<Real>,
    ray: &Ray,
    max_distance: f32,
) -> Option<ShapeHit> {
    let distance = shape.cast_ray(transform, ray, max_distance, true)?;
    if distance > max_distance {
        return None;
    }

    let normal = shape
        .cast_ray_and_get_normal(transform, ray, max_distance, true)
        .map(|i| Vec3::new(i.normal.x, i.normal.y, i.normal.z))
        .filter(|n| n.length_squared() > 0.5)
        .unwrap_or_else(|| -Vec3::new(ray.dir.x, ray.dir.y, ray.dir.z));

    Some(ShapeHit { distance, normal })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();

        // Floor with its top face at y=0
        world.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(50.0, 0.5, 50.0),
            CollisionGroups::DEFAULT,
        );

        // Trimesh-group platform at x=10
        world.add_box(
            Vec3::new(10.0, 0.5, 0.0),
            Vec3::new(1.0, 0.5, 1.0),
            CollisionGroups::TRIMESH_COLLIDERS,
        );

        world
    }

    #[test]
    fn test_raycast_down_hits_floor() {
        let world = create_test_world();

        let result = world.raycast_closest(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, -2.0, 0.0),
            CollisionGroups::DEFAULT,
        );

        assert!(result.has_hit);
        assert!(result.hit_point.y.abs() < 1e-3, "hit={:?}", result.hit_point);
        assert!((result.hit_normal - Vec3::Y).length() < 1e-3);
        assert!((result.distance - 2.0).abs() < 1e-3);
        assert!(result.body.is_none());
    }

    #[test]
    fn test_raycast_respects_mask() {
        let world = create_test_world();
        let from = Vec3::new(10.0, 3.0, 0.0);
        let to = Vec3::new(10.0, -1.0, 0.0);

        let floor_only = world.raycast_closest(from, to, CollisionGroups::DEFAULT);
        assert!(floor_only.hit_point.y.abs() < 1e-3);

        let with_platform =
            world.raycast_closest(from, to, CollisionGroups::DEFAULT | CollisionGroups::TRIMESH_COLLIDERS);
        assert!((with_platform.hit_point.y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_raycast_short_segment_misses() {
        let world = create_test_world();

        let result = world.raycast_closest(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            CollisionGroups::ALL,
        );

        assert!(!result.has_hit);
        assert_eq!(result.hit_point, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_deepest_contact_pushes_up() {
        let world = create_test_world();
        let ball = SharedShape::ball(0.5);
        let transform = to_isometry(Vec3::new(0.0, 0.3, 0.0), Quat::IDENTITY);

        let found = world
            .deepest_contact(ball.as_ref(), &transform, CollisionGroups::DEFAULT)
            .expect("ball overlaps the floor");

        assert!((found.depth - 0.2).abs() < 1e-3, "depth={}", found.depth);
        assert!(found.normal.y > 0.99, "normal={:?}", found.normal);
    }
}
