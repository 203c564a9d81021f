//! The physics world: bodies, static geometry and the fixed-step integrator.
//!
//! The world does not drive itself. Callers ask [`PhysicsWorld::accumulate`]
//! how many fixed steps are due, then run their own pre-step logic, call
//! [`PhysicsWorld::integrate`], run post-step logic, and finally refresh the
//! interpolated transforms:
//!
//! ```text
//! for _ in 0..world.accumulate(dt) {
//!     pre_step(&mut world);     // raycasts, forces
//!     world.integrate();
//!     post_step(&mut world);    // velocity reconciliation
//! }
//! world.interpolate();
//! ```

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::{BodyHandle, RigidBody};
use crate::collision::{cast_shape, segment_ray, to_isometry, CollisionGroups, CollisionWorld, RaycastResult};
use crate::error::PhysicsError;

/// World-level physics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravity acceleration (meters/second²).
    pub gravity: Vec3,

    /// Fixed steps per second.
    pub frame_rate: f32,

    /// Upper bound on fixed steps per `accumulate` call.
    pub max_sub_steps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            frame_rate: 60.0,
            max_sub_steps: 10,
        }
    }
}

/// Bodies plus static geometry.
#[derive(Debug, Default)]
pub struct PhysicsWorld {
    pub config: PhysicsConfig,
    /// Static level geometry.
    pub collision: CollisionWorld,
    bodies: Vec<Option<RigidBody>>,
    accumulator: f32,
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            collision: CollisionWorld::new(),
            bodies: Vec::new(),
            accumulator: 0.0,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(PhysicsConfig::default())
    }

    #[inline]
    pub fn fixed_time_step(&self) -> f32 {
        1.0 / self.config.frame_rate
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(Some(body));
        handle
    }

    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        self.bodies.get_mut(handle.0 as usize).and_then(Option::take)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0 as usize).and_then(Option::as_ref)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0 as usize).and_then(Option::as_mut)
    }

    /// Like [`Self::body_mut`] but reports a stale handle as an error.
    pub fn try_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, PhysicsError> {
        self.body_mut(handle).ok_or(PhysicsError::InvalidBody(handle))
    }

    pub fn try_body(&self, handle: BodyHandle) -> Result<&RigidBody, PhysicsError> {
        self.body(handle).ok_or(PhysicsError::InvalidBody(handle))
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|b| (BodyHandle(i as u32), b)))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Closest hit on the segment `from -> to`.
    ///
    /// Considers static brushes and enabled body colliders whose group
    /// intersects `mask`. `skip` excludes one body, e.g. a vehicle's own chassis.
    pub fn raycast_closest(
        &self,
        from: Vec3,
        to: Vec3,
        mask: CollisionGroups,
        skip: Option<BodyHandle>,
    ) -> RaycastResult {
        let mut result = self.collision.raycast_closest(from, to, mask);

        let Some((ray, length)) = segment_ray(from, to) else {
            return result;
        };
        let direction = (to - from) / length;

        for (handle, body) in self.bodies() {
            if Some(handle) == skip || !body.enabled || !mask.intersects(body.collision_group) {
                continue;
            }

            for collider in &body.colliders {
                let (position, rotation) = body.collider_transform(collider);
                let shape = collider.shape.to_shared_shape();
                let transform = to_isometry(position, rotation);

                if let Some(hit) = cast_shape(shape.as_ref(), &transform, &ray, length) {
                    if !result.has_hit || hit.distance < result.distance {
                        result = RaycastResult::hit(
                            from + direction * hit.distance,
                            hit.normal,
                            hit.distance,
                            Some(handle),
                        );
                    }
                }
            }
        }

        result
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Add `dt` to the accumulator and return the number of fixed steps due.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        if !(dt > 0.0) {
            return 0;
        }

        let fixed = self.fixed_time_step();
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= fixed && steps < self.config.max_sub_steps {
            self.accumulator -= fixed;
            steps += 1;
        }

        if steps == self.config.max_sub_steps && self.accumulator >= fixed {
            log::debug!("physics fell behind, dropping {:.3}s", self.accumulator);
            self.accumulator %= fixed;
        }

        steps
    }

    /// Advance every enabled dynamic body by one fixed step.
    pub fn integrate(&mut self) {
        let dt = self.fixed_time_step();
        let gravity = self.config.gravity;

        for body in self.bodies.iter_mut().flatten() {
            body.previous_position = body.position;
            body.previous_quaternion = body.quaternion;

            if !body.enabled || !body.is_dynamic() {
                continue;
            }

            body.velocity += gravity * dt;
            body.velocity *= (1.0 - body.linear_damping).powf(dt);
            body.position += body.velocity * dt;

            if body.fixed_rotation {
                body.angular_velocity = Vec3::ZERO;
            } else {
                body.angular_velocity *= (1.0 - body.angular_damping).powf(dt);
                let spin = body.angular_velocity.length();
                if spin > 1e-6 {
                    let delta = Quat::from_axis_angle(body.angular_velocity / spin, spin * dt);
                    body.quaternion = (delta * body.quaternion).normalize();
                }
            }

            resolve_static_contacts(&self.collision, body);
        }
    }

    /// Refresh the interpolated transforms from the leftover accumulator.
    pub fn interpolate(&mut self) {
        let alpha = (self.accumulator / self.fixed_time_step()).clamp(0.0, 1.0);

        for body in self.bodies.iter_mut().flatten() {
            body.interpolated_position = body.previous_position.lerp(body.position, alpha);
            body.interpolated_quaternion = body.previous_quaternion.slerp(body.quaternion, alpha);
        }
    }

    /// Convenience: accumulate, integrate every due step, interpolate.
    pub fn step(&mut self, dt: f32) {
        for _ in 0..self.accumulate(dt) {
            self.integrate();
        }
        self.interpolate();
    }
}

/// Push a body's colliders out of static geometry and cancel inward velocity.
fn resolve_static_contacts(collision: &CollisionWorld, body: &mut RigidBody) {
    for i in 0..body.colliders.len() {
        let collider = body.colliders[i];
        let (position, rotation) = body.collider_transform(&collider);
        let shape = collider.shape.to_shared_shape();

        if let Some(contact) =
            collision.deepest_contact(shape.as_ref(), &to_isometry(position, rotation), body.collision_mask)
        {
            body.position += contact.normal * contact.depth;

            let into_surface = body.velocity.dot(contact.normal);
            if into_surface < 0.0 {
                body.velocity -= contact.normal * into_surface;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ColliderShape;

    fn create_test_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::with_default_config();
        world.collision.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(50.0, 0.5, 50.0),
            CollisionGroups::DEFAULT,
        );
        world
    }

    #[test]
    fn test_accumulate_counts_fixed_steps() {
        let mut world = PhysicsWorld::with_default_config();
        assert_eq!(world.accumulate(1.0 / 120.0), 0);
        assert_eq!(world.accumulate(1.0 / 120.0 + 1e-6), 1);
        assert_eq!(world.accumulate(0.0), 0);
        assert_eq!(world.accumulate(-1.0), 0);
    }

    #[test]
    fn test_accumulate_caps_sub_steps() {
        let mut world = PhysicsWorld::with_default_config();
        assert_eq!(world.accumulate(5.0), world.config.max_sub_steps);
    }

    #[test]
    fn test_gravity_integration() {
        let mut world = PhysicsWorld::with_default_config();
        let handle = world.add_body(RigidBody::new(1.0, Vec3::new(0.0, 10.0, 0.0)));

        for _ in 0..60 {
            world.integrate();
        }

        let body = world.body(handle).unwrap();
        assert!(body.velocity.y < -9.0, "velocity={:?}", body.velocity);
        assert!(body.position.y < 6.0, "position={:?}", body.position);
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut world = PhysicsWorld::with_default_config();
        let handle = world.add_body(RigidBody::new(0.0, Vec3::new(0.0, 5.0, 0.0)));
        world.step(1.0);
        assert_eq!(world.body(handle).unwrap().position, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_ball_rests_on_floor() {
        let mut world = create_test_world();
        let handle = world.add_body(
            RigidBody::new(1.0, Vec3::new(0.0, 1.0, 0.0))
                .with_collider(ColliderShape::Ball { radius: 0.5 }, Vec3::ZERO),
        );

        for _ in 0..120 {
            world.integrate();
        }

        let body = world.body(handle).unwrap();
        assert!(
            (body.position.y - 0.5).abs() < 0.05,
            "ball should rest on the floor, y={}",
            body.position.y
        );
    }

    #[test]
    fn test_raycast_reports_body_and_skip() {
        let mut world = create_test_world();
        let handle = world.add_body(
            RigidBody::new(0.0, Vec3::new(0.0, 1.0, 0.0)).with_collider(
                ColliderShape::Cuboid {
                    half_extents: Vec3::splat(0.5),
                },
                Vec3::ZERO,
            ),
        );

        let from = Vec3::new(0.0, 5.0, 0.0);
        let to = Vec3::new(0.0, -1.0, 0.0);

        let hit = world.raycast_closest(from, to, CollisionGroups::DEFAULT, None);
        assert_eq!(hit.body, Some(handle));
        assert!((hit.hit_point.y - 1.5).abs() < 1e-3);

        let skipped = world.raycast_closest(from, to, CollisionGroups::DEFAULT, Some(handle));
        assert!(skipped.body.is_none());
        assert!(skipped.hit_point.y.abs() < 1e-3);
    }

    #[test]
    fn test_raycast_mask_excludes_characters() {
        let mut world = create_test_world();
        world.add_body(
            RigidBody::capsule(1.0, Vec3::new(0.0, 1.0, 0.0), 0.25, 0.5, 4)
                .with_group(CollisionGroups::CHARACTERS),
        );

        let hit = world.raycast_closest(
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            CollisionGroups::DEFAULT,
            None,
        );
        assert!(hit.body.is_none(), "character capsule must not be hit");
    }
}
