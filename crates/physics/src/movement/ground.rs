//! Raycast grounding around the physics integration step.
//!
//! The character body is a dynamic capsule, but it does not rest on the
//! ground through contacts. Instead:
//!
//! 1. Before integration, a ray is cast from the body centre down past the
//!    feet ([`GroundContactResolver::feet_raycast`]).
//! 2. After integration, the simulated velocity is reconciled with the
//!    input-driven arcade velocity, aligned to the ground slope, and the body
//!    is snapped to hover at a fixed height above the hit
//!    ([`GroundContactResolver::post_step`]).
//!
//! A pending jump is applied at the end of the post-step.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::{BodyHandle, RigidBody};
use crate::collision::CollisionGroups;
use crate::math::{apply_vector_matrix_xz, have_different_signs};
use crate::world::PhysicsWorld;

use super::config::GroundContactConfig;

/// Ground under a character's feet, captured in the pre-step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub body: Option<BodyHandle>,
    /// Zero for static geometry.
    pub body_mass: f32,
    pub body_velocity: Vec3,
    /// Velocity of the hit body at the hit point.
    pub point_velocity: Vec3,
}

/// Input-driven motion for one post-step.
#[derive(Debug, Clone, Copy)]
pub struct ArcadeMotion {
    /// Horizontal facing.
    pub orientation: Vec3,
    /// Smoothed local velocity (x = sideways, z = forward), unit scale.
    pub velocity: Vec3,
    /// Local velocity target, unit scale.
    pub velocity_target: Vec3,
    /// Per-axis blend weight of arcade over simulated velocity.
    pub influence: Vec3,
    /// Add arcade velocity on top of simulated velocity instead of blending.
    pub additive: bool,
}

/// A jump requested by gameplay.
#[derive(Debug, Clone, Copy)]
pub struct JumpRequest {
    /// Explicit planar launch speed, or `-1` to keep the current motion.
    pub init_speed: f32,
    /// Magnitude of the velocity spring position.
    pub planar_speed: f32,
}

/// What the post-step observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostStepOutcome {
    /// Set while airborne: the velocity the character will land with.
    pub ground_impact_velocity: Option<Vec3>,
    pub jumped: bool,
}

/// Character grounding.
#[derive(Debug, Clone, Default)]
pub struct GroundContactResolver {
    pub config: GroundContactConfig,
}

impl GroundContactResolver {
    pub fn new(config: GroundContactConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(GroundContactConfig::default())
    }

    /// Cast the feet ray for `body`. Only default-group geometry is considered.
    pub fn feet_raycast(&self, world: &PhysicsWorld, body: BodyHandle) -> Option<GroundHit> {
        let position = world.body(body)?.position;
        let end = position - Vec3::Y * self.config.feet_ray_length();

        let result = world.raycast_closest(position, end, CollisionGroups::DEFAULT, Some(body));
        if !result.has_hit {
            return None;
        }

        let (body_mass, body_velocity, point_velocity) = result
            .body
            .and_then(|h| world.body(h))
            .map(|b| (b.mass, b.velocity, b.velocity_at_world_point(result.hit_point)))
            .unwrap_or((0.0, Vec3::ZERO, Vec3::ZERO));

        Some(GroundHit {
            point: result.hit_point,
            normal: result.hit_normal,
            body: result.body,
            body_mass,
            body_velocity,
            point_velocity,
        })
    }

    /// Reconcile velocities, snap to ground and apply a pending jump.
    pub fn post_step(
        &self,
        body: &mut RigidBody,
        hit: Option<&GroundHit>,
        motion: &ArcadeMotion,
        jump: Option<JumpRequest>,
        physics_frame_rate: f32,
    ) -> PostStepOutcome {
        let config = &self.config;
        let mut outcome = PostStepOutcome::default();

        let simulated = body.velocity;
        let arcade = apply_vector_matrix_xz(motion.orientation, motion.velocity * config.move_speed);

        let mut new_velocity = if motion.additive {
            let global_target = apply_vector_matrix_xz(motion.orientation, motion.velocity_target);
            let add = arcade * motion.influence;
            blend_additive(simulated, arcade, add, global_target * config.move_speed)
        } else {
            Vec3::new(
                lerp(simulated.x, arcade.x, motion.influence.x),
                lerp(simulated.y, arcade.y, motion.influence.y),
                lerp(simulated.z, arcade.z, motion.influence.z),
            )
        };

        match hit {
            Some(hit) => {
                new_velocity.y = 0.0;

                if hit.body_mass > 0.0 {
                    new_velocity += hit.point_velocity;
                }

                // Follow the slope
                let align = Quat::from_rotation_arc(Vec3::Y, hit.normal.try_normalize().unwrap_or(Vec3::Y));
                new_velocity = align * new_velocity;

                body.velocity = new_velocity;
                body.position.y =
                    hit.point.y + config.ray_cast_length + new_velocity.y / physics_frame_rate;
            }
            None => {
                body.velocity = new_velocity;
                outcome.ground_impact_velocity = Some(body.velocity);
            }
        }

        if let Some(jump) = jump {
            if jump.init_speed > -1.0 {
                let speed = (jump.planar_speed * config.jump_planar_multiplier).max(jump.init_speed);
                body.velocity = motion.orientation * speed;
            } else if let Some(hit) = hit {
                // Leave the moving platform's velocity behind
                body.velocity -= hit.point_velocity;
            }

            body.velocity.y += config.jump_impulse;
            body.position.y += config.ray_safe_offset * 2.0;
            outcome.jumped = true;
        }

        outcome
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Per axis, add `add` unless the simulated speed already exceeds the target
/// and points the same way as the arcade velocity.
fn blend_additive(simulated: Vec3, arcade: Vec3, add: Vec3, target: Vec3) -> Vec3 {
    let mut result = simulated;
    for axis in 0..3 {
        if simulated[axis].abs() < target[axis].abs()
            || have_different_signs(simulated[axis], arcade[axis])
        {
            result[axis] += add[axis];
        }
    }
    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hit(y: f32) -> GroundHit {
        GroundHit {
            point: Vec3::new(0.0, y, 0.0),
            normal: Vec3::Y,
            body: None,
            body_mass: 0.0,
            body_velocity: Vec3::ZERO,
            point_velocity: Vec3::ZERO,
        }
    }

    fn standing() -> ArcadeMotion {
        ArcadeMotion {
            orientation: Vec3::Z,
            velocity: Vec3::ZERO,
            velocity_target: Vec3::ZERO,
            influence: Vec3::new(1.0, 0.0, 1.0),
            additive: false,
        }
    }

    #[test]
    fn test_feet_raycast_finds_floor() {
        let mut world = PhysicsWorld::with_default_config();
        world.collision.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(10.0, 0.5, 10.0),
            CollisionGroups::DEFAULT,
        );
        let resolver = GroundContactResolver::with_default_config();

        let near = world.add_body(RigidBody::new(1.0, Vec3::new(0.0, 0.58, 0.0)));
        let far = world.add_body(RigidBody::new(1.0, Vec3::new(0.0, 0.7, 0.0)));

        let hit = resolver.feet_raycast(&world, near).expect("floor within reach");
        assert!(hit.point.y.abs() < 1e-3);
        assert!(resolver.feet_raycast(&world, far).is_none(), "0.7 is beyond the 0.6 ray");
    }

    #[test]
    fn test_snap_height_and_zero_vertical_velocity() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 0.55, 0.0));
        body.velocity = Vec3::new(0.0, -3.0, 0.0);

        let hit = flat_hit(0.0);
        let outcome = resolver.post_step(&mut body, Some(&hit), &standing(), None, 60.0);

        assert_eq!(body.velocity.y, 0.0);
        assert!((body.position.y - 0.57).abs() < 1e-6, "y={}", body.position.y);
        assert!(outcome.ground_impact_velocity.is_none());
    }

    #[test]
    fn test_arcade_velocity_replaces_simulated() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 0.57, 0.0));
        body.velocity = Vec3::new(3.0, 0.0, 0.0);

        let mut motion = standing();
        motion.orientation = Vec3::X;
        motion.velocity = Vec3::new(0.0, 0.0, 0.5);

        resolver.post_step(&mut body, Some(&flat_hit(0.0)), &motion, None, 60.0);

        // Facing +X, half speed forward is 2 m/s along +X
        assert!((body.velocity - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5, "v={:?}", body.velocity);
    }

    #[test]
    fn test_moving_ground_velocity_added() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 0.57, 0.0));

        let mut hit = flat_hit(0.0);
        hit.body_mass = 50.0;
        hit.point_velocity = Vec3::new(0.0, 0.0, 5.0);

        resolver.post_step(&mut body, Some(&hit), &standing(), None, 60.0);
        assert!((body.velocity.z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_slope_alignment_rotates_velocity() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 1.0, 0.0));

        let mut hit = flat_hit(0.0);
        hit.normal = Vec3::new(0.0, 1.0, -1.0).normalize();

        let mut motion = standing();
        motion.velocity = Vec3::new(0.0, 0.0, 1.0);

        resolver.post_step(&mut body, Some(&hit), &motion, None, 60.0);

        // Walking up a 45 degree slope facing +Z
        assert!(body.velocity.y > 2.0, "v={:?}", body.velocity);
        assert!((body.velocity.length() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_airborne_records_impact_velocity() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 5.0, 0.0));
        body.velocity = Vec3::new(0.0, -7.0, 0.0);

        let outcome = resolver.post_step(&mut body, None, &standing(), None, 60.0);

        assert_eq!(outcome.ground_impact_velocity, Some(body.velocity));
        assert_eq!(body.velocity.y, -7.0, "influence.y = 0 keeps gravity");
        assert_eq!(body.position.y, 5.0);
    }

    #[test]
    fn test_additive_blend_caps_at_target() {
        let resolver = GroundContactResolver::with_default_config();
        let mut motion = standing();
        motion.additive = true;
        motion.influence = Vec3::new(0.05, 0.0, 0.05);
        motion.velocity = Vec3::new(0.0, 0.0, 1.0);
        motion.velocity_target = Vec3::new(0.0, 0.0, 0.8);

        // Slower than target: arcade is added
        let mut slow = RigidBody::new(1.0, Vec3::new(0.0, 5.0, 0.0));
        slow.velocity = Vec3::new(0.0, -1.0, 1.0);
        resolver.post_step(&mut slow, None, &motion, None, 60.0);
        assert!((slow.velocity.z - 1.2).abs() < 1e-5, "v={:?}", slow.velocity);

        // Faster than target in the same direction: unchanged
        let mut fast = RigidBody::new(1.0, Vec3::new(0.0, 5.0, 0.0));
        fast.velocity = Vec3::new(0.0, -1.0, 5.0);
        resolver.post_step(&mut fast, None, &motion, None, 60.0);
        assert_eq!(fast.velocity.z, 5.0);
    }

    #[test]
    fn test_explicit_jump_speed() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 0.57, 0.0));

        let jump = JumpRequest {
            init_speed: 4.0,
            planar_speed: 0.5,
        };
        let outcome = resolver.post_step(&mut body, Some(&flat_hit(0.0)), &standing(), Some(jump), 60.0);

        assert!(outcome.jumped);
        // max(0.5 * 4, 4) along +Z, plus the vertical impulse
        assert!((body.velocity - Vec3::new(0.0, 4.0, 4.0)).length() < 1e-5, "v={:?}", body.velocity);
        assert!((body.position.y - 0.63).abs() < 1e-5);
    }

    #[test]
    fn test_explicit_jump_speed_floor() {
        let resolver = GroundContactResolver::with_default_config();

        // Walking at 1: max(1 * 4, 6) = 6 along the orientation
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 0.57, 0.0));
        let jump = JumpRequest {
            init_speed: 6.0,
            planar_speed: 1.0,
        };
        resolver.post_step(&mut body, Some(&flat_hit(0.0)), &standing(), Some(jump), 60.0);
        let planar = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
        assert!((planar.length() - 6.0).abs() < 1e-5, "v={:?}", body.velocity);
        assert!(planar.normalize().dot(Vec3::Z) > 0.9999, "Launched along the orientation");
        assert!((body.velocity.y - 4.0).abs() < 1e-5, "Vertical impulse on top");

        // Running at 2: max(2 * 4, 6) = 8
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 0.57, 0.0));
        let jump = JumpRequest {
            init_speed: 6.0,
            planar_speed: 2.0,
        };
        resolver.post_step(&mut body, Some(&flat_hit(0.0)), &standing(), Some(jump), 60.0);
        assert!((body.velocity.z - 8.0).abs() < 1e-5, "v={:?}", body.velocity);
    }

    #[test]
    fn test_contextual_jump_subtracts_ground_velocity() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 0.57, 0.0));

        let mut hit = flat_hit(0.0);
        hit.body_mass = 50.0;
        hit.point_velocity = Vec3::new(2.0, 0.0, 0.0);

        let jump = JumpRequest {
            init_speed: -1.0,
            planar_speed: 0.0,
        };
        resolver.post_step(&mut body, Some(&hit), &standing(), Some(jump), 60.0);

        // Platform velocity was added while grounded, then removed again on jump
        assert!(body.velocity.x.abs() < 1e-5);
        assert!((body.velocity.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_contextual_jump_without_ground() {
        let resolver = GroundContactResolver::with_default_config();
        let mut body = RigidBody::new(1.0, Vec3::new(0.0, 3.0, 0.0));
        body.velocity = Vec3::new(1.0, -2.0, 0.0);

        let jump = JumpRequest {
            init_speed: -1.0,
            planar_speed: 0.0,
        };
        resolver.post_step(&mut body, None, &standing(), Some(jump), 60.0);

        assert!((body.velocity.y - 2.0).abs() < 1e-5);
    }
}
