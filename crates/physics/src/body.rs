//! Rigid bodies.
//!
//! Bodies are owned by [`PhysicsWorld`](crate::PhysicsWorld) and addressed by
//! [`BodyHandle`]. A body with zero mass is static: it is never integrated and
//! only moves when gameplay code sets its transform.

use glam::{Quat, Vec3};
use parry3d::shape::SharedShape;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionGroups;

/// Index of a body in the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Shape of a single collider attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

impl ColliderShape {
    pub(crate) fn to_shared_shape(self) -> SharedShape {
        match self {
            Self::Ball { radius } => SharedShape::ball(radius),
            Self::Cuboid { half_extents } => {
                SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        }
    }
}

/// A collider positioned relative to its body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub offset: Vec3,
}

/// A rigid body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    // ========================================================================
    // Transform
    // ========================================================================
    pub position: Vec3,
    /// Position at the start of the last fixed step.
    pub previous_position: Vec3,
    /// Position blended between fixed steps for presentation.
    pub interpolated_position: Vec3,

    pub quaternion: Quat,
    pub previous_quaternion: Quat,
    pub interpolated_quaternion: Quat,
    /// Rotation the body was spawned with.
    pub init_quaternion: Quat,

    // ========================================================================
    // Motion
    // ========================================================================
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Zero for static bodies.
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub fixed_rotation: bool,

    // ========================================================================
    // Collision
    // ========================================================================
    pub colliders: Vec<Collider>,
    pub collision_group: CollisionGroups,
    /// Groups this body's colliders are pushed out of.
    pub collision_mask: CollisionGroups,

    /// Disabled bodies are skipped by integration and queries.
    pub enabled: bool,
    pub allow_sleep: bool,
}

impl RigidBody {
    pub fn new(mass: f32, position: Vec3) -> Self {
        Self {
            position,
            previous_position: position,
            interpolated_position: position,
            quaternion: Quat::IDENTITY,
            previous_quaternion: Quat::IDENTITY,
            interpolated_quaternion: Quat::IDENTITY,
            init_quaternion: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass,
            linear_damping: 0.01,
            angular_damping: 0.01,
            fixed_rotation: false,
            colliders: Vec::new(),
            collision_group: CollisionGroups::DEFAULT,
            collision_mask: CollisionGroups::ALL,
            enabled: true,
            allow_sleep: true,
        }
    }

    /// Vertical capsule approximated by a stack of spheres centred on the body.
    pub fn capsule(mass: f32, position: Vec3, radius: f32, height: f32, segments: usize) -> Self {
        let mut body = Self::new(mass, position);
        let segments = segments.max(1);
        let step = if segments > 1 { height / (segments - 1) as f32 } else { 0.0 };

        for i in 0..segments {
            body.colliders.push(Collider {
                shape: ColliderShape::Ball { radius },
                offset: Vec3::new(0.0, i as f32 * step - height / 2.0, 0.0),
            });
        }

        body
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation(rotation);
        self.init_quaternion = rotation;
        self
    }

    pub fn with_collider(mut self, shape: ColliderShape, offset: Vec3) -> Self {
        self.colliders.push(Collider { shape, offset });
        self
    }

    pub fn with_group(mut self, group: CollisionGroups) -> Self {
        self.collision_group = group;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }

    /// Velocity of a world-space point rigidly attached to the body.
    #[inline]
    pub fn velocity_at_world_point(&self, point: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(point - self.position)
    }

    /// Teleport, clearing interpolation history.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.previous_position = position;
        self.interpolated_position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.quaternion = rotation;
        self.previous_quaternion = rotation;
        self.interpolated_quaternion = rotation;
    }

    pub(crate) fn collider_transform(&self, collider: &Collider) -> (Vec3, Quat) {
        (self.position + self.quaternion * collider.offset, self.quaternion)
    }
}
