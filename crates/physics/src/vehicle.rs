//! Raycast vehicle.
//!
//! Each wheel is a suspension ray cast from a chassis-local connection point
//! along the chassis down axis. Wheels that touch the ground push the chassis
//! up with a spring/damper force and transmit engine, brake and lateral
//! friction impulses. The chassis itself is an ordinary [`RigidBody`].
//!
//! ```text
//!        chassis
//!   ┌──────●──────┐
//!   │      │      │   connection point
//!   └──────┼──────┘
//!          │ rest length + radius
//!          ○  wheel
//!   ───────┴──────── ground
//! ```

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::{BodyHandle, ColliderShape, RigidBody};
use crate::collision::CollisionGroups;
use crate::error::PhysicsError;
use crate::world::PhysicsWorld;

/// Per-wheel handling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelOptions {
    /// Wheel radius (meters).
    pub radius: f32,

    // ========================================================================
    // Suspension
    // ========================================================================
    pub suspension_stiffness: f32,
    pub suspension_rest_length: f32,
    pub max_suspension_travel: f32,
    pub max_suspension_force: f32,
    pub damping_relaxation: f32,
    pub damping_compression: f32,

    // ========================================================================
    // Friction
    // ========================================================================
    pub friction_slip: f32,
    /// Scales the lateral impulse's rolling torque (0 = none).
    pub roll_influence: f32,

    // ========================================================================
    // Geometry (chassis-local)
    // ========================================================================
    pub chassis_connection_point_local: Vec3,
    pub direction_local: Vec3,
    pub axle_local: Vec3,
}

impl Default for WheelOptions {
    fn default() -> Self {
        Self {
            radius: 0.25,
            suspension_stiffness: 20.0,
            suspension_rest_length: 0.35,
            max_suspension_travel: 1.0,
            max_suspension_force: 100_000.0,
            damping_relaxation: 2.0,
            damping_compression: 2.0,
            friction_slip: 0.8,
            roll_influence: 0.8,
            chassis_connection_point_local: Vec3::ZERO,
            direction_local: Vec3::NEG_Y,
            axle_local: Vec3::NEG_X,
        }
    }
}

impl WheelOptions {
    /// Handling setup placed at a wheel model position; the connection point
    /// sits 0.2 above the wheel centre.
    pub fn at_wheel(mut self, wheel_position: Vec3) -> Self {
        self.chassis_connection_point_local = wheel_position + Vec3::new(0.0, 0.2, 0.0);
        self
    }
}

/// Runtime state of one wheel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelInfo {
    pub options: WheelOptions,
    /// Steering angle about the chassis up axis (radians).
    pub steering: f32,
    /// Negative values drive along the chassis forward (+Z).
    pub engine_force: f32,
    pub brake: f32,
    pub in_contact: bool,
    pub suspension_length: f32,
    pub suspension_force: f32,
    pub contact_point: Vec3,
    pub contact_normal: Vec3,
    pub ground_body: Option<BodyHandle>,
    /// Wheel centre in world space after the last update.
    pub world_position: Vec3,
}

impl WheelInfo {
    fn new(options: WheelOptions) -> Self {
        let rest = options.suspension_rest_length;
        Self {
            options,
            steering: 0.0,
            engine_force: 0.0,
            brake: 0.0,
            in_contact: false,
            suspension_length: rest,
            suspension_force: 0.0,
            contact_point: Vec3::ZERO,
            contact_normal: Vec3::Y,
            ground_body: None,
            world_position: Vec3::ZERO,
        }
    }
}

/// Ray-suspended wheels attached to a chassis body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaycastVehicle {
    pub chassis: BodyHandle,
    pub wheels: Vec<WheelInfo>,
    pub num_wheels_on_ground: usize,
    /// Groups the suspension rays collide with.
    pub ray_mask: CollisionGroups,
}

impl RaycastVehicle {
    pub fn new(chassis: BodyHandle) -> Self {
        Self {
            chassis,
            wheels: Vec::new(),
            num_wheels_on_ground: 0,
            ray_mask: CollisionGroups::DEFAULT | CollisionGroups::TRIMESH_COLLIDERS,
        }
    }

    /// Add a wheel and return its index.
    pub fn add_wheel(&mut self, options: WheelOptions) -> usize {
        self.wheels.push(WheelInfo::new(options));
        self.wheels.len() - 1
    }

    pub fn set_steering_value(&mut self, value: f32, index: usize) -> Result<(), PhysicsError> {
        self.wheel_mut(index)?.steering = value;
        Ok(())
    }

    pub fn apply_engine_force(&mut self, force: f32, index: usize) -> Result<(), PhysicsError> {
        self.wheel_mut(index)?.engine_force = force;
        Ok(())
    }

    pub fn set_brake(&mut self, brake: f32, index: usize) -> Result<(), PhysicsError> {
        self.wheel_mut(index)?.brake = brake;
        Ok(())
    }

    fn wheel_mut(&mut self, index: usize) -> Result<&mut WheelInfo, PhysicsError> {
        let count = self.wheels.len();
        self.wheels
            .get_mut(index)
            .ok_or(PhysicsError::InvalidWheel { index, count })
    }

    /// Run suspension, drive and friction for one fixed step.
    ///
    /// Call before [`PhysicsWorld::integrate`].
    pub fn update(&mut self, world: &mut PhysicsWorld) -> Result<(), PhysicsError> {
        let dt = world.fixed_time_step();
        let chassis = world.try_body(self.chassis)?.clone();

        if !chassis.enabled || !chassis.is_dynamic() {
            self.num_wheels_on_ground = 0;
            return Ok(());
        }

        let rotation = chassis.quaternion;
        let up = rotation * Vec3::Y;
        let inv_inertia = inverse_inertia_local(&chassis);

        let mut linear = Vec3::ZERO;
        let mut angular = Vec3::ZERO;
        self.num_wheels_on_ground = 0;

        for wheel in &mut self.wheels {
            let options = &wheel.options;
            let origin = chassis.position + rotation * options.chassis_connection_point_local;
            let direction = rotation * options.direction_local;
            let ray_length = options.suspension_rest_length + options.radius;

            let hit = world.raycast_closest(
                origin,
                origin + direction * ray_length,
                self.ray_mask,
                Some(self.chassis),
            );

            if !hit.has_hit {
                wheel.in_contact = false;
                wheel.suspension_force = 0.0;
                wheel.ground_body = None;
                wheel.suspension_length = options.suspension_rest_length;
                wheel.world_position = origin + direction * wheel.suspension_length;
                continue;
            }

            self.num_wheels_on_ground += 1;
            wheel.in_contact = true;
            wheel.contact_point = hit.hit_point;
            wheel.contact_normal = hit.hit_normal;
            wheel.ground_body = hit.body;

            let min_length = options.suspension_rest_length - options.max_suspension_travel;
            let max_length = options.suspension_rest_length + options.max_suspension_travel;
            wheel.suspension_length = (hit.distance - options.radius).clamp(min_length, max_length);
            wheel.world_position = origin + direction * wheel.suspension_length;

            // Suspension
            let denominator = hit.hit_normal.dot(direction);
            let rel_pos = hit.hit_point - chassis.position;
            let point_velocity = chassis.velocity + chassis.angular_velocity.cross(rel_pos);

            let (relative_velocity, clipped_inv) = if denominator >= -0.1 {
                (0.0, 10.0)
            } else {
                let inv = -1.0 / denominator;
                (hit.hit_normal.dot(point_velocity) * inv, inv)
            };

            let compression = options.suspension_rest_length - wheel.suspension_length;
            let mut force = options.suspension_stiffness * compression * clipped_inv;
            let damping = if relative_velocity < 0.0 {
                options.damping_compression
            } else {
                options.damping_relaxation
            };
            force -= damping * relative_velocity;
            wheel.suspension_force = (force * chassis.mass).clamp(0.0, options.max_suspension_force);

            let impulse = hit.hit_normal * wheel.suspension_force * dt;
            linear += impulse;
            angular += rel_pos.cross(impulse);

            // Wheel frame on the contact plane
            let steer = Quat::from_axis_angle(up, wheel.steering);
            let axle = steer * rotation * options.axle_local;
            let axle = (axle - hit.hit_normal * axle.dot(hit.hit_normal)).normalize_or_zero();
            let forward = hit.hit_normal.cross(axle).normalize_or_zero();

            // Engine and brake along the wheel, sideways grip across it
            let forward_speed = point_velocity.dot(forward);
            let mut forward_impulse = -wheel.engine_force * dt;
            if wheel.brake > 0.0 && forward_speed.abs() > 1e-4 {
                let needed = forward_speed.abs() * chassis.mass / 4.0;
                forward_impulse -= forward_speed.signum() * needed.min(wheel.brake * dt);
            }

            let side_speed = point_velocity.dot(axle);
            let mut side_impulse = -side_speed * chassis.mass / 4.0;

            // Friction circle: past the grip limit both impulses are scaled down
            let max_impulse = options.friction_slip * wheel.suspension_force * dt;
            let combined = ((forward_impulse * 0.5).powi(2) + side_impulse.powi(2)).sqrt();
            if combined > max_impulse && combined > 0.0 {
                let skid = max_impulse / combined;
                forward_impulse *= skid;
                side_impulse *= skid;
            }

            let drive = forward * forward_impulse;
            linear += drive;
            angular += rel_pos.cross(drive);

            let side = axle * side_impulse;
            linear += side;
            let roll_pos = rel_pos - up * rel_pos.dot(up) * (1.0 - options.roll_influence);
            angular += roll_pos.cross(side);
        }

        let body = world.try_body_mut(self.chassis)?;
        body.velocity += linear / body.mass;
        let local_torque = rotation.inverse() * angular;
        body.angular_velocity += rotation * (inv_inertia * local_torque);

        Ok(())
    }

    /// Speed along the chassis forward axis.
    pub fn forward_speed(&self, world: &PhysicsWorld) -> f32 {
        world
            .body(self.chassis)
            .map(|b| b.velocity.dot(b.quaternion * Vec3::Z))
            .unwrap_or(0.0)
    }
}

/// Diagonal inverse inertia from the first cuboid collider, or a unit box.
fn inverse_inertia_local(body: &RigidBody) -> Vec3 {
    let half = body
        .colliders
        .iter()
        .find_map(|c| match c.shape {
            ColliderShape::Cuboid { half_extents } => Some(half_extents),
            ColliderShape::Ball { .. } => None,
        })
        .unwrap_or(Vec3::splat(0.5));

    let (x2, y2, z2) = (half.x * half.x, half.y * half.y, half.z * half.z);
    let inertia = Vec3::new(y2 + z2, x2 + z2, x2 + y2) * (body.mass / 3.0);
    Vec3::ONE / inertia.max(Vec3::splat(1e-4))
}

// ============================================================================
// Tests
// ============================================================================
