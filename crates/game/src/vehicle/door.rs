//! Vehicle doors.
//!
//! A door runs in one of two modes:
//!
//! - **Eased**: after [`VehicleDoor::open`] / [`VehicleDoor::close`] the door
//!   swings toward its target at a fixed rate. This is what characters use.
//! - **Reactive**: when physics is enabled the door swings with the chassis.
//!   It is modelled as a trailer point one unit behind the hinge that gets
//!   dragged by the change in chassis velocity. A fast slam shut latches the
//!   door closed.
//!
//! `rotation` is normalised: 0 is closed, 1 is fully open.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use roadside_physics::math::{detect_relative_side, rotate_about, signed_angle};
use roadside_physics::{RigidBody, Side};

/// Door tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorConfig {
    /// Eased swing rate (rotation units per second).
    pub rotation_speed: f32,

    /// Gain from trailer drag angle to door velocity.
    pub drag_gain: f32,

    /// Closing speed past which hitting the frame latches the door.
    pub latch_speed: f32,

    /// Velocity kept per reactive step.
    pub friction: f32,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 5.0,
            drag_gain: 0.05,
            latch_speed: 0.08,
            friction: 0.98,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleDoor {
    pub config: DoorConfig,
    /// Hinge position relative to the vehicle.
    pub hinge_position: Vec3,
    pub rotation: f32,
    pub target_rotation: f32,
    pub achieving_target_rotation: bool,
    pub physics_enabled: bool,
    pub door_velocity: f32,
    last_vehicle_velocity: Vec3,
    /// -1 for a door on the seat's left, +1 on its right.
    pub side_multiplier: f32,
}

impl VehicleDoor {
    pub fn new(seat_position: Vec3, seat_rotation: Quat, hinge_position: Vec3) -> Self {
        let side_multiplier = match detect_relative_side(seat_position, seat_rotation, hinge_position) {
            Side::Left => -1.0,
            Side::Right => 1.0,
        };

        Self {
            config: DoorConfig::default(),
            hinge_position,
            rotation: 0.0,
            target_rotation: 0.0,
            achieving_target_rotation: false,
            physics_enabled: false,
            door_velocity: 0.0,
            last_vehicle_velocity: Vec3::ZERO,
            side_multiplier,
        }
    }

    pub fn open(&mut self) {
        self.achieving_target_rotation = true;
        self.target_rotation = 1.0;
    }

    pub fn close(&mut self) {
        self.achieving_target_rotation = true;
        self.target_rotation = 0.0;
    }

    /// Advance an eased swing.
    ///
    /// Arriving open hands the door over to physics; arriving closed takes it away.
    pub fn update(&mut self, dt: f32) {
        if !self.achieving_target_rotation {
            return;
        }

        let step = dt * self.config.rotation_speed;
        if self.rotation < self.target_rotation {
            self.rotation += step;
            if self.rotation > self.target_rotation {
                self.rotation = self.target_rotation;
                self.achieving_target_rotation = false;
                self.physics_enabled = true;
            }
        } else if self.rotation > self.target_rotation {
            self.rotation -= step;
            if self.rotation < self.target_rotation {
                self.rotation = self.target_rotation;
                self.achieving_target_rotation = false;
                self.physics_enabled = false;
            }
        }
    }

    /// Reactive swing for one physics step.
    pub fn pre_step(&mut self, chassis: &RigidBody) {
        if !self.physics_enabled || self.achieving_target_rotation {
            return;
        }

        let rotation = chassis.quaternion;
        let door_position = chassis.position + rotation * self.hinge_position;
        let velocity_diff = chassis.velocity - self.last_vehicle_velocity;
        self.last_vehicle_velocity = chassis.velocity;

        let back = rotation * Vec3::NEG_Z;
        let up = rotation * Vec3::Y;
        let trailer = rotate_about(back, up, self.side_multiplier * self.rotation) + door_position;
        let pushed = trailer - velocity_diff;

        let v1 = (trailer - door_position).normalize_or_zero();
        let v2 = (pushed - door_position).normalize_or_zero();
        let angle = signed_angle(v1, v2, up);

        self.door_velocity += self.side_multiplier * angle * self.config.drag_gain;
        self.rotation += self.door_velocity;

        if self.rotation < 0.0 {
            self.rotation = 0.0;
            if self.door_velocity < -self.config.latch_speed {
                self.close();
                self.door_velocity = 0.0;
            } else {
                self.door_velocity = -self.door_velocity / 2.0;
            }
        }

        if self.rotation > 1.0 {
            self.rotation = 1.0;
            self.door_velocity = -self.door_velocity / 2.0;
        }

        self.door_velocity *= self.config.friction;
    }

    /// Door rotation relative to its hinge.
    pub fn local_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.side_multiplier * self.rotation)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn right_door() -> VehicleDoor {
        // Seat faces +Z, so its left is +X; a hinge at -X is on its right.
        VehicleDoor::new(Vec3::ZERO, Quat::IDENTITY, Vec3::new(-0.8, 0.0, 0.5))
    }

    #[test]
    fn test_side_multiplier() {
        assert_eq!(right_door().side_multiplier, 1.0);
        let left = VehicleDoor::new(Vec3::ZERO, Quat::IDENTITY, Vec3::new(0.8, 0.0, 0.5));
        assert_eq!(left.side_multiplier, -1.0);
    }

    #[test]
    fn test_eased_open_enables_physics() {
        let mut door = right_door();
        door.open();

        for _ in 0..30 {
            door.update(1.0 / 60.0);
        }

        assert_eq!(door.rotation, 1.0);
        assert!(!door.achieving_target_rotation);
        assert!(door.physics_enabled, "An opened door swings freely");

        door.close();
        for _ in 0..30 {
            door.update(1.0 / 60.0);
        }
        assert_eq!(door.rotation, 0.0);
        assert!(!door.physics_enabled, "A closed door is latched");
    }

    #[test]
    fn test_reactive_ignored_while_easing() {
        let mut door = right_door();
        door.rotation = 0.5;
        door.physics_enabled = true;
        door.open();

        let mut chassis = RigidBody::new(50.0, Vec3::ZERO);
        chassis.velocity = Vec3::new(0.0, 0.0, 5.0);
        door.pre_step(&chassis);

        assert_eq!(door.rotation, 0.5);
        assert_eq!(door.door_velocity, 0.0);
    }

    #[test]
    fn test_reactive_bounded_and_converging() {
        let mut door = right_door();
        door.rotation = 0.5;
        door.physics_enabled = true;

        let mut chassis = RigidBody::new(50.0, Vec3::ZERO);
        let mut max_abs_velocity: f32 = 0.0;

        // Accelerate forward, then cruise
        for step in 0..600 {
            if step < 60 {
                chassis.velocity.z += 0.2;
            }
            door.pre_step(&chassis);
            assert!(
                (0.0..=1.0).contains(&door.rotation),
                "rotation left [0, 1] at step {}: {}",
                step,
                door.rotation
            );
            max_abs_velocity = max_abs_velocity.max(door.door_velocity.abs());
        }

        assert!(max_abs_velocity > 0.0, "Acceleration should move the door");
        assert!(
            door.door_velocity.abs() < 1e-3 || door.achieving_target_rotation,
            "Door should settle once the chassis cruises, velocity={}",
            door.door_velocity
        );
    }

    #[test]
    fn test_slam_latches_closed() {
        let mut door = right_door();
        door.rotation = 0.05;
        door.physics_enabled = true;
        door.door_velocity = -0.2;

        let chassis = RigidBody::new(50.0, Vec3::ZERO);
        door.pre_step(&chassis);

        assert_eq!(door.rotation, 0.0);
        assert_eq!(door.door_velocity, 0.0);
        assert!(door.achieving_target_rotation);
        assert_eq!(door.target_rotation, 0.0);
    }

    #[test]
    fn test_gentle_hit_bounces() {
        let mut door = right_door();
        door.rotation = 0.01;
        door.physics_enabled = true;
        door.door_velocity = -0.05;

        let chassis = RigidBody::new(50.0, Vec3::ZERO);
        door.pre_step(&chassis);

        assert_eq!(door.rotation, 0.0);
        assert!(door.door_velocity > 0.0, "Door should bounce back open");
        assert!((door.door_velocity - 0.025 * 0.98).abs() < 1e-6);
    }
}
