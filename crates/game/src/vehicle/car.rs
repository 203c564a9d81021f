//! Car handling on top of the raycast vehicle.
//!
//! # Transmission
//!
//! Each gear has a top speed. The engine pushes with `engine_force / gear`
//! scaled by how far the car is from that top speed; close to it the box
//! shifts up, well below the previous gear's top speed it shifts down. Every
//! shift cuts power for `time_to_shift`.
//!
//! ```text
//! gear     R    0    1    2    3    4    5
//! top    -4    0    5    9   13   17   22   (m/s)
//! ```
//!
//! # Air control
//!
//! While airborne, steering keys roll the car and throttle/reverse pitch it,
//! up to a bounded spin rate. A car lying on its roof gets extra roll help.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use roadside_physics::math::signed_angle_y;
use roadside_physics::{RigidBody, ScalarSpring};

use crate::error::GameError;
use crate::input::ActionMap;
use crate::vehicle::{Drivetrain, WheelDrive};

/// Car tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarConfig {
    // ========================================================================
    // Engine
    // ========================================================================
    pub engine_force: f32,
    /// Top speed of each forward gear, starting with neutral.
    pub gear_max_speeds: Vec<f32>,
    pub reverse_max_speed: f32,
    /// Seconds without power while shifting.
    pub time_to_shift: f32,
    /// Shift up when the power factor drops below this.
    pub shift_up_factor: f32,
    /// Shift down when the power factor rises above this.
    pub shift_down_factor: f32,

    // ========================================================================
    // Steering and brakes
    // ========================================================================
    pub max_steer: f32,
    pub brake_force: f32,

    // ========================================================================
    // Air control
    // ========================================================================
    pub air_spin_acceleration: f32,
    pub max_air_spin: f32,

    // ========================================================================
    // Leaving
    // ========================================================================
    /// Speed range in which the car brakes instead of letting the driver jump out.
    pub exit_brake_speed: (f32, f32),
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            engine_force: 500.0,
            gear_max_speeds: vec![0.0, 5.0, 9.0, 13.0, 17.0, 22.0],
            reverse_max_speed: -4.0,
            time_to_shift: 0.2,
            shift_up_factor: 0.1,
            shift_down_factor: 1.2,
            max_steer: 0.8,
            brake_force: 1_000_000.0,
            air_spin_acceleration: 0.15,
            max_air_spin: 2.0,
            exit_brake_speed: (0.1, 4.0),
        }
    }
}

impl CarConfig {
    fn max_gear(&self) -> usize {
        self.gear_max_speeds.len().saturating_sub(1)
    }
}

/// Per-car driving state.
#[derive(Debug, Clone)]
pub struct CarController {
    pub config: CarConfig,
    /// Speed along the chassis forward axis, refreshed every physics step.
    pub speed: f32,
    pub gear: usize,
    shift_timer: f32,
    air_spin_timer: f32,
    can_tilt_forwards: bool,
    pub steering: ScalarSpring,
    pub character_wants_to_exit: bool,
}

impl CarController {
    pub fn new(config: CarConfig) -> Self {
        Self {
            config,
            speed: 0.0,
            gear: 1,
            shift_timer: 0.0,
            air_spin_timer: 0.0,
            can_tilt_forwards: false,
            steering: ScalarSpring::new(60.0, 10.0, 0.6),
            character_wants_to_exit: false,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(CarConfig::default())
    }

    pub fn actions() -> ActionMap {
        ActionMap::new()
            .with("throttle", &["KeyW"])
            .with("reverse", &["KeyS"])
            .with("brake", &["Space"])
            .with("left", &["KeyA"])
            .with("right", &["KeyD"])
            .with("exitVehicle", &["KeyF"])
            .with("seat_switch", &["KeyX"])
            .with("view", &["KeyV"])
    }

    pub fn no_direction_pressed(actions: &ActionMap) -> bool {
        !actions.is_pressed("throttle")
            && !actions.is_pressed("reverse")
            && !actions.is_pressed("left")
            && !actions.is_pressed("right")
    }

    /// Per-frame driving logic.
    ///
    /// `driver_can_leave` is the controlling character's permission to leave,
    /// or `None` without a driver. Returns `true` when the driver should be
    /// thrown out now.
    pub fn update(
        &mut self,
        dt: f32,
        drivetrain: &mut Drivetrain,
        actions: &mut ActionMap,
        chassis: &mut RigidBody,
        driver_can_leave: Option<bool>,
    ) -> Result<bool, GameError> {
        if drivetrain.raycast.num_wheels_on_ground == 0 {
            self.air_spin_timer += dt;
            if !actions.is_pressed("throttle") {
                self.can_tilt_forwards = true;
            }
        } else {
            self.can_tilt_forwards = false;
            self.air_spin_timer = 0.0;
        }

        self.update_transmission(dt, drivetrain, actions)?;

        self.steering.simulate(dt);
        drivetrain.set_steering_value(self.steering.position)?;

        // Stuck on its side or roof: stand it back up
        if drivetrain.raycast.num_wheels_on_ground < 3 && chassis.velocity.length() < 0.5 {
            chassis.quaternion = chassis.init_quaternion;
        }

        if self.character_wants_to_exit && driver_can_leave == Some(true) {
            let speed = chassis.velocity.length();
            let (low, high) = self.config.exit_brake_speed;
            if speed > low && speed < high {
                if actions.begin_trigger("brake", true) {
                    self.on_input_change(actions, drivetrain)?;
                    actions.end_trigger("brake");
                }
            } else {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn update_transmission(
        &mut self,
        dt: f32,
        drivetrain: &mut Drivetrain,
        actions: &ActionMap,
    ) -> Result<(), GameError> {
        if self.shift_timer > 0.0 {
            self.shift_timer = (self.shift_timer - dt).max(0.0);
            return Ok(());
        }

        let config = &self.config;
        let gear = self.gear as f32;

        if actions.is_pressed("reverse") {
            let power_factor = (config.reverse_max_speed - self.speed) / config.reverse_max_speed.abs();
            let force = (config.engine_force / gear) * power_factor.abs();
            drivetrain.apply_engine_force(force)?;
            return Ok(());
        }

        let top = config.gear_max_speeds[self.gear];
        let previous_top = config.gear_max_speeds[self.gear - 1];
        let power_factor = (top - self.speed) / (top - previous_top);

        if power_factor < config.shift_up_factor && self.gear < config.max_gear() {
            self.shift(1, drivetrain)?;
        } else if self.gear > 1 && power_factor > config.shift_down_factor {
            self.shift(-1, drivetrain)?;
        } else if actions.is_pressed("throttle") {
            let force = (config.engine_force / gear) * power_factor;
            drivetrain.apply_engine_force(-force)?;
        }

        Ok(())
    }

    fn shift(&mut self, direction: i32, drivetrain: &mut Drivetrain) -> Result<(), GameError> {
        self.gear = (self.gear as i32 + direction) as usize;
        self.shift_timer = self.config.time_to_shift;
        log::debug!("shift to gear {} at {:.1} m/s", self.gear, self.speed);
        drivetrain.apply_engine_force(0.0)
    }

    /// Physics-step logic: speed, air control and the steering target.
    pub fn pre_step(&mut self, actions: &ActionMap, chassis: &mut RigidBody) {
        let rotation = chassis.quaternion;
        let forward = rotation * Vec3::Z;
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;

        self.speed = chassis.velocity.dot(forward);

        let air_spin_influence = (self.air_spin_timer / 2.0).clamp(0.0, 1.0) * self.speed.clamp(0.0, 1.0);
        let flip_speed_factor = (1.0 - self.speed).clamp(0.0, 1.0);
        let up_factor = up.dot(Vec3::NEG_Y) / 2.0 + 0.5;
        let flip_over_influence = flip_speed_factor * up_factor * 3.0;

        let acceleration = self.config.air_spin_acceleration;
        let max_spin = self.config.max_air_spin;
        let roll = forward * acceleration * (air_spin_influence + flip_over_influence);
        let pitch = right * acceleration * air_spin_influence;

        let pressed = |name: &str| actions.is_pressed(name);
        let angular = &mut chassis.angular_velocity;

        if pressed("right") && !pressed("left") {
            if angular.dot(forward) < max_spin {
                *angular += roll;
            }
        } else if pressed("left") && !pressed("right") && angular.dot(forward) > -max_spin {
            *angular -= roll;
        }

        if self.can_tilt_forwards && pressed("throttle") && !pressed("reverse") {
            if angular.dot(right) < max_spin {
                *angular += pitch;
            }
        } else if pressed("reverse") && !pressed("throttle") && angular.dot(right) > -max_spin {
            *angular -= pitch;
        }

        // Countersteer into a slide
        let drift_correction = signed_angle_y(chassis.velocity.normalize_or_zero(), forward);
        let max_steer = self.config.max_steer;
        let speed_factor = (self.speed * 0.3).max(1.0);

        self.steering.target = if pressed("right") {
            (-max_steer / speed_factor).min(-drift_correction).clamp(-max_steer, max_steer)
        } else if pressed("left") {
            (max_steer / speed_factor).max(-drift_correction).clamp(-max_steer, max_steer)
        } else {
            0.0
        };
    }

    /// React to edges on the car's own actions.
    pub fn on_input_change(
        &mut self,
        actions: &mut ActionMap,
        drivetrain: &mut Drivetrain,
    ) -> Result<(), GameError> {
        if actions.just_pressed("exitVehicle") {
            self.character_wants_to_exit = true;
        }
        if actions.just_released("exitVehicle") {
            self.character_wants_to_exit = false;
            if actions.begin_trigger("brake", false) {
                self.on_input_change(actions, drivetrain)?;
                actions.end_trigger("brake");
            }
        }
        if actions.just_released("throttle") || actions.just_released("reverse") {
            drivetrain.apply_engine_force(0.0)?;
        }
        if actions.just_pressed("brake") {
            drivetrain.set_brake(self.config.brake_force, Some(WheelDrive::Rear))?;
        }
        if actions.just_released("brake") {
            drivetrain.set_brake(0.0, Some(WheelDrive::Rear))?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
