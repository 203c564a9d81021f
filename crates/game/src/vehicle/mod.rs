//! Vehicles: chassis, wheels, seats and controls.
//!
//! A vehicle is assembled from authored objects: `data = seat` objects become
//! [`VehicleSeat`]s, `data = wheel` objects become raycast wheels and
//! `data = collision` objects become chassis colliders.
//!
//! Vehicles never reach into characters. Anything that has to change the
//! driver (being thrown out, shuffling seats) comes back as a
//! [`VehicleRequest`] for the world to apply.

pub mod car;
pub mod door;
pub mod seat;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use roadside_physics::{
    BodyHandle, ColliderShape, PhysicsWorld, RaycastVehicle, RigidBody, WheelOptions,
};

use crate::arena::CharacterId;
use crate::error::GameError;
use crate::events::{car_controls, UiEvent};
use crate::input::ActionMap;
use crate::metadata::AuthoredObject;

pub use car::{CarConfig, CarController};
pub use door::{DoorConfig, VehicleDoor};
pub use seat::{EntryPoint, SeatType, VehicleSeat};

/// Chassis mass shared by every vehicle.
pub const CHASSIS_MASS: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Airplane,
}

/// Which wheels the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriveMode {
    #[default]
    All,
    Front,
    Rear,
}

/// Drive tag on a single wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelDrive {
    Front,
    Rear,
}

impl WheelDrive {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fwd" => Some(Self::Front),
            "rwd" => Some(Self::Rear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wheel {
    pub name: String,
    /// Position relative to the chassis.
    pub position: Vec3,
    pub steering: bool,
    pub drive: Option<WheelDrive>,
    /// Index into the raycast vehicle's wheels.
    pub index: usize,
}

/// The raycast vehicle together with the gameplay view of its wheels.
#[derive(Debug, Clone)]
pub struct Drivetrain {
    pub raycast: RaycastVehicle,
    pub wheels: Vec<Wheel>,
    pub drive: DriveMode,
}

impl Drivetrain {
    pub fn set_steering_value(&mut self, value: f32) -> Result<(), GameError> {
        for wheel in self.wheels.iter().filter(|w| w.steering) {
            self.raycast.set_steering_value(value, wheel.index)?;
        }
        Ok(())
    }

    pub fn apply_engine_force(&mut self, force: f32) -> Result<(), GameError> {
        for wheel in &self.wheels {
            let driven = match self.drive {
                DriveMode::All => true,
                DriveMode::Front => wheel.drive == Some(WheelDrive::Front),
                DriveMode::Rear => wheel.drive == Some(WheelDrive::Rear),
            };
            if driven {
                self.raycast.apply_engine_force(force, wheel.index)?;
            }
        }
        Ok(())
    }

    /// Brake every wheel whose drive tag matches `filter`, or all wheels.
    pub fn set_brake(&mut self, force: f32, filter: Option<WheelDrive>) -> Result<(), GameError> {
        for wheel in &self.wheels {
            if filter.is_none() || filter == wheel.drive {
                self.raycast.set_brake(force, wheel.index)?;
            }
        }
        Ok(())
    }
}

/// Per-type behaviour.
#[derive(Debug, Clone)]
pub enum VehicleKind {
    Car(CarController),
    /// Selects the airplane entry and exit choreography; it does not fly.
    Airplane,
}

/// A change the vehicle wants applied to its occupants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleRequest {
    ForceCharacterOut(CharacterId),
    SwitchSeats {
        character: CharacterId,
        from: usize,
        to: usize,
    },
}

/// What to build a vehicle from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleDescription {
    pub name: String,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub drive: DriveMode,
    pub objects: Vec<AuthoredObject>,
}

impl VehicleDescription {
    /// Two-seat car: driver on the left, passenger on the right,
    /// one door and one entry point per side.
    pub fn sedan() -> Self {
        let half_pi = std::f32::consts::FRAC_PI_2;
        let mut objects = vec![
            AuthoredObject::new("body", Vec3::ZERO)
                .with_scale(Vec3::new(0.9, 0.3, 2.0))
                .with_data("data", "collision")
                .with_data("shape", "box"),
            AuthoredObject::new("seat_driver", Vec3::new(0.4, -0.1, 0.0))
                .with_data("data", "seat")
                .with_data("seat_type", "driver")
                .with_data("entry_points", "entry_driver")
                .with_data("door_object", "door_driver")
                .with_data("connected_seats", "seat_passenger"),
            AuthoredObject::new("seat_passenger", Vec3::new(-0.4, -0.1, 0.0))
                .with_data("data", "seat")
                .with_data("seat_type", "passenger")
                .with_data("entry_points", "entry_passenger")
                .with_data("door_object", "door_passenger")
                .with_data("connected_seats", "seat_driver"),
            // Entry points face the car
            AuthoredObject::new("entry_driver", Vec3::new(1.4, -0.35, 0.3))
                .with_rotation(Quat::from_rotation_y(-half_pi)),
            AuthoredObject::new("entry_passenger", Vec3::new(-1.4, -0.35, 0.3))
                .with_rotation(Quat::from_rotation_y(half_pi)),
            AuthoredObject::new("door_driver", Vec3::new(0.9, 0.1, 0.7)),
            AuthoredObject::new("door_passenger", Vec3::new(-0.9, 0.1, 0.7)),
        ];

        for (name, x, z, steering, drive) in [
            ("wheel_fl", 0.8, 1.3, "true", "fwd"),
            ("wheel_fr", -0.8, 1.3, "true", "fwd"),
            ("wheel_rl", 0.8, -1.3, "false", "rwd"),
            ("wheel_rr", -0.8, -1.3, "false", "rwd"),
        ] {
            objects.push(
                AuthoredObject::new(name, Vec3::new(x, -0.3, z))
                    .with_data("data", "wheel")
                    .with_data("steering", steering)
                    .with_data("drive", drive),
            );
        }

        Self {
            name: "sedan".to_string(),
            vehicle_type: VehicleType::Car,
            drive: DriveMode::All,
            objects,
        }
    }

    /// The sedan layout flagged as an airplane.
    pub fn airplane() -> Self {
        Self {
            name: "airplane".to_string(),
            vehicle_type: VehicleType::Airplane,
            ..Self::sedan()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub name: String,
    pub kind: VehicleKind,
    pub drivetrain: Drivetrain,
    pub seats: Vec<VehicleSeat>,
    pub actions: ActionMap,
    pub controlling_character: Option<CharacterId>,
    pub first_person: bool,
    /// Interpolated chassis transform, refreshed every frame.
    pub position: Vec3,
    pub quaternion: Quat,
    pub spawn_position: Vec3,
    pub spawn_rotation: Quat,
}

impl Vehicle {
    /// Build a vehicle and add its chassis to `physics`.
    pub fn new(
        description: &VehicleDescription,
        physics: &mut PhysicsWorld,
        position: Vec3,
        rotation: Quat,
    ) -> Result<Self, GameError> {
        let mut chassis = RigidBody::new(CHASSIS_MASS, position).with_rotation(rotation);
        let mut seats = Vec::new();
        let mut wheels = Vec::new();

        for object in &description.objects {
            match object.get("data") {
                Some("seat") => {
                    if object.name.is_empty() {
                        return Err(GameError::InvalidMetadata {
                            object: format!("seat in {}", description.name),
                            key: "name",
                        });
                    }
                    seats.push(VehicleSeat::from_object(object, &description.objects));
                }
                Some("wheel") => {
                    if object.name.is_empty() {
                        return Err(GameError::InvalidMetadata {
                            object: format!("wheel in {}", description.name),
                            key: "name",
                        });
                    }
                    wheels.push(Wheel {
                        name: object.name.clone(),
                        position: object.position,
                        steering: object.get("steering") == Some("true"),
                        drive: object.get("drive").and_then(WheelDrive::parse),
                        index: 0,
                    });
                }
                Some("collision") => match object.get("shape") {
                    Some("box") => {
                        chassis = chassis.with_collider(
                            ColliderShape::Cuboid {
                                half_extents: object.scale,
                            },
                            object.position,
                        );
                    }
                    Some("sphere") => {
                        chassis = chassis.with_collider(
                            ColliderShape::Ball {
                                radius: object.scale.x,
                            },
                            object.position,
                        );
                    }
                    other => log::warn!("collision object `{}` has unknown shape {:?}", object.name, other),
                },
                _ => {}
            }
        }

        if chassis.colliders.is_empty() {
            log::warn!("vehicle `{}` has no collision data", description.name);
        }
        if seats.is_empty() {
            log::warn!("vehicle `{}` has no seats", description.name);
        } else {
            seat::connect_seats(&mut seats);
        }

        let handle = physics.add_body(chassis);
        let mut raycast = RaycastVehicle::new(handle);
        for wheel in &mut wheels {
            wheel.index = raycast.add_wheel(WheelOptions::default().at_wheel(wheel.position));
        }

        let (kind, actions) = match description.vehicle_type {
            VehicleType::Car => (
                VehicleKind::Car(CarController::with_default_config()),
                CarController::actions(),
            ),
            VehicleType::Airplane => (
                VehicleKind::Airplane,
                ActionMap::new()
                    .with("exitVehicle", &["KeyF"])
                    .with("seat_switch", &["KeyX"])
                    .with("view", &["KeyV"]),
            ),
        };

        log::debug!(
            "vehicle `{}` built: {} seats, {} wheels",
            description.name,
            seats.len(),
            wheels.len()
        );

        Ok(Self {
            name: description.name.clone(),
            kind,
            drivetrain: Drivetrain {
                raycast,
                wheels,
                drive: description.drive,
            },
            seats,
            actions,
            controlling_character: None,
            first_person: false,
            position,
            quaternion: rotation,
            spawn_position: position,
            spawn_rotation: rotation,
        })
    }

    #[inline]
    pub fn chassis(&self) -> BodyHandle {
        self.drivetrain.raycast.chassis
    }

    pub fn vehicle_type(&self) -> VehicleType {
        match self.kind {
            VehicleKind::Car(_) => VehicleType::Car,
            VehicleKind::Airplane => VehicleType::Airplane,
        }
    }

    pub fn is_airplane(&self) -> bool {
        self.vehicle_type() == VehicleType::Airplane
    }

    pub fn no_direction_pressed(&self) -> bool {
        match &self.kind {
            VehicleKind::Car(_) => CarController::no_direction_pressed(&self.actions),
            VehicleKind::Airplane => true,
        }
    }

    // ========================================================================
    // Frames
    // ========================================================================

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.quaternion * local
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.quaternion.inverse() * (world - self.position)
    }

    pub fn forward(&self) -> Vec3 {
        self.quaternion * Vec3::Z
    }

    pub fn seat(&self, index: usize) -> Option<&VehicleSeat> {
        self.seats.get(index)
    }

    pub fn seat_mut(&mut self, index: usize) -> Option<&mut VehicleSeat> {
        self.seats.get_mut(index)
    }

    pub fn seat_of(&self, character: CharacterId) -> Option<usize> {
        self.seats.iter().position(|s| s.occupied_by == Some(character))
    }

    /// First seat connected to `from` that `character` can move into.
    pub fn free_connected_seat(&self, from: usize, character: CharacterId, driver_only: bool) -> Option<usize> {
        self.seats.get(from)?.connected.iter().copied().find(|&i| {
            self.seats
                .get(i)
                .is_some_and(|s| s.is_free_for(character) && (!driver_only || s.is_driver()))
        })
    }

    pub fn chassis_velocity(&self, physics: &PhysicsWorld) -> Vec3 {
        physics.body(self.chassis()).map(|b| b.velocity).unwrap_or(Vec3::ZERO)
    }

    pub fn allow_sleep(&self, physics: &mut PhysicsWorld, value: bool) {
        if let Some(body) = physics.body_mut(self.chassis()) {
            body.allow_sleep = value;
        }
    }

    /// Teleport the chassis and clear its motion.
    pub fn reset_to(&mut self, physics: &mut PhysicsWorld, position: Vec3) -> Result<(), GameError> {
        let body = physics.try_body_mut(self.chassis())?;
        body.set_position(position);
        body.set_rotation(body.init_quaternion);
        body.velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;
        self.position = position;
        self.quaternion = body.init_quaternion;
        Ok(())
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn trigger_action(&mut self, name: &str, pressed: bool) -> Result<Vec<VehicleRequest>, GameError> {
        if !self.actions.begin_trigger(name, pressed) {
            return Ok(Vec::new());
        }
        let requests = self.on_input_change();
        self.actions.end_trigger(name);
        requests
    }

    /// Route a raw input code to every action bound to it.
    pub fn handle_input(&mut self, code: &str, pressed: bool) -> Result<Vec<VehicleRequest>, GameError> {
        let mut requests = Vec::new();
        for name in self.actions.actions_for_code(code) {
            requests.extend(self.trigger_action(&name, pressed)?);
        }
        Ok(requests)
    }

    pub fn reset_controls(&mut self) -> Result<Vec<VehicleRequest>, GameError> {
        let names: Vec<String> = self.actions.names().map(str::to_string).collect();
        let mut requests = Vec::new();
        for name in names {
            requests.extend(self.trigger_action(&name, false)?);
        }
        Ok(requests)
    }

    pub fn on_input_change(&mut self) -> Result<Vec<VehicleRequest>, GameError> {
        let mut requests = Vec::new();

        if self.actions.just_pressed("seat_switch") {
            if let Some(character) = self.controlling_character {
                let seat = self
                    .seat_of(character)
                    .and_then(|i| self.free_connected_seat(i, character, false).map(|to| (i, to)));
                if let Some((from, to)) = seat {
                    requests.push(VehicleRequest::SwitchSeats { character, from, to });
                }
            }
        }

        if self.actions.just_pressed("view") {
            self.first_person = !self.first_person;
        }

        match &mut self.kind {
            VehicleKind::Car(car) => car.on_input_change(&mut self.actions, &mut self.drivetrain)?,
            VehicleKind::Airplane => {
                if self.actions.just_pressed("exitVehicle") {
                    if let Some(character) = self.controlling_character {
                        requests.push(VehicleRequest::ForceCharacterOut(character));
                    }
                }
            }
        }

        Ok(requests)
    }

    /// Called when a character takes the controls.
    pub fn input_receiver_init(&mut self, physics: &mut PhysicsWorld) -> Option<UiEvent> {
        self.allow_sleep(physics, false);
        self.first_person = false;
        match self.kind {
            VehicleKind::Car(_) => Some(car_controls()),
            VehicleKind::Airplane => None,
        }
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Per-frame update.
    ///
    /// `driver_can_leave` is whether the controlling character's state lets
    /// it leave, or `None` without a driver.
    pub fn update(
        &mut self,
        dt: f32,
        physics: &mut PhysicsWorld,
        driver_can_leave: Option<bool>,
    ) -> Result<Vec<VehicleRequest>, GameError> {
        let body = physics.try_body_mut(self.chassis())?;
        self.position = body.interpolated_position;
        self.quaternion = body.interpolated_quaternion;

        for seat in &mut self.seats {
            seat.update(dt);
        }

        let mut requests = Vec::new();
        if let VehicleKind::Car(car) = &mut self.kind {
            let force_out = car.update(dt, &mut self.drivetrain, &mut self.actions, body, driver_can_leave)?;
            if force_out {
                if let Some(character) = self.controlling_character {
                    requests.push(VehicleRequest::ForceCharacterOut(character));
                }
            }
        }

        Ok(requests)
    }

    /// Runs before every physics integration step.
    pub fn physics_pre_step(&mut self, physics: &mut PhysicsWorld) -> Result<(), GameError> {
        let body = physics.try_body_mut(self.chassis())?;

        if let VehicleKind::Car(car) = &mut self.kind {
            car.pre_step(&self.actions, body);
        }
        for door in self.seats.iter_mut().filter_map(|s| s.door.as_mut()) {
            door.pre_step(body);
        }

        self.drivetrain.raycast.update(physics)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
