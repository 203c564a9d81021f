//! Seats and vehicle control.

use glam::Vec3;

use super::{Character, Transition};
use crate::arena::{SeatHandle, VehicleId};
use crate::error::GameError;
use crate::events::on_foot_controls;
use crate::scene::Scene;
use crate::vehicle::VehicleRequest;

impl Character {
    /// Take a seat. Refused while another character sits in it.
    pub(crate) fn occupy_seat(&mut self, handle: SeatHandle, scene: &mut Scene) -> Result<(), GameError> {
        let seat = scene.seat_mut(handle)?;
        if let Some(other) = seat.occupied_by.filter(|&c| c != self.id) {
            log::warn!("character {:?} refused seat `{}`: taken by {:?}", self.id, seat.name, other);
            return Err(GameError::SeatOccupied {
                vehicle: handle.vehicle,
                seat: handle.seat,
                by: other,
            });
        }
        seat.occupied_by = Some(self.id);
        self.occupying_seat = Some(handle);
        Ok(())
    }

    pub(crate) fn leave_seat(&mut self, scene: &mut Scene) {
        let Some(handle) = self.occupying_seat.take() else {
            return;
        };
        match scene.seat_mut(handle) {
            Ok(seat) if seat.occupied_by == Some(self.id) => seat.occupied_by = None,
            Ok(_) => {}
            Err(e) => log::warn!("character {:?} left a seat that is gone: {}", self.id, e),
        }
    }

    /// Hand this character's controls over to a vehicle.
    ///
    /// Keys held on foot are pressed on the vehicle's matching actions, and
    /// the character's own actions are released without notifying its state.
    pub(crate) fn start_controlling_vehicle(&mut self, vehicle_id: VehicleId, scene: &mut Scene) -> Result<(), GameError> {
        if self.controlled_vehicle == Some(vehicle_id) {
            return Ok(());
        }

        let vehicle = scene.vehicle_mut(vehicle_id)?;
        if let Some(other) = vehicle.controlling_character.filter(|&c| c != self.id) {
            log::warn!("character {:?} refused vehicle {:?}: driven by {:?}", self.id, vehicle_id, other);
            return Err(GameError::VehicleControlled {
                vehicle: vehicle_id,
                by: other,
            });
        }
        let mut requests = Vec::new();
        for (name, pressed) in self.actions.transfer_plan(&vehicle.actions) {
            requests.extend(vehicle.trigger_action(&name, pressed)?);
        }
        self.clear_controls();
        self.controlled_vehicle = Some(vehicle_id);

        let vehicle = scene
            .vehicles
            .get_mut(vehicle_id.0)
            .ok_or(GameError::UnknownVehicle(vehicle_id))?;
        if let Some(hints) = vehicle.input_receiver_init(scene.physics) {
            scene.ui_events.push(hints);
        }
        vehicle.controlling_character = Some(self.id);
        log::info!("character {:?} took control of vehicle {:?}", self.id, vehicle_id);

        self.apply_vehicle_requests(requests, scene)
    }

    pub(crate) fn stop_controlling_vehicle(&mut self, scene: &mut Scene) -> Result<(), GameError> {
        let Some(vehicle_id) = self.controlled_vehicle else {
            return Ok(());
        };
        let Some(vehicle) = scene.vehicles.get_mut(vehicle_id.0) else {
            self.controlled_vehicle = None;
            return Ok(());
        };
        if vehicle.controlling_character != Some(self.id) {
            return Ok(());
        }

        vehicle.allow_sleep(scene.physics, true);
        vehicle.controlling_character = None;
        // Without a controller the release cannot produce requests.
        vehicle.reset_controls()?;
        self.controlled_vehicle = None;

        log::info!("character {:?} released vehicle {:?}", self.id, vehicle_id);
        scene.push_ui(on_foot_controls());
        Ok(())
    }

    /// Start getting out of the occupied seat.
    pub fn exit_vehicle(&mut self, scene: &mut Scene) -> Result<(), GameError> {
        let Some(seat) = self.occupying_seat else {
            return Ok(());
        };
        let transition = if scene.vehicle(seat.vehicle)?.is_airplane() {
            Transition::ExitingAirplane { seat }
        } else {
            Transition::ExitingVehicle { seat }
        };
        self.set_state(transition, scene)?;
        self.stop_controlling_vehicle(scene)
    }

    /// Shuffle to a connected seat of the same vehicle.
    pub fn switch_seats(&mut self, from: usize, to: usize, scene: &mut Scene) -> Result<(), GameError> {
        let Some(seat) = self.occupying_seat else {
            return Ok(());
        };
        if !self.state.can_leave_vehicles() {
            return Ok(());
        }
        if !scene.seat(SeatHandle::new(seat.vehicle, to))?.is_free_for(self.id) {
            log::debug!("character {:?} stays put: seat {} is taken", self.id, to);
            return Ok(());
        }
        self.set_state(
            Transition::SwitchingSeats {
                vehicle: seat.vehicle,
                from,
                to,
            },
            scene,
        )?;
        self.stop_controlling_vehicle(scene)
    }

    /// Apply requests a vehicle raised about this character.
    pub(crate) fn apply_vehicle_requests(
        &mut self,
        requests: Vec<VehicleRequest>,
        scene: &mut Scene,
    ) -> Result<(), GameError> {
        for request in requests {
            match request {
                VehicleRequest::ForceCharacterOut(character) if character == self.id => {
                    self.exit_vehicle(scene)?;
                }
                VehicleRequest::SwitchSeats { character, from, to } if character == self.id => {
                    self.switch_seats(from, to, scene)?;
                }
                other => log::warn!("character {:?} ignored a request for someone else: {:?}", self.id, other),
            }
        }
        Ok(())
    }

    /// Put the character straight into a seat and take the controls.
    pub fn teleport_to_vehicle(&mut self, vehicle_id: VehicleId, seat: usize, scene: &mut Scene) -> Result<(), GameError> {
        let handle = SeatHandle::new(vehicle_id, seat);
        let target = scene.seat(handle)?;
        let (sitting, rotation) = (target.sitting_position(), target.rotation);
        if target.is_free_for(self.id) {
            if let Some(other) = scene.vehicle(vehicle_id)?.controlling_character.filter(|&c| c != self.id) {
                return Err(GameError::VehicleControlled {
                    vehicle: vehicle_id,
                    by: other,
                });
            }
        }
        self.occupy_seat(handle, scene)?;

        self.reset_velocity(scene.physics);
        self.set_physics_enabled(false, scene.physics);
        self.attach_to_vehicle(vehicle_id, scene.vehicle(vehicle_id)?);
        self.set_position(sitting, scene.physics);
        self.quaternion = rotation;

        self.set_state(Transition::Driving { seat: handle }, scene)?;
        self.start_controlling_vehicle(vehicle_id, scene)
    }

    /// Return to world space beside the vehicle, carrying its velocity.
    pub(crate) fn detach_from_vehicle(&mut self, vehicle_id: VehicleId, scene: &mut Scene) -> Result<(), GameError> {
        self.controlled_vehicle = None;

        let forward = self.world_quaternion(scene.vehicles) * Vec3::Z;
        self.set_orientation(forward, true);
        self.attach_to_world(scene.vehicles);
        self.reset_velocity(scene.physics);
        self.set_physics_enabled(true, scene.physics);
        self.set_position(self.position, scene.physics);

        let carried = scene.vehicle(vehicle_id)?.chassis_velocity(scene.physics);
        scene.physics.try_body_mut(self.body)?.velocity = carried;
        self.feet_raycast(scene.physics);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};
    use roadside_physics::{CollisionGroups, PhysicsWorld};

    use crate::arena::{Arena, CharacterId, SeatHandle, VehicleId};
    use crate::character::{Character, CharacterConfig};
    use crate::error::GameError;
    use crate::events::UiEvent;
    use crate::path::Path;
    use crate::scene::Scene;
    use crate::vehicle::{Vehicle, VehicleDescription};

    fn world() -> (PhysicsWorld, Arena<Vehicle>) {
        let mut physics = PhysicsWorld::with_default_config();
        physics.collision.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), CollisionGroups::DEFAULT);
        let mut vehicles = Arena::new();
        let car = Vehicle::new(&VehicleDescription::sedan(), &mut physics, Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY)
            .expect("sedan builds");
        vehicles.insert(car);
        (physics, vehicles)
    }

    #[test]
    fn test_teleport_takes_the_wheel() {
        let (mut physics, mut vehicles) = world();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut ch = Character::new(CharacterConfig::default(), Vec3::new(5.0, 0.57, 0.0), None, &mut physics);
        ch.id = CharacterId(3);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        ch.teleport_to_vehicle(VehicleId(0), 0, &mut scene).unwrap();

        assert_eq!(ch.state_name(), "driving");
        assert_eq!(ch.controlled_vehicle, Some(VehicleId(0)));
        assert!(!ch.physics_enabled, "Seated characters ride with the vehicle");
        assert_eq!(scene.vehicles.get(0).unwrap().controlling_character, Some(CharacterId(3)));
        assert_eq!(scene.vehicles.get(0).unwrap().seats[0].occupied_by, Some(CharacterId(3)));
        assert!(
            matches!(scene.ui_events.last(), Some(UiEvent::Controls(_))),
            "Taking the wheel announces the car controls"
        );
    }

    #[test]
    fn test_held_keys_carry_over_to_the_vehicle() {
        let (mut physics, mut vehicles) = world();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut ch = Character::new(CharacterConfig::default(), Vec3::new(5.0, 0.57, 0.0), None, &mut physics);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        ch.actions.begin_trigger("up", true);
        ch.actions.end_trigger("up");
        ch.teleport_to_vehicle(VehicleId(0), 0, &mut scene).unwrap();

        assert!(!ch.actions.is_pressed("up"), "Character controls are released");
        assert!(
            scene.vehicles.get(0).unwrap().actions.is_pressed("throttle"),
            "W keeps the throttle down"
        );
    }

    #[test]
    fn test_stop_controlling_frees_the_vehicle() {
        let (mut physics, mut vehicles) = world();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut ch = Character::new(CharacterConfig::default(), Vec3::new(5.0, 0.57, 0.0), None, &mut physics);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        ch.teleport_to_vehicle(VehicleId(0), 0, &mut scene).unwrap();
        ch.stop_controlling_vehicle(&mut scene).unwrap();

        let vehicle = scene.vehicles.get(0).unwrap();
        assert_eq!(vehicle.controlling_character, None);
        assert!(!vehicle.actions.is_pressed("throttle"));
        assert_eq!(ch.controlled_vehicle, None);
        assert_eq!(ch.occupying_seat.map(|s| s.seat), Some(0), "Still seated");
    }

    #[test]
    fn test_taken_seat_is_refused() {
        let (mut physics, mut vehicles) = world();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut first = Character::new(CharacterConfig::default(), Vec3::new(5.0, 0.57, 0.0), None, &mut physics);
        first.id = CharacterId(0);
        let mut second = Character::new(CharacterConfig::default(), Vec3::new(-5.0, 0.57, 0.0), None, &mut physics);
        second.id = CharacterId(1);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        first.teleport_to_vehicle(VehicleId(0), 0, &mut scene).unwrap();
        let err = second.teleport_to_vehicle(VehicleId(0), 0, &mut scene).unwrap_err();

        assert!(
            matches!(err, GameError::SeatOccupied { seat: 0, by: CharacterId(0), .. }),
            "got {:?}",
            err
        );
        assert_eq!(second.occupying_seat, None);
        assert_eq!(second.parent, None, "Refused before leaving the ground");
        assert!(second.physics_enabled);
        let vehicle = scene.vehicles.get(0).unwrap();
        assert_eq!(vehicle.seats[0].occupied_by, Some(CharacterId(0)));
        assert_eq!(vehicle.controlling_character, Some(CharacterId(0)));
    }

    #[test]
    fn test_single_controller() {
        let (mut physics, mut vehicles) = world();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut driver = Character::new(CharacterConfig::default(), Vec3::new(5.0, 0.57, 0.0), None, &mut physics);
        driver.id = CharacterId(0);
        let mut passenger = Character::new(CharacterConfig::default(), Vec3::new(-5.0, 0.57, 0.0), None, &mut physics);
        passenger.id = CharacterId(1);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        driver.teleport_to_vehicle(VehicleId(0), 0, &mut scene).unwrap();
        passenger.occupy_seat(SeatHandle::new(VehicleId(0), 1), &mut scene).unwrap();
        passenger.actions.begin_trigger("up", true);
        passenger.actions.end_trigger("up");

        let err = passenger.start_controlling_vehicle(VehicleId(0), &mut scene).unwrap_err();
        assert!(matches!(err, GameError::VehicleControlled { by: CharacterId(0), .. }), "got {:?}", err);
        assert_eq!(passenger.controlled_vehicle, None);
        assert!(passenger.actions.is_pressed("up"), "Refused before any key was handed over");
        let vehicle = scene.vehicles.get(0).unwrap();
        assert_eq!(vehicle.controlling_character, Some(CharacterId(0)));
        assert!(!vehicle.actions.is_pressed("throttle"));
    }
}
