//! The game world: every entity plus the frame loop.
//!
//! # Frame
//!
//! ```text
//! tick(dt, events)
//!   │
//!   ├─► route input ──► receiver character, or the vehicle it drives
//!   ├─► characters    behaviour, entry intent, state, springs, sync
//!   ├─► vehicles      doors, car controller, requests to occupants
//!   ├─► physics       per fixed step:
//!   │                   character pre-step (feet ray)
//!   │                   vehicle pre-step (car, doors, wheels)
//!   │                   integrate
//!   │                   character post-step (ground contact)
//!   └─► interpolate
//! ```
//!
//! While a character updates it is moved out of the arena and handed a
//! [`Scene`] over everything else, so it can never alias itself.

use std::mem;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use roadside_physics::{PhysicsConfig, PhysicsWorld};

use crate::animation::AnimationPlayer;
use crate::arena::{Arena, CharacterId, PathId, VehicleId};
use crate::character::{Character, CharacterConfig, Transition};
use crate::error::GameError;
use crate::events::{on_foot_controls, UiEvent};
use crate::input::InputEvent;
use crate::path::Path;
use crate::scene::Scene;
use crate::vehicle::{Vehicle, VehicleDescription, VehicleRequest};

/// World configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldConfig {
    pub physics: PhysicsConfig,

    /// Tuning given to characters spawned through [`World::spawn_character`].
    pub character: CharacterConfig,
}

#[derive(Debug)]
pub struct World {
    pub config: WorldConfig,
    pub physics: PhysicsWorld,
    pub characters: Arena<Character>,
    pub vehicles: Arena<Vehicle>,
    pub paths: Arena<Path>,
    /// Number of completed ticks.
    pub frame: u64,
    input_receiver: Option<CharacterId>,
    ui_events: Vec<UiEvent>,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        let physics = PhysicsWorld::new(config.physics.clone());
        Self {
            config,
            physics,
            characters: Arena::new(),
            vehicles: Arena::new(),
            paths: Arena::new(),
            frame: 0,
            input_receiver: None,
            ui_events: Vec::new(),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(WorldConfig::default())
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a character whose body already lives in this world's physics.
    ///
    /// A character whose body is already registered is not added twice; the
    /// existing handle is returned.
    pub fn add_character(&mut self, character: Character) -> CharacterId {
        if let Some((index, _)) = self.characters.iter().find(|(_, c)| c.body == character.body) {
            log::warn!("character body {:?} is already registered", character.body);
            return CharacterId(index);
        }

        let index = self.characters.insert(character);
        let id = CharacterId(index);
        if let Some(character) = self.characters.get_mut(index) {
            character.id = id;
        }
        log::debug!("added character {:?}", id);
        id
    }

    /// Create a character standing at `position` and register it.
    pub fn spawn_character(&mut self, position: Vec3, animations: Option<AnimationPlayer>) -> CharacterId {
        let character = Character::new(self.config.character.clone(), position, animations, &mut self.physics);
        self.add_character(character)
    }

    /// Register a vehicle whose chassis already lives in this world's physics.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> VehicleId {
        let chassis = vehicle.chassis();
        if let Some((index, _)) = self.vehicles.iter().find(|(_, v)| v.chassis() == chassis) {
            log::warn!("vehicle chassis {:?} is already registered", chassis);
            return VehicleId(index);
        }

        let id = VehicleId(self.vehicles.insert(vehicle));
        log::debug!("added vehicle {:?}", id);
        id
    }

    pub fn spawn_vehicle(
        &mut self,
        description: &VehicleDescription,
        position: Vec3,
        rotation: Quat,
    ) -> Result<VehicleId, GameError> {
        let vehicle = Vehicle::new(description, &mut self.physics, position, rotation)?;
        Ok(self.add_vehicle(vehicle))
    }

    pub fn add_path(&mut self, path: Path) -> PathId {
        PathId(self.paths.insert(path))
    }

    /// Find a path node by name across every path.
    pub fn find_path_node(&self, name: &str) -> Option<(PathId, usize)> {
        self.paths
            .iter()
            .find_map(|(index, path)| path.find(name).map(|node| (PathId(index), node)))
    }

    /// Remove a character and its body, releasing any seat or vehicle it held.
    pub fn remove_character(&mut self, id: CharacterId) {
        let Some(character) = self.characters.remove(id.0) else {
            log::warn!("remove of unknown character {:?}", id);
            return;
        };

        for (_, vehicle) in self.vehicles.iter_mut() {
            if vehicle.controlling_character == Some(id) {
                vehicle.controlling_character = None;
            }
            for seat in &mut vehicle.seats {
                if seat.occupied_by == Some(id) {
                    seat.occupied_by = None;
                }
            }
        }
        if self.input_receiver == Some(id) {
            self.input_receiver = None;
        }
        self.physics.remove_body(character.body);
        log::debug!("removed character {:?}", id);
    }

    /// Remove a vehicle and its chassis. Anyone inside is put back on foot.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Result<(), GameError> {
        if !self.vehicles.contains(id.0) {
            log::warn!("remove of unknown vehicle {:?}", id);
            return Ok(());
        }

        let inside: Vec<CharacterId> = self
            .characters
            .iter()
            .filter(|(_, c)| c.parent == Some(id) || c.occupying_seat.is_some_and(|s| s.vehicle == id))
            .map(|(index, _)| CharacterId(index))
            .collect();
        for character in inside {
            self.with_character(character, |ch, scene| {
                ch.stop_controlling_vehicle(scene)?;
                ch.detach_from_vehicle(id, scene)?;
                ch.leave_seat(scene);
                ch.set_state(Transition::Idle, scene)
            })?;
        }

        if let Some(vehicle) = self.vehicles.remove(id.0) {
            self.physics.remove_body(vehicle.chassis());
        }
        log::debug!("removed vehicle {:?}", id);
        Ok(())
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(id.0)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(id.0)
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.0)
    }

    /// Run `f` on a character with a scene over the rest of the world.
    pub fn with_character<R>(
        &mut self,
        id: CharacterId,
        f: impl FnOnce(&mut Character, &mut Scene) -> Result<R, GameError>,
    ) -> Result<R, GameError> {
        let mut character = self.characters.take(id.0).ok_or(GameError::UnknownCharacter(id))?;
        let mut scene = Scene::new(&mut self.physics, &mut self.vehicles, &self.paths, &mut self.ui_events);
        let result = f(&mut character, &mut scene);
        self.characters.restore(id.0, character);
        result
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn input_receiver(&self) -> Option<CharacterId> {
        self.input_receiver
    }

    /// Give a character the player's input.
    pub fn take_control(&mut self, id: CharacterId) -> Result<(), GameError> {
        let controlled = self
            .character(id)
            .ok_or(GameError::UnknownCharacter(id))?
            .controlled_vehicle;
        self.input_receiver = Some(id);

        let hints = match controlled {
            Some(vehicle_id) => {
                let vehicle = self
                    .vehicles
                    .get_mut(vehicle_id.0)
                    .ok_or(GameError::UnknownVehicle(vehicle_id))?;
                vehicle.input_receiver_init(&mut self.physics)
            }
            None => Some(on_foot_controls()),
        };
        self.ui_events.extend(hints);
        log::info!("input goes to character {:?}", id);
        Ok(())
    }

    fn route_input(&mut self, event: &InputEvent) -> Result<(), GameError> {
        let Some(id) = self.input_receiver else {
            return Ok(());
        };

        match event.button() {
            Some((code, pressed)) => {
                let controlled = self.character(id).and_then(|c| c.controlled_vehicle);
                match controlled.and_then(|v| self.vehicles.get_mut(v.0)) {
                    Some(vehicle) => {
                        let requests = vehicle.handle_input(code, pressed)?;
                        self.dispatch_vehicle_requests(requests)
                    }
                    None => self.with_character(id, |ch, scene| ch.handle_input(code, pressed, scene)),
                }
            }
            None => {
                if let InputEvent::ViewVector(view) = event {
                    if let Some(character) = self.character_mut(id) {
                        character.set_view_vector(*view);
                    }
                }
                Ok(())
            }
        }
    }

    /// Hand each vehicle request to the character it names.
    fn dispatch_vehicle_requests(&mut self, requests: Vec<VehicleRequest>) -> Result<(), GameError> {
        for request in requests {
            let character = match request {
                VehicleRequest::ForceCharacterOut(character) | VehicleRequest::SwitchSeats { character, .. } => {
                    character
                }
            };
            if !self.characters.contains(character.0) {
                log::warn!("vehicle request for unknown character {:?}", character);
                continue;
            }
            self.with_character(character, |ch, scene| ch.apply_vehicle_requests(vec![request], scene))?;
        }
        Ok(())
    }

    /// Everything emitted for the UI since the last call.
    pub fn drain_ui_events(&mut self) -> Vec<UiEvent> {
        mem::take(&mut self.ui_events)
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Advance the world by `dt` seconds after applying `events` in order.
    ///
    /// A negative or NaN `dt` advances nothing but still routes input.
    pub fn tick(&mut self, dt: f32, events: &[InputEvent]) -> Result<(), GameError> {
        let dt = dt.max(0.0);

        for event in events {
            self.route_input(event)?;
        }

        for index in self.characters.indices() {
            self.with_character(CharacterId(index), |ch, scene| ch.update(dt, scene))?;
        }

        for index in self.vehicles.indices() {
            let Some(vehicle) = self.vehicles.get_mut(index) else {
                continue;
            };
            let driver_can_leave = vehicle
                .controlling_character
                .and_then(|id| self.characters.get(id.0))
                .map(|c| c.state().can_leave_vehicles());
            let requests = vehicle.update(dt, &mut self.physics, driver_can_leave)?;
            self.dispatch_vehicle_requests(requests)?;
        }

        self.step_physics(dt)?;
        self.frame += 1;
        Ok(())
    }

    fn step_physics(&mut self, dt: f32) -> Result<(), GameError> {
        for _ in 0..self.physics.accumulate(dt) {
            for (_, character) in self.characters.iter_mut() {
                character.physics_pre_step(&self.physics);
            }
            for (_, vehicle) in self.vehicles.iter_mut() {
                vehicle.physics_pre_step(&mut self.physics)?;
            }

            self.physics.integrate();

            for (_, character) in self.characters.iter_mut() {
                character.physics_post_step(&mut self.physics);
            }
        }
        self.physics.interpolate();
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::with_default_config()
    }
}

// ============================================================================
// Tests
// ============================================================================
