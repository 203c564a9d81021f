//! Characters.
//!
//! A character is a dynamic capsule steered by a spring-smoothed arcade
//! velocity, plus a state machine that decides what that velocity should be.
//!
//! # Per-frame order
//!
//! ```text
//! behaviour ──► entry intent ──► state update ──► springs ──► rotate ──► sync
//! ```
//!
//! Around every physics substep the world calls [`Character::physics_pre_step`]
//! (feet raycast) and [`Character::physics_post_step`] (ground reconciliation
//! and jumps).
//!
//! While sitting in or climbing into a vehicle the body is disabled and
//! `position` / `quaternion` are expressed in the vehicle's frame (see
//! [`Character::parent`]).

mod config;
mod control;
mod entry;
pub mod states;

pub use config::CharacterConfig;
pub use entry::VehicleEntryInstance;
pub use states::{CharacterState, StartDirection, StateKind, Transition};

use std::mem;

use glam::{Quat, Vec3};

use roadside_physics::collision::CollisionGroups;
use roadside_physics::math::{apply_vector_matrix_xz, look_rotation_flat, rotate_about, signed_angle_y};
use roadside_physics::{
    ArcadeMotion, BodyHandle, GroundContactResolver, GroundHit, JumpRequest, PhysicsWorld,
    RelativeSpringSimulator, RigidBody, VectorSpring,
};

use crate::ai::Behaviour;
use crate::animation::AnimationPlayer;
use crate::arena::{Arena, CharacterId, SeatHandle, VehicleId};
use crate::error::GameError;
use crate::input::ActionMap;
use crate::scene::Scene;
use crate::vehicle::Vehicle;

const DIRECTIONS: [&str; 4] = ["up", "down", "left", "right"];

#[derive(Debug, Clone)]
pub struct Character {
    /// Assigned when the character is added to a world.
    pub id: CharacterId,
    pub config: CharacterConfig,

    // ========================================================================
    // Motion
    // ========================================================================
    /// World position, or vehicle-local while `parent` is set.
    pub position: Vec3,
    pub quaternion: Quat,
    /// Horizontal facing.
    pub orientation: Vec3,
    pub orientation_target: Vec3,
    /// Smoothed local arcade velocity, unit scale.
    pub velocity: Vec3,
    pub velocity_target: Vec3,
    pub acceleration: Vec3,
    pub angular_velocity: f32,
    /// Camera view direction.
    pub view_vector: Vec3,
    pub arcade_velocity_influence: Vec3,
    pub arcade_velocity_is_additive: bool,

    pub velocity_simulator: VectorSpring,
    pub rotation_simulator: RelativeSpringSimulator,

    // ========================================================================
    // Control
    // ========================================================================
    pub actions: ActionMap,
    state: CharacterState,
    /// Bumped by every transition.
    state_generation: u64,
    pub behaviour: Option<Behaviour>,
    pub vehicle_entry: Option<VehicleEntryInstance>,
    /// Search result waiting for the current input handler to return.
    approach_pending: Option<VehicleEntryInstance>,

    // ========================================================================
    // Vehicles
    // ========================================================================
    pub occupying_seat: Option<SeatHandle>,
    pub controlled_vehicle: Option<VehicleId>,
    pub parent: Option<VehicleId>,

    // ========================================================================
    // Physics
    // ========================================================================
    pub body: BodyHandle,
    pub physics_enabled: bool,
    /// Feet ray result from the last pre-step.
    pub ray: Option<GroundHit>,
    pub wants_to_jump: bool,
    pub init_jump_speed: f32,
    /// Velocity captured while airborne, read by the landing states.
    pub ground_impact_velocity: Vec3,
    resolver: GroundContactResolver,

    pub animations: Option<AnimationPlayer>,
}

impl Character {
    /// Create a character and its capsule body, standing idle at `position`.
    pub fn new(
        config: CharacterConfig,
        position: Vec3,
        animations: Option<AnimationPlayer>,
        physics: &mut PhysicsWorld,
    ) -> Self {
        let mut capsule = RigidBody::capsule(
            config.capsule_mass,
            position,
            config.capsule_radius,
            config.capsule_height,
            config.capsule_segments,
        )
        .with_group(CollisionGroups::CHARACTERS);
        capsule.fixed_rotation = true;
        capsule.allow_sleep = false;
        let body = physics.add_body(capsule);

        let fps = config.spring_fps;
        let velocity_simulator = VectorSpring::new(fps, config.velocity_mass, config.velocity_damping);
        let rotation_simulator = RelativeSpringSimulator::new(fps, config.rotation_mass, config.rotation_damping);
        let resolver = GroundContactResolver::new(config.ground.clone());

        let mut character = Self {
            id: CharacterId(0),
            config,
            position,
            quaternion: Quat::IDENTITY,
            orientation: Vec3::Z,
            orientation_target: Vec3::Z,
            velocity: Vec3::ZERO,
            velocity_target: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            angular_velocity: 0.0,
            view_vector: Vec3::Z,
            arcade_velocity_influence: Vec3::ZERO,
            arcade_velocity_is_additive: false,
            velocity_simulator,
            rotation_simulator,
            actions: ActionMap::character(),
            state: CharacterState::vacant(),
            state_generation: 0,
            behaviour: None,
            vehicle_entry: None,
            approach_pending: None,
            occupying_seat: None,
            controlled_vehicle: None,
            parent: None,
            body,
            physics_enabled: true,
            ray: None,
            wants_to_jump: false,
            init_jump_speed: -1.0,
            ground_impact_velocity: Vec3::ZERO,
            resolver,
            animations,
        };
        character.state = states::idle(&mut character);
        character
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = Some(behaviour);
        self
    }

    // ========================================================================
    // State machine
    // ========================================================================

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// Enter a new state.
    ///
    /// The new state is installed once fully built, then sees the current
    /// input. If building it requested a transition of its own, that
    /// transition already replaced the state and this one is dropped.
    pub fn set_state(&mut self, transition: Transition, scene: &mut Scene) -> Result<(), GameError> {
        self.state_generation += 1;
        let generation = self.state_generation;

        let state = states::enter(self, scene, transition)?;
        if self.state_generation != generation {
            log::trace!("character {:?}: {} superseded while entering", self.id, state.name());
            return Ok(());
        }

        log::debug!("character {:?}: {} -> {}", self.id, self.state.name(), state.name());
        self.state = state;
        self.on_input_change(scene)
    }

    /// Run the current state's update.
    pub fn update_state(&mut self, dt: f32, scene: &mut Scene) -> Result<(), GameError> {
        let generation = self.state_generation;
        let mut state = mem::replace(&mut self.state, CharacterState::vacant());
        let result = states::update(&mut state, self, scene, dt);
        if self.state_generation == generation {
            self.state = state;
        }
        result
    }

    fn on_input_change(&mut self, scene: &mut Scene) -> Result<(), GameError> {
        let generation = self.state_generation;
        let mut state = mem::replace(&mut self.state, CharacterState::vacant());
        let result = states::on_input_change(&mut state, self, scene);
        if self.state_generation == generation {
            self.state = state;
        }
        result
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Press or release a named action and let the state react.
    pub fn trigger_action(&mut self, name: &str, pressed: bool, scene: &mut Scene) -> Result<(), GameError> {
        if !self.actions.begin_trigger(name, pressed) {
            return Ok(());
        }
        let result = self.on_input_change(scene);
        self.actions.end_trigger(name);
        result?;

        // A vehicle search walks the character towards the entry point.
        if let Some(instance) = self.approach_pending.take() {
            self.trigger_action("up", true, scene)?;
            self.vehicle_entry = Some(instance);
        }
        Ok(())
    }

    /// Route a raw input code to every action bound to it.
    pub fn handle_input(&mut self, code: &str, pressed: bool, scene: &mut Scene) -> Result<(), GameError> {
        for name in self.actions.actions_for_code(code) {
            self.trigger_action(&name, pressed, scene)?;
        }
        Ok(())
    }

    /// Release every action, notifying the state of each release.
    pub fn reset_controls(&mut self, scene: &mut Scene) -> Result<(), GameError> {
        let names: Vec<String> = self.actions.names().map(str::to_string).collect();
        for name in names {
            self.trigger_action(&name, false, scene)?;
        }
        Ok(())
    }

    /// Release every action without notifying the state.
    fn clear_controls(&mut self) {
        let names: Vec<String> = self.actions.names().map(str::to_string).collect();
        for name in &names {
            self.actions.force_release(name);
            self.actions.end_trigger(name);
        }
    }

    pub fn any_direction(&self) -> bool {
        DIRECTIONS.iter().any(|d| self.actions.is_pressed(d))
    }

    pub fn no_direction(&self) -> bool {
        !self.any_direction()
    }

    fn direction_just_pressed(&self) -> bool {
        DIRECTIONS.iter().any(|d| self.actions.just_pressed(d))
    }

    /// Held directions as a local unit vector (x = left, z = forward).
    pub fn local_movement_direction(&self) -> Vec3 {
        let x = if self.actions.is_pressed("left") { 1.0 } else { 0.0 }
            - if self.actions.is_pressed("right") { 1.0 } else { 0.0 };
        let z = if self.actions.is_pressed("up") { 1.0 } else { 0.0 }
            - if self.actions.is_pressed("down") { 1.0 } else { 0.0 };
        Vec3::new(x, 0.0, z).normalize_or_zero()
    }

    /// Held directions rotated into the camera's horizontal frame.
    pub fn camera_relative_movement_vector(&self) -> Vec3 {
        let local = self.local_movement_direction();
        let flat_view = Vec3::new(self.view_vector.x, 0.0, self.view_vector.z).normalize_or_zero();
        apply_vector_matrix_xz(flat_view, local)
    }

    /// Face the held direction. Ignored while walking to a vehicle.
    pub fn set_camera_relative_orientation_target(&mut self) {
        if self.vehicle_entry.is_some() {
            return;
        }
        let movement = self.camera_relative_movement_vector();
        if movement == Vec3::ZERO {
            self.set_orientation(self.orientation, false);
        } else {
            self.set_orientation(movement, false);
        }
    }

    // ========================================================================
    // Motion
    // ========================================================================

    pub fn set_orientation(&mut self, vector: Vec3, instantly: bool) {
        let look = Vec3::new(vector.x, 0.0, vector.z).normalize_or_zero();
        self.orientation_target = look;
        if instantly {
            self.orientation = look;
        }
    }

    /// Face the current world forward, dropping any pending turn.
    pub fn reset_orientation(&mut self) {
        let forward = self.quaternion * Vec3::Z;
        self.set_orientation(forward, true);
    }

    pub fn set_view_vector(&mut self, vector: Vec3) {
        self.view_vector = vector.normalize_or_zero();
    }

    /// Forward arcade speed target, unit scale.
    pub fn set_arcade_velocity_target(&mut self, z: f32) {
        self.velocity_target = Vec3::new(0.0, 0.0, z);
    }

    pub fn set_arcade_velocity_influence(&mut self, influence: Vec3) {
        self.arcade_velocity_influence = influence;
    }

    /// Stop dead: arcade velocity, body velocity and the velocity spring.
    pub fn reset_velocity(&mut self, physics: &mut PhysicsWorld) {
        self.velocity = Vec3::ZERO;
        if let Some(body) = physics.body_mut(self.body) {
            body.velocity = Vec3::ZERO;
        }
        self.velocity_simulator.init();
    }

    /// Queue a jump for the next post-step. A negative speed keeps the
    /// current planar motion.
    pub fn jump(&mut self, init_speed: f32) {
        self.wants_to_jump = true;
        self.init_jump_speed = init_speed;
    }

    pub fn set_physics_enabled(&mut self, enabled: bool, physics: &mut PhysicsWorld) {
        self.physics_enabled = enabled;
        if let Some(body) = physics.body_mut(self.body) {
            body.enabled = enabled;
        }
    }

    /// Teleport. With physics enabled the body moves too.
    pub fn set_position(&mut self, position: Vec3, physics: &mut PhysicsWorld) {
        self.position = position;
        if self.physics_enabled {
            if let Some(body) = physics.body_mut(self.body) {
                body.set_position(position);
            }
        }
    }

    pub fn world_position(&self, vehicles: &Arena<Vehicle>) -> Vec3 {
        match self.parent.and_then(|v| vehicles.get(v.0)) {
            Some(vehicle) => vehicle.to_world(self.position),
            None => self.position,
        }
    }

    pub fn world_quaternion(&self, vehicles: &Arena<Vehicle>) -> Quat {
        match self.parent.and_then(|v| vehicles.get(v.0)) {
            Some(vehicle) => vehicle.quaternion * self.quaternion,
            None => self.quaternion,
        }
    }

    /// Re-express the transform in the vehicle's frame.
    pub fn attach_to_vehicle(&mut self, vehicle_id: VehicleId, vehicle: &Vehicle) {
        if self.parent == Some(vehicle_id) {
            return;
        }
        self.position = vehicle.to_local(self.position);
        self.quaternion = vehicle.quaternion.inverse() * self.quaternion;
        self.parent = Some(vehicle_id);
    }

    /// Re-express the transform in world space.
    pub fn attach_to_world(&mut self, vehicles: &Arena<Vehicle>) {
        self.position = self.world_position(vehicles);
        self.quaternion = self.world_quaternion(vehicles);
        self.parent = None;
    }

    fn spring_movement(&mut self, dt: f32) {
        self.velocity_simulator.target = self.velocity_target;
        self.velocity_simulator.simulate(dt);
        self.velocity = self.velocity_simulator.position;
        self.acceleration = self.velocity_simulator.velocity;
    }

    fn spring_rotation(&mut self, dt: f32) {
        let angle = signed_angle_y(self.orientation, self.orientation_target);
        self.rotation_simulator.target = angle;
        self.rotation_simulator.simulate(dt);
        self.orientation = rotate_about(self.orientation, Vec3::Y, self.rotation_simulator.position);
        self.angular_velocity = self.rotation_simulator.velocity;
    }

    fn rotate_model(&mut self) {
        self.quaternion = look_rotation_flat(self.orientation);
    }

    // ========================================================================
    // Animation
    // ========================================================================

    /// Start a clip and return its length.
    ///
    /// `None` without an animation player. A clip missing from the table
    /// plays nothing and reports a length of zero.
    pub fn set_animation(&mut self, clip: &str, fade_in: f32) -> Option<f32> {
        let player = self.animations.as_mut()?;
        match player.play(clip, fade_in) {
            Some(length) => Some(length),
            None => {
                log::error!("character {:?}: animation `{}` not found", self.id, clip);
                Some(0.0)
            }
        }
    }

    // ========================================================================
    // Frame
    // ========================================================================

    pub fn update(&mut self, dt: f32, scene: &mut Scene) -> Result<(), GameError> {
        if let Some(mut behaviour) = self.behaviour.take() {
            let result = behaviour.update(self, scene, dt);
            if self.behaviour.is_none() {
                self.behaviour = Some(behaviour);
            }
            result?;
        }

        if self.vehicle_entry.is_some() {
            self.update_vehicle_entry(scene)?;
        }

        self.update_state(dt, scene)?;

        if self.physics_enabled {
            self.spring_movement(dt);
            self.spring_rotation(dt);
            self.rotate_model();
        }

        if self.physics_enabled {
            if let Some(body) = scene.physics.body(self.body) {
                self.position = body.interpolated_position;
            }
        } else {
            let world = self.world_position(scene.vehicles);
            if let Some(body) = scene.physics.body_mut(self.body) {
                body.set_position(world);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Physics
    // ========================================================================

    pub fn feet_raycast(&mut self, physics: &PhysicsWorld) {
        self.ray = self.resolver.feet_raycast(physics, self.body);
    }

    pub fn physics_pre_step(&mut self, physics: &PhysicsWorld) {
        if self.physics_enabled {
            self.feet_raycast(physics);
        }
    }

    pub fn physics_post_step(&mut self, physics: &mut PhysicsWorld) {
        if !self.physics_enabled {
            return;
        }

        let motion = ArcadeMotion {
            orientation: self.orientation,
            velocity: self.velocity,
            velocity_target: self.velocity_target,
            influence: self.arcade_velocity_influence,
            additive: self.arcade_velocity_is_additive,
        };
        let jump = self.wants_to_jump.then(|| JumpRequest {
            init_speed: self.init_jump_speed,
            planar_speed: self.velocity_simulator.position.length(),
        });
        let frame_rate = physics.config.frame_rate;

        let Some(body) = physics.body_mut(self.body) else {
            log::warn!("character {:?} lost its body", self.id);
            return;
        };
        let outcome = self.resolver.post_step(body, self.ray.as_ref(), &motion, jump, frame_rate);

        if let Some(velocity) = outcome.ground_impact_velocity {
            self.ground_impact_velocity = velocity;
        }
        if outcome.jumped {
            self.wants_to_jump = false;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
