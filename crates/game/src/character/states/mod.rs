//! Character state machine.
//!
//! A [`CharacterState`] is the shared [`StateBase`] (timer, clip length and the
//! vehicle permission flags) plus per-state data in [`StateKind`]. States are
//! entered through [`Character::set_state`] with a [`Transition`], which
//! carries whatever the new state needs to be built.
//!
//! ```text
//!            ┌──────────── ground ────────────┐
//!            │ Idle  Walk  Sprint  EndWalk    │──jump──► JumpIdle / JumpRunning
//!            │ StartWalk*  IdleRotateRight    │                 │
//!            └───────────────▲────────────────┘◄──── Drop* ◄────┤
//!                            │                                  ▼
//!                     entry intent                           Falling
//!                            ▼
//!   OpenVehicleDoor ──► EnteringVehicle ──► Driving / Sitting ◄──► SwitchingSeats
//!                                              │  ▲
//!                                              │  └── CloseVehicleDoorInside
//!                                              ▼
//!                         ExitingVehicle / ExitingAirplane ──► CloseVehicleDoorOutside
//! ```
//!
//! Handlers that could match several transitions test them in priority order
//! and take the first match.

mod air;
mod locomotion;
mod vehicle;

use std::f32::consts::PI;

use glam::Vec3;

use roadside_physics::math::signed_angle_y;

use crate::arena::{SeatHandle, VehicleId};
use crate::character::Character;
use crate::error::GameError;
use crate::scene::Scene;
use crate::vehicle::EntryPoint;

pub use vehicle::{EnteringState, ExitingState, MotionBlend, OpenDoorState, SwitchingState};

pub(crate) use locomotion::idle;

/// Which way a start-walk animation turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDirection {
    Forward,
    Left,
    Right,
    BackLeft,
    BackRight,
}

impl StartDirection {
    fn clip(self) -> &'static str {
        match self {
            Self::Forward => "start_forward",
            Self::Left => "start_left",
            Self::Right => "start_right",
            Self::BackLeft => "start_back_left",
            Self::BackRight => "start_back_right",
        }
    }

    fn state_name(self) -> &'static str {
        match self {
            Self::Forward => "start_walk_forward",
            Self::Left => "start_walk_left",
            Self::Right => "start_walk_right",
            Self::BackLeft => "start_walk_back_left",
            Self::BackRight => "start_walk_back_right",
        }
    }

    /// Pick the clip that turns from `orientation` towards `movement`.
    pub fn select(orientation: Vec3, movement: Vec3) -> Self {
        let angle = signed_angle_y(orientation, movement);
        if angle > PI * 0.8 {
            Self::BackLeft
        } else if angle < -PI * 0.8 {
            Self::BackRight
        } else if angle > PI * 0.3 {
            Self::Left
        } else if angle < -PI * 0.3 {
            Self::Right
        } else {
            Self::Forward
        }
    }
}

/// A requested state change and the data the new state is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Idle,
    IdleRotateRight,
    Walk,
    Sprint,
    EndWalk,
    StartWalk(StartDirection),
    JumpIdle,
    JumpRunning,
    Falling,
    DropIdle,
    DropRolling,
    DropRunning,
    OpenVehicleDoor { seat: SeatHandle, entry_point: EntryPoint },
    EnteringVehicle { seat: SeatHandle, entry_point: EntryPoint },
    ExitingVehicle { seat: SeatHandle },
    ExitingAirplane { seat: SeatHandle },
    CloseVehicleDoorInside { seat: SeatHandle },
    CloseVehicleDoorOutside { seat: SeatHandle },
    Driving { seat: SeatHandle },
    Sitting { seat: SeatHandle },
    SwitchingSeats { vehicle: VehicleId, from: usize, to: usize },
}

/// Fields every state carries.
#[derive(Debug, Clone)]
pub struct StateBase {
    pub name: &'static str,
    pub timer: f32,
    /// Length of the clip played on entry; `None` until one is played.
    pub animation_length: Option<f32>,
    pub can_find_vehicles_to_enter: bool,
    pub can_enter_vehicles: bool,
    pub can_leave_vehicles: bool,
}

impl StateBase {
    /// Reset the character to the defaults every state starts from.
    fn enter(ch: &mut Character, name: &'static str) -> Self {
        ch.velocity_simulator.mass = ch.config.velocity_mass;
        ch.velocity_simulator.damping = ch.config.velocity_damping;
        ch.rotation_simulator.mass = ch.config.rotation_mass;
        ch.rotation_simulator.damping = ch.config.rotation_damping;
        ch.arcade_velocity_is_additive = false;
        ch.set_arcade_velocity_influence(Vec3::new(1.0, 0.0, 1.0));

        Self {
            name,
            timer: 0.0,
            animation_length: None,
            can_find_vehicles_to_enter: true,
            can_enter_vehicles: false,
            can_leave_vehicles: true,
        }
    }

    fn play_animation(&mut self, ch: &mut Character, clip: &str, fade_in: f32) {
        self.animation_length = ch.set_animation(clip, fade_in);
    }

    /// Whether the entry clip has finished, one frame early.
    ///
    /// Always true for a character without an animation player.
    pub fn animation_ended(&self, ch: &Character, dt: f32) -> Result<bool, GameError> {
        if ch.animations.is_none() {
            return Ok(true);
        }
        match self.animation_length {
            Some(length) => Ok(self.timer > length - dt),
            None => Err(GameError::MissingAnimationLength { state: self.name }),
        }
    }
}

/// Per-state data.
#[derive(Debug, Clone)]
pub enum StateKind {
    /// Stands in for a state while its handler runs.
    Vacant,
    Idle,
    IdleRotateRight,
    Walk,
    Sprint,
    EndWalk,
    StartWalk(StartDirection),
    JumpIdle { already_jumped: bool },
    JumpRunning { already_jumped: bool },
    Falling,
    DropIdle,
    DropRolling,
    DropRunning,
    OpenVehicleDoor(OpenDoorState),
    EnteringVehicle(EnteringState),
    ExitingVehicle(ExitingState),
    ExitingAirplane(ExitingState),
    CloseVehicleDoorInside { seat: SeatHandle, has_closed_door: bool },
    CloseVehicleDoorOutside { seat: SeatHandle, has_closed_door: bool },
    Driving { seat: SeatHandle },
    Sitting { seat: SeatHandle },
    SwitchingSeats(SwitchingState),
}

#[derive(Debug, Clone)]
pub struct CharacterState {
    pub base: StateBase,
    pub kind: StateKind,
}

impl CharacterState {
    fn new(base: StateBase, kind: StateKind) -> Self {
        Self { base, kind }
    }

    pub(crate) fn vacant() -> Self {
        Self {
            base: StateBase {
                name: "vacant",
                timer: 0.0,
                animation_length: None,
                can_find_vehicles_to_enter: false,
                can_enter_vehicles: false,
                can_leave_vehicles: false,
            },
            kind: StateKind::Vacant,
        }
    }

    pub fn name(&self) -> &'static str {
        self.base.name
    }

    pub fn timer(&self) -> f32 {
        self.base.timer
    }

    pub fn can_enter_vehicles(&self) -> bool {
        self.base.can_enter_vehicles
    }

    pub fn can_leave_vehicles(&self) -> bool {
        self.base.can_leave_vehicles
    }

    /// The seat a vehicle state is bound to.
    pub fn seat(&self) -> Option<SeatHandle> {
        match &self.kind {
            StateKind::CloseVehicleDoorInside { seat, .. }
            | StateKind::CloseVehicleDoorOutside { seat, .. }
            | StateKind::Driving { seat }
            | StateKind::Sitting { seat } => Some(*seat),
            StateKind::OpenVehicleDoor(open) => Some(open.seat),
            StateKind::EnteringVehicle(entering) => Some(entering.seat),
            StateKind::ExitingVehicle(exit) | StateKind::ExitingAirplane(exit) => Some(exit.seat),
            StateKind::SwitchingSeats(switch) => Some(SeatHandle::new(switch.vehicle, switch.to)),
            _ => None,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

pub(crate) fn enter(ch: &mut Character, scene: &mut Scene, transition: Transition) -> Result<CharacterState, GameError> {
    Ok(match transition {
        Transition::Idle => locomotion::idle(ch),
        Transition::IdleRotateRight => locomotion::idle_rotate_right(ch),
        Transition::Walk => locomotion::walk(ch),
        Transition::Sprint => locomotion::sprint(ch),
        Transition::EndWalk => locomotion::end_walk(ch),
        Transition::StartWalk(direction) => locomotion::start_walk(ch, direction),
        Transition::JumpIdle => air::jump_idle(ch),
        Transition::JumpRunning => air::jump_running(ch),
        Transition::Falling => air::falling(ch),
        Transition::DropIdle => air::drop_idle(ch, scene)?,
        Transition::DropRolling => air::drop_rolling(ch),
        Transition::DropRunning => air::drop_running(ch),
        Transition::OpenVehicleDoor { seat, entry_point } => vehicle::open_vehicle_door(ch, scene, seat, entry_point)?,
        Transition::EnteringVehicle { seat, entry_point } => vehicle::entering_vehicle(ch, scene, seat, entry_point)?,
        Transition::ExitingVehicle { seat } => vehicle::exiting_vehicle(ch, scene, seat)?,
        Transition::ExitingAirplane { seat } => vehicle::exiting_airplane(ch, scene, seat)?,
        Transition::CloseVehicleDoorInside { seat } => vehicle::close_door_inside(ch, scene, seat)?,
        Transition::CloseVehicleDoorOutside { seat } => vehicle::close_door_outside(ch, scene, seat)?,
        Transition::Driving { seat } => vehicle::driving(ch, scene, seat)?,
        Transition::Sitting { seat } => vehicle::sitting(ch, scene, seat)?,
        Transition::SwitchingSeats { vehicle, from, to } => vehicle::switching_seats(ch, scene, vehicle, from, to)?,
    })
}

pub(crate) fn update(state: &mut CharacterState, ch: &mut Character, scene: &mut Scene, dt: f32) -> Result<(), GameError> {
    state.base.timer += dt;
    let CharacterState { base, kind } = state;

    match kind {
        StateKind::Vacant => Ok(()),
        StateKind::Idle => locomotion::update_idle(ch, scene),
        StateKind::IdleRotateRight | StateKind::EndWalk => locomotion::update_until_idle(base, ch, scene, dt),
        StateKind::Walk | StateKind::Sprint => locomotion::update_moving(ch, scene),
        StateKind::StartWalk(_) => locomotion::update_start_walk(base, ch, scene, dt),
        StateKind::JumpIdle { already_jumped } => air::update_jump_idle(base, already_jumped, ch, scene, dt),
        StateKind::JumpRunning { already_jumped } => air::update_jump_running(base, already_jumped, ch, scene, dt),
        StateKind::Falling => air::update_falling(ch, scene),
        StateKind::DropIdle => air::update_drop_idle(base, ch, scene, dt),
        StateKind::DropRolling => air::update_drop_rolling(base, ch, scene, dt),
        StateKind::DropRunning => air::update_drop_running(base, ch, scene, dt),
        StateKind::OpenVehicleDoor(open) => vehicle::update_open_door(base, open, ch, scene, dt),
        StateKind::EnteringVehicle(entering) => vehicle::update_entering(base, entering, ch, scene, dt),
        StateKind::ExitingVehicle(exit) => vehicle::update_exiting_vehicle(base, exit, ch, scene, dt),
        StateKind::ExitingAirplane(exit) => vehicle::update_exiting_airplane(base, exit, ch, scene, dt),
        StateKind::CloseVehicleDoorInside { seat, has_closed_door } => {
            vehicle::update_close_door_inside(base, *seat, has_closed_door, ch, scene, dt)
        }
        StateKind::CloseVehicleDoorOutside { seat, has_closed_door } => {
            vehicle::update_close_door_outside(base, *seat, has_closed_door, ch, scene, dt)
        }
        StateKind::Driving { seat } => vehicle::update_driving(*seat, ch, scene),
        StateKind::Sitting { seat } => vehicle::update_sitting(*seat, ch, scene),
        StateKind::SwitchingSeats(switch) => vehicle::update_switching(base, switch, ch, scene, dt),
    }
}

pub(crate) fn on_input_change(state: &mut CharacterState, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    let CharacterState { base, kind } = state;

    match kind {
        StateKind::Vacant => return Ok(()),
        StateKind::Sitting { seat } => return vehicle::sitting_input(*seat, ch, scene),
        _ => {}
    }

    base_input(base, ch, scene)?;

    match kind {
        StateKind::Idle | StateKind::IdleRotateRight => locomotion::idle_input(ch, scene),
        StateKind::Walk => locomotion::walk_input(ch, scene),
        StateKind::Sprint => locomotion::sprint_input(ch, scene),
        StateKind::EndWalk => locomotion::end_walk_input(ch, scene),
        StateKind::StartWalk(_) => locomotion::start_walk_input(base, ch, scene),
        StateKind::DropIdle => air::drop_idle_input(ch, scene),
        StateKind::DropRunning => air::drop_running_input(ch, scene),
        _ => Ok(()),
    }
}

// ============================================================================
// Shared behaviour
// ============================================================================

/// Vehicle search on `enter` / `enter_passenger`, and cancelling a walk to a
/// vehicle when the player takes over the direction keys.
fn base_input(base: &StateBase, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if base.can_find_vehicles_to_enter && ch.actions.just_pressed("enter") {
        ch.find_vehicle_to_enter(true, scene);
    } else if base.can_find_vehicles_to_enter && ch.actions.just_pressed("enter_passenger") {
        ch.find_vehicle_to_enter(false, scene);
    } else if base.can_enter_vehicles && ch.vehicle_entry.is_some() && ch.direction_just_pressed() {
        log::debug!("character {:?} cancelled its vehicle entry", ch.id);
        ch.vehicle_entry = None;
        ch.actions.force_release("up");
    }
    Ok(())
}

/// Start falling when the feet ray finds nothing. Returns whether it did.
fn fall_in_air(ch: &mut Character, scene: &mut Scene) -> Result<bool, GameError> {
    if ch.ray.is_none() {
        ch.set_state(Transition::Falling, scene)?;
        return Ok(true);
    }
    Ok(false)
}

/// Landing state for the impact velocity captured in the air.
pub fn drop_transition(ch: &Character) -> Transition {
    let impact = ch.ground_impact_velocity.y;
    if impact < -6.0 {
        Transition::DropRolling
    } else if ch.any_direction() {
        if impact < -2.0 {
            Transition::DropRunning
        } else if ch.actions.is_pressed("run") {
            Transition::Sprint
        } else {
            Transition::Walk
        }
    } else {
        Transition::DropIdle
    }
}

fn set_drop_state(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    let transition = drop_transition(ch);
    ch.set_state(transition, scene)
}

fn set_start_walk_state(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    let direction = StartDirection::select(ch.orientation, ch.camera_relative_movement_vector());
    ch.set_state(Transition::StartWalk(direction), scene)
}

// ============================================================================
// Tests
// ============================================================================
