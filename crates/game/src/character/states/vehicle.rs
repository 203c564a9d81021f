//! Vehicle states: getting in, sitting, switching seats and getting out.
//!
//! While in any of these the character's body is disabled and its transform
//! is vehicle-local, so every blend below is in the vehicle's frame.

use glam::{Quat, Vec3};

use roadside_physics::math::{detect_relative_side, ease_in_out_sine, ease_out_quad, look_rotation_flat};
use roadside_physics::{ScalarSpring, Side};

use super::{CharacterState, StateBase, StateKind, Transition};
use crate::arena::{SeatHandle, VehicleId};
use crate::character::Character;
use crate::error::GameError;
use crate::events::{on_foot_controls, passenger_controls};
use crate::scene::Scene;
use crate::vehicle::{EntryPoint, SeatType, Vehicle};

/// Lift from an entry point to a standing character's root.
const ENTRY_HEIGHT: f32 = 0.53;

/// Lift from an exit point to a standing character's root.
const EXIT_HEIGHT: f32 = 0.52;

/// Start and end transforms of a scripted move, plus an optional spring that
/// smooths the blend factor.
#[derive(Debug, Clone)]
pub struct MotionBlend {
    pub start_position: Vec3,
    pub end_position: Vec3,
    pub start_rotation: Quat,
    pub end_rotation: Quat,
    pub factor: Option<ScalarSpring>,
}

impl MotionBlend {
    fn eased(start_position: Vec3, end_position: Vec3, start_rotation: Quat, end_rotation: Quat) -> Self {
        Self {
            start_position,
            end_position,
            start_rotation,
            end_rotation,
            factor: None,
        }
    }

    fn sprung(start_position: Vec3, end_position: Vec3, start_rotation: Quat, end_rotation: Quat) -> Self {
        let mut factor = ScalarSpring::new(60.0, 10.0, 0.5);
        factor.target = 1.0;
        Self {
            factor: Some(factor),
            ..Self::eased(start_position, end_position, start_rotation, end_rotation)
        }
    }

    /// Advance the factor spring and return its position.
    fn simulate(&mut self, dt: f32) -> f32 {
        match &mut self.factor {
            Some(spring) => {
                spring.simulate(dt);
                spring.position
            }
            None => 1.0,
        }
    }

    fn rotation_at(&self, t: f32) -> Quat {
        self.start_rotation.slerp(self.end_rotation, t)
    }
}

#[derive(Debug, Clone)]
pub struct OpenDoorState {
    pub seat: SeatHandle,
    pub entry_point: EntryPoint,
    pub has_opened_door: bool,
    pub blend: MotionBlend,
}

#[derive(Debug, Clone)]
pub struct EnteringState {
    pub seat: SeatHandle,
    /// Seconds cut from the clip before the character reaches the seat.
    pub end_early: f32,
    /// Gap between where the character stood and the entry point.
    pub initial_offset: Vec3,
    pub blend: MotionBlend,
}

/// Which way a character faces once out of the vehicle.
#[derive(Debug, Clone, Copy)]
pub enum ExitFacing {
    /// Along the exit point, whose rotation is vehicle-local.
    ExitPoint(Quat),
    /// Along a direction fixed in world space when the exit started.
    World(Vec3),
}

#[derive(Debug, Clone)]
pub struct ExitingState {
    pub seat: SeatHandle,
    pub facing: ExitFacing,
    pub blend: MotionBlend,
}

impl ExitingState {
    /// Flat look rotation for the exit direction, in the vehicle's current frame.
    fn end_rotation(&self, vehicle: &Vehicle) -> Quat {
        let forward = match self.facing {
            ExitFacing::ExitPoint(rotation) => vehicle.quaternion * (rotation * Vec3::Z),
            ExitFacing::World(forward) => forward,
        };
        vehicle.quaternion.inverse() * look_rotation_flat(forward)
    }
}

#[derive(Debug, Clone)]
pub struct SwitchingState {
    pub vehicle: VehicleId,
    pub from: usize,
    pub to: usize,
    pub blend: MotionBlend,
}

fn side_clip(side: Side, left: &'static str, right: &'static str) -> &'static str {
    match side {
        Side::Left => left,
        Side::Right => right,
    }
}

/// `timer / length`, or 1 once there is nothing left to play.
fn progress(base: &StateBase, span: f32) -> f32 {
    if span > 0.0 {
        (base.timer / span).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Driving for a driver seat, Sitting otherwise.
fn seated_transition(seat_type: Option<SeatType>, seat: SeatHandle) -> Transition {
    match seat_type {
        Some(SeatType::Driver) => Transition::Driving { seat },
        _ => Transition::Sitting { seat },
    }
}

// ============================================================================
// Getting in
// ============================================================================

pub(super) fn open_vehicle_door(
    ch: &mut Character,
    scene: &mut Scene,
    seat: SeatHandle,
    entry_point: EntryPoint,
) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "open_vehicle_door");
    base.can_find_vehicles_to_enter = false;

    let seat_position = scene.seat(seat)?.position;
    let side = detect_relative_side(entry_point.position, entry_point.rotation, seat_position);
    base.play_animation(ch, side_clip(side, "open_door_standing_left", "open_door_standing_right"), 0.1);

    ch.reset_velocity(scene.physics);
    ch.rotate_model();
    ch.set_physics_enabled(false, scene.physics);
    ch.attach_to_vehicle(seat.vehicle, scene.vehicle(seat.vehicle)?);

    let blend = MotionBlend::sprung(
        ch.position,
        entry_point.position + Vec3::Y * ENTRY_HEIGHT,
        ch.quaternion,
        entry_point.rotation,
    );
    Ok(CharacterState::new(
        base,
        StateKind::OpenVehicleDoor(OpenDoorState {
            seat,
            entry_point,
            has_opened_door: false,
            blend,
        }),
    ))
}

/// Step to the entry point and pull the door open. Letting go of the
/// controls finishes the entry; holding a direction walks away instead.
pub(super) fn update_open_door(
    base: &StateBase,
    open: &mut OpenDoorState,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    if base.timer > 0.3 && !open.has_opened_door {
        open.has_opened_door = true;
        if let Some(door) = &mut scene.seat_mut(open.seat)?.door {
            door.open();
        }
    }

    if base.animation_ended(ch, dt)? {
        if ch.any_direction() {
            ch.vehicle_entry = None;
            ch.attach_to_world(scene.vehicles);
            ch.set_physics_enabled(true, scene.physics);
            return ch.set_state(Transition::Idle, scene);
        }
        return ch.set_state(
            Transition::EnteringVehicle {
                seat: open.seat,
                entry_point: open.entry_point.clone(),
            },
            scene,
        );
    }

    let t = open.blend.simulate(dt);
    let position = open.blend.start_position.lerp(open.blend.end_position, t);
    ch.set_position(position, scene.physics);
    ch.quaternion = open.blend.rotation_at(t);
    Ok(())
}

pub(super) fn entering_vehicle(
    ch: &mut Character,
    scene: &mut Scene,
    seat: SeatHandle,
    entry_point: EntryPoint,
) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "entering_vehicle");
    base.can_find_vehicles_to_enter = false;

    let airplane = scene.vehicle(seat.vehicle)?.is_airplane();
    let target = scene.seat(seat)?;
    let (seat_position, seat_rotation) = (target.position, target.rotation);

    let side = detect_relative_side(entry_point.position, entry_point.rotation, seat_position);
    let (clip, end_early) = if airplane {
        (side_clip(side, "enter_airplane_left", "enter_airplane_right"), 0.3)
    } else {
        (side_clip(side, "sit_down_left", "sit_down_right"), 0.0)
    };
    base.play_animation(ch, clip, 0.1);

    ch.reset_velocity(scene.physics);
    ch.set_physics_enabled(false, scene.physics);
    ch.attach_to_vehicle(seat.vehicle, scene.vehicle(seat.vehicle)?);

    let start = entry_point.position + Vec3::Y * ENTRY_HEIGHT;
    let end = seat_position + Vec3::Y * 0.6;
    let initial_offset = start - ch.position;
    let blend = MotionBlend::sprung(start, end, ch.quaternion, seat_rotation);

    Ok(CharacterState::new(
        base,
        StateKind::EnteringVehicle(EnteringState {
            seat,
            end_early,
            initial_offset,
            blend,
        }),
    ))
}

/// Sit down. The spring closes the gap left by the walk-up while the eased
/// factor carries the character from the entry point to the seat.
pub(super) fn update_entering(
    base: &StateBase,
    entering: &mut EnteringState,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    let handle = entering.seat;

    if base.animation_ended(ch, dt)? {
        if !scene.seat(handle)?.is_free_for(ch.id) {
            // Someone got there first: step back out at the entry point.
            log::debug!("character {:?} found seat {} taken on sitting down", ch.id, handle.seat);
            ch.vehicle_entry = None;
            ch.set_position(entering.blend.start_position, scene.physics);
            ch.detach_from_vehicle(handle.vehicle, scene)?;
            return ch.set_state(Transition::Idle, scene);
        }
        ch.occupy_seat(handle, scene)?;
        ch.set_position(entering.blend.end_position, scene.physics);

        let seat = scene.seat_mut(handle)?;
        if seat.is_driver() {
            if let Some(door) = &mut seat.door {
                door.physics_enabled = true;
            }
        }
        let transition = seated_transition(seat.seat_type, handle);
        return ch.set_state(transition, scene);
    }

    if let Some(door) = &mut scene.seat_mut(handle)?.door {
        door.physics_enabled = false;
        door.rotation = 1.0;
    }

    let span = base.animation_length.unwrap_or(0.0) - entering.end_early;
    let sine = ease_in_out_sine(progress(base, span));
    let spring = entering.blend.simulate(dt);

    let offset = entering.initial_offset.lerp(Vec3::ZERO, spring);
    let blend = &entering.blend;
    let position = (blend.start_position - offset).lerp(blend.end_position, sine);
    ch.set_position(position, scene.physics);
    ch.quaternion = blend.rotation_at(spring);
    Ok(())
}

// ============================================================================
// Seated
// ============================================================================

pub(super) fn driving(ch: &mut Character, scene: &mut Scene, seat: SeatHandle) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "driving");
    base.can_find_vehicles_to_enter = false;
    base.play_animation(ch, "driving", 0.1);

    ch.start_controlling_vehicle(seat.vehicle, scene)?;
    let requests = scene.vehicle_mut(seat.vehicle)?.on_input_change()?;
    ch.apply_vehicle_requests(requests, scene)?;
    ch.vehicle_entry = None;

    Ok(CharacterState::new(base, StateKind::Driving { seat }))
}

/// Whether a seated character should reach over and pull its open door shut.
fn should_close_door(scene: &Scene, seat: SeatHandle, idle_controls: bool) -> Result<bool, GameError> {
    Ok(scene
        .seat(seat)?
        .door
        .as_ref()
        .is_some_and(|door| !door.achieving_target_rotation && door.rotation > 0.0 && idle_controls))
}

pub(super) fn update_driving(seat: SeatHandle, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    let idle_controls = scene.vehicle(seat.vehicle)?.no_direction_pressed();
    if should_close_door(scene, seat, idle_controls)? {
        ch.set_state(Transition::CloseVehicleDoorInside { seat }, scene)?;
    }
    Ok(())
}

pub(super) fn sitting(ch: &mut Character, scene: &mut Scene, seat: SeatHandle) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "sitting");
    base.can_find_vehicles_to_enter = false;
    scene.push_ui(passenger_controls());
    base.play_animation(ch, "sitting", 0.1);
    Ok(CharacterState::new(base, StateKind::Sitting { seat }))
}

/// Close the door, or shuffle over when a pending entry wants the wheel.
pub(super) fn update_sitting(seat: SeatHandle, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if should_close_door(scene, seat, ch.no_direction())? {
        return ch.set_state(Transition::CloseVehicleDoorInside { seat }, scene);
    }

    let Some(entry) = &ch.vehicle_entry else {
        return Ok(());
    };
    if !entry.wants_to_drive {
        ch.vehicle_entry = None;
        return Ok(());
    }

    let vehicle = scene.vehicle_mut(seat.vehicle)?;
    let Some(to) = vehicle.free_connected_seat(seat.seat, ch.id, true) else {
        log::debug!("character {:?} stays a passenger: no free driver seat", ch.id);
        ch.vehicle_entry = None;
        return Ok(());
    };

    if let Some(door) = vehicle.seat_mut(seat.seat).and_then(|s| s.door.as_mut()) {
        if door.rotation > 0.0 {
            door.physics_enabled = true;
        }
    }
    ch.set_state(
        Transition::SwitchingSeats {
            vehicle: seat.vehicle,
            from: seat.seat,
            to,
        },
        scene,
    )
}

/// Sitting handles its own input: no vehicle search while seated.
pub(super) fn sitting_input(seat: SeatHandle, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.actions.just_pressed("seat_switch") {
        if let Some(to) = scene.vehicle(seat.vehicle)?.free_connected_seat(seat.seat, ch.id, false) {
            return ch.set_state(
                Transition::SwitchingSeats {
                    vehicle: seat.vehicle,
                    from: seat.seat,
                    to,
                },
                scene,
            );
        }
    }

    if ch.actions.just_pressed("enter") {
        ch.exit_vehicle(scene)?;
        scene.push_ui(on_foot_controls());
    }
    Ok(())
}

pub(super) fn switching_seats(
    ch: &mut Character,
    scene: &mut Scene,
    vehicle: VehicleId,
    from: usize,
    to: usize,
) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "switching_seats");
    base.can_find_vehicles_to_enter = false;
    base.can_leave_vehicles = false;

    ch.leave_seat(scene);
    ch.occupy_seat(SeatHandle::new(vehicle, to), scene)?;

    let from_seat = scene.seat(SeatHandle::new(vehicle, from))?;
    let to_seat = scene.seat(SeatHandle::new(vehicle, to))?;
    let right = from_seat.rotation * Vec3::X;
    let view = (to_seat.position - from_seat.position).normalize_or_zero();
    let side = if right.dot(view) > 0.0 { Side::Left } else { Side::Right };
    let blend = MotionBlend::eased(
        from_seat.sitting_position(),
        to_seat.sitting_position(),
        from_seat.rotation,
        to_seat.rotation,
    );

    base.play_animation(ch, side_clip(side, "sitting_shift_left", "sitting_shift_right"), 0.1);
    Ok(CharacterState::new(
        base,
        StateKind::SwitchingSeats(SwitchingState { vehicle, from, to, blend }),
    ))
}

pub(super) fn update_switching(
    base: &StateBase,
    switch: &mut SwitchingState,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    let handle = SeatHandle::new(switch.vehicle, switch.to);

    if base.animation_ended(ch, dt)? {
        let transition = seated_transition(scene.seat(handle)?.seat_type, handle);
        return ch.set_state(transition, scene);
    }

    let sine = ease_in_out_sine(progress(base, base.animation_length.unwrap_or(0.0)));
    let position = switch.blend.start_position.lerp(switch.blend.end_position, sine);
    ch.set_position(position, scene.physics);
    ch.quaternion = switch.blend.rotation_at(sine);
    Ok(())
}

// ============================================================================
// Doors from inside and outside
// ============================================================================

fn door_side(scene: &Scene, seat: SeatHandle) -> Result<Side, GameError> {
    let seat = scene.seat(seat)?;
    Ok(seat
        .door
        .as_ref()
        .map(|door| detect_relative_side(seat.position, seat.rotation, door.hinge_position))
        .unwrap_or(Side::Left))
}

pub(super) fn close_door_inside(
    ch: &mut Character,
    scene: &mut Scene,
    seat: SeatHandle,
) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "close_vehicle_door_inside");
    base.can_find_vehicles_to_enter = false;
    base.can_leave_vehicles = false;

    let side = door_side(scene, seat)?;
    base.play_animation(ch, side_clip(side, "close_door_sitting_left", "close_door_sitting_right"), 0.1);

    if let Some(door) = &mut scene.seat_mut(seat)?.door {
        door.open();
    }
    Ok(CharacterState::new(
        base,
        StateKind::CloseVehicleDoorInside {
            seat,
            has_closed_door: false,
        },
    ))
}

pub(super) fn update_close_door_inside(
    base: &StateBase,
    seat: SeatHandle,
    has_closed_door: &mut bool,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    if base.timer > 0.4 && !*has_closed_door {
        *has_closed_door = true;
        if let Some(door) = &mut scene.seat_mut(seat)?.door {
            door.close();
        }
    }

    if base.animation_ended(ch, dt)? {
        let transition = seated_transition(scene.seat(seat)?.seat_type, seat);
        ch.set_state(transition, scene)?;
    }
    Ok(())
}

pub(super) fn close_door_outside(
    ch: &mut Character,
    scene: &mut Scene,
    seat: SeatHandle,
) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "close_vehicle_door_outside");
    base.can_find_vehicles_to_enter = false;

    // Standing outside, the door is on the opposite hand.
    let side = door_side(scene, seat)?;
    base.play_animation(ch, side_clip(side, "close_door_standing_right", "close_door_standing_left"), 0.1);

    Ok(CharacterState::new(
        base,
        StateKind::CloseVehicleDoorOutside {
            seat,
            has_closed_door: false,
        },
    ))
}

pub(super) fn update_close_door_outside(
    base: &StateBase,
    seat: SeatHandle,
    has_closed_door: &mut bool,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    if base.timer > 0.3 && !*has_closed_door {
        *has_closed_door = true;
        if let Some(door) = &mut scene.seat_mut(seat)?.door {
            door.close();
        }
    }

    if base.animation_ended(ch, dt)? {
        ch.leave_seat(scene);
        ch.set_state(Transition::Idle, scene)?;
    }
    Ok(())
}

// ============================================================================
// Getting out
// ============================================================================

fn exiting_base(ch: &mut Character, scene: &mut Scene, seat: SeatHandle, name: &'static str) -> Result<StateBase, GameError> {
    let mut base = StateBase::enter(ch, name);
    base.can_find_vehicles_to_enter = false;
    if let Some(door) = &mut scene.seat_mut(seat)?.door {
        door.open();
    }
    Ok(base)
}

pub(super) fn exiting_vehicle(ch: &mut Character, scene: &mut Scene, seat: SeatHandle) -> Result<CharacterState, GameError> {
    let target = scene.seat(seat)?;
    let Some(exit) = target.entry_points.first().cloned() else {
        return Err(GameError::InvalidMetadata {
            object: target.name.clone(),
            key: "entry_points",
        });
    };
    let side = detect_relative_side(target.position, target.rotation, exit.position);

    let mut base = exiting_base(ch, scene, seat, "exiting_vehicle")?;
    base.play_animation(ch, side_clip(side, "stand_up_left", "stand_up_right"), 0.1);

    let blend = MotionBlend::eased(
        ch.position,
        exit.position + Vec3::Y * EXIT_HEIGHT,
        ch.quaternion,
        ch.quaternion,
    );
    Ok(CharacterState::new(
        base,
        StateKind::ExitingVehicle(ExitingState {
            seat,
            facing: ExitFacing::ExitPoint(exit.rotation),
            blend,
        }),
    ))
}

pub(super) fn update_exiting_vehicle(
    base: &StateBase,
    exit: &mut ExitingState,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    let seat = exit.seat;

    if base.animation_ended(ch, dt)? {
        ch.detach_from_vehicle(seat.vehicle, scene)?;

        let has_door = match &mut scene.seat_mut(seat)?.door {
            Some(door) => {
                door.physics_enabled = true;
                true
            }
            None => false,
        };
        let vehicle_speed = scene.vehicle(seat.vehicle)?.chassis_velocity(scene.physics).length();

        let next = if ch.ray.is_none() {
            Transition::Falling
        } else if vehicle_speed > 1.0 {
            Transition::DropRolling
        } else if ch.any_direction() || !has_door {
            Transition::Idle
        } else {
            return ch.set_state(Transition::CloseVehicleDoorOutside { seat }, scene);
        };
        ch.leave_seat(scene);
        return ch.set_state(next, scene);
    }

    if let Some(door) = &mut scene.seat_mut(seat)?.door {
        door.physics_enabled = false;
    }

    let sine = ease_in_out_sine(progress(base, base.animation_length.unwrap_or(0.0)));
    exit.blend.end_rotation = exit.end_rotation(scene.vehicle(seat.vehicle)?);
    let position = exit.blend.start_position.lerp(exit.blend.end_position, sine);
    ch.set_position(position, scene.physics);
    ch.quaternion = exit.blend.rotation_at(sine);
    Ok(())
}

/// Climb up out of an open cockpit and drop off the side.
pub(super) fn exiting_airplane(ch: &mut Character, scene: &mut Scene, seat: SeatHandle) -> Result<CharacterState, GameError> {
    let forward = scene.vehicle(seat.vehicle)?.forward();

    let mut base = exiting_base(ch, scene, seat, "exiting_airplane")?;
    base.play_animation(ch, "jump_idle", 0.1);

    let blend = MotionBlend::eased(ch.position, ch.position + Vec3::Y, ch.quaternion, ch.quaternion);
    Ok(CharacterState::new(
        base,
        StateKind::ExitingAirplane(ExitingState {
            seat,
            facing: ExitFacing::World(forward),
            blend,
        }),
    ))
}

pub(super) fn update_exiting_airplane(
    base: &StateBase,
    exit: &mut ExitingState,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    const BEGINNING_CUTOFF: f32 = 0.3;
    let seat = exit.seat;

    if base.animation_ended(ch, dt)? {
        ch.detach_from_vehicle(seat.vehicle, scene)?;
        ch.leave_seat(scene);
        return ch.set_state(Transition::Falling, scene);
    }

    let played = progress(base, base.animation_length.unwrap_or(0.0));
    let factor = ((played - BEGINNING_CUTOFF) / (1.0 - BEGINNING_CUTOFF)).clamp(0.0, 1.0);
    let smooth = ease_out_quad(factor);

    exit.blend.end_rotation = exit.end_rotation(scene.vehicle(seat.vehicle)?);
    let position = exit.blend.start_position.lerp(exit.blend.end_position, smooth);
    ch.set_position(position, scene.physics);
    ch.quaternion = exit.blend.rotation_at(smooth);
    Ok(())
}
