//! Ground states: standing, walking, sprinting and their transitions.

use std::f32::consts::PI;

use roadside_physics::math::signed_angle_y;

use super::{fall_in_air, set_start_walk_state, CharacterState, StartDirection, StateBase, StateKind, Transition};
use crate::character::Character;
use crate::error::GameError;
use crate::scene::Scene;

/// Arcade speed above which a stop plays the end-walk animation.
const END_WALK_SPEED: f32 = 1.0;

/// Arcade speed above which moving again skips the start-walk animations.
const RESUME_WALK_SPEED: f32 = 0.5;

// ============================================================================
// Entry
// ============================================================================

pub(crate) fn idle(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "idle");
    ch.velocity_simulator.damping = 0.6;
    ch.velocity_simulator.mass = 10.0;
    ch.set_arcade_velocity_target(0.0);
    base.play_animation(ch, "idle", 0.1);
    CharacterState::new(base, StateKind::Idle)
}

pub(super) fn idle_rotate_right(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "idle_rotate_right");
    ch.rotation_simulator.mass = 30.0;
    ch.rotation_simulator.damping = 0.6;
    ch.velocity_simulator.damping = 0.6;
    ch.velocity_simulator.mass = 10.0;
    ch.set_arcade_velocity_target(0.0);
    base.play_animation(ch, "rotate_right", 0.1);
    CharacterState::new(base, StateKind::IdleRotateRight)
}

pub(super) fn walk(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "walk");
    base.can_enter_vehicles = true;
    ch.set_arcade_velocity_target(0.8);
    base.play_animation(ch, "run", 0.1);
    CharacterState::new(base, StateKind::Walk)
}

pub(super) fn sprint(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "sprint");
    base.can_enter_vehicles = true;
    ch.velocity_simulator.mass = 10.0;
    ch.rotation_simulator.damping = 0.8;
    ch.rotation_simulator.mass = 50.0;
    ch.set_arcade_velocity_target(1.4);
    base.play_animation(ch, "sprint", 0.1);
    CharacterState::new(base, StateKind::Sprint)
}

pub(super) fn end_walk(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "end_walk");
    ch.set_arcade_velocity_target(0.0);
    base.play_animation(ch, "stop", 0.1);
    CharacterState::new(base, StateKind::EndWalk)
}

pub(super) fn start_walk(ch: &mut Character, direction: StartDirection) -> CharacterState {
    let mut base = StateBase::enter(ch, direction.state_name());
    base.can_enter_vehicles = true;
    ch.rotation_simulator.mass = 20.0;
    ch.rotation_simulator.damping = 0.7;
    ch.set_arcade_velocity_target(0.8);
    base.play_animation(ch, direction.clip(), 0.1);
    CharacterState::new(base, StateKind::StartWalk(direction))
}

// ============================================================================
// Update
// ============================================================================

pub(super) fn update_idle(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    fall_in_air(ch, scene).map(|_| ())
}

/// IdleRotateRight and EndWalk: fall, or settle into Idle when the clip ends.
pub(super) fn update_until_idle(
    base: &StateBase,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    if fall_in_air(ch, scene)? {
        return Ok(());
    }
    if base.animation_ended(ch, dt)? {
        ch.set_state(Transition::Idle, scene)?;
    }
    Ok(())
}

/// Walk and Sprint.
pub(super) fn update_moving(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    ch.set_camera_relative_orientation_target();
    fall_in_air(ch, scene).map(|_| ())
}

pub(super) fn update_start_walk(
    base: &StateBase,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    ch.set_camera_relative_orientation_target();
    if fall_in_air(ch, scene)? {
        return Ok(());
    }
    if base.animation_ended(ch, dt)? {
        ch.set_state(Transition::Walk, scene)?;
    }
    Ok(())
}

// ============================================================================
// Input
// ============================================================================

/// Idle and IdleRotateRight.
pub(super) fn idle_input(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.any_direction() {
        if ch.velocity.length() > RESUME_WALK_SPEED {
            ch.set_state(Transition::Walk, scene)
        } else {
            set_start_walk_state(ch, scene)
        }
    } else if ch.actions.just_pressed("jump") {
        ch.set_state(Transition::JumpIdle, scene)
    } else {
        Ok(())
    }
}

pub(super) fn walk_input(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.no_direction() {
        if ch.velocity.length() > END_WALK_SPEED {
            ch.set_state(Transition::EndWalk, scene)
        } else {
            ch.set_state(Transition::Idle, scene)
        }
    } else if ch.actions.just_pressed("jump") {
        ch.set_state(Transition::JumpRunning, scene)
    } else if ch.actions.is_pressed("run") {
        ch.set_state(Transition::Sprint, scene)
    } else {
        Ok(())
    }
}

pub(super) fn sprint_input(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.no_direction() {
        ch.set_state(Transition::EndWalk, scene)
    } else if ch.actions.just_pressed("jump") {
        ch.set_state(Transition::JumpRunning, scene)
    } else if !ch.actions.is_pressed("run") {
        ch.set_state(Transition::Walk, scene)
    } else {
        Ok(())
    }
}

pub(super) fn end_walk_input(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.any_direction() {
        if ch.actions.is_pressed("run") {
            ch.set_state(Transition::Sprint, scene)
        } else if ch.velocity.length() > RESUME_WALK_SPEED {
            ch.set_state(Transition::Walk, scene)
        } else {
            set_start_walk_state(ch, scene)
        }
    } else if ch.actions.just_pressed("jump") {
        ch.set_state(Transition::JumpIdle, scene)
    } else {
        Ok(())
    }
}

/// Letting go right after starting to walk while the character is still
/// turning hard right plays the rotate-in-place animation instead.
pub(super) fn start_walk_input(base: &StateBase, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.actions.just_pressed("run") {
        ch.set_state(Transition::Sprint, scene)
    } else if ch.no_direction() {
        let turning = signed_angle_y(ch.orientation, ch.orientation_target);
        if base.timer < 0.1 && turning < -PI * 0.4 {
            ch.set_state(Transition::IdleRotateRight, scene)
        } else {
            ch.set_state(Transition::Idle, scene)
        }
    } else if ch.actions.just_pressed("jump") {
        ch.set_state(Transition::JumpRunning, scene)
    } else {
        Ok(())
    }
}
