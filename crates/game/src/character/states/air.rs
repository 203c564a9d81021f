//! Airborne states and landings.

use glam::Vec3;

use super::{fall_in_air, set_drop_state, CharacterState, StartDirection, StateBase, StateKind, Transition};
use crate::character::Character;
use crate::error::GameError;
use crate::scene::Scene;

/// Air control blend once the feet have left the ground.
const AIR_INFLUENCE: Vec3 = Vec3::new(0.05, 0.0, 0.05);

/// Arcade speed target while steering in the air.
fn air_speed(ch: &Character) -> f32 {
    if ch.any_direction() {
        0.8
    } else {
        0.0
    }
}

// ============================================================================
// Jumps
// ============================================================================

pub(super) fn jump_idle(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "jump_idle");
    ch.velocity_simulator.mass = 50.0;
    ch.set_arcade_velocity_target(0.0);
    base.play_animation(ch, "jump_idle", 0.1);
    CharacterState::new(base, StateKind::JumpIdle { already_jumped: false })
}

/// Crouch, then jump straight up at 0.2s.
pub(super) fn update_jump_idle(
    base: &StateBase,
    already_jumped: &mut bool,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    if *already_jumped {
        ch.set_camera_relative_orientation_target();
        let speed = air_speed(ch);
        ch.set_arcade_velocity_target(speed);
    }

    if base.timer > 0.2 && !*already_jumped {
        ch.jump(-1.0);
        *already_jumped = true;
        ch.velocity_simulator.mass = 100.0;
        ch.rotation_simulator.damping = 0.3;

        // On a moving platform, keep the platform's velocity instead of steering.
        let on_moving_body = ch.ray.is_some_and(|hit| hit.body_velocity.length() > 0.0);
        if on_moving_body {
            ch.set_arcade_velocity_influence(Vec3::ZERO);
        } else {
            ch.set_arcade_velocity_influence(Vec3::new(0.3, 0.0, 0.3));
        }
    } else if base.timer > 0.3 && ch.ray.is_some() {
        set_drop_state(ch, scene)?;
    } else if base.animation_ended(ch, dt)? {
        ch.set_state(Transition::Falling, scene)?;
    }
    Ok(())
}

pub(super) fn jump_running(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "jump_running");
    ch.velocity_simulator.mass = 100.0;
    base.play_animation(ch, "jump_running", 0.03);
    CharacterState::new(base, StateKind::JumpRunning { already_jumped: false })
}

/// Take off at 0.13s keeping the running speed.
pub(super) fn update_jump_running(
    base: &StateBase,
    already_jumped: &mut bool,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    ch.set_camera_relative_orientation_target();
    if *already_jumped {
        let speed = air_speed(ch);
        ch.set_arcade_velocity_target(speed);
    }

    if base.timer > 0.13 && !*already_jumped {
        ch.jump(4.0);
        *already_jumped = true;
        ch.rotation_simulator.damping = 0.3;
        ch.arcade_velocity_is_additive = true;
        ch.set_arcade_velocity_influence(AIR_INFLUENCE);
    } else if base.timer > 0.24 && ch.ray.is_some() {
        set_drop_state(ch, scene)?;
    } else if base.animation_ended(ch, dt)? {
        ch.set_state(Transition::Falling, scene)?;
    }
    Ok(())
}

// ============================================================================
// Falling
// ============================================================================

pub(super) fn falling(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "falling");
    ch.velocity_simulator.mass = 100.0;
    ch.rotation_simulator.damping = 0.3;
    ch.arcade_velocity_is_additive = true;
    ch.set_arcade_velocity_influence(AIR_INFLUENCE);
    base.play_animation(ch, "falling", 0.3);
    CharacterState::new(base, StateKind::Falling)
}

pub(super) fn update_falling(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    ch.set_camera_relative_orientation_target();
    let speed = air_speed(ch);
    ch.set_arcade_velocity_target(speed);

    if ch.ray.is_some() {
        set_drop_state(ch, scene)?;
    }
    Ok(())
}

// ============================================================================
// Landings
// ============================================================================

/// Soft landing in place. Holding a direction walks straight off instead.
pub(super) fn drop_idle(ch: &mut Character, scene: &mut Scene) -> Result<CharacterState, GameError> {
    let mut base = StateBase::enter(ch, "drop_idle");
    ch.velocity_simulator.damping = 0.5;
    ch.velocity_simulator.mass = 7.0;
    ch.set_arcade_velocity_target(0.0);
    base.play_animation(ch, "drop_idle", 0.1);

    if ch.any_direction() {
        ch.set_state(Transition::StartWalk(StartDirection::Forward), scene)?;
    }
    Ok(CharacterState::new(base, StateKind::DropIdle))
}

pub(super) fn update_drop_idle(
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
        ch.set_state(Transition::Idle, scene)?;
    }
    Ok(())
}

pub(super) fn drop_idle_input(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.any_direction() {
        ch.set_state(Transition::StartWalk(StartDirection::Forward), scene)
    } else if ch.actions.just_pressed("jump") {
        ch.set_state(Transition::JumpIdle, scene)
    } else {
        Ok(())
    }
}

/// Hard landing: roll forward.
pub(super) fn drop_rolling(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "drop_rolling");
    ch.velocity_simulator.mass = 1.0;
    ch.velocity_simulator.damping = 0.6;
    ch.set_arcade_velocity_target(0.8);
    base.play_animation(ch, "drop_running_roll", 0.03);
    CharacterState::new(base, StateKind::DropRolling)
}

pub(super) fn update_drop_rolling(
    base: &StateBase,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    ch.set_camera_relative_orientation_target();
    if base.animation_ended(ch, dt)? {
        if ch.any_direction() {
            ch.set_state(Transition::Walk, scene)?;
        } else {
            ch.set_state(Transition::EndWalk, scene)?;
        }
    }
    Ok(())
}

pub(super) fn drop_running(ch: &mut Character) -> CharacterState {
    let mut base = StateBase::enter(ch, "drop_running");
    ch.set_arcade_velocity_target(0.8);
    base.play_animation(ch, "drop_running", 0.1);
    CharacterState::new(base, StateKind::DropRunning)
}

pub(super) fn update_drop_running(
    base: &StateBase,
    ch: &mut Character,
    scene: &mut Scene,
    dt: f32,
) -> Result<(), GameError> {
    ch.set_camera_relative_orientation_target();
    if base.animation_ended(ch, dt)? {
        ch.set_state(Transition::Walk, scene)?;
    }
    Ok(())
}

pub(super) fn drop_running_input(ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
    if ch.actions.just_pressed("jump") {
        ch.set_state(Transition::JumpRunning, scene)
    } else if ch.any_direction() && ch.actions.just_pressed("run") {
        ch.set_state(Transition::Sprint, scene)
    } else if ch.no_direction() {
        ch.set_state(Transition::EndWalk, scene)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationPlayer;
    use crate::arena::Arena;
    use crate::character::CharacterConfig;
    use crate::path::Path;
    use roadside_physics::{CollisionGroups, PhysicsWorld};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_running_jump_lands_into_walk() {
        let mut physics = PhysicsWorld::with_default_config();
        physics.collision.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), CollisionGroups::DEFAULT);
        let mut vehicles = Arena::new();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut ch = Character::new(
            CharacterConfig::default(),
            Vec3::new(0.0, 0.57, 0.0),
            Some(AnimationPlayer::character_clips()),
            &mut physics,
        );
        ch.feet_raycast(&physics);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        ch.actions.begin_trigger("up", true);
        ch.actions.end_trigger("up");
        ch.set_state(Transition::JumpRunning, &mut scene).unwrap();

        for _ in 0..9 {
            ch.update_state(DT, &mut scene).unwrap();
        }
        assert!(ch.wants_to_jump, "Take-off at 0.13s");
        assert_eq!(ch.init_jump_speed, 4.0);
        assert!(ch.arcade_velocity_is_additive);

        ch.ground_impact_velocity = Vec3::new(0.0, -1.0, 0.0);
        for _ in 0..8 {
            ch.update_state(DT, &mut scene).unwrap();
        }
        assert_eq!(ch.state_name(), "walk", "Gentle landing while holding a direction");
    }

    #[test]
    fn test_drop_rolling_at_clip_end() {
        let mut physics = PhysicsWorld::with_default_config();
        let mut vehicles = Arena::new();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut ch = Character::new(CharacterConfig::default(), Vec3::new(0.0, 5.0, 0.0), None, &mut physics);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        ch.set_state(Transition::DropRolling, &mut scene).unwrap();
        assert_eq!(ch.velocity_target.z, 0.8);
        ch.update_state(DT, &mut scene).unwrap();
        assert_eq!(ch.state_name(), "end_walk", "Without a player the roll ends at once");
    }
}
