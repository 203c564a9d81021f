use glam::Vec3;

use roadside_physics::math::signed_angle_y;

use crate::arena::VehicleId;
use crate::character::Character;
use crate::error::GameError;
use crate::scene::Scene;

/// Walk or drive towards a point.
#[derive(Debug, Clone)]
pub struct FollowTarget {
    pub target: Vec3,
    pub stop_distance: f32,
    pub is_target_reached: bool,
}

impl FollowTarget {
    /// Steering dead zone in radians.
    const STEER_THRESHOLD: f32 = 0.15;

    pub fn new(target: Vec3) -> Self {
        Self::with_stop_distance(target, 1.3)
    }

    pub fn with_stop_distance(target: Vec3, stop_distance: f32) -> Self {
        Self {
            target,
            stop_distance,
            is_target_reached: false,
        }
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn update(&mut self, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
        match ch.controlled_vehicle {
            Some(vehicle) => self.drive(vehicle, ch, scene),
            None => self.walk(ch, scene),
        }
    }

    fn walk(&mut self, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
        let view = self.target - ch.world_position(scene.vehicles);
        ch.set_view_vector(view);

        self.is_target_reached = view.length() <= self.stop_distance;
        if self.is_target_reached {
            ch.trigger_action("up", false, scene)?;
            ch.set_orientation(view, false);
        } else {
            ch.trigger_action("up", true, scene)?;
        }
        Ok(())
    }

    fn drive(&mut self, vehicle_id: VehicleId, ch: &mut Character, scene: &mut Scene) -> Result<(), GameError> {
        let source = ch.world_position(scene.vehicles);
        let vehicle = scene.vehicle(vehicle_id)?;

        let view = self.target - source;
        self.is_target_reached = view.length() <= self.stop_distance;

        let forward = vehicle.forward();
        let view = Vec3::new(view.x, 0.0, view.z).normalize_or_zero();
        let angle = signed_angle_y(forward, view);
        let going_forward = forward.dot(vehicle.chassis_velocity(scene.physics)) > 0.0;
        let ahead = forward.dot(view) >= 0.0;
        let facing_view = forward.dot(view) > 0.0;

        let mut presses = vec![("throttle", ahead), ("reverse", !ahead)];
        if angle.abs() > Self::STEER_THRESHOLD {
            // Rolling backwards turns the wheels the other way.
            let steer_left = if facing_view || going_forward { angle > 0.0 } else { angle < 0.0 };
            presses.push(("left", steer_left));
            presses.push(("right", !steer_left));
        } else {
            presses.push(("left", false));
            presses.push(("right", false));
        }

        press_vehicle_actions(vehicle_id, &presses, ch, scene)
    }
}

/// Press vehicle actions on behalf of its driver and apply whatever the
/// vehicle asks of the driver in return.
pub(super) fn press_vehicle_actions(
    vehicle_id: VehicleId,
    presses: &[(&str, bool)],
    ch: &mut Character,
    scene: &mut Scene,
) -> Result<(), GameError> {
    let vehicle = scene.vehicle_mut(vehicle_id)?;
    let mut requests = Vec::new();
    for &(name, pressed) in presses {
        requests.extend(vehicle.trigger_action(name, pressed)?);
    }
    ch.apply_vehicle_requests(requests, scene)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use glam::Quat;
    use roadside_physics::{CollisionGroups, PhysicsWorld};

    use super::*;
    use crate::arena::Arena;
    use crate::character::CharacterConfig;
    use crate::path::Path;
    use crate::vehicle::{Vehicle, VehicleDescription};

    fn ground() -> PhysicsWorld {
        let mut physics = PhysicsWorld::with_default_config();
        physics.collision.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), CollisionGroups::DEFAULT);
        physics
    }

    #[test]
    fn test_walks_until_within_stop_distance() {
        let mut physics = ground();
        let mut vehicles = Arena::new();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut ch = Character::new(CharacterConfig::default(), Vec3::new(0.0, 0.57, 0.0), None, &mut physics);
        ch.feet_raycast(&physics);
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        let mut follow = FollowTarget::new(Vec3::new(5.0, 0.57, 0.0));
        follow.update(&mut ch, &mut scene).unwrap();
        assert!(ch.actions.is_pressed("up"), "Far target: walk");
        assert!(!follow.is_target_reached);
        assert!((ch.view_vector - Vec3::X).length() < 1e-5, "View points at the target");

        follow.set_target(Vec3::new(1.0, 0.57, 0.0));
        follow.update(&mut ch, &mut scene).unwrap();
        assert!(!ch.actions.is_pressed("up"), "Close target: stop");
        assert!(follow.is_target_reached);
        assert!((ch.orientation_target - Vec3::X).length() < 1e-5, "Faces the target");
    }

    fn driving() -> (PhysicsWorld, Arena<Vehicle>, Character) {
        let mut physics = ground();
        let mut vehicles = Arena::new();
        let car = Vehicle::new(&VehicleDescription::sedan(), &mut physics, Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY)
            .expect("sedan builds");
        vehicles.insert(car);
        let mut ch = Character::new(CharacterConfig::default(), Vec3::new(3.0, 0.57, 0.0), None, &mut physics);
        {
            let paths: Arena<Path> = Arena::new();
            let mut ui = Vec::new();
            let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);
            ch.teleport_to_vehicle(VehicleId(0), 0, &mut scene).unwrap();
        }
        (physics, vehicles, ch)
    }

    #[test]
    fn test_drives_towards_target_ahead() {
        let (mut physics, mut vehicles, mut ch) = driving();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        let mut follow = FollowTarget::new(Vec3::new(0.0, 1.0, 30.0));
        follow.update(&mut ch, &mut scene).unwrap();

        let actions = &scene.vehicles.get(0).unwrap().actions;
        assert!(actions.is_pressed("throttle"));
        assert!(!actions.is_pressed("reverse"));
        assert!(!actions.is_pressed("left") && !actions.is_pressed("right"), "Straight ahead: no steering");
    }

    #[test]
    fn test_reverses_and_steers_towards_target_behind() {
        let (mut physics, mut vehicles, mut ch) = driving();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        // Behind and to the left (+X), car at rest.
        let mut follow = FollowTarget::new(Vec3::new(10.0, 1.0, -10.0));
        follow.update(&mut ch, &mut scene).unwrap();

        let actions = &scene.vehicles.get(0).unwrap().actions;
        assert!(actions.is_pressed("reverse"));
        assert!(!actions.is_pressed("throttle"));
        assert!(actions.is_pressed("right"), "Backing up swaps the steering direction");
        assert!(!actions.is_pressed("left"));
    }

    #[test]
    fn test_steers_left_towards_target_ahead_left() {
        let (mut physics, mut vehicles, mut ch) = driving();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        let mut follow = FollowTarget::new(Vec3::new(10.0, 1.0, 10.0));
        follow.update(&mut ch, &mut scene).unwrap();

        let actions = &scene.vehicles.get(0).unwrap().actions;
        assert!(actions.is_pressed("throttle"));
        assert!(actions.is_pressed("left"));
        assert!(!actions.is_pressed("right"));
    }
}
