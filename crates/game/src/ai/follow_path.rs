use glam::Vec3;

use super::follow_target::{press_vehicle_actions, FollowTarget};
use crate::arena::PathId;
use crate::character::Character;
use crate::error::GameError;
use crate::path::NodeId;
use crate::scene::Scene;

/// Drive from node to node along a path.
///
/// Brakes ahead of sharp corners and puts the vehicle back on the path when
/// it has been stuck for a while.
#[derive(Debug, Clone)]
pub struct FollowPath {
    pub path: PathId,
    pub target_node: NodeId,
    pub node_radius: f32,
    /// Follow `previous` links instead of `next`.
    pub reverse: bool,
    follow: FollowTarget,
    stale_timer: f32,
}

impl FollowPath {
    const SLOW_DOWN_ANGLE: f32 = 0.7;
    const SLOW_DOWN_DISTANCE: f32 = 50.0;
    const SLOW_DOWN_SPEED: f32 = 10.0;
    const STALE_SPEED: f32 = 1.0;
    const STALE_TIMEOUT: f32 = 5.0;

    pub fn new(path: PathId, first_node: NodeId, node_radius: f32) -> Self {
        Self {
            path,
            target_node: first_node,
            node_radius,
            reverse: false,
            follow: FollowTarget::with_stop_distance(Vec3::ZERO, 0.0),
            stale_timer: 0.0,
        }
    }

    pub fn stale_timer(&self) -> f32 {
        self.stale_timer
    }

    pub fn update(&mut self, ch: &mut Character, scene: &mut Scene, dt: f32) -> Result<(), GameError> {
        let Some(path) = scene.path(self.path) else {
            log::warn!("character {:?} follows missing path {:?}", ch.id, self.path);
            return Ok(());
        };
        let Some(node) = path.node(self.target_node) else {
            log::warn!("path `{}` has no node {}", path.name, self.target_node);
            return Ok(());
        };

        self.follow.set_target(node.position);
        self.follow.update(ch, scene)?;

        let view = node.position - ch.world_position(scene.vehicles);
        let view = Vec3::new(view.x, 0.0, view.z);

        if let Some(vehicle_id) = ch.controlled_vehicle {
            let vehicle = scene.vehicle(vehicle_id)?;
            let speed = vehicle.chassis_velocity(scene.physics).length();
            let wheels_on_ground = vehicle.drivetrain.raycast.num_wheels_on_ground;

            let corner = node.next.and_then(|next| path.node(next)).map(|next| {
                let to_next = next.position - node.position;
                Vec3::new(to_next.x, 0.0, to_next.z).normalize_or_zero()
            });
            if let Some(to_next) = corner {
                let slow_down_angle = view.normalize_or_zero().dot(to_next);
                if slow_down_angle < Self::SLOW_DOWN_ANGLE
                    && view.length() < Self::SLOW_DOWN_DISTANCE
                    && speed > Self::SLOW_DOWN_SPEED
                {
                    press_vehicle_actions(vehicle_id, &[("reverse", true), ("throttle", false)], ch, scene)?;
                }
            }

            if speed < Self::STALE_SPEED || wheels_on_ground == 0 {
                self.stale_timer += dt;
            } else {
                self.stale_timer = 0.0;
            }
            if self.stale_timer > Self::STALE_TIMEOUT {
                log::info!("vehicle {:?} stuck, resetting at node `{}`", vehicle_id, node.name);
                let vehicle = scene
                    .vehicles
                    .get_mut(vehicle_id.0)
                    .ok_or(GameError::UnknownVehicle(vehicle_id))?;
                vehicle.reset_to(scene.physics, node.position + Vec3::Y * 3.0)?;
                self.stale_timer = 0.0;
            }
        }

        if view.length() < self.node_radius {
            let following = if self.reverse { node.previous } else { node.next };
            match following {
                Some(next) => self.target_node = next,
                None => log::debug!("path `{}` ends at node `{}`", path.name, node.name),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;
    use roadside_physics::{CollisionGroups, PhysicsWorld};

    use super::*;
    use crate::arena::{Arena, VehicleId};
    use crate::character::CharacterConfig;
    use crate::metadata::AuthoredObject;
    use crate::path::Path;
    use crate::vehicle::{Vehicle, VehicleDescription};

    fn square() -> Path {
        let corners = [
            ("a", Vec3::new(0.0, 0.0, 20.0), "b", "d"),
            ("b", Vec3::new(20.0, 0.0, 20.0), "c", "a"),
            ("c", Vec3::new(20.0, 0.0, 0.0), "d", "b"),
            ("d", Vec3::new(0.0, 0.0, 0.0), "a", "c"),
        ];
        let objects: Vec<AuthoredObject> = corners
            .iter()
            .map(|(name, position, next, previous)| {
                AuthoredObject::new(name, *position)
                    .with_data("data", "pathNode")
                    .with_data("nextNode", next)
                    .with_data("previousNode", previous)
            })
            .collect();
        Path::from_objects("square", &objects)
    }

    fn driving_world() -> (PhysicsWorld, Arena<Vehicle>, Character) {
        let mut physics = PhysicsWorld::with_default_config();
        physics.collision.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), CollisionGroups::DEFAULT);
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
    fn test_advances_within_node_radius() {
        let (mut physics, mut vehicles, mut ch) = driving_world();
        let mut paths = Arena::new();
        let path = PathId(paths.insert(square()));
        let mut ui = Vec::new();
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        // Node `d` is at the origin, right under the car.
        let mut follow = FollowPath::new(path, 3, 5.0);
        follow.update(&mut ch, &mut scene, 1.0 / 60.0).unwrap();
        assert_eq!(follow.target_node, 0, "d -> a");

        follow.reverse = true;
        follow.target_node = 3;
        follow.update(&mut ch, &mut scene, 1.0 / 60.0).unwrap();
        assert_eq!(follow.target_node, 2, "d -> c when reversed");
    }

    #[test]
    fn test_stuck_vehicle_is_reset_to_node() {
        let (mut physics, mut vehicles, mut ch) = driving_world();
        let mut paths = Arena::new();
        let path = PathId(paths.insert(square()));
        let mut ui = Vec::new();
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        let mut follow = FollowPath::new(path, 1, 5.0);
        for _ in 0..5 {
            follow.update(&mut ch, &mut scene, 1.0).unwrap();
        }
        assert!((follow.stale_timer() - 5.0).abs() < 1e-5, "Stationary car accumulates stale time");

        follow.update(&mut ch, &mut scene, 1.0).unwrap();
        assert_eq!(follow.stale_timer(), 0.0);
        let chassis = scene.vehicles.get(0).unwrap().chassis();
        let body = scene.physics.body(chassis).unwrap();
        assert!((body.position - Vec3::new(20.0, 3.0, 20.0)).length() < 1e-4, "Back on the path above node b");
        assert_eq!(body.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_missing_path_is_ignored() {
        let (mut physics, mut vehicles, mut ch) = driving_world();
        let paths: Arena<Path> = Arena::new();
        let mut ui = Vec::new();
        let mut scene = Scene::new(&mut physics, &mut vehicles, &paths, &mut ui);

        let mut follow = FollowPath::new(PathId(7), 0, 5.0);
        follow.update(&mut ch, &mut scene, 1.0 / 60.0).unwrap();
        assert_eq!(follow.target_node, 0);
    }
}
