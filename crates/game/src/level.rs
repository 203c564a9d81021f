//! Level description and spawning.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use roadside_physics::CollisionGroups;

use crate::ai::FollowPath;
use crate::arena::{CharacterId, VehicleId};
use crate::error::GameError;
use crate::metadata::AuthoredObject;
use crate::path::Path;
use crate::vehicle::VehicleDescription;
use crate::world::World;

/// Node radius given to AI drivers spawned onto a path.
const AI_NODE_RADIUS: f32 = 10.0;

/// Static axis-aligned box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Brush {
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Who sits behind the wheel of a spawned vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Driver {
    /// A character that receives the player's input.
    Player,
    /// A character that follows a path starting at the named node.
    Ai { first_node: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpawnPoint {
    Character {
        position: Vec3,
        /// Initial facing direction.
        forward: Vec3,
        /// Give this character the player's input.
        player: bool,
    },
    Vehicle {
        description: VehicleDescription,
        position: Vec3,
        rotation: Quat,
        driver: Option<Driver>,
    },
}

/// A level: static geometry, waypoint paths and spawn points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    pub brushes: Vec<Brush>,

    pub paths: Vec<Path>,

    pub spawn_points: Vec<SpawnPoint>,
}

/// Everything a level put into the world.
#[derive(Debug, Clone, Default)]
pub struct Spawned {
    pub characters: Vec<CharacterId>,
    pub vehicles: Vec<VehicleId>,
    pub player: Option<CharacterId>,
}

impl Level {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            brushes: Vec::new(),
            paths: Vec::new(),
            spawn_points: Vec::new(),
        }
    }

    pub fn add_brush(&mut self, center: Vec3, half_extents: Vec3) {
        self.brushes.push(Brush { center, half_extents });
    }

    /// A walled square with a looped track, a parked sedan, an AI driver on
    /// the track and the player standing next to the parked car.
    pub fn test_track() -> Self {
        let mut level = Self::new("test_track", "Test Track");

        // Floor
        level.add_brush(Vec3::new(0.0, -0.5, 0.0), Vec3::new(60.0, 0.5, 60.0));

        // Walls
        let wall_height = 3.0;
        let wall_thickness = 0.5;
        let size = 60.0;
        for (center, half_extents) in [
            (Vec3::new(0.0, 0.0, -size), Vec3::new(size, 0.0, wall_thickness)),
            (Vec3::new(0.0, 0.0, size), Vec3::new(size, 0.0, wall_thickness)),
            (Vec3::new(size, 0.0, 0.0), Vec3::new(wall_thickness, 0.0, size)),
            (Vec3::new(-size, 0.0, 0.0), Vec3::new(wall_thickness, 0.0, size)),
        ] {
            level.add_brush(
                center + Vec3::Y * wall_height / 2.0,
                half_extents + Vec3::Y * wall_height / 2.0,
            );
        }

        // Track: a square loop, counter-clockwise seen from above
        let corners = [
            ("track_a", Vec3::new(-40.0, 0.0, -40.0)),
            ("track_b", Vec3::new(40.0, 0.0, -40.0)),
            ("track_c", Vec3::new(40.0, 0.0, 40.0)),
            ("track_d", Vec3::new(-40.0, 0.0, 40.0)),
        ];
        let objects: Vec<AuthoredObject> = corners
            .iter()
            .enumerate()
            .map(|(i, (name, position))| {
                let next = corners[(i + 1) % corners.len()].0;
                let previous = corners[(i + corners.len() - 1) % corners.len()].0;
                AuthoredObject::new(name, *position)
                    .with_data("data", "pathNode")
                    .with_data("nextNode", next)
                    .with_data("previousNode", previous)
            })
            .collect();
        level.paths.push(Path::from_objects("track", &objects));

        level.spawn_points.push(SpawnPoint::Vehicle {
            description: VehicleDescription::sedan(),
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            driver: None,
        });
        level.spawn_points.push(SpawnPoint::Vehicle {
            description: VehicleDescription::sedan(),
            position: Vec3::new(-40.0, 0.0, -30.0),
            rotation: Quat::from_rotation_y(std::f32::consts::PI),
            driver: Some(Driver::Ai {
                first_node: "track_a".to_string(),
            }),
        });
        level.spawn_points.push(SpawnPoint::Character {
            position: Vec3::new(4.0, 0.57, 5.0),
            forward: Vec3::NEG_X,
            player: true,
        });

        level
    }

    /// Add this level's geometry, paths and spawns to `world`.
    pub fn load(&self, world: &mut World) -> Result<Spawned, GameError> {
        for brush in &self.brushes {
            world
                .physics
                .collision
                .add_box(brush.center, brush.half_extents, CollisionGroups::DEFAULT);
        }
        for path in &self.paths {
            world.add_path(path.clone());
        }

        let mut spawned = Spawned::default();
        for spawn_point in &self.spawn_points {
            match spawn_point {
                SpawnPoint::Character {
                    position,
                    forward,
                    player,
                } => {
                    let id = world.spawn_character(*position, None);
                    if let Some(character) = world.character_mut(id) {
                        character.set_orientation(*forward, true);
                    }
                    if *player {
                        world.take_control(id)?;
                        spawned.player = Some(id);
                    }
                    spawned.characters.push(id);
                }
                SpawnPoint::Vehicle {
                    description,
                    position,
                    rotation,
                    driver,
                } => {
                    let vehicle = world.spawn_vehicle(description, *position + Vec3::Y, *rotation)?;
                    spawned.vehicles.push(vehicle);

                    if let Some(driver) = driver {
                        let id = self.spawn_driver(world, vehicle, driver)?;
                        if *driver == Driver::Player {
                            spawned.player = Some(id);
                        }
                        spawned.characters.push(id);
                    }
                }
            }
        }

        log::info!(
            "level `{}` loaded: {} brushes, {} characters, {} vehicles",
            self.id,
            self.brushes.len(),
            spawned.characters.len(),
            spawned.vehicles.len()
        );
        Ok(spawned)
    }

    fn spawn_driver(&self, world: &mut World, vehicle: VehicleId, driver: &Driver) -> Result<CharacterId, GameError> {
        let position = world.vehicle(vehicle).ok_or(GameError::UnknownVehicle(vehicle))?.position;
        let id = world.spawn_character(position, None);
        world.with_character(id, |ch, scene| ch.teleport_to_vehicle(vehicle, 0, scene))?;

        match driver {
            Driver::Player => world.take_control(id)?,
            Driver::Ai { first_node } => match world.find_path_node(first_node) {
                Some((path, node)) => {
                    if let Some(character) = world.character_mut(id) {
                        character.behaviour = Some(FollowPath::new(path, node, AI_NODE_RADIUS).into());
                    }
                }
                None => log::error!("path node `{}` not found for AI driver of {:?}", first_node, vehicle),
            },
        }
        Ok(id)
    }

    pub fn player_spawn_count(&self) -> usize {
        self.spawn_points
            .iter()
            .filter(|s| match s {
                SpawnPoint::Character { player, .. } => *player,
                SpawnPoint::Vehicle { driver, .. } => driver.as_ref() == Some(&Driver::Player),
            })
            .count()
    }
}
