//! Character tuning.
//!
//! All values use metric units (meters, seconds) unless otherwise noted.

use serde::{Deserialize, Serialize};

use roadside_physics::GroundContactConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    // ========================================================================
    // Springs
    // ========================================================================
    /// Rate every character spring runs at (frames/second).
    pub spring_fps: f32,
    pub velocity_mass: f32,
    pub velocity_damping: f32,
    pub rotation_mass: f32,
    pub rotation_damping: f32,

    // ========================================================================
    // Capsule
    // ========================================================================
    pub capsule_mass: f32,
    pub capsule_radius: f32,
    pub capsule_height: f32,
    pub capsule_segments: usize,

    // ========================================================================
    // Grounding
    // ========================================================================
    pub ground: GroundContactConfig,

    // ========================================================================
    // Vehicles
    // ========================================================================
    /// Vehicles must be strictly closer than this to be considered for entry.
    pub vehicle_search_radius: f32,

    /// Planar distance to the entry point at which the character gets in.
    pub entry_commit_distance: f32,

    /// Largest height of the entry point above the character that still commits.
    pub entry_commit_height: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            spring_fps: 60.0,
            velocity_mass: 50.0,
            velocity_damping: 0.8,
            rotation_mass: 10.0,
            rotation_damping: 0.5,
            capsule_mass: 1.0,
            capsule_radius: 0.25,
            capsule_height: 0.5,
            capsule_segments: 8,
            ground: GroundContactConfig::default(),
            vehicle_search_radius: 10.0,
            entry_commit_distance: 0.2,
            entry_commit_height: 2.0,
        }
    }
}

impl CharacterConfig {
    /// Scale from unit arcade velocity to meters/second.
    #[inline]
    pub fn move_speed(&self) -> f32 {
        self.ground.move_speed
    }
}
