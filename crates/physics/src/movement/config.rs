//! Ground contact configuration.
//!
//! All values use metric units (meters, seconds) unless otherwise noted.

use serde::{Deserialize, Serialize};

/// Configuration for character grounding and jumping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundContactConfig {
    // ========================================================================
    // Feet Ray
    // ========================================================================
    /// Distance from the body centre to the feet (meters). The body hovers
    /// this far above the ground point.
    pub ray_cast_length: f32,

    /// Extra ray length below the feet, and the lift applied on jump.
    pub ray_safe_offset: f32,

    // ========================================================================
    // Movement
    // ========================================================================
    /// Scale from the unit arcade velocity to meters/second.
    pub move_speed: f32,

    // ========================================================================
    // Jumping
    // ========================================================================
    /// Vertical velocity added on jump (meters/second).
    pub jump_impulse: f32,

    /// Multiplier on planar spring speed for explicit-speed jumps.
    pub jump_planar_multiplier: f32,
}

impl Default for GroundContactConfig {
    fn default() -> Self {
        Self {
            ray_cast_length: 0.57,
            ray_safe_offset: 0.03,
            move_speed: 4.0,
            jump_impulse: 4.0,
            jump_planar_multiplier: 4.0,
        }
    }
}

impl GroundContactConfig {
    /// Total length of the downward feet ray.
    #[inline]
    pub fn feet_ray_length(&self) -> f32 {
        self.ray_cast_length + self.ray_safe_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GroundContactConfig::default();
        assert!((config.feet_ray_length() - 0.6).abs() < 1e-6);
        assert_eq!(config.move_speed, 4.0);
    }
}
