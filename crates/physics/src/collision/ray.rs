//! Raycast results.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::BodyHandle;

/// Result of a closest-hit raycast.
///
/// Static geometry hits carry no body handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastResult {
    /// Whether anything was hit.
    pub has_hit: bool,

    /// World-space impact point. Equals the ray end when nothing was hit.
    pub hit_point: Vec3,

    /// Surface normal at the impact, pointing away from the surface.
    pub hit_normal: Vec3,

    /// Distance from the ray origin to the impact.
    pub distance: f32,

    /// Dynamic or kinematic body that was hit, if any.
    pub body: Option<BodyHandle>,
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self::miss(Vec3::ZERO)
    }
}

impl RaycastResult {
    pub fn miss(end: Vec3) -> Self {
        Self {
            has_hit: false,
            hit_point: end,
            hit_normal: Vec3::Y,
            distance: f32::INFINITY,
            body: None,
        }
    }

    pub fn hit(point: Vec3, normal: Vec3, distance: f32, body: Option<BodyHandle>) -> Self {
        Self {
            has_hit: true,
            hit_point: point,
            hit_normal: normal,
            distance,
            body,
        }
    }
}
