//! Vector helpers shared by the character, vehicle and door code.
//!
//! Conventions follow a right-handed, Y-up frame where an object's local +Z
//! axis is its forward direction. A character facing +Z therefore has its
//! local +X axis pointing to its left.

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Which side of a reference object something lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Apply the horizontal part of a "look along `a`" basis to `b`.
///
/// `a` is a forward direction, `b` a local velocity (x = sideways, z = forward).
/// Y is passed through unchanged.
#[inline]
pub fn apply_vector_matrix_xz(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x * b.z + a.z * b.x, b.y, a.z * b.z - a.x * b.x)
}

/// Unsigned angle between two unit vectors, snapping near-parallel cases.
pub fn angle_between(v1: Vec3, v2: Vec3, dot_threshold: f32) -> f32 {
    let dot = v1.dot(v2);

    if dot > 1.0 - dot_threshold {
        0.0
    } else if dot < -1.0 + dot_threshold {
        PI
    } else {
        dot.acos()
    }
}

/// Signed angle from `v1` to `v2` around `normal`.
pub fn signed_angle(v1: Vec3, v2: Vec3, normal: Vec3) -> f32 {
    let angle = angle_between(v1, v2, 0.0005);
    let cross = v1.cross(v2);

    if normal.dot(cross) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Signed angle around world up.
#[inline]
pub fn signed_angle_y(v1: Vec3, v2: Vec3) -> f32 {
    signed_angle(v1, v2, Vec3::Y)
}

#[inline]
pub fn have_different_signs(a: f32, b: f32) -> bool {
    (a < 0.0) != (b < 0.0)
}

#[inline]
pub fn ease_in_out_sine(x: f32) -> f32 {
    -((PI * x).cos() - 1.0) / 2.0
}

#[inline]
pub fn ease_out_quad(x: f32) -> f32 {
    1.0 - (1.0 - x) * (1.0 - x)
}

/// Local +X of a rotation.
#[inline]
pub fn right_of(rotation: Quat) -> Vec3 {
    rotation * Vec3::X
}

/// Local +Y of a rotation.
#[inline]
pub fn up_of(rotation: Quat) -> Vec3 {
    rotation * Vec3::Y
}

/// Local +Z of a rotation.
#[inline]
pub fn forward_of(rotation: Quat) -> Vec3 {
    rotation * Vec3::Z
}

/// Rotation about Y whose forward (+Z) points along the horizontal part of `direction`.
///
/// Returns identity for a vertical or zero direction.
pub fn look_rotation_flat(direction: Vec3) -> Quat {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() < 1e-8 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(flat.x.atan2(flat.z))
}

/// Which side of `from` the point `to_position` is on.
///
/// Positive projection onto `from`'s local +X means Left.
pub fn detect_relative_side(from_position: Vec3, from_rotation: Quat, to_position: Vec3) -> Side {
    let right = right_of(from_rotation);
    let view = (to_position - from_position).normalize_or_zero();

    if right.dot(view) > 0.0 {
        Side::Left
    } else {
        Side::Right
    }
}

/// Rotate `v` about `axis` by `angle` radians.
#[inline]
pub fn rotate_about(v: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    Quat::from_axis_angle(axis.normalize_or_zero(), angle) * v
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_vector_matrix_xz_forward() {
        // Facing +Z, local forward stays forward
        let v = apply_vector_matrix_xz(Vec3::Z, Vec3::new(0.0, 0.0, 2.0));
        assert!((v - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-6);

        // Facing +X, local forward maps onto +X
        let v = apply_vector_matrix_xz(Vec3::X, Vec3::new(0.0, 1.0, 1.0));
        assert!((v - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6, "got {:?}", v);
    }

    #[test]
    fn test_angle_between_snaps() {
        assert_eq!(angle_between(Vec3::X, Vec3::X, 0.0005), 0.0);
        assert_eq!(angle_between(Vec3::X, -Vec3::X, 0.0005), PI);
        assert!((angle_between(Vec3::X, Vec3::Z, 0.0005) - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_signed_angle_direction() {
        // Z cross X = Y, so rotating forward to +X is positive about +Y
        assert!(signed_angle_y(Vec3::Z, Vec3::X) > 0.0);
        assert!(signed_angle_y(Vec3::Z, -Vec3::X) < 0.0);
    }

    #[test]
    fn test_easing_endpoints() {
        assert!(ease_in_out_sine(0.0).abs() < 1e-6);
        assert!((ease_in_out_sine(1.0) - 1.0).abs() < 1e-6);
        assert!((ease_in_out_sine(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(ease_out_quad(0.0), 0.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
    }

    #[test]
    fn test_detect_relative_side() {
        // Facing +Z, local +X is the left-hand side
        assert_eq!(
            detect_relative_side(Vec3::ZERO, Quat::IDENTITY, Vec3::new(2.0, 0.0, 0.0)),
            Side::Left
        );
        assert_eq!(
            detect_relative_side(Vec3::ZERO, Quat::IDENTITY, Vec3::new(-2.0, 0.0, 0.0)),
            Side::Right
        );
    }

    #[test]
    fn test_look_rotation_flat() {
        let rotation = look_rotation_flat(Vec3::new(1.0, 5.0, 0.0));
        assert!((forward_of(rotation) - Vec3::X).length() < 1e-5);
        assert_eq!(look_rotation_flat(Vec3::Y), Quat::IDENTITY);
    }
}
