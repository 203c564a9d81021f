//! Collision queries.
//!
//! This module provides the static level geometry and the closest-hit raycast
//! used by character grounding and wheel suspension.
//!
//! # Key Types
//!
//! - [`CollisionWorld`]: static brushes (boxes, oriented boxes)
//! - [`RaycastResult`]: closest hit with point, normal and hit body
//! - [`CollisionGroups`]: group bits for filtering

mod groups;
mod ray;
mod world;

pub use groups::CollisionGroups;
pub use ray::RaycastResult;
pub use world::{to_isometry, CollisionBrush, CollisionWorld, StaticContact};

pub(crate) use world::{cast_shape, segment_ray};
