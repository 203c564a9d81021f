//! Character movement physics.
//!
//! Characters are driven by a spring-smoothed arcade velocity that is written
//! into a dynamic capsule body around each physics step:
//!
//! - Feet raycast before integration
//! - Velocity reconciliation, slope alignment and ground snap after it
//! - Jump impulse at the end of the post-step
//!
//! # Design
//!
//! The [`GroundContactResolver`] is stateless apart from its configuration;
//! the per-character ray result and jump flag live with the character.

mod config;
mod ground;

pub use config::GroundContactConfig;
pub use ground::{ArcadeMotion, GroundContactResolver, GroundHit, JumpRequest, PostStepOutcome};
