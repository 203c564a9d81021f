//! Roadside Physics
//!
//! The motion layer underneath the character and vehicle gameplay code. It
//! has no notion of states, seats or input; it only moves bodies.
//!
//! # Architecture
//!
//! - **Spring**: fixed-rate spring simulators that smooth gameplay targets
//! - **Collision**: static geometry and closest-hit raycasts
//! - **World**: rigid bodies, gravity and the fixed-step integrator
//! - **Vehicle**: raycast wheel suspension, drive and friction
//! - **Movement**: character feet raycast and ground reconciliation
//!
//! # Design Principles
//!
//! 1. **Determinism**: same inputs and time steps always produce the same outputs
//! 2. **Fixed steps**: springs and integration run at their own rates,
//!    decoupled from the caller's frame rate
//! 3. **Handles**: bodies are addressed by [`BodyHandle`], never by reference

pub mod body;
pub mod collision;
pub mod error;
pub mod math;
pub mod movement;
pub mod spring;
pub mod vehicle;
pub mod world;

// Re-export commonly used types
pub use body::{BodyHandle, Collider, ColliderShape, RigidBody};
pub use collision::{CollisionGroups, CollisionWorld, RaycastResult};
pub use error::PhysicsError;
pub use math::Side;
pub use movement::{
    ArcadeMotion, GroundContactConfig, GroundContactResolver, GroundHit, JumpRequest,
    PostStepOutcome,
};
pub use spring::{RelativeSpringSimulator, ScalarSpring, SpringSimulator, VectorSpring};
pub use vehicle::{RaycastVehicle, WheelInfo, WheelOptions};
pub use world::{PhysicsConfig, PhysicsWorld};
