//! Roadside game logic
//!
//! This crate contains the third-person gameplay core:
//!
//! - Characters driven by a state machine over spring-smoothed motion
//! - Vehicles with seats, doors and a car controller
//! - Vehicle entry, exit and seat switching
//! - AI behaviours that press the same actions a player would
//! - The world arena, input routing and level spawning
//!
//! # Architecture
//!
//! Entities live in arenas and refer to each other by handle. A character
//! being updated is lifted out of its arena and sees the rest of the world
//! through a [`Scene`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            World                              │
//! │  ┌─────────┐    ┌────────────┐    ┌───────────┐               │
//! │  │ Input   │───►│ Characters │───►│ Vehicles  │               │
//! │  │ events  │    │ (states,   │◄───│ (seats,   │               │
//! │  └─────────┘    │  springs)  │req │  doors)   │               │
//! │                 └─────┬──────┘    └─────┬─────┘               │
//! │                       ▼                 ▼                     │
//! │              ┌─────────────────────────────────┐  ┌────────┐  │
//! │              │ Physics (fixed step, raycasts)  │  │ UI     │  │
//! │              └─────────────────────────────────┘  │ events │  │
//! │                                                   └────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod ai;
pub mod animation;
pub mod arena;
pub mod character;
pub mod error;
pub mod events;
pub mod input;
pub mod level;
pub mod metadata;
pub mod path;
pub mod random;
pub mod scene;
pub mod vehicle;
pub mod world;

// Re-export main types
pub use ai::{Behaviour, FollowPath, FollowTarget, RandomBehaviour};
pub use animation::AnimationPlayer;
pub use arena::{Arena, CharacterId, PathId, SeatHandle, VehicleId};
pub use character::{Character, CharacterConfig, CharacterState, StateKind, Transition};
pub use error::GameError;
pub use events::{ControlHint, UiEvent};
pub use input::{ActionMap, InputEvent};
pub use level::{Level, SpawnPoint};
pub use path::{Path, PathNode};
pub use scene::Scene;
pub use vehicle::{Vehicle, VehicleDescription, VehicleRequest};
pub use world::{World, WorldConfig};

// Re-export physics types for convenience
pub use roadside_physics::{CollisionGroups, PhysicsConfig, PhysicsWorld};
