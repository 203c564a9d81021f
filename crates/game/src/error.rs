//! Gameplay errors.
//!
//! Only configuration mistakes and stale handles surface here. Conditions the
//! game recovers from on its own (a missing clip, a duplicate registration, a
//! vehicle without seats) are logged and never returned.

use roadside_physics::PhysicsError;

use crate::arena::{CharacterId, VehicleId};

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A state checked its animation length but never played a clip.
    #[error("state {state} has no animation length; play a clip when entering it")]
    MissingAnimationLength { state: &'static str },

    #[error("unknown character {0:?}")]
    UnknownCharacter(CharacterId),

    #[error("unknown vehicle {0:?}")]
    UnknownVehicle(VehicleId),

    #[error("vehicle {vehicle:?} has no seat {seat}")]
    UnknownSeat { vehicle: VehicleId, seat: usize },

    #[error("seat {seat} of vehicle {vehicle:?} is taken by {by:?}")]
    SeatOccupied { vehicle: VehicleId, seat: usize, by: CharacterId },

    #[error("vehicle {vehicle:?} is already controlled by {by:?}")]
    VehicleControlled { vehicle: VehicleId, by: CharacterId },

    /// Authored metadata is missing a field the object cannot exist without.
    #[error("{object} is missing required metadata `{key}`")]
    InvalidMetadata { object: String, key: &'static str },

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
