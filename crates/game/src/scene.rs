//! Borrowed view of the world handed to a character while it updates.
//!
//! The world takes the character being updated out of its arena, so a
//! character never aliases itself through the scene. Everything else it may
//! touch (physics, vehicles, paths and the UI queue) is reachable from here.

use roadside_physics::PhysicsWorld;

use crate::arena::{Arena, PathId, SeatHandle, VehicleId};
use crate::error::GameError;
use crate::events::UiEvent;
use crate::path::Path;
use crate::vehicle::{Vehicle, VehicleSeat};

pub struct Scene<'a> {
    pub physics: &'a mut PhysicsWorld,
    pub vehicles: &'a mut Arena<Vehicle>,
    pub paths: &'a Arena<Path>,
    pub ui_events: &'a mut Vec<UiEvent>,
}

impl<'a> Scene<'a> {
    pub fn new(
        physics: &'a mut PhysicsWorld,
        vehicles: &'a mut Arena<Vehicle>,
        paths: &'a Arena<Path>,
        ui_events: &'a mut Vec<UiEvent>,
    ) -> Self {
        Self {
            physics,
            vehicles,
            paths,
            ui_events,
        }
    }

    pub fn vehicle(&self, id: VehicleId) -> Result<&Vehicle, GameError> {
        self.vehicles.get(id.0).ok_or(GameError::UnknownVehicle(id))
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Result<&mut Vehicle, GameError> {
        self.vehicles.get_mut(id.0).ok_or(GameError::UnknownVehicle(id))
    }

    pub fn seat(&self, handle: SeatHandle) -> Result<&VehicleSeat, GameError> {
        self.vehicle(handle.vehicle)?
            .seat(handle.seat)
            .ok_or(GameError::UnknownSeat {
                vehicle: handle.vehicle,
                seat: handle.seat,
            })
    }

    pub fn seat_mut(&mut self, handle: SeatHandle) -> Result<&mut VehicleSeat, GameError> {
        self.vehicle_mut(handle.vehicle)?
            .seat_mut(handle.seat)
            .ok_or(GameError::UnknownSeat {
                vehicle: handle.vehicle,
                seat: handle.seat,
            })
    }

    pub fn path(&self, id: PathId) -> Option<&'a Path> {
        self.paths.get(id.0)
    }

    pub fn push_ui(&mut self, event: UiEvent) {
        self.ui_events.push(event);
    }
}
