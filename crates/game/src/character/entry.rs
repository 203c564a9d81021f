//! Finding a vehicle to get into and walking up to it.

use glam::Vec3;

use super::{Character, Transition};
use crate::arena::{SeatHandle, VehicleId};
use crate::error::GameError;
use crate::scene::Scene;
use crate::vehicle::{EntryPoint, SeatType};

/// A pending request to get into a particular seat.
#[derive(Debug, Clone)]
pub struct VehicleEntryInstance {
    pub vehicle: VehicleId,
    pub seat: usize,
    /// Vehicle-local entry point the character walks to.
    pub entry_point: EntryPoint,
    pub wants_to_drive: bool,
}

impl VehicleEntryInstance {
    pub fn seat_handle(&self) -> SeatHandle {
        SeatHandle::new(self.vehicle, self.seat)
    }
}

/// Keeps the candidate nearest to `origin`.
struct Closest<T> {
    origin: Vec3,
    best: Option<T>,
    distance: f32,
}

impl<T> Closest<T> {
    fn new(origin: Vec3) -> Self {
        Self::within(origin, f32::INFINITY)
    }

    /// Only candidates strictly closer than `max_distance` count.
    fn within(origin: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            best: None,
            distance: max_distance,
        }
    }

    fn consider(&mut self, candidate: T, position: Vec3) {
        let distance = self.origin.distance(position);
        if distance < self.distance {
            self.distance = distance;
            self.best = Some(candidate);
        }
    }
}

impl Character {
    /// Look for a seat to walk to.
    ///
    /// A driver picks between driver seats and passenger seats that connect
    /// to one; a passenger only looks at passenger seats. On success the
    /// character starts walking once the current input has been handled.
    pub(crate) fn find_vehicle_to_enter(&mut self, wants_to_drive: bool, scene: &Scene) {
        let origin = self.world_position(scene.vehicles);

        let mut nearest_vehicle = Closest::within(origin, self.config.vehicle_search_radius);
        for (index, vehicle) in scene.vehicles.iter() {
            nearest_vehicle.consider(VehicleId(index), vehicle.position);
        }
        let Some(vehicle_id) = nearest_vehicle.best else {
            log::debug!("character {:?} found no vehicle in range", self.id);
            return;
        };
        let Ok(vehicle) = scene.vehicle(vehicle_id) else {
            return;
        };

        let mut nearest_seat = Closest::new(origin);
        for (index, seat) in vehicle.seats.iter().enumerate() {
            if !seat.is_free_for(self.id) {
                continue;
            }
            let eligible = match seat.seat_type {
                Some(SeatType::Driver) => wants_to_drive,
                Some(SeatType::Passenger) if wants_to_drive => vehicle.free_connected_seat(index, self.id, true).is_some(),
                Some(SeatType::Passenger) => true,
                None => false,
            };
            if eligible {
                nearest_seat.consider(index, vehicle.to_world(seat.position));
            }
        }
        let Some(seat_index) = nearest_seat.best else {
            log::debug!("character {:?} found no free seat in `{}`", self.id, vehicle.name);
            return;
        };
        let Some(seat) = vehicle.seat(seat_index) else {
            return;
        };

        let mut nearest_entry = Closest::new(origin);
        for point in &seat.entry_points {
            nearest_entry.consider(point, vehicle.to_world(point.position));
        }
        let Some(entry_point) = nearest_entry.best.cloned() else {
            log::warn!("seat `{}` has no entry points", seat.name);
            return;
        };

        log::debug!(
            "character {:?} heading for seat `{}` of `{}`",
            self.id,
            seat.name,
            vehicle.name
        );
        self.approach_pending = Some(VehicleEntryInstance {
            vehicle: vehicle_id,
            seat: seat_index,
            entry_point,
            wants_to_drive,
        });
    }

    /// Steer towards the pending entry point and get in once close enough.
    pub(crate) fn update_vehicle_entry(&mut self, scene: &mut Scene) -> Result<(), GameError> {
        let Some(entry) = self.vehicle_entry.clone() else {
            return Ok(());
        };
        let Ok(vehicle) = scene.vehicle(entry.vehicle) else {
            log::warn!("character {:?} lost the vehicle it was walking to", self.id);
            self.vehicle_entry = None;
            return Ok(());
        };

        if !scene.seat(entry.seat_handle())?.is_free_for(self.id) {
            log::debug!("character {:?} gave up on seat {}: taken", self.id, entry.seat);
            self.vehicle_entry = None;
            return self.reset_controls(scene);
        }

        let view = vehicle.to_world(entry.entry_point.position) - self.world_position(scene.vehicles);
        self.set_orientation(view, false);

        let planar_distance = Vec3::new(view.x, 0.0, view.z).length();
        if self.state.can_enter_vehicles()
            && planar_distance < self.config.entry_commit_distance
            && view.y.abs() < self.config.entry_commit_height
        {
            self.enter_vehicle(entry, scene)?;
        }
        Ok(())
    }

    fn enter_vehicle(&mut self, entry: VehicleEntryInstance, scene: &mut Scene) -> Result<(), GameError> {
        self.reset_controls(scene)?;

        let seat = entry.seat_handle();
        let door_closed = scene
            .seat(seat)?
            .door
            .as_ref()
            .is_some_and(|door| door.rotation < 0.5);
        let transition = if door_closed {
            Transition::OpenVehicleDoor {
                seat,
                entry_point: entry.entry_point,
            }
        } else {
            Transition::EnteringVehicle {
                seat,
                entry_point: entry.entry_point,
            }
        };
        self.set_state(transition, scene)
    }
}
