//! Vehicle seats and their entry points.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::arena::CharacterId;
use crate::metadata::{split_names, AuthoredObject};
use crate::vehicle::door::VehicleDoor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatType {
    Driver,
    Passenger,
}

impl SeatType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "driver" => Some(Self::Driver),
            "passenger" => Some(Self::Passenger),
            _ => None,
        }
    }
}

/// A point a character walks to before getting in, relative to the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSeat {
    pub name: String,
    /// `None` when the authored seat has no usable type; such a seat is never
    /// chosen by the entry search.
    pub seat_type: Option<SeatType>,
    /// Seat point relative to the vehicle.
    pub position: Vec3,
    pub rotation: Quat,
    connected_names: Vec<String>,
    /// Indices of seats reachable by shuffling over.
    pub connected: Vec<usize>,
    pub entry_points: Vec<EntryPoint>,
    pub door: Option<VehicleDoor>,
    pub occupied_by: Option<CharacterId>,
}

impl VehicleSeat {
    /// Read a seat from its authored object. `scene` is searched for the
    /// entry points and door the seat refers to.
    pub fn from_object(object: &AuthoredObject, scene: &[AuthoredObject]) -> Self {
        let find = |name: &str| scene.iter().find(|o| o.name == name);

        let door = object.get("door_object").and_then(|name| match find(name) {
            Some(door) => Some(VehicleDoor::new(object.position, object.rotation, door.position)),
            None => {
                log::warn!("seat `{}` refers to missing door `{}`", object.name, name);
                None
            }
        });

        let entry_points = match object.get("entry_points") {
            Some(list) => split_names(list)
                .iter()
                .filter_map(|name| match find(name) {
                    Some(point) => Some(EntryPoint {
                        name: point.name.clone(),
                        position: point.position,
                        rotation: point.rotation,
                    }),
                    None => {
                        log::warn!("seat `{}` refers to missing entry point `{}`", object.name, name);
                        None
                    }
                })
                .collect(),
            None => {
                log::error!("seat `{}` has no entry point reference property", object.name);
                Vec::new()
            }
        };

        let seat_type = match object.get("seat_type") {
            Some(value) => {
                let parsed = SeatType::parse(value);
                if parsed.is_none() {
                    log::error!("seat `{}` has unknown seat type `{}`", object.name, value);
                }
                parsed
            }
            None => {
                log::error!("seat `{}` has no seat type property", object.name);
                None
            }
        };

        Self {
            name: object.name.clone(),
            seat_type,
            position: object.position,
            rotation: object.rotation,
            connected_names: object.get("connected_seats").map(split_names).unwrap_or_default(),
            connected: Vec::new(),
            entry_points,
            door,
            occupied_by: None,
        }
    }

    pub fn is_driver(&self) -> bool {
        self.seat_type == Some(SeatType::Driver)
    }

    /// Empty, or already taken by `character`.
    pub fn is_free_for(&self, character: CharacterId) -> bool {
        self.occupied_by.map_or(true, |c| c == character)
    }

    pub fn is_passenger(&self) -> bool {
        self.seat_type == Some(SeatType::Passenger)
    }

    /// Where a seated character's root goes, relative to the vehicle.
    pub fn sitting_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, 0.6, 0.0)
    }

    pub fn update(&mut self, dt: f32) {
        if let Some(door) = &mut self.door {
            door.update(dt);
        }
    }
}

/// Resolve every seat's `connected_seats` names into indices.
pub fn connect_seats(seats: &mut [VehicleSeat]) {
    let names: Vec<String> = seats.iter().map(|s| s.name.clone()).collect();
    for seat in seats.iter_mut() {
        seat.connected = seat
            .connected_names
            .iter()
            .filter_map(|wanted| names.iter().position(|n| n == wanted))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Vec<AuthoredObject> {
        vec![
            AuthoredObject::new("driver", Vec3::new(0.4, 0.5, 0.0))
                .with_data("data", "seat")
                .with_data("seat_type", "driver")
                .with_data("entry_points", "entry_left")
                .with_data("door_object", "door_left")
                .with_data("connected_seats", "passenger"),
            AuthoredObject::new("passenger", Vec3::new(-0.4, 0.5, 0.0))
                .with_data("data", "seat")
                .with_data("seat_type", "passenger")
                .with_data("entry_points", "entry_right;missing")
                .with_data("connected_seats", "driver;nobody"),
            AuthoredObject::new("entry_left", Vec3::new(1.5, 0.0, 0.0)),
            AuthoredObject::new("entry_right", Vec3::new(-1.5, 0.0, 0.0)),
            AuthoredObject::new("door_left", Vec3::new(0.9, 0.5, 0.6)),
        ]
    }

    #[test]
    fn test_seat_from_object() {
        let scene = scene();
        let seat = VehicleSeat::from_object(&scene[0], &scene);

        assert_eq!(seat.seat_type, Some(SeatType::Driver));
        assert_eq!(seat.entry_points.len(), 1);
        assert_eq!(seat.entry_points[0].name, "entry_left");
        let door = seat.door.as_ref().expect("door should resolve");
        assert_eq!(door.side_multiplier, -1.0, "Door at +X is on the seat's left");
    }

    #[test]
    fn test_missing_references_degrade() {
        let scene = scene();
        let seat = VehicleSeat::from_object(&scene[1], &scene);
        assert_eq!(seat.entry_points.len(), 1, "Missing entry point is skipped");
        assert!(seat.door.is_none());

        let bare = AuthoredObject::new("bare", Vec3::ZERO);
        let seat = VehicleSeat::from_object(&bare, &scene);
        assert_eq!(seat.seat_type, None);
        assert!(seat.entry_points.is_empty());
    }

    #[test]
    fn test_connect_seats_by_name() {
        let scene = scene();
        let mut seats = vec![
            VehicleSeat::from_object(&scene[0], &scene),
            VehicleSeat::from_object(&scene[1], &scene),
        ];
        connect_seats(&mut seats);

        assert_eq!(seats[0].connected, vec![1]);
        assert_eq!(seats[1].connected, vec![0], "Unknown names are dropped");
    }
}
