//! Getting in, switching seats and getting out, driven through world ticks.

use glam::{Quat, Vec3};

use roadside_game::{
    CharacterId, CollisionGroups, InputEvent, UiEvent, VehicleDescription, VehicleId, World,
};

const DT: f32 = 1.0 / 60.0;

fn flat_world() -> World {
    let mut world = World::with_default_config();
    world
        .physics
        .collision
        .add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), CollisionGroups::DEFAULT);
    world
}

fn tick_until(world: &mut World, id: CharacterId, max_ticks: usize, done: impl Fn(&World) -> bool) -> Vec<&'static str> {
    let mut trace = vec![world.character(id).unwrap().state_name()];
    for _ in 0..max_ticks {
        if done(world) {
            break;
        }
        world.tick(DT, &[]).unwrap();
        let name = world.character(id).unwrap().state_name();
        if trace.last() != Some(&name) {
            trace.push(name);
        }
    }
    trace
}

fn seated_player(description: VehicleDescription) -> (World, VehicleId, CharacterId) {
    let mut world = flat_world();
    let vehicle = world.spawn_vehicle(&description, Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY).unwrap();
    let player = world.spawn_character(Vec3::new(5.0, 0.57, 0.0), None);
    world.take_control(player).unwrap();
    world
        .with_character(player, |ch, scene| ch.teleport_to_vehicle(vehicle, 0, scene))
        .unwrap();
    (world, vehicle, player)
}

// ============================================================================
// Entry and exit
// ============================================================================

#[test]
fn test_walk_up_get_in_and_get_out() {
    let mut world = flat_world();
    let car = world
        .spawn_vehicle(&VehicleDescription::sedan(), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY)
        .unwrap();
    for _ in 0..240 {
        world.tick(DT, &[]).unwrap();
    }

    // Stand right at the driver's entry point.
    let vehicle = world.vehicle(car).unwrap();
    let entry = vehicle.to_world(vehicle.seats[0].entry_points[0].position);
    let player = world.spawn_character(Vec3::new(entry.x + 0.05, 0.57, entry.z), None);
    world.take_control(player).unwrap();
    world.tick(DT, &[]).unwrap();

    world.tick(DT, &[InputEvent::key_down("KeyF")]).unwrap();
    world.tick(DT, &[InputEvent::key_up("KeyF")]).unwrap();
    let trace = tick_until(&mut world, player, 20, |w| w.character(player).unwrap().state_name() == "driving");

    let character = world.character(player).unwrap();
    assert_eq!(character.state_name(), "driving", "Trace: {:?}", trace);
    assert_eq!(character.occupying_seat.map(|s| s.seat), Some(0));
    assert_eq!(character.controlled_vehicle, Some(car));
    assert_eq!(character.parent, Some(car));
    assert!(!character.physics_enabled);
    let vehicle = world.vehicle(car).unwrap();
    assert_eq!(vehicle.controlling_character, Some(player));
    assert_eq!(vehicle.seats[0].occupied_by, Some(player));
    assert!(character.vehicle_entry.is_none(), "Entry intent consumed");

    let hints = world.drain_ui_events();
    assert!(
        hints.iter().any(|e| matches!(e, UiEvent::Controls(c) if c.iter().any(|h| h.description == "Exit vehicle"))),
        "Car controls were shown: {:?}",
        hints
    );

    // Exit
    world.tick(DT, &[InputEvent::key_down("KeyF")]).unwrap();
    let trace = tick_until(&mut world, player, 600, |w| w.character(player).unwrap().occupying_seat.is_none());

    let character = world.character(player).unwrap();
    assert!(character.occupying_seat.is_none(), "Trace: {:?}", trace);
    assert!(trace.contains(&"exiting_vehicle"), "Trace: {:?}", trace);
    assert_eq!(character.parent, None);
    assert_eq!(character.controlled_vehicle, None);
    assert!(character.physics_enabled);
    let vehicle = world.vehicle(car).unwrap();
    assert_eq!(vehicle.controlling_character, None);
    assert_eq!(vehicle.seats[0].occupied_by, None);
}

#[test]
fn test_entry_search_out_of_range_keeps_idle() {
    let mut world = flat_world();
    world
        .spawn_vehicle(&VehicleDescription::sedan(), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY)
        .unwrap();
    let player = world.spawn_character(Vec3::new(30.0, 0.57, 0.0), None);
    world.take_control(player).unwrap();
    world.tick(DT, &[]).unwrap();

    world.tick(DT, &[InputEvent::key_down("KeyF")]).unwrap();

    let character = world.character(player).unwrap();
    assert!(character.vehicle_entry.is_none());
    assert!(!character.actions.is_pressed("up"));
}

#[test]
fn test_taken_driver_seat_refuses_second_driver() {
    let (mut world, car, driver) = seated_player(VehicleDescription::sedan());
    for _ in 0..240 {
        world.tick(DT, &[]).unwrap();
    }

    let vehicle = world.vehicle(car).unwrap();
    let entry = vehicle.to_world(vehicle.seats[0].entry_points[0].position);
    let other = world.spawn_character(Vec3::new(entry.x + 0.05, 0.57, entry.z), None);
    world.take_control(other).unwrap();
    world.tick(DT, &[]).unwrap();

    world.tick(DT, &[InputEvent::key_down("KeyF")]).unwrap();
    world.tick(DT, &[InputEvent::key_up("KeyF")]).unwrap();
    for _ in 0..30 {
        world.tick(DT, &[]).unwrap();
    }

    let character = world.character(other).unwrap();
    assert!(character.vehicle_entry.is_none(), "No free seat to head for");
    assert_eq!(character.occupying_seat, None);
    assert_eq!(character.controlled_vehicle, None);
    assert_eq!(character.parent, None);
    let vehicle = world.vehicle(car).unwrap();
    assert_eq!(vehicle.seats[0].occupied_by, Some(driver));
    assert_eq!(vehicle.seats[1].occupied_by, None);
    assert_eq!(vehicle.controlling_character, Some(driver));
    assert_eq!(world.character(driver).unwrap().controlled_vehicle, Some(car));

    // The walker's keys stay with the walker.
    world.tick(DT, &[InputEvent::key_down("KeyW")]).unwrap();
    assert!(!world.vehicle(car).unwrap().actions.is_pressed("throttle"));
    assert!(world.character(other).unwrap().actions.is_pressed("up"));
}

// ============================================================================
// Seat switching
// ============================================================================

#[test]
fn test_seat_switch_keeps_occupancy_in_sync() {
    let (mut world, car, player) = seated_player(VehicleDescription::sedan());
    assert_eq!(world.character(player).unwrap().state_name(), "driving");
    world.drain_ui_events();

    // Driving: the key goes to the car, which asks the driver to shuffle over.
    world.tick(DT, &[InputEvent::key_down("KeyX")]).unwrap();
    let character = world.character(player).unwrap();
    assert_eq!(character.occupying_seat.map(|s| s.seat), Some(1), "Seat taken as the switch starts");
    let vehicle = world.vehicle(car).unwrap();
    assert_eq!(vehicle.seats[0].occupied_by, None);
    assert_eq!(vehicle.seats[1].occupied_by, Some(player));
    assert_eq!(vehicle.controlling_character, None, "Driver seat left, controls released");
    assert_eq!(character.controlled_vehicle, None);

    world.tick(DT, &[InputEvent::key_up("KeyX")]).unwrap();
    let trace = tick_until(&mut world, player, 10, |w| w.character(player).unwrap().state_name() == "sitting");
    assert_eq!(world.character(player).unwrap().state_name(), "sitting", "Trace: {:?}", trace);

    // Sitting: the key goes to the character and back over it goes.
    world.tick(DT, &[InputEvent::key_down("KeyX")]).unwrap();
    world.tick(DT, &[InputEvent::key_up("KeyX")]).unwrap();
    let trace = tick_until(&mut world, player, 10, |w| w.character(player).unwrap().state_name() == "driving");

    let character = world.character(player).unwrap();
    assert_eq!(character.state_name(), "driving", "Trace: {:?}", trace);
    assert_eq!(character.occupying_seat.map(|s| s.seat), Some(0));
    let vehicle = world.vehicle(car).unwrap();
    assert_eq!(vehicle.seats[0].occupied_by, Some(player));
    assert_eq!(vehicle.seats[1].occupied_by, None);
    assert_eq!(vehicle.controlling_character, Some(player));
}

// ============================================================================
// Exit state selection
// ============================================================================

#[test]
fn test_airplane_exit_climbs_out_and_falls() {
    let (mut world, plane, player) = seated_player(VehicleDescription::airplane());

    world.tick(DT, &[InputEvent::key_down("KeyF")]).unwrap();

    let character = world.character(player).unwrap();
    assert_eq!(character.state_name(), "falling", "Airplane exits end in a fall");
    assert!(character.occupying_seat.is_none());
    assert!(character.physics_enabled);
    assert_eq!(world.vehicle(plane).unwrap().controlling_character, None);
}

#[test]
fn test_car_exit_starts_with_exiting_vehicle() {
    let (mut world, car, player) = seated_player(VehicleDescription::sedan());
    for _ in 0..240 {
        world.tick(DT, &[]).unwrap();
    }
    assert_eq!(world.character(player).unwrap().state_name(), "driving");

    world.tick(DT, &[InputEvent::key_down("KeyF")]).unwrap();
    let trace = tick_until(&mut world, player, 600, |w| w.character(player).unwrap().state_name() != "driving");

    let first = trace.iter().find(|&&s| s != "driving").copied();
    assert_eq!(first, Some("exiting_vehicle"), "Trace: {:?}", trace);
    assert_eq!(world.vehicle(car).unwrap().controlling_character, None);
}
