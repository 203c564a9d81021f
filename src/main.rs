//! Roadside - headless scenario runner
//!
//! Loads the test track and plays a scripted session: the player walks up to
//! the parked car, drives a lap of the yard and gets out again while an AI
//! driver circles the track. State changes are logged as they happen.
//!
//! ```text
//! RUST_LOG=info cargo run -- [frames]
//! ```

use std::collections::HashMap;

use glam::Vec3;
use roadside_game::{CharacterId, GameError, InputEvent, Level, UiEvent, World};

const FRAME_TIME: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u64 = 900;

/// Key presses and releases keyed by frame.
struct InputScript {
    events: Vec<(u64, InputEvent)>,
}

impl InputScript {
    fn session() -> Self {
        let mut script = Self { events: Vec::new() };
        script
            .tap(30, 10, "KeyF")
            .hold(200, 420, "KeyW")
            .hold(300, 360, "KeyA")
            .hold(440, 470, "Space")
            .tap(520, 10, "KeyF");
        script
    }

    fn hold(&mut self, from: u64, to: u64, code: &str) -> &mut Self {
        self.events.push((from, InputEvent::key_down(code)));
        self.events.push((to, InputEvent::key_up(code)));
        self
    }

    fn tap(&mut self, at: u64, length: u64, code: &str) -> &mut Self {
        self.hold(at, at + length, code)
    }

    fn events_at(&self, frame: u64) -> Vec<InputEvent> {
        self.events
            .iter()
            .filter(|(f, _)| *f == frame)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

fn main() -> Result<(), GameError> {
    env_logger::init();

    let frames = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut world = World::with_default_config();
    let level = Level::test_track();
    let spawned = level.load(&mut world)?;
    log::info!("loaded `{}`", level.name);

    let script = InputScript::session();
    let mut last_states: HashMap<CharacterId, &'static str> = HashMap::new();

    for frame in 0..frames {
        let mut events = script.events_at(frame);
        // Camera looks the way the player faces.
        if let Some(player) = spawned.player.and_then(|id| world.character(id)) {
            events.push(InputEvent::ViewVector(player.orientation + Vec3::NEG_Y * 0.3));
        }
        world.tick(FRAME_TIME, &events)?;

        for (index, character) in world.characters.iter() {
            let id = CharacterId(index);
            let name = character.state_name();
            if last_states.insert(id, name) != Some(name) {
                log::info!("frame {:>4}: character {} -> {}", frame, index, name);
            }
        }
        for event in world.drain_ui_events() {
            let UiEvent::Controls(hints) = event;
            let lines: Vec<&str> = hints.iter().map(|h| h.description.as_str()).collect();
            log::info!("frame {:>4}: controls [{}]", frame, lines.join(", "));
        }
    }

    for (index, character) in world.characters.iter() {
        let position = character.world_position(&world.vehicles);
        log::info!(
            "character {} ends in `{}` at ({:.2}, {:.2}, {:.2})",
            index,
            character.state_name(),
            position.x,
            position.y,
            position.z
        );
    }
    for (index, vehicle) in world.vehicles.iter() {
        log::info!(
            "vehicle {} `{}` ends at ({:.2}, {:.2}, {:.2})",
            index,
            vehicle.name,
            vehicle.position.x,
            vehicle.position.y,
            vehicle.position.z
        );
    }
    Ok(())
}
