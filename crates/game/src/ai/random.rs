use glam::Vec3;

use crate::character::Character;
use crate::error::GameError;
use crate::random::SeededRandom;
use crate::scene::Scene;

/// Aimless wandering: every tick there is a small chance of pressing or
/// releasing one of the movement actions.
#[derive(Debug, Clone)]
pub struct RandomBehaviour {
    /// One roll in `frequency` does something.
    pub frequency: u32,
    rng: SeededRandom,
}

impl RandomBehaviour {
    pub fn new(seed: u32) -> Self {
        Self::with_frequency(seed, 100)
    }

    pub fn with_frequency(seed: u32, frequency: u32) -> Self {
        Self {
            frequency: frequency.max(1),
            rng: SeededRandom::new(seed),
        }
    }

    pub fn update(&mut self, ch: &mut Character, scene: &mut Scene, dt: f32) -> Result<(), GameError> {
        let roll = self.rng.next_int(self.frequency);
        let pressed = self.rng.next_bool();

        match roll {
            0 => {
                let view = Vec3::new(
                    self.rng.next_f32() - 0.5,
                    self.rng.next_f32() - 0.5,
                    self.rng.next_f32() - 0.5,
                );
                ch.set_view_vector(view);
                // A tap: the state sees one update with `up` held.
                ch.trigger_action("up", true, scene)?;
                ch.update_state(dt, scene)?;
                ch.trigger_action("up", false, scene)
            }
            1 => ch.trigger_action("up", pressed, scene),
            2 => ch.trigger_action("run", pressed, scene),
            3 => ch.trigger_action("jump", pressed, scene),
            _ => Ok(()),
        }
    }
}
