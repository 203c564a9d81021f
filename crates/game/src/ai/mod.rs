//! Scripted drivers for non-player characters.
//!
//! A behaviour runs first in the character's frame, before the entry intent
//! and the state update. It only ever talks to the character through the same
//! actions a player would press, so every behaviour goes through the regular
//! state machine and vehicle controls.

mod follow_path;
mod follow_target;
mod random;

pub use follow_path::FollowPath;
pub use follow_target::FollowTarget;
pub use random::RandomBehaviour;

use crate::character::Character;
use crate::error::GameError;
use crate::scene::Scene;

#[derive(Debug, Clone)]
pub enum Behaviour {
    FollowTarget(FollowTarget),
    FollowPath(FollowPath),
    Random(RandomBehaviour),
}

impl Behaviour {
    pub fn update(&mut self, ch: &mut Character, scene: &mut Scene, dt: f32) -> Result<(), GameError> {
        match self {
            Self::FollowTarget(follow) => follow.update(ch, scene),
            Self::FollowPath(follow) => follow.update(ch, scene, dt),
            Self::Random(random) => random.update(ch, scene, dt),
        }
    }
}

impl From<FollowTarget> for Behaviour {
    fn from(behaviour: FollowTarget) -> Self {
        Self::FollowTarget(behaviour)
    }
}

impl From<FollowPath> for Behaviour {
    fn from(behaviour: FollowPath) -> Self {
        Self::FollowPath(behaviour)
    }
}

impl From<RandomBehaviour> for Behaviour {
    fn from(behaviour: RandomBehaviour) -> Self {
        Self::Random(behaviour)
    }
}
