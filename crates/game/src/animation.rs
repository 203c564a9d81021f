//! Animation clip table.
//!
//! Clip playback happens elsewhere. Gameplay only needs each clip's duration,
//! so states can tell when their animation has finished.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Clip durations by name, plus the clip currently playing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationPlayer {
    clips: BTreeMap<String, f32>,
    #[serde(skip)]
    current: Option<String>,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a clip and its duration in seconds.
    pub fn with_clip(mut self, name: &str, duration: f32) -> Self {
        self.clips.insert(name.to_string(), duration);
        self
    }

    /// Every clip the character state machine plays, with its duration.
    pub fn character_clips() -> Self {
        [
            ("idle", 2.0),
            ("rotate_right", 0.9),
            ("run", 0.73),
            ("sprint", 0.6),
            ("stop", 0.37),
            ("start_forward", 0.43),
            ("start_left", 0.6),
            ("start_right", 0.6),
            ("start_back_left", 0.67),
            ("start_back_right", 0.67),
            ("jump_idle", 1.17),
            ("jump_running", 0.8),
            ("falling", 1.0),
            ("drop_idle", 0.5),
            ("drop_running", 0.47),
            ("drop_running_roll", 0.97),
            ("open_door_standing_left", 1.0),
            ("open_door_standing_right", 1.0),
            ("sit_down_left", 1.4),
            ("sit_down_right", 1.4),
            ("enter_airplane_left", 1.6),
            ("enter_airplane_right", 1.6),
            ("driving", 1.0),
            ("sitting", 1.0),
            ("close_door_sitting_left", 0.83),
            ("close_door_sitting_right", 0.83),
            ("close_door_standing_left", 0.83),
            ("close_door_standing_right", 0.83),
            ("stand_up_left", 1.23),
            ("stand_up_right", 1.23),
            ("sitting_shift_left", 0.9),
            ("sitting_shift_right", 0.9),
        ]
        .into_iter()
        .fold(Self::new(), |player, (name, duration)| player.with_clip(name, duration))
    }

    /// Start a clip and return its duration, or `None` if it is not in the table.
    pub fn play(&mut self, name: &str, fade_in: f32) -> Option<f32> {
        let duration = *self.clips.get(name)?;
        log::trace!("play `{}` (fade {:.2}s, {:.2}s)", name, fade_in, duration);
        self.current = Some(name.to_string());
        Some(duration)
    }

    pub fn duration(&self, name: &str) -> Option<f32> {
        self.clips.get(name).copied()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_known_clip() {
        let mut player = AnimationPlayer::new().with_clip("idle", 2.0);
        assert_eq!(player.play("idle", 0.1), Some(2.0));
        assert_eq!(player.current(), Some("idle"));
    }

    #[test]
    fn test_missing_clip() {
        let mut player = AnimationPlayer::new().with_clip("idle", 2.0);
        assert_eq!(player.play("backflip", 0.1), None);
        assert_eq!(player.current(), None, "A missing clip does not replace the current one");
    }

    #[test]
    fn test_character_clips_cover_states() {
        let player = AnimationPlayer::character_clips();
        for clip in ["idle", "jump_idle", "sit_down_left", "stand_up_right", "sitting_shift_left"] {
            assert!(player.duration(clip).is_some(), "missing clip {}", clip);
        }
    }
}
