//! Input actions and events.
//!
//! Raw device codes ("KeyW", "Space", "Mouse0") arrive as [`InputEvent`]s and
//! are mapped onto named actions. Each action tracks whether it is held plus
//! one-shot press/release edges. The edges are only visible while the owner's
//! input handler runs:
//!
//! ```text
//! KeyDown("KeyW")
//!      │
//!      ▼
//! begin_trigger("up", true)   pressed = true, just_pressed = true
//!      │
//!      ▼
//! owner.on_input_change()     states read the edge here
//!      │
//!      ▼
//! end_trigger("up")           just_pressed = false
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One input event delivered to the current input receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    MouseDown(String),
    MouseUp(String),
    /// Camera view direction, used for camera-relative movement.
    ViewVector(Vec3),
}

impl InputEvent {
    pub fn key_down(code: &str) -> Self {
        Self::KeyDown(code.to_string())
    }

    pub fn key_up(code: &str) -> Self {
        Self::KeyUp(code.to_string())
    }

    /// The raw code and pressed state, for button events.
    pub fn button(&self) -> Option<(&str, bool)> {
        match self {
            Self::KeyDown(code) | Self::MouseDown(code) => Some((code, true)),
            Self::KeyUp(code) | Self::MouseUp(code) => Some((code, false)),
            Self::ViewVector(_) => None,
        }
    }
}

/// State of a single named action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBinding {
    /// Raw codes that trigger this action.
    pub event_codes: Vec<String>,
    pub is_pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

impl ActionBinding {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            event_codes: codes.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn responds_to(&self, code: &str) -> bool {
        self.event_codes.iter().any(|c| c == code)
    }
}

/// Named actions in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionMap {
    actions: Vec<(String, ActionBinding)>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an action bound to `codes`.
    pub fn with(mut self, name: &str, codes: &[&str]) -> Self {
        self.actions.push((name.to_string(), ActionBinding::new(codes)));
        self
    }

    /// On-foot character bindings.
    pub fn character() -> Self {
        Self::new()
            .with("up", &["KeyW"])
            .with("down", &["KeyS"])
            .with("left", &["KeyA"])
            .with("right", &["KeyD"])
            .with("run", &["ShiftLeft"])
            .with("jump", &["Space"])
            .with("use", &["KeyE"])
            .with("enter", &["KeyF"])
            .with("enter_passenger", &["KeyG"])
            .with("seat_switch", &["KeyX"])
            .with("primary", &["Mouse0"])
            .with("secondary", &["Mouse1"])
    }

    pub fn get(&self, name: &str) -> Option<&ActionBinding> {
        self.actions.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ActionBinding> {
        self.actions.iter_mut().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    #[inline]
    pub fn is_pressed(&self, name: &str) -> bool {
        self.get(name).is_some_and(|b| b.is_pressed)
    }

    #[inline]
    pub fn just_pressed(&self, name: &str) -> bool {
        self.get(name).is_some_and(|b| b.just_pressed)
    }

    #[inline]
    pub fn just_released(&self, name: &str) -> bool {
        self.get(name).is_some_and(|b| b.just_released)
    }

    /// Set an action's pressed state and raise the matching edge.
    ///
    /// Returns `false` when nothing changed (or the action does not exist), in
    /// which case the owner must not run its input handler.
    pub fn begin_trigger(&mut self, name: &str, pressed: bool) -> bool {
        let Some(action) = self.get_mut(name) else {
            log::warn!("trigger for unknown action `{}`", name);
            return false;
        };

        if action.is_pressed == pressed {
            return false;
        }

        action.is_pressed = pressed;
        action.just_pressed = pressed;
        action.just_released = !pressed;
        true
    }

    /// Clear the edges raised by [`ActionMap::begin_trigger`].
    pub fn end_trigger(&mut self, name: &str) {
        if let Some(action) = self.get_mut(name) {
            action.just_pressed = false;
            action.just_released = false;
        }
    }

    /// Drop the held flag without raising an edge.
    pub fn force_release(&mut self, name: &str) {
        if let Some(action) = self.get_mut(name) {
            action.is_pressed = false;
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionBinding)> {
        self.actions.iter().map(|(n, b)| (n.as_str(), b))
    }

    /// Names of every action bound to `code`.
    pub fn actions_for_code(&self, code: &str) -> Vec<String> {
        self.actions
            .iter()
            .filter(|(_, b)| b.responds_to(code))
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Pressed states to copy into `other`: for every pair of actions sharing
    /// a raw code, the target action name and this side's pressed flag.
    pub fn transfer_plan(&self, other: &ActionMap) -> Vec<(String, bool)> {
        let mut plan = Vec::new();
        for (_, source) in &self.actions {
            for (target_name, target) in &other.actions {
                for code in &source.event_codes {
                    if target.responds_to(code) {
                        plan.push((target_name.clone(), source.is_pressed));
                    }
                }
            }
        }
        plan
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_raises_edge_once() {
        let mut map = ActionMap::character();

        assert!(map.begin_trigger("jump", true));
        assert!(map.is_pressed("jump"));
        assert!(map.just_pressed("jump"));
        assert!(!map.just_released("jump"));
        map.end_trigger("jump");
        assert!(!map.just_pressed("jump"), "Edge should clear after the handler");

        assert!(!map.begin_trigger("jump", true), "Repeated press is not a change");

        assert!(map.begin_trigger("jump", false));
        assert!(map.just_released("jump"));
        map.end_trigger("jump");
        assert!(!map.is_pressed("jump"));
    }

    #[test]
    fn test_unknown_action_is_ignored() {
        let mut map = ActionMap::character();
        assert!(!map.begin_trigger("fly", true));
        assert!(!map.is_pressed("fly"));
    }

    #[test]
    fn test_actions_for_code() {
        let map = ActionMap::character();
        assert_eq!(map.actions_for_code("KeyF"), vec!["enter".to_string()]);
        assert!(map.actions_for_code("KeyQ").is_empty());
    }

    #[test]
    fn test_transfer_plan_matches_shared_codes() {
        let mut character = ActionMap::character();
        character.begin_trigger("up", true);
        character.end_trigger("up");

        let vehicle = ActionMap::new()
            .with("throttle", &["KeyW"])
            .with("brake", &["Space"])
            .with("view", &["KeyV"]);

        let plan = character.transfer_plan(&vehicle);
        assert!(plan.contains(&("throttle".to_string(), true)));
        assert!(plan.contains(&("brake".to_string(), false)));
        assert!(
            !plan.iter().any(|(name, _)| name == "view"),
            "Actions without a shared code are untouched"
        );
    }

    #[test]
    fn test_event_button() {
        assert_eq!(InputEvent::key_down("KeyW").button(), Some(("KeyW", true)));
        assert_eq!(InputEvent::MouseUp("Mouse0".into()).button(), Some(("Mouse0", false)));
        assert_eq!(InputEvent::ViewVector(Vec3::Z).button(), None);
    }
}
