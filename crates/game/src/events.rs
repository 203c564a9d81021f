//! Events for the UI layer.
//!
//! The world queues these during a tick; the host drains them with
//! [`World::drain_ui_events`](crate::World::drain_ui_events).

use serde::{Deserialize, Serialize};

/// One line of the on-screen controls overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlHint {
    pub keys: Vec<String>,
    pub description: String,
}

impl ControlHint {
    pub fn new(keys: &[&str], description: &str) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiEvent {
    /// Replace the controls overlay.
    Controls(Vec<ControlHint>),
}

/// Controls shown while walking around.
pub fn on_foot_controls() -> UiEvent {
    UiEvent::Controls(vec![
        ControlHint::new(&["W", "A", "S", "D"], "Movement"),
        ControlHint::new(&["Shift"], "Sprint"),
        ControlHint::new(&["Space"], "Jump"),
        ControlHint::new(&["F", "or", "G"], "Enter vehicle"),
    ])
}

/// Controls shown while driving a car.
pub fn car_controls() -> UiEvent {
    UiEvent::Controls(vec![
        ControlHint::new(&["W", "S"], "Accelerate, Brake / Reverse"),
        ControlHint::new(&["A", "D"], "Steering"),
        ControlHint::new(&["Space"], "Handbrake"),
        ControlHint::new(&["V"], "View select"),
        ControlHint::new(&["F"], "Exit vehicle"),
    ])
}

/// Controls shown while sitting as a passenger.
pub fn passenger_controls() -> UiEvent {
    UiEvent::Controls(vec![
        ControlHint::new(&["X"], "Switch seats"),
        ControlHint::new(&["F"], "Leave seat"),
    ])
}
