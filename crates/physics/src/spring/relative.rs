//! Scalar spring that reports how far it moved since the previous call.
//!
//! Used for rotation: the character consumes the emitted delta by rotating its
//! orientation, so the target is always "remaining angle" measured from zero.
//! At the last frame of each batch the integrated position is rebased to zero.

use serde::{Deserialize, Serialize};

use super::simulator::{spring, FrameClock, SimulationFrame};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeSpringSimulator {
    pub mass: f32,
    pub damping: f32,
    pub target: f32,
    /// Delta emitted by the last `simulate` call.
    pub position: f32,
    pub velocity: f32,
    last_lerp: f32,
    clock: FrameClock,
    cache: [SimulationFrame<f32>; 2],
}

impl RelativeSpringSimulator {
    pub fn new(fps: f32, mass: f32, damping: f32) -> Self {
        Self::with_start(fps, mass, damping, 0.0, 0.0)
    }

    pub fn with_start(fps: f32, mass: f32, damping: f32, position: f32, velocity: f32) -> Self {
        let frame = SimulationFrame::new(position, velocity);
        Self {
            mass,
            damping,
            target: 0.0,
            position,
            velocity,
            last_lerp: 0.0,
            clock: FrameClock::new(fps),
            cache: [frame, frame],
        }
    }

    pub fn set_fps(&mut self, fps: f32) {
        self.clock.set_fps(fps);
    }

    pub fn simulate(&mut self, dt: f32) {
        let frames = self.clock.advance(dt);
        for i in 0..frames {
            let next = self.next_frame(i + 1 == frames);
            self.cache = [self.cache[1], next];
        }

        let alpha = self.clock.alpha();
        let lerp = self.cache[1].position * alpha;

        self.position = lerp - self.last_lerp;
        self.last_lerp = lerp;

        self.velocity =
            self.cache[0].velocity + (self.cache[1].velocity - self.cache[0].velocity) * alpha;
    }

    fn next_frame(&mut self, is_last: bool) -> SimulationFrame<f32> {
        let last = self.cache[1];
        let mut start = last;

        if is_last {
            start.position = 0.0;
            self.last_lerp -= last.position;
        }

        spring(start.position, self.target, start.velocity, self.mass, self.damping)
    }
}

// ============================================================================
// Tests
// ============================================================================
