//! Frame clock and the absolute spring simulator.

use std::ops::{Add, Mul, Sub};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Values a spring can integrate.
pub trait SpringValue:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self> + std::fmt::Debug
{
    const ZERO: Self;

    fn lerp_to(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl SpringValue for f32 {
    const ZERO: Self = 0.0;
}

impl SpringValue for Vec3 {
    const ZERO: Self = Vec3::ZERO;
}

/// One integrated spring frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationFrame<T> {
    pub position: T,
    pub velocity: T,
}

impl<T: SpringValue> SimulationFrame<T> {
    pub fn new(position: T, velocity: T) -> Self {
        Self { position, velocity }
    }
}

/// Advance one spring frame from `source` toward `dest`.
pub fn spring<T: SpringValue>(
    source: T,
    dest: T,
    velocity: T,
    mass: f32,
    damping: f32,
) -> SimulationFrame<T> {
    let acceleration = (dest - source) * (1.0 / mass);
    let velocity = (velocity + acceleration) * damping;
    SimulationFrame::new(source + velocity, velocity)
}

/// Converts variable time steps into a whole number of fixed frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameClock {
    frame_time: f32,
    offset: f32,
}

impl FrameClock {
    pub fn new(fps: f32) -> Self {
        Self {
            frame_time: 1.0 / fps,
            offset: 0.0,
        }
    }

    pub fn set_fps(&mut self, fps: f32) {
        self.frame_time = 1.0 / fps;
    }

    #[inline]
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    /// Accumulate `dt` and return how many whole frames elapsed.
    ///
    /// Non-positive and NaN steps produce no frames and leave the offset alone.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !(dt > 0.0) {
            return 0;
        }

        let total = self.offset + dt;
        let frames = (total / self.frame_time).floor();
        self.offset = total % self.frame_time;

        frames as u32
    }

    /// Fraction of a frame carried over, in `[0, 1)`.
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.offset / self.frame_time
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
    }
}

/// Spring that chases `target` at a fixed internal rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringSimulator<T> {
    pub mass: f32,
    pub damping: f32,
    pub target: T,
    /// Interpolated output position.
    pub position: T,
    /// Interpolated output velocity.
    pub velocity: T,
    clock: FrameClock,
    cache: [SimulationFrame<T>; 2],
}

impl<T: SpringValue> SpringSimulator<T> {
    pub fn new(fps: f32, mass: f32, damping: f32) -> Self {
        Self::with_start(fps, mass, damping, T::ZERO, T::ZERO)
    }

    pub fn with_start(fps: f32, mass: f32, damping: f32, position: T, velocity: T) -> Self {
        let frame = SimulationFrame::new(position, velocity);
        Self {
            mass,
            damping,
            target: T::ZERO,
            position,
            velocity,
            clock: FrameClock::new(fps),
            cache: [frame, frame],
        }
    }

    /// Zero position, velocity, target and frame cache.
    pub fn init(&mut self) {
        let zero = SimulationFrame::new(T::ZERO, T::ZERO);
        self.position = T::ZERO;
        self.velocity = T::ZERO;
        self.target = T::ZERO;
        self.cache = [zero, zero];
        self.clock.reset();
    }

    pub fn set_fps(&mut self, fps: f32) {
        self.clock.set_fps(fps);
    }

    pub fn simulate(&mut self, dt: f32) {
        let frames = self.clock.advance(dt);
        for _ in 0..frames {
            let last = self.cache[1];
            let next = spring(last.position, self.target, last.velocity, self.mass, self.damping);
            self.cache = [last, next];
        }

        let alpha = self.clock.alpha();
        self.position = self.cache[0].position.lerp_to(self.cache[1].position, alpha);
        self.velocity = self.cache[0].velocity.lerp_to(self.cache[1].velocity, alpha);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_step() {
        let frame = spring(0.0_f32, 1.0, 0.0, 10.0, 0.5);
        assert!((frame.velocity - 0.05).abs() < 1e-6);
        assert!((frame.position - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_chunk_invariance() {
        // One 0.1s step versus six 1/60s steps land on the same output
        let mut single = SpringSimulator::<f32>::new(60.0, 50.0, 0.8);
        single.target = 1.0;
        single.simulate(0.1);

        let mut chunked = SpringSimulator::<f32>::new(60.0, 50.0, 0.8);
        chunked.target = 1.0;
        for _ in 0..6 {
            chunked.simulate(1.0 / 60.0);
        }

        assert!(
            (single.position - chunked.position).abs() < 1e-4,
            "single={} chunked={}",
            single.position,
            chunked.position
        );
    }

    #[test]
    fn test_vector_spring_converges() {
        let mut sim = SpringSimulator::<Vec3>::new(60.0, 10.0, 0.5);
        sim.target = Vec3::new(1.0, 0.0, -2.0);
        for _ in 0..600 {
            sim.simulate(1.0 / 60.0);
        }
        assert!(
            (sim.position - sim.target).length() < 1e-3,
            "position={:?}",
            sim.position
        );
    }

    #[test]
    fn test_non_positive_dt_is_ignored() {
        let mut sim = SpringSimulator::<f32>::new(60.0, 10.0, 0.5);
        sim.target = 1.0;
        sim.simulate(1.0 / 60.0);
        let before = sim.position;

        sim.simulate(0.0);
        sim.simulate(-0.5);
        sim.simulate(f32::NAN);

        assert!(sim.position.is_finite());
        assert_eq!(sim.position, before);
    }

    #[test]
    fn test_init_resets_everything() {
        let mut sim = SpringSimulator::<Vec3>::new(60.0, 10.0, 0.5);
        sim.target = Vec3::ONE;
        sim.simulate(0.5);
        sim.init();
        assert_eq!(sim.position, Vec3::ZERO);
        assert_eq!(sim.velocity, Vec3::ZERO);
        assert_eq!(sim.target, Vec3::ZERO);

        sim.simulate(0.5);
        assert_eq!(sim.position, Vec3::ZERO);
    }

    #[test]
    fn test_frame_clock_carries_offset() {
        let mut clock = FrameClock::new(64.0);
        assert_eq!(clock.advance(1.5 / 64.0), 1);
        assert!((clock.alpha() - 0.5).abs() < 1e-5);
        assert_eq!(clock.advance(0.5 / 64.0), 1);
        assert!(clock.alpha().abs() < 1e-5);
    }
}
