//! Fixed-rate spring simulators.
//!
//! Gameplay code sets a target; the spring chases it at an internal frame rate
//! independent of the caller's tick rate. Between integer frames the output is
//! interpolated, so the result only depends on the total elapsed time.
//!
//! # Key Types
//!
//! - [`SpringSimulator`]: generic over [`SpringValue`] (`f32` or `Vec3`)
//! - [`RelativeSpringSimulator`]: emits per-call deltas, used for rotation
//!
//! ```text
//!  dt ──► FrameClock ──► n frames ──► cache[0], cache[1] ──► lerp(alpha) ──► output
//! ```

mod relative;
mod simulator;

pub use relative::RelativeSpringSimulator;
pub use simulator::{spring, FrameClock, SimulationFrame, SpringSimulator, SpringValue};

/// Scalar spring.
pub type ScalarSpring = SpringSimulator<f32>;

/// Vector spring; components are integrated jointly.
pub type VectorSpring = SpringSimulator<glam::Vec3>;
