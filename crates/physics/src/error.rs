//! Physics errors.

use crate::body::BodyHandle;

#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("no body for handle {0:?}")]
    InvalidBody(BodyHandle),

    #[error("wheel index {index} out of range ({count} wheels)")]
    InvalidWheel { index: usize, count: usize },
}
