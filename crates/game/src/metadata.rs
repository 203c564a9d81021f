//! Authored object metadata.
//!
//! Level and vehicle files describe seats, wheels, doors and path nodes as
//! named objects with a transform and a bag of string properties.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// String-keyed properties attached to an authored object.
pub type Metadata = BTreeMap<String, String>;

/// A named object with a transform relative to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoredObject {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    /// Box half extents, or a sphere radius in `x`.
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub data: Metadata,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl AuthoredObject {
    pub fn new(name: &str, position: Vec3) -> Self {
        Self {
            name: name.to_string(),
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            data: Metadata::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// Split a `;`-separated name list, skipping empty entries.
pub fn split_names(value: &str) -> Vec<String> {
    value
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
