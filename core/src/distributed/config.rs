//! Process group configuration.

use crate::store::{ArrayError, Result};
use serde::{Deserialize, Serialize};

/// Shape of a process group.
///
/// The root is not configurable: it is always [`ROOT`](super::backend::ROOT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Total number of participating ranks.
    pub world_size: usize,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self { world_size: 1 }
    }
}

impl GroupConfig {
    pub fn new(world_size: usize) -> Self {
        Self { world_size }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.world_size == 0 {
            return Err(ArrayError::InvalidConfig(
                "world_size must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
