//! Shared configuration for mesh synchronization
//!
//! This crate provides the single source of truth for the vertex-count
//! watermarks that switch a mesh between one draw resource and one draw
//! resource per shard, and for the capacity of the cross-mesh undo history.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Vertex count below which a sharded mesh is reunified
pub const DEFAULT_LOW_WATERMARK: usize = 40_000;

/// Vertex count above which a unified mesh is sharded
pub const DEFAULT_HIGH_WATERMARK: usize = 65_000;

/// Default number of entries in the cross-mesh undo history
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Low watermark {low} must be below high watermark {high}")]
    InvalidWatermarks { low: usize, high: usize },
    #[error("Undo history capacity must be at least 1")]
    ZeroHistory,
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Hysteresis thresholds on the mesh vertex count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Watermarks {
    /// Sharded meshes with fewer vertices than this become unified
    pub low: usize,
    /// Unified meshes with more vertices than this become sharded
    pub high: usize,
}

impl Watermarks {
    /// Check that `low` sits strictly below `high`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low >= self.high {
            return Err(ConfigError::InvalidWatermarks {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

impl Default for Watermarks {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_WATERMARK,
            high: DEFAULT_HIGH_WATERMARK,
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct SyncConfig {
    pub watermarks: Watermarks,
    /// Capacity of the cross-mesh undo/redo history
    pub max_history: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            watermarks: Watermarks::default(),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the state machine and history rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watermarks.validate()?;
        if self.max_history == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        Ok(())
    }
}
