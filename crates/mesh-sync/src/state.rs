//! Unified/Sharded state machine.
//!
//! A mesh is drawn either as one resource (Unified) or as one resource per
//! engine shard (Sharded). The switch uses two watermarks so that edits
//! hovering around a single threshold do not flip the representation back
//! and forth.

use mesh_sync_config::Watermarks;
use serde::{Deserialize, Serialize};

/// Render representation of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShardingState {
    /// Never synchronized (fresh, unbuilt or failed build)
    #[default]
    Unspecified,
    /// One draw resource for the whole mesh
    Unified,
    /// One draw resource per engine shard
    Sharded,
}

impl ShardingState {
    /// State to use for a mesh of `vertex_count` vertices, given the current
    /// state.
    ///
    /// Leaving Unified (or Unspecified) requires exceeding `high`; leaving
    /// Sharded requires dropping below `low`.
    pub fn next(self, vertex_count: usize, watermarks: &Watermarks) -> ShardingState {
        match self {
            ShardingState::Unspecified | ShardingState::Unified => {
                if vertex_count > watermarks.high {
                    ShardingState::Sharded
                } else {
                    ShardingState::Unified
                }
            }
            ShardingState::Sharded => {
                if vertex_count < watermarks.low {
                    ShardingState::Unified
                } else {
                    ShardingState::Sharded
                }
            }
        }
    }

    pub fn is_sharded(self) -> bool {
        self == ShardingState::Sharded
    }
}
