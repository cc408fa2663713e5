//! Render synchronization for engine-backed editable meshes.
//!
//! The geometry of an editable mesh lives in an external engine (brushes,
//! CSG, per-mesh undo). This crate keeps a renderable copy in sync with it:
//! - Unified rendering for small meshes, one draw resource per engine shard
//!   for large ones, switched with hysteresis
//! - Version-stamped, ID-keyed shard reconciliation so edits only re-upload
//!   what changed
//! - Boolean operations between independently placed meshes
//! - Cross-mesh undo/redo ordering
//!
//! # Architecture
//!
//! - **Engine**: [`GeometryEngine`] interface plus owning handles
//! - **Render**: [`RenderBackend`] interface for draw resources
//! - **Shards**: [`ShardRegistry`] reconciliation
//! - **Controller**: [`EditableMesh`] state machine and operations
//! - **Boolean**: relative transform computation and dispatch
//! - **History**: [`UndoRedoHistory`] ordering
//! - **Scene**: [`Scene`] context owning controllers and history

pub mod boolean;
pub mod controller;
pub mod engine;
pub mod history;
pub mod render;
pub mod scene;
pub mod shards;
pub mod state;
pub mod types;

#[cfg(feature = "bevy")]
pub mod bevy_backend;

#[cfg(test)]
pub(crate) mod test_support;

pub use boolean::{apply_boolean, RawRelativeTransform, RelativeTransform};
pub use controller::{BuildError, EditableMesh, MeshSource};
pub use engine::{BrushHandle, GeometryEngine, MeshHandle, RawBrushId, RawMeshId};
pub use history::{UndoRedoHistory, DEFAULT_MAX_HISTORY};
pub use mesh_sync_config::{ConfigError, SyncConfig, Watermarks};
pub use render::RenderBackend;
pub use scene::{Scene, SceneError};
pub use shards::{ShardRecord, ShardRegistry, SyncReport};
pub use state::ShardingState;
pub use types::{
    Aabb, BooleanOp, BrushKind, MeshGeometry, MeshId, Primitive, Ray, RayHit, ShardId,
    StrokeSample,
};
