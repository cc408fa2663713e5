//! Editable mesh controller
//!
//! Owns one engine mesh and keeps its render representation in sync:
//! - Build/unbuild from any [`MeshSource`]
//! - Brush strokes, booleans and undo/redo delegated to the engine
//! - After every content change, pick Unified or Sharded rendering
//!   (see [`ShardingState`]) and upload only what changed
//!
//! Failures never propagate out of the controller. A failed build leaves it
//! "not ready" and every later operation is a no-op until the next
//! successful build.

mod edit;
mod source;
mod stroke;

use std::fmt;
use std::rc::Rc;

use glam::Mat4;
use mesh_sync_config::{ConfigError, Watermarks};
use tracing::{debug, error, warn};

use crate::engine::{BrushHandle, GeometryEngine, MeshHandle};
use crate::render::RenderBackend;
use crate::shards::{ShardRegistry, SyncReport};
use crate::state::ShardingState;
use crate::types::{Aabb, Ray, RayHit, ShardId};

pub use source::{BuildError, MeshSource};

/// An engine mesh plus its render resources.
pub struct EditableMesh<E: GeometryEngine, B: RenderBackend> {
    label: String,
    engine: Rc<E>,
    /// Brush of the stroke in progress. Declared before `handle` so it is
    /// released first.
    pub(crate) stroke: Option<BrushHandle<E>>,
    handle: Option<MeshHandle<E>>,
    /// Whether strokes are accepted
    pub editable: bool,
    /// Whether scene picking considers this mesh
    pub visible: bool,
    world_transform: Mat4,
    watermarks: Watermarks,
    state: ShardingState,
    unified: Option<B::Resource>,
    shards: ShardRegistry<B::Resource>,
    bounds: Aabb,
    sync_count: u64,
    last_report: SyncReport,
}

impl<E: GeometryEngine, B: RenderBackend> EditableMesh<E, B> {
    /// Create an empty controller with default watermarks.
    pub fn new(engine: Rc<E>, label: impl Into<String>) -> Self {
        Self::with_valid_watermarks(engine, label, Watermarks::default())
    }

    /// Create an empty controller with custom watermarks.
    ///
    /// Fails when `low >= high`, which would make the sharding state flip on
    /// every sync.
    pub fn with_watermarks(
        engine: Rc<E>,
        label: impl Into<String>,
        watermarks: Watermarks,
    ) -> Result<Self, ConfigError> {
        watermarks.validate()?;
        Ok(Self::with_valid_watermarks(engine, label, watermarks))
    }

    pub(crate) fn with_valid_watermarks(
        engine: Rc<E>,
        label: impl Into<String>,
        watermarks: Watermarks,
    ) -> Self {
        let label = label.into();
        Self {
            shards: ShardRegistry::new(label.clone()),
            label,
            engine,
            stroke: None,
            handle: None,
            editable: true,
            visible: true,
            world_transform: Mat4::IDENTITY,
            watermarks,
            state: ShardingState::Unspecified,
            unified: None,
            bounds: Aabb::default(),
            sync_count: 0,
            last_report: SyncReport::default(),
        }
    }

    /// Replace the current mesh with one built from `source`.
    ///
    /// The previous mesh and all of its render resources are released first.
    /// On failure the controller is left not ready; the error is logged.
    pub fn build(&mut self, source: MeshSource<'_, E>, render: &mut B) {
        self.release(render);

        match source::acquire(&self.engine, &source) {
            Ok(handle) => {
                if !self.engine.is_manifold(handle.raw()) {
                    warn!(
                        "{}: {} is not manifold, some operations may misbehave",
                        self.label,
                        source.describe()
                    );
                }
                debug!("{}: built from {}", self.label, source.describe());
                self.handle = Some(handle);
                self.sync(render);
            }
            Err(err) => {
                error!("{}: build failed: {}", self.label, err);
            }
        }
    }

    /// Release the mesh and every render resource.
    pub fn unbuild(&mut self, render: &mut B) {
        if self.handle.is_some() {
            debug!("{}: unbuilt", self.label);
        }
        self.release(render);
    }

    fn release(&mut self, render: &mut B) {
        self.stroke = None;
        self.handle = None;
        self.release_render(render);
        self.bounds = Aabb::default();
    }

    fn release_render(&mut self, render: &mut B) {
        self.shards.clear(render);
        if let Some(resource) = self.unified.take() {
            render.dispose(resource);
        }
        self.state = ShardingState::Unspecified;
    }

    /// Bring the render resources in line with the engine mesh.
    ///
    /// Chooses Unified or Sharded rendering from the current vertex count,
    /// tearing down the other representation on a switch. No-op when not
    /// ready.
    pub fn sync(&mut self, render: &mut B) -> SyncReport {
        let Some(handle) = &self.handle else {
            return SyncReport::default();
        };
        let raw = handle.raw();
        let engine = handle.engine();

        let vertex_count = engine.vertex_count(raw);
        let next = self.state.next(vertex_count, &self.watermarks);
        if next != self.state {
            debug!(
                "{}: {:?} -> {:?} at {} vertices",
                self.label, self.state, next, vertex_count
            );
        }

        let mut report = SyncReport::default();
        match next {
            ShardingState::Unified => {
                report.destroyed += self.shards.clear(render);
                let geometry = engine.geometry(raw);
                match self.unified.as_mut() {
                    Some(resource) => render.replace_buffers(resource, &geometry),
                    None => {
                        let mut resource = render.create(&self.label, geometry.vertex_count());
                        render.replace_buffers(&mut resource, &geometry);
                        self.unified = Some(resource);
                    }
                }
                report.unified_upload = true;
            }
            ShardingState::Sharded => {
                if let Some(resource) = self.unified.take() {
                    render.dispose(resource);
                }
                report.merge(self.shards.reconcile(engine, raw, render));
            }
            ShardingState::Unspecified => {}
        }

        self.state = next;
        self.bounds = engine.bounding_box(raw);
        self.sync_count += 1;
        self.last_report = report;
        debug!("{}: sync #{} {:?}", self.label, self.sync_count, report);
        report
    }

    // --- accessors ---

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Rename the controller; shard resources created from now on use it.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
        self.shards.set_label(self.label.clone());
    }

    /// Whether a mesh is loaded.
    pub fn is_ready(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&MeshHandle<E>> {
        self.handle.as_ref()
    }

    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    /// Local-to-world transform used by strokes, booleans and picking.
    pub fn set_world_transform(&mut self, world_transform: Mat4) {
        self.world_transform = world_transform;
    }

    pub fn watermarks(&self) -> Watermarks {
        self.watermarks
    }

    pub fn sharding_state(&self) -> ShardingState {
        self.state
    }

    /// Registered shard IDs (empty unless sharded).
    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.shards.ids()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn has_unified_resource(&self) -> bool {
        self.unified.is_some()
    }

    /// Number of synchronization cycles run so far.
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }

    pub fn last_report(&self) -> SyncReport {
        self.last_report
    }

    pub fn vertex_count(&self) -> usize {
        self.handle
            .as_ref()
            .map_or(0, |h| h.engine().vertex_count(h.raw()))
    }

    pub fn is_manifold(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.engine().is_manifold(h.raw()))
    }

    pub fn can_undo(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.engine().can_undo(h.raw()))
    }

    pub fn can_redo(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.engine().can_redo(h.raw()))
    }

    /// Local-space bounds as of the last synchronization.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Local bounds scaled by the world transform's scale.
    pub fn scaled_bounds(&self) -> Aabb {
        let (scale, _, _) = self.world_transform.to_scale_rotation_translation();
        self.bounds.scaled(scale)
    }

    /// Closest hit of a world-space ray on this mesh.
    pub fn closest_intersection(&self, ray: &Ray) -> Option<RayHit> {
        let handle = self.handle.as_ref()?;
        handle
            .engine()
            .closest_intersection(handle.raw(), &self.world_transform, ray)
    }
}

impl<E: GeometryEngine, B: RenderBackend> fmt::Debug for EditableMesh<E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableMesh")
            .field("label", &self.label)
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("shards", &self.shards.len())
            .field("unified", &self.unified.is_some())
            .field("editable", &self.editable)
            .field("sync_count", &self.sync_count)
            .finish()
    }
}
