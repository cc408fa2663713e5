//! Scene context: the editable meshes of one document plus their shared
//! undo/redo ordering.
//!
//! Created explicitly by the host and passed to whatever needs it. Dropping
//! the scene drops every controller (and with it every engine mesh); call
//! [`Scene::clear`] first to release render resources through the backend.

use std::collections::BTreeMap;
use std::rc::Rc;

use mesh_sync_config::{ConfigError, SyncConfig};
use thiserror::Error;
use tracing::debug;

use crate::controller::EditableMesh;
use crate::engine::GeometryEngine;
use crate::history::UndoRedoHistory;
use crate::render::RenderBackend;
use crate::types::{BooleanOp, MeshId, Ray, RayHit};

/// Errors for operations that address meshes by id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("Unknown mesh {0:?}")]
    UnknownMesh(MeshId),
    #[error("Mesh {0:?} cannot be combined with itself")]
    SameMesh(MeshId),
}

/// Owns the controllers of a document and routes global undo/redo.
pub struct Scene<E: GeometryEngine, B: RenderBackend> {
    engine: Rc<E>,
    config: SyncConfig,
    meshes: BTreeMap<MeshId, EditableMesh<E, B>>,
    history: UndoRedoHistory<MeshId>,
    next_id: u32,
}

impl<E: GeometryEngine, B: RenderBackend> Scene<E, B> {
    /// Create an empty scene. The configuration is validated first.
    pub fn new(engine: Rc<E>, config: SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            history: UndoRedoHistory::with_capacity(config.max_history),
            engine,
            config,
            meshes: BTreeMap::new(),
            next_id: 0,
        })
    }

    pub fn engine(&self) -> &Rc<E> {
        &self.engine
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Add an empty controller and return its id.
    pub fn spawn(&mut self, label: impl Into<String>) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        let mesh =
            EditableMesh::with_valid_watermarks(Rc::clone(&self.engine), label, self.config.watermarks);
        self.meshes.insert(id, mesh);
        id
    }

    pub fn get(&self, id: MeshId) -> Option<&EditableMesh<E, B>> {
        self.meshes.get(&id)
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut EditableMesh<E, B>> {
        self.meshes.get_mut(&id)
    }

    fn mesh_mut(&mut self, id: MeshId) -> Result<&mut EditableMesh<E, B>, SceneError> {
        self.meshes.get_mut(&id).ok_or(SceneError::UnknownMesh(id))
    }

    pub fn ids(&self) -> Vec<MeshId> {
        self.meshes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn history(&self) -> &UndoRedoHistory<MeshId> {
        &self.history
    }

    /// Unbuild and drop a controller, and forget its history entries.
    pub fn remove(&mut self, id: MeshId, render: &mut B) -> Result<(), SceneError> {
        let mut mesh = self.meshes.remove(&id).ok_or(SceneError::UnknownMesh(id))?;
        mesh.unbuild(render);
        self.history.forget(id);
        debug!("Removed mesh {:?} ({})", id, mesh.label());
        Ok(())
    }

    /// Record that `id` was just edited, for global undo/redo.
    pub fn record_edit(&mut self, id: MeshId) -> Result<(), SceneError> {
        if !self.meshes.contains_key(&id) {
            return Err(SceneError::UnknownMesh(id));
        }
        self.history.add_entry(id);
        Ok(())
    }

    /// End the stroke in progress on `id` and record the edit.
    pub fn stop_stroke(&mut self, id: MeshId, render: &mut B) -> Result<(), SceneError> {
        let mesh = self.mesh_mut(id)?;
        let had_stroke = mesh.active_brush().is_some();
        mesh.stop_stroke(render);
        if had_stroke {
            self.history.add_entry(id);
        }
        Ok(())
    }

    /// Apply `op` to `target` with `source` as operand and record the edit.
    ///
    /// Returns the engine's success flag. A ready target is resynchronized
    /// and recorded whatever the outcome; an unbuilt one is left untouched.
    pub fn boolean(
        &mut self,
        op: BooleanOp,
        target: MeshId,
        source: MeshId,
        render: &mut B,
    ) -> Result<bool, SceneError> {
        if target == source {
            return Err(SceneError::SameMesh(target));
        }
        let operand = self
            .meshes
            .remove(&source)
            .ok_or(SceneError::UnknownMesh(source))?;
        let outcome = match self.meshes.get_mut(&target) {
            Some(mesh) => Ok(mesh.boolean(op, &operand, render)),
            None => Err(SceneError::UnknownMesh(target)),
        };
        self.meshes.insert(source, operand);

        let succeeded = outcome?;
        if self.meshes.get(&target).is_some_and(|mesh| mesh.is_ready()) {
            self.history.add_entry(target);
        }
        Ok(succeeded)
    }

    /// Undo the most recent edit across all meshes. Returns the mesh undone.
    pub fn undo(&mut self, render: &mut B) -> Option<MeshId> {
        let id = self.history.undo()?;
        match self.meshes.get_mut(&id) {
            Some(mesh) => mesh.undo(render, true),
            None => debug!("Undo skipped, mesh {:?} is gone", id),
        }
        Some(id)
    }

    /// Redo the next undone edit across all meshes. Returns the mesh redone.
    pub fn redo(&mut self, render: &mut B) -> Option<MeshId> {
        let id = self.history.redo()?;
        match self.meshes.get_mut(&id) {
            Some(mesh) => mesh.redo(render, true),
            None => debug!("Redo skipped, mesh {:?} is gone", id),
        }
        Some(id)
    }

    /// Nearest hit of `ray` among visible, ready meshes.
    pub fn closest_mesh(&self, ray: &Ray) -> Option<(MeshId, RayHit)> {
        self.meshes
            .iter()
            .filter(|(_, mesh)| mesh.visible)
            .filter_map(|(id, mesh)| mesh.closest_intersection(ray).map(|hit| (*id, hit)))
            .min_by(|(_, a), (_, b)| {
                a.distance_from(ray.origin)
                    .total_cmp(&b.distance_from(ray.origin))
            })
    }

    pub fn mirror_mode(&self) -> bool {
        self.engine.mirror_mode()
    }

    /// Toggle engine-wide brush symmetry.
    pub fn set_mirror_mode(&mut self, enabled: bool) {
        self.engine.set_mirror_mode(enabled);
    }

    /// Unbuild and drop every controller and clear the history.
    pub fn clear(&mut self, render: &mut B) {
        for (_, mut mesh) in std::mem::take(&mut self.meshes) {
            mesh.unbuild(render);
        }
        self.history.clear();
    }
}
