//! Boolean operations and per-mesh undo/redo for the controller

use tracing::debug;

use crate::boolean::apply_boolean;
use crate::engine::GeometryEngine;
use crate::render::RenderBackend;
use crate::types::BooleanOp;

use super::EditableMesh;

impl<E: GeometryEngine, B: RenderBackend> EditableMesh<E, B> {
    /// Carve `other` out of this mesh. Returns the engine's success flag.
    pub fn subtract(&mut self, other: &EditableMesh<E, B>, render: &mut B) -> bool {
        self.boolean(BooleanOp::Subtract, other, render)
    }

    /// Union `other` into this mesh. Returns the engine's success flag.
    pub fn merge(&mut self, other: &EditableMesh<E, B>, render: &mut B) -> bool {
        self.boolean(BooleanOp::Merge, other, render)
    }

    /// Keep only the volume shared with `other`. Returns the engine's success
    /// flag.
    pub fn intersect(&mut self, other: &EditableMesh<E, B>, render: &mut B) -> bool {
        self.boolean(BooleanOp::Intersect, other, render)
    }

    /// Apply `op` with `other` as operand, then resynchronize whatever the
    /// outcome. Vertex and triangle counts may have changed arbitrarily.
    pub fn boolean(&mut self, op: BooleanOp, other: &EditableMesh<E, B>, render: &mut B) -> bool {
        let Some(target) = self.handle.as_ref() else {
            debug!("{}: {:?} ignored, mesh not ready", self.label, op);
            return false;
        };
        let succeeded = match other.handle.as_ref() {
            Some(source) => apply_boolean(
                op,
                target,
                &self.world_transform,
                source,
                &other.world_transform,
            ),
            None => {
                debug!("{}: {:?} operand '{}' not ready", self.label, op, other.label);
                false
            }
        };
        self.sync(render);
        succeeded
    }

    /// Step this mesh's own history back.
    ///
    /// With `resync == false` the render resources are left stale so that a
    /// caller can batch several steps and call [`EditableMesh::sync`] once.
    pub fn undo(&mut self, render: &mut B, resync: bool) {
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        handle.engine().undo(handle.raw());
        if resync {
            self.sync(render);
        }
    }

    /// Step this mesh's own history forward. See [`EditableMesh::undo`].
    pub fn redo(&mut self, render: &mut B, resync: bool) {
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        handle.engine().redo(handle.raw());
        if resync {
            self.sync(render);
        }
    }
}
