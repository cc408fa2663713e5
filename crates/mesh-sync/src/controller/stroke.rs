//! Brush stroke handling for the controller

use tracing::{debug, trace};

use crate::engine::{BrushHandle, GeometryEngine};
use crate::render::RenderBackend;
use crate::types::{BrushKind, StrokeSample};

use super::EditableMesh;

impl<E: GeometryEngine, B: RenderBackend> EditableMesh<E, B> {
    /// Kind of the stroke in progress, if any.
    pub fn active_brush(&self) -> Option<BrushKind> {
        self.stroke.as_ref().map(BrushHandle::kind)
    }

    /// Open a stroke with a brush of `kind`.
    ///
    /// A stroke already in progress is ended first; its final state is
    /// uploaded by the next synchronization. No-op when not editable or not
    /// ready.
    pub fn start_stroke(&mut self, kind: BrushKind) {
        if !self.editable {
            return;
        }
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        if let Some(previous) = self.stroke.take() {
            previous.end();
        }
        let brush = BrushHandle::create(handle, kind);
        brush.start();
        debug!("{}: stroke started with {:?}", self.label, kind);
        self.stroke = Some(brush);
    }

    /// Apply one brush sample and resynchronize.
    ///
    /// A different `kind` than the active stroke's closes it and opens a new
    /// one before the sample is applied. On a non-editable mesh this only
    /// stops the current stroke.
    pub fn update_stroke(&mut self, kind: BrushKind, sample: StrokeSample, render: &mut B) {
        if !self.editable {
            self.stop_stroke(render);
            return;
        }
        if self.handle.is_none() {
            return;
        }
        if self.active_brush() != Some(kind) {
            self.stop_stroke(render);
            self.start_stroke(kind);
        }
        if let Some(brush) = self.stroke.as_ref() {
            trace!("{}: stroke sample {:?}", self.label, sample.ray);
            brush.update(&self.world_transform, &sample);
            self.sync(render);
        }
    }

    /// End the stroke in progress and resynchronize. No-op without one.
    pub fn stop_stroke(&mut self, render: &mut B) {
        let Some(brush) = self.stroke.take() else {
            return;
        };
        brush.end();
        debug!("{}: stroke with {:?} ended", self.label, brush.kind());
        drop(brush);
        self.sync(render);
    }
}
