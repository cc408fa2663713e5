//! Interface to the external geometry engine and owning guards for the
//! engine-resident objects a controller holds.
//!
//! The engine owns the real geometry, its shard partition and its edit
//! history. Everything here is a thin view: raw ids are only meaningful to
//! the engine that produced them, and only the guards below are allowed to
//! release them.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::boolean::RelativeTransform;
use crate::types::{Aabb, BooleanOp, BrushKind, MeshGeometry, Primitive, Ray, RayHit, ShardId, StrokeSample};

/// Engine-side identifier of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawMeshId(pub u64);

/// Engine-side identifier of a brush bound to a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawBrushId(pub u64);

/// Operations consumed from the geometry engine.
///
/// Methods take `&self`: the engine is shared between every controller of a
/// scene and manages its own interior state. Constructors return `None` when
/// the engine could not produce a mesh.
pub trait GeometryEngine {
    // --- creation / destruction ---
    fn load_from_bytes(&self, data: &[u8], name: &str) -> Option<RawMeshId>;
    fn load_from_file(&self, path: &Path) -> Option<RawMeshId>;
    fn clone_mesh(&self, mesh: RawMeshId) -> Option<RawMeshId>;
    fn create_from_arrays(&self, triangles: &[u32], vertices: &[Vec3]) -> Option<RawMeshId>;
    fn generate_primitive(&self, primitive: Primitive) -> Option<RawMeshId>;
    fn delete_mesh(&self, mesh: RawMeshId);

    // --- whole-mesh queries ---
    fn is_manifold(&self, mesh: RawMeshId) -> bool;
    fn vertex_count(&self, mesh: RawMeshId) -> usize;
    fn geometry(&self, mesh: RawMeshId) -> MeshGeometry;
    fn bounding_box(&self, mesh: RawMeshId) -> Aabb;

    // --- per-handle history ---
    fn can_undo(&self, mesh: RawMeshId) -> bool;
    fn can_redo(&self, mesh: RawMeshId) -> bool;
    fn undo(&self, mesh: RawMeshId);
    fn redo(&self, mesh: RawMeshId);

    // --- shard partition ---
    /// Recompute the engine's internal shard partition.
    fn update_shards(&self, mesh: RawMeshId);
    fn shard_count(&self, mesh: RawMeshId) -> usize;
    fn shard_id(&self, mesh: RawMeshId, index: usize) -> ShardId;
    /// Current version stamp; grows every time the shard's geometry changes.
    fn shard_version(&self, mesh: RawMeshId, shard: ShardId) -> u32;
    fn shard_geometry(&self, mesh: RawMeshId, shard: ShardId) -> MeshGeometry;
    fn shard_bounding_box(&self, mesh: RawMeshId, shard: ShardId) -> Aabb;

    // --- CSG ---
    /// Apply `op` to `target` using `source` placed by `relative` in the
    /// target's local frame. Returns the engine's success flag.
    fn boolean(
        &self,
        op: BooleanOp,
        target: RawMeshId,
        source: RawMeshId,
        relative: &RelativeTransform,
    ) -> bool;

    // --- brushes ---
    fn create_brush(&self, mesh: RawMeshId, kind: BrushKind) -> RawBrushId;
    fn delete_brush(&self, brush: RawBrushId);
    fn start_stroke(&self, brush: RawBrushId);
    fn update_stroke(&self, brush: RawBrushId, world: &Mat4, sample: &StrokeSample);
    fn end_stroke(&self, brush: RawBrushId);

    // --- picking / global settings ---
    fn closest_intersection(&self, mesh: RawMeshId, world: &Mat4, ray: &Ray) -> Option<RayHit>;
    fn mirror_mode(&self) -> bool;
    fn set_mirror_mode(&self, enabled: bool);
}

/// Exclusive ownership of an engine mesh.
///
/// Deletes the engine mesh when dropped, so every exit path of a build,
/// replacement or teardown releases it exactly once.
pub struct MeshHandle<E: GeometryEngine> {
    raw: RawMeshId,
    engine: Rc<E>,
}

impl<E: GeometryEngine> MeshHandle<E> {
    /// Take ownership of a mesh the engine just created.
    pub fn adopt(engine: Rc<E>, raw: RawMeshId) -> Self {
        Self { raw, engine }
    }

    pub fn raw(&self) -> RawMeshId {
        self.raw
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: GeometryEngine> Drop for MeshHandle<E> {
    fn drop(&mut self) {
        self.engine.delete_mesh(self.raw);
    }
}

impl<E: GeometryEngine> fmt::Debug for MeshHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshHandle").field("raw", &self.raw).finish()
    }
}

/// Exclusive ownership of an engine brush. Deleted on drop.
pub struct BrushHandle<E: GeometryEngine> {
    raw: RawBrushId,
    kind: BrushKind,
    engine: Rc<E>,
}

impl<E: GeometryEngine> BrushHandle<E> {
    /// Create a brush of `kind` bound to `mesh`.
    pub fn create(mesh: &MeshHandle<E>, kind: BrushKind) -> Self {
        let raw = mesh.engine.create_brush(mesh.raw, kind);
        Self {
            raw,
            kind,
            engine: Rc::clone(&mesh.engine),
        }
    }

    pub fn kind(&self) -> BrushKind {
        self.kind
    }

    pub fn start(&self) {
        self.engine.start_stroke(self.raw);
    }

    pub fn update(&self, world: &Mat4, sample: &StrokeSample) {
        self.engine.update_stroke(self.raw, world, sample);
    }

    pub fn end(&self) {
        self.engine.end_stroke(self.raw);
    }
}

impl<E: GeometryEngine> Drop for BrushHandle<E> {
    fn drop(&mut self) {
        self.engine.delete_brush(self.raw);
    }
}

impl<E: GeometryEngine> fmt::Debug for BrushHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrushHandle")
            .field("raw", &self.raw)
            .field("kind", &self.kind)
            .finish()
    }
}
