//! Scripted engine and recording render backend for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use glam::{Mat4, Vec3};

use crate::boolean::RelativeTransform;
use crate::engine::{GeometryEngine, RawBrushId, RawMeshId};
use crate::render::RenderBackend;
use crate::types::{Aabb, BooleanOp, BrushKind, MeshGeometry, Primitive, Ray, RayHit, ShardId, StrokeSample};

const SPHERE_VERTICES: usize = 482;
const BOX_VERTICES: usize = 24;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BooleanCall {
    pub op: BooleanOp,
    pub target: RawMeshId,
    pub source: RawMeshId,
    pub relative: RelativeTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StrokeEvent {
    Start(BrushKind),
    Update(BrushKind),
    End(BrushKind),
}

#[derive(Debug, Clone)]
struct FakeShard {
    id: ShardId,
    version: u32,
    vertices: usize,
}

#[derive(Debug, Clone)]
struct FakeMesh {
    vertex_count: usize,
    extent: f32,
    manifold: bool,
    shards: Vec<FakeShard>,
    shard_updates: usize,
    undo_depth: usize,
    redo_depth: usize,
    hit: Option<RayHit>,
}

impl FakeMesh {
    fn new(vertex_count: usize, extent: f32, manifold: bool) -> Self {
        Self {
            vertex_count,
            extent,
            manifold,
            shards: Vec::new(),
            shard_updates: 0,
            undo_depth: 0,
            redo_depth: 0,
            hit: None,
        }
    }
}

#[derive(Debug)]
struct FakeState {
    next_id: u64,
    meshes: HashMap<RawMeshId, FakeMesh>,
    deleted: Vec<RawMeshId>,
    brushes: HashMap<RawBrushId, BrushKind>,
    generated: Vec<Primitive>,
    boolean_calls: Vec<BooleanCall>,
    boolean_result: bool,
    boolean_effect: Option<usize>,
    stroke_events: Vec<StrokeEvent>,
    stroke_growth: usize,
    last_stroke_world: Option<Mat4>,
    undo_calls: Vec<RawMeshId>,
    redo_calls: Vec<RawMeshId>,
    fail_loads: bool,
    next_manifold: bool,
    mirror: bool,
}

/// In-memory stand-in for the geometry engine.
#[derive(Debug)]
pub(crate) struct FakeEngine {
    state: RefCell<FakeState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(FakeState {
                next_id: 1,
                meshes: HashMap::new(),
                deleted: Vec::new(),
                brushes: HashMap::new(),
                generated: Vec::new(),
                boolean_calls: Vec::new(),
                boolean_result: true,
                boolean_effect: None,
                stroke_events: Vec::new(),
                stroke_growth: 0,
                last_stroke_world: None,
                undo_calls: Vec::new(),
                redo_calls: Vec::new(),
                fail_loads: false,
                next_manifold: true,
                mirror: false,
            }),
        }
    }

    fn insert(&self, vertex_count: usize, extent: f32) -> Option<RawMeshId> {
        let mut state = self.state.borrow_mut();
        if state.fail_loads {
            return None;
        }
        let id = RawMeshId(state.next_id);
        state.next_id += 1;
        let manifold = state.next_manifold;
        state.next_manifold = true;
        state
            .meshes
            .insert(id, FakeMesh::new(vertex_count, extent, manifold));
        Some(id)
    }

    fn with_mesh<T>(&self, mesh: RawMeshId, default: T, f: impl FnOnce(&FakeMesh) -> T) -> T {
        self.state.borrow().meshes.get(&mesh).map_or(default, f)
    }

    fn with_mesh_mut(&self, mesh: RawMeshId, f: impl FnOnce(&mut FakeMesh)) {
        if let Some(m) = self.state.borrow_mut().meshes.get_mut(&mesh) {
            f(m);
        }
    }

    // --- scripting ---

    pub fn set_fail_loads(&self, fail: bool) {
        self.state.borrow_mut().fail_loads = fail;
    }

    pub fn set_next_manifold(&self, manifold: bool) {
        self.state.borrow_mut().next_manifold = manifold;
    }

    pub fn set_vertex_count(&self, mesh: RawMeshId, count: usize) {
        self.with_mesh_mut(mesh, |m| m.vertex_count = count);
    }

    /// Replace the shard partition with `(id, version, vertices)` triples.
    pub fn set_shards(&self, mesh: RawMeshId, shards: &[(u32, u32, usize)]) {
        self.with_mesh_mut(mesh, |m| {
            m.shards = shards
                .iter()
                .map(|&(id, version, vertices)| FakeShard {
                    id: ShardId(id),
                    version,
                    vertices,
                })
                .collect();
        });
    }

    pub fn set_boolean_result(&self, result: bool) {
        self.state.borrow_mut().boolean_result = result;
    }

    /// Vertex count a boolean leaves the target with.
    pub fn set_boolean_effect(&self, vertex_count: Option<usize>) {
        self.state.borrow_mut().boolean_effect = vertex_count;
    }

    /// Vertices added by every stroke sample.
    pub fn set_stroke_growth(&self, growth: usize) {
        self.state.borrow_mut().stroke_growth = growth;
    }

    pub fn set_hit(&self, mesh: RawMeshId, hit: Option<RayHit>) {
        self.with_mesh_mut(mesh, |m| m.hit = hit);
    }

    /// Pretend `depth` edits were made on `mesh`.
    pub fn set_undo_depth(&self, mesh: RawMeshId, depth: usize) {
        self.with_mesh_mut(mesh, |m| m.undo_depth = depth);
    }

    // --- inspection ---

    pub fn live_meshes(&self) -> usize {
        self.state.borrow().meshes.len()
    }

    pub fn deleted_meshes(&self) -> Vec<RawMeshId> {
        self.state.borrow().deleted.clone()
    }

    pub fn live_brushes(&self) -> usize {
        self.state.borrow().brushes.len()
    }

    pub fn generated_primitives(&self) -> Vec<Primitive> {
        self.state.borrow().generated.clone()
    }

    pub fn boolean_calls(&self) -> Vec<BooleanCall> {
        self.state.borrow().boolean_calls.clone()
    }

    pub fn stroke_events(&self) -> Vec<StrokeEvent> {
        self.state.borrow().stroke_events.clone()
    }

    pub fn last_stroke_world(&self) -> Option<Mat4> {
        self.state.borrow().last_stroke_world
    }

    pub fn undo_calls(&self) -> Vec<RawMeshId> {
        self.state.borrow().undo_calls.clone()
    }

    pub fn redo_calls(&self) -> Vec<RawMeshId> {
        self.state.borrow().redo_calls.clone()
    }

    pub fn shard_updates(&self, mesh: RawMeshId) -> usize {
        self.with_mesh(mesh, 0, |m| m.shard_updates)
    }

    fn find_shard(&self, mesh: RawMeshId, shard: ShardId) -> Option<FakeShard> {
        self.with_mesh(mesh, None, |m| {
            m.shards.iter().find(|s| s.id == shard).cloned()
        })
    }
}

fn fake_geometry(vertices: usize) -> MeshGeometry {
    let positions: Vec<Vec3> = (0..vertices).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
    let normals = vec![Vec3::Y; vertices];
    let indices = (0..(vertices / 3 * 3) as u32).collect();
    MeshGeometry {
        indices,
        positions,
        normals,
    }
}

impl GeometryEngine for FakeEngine {
    fn load_from_bytes(&self, data: &[u8], _name: &str) -> Option<RawMeshId> {
        let vertices = data.split(|b| *b == b'\n').filter(|l| l.starts_with(b"v ")).count();
        self.insert(vertices.max(1), 1.0)
    }

    fn load_from_file(&self, _path: &Path) -> Option<RawMeshId> {
        self.insert(100, 1.0)
    }

    fn clone_mesh(&self, mesh: RawMeshId) -> Option<RawMeshId> {
        let (count, extent) = self.with_mesh(mesh, None, |m| Some((m.vertex_count, m.extent)))?;
        self.insert(count, extent)
    }

    fn create_from_arrays(&self, _triangles: &[u32], vertices: &[Vec3]) -> Option<RawMeshId> {
        self.insert(vertices.len(), 1.0)
    }

    fn generate_primitive(&self, primitive: Primitive) -> Option<RawMeshId> {
        self.state.borrow_mut().generated.push(primitive);
        match primitive {
            Primitive::Box { width, .. } => self.insert(BOX_VERTICES, width * 0.5),
            Primitive::Sphere { radius } => self.insert(SPHERE_VERTICES, radius),
        }
    }

    fn delete_mesh(&self, mesh: RawMeshId) {
        let mut state = self.state.borrow_mut();
        if state.meshes.remove(&mesh).is_some() {
            state.deleted.push(mesh);
        }
    }

    fn is_manifold(&self, mesh: RawMeshId) -> bool {
        self.with_mesh(mesh, false, |m| m.manifold)
    }

    fn vertex_count(&self, mesh: RawMeshId) -> usize {
        self.with_mesh(mesh, 0, |m| m.vertex_count)
    }

    fn geometry(&self, mesh: RawMeshId) -> MeshGeometry {
        fake_geometry(self.vertex_count(mesh))
    }

    fn bounding_box(&self, mesh: RawMeshId) -> Aabb {
        self.with_mesh(mesh, Aabb::default(), |m| {
            Aabb::new(Vec3::splat(-m.extent), Vec3::splat(m.extent))
        })
    }

    fn can_undo(&self, mesh: RawMeshId) -> bool {
        self.with_mesh(mesh, false, |m| m.undo_depth > 0)
    }

    fn can_redo(&self, mesh: RawMeshId) -> bool {
        self.with_mesh(mesh, false, |m| m.redo_depth > 0)
    }

    fn undo(&self, mesh: RawMeshId) {
        self.state.borrow_mut().undo_calls.push(mesh);
        self.with_mesh_mut(mesh, |m| {
            if m.undo_depth > 0 {
                m.undo_depth -= 1;
                m.redo_depth += 1;
            }
        });
    }

    fn redo(&self, mesh: RawMeshId) {
        self.state.borrow_mut().redo_calls.push(mesh);
        self.with_mesh_mut(mesh, |m| {
            if m.redo_depth > 0 {
                m.redo_depth -= 1;
                m.undo_depth += 1;
            }
        });
    }

    fn update_shards(&self, mesh: RawMeshId) {
        self.with_mesh_mut(mesh, |m| m.shard_updates += 1);
    }

    fn shard_count(&self, mesh: RawMeshId) -> usize {
        self.with_mesh(mesh, 0, |m| m.shards.len())
    }

    fn shard_id(&self, mesh: RawMeshId, index: usize) -> ShardId {
        self.with_mesh(mesh, ShardId(u32::MAX), |m| {
            m.shards.get(index).map_or(ShardId(u32::MAX), |s| s.id)
        })
    }

    fn shard_version(&self, mesh: RawMeshId, shard: ShardId) -> u32 {
        self.find_shard(mesh, shard).map_or(0, |s| s.version)
    }

    fn shard_geometry(&self, mesh: RawMeshId, shard: ShardId) -> MeshGeometry {
        fake_geometry(self.find_shard(mesh, shard).map_or(0, |s| s.vertices))
    }

    fn shard_bounding_box(&self, mesh: RawMeshId, shard: ShardId) -> Aabb {
        let offset = shard.0 as f32;
        let extent = self.with_mesh(mesh, 0.0, |m| m.extent);
        Aabb::new(Vec3::splat(offset - extent), Vec3::splat(offset + extent))
    }

    fn boolean(
        &self,
        op: BooleanOp,
        target: RawMeshId,
        source: RawMeshId,
        relative: &RelativeTransform,
    ) -> bool {
        let (result, effect) = {
            let mut state = self.state.borrow_mut();
            state.boolean_calls.push(BooleanCall {
                op,
                target,
                source,
                relative: *relative,
            });
            (state.boolean_result, state.boolean_effect)
        };
        if let Some(count) = effect {
            self.set_vertex_count(target, count);
        }
        self.with_mesh_mut(target, |m| {
            m.undo_depth += 1;
            m.redo_depth = 0;
        });
        result
    }

    fn create_brush(&self, _mesh: RawMeshId, kind: BrushKind) -> RawBrushId {
        let mut state = self.state.borrow_mut();
        let id = RawBrushId(state.next_id);
        state.next_id += 1;
        state.brushes.insert(id, kind);
        id
    }

    fn delete_brush(&self, brush: RawBrushId) {
        self.state.borrow_mut().brushes.remove(&brush);
    }

    fn start_stroke(&self, brush: RawBrushId) {
        let mut state = self.state.borrow_mut();
        if let Some(&kind) = state.brushes.get(&brush) {
            state.stroke_events.push(StrokeEvent::Start(kind));
        }
    }

    fn update_stroke(&self, brush: RawBrushId, world: &Mat4, _sample: &StrokeSample) {
        let growth = {
            let mut state = self.state.borrow_mut();
            if let Some(&kind) = state.brushes.get(&brush) {
                state.stroke_events.push(StrokeEvent::Update(kind));
            }
            state.last_stroke_world = Some(*world);
            state.stroke_growth
        };
        let mut state = self.state.borrow_mut();
        for mesh in state.meshes.values_mut() {
            mesh.vertex_count += growth;
        }
    }

    fn end_stroke(&self, brush: RawBrushId) {
        let mut state = self.state.borrow_mut();
        if let Some(&kind) = state.brushes.get(&brush) {
            state.stroke_events.push(StrokeEvent::End(kind));
        }
    }

    fn closest_intersection(&self, mesh: RawMeshId, _world: &Mat4, _ray: &Ray) -> Option<RayHit> {
        self.with_mesh(mesh, None, |m| m.hit)
    }

    fn mirror_mode(&self) -> bool {
        self.state.borrow().mirror
    }

    fn set_mirror_mode(&self, enabled: bool) {
        self.state.borrow_mut().mirror = enabled;
    }
}

/// Calls recorded by [`FakeRender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenderCall {
    Create {
        resource: u32,
        label: String,
        capacity: usize,
    },
    Replace {
        resource: u32,
        vertices: usize,
    },
    Update {
        resource: u32,
        vertices: usize,
    },
    Dispose {
        resource: u32,
    },
}

#[derive(Debug)]
pub(crate) struct FakeResource {
    id: u32,
    capacity: usize,
}

/// Render backend that records every call.
#[derive(Debug, Default)]
pub(crate) struct FakeRender {
    next: u32,
    live: HashSet<u32>,
    calls: Vec<RenderCall>,
}

impl FakeRender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_resources(&self) -> usize {
        self.live.len()
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.clone()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of buffer writes (full or in place).
    pub fn upload_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RenderCall::Replace { .. } | RenderCall::Update { .. }))
            .count()
    }
}

impl RenderBackend for FakeRender {
    type Resource = FakeResource;

    fn create(&mut self, label: &str, capacity: usize) -> FakeResource {
        let id = self.next;
        self.next += 1;
        self.live.insert(id);
        self.calls.push(RenderCall::Create {
            resource: id,
            label: label.to_string(),
            capacity,
        });
        FakeResource { id, capacity }
    }

    fn replace_buffers(&mut self, resource: &mut FakeResource, geometry: &MeshGeometry) {
        resource.capacity = geometry.vertex_count();
        self.calls.push(RenderCall::Replace {
            resource: resource.id,
            vertices: geometry.vertex_count(),
        });
    }

    fn update_buffers(&mut self, resource: &mut FakeResource, geometry: &MeshGeometry) {
        assert!(geometry.vertex_count() <= resource.capacity, "in-place write overflows resource");
        self.calls.push(RenderCall::Update {
            resource: resource.id,
            vertices: geometry.vertex_count(),
        });
    }

    fn capacity(&self, resource: &FakeResource) -> usize {
        resource.capacity
    }

    fn dispose(&mut self, resource: FakeResource) {
        self.live.remove(&resource.id);
        self.calls.push(RenderCall::Dispose {
            resource: resource.id,
        });
    }
}
