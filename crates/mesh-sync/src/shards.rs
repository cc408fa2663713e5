//! Shard registry: the render-side mirror of the engine's shard partition.
//!
//! Large meshes exceed the per-draw vertex ceiling of the rendering backend,
//! so the engine partitions them into shards. This registry keeps one draw
//! resource per shard and reconciles the set after every edit:
//!
//! 1. **Set-diff by ID**: shards are matched by their stable ID, never by
//!    enumeration order
//! 2. **Version stamps**: unchanged shards are skipped, so a stroke only
//!    re-uploads the shards it touched
//! 3. **Grow-then-write**: a changed shard is written in place when its
//!    resource is large enough and recreated otherwise

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::engine::{GeometryEngine, RawMeshId};
use crate::render::RenderBackend;
use crate::types::{Aabb, MeshGeometry, ShardId};

/// One render-visible shard.
#[derive(Debug)]
pub struct ShardRecord<R> {
    pub id: ShardId,
    /// Engine version stamp of the geometry currently uploaded.
    pub version: u32,
    /// Geometry last pulled from the engine.
    pub geometry: MeshGeometry,
    /// Local-space bounds reported by the engine.
    pub bounds: Aabb,
    pub resource: R,
}

/// Outcome of one synchronization cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Shards seen for the first time
    pub created: usize,
    /// Shards whose buffers were written in place
    pub updated: usize,
    /// Shards whose resource had to be recreated (grown or restamped)
    pub recreated: usize,
    /// Shards skipped because their stamp did not change
    pub skipped: usize,
    /// Records removed because the engine no longer reports them
    pub destroyed: usize,
    /// Whether the unified resource was (re)uploaded
    pub unified_upload: bool,
}

impl SyncReport {
    /// Number of buffer uploads performed during the cycle.
    pub fn uploads(&self) -> usize {
        self.created + self.updated + self.recreated + usize::from(self.unified_upload)
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: SyncReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.recreated += other.recreated;
        self.skipped += other.skipped;
        self.destroyed += other.destroyed;
        self.unified_upload |= other.unified_upload;
    }
}

/// Shard records of one mesh, keyed by stable shard ID.
#[derive(Debug)]
pub struct ShardRegistry<R> {
    records: HashMap<ShardId, ShardRecord<R>>,
    label: String,
}

impl<R> ShardRegistry<R> {
    /// Create an empty registry. `label` prefixes resource names.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            records: HashMap::new(),
            label: label.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: ShardId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get(&self, id: ShardId) -> Option<&ShardRecord<R>> {
        self.records.get(&id)
    }

    /// Registered shard IDs in ascending order.
    pub fn ids(&self) -> Vec<ShardId> {
        let mut ids: Vec<ShardId> = self.records.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Union of every shard's bounds, `None` when empty.
    pub fn bounds(&self) -> Option<Aabb> {
        self.records
            .values()
            .map(|r| r.bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Bring the registry in line with the engine's current partition.
    pub fn reconcile<E, B>(&mut self, engine: &E, mesh: RawMeshId, render: &mut B) -> SyncReport
    where
        E: GeometryEngine,
        B: RenderBackend<Resource = R>,
    {
        let mut report = SyncReport::default();

        engine.update_shards(mesh);
        let count = engine.shard_count(mesh);
        let mut reported = HashSet::with_capacity(count);

        for index in 0..count {
            let id = engine.shard_id(mesh, index);
            if !reported.insert(id) {
                warn!("Shard {:?} reported twice, ignoring duplicate at index {}", id, index);
                continue;
            }
            let version = engine.shard_version(mesh, id);
            let previous = self.records.get(&id).map(|r| r.version);

            match previous {
                Some(stored) if stored == version => {
                    trace!("Shard {:?} unchanged at v{}", id, version);
                    report.skipped += 1;
                }
                Some(stored) if stored < version => {
                    if let Some(record) = self.records.get_mut(&id) {
                        let recreated = refresh_record(record, engine, mesh, version, &self.label, render);
                        if recreated {
                            report.recreated += 1;
                        } else {
                            report.updated += 1;
                        }
                    }
                }
                Some(stored) => {
                    // Stamp went backwards: the engine reused the ID for new geometry
                    warn!(
                        "Shard {:?} stamp regressed v{} -> v{}, recreating",
                        id, stored, version
                    );
                    if let Some(old) = self.records.remove(&id) {
                        render.dispose(old.resource);
                    }
                    let record = create_record(engine, mesh, id, version, &self.label, render);
                    self.records.insert(id, record);
                    report.recreated += 1;
                }
                None => {
                    trace!("Shard {:?} created at v{}", id, version);
                    let record = create_record(engine, mesh, id, version, &self.label, render);
                    self.records.insert(id, record);
                    report.created += 1;
                }
            }
        }

        let stale: Vec<ShardId> = self
            .records
            .keys()
            .filter(|id| !reported.contains(*id))
            .copied()
            .collect();
        for id in stale {
            if let Some(record) = self.records.remove(&id) {
                debug!("Shard {:?} no longer reported, releasing", id);
                render.dispose(record.resource);
                report.destroyed += 1;
            }
        }

        report
    }

    /// Release every record. Returns how many were released.
    pub fn clear<B>(&mut self, render: &mut B) -> usize
    where
        B: RenderBackend<Resource = R>,
    {
        let released = self.records.len();
        for (_, record) in self.records.drain() {
            render.dispose(record.resource);
        }
        released
    }
}

fn resource_label(label: &str, id: ShardId) -> String {
    format!("{}-shard-{}", label, id.0)
}

fn create_record<E, B>(
    engine: &E,
    mesh: RawMeshId,
    id: ShardId,
    version: u32,
    label: &str,
    render: &mut B,
) -> ShardRecord<B::Resource>
where
    E: GeometryEngine,
    B: RenderBackend,
{
    let geometry = engine.shard_geometry(mesh, id);
    let mut resource = render.create(&resource_label(label, id), geometry.vertex_count());
    render.replace_buffers(&mut resource, &geometry);
    ShardRecord {
        id,
        version,
        bounds: engine.shard_bounding_box(mesh, id),
        geometry,
        resource,
    }
}

/// Re-pull a changed shard. Returns `true` when the resource was recreated.
fn refresh_record<E, B>(
    record: &mut ShardRecord<B::Resource>,
    engine: &E,
    mesh: RawMeshId,
    version: u32,
    label: &str,
    render: &mut B,
) -> bool
where
    E: GeometryEngine,
    B: RenderBackend,
{
    let geometry = engine.shard_geometry(mesh, record.id);
    let grow = render.capacity(&record.resource) < geometry.vertex_count();
    if grow {
        trace!(
            "Shard {:?} outgrew its resource ({} vertices), recreating",
            record.id,
            geometry.vertex_count()
        );
        let fresh = render.create(&resource_label(label, record.id), geometry.vertex_count());
        let old = std::mem::replace(&mut record.resource, fresh);
        render.dispose(old);
        render.replace_buffers(&mut record.resource, &geometry);
    } else {
        render.update_buffers(&mut record.resource, &geometry);
    }
    record.version = version;
    record.bounds = engine.shard_bounding_box(mesh, record.id);
    record.geometry = geometry;
    grow
}
