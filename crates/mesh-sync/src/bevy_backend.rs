//! Render backend over Bevy mesh assets.
//!
//! Each draw resource is a `Handle<Mesh>` in `Assets<Mesh>`. The host spawns
//! one entity per handle (the unified mesh, or one per shard) and despawns it
//! when the handle disappears from the controller.

use bevy::asset::{Assets, RenderAssetUsages};
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::render::RenderBackend;
use crate::types::MeshGeometry;

/// A mesh asset plus the vertex count it was sized for.
#[derive(Debug, Clone)]
pub struct DrawResource {
    pub handle: Handle<Mesh>,
    pub label: String,
    capacity: usize,
}

/// [`RenderBackend`] writing into `Assets<Mesh>`.
pub struct BevyMeshBackend<'a> {
    meshes: &'a mut Assets<Mesh>,
}

impl<'a> BevyMeshBackend<'a> {
    pub fn new(meshes: &'a mut Assets<Mesh>) -> Self {
        Self { meshes }
    }
}

/// Convert pulled geometry to a triangle-list Bevy mesh.
pub fn to_bevy_mesh(geometry: &MeshGeometry) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, geometry.position_arrays());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, geometry.normal_arrays());
    mesh.insert_indices(Indices::U32(geometry.indices.clone()));
    mesh
}

impl RenderBackend for BevyMeshBackend<'_> {
    type Resource = DrawResource;

    fn create(&mut self, label: &str, capacity: usize) -> DrawResource {
        let handle = self.meshes.add(to_bevy_mesh(&MeshGeometry::default()));
        DrawResource {
            handle,
            label: label.to_string(),
            capacity,
        }
    }

    fn replace_buffers(&mut self, resource: &mut DrawResource, geometry: &MeshGeometry) {
        if let Some(mesh) = self.meshes.get_mut(&resource.handle) {
            *mesh = to_bevy_mesh(geometry);
        }
        resource.capacity = geometry.vertex_count();
    }

    fn update_buffers(&mut self, resource: &mut DrawResource, geometry: &MeshGeometry) {
        if let Some(mesh) = self.meshes.get_mut(&resource.handle) {
            mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, geometry.position_arrays());
            mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, geometry.normal_arrays());
            mesh.insert_indices(Indices::U32(geometry.indices.clone()));
        }
    }

    fn capacity(&self, resource: &DrawResource) -> usize {
        resource.capacity
    }

    fn dispose(&mut self, resource: DrawResource) {
        self.meshes.remove(&resource.handle);
    }
}
