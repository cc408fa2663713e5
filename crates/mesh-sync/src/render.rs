//! Interface to the rendering backend's draw resources.

use crate::types::MeshGeometry;

/// Draw-resource operations the synchronization code drives.
///
/// A resource is created with a vertex capacity. `update_buffers` may only be
/// called when the geometry fits that capacity; callers recreate the resource
/// otherwise.
pub trait RenderBackend {
    /// Backend-side draw resource.
    type Resource;

    /// Create an empty draw resource able to hold `capacity` vertices.
    fn create(&mut self, label: &str, capacity: usize) -> Self::Resource;

    /// Replace index, position and normal buffers wholesale.
    fn replace_buffers(&mut self, resource: &mut Self::Resource, geometry: &MeshGeometry);

    /// Overwrite buffers in place. `geometry` fits `capacity(resource)`.
    fn update_buffers(&mut self, resource: &mut Self::Resource, geometry: &MeshGeometry);

    /// Vertex capacity of `resource`.
    fn capacity(&self, resource: &Self::Resource) -> usize;

    /// Release `resource`.
    fn dispose(&mut self, resource: Self::Resource);
}
