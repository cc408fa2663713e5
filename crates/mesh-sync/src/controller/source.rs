//! Build sources for an editable mesh.

use std::path::Path;
use std::rc::Rc;

use glam::Vec3;
use thiserror::Error;

use crate::engine::{GeometryEngine, MeshHandle};
use crate::types::Primitive;

/// Where a mesh is built from.
#[derive(Debug)]
pub enum MeshSource<'a, E: GeometryEngine> {
    /// Encoded mesh file contents; `name` carries the format hint
    Bytes { data: &'a [u8], name: &'a str },
    /// Mesh file on disk, read by the engine
    File(&'a Path),
    /// Deep copy of another mesh, including nothing of its history
    Clone(&'a MeshHandle<E>),
    /// Triangle list and vertex positions
    RawArrays {
        triangles: &'a [u32],
        vertices: &'a [Vec3],
    },
    /// Engine-generated primitive
    Primitive(Primitive),
}

impl<E: GeometryEngine> MeshSource<'_, E> {
    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            MeshSource::Bytes { data, name } => format!("bytes '{}' ({} bytes)", name, data.len()),
            MeshSource::File(path) => format!("file '{}'", path.display()),
            MeshSource::Clone(handle) => format!("clone of {:?}", handle.raw()),
            MeshSource::RawArrays {
                triangles,
                vertices,
            } => format!(
                "raw arrays ({} indices, {} vertices)",
                triangles.len(),
                vertices.len()
            ),
            MeshSource::Primitive(primitive) => format!("primitive {:?}", primitive),
        }
    }
}

/// Reasons a build produced no mesh. Logged, never returned by `build`.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid source {origin}: {reason}")]
    InvalidSource { origin: String, reason: String },
}

impl BuildError {
    fn invalid(origin: String, reason: impl Into<String>) -> Self {
        BuildError::InvalidSource {
            origin,
            reason: reason.into(),
        }
    }
}

/// Check a raw triangle list before handing it to the engine.
fn validate_arrays(triangles: &[u32], vertices: &[Vec3]) -> Result<(), String> {
    if vertices.is_empty() || triangles.is_empty() {
        return Err("empty geometry".to_string());
    }
    if triangles.len() % 3 != 0 {
        return Err(format!("index count {} is not a multiple of 3", triangles.len()));
    }
    if let Some(&bad) = triangles.iter().find(|&&i| i as usize >= vertices.len()) {
        return Err(format!("index {} out of range for {} vertices", bad, vertices.len()));
    }
    if vertices.iter().any(|v| !v.is_finite()) {
        return Err("non-finite vertex position".to_string());
    }
    Ok(())
}

/// Ask the engine for a mesh built from `source` and take ownership of it.
pub(crate) fn acquire<E: GeometryEngine>(
    engine: &Rc<E>,
    source: &MeshSource<'_, E>,
) -> Result<MeshHandle<E>, BuildError> {
    let raw = match source {
        MeshSource::Bytes { data, name } => {
            if data.is_empty() {
                return Err(BuildError::invalid(source.describe(), "empty buffer"));
            }
            engine.load_from_bytes(data, name)
        }
        MeshSource::File(path) => {
            if path.as_os_str().is_empty() {
                return Err(BuildError::invalid(source.describe(), "empty path"));
            }
            engine.load_from_file(path)
        }
        MeshSource::Clone(handle) => engine.clone_mesh(handle.raw()),
        MeshSource::RawArrays {
            triangles,
            vertices,
        } => {
            validate_arrays(triangles, vertices)
                .map_err(|reason| BuildError::invalid(source.describe(), reason))?;
            engine.create_from_arrays(triangles, vertices)
        }
        MeshSource::Primitive(primitive) => engine.generate_primitive(primitive.sanitized()),
    };

    raw.map(|raw| MeshHandle::adopt(Rc::clone(engine), raw))
        .ok_or_else(|| BuildError::invalid(source.describe(), "engine returned no mesh"))
}
