//! Frame-transform coordination for boolean (CSG) operations.
//!
//! The engine performs booleans in the target's local frame, so the source
//! must be expressed relative to the target: `inverse(Mt) * Ms`, split into
//! its linear block and its translation.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use tracing::{debug, warn};

use crate::engine::{GeometryEngine, MeshHandle};
use crate::types::BooleanOp;

/// Placement of the source mesh in the target's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeTransform {
    /// Rotation and scale of the source relative to the target
    pub rotation_scale: Mat3,
    /// Translation of the source relative to the target
    pub translation: Vec3,
}

impl RelativeTransform {
    pub const IDENTITY: RelativeTransform = RelativeTransform {
        rotation_scale: Mat3::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Relative placement of `source_world` seen from `target_world`.
    pub fn between(target_world: &Mat4, source_world: &Mat4) -> Self {
        Self::from_matrix(&(target_world.inverse() * *source_world))
    }

    /// Split an affine matrix into its 3x3 block and translation.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        Self {
            rotation_scale: Mat3::from_mat4(*matrix),
            translation: matrix.w_axis.truncate(),
        }
    }

    /// Recombine into an affine matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_cols(
            self.rotation_scale.x_axis.extend(0.0),
            self.rotation_scale.y_axis.extend(0.0),
            self.rotation_scale.z_axis.extend(0.0),
            self.translation.extend(1.0),
        )
    }

    /// Raw float layout for engines with a C-style interface.
    pub fn to_raw(&self) -> RawRelativeTransform {
        RawRelativeTransform {
            rotation_scale: self.rotation_scale.transpose().to_cols_array(),
            translation: self.translation.to_array(),
        }
    }

    /// Whether this is the identity placement within `epsilon`.
    pub fn is_identity(&self, epsilon: f32) -> bool {
        self.rotation_scale.abs_diff_eq(Mat3::IDENTITY, epsilon)
            && self.translation.abs_diff_eq(Vec3::ZERO, epsilon)
    }
}

/// [`RelativeTransform`] as flat floats: the 3x3 block row-major
/// (`m00, m01, m02, m10, ...`) followed by the translation.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RawRelativeTransform {
    pub rotation_scale: [f32; 9],
    pub translation: [f32; 3],
}

impl RawRelativeTransform {
    /// View as a flat float slice of 12 elements.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(std::slice::from_ref(self))
    }
}

/// Run `op` on `target` with `source`, each placed by its world transform.
///
/// Returns the engine's success flag. A failure is logged and nothing is
/// rolled back; the caller resynchronizes the target either way.
pub fn apply_boolean<E: GeometryEngine>(
    op: BooleanOp,
    target: &MeshHandle<E>,
    target_world: &Mat4,
    source: &MeshHandle<E>,
    source_world: &Mat4,
) -> bool {
    let relative = RelativeTransform::between(target_world, source_world);
    debug!(
        "{:?}: {:?} <- {:?}, relative translation {:?}",
        op,
        target.raw(),
        source.raw(),
        relative.translation
    );
    let succeeded = target
        .engine()
        .boolean(op, target.raw(), source.raw(), &relative);
    if !succeeded {
        warn!("{:?} of {:?} by {:?} failed in the engine", op, target.raw(), source.raw());
    }
    succeeded
}
