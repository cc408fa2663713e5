//! Core data types shared by the controller, the shard registry and the
//! engine/render interfaces.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identifier of a controller inside a [`crate::Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeshId(pub u32);

/// Stable identifier of an engine shard.
///
/// The engine keeps a shard's ID for as long as the shard exists, even when
/// its position in the shard enumeration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShardId(pub u32);

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl Aabb {
    /// Create a new AABB from min/max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB that contains nothing (for accumulation).
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Whether no point has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Expand this AABB to include another one.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Component-wise scale of both corners.
    pub fn scaled(&self, scale: Vec3) -> Aabb {
        Aabb {
            min: self.min * scale,
            max: self.max * scale,
        }
    }

    /// Get the center of this AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Flat geometry pulled from the engine for the whole mesh or one shard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions as plain arrays, the layout GPU buffers expect.
    pub fn position_arrays(&self) -> Vec<[f32; 3]> {
        self.positions.iter().map(|p| p.to_array()).collect()
    }

    /// Normals as plain arrays, the layout GPU buffers expect.
    pub fn normal_arrays(&self) -> Vec<[f32; 3]> {
        self.normals.iter().map(|n| n.to_array()).collect()
    }
}

/// Sculpting brush variants offered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BrushKind {
    /// Raise the surface along its normal
    #[default]
    Draw = 0,
    /// Push vertices outward along their own normals
    Inflate = 1,
    /// Pull vertices toward the average plane
    Flatten = 2,
    /// Move the surface along the stroke direction
    Drag = 3,
    /// Carve into the surface
    Dig = 4,
    /// Rigid drag preserving hard edges
    CadDrag = 5,
}

/// Boolean (CSG) operation between two closed meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Subtract,
    Merge,
    Intersect,
}

/// Parametric primitive the engine can generate.
///
/// Non-positive dimensions are replaced by `1.0` before reaching the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Box { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32 },
}

impl Primitive {
    /// Copy of this primitive with every non-positive dimension set to `1.0`.
    pub fn sanitized(self) -> Self {
        fn positive(v: f32) -> f32 {
            if v > 0.0 { v } else { 1.0 }
        }
        match self {
            Primitive::Box {
                width,
                height,
                depth,
            } => Primitive::Box {
                width: positive(width),
                height: positive(height),
                depth: positive(depth),
            },
            Primitive::Sphere { radius } => Primitive::Sphere {
                radius: positive(radius),
            },
        }
    }
}

/// World-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

/// Closest intersection between a ray and a mesh, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Option<Vec3>,
}

impl RayHit {
    /// Distance from the ray origin to the hit point.
    pub fn distance_from(&self, origin: Vec3) -> f32 {
        self.point.distance(origin)
    }
}

/// One brush sample along a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSample {
    /// World-space ray cast from the tool
    pub ray: Ray,
    /// Maximum ray length considered for surface hits
    pub max_distance: f32,
    /// Brush radius in world units
    pub radius: f32,
    /// Strength ratio, 0.0 - 1.0
    pub strength: f32,
}
