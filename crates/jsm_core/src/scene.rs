//! Scene graph types for JSM.
//!
//! A loaded scene is a [`SceneContainer`] holding [`MeshNode`] children.
//! Nodes share their geometry buffers and material list through `Arc`, and
//! each carries its own transform.

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use jsm_math::{Aabb, Mat4, Mat4Ext, Quat, Vec3};

use crate::document::InstanceRecord;
use crate::error::{LoadError, LoadResult};
use crate::geometry::{DrawGroup, ExpandedGeometry};
use crate::material::ResolvedMaterial;

/// Transform components that can be composed into a matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation (as quaternion, taken as-is from the document)
    pub rotation: Quat,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a transform from document arrays.
    ///
    /// The quaternion is x, y, z, w and is neither normalized nor validated.
    pub fn from_arrays(translation: [f32; 3], scale: [f32; 3], rotation: [f32; 4]) -> Self {
        Self {
            translation: Vec3::from_array(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from_array(scale),
        }
    }

    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Returns true if this transform leaves points unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// One placed instance: shared geometry + shared materials + own transform.
#[derive(Clone, Debug)]
pub struct MeshNode {
    /// Instance display name
    pub name: String,

    /// Shared expanded geometry
    pub geometry: Arc<ExpandedGeometry>,

    /// Full resolved material list; draw groups pick from it by index
    pub materials: Arc<[ResolvedMaterial]>,

    /// Local transform
    pub transform: Transform,
}

impl MeshNode {
    /// Get the 4x4 model matrix for this node.
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Material a draw group is drawn with, `None` if unassigned.
    pub fn group_material(&self, group: &DrawGroup) -> Option<&ResolvedMaterial> {
        group.material.and_then(|idx| self.materials.get(idx))
    }

    /// Corner ranges with their materials, one per draw call.
    pub fn draw_ranges(
        &self,
    ) -> impl Iterator<Item = (Range<usize>, Option<&ResolvedMaterial>)> + '_ {
        self.geometry
            .groups
            .iter()
            .map(move |group| (group.range(), self.group_material(group)))
    }
}

/// Build a mesh node for every instance, in document order.
///
/// A reference to an unknown geometry aborts the whole assembly; no nodes
/// are returned in that case.
pub fn assemble_instances(
    instances: &[InstanceRecord],
    geometries: &BTreeMap<String, Arc<ExpandedGeometry>>,
    materials: &Arc<[ResolvedMaterial]>,
) -> LoadResult<Vec<MeshNode>> {
    instances
        .iter()
        .map(|instance| {
            let geometry = geometries.get(&instance.id).ok_or_else(|| {
                LoadError::MissingGeometryReference {
                    instance: instance.name.clone(),
                    geometry: instance.id.clone(),
                }
            })?;

            Ok(MeshNode {
                name: instance.name.clone(),
                geometry: Arc::clone(geometry),
                materials: Arc::clone(materials),
                transform: Transform::from_arrays(
                    instance.position,
                    instance.scale,
                    instance.quaternion,
                ),
            })
        })
        .collect()
}

#[derive(Debug)]
struct ContainerInner {
    name: String,
    children: OnceLock<Vec<MeshNode>>,
    transform: RwLock<Transform>,
}

/// Root node of a loaded scene.
///
/// Handed out empty as soon as a load starts and filled exactly once when
/// it succeeds. Cloning yields another handle to the same container. The
/// children are fixed once populated; the container's own transform stays
/// writable so callers can place the whole scene.
#[derive(Clone, Debug)]
pub struct SceneContainer {
    inner: Arc<ContainerInner>,
}

impl SceneContainer {
    /// Create an empty, unpopulated container.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                name: name.into(),
                children: OnceLock::new(),
                transform: RwLock::new(Transform::default()),
            }),
        }
    }

    /// Scene name (usually the document's file stem).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Attach the children. Returns false if the container was already populated.
    pub(crate) fn populate(&self, children: Vec<MeshNode>) -> bool {
        let populated = self.inner.children.set(children).is_ok();
        if !populated {
            log::warn!("Scene container {} is already populated", self.inner.name);
        }
        populated
    }

    pub fn is_populated(&self) -> bool {
        self.inner.children.get().is_some()
    }

    /// Mesh nodes in document order; empty until populated.
    pub fn children(&self) -> &[MeshNode] {
        self.inner.children.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// First child with the given instance name.
    pub fn find_child(&self, name: &str) -> Option<&MeshNode> {
        self.children().iter().find(|node| node.name == name)
    }

    /// The container's own transform.
    pub fn transform(&self) -> Transform {
        *self.inner.transform.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the container's own transform.
    pub fn set_transform(&self, transform: Transform) {
        *self.inner.transform.write().unwrap_or_else(PoisonError::into_inner) = transform;
    }

    /// Returns true if both handles refer to the same container.
    pub fn ptr_eq(&self, other: &SceneContainer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of distinct geometry buffers referenced by the children.
    pub fn geometry_count(&self) -> usize {
        self.children()
            .iter()
            .map(|node| Arc::as_ptr(&node.geometry))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Get total triangle count across all children.
    pub fn total_triangle_count(&self) -> usize {
        self.children()
            .iter()
            .map(|node| node.geometry.triangle_count())
            .sum()
    }

    /// Compute the world-space bounding box of all children, including the
    /// container's own transform.
    pub fn world_bounds(&self) -> Aabb {
        let root = self.transform().to_matrix();

        self.children().iter().fold(Aabb::empty(), |bounds, node| {
            let matrix = root * node.model_matrix();
            Aabb::surrounding(&bounds, &matrix.transform_aabb(&node.geometry.bounds))
        })
    }
}
