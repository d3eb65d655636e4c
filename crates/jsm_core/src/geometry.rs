//! Geometry expansion ("vertex splitting").
//!
//! Scene documents store position, normal and uv as independently indexed
//! streams. A renderable vertex buffer needs one shared index per corner, so
//! every corner gets its own copy of whichever attribute vectors it
//! references, even when geometrically identical corners end up duplicated.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use jsm_math::{Aabb, Vec2, Vec3};

use crate::document::{GeometryRecord, GroupRecord};
use crate::error::{LoadError, LoadResult};

/// One of the three per-corner attribute streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    Normal,
    Uv,
}

impl Attribute {
    /// Number of floats per vector in this stream.
    pub const fn components(self) -> usize {
        match self {
            Attribute::Position | Attribute::Normal => 3,
            Attribute::Uv => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::Position => "position",
            Attribute::Normal => "normal",
            Attribute::Uv => "uv",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous range of corners drawn with one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawGroup {
    /// First corner of the range
    pub start: usize,

    /// Number of corners in the range
    pub count: usize,

    /// Index into the scene's material list, `None` if unassigned
    pub material: Option<usize>,
}

impl DrawGroup {
    /// One past the last corner; saturates instead of overflowing.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.count)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

impl From<&GroupRecord> for DrawGroup {
    fn from(record: &GroupRecord) -> Self {
        Self {
            start: record.start,
            count: record.count,
            material: usize::try_from(record.material_index).ok(),
        }
    }
}

/// Interleaved vertex for GPU upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// View a vertex slice as raw bytes.
    pub fn slice_as_bytes(vertices: &[Vertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

/// A co-indexed, renderer-agnostic vertex buffer.
///
/// All three arrays hold exactly one vector per corner. Instances share an
/// `ExpandedGeometry` through `Arc`; it is never mutated after expansion.
#[derive(Clone, Debug)]
pub struct ExpandedGeometry {
    /// Geometry name (the key in the document)
    pub name: String,

    /// Flat positions, 3 floats per corner
    pub positions: Vec<f32>,

    /// Flat normals, 3 floats per corner
    pub normals: Vec<f32>,

    /// Flat uvs, 2 floats per corner
    pub uvs: Vec<f32>,

    /// Per-material draw ranges, in document order
    pub groups: Vec<DrawGroup>,

    /// Object-space bounding box of the positions
    pub bounds: Aabb,
}

impl ExpandedGeometry {
    /// Expand a geometry record into a flat co-indexed buffer.
    ///
    /// Fails with `MalformedGeometry` if the index arrays differ in length,
    /// `IndexOutOfBounds` if an index points past its stream, and
    /// `GroupOutOfRange` / `OverlappingGroups` for invalid draw groups.
    pub fn expand(name: &str, record: &GeometryRecord) -> LoadResult<Self> {
        let corners = record.position_indices.len();
        if record.normal_indices.len() != corners || record.uv_indices.len() != corners {
            return Err(LoadError::MalformedGeometry {
                geometry: name.to_string(),
                positions: corners,
                normals: record.normal_indices.len(),
                uvs: record.uv_indices.len(),
            });
        }

        let positions = gather(
            name,
            Attribute::Position,
            &record.position,
            &record.position_indices,
        )?;
        let normals = gather(name, Attribute::Normal, &record.normal, &record.normal_indices)?;
        let uvs = gather(name, Attribute::Uv, &record.uv, &record.uv_indices)?;

        let groups: Vec<DrawGroup> = record.groups.iter().map(DrawGroup::from).collect();
        validate_groups(name, &groups, corners)?;

        let bounds = Aabb::from_flat_positions(&positions);

        log::debug!(
            "Expanded geometry {}: {} corners, {} groups",
            name,
            corners,
            groups.len()
        );

        Ok(Self {
            name: name.to_string(),
            positions,
            normals,
            uvs,
            groups,
            bounds,
        })
    }

    /// Number of corners (vertices) in the expanded buffer.
    pub fn corner_count(&self) -> usize {
        self.positions.len() / Attribute::Position.components()
    }

    /// Get the number of triangles in the buffer.
    pub fn triangle_count(&self) -> usize {
        self.corner_count() / 3
    }

    /// Position of corner `i`.
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    /// Normal of corner `i`.
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.normals[i * 3..i * 3 + 3])
    }

    /// UV of corner `i`.
    pub fn uv(&self, i: usize) -> Vec2 {
        Vec2::from_slice(&self.uvs[i * 2..i * 2 + 2])
    }

    /// Interleave the three streams into one vertex per corner.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
            .zip(self.uvs.chunks_exact(2))
            .map(|((p, n), t)| Vertex {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
                uv: [t[0], t[1]],
            })
            .collect()
    }

    /// Corners not covered by any draw group.
    pub fn undrawn_corners(&self) -> usize {
        let drawn: usize = self.groups.iter().map(|g| g.count).sum();
        self.corner_count().saturating_sub(drawn)
    }

    /// Check that every assigned group material exists.
    pub fn validate_material_indices(&self, material_count: usize) -> LoadResult<()> {
        for (group_idx, group) in self.groups.iter().enumerate() {
            if let Some(material_index) = group.material {
                if material_index >= material_count {
                    return Err(LoadError::MaterialIndexOutOfBounds {
                        geometry: self.name.clone(),
                        group: group_idx,
                        material_index,
                        material_count,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Copy `source[indices[i]]` for every corner into a new flat array.
fn gather(
    geometry: &str,
    attribute: Attribute,
    source: &[f32],
    indices: &[i64],
) -> LoadResult<Vec<f32>> {
    let n = attribute.components();
    let len = source.len() / n;
    let mut out = Vec::with_capacity(indices.len() * n);

    for (corner, &index) in indices.iter().enumerate() {
        let vector = usize::try_from(index)
            .ok()
            .filter(|&v| v < len)
            .ok_or_else(|| LoadError::IndexOutOfBounds {
                geometry: geometry.to_string(),
                attribute,
                corner,
                index,
                len,
            })?;
        out.extend_from_slice(&source[vector * n..vector * n + n]);
    }

    Ok(out)
}

fn validate_groups(geometry: &str, groups: &[DrawGroup], corner_count: usize) -> LoadResult<()> {
    for (group_idx, group) in groups.iter().enumerate() {
        let in_range = group
            .start
            .checked_add(group.count)
            .is_some_and(|end| end <= corner_count);
        if !in_range {
            return Err(LoadError::GroupOutOfRange {
                geometry: geometry.to_string(),
                group: group_idx,
                start: group.start,
                end: group.end(),
                corner_count,
            });
        }
    }

    // Empty ranges can't overlap anything
    let mut ordered: Vec<(usize, &DrawGroup)> = groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.count > 0)
        .collect();
    ordered.sort_by_key(|(idx, g)| (g.start, *idx));

    for pair in ordered.windows(2) {
        let (first, a) = pair[0];
        let (second, b) = pair[1];
        if b.start < a.end() {
            return Err(LoadError::OverlappingGroups {
                geometry: geometry.to_string(),
                first: first.min(second),
                second: first.max(second),
            });
        }
    }

    Ok(())
}

/// Expand every geometry of a document, keyed by name.
///
/// Geometries are expanded in name order so the first reported error is
/// deterministic.
pub fn expand_geometries(
    records: &BTreeMap<String, GeometryRecord>,
) -> LoadResult<BTreeMap<String, Arc<ExpandedGeometry>>> {
    let mut geometries = BTreeMap::new();
    for (name, record) in records {
        let geometry = ExpandedGeometry::expand(name, record)?;
        let undrawn = geometry.undrawn_corners();
        if undrawn > 0 {
            log::warn!("Geometry {} leaves {} corners outside any draw group", name, undrawn);
        }
        geometries.insert(name.clone(), Arc::new(geometry));
    }
    Ok(geometries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_record() -> GeometryRecord {
        GeometryRecord {
            position: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normal: vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
            uv: vec![0.0, 0.0, 1.0, 1.0],
            position_indices: vec![0, 1, 2],
            normal_indices: vec![0, 0, 0],
            uv_indices: vec![0, 1, 0],
            groups: vec![GroupRecord {
                start: 0,
                count: 3,
                material_index: 0,
            }],
        }
    }

    /// Two triangles sharing an edge, with diverging normal/uv indices.
    fn quad_record() -> GeometryRecord {
        GeometryRecord {
            position: vec![
                0.0, 0.0, 0.0, // v0
                1.0, 0.0, 0.0, // v1
                1.0, 1.0, 0.0, // v2
                0.0, 1.0, 0.0, // v3
            ],
            normal: vec![0.0, 0.0, 1.0, 0.0, 0.0, -1.0],
            uv: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            position_indices: vec![0, 1, 2, 0, 2, 3],
            normal_indices: vec![0, 0, 0, 1, 1, 1],
            uv_indices: vec![0, 1, 2, 0, 2, 3],
            groups: vec![
                GroupRecord {
                    start: 0,
                    count: 3,
                    material_index: 0,
                },
                GroupRecord {
                    start: 3,
                    count: 3,
                    material_index: 1,
                },
            ],
        }
    }

    #[test]
    fn test_expand_triangle() {
        let geometry = ExpandedGeometry::expand("g", &triangle_record()).unwrap();

        assert_eq!(geometry.name, "g");
        assert_eq!(geometry.corner_count(), 3);
        assert_eq!(geometry.triangle_count(), 1);
        assert_eq!(geometry.positions.len(), 9);
        assert_eq!(geometry.normals.len(), 9);
        assert_eq!(geometry.uvs.len(), 6);

        // All corners share normal 0
        for i in 0..3 {
            assert_eq!(geometry.normal(i), Vec3::Z);
        }
        assert_eq!(geometry.uv(0), Vec2::ZERO);
        assert_eq!(geometry.uv(1), Vec2::ONE);
        assert_eq!(geometry.uv(2), Vec2::ZERO);
        assert_eq!(
            geometry.groups,
            vec![DrawGroup {
                start: 0,
                count: 3,
                material: Some(0)
            }]
        );
    }

    #[test]
    fn test_expanded_lookup_matches_source() {
        let record = quad_record();
        let geometry = ExpandedGeometry::expand("quad", &record).unwrap();

        assert_eq!(geometry.corner_count(), record.position_indices.len());
        for i in 0..geometry.corner_count() {
            let p = record.position_indices[i] as usize;
            let n = record.normal_indices[i] as usize;
            let t = record.uv_indices[i] as usize;
            assert_eq!(geometry.positions[i * 3..i * 3 + 3], record.position[p * 3..p * 3 + 3]);
            assert_eq!(geometry.normals[i * 3..i * 3 + 3], record.normal[n * 3..n * 3 + 3]);
            assert_eq!(geometry.uvs[i * 2..i * 2 + 2], record.uv[t * 2..t * 2 + 2]);
        }

        // v0 is shared by both triangles but split by its normal
        assert_eq!(geometry.position(0), geometry.position(3));
        assert_ne!(geometry.normal(0), geometry.normal(3));
    }

    #[test]
    fn test_mismatched_index_lengths() {
        let mut record = triangle_record();
        record.uv_indices.pop();

        match ExpandedGeometry::expand("g", &record) {
            Err(LoadError::MalformedGeometry {
                geometry,
                positions,
                normals,
                uvs,
            }) => {
                assert_eq!(geometry, "g");
                assert_eq!((positions, normals, uvs), (3, 3, 2));
            }
            other => panic!("expected MalformedGeometry, got {:?}", other),
        }
    }

    #[test]
    fn test_index_out_of_bounds() {
        let mut record = triangle_record();
        record.normal_indices[2] = 3;

        match ExpandedGeometry::expand("g", &record) {
            Err(LoadError::IndexOutOfBounds {
                geometry,
                attribute,
                corner,
                index,
                len,
            }) => {
                assert_eq!(geometry, "g");
                assert_eq!(attribute, Attribute::Normal);
                assert_eq!(corner, 2);
                assert_eq!(index, 3);
                assert_eq!(len, 3);
            }
            other => panic!("expected IndexOutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_index_is_out_of_bounds() {
        let mut record = triangle_record();
        record.uv_indices[0] = -1;

        let result = ExpandedGeometry::expand("g", &record);
        assert!(matches!(
            result,
            Err(LoadError::IndexOutOfBounds {
                attribute: Attribute::Uv,
                index: -1,
                ..
            })
        ));
    }

    #[test]
    fn test_partial_trailing_vector_is_not_addressable() {
        let mut record = triangle_record();
        // 2 whole uv vectors plus a dangling component
        record.uv.push(0.5);
        record.uv_indices[1] = 2;

        assert!(matches!(
            ExpandedGeometry::expand("g", &record),
            Err(LoadError::IndexOutOfBounds { index: 2, len: 2, .. })
        ));
    }

    #[test]
    fn test_group_out_of_range() {
        let mut record = triangle_record();
        record.groups[0].count = 6;

        assert!(matches!(
            ExpandedGeometry::expand("g", &record),
            Err(LoadError::GroupOutOfRange {
                group: 0,
                start: 0,
                end: 6,
                corner_count: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_group_end_overflow() {
        let mut record = triangle_record();
        record.groups[0].start = usize::MAX;
        record.groups[0].count = 1;

        assert!(matches!(
            ExpandedGeometry::expand("g", &record),
            Err(LoadError::GroupOutOfRange {
                group: 0,
                start: usize::MAX,
                end: usize::MAX,
                corner_count: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_overlapping_groups() {
        let mut record = quad_record();
        record.groups[1].start = 2;
        record.groups[1].count = 4;

        assert!(matches!(
            ExpandedGeometry::expand("quad", &record),
            Err(LoadError::OverlappingGroups {
                first: 0,
                second: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_partial_group_coverage_is_allowed() {
        let mut record = quad_record();
        record.groups.truncate(1);

        let geometry = ExpandedGeometry::expand("quad", &record).unwrap();
        assert_eq!(geometry.undrawn_corners(), 3);
        for group in &geometry.groups {
            assert!(group.end() <= geometry.corner_count());
        }
    }

    #[test]
    fn test_unassigned_material() {
        let mut record = triangle_record();
        record.groups[0].material_index = -1;

        let geometry = ExpandedGeometry::expand("g", &record).unwrap();
        assert_eq!(geometry.groups[0].material, None);
        assert!(geometry.validate_material_indices(0).is_ok());
    }

    #[test]
    fn test_material_index_out_of_bounds() {
        let geometry = ExpandedGeometry::expand("quad", &quad_record()).unwrap();

        assert!(geometry.validate_material_indices(2).is_ok());
        assert!(matches!(
            geometry.validate_material_indices(1),
            Err(LoadError::MaterialIndexOutOfBounds {
                group: 1,
                material_index: 1,
                material_count: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_geometry() {
        let geometry = ExpandedGeometry::expand("empty", &GeometryRecord::default()).unwrap();
        assert_eq!(geometry.corner_count(), 0);
        assert!(geometry.bounds.is_empty());
        assert!(geometry.vertices().is_empty());
    }

    #[test]
    fn test_bounds_computation() {
        let geometry = ExpandedGeometry::expand("quad", &quad_record()).unwrap();
        assert_eq!(geometry.bounds.min, Vec3::ZERO);
        assert_eq!(geometry.bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_interleaved_vertices() {
        let geometry = ExpandedGeometry::expand("quad", &quad_record()).unwrap();
        let vertices = geometry.vertices();

        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(vertices[4].normal, [0.0, 0.0, -1.0]);
        assert_eq!(vertices[5].uv, [0.0, 1.0]);

        let bytes = Vertex::slice_as_bytes(&vertices);
        assert_eq!(bytes.len(), 6 * std::mem::size_of::<Vertex>());
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_expand_geometries_first_error_by_name() {
        let mut records = BTreeMap::new();
        let mut bad_a = triangle_record();
        bad_a.normal_indices.clear();
        let mut bad_b = triangle_record();
        bad_b.position_indices[0] = 99;
        records.insert("b".to_string(), bad_b);
        records.insert("a".to_string(), bad_a);

        match expand_geometries(&records) {
            Err(LoadError::MalformedGeometry { geometry, .. }) => assert_eq!(geometry, "a"),
            other => panic!("expected MalformedGeometry for a, got {:?}", other),
        }
    }
}
