//! Scene document model.
//!
//! A scene document is a JSON object with three required keys:
//!
//! - `geometries`: geometry name -> separately indexed attribute streams
//! - `materials`: ordered material records (the index is the material id)
//! - `instances`: ordered placements of geometries
//!
//! plus an optional `metadata` block written by the exporter. Attribute
//! streams are flat float arrays (`position[i * 3 + j]`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest document major version this loader understands.
pub const SUPPORTED_MAJOR_VERSION: u32 = 0;

/// Errors that can occur while parsing document bytes.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid scene document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported document version {found} (supported major version {supported})")]
    UnsupportedVersion { found: f64, supported: u32 },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// A deserialized scene document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Exporter metadata (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,

    /// Geometry records keyed by name
    pub geometries: BTreeMap<String, GeometryRecord>,

    /// Material records; the index is the canonical material id
    pub materials: Vec<MaterialRecord>,

    /// Instance records in document order
    pub instances: Vec<InstanceRecord>,
}

/// Exporter information stamped into the document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub exporter: Option<String>,

    #[serde(default)]
    pub version: Option<f64>,
}

/// Separately indexed position/normal/uv streams of one geometry.
///
/// Any stream may be omitted by the exporter and is then empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeometryRecord {
    pub position: Vec<f32>,
    pub normal: Vec<f32>,
    pub uv: Vec<f32>,
    pub position_indices: Vec<i64>,
    pub normal_indices: Vec<i64>,
    pub uv_indices: Vec<i64>,
    pub groups: Vec<GroupRecord>,
}

/// A per-material draw range in expanded-corner coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub start: usize,
    pub count: usize,
    /// Negative when the exporter found no material for the faces
    pub material_index: i64,
}

/// A material as written by the exporter.
///
/// Only the diffuse map (and its sampler settings) and the debug name affect
/// resolution; the remaining exporter keys are ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaterialRecord {
    #[serde(rename = "DbgName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_diffuse: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_diffuse_repeat: Option<[f32; 2]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_diffuse_wrap: Option<[String; 2]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_diffuse_anisotropy: Option<u32>,
}

/// A placement of a named geometry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Geometry name this instance refers to
    pub id: String,

    /// Display label
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_position")]
    pub position: [f32; 3],

    #[serde(default = "default_scale")]
    pub scale: [f32; 3],

    /// Rotation as x, y, z, w
    #[serde(default = "default_quaternion")]
    pub quaternion: [f32; 4],
}

fn default_position() -> [f32; 3] {
    [0.0; 3]
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

fn default_quaternion() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl SceneDocument {
    /// Reject documents stamped with a newer major version.
    ///
    /// Documents without metadata are accepted.
    pub fn check_version(&self) -> ParseResult<()> {
        let Some(found) = self.metadata.as_ref().and_then(|m| m.version) else {
            return Ok(());
        };

        if found.trunc() > f64::from(SUPPORTED_MAJOR_VERSION) {
            return Err(ParseError::UnsupportedVersion {
                found,
                supported: SUPPORTED_MAJOR_VERSION,
            });
        }

        Ok(())
    }
}

/// Parse document bytes as JSON and check the format version.
pub fn parse_document(bytes: &[u8]) -> ParseResult<SceneDocument> {
    let document: SceneDocument = serde_json::from_slice(bytes)?;
    document.check_version()?;
    Ok(document)
}
