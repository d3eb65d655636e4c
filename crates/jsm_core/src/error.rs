//! Errors that can occur while loading a scene document.
//!
//! Every variant is terminal for a load: nothing is retried and the first
//! error aborts the remaining pipeline stages.

use thiserror::Error;

use crate::document::ParseError;
use crate::fetch::FetchError;
use crate::geometry::Attribute;

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(
        "Malformed geometry {geometry}: index arrays differ in length \
         (position {positions}, normal {normals}, uv {uvs})"
    )]
    MalformedGeometry {
        geometry: String,
        positions: usize,
        normals: usize,
        uvs: usize,
    },

    #[error(
        "Index out of bounds in geometry {geometry}: {attribute} index {index} \
         at corner {corner}, stream holds {len} vectors"
    )]
    IndexOutOfBounds {
        geometry: String,
        attribute: Attribute,
        corner: usize,
        index: i64,
        len: usize,
    },

    #[error("Could not find geometry {geometry} from mesh {instance}")]
    MissingGeometryReference { instance: String, geometry: String },

    #[error(
        "Material index {material_index} in group {group} of geometry {geometry} \
         exceeds material count {material_count}"
    )]
    MaterialIndexOutOfBounds {
        geometry: String,
        group: usize,
        material_index: usize,
        material_count: usize,
    },

    #[error(
        "Draw group {group} of geometry {geometry} covers corners {start}..{end} \
         but only {corner_count} exist"
    )]
    GroupOutOfRange {
        geometry: String,
        group: usize,
        start: usize,
        end: usize,
        corner_count: usize,
    },

    #[error("Draw groups {first} and {second} of geometry {geometry} overlap")]
    OverlappingGroups {
        geometry: String,
        first: usize,
        second: usize,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;
