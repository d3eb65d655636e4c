//! JSM Core - loader for JSON scene documents.
//!
//! This crate turns a scene document (`*.jsm`) into renderer-agnostic data:
//!
//! - **Geometry**: separately indexed position/normal/uv streams expanded
//!   into flat co-indexed buffers with per-material draw groups
//! - **Materials**: flat-color or diffuse-textured parameter sets
//! - **Scene graph**: a `SceneContainer` of `MeshNode`s, each sharing its
//!   geometry buffer and carrying its own transform
//!
//! # Example
//!
//! ```ignore
//! use jsm_core::{load, FileFetcher};
//!
//! let (city, task) = load(FileFetcher::new(), "demo/House.jsm", |result| {
//!     if let Err(err) = result {
//!         eprintln!("{}", err);
//!     }
//! });
//! pollster::block_on(task);
//! println!("Loaded {} meshes", city.child_count());
//! ```

pub mod document;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod loader;
pub mod material;
pub mod scene;

// Re-export commonly used types
pub use document::{parse_document, ParseError, SceneDocument};
pub use error::{LoadError, LoadResult};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{FetchError, Fetcher, FileFetcher, MemoryFetcher};
pub use geometry::{Attribute, DrawGroup, ExpandedGeometry, Vertex};
pub use loader::{build_scene, load, load_scene, load_scene_from_bytes, LoadTask};
pub use material::{MaterialKind, ResolvedMaterial, TextureRef, WrapMode, DEFAULT_COLOR};
pub use scene::{MeshNode, SceneContainer, Transform};
