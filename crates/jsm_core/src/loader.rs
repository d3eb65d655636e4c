//! High-level scene loading.
//!
//! This module provides the entry points that run the whole pipeline:
//! fetch -> parse -> expand geometries + resolve materials -> assemble
//! instances -> populate the scene container.
//!
//! Only the fetch suspends. Everything after it runs synchronously, and a
//! load either populates its container completely or reports exactly one
//! error and leaves the container empty.

use std::path::Path;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::document::{parse_document, SceneDocument};
use crate::error::LoadResult;
use crate::fetch::Fetcher;
use crate::geometry::expand_geometries;
use crate::material::resolve_materials;
use crate::scene::{assemble_instances, MeshNode, SceneContainer};

/// The asynchronous half of [`load`]. Drive it to completion to run the load.
pub type LoadTask = LocalBoxFuture<'static, ()>;

/// Scene name for a document identifier: its file stem, or `"unnamed"`.
pub fn scene_name(source: &str) -> &str {
    Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
}

/// Build the mesh nodes of a parsed document.
pub fn build_nodes(document: &SceneDocument) -> LoadResult<Vec<MeshNode>> {
    let geometries = expand_geometries(&document.geometries)?;
    let materials = resolve_materials(&document.materials);

    for geometry in geometries.values() {
        geometry.validate_material_indices(materials.len())?;
    }

    let nodes = assemble_instances(&document.instances, &geometries, &materials)?;

    log::info!("Geometries {}", geometries.len());
    log::info!("Meshes {}", nodes.len());

    Ok(nodes)
}

/// Build a populated scene container from a parsed document.
pub fn build_scene(name: &str, document: &SceneDocument) -> LoadResult<SceneContainer> {
    let nodes = build_nodes(document)?;
    let container = SceneContainer::new(name);
    container.populate(nodes);
    Ok(container)
}

/// Parse document bytes and build a populated scene container.
pub fn load_scene_from_bytes(name: &str, bytes: &[u8]) -> LoadResult<SceneContainer> {
    let document = parse_document(bytes)?;
    build_scene(name, &document)
}

async fn fetch_nodes<F: Fetcher + ?Sized>(fetcher: &F, source: &str) -> LoadResult<Vec<MeshNode>> {
    let bytes = fetcher.fetch(source).await?;
    let document = parse_document(&bytes)?;
    build_nodes(&document)
}

/// Load a scene document, returning the container only once it is complete.
///
/// # Example
///
/// ```ignore
/// use jsm_core::{load_scene, FileFetcher};
///
/// let scene = pollster::block_on(load_scene(&FileFetcher::new(), "demo/House.jsm"))?;
/// println!("Loaded {} meshes", scene.child_count());
/// ```
pub async fn load_scene<F: Fetcher + ?Sized>(
    fetcher: &F,
    source: &str,
) -> LoadResult<SceneContainer> {
    let nodes = fetch_nodes(fetcher, source).await?;
    let container = SceneContainer::new(scene_name(source));
    container.populate(nodes);
    Ok(container)
}

/// Start loading a scene document.
///
/// Returns the (still empty) container immediately, together with the task
/// that performs the load. When the task is driven to completion the
/// container is populated on success and `on_complete` is called exactly
/// once with either the same container or the error. Dropping the task
/// before it completes abandons the load and `on_complete` is never called.
///
/// # Example
///
/// ```ignore
/// use jsm_core::{load, FileFetcher};
///
/// let (city, task) = load(FileFetcher::new(), "demo/House.jsm", |result| {
///     if let Err(err) = result {
///         eprintln!("{}", err);
///     }
/// });
/// pollster::block_on(task);
/// ```
pub fn load<F, C>(
    fetcher: F,
    source: impl Into<String>,
    on_complete: C,
) -> (SceneContainer, LoadTask)
where
    F: Fetcher + 'static,
    C: FnOnce(LoadResult<SceneContainer>) + 'static,
{
    let source = source.into();
    let container = SceneContainer::new(scene_name(&source));
    let handle = container.clone();

    let task = async move {
        let result = match fetch_nodes(&fetcher, &source).await {
            Ok(nodes) => {
                handle.populate(nodes);
                Ok(handle)
            }
            Err(err) => {
                log::error!("Failed to load {}: {}", source, err);
                Err(err)
            }
        };
        on_complete(result);
    }
    .boxed_local();

    (container, task)
}
