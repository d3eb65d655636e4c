//! Load a scene document and print what the loader produced.
//!
//! Run with: cargo run -p jsm_inspect -- crates/jsm_core/tests/fixtures/house.jsm
//!
//! URLs are accepted when built with `--features http`.

use std::cell::RefCell;
use std::env;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use jsm_core::{load, Fetcher, FileFetcher, LoadResult, LoadTask, MaterialKind, SceneContainer};

/// Slot the completion callback writes the load result into.
type Outcome = Rc<RefCell<Option<LoadResult<SceneContainer>>>>;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: jsm_inspect <path-or-url-to-scene-document>");
        println!("\nExamples:");
        println!("  cargo run -p jsm_inspect -- crates/jsm_core/tests/fixtures/house.jsm");
        println!("  cargo run -p jsm_inspect --features http -- https://example.com/House.jsm");
        return Ok(());
    }

    let source = args[1].as_str();
    println!("Loading scene document: {}", source);

    let scene = run_load(source).with_context(|| format!("Error loading {}", source))?;
    print_scene(&scene, source);
    Ok(())
}

/// Start a load whose completion callback stores its result in the returned slot.
fn start<F: Fetcher + 'static>(fetcher: F, source: &str) -> (LoadTask, Outcome) {
    let outcome = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&outcome);

    let (container, task) = load(fetcher, source, move |result| {
        *slot.borrow_mut() = Some(result);
    });
    log::debug!(
        "Scene container {} created, populated: {}",
        container.name(),
        container.is_populated()
    );

    (task, outcome)
}

fn run_load(source: &str) -> Result<SceneContainer> {
    let (task, outcome) = if jsm_core::fetch::is_url(source) {
        start_url(source)?
    } else {
        start(FileFetcher::new(), source)
    };

    drive(task)?;

    let result = outcome.borrow_mut().take();
    match result {
        Some(result) => Ok(result?),
        None => bail!("load finished without reporting a result"),
    }
}

#[cfg(feature = "http")]
fn start_url(source: &str) -> Result<(LoadTask, Outcome)> {
    Ok(start(jsm_core::HttpFetcher::new(), source))
}

#[cfg(not(feature = "http"))]
fn start_url(source: &str) -> Result<(LoadTask, Outcome)> {
    bail!("{} is a URL; rebuild with --features http to fetch it", source)
}

/// Run a load task on the current thread.
#[cfg(feature = "http")]
fn drive(task: LoadTask) -> Result<()> {
    // reqwest needs a Tokio reactor
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(task);
    Ok(())
}

/// Run a load task on the current thread.
#[cfg(not(feature = "http"))]
fn drive(task: LoadTask) -> Result<()> {
    pollster::block_on(task);
    Ok(())
}

fn print_scene(scene: &SceneContainer, source: &str) {
    println!("\n=== Scene: {} ===", scene.name());
    println!("Geometries: {}", scene.geometry_count());
    println!("Meshes: {}", scene.child_count());
    println!("Total triangles: {}", scene.total_triangle_count());

    let base_dir = Path::new(source).parent().unwrap_or(Path::new(""));

    if let Some(first) = scene.children().first() {
        println!("\n--- Materials ---");
        for (i, material) in first.materials.iter().enumerate() {
            let name = material.name.as_deref().unwrap_or("<unnamed>");
            match &material.kind {
                MaterialKind::Textured(texture) => println!(
                    "  [{}] {} - texture {} (repeat {:?}, wrap {:?})",
                    i,
                    name,
                    texture.resolve_path(base_dir).display(),
                    texture.repeat.to_array(),
                    texture.wrap
                ),
                MaterialKind::FlatColor(color) => println!(
                    "  [{}] {} - flat ({:.3}, {:.3}, {:.3})",
                    i, name, color.x, color.y, color.z
                ),
            }
        }
    }

    println!("\n--- Meshes ---");
    for (i, node) in scene.children().iter().enumerate() {
        let pos = node.model_matrix().transform_point3(jsm_math::Vec3::ZERO);
        println!(
            "  [{}] {} -> {} ({} corners, {} groups) at ({:.2}, {:.2}, {:.2})",
            i,
            node.name,
            node.geometry.name,
            node.geometry.corner_count(),
            node.geometry.groups.len(),
            pos.x,
            pos.y,
            pos.z
        );
    }

    let world_bounds = scene.world_bounds();
    println!("\n--- World Bounds ---");
    if world_bounds.is_empty() {
        println!("  (empty)");
    } else {
        println!(
            "  Min: ({:.2}, {:.2}, {:.2})",
            world_bounds.min.x, world_bounds.min.y, world_bounds.min.z
        );
        println!(
            "  Max: ({:.2}, {:.2}, {:.2})",
            world_bounds.max.x, world_bounds.max.y, world_bounds.max.z
        );
    }
}
