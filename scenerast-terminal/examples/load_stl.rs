/// Example: Load an STL file and render it in the terminal
///
/// Usage: cargo run --example load_stl -- path/to/file.stl [--mode=wireframe]
use std::env;
use std::fs;
use std::io::stdout;
use std::sync::Arc;

use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use scenerast_core::{shapes, stl, Angles, Camera, Color, Mesh, RenderMode, RenderSettings, SceneGraph};
use scenerast_terminal::{Scene, TerminalApp};

fn load_mesh(args: &[String]) -> Result<Mesh> {
    match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        Some(path) => {
            log::info!("Loading STL file: {}", path);
            let data = fs::read(path).with_context(|| format!("Failed to read STL file {}", path))?;
            Ok(stl::parse_stl(&data)?)
        }
        None => {
            log::warn!("No STL file provided, using default cube");
            Ok(shapes::cube(2.0)?)
        }
    }
}

/// Center the mesh on the origin and fit it inside a unit ball, tilted so
/// that three faces of a box face the camera.
fn framed_scene(mesh: Mesh) -> Result<Scene> {
    let points = mesh.vertices();
    anyhow::ensure!(!points.is_empty(), "mesh has no vertices");
    let (min, max) = points.iter().fold(
        (Vector3::repeat(f64::INFINITY), Vector3::repeat(f64::NEG_INFINITY)),
        |(lo, hi), v| (lo.inf(&v.xyz()), hi.sup(&v.xyz())),
    );
    let center = (min + max) / 2.0;
    let radius = ((max - min).norm() / 2.0).max(f64::EPSILON);

    let mut sg = SceneGraph::new();
    let root = sg.add_root("");
    let tilt = sg.add_rotate(Angles::new(0.5, 0.4, 0.0), "tilt");
    let fit = sg.add_scale(Vector3::repeat(1.0 / radius), "fit");
    let centered = sg.add_translate(-center, "center");
    let surface = sg.add_surface(Color::new(0.8, 0.8, 0.9)?, "surface");
    let shape = sg.add_shape(Arc::new(mesh), "model");
    for (parent, child) in [(root, tilt), (tilt, fit), (fit, centered), (centered, surface), (surface, shape)] {
        sg.add_child(parent, child)?;
    }
    Ok(Scene { graph: sg, root })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mode = if args.iter().any(|a| a == "--mode=wireframe") {
        RenderMode::Wireframe
    } else {
        RenderMode::Raster
    };

    let mesh = load_mesh(&args)?;
    log::info!("Loaded {} triangles", mesh.triangle_count());
    let scene = framed_scene(mesh)?;

    let settings = RenderSettings::new(80, 40, mode);
    let mut camera = Camera::look_at(
        Point3::new(0.0, 0.0, 4.0),
        Point3::origin(),
        Vector3::new(0.0, 1.0, 0.0),
        1.0,
        10.0,
    )?;
    camera.set_view_angles(settings.aspect_ratio(), 40.0)?;

    TerminalApp::new(scene, camera, settings).run(stdout().lock())
}
