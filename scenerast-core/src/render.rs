/// Wireframe and raster rendering of a scenegraph through a camera
use log::{debug, trace};
use nalgebra::{Matrix4, Point2, Vector3, Vector4};

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::geometry::{signed_area_2d, triangle_normal, Color};
use crate::raster::{rasterize_triangle, FrameBuffer};
use crate::scenegraph::{Instance, NodeId, SceneGraph};

/// Which pipeline `render` runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    Wireframe,
    #[default]
    Raster,
}

/// Output image size and pipeline selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    pub mode: RenderMode,
}

impl RenderSettings {
    pub fn new(width: usize, height: usize, mode: RenderMode) -> Self {
        Self {
            width,
            height,
            mode,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::new(300, 200, RenderMode::default())
    }
}

/// A closed triangle outline in image coordinates centered on the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// The triangle's corners with the first repeated at the end.
    pub points: [Point2<f64>; 4],
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    Lines(Vec<Polyline>),
    Image(FrameBuffer),
}

/// Camera-space triangles gathered from every instance.
#[derive(Debug, Clone, Default)]
pub struct TriangleData {
    pub vertices: Vec<[Vector4<f64>; 3]>,
    pub colors: Vec<Color>,
    /// Face normals whose length is twice the triangle's area.
    pub normals: Vec<Vector3<f64>>,
}

impl TriangleData {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Keep only triangles facing the camera, which looks down -z.
    pub fn cull_back_faces(self) -> Self {
        let mut kept = TriangleData::default();
        for ((verts, color), normal) in self.vertices.into_iter().zip(self.colors).zip(self.normals) {
            if normal.z > 0.0 {
                kept.vertices.push(verts);
                kept.colors.push(color);
                kept.normals.push(normal);
            }
        }
        kept
    }

    /// Scale each color by the cosine between its normal and the view axis.
    pub fn shade(&mut self) {
        for (color, normal) in self.colors.iter_mut().zip(&self.normals) {
            *color = color.scaled(normal.z / normal.norm());
        }
    }
}

fn check_size(width: usize, height: usize) -> RenderResult<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InputShape(format!(
            "image size {}x{} has no pixels",
            width, height
        )));
    }
    Ok(())
}

fn divide_w(p: Vector4<f64>) -> Vector4<f64> {
    p / p.w
}

/// Transform object-space vertices into the canonical view volume.
///
/// Applies `world_to_view * instance_transform` and divides every coordinate
/// by `w`, so the results have `w = 1`; vertices inside the frustum land in
/// [-1, 1]^3.
pub fn perspective_project(
    vertices: &[Vector4<f64>],
    instance_transform: &Matrix4<f64>,
    world_to_view: &Matrix4<f64>,
) -> Vec<Vector4<f64>> {
    let m = world_to_view * instance_transform;
    vertices.iter().map(|v| divide_w(m * v)).collect()
}

/// Front-facing triangle outlines of every instance, scaled to the image size.
///
/// Triangles wound clockwise (or degenerate) in the image plane are dropped,
/// as are triangles with a corner on the eye plane, which has no finite
/// projection.
pub fn plot_lines(instances: &[Instance], camera: &Camera, width: usize, height: usize) -> RenderResult<Vec<Polyline>> {
    check_size(width, height)?;
    let world_to_view = camera.world_to_canonical_view();
    let (half_w, half_h) = (width as f64 / 2.0, height as f64 / 2.0);

    let mut lines = Vec::new();
    for instance in instances {
        let projected = perspective_project(instance.mesh.vertices(), &instance.transform, &world_to_view);
        let color = instance.color();
        for &[i, j, k] in instance.mesh.triangles() {
            let corners = [projected[i], projected[j], projected[k]].map(|p| Point2::new(p.x, p.y));
            if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                continue;
            }
            let area = signed_area_2d(&corners[0], &corners[1], &corners[2]);
            if area.is_nan() || area <= 0.0 {
                continue;
            }
            let [a, b, c] = corners.map(|p| Point2::new(p.x * half_w, p.y * half_h));
            lines.push(Polyline {
                points: [a, b, c, a],
                color,
            });
        }
    }

    debug!("wireframe: {} front-facing triangle outlines", lines.len());
    Ok(lines)
}

/// Vertices, colors and normals of every triangle in camera-centric coordinates.
pub fn all_tri_data(instances: &[Instance], world_to_camera: &Matrix4<f64>) -> TriangleData {
    let total = instances.iter().map(|i| i.mesh.triangle_count()).sum();
    let mut data = TriangleData {
        vertices: Vec::with_capacity(total),
        colors: Vec::with_capacity(total),
        normals: Vec::with_capacity(total),
    };

    for instance in instances {
        let m = world_to_camera * instance.transform;
        let cam_verts: Vec<Vector4<f64>> = instance.mesh.vertices().iter().map(|v| m * v).collect();
        let color = instance.color();
        trace!(
            "instance of node {}: {} triangles",
            instance.shape.index(),
            instance.mesh.triangle_count()
        );

        for &[i, j, k] in instance.mesh.triangles() {
            let verts = [cam_verts[i], cam_verts[j], cam_verts[k]];
            data.normals.push(triangle_normal(&verts[0], &verts[1], &verts[2]));
            data.vertices.push(verts);
            data.colors.push(color);
        }
    }
    data
}

/// Render a flat-shaded, z-buffered image of `instances`.
pub fn render_raster(instances: &[Instance], camera: &Camera, width: usize, height: usize) -> RenderResult<FrameBuffer> {
    let mut frame = FrameBuffer::new(width, height)?;

    let mut tris = all_tri_data(instances, &camera.world_to_camera_centric()).cull_back_faces();
    debug!("raster: {} front-facing triangles", tris.len());
    tris.shade();

    let normalize = camera.perspective_normalization();
    for (verts, color) in tris.vertices.iter().zip(&tris.colors) {
        let canonical = verts.map(|v| divide_w(normalize * v));
        rasterize_triangle(&canonical, *color, &mut frame);
    }
    Ok(frame)
}

/// Traverse the scene from `root` and run the pipeline `settings` selects.
pub fn render(scene: &SceneGraph, root: NodeId, camera: &Camera, settings: &RenderSettings) -> RenderResult<RenderOutput> {
    let instances = scene.composite_transforms(root)?;
    match settings.mode {
        RenderMode::Wireframe => plot_lines(&instances, camera, settings.width, settings.height).map(RenderOutput::Lines),
        RenderMode::Raster => render_raster(&instances, camera, settings.width, settings.height).map(RenderOutput::Image),
    }
}
