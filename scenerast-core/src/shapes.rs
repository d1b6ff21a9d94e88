/// Primitive mesh producers
///
/// Every producer winds its triangles counter-clockwise when seen from
/// outside the solid, so the face normals point outward.
use std::f64::consts::PI;

use nalgebra::Point3;

use crate::error::{RenderError, RenderResult};
use crate::geometry::Mesh;

/// Vertical scale applied to the ball in `squished_ball`.
const BALL_SQUISH: f64 = 0.6;

/// Axis-aligned cube with edge length `size`, centered on the origin.
pub fn cube(size: f64) -> RenderResult<Mesh> {
    let half = size / 2.0;
    // Vertex i has x from bit 0, y from bit 1 and z from bit 2.
    let points: Vec<Point3<f64>> = (0..8)
        .map(|i| {
            let pick = |bit: usize| if i & bit != 0 { half } else { -half };
            Point3::new(pick(1), pick(2), pick(4))
        })
        .collect();

    let triangles = vec![
        // Front (+z)
        [4, 5, 7],
        [4, 7, 6],
        // Back (-z)
        [0, 2, 3],
        [0, 3, 1],
        // Right (+x)
        [1, 3, 7],
        [1, 7, 5],
        // Left (-x)
        [0, 4, 6],
        [0, 6, 2],
        // Top (+y)
        [2, 6, 7],
        [2, 7, 3],
        // Bottom (-y)
        [0, 1, 5],
        [0, 5, 4],
    ];

    Mesh::from_points(&points, triangles)
}

fn ring_point(i: usize, sides: usize, radius: f64, y: f64) -> Point3<f64> {
    // Increasing angle turns counter-clockwise around +y.
    let theta = 2.0 * PI * i as f64 / sides as f64;
    Point3::new(radius * theta.sin(), y, radius * theta.cos())
}

fn check_sides(sides: usize, what: &str) -> RenderResult<()> {
    if sides < 3 {
        return Err(RenderError::InputShape(format!(
            "a {} needs at least 3 sides, got {}",
            what, sides
        )));
    }
    Ok(())
}

/// Regular prism around the Y axis: unit circumradius, `y` in [-1, 1].
///
/// With many sides this stands in for a cylinder.
pub fn prism(sides: usize) -> RenderResult<Mesh> {
    check_sides(sides, "prism")?;

    let mut points: Vec<Point3<f64>> = (0..sides).map(|i| ring_point(i, sides, 1.0, -1.0)).collect();
    points.extend((0..sides).map(|i| ring_point(i, sides, 1.0, 1.0)));
    let bottom_center = points.len();
    points.push(Point3::new(0.0, -1.0, 0.0));
    let top_center = points.len();
    points.push(Point3::new(0.0, 1.0, 0.0));

    let mut triangles = Vec::with_capacity(4 * sides);
    for i in 0..sides {
        let j = (i + 1) % sides;
        let (bi, bj, ti, tj) = (i, j, sides + i, sides + j);
        triangles.push([bi, bj, tj]);
        triangles.push([bi, tj, ti]);
        triangles.push([top_center, ti, tj]);
        triangles.push([bottom_center, bj, bi]);
    }

    Mesh::from_points(&points, triangles)
}

/// Two cones joined at a unit-radius ring in the XZ plane, apexes at `y = ±1`.
pub fn double_cone(sides: usize) -> RenderResult<Mesh> {
    check_sides(sides, "double cone")?;

    let mut points: Vec<Point3<f64>> = (0..sides).map(|i| ring_point(i, sides, 1.0, 0.0)).collect();
    let top = points.len();
    points.push(Point3::new(0.0, 1.0, 0.0));
    let bottom = points.len();
    points.push(Point3::new(0.0, -1.0, 0.0));

    let mut triangles = Vec::with_capacity(2 * sides);
    for i in 0..sides {
        let j = (i + 1) % sides;
        triangles.push([top, i, j]);
        triangles.push([bottom, j, i]);
    }

    Mesh::from_points(&points, triangles)
}

/// Unit ball flattened along Y, tessellated into `subdivisions` latitude bands
/// and twice as many longitude slices.
pub fn squished_ball(subdivisions: usize) -> RenderResult<Mesh> {
    if subdivisions < 2 {
        return Err(RenderError::InputShape(format!(
            "a squished ball needs at least 2 subdivisions, got {}",
            subdivisions
        )));
    }

    let slices = 2 * subdivisions;
    let rings = subdivisions - 1;

    let mut points = Vec::with_capacity(2 + rings * slices);
    points.push(Point3::new(0.0, BALL_SQUISH, 0.0));
    for k in 1..=rings {
        let phi = PI * k as f64 / subdivisions as f64;
        let y = BALL_SQUISH * phi.cos();
        points.extend((0..slices).map(|i| ring_point(i, slices, phi.sin(), y)));
    }
    let bottom = points.len();
    points.push(Point3::new(0.0, -BALL_SQUISH, 0.0));

    let ring = |k: usize, i: usize| 1 + (k - 1) * slices + i % slices;

    let mut triangles = Vec::with_capacity(2 * slices * rings);
    for i in 0..slices {
        triangles.push([0, ring(1, i), ring(1, i + 1)]);
    }
    for k in 1..rings {
        for i in 0..slices {
            let (ui, uj) = (ring(k, i), ring(k, i + 1));
            let (li, lj) = (ring(k + 1, i), ring(k + 1, i + 1));
            triangles.push([li, lj, uj]);
            triangles.push([li, uj, ui]);
        }
    }
    for i in 0..slices {
        triangles.push([bottom, ring(rings, i + 1), ring(rings, i)]);
    }

    Mesh::from_points(&points, triangles)
}
