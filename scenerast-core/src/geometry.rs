/// Geometry primitives for 3D rendering
use std::fmt;

use nalgebra::{Matrix3, Point2, Point3, Vector3, Vector4};

use crate::error::{RenderError, RenderResult};

/// An RGB color with every channel in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Color used for shapes that no surface node reaches.
    pub const DEFAULT_SURFACE: Color = Color {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };

    pub fn new(r: f64, g: f64, b: f64) -> RenderResult<Self> {
        for (channel, value) in [("red", r), ("green", g), ("blue", b)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RenderError::InputShape(format!(
                    "{} channel {} is outside [0, 1]",
                    channel, value
                )));
            }
        }
        Ok(Self { r, g, b })
    }

    /// Build a color from 8-bit channels over a denominator (e.g. 255 or 256).
    pub fn from_bytes(r: u8, g: u8, b: u8, denominator: f64) -> RenderResult<Self> {
        Self::new(
            r as f64 / denominator,
            g as f64 / denominator,
            b as f64 / denominator,
        )
    }

    /// Multiply every channel by `factor`, clamped back into [0, 1].
    pub fn scaled(&self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: self.r * f,
            g: self.g * f,
            b: self.b * f,
        }
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.r, self.g, self.b)
    }
}

/// An indexed triangle mesh: homogeneous vertices plus vertex-index triples.
///
/// Immutable once built; share it between shape nodes behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vector4<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl Mesh {
    /// Validate and build a mesh.
    ///
    /// Fails with `InputShape` when a triangle references a missing vertex or a
    /// vertex has a non-finite coordinate or a zero `w`.
    pub fn new(vertices: Vec<Vector4<f64>>, triangles: Vec<[usize; 3]>) -> RenderResult<Self> {
        if let Some((i, v)) = vertices
            .iter()
            .enumerate()
            .find(|(_, v)| !v.iter().all(|c| c.is_finite()) || v.w == 0.0)
        {
            return Err(RenderError::InputShape(format!(
                "vertex {} has invalid homogeneous coordinates {:?}",
                i,
                v.as_slice()
            )));
        }

        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&i| i >= vertices.len()) {
                return Err(RenderError::InputShape(format!(
                    "triangle {} references vertex {} but the mesh has {} vertices",
                    t,
                    bad,
                    vertices.len()
                )));
            }
        }

        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Build a mesh from Cartesian points, lifting each to `w = 1`.
    pub fn from_points(points: &[Point3<f64>], triangles: Vec<[usize; 3]>) -> RenderResult<Self> {
        let vertices = points.iter().map(|p| p.to_homogeneous()).collect();
        Self::new(vertices, triangles)
    }

    pub fn vertices(&self) -> &[Vector4<f64>] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// The three vertices of triangle `t`.
    pub fn triangle_vertices(&self, t: usize) -> [Vector4<f64>; 3] {
        let [i, j, k] = self.triangles[t];
        [self.vertices[i], self.vertices[j], self.vertices[k]]
    }
}

/// Normal of the triangle `(a, b, c)`, ignoring `w`.
///
/// The length of the result is twice the triangle's area.
pub fn triangle_normal(a: &Vector4<f64>, b: &Vector4<f64>, c: &Vector4<f64>) -> Vector3<f64> {
    let a = a.xyz();
    (b.xyz() - a).cross(&(c.xyz() - a))
}

/// Twice the signed area of a 2-D triangle.
///
/// Positive for counter-clockwise order, zero for a degenerate triangle and
/// negative for clockwise order.
pub fn signed_area_2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let u = b - a;
    let v = c - a;
    u.x * v.y - u.y * v.x
}

/// Euclidean norm of each vector.
pub fn axis_norms(vectors: &[Vector3<f64>]) -> Vec<f64> {
    vectors.iter().map(|v| v.norm()).collect()
}

/// Barycentric weights of `p` with respect to the 2-D triangle `(v1, v2, v3)`.
///
/// Each weight is the ratio of a sub-triangle determinant to the whole
/// triangle's determinant, so the result is independent of winding. Returns
/// `None` when the triangle is degenerate.
pub fn barycentric(p: &Point2<f64>, tri: &[Point2<f64>; 3]) -> Option<[f64; 3]> {
    let [v1, v2, v3] = tri;
    let det = |a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>| {
        Matrix3::new(a.x, b.x, c.x, a.y, b.y, c.y, 1.0, 1.0, 1.0).determinant()
    };

    let whole = det(v1, v2, v3);
    if whole.abs() < f64::EPSILON * 16.0 {
        return None;
    }

    let w1 = det(p, v2, v3) / whole;
    let w2 = det(v1, p, v3) / whole;
    Some([w1, w2, 1.0 - w1 - w2])
}

/// Depth of the triangle where the line through `(x, y)` parallel to Z meets it.
///
/// `verts` are canonical-view coordinates with `w` already divided out.
/// Returns `None` when the line misses the triangle.
pub fn point_on_triangle(x: f64, y: f64, verts: &[Vector4<f64>; 3]) -> Option<f64> {
    let flat = [
        Point2::new(verts[0].x, verts[0].y),
        Point2::new(verts[1].x, verts[1].y),
        Point2::new(verts[2].x, verts[2].y),
    ];
    let weights = barycentric(&Point2::new(x, y), &flat)?;
    if weights.iter().any(|&w| w < 0.0) {
        return None;
    }

    Some(weights[0] * verts[0].z + weights[1] * verts[1].z + weights[2] * verts[2].z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Vector4<f64> {
        Vector4::new(x, y, z, 1.0)
    }

    #[test]
    fn test_color_range_is_checked() {
        assert!(Color::new(0.0, 0.5, 1.0).is_ok());
        assert!(matches!(
            Color::new(1.2, 0.0, 0.0),
            Err(RenderError::InputShape(_))
        ));
        assert!(matches!(
            Color::new(0.0, -0.1, 0.0),
            Err(RenderError::InputShape(_))
        ));
        assert!(Color::new(f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_color_scaling() {
        let c = Color::new(0.2, 0.4, 1.0).unwrap().scaled(0.5);
        assert!((c.r - 0.1).abs() < 1e-12);
        assert!((c.g - 0.2).abs() < 1e-12);
        assert!((c.b - 0.5).abs() < 1e-12);
        assert_eq!(Color::WHITE.to_rgb8(), [255, 255, 255]);
    }

    #[test]
    fn test_mesh_rejects_bad_index() {
        let result = Mesh::new(vec![v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)], vec![[0, 1, 2]]);
        assert!(matches!(result, Err(RenderError::InputShape(_))));
    }

    #[test]
    fn test_mesh_rejects_zero_w() {
        let result = Mesh::new(vec![Vector4::new(0.0, 0.0, 0.0, 0.0)], vec![]);
        assert!(matches!(result, Err(RenderError::InputShape(_))));
    }

    #[test]
    fn test_mesh_from_points() {
        let mesh = Mesh::from_points(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.vertices().iter().all(|p| p.w == 1.0));
        assert_eq!(mesh.triangle_vertices(0)[1], v(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_triangle_normal_length_is_twice_area() {
        let n = triangle_normal(&v(0.0, 0.0, 0.0), &v(2.0, 0.0, 0.0), &v(0.0, 3.0, 0.0));
        assert_eq!(n, Vector3::new(0.0, 0.0, 6.0));
        assert_eq!(axis_norms(&[n]), vec![6.0]);
    }

    #[test]
    fn test_signed_area_winding() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(signed_area_2d(&a, &b, &c) > 0.0);
        assert!(signed_area_2d(&a, &c, &b) < 0.0);
        assert_eq!(signed_area_2d(&a, &b, &Point2::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_barycentric_weights() {
        let tri = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let w = barycentric(&Point2::new(0.25, 0.25), &tri).unwrap();
        assert!((w[0] - 0.5).abs() < 1e-12);
        assert!((w[1] - 0.25).abs() < 1e-12);
        assert!((w[2] - 0.25).abs() < 1e-12);

        // Same answer for the opposite winding
        let flipped = [tri[0], tri[2], tri[1]];
        let w = barycentric(&Point2::new(0.25, 0.25), &flipped).unwrap();
        assert!((w[1] - 0.25).abs() < 1e-12);

        assert!(barycentric(&Point2::new(0.0, 0.0), &[tri[0], tri[0], tri[1]]).is_none());
    }

    #[test]
    fn test_point_on_triangle_interpolates_depth() {
        let verts = [v(-1.0, -1.0, 0.0), v(1.0, -1.0, 0.5), v(-1.0, 1.0, 1.0)];
        let z = point_on_triangle(-1.0, -1.0, &verts).unwrap();
        assert!(z.abs() < 1e-12);
        let z = point_on_triangle(0.0, -1.0, &verts).unwrap();
        assert!((z - 0.25).abs() < 1e-12);
        assert!(point_on_triangle(0.5, 0.5, &verts).is_none());
    }
}
