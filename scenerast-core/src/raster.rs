/// Z-buffered triangle rasterizer over canonical view coordinates
use nalgebra::Vector4;

use crate::error::{RenderError, RenderResult};
use crate::geometry::{point_on_triangle, Color};

/// Depth every pixel starts at: the far side of the canonical view volume.
pub const CLEAR_DEPTH: f64 = -1.0;

/// A color image with an attached depth buffer.
///
/// Pixel `(a, b)` is column `a` counted from the left and row `b` counted from
/// the bottom. Color and depth are stored together so one write updates both.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
    depth: Vec<f64>,
}

impl FrameBuffer {
    /// A white image with every depth cleared to `CLEAR_DEPTH`.
    pub fn new(width: usize, height: usize) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InputShape(format!(
                "image size {}x{} has no pixels",
                width, height
            )));
        }
        let size = width * height;
        Ok(Self {
            width,
            height,
            pixels: vec![Color::WHITE; size],
            depth: vec![CLEAR_DEPTH; size],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn contains(&self, a: usize, b: usize) -> bool {
        a < self.width && b < self.height
    }

    /// Panics if `(a, b)` lies outside the frame.
    fn index(&self, a: usize, b: usize) -> usize {
        assert!(
            self.contains(a, b),
            "pixel ({}, {}) outside {}x{} frame",
            a,
            b,
            self.width,
            self.height
        );
        b * self.width + a
    }

    pub fn pixel(&self, a: usize, b: usize) -> Color {
        self.pixels[self.index(a, b)]
    }

    pub fn depth(&self, a: usize, b: usize) -> f64 {
        self.depth[self.index(a, b)]
    }

    /// Row `b` of the image, left to right.
    pub fn row(&self, b: usize) -> &[Color] {
        let start = b * self.width;
        &self.pixels[start..start + self.width]
    }

    /// Depth-test a fragment and, if it wins, write its color and depth.
    ///
    /// A fragment wins when it is strictly nearer than the stored depth and
    /// strictly in front of the near plane (`z < 1`). Pixels outside the
    /// frame never win.
    pub fn test_and_set(&mut self, a: usize, b: usize, z: f64, color: Color) -> bool {
        if !self.contains(a, b) {
            return false;
        }
        let i = self.index(a, b);
        if z > self.depth[i] && z < 1.0 {
            self.depth[i] = z;
            self.pixels[i] = color;
            true
        } else {
            false
        }
    }

    /// Pixel column whose center is nearest to canonical `x`.
    pub fn column_of(&self, x: f64) -> i64 {
        to_pixel(x, self.width)
    }

    /// Pixel row whose center is nearest to canonical `y`.
    pub fn row_of(&self, y: f64) -> i64 {
        to_pixel(y, self.height)
    }

    /// Canonical (x, y) of the center of pixel `(a, b)`.
    pub fn center_of(&self, a: usize, b: usize) -> (f64, f64) {
        (to_canonical(a, self.width), to_canonical(b, self.height))
    }
}

// Pixel k of n has its center at o + s * k, with o = 1/n - 1 and s = 2/n, so
// round((c - o) / s) simplifies to floor((c + 1) * n / 2).
fn to_pixel(c: f64, n: usize) -> i64 {
    ((c + 1.0) * n as f64 / 2.0).floor() as i64
}

fn to_canonical(k: usize, n: usize) -> f64 {
    let n = n as f64;
    (1.0 / n - 1.0) + (2.0 / n) * k as f64
}

/// Inclusive range of pixel indices covered by a triangle's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub min_a: i64,
    pub max_a: i64,
    pub min_b: i64,
    pub max_b: i64,
}

impl PixelBox {
    /// Bounding box of `verts` clamped to the canonical square and converted to pixels.
    ///
    /// The upper clamp is one half-pixel short of 1 so that no coordinate maps
    /// past the last column or row.
    pub fn of_triangle(verts: &[Vector4<f64>; 3], width: usize, height: usize) -> Self {
        let (w, h) = (width as f64, height as f64);
        let min_x = verts.iter().map(|v| v.x).fold(f64::INFINITY, f64::min).max(-1.0);
        let max_x = verts.iter().map(|v| v.x).fold(f64::NEG_INFINITY, f64::max).min(1.0 - 1.0 / w);
        let min_y = verts.iter().map(|v| v.y).fold(f64::INFINITY, f64::min).max(-1.0);
        let max_y = verts.iter().map(|v| v.y).fold(f64::NEG_INFINITY, f64::max).min(1.0 - 1.0 / h);

        Self {
            min_a: to_pixel(min_x, width),
            max_a: to_pixel(max_x, width),
            min_b: to_pixel(min_y, height),
            max_b: to_pixel(max_y, height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_a > self.max_a || self.min_b > self.max_b
    }

    pub fn pixel_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            ((self.max_a - self.min_a + 1) * (self.max_b - self.min_b + 1)) as usize
        }
    }
}

/// Paint one triangle into `frame` with z-buffering.
///
/// `verts` are canonical-view coordinates with `w = 1`. Every pixel whose
/// center falls inside the triangle gets the interpolated depth; it is written
/// only if it passes `FrameBuffer::test_and_set`. Returns the number of
/// pixels written.
pub fn rasterize_triangle(verts: &[Vector4<f64>; 3], color: Color, frame: &mut FrameBuffer) -> usize {
    let bounds = PixelBox::of_triangle(verts, frame.width, frame.height);
    if bounds.is_empty() {
        return 0;
    }

    let mut written = 0;
    for a in bounds.min_a..=bounds.max_a {
        for b in bounds.min_b..=bounds.max_b {
            let (a, b) = (a as usize, b as usize);
            let (x, y) = frame.center_of(a, b);
            if let Some(z) = point_on_triangle(x, y, verts) {
                if frame.test_and_set(a, b, z, color) {
                    written += 1;
                }
            }
        }
    }
    written
}
