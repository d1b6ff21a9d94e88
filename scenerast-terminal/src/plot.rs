/// Character-cell canvas for wireframe plots
use nalgebra::Point2;
use scenerast_core::{Color, Polyline, RenderError, RenderResult};

/// Glyph drawn at the points a polyline passes through.
pub const POINT_GLYPH: char = 'o';
/// Glyph drawn along the segments between points.
pub const LINE_GLYPH: char = '.';

const CYCLE: [(char, Color); 7] = [
    ('b', Color { r: 0.0, g: 0.0, b: 1.0 }),
    ('g', Color { r: 0.0, g: 0.5, b: 0.0 }),
    ('r', Color { r: 1.0, g: 0.0, b: 0.0 }),
    ('c', Color { r: 0.0, g: 0.75, b: 0.75 }),
    ('m', Color { r: 0.75, g: 0.0, b: 0.75 }),
    ('y', Color { r: 0.75, g: 0.75, b: 0.0 }),
    ('k', Color { r: 0.0, g: 0.0, b: 0.0 }),
];

/// Endless cycle of the plotting colors `b g r c m y k`.
///
/// Owned by the caller and handed to drawing calls that are not given a color.
#[derive(Debug, Clone, Default)]
pub struct ColorCycle {
    next: usize,
}

impl ColorCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code letter of the color the next call will return.
    pub fn peek_code(&self) -> char {
        CYCLE[self.next].0
    }
}

impl Iterator for ColorCycle {
    type Item = Color;

    fn next(&mut self) -> Option<Color> {
        let (_, color) = CYCLE[self.next];
        self.next = (self.next + 1) % CYCLE.len();
        Some(color)
    }
}

/// One drawn cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub glyph: char,
    pub color: Color,
}

/// A grid of character cells addressed like image pixels.
///
/// Plot coordinates are centered on the grid: `x` runs from `-width/2` to
/// `width/2` and `y` from `-height/2` to `height/2`, so the polylines from the
/// wireframe pipeline land on the canvas unchanged. Row 0 is the bottom row.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<Option<Cell>>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InputShape(format!(
                "canvas size {}x{} has no cells",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            cells: vec![None; width * height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<Cell> {
        self.cells[row * self.width + col]
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    fn to_cell(&self, p: &Point2<f64>) -> (i64, i64) {
        let col = (p.x + self.width as f64 / 2.0).floor() as i64;
        let row = (p.y + self.height as f64 / 2.0).floor() as i64;
        (col, row)
    }

    fn plot(&mut self, col: i64, row: i64, cell: Cell) {
        if col < 0 || row < 0 || col >= self.width as i64 || row >= self.height as i64 {
            return;
        }
        let i = row as usize * self.width + col as usize;
        // Points stay visible when a later segment crosses them
        if cell.glyph == LINE_GLYPH && matches!(self.cells[i], Some(c) if c.glyph == POINT_GLYPH) {
            return;
        }
        self.cells[i] = Some(cell);
    }

    /// The part of segment `p`-`q` inside the canvas grown by one cell on each side.
    ///
    /// Liang-Barsky, worked on halved coordinates so the direction vector stays
    /// finite for any pair of finite points.
    fn clip(&self, p: &Point2<f64>, q: &Point2<f64>) -> Option<(Point2<f64>, Point2<f64>)> {
        let half_w = (self.width as f64 / 2.0 + 1.0) / 2.0;
        let half_h = (self.height as f64 / 2.0 + 1.0) / 2.0;
        let (px, py) = (p.x / 2.0, p.y / 2.0);
        let (dx, dy) = (q.x / 2.0 - px, q.y / 2.0 - py);

        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        for (den, num) in [(-dx, px + half_w), (dx, half_w - px), (-dy, py + half_h), (dy, half_h - py)] {
            if den == 0.0 {
                if num < 0.0 {
                    return None;
                }
            } else {
                let t = num / den;
                if den < 0.0 {
                    t0 = t0.max(t);
                } else {
                    t1 = t1.min(t);
                }
            }
        }
        if t0 > t1 {
            return None;
        }

        let at = |t: f64| Point2::new(p.x * (1.0 - t) + q.x * t, p.y * (1.0 - t) + q.y * t);
        Some((at(t0), at(t1)))
    }

    // Bresenham between two cells
    fn segment(&mut self, from: (i64, i64), to: (i64, i64), color: Color) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x, y, Cell { glyph: LINE_GLYPH, color });
            if (x, y) == to {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn stroke(&mut self, points: &[Point2<f64>], closed: bool, color: Option<Color>, cycle: &mut ColorCycle) -> RenderResult<()> {
        if points.len() < 2 {
            return Err(RenderError::InputShape(format!(
                "a polyline needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(RenderError::InputShape(format!("point {} is not finite", p)));
        }
        let color = color.or_else(|| cycle.next()).unwrap_or(Color::WHITE);

        let closing = closed.then(|| [points[points.len() - 1], points[0]]);
        for pair in points.windows(2).chain(closing.as_ref().map(|c| &c[..])) {
            if let Some((from, to)) = self.clip(&pair[0], &pair[1]) {
                self.segment(self.to_cell(&from), self.to_cell(&to), color);
            }
        }
        for p in points {
            let (col, row) = self.to_cell(p);
            self.plot(col, row, Cell { glyph: POINT_GLYPH, color });
        }
        Ok(())
    }

    /// Draw the points joined by straight segments.
    ///
    /// Without a `color` the next color of `cycle` is used.
    pub fn draw_polyline(&mut self, points: &[Point2<f64>], color: Option<Color>, cycle: &mut ColorCycle) -> RenderResult<()> {
        self.stroke(points, false, color, cycle)
    }

    /// Like `draw_polyline`, plus a segment from the last point back to the first.
    pub fn draw_polygon(&mut self, points: &[Point2<f64>], color: Option<Color>, cycle: &mut ColorCycle) -> RenderResult<()> {
        self.stroke(points, true, color, cycle)
    }

    /// Draw wireframe output, in each line's own color or in cycle colors.
    pub fn draw_lines(&mut self, lines: &[Polyline], cycle: Option<&mut ColorCycle>) -> RenderResult<()> {
        match cycle {
            Some(cycle) => {
                for line in lines {
                    self.draw_polyline(&line.points, None, cycle)?;
                }
            }
            None => {
                let mut unused = ColorCycle::new();
                for line in lines {
                    self.draw_polyline(&line.points, Some(line.color), &mut unused)?;
                }
            }
        }
        Ok(())
    }
}
