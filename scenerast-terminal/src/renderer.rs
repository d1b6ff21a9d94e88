/// Terminal output for canvases and raster images
use std::io::Write;

use anyhow::Result;
use crossterm::{
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use scenerast_core::{Color, FrameBuffer, RenderError};

use crate::plot::Canvas;

fn term_color(color: &Color) -> TermColor {
    let [r, g, b] = color.to_rgb8();
    TermColor::Rgb { r, g, b }
}

fn check_channels(color: &Color, a: usize, b: usize) -> Result<(), RenderError> {
    for value in [color.r, color.g, color.b] {
        if !(0.0..=1.0).contains(&value) {
            return Err(RenderError::InputShape(format!(
                "pixel ({}, {}) has channel {} outside [0, 1]",
                a, b, value
            )));
        }
    }
    Ok(())
}

/// Draws canvases and images to a writer, one terminal cell per pixel.
///
/// Images are stored bottom row first; the sink prints the top row first so
/// the picture comes out upright.
pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn draw_canvas(&mut self, canvas: &Canvas) -> Result<()> {
        for row in (0..canvas.height()).rev() {
            for col in 0..canvas.width() {
                match canvas.cell(col, row) {
                    Some(cell) => {
                        self.out.queue(SetForegroundColor(term_color(&cell.color)))?;
                        self.out.queue(Print(cell.glyph))?;
                    }
                    None => {
                        self.out.queue(Print(' '))?;
                    }
                }
            }
            self.out.queue(ResetColor)?;
            self.out.queue(Print('\n'))?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Draw every pixel as a background-colored blank.
    ///
    /// Fails with `InputShape`, before anything is written, if a pixel has a
    /// channel outside [0, 1].
    pub fn draw_image(&mut self, frame: &FrameBuffer) -> Result<()> {
        for b in 0..frame.height() {
            for (a, color) in frame.row(b).iter().enumerate() {
                check_channels(color, a, b)?;
            }
        }

        for b in (0..frame.height()).rev() {
            for color in frame.row(b) {
                self.out.queue(SetBackgroundColor(term_color(color)))?;
                self.out.queue(Print(' '))?;
            }
            self.out.queue(ResetColor)?;
            self.out.queue(Print('\n'))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::ColorCycle;
    use nalgebra::Point2;

    fn red() -> Color {
        Color::new(1.0, 0.0, 0.0).unwrap()
    }

    #[test]
    fn test_image_prints_top_row_first() {
        let mut frame = FrameBuffer::new(3, 2).unwrap();
        for a in 0..3 {
            assert!(frame.test_and_set(a, 0, 0.5, red()));
        }

        let mut sink = TerminalSink::new(Vec::new());
        sink.draw_image(&frame).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();

        assert_eq!(out.matches('\n').count(), 2);
        let white = out.find("48;2;255;255;255").unwrap();
        let red = out.find("48;2;255;0;0").unwrap();
        assert!(white < red);
        assert_eq!(out.matches("48;2;255;0;0").count(), 3);
    }

    #[test]
    fn test_canvas_rows_and_glyphs() {
        let mut canvas = Canvas::new(5, 3).unwrap();
        let mut cycle = ColorCycle::new();
        canvas
            .draw_polyline(&[Point2::new(-2.5, 1.0), Point2::new(2.0, 1.0)], Some(red()), &mut cycle)
            .unwrap();

        let mut sink = TerminalSink::new(Vec::new());
        sink.draw_canvas(&canvas).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();

        let rows: Vec<&str> = out.split('\n').collect();
        assert_eq!(rows.len(), 4);
        // The line sits on the top row, which is printed first
        assert!(rows[0].contains('o'));
        assert!(rows[0].contains("38;2;255;0;0"));
        assert!(!rows[1].contains('o'));
        assert!(!rows[2].contains('o'));
    }

    #[test]
    fn test_image_with_bad_channel_is_rejected() {
        let mut frame = FrameBuffer::new(2, 2).unwrap();
        let bad = Color { r: 1.5, g: 0.0, b: 0.0 };
        frame.test_and_set(1, 1, 0.0, bad);

        let mut sink = TerminalSink::new(Vec::new());
        let err = sink.draw_image(&frame).unwrap_err();
        assert!(matches!(err.downcast_ref::<RenderError>(), Some(RenderError::InputShape(_))));
        assert!(sink.into_inner().is_empty());
    }
}
