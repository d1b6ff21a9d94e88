/// Binary PPM (P6) export of raster images
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use scenerast_core::FrameBuffer;

/// Write `frame` as a binary P6 image, top row first.
pub fn write_ppm<W: Write>(frame: &FrameBuffer, mut out: W) -> io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", frame.width(), frame.height())?;
    for b in (0..frame.height()).rev() {
        for color in frame.row(b) {
            out.write_all(&color.to_rgb8())?;
        }
    }
    out.flush()
}

pub fn save_ppm(path: impl AsRef<Path>, frame: &FrameBuffer) -> io::Result<()> {
    let file = File::create(path)?;
    write_ppm(frame, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenerast_core::Color;

    #[test]
    fn test_ppm_layout() {
        let mut frame = FrameBuffer::new(2, 2).unwrap();
        let black = Color::new(0.0, 0.0, 0.0).unwrap();
        frame.test_and_set(1, 0, 0.0, black);

        let mut out = Vec::new();
        write_ppm(&frame, &mut out).unwrap();

        let header = b"P6\n2 2\n255\n";
        assert_eq!(&out[..header.len()], header);
        let body = &out[header.len()..];
        assert_eq!(body.len(), 2 * 2 * 3);
        // Top row is all white, bottom row is white then black
        assert!(body[..6].iter().all(|&c| c == 255));
        assert_eq!(&body[6..], &[255, 255, 255, 0, 0, 0]);
    }
}
