/// Terminal display for the scenerast renderer
use std::io::Write;

use anyhow::Result;
use log::info;
use scenerast_core::{render, Camera, NodeId, RenderOutput, RenderSettings, SceneGraph};

pub mod demo;
pub mod plot;
pub mod ppm;
pub mod renderer;

pub use demo::{CameraSetup, Scene};
pub use plot::{Canvas, ColorCycle};
pub use renderer::TerminalSink;

/// How wireframe outlines are colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineColors {
    /// Each outline in its instance's surface color.
    #[default]
    Surface,
    /// Successive outlines in the plotting color cycle.
    Cycle,
}

/// Renders one scene through one camera and hands the result to a sink.
pub struct TerminalApp {
    scene: SceneGraph,
    root: NodeId,
    camera: Camera,
    settings: RenderSettings,
    line_colors: LineColors,
}

impl TerminalApp {
    pub fn new(scene: Scene, camera: Camera, settings: RenderSettings) -> Self {
        Self {
            scene: scene.graph,
            root: scene.root,
            camera,
            settings,
            line_colors: LineColors::default(),
        }
    }

    pub fn with_line_colors(mut self, line_colors: LineColors) -> Self {
        self.line_colors = line_colors;
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn render(&self) -> Result<RenderOutput> {
        let output = render(&self.scene, self.root, &self.camera, &self.settings)?;
        match &output {
            RenderOutput::Lines(lines) => info!("Rendered {} wireframe outlines", lines.len()),
            RenderOutput::Image(frame) => info!("Rendered {}x{} image", frame.width(), frame.height()),
        }
        Ok(output)
    }

    /// Render and draw the result to `out`.
    pub fn run<W: Write>(&self, out: W) -> Result<()> {
        let mut sink = TerminalSink::new(out);
        match self.render()? {
            RenderOutput::Lines(lines) => {
                let mut canvas = Canvas::new(self.settings.width, self.settings.height)?;
                let mut cycle = ColorCycle::new();
                let cycle = match self.line_colors {
                    LineColors::Surface => None,
                    LineColors::Cycle => Some(&mut cycle),
                };
                canvas.draw_lines(&lines, cycle)?;
                sink.draw_canvas(&canvas)
            }
            RenderOutput::Image(frame) => sink.draw_image(&frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenerast_core::RenderMode;

    fn app(mode: RenderMode) -> TerminalApp {
        let setup = CameraSetup::view(1).unwrap();
        let scene = demo::combined_scene(&demo::CombinedParams::default()).unwrap();
        let settings = RenderSettings::new(60, 40, mode);
        TerminalApp::new(scene, setup.camera().unwrap(), settings)
    }

    #[test]
    fn test_run_wireframe_prints_every_row() {
        let mut out = Vec::new();
        app(RenderMode::Wireframe).with_line_colors(LineColors::Cycle).run(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('\n').count(), 40);
        assert!(text.contains(plot::POINT_GLYPH));
    }

    #[test]
    fn test_run_raster_prints_every_row() {
        let mut out = Vec::new();
        app(RenderMode::Raster).run(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('\n').count(), 40);
    }
}
