//! Entry point for the scenerast demo.
//! Renders a demo scene once, to the terminal or to a PPM file.

use std::io::stdout;

use anyhow::{bail, Result};
use scenerast_core::{RenderMode, RenderOutput};
use scenerast_terminal::demo::{self, ArmParams, CameraSetup, CombinedParams};
use scenerast_terminal::{ppm, LineColors, TerminalApp};

fn arg_value(prefix: &str) -> Option<String> {
    std::env::args().filter_map(|arg| arg.strip_prefix(prefix).map(str::to_string)).last()
}

fn parse_mode_arg() -> RenderMode {
    // Accept: --mode=wireframe|raster
    match arg_value("--mode=").map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("raster") => RenderMode::Raster,
        Some("wireframe") | Some("lines") => RenderMode::Wireframe,
        Some(other) => {
            log::warn!("Unknown mode '{}', falling back to raster.", other);
            RenderMode::Raster
        }
    }
}

fn parse_view_arg() -> CameraSetup {
    // Accept: --view=1|2|3
    match arg_value("--view=") {
        None => CameraSetup::default(),
        Some(v) => v.parse::<u8>().ok().and_then(CameraSetup::view).unwrap_or_else(|| {
            log::warn!("Unknown view '{}', falling back to 1.", v);
            CameraSetup::default()
        }),
    }
}

fn parse_scene_arg() -> Result<demo::Scene> {
    let scene = match arg_value("--scene=").map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("combined") => demo::combined_scene(&CombinedParams::default())?,
        Some("arm") => demo::arm_scene(&ArmParams::default())?,
        Some(other) => {
            log::warn!("Unknown scene '{}', falling back to combined.", other);
            demo::combined_scene(&CombinedParams::default())?
        }
    };
    Ok(scene)
}

fn parse_line_colors_arg() -> LineColors {
    // Accept: --colors=surface|cycle
    match arg_value("--colors=").map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("surface") => LineColors::Surface,
        Some("cycle") => LineColors::Cycle,
        Some(other) => {
            log::warn!("Unknown line colors '{}', falling back to surface.", other);
            LineColors::Surface
        }
    }
}

fn parse_size_args(default: (usize, usize)) -> (usize, usize) {
    let mut w: Option<usize> = None;
    let mut h: Option<usize> = None;

    for arg in std::env::args() {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<usize>(), sh.parse::<usize>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            } else {
                log::warn!("Ignoring malformed size '{}'.", v);
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<usize>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<usize>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(default.0).max(1);
    let hh = h.unwrap_or(default.1).max(1);
    (ww, hh)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mode = parse_mode_arg();
    let mut setup = parse_view_arg();
    let (width, height) = parse_size_args((setup.width, setup.height));
    setup.width = width;
    setup.height = height;
    let scene = parse_scene_arg()?;
    let ppm_path = arg_value("--ppm=");

    log::info!(
        "Starting scenerast. Mode: {:?}, image_size={}x{}, eye={}",
        mode,
        width,
        height,
        setup.eye
    );

    let app = TerminalApp::new(scene, setup.camera()?, setup.settings(mode)).with_line_colors(parse_line_colors_arg());

    match ppm_path {
        Some(path) => {
            let RenderOutput::Image(frame) = app.render()? else {
                bail!("--ppm needs raster mode");
            };
            ppm::save_ppm(&path, &frame)?;
            log::info!("Wrote {}", path);
        }
        None => app.run(stdout().lock())?,
    }

    log::info!("Done.");
    Ok(())
}
