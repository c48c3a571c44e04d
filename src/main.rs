// What you SEE:
// • A dark "page" (the host surface) with fireworks bursting over it.
// • Space stops/starts the effect. H hides/shows the "tab" (bursts pause).
// • U swaps the palette through update_config. D detaches the host: the
//   effect notices on its next tick and tears itself down. ESC quits.
// • --frames N runs headless; --snapshot saves the last frame as PNG.

mod draw;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use draw::{Drawer, draw_text_5x7};
use fireworks_overlay::composite::composite;
use fireworks_overlay::gamma::GammaLut;
use fireworks_overlay::host::Element;
use fireworks_overlay::{
    Document, Error, Fireworks, FrameBuffer, HostHandle, HostSurface, PartialConfig, create,
};
use log::info;

const BACKGROUND: u32 = 0x00_10_12_1C; // visual: near-black blue page
const FRAME_MS: f64 = 1000.0 / 60.0;

const PALETTES: [&[&str]; 3] = [
    &["#ff3b3b", "#ff9f1c", "#ffd93d", "#6bffb8", "#46b3ff", "#b15eff"],
    &["gold", "orange", "#fff"],
    &["#46b3ff", "cyan", "#b15eff", "magenta"],
];

#[derive(Parser, Debug)]
#[command(name = "fireworks-demo", about = "Firework particle overlay demo")]
struct Cli {
    /// Host width in logical pixels
    #[arg(long, default_value_t = 800)]
    width: usize,

    /// Host height in logical pixels
    #[arg(long, default_value_t = 500)]
    height: usize,

    /// Partial configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force the per-element renderer
    #[arg(long)]
    no_canvas: bool,

    /// Seed for reproducible bursts
    #[arg(long)]
    seed: Option<u64>,

    /// Device pixel ratio for the canvas backing store
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Run this many frames without a window
    #[arg(long)]
    frames: Option<u32>,

    /// Save the last composited frame as an image
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` still wins; `-v` only moves the default.
fn init_logging(verbose: u8) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity_filter(verbose)),
    )
    .init();
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    /* --- Config: file overlay + CLI overrides --- */
    let mut partial = match &cli.config {
        Some(path) => PartialConfig::load(path)?,
        None => PartialConfig::default(),
    };
    if cli.no_canvas {
        partial.use_canvas = Some(false);
    }

    /* --- The "page": one document, one host with some content ---
       Visual: nothing yet, the effect inserts its layer under the content. */
    let doc = Document::new();
    doc.set_device_pixel_ratio(cli.dpr);
    let host = HostSurface::new(doc.clone(), cli.width as f32, cli.height as f32).into_handle();
    host.borrow_mut().append(Element::new("page-content"));

    let mut fx = match cli.seed {
        Some(seed) => Fireworks::with_seed(host.clone(), &partial, seed),
        None => create(host.clone(), &partial),
    };
    info!("renderer: {:?}", fx.renderer_kind());

    let mut screen = FrameBuffer::new(cli.width, cli.height);
    let lut = GammaLut::new();

    match cli.frames {
        Some(frames) => run_headless(&mut fx, &host, &lut, &mut screen, frames),
        None => run_window(&mut fx, &host, &doc, &lut, &mut screen, &partial)?,
    }

    if let Some(path) = &cli.snapshot {
        save_snapshot(&screen, path)?;
        info!("snapshot written to {}", path.display());
    }

    fx.destroy();
    Ok(())
}

/// Simulated 60 Hz display, no window.
fn run_headless(
    fx: &mut Fireworks,
    host: &HostHandle,
    lut: &GammaLut,
    screen: &mut FrameBuffer,
    frames: u32,
) {
    for i in 0..frames {
        fx.animation_frame(i as f64 * FRAME_MS);
    }
    composite(&host.borrow(), fx, BACKGROUND, lut, screen);
    println!("{} frames, {} live particles", frames, fx.particle_count());
}

fn run_window(
    fx: &mut Fireworks,
    host: &HostHandle,
    doc: &Document,
    lut: &GammaLut,
    screen: &mut FrameBuffer,
    base: &PartialConfig,
) -> Result<(), Error> {
    let mut drawer = Drawer::new("Fireworks Overlay", screen.width, screen.height)?;
    let started = Instant::now();
    let mut palette = 0usize;

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Inputs */
        if drawer.space_pressed_once() {
            if fx.is_running() { fx.stop() } else { fx.start() }
        }
        if drawer.h_pressed_once() {
            doc.set_hidden(!doc.is_hidden()); // visual: bursts pause, sparks freeze
        }
        if drawer.d_pressed_once() {
            host.borrow_mut().detach(); // visual: screen goes blank on the next tick
        }
        if drawer.u_pressed_once() {
            palette = (palette + 1) % PALETTES.len();
            fx.update_config(&PartialConfig {
                colors: Some(PALETTES[palette].iter().map(|c| c.to_string()).collect()),
                ..base.clone()
            });
        }

        /* 2) Let the effect see this display refresh */
        fx.animation_frame(now.duration_since(started).as_secs_f64() * 1000.0);

        /* 3) Flatten host + effect, then HUD on top */
        composite(&host.borrow(), fx, BACKGROUND, lut, screen);
        let state = if fx.is_destroyed() {
            "DESTROYED"
        } else if fx.is_running() {
            "RUN"
        } else {
            "STOP"
        };
        let hud = format!(
            "{} | {} | {} | P: {} | {}",
            fx.renderer_kind().map(|k| format!("{k:?}")).unwrap_or_else(|| "-".into()),
            state,
            if doc.is_hidden() { "HIDDEN" } else { "VISIBLE" },
            fx.particle_count(),
            hud_fps_text
        );
        draw_text_5x7(screen, 8, 8, &hud, 0x00_FF_FF_FF);
        draw_text_5x7(screen, 8, 20, "SPACE STOP | H HIDE | U PALETTE | D DETACH", 0x00_88_88_88);

        /* 4) Present */
        drawer.present(screen)?;

        /* 5) FPS counter */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            hud_fps_text = format!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }
    Ok(())
}

fn save_snapshot(screen: &FrameBuffer, path: &Path) -> Result<(), Error> {
    let img = image::RgbImage::from_fn(screen.width as u32, screen.height as u32, |x, y| {
        let p = screen.get(x as usize, y as usize).unwrap_or(0);
        image::Rgb([(p >> 16) as u8, (p >> 8) as u8, p as u8])
    });
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enables(filter: &str, level: Level) -> bool {
        let logger = env_logger::Builder::new().parse_filters(filter).build();
        logger.enabled(&Metadata::builder().level(level).target("fireworks_overlay").build())
    }

    #[test]
    fn verbosity_raises_the_default_filter() {
        assert!(enables(verbosity_filter(0), Level::Warn));
        assert!(!enables(verbosity_filter(0), Level::Info));
        assert!(enables(verbosity_filter(1), Level::Info));
        assert!(!enables(verbosity_filter(1), Level::Debug));
        assert!(enables(verbosity_filter(2), Level::Debug));
        assert!(enables(verbosity_filter(5), Level::Trace));
    }

    #[test]
    fn snapshot_reads_frame_pixels() {
        let mut fb = FrameBuffer::new(3, 2);
        fb.pixels[4] = 0x0012_3456;
        let path = std::env::temp_dir().join("fireworks-demo-snapshot-test.png");
        save_snapshot(&fb, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(1, 1).0, [0x12, 0x34, 0x56]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        let _ = std::fs::remove_file(&path);
    }
}
