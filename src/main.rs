//! vblank3d host runner
//!
//! Runs the frame loop against the simulated display and shows the visible
//! buffer in a window, scaled up with nearest filtering.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info, warn};
use macroquad::prelude::*;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;

use vblank3d::camera::KeyMask;
use vblank3d::display::DisplayController;
use vblank3d::frame::{FrameLoop, FrameOutcome};
use vblank3d::hw::SimulatedBus;
use vblank3d::rasterizer::{PixelBuffer, Rgb15};
use vblank3d::world::{load_config, SceneConfig};
use vblank3d::{SCREEN_HEIGHT, SCREEN_WIDTH};

#[derive(Parser)]
#[command(name = "vblank3d")]
#[command(version, about = "Camera-relative 3D scene on a simulated 240x160 display", long_about = None)]
struct Cli {
    /// Scene file (RON); the built-in reference scene if omitted
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Where F12 screenshots are written
    #[arg(long, default_value = "screenshots")]
    screenshot_dir: PathBuf,

    /// Window size as a multiple of the display resolution
    #[arg(long, default_value_t = 3)]
    scale: u32,
}

fn window_conf(scale: u32) -> Conf {
    let scale = scale.max(1) as i32;
    Conf {
        window_title: format!("vblank3d v{}", VERSION),
        window_width: SCREEN_WIDTH as i32 * scale,
        window_height: SCREEN_HEIGHT as i32 * scale,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .compact()
        .finish()
        .init();
}

/// Keyboard state as a pressed-button mask (1 = held)
fn keyboard_mask() -> KeyMask {
    const BINDINGS: [(KeyCode, KeyMask); 11] = [
        (KeyCode::Up, KeyMask::UP),
        (KeyCode::Down, KeyMask::DOWN),
        (KeyCode::Left, KeyMask::LEFT),
        (KeyCode::Right, KeyMask::RIGHT),
        (KeyCode::Z, KeyMask::A),
        (KeyCode::X, KeyMask::B),
        (KeyCode::Enter, KeyMask::START),
        (KeyCode::RightShift, KeyMask::SELECT),
        (KeyCode::Backspace, KeyMask::SELECT),
        (KeyCode::A, KeyMask::L),
        (KeyCode::S, KeyMask::R),
    ];

    BINDINGS
        .iter()
        .filter(|(key, _)| is_key_down(*key))
        .fold(KeyMask::empty(), |mask, (_, button)| mask | *button)
}

fn to_rgba(fb: &PixelBuffer) -> Vec<u8> {
    fb.pixels.iter().flat_map(|&p| Rgb15(p).to_rgba8()).collect()
}

fn save_screenshot(dir: &Path, frame: u64, rgba: Vec<u8>) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        error!("cannot create {}: {}", dir.display(), e);
        return;
    }
    let path = dir.join(format!("frame_{:06}.png", frame));
    let Some(img) = image::RgbaImage::from_raw(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, rgba) else {
        error!("screenshot buffer has the wrong size");
        return;
    };
    match img.save(&path) {
        Ok(()) => info!("saved {}", path.display()),
        Err(e) => error!("failed to save {}: {}", path.display(), e),
    }
}

fn load_scene(cli: &Cli) -> SceneConfig {
    let Some(path) = &cli.scene else {
        info!("no scene given, using the reference scene");
        return SceneConfig::default();
    };
    match load_config(path) {
        Ok(config) => {
            info!("loaded {} ({} objects)", path.display(), config.objects.len());
            config
        }
        Err(e) => {
            warn!("failed to load {}: {}; using the reference scene", path.display(), e);
            SceneConfig::default()
        }
    }
}

async fn run(cli: Cli) {
    let config = load_scene(&cli);
    let mut frame_loop = FrameLoop::new(&config);
    let mut display = DisplayController::new(SimulatedBus::new().with_trace(false));
    display.init_bitmap_mode();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        display.bus_mut().set_pressed(keyboard_mask().bits());

        match frame_loop.tick(&mut display) {
            Ok(FrameOutcome::Presented { .. }) => {}
            Ok(FrameOutcome::Quit) => break,
            Err(e) => {
                error!("present failed: {}", e);
                break;
            }
        }

        let rgba = to_rgba(&display.bus().visible_frame());
        let texture = Texture2D::from_rgba8(SCREEN_WIDTH as u16, SCREEN_HEIGHT as u16, &rgba);
        texture.set_filter(FilterMode::Nearest);

        if is_key_pressed(KeyCode::F12) {
            save_screenshot(&cli.screenshot_dir, frame_loop.frames(), rgba);
        }

        // letterbox to the display aspect ratio
        let scale = (screen_width() / SCREEN_WIDTH as f32).min(screen_height() / SCREEN_HEIGHT as f32);
        let draw_w = SCREEN_WIDTH as f32 * scale;
        let draw_h = SCREEN_HEIGHT as f32 * scale;

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            (screen_width() - draw_w) / 2.0,
            (screen_height() - draw_h) / 2.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        next_frame().await;
    }

    info!("stopped after {} frames", frame_loop.frames());
}

fn main() {
    let cli = Cli::parse();
    setup_logging();
    macroquad::Window::from_config(window_conf(cli.scale), run(cli));
}
