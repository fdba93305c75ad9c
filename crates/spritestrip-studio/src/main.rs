//! Bouncing-sprite stress demo.
//!
//! Each frame draws a solid header band, one batch of `--sprites` animated
//! sprites and a single rotating image, and logs frame stats once a second.

mod bouncer;
mod sheet;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use spritestrip_engine::coords::ColorRgba;
use spritestrip_engine::core::{App, AppControl, FrameCtx};
use spritestrip_engine::device::GpuInit;
use spritestrip_engine::logging::{LoggingConfig, init_logging};
use spritestrip_engine::sprite::SpriteImage;
use spritestrip_engine::time::RateMeter;
use spritestrip_engine::window::{Runtime, RuntimeConfig};
use spritestrip_engine::{MAX_SPRITES, OverflowPolicy, RendererConfig};

use bouncer::{Bouncer, Rng};

const HEADER_HEIGHT: f32 = 32.0;

#[derive(Parser, Debug)]
#[command(name = "spritestrip-studio", about = "Sprite batching stress demo")]
struct Args {
    /// Number of bouncing sprites
    #[arg(short = 'n', long, default_value_t = 75_000)]
    sprites: usize,

    /// PNG/JPEG sprite sheet; a generated ball strip is used when omitted
    #[arg(long, value_name = "FILE")]
    sheet: Option<PathBuf>,

    /// Cell size in pixels
    #[arg(long, default_value_t = 32)]
    cell: u32,

    /// Frames in the generated strip
    #[arg(long, default_value_t = 8)]
    frames: u32,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Fail the batch instead of truncating past the sprite cap
    #[arg(long)]
    reject_overflow: bool,

    /// env_logger filter, e.g. "info,spritestrip_engine=debug"
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,

    #[arg(long)]
    seed: Option<u32>,
}

struct Studio {
    sheet: SpriteImage,
    ring: SpriteImage,
    bouncers: Vec<Bouncer>,
    rng: Rng,
    meter: RateMeter,
    ring_angle: f32,
    paused: bool,
    /// Last drawing-buffer size; new sprites spawn inside it.
    bounds: (f32, f32),
}

impl Studio {
    fn new(sheet: SpriteImage, ring: SpriteImage, count: usize, seed: u32, width: f32, height: f32) -> Self {
        let mut rng = Rng::new(seed);
        let bouncers = (0..count)
            .map(|_| Bouncer::spawn(&mut rng, width, height))
            .collect();
        Self {
            sheet,
            ring,
            bouncers,
            rng,
            meter: RateMeter::new(Duration::from_secs(1)),
            ring_angle: 0.0,
            paused: false,
            bounds: (width, height),
        }
    }

    fn resize_population(&mut self, count: usize) {
        let (width, height) = self.bounds;
        if count < self.bouncers.len() {
            self.bouncers.truncate(count);
        } else {
            let rng = &mut self.rng;
            let extra = count - self.bouncers.len();
            self.bouncers
                .extend((0..extra).map(|_| Bouncer::spawn(rng, width, height)));
        }
        log::info!("{} sprites", self.bouncers.len());
    }
}

impl App for Studio {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed {
            return AppControl::Continue;
        }

        let n = self.bouncers.len();
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => return AppControl::Exit,
            Key::Named(NamedKey::Space) => self.paused = !self.paused,
            // up to twice the cap, so truncation can be watched
            Key::Character(c) if matches!(c.as_str(), "+" | "=") => {
                self.resize_population((n + 10_000).min(2 * MAX_SPRITES))
            }
            Key::Character(c) if c.as_str() == "-" => {
                self.resize_population(n.saturating_sub(10_000))
            }
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (w, h) = ctx.window.physical_size();
        let (w, h) = (w as f32, h as f32);
        self.bounds = (w, h);
        let dt = if self.paused { 0.0 } else { ctx.time.dt };

        for b in &mut self.bouncers {
            b.update(dt, w, h);
        }
        self.ring_angle = (self.ring_angle + dt) % std::f32::consts::TAU;

        let Self {
            sheet,
            ring,
            bouncers,
            ring_angle,
            ..
        } = &*self;

        let control = ctx.render(|r| {
            let sprites: Vec<_> = bouncers.iter().map(|b| b.descriptor(sheet)).collect();
            // failures are logged by the renderer
            let _ = r.draw_batch(&sprites, sheet);

            r.fill_rect(0.0, 0.0, w, HEADER_HEIGHT, ColorRgba::new(0.1, 0.1, 0.15, 1.0));
            r.fill_rect(0.0, HEADER_HEIGHT - 2.0, w, 2.0, ColorRgba::new(0.9, 0.6, 0.1, 1.0));

            let _ = r.draw_image(w * 0.5, h * 0.5, ring, *ring_angle, 2.0);
        });

        if let Some(sample) = self.meter.record(Instant::now()) {
            let stats = ctx.renderer.frame_stats();
            log::info!(
                "{:.1} fps ({:.2} ms), {} sprites, {} draws, {} uploads, {} switches",
                sample.fps,
                sample.frame_ms,
                stats.sprites,
                stats.draw_calls,
                stats.texture_uploads,
                stats.program_switches,
            );
            ctx.runtime.set_title(format!(
                "spritestrip studio | {} sprites | {:.0} fps",
                stats.sprites, sample.fps
            ));
        }

        control
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(match &args.log {
        Some(filter) => LoggingConfig::with_filter(filter),
        None => LoggingConfig::default(),
    });

    let sheet = match &args.sheet {
        Some(path) => sheet::load(path, args.cell)?,
        None => sheet::generate_balls(args.cell, args.frames.max(1))?,
    };
    let ring = sheet::generate_ring(64)?;

    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(1)
    });

    let renderer = RendererConfig {
        overflow: if args.reject_overflow {
            OverflowPolicy::Reject
        } else {
            OverflowPolicy::Truncate
        },
        ..RendererConfig::default()
    };

    let studio = Studio::new(
        sheet,
        ring,
        args.sprites,
        seed,
        args.width as f32,
        args.height as f32,
    );

    Runtime::run(
        RuntimeConfig {
            title: "spritestrip studio".to_string(),
            initial_size: LogicalSize::new(args.width as f64, args.height as f64),
            renderer,
        },
        GpuInit::default(),
        studio,
    )
}
