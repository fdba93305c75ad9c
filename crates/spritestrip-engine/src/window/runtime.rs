use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::RendererConfig;
use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{GpuInit, WgpuDevice};
use crate::error::RenderError;
use crate::render::Renderer;
use crate::time::FrameClock;

/// Window and renderer configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub renderer: RendererConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "spritestrip".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            renderer: RendererConfig::default(),
        }
    }
}

/// Requests from the app, applied after the frame callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    SetTitle(String),
    Exit,
}

/// Entry point: one window, one renderer, continuous redraw.
pub struct Runtime;

impl Runtime {
    /// Runs until the window closes or the app exits.
    ///
    /// Renderer initialization failures end the loop and are returned.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: CoreApp + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
            init_error: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.init_error {
            Some(err) => Err(err).context("renderer initialization failed"),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    renderer: Renderer<WgpuDevice<'this>>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    init_error: Option<RenderError>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let renderer_config = self.config.renderer.clone();

        let built = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            renderer_builder: |w| {
                let device = WgpuDevice::create(w, gpu_init)?;
                Renderer::initialize(device, renderer_config)
            },
        }
        .try_build();

        match built {
            Ok(entry) => {
                self.entry = Some(entry);
                Ok(())
            }
            Err(err) => {
                let msg = err.to_string();
                self.init_error = Some(err);
                anyhow::bail!(msg)
            }
        }
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, ctx: RuntimeCtx) {
        for cmd in ctx.commands {
            match cmd {
                Command::SetTitle(title) => {
                    if let Some(entry) = self.entry.as_ref() {
                        entry.with_window(|w| w.set_title(&title));
                    }
                }
                Command::Exit => self.exit_requested = true,
            }
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId) {
        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        let mut runtime_ctx = RuntimeCtx::default();
        let control = entry.with_mut(|fields| {
            let time = fields.clock.tick();
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: fields.window,
                },
                renderer: fields.renderer,
                time,
                runtime: &mut runtime_ctx,
            };
            app.on_frame(&mut ctx)
        });

        if control == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.apply_commands(event_loop, runtime_ctx);
    }

    fn resize_to_window(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            let size = entry.with_window(|w| w.inner_size());
            entry.with_renderer_mut(|r| r.resize(size.width, size.height));
            entry.with_window(|w| w.request_redraw());
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                self.exit_requested = true;
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.resize_to_window();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),
            _ => {}
        }
    }
}
