use winit::window::{Window, WindowId};

use crate::device::WgpuDevice;
use crate::render::Renderer;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// The window being drawn.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Drawing-buffer size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback borrow; `'w` is the window borrow held by the device.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub renderer: &'a mut Renderer<WgpuDevice<'w>>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'w> FrameCtx<'_, 'w> {
    /// Runs `draw` between `begin_frame` and `end_frame`, then presents.
    ///
    /// Surface loss and timeouts drop the frame; out-of-memory exits.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut Renderer<WgpuDevice<'w>>),
    {
        self.renderer.begin_frame();
        draw(&mut *self.renderer);
        self.window.window.pre_present_notify();

        match self.renderer.end_frame() {
            Ok(stats) => {
                log::trace!("frame {}: {stats:?}", self.time.frame_index);
                AppControl::Continue
            }
            Err(action) if action.is_fatal() => {
                log::error!("surface failure ({action:?}); exiting");
                AppControl::Exit
            }
            Err(action) => {
                log::debug!("frame {} dropped ({action:?})", self.time.frame_index);
                AppControl::Continue
            }
        }
    }
}
