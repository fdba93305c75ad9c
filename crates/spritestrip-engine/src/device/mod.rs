//! Graphics device layer.
//!
//! [`DeviceContext`] is the seam the renderer draws through. Two backends:
//! - [`WgpuDevice`]: wgpu surface, pipelines and textures for a window
//! - `HeadlessDevice`: records commands; compiled for tests only

mod context;
mod error;
mod frame;
mod gpu;
#[cfg(test)]
mod headless;
mod mip;
mod surface;
mod wgpu_device;

pub use context::{
    AttributeHandle, DeviceCapabilities, DeviceContext, ProgramHandle, TextureHandle,
    UniformHandle, UniformSlot, UniformValue,
};
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::{Gpu, GpuInit};
#[cfg(test)]
pub use headless::{DeviceCommand, HeadlessDevice};
pub use wgpu_device::WgpuDevice;
