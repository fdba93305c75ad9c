//! Renderer error kinds.
//!
//! Initialization errors (`DeviceUnavailable`, `ShaderCompileFailed`,
//! `ProgramLinkFailed`, `InvalidConfig`) are fatal: the renderer is never constructed.
//! Per-draw errors (`TextureTooLarge`, `BatchOverflow`) skip only the draw that
//! raised them and leave render state usable for the next call.

use thiserror::Error;

use crate::render::ProgramKind;

#[derive(Debug, Error)]
pub enum RenderError {
    /// No usable adapter/surface, or the device lacks a required capability.
    #[error("graphics device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("{program:?} shader failed to compile: {message}")]
    ShaderCompileFailed { program: ProgramKind, message: String },

    #[error("{program:?} program failed to link: {message}")]
    ProgramLinkFailed { program: ProgramKind, message: String },

    #[error("texture {width}x{height} exceeds the device maximum of {max} pixels per side")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("batch of {requested} sprites exceeds the limit of {max}")]
    BatchOverflow { requested: usize, max: usize },

    /// Renderer settings the device cannot honor.
    #[error("invalid renderer config: {0}")]
    InvalidConfig(String),

    /// Pixel data or cell grid inconsistent with the declared image size.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl RenderError {
    /// True for errors that prevent the renderer from existing at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RenderError::DeviceUnavailable(_)
                | RenderError::ShaderCompileFailed { .. }
                | RenderError::ProgramLinkFailed { .. }
                | RenderError::InvalidConfig(_)
        )
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
