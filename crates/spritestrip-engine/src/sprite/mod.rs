//! Source images and per-sprite draw descriptors.
//!
//! An image is a sprite sheet: one RGBA8 bitmap subdivided into a grid of
//! equally sized animation cells. Cell lookups are read-only and happen once
//! per sprite per batch.

mod descriptor;
mod image;

pub use descriptor::SpriteDescriptor;
pub use image::{ImageId, SpriteImage};
