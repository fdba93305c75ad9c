use crate::device::{DeviceContext, TextureHandle};
use crate::error::{RenderError, Result};
use crate::sprite::{ImageId, SpriteImage};

#[derive(Debug, Copy, Clone)]
struct CachedTexture {
    handle: TextureHandle,
    image: ImageId,
}

/// Outcome of [`TextureCache::ensure_bound`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureBinding {
    pub handle: TextureHandle,
    /// True when this call created the texture; the caller must then refresh
    /// the sampler and projection uniforms.
    pub uploaded: bool,
}

/// Single-slot texture cache keyed by image identity.
#[derive(Debug, Default)]
pub struct TextureCache {
    slot: Option<CachedTexture>,
    uploads: u64,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `image`'s texture is bound to unit 0, uploading it on an
    /// identity change. A replaced texture is released.
    ///
    /// Oversized images fail with `TextureTooLarge` and leave the slot as it was.
    pub fn ensure_bound<D: DeviceContext>(
        &mut self,
        device: &mut D,
        image: &SpriteImage,
    ) -> Result<TextureBinding> {
        if let Some(cached) = self.slot.filter(|c| c.image == image.id()) {
            return Ok(TextureBinding {
                handle: cached.handle,
                uploaded: false,
            });
        }

        let max = device.capabilities().max_texture_dimension;
        if image.width() > max || image.height() > max {
            log::warn!(
                "image {}x{} exceeds max texture size {max}; draw skipped",
                image.width(),
                image.height()
            );
            return Err(RenderError::TextureTooLarge {
                width: image.width(),
                height: image.height(),
                max,
            });
        }

        let handle = device.upload_texture(image)?;
        device.bind_texture(0, Some(handle));

        let replaced = self.slot.replace(CachedTexture {
            handle,
            image: image.id(),
        });
        if let Some(old) = replaced {
            device.release_texture(old.handle);
        }

        self.uploads += 1;
        log::debug!("uploaded texture {handle:?} ({}x{})", image.width(), image.height());

        Ok(TextureBinding {
            handle,
            uploaded: true,
        })
    }

    /// Forgets the cached texture, unbinding and releasing it.
    pub fn invalidate<D: DeviceContext>(&mut self, device: &mut D) {
        if let Some(old) = self.slot.take() {
            device.bind_texture(0, None);
            device.release_texture(old.handle);
        }
    }

    /// Identity of the image whose texture is bound.
    pub fn current(&self) -> Option<ImageId> {
        self.slot.map(|c| c.image)
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads
    }
}
