use std::path::Path;

use anyhow::{Context, Result};
use spritestrip_engine::sprite::SpriteImage;

/// Loads a sprite sheet cut into `cell`×`cell` cells.
pub fn load(path: &Path, cell: u32) -> Result<SpriteImage> {
    let rgba = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let sheet = SpriteImage::from_sheet(width, height, rgba.into_raw(), cell, cell)
        .with_context(|| format!("{} is not a valid {cell}px sheet", path.display()))?;
    log::info!(
        "loaded {} ({width}x{height}, {} cells)",
        path.display(),
        sheet.cell_count()
    );
    Ok(sheet)
}

/// Animation strip of `frames` cells: a ball whose highlight orbits once
/// over the strip.
pub fn generate_balls(cell: u32, frames: u32) -> Result<SpriteImage> {
    let (width, height) = (cell * frames, cell);
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    let r = cell as f32 * 0.5;

    for frame in 0..frames {
        let phase = frame as f32 / frames as f32 * std::f32::consts::TAU;
        let (hx, hy) = (r + phase.cos() * r * 0.45, r + phase.sin() * r * 0.45);
        let base = hue(frame as f32 / frames as f32);

        for y in 0..cell {
            for x in 0..cell {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let d = ((px - r).powi(2) + (py - r).powi(2)).sqrt();
                if d > r - 0.5 {
                    continue;
                }
                let glow = 1.0 - (((px - hx).powi(2) + (py - hy).powi(2)).sqrt() / r).min(1.0);
                let shade = 0.45 + 0.55 * glow;

                let i = (((y * width) + frame * cell + x) * 4) as usize;
                pixels[i] = (base[0] * shade * 255.0) as u8;
                pixels[i + 1] = (base[1] * shade * 255.0) as u8;
                pixels[i + 2] = (base[2] * shade * 255.0) as u8;
                pixels[i + 3] = 255;
            }
        }
    }

    Ok(SpriteImage::from_sheet(width, height, pixels, cell, cell)?)
}

/// Single-cell ring, drawn with `draw_image`.
pub fn generate_ring(size: u32) -> Result<SpriteImage> {
    let mut pixels = vec![0u8; (size * size * 4) as usize];
    let r = size as f32 * 0.5;

    for y in 0..size {
        for x in 0..size {
            let d = ((x as f32 + 0.5 - r).powi(2) + (y as f32 + 0.5 - r).powi(2)).sqrt();
            // notch at the top so rotation is visible
            let notch = y < size / 4 && (x as f32 - r).abs() < r * 0.15;
            if d > r - 1.0 || d < r * 0.7 || notch {
                continue;
            }
            let i = ((y * size + x) * 4) as usize;
            pixels[i..i + 4].copy_from_slice(&[240, 240, 255, 255]);
        }
    }

    Ok(SpriteImage::from_rgba8(size, size, pixels)?)
}

fn hue(t: f32) -> [f32; 3] {
    let channel = |offset: f32| {
        let k = (t * 6.0 + offset) % 6.0;
        1.0 - (k.min(4.0 - k).clamp(0.0, 1.0))
    };
    [channel(5.0), channel(3.0), channel(1.0)]
}
