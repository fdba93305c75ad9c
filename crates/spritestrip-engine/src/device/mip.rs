//! CPU mip chain for uploaded sprite images.

use std::borrow::Cow;

/// One level of a mip chain, RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MipLevel<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: Cow<'a, [u8]>,
}

/// Levels down to 1×1: `floor(log2(max(w, h))) + 1`.
#[inline]
pub(crate) fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Full chain; level 0 borrows `pixels`.
pub(crate) fn mip_chain(width: u32, height: u32, pixels: &[u8]) -> Vec<MipLevel<'_>> {
    let count = mip_level_count(width, height) as usize;
    let mut levels = Vec::with_capacity(count);
    levels.push(MipLevel {
        width,
        height,
        pixels: Cow::Borrowed(pixels),
    });

    while levels.len() < count {
        let Some(prev) = levels.last() else { break };
        let next = downsample(prev.width, prev.height, &prev.pixels);
        levels.push(next);
    }
    levels
}

/// 2×2 box filter. Odd edges clamp; color is alpha-weighted so fully
/// transparent texels do not darken sprite borders.
fn downsample(width: u32, height: u32, src: &[u8]) -> MipLevel<'static> {
    let (w, h) = ((width / 2).max(1), (height / 2).max(1));
    let mut out = vec![0u8; (w * h * 4) as usize];

    let texel = |x: u32, y: u32| {
        let i = ((y.min(height - 1) * width + x.min(width - 1)) * 4) as usize;
        [src[i] as u32, src[i + 1] as u32, src[i + 2] as u32, src[i + 3] as u32]
    };

    for y in 0..h {
        for x in 0..w {
            let quad = [
                texel(2 * x, 2 * y),
                texel(2 * x + 1, 2 * y),
                texel(2 * x, 2 * y + 1),
                texel(2 * x + 1, 2 * y + 1),
            ];
            let alpha: u32 = quad.iter().map(|t| t[3]).sum();

            let i = ((y * w + x) * 4) as usize;
            for c in 0..3 {
                out[i + c] = if alpha == 0 {
                    (quad.iter().map(|t| t[c]).sum::<u32>() / 4) as u8
                } else {
                    (quad.iter().map(|t| t[c] * t[3]).sum::<u32>() / alpha) as u8
                };
            }
            out[i + 3] = (alpha / 4) as u8;
        }
    }

    MipLevel {
        width: w,
        height: h,
        pixels: Cow::Owned(out),
    }
}
