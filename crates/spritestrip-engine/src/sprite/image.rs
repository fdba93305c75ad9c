use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Rect;
use crate::error::{RenderError, Result};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`SpriteImage`].
///
/// Assigned at construction and shared by clones, so a clone draws from the
/// same cached texture as its original.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        ImageId(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// RGBA8 sprite sheet with a grid of animation cells.
///
/// `cell_texture_bounds` is indexed `[column][row]` and holds each cell's
/// rectangle in normalized texture space.
#[derive(Clone)]
pub struct SpriteImage {
    id: ImageId,
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,

    cell_wide: u32,
    cell_high: u32,
    cells_wide: u32,
    cells_high: u32,
    cell_texture_bounds: Vec<Vec<Rect>>,
}

impl SpriteImage {
    /// Single-cell image covering the whole bitmap.
    pub fn from_rgba8(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::from_sheet(width, height, pixels, width, height)
    }

    /// Sheet cut into a uniform grid of `cell_wide × cell_high` cells.
    ///
    /// Partial cells on the right/bottom edge are not addressable.
    pub fn from_sheet(
        width: u32,
        height: u32,
        pixels: impl Into<Arc<[u8]>>,
        cell_wide: u32,
        cell_high: u32,
    ) -> Result<Self> {
        let pixels = pixels.into();
        check_pixels(width, height, &pixels)?;

        if cell_wide == 0 || cell_high == 0 {
            return Err(RenderError::InvalidImage(format!(
                "cell size {cell_wide}x{cell_high} has a zero side"
            )));
        }
        let cells_wide = width / cell_wide;
        let cells_high = height / cell_high;
        if cells_wide == 0 || cells_high == 0 {
            return Err(RenderError::InvalidImage(format!(
                "cell size {cell_wide}x{cell_high} does not fit in {width}x{height}"
            )));
        }

        let inv_w = 1.0 / width as f32;
        let inv_h = 1.0 / height as f32;
        let cell_texture_bounds = (0..cells_wide)
            .map(|col| {
                (0..cells_high)
                    .map(|row| {
                        Rect::new(
                            (col * cell_wide) as f32,
                            (row * cell_high) as f32,
                            cell_wide as f32,
                            cell_high as f32,
                        )
                        .scaled(inv_w, inv_h)
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            id: ImageId::next(),
            width,
            height,
            pixels,
            cell_wide,
            cell_high,
            cells_wide,
            cells_high,
            cell_texture_bounds,
        })
    }

    /// Sheet with caller-supplied cell rectangles (e.g. a packed atlas).
    ///
    /// `bounds` is `[column][row]`; every column must have the same length.
    /// `cell_wide`/`cell_high` give the on-screen quad size of every cell.
    pub fn with_cell_bounds(
        width: u32,
        height: u32,
        pixels: impl Into<Arc<[u8]>>,
        cell_wide: u32,
        cell_high: u32,
        bounds: Vec<Vec<Rect>>,
    ) -> Result<Self> {
        let pixels = pixels.into();
        check_pixels(width, height, &pixels)?;

        let cells_high = bounds.first().map_or(0, Vec::len);
        if cells_high == 0 {
            return Err(RenderError::InvalidImage("cell grid is empty".into()));
        }
        if bounds.iter().any(|col| col.len() != cells_high) {
            return Err(RenderError::InvalidImage("cell grid columns differ in length".into()));
        }
        if bounds.iter().flatten().any(|r| !r.is_finite()) {
            return Err(RenderError::InvalidImage("cell rectangle is not finite".into()));
        }

        Ok(Self {
            id: ImageId::next(),
            width,
            height,
            pixels,
            cell_wide,
            cell_high,
            cells_wide: bounds.len() as u32,
            cells_high: cells_high as u32,
            cell_texture_bounds: bounds,
        })
    }

    #[inline]
    pub fn id(&self) -> ImageId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed RGBA8 rows, top row first.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn cell_wide(&self) -> u32 {
        self.cell_wide
    }

    #[inline]
    pub fn cell_high(&self) -> u32 {
        self.cell_high
    }

    #[inline]
    pub fn cells_wide(&self) -> u32 {
        self.cells_wide
    }

    #[inline]
    pub fn cells_high(&self) -> u32 {
        self.cells_high
    }

    #[inline]
    pub fn cell_count(&self) -> u32 {
        self.cells_wide * self.cells_high
    }

    /// Half the on-screen cell size; quads span `±half` around the sprite origin.
    #[inline]
    pub fn half_cell_extents(&self) -> (f32, f32) {
        (self.cell_wide as f32 * 0.5, self.cell_high as f32 * 0.5)
    }

    /// Grid position `(column, row)` of animation cell `cell`.
    ///
    /// Indices past the last cell wrap, so a free-running frame counter loops
    /// the animation.
    #[inline]
    pub fn cell_position(&self, cell: u32) -> (u32, u32) {
        let cell = cell % self.cell_count();
        (cell % self.cells_wide, cell / self.cells_wide)
    }

    /// Normalized texture rectangle of animation cell `cell`.
    #[inline]
    pub fn cell_bounds(&self, cell: u32) -> Rect {
        let (col, row) = self.cell_position(cell);
        self.cell_texture_bounds[col as usize][row as usize]
    }
}

impl fmt::Debug for SpriteImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteImage")
            .field("id", &self.id)
            .field("size", &(self.width, self.height))
            .field("cell", &(self.cell_wide, self.cell_high))
            .field("grid", &(self.cells_wide, self.cells_high))
            .finish_non_exhaustive()
    }
}

fn check_pixels(width: u32, height: u32, pixels: &[u8]) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidImage(format!("image size {width}x{height} is empty")));
    }
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(RenderError::InvalidImage(format!(
            "{width}x{height} RGBA8 needs {expected} bytes, got {}",
            pixels.len()
        )));
    }
    Ok(())
}
