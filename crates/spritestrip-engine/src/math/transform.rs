//! 3×3 affine matrices for 2D drawing.
//!
//! Column-vector convention: a point maps as `M * (x, y, 1)`, so in
//! `multiply(a, b)` the right-hand matrix is applied first.
//!
//! The shaders consume these as WGSL `mat3x3<f32>` uniforms, where each column
//! occupies a 16-byte slot; see [`to_uniform_cols`].

use glam::{Mat3, Vec2, Vec3};

use crate::coords::Viewport;

/// Maps drawing-buffer pixels (origin top-left, +Y down) to clip space.
pub fn make_projection(width: f32, height: f32) -> Mat3 {
    let vp = Viewport::new(width, height).non_degenerate();
    Mat3::from_cols(
        Vec3::new(2.0 / vp.width, 0.0, 0.0),
        Vec3::new(0.0, -2.0 / vp.height, 0.0),
        Vec3::new(-1.0, 1.0, 1.0),
    )
}

#[inline]
pub fn make_translation(x: f32, y: f32) -> Mat3 {
    Mat3::from_translation(Vec2::new(x, y))
}

#[inline]
pub fn make_rotation(angle: f32) -> Mat3 {
    Mat3::from_angle(angle)
}

#[inline]
pub fn make_scale(sx: f32, sy: f32) -> Mat3 {
    Mat3::from_scale(Vec2::new(sx, sy))
}

/// `a · b`. Not commutative.
#[inline]
pub fn multiply(a: Mat3, b: Mat3) -> Mat3 {
    a * b
}

/// Model matrix for a single image: `translation · (rotation · scale)`.
///
/// Rotation and scale are composed first and the result translated; the image
/// shader relies on exactly this order.
pub fn model_matrix(x: f32, y: f32, angle: f32, scale: f32) -> Mat3 {
    let rotation_scale = multiply(make_rotation(angle), make_scale(scale, scale));
    multiply(make_translation(x, y), rotation_scale)
}

/// Column-major columns, each padded to four floats (WGSL uniform layout).
pub fn to_uniform_cols(m: Mat3) -> [[f32; 4]; 3] {
    let c = m.to_cols_array_2d();
    [
        [c[0][0], c[0][1], c[0][2], 0.0],
        [c[1][0], c[1][1], c[1][2], 0.0],
        [c[2][0], c[2][1], c[2][2], 0.0],
    ]
}
