//! Pixel to page unit conversion
//!
//! Page units ("grid" values) are 1/72 inch; pixel measurements are scaled by
//! the image resolution in dots per inch.

use crate::page::Rectangle;
use crate::{DEFAULT_RESOLUTION, GRID_PER_INCH};

/// Convert `value` pixels at `resolution` dpi to page units
///
/// `resolution` must be non-zero.
pub fn to_grid_value(value: f32, resolution: f32) -> f32 {
    debug_assert!(resolution != 0.0, "resolution must be non-zero");
    value * GRID_PER_INCH / resolution
}

/// Integer form of [`to_grid_value`], computed in floating point
pub fn pixels_to_grid(value: i32, resolution: i32) -> f32 {
    to_grid_value(value as f32, resolution as f32)
}

/// Convert `value` pixels at [`DEFAULT_RESOLUTION`] to page units
pub fn to_grid_value_default(value: f32) -> f32 {
    to_grid_value(value, DEFAULT_RESOLUTION as f32)
}

/// Page-unit rectangle at the origin for an image of `width` x `height` pixels
///
/// The width is scaled by `x_resolution` and the height by `y_resolution`.
pub fn make_grid_rectangle(
    width: i32,
    height: i32,
    x_resolution: i32,
    y_resolution: i32,
) -> Rectangle {
    Rectangle::new(
        pixels_to_grid(width, x_resolution),
        pixels_to_grid(height, y_resolution),
    )
}

/// [`make_grid_rectangle`] at [`DEFAULT_RESOLUTION`] on both axes
pub fn make_grid_rectangle_default(width: i32, height: i32) -> Rectangle {
    let resolution = DEFAULT_RESOLUTION as i32;
    make_grid_rectangle(width, height, resolution, resolution)
}
