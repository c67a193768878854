//! Contains the Domain struct, which describes a rectangle on the
//! complex plane, and the linear mapping from a pixel grid onto it.
//! The coordinator and every worker go through the same mapping so
//! that strips line up without seams.
use num::Complex;

use error::{RenderError, Result};

/// Describes the x, y of a pixel in a grid whose origin is at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The rectangle of the complex plane being rendered, treating the
/// real part as the x-component and the imaginary part as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Domain {
    /// Left edge.
    pub x_min: f64,
    /// Bottom edge; row 0 of the image.
    pub y_min: f64,
    /// Right edge.
    pub x_max: f64,
    /// Top edge.
    pub y_max: f64,
}

impl Domain {
    /// Constructor.  Takes the four edges in (x_min, y_min, x_max,
    /// y_max) order and refuses rectangles that are empty, inverted, or
    /// not finite.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Domain> {
        let edges = [x_min, y_min, x_max, y_max];
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(RenderError::Config(
                "domain edges must be finite numbers".to_string(),
            ));
        }

        if x_max <= x_min {
            return Err(RenderError::Config(
                "The left edge is not to the left of the right edge.".to_string(),
            ));
        }

        if y_max <= y_min {
            return Err(RenderError::Config(
                "The lower edge is not below the upper edge.".to_string(),
            ));
        }

        Ok(Domain {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Builds the domain from its left-lower and right-upper corners.
    pub fn from_corners(leftlower: Complex<f64>, rightupper: Complex<f64>) -> Result<Domain> {
        Domain::new(leftlower.re, leftlower.im, rightupper.re, rightupper.im)
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Linear interpolation of pixel index `p` out of `count` pixels onto
/// `[lo, hi)`.  Every plane coordinate in the crate is derived with
/// this one function.
#[inline]
pub fn lerp(lo: f64, hi: f64, p: usize, count: usize) -> f64 {
    lo + (hi - lo) * (p as f64) / (count as f64)
}

/// Given a pixel on a `width` by `height` grid laid over the rectangle
/// (x0, y0)-(x1, y1), return the complex number under it.
#[inline]
pub fn pixel_to_point(
    pixel: Pixel,
    (x0, y0, x1, y1): (f64, f64, f64, f64),
    width: usize,
    height: usize,
) -> Complex<f64> {
    Complex::new(lerp(x0, x1, pixel.0, width), lerp(y0, y1, pixel.1, height))
}
