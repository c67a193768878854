// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel.
//!
//! A point `c` is iterated through `z = z * z + c` starting from zero.
//! Points whose orbit stays inside the radius-2 circle for the whole
//! iteration budget are taken to be inside the Mandelbrot set and are
//! painted black; everything else is painted a grey equal to the
//! number of iterations it took to escape, modulo 256.

extern crate crossbeam;

use itertools::iproduct;
use num::Complex;

use error::{RenderError, Result};
use planes::{pixel_to_point, Pixel};

/// One 24-bit colour, in red, green, blue order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A rectangle of the plane as (x0, y0, x1, y1).
pub type Bounds = (f64, f64, f64, f64);

/// Colour of points inside the set.
pub const BLACK: Rgb = Rgb(0, 0, 0);

/// The pixels of one strip, row-major, top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBlock {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub rows: usize,
    /// `width * rows` colours.
    pub pixels: Vec<Rgb>,
}

impl PixelBlock {
    /// Iterates over the block one row at a time.
    pub fn rows(&self) -> ::std::slice::Chunks<'_, Rgb> {
        self.pixels.chunks(self.width.max(1))
    }
}

/// Number of iterations before the orbit of `c` leaves the circle of
/// radius 2, or `max_iter` if it never does.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iter: u32) -> u32 {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    let mut n = 0;
    while n < max_iter && z.norm_sqr() <= 4.0 {
        z = z * z + c;
        n += 1;
    }
    n
}

/// Maps an iteration count to a colour.
#[inline]
pub fn colour(n: u32, max_iter: u32) -> Rgb {
    if n >= max_iter {
        BLACK
    } else {
        let v = (n % 256) as u8;
        Rgb(v, v, v)
    }
}

// Fills `out` with rows `row_start..` of a `width` by `height` grid laid
// over `bounds`.
fn render_rows(
    out: &mut [Rgb],
    bounds: Bounds,
    width: usize,
    height: usize,
    row_start: usize,
    max_iter: u32,
) {
    let rows = out.len() / width;
    for ((py, px), p) in iproduct!(row_start..row_start + rows, 0..width).zip(out.iter_mut()) {
        let c = pixel_to_point(Pixel(px, py), bounds, width, height);
        *p = colour(escape_time(c, max_iter), max_iter);
    }
}

/// Renders the `width` by `height` block covering (x0, y0)-(x1, y1) on
/// the calling thread.
pub fn compute(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    width: usize,
    height: usize,
    max_iter: u32,
) -> PixelBlock {
    let mut pixels = vec![BLACK; width * height];
    if width > 0 {
        render_rows(&mut pixels, (x0, y0, x1, y1), width, height, 0, max_iter);
    }
    PixelBlock {
        width,
        rows: height,
        pixels,
    }
}

/// Same output as [`compute`] over `bounds`, with the rows split into
/// contiguous bands, one scoped thread per band.  Each thread writes
/// only its own band, so nothing is locked.
pub fn compute_parallel(
    bounds: Bounds,
    width: usize,
    height: usize,
    max_iter: u32,
    threads: usize,
) -> Result<PixelBlock> {
    if threads <= 1 || height < 2 || width == 0 {
        let (x0, y0, x1, y1) = bounds;
        return Ok(compute(x0, y0, x1, y1, width, height, max_iter));
    }

    let threads = threads.min(height);
    let band = (height + threads - 1) / threads;
    let mut pixels = vec![BLACK; width * height];

    crossbeam::scope(|spawner| {
        for (n, chunk) in pixels.chunks_mut(band * width).enumerate() {
            spawner.spawn(move |_| {
                render_rows(chunk, bounds, width, height, n * band, max_iter);
            });
        }
    })
    .map_err(|_| RenderError::WorkerPanicked)?;

    Ok(PixelBlock {
        width,
        rows: height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 1000), 1000);
        assert_eq!(colour(1000, 1000), BLACK);
    }

    #[test]
    fn far_point_escapes_on_first_step() {
        assert_eq!(escape_time(Complex::new(2.0, 2.0), 1000), 1);
        assert_eq!(colour(1, 1000), Rgb(1, 1, 1));
    }

    #[test]
    fn minus_two_is_on_the_boundary_and_stays() {
        // z walks 0, -2, 2, 2, ... and |z|^2 == 4 is not an escape.
        assert_eq!(escape_time(Complex::new(-2.0, 0.0), 50), 50);
    }

    #[test]
    fn iteration_count_wraps_at_256() {
        assert_eq!(colour(256, 1000), Rgb(0, 0, 0));
        assert_eq!(colour(300, 1000), Rgb(44, 44, 44));
    }

    #[test]
    fn zero_budget_paints_everything_black() {
        let block = compute(-2.0, -1.0, 1.0, 1.0, 4, 4, 0);
        assert!(block.pixels.iter().all(|p| *p == BLACK));
    }

    #[test]
    fn compute_is_deterministic() {
        let a = compute(-2.5, -1.0, 1.0, 1.0, 64, 20, 200);
        let b = compute(-2.5, -1.0, 1.0, 1.0, 64, 20, 200);
        assert_eq!(a, b);
        assert_eq!(a.pixels.len(), 64 * 20);
        assert_eq!(a.rows().count(), 20);
    }

    #[test]
    fn block_centred_on_origin_is_black_in_the_middle() {
        // 5x5 over (-1,-1)-(1.5,1.5): pixel (2,2) sits on 0+0i.
        let block = compute(-1.0, -1.0, 1.5, 1.5, 5, 5, 100);
        assert_eq!(block.pixels[2 * 5 + 2], BLACK);
    }

    #[test]
    fn parallel_matches_serial() {
        let serial = compute(-2.5, -1.0, 1.0, 1.0, 48, 37, 300);
        for threads in 1..9 {
            let parallel = compute_parallel((-2.5, -1.0, 1.0, 1.0), 48, 37, 300, threads).unwrap();
            assert_eq!(parallel, serial, "mismatch with {} threads", threads);
        }
    }

    #[test]
    fn more_threads_than_rows() {
        let serial = compute(-2.5, -1.0, 1.0, 1.0, 10, 3, 100);
        let parallel = compute_parallel((-2.5, -1.0, 1.0, 1.0), 10, 3, 100, 16).unwrap();
        assert_eq!(parallel, serial);
    }
}
