//! Render settings and the string parsers the command line uses to
//! fill them in.

use num::Complex;
use num_cpus;
use std::str::FromStr;

use error::{RenderError, Result};
use planes::Domain;

/// Default number of strips per worker.
pub const DEFAULT_MULTIPLIER: usize = 10;

/// Default output path.
pub const DEFAULT_OUTPUT: &str = "mandelbrot.bmp";

/// Everything a render needs to know up front.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// The rectangle of the complex plane to draw.
    pub domain: Domain,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Escape-time iteration budget.
    pub max_iter: u32,
    /// Worker count, not counting the coordinator.
    pub num_workers: usize,
    /// Strips per worker.
    pub multiplier: usize,
    /// Threads inside each worker.
    pub threads_per_worker: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            domain: Domain {
                x_min: -2.5,
                y_min: -1.0,
                x_max: 1.0,
                y_max: 1.0,
            },
            width: 800,
            height: 800,
            max_iter: 1000,
            num_workers: default_workers(),
            multiplier: DEFAULT_MULTIPLIER,
            threads_per_worker: 1,
        }
    }
}

/// One worker per core, leaving one core to the coordinator.
pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

impl RenderConfig {
    /// Total strip count: `multiplier * num_workers`.
    pub fn num_strips(&self) -> usize {
        self.multiplier.saturating_mul(self.num_workers)
    }

    /// Refuses any configuration that cannot produce an image.
    pub fn validate(&self) -> Result<()> {
        let refuse = |why: &str| Err(RenderError::Config(why.to_string()));
        if self.width == 0 || self.height == 0 {
            return refuse("image width and height must be positive");
        }
        if self.max_iter == 0 {
            return refuse("iteration count must be positive");
        }
        if self.num_workers == 0 {
            return refuse("at least one worker is required");
        }
        if self.multiplier == 0 {
            return refuse("strip multiplier must be positive");
        }
        if self.threads_per_worker == 0 {
            return refuse("each worker needs at least one thread");
        }
        if self.width > i32::max_value() as usize || self.height > i32::max_value() as usize {
            return refuse("image dimensions do not fit a bitmap header");
        }
        Domain::new(
            self.domain.x_min,
            self.domain.y_min,
            self.domain.x_max,
            self.domain.y_max,
        )
        .map(|_| ())
    }
}

/// Given a string and a separator, returns the two values
/// separated by the separator.
pub fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A specific implementation of parse_pair using a comma and expecting
/// floating point numbers.
pub fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}
