#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Master/worker Mandelbrot renderer
//!
//! The image is cut into equal horizontal strips, several per worker.
//! A coordinator hands the strips out round-robin over point-to-point
//! channels, each worker runs the escape-time kernel over the strips it
//! is sent and mails the pixels back, and the coordinator stitches the
//! blocks into one image and writes it out as a 24-bit bitmap.
//!
//! Workers share nothing with the coordinator but their channels.
//! Inside a worker the rows of a strip can be split again across
//! threads.
//!
//! ```no_run
//! extern crate mandelfarm;
//!
//! let config = mandelfarm::RenderConfig {
//!     num_workers: 4,
//!     ..mandelfarm::RenderConfig::default()
//! };
//! let image = mandelfarm::render(&config).unwrap();
//! mandelfarm::bmp::write("mandelbrot.bmp", &image).unwrap();
//! ```

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate tempfile;

pub mod bmp;
pub mod comm;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod kernel;
pub mod partition;
pub mod planes;
pub mod worker;

pub use config::RenderConfig;
pub use coordinator::{render, render_local, OutputImage};
pub use error::{RenderError, Result};
pub use planes::Domain;
