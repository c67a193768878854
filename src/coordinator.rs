// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The coordinator.
//!
//! Owns the output image for the whole run.  It posts every strip to
//! its worker up front, round-robin, then collects the blocks back in
//! exactly the order it posted them, reading each one from the worker
//! it was sent to.  Because every worker answers its strips in the
//! order it received them, the block that comes back is always the one
//! the coordinator is waiting for, and its place in the image is known
//! without any bookkeeping.  The price is that a slow strip holds up
//! the collection of the strips behind it.

extern crate crossbeam;

use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use comm::{group, CoordinatorEndpoint, StripBounds};
use config::RenderConfig;
use error::{RenderError, Result};
use kernel::{PixelBlock, Rgb, BLACK};
use partition::{assign, partition, schedule, Strip};
use worker::{self, StripShape};

/// The assembled image, row-major.  Row 0 holds `y_min` and is the
/// top row of every file written from it.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputImage {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// `width * height` colours.
    pub pixels: Vec<Rgb>,
}

impl OutputImage {
    /// Reserves a black image.  Running out of memory here is reported
    /// instead of aborting the process.
    pub fn allocate(width: usize, height: usize) -> Result<OutputImage> {
        let len = width
            .checked_mul(height)
            .ok_or(RenderError::Allocation { bytes: ::std::usize::MAX })?;
        let mut pixels: Vec<Rgb> = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| RenderError::Allocation {
                bytes: len.saturating_mul(3),
            })?;
        pixels.resize(len, BLACK);
        Ok(OutputImage {
            width,
            height,
            pixels,
        })
    }

    /// Copies a finished strip into place.  The block must be exactly
    /// one strip's worth of pixels.
    pub fn place(&mut self, strip: &Strip, block: &PixelBlock) -> Result<()> {
        let expected = self.width * strip.rows;
        if block.width != self.width || block.rows != strip.rows || block.pixels.len() != expected
        {
            return Err(RenderError::Protocol(format!(
                "strip {} came back as {}x{} with {} pixels, expected {}x{}",
                strip.index,
                block.width,
                block.rows,
                block.pixels.len(),
                self.width,
                strip.rows
            )));
        }
        let offset = strip.offset(self.width);
        self.pixels[offset..offset + expected].copy_from_slice(&block.pixels);
        Ok(())
    }

    /// The pixels as packed R, G, B bytes in display order, row 0
    /// first, the same way a bitmap reader shows them.
    pub fn to_rgb_bytes_top_down(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            bytes.extend_from_slice(&[p.0, p.1, p.2]);
        }
        bytes
    }

    /// Writes the image as a binary PPM.
    pub fn write_pnm<W: Write>(&self, out: W) -> Result<()> {
        let mut encoder =
            PNMEncoder::new(out).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
        let bytes = self.to_rgb_bytes_top_down();
        encoder
            .encode(
                &bytes[..],
                self.width as u32,
                self.height as u32,
                ColorType::RGB(8),
            )
            .map_err(|e| RenderError::Image(e.to_string()))
    }

    /// Writes the image as a binary PPM at `path`.
    pub fn save_pnm<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = File::create(path).map_err(|cause| RenderError::Output {
            path: path.display().to_string(),
            cause,
        })?;
        info!("writing pixmap to {}", path.display());
        self.write_pnm(output)
    }
}

fn shape_of(config: &RenderConfig, strips: &[Strip]) -> StripShape {
    StripShape {
        x_min: config.domain.x_min,
        x_max: config.domain.x_max,
        width: config.width,
        rows: strips.first().map(|s| s.rows).unwrap_or(0),
        max_iter: config.max_iter,
        threads: config.threads_per_worker,
    }
}

/// Dispatch and collection over an existing group.  Consumes the
/// endpoint: whether this succeeds or fails, every worker's channels
/// are closed when it returns, so no worker outlives the run.
pub fn coordinate(
    endpoint: CoordinatorEndpoint,
    strips: &[Strip],
    image: &mut OutputImage,
) -> Result<()> {
    let workers = endpoint.size();
    if workers == 0 {
        return Err(RenderError::Config(
            "cannot dispatch strips to an empty group".to_string(),
        ));
    }

    info!("sending {} strips to {} workers", strips.len(), workers);
    for strip in strips {
        let rank = assign(strip.index, workers);
        endpoint.send(
            rank,
            StripBounds {
                y_min: strip.y_min,
                y_max: strip.y_max,
            },
        )?;
        info!("sent strip {} to worker {}", strip.index, rank);
    }

    for strip in strips {
        let rank = assign(strip.index, workers);
        let block = endpoint.recv(rank)?;
        image.place(strip, &block)?;
        info!("received strip {} from worker {}", strip.index, rank);
    }

    endpoint.shutdown();
    Ok(())
}

/// Renders the configured image across `config.num_workers` workers.
pub fn render(config: &RenderConfig) -> Result<OutputImage> {
    config.validate()?;
    let strips = partition(&config.domain, config.height, config.num_strips())?;
    let mut image = OutputImage::allocate(config.width, config.height)?;
    let shape = shape_of(config, &strips);

    for (slot, indices) in schedule(strips.len(), config.num_workers).iter().enumerate() {
        debug!("worker {} is assigned strips {:?}", slot + 1, indices);
    }

    let (endpoint, workers) = group(config.num_workers);
    let outcome = crossbeam::scope(|spawner| -> Result<()> {
        let handles: Vec<_> = workers
            .into_iter()
            .map(|w| spawner.spawn(move |_| worker::run(w, shape)))
            .collect();

        let collected = coordinate(endpoint, &strips, &mut image);
        if let Err(ref e) = collected {
            warn!("aborting run: {}", e);
        }

        let mut finished = Vec::with_capacity(handles.len());
        for handle in handles {
            finished.push(handle.join().map_err(|_| RenderError::WorkerPanicked)?);
        }
        match collected {
            // A worker that fails closes its channels, which the
            // coordinator only sees as a disconnect.  Report the
            // worker's own reason instead.
            Err(RenderError::Disconnected { rank }) => Err(finished
                .into_iter()
                .filter_map(|r| r.err())
                .find(|e| !matches!(e, RenderError::Disconnected { .. }))
                .unwrap_or(RenderError::Disconnected { rank })),
            Err(e) => Err(e),
            Ok(()) => finished.into_iter().map(|r| r.map(|_| ())).collect(),
        }
    })
    .map_err(|_| RenderError::WorkerPanicked)?;

    outcome.map(|()| image)
}

/// Renders the configured image on the calling process with no
/// messaging at all.  Same strips, same kernel, same bytes as
/// [`render`].
pub fn render_local(config: &RenderConfig) -> Result<OutputImage> {
    config.validate()?;
    let strips = partition(&config.domain, config.height, config.num_strips())?;
    let mut image = OutputImage::allocate(config.width, config.height)?;
    let shape = shape_of(config, &strips);

    for strip in &strips {
        let block = shape.render(&StripBounds {
            y_min: strip.y_min,
            y_max: strip.y_max,
        })?;
        image.place(strip, &block)?;
    }
    Ok(image)
}
