// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Every way a render can fail.  None of these are retried; a failure
//! anywhere ends the whole run.

use std::io;

/// Result type used throughout the crate.
pub type Result<T> = ::std::result::Result<T, RenderError>;

/// The failure taxonomy of a render.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The configuration can never produce an image.  Reported before
    /// any strip is dispatched.
    #[fail(display = "invalid configuration: {}", _0)]
    Config(String),

    /// The image height does not divide into the requested number of
    /// strips, so some rows would never be rendered.
    #[fail(
        display = "image height {} cannot be split into {} equal strips",
        height, strips
    )]
    UnevenStrips {
        /// Image height in pixels.
        height: usize,
        /// Requested strip count.
        strips: usize,
    },

    /// The output buffer could not be reserved.
    #[fail(display = "could not allocate {} bytes for the output image", bytes)]
    Allocation {
        /// Size of the failed reservation.
        bytes: usize,
    },

    /// The output file could not be created.  The image is still in
    /// memory.
    #[fail(display = "cannot open output file {}: {}", path, cause)]
    Output {
        /// The path that was refused.
        path: String,
        /// What the operating system said.
        #[fail(cause)]
        cause: io::Error,
    },

    /// Any other I/O failure while writing or reading an image.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[fail(cause)] io::Error),

    /// The image encoder rejected the buffer.
    #[fail(display = "image encoding failed: {}", _0)]
    Image(String),

    /// A peer sent something the protocol does not allow.
    #[fail(display = "protocol violation: {}", _0)]
    Protocol(String),

    /// The other end of a channel went away mid-run.
    #[fail(display = "rank {} is no longer reachable", rank)]
    Disconnected {
        /// The rank that could not be reached.
        rank: usize,
    },

    /// A worker thread panicked.
    #[fail(display = "a worker thread panicked")]
    WorkerPanicked,
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}
