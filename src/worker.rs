// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The worker loop.
//!
//! A worker is either awaiting a task or terminated.  While awaiting it
//! blocks on its inbox; a strip's bounds send it off to the kernel and
//! the finished block goes back to the coordinator, after which it
//! waits again.  The sentinel ends the loop without a reply.

use comm::{StripBounds, WorkerEndpoint};
use error::{RenderError, Result};
use kernel::{compute_parallel, PixelBlock};

/// Everything about a strip that does not travel in the task message:
/// the horizontal extent, the block size, and the iteration budget are
/// fixed for the whole run and known to every worker up front.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StripShape {
    /// Left plane coordinate.
    pub x_min: f64,
    /// Right plane coordinate.
    pub x_max: f64,
    /// Pixels per row.
    pub width: usize,
    /// Rows per strip.
    pub rows: usize,
    /// Escape-time iteration budget.
    pub max_iter: u32,
    /// Threads each worker splits its block across.
    pub threads: usize,
}

impl StripShape {
    /// Renders the strip between `bounds.y_min` and `bounds.y_max`.
    pub fn render(&self, bounds: &StripBounds) -> Result<PixelBlock> {
        compute_parallel(
            (self.x_min, bounds.y_min, self.x_max, bounds.y_max),
            self.width,
            self.rows,
            self.max_iter,
            self.threads,
        )
    }
}

/// The two worker states.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum State {
    /// Blocked on the inbox.
    AwaitingTask,
    /// Received the sentinel; nothing more will arrive.
    Terminated,
}

fn check(bounds: &StripBounds) -> Result<()> {
    if !bounds.y_min.is_finite() || !bounds.y_max.is_finite() || bounds.y_min >= bounds.y_max {
        return Err(RenderError::Protocol(format!(
            "malformed strip bounds ({}, {})",
            bounds.y_min, bounds.y_max
        )));
    }
    Ok(())
}

/// Handles one message and reports the state the worker is in
/// afterwards.
pub fn step(endpoint: &WorkerEndpoint, shape: &StripShape, bounds: StripBounds) -> Result<State> {
    if bounds.is_sentinel() {
        return Ok(State::Terminated);
    }
    check(&bounds)?;

    debug!(
        "worker {}: received strip ({}, {})",
        endpoint.rank(),
        bounds.y_min,
        bounds.y_max
    );
    let block = shape.render(&bounds)?;
    endpoint.send(block)?;
    debug!(
        "worker {}: sent result for strip ({}, {})",
        endpoint.rank(),
        bounds.y_min,
        bounds.y_max
    );
    Ok(State::AwaitingTask)
}

/// Runs until the sentinel arrives.  Returns how many strips were
/// rendered.  A closed channel in either direction ends the loop with
/// an error; that is how an aborted run reaches its workers.
pub fn run(endpoint: WorkerEndpoint, shape: StripShape) -> Result<usize> {
    let mut done = 0;
    let mut state = State::AwaitingTask;
    while state == State::AwaitingTask {
        let bounds = endpoint.recv()?;
        state = step(&endpoint, &shape, bounds)?;
        if state == State::AwaitingTask {
            done += 1;
        }
    }
    debug!("worker {}: terminated after {} strips", endpoint.rank(), done);
    Ok(done)
}
