// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The message-passing group.
//!
//! A group is one coordinator (rank 0) and `n` workers (ranks 1 to n).
//! Every worker has exactly two channels, one carrying strip bounds
//! down from the coordinator and one carrying finished pixel blocks
//! back up.  Nothing else is shared.  Messages between a fixed pair of
//! ranks arrive in the order they were sent.
//!
//! The channels are unbounded, so the coordinator can post every strip
//! before it starts collecting, the way small MPI sends are buffered.

extern crate crossbeam;

use self::crossbeam::channel::{unbounded, Receiver, Sender};

use error::{RenderError, Result};
use kernel::PixelBlock;
use partition::COORDINATOR;

/// The task message: the vertical plane bounds of one strip.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StripBounds {
    /// Lower plane coordinate.
    pub y_min: f64,
    /// Upper plane coordinate.
    pub y_max: f64,
}

impl StripBounds {
    /// Sent once to each worker after its last strip.
    pub const SENTINEL: StripBounds = StripBounds {
        y_min: -1.0,
        y_max: -1.0,
    };

    /// True when this message means "no more work".
    pub fn is_sentinel(&self) -> bool {
        self.y_min == -1.0 && self.y_max == -1.0
    }
}

/// The coordinator's side of the group.
pub struct CoordinatorEndpoint {
    tasks: Vec<Sender<StripBounds>>,
    results: Vec<Receiver<PixelBlock>>,
}

/// One worker's side of the group.
pub struct WorkerEndpoint {
    rank: usize,
    tasks: Receiver<StripBounds>,
    results: Sender<PixelBlock>,
}

/// Builds a group of `num_workers` workers.  The worker endpoints come
/// back in rank order, rank 1 first.
pub fn group(num_workers: usize) -> (CoordinatorEndpoint, Vec<WorkerEndpoint>) {
    let mut coordinator = CoordinatorEndpoint {
        tasks: Vec::with_capacity(num_workers),
        results: Vec::with_capacity(num_workers),
    };
    let mut workers = Vec::with_capacity(num_workers);

    for rank in 1..=num_workers {
        let (task_tx, task_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        coordinator.tasks.push(task_tx);
        coordinator.results.push(result_rx);
        workers.push(WorkerEndpoint {
            rank,
            tasks: task_rx,
            results: result_tx,
        });
    }

    (coordinator, workers)
}

impl CoordinatorEndpoint {
    /// Number of workers in the group.
    pub fn size(&self) -> usize {
        self.tasks.len()
    }

    fn slot(&self, rank: usize) -> Result<usize> {
        if rank == COORDINATOR || rank > self.size() {
            return Err(RenderError::Protocol(format!(
                "no worker with rank {} in a group of {}",
                rank,
                self.size()
            )));
        }
        Ok(rank - 1)
    }

    /// Sends a task to `rank`.
    pub fn send(&self, rank: usize, bounds: StripBounds) -> Result<()> {
        let slot = self.slot(rank)?;
        self.tasks[slot]
            .send(bounds)
            .map_err(|_| RenderError::Disconnected { rank })
    }

    /// Blocks until `rank` sends its next block.
    pub fn recv(&self, rank: usize) -> Result<PixelBlock> {
        let slot = self.slot(rank)?;
        self.results[slot]
            .recv()
            .map_err(|_| RenderError::Disconnected { rank })
    }

    /// Tells every worker there is no more work.  Workers that have
    /// already gone away are skipped.
    pub fn shutdown(&self) {
        for (slot, tasks) in self.tasks.iter().enumerate() {
            if tasks.send(StripBounds::SENTINEL).is_err() {
                debug!("worker {} was gone before shutdown", slot + 1);
            }
        }
    }
}

impl WorkerEndpoint {
    /// This worker's rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Blocks until the coordinator sends the next task.
    pub fn recv(&self) -> Result<StripBounds> {
        self.tasks.recv().map_err(|_| RenderError::Disconnected {
            rank: COORDINATOR,
        })
    }

    /// Returns a finished block to the coordinator.
    pub fn send(&self, block: PixelBlock) -> Result<()> {
        self.results.send(block).map_err(|_| RenderError::Disconnected {
            rank: COORDINATOR,
        })
    }
}
