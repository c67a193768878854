//! Splits the pixel grid into equal-height horizontal strips and
//! decides which worker renders each one.
//!
//! The strip count is a multiple of the worker count rather than the
//! worker count itself, so each worker is handed several strips and
//! a slow region of the plane is spread across the group.

use error::{RenderError, Result};
use planes::{lerp, Domain};

/// The rank reserved for the coordinator.  Workers are numbered from 1.
pub const COORDINATOR: usize = 0;

/// One horizontal slice of the image: full width, `rows` tall.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Strip {
    /// Position in dispatch order.
    pub index: usize,
    /// First image row covered by this strip.
    pub row_start: usize,
    /// Number of rows in the strip.
    pub rows: usize,
    /// Plane coordinate of `row_start`.
    pub y_min: f64,
    /// Plane coordinate of `row_start + rows`.
    pub y_max: f64,
}

impl Strip {
    /// Offset of the strip's first pixel in a row-major buffer `width`
    /// pixels wide.
    pub fn offset(&self, width: usize) -> usize {
        self.row_start * width
    }
}

/// Produces `num_strips` strips that exactly tile `[0, height)`.  The
/// height must divide evenly; a remainder would leave rows unrendered,
/// so it is refused rather than dropped.  Every strip must also get a
/// `y_min` strictly below its `y_max`, which a domain only a few ulps
/// tall cannot provide.
pub fn partition(domain: &Domain, height: usize, num_strips: usize) -> Result<Vec<Strip>> {
    if num_strips == 0 {
        return Err(RenderError::Config(
            "at least one strip is required".to_string(),
        ));
    }
    if height == 0 || height % num_strips != 0 {
        return Err(RenderError::UnevenStrips {
            height,
            strips: num_strips,
        });
    }

    let rows = height / num_strips;
    let strips: Vec<Strip> = (0..num_strips)
        .map(|index| {
            let row_start = index * rows;
            Strip {
                index,
                row_start,
                rows,
                y_min: lerp(domain.y_min, domain.y_max, row_start, height),
                y_max: lerp(domain.y_min, domain.y_max, row_start + rows, height),
            }
        })
        .collect();

    if strips.iter().any(|s| !(s.y_min < s.y_max)) {
        return Err(RenderError::Config(format!(
            "domain is too narrow to split into {} strips",
            num_strips
        )));
    }
    Ok(strips)
}

/// Round-robin destination of strip `index` over workers `1..=num_workers`.
///
/// # Panics
///
/// Panics if `num_workers` is zero.
#[inline]
pub fn assign(index: usize, num_workers: usize) -> usize {
    debug_assert!(num_workers > 0);
    (index % num_workers) + 1
}

/// For each worker (slot 0 is rank 1), the strip indices it will be
/// sent, in the order it will receive them.  With no workers the plan
/// is empty.
pub fn schedule(num_strips: usize, num_workers: usize) -> Vec<Vec<usize>> {
    let mut plan = vec![Vec::new(); num_workers];
    if num_workers == 0 {
        return plan;
    }
    for index in 0..num_strips {
        plan[assign(index, num_workers) - 1].push(index);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn domain() -> Domain {
        Domain::new(-2.5, -1.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn strips_tile_the_image() {
        let strips = partition(&domain(), 800, 40).unwrap();
        assert_eq!(strips.len(), 40);
        assert_eq!(strips[0].row_start, 0);
        for pair in strips.windows(2) {
            assert_eq!(pair[0].row_start + pair[0].rows, pair[1].row_start);
            assert_eq!(pair[0].y_max, pair[1].y_min);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }
        let last = strips.last().unwrap();
        assert_eq!(last.row_start + last.rows, 800);
        assert_eq!(strips.iter().map(|s| s.rows).sum::<usize>(), 800);
    }

    #[test]
    fn strip_bounds_span_the_domain() {
        let strips = partition(&domain(), 800, 40).unwrap();
        assert_eq!(strips[0].y_min, -1.0);
        assert_eq!(strips[39].y_max, 1.0);
        assert_eq!(strips[1].offset(800), 20 * 800);
    }

    #[test]
    fn uneven_height_is_refused() {
        match partition(&domain(), 800, 30) {
            Err(RenderError::UnevenStrips { height, strips }) => {
                assert_eq!((height, strips), (800, 30));
            }
            other => panic!("expected UnevenStrips, got {:?}", other),
        }
    }

    #[test]
    fn zero_strips_is_refused() {
        assert!(partition(&domain(), 800, 0).is_err());
    }

    #[test]
    fn domain_too_narrow_for_the_strip_count_is_refused() {
        let narrow = Domain::new(-0.5, 1.0, -0.5 + 1e-12, 1.0 + 4e-15).unwrap();
        match partition(&narrow, 80, 40) {
            Err(RenderError::Config(_)) => (),
            other => panic!("expected Config, got {:?}", other),
        }
        // The same domain cut once still has room.
        assert!(partition(&narrow, 80, 1).is_ok());
    }

    #[test]
    fn no_strip_bounds_look_like_the_sentinel() {
        let strips = partition(&domain(), 800, 40).unwrap();
        assert!(strips.iter().all(|s| s.y_min < s.y_max));
    }

    #[test]
    fn schedule_without_workers_is_empty() {
        assert!(schedule(5, 0).is_empty());
        assert!(schedule(0, 0).is_empty());
    }

    #[test]
    fn worker_two_gets_every_fourth_strip() {
        let plan = schedule(40, 4);
        let expected: Vec<usize> = (0..10).map(|k| 1 + 4 * k).collect();
        assert_eq!(plan[1], expected);
        assert_eq!(*plan[1].last().unwrap(), 37);
    }

    #[test]
    fn single_worker_takes_everything() {
        let plan = schedule(10, 1);
        assert_eq!(plan, vec![(0..10).collect::<Vec<_>>()]);
        assert!((0..10).all(|i| assign(i, 1) == 1));
    }

    #[test]
    fn round_robin_covers_every_strip_once() {
        let mut rng = ::rand::thread_rng();
        for _ in 0..50 {
            let workers = rng.gen_range(1, 33);
            let strips = workers * rng.gen_range(1, 11);
            let plan = schedule(strips, workers);
            assert_eq!(plan.len(), workers);
            assert!(plan.iter().all(|p| !p.is_empty()));

            let mut seen: Vec<usize> = plan.iter().flat_map(|p| p.iter().cloned()).collect();
            seen.sort();
            assert_eq!(seen, (0..strips).collect::<Vec<_>>());

            for (slot, indices) in plan.iter().enumerate() {
                assert!(indices.windows(2).all(|w| w[0] < w[1]));
                assert!(indices.iter().all(|&i| assign(i, workers) == slot + 1));
                assert!(assign(indices[0], workers) != COORDINATOR);
            }
        }
    }
}
