//! Initial tour strategies.
//!
//! The branch-and-bound engine only needs some complete tour to seed its
//! best-solution-so-far. Any strategy implementing [`InitialTour`] can be
//! plugged in: a random permutation search or a caller supplied tour.

pub mod random;
pub mod fixed;

pub use random::*;
pub use fixed::*;

use crate::instance::TspInstance;
use crate::solution::Solution;
use std::time::{Duration, Instant};

/// Produces a complete tour used to seed pruning, or an infinite-cost
/// solution when none was found before `deadline` (`None` means unbounded).
pub trait InitialTour {
    fn construct(&self, instance: &TspInstance, deadline: Option<Instant>) -> Solution;
    fn name(&self) -> &str;
}

/// Instant `time_limit` seconds after `start`. Negative budgets clamp to
/// zero; budgets too large to represent (including infinity) give `None`.
pub fn deadline_after(start: Instant, time_limit: f64) -> Option<Instant> {
    Duration::try_from_secs_f64(time_limit.max(0.0))
        .ok()
        .and_then(|budget| start.checked_add(budget))
}

/// True once `deadline` has passed
pub fn expired(deadline: Option<Instant>) -> bool {
    deadline.map_or(false, |d| Instant::now() >= d)
}
