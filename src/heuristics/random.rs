//! Random permutation tours.

use std::time::Instant;

use log::{debug, warn};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::heuristics::{deadline_after, expired, InitialTour};
use crate::instance::TspInstance;
use crate::results::SolveResult;
use crate::solution::Solution;

/// Draws random permutations until one has a finite cost
pub struct RandomTour {
    pub seed: u64,
    /// Give up after this many permutations
    pub max_attempts: usize,
}

impl RandomTour {
    pub fn new(seed: u64) -> Self {
        RandomTour {
            seed,
            max_attempts: 100_000,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Run as a stand-alone algorithm and report a result record.
    /// Queue and state counters do not apply and are left empty.
    pub fn solve(&self, instance: &TspInstance, time_limit: f64) -> SolveResult {
        let start = Instant::now();
        let mut solution = self.construct(instance, deadline_after(start, time_limit));
        solution.computation_time = start.elapsed().as_secs_f64();

        SolveResult {
            algorithm: self.name().to_string(),
            cost: solution.cost,
            time: solution.computation_time,
            count: solution.iterations.unwrap_or(0),
            solution,
            max_queue_size: None,
            total_states: None,
            pruned_states: None,
            remaining_states: None,
            termination: None,
        }
    }
}

impl Default for RandomTour {
    fn default() -> Self {
        Self::new(42)
    }
}

impl InitialTour for RandomTour {
    fn construct(&self, instance: &TspInstance, deadline: Option<Instant>) -> Solution {
        let start = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut perm: Vec<usize> = (0..instance.dimension()).collect();
        let mut attempts = 0;
        let mut solution = Solution::new();

        while attempts < self.max_attempts && !expired(deadline) {
            perm.shuffle(&mut rng);
            attempts += 1;

            if instance.tour_cost(&perm).is_finite() {
                solution = Solution::from_tour(instance, perm.clone(), self.name());
                break;
            }
        }

        if solution.feasible {
            debug!("Random tour of cost {:.2} after {} permutations", solution.cost, attempts);
        } else {
            warn!("No finite random tour found after {} permutations", attempts);
        }

        solution.algorithm = self.name().to_string();
        solution.iterations = Some(attempts);
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "RandomTour"
    }
}
