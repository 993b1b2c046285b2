//! Caller supplied tours.

use std::time::Instant;

use log::warn;

use crate::heuristics::InitialTour;
use crate::instance::TspInstance;
use crate::solution::Solution;

/// Seeds the search with a known tour, making runs fully deterministic
pub struct FixedTour {
    pub tour: Vec<usize>,
}

impl FixedTour {
    pub fn new(tour: Vec<usize>) -> Self {
        FixedTour { tour }
    }
}

impl InitialTour for FixedTour {
    fn construct(&self, instance: &TspInstance, _deadline: Option<Instant>) -> Solution {
        let n = instance.dimension();
        if self.tour.iter().any(|&c| c >= n) {
            warn!("Fixed tour references a city outside 0..{}", n);
            let mut empty = Solution::new();
            empty.algorithm = self.name().to_string();
            return empty;
        }

        let mut solution = Solution::from_tour(instance, self.tour.clone(), self.name());
        if !solution.is_complete(instance) {
            warn!("Fixed tour {:?} is not a permutation of the {} cities", self.tour, n);
            solution.cost = f64::INFINITY;
            solution.feasible = false;
        }
        solution
    }

    fn name(&self) -> &str {
        "FixedTour"
    }
}
