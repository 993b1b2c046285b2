//! Tour representation for the asymmetric TSP.
//!
//! A tour is an ordered sequence of city indices that implicitly returns to
//! its first city. An infinite cost means no valid tour was found.

use crate::instance::{City, TspInstance};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a solution to the TSP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a sequence of city indices (return to the first city is implicit)
    pub tour: Vec<usize>,
    /// Total tour cost, infinite when no valid tour is known
    pub cost: f64,
    /// Whether the tour is a complete, finite-cost Hamiltonian cycle
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            tour: Vec::new(),
            cost: f64::INFINITY,
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from a tour
    pub fn from_tour(instance: &TspInstance, tour: Vec<usize>, algorithm: &str) -> Self {
        let cost = instance.tour_cost(&tour);
        let mut solution = Solution {
            tour,
            cost,
            feasible: false,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        };
        solution.feasible = cost.is_finite() && solution.is_complete(instance);
        solution
    }

    /// Check if all cities are visited exactly once
    pub fn is_complete(&self, instance: &TspInstance) -> bool {
        if self.tour.len() != instance.dimension() {
            return false;
        }

        let unique: HashSet<usize> = self.tour.iter().cloned().collect();
        unique.len() == instance.dimension() && self.tour.iter().all(|&c| c < instance.dimension())
    }

    /// The tour as an ordered list of cities
    pub fn cities<'a>(&self, instance: &'a TspInstance) -> Vec<&'a City> {
        self.tour.iter().map(|&i| &instance.cities[i]).collect()
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}
