//! Result record handed to the presentation layer.

use serde::Serialize;

use crate::bnb::Termination;
use crate::solution::Solution;

/// Outcome of one solver invocation.
///
/// Fields that do not apply to an algorithm (for instance queue statistics
/// of the random tour) are `None`. An infinite `cost` means no tour was found.
#[derive(Debug, Clone, Serialize)]
pub struct SolveResult {
    pub algorithm: String,
    /// Best cost found
    pub cost: f64,
    /// Elapsed time in seconds
    pub time: f64,
    /// Improved solutions found (branch-and-bound) or permutations tried (random tour)
    pub count: usize,
    /// Best tour found
    pub solution: Solution,
    pub max_queue_size: Option<usize>,
    pub total_states: Option<usize>,
    pub pruned_states: Option<usize>,
    /// States still queued when the search stopped
    pub remaining_states: Option<usize>,
    pub termination: Option<Termination>,
}

impl SolveResult {
    /// True when a finite-cost tour was found
    pub fn found_tour(&self) -> bool {
        self.cost.is_finite()
    }
}

impl std::fmt::Display for SolveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn optional(value: Option<usize>) -> String {
            value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
        }

        writeln!(f, "Algorithm: {}", self.algorithm)?;
        if self.found_tour() {
            writeln!(f, "Cost: {:.2}", self.cost)?;
        } else {
            writeln!(f, "Cost: inf (no tour found)")?;
        }
        writeln!(f, "Time: {:.4}s", self.time)?;
        writeln!(f, "Solutions: {}", self.count)?;
        writeln!(f, "Max queue size: {}", optional(self.max_queue_size))?;
        writeln!(f, "States created: {}", optional(self.total_states))?;
        writeln!(f, "States pruned: {}", optional(self.pruned_states))?;
        writeln!(f, "States remaining: {}", optional(self.remaining_states))?;
        if let Some(termination) = self.termination {
            writeln!(f, "Termination: {}", termination)?;
        }
        write!(f, "Tour: {:?}", self.solution.tour)
    }
}
