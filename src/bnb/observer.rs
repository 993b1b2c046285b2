//! Hooks into the search loop.

use log::{debug, info};

use crate::bnb::state::SearchState;
use crate::solution::Solution;

/// Receives search events. Every method defaults to doing nothing.
pub trait SearchObserver {
    /// A state passed the bound test and is about to be expanded
    fn on_expand(&mut self, _state: &SearchState, _bssf_cost: f64) {}
    /// A state was discarded because its bound cannot beat the incumbent
    fn on_prune(&mut self, _state: &SearchState, _bssf_cost: f64) {}
    /// A complete tour replaced the incumbent
    fn on_improvement(&mut self, _solution: &Solution) {}
}

/// Ignores every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Reports improvements and periodic progress through `log`
#[derive(Debug)]
pub struct LoggingObserver {
    pub report_every: usize,
    expanded: usize,
}

impl LoggingObserver {
    pub fn new(report_every: usize) -> Self {
        LoggingObserver {
            report_every: report_every.max(1),
            expanded: 0,
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl SearchObserver for LoggingObserver {
    fn on_expand(&mut self, state: &SearchState, bssf_cost: f64) {
        self.expanded += 1;
        if self.expanded % self.report_every == 0 {
            debug!(
                "Expanded {} states (depth {}, bound {:.2}, bssf {:.2})",
                self.expanded, state.path().len(), state.lower_bound(), bssf_cost
            );
        }
    }

    fn on_improvement(&mut self, solution: &Solution) {
        info!("New best tour: cost {:.2}", solution.cost);
    }
}
