//! Branch-and-bound solver for the asymmetric TSP.
//!
//! The search keeps a priority queue of partial tours ([`SearchState`]), each
//! carrying a reduced cost matrix and a lower bound. States are popped in
//! order of bound per visited city, expanded into one child per unvisited
//! city, and discarded whenever their bound cannot beat the best solution so
//! far (BSSF). The search ends when the queue is empty, which proves the BSSF
//! optimal, or when the time budget runs out.
//!
//! All bookkeeping (queue, counters, BSSF) is local to a single call to
//! [`BranchAndBound::solve`].

pub mod observer;
pub mod state;

pub use observer::*;
pub use state::*;

use std::collections::BinaryHeap;
use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::heuristics::{deadline_after, expired, InitialTour, RandomTour};
use crate::instance::TspInstance;
use crate::results::SolveResult;
use crate::solution::Solution;

/// Branch-and-bound configuration
#[derive(Debug, Clone)]
pub struct BnbConfig {
    /// Wall-clock budget in seconds, shared by the seed tour and the search.
    /// `f64::INFINITY` searches until the queue is exhausted.
    pub time_limit: f64,
    /// Seed of the default random seed tour
    pub seed: u64,
    /// City every tour starts from
    pub start_city: usize,
    /// Attempt cap of the default random seed tour
    pub max_random_attempts: usize,
}

impl Default for BnbConfig {
    fn default() -> Self {
        BnbConfig {
            time_limit: 60.0,
            seed: 42,
            start_city: 0,
            max_random_attempts: 100_000,
        }
    }
}

/// Why the search loop stopped
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Termination {
    /// The queue emptied: the reported tour is optimal (or none exists)
    Optimal,
    /// The time budget ran out first
    TimeLimit,
    /// Fewer than two cities, nothing to search
    Trivial,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Termination::Optimal => "optimal",
            Termination::TimeLimit => "time limit",
            Termination::Trivial => "trivial",
        };
        f.write_str(label)
    }
}

/// Counters accumulated over one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// States built, root included
    pub states_created: usize,
    /// States discarded by the bound test, at generation or when popped
    pub states_pruned: usize,
    /// Largest queue length observed before a pop
    pub max_queue_size: usize,
    /// Number of times the BSSF improved (the seed tour is not counted)
    pub solutions_found: usize,
    /// States still queued when the search stopped
    pub states_remaining: usize,
}

/// Branch-and-bound solver
pub struct BranchAndBound {
    config: BnbConfig,
    initial_tour: Box<dyn InitialTour>,
}

impl BranchAndBound {
    pub const NAME: &'static str = "BranchAndBound";

    /// Solver seeded with a random tour
    pub fn new(config: BnbConfig) -> Self {
        let initial_tour = RandomTour::new(config.seed).with_max_attempts(config.max_random_attempts);
        BranchAndBound {
            config,
            initial_tour: Box::new(initial_tour),
        }
    }

    /// Replace the strategy producing the initial BSSF
    pub fn with_initial_tour(mut self, initial_tour: Box<dyn InitialTour>) -> Self {
        self.initial_tour = initial_tour;
        self
    }

    pub fn solve(&self, instance: &TspInstance) -> Result<SolveResult, String> {
        self.solve_with_observer(instance, &mut LoggingObserver::default())
    }

    pub fn solve_with_observer(
        &self,
        instance: &TspInstance,
        observer: &mut dyn SearchObserver,
    ) -> Result<SolveResult, String> {
        let start_time = Instant::now();
        let deadline = deadline_after(start_time, self.config.time_limit);
        let n = instance.dimension();

        if n <= 1 {
            let solution = Solution::from_tour(instance, (0..n).collect(), Self::NAME);
            let stats = SearchStatistics::default();
            return Ok(self.report(solution, stats, Termination::Trivial, start_time));
        }
        if self.config.start_city >= n {
            return Err(format!("Start city {} out of range for {} cities", self.config.start_city, n));
        }

        info!(
            "Branch-and-bound on {} ({} cities, {:.1}s budget, seeded by {})",
            instance.name, n, self.config.time_limit, self.initial_tour.name()
        );

        let mut bssf = self.initial_tour.construct(instance, deadline);
        if !bssf.cost.is_finite() {
            warn!("Seed tour has infinite cost, searching without an incumbent");
        }

        let mut stats = SearchStatistics::default();
        let mut heap = BinaryHeap::new();
        let mut sequence = 0u64;

        let root = SearchState::root(instance, self.config.start_city, stats.states_created)?;
        stats.states_created += 1;
        heap.push(QueuedState::new(root, sequence));
        sequence += 1;

        let mut termination = Termination::Optimal;

        while !heap.is_empty() {
            if expired(deadline) {
                termination = Termination::TimeLimit;
                break;
            }

            stats.max_queue_size = stats.max_queue_size.max(heap.len());

            let state = match heap.pop() {
                Some(entry) => entry.into_state(),
                None => break,
            };

            if state.lower_bound() >= bssf.cost {
                stats.states_pruned += 1;
                observer.on_prune(&state, bssf.cost);
                continue;
            }

            if state.is_complete() {
                let candidate = Solution::from_tour(instance, state.path().to_vec(), Self::NAME);
                if candidate.cost < bssf.cost {
                    bssf = candidate;
                    stats.solutions_found += 1;
                    observer.on_improvement(&bssf);
                }
                continue;
            }

            observer.on_expand(&state, bssf.cost);

            for next in 0..n {
                if state.contains(next) {
                    continue;
                }

                let child = state.branch(next, stats.states_created)?;
                stats.states_created += 1;

                if child.lower_bound() < bssf.cost {
                    heap.push(QueuedState::new(child, sequence));
                    sequence += 1;
                } else {
                    stats.states_pruned += 1;
                    observer.on_prune(&child, bssf.cost);
                }
            }
        }

        stats.states_remaining = heap.len();

        info!(
            "Search finished ({}): cost {:.2}, {} states created, {} pruned, {} still queued, max queue {}",
            termination, bssf.cost, stats.states_created, stats.states_pruned,
            stats.states_remaining, stats.max_queue_size
        );

        Ok(self.report(bssf, stats, termination, start_time))
    }

    fn report(
        &self,
        mut solution: Solution,
        stats: SearchStatistics,
        termination: Termination,
        start_time: Instant,
    ) -> SolveResult {
        let time = start_time.elapsed().as_secs_f64();
        solution.algorithm = Self::NAME.to_string();
        solution.computation_time = time;
        solution.iterations = Some(stats.states_created);

        SolveResult {
            algorithm: Self::NAME.to_string(),
            cost: solution.cost,
            time,
            count: stats.solutions_found,
            solution,
            max_queue_size: Some(stats.max_queue_size),
            total_states: Some(stats.states_created),
            pruned_states: Some(stats.states_pruned),
            remaining_states: Some(stats.states_remaining),
            termination: Some(termination),
        }
    }
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self::new(BnbConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::FixedTour;
    use crate::instance::{Difficulty, ScenarioGenerator};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    const INF: f64 = f64::INFINITY;

    fn scenario_15() -> TspInstance {
        TspInstance::from_matrix("known-15", vec![
            vec![INF, 3.0, 9.0, 8.0, 7.0],
            vec![8.0, INF, 4.0, 9.0, 6.0],
            vec![7.0, 9.0, INF, 2.0, 8.0],
            vec![9.0, 6.0, 8.0, INF, 5.0],
            vec![1.0, 7.0, 9.0, 8.0, INF],
        ]).unwrap()
    }

    fn random_instance(n: usize, seed: u64, missing: f64) -> TspInstance {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            0.0
                        } else if rng.gen_bool(missing) {
                            INF
                        } else {
                            rng.gen_range(1..=50) as f64
                        }
                    })
                    .collect::<Vec<f64>>()
            })
            .collect();
        TspInstance::from_matrix("random", rows).unwrap()
    }

    fn brute_force(instance: &TspInstance) -> f64 {
        fn extend(instance: &TspInstance, path: &mut Vec<usize>, used: &mut [bool], best: &mut f64) {
            if path.len() == instance.dimension() {
                *best = best.min(instance.tour_cost(path));
                return;
            }
            for next in 1..instance.dimension() {
                if !used[next] {
                    used[next] = true;
                    path.push(next);
                    extend(instance, path, used, best);
                    path.pop();
                    used[next] = false;
                }
            }
        }

        let mut used = vec![false; instance.dimension()];
        used[0] = true;
        let mut best = INF;
        extend(instance, &mut vec![0], &mut used, &mut best);
        best
    }

    fn solver(time_limit: f64) -> BranchAndBound {
        BranchAndBound::new(BnbConfig { time_limit, ..Default::default() })
    }

    /// Records every expansion together with the incumbent cost at that moment
    #[derive(Default)]
    struct RecordingObserver {
        expansions: Vec<(f64, f64)>,
        prunes: usize,
        improvements: usize,
    }

    impl SearchObserver for RecordingObserver {
        fn on_expand(&mut self, state: &SearchState, bssf_cost: f64) {
            self.expansions.push((state.lower_bound(), bssf_cost));
        }

        fn on_prune(&mut self, _state: &SearchState, _bssf_cost: f64) {
            self.prunes += 1;
        }

        fn on_improvement(&mut self, _solution: &Solution) {
            self.improvements += 1;
        }
    }

    #[test]
    fn test_known_scenario() {
        let instance = scenario_15();
        let result = solver(5.0).solve(&instance).unwrap();

        assert_eq!(result.cost, 15.0);
        assert_eq!(instance.tour_cost(&result.solution.tour), 15.0);
        assert!(result.solution.is_complete(&instance));
        assert_eq!(result.termination, Some(Termination::Optimal));
        assert!(result.pruned_states.unwrap() > 0);
        assert!(result.total_states.unwrap() > 0);
        assert!(result.max_queue_size.unwrap() > 0);
    }

    #[test]
    fn test_unreachable_city_reports_infinite_cost() {
        let instance = TspInstance::from_matrix("dead", vec![
            vec![0.0, 1.0, 2.0, INF],
            vec![1.0, 0.0, 2.0, INF],
            vec![2.0, 1.0, 0.0, INF],
            vec![1.0, 1.0, 1.0, 0.0],
        ]).unwrap();
        let config = BnbConfig { time_limit: 5.0, max_random_attempts: 1_000, ..Default::default() };
        let result = BranchAndBound::new(config).solve(&instance).unwrap();

        assert_eq!(result.cost, INF);
        assert!(!result.found_tour());
        assert!(!result.solution.feasible);
        assert_eq!(result.termination, Some(Termination::Optimal));
        assert!(result.time < 5.0);
    }

    #[test]
    fn test_optimal_on_exhaustion() {
        for seed in 0..30 {
            let n = 3 + (seed as usize % 7);
            let missing = if seed % 2 == 0 { 0.0 } else { 0.3 };
            let instance = random_instance(n, seed, missing);

            let result = solver(30.0).solve(&instance).unwrap();
            assert_eq!(result.termination, Some(Termination::Optimal));
            assert_eq!(result.cost, brute_force(&instance), "seed {} n {}", seed, n);

            if result.found_tour() {
                assert!(result.solution.is_complete(&instance));
                assert_eq!(instance.tour_cost(&result.solution.tour), result.cost);
            }
        }
    }

    #[test]
    fn test_never_expands_a_dominated_state() {
        let mut expanded = 0;
        for seed in 0..10 {
            let instance = random_instance(7, 100 + seed, 0.1);
            let mut observer = RecordingObserver::default();
            let result = solver(30.0).solve_with_observer(&instance, &mut observer).unwrap();

            expanded += observer.expansions.len();
            for &(bound, bssf_cost) in &observer.expansions {
                assert!(bound < bssf_cost);
            }
            assert_eq!(observer.prunes, result.pruned_states.unwrap());
            assert_eq!(observer.improvements, result.count);
        }
        assert!(expanded > 0);
    }

    #[test]
    fn test_fixed_seed_is_idempotent() {
        let instance = ScenarioGenerator::new(Difficulty::Normal, 17).generate(9);
        let seed_tour: Vec<usize> = (0..9).collect();

        let run = || {
            solver(30.0)
                .with_initial_tour(Box::new(FixedTour::new(seed_tour.clone())))
                .solve(&instance)
                .unwrap()
        };
        let first = run();
        let second = run();

        assert_eq!(first.cost, second.cost);
        assert_eq!(first.solution.tour, second.solution.tour);
        assert_eq!(first.total_states, second.total_states);
        assert_eq!(first.pruned_states, second.pruned_states);
    }

    #[test]
    fn test_time_limit_returns_best_effort() {
        let instance = ScenarioGenerator::new(Difficulty::Easy, 8).generate(60);
        let result = solver(0.05).solve(&instance).unwrap();

        assert_eq!(result.termination, Some(Termination::TimeLimit));
        assert!(result.found_tour());
        assert!(result.solution.is_complete(&instance));
        assert!(result.time < 5.0);
    }

    #[test]
    fn test_unbounded_time_limit() {
        let instance = scenario_15();
        let config = BnbConfig { time_limit: f64::INFINITY, ..Default::default() };
        let result = BranchAndBound::new(config).solve(&instance).unwrap();

        assert_eq!(result.cost, 15.0);
        assert_eq!(result.termination, Some(Termination::Optimal));
        assert_eq!(result.remaining_states, Some(0));
    }

    #[test]
    fn test_silent_observer_matches_logging_run() {
        let instance = scenario_15();
        let seeded = || solver(5.0).with_initial_tour(Box::new(FixedTour::new(vec![0, 2, 3, 1, 4])));

        let logged = seeded().solve(&instance).unwrap();
        let silent = seeded().solve_with_observer(&instance, &mut NoopObserver).unwrap();

        assert_eq!(logged.cost, silent.cost);
        assert_eq!(logged.total_states, silent.total_states);
        assert_eq!(logged.pruned_states, silent.pruned_states);
    }

    #[test]
    fn test_zero_budget_keeps_seed_tour() {
        let instance = scenario_15();
        let result = solver(0.0)
            .with_initial_tour(Box::new(FixedTour::new(vec![0, 2, 3, 1, 4])))
            .solve(&instance)
            .unwrap();

        assert_eq!(result.termination, Some(Termination::TimeLimit));
        assert_eq!(result.cost, 24.0);
        assert_eq!(result.count, 0);
        assert_eq!(result.total_states, Some(1));
        assert_eq!(result.remaining_states, Some(1));
    }

    #[test]
    fn test_trivial_instances() {
        let empty = TspInstance::from_matrix("empty", vec![]).unwrap();
        let result = solver(1.0).solve(&empty).unwrap();
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.termination, Some(Termination::Trivial));

        let single = TspInstance::from_matrix("single", vec![vec![0.0]]).unwrap();
        let result = solver(1.0).solve(&single).unwrap();
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.solution.tour, vec![0]);
    }

    #[test]
    fn test_two_cities() {
        let instance = TspInstance::from_matrix("pair", vec![
            vec![0.0, 3.0],
            vec![4.0, 0.0],
        ]).unwrap();
        let result = solver(1.0).solve(&instance).unwrap();

        assert_eq!(result.cost, 7.0);
        assert_eq!(result.termination, Some(Termination::Optimal));
    }

    #[test]
    fn test_other_start_city() {
        let instance = scenario_15();
        let config = BnbConfig { start_city: 3, time_limit: 5.0, ..Default::default() };
        let result = BranchAndBound::new(config)
            .with_initial_tour(Box::new(FixedTour::new(vec![0, 2, 3, 1, 4])))
            .solve(&instance)
            .unwrap();

        assert_eq!(result.cost, 15.0);
        assert_eq!(result.solution.tour[0], 3);
    }

    #[test]
    fn test_start_city_out_of_range() {
        let config = BnbConfig { start_city: 9, ..Default::default() };
        assert!(BranchAndBound::new(config).solve(&scenario_15()).is_err());
    }
}
