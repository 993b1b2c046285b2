//! Branch-and-Bound TSP Solver Library
//!
//! An exact solver for the asymmetric Traveling Salesman Problem based on
//! reduced cost matrices, with a wall-clock time budget.
//!
//! # Features
//!
//! - Asymmetric costs with unreachable pairs (infinite cost)
//! - Reduced-cost-matrix lower bounds with best-solution-so-far pruning
//! - Deterministic priority ordering (bound per depth, insertion order on ties)
//! - Pluggable seed tours (random permutation, fixed tour)
//! - Random scenario generation, TSP-LIB style file I/O and benchmarking
//!
//! # Example
//!
//! ```no_run
//! use bnb_tsp_solver::bnb::{BnbConfig, BranchAndBound};
//! use bnb_tsp_solver::instance::{Difficulty, ScenarioGenerator};
//!
//! let instance = ScenarioGenerator::new(Difficulty::Hard, 42).generate(15);
//!
//! let solver = BranchAndBound::new(BnbConfig { time_limit: 30.0, ..Default::default() });
//! let result = solver.solve(&instance).unwrap();
//!
//! println!("Tour cost: {:.2} ({} states)", result.cost, result.total_states.unwrap_or(0));
//! ```

pub mod instance;
pub mod matrix;
pub mod solution;
pub mod heuristics;
pub mod bnb;
pub mod results;
pub mod benchmark;

pub use instance::TspInstance;
pub use solution::Solution;
pub use results::SolveResult;
