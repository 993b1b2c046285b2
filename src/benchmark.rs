//! Benchmarking and experimentation module.
//!
//! Runs the random tour and branch-and-bound on batches of instances,
//! collects per-run rows, aggregates them per algorithm and size, and exports
//! CSV tables and a text report.

use crate::bnb::{BnbConfig, BranchAndBound, NoopObserver, Termination};
use crate::heuristics::RandomTour;
use crate::instance::{Difficulty, ScenarioGenerator, TspInstance};
use crate::results::SolveResult;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of cities
    pub dimension: usize,
    /// Tour cost (infinite when no tour was found)
    pub cost: f64,
    /// Whether a complete finite tour was found
    pub feasible: bool,
    /// Whether optimality was proven
    pub optimal: bool,
    /// Computation time in seconds
    pub time: f64,
    /// Improved solutions (branch-and-bound) or permutations tried (random tour)
    pub count: usize,
    pub max_queue_size: Option<usize>,
    pub total_states: Option<usize>,
    pub pruned_states: Option<usize>,
    pub remaining_states: Option<usize>,
}

impl AlgorithmResult {
    fn from_result(instance: &TspInstance, result: &SolveResult) -> Self {
        AlgorithmResult {
            algorithm: result.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension(),
            cost: result.cost,
            feasible: result.solution.feasible,
            optimal: matches!(result.termination, Some(Termination::Optimal | Termination::Trivial)),
            time: result.time,
            count: result.count,
            max_queue_size: result.max_queue_size,
            total_states: result.total_states,
            pruned_states: result.pruned_states,
            remaining_states: result.remaining_states,
        }
    }
}

/// Aggregated statistics for an algorithm on instances of one size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub dimension: usize,
    /// Number of runs
    pub num_runs: usize,
    /// Runs that found a tour
    pub num_feasible: usize,
    /// Runs that proved optimality
    pub num_optimal: usize,
    /// Average cost over feasible runs
    pub avg_cost: f64,
    pub best_cost: f64,
    /// Population standard deviation of the cost over feasible runs
    pub std_cost: f64,
    pub avg_time: f64,
    /// Average number of states created, when applicable
    pub avg_states: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Instance sizes for generated scenarios
    pub sizes: Vec<usize>,
    /// Generated scenarios per size (seeds 0..n)
    pub num_runs: usize,
    /// Difficulty of generated scenarios
    pub difficulty: Difficulty,
    /// Time limit per run in seconds
    pub time_limit: f64,
    /// Run instances in parallel
    pub parallel: bool,
    /// Draw a progress bar
    pub show_progress: bool,
    /// Directory written by [`Benchmark::save`]
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            sizes: vec![5, 8, 10, 12],
            num_runs: 3,
            difficulty: Difficulty::Hard,
            time_limit: 60.0,
            parallel: true,
            show_progress: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Generate the configured scenarios
    pub fn generate_instances(&self) -> Vec<TspInstance> {
        let mut instances = Vec::new();
        for &size in &self.config.sizes {
            for seed in 0..self.config.num_runs as u64 {
                instances.push(ScenarioGenerator::new(self.config.difficulty, seed).generate(size));
            }
        }
        instances
    }

    /// Run every algorithm on one instance
    pub fn run_instance(&self, instance: &TspInstance) -> Result<Vec<AlgorithmResult>, String> {
        let random = RandomTour::default().solve(instance, self.config.time_limit);

        let bnb_config = BnbConfig {
            time_limit: self.config.time_limit,
            ..Default::default()
        };
        let bnb = BranchAndBound::new(bnb_config).solve_with_observer(instance, &mut NoopObserver)?;

        Ok(vec![
            AlgorithmResult::from_result(instance, &random),
            AlgorithmResult::from_result(instance, &bnb),
        ])
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[TspInstance]) {
        log::info!("Running benchmark on {} instances", instances.len());

        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(instances.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let run_one = |instance: &TspInstance| {
            let rows = match self.run_instance(instance) {
                Ok(rows) => rows,
                Err(e) => {
                    log::error!("Benchmark run on {} failed: {}", instance.name, e);
                    Vec::new()
                }
            };
            progress.inc(1);
            rows
        };

        let rows: Vec<Vec<AlgorithmResult>> = if self.config.parallel {
            instances.par_iter().map(run_one).collect()
        } else {
            instances.iter().map(run_one).collect()
        };

        progress.finish_with_message("done");
        self.results.extend(rows.into_iter().flatten());
    }

    /// Generate the configured scenarios and run them
    pub fn run(&mut self) {
        let instances = self.generate_instances();
        self.run_on_instances(&instances);
    }

    /// Compute statistics for each algorithm and size
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut groups: BTreeMap<(String, usize), Vec<&AlgorithmResult>> = BTreeMap::new();

        for result in &self.results {
            groups.entry((result.algorithm.clone(), result.dimension))
                .or_default()
                .push(result);
        }

        groups.into_iter()
            .map(|((algorithm, dimension), results)| {
                let costs: Vec<f64> = results.iter()
                    .filter(|r| r.feasible)
                    .map(|r| r.cost)
                    .collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let states: Vec<f64> = results.iter()
                    .filter_map(|r| r.total_states)
                    .map(|s| s as f64)
                    .collect();

                let (avg_cost, std_cost) = if costs.is_empty() {
                    (f64::INFINITY, 0.0)
                } else {
                    (Statistics::mean(costs.iter()), Statistics::population_std_dev(costs.iter()))
                };

                AlgorithmStatistics {
                    algorithm,
                    dimension,
                    num_runs: results.len(),
                    num_feasible: costs.len(),
                    num_optimal: results.iter().filter(|r| r.optimal).count(),
                    avg_cost,
                    best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                    std_cost,
                    avg_time: Statistics::mean(times.iter()),
                    avg_states: if states.is_empty() { None } else { Some(Statistics::mean(states.iter())) },
                }
            })
            .collect()
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let file = File::create(path).map_err(|e| format!("Cannot create CSV file: {}", e))?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result).map_err(|e| format!("CSV error: {}", e))?;
        }

        writer.flush().map_err(|e| format!("CSV error: {}", e))
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let file = File::create(path).map_err(|e| format!("Cannot create CSV file: {}", e))?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat).map_err(|e| format!("CSV error: {}", e))?;
        }

        writer.flush().map_err(|e| format!("CSV error: {}", e))
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("   Branch-and-Bound TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        report.push_str("-".repeat(92).as_str());
        report.push('\n');
        report.push_str(&format!("{:<16} {:>5} {:>10} {:>10} {:>12} {:>12} {:>10} {:>12}\n",
            "Algorithm", "N", "Feasible", "Optimal", "Avg Cost", "Best Cost", "Avg Time", "Avg States"));
        report.push_str("-".repeat(92).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            let states = stat.avg_states
                .map(|s| format!("{:.0}", s))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!("{:<16} {:>5} {:>10} {:>10} {:>12.2} {:>12.2} {:>10.4} {:>12}\n",
                stat.algorithm,
                stat.dimension,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                format!("{}/{}", stat.num_optimal, stat.num_runs),
                stat.avg_cost,
                stat.best_cost,
                stat.avg_time,
                states));
        }

        report.push_str("-".repeat(92).as_str());
        report.push('\n');

        report
    }

    /// Write `results.csv`, `statistics.csv` and `report.txt` into the
    /// configured output directory and return the written paths
    pub fn save(&self) -> Result<Vec<PathBuf>, String> {
        let dir = Path::new(&self.config.output_dir);
        std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create output directory: {}", e))?;

        let results_path = dir.join("results.csv");
        self.export_to_csv(&results_path)?;

        let stats_path = dir.join("statistics.csv");
        self.export_statistics_csv(&stats_path)?;

        let report_path = dir.join("report.txt");
        std::fs::write(&report_path, self.generate_report())
            .map_err(|e| format!("Failed to save report: {}", e))?;

        log::info!("Benchmark output written to {:?}", dir);
        Ok(vec![results_path, stats_path, report_path])
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Helper function to load instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<TspInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tsp" || e == "atsp").unwrap_or(false) {
                match TspInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
    }

    // Sort by dimension
    instances.sort_by_key(|i| i.dimension());

    instances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BenchmarkConfig {
        BenchmarkConfig {
            sizes: vec![4, 6],
            num_runs: 2,
            difficulty: Difficulty::Normal,
            time_limit: 10.0,
            parallel: false,
            show_progress: false,
            output_dir: std::env::temp_dir()
                .join(format!("bnb-tsp-bench-{}", std::process::id()))
                .to_string_lossy()
                .to_string(),
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 3);
        assert_eq!(config.time_limit, 60.0);
    }

    #[test]
    fn test_run_collects_both_algorithms() {
        let mut benchmark = Benchmark::new(small_config());
        benchmark.run();

        // 2 sizes x 2 seeds x 2 algorithms
        assert_eq!(benchmark.results().len(), 8);
        for row in benchmark.results().iter().filter(|r| r.algorithm == BranchAndBound::NAME) {
            assert!(row.optimal);
            assert!(row.total_states.is_some());
        }
        for row in benchmark.results().iter().filter(|r| r.algorithm == "RandomTour") {
            assert!(row.total_states.is_none());
        }

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 4);
        for stat in &stats {
            assert_eq!(stat.num_runs, 2);
        }

        let bnb_6 = stats.iter()
            .find(|s| s.algorithm == BranchAndBound::NAME && s.dimension == 6)
            .unwrap();
        let random_6 = stats.iter()
            .find(|s| s.algorithm == "RandomTour" && s.dimension == 6)
            .unwrap();
        assert!(bnb_6.avg_cost <= random_6.avg_cost + 1e-9);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut sequential = Benchmark::new(small_config());
        sequential.run();

        let mut parallel = Benchmark::new(BenchmarkConfig { parallel: true, ..small_config() });
        parallel.run();

        let costs = |b: &Benchmark| b.results().iter().map(|r| r.cost).collect::<Vec<_>>();
        assert_eq!(costs(&sequential), costs(&parallel));
    }

    #[test]
    fn test_export_and_report() {
        let mut benchmark = Benchmark::new(small_config());
        benchmark.run();

        let path = std::env::temp_dir().join(format!("bnb-tsp-bench-{}.csv", std::process::id()));
        benchmark.export_to_csv(&path).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(csv.starts_with("algorithm,instance,dimension"));
        assert_eq!(csv.lines().count(), 1 + benchmark.results().len());

        let report = benchmark.generate_report();
        assert!(report.contains(BranchAndBound::NAME));
        assert!(report.contains("RandomTour"));
    }

    #[test]
    fn test_save_writes_into_output_dir() {
        let dir = std::env::temp_dir().join(format!("bnb-tsp-save-{}", std::process::id()));
        let config = BenchmarkConfig {
            sizes: vec![4],
            num_runs: 1,
            output_dir: dir.to_string_lossy().to_string(),
            ..small_config()
        };
        let mut benchmark = Benchmark::new(config);
        benchmark.run();

        let written = benchmark.save().unwrap();
        let all_exist = written.iter().all(|path| path.starts_with(&dir) && path.exists());
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(written.len(), 3);
        assert!(all_exist);
    }

    #[test]
    fn test_trivial_run_counts_as_optimal() {
        let single = TspInstance::from_matrix("single", vec![vec![0.0]]).unwrap();
        let result = BranchAndBound::default().solve(&single).unwrap();
        assert_eq!(result.termination, Some(Termination::Trivial));

        let row = AlgorithmResult::from_result(&single, &result);
        assert!(row.optimal);
        assert!(row.feasible);
    }
}
