//! Branch-and-Bound TSP Solver - Command Line Interface
//!
//! Solves asymmetric TSP instances read from files or generated at random.

use clap::{Parser, Subcommand, ValueEnum};
use bnb_tsp_solver::benchmark::{Benchmark, BenchmarkConfig, load_instances_from_dir};
use bnb_tsp_solver::bnb::{BnbConfig, BranchAndBound};
use bnb_tsp_solver::heuristics::RandomTour;
use bnb_tsp_solver::instance::{self, ScenarioGenerator, TspInstance};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bnb-tsp-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Branch-and-bound solver for the asymmetric TSP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one instance
    Solve {
        /// Instance file (TSP-LIB subset); a random scenario is generated when omitted
        #[arg(short, long)]
        instance: Option<PathBuf>,

        /// Number of cities of the generated scenario
        #[arg(short, long, default_value = "15")]
        cities: usize,

        /// Difficulty of the generated scenario
        #[arg(short, long, value_enum, default_value = "hard")]
        difficulty: Difficulty,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "bnb")]
        algorithm: Algorithm,

        /// Time limit in seconds
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Random seed (scenario and random seed tour)
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// City every tour starts from
        #[arg(long, default_value = "0")]
        start_city: usize,

        /// Output result to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a random scenario and write it to a file
    Generate {
        #[arg(short, long)]
        cities: usize,

        #[arg(short, long, value_enum, default_value = "hard")]
        difficulty: Difficulty,

        #[arg(short, long, default_value = "42")]
        seed: u64,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run benchmarks on generated scenarios or a directory of instances
    Benchmark {
        /// Directory containing instance files; scenarios are generated when omitted
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Scenario sizes
        #[arg(long, value_delimiter = ',', default_value = "5,8,10,12")]
        sizes: Vec<usize>,

        /// Scenarios per size
        #[arg(short, long, default_value = "3")]
        runs: usize,

        #[arg(short, long, value_enum, default_value = "hard")]
        difficulty: Difficulty,

        /// Time limit per run
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Run instances one after the other
        #[arg(long)]
        sequential: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Branch-and-bound with reduced cost matrices
    Bnb,
    /// Random permutations until a valid tour is found
    Random,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl From<Difficulty> for instance::Difficulty {
    fn from(d: Difficulty) -> Self {
        match d {
            Difficulty::Easy => instance::Difficulty::Easy,
            Difficulty::Normal => instance::Difficulty::Normal,
            Difficulty::Hard => instance::Difficulty::Hard,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { instance, cities, difficulty, algorithm, time_limit, seed, start_city, output, verbose } => {
            solve_instance(instance.as_deref(), cities, difficulty, algorithm, time_limit, seed, start_city, output, verbose)
        }

        Commands::Generate { cities, difficulty, seed, output } => {
            generate_instance(cities, difficulty, seed, &output)
        }

        Commands::Benchmark { dir, sizes, runs, difficulty, time_limit, output, sequential } => {
            run_benchmark(dir.as_deref(), sizes, runs, difficulty, time_limit, &output, !sequential)
        }

        Commands::Analyze { instance } => analyze_instance(&instance),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: Option<&Path>,
    cities: usize,
    difficulty: Difficulty,
    algorithm: Algorithm,
    time_limit: f64,
    seed: u64,
    start_city: usize,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<(), String> {
    let instance = match path {
        Some(path) => {
            println!("Loading instance from {:?}...", path);
            TspInstance::from_file(path)?
        }
        None => ScenarioGenerator::new(difficulty.into(), seed).generate(cities),
    };

    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Solving {} with {:?} algorithm...", instance.name, algorithm);

    let result = match algorithm {
        Algorithm::Bnb => {
            let config = BnbConfig {
                time_limit,
                seed,
                start_city,
                ..Default::default()
            };
            BranchAndBound::new(config).solve(&instance)?
        }
        Algorithm::Random => RandomTour::new(seed).solve(&instance, time_limit),
    };

    println!("\n========== Results ==========");
    println!("{}", result);

    if verbose && result.found_tour() {
        let names: Vec<String> = result.solution.cities(&instance)
            .iter()
            .map(|c| format!("{}({:.0},{:.0})", c.id, c.x, c.y))
            .collect();
        println!("Cities: {}", names.join(" -> "));
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| format!("Cannot serialize result: {}", e))?;
        std::fs::write(&out_path, json).map_err(|e| format!("Failed to write output: {}", e))?;
        println!("\nResult saved to {:?}", out_path);
    }

    Ok(())
}

fn generate_instance(cities: usize, difficulty: Difficulty, seed: u64, output: &Path) -> Result<(), String> {
    let instance = ScenarioGenerator::new(difficulty.into(), seed).generate(cities);
    instance.to_file(output)?;
    println!("Wrote {} ({} cities) to {:?}", instance.name, cities, output);
    Ok(())
}

fn run_benchmark(
    dir: Option<&Path>,
    sizes: Vec<usize>,
    runs: usize,
    difficulty: Difficulty,
    time_limit: f64,
    output: &Path,
    parallel: bool,
) -> Result<(), String> {
    let config = BenchmarkConfig {
        sizes,
        num_runs: runs,
        difficulty: difficulty.into(),
        time_limit,
        parallel,
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);

    match dir {
        Some(dir) => {
            let instances = load_instances_from_dir(dir);
            if instances.is_empty() {
                return Err(format!("No instances found in {:?}", dir));
            }
            println!("Found {} instances", instances.len());
            benchmark.run_on_instances(&instances);
        }
        None => benchmark.run(),
    }

    println!("\n{}", benchmark.generate_report());

    for path in benchmark.save()? {
        println!("Saved {:?}", path);
    }

    Ok(())
}

fn analyze_instance(path: &Path) -> Result<(), String> {
    let instance = TspInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let quick = RandomTour::default().solve(&instance, 5.0);
    println!("Random tour estimate: {:.2} after {} permutations", quick.cost, quick.count);

    Ok(())
}
