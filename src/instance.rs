//! Module for parsing, generating and representing TSP instances.
//!
//! An instance is an ordered list of cities together with a directed cost
//! function. Costs may be asymmetric and some pairs may be unreachable, which
//! is encoded as `f64::INFINITY`. Instances can be read from a TSP-LIB subset
//! (explicit full matrices or Euclidean coordinates) or generated at random.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Represents a city (location) of the instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// City identifier (1-indexed in files, 0-indexed internally)
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Elevation, used by asymmetric scenarios (uphill costs more)
    pub elevation: f64,
}

impl City {
    pub fn new(id: usize, x: f64, y: f64, elevation: f64) -> Self {
        City { id, x, y, elevation }
    }

    /// Straight-line distance in the plane
    pub fn distance_to(&self, other: &City) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Represents a complete asymmetric TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TspInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Ordered list of cities, immutable during a search
    pub cities: Vec<City>,
    /// Directed cost matrix, `costs[i][j]` is the cost of travelling from i to j.
    /// The diagonal is always infinite.
    costs: Vec<Vec<f64>>,
}

impl TspInstance {
    /// Build an instance from an explicit cost matrix.
    ///
    /// The matrix must be square with non-negative entries; `f64::INFINITY`
    /// marks an unreachable pair. Diagonal entries are ignored.
    pub fn from_matrix(name: &str, rows: Vec<Vec<f64>>) -> Result<Self, String> {
        let cities = (0..rows.len()).map(|i| City::new(i, i as f64, 0.0, 0.0)).collect();
        Self::with_cities(name, cities, rows)
    }

    /// Build an instance from cities and a matching cost matrix
    pub fn with_cities(name: &str, cities: Vec<City>, mut rows: Vec<Vec<f64>>) -> Result<Self, String> {
        let n = rows.len();
        if cities.len() != n {
            return Err(format!("{} cities but a {}-row cost matrix", cities.len(), n));
        }

        for (i, row) in rows.iter_mut().enumerate() {
            if row.len() != n {
                return Err(format!("Cost matrix is not square: row {} has {} entries, expected {}", i, row.len(), n));
            }
            for (j, cost) in row.iter_mut().enumerate() {
                if i == j {
                    *cost = f64::INFINITY;
                    continue;
                }
                if cost.is_nan() {
                    return Err(format!("Cost from {} to {} is NaN", i, j));
                }
                if *cost < 0.0 {
                    return Err(format!("Cost from {} to {} is negative ({})", i, j, cost));
                }
            }
        }

        Ok(TspInstance {
            name: name.to_string(),
            comment: String::new(),
            cities,
            costs: rows,
        })
    }

    /// Build a symmetric instance from planar coordinates.
    ///
    /// City `i` must carry id `i`; non-finite coordinates are rejected.
    pub fn from_coordinates(name: &str, cities: Vec<City>) -> Result<Self, String> {
        for (i, city) in cities.iter().enumerate() {
            if city.id != i {
                return Err(format!("City at position {} has id {}", i, city.id));
            }
            if !city.x.is_finite() || !city.y.is_finite() {
                return Err(format!("City {} has non-finite coordinates ({}, {})", i, city.x, city.y));
            }
        }
        let costs = Self::compute_distance_matrix(&cities);
        Self::with_cities(name, cities, costs)
    }

    /// Parse an instance from a TSP-LIB format file.
    ///
    /// Supported: `EDGE_WEIGHT_TYPE: EUC_2D` with a `NODE_COORD_SECTION`, and
    /// `EDGE_WEIGHT_TYPE: EXPLICIT` with `EDGE_WEIGHT_FORMAT: FULL_MATRIX`.
    /// In explicit matrices `inf` or `-` denotes an unreachable pair.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let file = File::open(&path)
            .map_err(|e| format!("Cannot open file: {}", e))?;
        let reader = BufReader::new(file);

        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension = 0usize;
        let mut explicit = false;
        let mut coords: Vec<City> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();

        let mut section = String::new();

        for line in reader.lines() {
            let line = line.map_err(|e| format!("Read error: {}", e))?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if line.ends_with("_SECTION") {
                section = line.to_string();
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => {
                        name = value.to_string();
                        continue;
                    }
                    "COMMENT" => {
                        comment = value.to_string();
                        continue;
                    }
                    "DIMENSION" => {
                        dimension = value.parse().map_err(|_| "Invalid dimension")?;
                        continue;
                    }
                    "EDGE_WEIGHT_TYPE" => {
                        explicit = match value {
                            "EXPLICIT" => true,
                            "EUC_2D" => false,
                            other => return Err(format!("Unsupported edge weight type: {}", other)),
                        };
                        continue;
                    }
                    "EDGE_WEIGHT_FORMAT" => {
                        if value != "FULL_MATRIX" {
                            return Err(format!("Unsupported edge weight format: {}", value));
                        }
                        continue;
                    }
                    "TYPE" => continue,
                    _ => {}
                }
            }

            match section.as_str() {
                "NODE_COORD_SECTION" => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() >= 3 {
                        let id: usize = parts[0].parse().map_err(|_| "Invalid node id")?;
                        let x: f64 = parts[1].parse().map_err(|_| "Invalid x coordinate")?;
                        let y: f64 = parts[2].parse().map_err(|_| "Invalid y coordinate")?;
                        let z: f64 = match parts.get(3) {
                            Some(token) => token.parse().map_err(|_| "Invalid elevation")?,
                            None => 0.0,
                        };
                        if id == 0 {
                            return Err("Node ids are 1-indexed".to_string());
                        }
                        coords.push(City::new(id - 1, x, y, z));
                    }
                }
                "EDGE_WEIGHT_SECTION" => {
                    for token in line.split_whitespace() {
                        weights.push(parse_weight(token)?);
                    }
                }
                _ => {}
            }
        }

        if name.is_empty() {
            name = path.as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }

        coords.sort_by_key(|city| city.id);
        if let Some((i, city)) = coords.iter().enumerate().find(|(i, city)| city.id != *i) {
            return Err(format!("Node ids must be 1..{} without gaps, found {} at rank {}", coords.len(), city.id + 1, i + 1));
        }

        let mut instance = if explicit {
            let expected = dimension.checked_mul(dimension)
                .ok_or_else(|| format!("Dimension {} too large", dimension))?;
            if weights.len() != expected {
                return Err(format!(
                    "Expected {} edge weights for dimension {}, found {}",
                    expected, dimension, weights.len()
                ));
            }
            let rows: Vec<Vec<f64>> = weights.chunks(dimension.max(1))
                .take(dimension)
                .map(|row| row.to_vec())
                .collect();
            let cities = if coords.len() == dimension {
                coords
            } else {
                (0..dimension).map(|i| City::new(i, i as f64, 0.0, 0.0)).collect()
            };
            Self::with_cities(&name, cities, rows)?
        } else {
            if coords.len() != dimension {
                return Err(format!("Expected {} coordinates, found {}", dimension, coords.len()));
            }
            Self::from_coordinates(&name, coords)?
        };

        instance.comment = comment;
        Ok(instance)
    }

    /// Write the instance as an explicit full matrix TSP-LIB file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let n = self.dimension();
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "NAME: {}", self.name);
        if !self.comment.is_empty() {
            let _ = writeln!(out, "COMMENT: {}", self.comment);
        }
        let _ = writeln!(out, "TYPE: ATSP");
        let _ = writeln!(out, "DIMENSION: {}", n);
        let _ = writeln!(out, "EDGE_WEIGHT_TYPE: EXPLICIT");
        let _ = writeln!(out, "EDGE_WEIGHT_FORMAT: FULL_MATRIX");
        let _ = writeln!(out, "NODE_COORD_SECTION");
        for city in &self.cities {
            let _ = writeln!(out, "{} {} {} {}", city.id + 1, city.x, city.y, city.elevation);
        }
        let _ = writeln!(out, "EDGE_WEIGHT_SECTION");
        for row in &self.costs {
            let line: Vec<String> = row.iter()
                .map(|&c| if c.is_finite() { c.to_string() } else { "inf".to_string() })
                .collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }
        let _ = writeln!(out, "EOF");

        std::fs::write(path, out).map_err(|e| format!("Cannot write file: {}", e))
    }

    /// Compute Euclidean distance matrix
    fn compute_distance_matrix(cities: &[City]) -> Vec<Vec<f64>> {
        let n = cities.len();
        let mut matrix = vec![vec![f64::INFINITY; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    matrix[i][j] = cities[i].distance_to(&cities[j]);
                }
            }
        }

        matrix
    }

    /// Number of cities
    #[inline]
    pub fn dimension(&self) -> usize {
        self.cities.len()
    }

    /// Get the directed cost from city `i` to city `j`
    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.costs[i][j]
    }

    /// The ordered city list
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Calculate the cost of a closed tour (implicitly returns to its first city).
    /// Any unreachable leg makes the whole tour infinite.
    pub fn tour_cost(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut cost = 0.0;
        for pair in tour.windows(2) {
            cost += self.cost(pair[0], pair[1]);
        }

        cost += self.cost(tour[tour.len() - 1], tour[0]);

        cost
    }

    /// Whether `cost(i, j) == cost(j, i)` for every pair
    pub fn is_symmetric(&self) -> bool {
        let n = self.dimension();
        (0..n).all(|i| (i + 1..n).all(|j| self.costs[i][j] == self.costs[j][i]))
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension();
        let finite: Vec<f64> = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| self.cost(i, j))
            .filter(|c| c.is_finite())
            .collect();

        let directed_edges = n * n.saturating_sub(1);
        let avg_cost = if finite.is_empty() {
            0.0
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };
        let max_cost = finite.iter().cloned().fold(0.0, f64::max);
        let min_cost = finite.iter().cloned().fold(f64::INFINITY, f64::min);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            reachable_edges: finite.len(),
            unreachable_edges: directed_edges - finite.len(),
            symmetric: self.is_symmetric(),
            avg_cost,
            min_cost: if finite.is_empty() { 0.0 } else { min_cost },
            max_cost,
        }
    }
}

fn parse_weight(token: &str) -> Result<f64, String> {
    match token {
        "-" | "inf" | "INF" | "Inf" | "infinity" => Ok(f64::INFINITY),
        _ => token.parse().map_err(|_| format!("Invalid edge weight: {}", token)),
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub reachable_edges: usize,
    pub unreachable_edges: usize,
    pub symmetric: bool,
    pub avg_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.dimension)?;
        writeln!(f, "  Symmetric: {}", self.symmetric)?;
        writeln!(f, "  Reachable edges: {}", self.reachable_edges)?;
        writeln!(f, "  Unreachable edges: {}", self.unreachable_edges)?;
        writeln!(f, "  Min cost: {:.2}", self.min_cost)?;
        writeln!(f, "  Avg cost: {:.2}", self.avg_cost)?;
        writeln!(f, "  Max cost: {:.2}", self.max_cost)
    }
}

/// Scenario difficulty for randomly generated instances
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Difficulty {
    /// Symmetric Euclidean distances
    Easy,
    /// Asymmetric: climbing costs more than descending
    Normal,
    /// Asymmetric with a share of directed edges removed
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        };
        f.write_str(label)
    }
}

/// Random scenario generator. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    pub difficulty: Difficulty,
    pub seed: u64,
    /// Width of the placement area
    pub width: f64,
    /// Height of the placement area
    pub height: f64,
    /// Elevations are drawn from `[0, max_elevation)`
    pub max_elevation: f64,
    /// Share of directed edges removed in `Hard` scenarios
    pub removal_rate: f64,
}

impl Default for ScenarioGenerator {
    fn default() -> Self {
        ScenarioGenerator {
            difficulty: Difficulty::Hard,
            seed: 42,
            width: 1000.0,
            height: 1000.0,
            max_elevation: 100.0,
            removal_rate: 0.2,
        }
    }
}

impl ScenarioGenerator {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        ScenarioGenerator {
            difficulty,
            seed,
            ..Default::default()
        }
    }

    /// Generate an instance with `n` cities
    pub fn generate(&self, n: usize) -> TspInstance {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let cities: Vec<City> = (0..n)
            .map(|id| {
                let x = rng.gen_range(0.0..self.width);
                let y = rng.gen_range(0.0..self.height);
                let z = if self.difficulty == Difficulty::Easy {
                    0.0
                } else {
                    rng.gen_range(0.0..self.max_elevation.max(f64::MIN_POSITIVE))
                };
                City::new(id, x, y, z)
            })
            .collect();

        let name = format!("{}-{}-{}", self.difficulty, n, self.seed);

        let mut instance = match self.difficulty {
            Difficulty::Easy => {
                let costs = TspInstance::compute_distance_matrix(&cities);
                TspInstance { name, comment: String::new(), cities, costs }
            }
            Difficulty::Normal | Difficulty::Hard => {
                let costs = Self::elevation_costs(&cities);
                TspInstance { name, comment: String::new(), cities, costs }
            }
        };

        if self.difficulty == Difficulty::Hard && n > 2 {
            self.remove_edges(&mut instance, &mut rng);
        }

        instance.comment = format!("{} scenario, seed {}", self.difficulty, self.seed);
        instance
    }

    /// Climbing is charged on top of the distance, descending earns a partial
    /// discount bounded below by half the flat distance.
    fn elevation_costs(cities: &[City]) -> Vec<Vec<f64>> {
        let n = cities.len();
        let mut matrix = vec![vec![f64::INFINITY; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dist = cities[i].distance_to(&cities[j]);
                let climb = cities[j].elevation - cities[i].elevation;
                let slope = if climb > 0.0 { climb } else { 0.5 * climb };
                matrix[i][j] = (dist + slope).max(0.5 * dist);
            }
        }

        matrix
    }

    /// Remove random directed edges, keeping one hidden Hamiltonian cycle intact
    fn remove_edges(&self, instance: &mut TspInstance, rng: &mut ChaCha8Rng) {
        let n = instance.dimension();

        let mut hidden: Vec<usize> = (0..n).collect();
        hidden.shuffle(rng);
        let mut protected = vec![vec![false; n]; n];
        for k in 0..n {
            protected[hidden[k]][hidden[(k + 1) % n]] = true;
        }

        for i in 0..n {
            for j in 0..n {
                if i != j && !protected[i][j] && rng.gen_bool(self.removal_rate.clamp(0.0, 1.0)) {
                    instance.costs[i][j] = f64::INFINITY;
                }
            }
        }
    }
}
