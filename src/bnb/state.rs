//! Search states of the branch-and-bound tree.
//!
//! A [`SearchState`] is a partial tour together with its own reduced cost
//! matrix and a lower bound on every complete tour extending the path. States
//! are immutable once built: branching copies the parent's matrix and path.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::instance::TspInstance;
use crate::matrix::CostMatrix;

/// Node of the search tree
#[derive(Debug, Clone)]
pub struct SearchState {
    id: usize,
    matrix: CostMatrix,
    lower_bound: f64,
    path: Vec<usize>,
    visited: Vec<bool>,
}

impl SearchState {
    /// Root state: the reduced initial matrix with the path `[start]`
    pub fn root(instance: &TspInstance, start: usize, id: usize) -> Result<Self, String> {
        let n = instance.dimension();
        if start >= n {
            return Err(format!("Start city {} out of range for {} cities", start, n));
        }

        let mut visited = vec![false; n];
        visited[start] = true;

        SearchState {
            id,
            matrix: CostMatrix::from_instance(instance),
            lower_bound: 0.0,
            path: vec![start],
            visited,
        }
        .tighten()
    }

    /// Child state reached by travelling from the last city of the path to `next`
    pub fn branch(&self, next: usize, id: usize) -> Result<Self, String> {
        let n = self.matrix.dimension();
        if next >= n {
            return Err(format!("City {} out of range for {} cities", next, n));
        }
        if self.visited[next] {
            return Err(format!("City {} is already on the path", next));
        }

        let last = self.last_city();
        let mut matrix = self.matrix.clone();
        let lower_bound = self.lower_bound + matrix.get(last, next);

        // Going straight back is only legal when it closes a two-city tour.
        if self.path.len() + 1 < n {
            matrix.set(next, last, f64::INFINITY);
        }
        matrix.block_row(last);
        matrix.block_column(next);

        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(next);

        let mut visited = self.visited.clone();
        visited[next] = true;

        SearchState { id, matrix, lower_bound, path, visited }.tighten()
    }

    /// Reduce the matrix into the bound, then rule out dead ends
    fn tighten(mut self) -> Result<Self, String> {
        self.lower_bound += self.matrix.reduce()?;
        if self.has_dead_end() {
            self.lower_bound = f64::INFINITY;
        }
        Ok(self)
    }

    /// True when some city that still has to be left, or entered, has no
    /// allowed edge left in the matrix.
    fn has_dead_end(&self) -> bool {
        let start = self.path[0];
        let last = self.last_city();

        (0..self.matrix.dimension()).any(|city| {
            let must_leave = city == last || !self.visited[city];
            let must_enter = city == start || !self.visited[city];
            (must_leave && self.matrix.is_row_blocked(city))
                || (must_enter && self.matrix.is_column_blocked(city))
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn last_city(&self) -> usize {
        self.path[self.path.len() - 1]
    }

    pub fn contains(&self, city: usize) -> bool {
        self.visited.get(city).copied().unwrap_or(false)
    }

    /// Every city is on the path
    pub fn is_complete(&self) -> bool {
        self.path.len() == self.matrix.dimension()
    }

    /// Bound per visited city; deep, tight states come out first
    pub fn priority(&self) -> f64 {
        self.lower_bound / self.path.len() as f64
    }
}

/// Priority queue entry ordered for a max-heap so the smallest
/// [`SearchState::priority`] pops first, ties going to the earliest insertion.
#[derive(Debug)]
pub struct QueuedState {
    key: OrderedFloat<f64>,
    sequence: u64,
    state: SearchState,
}

impl QueuedState {
    pub fn new(state: SearchState, sequence: u64) -> Self {
        QueuedState {
            key: OrderedFloat(state.priority()),
            sequence,
            state,
        }
    }

    pub fn into_state(self) -> SearchState {
        self.state
    }
}

impl Ord for QueuedState {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key.cmp(&self.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedState {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BinaryHeap;

    const INF: f64 = f64::INFINITY;

    fn random_instance(n: usize, seed: u64) -> TspInstance {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            0.0
                        } else if rng.gen_bool(0.15) {
                            INF
                        } else {
                            rng.gen_range(1..=20) as f64
                        }
                    })
                    .collect::<Vec<f64>>()
            })
            .collect();
        TspInstance::from_matrix("random", rows).unwrap()
    }

    fn complete_instance(n: usize) -> TspInstance {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| ((i * 7 + j * 3) % 11 + 1) as f64).collect())
            .collect();
        TspInstance::from_matrix("complete", rows).unwrap()
    }

    /// Cheapest closed tour that starts with `prefix`, by enumeration
    fn best_completion(instance: &TspInstance, prefix: &[usize]) -> f64 {
        fn extend(instance: &TspInstance, path: &mut Vec<usize>, used: &mut [bool], best: &mut f64) {
            if path.len() == instance.dimension() {
                *best = best.min(instance.tour_cost(path));
                return;
            }
            for next in 0..instance.dimension() {
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
        for &c in prefix {
            used[c] = true;
        }
        let mut best = INF;
        extend(instance, &mut prefix.to_vec(), &mut used, &mut best);
        best
    }

    fn assert_bound_below(instance: &TspInstance, state: &SearchState) {
        let best = best_completion(instance, state.path());
        if best.is_finite() {
            assert!(
                state.lower_bound() <= best + 1e-9,
                "bound {} exceeds best completion {} for path {:?}",
                state.lower_bound(), best, state.path()
            );
        }
    }

    #[test]
    fn test_root_reduction() {
        let instance = TspInstance::from_matrix("r", vec![
            vec![0.0, 4.0, 6.0],
            vec![5.0, 0.0, 9.0],
            vec![2.0, 3.0, 0.0],
        ]).unwrap();
        let root = SearchState::root(&instance, 0, 0).unwrap();

        assert_eq!(root.path(), &[0]);
        assert_eq!(root.lower_bound(), 13.0);
        assert_eq!(root.priority(), 13.0);
        assert!(!root.is_complete());
    }

    #[test]
    fn test_branch_blocks_row_column_and_reverse_edge() {
        let instance = complete_instance(5);
        let root = SearchState::root(&instance, 0, 0).unwrap();
        let child = root.branch(3, 1).unwrap();

        assert_eq!(child.path(), &[0, 3]);
        assert_eq!(child.id(), 1);
        assert!(child.contains(3));
        assert!(child.matrix().is_row_blocked(0));
        assert!(child.matrix().is_column_blocked(3));
        assert_eq!(child.matrix().get(3, 0), INF);

        // the parent is untouched
        assert_eq!(root.path(), &[0]);
        assert!(!root.matrix().is_row_blocked(0));
    }

    #[test]
    fn test_branch_rejects_visited_city() {
        let instance = complete_instance(4);
        let root = SearchState::root(&instance, 0, 0).unwrap();
        assert!(root.branch(0, 1).is_err());
        assert!(root.branch(9, 1).is_err());
    }

    #[test]
    fn test_two_city_tour_stays_feasible() {
        let instance = TspInstance::from_matrix("pair", vec![
            vec![0.0, 3.0],
            vec![4.0, 0.0],
        ]).unwrap();
        let root = SearchState::root(&instance, 0, 0).unwrap();
        let child = root.branch(1, 1).unwrap();

        assert!(child.is_complete());
        assert_eq!(child.lower_bound(), 7.0);
    }

    #[test]
    fn test_unreachable_city_gives_infinite_bound() {
        let instance = TspInstance::from_matrix("dead", vec![
            vec![0.0, 1.0, 2.0, INF],
            vec![1.0, 0.0, 2.0, INF],
            vec![2.0, 1.0, 0.0, INF],
            vec![1.0, 1.0, 1.0, 0.0],
        ]).unwrap();
        let root = SearchState::root(&instance, 0, 0).unwrap();
        assert_eq!(root.lower_bound(), INF);
    }

    #[test]
    fn test_bound_validity_and_monotone_tightening() {
        for seed in 0..20 {
            let n = 3 + (seed as usize % 6);
            let instance = random_instance(n, seed);
            let root = SearchState::root(&instance, 0, 0).unwrap();
            assert_bound_below(&instance, &root);

            let mut frontier = vec![root];
            let mut id = 1;
            while let Some(state) = frontier.pop() {
                if state.is_complete() {
                    let cost = instance.tour_cost(state.path());
                    if cost.is_finite() {
                        assert!((state.lower_bound() - cost).abs() < 1e-9);
                    }
                    continue;
                }
                if !state.lower_bound().is_finite() || state.path().len() > 3 {
                    continue;
                }
                for next in 0..n {
                    if state.contains(next) {
                        continue;
                    }
                    let child = state.branch(next, id).unwrap();
                    id += 1;
                    assert!(child.lower_bound() >= state.lower_bound());
                    assert_bound_below(&instance, &child);
                    frontier.push(child);
                }
            }
        }
    }

    #[test]
    fn test_queue_order_and_tie_break() {
        let instance = TspInstance::from_matrix("q", vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ]).unwrap();
        let root = SearchState::root(&instance, 0, 0).unwrap();
        let a = root.branch(1, 1).unwrap();
        let b = root.branch(2, 2).unwrap();
        assert_eq!(a.priority(), b.priority());

        let mut heap = BinaryHeap::new();
        heap.push(QueuedState::new(root.clone(), 0));
        heap.push(QueuedState::new(b, 1));
        heap.push(QueuedState::new(a, 2));

        // root: 3/1, children: 3/2 each
        let first = heap.pop().unwrap().into_state();
        let second = heap.pop().unwrap().into_state();
        let third = heap.pop().unwrap().into_state();
        assert_eq!(first.id(), 2);
        assert_eq!(second.id(), 1);
        assert_eq!(third.id(), 0);
    }
}
