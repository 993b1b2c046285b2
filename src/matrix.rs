//! Reduced cost matrices.
//!
//! A [`CostMatrix`] is a dense N×N matrix of non-negative costs where
//! `f64::INFINITY` marks a forbidden move. Reducing a matrix subtracts every
//! finite, non-zero row minimum and then every finite, non-zero column minimum,
//! returning the total subtracted: a lower bound on any tour through the
//! remaining allowed edges.

use crate::instance::TspInstance;

/// Dense row-major N×N cost matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    n: usize,
    cells: Vec<f64>,
}

impl CostMatrix {
    /// Matrix of the given dimension with every cell set to `value`
    pub fn filled(n: usize, value: f64) -> Self {
        CostMatrix { n, cells: vec![value; n * n] }
    }

    /// Initial, unreduced matrix: cell (i, j) is `cost(i, j)`, the diagonal is infinite
    pub fn from_instance(instance: &TspInstance) -> Self {
        let n = instance.dimension();
        let mut matrix = Self::filled(n, f64::INFINITY);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    matrix.set(i, j, instance.cost(i, j));
                }
            }
        }
        matrix
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.n + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.cells[row * self.n + col] = value;
    }

    /// Forbid every move out of `row`
    pub fn block_row(&mut self, row: usize) {
        let start = row * self.n;
        self.cells[start..start + self.n].fill(f64::INFINITY);
    }

    /// Forbid every move into `col`
    pub fn block_column(&mut self, col: usize) {
        for row in 0..self.n {
            self.set(row, col, f64::INFINITY);
        }
    }

    pub fn is_row_blocked(&self, row: usize) -> bool {
        (0..self.n).all(|col| self.get(row, col) == f64::INFINITY)
    }

    pub fn is_column_blocked(&self, col: usize) -> bool {
        (0..self.n).all(|row| self.get(row, col) == f64::INFINITY)
    }

    /// Smallest value in a row. NaN is reported as an error.
    pub fn row_min(&self, row: usize) -> Result<f64, String> {
        let mut min = f64::INFINITY;
        for col in 0..self.n {
            let value = self.get(row, col);
            if value.is_nan() {
                return Err(format!("NaN in cost matrix at ({}, {})", row, col));
            }
            min = min.min(value);
        }
        Ok(min)
    }

    /// Smallest value in a column. NaN is reported as an error.
    pub fn column_min(&self, col: usize) -> Result<f64, String> {
        let mut min = f64::INFINITY;
        for row in 0..self.n {
            let value = self.get(row, col);
            if value.is_nan() {
                return Err(format!("NaN in cost matrix at ({}, {})", row, col));
            }
            min = min.min(value);
        }
        Ok(min)
    }

    /// Reduce rows, then columns, in place. Returns the total amount subtracted.
    ///
    /// Rows and columns whose minimum is zero or infinite are left untouched.
    pub fn reduce(&mut self) -> Result<f64, String> {
        let mut reduction = 0.0;

        for row in 0..self.n {
            let min = self.row_min(row)?;
            if min.is_finite() && min > 0.0 {
                for col in 0..self.n {
                    let value = self.get(row, col);
                    self.set(row, col, value - min);
                }
                reduction += min;
            }
        }

        for col in 0..self.n {
            let min = self.column_min(col)?;
            if min.is_finite() && min > 0.0 {
                for row in 0..self.n {
                    let value = self.get(row, col);
                    self.set(row, col, value - min);
                }
                reduction += min;
            }
        }

        Ok(reduction)
    }
}
