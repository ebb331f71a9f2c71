use ndarray::{Array2, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Multiply two 2D arrays.
    pub fn multiply(lhs: ArrayView2<f64>, rhs: ArrayView2<f64>) -> Array2<f64> {
        lhs.dot(&rhs)
    }

    /// Gauss-Jordan inverse with partial pivoting. `None` for non-square or
    /// singular input.
    pub fn invert(matrix: ArrayView2<f64>) -> Option<Array2<f64>> {
        let n = matrix.nrows();
        if n == 0 || matrix.ncols() != n {
            return None;
        }

        let mut work = matrix.to_owned();
        let mut inverse = Array2::<f64>::eye(n);

        for col in 0..n {
            let pivot = (col..n).max_by(|&a, &b| {
                work[[a, col]]
                    .abs()
                    .partial_cmp(&work[[b, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
            if work[[pivot, col]].abs() < 1e-12 {
                return None;
            }
            if pivot != col {
                for k in 0..n {
                    work.swap([pivot, k], [col, k]);
                    inverse.swap([pivot, k], [col, k]);
                }
            }

            let scale = work[[col, col]];
            for k in 0..n {
                work[[col, k]] /= scale;
                inverse[[col, k]] /= scale;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = work[[row, col]];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..n {
                    work[[row, k]] -= factor * work[[col, k]];
                    inverse[[row, k]] -= factor * inverse[[col, k]];
                }
            }
        }

        Some(inverse)
    }
}
