//! Dense matrix kernel for the normal equations.
//!
//! Matrices are row-major `Vec<Vec<f64>>`. Callers guarantee conforming
//! shapes; the design-matrix builder is the only producer.

/// Row-major dense matrix.
pub type Matrix = Vec<Vec<f64>>;

/// Pivot magnitude below which a matrix is treated as singular.
pub const SINGULAR_PIVOT: f64 = 1e-12;

/// Default ridge added to the diagonal by [`regularized_inverse`].
pub const DEFAULT_RIDGE: f64 = 1e-8;

/// Identity matrix of size `n`.
pub fn identity(n: usize) -> Matrix {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

/// Transpose of `a`.
pub fn transpose(a: &[Vec<f64>]) -> Matrix {
    let Some(first) = a.first() else {
        return Vec::new();
    };
    (0..first.len())
        .map(|j| a.iter().map(|row| row[j]).collect())
        .collect()
}

/// Matrix product `a · b`.
pub fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Matrix {
    let cols = b.first().map_or(0, Vec::len);
    let mut result = vec![vec![0.0; cols]; a.len()];
    for (i, a_row) in a.iter().enumerate() {
        for (k, b_row) in b.iter().enumerate() {
            let aik = a_row[k];
            for (j, bkj) in b_row.iter().enumerate() {
                result[i][j] += aik * bkj;
            }
        }
    }
    result
}

/// Matrix-vector product `a · v`.
pub fn multiply_vec(a: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(v).map(|(x, y)| x * y).sum())
        .collect()
}

/// Gauss-Jordan inversion with partial pivoting on `[A | I]`.
///
/// Returns `None` when any pivot falls below [`SINGULAR_PIVOT`].
pub fn invert_matrix(a: &[Vec<f64>]) -> Option<Matrix> {
    let n = a.len();
    let mut m: Matrix = a
        .iter()
        .zip(identity(n))
        .map(|(row, id)| row.iter().copied().chain(id).collect())
        .collect();

    for i in 0..n {
        let mut max_row = i;
        for k in (i + 1)..n {
            if m[k][i].abs() > m[max_row][i].abs() {
                max_row = k;
            }
        }
        if !(m[max_row][i].abs() >= SINGULAR_PIVOT) {
            return None;
        }
        m.swap(i, max_row);

        let pivot = m[i][i];
        for value in m[i].iter_mut() {
            *value /= pivot;
        }

        let pivot_row = m[i].clone();
        for (k, row) in m.iter_mut().enumerate() {
            if k == i {
                continue;
            }
            let factor = row[i];
            if factor == 0.0 {
                continue;
            }
            for (value, p) in row.iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
        }
    }

    Some(m.into_iter().map(|row| row[n..].to_vec()).collect())
}

/// Inverse of `a + ridge·I`, the soft fallback for near-collinear designs.
pub fn regularized_inverse_with(a: &[Vec<f64>], ridge: f64) -> Option<Matrix> {
    let regularized: Matrix = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, v)| if i == j { v + ridge } else { *v })
                .collect()
        })
        .collect();
    invert_matrix(&regularized)
}

/// Inverse of `a + 1e-8·I`.
pub fn regularized_inverse(a: &[Vec<f64>]) -> Option<Matrix> {
    regularized_inverse_with(a, DEFAULT_RIDGE)
}
