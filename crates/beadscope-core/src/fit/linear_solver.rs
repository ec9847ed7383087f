//! Small dense linear algebra for profile fitting.

/// Pivots smaller than this are treated as zero.
const PIVOT_EPSILON: f64 = 1e-12;

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` if the matrix is singular.
#[allow(clippy::needless_range_loop)]
pub fn solve<const N: usize>(a: &[[f64; N]; N], b: &[f64; N]) -> Option<[f64; N]> {
    let mut matrix = *a;
    let mut rhs = *b;

    for col in 0..N {
        let pivot = pivot_row(&matrix, col)?;
        if pivot != col {
            matrix.swap(col, pivot);
            rhs.swap(col, pivot);
        }

        for row in (col + 1)..N {
            let factor = matrix[row][col] / matrix[col][col];
            let pivot_row = matrix[col];
            for (j, m) in matrix[row].iter_mut().enumerate().skip(col) {
                *m -= factor * pivot_row[j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0f64; N];
    for i in (0..N).rev() {
        let mut sum = rhs[i];
        for (j, &xj) in x.iter().enumerate().skip(i + 1) {
            sum -= matrix[i][j] * xj;
        }
        x[i] = sum / matrix[i][i];
    }
    Some(x)
}

/// Invert `a` by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` if the matrix is singular.
#[allow(clippy::needless_range_loop)]
pub fn invert<const N: usize>(a: &[[f64; N]; N]) -> Option<[[f64; N]; N]> {
    let mut matrix = *a;
    let mut inverse = [[0.0f64; N]; N];
    for (i, row) in inverse.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for col in 0..N {
        let pivot = pivot_row(&matrix, col)?;
        if pivot != col {
            matrix.swap(col, pivot);
            inverse.swap(col, pivot);
        }

        let p = matrix[col][col];
        for j in 0..N {
            matrix[col][j] /= p;
            inverse[col][j] /= p;
        }

        for row in 0..N {
            if row == col {
                continue;
            }
            let factor = matrix[row][col];
            if factor == 0.0 {
                continue;
            }
            let (m_pivot, i_pivot) = (matrix[col], inverse[col]);
            for j in 0..N {
                matrix[row][j] -= factor * m_pivot[j];
                inverse[row][j] -= factor * i_pivot[j];
            }
        }
    }
    Some(inverse)
}

/// Row at or below `col` with the largest magnitude in column `col`.
fn pivot_row<const N: usize>(matrix: &[[f64; N]; N], col: usize) -> Option<usize> {
    let (row, max) = (col..N)
        .map(|r| (r, matrix[r][col].abs()))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    if !(max.is_finite() && max >= PIVOT_EPSILON) {
        return None;
    }
    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_3x3() {
        let a = [[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]];
        let b = [8.0, -11.0, -3.0];
        let x = solve(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-10);
        assert!((x[1] - 3.0).abs() < 1e-10);
        assert!((x[2] + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_invert_roundtrip_identity() {
        let a = [[4.0, 7.0], [2.0, 6.0]];
        let inv = invert(&a).unwrap();
        assert!((inv[0][0] - 0.6).abs() < 1e-12);
        assert!((inv[0][1] + 0.7).abs() < 1e-12);
        assert!((inv[1][0] + 0.2).abs() < 1e-12);
        assert!((inv[1][1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_singular_matrix() {
        let a = [[1.0, 2.0], [2.0, 4.0]];
        assert!(solve(&a, &[1.0, 2.0]).is_none());
        assert!(invert(&a).is_none());
    }
}
