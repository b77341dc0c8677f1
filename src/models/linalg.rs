//! Small dense least-squares solver shared by the model fits

use crate::error::{AgriForecastError, Result};

/// Solve `a * x = b` for a symmetric positive system via Gaussian elimination
/// with partial pivoting. A vanishing pivot means the fit did not converge.
pub(crate) fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() < 1e-10 {
            return Err(AgriForecastError::ModelFit(
                "Singular system in least-squares fit".to_string(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for col in (0..n).rev() {
        let mut sum = b[col];
        for k in col + 1..n {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }
    Ok(x)
}

/// Ordinary least squares on explicit design rows, with an optional small
/// ridge term on the diagonal for numerical stability.
pub(crate) fn least_squares(rows: &[Vec<f64>], targets: &[f64], ridge: f64) -> Result<Vec<f64>> {
    if rows.is_empty() || rows.len() != targets.len() {
        return Err(AgriForecastError::ModelFit(
            "Least-squares design and targets must have the same non-zero length".to_string(),
        ));
    }
    let k = rows[0].len();
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y) in rows.iter().zip(targets.iter()) {
        for i in 0..k {
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
            xty[i] += row[i] * y;
        }
    }
    for (i, diag) in xtx.iter_mut().enumerate() {
        diag[i] += ridge;
    }
    solve(xtx, xty)
}
