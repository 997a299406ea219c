//! Small one-dimensional numeric routines shared by the best-response search and the
//! equilibrium solver.

const GOLDEN: f64 = 0.618_033_988_749_894_9;

/// Root of `f` on `[lo, hi]` by bisection.
///
/// Returns `None` when `f` has the same sign at both ends.
pub fn bisect<F>(mut f: F, mut lo: f64, mut hi: f64, tolerance: f64) -> Option<f64>
where
    F: FnMut(f64) -> f64,
{
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo == 0.0 {
        return Some(lo);
    }
    if f_hi == 0.0 {
        return Some(hi);
    }
    if f_lo.signum() == f_hi.signum() || f_lo.is_nan() || f_hi.is_nan() {
        return None;
    }

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || (hi - lo) < tolerance {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// Maximise a unimodal `f` on `[lo, hi]` by golden-section search
pub fn golden_section_max<F>(mut f: F, mut lo: f64, mut hi: f64, tolerance: f64) -> f64
where
    F: FnMut(f64) -> f64,
{
    let mut x1 = hi - GOLDEN * (hi - lo);
    let mut x2 = lo + GOLDEN * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);

    for _ in 0..300 {
        if (hi - lo).abs() <= tolerance {
            break;
        }
        if f1 < f2 {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + GOLDEN * (hi - lo);
            f2 = f(x2);
        } else {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - GOLDEN * (hi - lo);
            f1 = f(x1);
        }
    }
    0.5 * (lo + hi)
}

/// Maximise `f` on `[lo, hi]`: coarse grid scan, then golden-section refinement
/// around the best grid point. Tolerates kinks and flat regions that defeat a
/// pure golden-section search.
pub fn maximize<F>(mut f: F, lo: f64, hi: f64, tolerance: f64) -> f64
where
    F: FnMut(f64) -> f64,
{
    const GRID: usize = 200;

    if hi <= lo {
        return lo;
    }

    let step = (hi - lo) / GRID as f64;
    let mut best_index = 0;
    let mut best_value = f64::NEG_INFINITY;
    for i in 0..=GRID {
        let value = f(lo + step * i as f64);
        if value > best_value {
            best_value = value;
            best_index = i;
        }
    }

    let left = lo + step * best_index.saturating_sub(1) as f64;
    let right = (lo + step * (best_index + 1) as f64).min(hi);
    let refined = golden_section_max(&mut f, left, right, tolerance);

    let grid_point = lo + step * best_index as f64;
    if f(refined) >= best_value {
        refined
    } else {
        grid_point
    }
}

/// Solve `A·x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` for a (numerically) singular system.
pub fn solve_linear(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    const PIVOT_EPSILON: f64 = 1e-12;

    let n = rhs.len();
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return None;
    }

    let scale = matrix
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot][col].abs() < PIVOT_EPSILON * scale {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Some(x)
}
