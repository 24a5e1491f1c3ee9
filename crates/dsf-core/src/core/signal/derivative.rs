/// First derivative dy/dx on a strictly increasing, possibly non-uniform grid.
///
/// Interior points use the centered difference `(y[i+1] - y[i-1]) / (x[i+1] - x[i-1])`;
/// the first and last points use forward and backward differences. The output has the
/// same length as the input (a single point yields a zero derivative).
pub fn finite_difference(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = y.len();
    debug_assert_eq!(x.len(), n);
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                let (lo, hi) = match i {
                    0 => (0, 1),
                    _ if i == n - 1 => (n - 2, n - 1),
                    _ => (i - 1, i + 1),
                };
                slope(x[lo], y[lo], x[hi], y[hi])
            })
            .collect(),
    }
}

#[inline]
fn slope(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let dx = x1 - x0;
    if dx.abs() < f64::EPSILON {
        0.0
    } else {
        (y1 - y0) / dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_signal_has_constant_derivative() {
        let x = [0.0, 0.5, 1.5, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let d = finite_difference(&x, &y);
        assert_eq!(d.len(), 5);
        assert!(d.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn ends_use_one_sided_differences() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 4.0, 9.0];
        let d = finite_difference(&x, &y);
        assert_eq!(d, vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn degenerate_lengths_are_handled() {
        assert!(finite_difference(&[], &[]).is_empty());
        assert_eq!(finite_difference(&[1.0], &[3.0]), vec![0.0]);
    }
}
