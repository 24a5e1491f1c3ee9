use nalgebra::{DMatrix, DVector};

const SINGULAR_VALUE_EPS: f64 = 1e-12;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Root-mean-square difference of two equally long slices.
pub fn rms_difference(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    Some((sum / a.len() as f64).sqrt())
}

/// Least-squares polynomial coefficients (lowest order first) of `y` over `x`.
///
/// Returns `None` when the system is rank deficient beyond recovery.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    if x.len() != y.len() || x.len() <= degree {
        return None;
    }
    let design = DMatrix::from_fn(x.len(), degree + 1, |r, c| x[r].powi(c as i32));
    let rhs = DVector::from_column_slice(y);
    let svd = design.svd(true, true);
    let coefficients = svd.solve(&rhs, SINGULAR_VALUE_EPS).ok()?;
    coefficients
        .iter()
        .all(|c| c.is_finite())
        .then(|| coefficients.iter().copied().collect())
}

/// Residuals of `y` after removing its least-squares straight line over `x`.
///
/// Fewer than three points leave nothing to estimate scatter from, so the mean is
/// removed instead.
pub fn linear_residuals(x: &[f64], y: &[f64]) -> Vec<f64> {
    if x.len() >= 3 {
        let origin = x[0];
        let shifted: Vec<f64> = x.iter().map(|v| v - origin).collect();
        if let Some(coef) = polyfit(&shifted, y, 1) {
            return shifted
                .iter()
                .zip(y)
                .map(|(xi, yi)| yi - (coef[0] + coef[1] * xi))
                .collect();
        }
    }
    let mu = mean(y).unwrap_or(0.0);
    y.iter().map(|v| v - mu).collect()
}

/// Abscissa of the vertex of the parabola through three equally indexed samples.
///
/// Falls back to the middle abscissa when the samples are collinear or the vertex
/// would leave the bracket.
pub fn parabolic_vertex(x: [f64; 3], y: [f64; 3]) -> f64 {
    let denom = (x[0] - x[1]) * (x[0] - x[2]) * (x[1] - x[2]);
    if denom.abs() < f64::EPSILON {
        return x[1];
    }
    let a = (x[2] * (y[1] - y[0]) + x[1] * (y[0] - y[2]) + x[0] * (y[2] - y[1])) / denom;
    let b = (x[2].powi(2) * (y[0] - y[1])
        + x[1].powi(2) * (y[2] - y[0])
        + x[0].powi(2) * (y[1] - y[2]))
        / denom;
    if a.abs() < f64::EPSILON {
        return x[1];
    }
    let vertex = -b / (2.0 * a);
    if vertex.is_finite() && vertex >= x[0] && vertex <= x[2] {
        vertex
    } else {
        x[1]
    }
}

/// Linear interpolation of the abscissa where the segment `(x0, y0)-(x1, y1)` reaches `level`.
pub fn interpolate_crossing(x0: f64, y0: f64, x1: f64, y1: f64, level: f64) -> f64 {
    let dy = y1 - y0;
    if dy.abs() < f64::EPSILON {
        return x0;
    }
    let t = ((level - y0) / dy).clamp(0.0, 1.0);
    x0 + t * (x1 - x0)
}
