use super::stats::{mean, polyfit};
use tracing::warn;

/// Picks an odd smoothing window of roughly `fraction` of `len` points.
///
/// The result is at least `min_window` (bumped to odd) and never exceeds the largest
/// odd number not greater than `len`.
pub fn window_for(len: usize, fraction: f64, min_window: usize) -> usize {
    if len == 0 {
        return 1;
    }
    let target = (len as f64 * fraction.max(0.0)).round() as usize;
    let mut window = target.max(min_window).max(1);
    if window % 2 == 0 {
        window += 1;
    }
    let largest_odd = if len % 2 == 0 { len - 1 } else { len };
    window.min(largest_odd.max(1))
}

/// Local polynomial least-squares smoothing.
///
/// Each point is replaced by the value at its own temperature of a polynomial of
/// degree `order` fitted over a symmetric window centred on it. Near the ends the
/// window shrinks symmetrically (down to the point itself at the very edge), so the
/// output always has the input's length.
pub fn savitzky_golay(x: &[f64], y: &[f64], window: usize, order: usize) -> Vec<f64> {
    let n = y.len();
    debug_assert_eq!(x.len(), n);
    let half = window / 2;

    (0..n)
        .map(|i| {
            let local_half = half.min(i).min(n - 1 - i);
            if local_half == 0 {
                return y[i];
            }
            let lo = i - local_half;
            let hi = i + local_half;
            let scale = (x[hi] - x[i]).abs().max((x[i] - x[lo]).abs());
            let offsets: Vec<f64> = x[lo..=hi]
                .iter()
                .map(|xj| if scale > 0.0 { (xj - x[i]) / scale } else { 0.0 })
                .collect();
            let degree = order.min(2 * local_half);

            match polyfit(&offsets, &y[lo..=hi], degree) {
                Some(coef) => coef[0],
                None => {
                    warn!(
                        index = i,
                        window = 2 * local_half + 1,
                        "Local polynomial fit is singular; using the window mean."
                    );
                    mean(&y[lo..=hi]).unwrap_or(y[i])
                }
            }
        })
        .collect()
}
