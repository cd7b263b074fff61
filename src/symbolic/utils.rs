// numeric helpers shared by the symbolic layer and the sampler

/// `num_values` evenly spaced points over the closed interval `[start, end]`.
///
/// The first point is exactly `start` and the last exactly `end`, the rest are
/// `start + i*step`.
pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    match num_values {
        0 => return Vec::new(),
        1 => return vec![start],
        _ => {}
    }
    let mut values = Vec::with_capacity(num_values);
    let step = (end - start) / (num_values as f64 - 1.0);

    for i in 0..num_values - 1 {
        let value = start + (i as f64 * step);
        values.push(value);
    }
    values.push(end);

    values
}

/// Central difference approximation of f' at every point of `x_values`.
pub fn numerical_derivative<F>(f: F, x_values: &[f64], h: f64) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    let mut derivatives = Vec::with_capacity(x_values.len());

    for &x in x_values {
        let f_x_plus_h = f(x + h);
        let f_x_minus_h = f(x - h);
        let derivative = (f_x_plus_h - f_x_minus_h) / (2.0 * h);
        derivatives.push(derivative);
    }

    derivatives
}

/// Largest `|a - b| / max(1, |a|, |b|)` over pairs where both values are finite.
///
/// Returns `None` when no pair is comparable.
pub fn max_relative_deviation(x: &[f64], y: &[f64]) -> Option<f64> {
    x.iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (a - b).abs() / 1.0_f64.max(a.abs()).max(b.abs()))
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))))
}
