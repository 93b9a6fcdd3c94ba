//! Error-metric strategies comparing network output to a target.

use itertools::multizip;

// Cross-entropy is undefined at exactly 0 or 1; outputs are clamped this
// far inside the open interval.
const EPS: f64 = 1e-12;

/// [Loss function](https://en.wikipedia.org/wiki/Loss_function) types.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Loss {
    /// Half squared Euclidean distance: `½·Σ(y−t)²`
    SquaredError,
    /// Binary cross-entropy; expects outputs in the open interval (0, 1)
    CrossEntropy,
}

impl Loss {
    /// Evaluates the loss between `output` and `target`.
    pub fn f(&self, output: &[f64], target: &[f64]) -> f64 {
        match self {
            &Loss::SquaredError => {
                output
                    .iter()
                    .zip(target)
                    .map(|(y, t)| (y - t) * (y - t))
                    .sum::<f64>()
                    / 2.0
            }
            &Loss::CrossEntropy => -output
                .iter()
                .zip(target)
                .map(|(y, t)| {
                    let y = y.max(EPS).min(1.0 - EPS);
                    t * y.ln() + (1.0 - t) * (1.0 - y).ln()
                })
                .sum::<f64>(),
        }
    }

    /// Writes the derivative of the loss with respect to each output value
    /// into `grad`.
    pub fn gradient(&self, output: &[f64], target: &[f64], grad: &mut [f64]) {
        match self {
            &Loss::SquaredError => {
                for (y, t, g) in
                    multizip((output.iter(), target.iter(), grad.iter_mut()))
                {
                    *g = y - t;
                }
            }
            &Loss::CrossEntropy => {
                for (y, t, g) in
                    multizip((output.iter(), target.iter(), grad.iter_mut()))
                {
                    let y = y.max(EPS).min(1.0 - EPS);
                    *g = (y - t) / (y * (1.0 - y));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error_of_exact_match_is_zero() {
        let v = [0.25, 0.5, 0.75];
        assert_eq!(Loss::SquaredError.f(&v, &v), 0.0);
    }

    #[test]
    fn squared_error_value_and_gradient() {
        let output = [1.0, 0.0];
        let target = [0.0, 0.0];
        assert_eq!(Loss::SquaredError.f(&output, &target), 0.5);

        let mut grad = [0.0; 2];
        Loss::SquaredError.gradient(&output, &target, &mut grad);
        assert_eq!(grad, [1.0, 0.0]);
    }

    #[test]
    fn cross_entropy_penalizes_confident_misses() {
        let target = [1.0];
        let close = Loss::CrossEntropy.f(&[0.9], &target);
        let far = Loss::CrossEntropy.f(&[0.1], &target);
        assert!(close < far);

        let mut grad = [0.0];
        Loss::CrossEntropy.gradient(&[0.5], &target, &mut grad);
        assert!((grad[0] + 2.0).abs() < 1e-12);
    }
}
