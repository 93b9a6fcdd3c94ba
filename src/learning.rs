//! Learning strategies: algorithms that turn a target into in-place weight
//! and bias updates.

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::loss::Loss;
use crate::math::{MatrixOps, VectorOps};

/// A single backward-update step.
///
/// Implementations receive every collaborator by reference on each call;
/// nothing is captured at configuration time, so replacing a backend can
/// never leave a strategy holding a stale handle.
pub trait Learning: std::fmt::Debug {
    /// Performs one update toward `target`, assuming the layers hold the
    /// activations of the most recent forward pass. Returns the loss value
    /// measured before the update.
    fn step(
        &mut self,
        layers: &mut [Layer],
        target: &[f64],
        vector: &dyn VectorOps,
        matrix: &dyn MatrixOps,
        loss: &Loss,
    ) -> Result<f64>;
}

/// Plain gradient-descent backpropagation.
#[derive(Debug)]
pub struct Backprop {
    rate: f64,
    /// Per-layer error signals, reused across steps.
    errors: Vec<Vec<f64>>,
    /// Per-layer activation slopes, reused across steps.
    slopes: Vec<Vec<f64>>,
}

impl Backprop {
    /// Creates a backpropagation strategy with the given learning rate.
    pub fn new(rate: f64) -> Backprop {
        Backprop {
            rate,
            errors: Vec::new(),
            slopes: Vec::new(),
        }
    }

    /// Resizes the scratch buffers to the current topology.
    fn reshape(&mut self, layers: &[Layer], vector: &dyn VectorOps) {
        let stale = self.errors.len() != layers.len()
            || self
                .errors
                .iter()
                .zip(layers)
                .any(|(errors, layer)| errors.len() != layer.len());
        if stale {
            self.errors =
                layers.iter().map(|layer| vector.alloc(layer.len())).collect();
            self.slopes =
                layers.iter().map(|layer| vector.alloc(layer.len())).collect();
        }
    }
}

impl Learning for Backprop {
    fn step(
        &mut self,
        layers: &mut [Layer],
        target: &[f64],
        vector: &dyn VectorOps,
        matrix: &dyn MatrixOps,
        loss: &Loss,
    ) -> Result<f64> {
        let last = layers.len().saturating_sub(1);
        if last == 0 {
            return Err(Error::BadTopology("no trainable layers"));
        }
        let output_len = layers[last].len();
        if target.len() != output_len {
            return Err(Error::DimensionMismatch {
                what: "target",
                expected: output_len,
                actual: target.len(),
            });
        }
        self.reshape(layers, vector);

        let value = loss.f(layers[last].neurons(), target);
        loss.gradient(layers[last].neurons(), target, &mut self.errors[last]);

        for i in (1..layers.len()).rev() {
            let (front, back) = layers.split_at_mut(i);
            let prev = &front[i - 1];
            let layer = &mut back[0];

            // delta = dE/dy, folded through the activation slope
            layer.derivative_into(&mut self.slopes[i]);
            let (err_front, err_back) = self.errors.split_at_mut(i);
            let delta = &mut err_back[0][..];
            vector.mul_assign(delta, &self.slopes[i]);

            let weights = match layer.weights_mut() {
                Some(weights) => weights,
                None => return Err(Error::NotConfigured("layer weights")),
            };
            // propagate with the pre-update weights
            if i > 1 {
                matrix.matvec_t(weights, delta, &mut err_front[i - 1]);
            }
            matrix.ger(-self.rate, delta, prev.neurons(), weights);
            vector.axpy(-self.rate, delta, layer.bias_mut());
        }
        Ok(value)
    }
}
