//! A single stage of the network.

use crate::activator::Activator;
use crate::math::{MatrixOps, VectorOps};
use crate::matrix::Mat;

/// One layer of a feed-forward network.
///
/// A layer owns its output neurons, its bias, and the weight matrix feeding
/// it from the previous layer, with each neuron's incoming weights stored
/// as a row. The input layer owns only neurons: its values are loaded from
/// the caller, never computed.
#[derive(Debug)]
pub struct Layer {
    neurons: Vec<f64>,
    bias: Vec<f64>,
    weights: Option<Mat>,
    activator: Activator,
}

impl Layer {
    /// Builds a layer of `count` neurons fed by `prev_count` outputs.
    ///
    /// A `prev_count` of zero builds an input layer: no weights, no bias,
    /// identity activation. Parameters are left zeroed; call
    /// [`Layer::randomize`] to break symmetry, or fill them from persisted
    /// state.
    pub(crate) fn new(
        count: usize,
        prev_count: usize,
        activator: Activator,
        vector: &dyn VectorOps,
        matrix: &dyn MatrixOps,
    ) -> Layer {
        if prev_count == 0 {
            Layer {
                neurons: vector.alloc(count),
                bias: Vec::new(),
                weights: None,
                activator: Activator::Identity,
            }
        } else {
            Layer {
                neurons: vector.alloc(count),
                bias: vector.alloc(count),
                weights: Some(matrix.alloc(count, prev_count)),
                activator,
            }
        }
    }

    /// Rebuilds a layer from persisted parts. The caller has already
    /// validated the shapes against each other.
    pub(crate) fn from_parts(
        count: usize,
        activator: Activator,
        bias: Vec<f64>,
        weights: Option<Mat>,
        vector: &dyn VectorOps,
    ) -> Layer {
        Layer {
            neurons: vector.alloc(count),
            bias,
            weights,
            activator,
        }
    }

    /// Fills the weights and bias with fresh random values.
    pub(crate) fn randomize(
        &mut self,
        vector: &dyn VectorOps,
        matrix: &dyn MatrixOps,
    ) {
        if let Some(weights) = &mut self.weights {
            matrix.randomize(weights);
        }
        vector.randomize(&mut self.bias);
    }

    /// Loads caller input into the neuron buffer (input layers only).
    pub(crate) fn load(&mut self, input: &[f64], vector: &dyn VectorOps) {
        vector.assign(&mut self.neurons, input);
    }

    /// Computes this layer's neurons from the previous layer's: the affine
    /// transform through the incoming weights, then the activation.
    pub(crate) fn forward(
        &mut self,
        prev: &[f64],
        vector: &dyn VectorOps,
        matrix: &dyn MatrixOps,
    ) {
        let weights = match &self.weights {
            Some(weights) => weights,
            // input layer: neurons are loaded, not computed
            None => return,
        };
        matrix.matvec(weights, prev, &mut self.neurons);
        vector.add_assign(&mut self.neurons, &self.bias);
        self.activate();
    }

    /// Applies the activation function to the stored neurons in place.
    pub fn activate(&mut self) {
        for y in &mut self.neurons {
            *y = self.activator.f(*y);
        }
    }

    /// Writes `f'(y)` for each stored neuron output into `out`.
    pub(crate) fn derivative_into(&self, out: &mut [f64]) {
        for (slope, y) in out.iter_mut().zip(&self.neurons) {
            *slope = self.activator.fprime(*y);
        }
    }

    /// Number of neurons in this layer.
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// True for the input layer, which carries no parameters.
    pub fn is_input(&self) -> bool {
        self.weights.is_none()
    }

    /// The activation strategy currently assigned to this layer.
    pub fn activator(&self) -> Activator {
        self.activator
    }

    /// Swaps the activation strategy. Stored neuron values are untouched
    /// until the next activation.
    pub fn set_activator(&mut self, activator: Activator) {
        self.activator = activator;
    }

    /// The output activations from the most recent forward pass.
    pub fn neurons(&self) -> &[f64] {
        &self.neurons
    }

    /// The bias vector; empty for the input layer.
    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Mutable bias access, for learning strategies.
    pub fn bias_mut(&mut self) -> &mut [f64] {
        &mut self.bias
    }

    /// The incoming weight matrix; `None` for the input layer.
    pub fn weights(&self) -> Option<&Mat> {
        self.weights.as_ref()
    }

    /// Mutable weight access, for learning strategies.
    pub fn weights_mut(&mut self) -> Option<&mut Mat> {
        self.weights.as_mut()
    }
}
