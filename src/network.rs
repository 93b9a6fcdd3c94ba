//! A [feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network) assembled
//! from swappable math backends and swappable strategies.
//!
//! # Example
//!
//! Let's teach a small network the XOR function, one step at a time:
//!
//! ```
//! use synapse::learning::Backprop;
//! use synapse::math::Math;
//! use synapse::network::Network;
//!
//! // Create examples of the XOR function
//! let examples = [([0.0, 0.0], [0.0]),
//!                 ([0.0, 1.0], [1.0]),
//!                 ([1.0, 0.0], [1.0]),
//!                 ([1.0, 1.0], [0.0])];
//!
//! // Configure a network: math first, then layers, then a learning rule
//! let mut network = Network::new();
//! network.select_math(Math::detect()).unwrap();
//! network.set_layers(&[2, 3, 1]).unwrap();
//! network.set_learning(Box::new(Backprop::new(0.7))).unwrap();
//!
//! // Drive single learning steps from outside
//! for _ in 0..5_000 {
//!     for &(input, target) in &examples {
//!         network.learn(&input, &target).unwrap();
//!     }
//! }
//!
//! let output = network.feed_forward(&[1.0, 0.0]).unwrap();
//! assert_eq!(output.len(), 1);
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::activator::Activator;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::learning::Learning;
use crate::loss::Loss;
use crate::math::{Math, MatrixOps, VectorOps};
use crate::snapshot;

/// A feed-forward neural network.
///
/// The network owns its layers, the math backends every layer computes
/// with, the loss strategy, and the learning strategy. Backends are
/// installed before layers are built and shared by every layer for the
/// network's lifetime; replacing one afterwards is an error rather than a
/// silent divergence.
#[derive(Debug)]
pub struct Network {
    layers: Vec<Layer>,
    vector: Option<Arc<dyn VectorOps>>,
    matrix: Option<Arc<dyn MatrixOps>>,
    math: Math,
    loss: Loss,
    learning: Option<Box<dyn Learning>>,
}

impl Network {
    /// Creates an unconfigured network. Select math backends, then set
    /// layers, then (for training) install a learning strategy.
    pub fn new() -> Network {
        Network {
            layers: Vec::new(),
            vector: None,
            matrix: None,
            math: Math::Serial,
            loss: Loss::SquaredError,
            learning: None,
        }
    }

    /// Installs the vector and matrix backends for `math` and records the
    /// choice. Fails once layers exist: layers compute through the backends
    /// they were built against.
    pub fn select_math(&mut self, math: Math) -> Result<()> {
        if !self.layers.is_empty() {
            return Err(Error::LayersBuilt("math"));
        }
        self.vector = Some(math.vector());
        self.matrix = Some(math.matrix());
        self.math = math;
        Ok(())
    }

    /// Replaces the vector backend. Fails once layers exist.
    pub fn set_vector(&mut self, vector: Arc<dyn VectorOps>) -> Result<()> {
        if !self.layers.is_empty() {
            return Err(Error::LayersBuilt("vector"));
        }
        self.vector = Some(vector);
        Ok(())
    }

    /// Replaces the matrix backend. Fails once layers exist.
    pub fn set_matrix(&mut self, matrix: Arc<dyn MatrixOps>) -> Result<()> {
        if !self.layers.is_empty() {
            return Err(Error::LayersBuilt("matrix"));
        }
        self.matrix = Some(matrix);
        Ok(())
    }

    /// Replaces the error strategy used by the next learning step.
    pub fn set_loss(&mut self, loss: Loss) {
        self.loss = loss;
    }

    /// Installs the learning strategy. The layer list and both backends
    /// must be finalized first.
    pub fn set_learning(&mut self, learning: Box<dyn Learning>) -> Result<()> {
        if self.vector.is_none() {
            return Err(Error::NotConfigured("vector backend"));
        }
        if self.matrix.is_none() {
            return Err(Error::NotConfigured("matrix backend"));
        }
        if self.layers.is_empty() {
            return Err(Error::NotConfigured("layers"));
        }
        self.learning = Some(learning);
        Ok(())
    }

    /// Builds the layer list from `sizes`, randomizing every non-input
    /// layer's parameters. Non-input layers get the logistic sigmoid.
    pub fn set_layers(&mut self, sizes: &[usize]) -> Result<()> {
        self.set_layers_with(sizes, Activator::Sigmoid)
    }

    /// Builds the layer list from `sizes` with an explicit default
    /// activation for the non-input layers. Any previous layers are
    /// discarded; backends are untouched.
    pub fn set_layers_with(
        &mut self,
        sizes: &[usize],
        default: Activator,
    ) -> Result<()> {
        let (vector, matrix) = self.backends()?;
        if sizes.is_empty() {
            return Err(Error::BadTopology(
                "a topology needs at least one layer",
            ));
        }
        if sizes.contains(&0) {
            return Err(Error::BadTopology(
                "a layer needs at least one neuron",
            ));
        }

        let mut layers = Vec::with_capacity(sizes.len());
        layers.push(Layer::new(sizes[0], 0, default, &*vector, &*matrix));
        for i in 1..sizes.len() {
            let mut layer =
                Layer::new(sizes[i], sizes[i - 1], default, &*vector, &*matrix);
            layer.randomize(&*vector, &*matrix);
            layers.push(layer);
        }
        self.layers = layers;
        Ok(())
    }

    /// Swaps one layer's activation strategy.
    pub fn set_activator(
        &mut self,
        layer: usize,
        activator: Activator,
    ) -> Result<()> {
        let count = self.layers.len();
        match self.layers.get_mut(layer) {
            Some(layer) => {
                layer.set_activator(activator);
                Ok(())
            }
            None => Err(Error::LayerIndex {
                index: layer,
                count,
            }),
        }
    }

    /// Swaps the activation strategy for every layer in the half-open
    /// range `[start, end)`.
    pub fn set_activator_range(
        &mut self,
        range: std::ops::Range<usize>,
        activator: Activator,
    ) -> Result<()> {
        let count = self.layers.len();
        if range.end > count {
            return Err(Error::LayerIndex {
                index: range.end,
                count,
            });
        }
        for i in range {
            self.layers[i].set_activator(activator);
        }
        Ok(())
    }

    /// Assigns activation strategies layer by layer from `start` on, one
    /// entry per remaining layer. Supplying fewer entries than remaining
    /// layers is an error, and nothing is assigned.
    pub fn set_activators(
        &mut self,
        activators: &[Activator],
        start: usize,
    ) -> Result<()> {
        let count = self.layers.len();
        if start > count {
            return Err(Error::LayerIndex {
                index: start,
                count,
            });
        }
        let remaining = count - start;
        if activators.len() < remaining {
            return Err(Error::DimensionMismatch {
                what: "activator list",
                expected: remaining,
                actual: activators.len(),
            });
        }
        for (layer, activator) in
            self.layers[start..].iter_mut().zip(activators)
        {
            layer.set_activator(*activator);
        }
        Ok(())
    }

    /// Number of layers, input and output included.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Size of the input layer.
    pub fn input_len(&self) -> Result<usize> {
        self.layers
            .first()
            .map(Layer::len)
            .ok_or(Error::NotConfigured("layers"))
    }

    /// Size of the output layer.
    pub fn output_len(&self) -> Result<usize> {
        self.layers
            .last()
            .map(Layer::len)
            .ok_or(Error::NotConfigured("layers"))
    }

    /// Output activations from the most recent forward pass.
    pub fn output(&self) -> Result<&[f64]> {
        self.layers
            .last()
            .map(Layer::neurons)
            .ok_or(Error::NotConfigured("layers"))
    }

    /// The layer list, input first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to one layer, for seeding parameters by hand.
    pub fn layer_mut(&mut self, index: usize) -> Result<&mut Layer> {
        let count = self.layers.len();
        self.layers
            .get_mut(index)
            .ok_or(Error::LayerIndex { index, count })
    }

    /// The last selected math policy.
    pub fn math(&self) -> Math {
        self.math
    }

    /// The active error strategy.
    pub fn loss(&self) -> Loss {
        self.loss
    }

    /// Pushes `input` through the layer chain and returns the output
    /// layer's activations. The returned borrow is overwritten in place by
    /// the next pass.
    pub fn feed_forward(&mut self, input: &[f64]) -> Result<&[f64]> {
        let (vector, matrix) = self.backends()?;
        if self.layers.is_empty() {
            return Err(Error::NotConfigured("layers"));
        }
        let expected = self.layers[0].len();
        if input.len() != expected {
            return Err(Error::DimensionMismatch {
                what: "input",
                expected,
                actual: input.len(),
            });
        }

        self.layers[0].load(input, &*vector);
        for i in 1..self.layers.len() {
            let (front, back) = self.layers.split_at_mut(i);
            back[0].forward(front[i - 1].neurons(), &*vector, &*matrix);
        }
        self.output()
    }

    /// Runs one forward pass on `input` and one learning-strategy update
    /// toward `target`. Returns the loss measured before the update.
    pub fn learn(&mut self, input: &[f64], target: &[f64]) -> Result<f64> {
        let expected = self.output_len()?;
        if target.len() != expected {
            return Err(Error::DimensionMismatch {
                what: "target",
                expected,
                actual: target.len(),
            });
        }
        if self.learning.is_none() {
            return Err(Error::NotConfigured("learning strategy"));
        }
        self.feed_forward(input)?;

        let (vector, matrix) = self.backends()?;
        let learning = match self.learning.as_mut() {
            Some(learning) => learning,
            None => return Err(Error::NotConfigured("learning strategy")),
        };
        learning.step(&mut self.layers, target, &*vector, &*matrix, &self.loss)
    }

    /// Writes the network's full state to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        snapshot::save(self, path.as_ref())
    }

    /// Replaces the network's state with the contents of `path`. On any
    /// failure the network is left exactly as it was.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        snapshot::load(self, path.as_ref())
    }

    /// Atomically adopts restored state; only called once a snapshot has
    /// been fully validated and built.
    pub(crate) fn commit(
        &mut self,
        math: Math,
        loss: Loss,
        layers: Vec<Layer>,
    ) {
        self.vector = Some(math.vector());
        self.matrix = Some(math.matrix());
        self.math = math;
        self.loss = loss;
        self.layers = layers;
    }

    fn backends(
        &self,
    ) -> Result<(Arc<dyn VectorOps>, Arc<dyn MatrixOps>)> {
        let vector = self
            .vector
            .clone()
            .ok_or(Error::NotConfigured("vector backend"))?;
        let matrix = self
            .matrix
            .clone()
            .ok_or(Error::NotConfigured("matrix backend"))?;
        Ok((vector, matrix))
    }
}

impl Default for Network {
    fn default() -> Network {
        Network::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::Backprop;
    use crate::matrix::Mat;

    fn network(sizes: &[usize]) -> Network {
        let mut network = Network::new();
        network.select_math(Math::Serial).unwrap();
        network.set_layers(sizes).unwrap();
        network
    }

    /// Zeroes every parameter and wires each non-input layer as an
    /// identity pass-through.
    fn wire_identity(network: &mut Network) {
        for i in 0..network.layer_count() {
            let layer = network.layer_mut(i).unwrap();
            layer.set_activator(Activator::Identity);
            for b in layer.bias_mut() {
                *b = 0.0;
            }
            if let Some(weights) = layer.weights_mut() {
                let (rows, cols) = (weights.rows(), weights.cols());
                for r in 0..rows {
                    for c in 0..cols {
                        weights.set(r, c, if r == c { 1.0 } else { 0.0 });
                    }
                }
            }
        }
    }

    #[test]
    fn topology_queries() {
        let network = network(&[2, 3, 1]);
        assert_eq!(network.layer_count(), 3);
        assert_eq!(network.input_len().unwrap(), 2);
        assert_eq!(network.output_len().unwrap(), 1);
        assert!(network.layers()[0].is_input());
        assert!(!network.layers()[2].is_input());
    }

    #[test]
    fn layers_require_math() {
        let mut network = Network::new();
        match network.set_layers(&[2, 1]).unwrap_err() {
            Error::NotConfigured(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn backends_freeze_once_layers_exist() {
        let mut network = network(&[2, 1]);
        assert!(network.select_math(Math::Parallel).is_err());
        assert!(network.set_vector(Math::Serial.vector()).is_err());
        assert!(network.set_matrix(Math::Serial.matrix()).is_err());
    }

    #[test]
    fn rejects_bad_topologies() {
        let mut network = Network::new();
        network.select_math(Math::Serial).unwrap();
        assert!(network.set_layers(&[]).is_err());
        assert!(network.set_layers(&[2, 0, 1]).is_err());
    }

    #[test]
    fn forward_is_deterministic() {
        let mut network = network(&[3, 4, 2]);
        let input = [0.25, -0.5, 1.0];
        let first = network.feed_forward(&input).unwrap().to_vec();
        let second = network.feed_forward(&input).unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn identity_pipeline_reproduces_input() {
        let mut network = network(&[2, 2, 1]);
        wire_identity(&mut network);
        // make the output neuron sum both hidden neurons
        let weights =
            network.layer_mut(2).unwrap().weights_mut().unwrap();
        weights.set(0, 0, 1.0);
        weights.set(0, 1, 1.0);

        let output = network.feed_forward(&[0.75, 0.5]).unwrap().to_vec();
        assert_eq!(output, vec![1.25]);
        assert_eq!(network.layers()[1].neurons(), &[0.75, 0.5][..]);
    }

    #[test]
    fn activator_range_scopes_behavior() {
        let mut network = network(&[2, 2, 2]);
        wire_identity(&mut network);
        let input = [0.5, -0.25];
        let before = network.feed_forward(&input).unwrap().to_vec();
        assert_eq!(before, input.to_vec());

        network.set_activator_range(1..3, Activator::TanH).unwrap();
        assert_eq!(network.layers()[0].activator(), Activator::Identity);
        assert_eq!(network.layers()[1].activator(), Activator::TanH);
        assert_eq!(network.layers()[2].activator(), Activator::TanH);

        let after = network.feed_forward(&input).unwrap().to_vec();
        assert_ne!(before, after);
    }

    #[test]
    fn activator_assignment_bounds() {
        let mut network = network(&[2, 2, 1]);
        assert!(network.set_activator(3, Activator::TanH).is_err());
        assert!(network
            .set_activator_range(1..4, Activator::TanH)
            .is_err());

        // one entry for two remaining layers: fail fast, assign nothing
        let err = network
            .set_activators(&[Activator::TanH], 1)
            .unwrap_err();
        match err {
            Error::DimensionMismatch { expected, actual, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(network.layers()[1].activator(), Activator::Sigmoid);

        network
            .set_activators(&[Activator::TanH, Activator::ReLU], 1)
            .unwrap();
        assert_eq!(network.layers()[1].activator(), Activator::TanH);
        assert_eq!(network.layers()[2].activator(), Activator::ReLU);
    }

    #[test]
    fn explicit_default_activator() {
        let mut network = Network::new();
        network.select_math(Math::Serial).unwrap();
        network
            .set_layers_with(&[2, 3, 1], Activator::TanH)
            .unwrap();
        assert_eq!(network.layers()[1].activator(), Activator::TanH);
        assert_eq!(network.layers()[2].activator(), Activator::TanH);
    }

    #[test]
    fn wrong_input_length_leaves_parameters_alone() {
        let mut network = network(&[2, 2, 1]);
        let saved: Vec<Option<Mat>> = network
            .layers()
            .iter()
            .map(|layer| layer.weights().cloned())
            .collect();

        let err = network.feed_forward(&[1.0; 5]).unwrap_err();
        match err {
            Error::DimensionMismatch { what, expected, actual } => {
                assert_eq!(what, "input");
                assert_eq!(expected, 2);
                assert_eq!(actual, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let now: Vec<Option<Mat>> = network
            .layers()
            .iter()
            .map(|layer| layer.weights().cloned())
            .collect();
        assert_eq!(saved, now);
    }

    #[test]
    fn learn_requires_a_strategy() {
        let mut network = network(&[2, 1]);
        match network.learn(&[0.1, 0.2], &[0.5]).unwrap_err() {
            Error::NotConfigured(what) => {
                assert_eq!(what, "learning strategy")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn learning_requires_layers_and_backends() {
        let mut network = Network::new();
        assert!(network
            .set_learning(Box::new(Backprop::new(0.1)))
            .is_err());
        network.select_math(Math::Serial).unwrap();
        assert!(network
            .set_learning(Box::new(Backprop::new(0.1)))
            .is_err());
        network.set_layers(&[2, 1]).unwrap();
        assert!(network
            .set_learning(Box::new(Backprop::new(0.1)))
            .is_ok());
    }

    #[test]
    fn forward_before_layers_is_a_config_error() {
        let mut network = Network::new();
        network.select_math(Math::Serial).unwrap();
        match network.feed_forward(&[1.0]).unwrap_err() {
            Error::NotConfigured(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn parallel_math_matches_serial_math() {
        let mut serial = network(&[2, 3, 2]);
        wire_identity(&mut serial);

        let mut parallel = Network::new();
        parallel.select_math(Math::Parallel).unwrap();
        parallel.set_layers(&[2, 3, 2]).unwrap();
        wire_identity(&mut parallel);

        let input = [0.3, -0.9];
        let lhs = serial.feed_forward(&input).unwrap().to_vec();
        let rhs = parallel.feed_forward(&input).unwrap().to_vec();
        for (l, r) in lhs.iter().zip(&rhs) {
            assert!((l - r).abs() < 1e-12);
        }
    }
}
