//! Binary persistence for whole networks.
//!
//! A snapshot captures everything needed to rebuild an equivalent network
//! without re-running random initialization: the topology, each layer's
//! activator assignment, bias and weight contents, the loss kind, and the
//! math policy. The on-disk format is bincode. Both entry points take an
//! explicit path per call; there is no shared file handle.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::activator::Activator;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::loss::Loss;
use crate::math::Math;
use crate::matrix::Mat;
use crate::network::Network;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    math: Math,
    loss: Loss,
    layers: Vec<LayerState>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerState {
    len: usize,
    activator: Activator,
    bias: Vec<f64>,
    weights: Option<Mat>,
}

/// Serializes `network` to `path`.
pub fn save(network: &Network, path: &Path) -> Result<()> {
    let snapshot = capture(network)?;
    let file = File::create(path)?;
    bincode::serialize_into(BufWriter::new(file), &snapshot)?;
    Ok(())
}

/// Rebuilds `network` from `path`.
///
/// The snapshot is fully validated and the replacement layers fully built
/// before anything in `network` changes; a failure partway leaves the
/// network in its previous state.
pub fn load(network: &mut Network, path: &Path) -> Result<()> {
    let file = File::open(path)?;
    let snapshot: Snapshot =
        bincode::deserialize_from(BufReader::new(file))?;
    validate(&snapshot)?;

    let vector = snapshot.math.vector();
    let layers = snapshot
        .layers
        .into_iter()
        .map(|state| {
            Layer::from_parts(
                state.len,
                state.activator,
                state.bias,
                state.weights,
                &*vector,
            )
        })
        .collect();
    network.commit(snapshot.math, snapshot.loss, layers);
    Ok(())
}

fn capture(network: &Network) -> Result<Snapshot> {
    if network.layer_count() == 0 {
        return Err(Error::NotConfigured("layers"));
    }
    let layers = network
        .layers()
        .iter()
        .map(|layer| LayerState {
            len: layer.len(),
            activator: layer.activator(),
            bias: layer.bias().to_vec(),
            weights: layer.weights().cloned(),
        })
        .collect();
    Ok(Snapshot {
        math: network.math(),
        loss: network.loss(),
        layers,
    })
}

/// Checks the snapshot against its own declared topology before any of it
/// is allowed near a network.
fn validate(snapshot: &Snapshot) -> Result<()> {
    let layers = &snapshot.layers;
    if layers.is_empty() {
        return Err(Error::Snapshot("no layers".into()));
    }
    let input = &layers[0];
    if input.len == 0 {
        return Err(Error::Snapshot("empty input layer".into()));
    }
    if input.weights.is_some() || !input.bias.is_empty() {
        return Err(Error::Snapshot(
            "input layer carries parameters".into(),
        ));
    }
    for (i, layer) in layers.iter().enumerate().skip(1) {
        if layer.len == 0 {
            return Err(Error::Snapshot(format!("layer {} is empty", i)));
        }
        if layer.bias.len() != layer.len {
            return Err(Error::Snapshot(format!(
                "layer {} bias length {} does not match {} neurons",
                i,
                layer.bias.len(),
                layer.len
            )));
        }
        let prev_len = layers[i - 1].len;
        match &layer.weights {
            Some(weights)
                if weights.well_formed()
                    && weights.rows() == layer.len
                    && weights.cols() == prev_len => {}
            Some(weights) => {
                return Err(Error::Snapshot(format!(
                    "layer {} weights are {}x{}, expected {}x{}",
                    i,
                    weights.rows(),
                    weights.cols(),
                    layer.len,
                    prev_len
                )));
            }
            None => {
                return Err(Error::Snapshot(format!(
                    "layer {} has no weights",
                    i
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("synapse-{}-{}", std::process::id(), name))
    }

    fn network(sizes: &[usize]) -> Network {
        let mut network = Network::new();
        network.select_math(Math::Serial).unwrap();
        network.set_layers(sizes).unwrap();
        network
    }

    #[test]
    fn round_trip_preserves_outputs() {
        let mut original = network(&[2, 3, 1]);
        original.set_loss(Loss::CrossEntropy);
        original.set_activator(1, Activator::TanH).unwrap();
        let input = [0.2, 0.9];
        let before = original.feed_forward(&input).unwrap().to_vec();

        let path = temp("round-trip");
        original.save(&path).unwrap();

        let mut restored = Network::new();
        restored.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.layer_count(), 3);
        assert_eq!(restored.math(), Math::Serial);
        assert_eq!(restored.loss(), Loss::CrossEntropy);
        assert_eq!(restored.layers()[1].activator(), Activator::TanH);
        let after = restored.feed_forward(&input).unwrap().to_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn save_requires_layers() {
        let network = Network::new();
        assert!(network.save(temp("unconfigured")).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let mut network = Network::new();
        match network.load(temp("does-not-exist")).unwrap_err() {
            Error::Io(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn corrupt_file_leaves_network_unchanged() {
        let path = temp("corrupt");
        std::fs::write(&path, b"not a snapshot").unwrap();

        let mut network = network(&[2, 2]);
        let before: Vec<f64> = network.layers()[1].bias().to_vec();
        assert!(network.load(&path).is_err());
        std::fs::remove_file(&path).ok();

        assert_eq!(network.layer_count(), 2);
        assert_eq!(network.layers()[1].bias(), &before[..]);
    }

    #[test]
    fn inconsistent_topology_is_rejected() {
        let snapshot = Snapshot {
            math: Math::Serial,
            loss: Loss::SquaredError,
            layers: vec![
                LayerState {
                    len: 2,
                    activator: Activator::Identity,
                    bias: Vec::new(),
                    weights: None,
                },
                LayerState {
                    len: 3,
                    activator: Activator::Sigmoid,
                    // bias too short for the declared neuron count
                    bias: vec![0.0; 2],
                    weights: Some(Mat::zeros(3, 2)),
                },
            ],
        };
        let path = temp("bad-topology");
        let file = File::create(&path).unwrap();
        bincode::serialize_into(BufWriter::new(file), &snapshot).unwrap();

        let mut network = network(&[4, 1]);
        match network.load(&path).unwrap_err() {
            Error::Snapshot(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
        std::fs::remove_file(&path).ok();

        // untouched by the failed load
        assert_eq!(network.input_len().unwrap(), 4);
    }
}
