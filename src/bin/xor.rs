extern crate synapse;

use synapse::learning::Backprop;
use synapse::math::Math;
use synapse::network::Network;

type Input = [f64; 2];
type Output = [f64; 1];

const EXAMPLES: [(Input, Output); 4] = [
    ([0.0, 0.0], [0.0]),
    ([0.0, 1.0], [1.0]),
    ([1.0, 0.0], [1.0]),
    ([1.0, 1.0], [0.0]),
];

fn main() {
    let mut network = Network::new();
    network.select_math(Math::detect()).expect("math backends");
    network.set_layers(&[2, 3, 1]).expect("layers");
    network
        .set_learning(Box::new(Backprop::new(0.7)))
        .expect("learning strategy");

    for iteration in 1..=20_000 {
        let mut error = 0.0;
        for &(input, target) in &EXAMPLES {
            error += network.learn(&input, &target).expect("learning step");
        }
        if iteration % 2_000 == 0 {
            println!(
                "Iteration {}:\tloss={}",
                iteration,
                error / EXAMPLES.len() as f64
            );
        }
    }

    println!();
    for &(input, _) in &EXAMPLES {
        let output = network.feed_forward(&input).expect("forward pass");
        println!("{:?} -> {:.3}", input, output[0]);
    }
}
