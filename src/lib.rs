extern crate bincode;
extern crate itertools;
extern crate rand;
extern crate rayon;
extern crate rblas;
#[macro_use]
extern crate serde_derive;
extern crate thiserror;

pub mod activator;
pub mod error;
pub mod layer;
pub mod learning;
pub mod loss;
pub mod math;
pub mod matrix;
pub mod network;
pub mod snapshot;
