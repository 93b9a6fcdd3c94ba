//! Numeric backends.
//!
//! The engine never does arithmetic directly: layers and learning
//! strategies go through the [`VectorOps`] and [`MatrixOps`] traits, and
//! the [`Math`] policy decides which implementation a network drives. The
//! two built-in backends satisfy identical contracts; they may differ only
//! in floating-point summation order.

mod parallel;
mod serial;

pub use self::parallel::{ParallelMatrix, ParallelVector};
pub use self::serial::{SerialMatrix, SerialVector};

use std::fmt::Debug;
use std::sync::Arc;
use std::thread;

use crate::matrix::Mat;

/// Elementwise vector arithmetic and initialization.
///
/// Vectors are plain `f64` slices; indexed access and length queries come
/// from the slice itself.
pub trait VectorOps: Debug + Send + Sync {
    /// Allocates a zeroed vector of `len` elements.
    fn alloc(&self, len: usize) -> Vec<f64>;

    /// Copies `src` into `dst`. Lengths must match.
    fn assign(&self, dst: &mut [f64], src: &[f64]);

    /// `dst += rhs`, elementwise.
    fn add_assign(&self, dst: &mut [f64], rhs: &[f64]);

    /// `dst *= rhs`, elementwise.
    fn mul_assign(&self, dst: &mut [f64], rhs: &[f64]);

    /// `y += alpha · x`.
    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]);

    /// Overwrites `dst` with standard-normal samples.
    fn randomize(&self, dst: &mut [f64]);
}

/// Matrix allocation, matrix-vector products, and the rank-1 update the
/// learning strategies are built on.
pub trait MatrixOps: Debug + Send + Sync {
    /// Allocates a zeroed `rows` by `cols` matrix.
    fn alloc(&self, rows: usize, cols: usize) -> Mat;

    /// `y = m · x`. `x` must have `m.cols()` elements, `y` `m.rows()`.
    fn matvec(&self, m: &Mat, x: &[f64], y: &mut [f64]);

    /// `y = mᵀ · x`. `x` must have `m.rows()` elements, `y` `m.cols()`.
    fn matvec_t(&self, m: &Mat, x: &[f64], y: &mut [f64]);

    /// `m += alpha · x · yᵀ`.
    fn ger(&self, alpha: f64, x: &[f64], y: &[f64], m: &mut Mat);

    /// Overwrites `m` with standard-normal samples.
    fn randomize(&self, m: &mut Mat);
}

/// Backend selection policy.
///
/// A network installs one vector backend and one matrix backend for its
/// whole lifetime; this enum names the built-in pairings and carries the
/// choice through a snapshot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Math {
    /// Single-threaded kernels backed by BLAS
    Serial,
    /// Rayon data-parallel kernels
    Parallel,
}

impl Math {
    /// Picks a variant from the available hardware parallelism.
    pub fn detect() -> Math {
        match thread::available_parallelism() {
            Ok(threads) if threads.get() > 1 => Math::Parallel,
            _ => Math::Serial,
        }
    }

    /// Builds the vector backend for this policy.
    pub fn vector(&self) -> Arc<dyn VectorOps> {
        match self {
            &Math::Serial => Arc::new(SerialVector),
            &Math::Parallel => Arc::new(ParallelVector),
        }
    }

    /// Builds the matrix backend for this policy.
    pub fn matrix(&self) -> Arc<dyn MatrixOps> {
        match self {
            &Math::Serial => Arc::new(SerialMatrix),
            &Math::Parallel => Arc::new(ParallelMatrix),
        }
    }
}
