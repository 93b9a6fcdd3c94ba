//! Single-threaded math kernels.

use rand::distributions::{IndependentSample, Normal};
use rblas::attribute::Transpose;
use rblas::matrix_vector::ops::{Gemv, Ger};

use crate::math::{MatrixOps, VectorOps};
use crate::matrix::Mat;

/// Elementwise vector kernels on one thread.
#[derive(Copy, Clone, Debug)]
pub struct SerialVector;

impl VectorOps for SerialVector {
    fn alloc(&self, len: usize) -> Vec<f64> {
        vec![0.0; len]
    }

    fn assign(&self, dst: &mut [f64], src: &[f64]) {
        dst.copy_from_slice(src);
    }

    fn add_assign(&self, dst: &mut [f64], rhs: &[f64]) {
        for (d, r) in dst.iter_mut().zip(rhs) {
            *d += *r;
        }
    }

    fn mul_assign(&self, dst: &mut [f64], rhs: &[f64]) {
        for (d, r) in dst.iter_mut().zip(rhs) {
            *d *= *r;
        }
    }

    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        for (xv, yv) in x.iter().zip(y.iter_mut()) {
            *yv += alpha * *xv;
        }
    }

    fn randomize(&self, dst: &mut [f64]) {
        let normal = Normal::new(0.0, 1.0);
        let mut rng = rand::thread_rng();
        for value in dst {
            *value = normal.ind_sample(&mut rng);
        }
    }
}

/// BLAS-backed matrix kernels on one thread.
#[derive(Copy, Clone, Debug)]
pub struct SerialMatrix;

impl MatrixOps for SerialMatrix {
    fn alloc(&self, rows: usize, cols: usize) -> Mat {
        Mat::zeros(rows, cols)
    }

    fn matvec(&self, m: &Mat, x: &[f64], y: &mut [f64]) {
        f64::gemv(Transpose::NoTrans, &1.0, m, x, &0.0, y);
    }

    fn matvec_t(&self, m: &Mat, x: &[f64], y: &mut [f64]) {
        f64::gemv(Transpose::Trans, &1.0, m, x, &0.0, y);
    }

    fn ger(&self, alpha: f64, x: &[f64], y: &[f64], m: &mut Mat) {
        f64::ger(&alpha, x, y, m);
    }

    fn randomize(&self, m: &mut Mat) {
        let normal = Normal::new(0.0, 1.0);
        let mut rng = rand::thread_rng();
        for value in m.data_mut() {
            *value = normal.ind_sample(&mut rng);
        }
    }
}
