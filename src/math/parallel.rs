//! Rayon data-parallel math kernels.
//!
//! Same contract as the serial backend; only the internal work scheduling
//! and therefore the floating-point summation order differ.

use rand::distributions::{IndependentSample, Normal};
use rayon::prelude::*;

use crate::math::{MatrixOps, VectorOps};
use crate::matrix::Mat;

/// Elementwise vector kernels spread across the rayon pool.
#[derive(Copy, Clone, Debug)]
pub struct ParallelVector;

impl VectorOps for ParallelVector {
    fn alloc(&self, len: usize) -> Vec<f64> {
        vec![0.0; len]
    }

    fn assign(&self, dst: &mut [f64], src: &[f64]) {
        // a memcpy; nothing to fan out
        dst.copy_from_slice(src);
    }

    fn add_assign(&self, dst: &mut [f64], rhs: &[f64]) {
        dst.par_iter_mut()
            .zip(rhs.par_iter())
            .for_each(|(d, r)| *d += *r);
    }

    fn mul_assign(&self, dst: &mut [f64], rhs: &[f64]) {
        dst.par_iter_mut()
            .zip(rhs.par_iter())
            .for_each(|(d, r)| *d *= *r);
    }

    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        y.par_iter_mut()
            .zip(x.par_iter())
            .for_each(|(yv, xv)| *yv += alpha * *xv);
    }

    fn randomize(&self, dst: &mut [f64]) {
        // the thread-local rng does not cross worker threads
        let normal = Normal::new(0.0, 1.0);
        let mut rng = rand::thread_rng();
        for value in dst {
            *value = normal.ind_sample(&mut rng);
        }
    }
}

/// Matrix kernels parallelized one output element, or one column, per task.
#[derive(Copy, Clone, Debug)]
pub struct ParallelMatrix;

impl MatrixOps for ParallelMatrix {
    fn alloc(&self, rows: usize, cols: usize) -> Mat {
        Mat::zeros(rows, cols)
    }

    fn matvec(&self, m: &Mat, x: &[f64], y: &mut [f64]) {
        let rows = m.rows();
        let data = m.data();
        y.par_iter_mut().enumerate().for_each(|(row, out)| {
            let mut acc = 0.0;
            for (col, xv) in x.iter().enumerate() {
                acc += data[col * rows + row] * xv;
            }
            *out = acc;
        });
    }

    fn matvec_t(&self, m: &Mat, x: &[f64], y: &mut [f64]) {
        let rows = m.rows();
        let data = m.data();
        y.par_iter_mut().enumerate().for_each(|(col, out)| {
            let column = &data[col * rows..(col + 1) * rows];
            *out = column.iter().zip(x).map(|(w, xv)| w * xv).sum();
        });
    }

    fn ger(&self, alpha: f64, x: &[f64], y: &[f64], m: &mut Mat) {
        let rows = m.rows();
        m.data_mut()
            .par_chunks_mut(rows)
            .enumerate()
            .for_each(|(col, column)| {
                let scale = alpha * y[col];
                for (w, xv) in column.iter_mut().zip(x) {
                    *w += scale * *xv;
                }
            });
    }

    fn randomize(&self, m: &mut Mat) {
        let normal = Normal::new(0.0, 1.0);
        let mut rng = rand::thread_rng();
        for value in m.data_mut() {
            *value = normal.ind_sample(&mut rng);
        }
    }
}
