//! Dense real matrix exponential and logarithm.
//!
//! The exponential delegates to nalgebra's scaling-and-squaring Padé
//! implementation. The logarithm works through a real eigendecomposition:
//!
//!   A = V · diag(λ) · V⁻¹  ⇒  log A = V · diag(ln|λ|) · V⁻¹
//!
//! Only real spectra are supported. A negative real eigenvalue has no real
//! principal logarithm; its modulus is used instead and the occurrence is
//! counted so callers can report the deviation from an exact embedding.

use nalgebra::linalg::{Schur, SVD};
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Imaginary parts below this (relative to the modulus) are treated as
/// round-off from the Schur iteration.
pub const IMAGINARY_TOLERANCE: f64 = 1e-6;

/// Eigenvalues below this (relative to the largest entry) make the matrix
/// singular for the purpose of taking a logarithm.
pub const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Eigenvalues closer than this are treated as one repeated eigenvalue.
const CLUSTER_TOLERANCE: f64 = 1e-7;

/// Largest singular value accepted as part of an eigenspace.
const NULL_SPACE_TOLERANCE: f64 = 1e-6;

const MAX_ITERATIONS: usize = 1_000;

/// Failure of a matrix function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericalError {
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix contains non-finite entries")]
    NonFinite,

    #[error("eigendecomposition did not converge")]
    NoConvergence,

    #[error("eigenvalue {re}{im:+}i has a non-negligible imaginary part; no real logarithm")]
    ComplexEigenvalue { re: f64, im: f64 },

    #[error("eigenvalue {0} is numerically zero; logarithm undefined")]
    Singular(f64),

    #[error("eigenvalue {eigenvalue} with multiplicity {multiplicity} is defective")]
    Defective { eigenvalue: f64, multiplicity: usize },

    #[error("interval must be positive and finite, got {0}")]
    InvalidInterval(f64),

    #[error("entry ({row}, {col}) is negative beyond tolerance: {value}")]
    NegativeEntry { row: usize, col: usize, value: f64 },

    #[error("row {row} sums to {sum} after conversion")]
    RowSumDrift { row: usize, sum: f64 },
}

/// Real logarithm of a matrix with a real, diagonalizable spectrum.
#[derive(Debug, Clone)]
pub struct RealLogarithm {
    /// The logarithm.
    pub matrix: DMatrix<f64>,
    /// Number of eigenvalues (with multiplicity) that were negative and were
    /// replaced by their modulus.
    pub negative_eigenvalues: usize,
}

impl RealLogarithm {
    /// Whether `exp(self.matrix)` reproduces the input exactly (up to
    /// round-off).
    pub fn is_exact(&self) -> bool {
        self.negative_eigenvalues == 0
    }
}

fn check_square(a: &DMatrix<f64>) -> Result<(), NumericalError> {
    if a.nrows() != a.ncols() {
        return Err(NumericalError::NotSquare {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    Ok(())
}

fn check_finite(a: &DMatrix<f64>) -> Result<(), NumericalError> {
    if a.iter().any(|x| !x.is_finite()) {
        return Err(NumericalError::NonFinite);
    }
    Ok(())
}

/// Matrix exponential `exp(A)`.
pub fn expm(a: &DMatrix<f64>) -> Result<DMatrix<f64>, NumericalError> {
    check_square(a)?;
    check_finite(a)?;
    let result = a.exp();
    check_finite(&result)?;
    Ok(result)
}

/// Group sorted eigenvalues into (mean, multiplicity) clusters.
fn cluster_eigenvalues(sorted: &[f64]) -> Vec<(f64, usize)> {
    let mut clusters = Vec::new();
    let mut start = 0;
    for i in 1..=sorted.len() {
        let split = i == sorted.len()
            || (sorted[i] - sorted[i - 1]).abs() > CLUSTER_TOLERANCE * sorted[i].abs().max(1.0);
        if split {
            let members = &sorted[start..i];
            let mean = members.iter().sum::<f64>() / members.len() as f64;
            clusters.push((mean, members.len()));
            start = i;
        }
    }
    clusters
}

/// Real matrix logarithm through eigendecomposition.
///
/// Fails when the spectrum is complex, contains zero, does not converge, or
/// the matrix is not diagonalizable.
pub fn logm_real(a: &DMatrix<f64>) -> Result<RealLogarithm, NumericalError> {
    check_square(a)?;
    check_finite(a)?;
    let n = a.nrows();
    let scale = a.amax().max(1.0);

    let schur =
        Schur::try_new(a.clone(), f64::EPSILON, MAX_ITERATIONS).ok_or(NumericalError::NoConvergence)?;
    let mut eigenvalues = Vec::with_capacity(n);
    for ev in schur.complex_eigenvalues().iter() {
        if ev.im.abs() > IMAGINARY_TOLERANCE * ev.re.abs().max(1.0) {
            return Err(NumericalError::ComplexEigenvalue { re: ev.re, im: ev.im });
        }
        if ev.re.abs() < SINGULAR_TOLERANCE * scale {
            return Err(NumericalError::Singular(ev.re));
        }
        eigenvalues.push(ev.re);
    }
    eigenvalues.sort_by(|x, y| x.total_cmp(y));

    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(n);
    let mut log_diag = Vec::with_capacity(n);
    let mut negative_eigenvalues = 0;

    for (lambda, multiplicity) in cluster_eigenvalues(&eigenvalues) {
        let shifted = a - DMatrix::<f64>::identity(n, n) * lambda;
        let svd = SVD::try_new(shifted, false, true, f64::EPSILON, MAX_ITERATIONS)
            .ok_or(NumericalError::NoConvergence)?;
        let v_t = svd.v_t.as_ref().ok_or(NumericalError::NoConvergence)?;

        let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
        order.sort_by(|&i, &j| svd.singular_values[i].total_cmp(&svd.singular_values[j]));
        if order.len() < multiplicity
            || svd.singular_values[order[multiplicity - 1]] > NULL_SPACE_TOLERANCE * scale
        {
            return Err(NumericalError::Defective {
                eigenvalue: lambda,
                multiplicity,
            });
        }

        for &idx in order.iter().take(multiplicity) {
            basis.push(v_t.row(idx).transpose());
            log_diag.push(lambda.abs().ln());
        }
        if lambda < 0.0 {
            negative_eigenvalues += multiplicity;
        }
    }

    let v = DMatrix::from_columns(&basis);
    let v_inv = v.clone().try_inverse().ok_or(NumericalError::Defective {
        eigenvalue: f64::NAN,
        multiplicity: n,
    })?;
    let log = &v * DMatrix::from_diagonal(&DVector::from_vec(log_diag)) * v_inv;
    check_finite(&log)?;

    Ok(RealLogarithm {
        matrix: log,
        negative_eigenvalues,
    })
}
