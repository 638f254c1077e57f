use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::model::MatrixFactorizationModel;

/// Loss minimized by the factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    /// Squared error over observed cells only.
    SquareLossRegression,
    /// Squared error over observed cells plus `alpha`-weighted squared error
    /// toward `c` over every unobserved cell.
    SquareLossOneClass,
}

/// Training options for the factorization solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOptions {
    pub loss: LossFunction,
    /// Latent dimension.
    pub rank: usize,
    /// Weight of unobserved cells (one-class only).
    pub alpha: f32,
    /// L2 penalty applied to both factor matrices.
    pub lambda: f32,
    /// Target value of unobserved cells (one-class only).
    pub c: f32,
    /// Alternating passes; each pass re-solves every row then every column.
    pub iterations: usize,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            loss: LossFunction::SquareLossOneClass,
            rank: 8,
            alpha: 0.1,
            lambda: 0.5,
            c: 0.000_001,
            iterations: 50,
            seed: 0,
        }
    }
}

/// One observed cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub row: usize,
    pub column: usize,
    pub label: f32,
}

/// Observed cells of a `rows x columns` matrix.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    pub rows: usize,
    pub columns: usize,
    pub entries: Vec<Interaction>,
}

/// Fit row and column factors by alternating least squares.
///
/// With one factor matrix fixed, every row of the other has a closed-form
/// ridge solution, so each half-pass solves one `rank x rank` system per
/// row. Unobserved cells share a single Gram matrix, which keeps the
/// one-class variant at `O((rows + columns) * rank^2)` per pass plus the
/// observed cells. Repeated cells keep their last label.
pub fn train_matrix_factorization(
    dataset: &TrainDataset,
    options: &TrainOptions,
) -> Result<MatrixFactorizationModel, String> {
    if dataset.entries.is_empty() {
        return Err("Empty training set".to_string());
    }
    if dataset.rows == 0 || dataset.columns == 0 {
        return Err("Matrix has no rows or columns".to_string());
    }
    if options.rank == 0 {
        return Err("rank must be > 0".to_string());
    }
    if !options.lambda.is_finite() || options.lambda < 0.0 {
        return Err("lambda must be >= 0".to_string());
    }
    if !options.alpha.is_finite() || options.alpha < 0.0 {
        return Err("alpha must be >= 0".to_string());
    }

    let mut cells = BTreeMap::new();
    for entry in &dataset.entries {
        if entry.row >= dataset.rows || entry.column >= dataset.columns {
            return Err(format!(
                "Cell ({}, {}) outside {}x{} matrix",
                entry.row, entry.column, dataset.rows, dataset.columns
            ));
        }
        if !entry.label.is_finite() {
            return Err(format!("Non-finite label at ({}, {})", entry.row, entry.column));
        }
        cells.insert((entry.row, entry.column), entry.label as f64);
    }
    let mut by_row = vec![Vec::new(); dataset.rows];
    let mut by_column = vec![Vec::new(); dataset.columns];
    for (&(row, column), &label) in &cells {
        by_row[row].push((column, label));
        by_column[column].push((row, label));
    }

    let weights = CellWeights::for_options(options);
    let rank = options.rank;
    let init_scale = 1.0 / (rank as f64).sqrt();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut p = Array2::from_shape_fn((dataset.rows, rank), |_| rng.random::<f64>() * init_scale);
    let mut q =
        Array2::from_shape_fn((dataset.columns, rank), |_| rng.random::<f64>() * init_scale);

    for _ in 0..options.iterations {
        solve_side(&mut p, &q, &by_row, weights)?;
        solve_side(&mut q, &p, &by_column, weights)?;
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        let loss = objective(&p, &q, &cells, weights);
        tracing::debug!(
            "Matrix factorization: {}x{} rank {rank}, {} observed cells, objective {loss:.6}",
            dataset.rows,
            dataset.columns,
            cells.len()
        );
    }

    let model = MatrixFactorizationModel {
        model_version: 1,
        rank,
        rows: dataset.rows,
        columns: dataset.columns,
        row_factors: p.iter().map(|&v| v as f32).collect(),
        column_factors: q.iter().map(|&v| v as f32).collect(),
    };
    if model
        .row_factors
        .iter()
        .chain(&model.column_factors)
        .any(|v| !v.is_finite())
    {
        return Err("Factorization diverged to non-finite values".to_string());
    }
    model.validate()?;
    Ok(model)
}

#[derive(Debug, Clone, Copy)]
struct CellWeights {
    unobserved_weight: f64,
    unobserved_value: f64,
    lambda: f64,
}

impl CellWeights {
    fn for_options(options: &TrainOptions) -> Self {
        let (unobserved_weight, unobserved_value) = match options.loss {
            LossFunction::SquareLossOneClass => (options.alpha as f64, options.c as f64),
            LossFunction::SquareLossRegression => (0.0, 0.0),
        };
        Self {
            unobserved_weight,
            unobserved_value,
            lambda: options.lambda as f64,
        }
    }
}

fn solve_side(
    target: &mut Array2<f64>,
    fixed: &Array2<f64>,
    observed: &[Vec<(usize, f64)>],
    weights: CellWeights,
) -> Result<(), String> {
    let rank = fixed.ncols();
    let shared_gram =
        fixed.t().dot(fixed) * weights.unobserved_weight + Array2::<f64>::eye(rank) * weights.lambda;
    let shared_rhs =
        fixed.sum_axis(Axis(0)) * (weights.unobserved_weight * weights.unobserved_value);
    let observed_weight = 1.0 - weights.unobserved_weight;

    for (idx, cells) in observed.iter().enumerate() {
        let mut gram = shared_gram.clone();
        let mut rhs = shared_rhs.clone();
        for &(other, label) in cells {
            let v = fixed.row(other);
            for a in 0..rank {
                for b in 0..rank {
                    gram[[a, b]] += observed_weight * v[a] * v[b];
                }
            }
            rhs.scaled_add(label - weights.unobserved_weight * weights.unobserved_value, &v);
        }
        let solution = cholesky_solve(&gram, &rhs)
            .ok_or_else(|| "Normal equations are not positive definite; raise lambda".to_string())?;
        target.row_mut(idx).assign(&solution);
    }
    Ok(())
}

/// Solve `a x = b` for symmetric positive definite `a`.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Some(x)
}

fn objective(
    p: &Array2<f64>,
    q: &Array2<f64>,
    cells: &BTreeMap<(usize, usize), f64>,
    weights: CellWeights,
) -> f64 {
    let scores = p.dot(&q.t());
    let mut loss = 0.0;
    for ((row, column), &score) in scores.indexed_iter() {
        loss += match cells.get(&(row, column)) {
            Some(&label) => (label - score).powi(2),
            None => weights.unobserved_weight * (weights.unobserved_value - score).powi(2),
        };
    }
    let penalty = p.iter().chain(q.iter()).map(|v| v * v).sum::<f64>();
    loss + weights.lambda * penalty
}
