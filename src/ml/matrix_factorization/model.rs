use serde::{Deserialize, Serialize};

/// Learned factor matrices; a cell's score is the dot product of its row and
/// column factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixFactorizationModel {
    /// Model format version.
    pub model_version: i64,
    /// Latent dimension shared by both factor matrices.
    pub rank: usize,
    pub rows: usize,
    pub columns: usize,
    /// Row-major `[rows][rank]`.
    pub row_factors: Vec<f32>,
    /// Row-major `[columns][rank]`.
    pub column_factors: Vec<f32>,
}

impl MatrixFactorizationModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.rank == 0 {
            return Err("rank must be > 0".to_string());
        }
        if self.row_factors.len() != self.rows * self.rank {
            return Err("row_factors length mismatch".to_string());
        }
        if self.column_factors.len() != self.columns * self.rank {
            return Err("column_factors length mismatch".to_string());
        }
        Ok(())
    }

    /// Score a cell, or `None` when either index lies outside the trained matrix.
    pub fn score(&self, row: usize, column: usize) -> Option<f32> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        let p = &self.row_factors[row * self.rank..(row + 1) * self.rank];
        let q = &self.column_factors[column * self.rank..(column + 1) * self.rank];
        Some(p.iter().zip(q).map(|(a, b)| a * b).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> MatrixFactorizationModel {
        MatrixFactorizationModel {
            model_version: 1,
            rank: 2,
            rows: 2,
            columns: 1,
            row_factors: vec![1.0, 2.0, 0.5, 0.0],
            column_factors: vec![3.0, 1.0],
        }
    }

    #[test]
    fn score_is_dot_product() {
        let model = model();
        model.validate().unwrap();
        assert_eq!(model.score(0, 0), Some(5.0));
        assert_eq!(model.score(1, 0), Some(1.5));
    }

    #[test]
    fn score_outside_matrix_is_none() {
        let model = model();
        assert_eq!(model.score(2, 0), None);
        assert_eq!(model.score(0, 1), None);
    }
}
