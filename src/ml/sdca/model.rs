use serde::{Deserialize, Serialize};

/// Linear softmax model over dense feature vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxEntModel {
    /// Model format version.
    pub model_version: i64,
    /// Number of `f32` values per feature vector.
    pub n_features: usize,
    /// Number of output classes.
    pub n_classes: usize,
    /// Row-major `[n_classes][n_features]` weights.
    pub weights: Vec<f32>,
    /// Per-class bias.
    pub bias: Vec<f32>,
}

impl MaxEntModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_classes == 0 {
            return Err("Model must contain at least 1 class".to_string());
        }
        if self.weights.len() != self.n_classes * self.n_features {
            return Err("weights length mismatch".to_string());
        }
        if self.bias.len() != self.n_classes {
            return Err("bias length mismatch".to_string());
        }
        if self.weights.iter().chain(&self.bias).any(|w| !w.is_finite()) {
            return Err("model contains non-finite weights".to_string());
        }
        Ok(())
    }

    /// Raw per-class scores. Missing trailing features count as zero.
    pub fn predict_raw(&self, features: &[f32]) -> Vec<f32> {
        let dim = self.n_features;
        (0..self.n_classes)
            .map(|c| {
                let row = &self.weights[c * dim..(c + 1) * dim];
                self.bias[c]
                    + row
                        .iter()
                        .zip(features)
                        .map(|(w, x)| w * x)
                        .sum::<f32>()
            })
            .collect()
    }

    /// Class probabilities for a feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        softmax(&self.predict_raw(features))
    }
}

/// Compute a numerically-stable softmax for a set of logits.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

/// Index of the largest value; ties keep the first.
pub fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_class_model() -> MaxEntModel {
        MaxEntModel {
            model_version: 1,
            n_features: 2,
            n_classes: 2,
            weights: vec![1.0, -1.0, -1.0, 1.0],
            bias: vec![0.0, 0.0],
        }
    }

    #[test]
    fn softmax_sums_to_one() {
        let out = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = out.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(out[2] > out[1] && out[1] > out[0]);
    }

    #[test]
    fn model_predicts_argmax() {
        let model = two_class_model();
        model.validate().unwrap();
        assert_eq!(argmax(&model.predict_proba(&[1.0, 0.0])), 0);
        assert_eq!(argmax(&model.predict_proba(&[0.0, 1.0])), 1);
    }

    #[test]
    fn zero_features_fall_back_to_bias() {
        let mut model = two_class_model();
        model.bias = vec![0.0, 0.5];
        assert_eq!(argmax(&model.predict_proba(&[0.0, 0.0])), 1);
        assert_eq!(argmax(&model.predict_proba(&[])), 1);
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        let mut model = two_class_model();
        model.weights.pop();
        assert!(model.validate().is_err());
    }
}
