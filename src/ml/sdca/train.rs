use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};

use super::model::{MaxEntModel, softmax};

/// Training options for the SDCA maximum-entropy trainer.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// L2 regularization strength.
    pub l2: f32,
    /// Maximum passes over the data.
    pub max_epochs: usize,
    /// Stop once the largest dual update in an epoch falls below this value.
    pub tolerance: f32,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            l2: 1e-3,
            max_epochs: 100,
            tolerance: 1e-5,
            seed: 0,
        }
    }
}

/// In-memory training set: dense features with class indices in `0..n_classes`.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    pub n_classes: usize,
    pub x: Vec<Vec<f32>>,
    pub y: Vec<usize>,
}

/// Fit a softmax classifier by stochastic dual coordinate ascent.
///
/// Every example owns a dual vector `alpha_i` (one entry per class) and the
/// primal weights are kept equal to `sum_i alpha_i x_i / (l2 * n)`. Each step
/// moves `alpha_i` toward the negative loss gradient at the current weights
/// with the smooth-loss step size `l2 * n / (l2 * n + |x_i|^2)`. The bias is
/// treated as an extra feature fixed to `1.0`.
pub fn train_sdca_maximum_entropy(
    dataset: &TrainDataset,
    options: &TrainOptions,
) -> Result<MaxEntModel, String> {
    if dataset.x.is_empty() || dataset.y.is_empty() {
        return Err("Empty training set".to_string());
    }
    if dataset.x.len() != dataset.y.len() {
        return Err("Mismatched training inputs/labels".to_string());
    }
    let classes = dataset.n_classes;
    if classes == 0 {
        return Err("No classes available for training".to_string());
    }
    if dataset.y.iter().any(|&y| y >= classes) {
        return Err("Label index out of range".to_string());
    }
    let dim = dataset.x[0].len();
    if dataset.x.iter().any(|row| row.len() != dim) {
        return Err("Inconsistent feature row length".to_string());
    }
    if !options.l2.is_finite() || options.l2 <= 0.0 {
        return Err("l2 must be > 0".to_string());
    }

    let n = dataset.x.len();
    let scale = options.l2 * n as f32;
    let inv_scale = 1.0 / scale;
    let mut weights = vec![0.0f32; classes * dim];
    let mut bias = vec![0.0f32; classes];
    let mut duals = vec![0.0f32; n * classes];
    let squared_norms: Vec<f32> = dataset
        .x
        .iter()
        .map(|row| row.iter().map(|v| v * v).sum::<f32>() + 1.0)
        .collect();

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut order: Vec<usize> = (0..n).collect();
    let mut logits = vec![0.0f32; classes];
    let mut epochs_run = 0usize;
    for _epoch in 0..options.max_epochs {
        epochs_run += 1;
        order.shuffle(&mut rng);
        let mut max_update = 0.0f32;
        for &i in &order {
            let x = &dataset.x[i];
            let y = dataset.y[i];
            for c in 0..classes {
                let row = &weights[c * dim..(c + 1) * dim];
                logits[c] = bias[c] + row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>();
            }
            let probs = softmax(&logits);
            let step = scale / (scale + squared_norms[i]);
            for c in 0..classes {
                let target = if c == y { 1.0 } else { 0.0 };
                let gradient = target - probs[c];
                let dual = &mut duals[i * classes + c];
                let delta = step * (gradient - *dual);
                if delta == 0.0 {
                    continue;
                }
                *dual += delta;
                max_update = max_update.max(delta.abs());
                let factor = delta * inv_scale;
                let row = &mut weights[c * dim..(c + 1) * dim];
                for (w, v) in row.iter_mut().zip(x) {
                    *w += factor * v;
                }
                bias[c] += factor;
            }
        }
        if max_update < options.tolerance {
            break;
        }
    }
    tracing::debug!(
        "SDCA finished after {epochs_run} epoch(s) on {n} rows x {dim} features, {classes} classes"
    );

    let model = MaxEntModel {
        model_version: 1,
        n_features: dim,
        n_classes: classes,
        weights,
        bias,
    };
    model.validate()?;
    Ok(model)
}
