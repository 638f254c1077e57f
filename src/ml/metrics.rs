//! Evaluation metrics for classification models.

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Total number of recorded predictions.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| v as u64).sum()
    }
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u64 = (0..cm.n_classes).map(|k| cm.get(k, k) as u64).sum();
    (correct as f32) / (total as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_diagonal() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 0);
        cm.add(0, 1);
        cm.add(1, 1);
        cm.add(1, 1);
        assert_eq!(cm.total(), 4);
        assert!((accuracy(&cm) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_entries_are_ignored() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(2, 0);
        cm.add(0, 5);
        assert_eq!(cm.total(), 0);
        assert_eq!(accuracy(&cm), 0.0);
    }
}
