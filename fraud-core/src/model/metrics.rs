//! Evaluation metrics for binary classification

use std::fmt;

use serde::{Deserialize, Serialize};

use super::threshold::is_fraud;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    /// Count outcomes of `score > threshold` against `labels`
    pub fn from_scores(labels: &[u8], scores: &[f64], threshold: f64) -> Self {
        let mut cm = Self::default();
        for (&label, &score) in labels.iter().zip(scores) {
            match (label == 1, is_fraud(score, threshold)) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// Zero when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// Zero when there are no positive labels
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Metrics for the negative class (treating label 0 as positive)
    fn negative_class(&self) -> ClassMetrics {
        let flipped = ConfusionMatrix {
            true_positive: self.true_negative,
            false_positive: self.false_negative,
            true_negative: self.true_positive,
            false_negative: self.false_positive,
        };
        ClassMetrics::from_matrix(0, &flipped)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_matrix(label: u8, cm: &ConfusionMatrix) -> Self {
        Self {
            label,
            precision: cm.precision(),
            recall: cm.recall(),
            f1: cm.f1(),
            support: cm.true_positive + cm.false_negative,
        }
    }
}

/// Per-class precision / recall / F1 / support, like a classic
/// classification report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn new(labels: &[u8], scores: &[f64], threshold: f64) -> Self {
        let confusion = ConfusionMatrix::from_scores(labels, scores, threshold);
        let negative = confusion.negative_class();
        let positive = ClassMetrics::from_matrix(1, &confusion);

        let total = (negative.support + positive.support).max(1) as f64;
        Self {
            classes: [negative, positive],
            accuracy: confusion.accuracy(),
            macro_f1: (negative.f1 + positive.f1) / 2.0,
            weighted_f1: (negative.f1 * negative.support as f64
                + positive.f1 * positive.support as f64)
                / total,
            confusion,
        }
    }

    pub fn positive(&self) -> &ClassMetrics {
        &self.classes[1]
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>10} {:>10} {:>10.4} {:>10}", "accuracy", "", "", self.accuracy, self.confusion.total())?;
        writeln!(f, "{:>12} {:>10} {:>10} {:>10.4}", "macro f1", "", "", self.macro_f1)?;
        write!(f, "{:>12} {:>10} {:>10} {:>10.4}", "weighted f1", "", "", self.weighted_f1)
    }
}

/// Summary persisted with the artifact and printed after training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub test_rows: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub average_precision: f64,
    pub confusion: ConfusionMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_counts() {
        let labels = [1, 1, 0, 0, 1];
        let scores = [0.9, 0.2, 0.7, 0.1, 0.6];
        let cm = ConfusionMatrix::from_scores(&labels, &scores, 0.5);

        assert_eq!(cm.true_positive, 2);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.true_negative, 1);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        let cm = ConfusionMatrix::from_scores(&[0, 0], &[0.1, 0.2], 0.5);
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
    }

    #[test]
    fn test_report_supports_and_display() {
        let labels = [1, 0, 0, 0];
        let scores = [0.9, 0.8, 0.1, 0.2];
        let report = ClassificationReport::new(&labels, &scores, 0.5);

        assert_eq!(report.classes[0].support, 3);
        assert_eq!(report.positive().support, 1);
        assert_eq!(report.positive().recall, 1.0);
        assert!((report.classes[0].recall - 2.0 / 3.0).abs() < 1e-12);

        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));
    }
}
