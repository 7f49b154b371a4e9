//! Decision Threshold
//!
//! Picks the probability cutoff that maximizes F1 on the held-out split by
//! sweeping the precision-recall curve. Serving compares strictly:
//! a transaction is fraud when `score > threshold`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Added to the F1 denominator so that P = R = 0 gives 0 instead of NaN
const F1_EPSILON: f64 = 1e-9;

/// One point of the precision-recall curve.
/// Precision and recall are for predicting positive when `score >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrPoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Threshold chosen for a fitted pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdChoice {
    pub threshold: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Verdict rule used everywhere a score is turned into a decision
pub fn is_fraud(score: f64, threshold: f64) -> bool {
    score > threshold
}

pub fn f1_score(precision: f64, recall: f64) -> f64 {
    2.0 * precision * recall / (precision + recall + F1_EPSILON)
}

/// Precision-recall curve, one point per distinct score, ascending threshold
pub fn precision_recall_curve(labels: &[u8], scores: &[f64]) -> CoreResult<Vec<PrPoint>> {
    if labels.len() != scores.len() {
        return Err(CoreError::InvalidConfig(format!(
            "{} labels but {} scores",
            labels.len(),
            scores.len()
        )));
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    if positives == 0 {
        return Err(CoreError::DegenerateLabels(
            "held-out split has no positive labels".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);

    for (pos, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }

        // emit once per distinct score, after the last row carrying it
        let last_of_group = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_group {
            let precision = tp as f64 / (tp + fp) as f64;
            let recall = tp as f64 / positives as f64;
            points.push(PrPoint {
                threshold: scores[i],
                precision,
                recall,
                f1: f1_score(precision, recall),
            });
        }
    }

    points.reverse();
    Ok(points)
}

/// Threshold with the highest F1; ties go to the lowest threshold
pub fn select_threshold(labels: &[u8], scores: &[f64]) -> CoreResult<ThresholdChoice> {
    let curve = precision_recall_curve(labels, scores)?;

    let best = curve
        .iter()
        .fold(None::<&PrPoint>, |best, point| match best {
            Some(b) if b.f1 >= point.f1 => Some(b),
            _ => Some(point),
        })
        .ok_or_else(|| CoreError::DegenerateLabels("empty precision-recall curve".into()))?;

    Ok(ThresholdChoice {
        threshold: best.threshold,
        f1: best.f1,
        precision: best.precision,
        recall: best.recall,
    })
}

/// Area under the precision-recall curve (step-wise average precision)
pub fn average_precision(labels: &[u8], scores: &[f64]) -> CoreResult<f64> {
    let curve = precision_recall_curve(labels, scores)?;
    let mut previous_recall = 0.0;
    let mut ap = 0.0;
    // descending threshold = increasing recall
    for point in curve.iter().rev() {
        ap += (point.recall - previous_recall) * point.precision;
        previous_recall = point.recall;
    }
    Ok(ap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fraud_is_strict() {
        assert!(is_fraud(0.51, 0.5));
        assert!(!is_fraud(0.5, 0.5));
        assert!(!is_fraud(0.2, 0.5));
    }

    #[test]
    fn test_curve_points() {
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let curve = precision_recall_curve(&labels, &scores).unwrap();

        let thresholds: Vec<f64> = curve.iter().map(|p| p.threshold).collect();
        assert_eq!(thresholds, vec![0.1, 0.35, 0.4, 0.8]);

        // threshold 0.35 → predicted {0.35, 0.4, 0.8}: tp 2, fp 1
        assert!((curve[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(curve[1].recall, 1.0);
        // threshold 0.8 → tp 1, fp 0
        assert_eq!(curve[3].precision, 1.0);
        assert_eq!(curve[3].recall, 0.5);
    }

    #[test]
    fn test_tied_scores_form_one_point() {
        let labels = [1, 0, 1];
        let scores = [0.5, 0.5, 0.9];
        let curve = precision_recall_curve(&labels, &scores).unwrap();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve[0].threshold, 0.5);
        assert!((curve[0].precision - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_select_threshold_maximizes_f1() {
        let labels = [0, 0, 0, 1, 1, 0, 1];
        let scores = [0.05, 0.2, 0.3, 0.6, 0.7, 0.65, 0.9];
        let choice = select_threshold(&labels, &scores).unwrap();

        // threshold 0.6 catches all 3 positives with 1 false positive
        assert_eq!(choice.threshold, 0.6);
        assert_eq!(choice.recall, 1.0);
        assert!((choice.precision - 0.75).abs() < 1e-12);

        let curve = precision_recall_curve(&labels, &scores).unwrap();
        assert!(curve.iter().all(|p| p.f1 <= choice.f1));
    }

    #[test]
    fn test_perfect_separation() {
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.2, 0.8, 0.9];
        let choice = select_threshold(&labels, &scores).unwrap();
        assert_eq!(choice.threshold, 0.8);
        assert!((choice.f1 - 1.0).abs() < 1e-6);
        assert!((average_precision(&labels, &scores).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positives_is_an_error() {
        let err = select_threshold(&[0, 0], &[0.1, 0.2]).unwrap_err();
        assert!(matches!(err, CoreError::DegenerateLabels(_)));
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        assert!(precision_recall_curve(&[0, 1], &[0.1]).is_err());
    }
}
