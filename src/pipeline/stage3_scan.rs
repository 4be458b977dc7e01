use std::collections::BTreeMap;

use crate::input::{GroundTruth, Predictions};
use crate::model::landmark::{ClassMap, Landmark};
use crate::model::metrics::{ScanMetrics, TeamMetrics};
use crate::model::profile::{EvalProfile, ScoringMode};
use crate::pipeline::stage1_match::evaluate_all;
use crate::pipeline::stage2_curve::integrate;
use crate::stats::mean;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionScore {
    pub mode: ScoringMode,
    /// (distance threshold, mean AP over classes), in sweep order.
    pub map_by_threshold: Vec<(f64, f64)>,
    pub mean_map: Option<f64>,
    pub mean_mar: Option<f64>,
}

/// Per-class mAP and mAR of one scan over the distance-threshold sweep.
pub fn metrics_for_scan(
    scan: &str,
    predictions: &Predictions,
    ground_truth: &GroundTruth,
    profile: &EvalProfile,
) -> ScanMetrics {
    sweep_scan(
        &predictions.for_scan(scan),
        &ground_truth.for_scan(scan),
        profile,
    )
}

/// Runs [`metrics_for_scan`] for every ground-truth scan.
pub fn metrics_for_team(
    predictions: &Predictions,
    ground_truth: &GroundTruth,
    profile: &EvalProfile,
) -> TeamMetrics {
    let scan_keys = ground_truth.scan_keys();
    let mut by_scan = split_by_scan(predictions);

    let mut out = TeamMetrics::new();
    for scan in &scan_keys {
        let scan_predictions = by_scan.remove(scan.as_str()).unwrap_or_default();
        let metrics = sweep_scan(&scan_predictions, &ground_truth.for_scan(scan), profile);
        out.insert(scan.clone(), metrics);
    }

    if !by_scan.is_empty() {
        let orphaned: usize = by_scan.values().map(Predictions::len).sum();
        tracing::warn!(
            scans = by_scan.len(),
            detections = orphaned,
            "predictions reference scans absent from ground truth; ignored in per-scan metrics"
        );
    }
    out
}

fn split_by_scan(predictions: &Predictions) -> BTreeMap<&str, Predictions> {
    let mut by_scan: BTreeMap<&str, Predictions> = BTreeMap::new();
    for (landmark, detections) in predictions.by_class.iter() {
        for det in detections {
            by_scan
                .entry(det.scan.as_str())
                .or_default()
                .push(landmark, det.clone());
        }
    }
    by_scan
}

fn sweep_scan(
    predictions: &Predictions,
    ground_truth: &GroundTruth,
    profile: &EvalProfile,
) -> ScanMetrics {
    let thresholds = profile.sweep_thresholds();
    let mut ap_sum: ClassMap<f64> = ClassMap::default();
    let mut recall_curves: ClassMap<Vec<f64>> = ClassMap::default();

    for &threshold in &thresholds {
        let evals = evaluate_all(predictions, ground_truth, threshold);
        for (landmark, eval) in evals.iter() {
            ap_sum[landmark] += eval.average_precision;
            recall_curves[landmark].push(eval.final_recall());
        }
    }

    let n = thresholds.len().max(1) as f64;
    let mut metrics = ScanMetrics::default();
    for landmark in Landmark::ALL {
        metrics.map.insert(landmark, ap_sum[landmark] / n);
        metrics.mar.insert(
            landmark,
            average_recall(&thresholds, &recall_curves[landmark]),
        );
    }
    metrics
}

/// Integrates recall over `exp(-threshold)`, so matches that hold at tight
/// thresholds weigh more than those only found at loose ones.
pub fn average_recall(thresholds: &[f64], recalls: &[f64]) -> f64 {
    let x: Vec<f64> = thresholds.iter().rev().map(|t| (-t).exp()).collect();
    let y: Vec<f64> = recalls.iter().rev().copied().collect();
    integrate(&x, &y)
}

/// Mean AP over classes at each of the fixed coarse thresholds, all scans pooled.
pub fn score_coarse(
    predictions: &Predictions,
    ground_truth: &GroundTruth,
    profile: &EvalProfile,
) -> SubmissionScore {
    SubmissionScore {
        mode: ScoringMode::Coarse,
        map_by_threshold: pooled_map(predictions, ground_truth, &profile.coarse_thresholds),
        mean_map: None,
        mean_mar: None,
    }
}

/// The whole sweep pooled over scans, plus per-scan mAP/mAR averaged over
/// scans and classes.
pub fn score_dense(
    predictions: &Predictions,
    ground_truth: &GroundTruth,
    profile: &EvalProfile,
) -> SubmissionScore {
    let map_by_threshold = pooled_map(predictions, ground_truth, &profile.sweep_thresholds());
    let per_scan = metrics_for_team(predictions, ground_truth, profile);
    let maps: Vec<f64> = per_scan
        .values()
        .flat_map(|m| m.map.values().copied())
        .collect();
    let mars: Vec<f64> = per_scan
        .values()
        .flat_map(|m| m.mar.values().copied())
        .collect();
    SubmissionScore {
        mode: ScoringMode::Dense,
        map_by_threshold,
        mean_map: Some(mean(&maps)),
        mean_mar: Some(mean(&mars)),
    }
}

fn pooled_map(
    predictions: &Predictions,
    ground_truth: &GroundTruth,
    thresholds: &[f64],
) -> Vec<(f64, f64)> {
    thresholds
        .iter()
        .map(|&threshold| {
            let evals = evaluate_all(predictions, ground_truth, threshold);
            for (landmark, eval) in evals.iter() {
                tracing::debug!(
                    threshold,
                    class = %landmark,
                    ap = eval.average_precision,
                    tp = eval.true_positives,
                    npos = eval.n_positives,
                    "class AP"
                );
            }
            let aps: Vec<f64> = evals.values().map(|e| e.average_precision).collect();
            (threshold, mean(&aps))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_scan.rs"]
mod tests;
