use std::collections::HashMap;

use crate::input::GroundTruth;
use crate::input::Predictions;
use crate::input::ground_truth::ClassGroundTruth;
use crate::model::landmark::{ClassMap, Detection, Point3, distance};
use crate::pipeline::stage2_curve::integrate;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassEvaluation {
    pub recall: Vec<f64>,
    pub precision: Vec<f64>,
    pub average_precision: f64,
    pub true_positives: usize,
    pub n_positives: usize,
}

impl ClassEvaluation {
    /// Recall after the last (lowest-confidence) detection; 0 without detections.
    pub fn final_recall(&self) -> f64 {
        self.recall.last().copied().unwrap_or(0.0)
    }
}

struct ClassRecord<'a> {
    keypoints: &'a [Point3],
    matched: Vec<bool>,
}

/// Greedy confidence-ordered matching of one class at one distance threshold.
///
/// Detections are visited by descending score (stable on input order). A
/// detection is a true positive when its nearest ground-truth keypoint in the
/// same scan lies strictly closer than `distance_threshold` and has not been
/// claimed by a higher-ranked detection.
pub fn evaluate_class(
    detections: &[Detection],
    ground_truth: &ClassGroundTruth,
    distance_threshold: f64,
) -> ClassEvaluation {
    let mut records: HashMap<&str, ClassRecord<'_>> = HashMap::with_capacity(ground_truth.len());
    let mut n_positives = 0usize;
    for (scan, keypoints) in ground_truth {
        n_positives += keypoints.len();
        records.insert(
            scan.as_str(),
            ClassRecord {
                keypoints,
                matched: vec![false; keypoints.len()],
            },
        );
    }

    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| {
        detections[b]
            .score
            .partial_cmp(&detections[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut recall = Vec::with_capacity(order.len());
    let mut precision = Vec::with_capacity(order.len());
    let mut tp_cum = 0usize;
    let mut fp_cum = 0usize;

    for &idx in &order {
        let det = &detections[idx];
        let hit = match records.get_mut(det.scan.as_str()) {
            Some(record) => claim_nearest(record, &det.coord, distance_threshold),
            None => false,
        };
        if hit {
            tp_cum += 1;
        } else {
            fp_cum += 1;
        }

        let tp = tp_cum as f64;
        recall.push(if n_positives > 0 {
            tp / n_positives as f64
        } else {
            0.0
        });
        precision.push(tp / ((tp_cum + fp_cum) as f64).max(f64::EPSILON));
    }

    if n_positives == 0 && !detections.is_empty() {
        tracing::debug!(
            detections = detections.len(),
            "no ground-truth positives for class; recall fixed at 0"
        );
    }

    let average_precision = integrate(&recall, &precision);
    ClassEvaluation {
        recall,
        precision,
        average_precision,
        true_positives: tp_cum,
        n_positives,
    }
}

fn claim_nearest(record: &mut ClassRecord<'_>, coord: &Point3, distance_threshold: f64) -> bool {
    let mut nearest: Option<(usize, f64)> = None;
    for (j, gt) in record.keypoints.iter().enumerate() {
        let d = distance(coord, gt);
        if nearest.is_none_or(|(_, best)| d < best) {
            nearest = Some((j, d));
        }
    }
    match nearest {
        Some((j, d)) if d < distance_threshold && !record.matched[j] => {
            record.matched[j] = true;
            true
        }
        _ => false,
    }
}

/// Runs [`evaluate_class`] for every landmark class.
pub fn evaluate_all(
    predictions: &Predictions,
    ground_truth: &GroundTruth,
    distance_threshold: f64,
) -> ClassMap<ClassEvaluation> {
    ClassMap::from_fn(|landmark| {
        evaluate_class(
            &predictions.by_class[landmark],
            &ground_truth.by_class[landmark],
            distance_threshold,
        )
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_match.rs"]
mod tests;
