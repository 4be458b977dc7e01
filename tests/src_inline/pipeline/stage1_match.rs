use super::*;
use std::collections::BTreeMap;

use crate::model::landmark::Landmark;

fn det(scan: &str, coord: [f64; 3], score: f64) -> Detection {
    Detection {
        scan: scan.to_string(),
        coord,
        score,
    }
}

fn gt_one(scan: &str, points: Vec<[f64; 3]>) -> ClassGroundTruth {
    BTreeMap::from([(scan.to_string(), points)])
}

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len(), "{a:?} vs {b:?}");
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-12, "{a:?} vs {b:?}");
    }
}

#[test]
fn test_reference_scenario() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    let dets = vec![
        det("s", [0.0, 0.0, 0.0], 0.9),
        det("s", [1.0, 1.0, 1.0], 0.8),
        det("s", [0.0, 0.0, 0.0], 0.5),
    ];
    let eval = evaluate_class(&dets, &gt, 0.1);
    assert_close(&eval.recall, &[0.5, 1.0, 1.0]);
    assert_close(&eval.precision, &[1.0, 1.0, 2.0 / 3.0]);
    assert!((eval.average_precision - 1.0).abs() < 1e-12);
    assert_eq!(eval.true_positives, 2);
    assert_eq!(eval.n_positives, 2);
}

#[test]
fn test_input_order_is_irrelevant() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    let dets = vec![
        det("s", [0.0, 0.0, 0.0], 0.5),
        det("s", [1.0, 1.0, 1.0], 0.8),
        det("s", [0.0, 0.0, 0.0], 0.9),
    ];
    let eval = evaluate_class(&dets, &gt, 0.1);
    assert_close(&eval.recall, &[0.5, 1.0, 1.0]);
    assert_close(&eval.precision, &[1.0, 1.0, 2.0 / 3.0]);
}

#[test]
fn test_empty_predictions_give_zero_ap() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    let eval = evaluate_class(&[], &gt, 0.5);
    assert!(eval.recall.is_empty());
    assert_eq!(eval.final_recall(), 0.0);
    assert_eq!(eval.average_precision, 0.0);
    assert_eq!(eval.n_positives, 2);
}

#[test]
fn test_no_positives_fixes_recall_at_zero() {
    let gt = ClassGroundTruth::new();
    let dets = vec![det("s", [0.0, 0.0, 0.0], 0.9), det("s", [1.0, 0.0, 0.0], 0.3)];
    let eval = evaluate_class(&dets, &gt, 1.0);
    assert_close(&eval.recall, &[0.0, 0.0]);
    assert_close(&eval.precision, &[0.0, 0.0]);
    assert_eq!(eval.average_precision, 0.0);
    assert!(eval.recall.iter().all(|r| r.is_finite()));
}

#[test]
fn test_scan_without_ground_truth_is_false_positive() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0]]);
    let dets = vec![
        det("other", [0.0, 0.0, 0.0], 0.9),
        det("s", [0.0, 0.0, 0.0], 0.5),
    ];
    let eval = evaluate_class(&dets, &gt, 0.5);
    assert_close(&eval.recall, &[0.0, 1.0]);
    assert_close(&eval.precision, &[0.0, 0.5]);
    assert!((eval.average_precision - 0.5).abs() < 1e-12);
}

#[test]
fn test_empty_ground_truth_list_is_false_positive() {
    let mut gt = gt_one("s", vec![]);
    gt.insert("t".to_string(), vec![[0.0, 0.0, 0.0]]);
    let eval = evaluate_class(&[det("s", [0.0, 0.0, 0.0], 0.9)], &gt, 0.5);
    assert_eq!(eval.true_positives, 0);
    assert_eq!(eval.n_positives, 1);
}

#[test]
fn test_coincident_prediction_matches_any_positive_threshold() {
    let gt = gt_one("s", vec![[3.0, -2.0, 7.5]]);
    for threshold in [1e-9, 0.1, 1.0, 2.9] {
        let eval = evaluate_class(&[det("s", [3.0, -2.0, 7.5], 0.4)], &gt, threshold);
        assert_eq!(eval.true_positives, 1, "threshold {threshold}");
    }
}

#[test]
fn test_zero_threshold_matches_nothing() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0]]);
    let eval = evaluate_class(&[det("s", [0.0, 0.0, 0.0], 0.4)], &gt, 0.0);
    assert_eq!(eval.true_positives, 0);
}

#[test]
fn test_far_prediction_is_false_positive_across_sweep() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0]]);
    for i in 0..30 {
        let threshold = 0.1 * i as f64;
        let eval = evaluate_class(&[det("s", [3.0, 0.0, 0.0], 0.9)], &gt, threshold);
        assert_eq!(eval.true_positives, 0);
    }
}

#[test]
fn test_threshold_is_strict() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0]]);
    let at_edge = evaluate_class(&[det("s", [1.0, 0.0, 0.0], 0.9)], &gt, 1.0);
    assert_eq!(at_edge.true_positives, 0);
    let inside = evaluate_class(&[det("s", [0.999, 0.0, 0.0], 0.9)], &gt, 1.0);
    assert_eq!(inside.true_positives, 1);
}

#[test]
fn test_matching_is_injective() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]);
    let dets = vec![
        det("s", [0.1, 0.0, 0.0], 0.9),
        det("s", [0.0, 0.1, 0.0], 0.8),
        det("s", [0.0, 0.0, 0.1], 0.7),
    ];
    let eval = evaluate_class(&dets, &gt, 2.0);
    assert_eq!(eval.true_positives, 1);
    assert_close(&eval.recall, &[0.5, 0.5, 0.5]);
}

#[test]
fn test_claimed_nearest_is_not_reassigned_to_second_nearest() {
    // The second detection's nearest keypoint is already taken; the free one
    // is within the threshold but the matcher only considers the nearest.
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]]);
    let dets = vec![
        det("s", [0.0, 0.0, 0.0], 0.9),
        det("s", [0.1, 0.0, 0.0], 0.8),
    ];
    let eval = evaluate_class(&dets, &gt, 1.0);
    assert_eq!(eval.true_positives, 1);
}

#[test]
fn test_equal_scores_keep_input_order() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0]]);
    let miss_first = vec![
        det("s", [5.0, 0.0, 0.0], 0.5),
        det("s", [0.0, 0.0, 0.0], 0.5),
    ];
    let eval = evaluate_class(&miss_first, &gt, 1.0);
    assert_close(&eval.recall, &[0.0, 1.0]);

    let hit_first = vec![
        det("s", [0.0, 0.0, 0.0], 0.5),
        det("s", [5.0, 0.0, 0.0], 0.5),
    ];
    let eval = evaluate_class(&hit_first, &gt, 1.0);
    assert_close(&eval.recall, &[1.0, 1.0]);
}

#[test]
fn test_recall_is_non_decreasing() {
    let mut gt = ClassGroundTruth::new();
    gt.insert("a".to_string(), vec![[0.0, 0.0, 0.0], [2.0, 2.0, 2.0]]);
    gt.insert("b".to_string(), vec![[1.0, 0.0, 0.0]]);
    let dets = vec![
        det("a", [0.2, 0.0, 0.0], 0.95),
        det("b", [4.0, 0.0, 0.0], 0.9),
        det("a", [2.0, 2.1, 2.0], 0.6),
        det("b", [1.0, 0.3, 0.0], 0.55),
        det("a", [0.0, 0.0, 0.0], 0.2),
        det("c", [0.0, 0.0, 0.0], 0.1),
    ];
    for i in 0..30 {
        let eval = evaluate_class(&dets, &gt, 0.1 * i as f64);
        assert!(eval.recall.windows(2).all(|w| w[0] <= w[1]), "{:?}", eval.recall);
        assert!(eval.true_positives <= eval.n_positives);
    }
}

#[test]
fn test_match_state_does_not_leak_between_calls() {
    let gt = gt_one("s", vec![[0.0, 0.0, 0.0]]);
    let dets = vec![det("s", [0.0, 0.0, 0.0], 0.9)];
    let first = evaluate_class(&dets, &gt, 0.5);
    let second = evaluate_class(&dets, &gt, 0.5);
    assert_eq!(first, second);
    assert_eq!(second.true_positives, 1);
}

#[test]
fn test_evaluate_all_covers_every_class() {
    let mut predictions = Predictions::default();
    predictions.push(Landmark::Cusp, det("s", [0.0, 0.0, 0.0], 0.9));
    let mut ground_truth = GroundTruth::default();
    ground_truth.by_class[Landmark::Cusp] = gt_one("s", vec![[0.0, 0.0, 0.0]]);
    ground_truth.by_class[Landmark::Distal] = gt_one("s", vec![[1.0, 0.0, 0.0]]);

    let evals = evaluate_all(&predictions, &ground_truth, 0.5);
    assert_eq!(evals[Landmark::Cusp].average_precision, 1.0);
    assert_eq!(evals[Landmark::Distal].average_precision, 0.0);
    assert_eq!(evals[Landmark::Distal].n_positives, 1);
    assert_eq!(evals[Landmark::Mesial].n_positives, 0);
}
