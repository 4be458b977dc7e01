use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::model::metrics::MetricsBundle;
use crate::pipeline::stage3_scan::SubmissionScore;
use crate::pipeline::stage4_rank::Leaderboard;
use crate::report::{ReportError, threshold_key, write_atomic};

pub const STATUS_SCORED: &str = "SCORED";

#[derive(Debug, Serialize)]
pub struct ScoreReport {
    pub submission_status: &'static str,
    #[serde(flatten)]
    pub scores: BTreeMap<String, f64>,
}

impl ScoreReport {
    pub fn from_score(score: &SubmissionScore) -> Self {
        let mut scores: BTreeMap<String, f64> = score
            .map_by_threshold
            .iter()
            .map(|&(t, v)| (threshold_key("mAP", t), v))
            .collect();
        if let Some(v) = score.mean_map {
            scores.insert("mAP".to_string(), v);
        }
        if let Some(v) = score.mean_mar {
            scores.insert("mAR".to_string(), v);
        }
        Self {
            submission_status: STATUS_SCORED,
            scores,
        }
    }
}

#[derive(Debug, Serialize)]
struct LeaderboardRow<'a> {
    rank: usize,
    team: &'a str,
    score: f64,
    points: u64,
}

pub fn render_score_json(score: &SubmissionScore) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ScoreReport::from_score(score))
}

pub fn render_leaderboard_json(leaderboard: &Leaderboard) -> Result<String, serde_json::Error> {
    let rows: Vec<LeaderboardRow<'_>> = leaderboard
        .standings
        .iter()
        .enumerate()
        .map(|(i, s)| LeaderboardRow {
            rank: i + 1,
            team: &s.team,
            score: s.score,
            points: s.points,
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

pub fn write_score(path: &Path, score: &SubmissionScore) -> Result<(), ReportError> {
    let body = render_score_json(score).map_err(|source| json_err(path, source))?;
    write_atomic(path, body.as_bytes())
}

pub fn write_metrics_bundle(path: &Path, bundle: &MetricsBundle) -> Result<(), ReportError> {
    let body = serde_json::to_string(bundle).map_err(|source| json_err(path, source))?;
    write_atomic(path, body.as_bytes())
}

pub fn write_leaderboard(path: &Path, leaderboard: &Leaderboard) -> Result<(), ReportError> {
    let body = render_leaderboard_json(leaderboard).map_err(|source| json_err(path, source))?;
    write_atomic(path, body.as_bytes())
}

fn json_err(path: &Path, source: serde_json::Error) -> ReportError {
    ReportError::Json {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/json.rs"]
mod tests;
