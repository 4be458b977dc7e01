use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use thiserror::Error;

use crate::model::landmark::Landmark;
use crate::model::metrics::{Metric, MetricsBundle};
use crate::model::profile::RankProfile;
use crate::stats::{mean, round_to, signed_rank_test};

#[derive(Debug, Error)]
pub enum RankError {
    #[error("no teams to rank")]
    NoTeams,
    #[error("team '{team}' has no metrics for scan '{scan}'")]
    MissingScan { team: String, scan: String },
    #[error("team '{team}' has no {metric} value for class {class} in scan '{scan}'")]
    MissingValue {
        team: String,
        scan: String,
        metric: &'static str,
        class: Landmark,
    },
    #[error("invalid ranking configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub team: String,
    pub points: u64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub standings: Vec<Standing>,
    pub n_bootstraps: usize,
    pub sample_size: usize,
}

/// Bootstrap tournament: every iteration resamples scans, then every team
/// pair is compared per metric and class with a signed-rank test. Points are
/// normalised by the maximum attainable and teams sorted by score.
pub fn rank(
    bundle: &MetricsBundle,
    scan_keys: &[String],
    profile: &RankProfile,
) -> Result<Leaderboard, RankError> {
    if bundle.is_empty() {
        return Err(RankError::NoTeams);
    }
    if !(profile.resample_frac > 0.0 && profile.resample_frac <= 1.0) {
        return Err(RankError::InvalidConfig(format!(
            "resample fraction must be in (0, 1], got {}",
            profile.resample_frac
        )));
    }
    if !(profile.alpha > 0.0 && profile.alpha < 1.0) {
        return Err(RankError::InvalidConfig(format!(
            "alpha must be in (0, 1), got {}",
            profile.alpha
        )));
    }

    let teams: Vec<&str> = bundle.keys().map(String::as_str).collect();
    let table = ValueTable::build(bundle, &teams, scan_keys, profile.value_decimals)?;

    let sample_size = (scan_keys.len() as f64 * profile.resample_frac) as usize;
    tracing::info!(
        teams = teams.len(),
        scans = scan_keys.len(),
        sample_size,
        n_bootstraps = profile.n_bootstraps,
        alpha = profile.alpha,
        "ranking teams"
    );

    let mut rng = StdRng::seed_from_u64(profile.seed);
    let mut total_points = vec![0u64; teams.len()];
    for iteration in 0..profile.n_bootstraps {
        let sampled = sample(&mut rng, scan_keys.len(), sample_size).into_vec();
        let points = compare_teams(&table, &sampled, profile.alpha);
        for (total, p) in total_points.iter_mut().zip(&points) {
            *total += p;
        }
        tracing::debug!(iteration, ?points, "bootstrap iteration");
    }

    let scores = normalize_points(
        &total_points,
        teams.len(),
        Metric::ALL.len(),
        Landmark::ALL.len(),
        profile.n_bootstraps,
        profile.score_decimals,
    );

    let mut standings: Vec<Standing> = teams
        .iter()
        .zip(total_points.iter().zip(scores))
        .map(|(team, (&points, score))| Standing {
            team: team.to_string(),
            points,
            score,
        })
        .collect();
    standings.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(Leaderboard {
        standings,
        n_bootstraps: profile.n_bootstraps,
        sample_size,
    })
}

/// Metric values laid out as `[team][metric][class][scan]`.
struct ValueTable {
    values: Vec<Vec<Vec<Vec<f64>>>>,
}

impl ValueTable {
    fn build(
        bundle: &MetricsBundle,
        teams: &[&str],
        scan_keys: &[String],
        decimals: Option<u32>,
    ) -> Result<Self, RankError> {
        let mut values = Vec::with_capacity(teams.len());
        for &team in teams {
            let per_scan = &bundle[team];
            let mut by_metric = Vec::with_capacity(Metric::ALL.len());
            for metric in Metric::ALL {
                let mut by_class = Vec::with_capacity(Landmark::ALL.len());
                for class in Landmark::ALL {
                    let mut series = Vec::with_capacity(scan_keys.len());
                    for scan in scan_keys {
                        let metrics = per_scan.get(scan).ok_or_else(|| RankError::MissingScan {
                            team: team.to_string(),
                            scan: scan.clone(),
                        })?;
                        let v = metrics.get(metric, class).ok_or_else(|| {
                            RankError::MissingValue {
                                team: team.to_string(),
                                scan: scan.clone(),
                                metric: metric.as_str(),
                                class,
                            }
                        })?;
                        series.push(match decimals {
                            Some(d) => round_to(v, d),
                            None => v,
                        });
                    }
                    by_class.push(series);
                }
                by_metric.push(by_class);
            }
            values.push(by_metric);
        }
        Ok(Self { values })
    }

    fn series(&self, team: usize, metric: usize, class: usize, scans: &[usize]) -> Vec<f64> {
        let all = &self.values[team][metric][class];
        scans.iter().map(|&s| all[s]).collect()
    }
}

/// One round of the pairwise tournament on the scans at `scans`; returns
/// points per team index.
fn compare_teams(table: &ValueTable, scans: &[usize], alpha: f64) -> Vec<u64> {
    let n_teams = table.values.len();
    let mut points = vec![0u64; n_teams];
    for i in 0..n_teams {
        for j in (i + 1)..n_teams {
            for metric in 0..Metric::ALL.len() {
                for class in 0..Landmark::ALL.len() {
                    let a = table.series(i, metric, class, scans);
                    let b = table.series(j, metric, class, scans);
                    let Some(outcome) = signed_rank_test(&a, &b) else {
                        continue;
                    };
                    if outcome.p_value >= alpha {
                        continue;
                    }
                    tracing::trace!(
                        n = outcome.n,
                        w_plus = outcome.w_plus,
                        p_value = outcome.p_value,
                        "significant difference"
                    );
                    let (mean_a, mean_b) = (mean(&a), mean(&b));
                    if mean_a > mean_b {
                        points[i] += 1;
                    } else if mean_b > mean_a {
                        points[j] += 1;
                    }
                }
            }
        }
    }
    points
}

/// Divides points by the maximum a team can collect:
/// `(num_teams - 1) * num_metrics * num_categories * n_bootstraps`.
pub fn normalize_points(
    points: &[u64],
    num_teams: usize,
    num_metrics: usize,
    num_categories: usize,
    n_bootstraps: usize,
    decimals: u32,
) -> Vec<f64> {
    let total = num_teams.saturating_sub(1) * num_metrics * num_categories * n_bootstraps;
    points
        .iter()
        .map(|&p| {
            if total == 0 {
                0.0
            } else {
                round_to(p as f64 / total as f64, decimals)
            }
        })
        .collect()
}

/// Scans every team in the bundle has metrics for, sorted.
pub fn common_scan_keys(bundle: &MetricsBundle) -> Vec<String> {
    let mut teams = bundle.values();
    let Some(first) = teams.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<&String> = first.keys().collect();
    for per_scan in teams {
        common.retain(|scan| per_scan.contains_key(*scan));
    }
    common.into_iter().cloned().collect()
}

/// Points per team name, for logging and JSON output.
pub fn points_by_team(leaderboard: &Leaderboard) -> BTreeMap<&str, u64> {
    leaderboard
        .standings
        .iter()
        .map(|s| (s.team.as_str(), s.points))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_rank.rs"]
mod tests;
