mod input;
mod logging;
mod model;
mod pipeline;
mod report;
mod stats;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::input::{
    InputError, discover_team_predictions, load_ground_truth, load_metrics_bundle,
    load_predictions,
};
use crate::model::metrics::MetricsBundle;
use crate::model::profile::{EvalProfile, RankProfile, ScoringMode};
use crate::pipeline::stage3_scan::{metrics_for_team, score_coarse, score_dense};
use crate::pipeline::stage4_rank::{RankError, common_scan_keys, points_by_team, rank};
use crate::report::ReportError;
use crate::report::json::{write_leaderboard, write_metrics_bundle, write_score};
use crate::report::text::render_leaderboard_text;

#[derive(Debug, Parser)]
#[command(
    name = "landmark-eval",
    version,
    about = "Score and rank 3D dental landmark detection submissions"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score one submission against the gold standard.
    Score(ScoreArgs),
    /// Compute per-scan mAP/mAR for one or more teams.
    Metrics(MetricsArgs),
    /// Rank teams from a metrics bundle with bootstrap signed-rank tests.
    Rank(RankArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// mAP at 0.5, 1, 2 and 3
    Coarse,
    /// mAP over the full threshold sweep plus per-scan mAP/mAR means
    Dense,
}

impl From<ModeArg> for ScoringMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Coarse => ScoringMode::Coarse,
            ModeArg::Dense => ScoringMode::Dense,
        }
    }
}

#[derive(Debug, Args)]
struct ScoreArgs {
    #[arg(short = 'p', long, alias = "predictions_file")]
    predictions_file: PathBuf,
    #[arg(short = 'g', long, alias = "goldstandard_file")]
    goldstandard_file: PathBuf,
    #[arg(short, long, default_value = "results.json")]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = ModeArg::Coarse)]
    mode: ModeArg,
}

#[derive(Debug, Args)]
struct MetricsArgs {
    #[arg(short = 'g', long, alias = "goldstandard_file")]
    goldstandard_file: PathBuf,
    /// Team predictions as NAME=PATH; repeatable.
    #[arg(long = "team", value_parser = parse_team_arg)]
    teams: Vec<(String, PathBuf)>,
    /// Directory holding <team>/predictions.csv files.
    #[arg(long)]
    predictions_dir: Option<PathBuf>,
    #[arg(short, long, default_value = "metrics_dict.json")]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct RankArgs {
    #[arg(short = 'm', long)]
    metrics: PathBuf,
    /// Take the scan list from this ground-truth file instead of the bundle.
    #[arg(short = 'g', long, alias = "goldstandard_file")]
    goldstandard_file: Option<PathBuf>,
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(long)]
    bootstraps: Option<usize>,
    #[arg(long)]
    resample_frac: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Compare unrounded metric values.
    #[arg(long)]
    no_round: bool,
    /// Also write the leaderboard as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("{0}")]
    Usage(String),
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    if let Err(err) = run(cli.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Score(args) => run_score(&args),
        Command::Metrics(args) => run_metrics(&args),
        Command::Rank(args) => run_rank(&args),
    }
}

fn run_score(args: &ScoreArgs) -> Result<(), AppError> {
    let predictions = load_predictions(&args.predictions_file)?;
    let ground_truth = load_ground_truth(&args.goldstandard_file)?;
    if predictions.is_empty() {
        tracing::warn!("submission has no predictions; every AP will be 0");
    }

    let profile = EvalProfile::default_v1();
    let score = match ScoringMode::from(args.mode) {
        ScoringMode::Coarse => score_coarse(&predictions, &ground_truth, &profile),
        ScoringMode::Dense => score_dense(&predictions, &ground_truth, &profile),
    };
    for (threshold, map) in &score.map_by_threshold {
        tracing::info!(mode = ?score.mode, threshold, map, "mAP");
    }

    write_score(&args.output, &score)?;
    Ok(())
}

fn run_metrics(args: &MetricsArgs) -> Result<(), AppError> {
    let mut teams = args.teams.clone();
    if let Some(dir) = &args.predictions_dir {
        teams.extend(discover_team_predictions(dir)?);
    }
    if teams.is_empty() {
        return Err(AppError::Usage(
            "no teams given; use --team NAME=PATH or --predictions-dir".to_string(),
        ));
    }

    let ground_truth = load_ground_truth(&args.goldstandard_file)?;
    let profile = EvalProfile::default_v1();

    let mut bundle = MetricsBundle::new();
    for (team, path) in &teams {
        if bundle.contains_key(team) {
            return Err(AppError::Usage(format!("team '{team}' given twice")));
        }
        let predictions = load_predictions(path)?;
        let metrics = metrics_for_team(&predictions, &ground_truth, &profile);
        tracing::info!(team = %team, scans = metrics.len(), "computed per-scan metrics");
        bundle.insert(team.clone(), metrics);
    }

    write_metrics_bundle(&args.output, &bundle)?;
    Ok(())
}

fn run_rank(args: &RankArgs) -> Result<(), AppError> {
    let bundle = load_metrics_bundle(&args.metrics)?;
    let scan_keys = match &args.goldstandard_file {
        Some(path) => load_ground_truth(path)?.scan_keys(),
        None => common_scan_keys(&bundle),
    };

    let profile = rank_profile(args);
    let leaderboard = rank(&bundle, &scan_keys, &profile)?;
    tracing::info!(points = ?points_by_team(&leaderboard), "bootstrap points");

    if let Some(path) = &args.output {
        write_leaderboard(path, &leaderboard)?;
    }
    print!("{}", render_leaderboard_text(&leaderboard));
    Ok(())
}

fn rank_profile(args: &RankArgs) -> RankProfile {
    let mut profile = RankProfile::default_v1();
    if let Some(alpha) = args.alpha {
        profile.alpha = alpha;
    }
    if let Some(n) = args.bootstraps {
        profile.n_bootstraps = n;
    }
    if let Some(frac) = args.resample_frac {
        profile.resample_frac = frac;
    }
    if let Some(seed) = args.seed {
        profile.seed = seed;
    }
    if args.no_round {
        profile.value_decimals = None;
    }
    profile
}

fn parse_team_arg(arg: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{arg}'"))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{arg}'"));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
