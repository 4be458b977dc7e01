use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;
use crate::model::landmark::{ClassMap, Detection, Landmark};

pub const PREDICTIONS_FILE: &str = "predictions.csv";

#[derive(Debug, Deserialize)]
struct PredictionRow {
    key: String,
    coord_x: f64,
    coord_y: f64,
    coord_z: f64,
    class: String,
    score: f64,
}

/// Scored detections of one submission, pooled per class in input row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub by_class: ClassMap<Vec<Detection>>,
}

impl Predictions {
    pub fn push(&mut self, landmark: Landmark, detection: Detection) {
        self.by_class[landmark].push(detection);
    }

    pub fn len(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detections made on `scan` only.
    pub fn for_scan(&self, scan: &str) -> Predictions {
        Predictions {
            by_class: self.by_class.map(|_, dets| {
                dets.iter().filter(|d| d.scan == scan).cloned().collect()
            }),
        }
    }
}

pub fn load_predictions(path: &Path) -> Result<Predictions, InputError> {
    let reader = open_maybe_gz(path)?;
    let predictions = read_predictions(reader, path)?;
    tracing::info!(
        path = %path.display(),
        detections = predictions.len(),
        "loaded predictions"
    );
    Ok(predictions)
}

pub fn read_predictions<R: Read>(reader: R, source: &Path) -> Result<Predictions, InputError> {
    let csv_err = |e: csv::Error| InputError::Csv {
        path: source.to_path_buf(),
        source: e,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let mut predictions = Predictions::default();
    let mut out_of_range = 0usize;
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;
        let line = record.position().map_or(0, |p| p.line());
        let invalid = |reason: String| InputError::InvalidRow {
            path: source.to_path_buf(),
            line,
            reason,
        };

        let row: PredictionRow = record
            .deserialize(Some(&headers))
            .map_err(|e| invalid(e.to_string()))?;
        if row.key.is_empty() {
            return Err(invalid("empty scan key".to_string()));
        }
        let landmark: Landmark = row.class.parse().map_err(|e| InputError::UnknownClass {
            context: format!("{} line {}", source.display(), line),
            source: e,
        })?;
        let coord = [row.coord_x, row.coord_y, row.coord_z];
        if coord.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite coordinate".to_string()));
        }
        if !row.score.is_finite() {
            return Err(invalid("non-finite score".to_string()));
        }
        if !(0.0..=1.0).contains(&row.score) {
            out_of_range += 1;
        }

        predictions.push(
            landmark,
            Detection {
                scan: row.key,
                coord,
                score: row.score,
            },
        );
    }

    if out_of_range > 0 {
        tracing::warn!(
            path = %source.display(),
            count = out_of_range,
            "prediction scores outside [0, 1]; ranking uses them as-is"
        );
    }

    Ok(predictions)
}

/// Finds `<dir>/<team>/predictions.csv` files; the team name is the sub-directory name.
pub fn discover_team_predictions(dir: &Path) -> Result<Vec<(String, PathBuf)>, InputError> {
    let entries = std::fs::read_dir(dir).map_err(|e| InputError::io(dir, e))?;
    let mut teams = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| InputError::io(dir, e))?;
        let candidate = entry.path().join(PREDICTIONS_FILE);
        if !candidate.is_file() {
            continue;
        }
        let team = entry.file_name().to_string_lossy().into_owned();
        teams.push((team, candidate));
    }
    teams.sort();
    if teams.is_empty() {
        return Err(InputError::InvalidInput(format!(
            "no */{} files under {}",
            PREDICTIONS_FILE,
            dir.display()
        )));
    }
    Ok(teams)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/predictions.rs"]
mod tests;
