use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;
use crate::model::landmark::{ClassMap, Landmark, Point3};

/// scan key -> ground-truth keypoints of one class
pub type ClassGroundTruth = BTreeMap<String, Vec<Point3>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruth {
    pub by_class: ClassMap<ClassGroundTruth>,
}

impl GroundTruth {
    /// Every scan key appearing under any class, sorted.
    pub fn scan_keys(&self) -> Vec<String> {
        let mut keys = BTreeSet::new();
        for per_scan in self.by_class.values() {
            keys.extend(per_scan.keys().cloned());
        }
        keys.into_iter().collect()
    }

    pub fn n_keypoints(&self) -> usize {
        self.by_class
            .values()
            .flat_map(|per_scan| per_scan.values())
            .map(Vec::len)
            .sum()
    }

    /// Keeps only `scan`; each class gets an entry for it, empty when the
    /// scan has no keypoints of that class.
    pub fn for_scan(&self, scan: &str) -> GroundTruth {
        GroundTruth {
            by_class: self.by_class.map(|_, per_scan| {
                let points = per_scan.get(scan).cloned().unwrap_or_default();
                BTreeMap::from([(scan.to_string(), points)])
            }),
        }
    }
}

pub fn load_ground_truth(path: &Path) -> Result<GroundTruth, InputError> {
    let reader = open_maybe_gz(path)?;
    let gt = read_ground_truth(reader, path)?;
    tracing::info!(
        path = %path.display(),
        scans = gt.scan_keys().len(),
        keypoints = gt.n_keypoints(),
        "loaded ground truth"
    );
    Ok(gt)
}

pub fn read_ground_truth<R: Read>(reader: R, source: &Path) -> Result<GroundTruth, InputError> {
    let raw: BTreeMap<String, ClassGroundTruth> =
        serde_json::from_reader(reader).map_err(|e| InputError::Json {
            path: source.to_path_buf(),
            source: e,
        })?;

    let mut gt = GroundTruth::default();
    let mut seen = BTreeSet::new();
    for (class, per_scan) in raw {
        let landmark: Landmark = class.parse().map_err(|e| InputError::UnknownClass {
            context: format!("ground truth {}", source.display()),
            source: e,
        })?;
        for (scan, points) in &per_scan {
            if points.iter().flatten().any(|v| !v.is_finite()) {
                return Err(InputError::InvalidInput(format!(
                    "non-finite ground-truth coordinate for {landmark} in scan {scan}"
                )));
            }
        }
        seen.insert(landmark);
        gt.by_class[landmark] = per_scan;
    }

    for landmark in Landmark::ALL {
        if !seen.contains(&landmark) {
            tracing::warn!(
                class = %landmark,
                "ground truth has no entry for class; treating it as empty"
            );
        }
    }

    Ok(gt)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/ground_truth.rs"]
mod tests;
