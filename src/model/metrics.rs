use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::landmark::Landmark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    MeanAp,
    MeanAr,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::MeanAp, Metric::MeanAr];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::MeanAp => "mAP",
            Metric::MeanAr => "mAR",
        }
    }
}

/// Per-class metrics of a single scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanMetrics {
    #[serde(rename = "mAP")]
    pub map: BTreeMap<Landmark, f64>,
    #[serde(rename = "mAR")]
    pub mar: BTreeMap<Landmark, f64>,
}

impl ScanMetrics {
    pub fn get(&self, metric: Metric, landmark: Landmark) -> Option<f64> {
        let table = match metric {
            Metric::MeanAp => &self.map,
            Metric::MeanAr => &self.mar,
        };
        table.get(&landmark).copied()
    }
}

/// scan key -> metrics
pub type TeamMetrics = BTreeMap<String, ScanMetrics>;

/// team name -> scan key -> metrics
pub type MetricsBundle = BTreeMap<String, TeamMetrics>;
