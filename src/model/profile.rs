#[derive(Debug, Clone)]
pub struct EvalProfile {
    pub sweep_steps: usize,
    pub sweep_step: f64,
    pub coarse_thresholds: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    Coarse,
    Dense,
}

impl EvalProfile {
    pub fn default_v1() -> Self {
        Self {
            sweep_steps: 30,
            sweep_step: 0.1,
            coarse_thresholds: vec![0.5, 1.0, 2.0, 3.0],
        }
    }

    pub fn sweep_thresholds(&self) -> Vec<f64> {
        (0..self.sweep_steps)
            .map(|i| self.sweep_step * i as f64)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RankProfile {
    pub alpha: f64,
    pub n_bootstraps: usize,
    pub resample_frac: f64,
    pub seed: u64,
    pub value_decimals: Option<u32>,
    pub score_decimals: u32,
}

impl RankProfile {
    pub fn default_v1() -> Self {
        Self {
            alpha: 0.001,
            n_bootstraps: 100,
            resample_frac: 0.9,
            seed: 0,
            value_decimals: Some(4),
            score_decimals: 4,
        }
    }
}
