use crate::libs::error::SyntenyError;

/// Distance used when looking up neighboring anchors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    /// p = 1
    Manhattan,
    /// p = 2
    Euclidean,
}

impl Metric {
    pub fn from_p(p: u8) -> Result<Self, SyntenyError> {
        match p {
            1 => Ok(Metric::Manhattan),
            2 => Ok(Metric::Euclidean),
            _ => Err(SyntenyError::Config(format!(
                "distance metric must be 1 (Manhattan) or 2 (Euclidean), got {}",
                p
            ))),
        }
    }

    pub fn distance(&self, dx: i64, dy: i64) -> f64 {
        match self {
            Metric::Manhattan => (dx.abs() + dy.abs()) as f64,
            Metric::Euclidean => ((dx * dx + dy * dy) as f64).sqrt(),
        }
    }
}

/// Tunables shared by all stages of the pipeline.
///
/// Stages take a `&Params` instead of reading global state, so each one can be
/// driven on its own from tests or from a subcommand.
#[derive(Clone, Debug)]
pub struct Params {
    /// Rank distance within which genes count as tandem copies
    pub tandem_nmax: i64,
    /// Max distance between two chained anchors
    pub nmax: i64,
    /// Minimum number of anchors in a reported cluster
    pub min_cluster_size: usize,
    pub cscore_cutoff: f64,
    pub synteny_cutoff: f64,
    pub metric: Metric,
    /// Neighbors looked up per anchor, the anchor itself included
    pub k: usize,
    /// Upper bound on family refinement rounds
    pub max_iter: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            tandem_nmax: 10,
            nmax: 40,
            min_cluster_size: 3,
            cscore_cutoff: 0.2,
            synteny_cutoff: 1.5,
            metric: Metric::Euclidean,
            k: 64,
            max_iter: 100,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), SyntenyError> {
        if self.nmax <= 0 {
            return Err(SyntenyError::Config(format!(
                "nmax must be positive, got {}",
                self.nmax
            )));
        }
        if self.tandem_nmax < 0 {
            return Err(SyntenyError::Config(format!(
                "tandem-nmax must not be negative, got {}",
                self.tandem_nmax
            )));
        }
        if self.k == 0 {
            return Err(SyntenyError::Config(
                "number of neighbors must be at least 1".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(SyntenyError::Config(
                "max-iter must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
