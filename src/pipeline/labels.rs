use crate::pipeline::encoding::EncodedSample;
use crate::pipeline::mappings::Category;
use serde::{Deserialize, Serialize};

/// Predicted stress category. Class codes 0/1/2 are the classifier's target
/// values; the derive order matches increasing stress score bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub const fn class(self) -> usize {
        self as usize
    }

    pub fn from_class(class: usize) -> Option<Self> {
        match class {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }
}

/// Composite stress score used only to derive training labels; never fed to
/// the classifier.
pub fn stress_score(sample: &EncodedSample) -> i64 {
    sample.code(Category::Fatigue) + sample.code(Category::Mood) + sample.code(Category::Headache)
        - sample.code(Category::WorkLifeBalance)
        - sample.code(Category::SocialSupport)
}

/// Three equal-width score bins spanning the training distribution.
///
/// Edge handling mirrors the original labelling step: four edges span
/// [min, max], intervals are left-open/right-closed, and the lowest edge is
/// widened by 0.1% of the range so the minimum score still falls in the first
/// bin. A zero-width distribution is widened symmetrically, which puts every
/// row in the middle bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBins {
    edges: [f64; 4],
}

impl ScoreBins {
    pub fn from_scores(scores: &[i64]) -> Option<Self> {
        let min = *scores.iter().min()? as f64;
        let max = *scores.iter().max()? as f64;

        let (lo, hi) = if min == max {
            let pad = if min == 0.0 { 0.001 } else { min.abs() * 0.001 };
            (min - pad, max + pad)
        } else {
            (min, max)
        };

        let width = (hi - lo) / 3.0;
        let mut edges = [lo, lo + width, lo + 2.0 * width, hi];
        if min != max {
            edges[0] -= (hi - lo) * 0.001;
        }

        Some(Self { edges })
    }

    pub fn edges(&self) -> [f64; 4] {
        self.edges
    }

    /// Bucket a score; `None` for scores outside every bin.
    pub fn level(&self, score: i64) -> Option<StressLevel> {
        let value = score as f64;
        for (bin, level) in StressLevel::ordered().iter().enumerate() {
            if value > self.edges[bin] && value <= self.edges[bin + 1] {
                return Some(*level);
            }
        }
        None
    }
}

/// Outcome of the training-time label derivation.
#[derive(Debug, Clone)]
pub struct LabelDerivation {
    pub bins: ScoreBins,
    pub scores: Vec<i64>,
    pub levels: Vec<Option<StressLevel>>,
    /// Rows whose score fell outside every bin. These are excluded from the
    /// training set, which silently shrinks it; callers log this count.
    pub dropped: usize,
}

/// Derives a stress label per encoded row from the score distribution of the
/// rows themselves. Deterministic for a fixed input; the bin boundaries (and
/// therefore what Low/Medium/High mean) change when the dataset changes.
pub fn derive_labels(samples: &[EncodedSample]) -> Option<LabelDerivation> {
    let scores: Vec<i64> = samples.iter().map(stress_score).collect();
    let bins = ScoreBins::from_scores(&scores)?;

    let levels: Vec<Option<StressLevel>> = scores.iter().map(|&s| bins.level(s)).collect();
    let dropped = levels.iter().filter(|level| level.is_none()).count();

    Some(LabelDerivation {
        bins,
        scores,
        levels,
        dropped,
    })
}
